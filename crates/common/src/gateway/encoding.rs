//! # Fixed-Width Pass Encoding
//!
//! Bit-exact presentation encoding of a [`PassRecord`]. Identical records
//! always encode to identical bytes on every platform.
//!
//! ## Layout (170 bytes, big-endian)
//!
//! ```text
//! offset  size  field
//! ──────  ────  ──────────────────
//!      0    32  id
//!     32    32  owner
//!     64    32  network
//!     96    32  issuing_gatekeeper
//!    128     8  constraint
//!    136     1  state tag   (0 active, 1 frozen, 2 revoked)
//!    137     8  issued_at
//!    145     1  expiry tag  (0 never, 1 at)
//!    146     8  expiry      (zero when tag is 0)
//!    154    16  flags
//! ```
//!
//! `last_updated` is storage bookkeeping and is not encoded; a decoded
//! record takes `issued_at` as its `last_updated`.

use sha3::{Digest, Sha3_256};

use super::error::PassError;
use super::flags::FlagMask;
use super::ids::{Identity, NetworkId, PassId};
use super::pass::{Expiry, PassRecord};
use super::status::PassState;

/// Encoded size of a pass record in bytes.
pub const PASS_ENCODED_LEN: usize = 170;

const EXPIRY_NEVER: u8 = 0;
const EXPIRY_AT: u8 = 1;

/// Encode `pass` into its fixed 170-byte form.
pub fn encode_pass(pass: &PassRecord) -> [u8; PASS_ENCODED_LEN] {
    let mut out = [0u8; PASS_ENCODED_LEN];
    out[0..32].copy_from_slice(pass.id.as_bytes());
    out[32..64].copy_from_slice(pass.owner.as_bytes());
    out[64..96].copy_from_slice(pass.network.as_bytes());
    out[96..128].copy_from_slice(pass.issuing_gatekeeper.as_bytes());
    out[128..136].copy_from_slice(&pass.constraint.to_be_bytes());
    out[136] = pass.state.to_tag();
    out[137..145].copy_from_slice(&pass.issued_at.to_be_bytes());
    match pass.expiry {
        Expiry::Never => out[145] = EXPIRY_NEVER,
        Expiry::At(t) => {
            out[145] = EXPIRY_AT;
            out[146..154].copy_from_slice(&t.to_be_bytes());
        }
    }
    out[154..170].copy_from_slice(&pass.flags.to_be_bytes());
    out
}

/// Decode a record produced by [`encode_pass`].
///
/// ## Errors
///
/// `Codec` on wrong length, unknown state tag, unknown expiry tag, or a
/// non-zero expiry field under the `never` tag.
pub fn decode_pass(bytes: &[u8]) -> Result<PassRecord, PassError> {
    if bytes.len() != PASS_ENCODED_LEN {
        return Err(PassError::Codec(format!(
            "pass encoding must be {} bytes, got {}",
            PASS_ENCODED_LEN,
            bytes.len()
        )));
    }

    let state = PassState::from_tag(bytes[136])?;
    let issued_at = read_u64(&bytes[137..145]);
    let expiry_field = read_u64(&bytes[146..154]);
    let expiry = match bytes[145] {
        EXPIRY_NEVER if expiry_field == 0 => Expiry::Never,
        EXPIRY_NEVER => {
            return Err(PassError::Codec("expiry field set under never tag".to_string()));
        }
        EXPIRY_AT => Expiry::At(expiry_field),
        other => return Err(PassError::Codec(format!("unknown expiry tag {}", other))),
    };

    let mut flags = [0u8; 16];
    flags.copy_from_slice(&bytes[154..170]);

    Ok(PassRecord {
        id: PassId(read_32(&bytes[0..32])),
        owner: Identity(read_32(&bytes[32..64])),
        network: NetworkId(read_32(&bytes[64..96])),
        issuing_gatekeeper: Identity(read_32(&bytes[96..128])),
        constraint: read_u64(&bytes[128..136]),
        state,
        issued_at,
        expiry,
        flags: FlagMask::from_be_bytes(flags),
        last_updated: issued_at,
    })
}

/// SHA3-256 of the fixed-width encoding.
pub fn pass_hash(pass: &PassRecord) -> [u8; 32] {
    let mut hasher = Sha3_256::new();
    hasher.update(encode_pass(pass));
    hasher.finalize().into()
}

// Callers pass exact-width slices.
fn read_u64(slice: &[u8]) -> u64 {
    let mut buf = [0u8; 8];
    buf.copy_from_slice(slice);
    u64::from_be_bytes(buf)
}

fn read_32(slice: &[u8]) -> [u8; 32] {
    let mut buf = [0u8; 32];
    buf.copy_from_slice(slice);
    buf
}
