//! # Flags & Flag Catalogue
//!
//! A flag is a named boolean attribute a gatekeeper attests on a pass,
//! addressed by a stable bit position in a fixed 128-bit mask.
//!
//! ## Catalogue Rules
//!
//! - Bit positions are assigned in definition order (`0, 1, 2, ...`).
//! - Positions are never reassigned or renumbered; the catalogue is
//!   append-only for the lifetime of its network.
//! - At most [`FLAG_CAPACITY`] flags can exist.
//!
//! ## Encoding
//!
//! `FlagMask` encodes as 16 big-endian bytes. Bit `i` of the mask is
//! flag index `i`.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{BitAnd, BitOr};

use super::error::PassError;

/// Width of the flag bitset in bits.
pub const FLAG_CAPACITY: usize = 128;

// ════════════════════════════════════════════════════════════════════════════════
// FLAG MASK
// ════════════════════════════════════════════════════════════════════════════════

/// Fixed-width 128-bit flag bitset.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FlagMask(pub u128);

impl FlagMask {
    /// Mask with no bits set.
    pub const EMPTY: FlagMask = FlagMask(0);

    #[must_use]
    pub const fn from_bits(bits: u128) -> Self {
        FlagMask(bits)
    }

    #[must_use]
    pub const fn bits(&self) -> u128 {
        self.0
    }

    /// Mask with only `index` set. `None` when `index` is out of range.
    #[must_use]
    pub fn bit(index: u8) -> Option<Self> {
        if usize::from(index) >= FLAG_CAPACITY {
            return None;
        }
        Some(FlagMask(1u128 << index))
    }

    /// Mask with the lowest `count` bits set.
    #[must_use]
    pub const fn lowest(count: usize) -> Self {
        if count >= FLAG_CAPACITY {
            FlagMask(u128::MAX)
        } else {
            FlagMask((1u128 << count) - 1)
        }
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.0 == 0
    }

    #[must_use]
    pub fn is_set(&self, index: u8) -> bool {
        FlagMask::bit(index).is_some_and(|b| self.0 & b.0 != 0)
    }

    /// `true` when every bit of `required` is also set in `self`.
    #[must_use]
    pub const fn contains_all(&self, required: FlagMask) -> bool {
        self.0 & required.0 == required.0
    }

    /// `true` when `self` sets no bit outside `other`.
    #[must_use]
    pub const fn is_subset_of(&self, other: FlagMask) -> bool {
        self.0 & !other.0 == 0
    }

    /// Bits of `self` that are not set in `other`.
    #[must_use]
    pub const fn difference(&self, other: FlagMask) -> FlagMask {
        FlagMask(self.0 & !other.0)
    }

    #[must_use]
    pub const fn count(&self) -> u32 {
        self.0.count_ones()
    }

    #[must_use]
    pub const fn to_be_bytes(&self) -> [u8; 16] {
        self.0.to_be_bytes()
    }

    #[must_use]
    pub const fn from_be_bytes(bytes: [u8; 16]) -> Self {
        FlagMask(u128::from_be_bytes(bytes))
    }

    /// Bit indices set in this mask, ascending.
    pub fn indices(&self) -> impl Iterator<Item = u8> + '_ {
        (0..FLAG_CAPACITY as u8).filter(move |i| self.is_set(*i))
    }
}

impl BitOr for FlagMask {
    type Output = FlagMask;
    fn bitor(self, rhs: FlagMask) -> FlagMask {
        FlagMask(self.0 | rhs.0)
    }
}

impl BitAnd for FlagMask {
    type Output = FlagMask;
    fn bitand(self, rhs: FlagMask) -> FlagMask {
        FlagMask(self.0 & rhs.0)
    }
}

impl fmt::Display for FlagMask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#b}", self.0)
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// FLAG CATALOGUE
// ════════════════════════════════════════════════════════════════════════════════

/// Ordered, append-only catalogue of a network's named flags.
///
/// The position of a name in the catalogue is its bit index.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlagCatalogue {
    names: Vec<String>,
}

impl FlagCatalogue {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a catalogue by defining `names` in order.
    pub fn from_names<I, S>(names: I) -> Result<Self, PassError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut catalogue = FlagCatalogue::new();
        for name in names {
            catalogue.define(name.as_ref())?;
        }
        Ok(catalogue)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.names.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    #[must_use]
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Append `name` at the next free bit position and return that position.
    ///
    /// ## Errors
    ///
    /// - `AlreadyExists` if `name` is already defined.
    /// - `CapacityExceeded` once all [`FLAG_CAPACITY`] positions are taken.
    pub fn define(&mut self, name: &str) -> Result<u8, PassError> {
        if self.index_of(name).is_some() {
            return Err(PassError::AlreadyExists(format!("flag {:?}", name)));
        }
        if self.names.len() >= FLAG_CAPACITY {
            return Err(PassError::CapacityExceeded {
                capacity: FLAG_CAPACITY,
            });
        }
        let index = self.names.len() as u8;
        self.names.push(name.to_string());
        Ok(index)
    }

    #[must_use]
    pub fn index_of(&self, name: &str) -> Option<u8> {
        self.names.iter().position(|n| n == name).map(|i| i as u8)
    }

    #[must_use]
    pub fn name_of(&self, index: u8) -> Option<&str> {
        self.names.get(usize::from(index)).map(String::as_str)
    }

    /// Mask of every defined bit position.
    #[must_use]
    pub fn defined_mask(&self) -> FlagMask {
        FlagMask::lowest(self.names.len())
    }

    /// Mask for a list of flag names. Unknown names yield `NotFound`.
    pub fn mask_for<I, S>(&self, names: I) -> Result<FlagMask, PassError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut mask = FlagMask::EMPTY;
        for name in names {
            let name = name.as_ref();
            let index = self
                .index_of(name)
                .ok_or_else(|| PassError::NotFound(format!("flag {:?}", name)))?;
            // index < FLAG_CAPACITY by construction
            mask = mask | FlagMask(1u128 << index);
        }
        Ok(mask)
    }

    /// Reject masks referencing bit positions this catalogue never defined.
    pub fn check_defined(&self, mask: FlagMask) -> Result<(), PassError> {
        let undefined = mask.difference(self.defined_mask());
        if !undefined.is_empty() {
            return Err(PassError::InvalidFlag {
                mask: mask.bits(),
                undefined: undefined.bits(),
            });
        }
        Ok(())
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// TESTS
// ════════════════════════════════════════════════════════════════════════════════
