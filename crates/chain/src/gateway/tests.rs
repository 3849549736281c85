//! # Gateway Ledger Tests
//!
//! Cross-module behavior of policy, lifecycle and query over one
//! `MemoryLedger`:
//! - the reference KYC scenario end to end
//! - revoked passes reject every mutator
//! - failed operations leave state root and audit log untouched
//! - re-issuance policy after revocation
//! - audit log contents

use std::sync::Arc;

use proptest::prelude::*;

use gatepass_common::gateway::{
    ContractSlotAddressing, Expiry, FlagMask, Identity, NetworkId, PassError, PassId, PassState,
    VerificationOptions, DEFAULT_CONSTRAINT,
};
use gatepass_common::GatepassConfig;

use super::*;
use crate::state::{LedgerStorage, MemoryLedger};

// ════════════════════════════════════════════════════════════════════════════════
// HELPERS
// ════════════════════════════════════════════════════════════════════════════════

fn authority() -> Identity {
    Identity([0xA0; 32])
}

fn gatekeeper() -> Identity {
    Identity([0x61; 32])
}

fn owner() -> Identity {
    Identity([0x0A; 32])
}

struct Fixture {
    ledger: Arc<MemoryLedger>,
    policy: PolicyStore<MemoryLedger>,
    engine: LifecycleEngine<MemoryLedger>,
    query: PassQuery<MemoryLedger>,
    network: NetworkId,
}

fn fixture(allow_reissue: bool) -> Fixture {
    let ledger = Arc::new(MemoryLedger::new());
    let policy = PolicyStore::new(Arc::clone(&ledger));
    let network = policy
        .create_network(&authority(), "N", &["KYC"], 86_400, 0)
        .expect("network")
        .id;
    policy.add_gatekeeper(&authority(), &network, gatekeeper(), 0).expect("gk");
    policy
        .set_required_mask(&authority(), &network, FlagMask(0b1), 0)
        .expect("mask");
    Fixture {
        engine: LifecycleEngine::new(Arc::clone(&ledger)).with_reissue_after_revoke(allow_reissue),
        query: PassQuery::new(Arc::clone(&ledger)),
        policy,
        ledger,
        network,
    }
}

fn issue_kyc(f: &Fixture, now: u64) -> PassId {
    f.engine
        .issue(
            IssueRequest::new(owner(), f.network, gatekeeper()).with_flags(FlagMask(0b1)),
            now,
        )
        .expect("issue")
        .id
}

fn valid_at(f: &Fixture, now: u64) -> bool {
    f.query
        .verify(&owner(), &f.network, DEFAULT_CONSTRAINT, now, &VerificationOptions::default())
        .expect("verify")
}

// ════════════════════════════════════════════════════════════════════════════════
// SCENARIOS
// ════════════════════════════════════════════════════════════════════════════════

#[test]
fn test_kyc_scenario() {
    let f = fixture(false);
    let id = issue_kyc(&f, 0);

    assert!(valid_at(&f, 1_000));
    assert!(!valid_at(&f, 90_000));

    f.engine.freeze(&gatekeeper(), &id, 10).expect("freeze");
    assert!(!valid_at(&f, 1_000));

    f.engine.unfreeze(&gatekeeper(), &id, 20).expect("unfreeze");
    assert!(valid_at(&f, 1_000));

    f.engine.revoke(&gatekeeper(), &id, 30).expect("revoke");
    assert!(matches!(
        f.engine.freeze(&gatekeeper(), &id, 40),
        Err(PassError::InvalidState { state: PassState::Revoked, .. })
    ));
}

#[test]
fn test_revoked_rejects_every_mutator() {
    let f = fixture(false);
    let id = issue_kyc(&f, 0);
    f.policy
        .add_gatekeeper(&authority(), &f.network, Identity([0x62; 32]), 0)
        .expect("second gk");
    f.engine.revoke(&authority(), &id, 1).expect("revoke");
    let stored = f.query.get_pass(&id);

    let callers = [authority(), gatekeeper(), Identity([0x62; 32]), Identity([0xEE; 32])];
    for caller in &callers {
        let results = vec![
            f.engine.freeze(caller, &id, 2),
            f.engine.unfreeze(caller, &id, 2),
            f.engine.revoke(caller, &id, 2),
            f.engine.refresh_expiry(caller, &id, Expiry::Never, 2),
            f.engine.set_flags(caller, &id, FlagMask(0b1), 2),
        ];
        for result in results {
            assert!(matches!(
                result,
                Err(PassError::InvalidState { state: PassState::Revoked, .. })
            ));
        }
    }

    // the issuer's removal does not turn the answer into Unauthorized
    f.policy
        .remove_gatekeeper(&authority(), &f.network, &gatekeeper(), 3)
        .expect("remove");
    assert!(matches!(
        f.engine.revoke(&gatekeeper(), &id, 4),
        Err(PassError::InvalidState { .. })
    ));
    assert!(matches!(
        f.engine.refresh_expiry(&gatekeeper(), &id, Expiry::Never, 4),
        Err(PassError::InvalidState { .. })
    ));
    assert_eq!(f.query.get_pass(&id), stored);
}

#[test]
fn test_issuer_removal_invalidates_without_touching_record() {
    let f = fixture(false);
    let id = issue_kyc(&f, 0);
    let before = f.query.get_pass(&id);
    assert!(valid_at(&f, 1_000));

    f.policy
        .remove_gatekeeper(&authority(), &f.network, &gatekeeper(), 5)
        .expect("remove");
    assert!(!valid_at(&f, 1_000));
    assert_eq!(f.query.get_pass(&id), before);

    // a removed issuer can no longer manage its passes; the authority can
    assert!(matches!(
        f.engine.freeze(&gatekeeper(), &id, 6),
        Err(PassError::Unauthorized { .. })
    ));
    f.engine.freeze(&authority(), &id, 6).expect("authority freeze");
}

#[test]
fn test_reissue_after_revoke_disallowed_by_default() {
    let f = fixture(false);
    let id = issue_kyc(&f, 0);
    f.engine.revoke(&gatekeeper(), &id, 1).expect("revoke");
    let err = f
        .engine
        .issue(IssueRequest::new(owner(), f.network, gatekeeper()), 2)
        .unwrap_err();
    assert!(matches!(err, PassError::AlreadyExists(_)));
}

#[test]
fn test_reissue_after_revoke_when_enabled() {
    let f = fixture(true);
    let id = issue_kyc(&f, 0);

    // enabled policy still refuses to replace a live pass
    assert!(matches!(
        f.engine.issue(IssueRequest::new(owner(), f.network, gatekeeper()), 1),
        Err(PassError::AlreadyExists(_))
    ));

    f.engine.revoke(&gatekeeper(), &id, 1).expect("revoke");
    let reissued = f
        .engine
        .issue(
            IssueRequest::new(owner(), f.network, gatekeeper()).with_flags(FlagMask(0b1)),
            100,
        )
        .expect("reissue");
    assert_eq!(reissued.id, id);
    assert_eq!(reissued.state, PassState::Active);
    assert_eq!(reissued.issued_at, 100);
    assert_eq!(f.query.passes_for_network(&f.network).len(), 1);
}

#[test]
fn test_audit_log_records_each_change() {
    let f = fixture(false);
    let id = issue_kyc(&f, 0);
    f.engine.freeze(&gatekeeper(), &id, 1).expect("freeze");
    let _ = f.engine.freeze(&gatekeeper(), &id, 2);

    let events = f.ledger.events();
    // created, flag KYC, gatekeeper added, mask set, issued, frozen
    assert_eq!(events.len(), 6);
    assert!(matches!(events[0], PassEvent::NetworkCreated { .. }));
    assert!(matches!(events[4], PassEvent::PassIssued { .. }));
    assert!(matches!(events[5], PassEvent::PassFrozen { timestamp: 1, .. }));
    assert!(events.windows(2).all(|w| w[0].timestamp() <= w[1].timestamp()));
}

#[test]
fn test_registry_from_config() {
    let config = GatepassConfig {
        allow_reissue_after_revoke: true,
        ..GatepassConfig::default()
    };
    let registry = PassRegistry::in_memory(ContractSlotAddressing, config);
    assert!(registry.lifecycle.allows_reissue_after_revoke());

    let network = registry
        .policy
        .create_network(&authority(), "slots", &["kyc"], 0, 0)
        .expect("network");
    assert!(network.id.as_slot().is_some());
    registry
        .policy
        .add_gatekeeper(&authority(), &network.id, gatekeeper(), 0)
        .expect("gk");

    let pass = registry
        .lifecycle
        .issue(IssueRequest::new(owner(), network.id, gatekeeper()), 0)
        .expect("issue");
    assert_eq!(pass.expiry, Expiry::Never);
    assert_eq!(
        registry.query.find_pass(&owner(), &network.id, DEFAULT_CONSTRAINT),
        Some(pass)
    );
    assert!(!registry.checkpoint().expect("checkpoint"));
}

// ════════════════════════════════════════════════════════════════════════════════
// ATOMICITY
// ════════════════════════════════════════════════════════════════════════════════

#[derive(Clone, Debug)]
enum Op {
    Issue { owner: u8, caller: u8, flags: u8 },
    Freeze { owner: u8, caller: u8 },
    Unfreeze { owner: u8, caller: u8 },
    Revoke { owner: u8, caller: u8 },
    SetFlags { owner: u8, caller: u8, flags: u8 },
    RefreshExpiry { owner: u8, caller: u8, secs: u8 },
    AddGatekeeper { caller: u8, gatekeeper: u8 },
    RemoveGatekeeper { caller: u8, gatekeeper: u8 },
}

// owner 0 is the fixture's owner
fn owner_identity(index: u8) -> Identity {
    match index {
        0 => owner(),
        n => Identity([n; 32]),
    }
}

// caller 0 is the authority, 1..=2 gatekeepers, 3 an outsider
fn caller_identity(index: u8) -> Identity {
    match index % 4 {
        0 => authority(),
        1 => gatekeeper(),
        2 => Identity([0x62; 32]),
        _ => Identity([0xEE; 32]),
    }
}

fn arb_op() -> impl Strategy<Value = Op> {
    prop_oneof![
        (0u8..3, 0u8..4, 0u8..4).prop_map(|(owner, caller, flags)| Op::Issue { owner, caller, flags }),
        (0u8..3, 0u8..4).prop_map(|(owner, caller)| Op::Freeze { owner, caller }),
        (0u8..3, 0u8..4).prop_map(|(owner, caller)| Op::Unfreeze { owner, caller }),
        (0u8..3, 0u8..4).prop_map(|(owner, caller)| Op::Revoke { owner, caller }),
        (0u8..3, 0u8..4, 0u8..4).prop_map(|(owner, caller, flags)| Op::SetFlags { owner, caller, flags }),
        (0u8..3, 0u8..4, any::<u8>()).prop_map(|(owner, caller, secs)| Op::RefreshExpiry { owner, caller, secs }),
        (0u8..4, 0u8..4).prop_map(|(caller, gatekeeper)| Op::AddGatekeeper { caller, gatekeeper }),
        (0u8..4, 0u8..4).prop_map(|(caller, gatekeeper)| Op::RemoveGatekeeper { caller, gatekeeper }),
    ]
}

fn apply(f: &Fixture, op: &Op, now: u64) -> Result<(), PassError> {
    let pass_of = |o: u8| f.engine.pass_id(&owner_identity(o), &f.network, DEFAULT_CONSTRAINT);
    match *op {
        Op::Issue { owner, caller, flags } => f
            .engine
            .issue(
                IssueRequest::new(owner_identity(owner), f.network, caller_identity(caller))
                    .with_flags(FlagMask(flags as u128)),
                now,
            )
            .map(|_| ()),
        Op::Freeze { owner, caller } => f.engine.freeze(&caller_identity(caller), &pass_of(owner), now).map(|_| ()),
        Op::Unfreeze { owner, caller } => f.engine.unfreeze(&caller_identity(caller), &pass_of(owner), now).map(|_| ()),
        Op::Revoke { owner, caller } => f.engine.revoke(&caller_identity(caller), &pass_of(owner), now).map(|_| ()),
        Op::SetFlags { owner, caller, flags } => f
            .engine
            .set_flags(&caller_identity(caller), &pass_of(owner), FlagMask(flags as u128), now)
            .map(|_| ()),
        Op::RefreshExpiry { owner, caller, secs } => f
            .engine
            .refresh_expiry(&caller_identity(caller), &pass_of(owner), Expiry::At(now + secs as u64), now)
            .map(|_| ()),
        Op::AddGatekeeper { caller, gatekeeper } => f
            .policy
            .add_gatekeeper(&caller_identity(caller), &f.network, caller_identity(gatekeeper), now)
            .map(|_| ()),
        Op::RemoveGatekeeper { caller, gatekeeper } => f
            .policy
            .remove_gatekeeper(&caller_identity(caller), &f.network, &caller_identity(gatekeeper), now)
            .map(|_| ()),
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn proptest_failed_ops_change_nothing(ops in prop::collection::vec(arb_op(), 1..40)) {
        let f = fixture(false);
        for (step, op) in ops.iter().enumerate() {
            let root_before = f.ledger.state_root().expect("root");
            let events_before = f.ledger.event_count();
            if apply(&f, op, step as u64 + 1).is_err() {
                prop_assert_eq!(f.ledger.state_root().expect("root"), root_before);
                prop_assert_eq!(f.ledger.event_count(), events_before);
            }
        }
    }

    #[test]
    fn proptest_revoked_is_terminal(ops in prop::collection::vec(arb_op(), 0..40)) {
        let f = fixture(false);
        let id = issue_kyc(&f, 0);
        f.engine.revoke(&authority(), &id, 0).expect("revoke");
        for (step, op) in ops.iter().enumerate() {
            let result = apply(&f, op, step as u64 + 1);
            let targets_revoked = match *op {
                Op::Freeze { owner, .. }
                | Op::Unfreeze { owner, .. }
                | Op::Revoke { owner, .. }
                | Op::SetFlags { owner, .. }
                | Op::RefreshExpiry { owner, .. } => owner == 0,
                _ => false,
            };
            if targets_revoked {
                prop_assert!(
                    matches!(result, Err(PassError::InvalidState { state: PassState::Revoked, .. })),
                    "{:?} on revoked pass returned {:?}",
                    op,
                    result
                );
            }
            let state = f.ledger.read_pass(&id).map(|p| p.state);
            prop_assert_eq!(state, Some(PassState::Revoked));
        }
    }
}
