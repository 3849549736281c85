//! # Gateway Core Property Tests
//!
//! Cross-module properties of the pass model:
//! - identifier determinism and injectivity in practice (both schemes)
//! - flags subset law of the validity evaluator
//! - issuer-removal monotonicity
//! - the reference KYC scenario, evaluated on the pure model
//!
//! No randomness outside proptest strategies, no clock, no I/O.

use super::*;
use proptest::prelude::*;
use std::collections::HashSet;

// ════════════════════════════════════════════════════════════════════════════
// HELPERS
// ════════════════════════════════════════════════════════════════════════════

fn authority() -> Identity {
    Identity([0xA0; 32])
}

fn gatekeeper() -> Identity {
    Identity([0x61; 32])
}

fn kyc_network() -> GatekeeperNetwork {
    let mut network = GatekeeperNetwork::new(
        derive_network_id(&authority()),
        authority(),
        "N",
        &["KYC"],
        86_400,
        0,
    )
    .expect("network");
    network.add_gatekeeper(&authority(), gatekeeper()).expect("add gk");
    network.set_required_mask(&authority(), FlagMask(0b1)).expect("mask");
    network
}

fn pass_for(network: &GatekeeperNetwork, owner: Identity, flags: FlagMask) -> PassRecord {
    PassRecord::new(
        derive_pass_id(&owner, &network.id, DEFAULT_CONSTRAINT),
        owner,
        network.id,
        DEFAULT_CONSTRAINT,
        gatekeeper(),
        flags,
        network.default_expiry(0),
        0,
    )
}

fn arb_identity() -> impl Strategy<Value = Identity> {
    any::<[u8; 32]>().prop_map(Identity)
}

// ════════════════════════════════════════════════════════════════════════════
// IDENTIFIERS
// ════════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn proptest_derive_deterministic(
        owner in arb_identity(),
        network in any::<[u8; 32]>(),
        constraint in any::<u64>(),
    ) {
        let network = NetworkId(network);
        prop_assert_eq!(
            derive_pass_id(&owner, &network, constraint),
            derive_pass_id(&owner, &network, constraint)
        );
        prop_assert_eq!(
            ContractSlotAddressing.pass_id(&owner, &network, constraint),
            ContractSlotAddressing.pass_id(&owner, &network, constraint)
        );
    }

    #[test]
    fn proptest_distinct_constraints_distinct_ids(
        owner in arb_identity(),
        c1 in any::<u64>(),
        c2 in any::<u64>(),
    ) {
        prop_assume!(c1 != c2);
        let network = derive_network_id(&authority());
        prop_assert_ne!(
            derive_pass_id(&owner, &network, c1),
            derive_pass_id(&owner, &network, c2)
        );
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(8))]

    #[test]
    fn proptest_no_collisions_across_1000_owners(
        owners in prop::collection::hash_set(any::<[u8; 32]>(), 1000),
        constraint in any::<u64>(),
    ) {
        let network = derive_network_id(&authority());
        let slot_network = ContractSlotAddressing.network_id(&authority());

        let account_ids: HashSet<PassId> = owners
            .iter()
            .map(|o| derive_pass_id(&Identity(*o), &network, constraint))
            .collect();
        let slot_ids: HashSet<PassId> = owners
            .iter()
            .map(|o| ContractSlotAddressing.pass_id(&Identity(*o), &slot_network, constraint))
            .collect();

        prop_assert_eq!(account_ids.len(), owners.len());
        prop_assert_eq!(slot_ids.len(), owners.len());
    }
}

// ════════════════════════════════════════════════════════════════════════════
// FLAGS SUBSET LAW
// ════════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn proptest_zero_mask_ignores_flags(flags in any::<u128>()) {
        let network = kyc_network();
        let pass = pass_for(&network, Identity([1; 32]), FlagMask(flags));
        prop_assert!(is_valid(&pass, &network, 1_000, Some(FlagMask::EMPTY)));
    }

    #[test]
    fn proptest_missing_required_bit_invalidates(
        flags in any::<u128>(),
        required in any::<u128>(),
    ) {
        let network = kyc_network();
        let pass = pass_for(&network, Identity([1; 32]), FlagMask(flags));
        let verdict = is_valid(&pass, &network, 1_000, Some(FlagMask(required)));
        prop_assert_eq!(verdict, flags & required == required);
    }
}

// ════════════════════════════════════════════════════════════════════════════
// SCENARIOS
// ════════════════════════════════════════════════════════════════════════════

#[test]
fn test_kyc_scenario_on_model() {
    let network = kyc_network();
    let mut pass = pass_for(&network, Identity([0x0A; 32]), FlagMask(0b1));
    assert_eq!(pass.expiry, Expiry::At(86_400));

    assert!(is_valid(&pass, &network, 1_000, None));
    assert!(!is_valid(&pass, &network, 90_000, None));

    pass.transition_to(PassState::Frozen, 10, "freeze").expect("freeze");
    assert!(!is_valid(&pass, &network, 1_000, None));

    pass.transition_to(PassState::Active, 20, "unfreeze").expect("unfreeze");
    pass.transition_to(PassState::Revoked, 30, "revoke").expect("revoke");
    assert!(matches!(
        pass.transition_to(PassState::Frozen, 40, "freeze"),
        Err(PassError::InvalidState { .. })
    ));
}

#[test]
fn test_issuer_removal_is_the_only_change() {
    let mut network = kyc_network();
    let pass = pass_for(&network, Identity([0x0B; 32]), FlagMask(0b1));
    let pass_before = pass.clone();
    assert!(is_valid(&pass, &network, 1_000, None));

    network.remove_gatekeeper(&authority(), &gatekeeper()).expect("remove");
    assert!(!is_valid(&pass, &network, 1_000, None));
    assert_eq!(pass, pass_before);

    network.add_gatekeeper(&authority(), gatekeeper()).expect("re-add");
    assert!(is_valid(&pass, &network, 1_000, None));
}

#[test]
fn test_encoded_pass_evaluates_identically() {
    let network = kyc_network();
    let pass = pass_for(&network, Identity([0x0C; 32]), FlagMask(0b1));
    let decoded = decode_pass(&encode_pass(&pass)).expect("decode");
    assert_eq!(
        is_valid(&pass, &network, 1_000, None),
        is_valid(&decoded, &network, 1_000, None)
    );
}
