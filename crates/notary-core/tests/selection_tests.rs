//! Properties of the selection engine

use notary_core::{select_cheapest_bootstrap, select_cheapest_state, StateCandidate};
use notary_primitives::{Credential, OutputRef, H256};
use notary_types::*;
use proptest::prelude::*;

fn channel(index: usize, fee: u64, interval: u64) -> BootstrapRecord {
    BootstrapRecord {
        params: BootstrapParams {
            token_name: format!("ch{:03}", index),
            allowed_credentials: vec![],
            fee,
            fee_interval: interval,
            fee_receivers: vec![],
            ttl: 0,
            transaction_limit: 100,
            batch_size: 10,
        },
        schema_version: SchemaVersion::Current,
        creation_slot: index as u64,
        origin: OutputRef::default(),
        invalidation_slot: None,
    }
}

fn state(index: usize, countdown: u64) -> StateRecord {
    StateRecord {
        id: H256::from_bytes([index as u8; 32]),
        owner: Credential::from_bytes([1; 28]),
        countdown,
        creation_slot: 1,
        current_output: OutputRef::default(),
        certificate_data_hash: H256::ZERO,
        batch_size: 10,
        bootstrap_token_name: format!("ch{:03}", index),
        invalidation_slot: None,
    }
}

#[test]
fn test_order_sensitive_state_selection() {
    // A's next use is fee-due, B's is free: B wins even though A is cheaper
    let a_channel = channel(0, 1, 5);
    let b_channel = channel(1, 1_000_000, 5);
    let a = state(0, 10);
    let b = state(1, 7);
    let picked = select_cheapest_state(&[
        StateCandidate { state: &a, bootstrap: &a_channel },
        StateCandidate { state: &b, bootstrap: &b_channel },
    ])
    .unwrap();
    assert_eq!(picked.state.id, b.id);
}

proptest! {
    #[test]
    fn prop_cheapest_bootstrap_is_minimal(
        channels in prop::collection::vec((0u64..5_000_000, 1u64..500), 1..20)
    ) {
        let records: Vec<BootstrapRecord> = channels
            .iter()
            .enumerate()
            .map(|(i, (fee, interval))| channel(i, *fee, *interval))
            .collect();
        let picked = select_cheapest_bootstrap(&records, &Credential::ZERO, SchemaVersion::Current).unwrap();
        for record in &records {
            prop_assert!(picked.amortized_cost() <= record.amortized_cost());
        }
    }

    #[test]
    fn prop_free_state_preferred_when_present(
        countdowns in prop::collection::vec(1u64..100, 2..10)
    ) {
        let channels: Vec<BootstrapRecord> = (0..countdowns.len()).map(|i| channel(i, 10 + i as u64, 5)).collect();
        let states: Vec<StateRecord> = countdowns.iter().enumerate().map(|(i, c)| state(i, *c)).collect();
        let candidates: Vec<StateCandidate> = states
            .iter()
            .zip(&channels)
            .map(|(state, bootstrap)| StateCandidate { state, bootstrap })
            .collect();
        let picked = select_cheapest_state(&candidates).unwrap();
        match countdowns.iter().position(|c| c % 5 != 0) {
            Some(first_free) => prop_assert_eq!(picked.state.id, states[first_free].id),
            None => prop_assert_eq!(picked.state.id, states[0].id),
        }
    }
}
