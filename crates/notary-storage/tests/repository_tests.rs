//! Lifecycle operations of the repository contract

use chrono::{TimeZone, Utc};
use notary_primitives::{Credential, OutputRef, H256};
use notary_storage::*;
use notary_types::*;

fn bootstrap(name: &str, slot: u64) -> BootstrapRecord {
    BootstrapRecord {
        params: BootstrapParams {
            token_name: name.to_string(),
            allowed_credentials: vec![],
            fee: 2_000_000,
            fee_interval: 10,
            fee_receivers: vec![Credential::from_bytes([1; 28])],
            ttl: 0,
            transaction_limit: 1000,
            batch_size: 10,
        },
        schema_version: SchemaVersion::Current,
        creation_slot: slot,
        origin: OutputRef::new(H256::from_bytes([slot as u8; 32]), 0),
        invalidation_slot: None,
    }
}

fn out(slot: u64) -> OutputRef {
    OutputRef::new(H256::from_bytes([slot as u8; 32]), 0)
}

fn state(id: u8, slot: u64) -> StateRecord {
    StateRecord {
        id: H256::from_bytes([id; 32]),
        owner: Credential::from_bytes([7; 28]),
        countdown: 999,
        creation_slot: slot,
        current_output: out(slot),
        certificate_data_hash: H256::from_bytes([slot as u8; 32]),
        batch_size: 10,
        bootstrap_token_name: "chan".into(),
        invalidation_slot: None,
    }
}

fn update(id: u8, slot: u64, countdown: u64) -> UpdateHistoryEntry {
    UpdateHistoryEntry {
        state_id: H256::from_bytes([id; 32]),
        slot,
        countdown,
        output: out(slot),
        certificate_data_hash: H256::from_bytes([slot as u8; 32]),
    }
}

fn cert(id: u8, slot: u64) -> Certificate {
    Certificate {
        state_id: H256::from_bytes([id; 32]),
        data: CertificateData {
            hash: vec![slot as u8; 32],
            hash_algorithm: "SHA-256".into(),
            issuer_credential: vec![1; 28],
            extra_metadata: String::new(),
        },
        provenance: Provenance {
            slot,
            block_hash: H256::from_bytes([slot as u8; 32]),
            block_number: slot,
            output: out(slot),
            position: 0,
            creation_time: Utc.timestamp_opt(1_700_000_000 + slot as i64, 0).unwrap(),
        },
    }
}

/// Channel at 100, state forked at 101, updated at 102..=111
fn seeded() -> MemoryRepository {
    let repo = MemoryRepository::new();
    repo.apply(|batch| {
        batch.insert_bootstrap(bootstrap("chan", 100))?;
        batch.insert_state(state(1, 101))?;
        batch.insert_certificates(vec![cert(1, 101)])?;
        for (i, slot) in (102..=111).enumerate() {
            batch.append_update(update(1, slot, 998 - i as u64))?;
            batch.insert_certificates(vec![cert(1, slot)])?;
        }
        Ok::<_, StorageError>(())
    })
    .unwrap();
    repo
}

// ==================== Lifecycle ====================

#[test]
fn test_append_update_moves_head() {
    let repo = seeded();
    let record = repo.state(&H256::from_bytes([1; 32])).unwrap().unwrap();
    assert_eq!(record.countdown, 989);
    assert_eq!(record.current_output, out(111));
    assert_eq!(repo.history_of(&record.id).unwrap().len(), 11);
}

#[test]
fn test_append_update_unknown_state() {
    let repo = MemoryRepository::new();
    let result = repo.apply(|batch| batch.append_update(update(9, 5, 1)));
    assert!(matches!(result, Err(StorageError::NotFound(_))));
}

#[test]
fn test_invalidate_only_live() {
    let repo = seeded();
    let id = H256::from_bytes([1; 32]);
    let first = repo.apply(|batch| batch.invalidate_state(&id, 120)).unwrap();
    assert_eq!(first.unwrap().invalidation_slot, Some(120));
    let second = repo.apply(|batch| batch.invalidate_state(&id, 130)).unwrap();
    assert!(second.is_none());
    assert_eq!(repo.state(&id).unwrap().unwrap().invalidation_slot, Some(120));
}

// ==================== Rollback primitives ====================

#[test]
fn test_restore_heads_uses_latest_retained_entry() {
    let repo = seeded();
    let id = H256::from_bytes([1; 32]);
    let moved = repo.apply(|batch| batch.restore_heads(105)).unwrap();
    assert_eq!(moved, 1);
    let record = repo.state(&id).unwrap().unwrap();
    assert_eq!(record.countdown, 995);
    assert_eq!(record.current_output, out(105));
    assert_eq!(record.certificate_data_hash, H256::from_bytes([105; 32]));
    let slots: Vec<u64> = repo.history_of(&id).unwrap().iter().map(|e| e.slot).collect();
    assert_eq!(slots, (101..=105).collect::<Vec<_>>());
}

#[test]
fn test_same_slot_updates_keep_both_history_rows() {
    let repo = seeded();
    let id = H256::from_bytes([1; 32]);
    let first = OutputRef::new(H256::from_bytes([0xaa; 32]), 0);
    let second = OutputRef::new(H256::from_bytes([0x11; 32]), 0);
    repo.apply(|batch| {
        batch.append_update(UpdateHistoryEntry {
            output: first,
            ..update(1, 112, 988)
        })?;
        batch.append_update(UpdateHistoryEntry {
            output: second,
            ..update(1, 112, 987)
        })?;
        batch.append_update(update(1, 113, 986))
    })
    .unwrap();
    let at_112: Vec<OutputRef> = repo
        .history_of(&id)
        .unwrap()
        .iter()
        .filter(|e| e.slot == 112)
        .map(|e| e.output)
        .collect();
    assert_eq!(at_112.len(), 2);
    assert!(at_112.contains(&first) && at_112.contains(&second));

    // The later move wins even though its output sorts first
    let moved = repo.apply(|batch| batch.restore_heads(112)).unwrap();
    assert_eq!(moved, 1);
    let record = repo.state(&id).unwrap().unwrap();
    assert_eq!(record.current_output, second);
    assert_eq!(record.countdown, 987);
    assert_eq!(repo.history_of(&id).unwrap().len(), 13);
}

#[test]
fn test_delete_certificates_after() {
    let repo = seeded();
    let removed = repo.apply(|batch| batch.delete_certificates_after(105)).unwrap();
    assert_eq!(removed, 6);
    let left = repo.certificates_of(&H256::from_bytes([1; 32])).unwrap();
    assert_eq!(left.len(), 5);
    assert!(left.iter().all(|c| c.slot() <= 105));
}

#[test]
fn test_delete_created_after_removes_dependents() {
    let repo = seeded();
    repo.apply(|batch| {
        batch.insert_state(state(2, 108))?;
        batch.insert_certificates(vec![cert(2, 108)])
    })
    .unwrap();
    let deleted = repo.apply(|batch| batch.delete_created_after(105)).unwrap();
    assert_eq!(deleted, 1);
    let id2 = H256::from_bytes([2; 32]);
    assert!(repo.state(&id2).unwrap().is_none());
    assert!(repo.history_of(&id2).unwrap().is_empty());
    assert!(repo.certificates_of(&id2).unwrap().is_empty());
}

#[test]
fn test_undo_invalidations_after() {
    let repo = seeded();
    repo.apply(|batch| {
        batch.invalidate_bootstrap("chan", 110)?;
        batch.invalidate_state(&H256::from_bytes([1; 32]), 104)
    })
    .unwrap();
    let restored = repo.apply(|batch| batch.undo_invalidations_after(105)).unwrap();
    assert_eq!(restored, 1);
    assert!(repo.bootstrap("chan").unwrap().unwrap().is_live());
    assert_eq!(
        repo.state(&H256::from_bytes([1; 32])).unwrap().unwrap().invalidation_slot,
        Some(104)
    );
}

#[test]
fn test_cursor_roundtrip() {
    let repo = MemoryRepository::new();
    assert!(repo.cursor().unwrap().is_none());
    let point = ChainPoint {
        slot: 42,
        block_hash: H256::from_bytes([4; 32]),
    };
    repo.apply(|batch| batch.set_cursor(Some(point))).unwrap();
    assert_eq!(repo.cursor().unwrap(), Some(point));
}
