//! RLP row and key encoding for the persistent backend

use crate::error::{StorageError, StorageResult};
use crate::keys::{BootstrapKey, CertificateKey, HistoryKey};
use chrono::DateTime;
use notary_primitives::{Credential, OutputRef, Slot};
use notary_types::{
    BootstrapParams, BootstrapRecord, Certificate, CertificateData, ChainPoint, Provenance,
    SchemaVersion, StateId, StateRecord, UpdateHistoryEntry,
};
use rlp::{Rlp, RlpStream};

// ==================== Keys ====================

/// Bootstrap key: `len(name) u16 BE || name || creation_slot BE`
pub fn bootstrap_key(key: &BootstrapKey) -> Vec<u8> {
    let name = key.token_name.as_bytes();
    let mut out = Vec::with_capacity(2 + name.len() + 8);
    out.extend_from_slice(&(name.len() as u16).to_be_bytes());
    out.extend_from_slice(name);
    out.extend_from_slice(&key.creation_slot.to_be_bytes());
    out
}

/// State key: the id
pub fn state_key(id: &StateId) -> Vec<u8> {
    id.as_bytes().to_vec()
}

/// History key: `id || slot BE || tx_hash || index BE`, so one record's
/// history is a contiguous range
pub fn history_key(key: &HistoryKey) -> Vec<u8> {
    let mut out = Vec::with_capacity(32 + 8 + 32 + 4);
    out.extend_from_slice(key.0.as_bytes());
    out.extend_from_slice(&key.1.to_be_bytes());
    out.extend_from_slice(key.2.tx_hash.as_bytes());
    out.extend_from_slice(&key.2.index.to_be_bytes());
    out
}

/// Certificate key: `id || slot BE || tx_hash || index BE || position BE`
pub fn certificate_key(key: &CertificateKey) -> Vec<u8> {
    let mut out = Vec::with_capacity(32 + 8 + 32 + 4 + 4);
    out.extend_from_slice(key.state_id.as_bytes());
    out.extend_from_slice(&key.slot.to_be_bytes());
    out.extend_from_slice(key.output.tx_hash.as_bytes());
    out.extend_from_slice(&key.output.index.to_be_bytes());
    out.extend_from_slice(&key.position.to_be_bytes());
    out
}

// ==================== Shared fields ====================

fn append_output(s: &mut RlpStream, output: &OutputRef) {
    s.begin_list(2);
    s.append(&output.tx_hash);
    s.append(&output.index);
}

fn decode_output(rlp: &Rlp) -> StorageResult<OutputRef> {
    Ok(OutputRef::new(rlp.val_at(0)?, rlp.val_at(1)?))
}

fn append_opt_slot(s: &mut RlpStream, slot: Option<Slot>) {
    match slot {
        Some(slot) => {
            s.begin_list(1);
            s.append(&slot);
        }
        None => {
            s.begin_list(0);
        }
    }
}

fn decode_opt_slot(rlp: &Rlp) -> StorageResult<Option<Slot>> {
    match rlp.item_count()? {
        0 => Ok(None),
        1 => Ok(Some(rlp.val_at(0)?)),
        n => Err(StorageError::Corrupt(format!("optional slot with {} items", n))),
    }
}

fn expect_items(rlp: &Rlp, row: &str, expected: usize) -> StorageResult<()> {
    let got = rlp.item_count()?;
    if got != expected {
        return Err(StorageError::Corrupt(format!(
            "{} row: expected {} items, got {}",
            row, expected, got
        )));
    }
    Ok(())
}

// ==================== Rows ====================

/// Encode a bootstrap row
pub fn encode_bootstrap(record: &BootstrapRecord) -> Vec<u8> {
    let p = &record.params;
    let mut s = RlpStream::new_list(12);
    s.append(&p.token_name);
    s.append_list::<Credential, _>(&p.allowed_credentials);
    s.append(&p.fee);
    s.append(&p.fee_interval);
    s.append_list::<Credential, _>(&p.fee_receivers);
    s.append(&p.ttl);
    s.append(&p.transaction_limit);
    s.append(&p.batch_size);
    s.append(&record.schema_version.as_u8());
    s.append(&record.creation_slot);
    append_output(&mut s, &record.origin);
    append_opt_slot(&mut s, record.invalidation_slot);
    s.out().to_vec()
}

/// Decode a bootstrap row
pub fn decode_bootstrap(bytes: &[u8]) -> StorageResult<BootstrapRecord> {
    let rlp = Rlp::new(bytes);
    expect_items(&rlp, "bootstrap", 12)?;
    let version: u8 = rlp.val_at(8)?;
    Ok(BootstrapRecord {
        params: BootstrapParams {
            token_name: rlp.val_at(0)?,
            allowed_credentials: rlp.list_at(1)?,
            fee: rlp.val_at(2)?,
            fee_interval: rlp.val_at(3)?,
            fee_receivers: rlp.list_at(4)?,
            ttl: rlp.val_at(5)?,
            transaction_limit: rlp.val_at(6)?,
            batch_size: rlp.val_at(7)?,
        },
        schema_version: SchemaVersion::try_from(version)
            .map_err(|e| StorageError::Corrupt(e.to_string()))?,
        creation_slot: rlp.val_at(9)?,
        origin: decode_output(&rlp.at(10)?)?,
        invalidation_slot: decode_opt_slot(&rlp.at(11)?)?,
    })
}

/// Encode a state row
pub fn encode_state(record: &StateRecord) -> Vec<u8> {
    let mut s = RlpStream::new_list(9);
    s.append(&record.id);
    s.append(&record.owner);
    s.append(&record.countdown);
    s.append(&record.creation_slot);
    append_output(&mut s, &record.current_output);
    s.append(&record.certificate_data_hash);
    s.append(&record.batch_size);
    s.append(&record.bootstrap_token_name);
    append_opt_slot(&mut s, record.invalidation_slot);
    s.out().to_vec()
}

/// Decode a state row
pub fn decode_state(bytes: &[u8]) -> StorageResult<StateRecord> {
    let rlp = Rlp::new(bytes);
    expect_items(&rlp, "state", 9)?;
    Ok(StateRecord {
        id: rlp.val_at(0)?,
        owner: rlp.val_at(1)?,
        countdown: rlp.val_at(2)?,
        creation_slot: rlp.val_at(3)?,
        current_output: decode_output(&rlp.at(4)?)?,
        certificate_data_hash: rlp.val_at(5)?,
        batch_size: rlp.val_at(6)?,
        bootstrap_token_name: rlp.val_at(7)?,
        invalidation_slot: decode_opt_slot(&rlp.at(8)?)?,
    })
}

/// Encode a history row
pub fn encode_history(entry: &UpdateHistoryEntry) -> Vec<u8> {
    let mut s = RlpStream::new_list(5);
    s.append(&entry.state_id);
    s.append(&entry.slot);
    s.append(&entry.countdown);
    append_output(&mut s, &entry.output);
    s.append(&entry.certificate_data_hash);
    s.out().to_vec()
}

/// Decode a history row
pub fn decode_history(bytes: &[u8]) -> StorageResult<UpdateHistoryEntry> {
    let rlp = Rlp::new(bytes);
    expect_items(&rlp, "history", 5)?;
    Ok(UpdateHistoryEntry {
        state_id: rlp.val_at(0)?,
        slot: rlp.val_at(1)?,
        countdown: rlp.val_at(2)?,
        output: decode_output(&rlp.at(3)?)?,
        certificate_data_hash: rlp.val_at(4)?,
    })
}

/// Encode a certificate row
pub fn encode_certificate(cert: &Certificate) -> Vec<u8> {
    let p = &cert.provenance;
    let mut s = RlpStream::new_list(10);
    s.append(&cert.state_id);
    s.append(&cert.data.hash);
    s.append(&cert.data.hash_algorithm);
    s.append(&cert.data.issuer_credential);
    s.append(&cert.data.extra_metadata);
    s.append(&p.slot);
    s.append(&p.block_hash);
    s.append(&p.block_number);
    append_output(&mut s, &p.output);
    s.begin_list(2);
    s.append(&p.position);
    s.append(&(p.creation_time.timestamp_millis() as u64));
    s.out().to_vec()
}

/// Decode a certificate row
pub fn decode_certificate(bytes: &[u8]) -> StorageResult<Certificate> {
    let rlp = Rlp::new(bytes);
    expect_items(&rlp, "certificate", 10)?;
    let tail = rlp.at(9)?;
    let millis: u64 = tail.val_at(1)?;
    let creation_time = DateTime::from_timestamp_millis(millis as i64)
        .ok_or_else(|| StorageError::Corrupt(format!("timestamp {}", millis)))?;
    Ok(Certificate {
        state_id: rlp.val_at(0)?,
        data: CertificateData {
            hash: rlp.val_at(1)?,
            hash_algorithm: rlp.val_at(2)?,
            issuer_credential: rlp.val_at(3)?,
            extra_metadata: rlp.val_at(4)?,
        },
        provenance: Provenance {
            slot: rlp.val_at(5)?,
            block_hash: rlp.val_at(6)?,
            block_number: rlp.val_at(7)?,
            output: decode_output(&rlp.at(8)?)?,
            position: tail.val_at(0)?,
            creation_time,
        },
    })
}

/// Encode the chain cursor
pub fn encode_point(point: &ChainPoint) -> Vec<u8> {
    let mut s = RlpStream::new_list(2);
    s.append(&point.slot);
    s.append(&point.block_hash);
    s.out().to_vec()
}

/// Decode the chain cursor
pub fn decode_point(bytes: &[u8]) -> StorageResult<ChainPoint> {
    let rlp = Rlp::new(bytes);
    expect_items(&rlp, "cursor", 2)?;
    Ok(ChainPoint {
        slot: rlp.val_at(0)?,
        block_hash: rlp.val_at(1)?,
    })
}
