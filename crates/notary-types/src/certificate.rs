//! Certificates: notarized content hashes and where they landed on-chain

use crate::records::StateId;
use chrono::{DateTime, Utc};
use notary_primitives::{hex_bytes, BlockHeight, OutputRef, Slot, H256};
use serde::{Deserialize, Serialize};

/// Certificate content as submitted by a user and embedded in a state datum
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CertificateData {
    /// Notarized content hash
    #[serde(with = "hex_bytes")]
    pub hash: Vec<u8>,
    /// Name of the hash algorithm (e.g. `SHA-256`)
    pub hash_algorithm: String,
    /// Issuer credential bytes
    #[serde(with = "hex_bytes")]
    pub issuer_credential: Vec<u8>,
    /// Free-form metadata; chunked on-chain
    #[serde(default)]
    pub extra_metadata: String,
}

/// Ledger position a certificate was observed at
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Provenance {
    /// Slot of the block
    pub slot: Slot,
    /// Block hash
    pub block_hash: H256,
    /// Block height
    pub block_number: BlockHeight,
    /// Output whose datum embedded the certificate
    pub output: OutputRef,
    /// Position within that datum's certificate list
    pub position: u32,
    /// Block time
    pub creation_time: DateTime<Utc>,
}

/// A persisted certificate, owned by the state record it was folded into
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Certificate {
    /// Owning state record
    pub state_id: StateId,
    /// Certificate content
    pub data: CertificateData,
    /// Where it was observed
    pub provenance: Provenance,
}

impl Certificate {
    /// Slot the certificate was observed at
    pub fn slot(&self) -> Slot {
        self.provenance.slot
    }
}
