//! Bootstrap datum: legacy and current layouts
//!
//! Both layouts are constructor 0 with positional fields. The current layout
//! has 8 fields; the legacy layout appends the state policy and state
//! validator hashes (10 fields). The layout is selected by field count and
//! only the current layout is ever written.

use crate::error::{DecodeError, DecodeResult, EncodeError};
use crate::plutus::PlutusData;
use notary_primitives::{Credential, PolicyId, ScriptHash, H224};
use notary_types::{BootstrapParams, SchemaVersion};

const CURRENT_FIELDS: usize = 8;
const LEGACY_FIELDS: usize = 10;

/// A decoded bootstrap datum, tagged by layout
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BootstrapDatum {
    /// 10-field layout with script hashes carried inline
    Legacy {
        /// Channel parameters
        params: BootstrapParams,
        /// State token policy baked into the datum
        state_policy: PolicyId,
        /// State validator baked into the datum
        state_validator: ScriptHash,
    },
    /// 8-field layout
    Current(BootstrapParams),
}

impl BootstrapDatum {
    /// Decode either layout from CBOR bytes
    pub fn decode(bytes: &[u8]) -> DecodeResult<Self> {
        Self::from_plutus(&PlutusData::from_cbor(bytes)?)
    }

    /// Decode either layout from a data node
    pub fn from_plutus(data: &PlutusData) -> DecodeResult<Self> {
        let fields = data.expect_constr("bootstrap datum", 0)?;
        match fields.len() {
            CURRENT_FIELDS => decode_current(fields),
            LEGACY_FIELDS => decode_legacy(fields),
            got => Err(DecodeError::FieldCount {
                record: "bootstrap datum",
                got,
            }),
        }
    }

    /// Encode channel parameters in the current layout
    pub fn encode(params: &BootstrapParams) -> Result<Vec<u8>, EncodeError> {
        Self::to_plutus(params).to_cbor()
    }

    /// Current-layout data node for `params`
    pub fn to_plutus(params: &BootstrapParams) -> PlutusData {
        PlutusData::constr(
            0,
            vec![
                PlutusData::bytes(params.token_name.as_bytes()),
                credential_list(&params.allowed_credentials),
                PlutusData::int(params.fee),
                PlutusData::int(params.fee_interval),
                credential_list(&params.fee_receivers),
                PlutusData::int(params.ttl),
                PlutusData::int(params.transaction_limit),
                PlutusData::int(params.batch_size),
            ],
        )
    }

    /// Channel parameters regardless of layout
    pub fn params(&self) -> &BootstrapParams {
        match self {
            BootstrapDatum::Legacy { params, .. } | BootstrapDatum::Current(params) => params,
        }
    }

    /// Take the channel parameters
    pub fn into_params(self) -> BootstrapParams {
        match self {
            BootstrapDatum::Legacy { params, .. } | BootstrapDatum::Current(params) => params,
        }
    }

    /// Schema version the datum was decoded from
    pub fn schema_version(&self) -> SchemaVersion {
        match self {
            BootstrapDatum::Legacy { .. } => SchemaVersion::Legacy,
            BootstrapDatum::Current(_) => SchemaVersion::Current,
        }
    }
}

fn decode_current(fields: &[PlutusData]) -> DecodeResult<BootstrapDatum> {
    decode_params(fields).map(BootstrapDatum::Current)
}

fn decode_legacy(fields: &[PlutusData]) -> DecodeResult<BootstrapDatum> {
    Ok(BootstrapDatum::Legacy {
        params: decode_params(&fields[..CURRENT_FIELDS])?,
        state_policy: decode_h224(&fields[8], "state_policy_hash")?,
        state_validator: decode_h224(&fields[9], "state_validator_hash")?,
    })
}

fn decode_params(fields: &[PlutusData]) -> DecodeResult<BootstrapParams> {
    Ok(BootstrapParams {
        token_name: fields[0].as_text("token_name")?,
        allowed_credentials: decode_credentials(&fields[1], "allowed_credentials")?,
        fee: fields[2].as_u64("fee")?,
        fee_interval: fields[3].as_u64("fee_interval")?,
        fee_receivers: decode_credentials(&fields[4], "fee_receivers")?,
        ttl: fields[5].as_u64("ttl")?,
        transaction_limit: fields[6].as_u64("transaction_limit")?,
        batch_size: fields[7].as_u64("batch_size")?,
    })
}

pub(crate) fn decode_h224(data: &PlutusData, field: &'static str) -> DecodeResult<H224> {
    let bytes = data.as_bytes(field)?;
    H224::from_slice(bytes).map_err(|_| DecodeError::Length {
        field,
        expected: H224::LEN,
        got: bytes.len(),
    })
}

fn decode_credentials(data: &PlutusData, field: &'static str) -> DecodeResult<Vec<Credential>> {
    data.as_list(field)?
        .iter()
        .map(|item| decode_h224(item, field))
        .collect()
}

fn credential_list(credentials: &[Credential]) -> PlutusData {
    PlutusData::List(credentials.iter().map(PlutusData::bytes).collect())
}
