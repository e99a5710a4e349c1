//! Ledger ingestion
//!
//! Each confirmed output is classified by the token policies it carries:
//!
//! | policy           | quantity | action                                   |
//! |------------------|----------|------------------------------------------|
//! | bootstrap policy | +1       | decode datum, insert bootstrap record    |
//! | bootstrap policy | -1       | invalidate bootstrap record by name      |
//! | state policy     | -1       | invalidate state record by id            |
//! | state policy     | +1       | decode datum, create or advance a record |
//!
//! Any other quantity under either policy is a protocol violation and aborts
//! the batch. Undecodable datums are logged and skipped.

use crate::error::{IngestError, IngestResult};
use chrono::{DateTime, Utc};
use notary_datum::{BootstrapDatum, DecodeError, StateDatum};
use notary_primitives::{PolicyId, H256};
use notary_storage::{RepositoryReader, RepositoryWriter, StorageError};
use notary_types::{
    BootstrapRecord, Certificate, LedgerOutput, PolicyAmount, Provenance, ScriptSet, StateId,
    StateRecord, UpdateHistoryEntry,
};
use tracing::{debug, info, warn};

/// What a batch changed
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct IngestSummary {
    /// Outputs examined
    pub outputs: usize,
    /// Outputs skipped for an undecodable payload
    pub decode_errors: usize,
    /// Bootstrap records created
    pub bootstrap_mints: usize,
    /// Bootstrap records invalidated
    pub bootstrap_burns: usize,
    /// State records created
    pub state_forks: usize,
    /// State records advanced to a new head
    pub state_updates: usize,
    /// State records invalidated
    pub state_burns: usize,
    /// Certificates persisted
    pub certificates: usize,
    /// Outputs already applied by an earlier batch
    pub replayed: usize,
}

/// How an amount under a notary policy is handled
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Action {
    BootstrapMint,
    BootstrapBurn,
    StateMint,
    StateBurn,
}

fn classify(scripts: &ScriptSet, amount: &PolicyAmount) -> IngestResult<Option<Action>> {
    let (mint, burn) = if amount.policy == scripts.bootstrap_policy {
        (Action::BootstrapMint, Action::BootstrapBurn)
    } else if amount.policy == scripts.state_policy {
        (Action::StateMint, Action::StateBurn)
    } else {
        return Ok(None);
    };
    match amount.quantity {
        1 => Ok(Some(mint)),
        -1 => Ok(Some(burn)),
        quantity => Err(violation(amount.policy, &amount.asset_name, quantity)),
    }
}

fn violation(policy: PolicyId, asset: &[u8], quantity: i64) -> IngestError {
    IngestError::ProtocolViolation {
        policy,
        asset: hex::encode(asset),
        quantity,
    }
}

/// Apply `outputs` in order to `repo`.
///
/// The caller owns atomicity: on error nothing written here may be committed.
pub fn ingest_outputs<W>(
    repo: &mut W,
    scripts: &ScriptSet,
    outputs: &[LedgerOutput],
) -> IngestResult<IngestSummary>
where
    W: RepositoryReader + RepositoryWriter,
{
    let mut summary = IngestSummary::default();
    for output in outputs {
        summary.outputs += 1;
        for amount in &output.amounts {
            let Some(action) = classify(scripts, amount)? else {
                continue;
            };
            debug!(output = %output.output, ?action, slot = output.slot, "classified output");
            let applied = match action {
                Action::BootstrapMint => mint_bootstrap(repo, output, &mut summary),
                Action::BootstrapBurn => burn_bootstrap(repo, output, amount, &mut summary),
                Action::StateMint => apply_state(repo, output, amount, &mut summary),
                Action::StateBurn => burn_state(repo, output, amount, &mut summary),
            };
            match applied {
                Ok(()) => {}
                Err(Skip::Decode(err)) => {
                    warn!(output = %output.output, slot = output.slot, error = %err, "skipping undecodable output");
                    summary.decode_errors += 1;
                }
                Err(Skip::Fatal(err)) => return Err(err),
            }
        }
    }
    advance_cursor(repo, outputs)?;
    Ok(summary)
}

/// Per-amount failure: decode errors skip the amount, everything else aborts
enum Skip {
    Decode(DecodeError),
    Fatal(IngestError),
}

impl From<DecodeError> for Skip {
    fn from(err: DecodeError) -> Self {
        Skip::Decode(err)
    }
}

impl From<StorageError> for Skip {
    fn from(err: StorageError) -> Self {
        Skip::Fatal(err.into())
    }
}

impl From<IngestError> for Skip {
    fn from(err: IngestError) -> Self {
        Skip::Fatal(err)
    }
}

fn datum_of(output: &LedgerOutput) -> Result<&[u8], DecodeError> {
    output
        .datum
        .as_deref()
        .ok_or(DecodeError::Unsupported("output carries no inline datum"))
}

fn state_id_of(amount: &PolicyAmount) -> Result<StateId, DecodeError> {
    H256::from_slice(&amount.asset_name).map_err(|_| DecodeError::Length {
        field: "state token name",
        expected: H256::LEN,
        got: amount.asset_name.len(),
    })
}

fn token_name_of(amount: &PolicyAmount) -> Result<String, DecodeError> {
    String::from_utf8(amount.asset_name.clone())
        .map_err(|_| DecodeError::InvalidUtf8("bootstrap token name"))
}

fn mint_bootstrap<W>(repo: &mut W, output: &LedgerOutput, summary: &mut IngestSummary) -> Result<(), Skip>
where
    W: RepositoryReader + RepositoryWriter,
{
    let datum = BootstrapDatum::decode(datum_of(output)?)?;
    let schema_version = datum.schema_version();
    let params = datum.into_params();

    if let Some(existing) = repo.bootstrap(&params.token_name)? {
        if existing.origin == output.output {
            summary.replayed += 1;
            return Ok(());
        }
    }

    let record = BootstrapRecord {
        params,
        schema_version,
        creation_slot: output.slot,
        origin: output.output,
        invalidation_slot: None,
    };
    let name = record.token_name().to_string();
    match repo.insert_bootstrap(record) {
        Ok(()) => {
            info!(name = %name, slot = output.slot, version = schema_version.as_u8(), "bootstrap created");
            summary.bootstrap_mints += 1;
            Ok(())
        }
        Err(StorageError::Duplicate(_)) => {
            warn!(name = %name, slot = output.slot, "ignoring mint of a name held by a live bootstrap");
            Ok(())
        }
        Err(err) => Err(err.into()),
    }
}

fn burn_bootstrap<W>(
    repo: &mut W,
    output: &LedgerOutput,
    amount: &PolicyAmount,
    summary: &mut IngestSummary,
) -> Result<(), Skip>
where
    W: RepositoryReader + RepositoryWriter,
{
    let name = token_name_of(amount)?;
    match repo.invalidate_bootstrap(&name, output.slot)? {
        Some(_) => {
            info!(name = %name, slot = output.slot, "bootstrap invalidated");
            summary.bootstrap_burns += 1;
        }
        None => warn!(name = %name, slot = output.slot, "burn of unknown or already invalid bootstrap"),
    }
    Ok(())
}

fn burn_state<W>(
    repo: &mut W,
    output: &LedgerOutput,
    amount: &PolicyAmount,
    summary: &mut IngestSummary,
) -> Result<(), Skip>
where
    W: RepositoryReader + RepositoryWriter,
{
    let id = state_id_of(amount)?;
    match repo.invalidate_state(&id, output.slot)? {
        Some(_) => {
            info!(id = %id, slot = output.slot, "state invalidated");
            summary.state_burns += 1;
        }
        None => warn!(id = %id, slot = output.slot, "burn of unknown or already invalid state"),
    }
    Ok(())
}

fn apply_state<W>(
    repo: &mut W,
    output: &LedgerOutput,
    amount: &PolicyAmount,
    summary: &mut IngestSummary,
) -> Result<(), Skip>
where
    W: RepositoryReader + RepositoryWriter,
{
    let id = state_id_of(amount)?;
    let datum = StateDatum::decode(datum_of(output)?)?;

    let existing = repo.state(&id)?;
    if existing.is_some() && repo.history_of(&id)?.iter().any(|e| e.output == output.output) {
        summary.replayed += 1;
        return Ok(());
    }
    match existing {
        Some(_) => {
            repo.append_update(UpdateHistoryEntry {
                state_id: id,
                slot: output.slot,
                countdown: datum.countdown,
                output: output.output,
                certificate_data_hash: datum.certificate_data_hash,
            })?;
            debug!(id = %id, slot = output.slot, countdown = datum.countdown, "state advanced");
            summary.state_updates += 1;
        }
        None => {
            if repo.bootstrap(&datum.bootstrap_token_name)?.is_none() {
                return Err(IngestError::MissingBootstrap(datum.bootstrap_token_name).into());
            }
            repo.insert_state(StateRecord {
                id,
                owner: datum.owner,
                countdown: datum.countdown,
                creation_slot: output.slot,
                current_output: output.output,
                certificate_data_hash: datum.certificate_data_hash,
                batch_size: datum.batch_size,
                bootstrap_token_name: datum.bootstrap_token_name.clone(),
                invalidation_slot: None,
            })?;
            info!(id = %id, channel = %datum.bootstrap_token_name, slot = output.slot, "state forked");
            summary.state_forks += 1;
        }
    }

    let certs = certificates_from(id, output, datum);
    summary.certificates += repo.insert_certificates(certs)?;
    Ok(())
}

fn certificates_from(state_id: StateId, output: &LedgerOutput, datum: StateDatum) -> Vec<Certificate> {
    let creation_time: DateTime<Utc> = output.block_time;
    datum
        .certificates
        .into_iter()
        .enumerate()
        .map(|(position, data)| Certificate {
            state_id,
            data,
            provenance: Provenance {
                slot: output.slot,
                block_hash: output.block_hash,
                block_number: output.block_number,
                output: output.output,
                position: position as u32,
                creation_time,
            },
        })
        .collect()
}

fn advance_cursor<W>(repo: &mut W, outputs: &[LedgerOutput]) -> IngestResult<()>
where
    W: RepositoryReader + RepositoryWriter,
{
    let Some(last) = outputs.iter().max_by_key(|o| o.slot) else {
        return Ok(());
    };
    let behind = repo.cursor()?.map_or(true, |c| c.slot <= last.slot);
    if behind {
        repo.set_cursor(Some(last.point()))?;
    }
    Ok(())
}
