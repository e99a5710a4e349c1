//! Fee and selection engine
//!
//! Both decisions rank channels by amortized cost, the expected fee per 100
//! uses (see [`notary_types::amortized_cost`]). Lower is cheaper.

use notary_primitives::Credential;
use notary_types::{BootstrapRecord, SchemaVersion, StateRecord};
use std::cmp::Ordering;

/// A state record paired with the channel it was forked from
#[derive(Clone, Copy, Debug)]
pub struct StateCandidate<'a> {
    /// The state record
    pub state: &'a StateRecord,
    /// Its parent channel
    pub bootstrap: &'a BootstrapRecord,
}

impl StateCandidate<'_> {
    /// Usable for new certificates
    pub fn is_usable(&self) -> bool {
        self.state.is_usable(self.bootstrap.schema_version)
    }

    /// Whether the next use pays the channel fee
    pub fn next_use_fee_due(&self) -> bool {
        self.bootstrap.params.is_fee_due(self.state.countdown)
    }
}

fn cost_order(a: &BootstrapRecord, b: &BootstrapRecord) -> Ordering {
    a.amortized_cost()
        .total_cmp(&b.amortized_cost())
        .then_with(|| a.token_name().as_bytes().cmp(b.token_name().as_bytes()))
        .then_with(|| a.creation_slot.cmp(&b.creation_slot))
}

/// Cheapest live channel `credential` may fork under `schema_version`.
///
/// Candidates are the public channels plus the custom channels listing
/// `credential`. Equal costs resolve by ascending token name, then creation slot.
pub fn select_cheapest_bootstrap<'a, I>(
    bootstraps: I,
    credential: &Credential,
    schema_version: SchemaVersion,
) -> Option<&'a BootstrapRecord>
where
    I: IntoIterator<Item = &'a BootstrapRecord>,
{
    bootstraps
        .into_iter()
        .filter(|b| b.is_live())
        .filter(|b| b.is_public() || b.params.allowed_credentials.contains(credential))
        .filter(|b| b.schema_version == schema_version)
        .min_by(|a, b| cost_order(a, b))
}

/// Pick the state record to reuse among `candidates`.
///
/// With a single usable record it is returned as is. Otherwise the first
/// record (in input order) whose next use is free wins, even if a later free
/// record belongs to a cheaper channel. Only when every next use is fee-due is
/// the record with the lowest channel fee chosen.
pub fn select_cheapest_state<'a>(candidates: &[StateCandidate<'a>]) -> Option<StateCandidate<'a>> {
    let usable: Vec<StateCandidate<'a>> = candidates.iter().copied().filter(|c| c.is_usable()).collect();
    if usable.len() == 1 {
        return usable.first().copied();
    }
    if let Some(free) = usable.iter().find(|c| !c.next_use_fee_due()) {
        return Some(*free);
    }
    usable.into_iter().min_by_key(|c| c.bootstrap.params.fee)
}

/// Outcome of the persist decision
#[derive(Clone, Copy, Debug)]
pub enum Decision<'a> {
    /// Fork a new state record from this channel
    Fork(&'a BootstrapRecord),
    /// Use an existing state record
    Reuse {
        /// Record and channel to use
        candidate: StateCandidate<'a>,
        /// Whether this use pays the channel fee
        fee_due: bool,
    },
}

/// Decide whether to reuse one of the user's state records or fork a new one.
///
/// `owned` are the user's records with their channels; `cheapest` is the
/// cheapest channel the user could fork right now. Returns `None` when there
/// is nothing to reuse and nothing to fork.
pub fn decide<'a>(
    owned: &[StateCandidate<'a>],
    cheapest: Option<&'a BootstrapRecord>,
) -> Option<Decision<'a>> {
    let usable: Vec<StateCandidate<'a>> = owned.iter().copied().filter(|c| c.is_usable()).collect();
    let reuse = |candidate: StateCandidate<'a>| Decision::Reuse {
        candidate,
        fee_due: candidate.next_use_fee_due(),
    };
    match usable.len() {
        0 => cheapest.map(Decision::Fork),
        1 => Some(reuse(usable[0])),
        _ => {
            let chosen = select_cheapest_state(&usable)?;
            if chosen.next_use_fee_due() {
                if let Some(fresh) = cheapest {
                    if fresh.amortized_cost() < chosen.bootstrap.amortized_cost() {
                        return Some(Decision::Fork(fresh));
                    }
                }
            }
            Some(reuse(chosen))
        }
    }
}
