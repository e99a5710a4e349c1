//! Operation API
//!
//! [`NotaryService`] resolves what each operation needs from the repository
//! mirror and the ledger client, then hands the pieces to [`Assembler`].
//! The mirror is a cache: a stale read produces a transaction the ledger
//! rejects, never a corrupted mirror.

use crate::assembly::{validate_params, Assembler, Payer, StateHead};
use crate::config::AssemblyConfig;
use crate::error::{TxError, TxResult};
use crate::ledger::LedgerClient;
use crate::types::{UnspentOutput, UnsignedTransaction};
use notary_core::{decide, select_cheapest_bootstrap, Decision, StateCandidate};
use notary_metrics::{names, Metrics};
use notary_primitives::{Address, Credential};
use notary_storage::RepositoryReader;
use notary_types::{BootstrapParams, BootstrapRecord, CertificateData, SchemaVersion, StateId, StateRecord};
use std::sync::Arc;
use tracing::{debug, info};

/// User-facing notary operations
pub struct NotaryService<R> {
    repo: Arc<R>,
    ledger: Arc<dyn LedgerClient>,
    config: AssemblyConfig,
    metrics: Arc<Metrics>,
}

impl<R: RepositoryReader + Send + Sync> NotaryService<R> {
    /// Create a service reading `repo` and querying `ledger`
    pub fn new(repo: Arc<R>, ledger: Arc<dyn LedgerClient>, config: AssemblyConfig) -> Self {
        Self {
            repo,
            ledger,
            config,
            metrics: Arc::new(Metrics::new()),
        }
    }

    /// Record into a shared metrics collector
    pub fn with_metrics(mut self, metrics: Arc<Metrics>) -> Self {
        self.metrics = metrics;
        self
    }

    /// Assembly configuration
    pub fn config(&self) -> &AssemblyConfig {
        &self.config
    }

    // ==================== Operations ====================

    /// Notarize `certificates` for `user` at the lowest expected cost.
    ///
    /// Reuses one of the user's state records or forks a new one, following
    /// the fee/selection engine.
    pub async fn persist_certificates(
        &self,
        user: &Address,
        certificates: Vec<CertificateData>,
    ) -> TxResult<UnsignedTransaction> {
        let credential = user.credential()?;
        if certificates.is_empty() {
            return Err(TxError::InvalidRequest("no certificates".to_string()));
        }

        let bootstraps = self.repo.bootstraps()?;
        let owned = self.owned_usable(&credential, &bootstraps)?;
        let candidates: Vec<StateCandidate<'_>> = owned
            .iter()
            .map(|(state, bootstrap)| StateCandidate { state, bootstrap })
            .collect();
        let cheapest = select_cheapest_bootstrap(&bootstraps, &credential, SchemaVersion::Current);

        match decide(&candidates, cheapest) {
            Some(Decision::Fork(bootstrap)) => {
                debug!(channel = bootstrap.token_name(), "persisting through a new fork");
                self.fork_from(user, credential, bootstrap, certificates).await
            }
            Some(Decision::Reuse { candidate, fee_due }) => {
                debug!(state = %candidate.state.id, fee_due, "persisting through an existing state");
                self.update_state(user, credential, candidate.state, candidate.bootstrap, certificates)
                    .await
            }
            None => Err(TxError::NotFound(format!(
                "no channel available to credential {}",
                credential
            ))),
        }
    }

    /// Fork a new state record, from `channel` or the cheapest eligible one
    pub async fn fork(
        &self,
        user: &Address,
        certificates: Vec<CertificateData>,
        channel: Option<&str>,
    ) -> TxResult<UnsignedTransaction> {
        let credential = user.credential()?;
        let bootstrap = match channel {
            Some(name) => self
                .repo
                .bootstrap(name)?
                .filter(|b| b.is_live())
                .ok_or_else(|| TxError::NotFound(format!("channel {}", name)))?,
            None => {
                let bootstraps = self.repo.bootstraps()?;
                select_cheapest_bootstrap(&bootstraps, &credential, SchemaVersion::Current)
                    .cloned()
                    .ok_or_else(|| {
                        TxError::NotFound(format!("no channel available to credential {}", credential))
                    })?
            }
        };
        self.fork_from(user, credential, &bootstrap, certificates).await
    }

    /// Burn one of the user's state records
    pub async fn invalidate(&self, user: &Address, id: &StateId) -> TxResult<UnsignedTransaction> {
        let credential = user.credential()?;
        let state = self
            .repo
            .state(id)?
            .filter(|s| s.owner == credential)
            .ok_or_else(|| TxError::NotFound(format!("state {}", id)))?;
        if !state.is_live() {
            return Err(TxError::InvalidRequest(format!("state {} already invalidated", id)));
        }

        let funding = self.funding(user).await?;
        let head = self.locate_head(&state).await?;
        let tx = self
            .assembler()
            .await?
            .invalidate(&self.payer(user, credential, &funding), &[StateHead { state: &state, output: &head }])?;
        self.assembled("invalidate", &tx);
        Ok(tx)
    }

    /// Burn every usable state record the user owns, in one transaction
    pub async fn invalidate_all(&self, user: &Address) -> TxResult<UnsignedTransaction> {
        let credential = user.credential()?;
        let bootstraps = self.repo.bootstraps()?;
        let owned = self.owned_usable(&credential, &bootstraps)?;
        if owned.is_empty() {
            return Err(TxError::NotFound(format!("no usable state owned by {}", credential)));
        }

        let funding = self.funding(user).await?;
        let mut outputs = Vec::with_capacity(owned.len());
        for (state, _) in &owned {
            outputs.push(self.locate_head(state).await?);
        }
        let heads: Vec<StateHead<'_>> = owned
            .iter()
            .zip(&outputs)
            .map(|((state, _), output)| StateHead { state, output })
            .collect();
        let tx = self
            .assembler()
            .await?
            .invalidate(&self.payer(user, credential, &funding), &heads)?;
        self.assembled("invalidate_all", &tx);
        Ok(tx)
    }

    /// Open a new channel.
    ///
    /// The name is checked against the mirror, so a name whose mint is still
    /// pending confirmation elsewhere is only caught by the ledger.
    pub async fn init_channel(&self, user: &Address, params: BootstrapParams) -> TxResult<UnsignedTransaction> {
        let credential = user.credential()?;
        validate_params(&params)?;
        if let Some(existing) = self.repo.bootstrap(&params.token_name)? {
            if existing.is_live() {
                return Err(TxError::AlreadyExists(format!("channel {}", params.token_name)));
            }
        }

        let funding = self.funding(user).await?;
        let tx = self
            .assembler()
            .await?
            .init_channel(&self.payer(user, credential, &funding), &params)?;
        info!(channel = %params.token_name, "channel init assembled");
        self.assembled("init_channel", &tx);
        Ok(tx)
    }

    // ==================== Helpers ====================

    async fn fork_from(
        &self,
        user: &Address,
        credential: Credential,
        bootstrap: &BootstrapRecord,
        certificates: Vec<CertificateData>,
    ) -> TxResult<UnsignedTransaction> {
        let funding = self.funding(user).await?;
        self.ledger
            .get_output(&bootstrap.origin)
            .await?
            .ok_or_else(|| TxError::NotFound(format!("channel output {}", bootstrap.origin)))?;
        let (id, tx) = self
            .assembler()
            .await?
            .fork(&self.payer(user, credential, &funding), bootstrap, certificates)?;
        info!(state = %id, channel = bootstrap.token_name(), "fork assembled");
        self.assembled("fork", &tx);
        Ok(tx)
    }

    async fn update_state(
        &self,
        user: &Address,
        credential: Credential,
        state: &StateRecord,
        bootstrap: &BootstrapRecord,
        certificates: Vec<CertificateData>,
    ) -> TxResult<UnsignedTransaction> {
        let funding = self.funding(user).await?;
        let head = self.locate_head(state).await?;
        let tx = self.assembler().await?.update(
            &self.payer(user, credential, &funding),
            StateHead { state, output: &head },
            bootstrap,
            certificates,
        )?;
        self.assembled("update", &tx);
        Ok(tx)
    }

    /// The user's usable state records paired with their channels
    fn owned_usable(
        &self,
        credential: &Credential,
        bootstraps: &[BootstrapRecord],
    ) -> TxResult<Vec<(StateRecord, BootstrapRecord)>> {
        let mut owned = Vec::new();
        for state in self.repo.state_records_of(credential)? {
            let parent = bootstraps
                .iter()
                .filter(|b| b.token_name() == state.bootstrap_token_name && b.creation_slot <= state.creation_slot)
                .max_by_key(|b| b.creation_slot);
            if let Some(bootstrap) = parent {
                if state.is_usable(bootstrap.schema_version) {
                    owned.push((state, bootstrap.clone()));
                }
            }
        }
        Ok(owned)
    }

    /// First key-locked output at the user's address without native assets
    async fn funding(&self, user: &Address) -> TxResult<UnspentOutput> {
        let mut unspent = self.ledger.list_unspent(user).await?;
        unspent.retain(|u| u.assets.is_empty());
        unspent.sort_by_key(|u| u.output);
        unspent
            .into_iter()
            .next()
            .ok_or_else(|| TxError::NotFound(format!("spendable input at {}", user)))
    }

    /// The unique live output holding the state token of `state`
    async fn locate_head(&self, state: &StateRecord) -> TxResult<UnspentOutput> {
        let policy = self.config.scripts.state_policy;
        let mut holding: Vec<UnspentOutput> = self
            .ledger
            .list_unspent(&self.config.state_address())
            .await?
            .into_iter()
            .filter(|u| u.holds(&policy, state.id.as_bytes()))
            .collect();
        match holding.len() {
            0 => Err(TxError::NotFound(format!("live output of state {}", state.id))),
            1 => Ok(holding.remove(0)),
            n => Err(TxError::InvalidRequest(format!(
                "state {} token found in {} outputs",
                state.id, n
            ))),
        }
    }

    async fn assembler(&self) -> TxResult<Assembler<'_>> {
        let latest = self.ledger.latest_slot().await?;
        Ok(Assembler::new(&self.config, latest))
    }

    fn payer<'a>(&self, address: &'a Address, credential: Credential, funding: &'a UnspentOutput) -> Payer<'a> {
        Payer {
            address,
            credential,
            funding,
        }
    }

    fn assembled(&self, operation: &str, tx: &UnsignedTransaction) {
        self.metrics.counter(&names::assembly(operation), 1);
        debug!(
            operation,
            inputs = tx.inputs.len(),
            outputs = tx.outputs.len(),
            "transaction assembled"
        );
    }
}
