//! Transaction assembly
//!
//! Pure construction of the notary transactions from already resolved ledger
//! outputs and repository records. Lookups live in [`crate::NotaryService`].

use crate::builder::TxBuilder;
use crate::config::AssemblyConfig;
use crate::error::{TxError, TxResult};
use crate::types::{MintEntry, TxOutput, UnspentOutput, UnsignedTransaction, ValidityInterval};
use notary_crypto::derive_state_id;
use notary_datum::{
    rolling_hash, BootstrapDatum, BootstrapPolicyRedeemer, StateDatum, StatePolicyRedeemer,
    StateValidatorRedeemer, ToPlutus,
};
use notary_primitives::{Address, Credential, Slot};
use notary_types::{
    BootstrapParams, BootstrapRecord, CertificateData, PolicyAmount, StateId, StateRecord,
};

/// The user paying for and signing a transaction
#[derive(Clone, Copy, Debug)]
pub struct Payer<'a> {
    /// Address change and returned value go to
    pub address: &'a Address,
    /// Payment credential of `address`
    pub credential: Credential,
    /// Key-locked output spent to fund the transaction
    pub funding: &'a UnspentOutput,
}

/// A state record's live head output
#[derive(Clone, Copy, Debug)]
pub struct StateHead<'a> {
    /// Mirrored record
    pub state: &'a StateRecord,
    /// Output currently holding its token
    pub output: &'a UnspentOutput,
}

/// Builds notary transactions against one ledger tip
#[derive(Clone, Copy, Debug)]
pub struct Assembler<'a> {
    config: &'a AssemblyConfig,
    latest_slot: Slot,
}

impl<'a> Assembler<'a> {
    /// Assembler for transactions valid around `latest_slot`
    pub fn new(config: &'a AssemblyConfig, latest_slot: Slot) -> Self {
        Self { config, latest_slot }
    }

    /// Validity window applied to every transaction
    pub fn validity(&self) -> ValidityInterval {
        ValidityInterval::around(
            self.latest_slot,
            self.config.validity_before,
            self.config.validity_after,
        )
    }

    fn builder(&self, payer: &Payer<'_>) -> TxBuilder {
        TxBuilder::new()
            .input(payer.funding.output)
            .validity(self.validity())
            .required_signer(payer.credential)
            .change_address(payer.address.clone())
    }

    /// Fork a new state record from `bootstrap`, embedding `certificates`.
    ///
    /// The funding input names the record; the channel fee is paid once.
    pub fn fork(
        &self,
        payer: &Payer<'_>,
        bootstrap: &BootstrapRecord,
        certificates: Vec<CertificateData>,
    ) -> TxResult<(StateId, UnsignedTransaction)> {
        let params = &bootstrap.params;
        if !bootstrap.is_live() || !bootstrap.schema_version.is_current() {
            return Err(TxError::InvalidRequest(format!(
                "channel {} is not open for new forks",
                params.token_name
            )));
        }
        if !bootstrap.allows(&payer.credential) {
            return Err(TxError::InvalidRequest(format!(
                "credential {} may not fork channel {}",
                payer.credential, params.token_name
            )));
        }
        check_batch(&certificates, params.batch_size, true)?;
        if params.transaction_limit == 0 {
            return Err(TxError::InvalidRequest(format!(
                "channel {} grants no uses",
                params.token_name
            )));
        }
        if payer.funding.output.index > u32::from(u16::MAX) {
            return Err(TxError::InvalidRequest(format!(
                "funding input {} cannot name a state record",
                payer.funding.output
            )));
        }

        let input = payer.funding.output;
        let id = derive_state_id(&input);
        let datum = StateDatum {
            owner: payer.credential,
            countdown: params.transaction_limit - 1,
            certificate_data_hash: rolling_hash(None, &certificates),
            batch_size: params.batch_size,
            bootstrap_token_name: params.token_name.clone(),
            certificates,
        };

        let tx = self
            .builder(payer)
            .reference_input(bootstrap.origin)
            .mint(MintEntry {
                policy: self.config.scripts.state_policy,
                asset_name: id.as_bytes().to_vec(),
                quantity: 1,
                redeemer: StatePolicyRedeemer::Fork { input }.encode()?,
            })
            .output(self.state_output(id, self.config.min_output_lovelace, &datum)?)
            .outputs(self.fee_outputs(params))
            .build()?;
        Ok((id, tx))
    }

    /// Append `certificates` to a state record, paying the channel fee when due
    pub fn update(
        &self,
        payer: &Payer<'_>,
        head: StateHead<'_>,
        bootstrap: &BootstrapRecord,
        certificates: Vec<CertificateData>,
    ) -> TxResult<UnsignedTransaction> {
        let state = head.state;
        if !state.is_usable(bootstrap.schema_version) {
            return Err(TxError::InvalidRequest(format!("state {} is not usable", state.id)));
        }
        if state.owner != payer.credential {
            return Err(TxError::NotFound(format!(
                "state {} owned by {}",
                state.id, payer.credential
            )));
        }
        check_batch(&certificates, state.batch_size, false)?;

        let fee_due = bootstrap.params.is_fee_due(state.countdown);
        let datum = StateDatum {
            owner: state.owner,
            countdown: state.countdown - 1,
            certificate_data_hash: rolling_hash(Some(&state.certificate_data_hash), &certificates),
            batch_size: state.batch_size,
            bootstrap_token_name: state.bootstrap_token_name.clone(),
            certificates,
        };

        let mut builder = self
            .builder(payer)
            .script_input(head.output.output, StateValidatorRedeemer::Update.encode()?)
            .reference_input(bootstrap.origin)
            .output(self.state_output(state.id, head.output.lovelace, &datum)?);
        if fee_due {
            builder = builder.outputs(self.fee_outputs(&bootstrap.params));
        }
        builder.build()
    }

    /// Burn the tokens of `heads`, returning their value to the payer
    pub fn invalidate(&self, payer: &Payer<'_>, heads: &[StateHead<'_>]) -> TxResult<UnsignedTransaction> {
        if heads.is_empty() {
            return Err(TxError::NotFound("no state record to invalidate".to_string()));
        }
        let mut builder = self.builder(payer);
        let mut returned = 0;
        for head in heads {
            if head.state.owner != payer.credential {
                return Err(TxError::NotFound(format!(
                    "state {} owned by {}",
                    head.state.id, payer.credential
                )));
            }
            builder = builder
                .script_input(head.output.output, StateValidatorRedeemer::Invalidate.encode()?)
                .mint(MintEntry {
                    policy: self.config.scripts.state_policy,
                    asset_name: head.state.id.as_bytes().to_vec(),
                    quantity: -1,
                    redeemer: StatePolicyRedeemer::Burn.encode()?,
                });
            returned += head.output.lovelace;
        }
        builder
            .output(TxOutput::payment(payer.address.clone(), returned))
            .build()
    }

    /// Open a new channel with `params`
    pub fn init_channel(&self, payer: &Payer<'_>, params: &BootstrapParams) -> TxResult<UnsignedTransaction> {
        validate_params(params)?;
        let asset_name = params.token_name.as_bytes().to_vec();
        self.builder(payer)
            .mint(MintEntry {
                policy: self.config.scripts.bootstrap_policy,
                asset_name: asset_name.clone(),
                quantity: 1,
                redeemer: BootstrapPolicyRedeemer::Mint.encode()?,
            })
            .output(TxOutput {
                address: self.config.bootstrap_address(),
                lovelace: self.config.min_output_lovelace,
                assets: vec![PolicyAmount {
                    policy: self.config.scripts.bootstrap_policy,
                    asset_name,
                    quantity: 1,
                }],
                datum: Some(BootstrapDatum::encode(params)?),
            })
            .build()
    }

    fn state_output(&self, id: StateId, lovelace: u64, datum: &StateDatum) -> TxResult<TxOutput> {
        Ok(TxOutput {
            address: self.config.state_address(),
            lovelace: lovelace.max(self.config.min_output_lovelace),
            assets: vec![PolicyAmount {
                policy: self.config.scripts.state_policy,
                asset_name: id.as_bytes().to_vec(),
                quantity: 1,
            }],
            datum: Some(datum.encode()?),
        })
    }

    /// One payment per receiver of the even fee split; remainder dropped
    fn fee_outputs(&self, params: &BootstrapParams) -> Vec<TxOutput> {
        let share = params.fee_share();
        if share == 0 {
            return Vec::new();
        }
        params
            .fee_receivers
            .iter()
            .map(|r| TxOutput::payment(Address::from_key_credential(self.config.network_id, r), share))
            .collect()
    }
}

fn check_batch(certificates: &[CertificateData], batch_size: u64, allow_empty: bool) -> TxResult<()> {
    if certificates.is_empty() && !allow_empty {
        return Err(TxError::InvalidRequest("no certificates".to_string()));
    }
    if certificates.len() as u64 > batch_size {
        return Err(TxError::InvalidRequest(format!(
            "{} certificates exceed batch size {}",
            certificates.len(),
            batch_size
        )));
    }
    Ok(())
}

/// Reject channel parameters no fork could use
pub fn validate_params(params: &BootstrapParams) -> TxResult<()> {
    let problem = if params.token_name.is_empty() {
        "empty token name"
    } else if params.token_name.len() > 32 {
        "token name longer than 32 bytes"
    } else if params.fee_interval == 0 {
        "fee interval must be positive"
    } else if params.transaction_limit == 0 {
        "transaction limit must be positive"
    } else if params.batch_size == 0 {
        "batch size must be positive"
    } else if params.fee > 0 && params.fee_receivers.is_empty() {
        "fee without receivers"
    } else {
        return Ok(());
    };
    Err(TxError::InvalidRequest(format!(
        "channel {:?}: {}",
        params.token_name, problem
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use notary_primitives::{OutputRef, PolicyId, H256};
    use notary_types::{ScriptSet, SchemaVersion};

    fn config() -> AssemblyConfig {
        AssemblyConfig::new(
            0,
            ScriptSet {
                bootstrap_policy: PolicyId::from_bytes([0xb0; 28]),
                state_policy: PolicyId::from_bytes([0x50; 28]),
                bootstrap_validator: PolicyId::from_bytes([0xb1; 28]),
                state_validator: PolicyId::from_bytes([0x51; 28]),
            },
        )
    }

    fn user() -> Credential {
        Credential::from_bytes([0x0a; 28])
    }

    fn funding(address: &Address) -> UnspentOutput {
        UnspentOutput {
            output: OutputRef::new(H256::from_bytes([0xf1; 32]), 2),
            address: address.clone(),
            lovelace: 50_000_000,
            assets: vec![],
            datum: None,
        }
    }

    fn params() -> BootstrapParams {
        BootstrapParams {
            token_name: "main".to_string(),
            allowed_credentials: vec![],
            fee: 2_000_001,
            fee_interval: 10,
            fee_receivers: vec![Credential::from_bytes([1; 28]), Credential::from_bytes([2; 28])],
            ttl: 0,
            transaction_limit: 1000,
            batch_size: 2,
        }
    }

    fn channel() -> BootstrapRecord {
        BootstrapRecord {
            params: params(),
            schema_version: SchemaVersion::Current,
            creation_slot: 100,
            origin: OutputRef::new(H256::from_bytes([0xc0; 32]), 0),
            invalidation_slot: None,
        }
    }

    fn cert(tag: u8) -> CertificateData {
        CertificateData {
            hash: vec![tag; 32],
            hash_algorithm: "SHA-256".to_string(),
            issuer_credential: vec![tag; 28],
            extra_metadata: String::new(),
        }
    }

    fn state(countdown: u64) -> StateRecord {
        StateRecord {
            id: H256::from_bytes([0x1d; 32]),
            owner: user(),
            countdown,
            creation_slot: 101,
            current_output: OutputRef::new(H256::from_bytes([0x1e; 32]), 0),
            certificate_data_hash: H256::from_bytes([0x11; 32]),
            batch_size: 2,
            bootstrap_token_name: "main".to_string(),
            invalidation_slot: None,
        }
    }

    fn head_output(state: &StateRecord, config: &AssemblyConfig) -> UnspentOutput {
        UnspentOutput {
            output: state.current_output,
            address: config.state_address(),
            lovelace: 3_000_000,
            assets: vec![PolicyAmount {
                policy: config.scripts.state_policy,
                asset_name: state.id.as_bytes().to_vec(),
                quantity: 1,
            }],
            datum: None,
        }
    }

    // ==================== Fork ====================

    #[test]
    fn test_fork_names_record_after_funding_input() {
        let config = config();
        let address = Address::from_key_credential(0, &user());
        let funding = funding(&address);
        let payer = Payer { address: &address, credential: user(), funding: &funding };

        let (id, tx) = Assembler::new(&config, 500).fork(&payer, &channel(), vec![cert(1)]).unwrap();
        assert_eq!(id, derive_state_id(&funding.output));
        assert_eq!(tx.validity, ValidityInterval { invalid_before: 490, invalid_hereafter: 1100 });
        assert_eq!(tx.reference_inputs, vec![channel().origin]);
        assert_eq!(tx.mint.len(), 1);
        assert_eq!(tx.mint[0].quantity, 1);
        assert_eq!(
            StatePolicyRedeemer::decode(&tx.mint[0].redeemer).unwrap(),
            StatePolicyRedeemer::Fork { input: funding.output }
        );

        let datum = StateDatum::decode(tx.outputs[0].datum.as_deref().unwrap()).unwrap();
        assert_eq!(datum.countdown, 999);
        assert_eq!(datum.certificate_data_hash, rolling_hash(None, &[cert(1)]));

        // 2_000_001 split two ways, remainder dropped
        let receiver = Address::from_key_credential(0, &Credential::from_bytes([1; 28]));
        assert_eq!(tx.paid_to(&receiver), 1_000_000);
        assert_eq!(tx.outputs.len(), 3);
    }

    #[test]
    fn test_fork_rejects_oversized_batch() {
        let config = config();
        let address = Address::from_key_credential(0, &user());
        let funding = funding(&address);
        let payer = Payer { address: &address, credential: user(), funding: &funding };
        let result = Assembler::new(&config, 0).fork(&payer, &channel(), vec![cert(1), cert(2), cert(3)]);
        assert!(matches!(result, Err(TxError::InvalidRequest(_))));
    }

    #[test]
    fn test_fork_custom_channel_checks_credential() {
        let config = config();
        let address = Address::from_key_credential(0, &user());
        let funding = funding(&address);
        let payer = Payer { address: &address, credential: user(), funding: &funding };
        let mut custom = channel();
        custom.params.allowed_credentials = vec![Credential::from_bytes([0x0b; 28])];
        let result = Assembler::new(&config, 0).fork(&payer, &custom, vec![]);
        assert!(matches!(result, Err(TxError::InvalidRequest(_))));
    }

    // ==================== Update ====================

    #[test]
    fn test_update_without_fee() {
        let config = config();
        let address = Address::from_key_credential(0, &user());
        let funding = funding(&address);
        let payer = Payer { address: &address, credential: user(), funding: &funding };
        let state = state(999);
        let head = head_output(&state, &config);

        let tx = Assembler::new(&config, 0)
            .update(&payer, StateHead { state: &state, output: &head }, &channel(), vec![cert(2)])
            .unwrap();
        assert_eq!(tx.outputs.len(), 1);
        assert!(tx.mint.is_empty());
        assert_eq!(tx.inputs[1].output, state.current_output);

        let datum = StateDatum::decode(tx.outputs[0].datum.as_deref().unwrap()).unwrap();
        assert_eq!(datum.countdown, 998);
        assert_eq!(
            datum.certificate_data_hash,
            rolling_hash(Some(&state.certificate_data_hash), &[cert(2)])
        );
        assert_eq!(tx.outputs[0].lovelace, 3_000_000);
    }

    #[test]
    fn test_update_pays_fee_when_due() {
        let config = config();
        let address = Address::from_key_credential(0, &user());
        let funding = funding(&address);
        let payer = Payer { address: &address, credential: user(), funding: &funding };
        let state = state(990);
        let head = head_output(&state, &config);

        let tx = Assembler::new(&config, 0)
            .update(&payer, StateHead { state: &state, output: &head }, &channel(), vec![cert(2)])
            .unwrap();
        assert_eq!(tx.outputs.len(), 3);
        let receiver = Address::from_key_credential(0, &Credential::from_bytes([2; 28]));
        assert_eq!(tx.paid_to(&receiver), 1_000_000);
    }

    #[test]
    fn test_update_rejects_empty_and_exhausted() {
        let config = config();
        let address = Address::from_key_credential(0, &user());
        let funding = funding(&address);
        let payer = Payer { address: &address, credential: user(), funding: &funding };
        let assembler = Assembler::new(&config, 0);

        let live = state(5);
        let head = head_output(&live, &config);
        let empty = assembler.update(&payer, StateHead { state: &live, output: &head }, &channel(), vec![]);
        assert!(matches!(empty, Err(TxError::InvalidRequest(_))));

        let exhausted = state(0);
        let result = assembler.update(&payer, StateHead { state: &exhausted, output: &head }, &channel(), vec![cert(1)]);
        assert!(matches!(result, Err(TxError::InvalidRequest(_))));
    }

    // ==================== Invalidate ====================

    #[test]
    fn test_invalidate_returns_locked_value() {
        let config = config();
        let address = Address::from_key_credential(0, &user());
        let funding = funding(&address);
        let payer = Payer { address: &address, credential: user(), funding: &funding };
        let state = state(5);
        let head = head_output(&state, &config);

        let tx = Assembler::new(&config, 0)
            .invalidate(&payer, &[StateHead { state: &state, output: &head }])
            .unwrap();
        assert_eq!(tx.mint[0].quantity, -1);
        assert_eq!(tx.paid_to(&address), 3_000_000);
        assert_eq!(
            tx.inputs[1].redeemer.as_deref(),
            Some(&StateValidatorRedeemer::Invalidate.encode().unwrap()[..])
        );
    }

    // ==================== Channel init ====================

    #[test]
    fn test_init_channel_mints_bootstrap_token() {
        let config = config();
        let address = Address::from_key_credential(0, &user());
        let funding = funding(&address);
        let payer = Payer { address: &address, credential: user(), funding: &funding };

        let tx = Assembler::new(&config, 0).init_channel(&payer, &params()).unwrap();
        assert_eq!(tx.mint[0].asset_name, b"main".to_vec());
        assert_eq!(tx.outputs[0].address, config.bootstrap_address());
        let datum = BootstrapDatum::decode(tx.outputs[0].datum.as_deref().unwrap()).unwrap();
        assert_eq!(datum.params(), &params());
        assert_eq!(datum.schema_version(), SchemaVersion::Current);
    }

    #[test]
    fn test_invalid_params_rejected() {
        let mut p = params();
        p.fee_interval = 0;
        assert!(matches!(validate_params(&p), Err(TxError::InvalidRequest(_))));
        let mut p = params();
        p.token_name.clear();
        assert!(validate_params(&p).is_err());
        assert!(validate_params(&params()).is_ok());
    }
}
