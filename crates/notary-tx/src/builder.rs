//! Transaction builder

use crate::error::{TxError, TxResult};
use crate::types::{MintEntry, TxInput, TxOutput, UnsignedTransaction, ValidityInterval};
use notary_primitives::{Address, Credential, OutputRef};

/// Transaction builder with fluent API
#[derive(Debug, Clone, Default)]
pub struct TxBuilder {
    inputs: Vec<TxInput>,
    reference_inputs: Vec<OutputRef>,
    outputs: Vec<TxOutput>,
    mint: Vec<MintEntry>,
    validity: Option<ValidityInterval>,
    required_signers: Vec<Credential>,
    change_address: Option<Address>,
}

impl TxBuilder {
    /// Create an empty builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Spend a key-locked output
    pub fn input(mut self, output: OutputRef) -> Self {
        self.inputs.push(TxInput { output, redeemer: None });
        self
    }

    /// Spend a script-locked output with `redeemer`
    pub fn script_input(mut self, output: OutputRef, redeemer: Vec<u8>) -> Self {
        self.inputs.push(TxInput {
            output,
            redeemer: Some(redeemer),
        });
        self
    }

    /// Read an output without spending it
    pub fn reference_input(mut self, output: OutputRef) -> Self {
        self.reference_inputs.push(output);
        self
    }

    /// Add an output
    pub fn output(mut self, output: TxOutput) -> Self {
        self.outputs.push(output);
        self
    }

    /// Add several outputs
    pub fn outputs(mut self, outputs: impl IntoIterator<Item = TxOutput>) -> Self {
        self.outputs.extend(outputs);
        self
    }

    /// Mint or burn an asset
    pub fn mint(mut self, entry: MintEntry) -> Self {
        self.mint.push(entry);
        self
    }

    /// Set the validity window
    pub fn validity(mut self, validity: ValidityInterval) -> Self {
        self.validity = Some(validity);
        self
    }

    /// Require a signature from `credential`
    pub fn required_signer(mut self, credential: Credential) -> Self {
        if !self.required_signers.contains(&credential) {
            self.required_signers.push(credential);
        }
        self
    }

    /// Set where leftover value returns
    pub fn change_address(mut self, address: Address) -> Self {
        self.change_address = Some(address);
        self
    }

    /// Build the unsigned transaction
    ///
    /// # Errors
    ///
    /// Returns [`TxError::InvalidRequest`] if:
    /// - there are no inputs
    /// - the validity window or change address is missing
    /// - an input is spent twice
    pub fn build(self) -> TxResult<UnsignedTransaction> {
        if self.inputs.is_empty() {
            return Err(TxError::InvalidRequest("transaction has no inputs".to_string()));
        }
        let validity = self
            .validity
            .ok_or_else(|| TxError::InvalidRequest("missing validity window".to_string()))?;
        let change_address = self
            .change_address
            .ok_or_else(|| TxError::InvalidRequest("missing change address".to_string()))?;
        for (i, input) in self.inputs.iter().enumerate() {
            if self.inputs[..i].iter().any(|other| other.output == input.output) {
                return Err(TxError::InvalidRequest(format!("input {} spent twice", input.output)));
            }
        }

        Ok(UnsignedTransaction {
            inputs: self.inputs,
            reference_inputs: self.reference_inputs,
            outputs: self.outputs,
            mint: self.mint,
            validity,
            required_signers: self.required_signers,
            change_address,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use notary_primitives::H256;

    fn addr() -> Address {
        Address::from_key_credential(0, &Credential::from_bytes([1; 28]))
    }

    #[test]
    fn test_build_complete() {
        let tx = TxBuilder::new()
            .input(OutputRef::new(H256::ZERO, 0))
            .script_input(OutputRef::new(H256::ZERO, 1), vec![0xd8, 0x79, 0x80])
            .reference_input(OutputRef::new(H256::ZERO, 2))
            .output(TxOutput::payment(addr(), 1))
            .validity(ValidityInterval::around(50, 10, 600))
            .required_signer(Credential::from_bytes([1; 28]))
            .required_signer(Credential::from_bytes([1; 28]))
            .change_address(addr())
            .build()
            .unwrap();
        assert_eq!(tx.inputs.len(), 2);
        assert!(tx.inputs[1].redeemer.is_some());
        assert_eq!(tx.required_signers.len(), 1);
        assert_eq!(tx.validity.invalid_before, 40);
    }

    #[test]
    fn test_missing_fields_rejected() {
        match TxBuilder::new().change_address(addr()).build() {
            Err(TxError::InvalidRequest(msg)) => assert!(msg.contains("no inputs")),
            other => panic!("Expected InvalidRequest, got {:?}", other),
        }
        let no_window = TxBuilder::new().input(OutputRef::default()).change_address(addr()).build();
        assert!(matches!(no_window, Err(TxError::InvalidRequest(_))));
    }

    #[test]
    fn test_double_spend_rejected() {
        let result = TxBuilder::new()
            .input(OutputRef::default())
            .input(OutputRef::default())
            .validity(ValidityInterval::around(0, 0, 1))
            .change_address(addr())
            .build();
        assert!(matches!(result, Err(TxError::InvalidRequest(_))));
    }
}
