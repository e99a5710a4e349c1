//! Declarative construction of channel parameters and certificates

use notary_primitives::Credential;
use notary_types::{BootstrapParams, CertificateData};

/// Builder for channel parameters
#[derive(Clone, Debug)]
pub struct ChannelBuilder {
    params: BootstrapParams,
}

impl ChannelBuilder {
    /// A public channel: fee 2 ADA every 10 uses, 1000 uses, batches of 10
    pub fn public(name: &str) -> Self {
        Self {
            params: BootstrapParams {
                token_name: name.to_string(),
                allowed_credentials: vec![],
                fee: 2_000_000,
                fee_interval: 10,
                fee_receivers: vec![Credential::from_bytes([0xfe; 28])],
                ttl: 0,
                transaction_limit: 1000,
                batch_size: 10,
            },
        }
    }

    /// Restrict forks to `credentials`
    pub fn allow(mut self, credentials: impl IntoIterator<Item = Credential>) -> Self {
        self.params.allowed_credentials.extend(credentials);
        self
    }

    /// Set the fee
    pub fn fee(mut self, fee: u64) -> Self {
        self.params.fee = fee;
        self
    }

    /// Set how often the fee is due
    pub fn fee_interval(mut self, interval: u64) -> Self {
        self.params.fee_interval = interval;
        self
    }

    /// Replace the fee receivers
    pub fn receivers(mut self, receivers: Vec<Credential>) -> Self {
        self.params.fee_receivers = receivers;
        self
    }

    /// Set the number of uses granted to a fork
    pub fn transaction_limit(mut self, limit: u64) -> Self {
        self.params.transaction_limit = limit;
        self
    }

    /// Set the maximum certificates per use
    pub fn batch_size(mut self, size: u64) -> Self {
        self.params.batch_size = size;
        self
    }

    /// Finish
    pub fn build(self) -> BootstrapParams {
        self.params
    }
}

/// A SHA-256 certificate issued by `issuer`, distinguished by `tag`
pub fn certificate(tag: u8, issuer: &Credential) -> CertificateData {
    CertificateData {
        hash: vec![tag; 32],
        hash_algorithm: "SHA-256".to_string(),
        issuer_credential: issuer.as_bytes().to_vec(),
        extra_metadata: format!("document {}", tag),
    }
}
