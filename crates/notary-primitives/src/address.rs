//! Ledger addresses and the payment credential carried inside them
//!
//! An address is a header byte followed by one or two 28-byte credentials.
//! The high nibble of the header selects the address kind, the low nibble the
//! network. Base, pointer and enterprise addresses carry a payment credential
//! right after the header; reward and bootstrap-era addresses do not.

use crate::hash::H224;
use std::fmt;
use thiserror::Error;

/// Credential identifying a user or a script (28 bytes)
pub type Credential = H224;

/// Hash of an on-chain script
pub type ScriptHash = H224;

/// Minting policy identifier
pub type PolicyId = H224;

/// Address parsing error
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AddressError {
    /// Invalid hex string
    #[error("invalid hex string: {0}")]
    InvalidHex(String),
    /// Address too short for its header
    #[error("invalid address length: {0} bytes")]
    InvalidLength(usize),
    /// Address kind carries no payment credential
    #[error("address kind {0:#x} has no payment credential")]
    NoPaymentCredential(u8),
}

/// Payment part of an address
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PaymentCredential {
    /// Verification-key hash
    Key(Credential),
    /// Script hash
    Script(ScriptHash),
}

impl PaymentCredential {
    /// The raw 28-byte hash regardless of kind
    pub fn hash(&self) -> Credential {
        match self {
            PaymentCredential::Key(h) | PaymentCredential::Script(h) => *h,
        }
    }

    /// Whether this is a script credential
    pub fn is_script(&self) -> bool {
        matches!(self, PaymentCredential::Script(_))
    }
}

/// Raw ledger address bytes
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Address(Vec<u8>);

const KIND_ENTERPRISE_KEY: u8 = 0x6;
const KIND_ENTERPRISE_SCRIPT: u8 = 0x7;

impl Address {
    /// Create address from raw bytes, validating the header against the length
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self, AddressError> {
        let header = *bytes.first().ok_or(AddressError::InvalidLength(0))?;
        let min_len = match header >> 4 {
            0x0..=0x3 => 1 + 2 * H224::LEN,
            0x4..=0x7 | 0xe | 0xf => 1 + H224::LEN,
            _ => 1,
        };
        if bytes.len() < min_len {
            return Err(AddressError::InvalidLength(bytes.len()));
        }
        Ok(Address(bytes))
    }

    /// Parse address from hex string (with or without 0x prefix)
    pub fn from_hex(s: &str) -> Result<Self, AddressError> {
        let s = s.strip_prefix("0x").unwrap_or(s);
        let bytes = hex::decode(s).map_err(|e| AddressError::InvalidHex(e.to_string()))?;
        Self::from_bytes(bytes)
    }

    /// Enterprise address paying to a verification-key credential
    pub fn from_key_credential(network_id: u8, credential: &Credential) -> Self {
        Self::enterprise(KIND_ENTERPRISE_KEY, network_id, credential)
    }

    /// Enterprise address locked by a script
    pub fn from_script_hash(network_id: u8, script: &ScriptHash) -> Self {
        Self::enterprise(KIND_ENTERPRISE_SCRIPT, network_id, script)
    }

    fn enterprise(kind: u8, network_id: u8, hash: &H224) -> Self {
        let mut bytes = Vec::with_capacity(1 + H224::LEN);
        bytes.push((kind << 4) | (network_id & 0x0f));
        bytes.extend_from_slice(hash.as_bytes());
        Address(bytes)
    }

    /// Header byte
    pub fn header(&self) -> u8 {
        self.0[0]
    }

    /// Address kind (high nibble of the header)
    pub fn kind(&self) -> u8 {
        self.header() >> 4
    }

    /// Network id (low nibble of the header)
    pub fn network_id(&self) -> u8 {
        self.header() & 0x0f
    }

    /// Extract the payment credential
    pub fn payment_credential(&self) -> Result<PaymentCredential, AddressError> {
        let kind = self.kind();
        if kind > KIND_ENTERPRISE_SCRIPT {
            return Err(AddressError::NoPaymentCredential(kind));
        }
        let hash = H224::from_slice(&self.0[1..1 + H224::LEN])
            .map_err(|_| AddressError::InvalidLength(self.0.len()))?;
        if kind % 2 == 0 {
            Ok(PaymentCredential::Key(hash))
        } else {
            Ok(PaymentCredential::Script(hash))
        }
    }

    /// Shorthand for the payment credential hash
    pub fn credential(&self) -> Result<Credential, AddressError> {
        self.payment_credential().map(|c| c.hash())
    }

    /// Get as byte slice
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Convert to hex string without prefix
    pub fn to_hex(&self) -> String {
        hex::encode(&self.0)
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", self.to_hex())
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl AsRef<[u8]> for Address {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

#[cfg(feature = "serde")]
mod serde_impl {
    use super::*;
    use serde::{de, Deserialize, Deserializer, Serialize, Serializer};

    impl Serialize for Address {
        fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
            serializer.serialize_str(&self.to_hex())
        }
    }

    impl<'de> Deserialize<'de> for Address {
        fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
            let s = String::deserialize(deserializer)?;
            Address::from_hex(&s).map_err(de::Error::custom)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_address(header: u8) -> Vec<u8> {
        let mut bytes = vec![header];
        bytes.extend_from_slice(&[0x11; 28]);
        bytes.extend_from_slice(&[0x22; 28]);
        bytes
    }

    // ==================== Credential extraction ====================

    #[test]
    fn test_base_address_key_credential() {
        let addr = Address::from_bytes(base_address(0x00)).unwrap();
        assert_eq!(
            addr.payment_credential().unwrap(),
            PaymentCredential::Key(H224::from_bytes([0x11; 28]))
        );
        assert_eq!(addr.network_id(), 0);
    }

    #[test]
    fn test_base_address_script_credential() {
        let addr = Address::from_bytes(base_address(0x11)).unwrap();
        let cred = addr.payment_credential().unwrap();
        assert!(cred.is_script());
        assert_eq!(cred.hash(), H224::from_bytes([0x11; 28]));
        assert_eq!(addr.network_id(), 1);
    }

    #[test]
    fn test_enterprise_roundtrip() {
        let cred = H224::from_bytes([0x33; 28]);
        let addr = Address::from_key_credential(1, &cred);
        assert_eq!(addr.header(), 0x61);
        assert_eq!(addr.as_bytes().len(), 29);
        assert_eq!(addr.credential().unwrap(), cred);

        let script = Address::from_script_hash(0, &cred);
        assert_eq!(script.header(), 0x70);
        assert!(script.payment_credential().unwrap().is_script());
    }

    #[test]
    fn test_reward_address_has_no_payment_credential() {
        let mut bytes = vec![0xe0];
        bytes.extend_from_slice(&[0x44; 28]);
        let addr = Address::from_bytes(bytes).unwrap();
        assert_eq!(
            addr.credential(),
            Err(AddressError::NoPaymentCredential(0xe))
        );
    }

    // ==================== Parsing edge cases ====================

    #[test]
    fn test_empty_address_rejected() {
        assert_eq!(Address::from_bytes(vec![]), Err(AddressError::InvalidLength(0)));
    }

    #[test]
    fn test_truncated_base_address_rejected() {
        let mut bytes = base_address(0x00);
        bytes.truncate(40);
        assert_eq!(Address::from_bytes(bytes), Err(AddressError::InvalidLength(40)));
    }

    #[test]
    fn test_from_hex_invalid_chars() {
        match Address::from_hex("60zz") {
            Err(AddressError::InvalidHex(_)) => {}
            other => panic!("Expected InvalidHex error, got {:?}", other),
        }
    }

    #[test]
    fn test_hex_roundtrip_with_prefix() {
        let addr = Address::from_bytes(base_address(0x01)).unwrap();
        let parsed = Address::from_hex(&format!("0x{}", addr.to_hex())).unwrap();
        assert_eq!(parsed, addr);
    }
}
