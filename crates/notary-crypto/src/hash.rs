//! SHA-256 hashing

use notary_primitives::H256;
use sha2::{Digest, Sha256};

/// Compute SHA-256 hash of the input data
pub fn sha256(data: &[u8]) -> H256 {
    let mut hasher = Sha256::new();
    hasher.update(data);
    H256::from_bytes(hasher.finalize().into())
}

/// Incremental SHA-256 over a sequence of byte fragments
#[derive(Clone, Default)]
pub struct Sha256Hasher {
    inner: Sha256,
}

impl Sha256Hasher {
    /// Create a new hasher
    pub fn new() -> Self {
        Self::default()
    }

    /// Absorb more bytes
    pub fn update(&mut self, data: impl AsRef<[u8]>) -> &mut Self {
        self.inner.update(data.as_ref());
        self
    }

    /// Finish and return the digest
    pub fn finalize(self) -> H256 {
        H256::from_bytes(self.inner.finalize().into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ==================== NIST test vectors ====================

    #[test]
    fn test_sha256_empty() {
        assert_eq!(
            sha256(&[]).to_hex(),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn test_sha256_abc() {
        assert_eq!(
            sha256(b"abc").to_hex(),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_sha256_hello() {
        assert_eq!(
            sha256(b"hello").to_hex(),
            "2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824"
        );
    }

    // ==================== Incremental hashing ====================

    #[test]
    fn test_incremental_matches_one_shot() {
        let mut hasher = Sha256Hasher::new();
        hasher.update(b"ab").update(b"c");
        assert_eq!(hasher.finalize(), sha256(b"abc"));
    }

    #[test]
    fn test_incremental_empty_fragments() {
        let mut hasher = Sha256Hasher::new();
        hasher.update(b"").update(b"hello").update(Vec::<u8>::new());
        assert_eq!(hasher.finalize(), sha256(b"hello"));
    }
}
