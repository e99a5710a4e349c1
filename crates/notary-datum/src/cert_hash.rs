//! Rolling certificate hash
//!
//! `next = sha256(previous || bytes(c1) || ... || bytes(cn))` with
//! `bytes(c) = hash || hex(algorithm) || issuer || hex(chunk1) || ...`.
//! A fork has no previous hash.

use crate::chunk::chunk_metadata;
use notary_crypto::Sha256Hasher;
use notary_primitives::H256;
use notary_types::CertificateData;

/// Bytes a single certificate contributes to the rolling hash
pub fn certificate_bytes(cert: &CertificateData) -> Vec<u8> {
    let mut out = Vec::with_capacity(
        cert.hash.len() + cert.issuer_credential.len() + 2 * (cert.hash_algorithm.len() + cert.extra_metadata.len()),
    );
    out.extend_from_slice(&cert.hash);
    out.extend_from_slice(hex::encode(cert.hash_algorithm.as_bytes()).as_bytes());
    out.extend_from_slice(&cert.issuer_credential);
    for chunk in chunk_metadata(&cert.extra_metadata) {
        out.extend_from_slice(hex::encode(chunk.as_bytes()).as_bytes());
    }
    out
}

/// Fold `certs` (in arrival order) into the rolling hash
pub fn rolling_hash(previous: Option<&H256>, certs: &[CertificateData]) -> H256 {
    let mut hasher = Sha256Hasher::new();
    if let Some(prev) = previous {
        hasher.update(prev);
    }
    for cert in certs {
        hasher.update(certificate_bytes(cert));
    }
    hasher.finalize()
}

#[cfg(test)]
mod tests {
    use super::*;
    use notary_crypto::sha256;

    fn cert(hash: &[u8], metadata: &str) -> CertificateData {
        CertificateData {
            hash: hash.to_vec(),
            hash_algorithm: "SHA-256".to_string(),
            issuer_credential: vec![0xaa; 4],
            extra_metadata: metadata.to_string(),
        }
    }

    #[test]
    fn test_certificate_bytes_layout() {
        let bytes = certificate_bytes(&cert(&[1, 2], "ok"));
        let mut expected = vec![1u8, 2];
        expected.extend_from_slice(b"5348412d323536");
        expected.extend_from_slice(&[0xaa; 4]);
        expected.extend_from_slice(b"6f6b");
        assert_eq!(bytes, expected);
    }

    #[test]
    fn test_fork_hash_has_no_prefix() {
        let certs = vec![cert(&[1], ""), cert(&[2], "meta")];
        let mut concat = certificate_bytes(&certs[0]);
        concat.extend(certificate_bytes(&certs[1]));
        assert_eq!(rolling_hash(None, &certs), sha256(&concat));
    }

    #[test]
    fn test_update_hash_chains_previous() {
        let first = rolling_hash(None, &[cert(&[1], "")]);
        let second = rolling_hash(Some(&first), &[cert(&[2], "")]);
        let mut concat = first.as_bytes().to_vec();
        concat.extend(certificate_bytes(&cert(&[2], "")));
        assert_eq!(second, sha256(&concat));
        assert_ne!(second, rolling_hash(None, &[cert(&[2], "")]));
    }

    #[test]
    fn test_order_matters() {
        let a = cert(&[1], "");
        let b = cert(&[2], "");
        assert_ne!(
            rolling_hash(None, &[a.clone(), b.clone()]),
            rolling_hash(None, &[b, a])
        );
    }
}
