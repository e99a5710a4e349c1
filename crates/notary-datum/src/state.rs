//! State datum and the certificates embedded in it

use crate::bootstrap::decode_h224;
use crate::chunk::chunk_metadata;
use crate::error::{DecodeError, DecodeResult, EncodeError};
use crate::plutus::PlutusData;
use notary_primitives::{Credential, H256};
use notary_types::CertificateData;

const STATE_FIELDS: usize = 6;
const CERTIFICATE_FIELDS: usize = 4;

/// Payload of an output holding a state token
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StateDatum {
    /// Owning credential
    pub owner: Credential,
    /// Remaining uses after this output
    pub countdown: u64,
    /// Rolling hash including `certificates`
    pub certificate_data_hash: H256,
    /// Maximum certificates per use
    pub batch_size: u64,
    /// Parent channel
    pub bootstrap_token_name: String,
    /// Certificates added by the transaction that produced this output
    pub certificates: Vec<CertificateData>,
}

impl StateDatum {
    /// Decode from CBOR bytes
    pub fn decode(bytes: &[u8]) -> DecodeResult<Self> {
        Self::from_plutus(&PlutusData::from_cbor(bytes)?)
    }

    /// Decode from a data node
    pub fn from_plutus(data: &PlutusData) -> DecodeResult<Self> {
        let fields = data.expect_constr("state datum", 0)?;
        if fields.len() != STATE_FIELDS {
            return Err(DecodeError::FieldCount {
                record: "state datum",
                got: fields.len(),
            });
        }
        let hash = fields[2].as_bytes("certificate_data_hash")?;
        let certificate_data_hash = H256::from_slice(hash).map_err(|_| DecodeError::Length {
            field: "certificate_data_hash",
            expected: H256::LEN,
            got: hash.len(),
        })?;
        Ok(StateDatum {
            owner: decode_h224(&fields[0], "owner")?,
            countdown: fields[1].as_u64("countdown")?,
            certificate_data_hash,
            batch_size: fields[3].as_u64("batch_size")?,
            bootstrap_token_name: fields[4].as_text("bootstrap_token_name")?,
            certificates: fields[5]
                .as_list("certificates")?
                .iter()
                .map(decode_certificate)
                .collect::<DecodeResult<_>>()?,
        })
    }

    /// Encode to CBOR bytes
    pub fn encode(&self) -> Result<Vec<u8>, EncodeError> {
        self.to_plutus().to_cbor()
    }

    /// Data node for this datum
    pub fn to_plutus(&self) -> PlutusData {
        PlutusData::constr(
            0,
            vec![
                PlutusData::bytes(self.owner),
                PlutusData::int(self.countdown),
                PlutusData::bytes(self.certificate_data_hash),
                PlutusData::int(self.batch_size),
                PlutusData::bytes(self.bootstrap_token_name.as_bytes()),
                PlutusData::List(self.certificates.iter().map(encode_certificate).collect()),
            ],
        )
    }
}

fn encode_certificate(cert: &CertificateData) -> PlutusData {
    PlutusData::constr(
        0,
        vec![
            PlutusData::bytes(&cert.hash),
            PlutusData::bytes(cert.hash_algorithm.as_bytes()),
            PlutusData::bytes(&cert.issuer_credential),
            PlutusData::List(
                chunk_metadata(&cert.extra_metadata)
                    .into_iter()
                    .map(|c| PlutusData::bytes(c.as_bytes()))
                    .collect(),
            ),
        ],
    )
}

fn decode_certificate(data: &PlutusData) -> DecodeResult<CertificateData> {
    let fields = data.expect_constr("certificate", 0)?;
    if fields.len() != CERTIFICATE_FIELDS {
        return Err(DecodeError::FieldCount {
            record: "certificate",
            got: fields.len(),
        });
    }
    let chunks = fields[3]
        .as_list("metadata")?
        .iter()
        .map(|c| c.as_bytes("metadata").map(<[u8]>::to_vec))
        .collect::<DecodeResult<Vec<_>>>()?;
    let extra_metadata =
        String::from_utf8(chunks.concat()).map_err(|_| DecodeError::InvalidUtf8("metadata"))?;
    Ok(CertificateData {
        hash: fields[0].as_bytes("hash")?.to_vec(),
        hash_algorithm: fields[1].as_text("hash_algorithm")?,
        issuer_credential: fields[2].as_bytes("issuer")?.to_vec(),
        extra_metadata,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cert(n: u8, metadata: &str) -> CertificateData {
        CertificateData {
            hash: vec![n; 32],
            hash_algorithm: "SHA-256".to_string(),
            issuer_credential: vec![0xbb; 28],
            extra_metadata: metadata.to_string(),
        }
    }

    fn datum() -> StateDatum {
        StateDatum {
            owner: Credential::from_bytes([3; 28]),
            countdown: 999,
            certificate_data_hash: H256::from_bytes([4; 32]),
            batch_size: 10,
            bootstrap_token_name: "channel".to_string(),
            certificates: vec![cert(1, ""), cert(2, &"é".repeat(80))],
        }
    }

    #[test]
    fn test_roundtrip() {
        let d = datum();
        assert_eq!(StateDatum::decode(&d.encode().unwrap()).unwrap(), d);
    }

    #[test]
    fn test_long_metadata_is_chunked_on_chain() {
        let d = datum();
        let data = d.to_plutus();
        let certs = data.expect_constr("state datum", 0).unwrap()[5]
            .as_list("certificates")
            .unwrap();
        let chunks = certs[1].expect_constr("certificate", 0).unwrap()[3]
            .as_list("metadata")
            .unwrap();
        // 160 bytes of two-byte codepoints
        assert_eq!(chunks.len(), 3);
        for c in chunks {
            assert!(c.as_bytes("metadata").unwrap().len() <= 64);
        }
    }

    #[test]
    fn test_wrong_hash_length_rejected() {
        let mut data = datum().to_plutus();
        if let PlutusData::Constr { fields, .. } = &mut data {
            fields[2] = PlutusData::bytes([0u8; 31]);
        }
        assert_eq!(
            StateDatum::from_plutus(&data),
            Err(DecodeError::Length {
                field: "certificate_data_hash",
                expected: 32,
                got: 31
            })
        );
    }

    #[test]
    fn test_bootstrap_datum_is_not_a_state_datum() {
        let data = PlutusData::constr(0, vec![PlutusData::int(0); 8]);
        assert!(matches!(
            StateDatum::from_plutus(&data),
            Err(DecodeError::FieldCount { got: 8, .. })
        ));
    }
}
