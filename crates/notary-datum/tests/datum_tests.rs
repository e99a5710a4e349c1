//! Codec tests across datum kinds

use notary_datum::*;
use notary_primitives::{Credential, H256};
use notary_types::{BootstrapParams, CertificateData, SchemaVersion};
use proptest::prelude::*;

fn params(name: &str) -> BootstrapParams {
    BootstrapParams {
        token_name: name.to_string(),
        allowed_credentials: vec![],
        fee: 2_000_000,
        fee_interval: 10,
        fee_receivers: vec![Credential::from_bytes([1; 28])],
        ttl: 0,
        transaction_limit: 1000,
        batch_size: 10,
    }
}

// ==================== Cross-kind decoding ====================

#[test]
fn test_state_bytes_are_not_a_bootstrap() {
    let state = StateDatum {
        owner: Credential::from_bytes([5; 28]),
        countdown: 1,
        certificate_data_hash: H256::ZERO,
        batch_size: 1,
        bootstrap_token_name: "x".into(),
        certificates: vec![],
    };
    let bytes = state.encode().unwrap();
    assert!(matches!(
        BootstrapDatum::decode(&bytes),
        Err(DecodeError::FieldCount { got: 6, .. })
    ));
}

#[test]
fn test_truncated_payload_is_decode_error() {
    let bytes = BootstrapDatum::encode(&params("abc")).unwrap();
    let truncated = &bytes[..bytes.len() - 3];
    assert!(BootstrapDatum::decode(truncated).is_err());
}

#[test]
fn test_current_layout_decodes_as_current() {
    let bytes = BootstrapDatum::encode(&params("abc")).unwrap();
    let datum = BootstrapDatum::decode(&bytes).unwrap();
    assert_eq!(datum.schema_version(), SchemaVersion::Current);
    assert_eq!(datum.into_params(), params("abc"));
}

// ==================== Properties ====================

fn arb_cert() -> impl Strategy<Value = CertificateData> {
    (
        proptest::collection::vec(any::<u8>(), 0..64),
        "[A-Z0-9-]{1,12}",
        proptest::collection::vec(any::<u8>(), 0..64),
        "\\PC{0,200}",
    )
        .prop_map(|(hash, algo, issuer, meta)| CertificateData {
            hash,
            hash_algorithm: algo,
            issuer_credential: issuer,
            extra_metadata: meta,
        })
}

proptest! {
    #[test]
    fn prop_bootstrap_roundtrip(
        name in "[a-z0-9-]{1,32}",
        fee in any::<u64>(),
        interval in 1u64..10_000,
        limit in any::<u64>(),
        receivers in proptest::collection::vec(any::<[u8; 28]>(), 0..4),
    ) {
        let mut p = params(&name);
        p.fee = fee;
        p.fee_interval = interval;
        p.transaction_limit = limit;
        p.fee_receivers = receivers.into_iter().map(Credential::from_bytes).collect();
        let decoded = BootstrapDatum::decode(&BootstrapDatum::encode(&p).unwrap()).unwrap();
        prop_assert_eq!(decoded, BootstrapDatum::Current(p));
    }

    #[test]
    fn prop_state_roundtrip(
        countdown in any::<u64>(),
        certs in proptest::collection::vec(arb_cert(), 0..5),
    ) {
        let datum = StateDatum {
            owner: Credential::from_bytes([8; 28]),
            countdown,
            certificate_data_hash: rolling_hash(None, &certs),
            batch_size: 10,
            bootstrap_token_name: "channel".into(),
            certificates: certs,
        };
        prop_assert_eq!(StateDatum::decode(&datum.encode().unwrap()).unwrap(), datum);
    }
}
