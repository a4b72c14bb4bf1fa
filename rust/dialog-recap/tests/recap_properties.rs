//! Property tests for canonical ordering and the `urn:recap:` round trip.

use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use dialog_recap::{
    Attenuations, Cid, Proof, Recap, RecapError, URN_PREFIX, canonical_order, codec, is_canonical,
};
use proptest::prelude::*;
use serde_json::{Map, Value};

fn arb_token() -> impl Strategy<Value = String> {
    "[A-Za-z0-9.*_+-]{1,8}"
}

fn arb_ability() -> impl Strategy<Value = String> {
    (arb_token(), arb_token()).prop_map(|(namespace, name)| format!("{namespace}/{name}"))
}

fn arb_resource() -> impl Strategy<Value = String> {
    "[a-z]{1,8}:[A-Za-z0-9/._~-]{0,16}"
}

/// Objects are built from unsorted entries so that insertion order varies.
fn arb_object<S>(values: S) -> impl Strategy<Value = Map<String, Value>>
where
    S: Strategy<Value = Value>,
{
    prop::collection::vec(("[a-z]{1,4}", values), 0..5)
        .prop_map(|entries| entries.into_iter().collect())
}

fn arb_json() -> impl Strategy<Value = Value> {
    let leaf = prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::from),
        any::<i64>().prop_map(Value::from),
        "[a-z ]{0,8}".prop_map(Value::from),
    ];
    leaf.prop_recursive(3, 24, 4, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..4).prop_map(Value::Array),
            arb_object(inner).prop_map(Value::Object),
        ]
    })
}

/// An attenuation map as JSON, with keys in arbitrary order at every level.
fn arb_attenuation_json() -> impl Strategy<Value = Value> {
    let restrictions =
        prop::collection::vec(arb_object(arb_json()).prop_map(Value::Object), 0..3)
            .prop_map(Value::Array);
    let abilities = prop::collection::vec((arb_ability(), restrictions), 1..4)
        .prop_map(|entries| Value::Object(entries.into_iter().collect()));
    prop::collection::vec((arb_resource(), abilities), 0..4)
        .prop_map(|entries| Value::Object(entries.into_iter().collect()))
}

fn arb_proof() -> impl Strategy<Value = Proof> {
    (any::<bool>(), prop::collection::vec(any::<u8>(), 32)).prop_map(|(v0, digest)| {
        // sha2-256 multihash, optionally wrapped as a dag-cbor CIDv1
        let mut bytes: Vec<u8> = if v0 { vec![] } else { vec![0x01, 0x71] };
        bytes.extend_from_slice(&[0x12, 0x20]);
        bytes.extend_from_slice(&digest);
        let cid = Cid::try_from(bytes.as_slice()).unwrap();
        Proof::try_from(cid).unwrap()
    })
}

fn urn_of(att: &Value) -> String {
    let json = format!(r#"{{"att":{att},"prf":[]}}"#);
    format!("{URN_PREFIX}{}", URL_SAFE_NO_PAD.encode(json))
}

proptest! {
    #[test]
    fn canonical_order_is_canonical(value in arb_json()) {
        let ordered = canonical_order(&value);
        prop_assert!(is_canonical(&ordered));
        prop_assert_eq!(&ordered, &value);
        prop_assert_eq!(
            canonical_order(&ordered).to_string(),
            ordered.to_string()
        );
    }

    #[test]
    fn canonical_grants_round_trip(
        att in arb_attenuation_json(),
        proofs in prop::collection::vec(arb_proof(), 0..4)
    ) {
        let att = Attenuations::try_from(&att).unwrap();
        let urn = codec::encode(&att, &proofs);

        let (decoded_att, decoded_proofs) = codec::decode(&urn).unwrap();
        prop_assert_eq!(&decoded_att, &att);
        prop_assert_eq!(&decoded_proofs, &proofs);
        prop_assert_eq!(codec::encode(&decoded_att, &decoded_proofs), urn.clone());

        let recap = Recap::new(att, proofs);
        prop_assert_eq!(recap.encode(), urn);
    }

    #[test]
    fn decoding_accepts_exactly_the_canonical_order(att in arb_attenuation_json()) {
        let decoded = Recap::decode(&urn_of(&att));
        if is_canonical(&att) {
            prop_assert!(decoded.is_ok());
        } else {
            prop_assert_eq!(decoded, Err(RecapError::NonCanonicalEncoding));
        }
    }
}
