//! Canonical key ordering of JSON values.
//!
//! A value is canonical when every object's keys appear in ascending code
//! point order, at every nesting level. Arrays keep their element order.
//!
//! Decoders use [`is_canonical`] as a guard rather than re-sorting, so a
//! logical grant admits exactly one encoding.

use serde::de::{self, Deserialize, Deserializer, MapAccess, SeqAccess, Visitor};
use serde_json::{Map, Value};
use std::fmt;

/// Returns an equivalent value with every object's keys sorted.
#[must_use]
pub fn canonical_order(value: &Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(canonical_map(map)),
        Value::Array(items) => Value::Array(items.iter().map(canonical_order).collect()),
        primitive => primitive.clone(),
    }
}

pub(crate) fn canonical_map(map: &Map<String, Value>) -> Map<String, Value> {
    let mut entries: Vec<(&String, &Value)> = map.iter().collect();
    entries.sort_by(|(a, _), (b, _)| a.cmp(b));
    entries
        .into_iter()
        .map(|(key, value)| (key.clone(), canonical_order(value)))
        .collect()
}

/// Returns `true` if `value` already equals [`canonical_order`]`(value)`.
#[must_use]
pub fn is_canonical(value: &Value) -> bool {
    match value {
        Value::Object(map) => {
            let keys: Vec<&String> = map.keys().collect();
            keys.windows(2).all(|pair| pair[0] < pair[1]) && map.values().all(is_canonical)
        }
        Value::Array(items) => items.iter().all(is_canonical),
        _ => true,
    }
}

/// JSON text parsed with every object entry kept as written.
///
/// Parsing into a [`Value`] folds repeated keys into one entry, which would
/// hide them from the ordering guard. A repeated key is never strictly
/// greater than its predecessor, so [`RawJson::is_canonical`] rejects it.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum RawJson {
    Object(Vec<(String, RawJson)>),
    Array(Vec<RawJson>),
    Scalar(Value),
}

impl RawJson {
    pub(crate) fn parse(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    /// Keys strictly ascending in every object, at every level.
    pub(crate) fn is_canonical(&self) -> bool {
        match self {
            RawJson::Object(entries) => {
                entries.windows(2).all(|pair| pair[0].0 < pair[1].0)
                    && entries.iter().all(|(_, value)| value.is_canonical())
            }
            RawJson::Array(items) => items.iter().all(RawJson::is_canonical),
            RawJson::Scalar(_) => true,
        }
    }

    /// Converts to a [`Value`]. Of repeated keys, the last entry wins.
    pub(crate) fn to_value(&self) -> Value {
        match self {
            RawJson::Object(entries) => Value::Object(
                entries
                    .iter()
                    .map(|(key, value)| (key.clone(), value.to_value()))
                    .collect(),
            ),
            RawJson::Array(items) => Value::Array(items.iter().map(RawJson::to_value).collect()),
            RawJson::Scalar(value) => value.clone(),
        }
    }
}

impl<'de> Deserialize<'de> for RawJson {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(RawJsonVisitor)
    }
}

struct RawJsonVisitor;

impl<'de> Visitor<'de> for RawJsonVisitor {
    type Value = RawJson;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("any JSON value")
    }

    fn visit_bool<E: de::Error>(self, v: bool) -> Result<RawJson, E> {
        Ok(RawJson::Scalar(Value::Bool(v)))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<RawJson, E> {
        Ok(RawJson::Scalar(Value::from(v)))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<RawJson, E> {
        Ok(RawJson::Scalar(Value::from(v)))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<RawJson, E> {
        Ok(RawJson::Scalar(Value::from(v)))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<RawJson, E> {
        Ok(RawJson::Scalar(Value::String(v.to_owned())))
    }

    fn visit_string<E: de::Error>(self, v: String) -> Result<RawJson, E> {
        Ok(RawJson::Scalar(Value::String(v)))
    }

    fn visit_unit<E: de::Error>(self) -> Result<RawJson, E> {
        Ok(RawJson::Scalar(Value::Null))
    }

    fn visit_none<E: de::Error>(self) -> Result<RawJson, E> {
        Ok(RawJson::Scalar(Value::Null))
    }

    fn visit_some<D: Deserializer<'de>>(self, deserializer: D) -> Result<RawJson, D::Error> {
        RawJson::deserialize(deserializer)
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<RawJson, A::Error> {
        let mut items = Vec::new();
        while let Some(item) = seq.next_element()? {
            items.push(item);
        }
        Ok(RawJson::Array(items))
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<RawJson, A::Error> {
        let mut entries = Vec::new();
        while let Some(entry) = map.next_entry::<String, RawJson>()? {
            entries.push(entry);
        }
        Ok(RawJson::Object(entries))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn unordered() -> Value {
        json!({
            "c": 1,
            "b": 2,
            "ca": 3,
            "bnested": {
                "c": [3, 2, 1],
                "b": 2
            }
        })
    }

    fn ordered() -> Value {
        json!({
            "b": 2,
            "bnested": {
                "b": 2,
                "c": [3, 2, 1]
            },
            "c": 1,
            "ca": 3
        })
    }

    #[test]
    fn orders_nested_objects() {
        let sorted = canonical_order(&unordered());
        assert_eq!(
            serde_json::to_string(&sorted).unwrap(),
            serde_json::to_string(&ordered()).unwrap()
        );
    }

    #[test]
    fn detects_ordering() {
        assert!(is_canonical(&ordered()));
        assert!(!is_canonical(&unordered()));
    }

    #[test]
    fn detects_disorder_inside_arrays() {
        let value = json!([{ "a": 1 }, { "z": 1, "y": 2 }]);
        assert!(!is_canonical(&value));
        assert!(is_canonical(&canonical_order(&value)));
    }

    #[test]
    fn preserves_array_order_and_primitives() {
        let value = json!([3, "b", null, true, 1.5]);
        assert_eq!(canonical_order(&value), value);
        assert!(is_canonical(&value));
    }

    #[test]
    fn raw_json_keeps_repeated_keys() -> testresult::TestResult {
        let raw = RawJson::parse(r#"{"a":{"x":[1],"x":[]},"b":2}"#)?;
        assert!(!raw.is_canonical());
        assert_eq!(raw.to_value(), json!({ "a": { "x": [] }, "b": 2 }));
        assert!(is_canonical(&raw.to_value()));

        let raw = RawJson::parse(r#"[{"a":null,"b":[true,1.5,-3,"s"]}]"#)?;
        assert!(raw.is_canonical());
        assert_eq!(raw.to_value(), json!([{ "a": null, "b": [true, 1.5, -3, "s"] }]));
        Ok(())
    }

    #[test]
    fn is_idempotent() {
        let once = canonical_order(&unordered());
        let twice = canonical_order(&once);
        assert_eq!(
            serde_json::to_string(&once).unwrap(),
            serde_json::to_string(&twice).unwrap()
        );
    }
}
