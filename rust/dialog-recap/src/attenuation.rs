//! Attenuation maps: `resource -> ability -> [restriction]`.

use crate::{Ability, RecapError, canonical::canonical_map};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::{BTreeMap, btree_map};

/// An opaque restriction object.
///
/// Restrictions are never interpreted here; they belong to the resource's
/// own policy engine. A list of restrictions is a disjunction: the ability
/// is granted if any one of them is satisfied.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(transparent)]
pub struct Restriction(Map<String, Value>);

impl Restriction {
    /// The empty restriction `{}`.
    #[must_use]
    pub fn unrestricted() -> Self {
        Self::default()
    }

    /// Returns `true` for the empty restriction `{}`.
    #[must_use]
    pub fn is_unrestricted(&self) -> bool {
        self.0.is_empty()
    }

    /// Borrow the underlying JSON object.
    #[must_use]
    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    /// The restriction as a JSON value with keys in canonical order.
    #[must_use]
    pub fn to_value(&self) -> Value {
        Value::Object(canonical_map(&self.0))
    }
}

impl From<Map<String, Value>> for Restriction {
    fn from(map: Map<String, Value>) -> Self {
        Restriction(map)
    }
}

impl Serialize for Restriction {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_value().serialize(serializer)
    }
}

impl TryFrom<Value> for Restriction {
    type Error = RecapError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::Object(map) => Ok(Restriction(map)),
            other => Err(RecapError::MalformedRestrictionList(format!(
                "restriction must be an object, found {}",
                kind(&other)
            ))),
        }
    }
}

/// Returns `true` if a restriction list grants its ability unconditionally:
/// it is empty or holds only `{}` entries.
#[must_use]
pub fn is_unconditional(restrictions: &[Restriction]) -> bool {
    restrictions.iter().all(Restriction::is_unrestricted)
}

/// The abilities granted on a single resource.
pub type Abilities = BTreeMap<Ability, Vec<Restriction>>;

/// Mapping from resource URI to the abilities granted on it.
///
/// Resources and abilities are held in code point order, which is the
/// order they take on the wire.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Attenuations(BTreeMap<String, Abilities>);

impl Attenuations {
    /// An empty attenuation map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` if no resource has been granted.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of resources.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Abilities granted on `resource`.
    #[must_use]
    pub fn get(&self, resource: &str) -> Option<&Abilities> {
        self.0.get(resource)
    }

    /// Resources in ascending order.
    pub fn resources(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// `(resource, abilities)` pairs in ascending resource order.
    pub fn iter(&self) -> btree_map::Iter<'_, String, Abilities> {
        self.0.iter()
    }

    /// Appends `restriction` to the list for `(resource, ability)`, creating
    /// the resource and the list as needed.
    pub(crate) fn push(&mut self, resource: &str, ability: Ability, restriction: Restriction) {
        self.0
            .entry(resource.to_string())
            .or_default()
            .entry(ability)
            .or_default()
            .push(restriction);
    }

    pub(crate) fn entry(&mut self, resource: String) -> btree_map::Entry<'_, String, Abilities> {
        self.0.entry(resource)
    }

    /// The map as a JSON value with keys in canonical order at every level.
    #[must_use]
    pub fn to_value(&self) -> Value {
        let mut att = Map::new();
        for (resource, abilities) in &self.0 {
            let mut grants = Map::new();
            for (ability, restrictions) in abilities {
                let list = restrictions.iter().map(Restriction::to_value).collect();
                grants.insert(ability.to_string(), Value::Array(list));
            }
            att.insert(resource.clone(), Value::Object(grants));
        }
        Value::Object(att)
    }
}

impl<'a> IntoIterator for &'a Attenuations {
    type Item = (&'a String, &'a Abilities);
    type IntoIter = btree_map::Iter<'a, String, Abilities>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl Serialize for Attenuations {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_value().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Attenuations {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        validate_attenuations(&value).map_err(serde::de::Error::custom)
    }
}

impl TryFrom<Value> for Attenuations {
    type Error = RecapError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        validate_attenuations(&value)
    }
}

impl TryFrom<&Value> for Attenuations {
    type Error = RecapError;

    fn try_from(value: &Value) -> Result<Self, Self::Error> {
        validate_attenuations(value)
    }
}

/// Checks that `att` is a well-formed attenuation map and returns its typed
/// form.
///
/// Validation stops at the first violation. Key order is not checked here;
/// see [`is_canonical`](crate::is_canonical).
///
/// # Errors
///
/// - [`RecapError::MalformedAttenuation`] if `att` or a resource entry is
///   not an object, or a resource key is empty.
/// - [`RecapError::InvalidAbilityString`] if an ability key is not
///   `namespace/name`.
/// - [`RecapError::MalformedRestrictionList`] if a restriction list is not
///   an array of objects.
pub fn validate_attenuations(att: &Value) -> Result<Attenuations, RecapError> {
    let Value::Object(resources) = att else {
        return Err(RecapError::MalformedAttenuation(format!(
            "expected an object, found {}",
            kind(att)
        )));
    };

    let mut attenuations = BTreeMap::new();
    for (resource, grants) in resources {
        if resource.is_empty() {
            return Err(RecapError::MalformedAttenuation(
                "resource must not be empty".into(),
            ));
        }
        let Value::Object(grants) = grants else {
            return Err(RecapError::MalformedAttenuation(format!(
                "abilities for `{resource}` must be an object, found {}",
                kind(grants)
            )));
        };

        let mut abilities = Abilities::new();
        for (ability, restrictions) in grants {
            let parsed: Ability = ability.parse()?;
            let Value::Array(restrictions) = restrictions else {
                return Err(RecapError::MalformedRestrictionList(format!(
                    "restrictions for `{ability}` must be an array, found {}",
                    kind(restrictions)
                )));
            };
            let list = restrictions
                .iter()
                .map(|restriction| match restriction {
                    Value::Object(map) => Ok(Restriction(map.clone())),
                    other => Err(RecapError::MalformedRestrictionList(format!(
                        "restrictions for `{ability}` must be objects, found {}",
                        kind(other)
                    ))),
                })
                .collect::<Result<Vec<_>, _>>()?;
            abilities.insert(parsed, list);
        }
        attenuations.insert(resource.clone(), abilities);
    }

    Ok(Attenuations(attenuations))
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use testresult::TestResult;

    #[test]
    fn accepts_a_well_formed_map() -> TestResult {
        let att = validate_attenuations(&json!({
            "https://example.com": { "crud/read": [{}] },
            "kepler:example://default/kv": {
                "kv/read": [],
                "kv/write": [{ "max": 10 }]
            }
        }))?;

        assert_eq!(att.len(), 2);
        let kv = att.get("kepler:example://default/kv").unwrap();
        let write: Ability = "kv/write".parse()?;
        assert_eq!(kv[&write], vec![Restriction::try_from(json!({ "max": 10 }))?]);
        Ok(())
    }

    #[test]
    fn rejects_non_object_maps() {
        for att in [json!([]), json!("x"), json!(1), json!(null)] {
            assert!(matches!(
                validate_attenuations(&att),
                Err(RecapError::MalformedAttenuation(_))
            ));
        }
        assert!(matches!(
            validate_attenuations(&json!({ "https://example.com": ["crud/read"] })),
            Err(RecapError::MalformedAttenuation(_))
        ));
        assert!(matches!(
            validate_attenuations(&json!({ "": { "crud/read": [] } })),
            Err(RecapError::MalformedAttenuation(_))
        ));
    }

    #[test]
    fn rejects_invalid_ability_keys() {
        assert_eq!(
            validate_attenuations(&json!({ "https://example.com": { "crud": [] } })),
            Err(RecapError::InvalidAbilityString("crud".into()))
        );
    }

    #[test]
    fn rejects_malformed_restriction_lists() {
        for list in [json!({}), json!("x"), json!([[]]), json!([1]), json!([{}, null])] {
            assert!(matches!(
                validate_attenuations(&json!({ "r": { "crud/read": list } })),
                Err(RecapError::MalformedRestrictionList(message)) if message.contains("crud/read")
            ));
        }
    }

    #[test]
    fn unconditional_lists() -> TestResult {
        assert!(is_unconditional(&[]));
        assert!(is_unconditional(&[Restriction::unrestricted()]));
        assert!(is_unconditional(&[
            Restriction::unrestricted(),
            Restriction::unrestricted()
        ]));
        assert!(!is_unconditional(&[
            Restriction::unrestricted(),
            Restriction::try_from(json!({ "max": 5 }))?
        ]));
        Ok(())
    }

    #[test]
    fn to_value_sorts_restriction_keys() -> TestResult {
        let mut att = Attenuations::new();
        att.push(
            "r",
            "x/y".parse()?,
            Restriction::try_from(json!({ "z": 1, "a": { "d": 1, "c": 2 } }))?,
        );
        assert_eq!(
            serde_json::to_string(&att.to_value())?,
            r#"{"r":{"x/y":[{"a":{"c":2,"d":1},"z":1}]}}"#
        );
        Ok(())
    }

    #[test]
    fn serializes_in_canonical_order() -> TestResult {
        let mut att = Attenuations::new();
        let restriction = Restriction::try_from(json!({ "z": 1, "a": { "d": 1, "c": 2 } }))?;
        att.push("r", "x/y".parse()?, restriction.clone());
        assert_eq!(
            serde_json::to_string(&att)?,
            r#"{"r":{"x/y":[{"a":{"c":2,"d":1},"z":1}]}}"#
        );
        assert_eq!(
            serde_json::to_string(&restriction)?,
            r#"{"a":{"c":2,"d":1},"z":1}"#
        );
        assert_eq!(serde_json::from_str::<Attenuations>(&serde_json::to_string(&att)?)?, att);
        Ok(())
    }
}
