//! Ability strings.

use crate::RecapError;
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

/// Returns `true` if `token` is a non-empty run of `[A-Za-z0-9.*_+-]`.
#[must_use]
pub fn valid_token(token: &str) -> bool {
    !token.is_empty()
        && token
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'.' | b'*' | b'_' | b'+' | b'-'))
}

/// Returns `true` if `ability` is exactly `<token>/<token>`.
#[must_use]
pub fn valid_ability_string(ability: &str) -> bool {
    match ability.split_once('/') {
        Some((namespace, name)) => valid_token(namespace) && valid_token(name),
        None => false,
    }
}

/// A validated `namespace/name` ability, e.g. `crud/read` or `kepler/*`.
///
/// Abilities order by the code points of their string form, which is the
/// order they take in a canonical attenuation map.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct Ability(String);

impl Ability {
    /// Builds an ability from its two segments.
    ///
    /// # Errors
    ///
    /// Returns [`RecapError::InvalidNamespace`] or [`RecapError::InvalidName`]
    /// if a segment fails [`valid_token`].
    pub fn new(namespace: &str, name: &str) -> Result<Self, RecapError> {
        if !valid_token(namespace) {
            return Err(RecapError::InvalidNamespace(namespace.to_string()));
        }
        if !valid_token(name) {
            return Err(RecapError::InvalidName(name.to_string()));
        }
        Ok(Ability(format!("{namespace}/{name}")))
    }

    /// The segment before the `/`.
    #[must_use]
    pub fn namespace(&self) -> &str {
        self.split().0
    }

    /// The segment after the `/`.
    #[must_use]
    pub fn name(&self) -> &str {
        self.split().1
    }

    /// The `namespace/name` string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn split(&self) -> (&str, &str) {
        // Validated on construction, so the separator is always present.
        self.0.split_once('/').unwrap_or((&self.0, ""))
    }
}

impl AsRef<str> for Ability {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Ability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for Ability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Ability {
    type Err = RecapError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if valid_ability_string(s) {
            Ok(Ability(s.to_string()))
        } else {
            Err(RecapError::InvalidAbilityString(s.to_string()))
        }
    }
}

impl TryFrom<String> for Ability {
    type Error = RecapError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        if valid_ability_string(&s) {
            Ok(Ability(s))
        } else {
            Err(RecapError::InvalidAbilityString(s))
        }
    }
}

impl Serialize for Ability {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for Ability {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ability::try_from(s).map_err(serde::de::Error::custom)
    }
}
