//! The ReCap capability object.

use crate::{
    Abilities, Ability, Attenuations, IntoProof, Proof, RecapError, Restriction,
    attenuation::is_unconditional, codec, statement::render_statement,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::{collections::btree_map::Entry, fmt, str::FromStr};

/// A capability object: what may be done on which resources, and the
/// delegations that justify it.
///
/// Accessors hand out shared borrows of the internal state. The only ways
/// to change a `Recap` are [`add_proof`](Recap::add_proof),
/// [`add_attenuation`](Recap::add_attenuation) and [`merge`](Recap::merge).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Recap {
    att: Attenuations,
    prf: Vec<Proof>,
}

impl Recap {
    /// Creates a `Recap` from an already validated attenuation map.
    #[must_use]
    pub fn new(att: Attenuations, prf: Vec<Proof>) -> Self {
        Self { att, prf }
    }

    /// Creates a `Recap` from an untyped attenuation map and proofs given
    /// either as parsed values or as CID strings.
    ///
    /// # Errors
    ///
    /// Returns any error of [`validate_attenuations`](crate::validate_attenuations),
    /// or [`RecapError::InvalidProof`] for a proof that cannot be parsed.
    pub fn from_parts<I>(att: &Value, prf: I) -> Result<Self, RecapError>
    where
        I: IntoIterator,
        I::Item: IntoProof,
    {
        let att = Attenuations::try_from(att)?;
        let prf = prf
            .into_iter()
            .map(IntoProof::into_proof)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { att, prf })
    }

    /// Decodes a `urn:recap:` string.
    ///
    /// # Errors
    ///
    /// See [`codec::decode`].
    pub fn decode(urn: &str) -> Result<Self, RecapError> {
        let (att, prf) = codec::decode(urn)?;
        Ok(Self { att, prf })
    }

    /// Encodes this `Recap` as a `urn:recap:` string.
    #[must_use]
    pub fn encode(&self) -> String {
        codec::encode(&self.att, &self.prf)
    }

    /// The granted attenuations.
    #[must_use]
    pub const fn attenuations(&self) -> &Attenuations {
        &self.att
    }

    /// The proofs, in insertion order.
    #[must_use]
    pub fn proofs(&self) -> &[Proof] {
        &self.prf
    }

    /// Abilities granted on `resource`.
    #[must_use]
    pub fn abilities(&self, resource: &str) -> Option<&Abilities> {
        self.att.get(resource)
    }

    /// Restrictions under which `ability` is granted on `resource`.
    #[must_use]
    pub fn restrictions(&self, resource: &str, ability: &Ability) -> Option<&[Restriction]> {
        self.att
            .get(resource)
            .and_then(|abilities| abilities.get(ability))
            .map(Vec::as_slice)
    }

    /// Returns `true` if there are neither attenuations nor proofs.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.att.is_empty() && self.prf.is_empty()
    }

    /// The human readable statement describing the attenuations.
    #[must_use]
    pub fn statement(&self) -> String {
        render_statement(&self.att)
    }

    /// Splits into the attenuation map and proofs.
    #[must_use]
    pub fn into_parts(self) -> (Attenuations, Vec<Proof>) {
        (self.att, self.prf)
    }

    /// Appends a proof. Duplicates are kept.
    ///
    /// # Errors
    ///
    /// Returns [`RecapError::InvalidProof`] if `proof` is a string that is not
    /// a CID.
    pub fn add_proof(&mut self, proof: impl IntoProof) -> Result<(), RecapError> {
        self.prf.push(proof.into_proof()?);
        Ok(())
    }

    /// Grants `namespace/name` on `resource` under `restriction`.
    ///
    /// If the ability is already granted on the resource the restriction is
    /// appended to its list, widening the grant.
    ///
    /// # Errors
    ///
    /// - [`RecapError::InvalidResource`] if `resource` is empty.
    /// - [`RecapError::InvalidNamespace`] or [`RecapError::InvalidName`] if a
    ///   segment is not a valid token.
    pub fn add_attenuation(
        &mut self,
        resource: &str,
        namespace: &str,
        name: &str,
        restriction: Restriction,
    ) -> Result<(), RecapError> {
        if resource.is_empty() {
            return Err(RecapError::InvalidResource);
        }
        let ability = Ability::new(namespace, name)?;
        self.att.push(resource, ability, restriction);
        Ok(())
    }

    /// Grants every ability (`*/*`) on `resource` without restriction.
    ///
    /// # Errors
    ///
    /// Returns [`RecapError::InvalidResource`] if `resource` is empty.
    pub fn add_wildcard(&mut self, resource: &str) -> Result<(), RecapError> {
        self.add_attenuation(resource, "*", "*", Restriction::unrestricted())
    }

    /// Merges `other` into this `Recap`.
    ///
    /// Proofs from `other` are appended unless an equal proof is already
    /// present. For each ability in `other`:
    ///
    /// - if this `Recap` has no list for it, or only an unconditional one
    ///   (`[]` or `[{}, ...]`), the list is replaced by `other`'s;
    /// - otherwise `other`'s restrictions are appended to the existing ones.
    pub fn merge(&mut self, other: &Recap) {
        for proof in &other.prf {
            if self.prf.contains(proof) {
                tracing::trace!(%proof, "skipping duplicate proof");
            } else {
                self.prf.push(*proof);
            }
        }

        for (resource, abilities) in &other.att {
            match self.att.entry(resource.clone()) {
                Entry::Vacant(entry) => {
                    entry.insert(abilities.clone());
                }
                Entry::Occupied(mut entry) => {
                    let existing = entry.get_mut();
                    for (ability, restrictions) in abilities {
                        match existing.get_mut(ability) {
                            Some(current) if !is_unconditional(current.as_slice()) => {
                                current.extend(restrictions.iter().cloned());
                            }
                            Some(current) => {
                                tracing::debug!(
                                    %resource,
                                    %ability,
                                    "replacing unconditional grant"
                                );
                                *current = restrictions.clone();
                            }
                            None => {
                                existing.insert(ability.clone(), restrictions.clone());
                            }
                        }
                    }
                }
            }
        }
    }
}

impl fmt::Display for Recap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encode())
    }
}

impl FromStr for Recap {
    type Err = RecapError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Recap::decode(s)
    }
}

impl Serialize for Recap {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.encode())
    }
}

impl<'de> Deserialize<'de> for Recap {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Recap::decode(&s).map_err(serde::de::Error::custom)
    }
}
