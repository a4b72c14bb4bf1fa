//! Content identifiers referencing prior delegations.

use crate::RecapError;
use ipld_core::cid::{
    Cid,
    multibase::{self, Base},
};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

/// A proof: the CID of a delegation that justifies the current grant.
///
/// Proofs are normalised to CIDv1 when constructed, so two proofs are equal
/// exactly when their canonical (base58btc, CIDv1) strings are equal,
/// regardless of the multibase or CID version they were parsed from.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Proof(Cid);

impl Proof {
    /// Parses a multibase CID string.
    ///
    /// # Errors
    ///
    /// Returns [`RecapError::InvalidProof`] if `input` is not a CID.
    pub fn parse(input: &str) -> Result<Self, RecapError> {
        let cid = Cid::try_from(input).map_err(|error| RecapError::InvalidProof {
            proof: input.to_string(),
            reason: error.to_string(),
        })?;
        Proof::try_from(cid)
    }

    /// The underlying CIDv1.
    #[must_use]
    pub const fn cid(&self) -> &Cid {
        &self.0
    }

    /// Canonical string form: CIDv1 in base58btc multibase.
    #[must_use]
    pub fn canonical(&self) -> String {
        multibase::encode(Base::Base58Btc, self.0.to_bytes())
    }

    /// Canonical binary form of the CIDv1.
    #[must_use]
    pub fn to_bytes(&self) -> Vec<u8> {
        self.0.to_bytes()
    }
}

impl TryFrom<Cid> for Proof {
    type Error = RecapError;

    fn try_from(cid: Cid) -> Result<Self, Self::Error> {
        cid.into_v1()
            .map(Proof)
            .map_err(|error| RecapError::InvalidProof {
                proof: cid.to_string(),
                reason: error.to_string(),
            })
    }
}

impl From<Proof> for Cid {
    fn from(proof: Proof) -> Self {
        proof.0
    }
}

impl FromStr for Proof {
    type Err = RecapError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Proof::parse(s)
    }
}

impl fmt::Debug for Proof {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Proof").field(&self.canonical()).finish()
    }
}

impl fmt::Display for Proof {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.canonical())
    }
}

impl Serialize for Proof {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.canonical())
    }
}

impl<'de> Deserialize<'de> for Proof {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Proof::parse(&s).map_err(serde::de::Error::custom)
    }
}

/// Anything [`Recap`](crate::Recap) accepts as a proof: a parsed [`Proof`],
/// a [`Cid`], or a CID string.
pub trait IntoProof {
    /// Converts into a [`Proof`], parsing if necessary.
    ///
    /// # Errors
    ///
    /// Returns [`RecapError::InvalidProof`] if the input is not a CID.
    fn into_proof(self) -> Result<Proof, RecapError>;
}

impl IntoProof for Proof {
    fn into_proof(self) -> Result<Proof, RecapError> {
        Ok(self)
    }
}

impl IntoProof for &Proof {
    fn into_proof(self) -> Result<Proof, RecapError> {
        Ok(*self)
    }
}

impl IntoProof for Cid {
    fn into_proof(self) -> Result<Proof, RecapError> {
        Proof::try_from(self)
    }
}

impl IntoProof for &str {
    fn into_proof(self) -> Result<Proof, RecapError> {
        Proof::parse(self)
    }
}

impl IntoProof for String {
    fn into_proof(self) -> Result<Proof, RecapError> {
        Proof::parse(&self)
    }
}

impl IntoProof for &String {
    fn into_proof(self) -> Result<Proof, RecapError> {
        Proof::parse(self)
    }
}
