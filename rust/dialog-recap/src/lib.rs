#![warn(missing_docs)]

//! ReCaps: capability grants embedded in Sign-In with Ethereum messages.
//!
//! A [`Recap`] says "the signed-in session may perform these abilities on
//! these resources, under these restrictions", optionally citing
//! [`Proof`]s of earlier delegations. It travels as a `urn:recap:` string in
//! the message's resources, next to a human readable rendering of the same
//! grant in the message's statement.
//!
//! # Example
//!
//! ```rust
//! use dialog_recap::{Recap, Restriction, SiweMessage};
//! use serde_json::json;
//!
//! # fn main() -> Result<(), dialog_recap::RecapError> {
//! let mut recap = Recap::default();
//! recap.add_attenuation("https://example.com", "crud", "read", Restriction::unrestricted())?;
//! recap.add_attenuation(
//!     "kepler:example://default/kv",
//!     "kv",
//!     "write",
//!     Restriction::try_from(json!({ "max": 10 }))?,
//! )?;
//!
//! let mut message = SiweMessage::default();
//! recap.embed(&mut message);
//!
//! let verified = Recap::extract_and_verify(&message)?;
//! assert_eq!(verified, recap);
//! # Ok(())
//! # }
//! ```
//!
//! Encodings are canonical: keys are sorted by code point at every level and
//! decoding rejects anything else, so each grant has exactly one URN and one
//! statement.

mod ability;
mod attenuation;
mod canonical;
pub mod codec;
mod error;
mod message;
mod proof;
mod recap;
mod statement;

pub use ability::{Ability, valid_ability_string, valid_token};
pub use attenuation::{
    Abilities, Attenuations, Restriction, is_unconditional, validate_attenuations,
};
pub use canonical::{canonical_order, is_canonical};
pub use codec::URN_PREFIX;
pub use error::RecapError;
pub use message::{Message, SiweMessage, embed, extract, extract_and_verify};
pub use proof::{IntoProof, Proof};
pub use recap::Recap;
pub use statement::{STATEMENT_PREAMBLE, render_statement};

/// Re-export of the CID type proofs are built from.
pub use ipld_core::cid::Cid;
