//! Binding a ReCap to a Sign-In with Ethereum message.
//!
//! A ReCap travels as the last entry of the message's `resources` list, and
//! its [rendered statement](crate::render_statement) is appended to the
//! message's `statement`. Verifiers recompute the statement from the decoded
//! ReCap and require the message's statement to end with it, so neither half
//! can be altered on its own.
//!
//! Only those two fields are touched; everything else about the message
//! (layout, signature, nonce, expiry) belongs to the caller.

use crate::{Recap, RecapError};
use serde::{Deserialize, Serialize};

/// The parts of a SIWE message a ReCap is bound to.
pub trait Message {
    /// The `statement` field, if present.
    fn statement(&self) -> Option<&str>;

    /// Replaces the `statement` field.
    fn set_statement(&mut self, statement: String);

    /// The `resources` field, if present.
    fn resources(&self) -> Option<&[String]>;

    /// The `resources` field, created empty if absent.
    fn resources_mut(&mut self) -> &mut Vec<String>;
}

/// A minimal message carrying only the fields a ReCap is bound to.
///
/// Useful on its own for tests and for callers that assemble the final SIWE
/// text elsewhere.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SiweMessage {
    /// Human readable assertion the user signs.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub statement: Option<String>,

    /// URIs the user wishes to have resolved as part of authentication.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resources: Option<Vec<String>>,
}

impl Message for SiweMessage {
    fn statement(&self) -> Option<&str> {
        self.statement.as_deref()
    }

    fn set_statement(&mut self, statement: String) {
        self.statement = Some(statement);
    }

    fn resources(&self) -> Option<&[String]> {
        self.resources.as_deref()
    }

    fn resources_mut(&mut self) -> &mut Vec<String> {
        self.resources.get_or_insert_with(Vec::new)
    }
}

/// Decodes the ReCap in the last entry of `message`'s resources.
///
/// # Errors
///
/// Returns [`RecapError::NoResources`] if the message has no resources, or
/// any error of [`Recap::decode`].
pub fn extract<M: Message + ?Sized>(message: &M) -> Result<Recap, RecapError> {
    let urn = message
        .resources()
        .and_then(<[String]>::last)
        .ok_or(RecapError::NoResources)?;
    Recap::decode(urn)
}

/// Like [`extract`], additionally checking that the message's statement ends
/// with the ReCap's rendered statement.
///
/// # Errors
///
/// Any error of [`extract`], [`RecapError::NoStatement`] if the message has
/// no statement, or [`RecapError::StatementMismatch`] if it does not end
/// with the rendering.
pub fn extract_and_verify<M: Message + ?Sized>(message: &M) -> Result<Recap, RecapError> {
    let recap = extract(message)?;
    let statement = message.statement().ok_or(RecapError::NoStatement)?;
    if statement.ends_with(&recap.statement()) {
        Ok(recap)
    } else {
        Err(RecapError::StatementMismatch)
    }
}

/// Adds `recap` to `message`.
///
/// If the message already carries a verified ReCap, `recap` is merged into
/// it: the old rendering at the end of the statement is replaced with the
/// merged one, and the last resource is replaced with the merged encoding.
/// Otherwise `recap`'s rendering is appended to the statement (separated by
/// a space) and its encoding is appended to the resources.
pub fn embed<M: Message + ?Sized>(message: &mut M, recap: &Recap) {
    match extract_and_verify(message) {
        Ok(mut existing) => {
            let previous = existing.statement();
            existing.merge(recap);

            let statement = message.statement().unwrap_or_default();
            let prefix = &statement[..statement.len() - previous.len()];
            let merged = format!("{prefix}{}", existing.statement());
            message.set_statement(merged);

            let resources = message.resources_mut();
            resources.pop();
            resources.push(existing.encode());
        }
        Err(error) => {
            tracing::debug!(%error, "no existing recap to merge with, appending");

            let statement = match message.statement() {
                Some(current) => format!("{current} {}", recap.statement()),
                None => recap.statement(),
            };
            message.set_statement(statement);
            message.resources_mut().push(recap.encode());
        }
    }
}

impl Recap {
    /// See [`extract`].
    ///
    /// # Errors
    ///
    /// See [`extract`].
    pub fn extract<M: Message + ?Sized>(message: &M) -> Result<Self, RecapError> {
        extract(message)
    }

    /// See [`extract_and_verify`].
    ///
    /// # Errors
    ///
    /// See [`extract_and_verify`].
    pub fn extract_and_verify<M: Message + ?Sized>(message: &M) -> Result<Self, RecapError> {
        extract_and_verify(message)
    }

    /// Adds this ReCap to `message`; see [`embed`].
    pub fn embed<M: Message + ?Sized>(&self, message: &mut M) {
        embed(message, self);
    }
}
