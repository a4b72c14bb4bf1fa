//! Error types for ReCap encoding, validation and message binding.

use thiserror::Error;

/// Errors produced while building, decoding or binding a [`Recap`].
///
/// Every failure is local to the call that produced it; nothing is retried
/// internally. [`embed`] is the one place that recovers from extraction
/// errors, by treating them as "no existing grant".
///
/// [`Recap`]: crate::Recap
/// [`embed`]: crate::embed
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RecapError {
    /// Input does not start with `urn:recap:`.
    #[error("invalid recap urn: expected `urn:recap:` prefix")]
    InvalidPrefix,

    /// The URN body is not unpadded URL-safe base64.
    #[error("invalid recap encoding: {0}")]
    InvalidEncoding(String),

    /// The decoded bytes are not UTF-8 JSON text.
    #[error("invalid recap envelope: {0}")]
    InvalidEnvelope(String),

    /// The decoded JSON is not an object with exactly `att` and `prf`.
    #[error("invalid recap envelope shape: {0}")]
    InvalidEnvelopeShape(String),

    /// The attenuation map, or one of its resource entries, is not a mapping.
    #[error("malformed attenuation: {0}")]
    MalformedAttenuation(String),

    /// A restriction list is not a sequence of mappings.
    #[error("malformed restriction list: {0}")]
    MalformedRestrictionList(String),

    /// An ability key is not of the form `namespace/name`.
    #[error("invalid ability string: `{0}`")]
    InvalidAbilityString(String),

    /// A proof could not be parsed as a content identifier.
    #[error("invalid proof `{proof}`: {reason}")]
    InvalidProof {
        /// The rejected input.
        proof: String,
        /// Parser diagnostic.
        reason: String,
    },

    /// The attenuation map is well formed but its keys are not sorted.
    #[error("attenuation object is not in canonical order")]
    NonCanonicalEncoding,

    /// An ability namespace contains characters outside `[A-Za-z0-9.*_+-]`.
    #[error("invalid ability namespace: `{0}`")]
    InvalidNamespace(String),

    /// An ability name contains characters outside `[A-Za-z0-9.*_+-]`.
    #[error("invalid ability name: `{0}`")]
    InvalidName(String),

    /// A grant was requested for an empty resource.
    #[error("resource must not be empty")]
    InvalidResource,

    /// The message carries no resources to extract a ReCap from.
    #[error("message has no resources")]
    NoResources,

    /// The message carries no statement to verify against.
    #[error("message has no statement")]
    NoStatement,

    /// The statement does not end with the rendering of the embedded ReCap.
    #[error("statement does not match the embedded recap")]
    StatementMismatch,
}
