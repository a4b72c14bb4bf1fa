//! The `urn:recap:` wire format.
//!
//! ```text
//! urn:recap:<base64url-nopad(utf8(json({"att": ..., "prf": [...]})))>
//! ```
//!
//! The JSON is compact and every object in it has its keys in code point
//! order. Decoding rejects input whose attenuation map is not already in
//! that order instead of re-sorting it.

use crate::{
    Attenuations, Proof, RecapError, attenuation::validate_attenuations, canonical::RawJson,
};
use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use serde_json::{Map, Value};

/// Literal prefix of every encoded ReCap.
pub const URN_PREFIX: &str = "urn:recap:";

const ATT: &str = "att";
const PRF: &str = "prf";

/// Encodes an attenuation map and proof list as a `urn:recap:` string.
#[must_use]
pub fn encode(att: &Attenuations, proofs: &[Proof]) -> String {
    let mut envelope = Map::new();
    envelope.insert(ATT.into(), att.to_value());
    envelope.insert(
        PRF.into(),
        Value::Array(
            proofs
                .iter()
                .map(|proof| Value::String(proof.canonical()))
                .collect(),
        ),
    );
    let json = Value::Object(envelope).to_string();
    format!("{URN_PREFIX}{}", URL_SAFE_NO_PAD.encode(json.as_bytes()))
}

/// Decodes a `urn:recap:` string into its attenuation map and proof list.
///
/// # Errors
///
/// - [`RecapError::InvalidPrefix`] if `urn` does not start with
///   [`URN_PREFIX`].
/// - [`RecapError::InvalidEncoding`] if the body is not unpadded base64url.
/// - [`RecapError::InvalidEnvelope`] if the payload is not UTF-8 JSON.
/// - [`RecapError::InvalidEnvelopeShape`] if the JSON is not an object with
///   exactly one `att` object and one `prf` array of strings.
/// - [`RecapError::InvalidProof`] if a `prf` entry is not a CID.
/// - Any error of [`validate_attenuations`].
/// - [`RecapError::NonCanonicalEncoding`] if `att` is not in canonical
///   order, including when an object in it repeats a key.
pub fn decode(urn: &str) -> Result<(Attenuations, Vec<Proof>), RecapError> {
    let body = urn
        .strip_prefix(URN_PREFIX)
        .ok_or(RecapError::InvalidPrefix)?;

    let bytes = URL_SAFE_NO_PAD
        .decode(body)
        .map_err(|error| RecapError::InvalidEncoding(error.to_string()))?;
    let text =
        String::from_utf8(bytes).map_err(|error| RecapError::InvalidEnvelope(error.to_string()))?;
    let envelope =
        RawJson::parse(&text).map_err(|error| RecapError::InvalidEnvelope(error.to_string()))?;

    let (att, prf) = split_envelope(&envelope)?;

    let proofs = prf
        .iter()
        .map(|proof| Proof::parse(proof))
        .collect::<Result<Vec<_>, _>>()?;

    let attenuations = validate_attenuations(&att.to_value())?;
    if !att.is_canonical() {
        return Err(RecapError::NonCanonicalEncoding);
    }

    tracing::trace!(
        resources = attenuations.len(),
        proofs = proofs.len(),
        "decoded recap"
    );

    Ok((attenuations, proofs))
}

fn split_envelope(envelope: &RawJson) -> Result<(&RawJson, Vec<&str>), RecapError> {
    let shape = |message: &str| RecapError::InvalidEnvelopeShape(message.to_string());

    let RawJson::Object(fields) = envelope else {
        return Err(shape("expected an object"));
    };
    if fields.len() != 2 {
        return Err(shape("expected exactly the fields `att` and `prf`"));
    }

    let (mut att, mut prf) = (None, None);
    for (key, value) in fields {
        let slot = match key.as_str() {
            ATT => &mut att,
            PRF => &mut prf,
            other => return Err(shape(&format!("unexpected field `{other}`"))),
        };
        if slot.replace(value).is_some() {
            return Err(shape(&format!("repeated field `{key}`")));
        }
    }

    let att = match att {
        Some(att @ RawJson::Object(_)) => att,
        Some(_) => return Err(shape("`att` must be an object")),
        None => return Err(shape("missing `att`")),
    };

    let prf = match prf {
        Some(RawJson::Array(items)) => items
            .iter()
            .map(|item| match item {
                RawJson::Scalar(Value::String(proof)) => Ok(proof.as_str()),
                _ => Err(shape("`prf` entries must be strings")),
            })
            .collect::<Result<Vec<_>, _>>()?,
        Some(_) => return Err(shape("`prf` must be an array")),
        None => return Err(shape("missing `prf`")),
    };

    Ok((att, prf))
}
