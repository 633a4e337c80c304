use super::Claims;
use crate::errors::OIDCError;
use crate::jwks::VerificationKeys;
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use jsonwebtoken::{Algorithm, Validation, decode, decode_header};
use std::collections::HashSet;

/// Decodes a compact id_token and verifies its RS256 signature.
///
/// Every failure surfaces as either [`OIDCError::MalformedIdToken`] or
/// [`OIDCError::SignatureVerificationFailed`], which share one generic message.
/// The underlying cause is only logged.
#[derive(Debug, Clone, Copy, Default)]
pub struct IdTokenParser;

impl IdTokenParser {
    pub fn new() -> Self {
        Self
    }

    /// Parses and verifies `jwt` against `keys`, returning its payload claims.
    ///
    /// # Arguments
    /// * `jwt` - the raw `header.payload.signature` string.
    /// * `keys` - verification keys from the provider's JWKS, indexed by `kid`.
    ///
    /// # Errors
    /// * `MalformedIdToken` - not three segments, an empty signature, or a
    ///   header or payload that is not base64url encoded JSON.
    /// * `SignatureVerificationFailed` - an algorithm other than RS256, an
    ///   unknown `kid`, or a signature that does not verify.
    pub fn parse_id_token(&self, jwt: &str, keys: &VerificationKeys) -> Result<Claims, OIDCError> {
        let segments: Vec<&str> = jwt.split('.').collect();
        if segments.len() != 3 || segments[2].is_empty() {
            tracing::debug!("rejecting unsigned id_token");
            return Err(OIDCError::MalformedIdToken);
        }

        let header = decode_header(jwt).map_err(|err| {
            tracing::debug!(error = %err, "id_token header could not be decoded");
            OIDCError::MalformedIdToken
        })?;
        decode_payload(segments[1])?;

        if header.alg != Algorithm::RS256 {
            tracing::debug!(alg = ?header.alg, "id_token is not signed with RS256");
            return Err(OIDCError::SignatureVerificationFailed);
        }

        let key = match header.kid.as_deref() {
            Some(kid) => keys.get(kid),
            // a key set with a single key is unambiguous
            None if keys.len() == 1 => keys.values().next(),
            None => None,
        }
        .ok_or_else(|| {
            tracing::debug!(kid = ?header.kid, "no verification key for id_token");
            OIDCError::SignatureVerificationFailed
        })?;

        let data = decode::<Claims>(jwt, key.decoding_key(), &signature_only()).map_err(|err| {
            tracing::debug!(kid = key.kid(), error = %err, "id_token signature rejected");
            OIDCError::SignatureVerificationFailed
        })?;
        Ok(data.claims)
    }
}

fn decode_payload(segment: &str) -> Result<Claims, OIDCError> {
    let bytes = URL_SAFE_NO_PAD.decode(segment).map_err(|err| {
        tracing::debug!(error = %err, "id_token payload is not base64url");
        OIDCError::MalformedIdToken
    })?;
    serde_json::from_slice(&bytes).map_err(|err| {
        tracing::debug!(error = %err, "id_token payload is not a JSON object");
        OIDCError::MalformedIdToken
    })
}

// Claim checks belong to the validator, this only pins the algorithm and checks the signature.
fn signature_only() -> Validation {
    let mut validation = Validation::new(Algorithm::RS256);
    validation.validate_exp = false;
    validation.validate_nbf = false;
    validation.validate_aud = false;
    validation.required_spec_claims = HashSet::new();
    validation
}
