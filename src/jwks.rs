//! JSON Web Key Set handling.
//!
//! Turns a provider's `{ "keys": [...] }` document into verification keys
//! indexed by key id. Only RSA signing keys are usable; anything else, or
//! any key whose components fail to decode, is skipped with a warning
//! instead of failing the whole set.
use crate::crypto::SigningKey;
use crate::errors::OIDCError;
use serde_derive::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;

/// Verification keys indexed by `kid`.
pub type VerificationKeys = HashMap<String, SigningKey>;

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct JwksResponse {
    #[serde(default)]
    pub keys: Vec<JsonWebKey>,
}

impl JwksResponse {
    /// Interprets an already parsed HTTP body as a key set.
    pub fn from_value(value: Value) -> Result<Self, OIDCError> {
        if !value.get("keys").is_some_and(Value::is_array) {
            return Err(OIDCError::JwksFetch(
                "response does not contain a 'keys' array".to_string(),
            ));
        }
        serde_json::from_value(value).map_err(|err| OIDCError::JwksFetch(err.to_string()))
    }
}

/// A single key descriptor. Only `kid`, `n` and `e` carry meaning for verification.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct JsonWebKey {
    #[serde(default)]
    pub kid: Option<String>,
    #[serde(default)]
    pub kty: Option<String>,
    #[serde(default)]
    pub n: Option<String>,
    #[serde(default)]
    pub e: Option<String>,
    #[serde(default)]
    pub alg: Option<String>,
    #[serde(default, rename = "use")]
    pub key_use: Option<String>,
    #[serde(flatten)]
    pub other: Map<String, Value>,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct JwksResponseParser;

impl JwksResponseParser {
    pub fn new() -> Self {
        Self
    }

    /// Converts every usable key descriptor into a [`SigningKey`].
    ///
    /// Pure transformation, no I/O. A later key with an already seen `kid`
    /// replaces the earlier one.
    pub fn verification_keys(&self, response: &JwksResponse) -> VerificationKeys {
        let mut keys = VerificationKeys::new();
        for jwk in &response.keys {
            if let Some(key) = Self::signing_key(jwk) {
                if keys.insert(key.kid().to_string(), key).is_some() {
                    tracing::warn!(kid = ?jwk.kid, "duplicate key id in JWKS, keeping the last one");
                }
            }
        }
        keys
    }

    fn signing_key(jwk: &JsonWebKey) -> Option<SigningKey> {
        let Some(kid) = jwk.kid.as_deref() else {
            tracing::warn!("skipping JWKS entry without a key id");
            return None;
        };
        if jwk.kty.as_deref().is_some_and(|kty| kty != "RSA") {
            tracing::debug!(kid, kty = ?jwk.kty, "skipping non RSA key");
            return None;
        }
        if jwk.key_use.as_deref().is_some_and(|key_use| key_use != "sig") {
            tracing::debug!(kid, key_use = ?jwk.key_use, "skipping key not meant for signatures");
            return None;
        }
        if jwk.alg.as_deref().is_some_and(|alg| alg != "RS256") {
            tracing::debug!(kid, alg = ?jwk.alg, "skipping key for unsupported algorithm");
            return None;
        }
        let (Some(n), Some(e)) = (jwk.n.as_deref(), jwk.e.as_deref()) else {
            tracing::warn!(kid, "skipping RSA key without modulus or exponent");
            return None;
        };
        match SigningKey::from_components(kid, n, e) {
            Ok(key) => Some(key),
            Err(err) => {
                tracing::warn!(kid, error = %err, "skipping malformed RSA key");
                None
            }
        }
    }
}
