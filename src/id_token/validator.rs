use super::Claims;
use crate::errors::{ClaimError, OIDCError};
use crate::state::NonceService;
use crate::utils::{now_secs, timestamp};
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use subtle::ConstantTimeEq;

/// Allowed clock difference with the identity provider, in seconds.
pub const DEFAULT_CLOCK_SKEW: u64 = 60;

/// Checks the semantics of already verified id_token claims.
///
/// Checks run in a fixed order and stop at the first failure: audience,
/// issuer, nonce, then the `exp`/`nbf`/`iat` time window.
#[derive(Clone)]
pub struct IdTokenValidator {
    nonce_service: Arc<dyn NonceService>,
    clock_skew: u64,
}

impl fmt::Debug for IdTokenValidator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IdTokenValidator")
            .field("clock_skew", &self.clock_skew)
            .finish_non_exhaustive()
    }
}

impl IdTokenValidator {
    pub fn new(nonce_service: Arc<dyn NonceService>) -> Self {
        Self {
            nonce_service,
            clock_skew: DEFAULT_CLOCK_SKEW,
        }
    }

    pub fn with_clock_skew(mut self, seconds: u64) -> Self {
        self.clock_skew = seconds;
        self
    }

    pub fn clock_skew(&self) -> u64 {
        self.clock_skew
    }

    /// Validates `claims` for this client and issuer at the current time.
    ///
    /// The nonce must always pass the session bound nonce service. When
    /// `expected_nonce` is given it must also match exactly.
    pub fn validate_claims(
        &self,
        claims: &Claims,
        expected_client_id: &str,
        expected_issuer: &str,
        expected_nonce: Option<&str>,
    ) -> Result<(), OIDCError> {
        self.validate_claims_at(
            claims,
            expected_client_id,
            expected_issuer,
            expected_nonce,
            now_secs(),
        )
    }

    pub(crate) fn validate_claims_at(
        &self,
        claims: &Claims,
        expected_client_id: &str,
        expected_issuer: &str,
        expected_nonce: Option<&str>,
        now: i64,
    ) -> Result<(), OIDCError> {
        if !audience_matches(claims.get("aud"), expected_client_id) {
            return Err(ClaimError::Audience.into());
        }

        if claims.get("iss").and_then(Value::as_str) != Some(expected_issuer) {
            return Err(ClaimError::Issuer.into());
        }

        let nonce = claims
            .get("nonce")
            .and_then(Value::as_str)
            .ok_or(ClaimError::Nonce)?;
        if !self.nonce_service.validate_nonce(nonce) {
            return Err(ClaimError::Nonce.into());
        }
        if let Some(expected) = expected_nonce {
            if !bool::from(nonce.as_bytes().ct_eq(expected.as_bytes())) {
                return Err(ClaimError::Nonce.into());
            }
        }

        self.check_time_window(claims, now)
    }

    fn check_time_window(&self, claims: &Claims, now: i64) -> Result<(), OIDCError> {
        let skew = i64::try_from(self.clock_skew).unwrap_or(i64::MAX);

        let exp = claims
            .get("exp")
            .and_then(timestamp)
            .ok_or(ClaimError::Expiry)?;
        if now.saturating_sub(skew) >= exp {
            return Err(ClaimError::Expiry.into());
        }

        for key in ["nbf", "iat"] {
            if let Some(value) = claims.get(key) {
                let at = timestamp(value).ok_or(ClaimError::Expiry)?;
                if at > now.saturating_add(skew) {
                    return Err(ClaimError::Expiry.into());
                }
            }
        }
        Ok(())
    }
}

fn audience_matches(aud: Option<&Value>, client_id: &str) -> bool {
    match aud {
        Some(Value::String(aud)) => aud == client_id,
        Some(Value::Array(auds)) => auds.iter().any(|aud| aud.as_str() == Some(client_id)),
        _ => false,
    }
}
