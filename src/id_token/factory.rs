use super::{DEFAULT_USER_ID_KEY, IdToken, IdTokenParser, IdTokenValidator};
use crate::errors::OIDCError;
use crate::jwks::VerificationKeys;

/// Runs the parser and the validator and wraps the result in an [`IdToken`].
#[derive(Debug, Clone)]
pub struct IdTokenFactory {
    parser: IdTokenParser,
    validator: IdTokenValidator,
}

impl IdTokenFactory {
    pub fn new(parser: IdTokenParser, validator: IdTokenValidator) -> Self {
        Self { parser, validator }
    }

    /// Verifies `jwt` and its claims, errors from either stage are returned unchanged.
    ///
    /// # Arguments
    /// * `jwt` - the raw id_token.
    /// * `keys` - verification keys from the provider's JWKS.
    /// * `client_id` - expected `aud`.
    /// * `issuer` - expected `iss`.
    /// * `expected_nonce` - optional explicit nonce to match on top of the nonce service.
    /// * `user_id_key` - claim holding the user id, `sub` when `None`.
    pub fn create_id_token(
        &self,
        jwt: &str,
        keys: &VerificationKeys,
        client_id: &str,
        issuer: &str,
        expected_nonce: Option<&str>,
        user_id_key: Option<&str>,
    ) -> Result<IdToken, OIDCError> {
        let claims = self.parser.parse_id_token(jwt, keys)?;
        self.validator
            .validate_claims(&claims, client_id, issuer, expected_nonce)?;
        Ok(IdToken::new(
            claims,
            user_id_key.unwrap_or(DEFAULT_USER_ID_KEY),
        ))
    }
}
