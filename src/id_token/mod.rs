//! OpenID Connect id_token verification.
//!
//! [`IdTokenParser`] checks the compact JWS and its RS256 signature,
//! [`IdTokenValidator`] checks the claims, and [`IdTokenFactory`] runs both
//! to produce an [`IdToken`].
mod factory;
mod parser;
mod validator;

pub use factory::IdTokenFactory;
pub use parser::IdTokenParser;
pub use validator::{DEFAULT_CLOCK_SKEW, IdTokenValidator};

use serde::{Serialize, Serializer};
use serde_json::{Map, Value};

/// Decoded id_token payload.
pub type Claims = Map<String, Value>;

/// Claim used as the user identifier unless a provider says otherwise.
pub const DEFAULT_USER_ID_KEY: &str = "sub";

/// Claims of an id_token that passed signature and claim validation.
///
/// Serializes as the bare claims object.
#[derive(Debug, Clone, PartialEq)]
pub struct IdToken {
    claims: Claims,
    user_id_key: String,
}

impl IdToken {
    pub fn new(claims: Claims, user_id_key: impl Into<String>) -> Self {
        Self {
            claims,
            user_id_key: user_id_key.into(),
        }
    }

    pub fn claims(&self) -> &Claims {
        &self.claims
    }

    pub fn claim(&self, key: &str) -> Option<&Value> {
        self.claims.get(key)
    }

    pub fn user_id_key(&self) -> &str {
        &self.user_id_key
    }

    /// The claim at the configured user id key, `None` when the token does not carry it.
    pub fn user_id(&self) -> Option<&Value> {
        self.claims.get(&self.user_id_key)
    }

    pub fn into_claims(self) -> Claims {
        self.claims
    }
}

impl Serialize for IdToken {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.claims.serialize(serializer)
    }
}
