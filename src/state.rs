//! Session bound `state` and `nonce` tokens.
//!
//! A token has the form `<salt>_<sha1(session_id + salt)>` where `salt` is a
//! hex encoded run of random bytes. Validation recomputes the hash for the
//! session the callback arrived on and compares it in constant time, so a
//! token issued for one session never validates for another.
use crate::errors::OIDCError;
use crate::utils::generate_random_bytes;
use sha1::{Digest, Sha1};
use std::fmt;
use subtle::ConstantTimeEq;

/// Number of random bytes in a generated salt.
pub const DEFAULT_SALT_LENGTH: usize = 32;

const SEPARATOR: char = '_';

/// Issues and checks the CSRF `state` parameter of an authorization request.
pub trait StateService: Send + Sync {
    fn generate_state(&self) -> String;
    fn validate_state(&self, state: &str) -> bool;
}

/// Issues and checks the replay protection `nonce` embedded in id_tokens.
pub trait NonceService: Send + Sync {
    fn generate_nonce(&self) -> String;
    fn validate_nonce(&self, nonce: &str) -> bool;
}

/// Stateless hash service bound to one session identifier.
///
/// The same service can act as both the state and the nonce service; the
/// roles are kept apart by the trait that is used to reach it.
#[derive(Clone)]
pub struct SessionBasedHashService {
    session_id: String,
    salt_length: usize,
}

impl fmt::Debug for SessionBasedHashService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionBasedHashService")
            .field("salt_length", &self.salt_length)
            .finish_non_exhaustive()
    }
}

impl SessionBasedHashService {
    pub fn new(session_id: impl Into<String>) -> Self {
        Self::with_salt_length(session_id, DEFAULT_SALT_LENGTH)
    }

    pub fn with_salt_length(session_id: impl Into<String>, salt_length: usize) -> Self {
        Self {
            session_id: session_id.into(),
            salt_length,
        }
    }

    pub fn salt_length(&self) -> usize {
        self.salt_length
    }

    /// Whether the service is bound to a non blank session. Unbound services never validate.
    pub fn is_bound(&self) -> bool {
        !self.session_id.trim().is_empty()
    }

    /// Produces a fresh `<salt>_<hash>` token for the bound session.
    pub fn generate(&self) -> String {
        let salt = hex::encode(generate_random_bytes(self.salt_length));
        let hash = self.hash(&salt);
        format!("{salt}{SEPARATOR}{hash}")
    }

    /// Checks a token against the bound session. Malformed input is `false`, never an error.
    ///
    /// Without a session the hash is computable by anyone, so nothing validates.
    pub fn validate(&self, token: &str) -> bool {
        if !self.is_bound() {
            return false;
        }
        let Some((salt, hash)) = token.split_once(SEPARATOR) else {
            return false;
        };
        if salt.is_empty() || hash.is_empty() {
            return false;
        }
        let expected = self.hash(salt);
        expected.as_bytes().ct_eq(hash.as_bytes()).into()
    }

    fn hash(&self, salt: &str) -> String {
        let mut hasher = Sha1::new();
        hasher.update(self.session_id.as_bytes());
        hasher.update(salt.as_bytes());
        hex::encode(hasher.finalize())
    }
}

impl StateService for SessionBasedHashService {
    fn generate_state(&self) -> String {
        self.generate()
    }

    fn validate_state(&self, state: &str) -> bool {
        self.validate(state)
    }
}

impl NonceService for SessionBasedHashService {
    fn generate_nonce(&self) -> String {
        self.generate()
    }

    fn validate_nonce(&self, nonce: &str) -> bool {
        self.validate(nonce)
    }
}

/// Capability of providers that can issue and check the `state` parameter.
///
/// Implementors only expose their optional [`StateService`]; generation and
/// validation are delegated to it.
pub trait StateAware {
    fn state_service(&self) -> Option<&dyn StateService>;

    fn generate_state(&self) -> Result<String, OIDCError> {
        self.state_service()
            .map(|service| service.generate_state())
            .ok_or(OIDCError::StateValidationUnsupported)
    }

    fn validate_state(&self, state: &str) -> Result<bool, OIDCError> {
        self.state_service()
            .map(|service| service.validate_state(state))
            .ok_or(OIDCError::StateValidationUnsupported)
    }
}
