use serde_json::Value;
use std::fmt;
use thiserror::Error;

/// The claim that failed semantic validation on an otherwise well formed id_token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClaimError {
    Audience,
    Issuer,
    Nonce,
    Expiry,
}

impl fmt::Display for ClaimError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            ClaimError::Audience => "the audience is invalid",
            ClaimError::Issuer => "the issuer is invalid",
            ClaimError::Nonce => "the nonce is invalid",
            ClaimError::Expiry => "the token is expired or not yet valid",
        };
        f.write_str(msg)
    }
}

#[derive(Debug, Error)]
pub enum OIDCError {
    #[error("IO Error: {0}")]
    IO(#[from] std::io::Error),
    #[error("JSON web token error: {0}")]
    JsonWebToken(#[from] jsonwebtoken::errors::Error),
    #[error("serde JSON error: {0}")]
    JSONErr(#[from] serde_json::Error),
    #[error("reqwest error: {0}")]
    RequestErr(#[from] reqwest::Error),
    #[error("url parsing error: {0}")]
    UrlErr(#[from] url::ParseError),
    #[error("base64 decoding error: {0}")]
    Base64Err(#[from] base64::DecodeError),
    #[error("RSA error: {0}")]
    Rsa(#[from] rsa::Error),
    #[error("PKCS8 error: {0}")]
    PKCS8Err(#[from] rsa::pkcs8::spki::Error),

    #[error("missing client id")]
    MissingClientId,
    #[error("missing client secret")]
    MissingClientSecret,
    #[error("missing redirect uri")]
    MissingRedirectUri,
    #[error("missing openid configuration url")]
    MissingConfigurationUrl,

    #[error("unable to fetch the openid configuration: {0}")]
    DiscoveryFetch(String),
    #[error("unable to fetch the json web key set: {0}")]
    JwksFetch(String),

    // Both parse failures share a message so callers cannot tell them apart.
    #[error("unable to parse the id_token")]
    MalformedIdToken,
    #[error("unable to parse the id_token")]
    SignatureVerificationFailed,
    #[error("id_token claim validation failed: {0}")]
    InvalidClaim(ClaimError),

    #[error("identity provider error ({status}): {message}")]
    IdentityProvider {
        message: String,
        status: u16,
        response: Value,
    },

    #[error("invalid refresh token")]
    InvalidRefreshToken,
    #[error("required grant parameter not passed: {0}")]
    MissingGrantParameter(&'static str),
    #[error("a session id is required to bind state and nonce")]
    MissingSessionId,
    #[error("state validation is not supported by this provider")]
    StateValidationUnsupported,
    #[error("identity provider response exceeds {0} bytes")]
    ResponseTooLarge(usize),
    #[error("unexpected response format from the identity provider")]
    UnexpectedResponseFormat,
    #[error("token response did not contain an id_token")]
    MissingIdToken,
    #[error("this provider has no resource owner endpoint")]
    ResourceOwnerUnsupported,

    #[error("{0}")]
    Custom(String),
}

impl From<&str> for OIDCError {
    fn from(val: &str) -> OIDCError {
        OIDCError::Custom(val.to_string())
    }
}

impl From<ClaimError> for OIDCError {
    fn from(err: ClaimError) -> OIDCError {
        OIDCError::InvalidClaim(err)
    }
}

impl OIDCError {
    /// Returns true for failures that mean the presented id_token must not be trusted.
    pub fn is_id_token_rejection(&self) -> bool {
        matches!(
            self,
            OIDCError::MalformedIdToken
                | OIDCError::SignatureVerificationFailed
                | OIDCError::InvalidClaim(_)
        )
    }
}
