//! Provider configuration.
//!
//! [`OpenIdProviderOptions`] carries everything an [`crate::OpenIdProvider`]
//! needs before discovery: client credentials, redirect uri, the discovery
//! document url and network/clock tolerances.
use crate::errors::OIDCError;
use crate::id_token::DEFAULT_CLOCK_SKEW;
use openidconnect::{ClientId, ClientSecret, RedirectUrl};
use std::env;
use std::path::Path;
use std::time::Duration;

/// Timeout applied to every discovery, JWKS, token and userinfo request.
pub const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(10);

/// Client credentials shared by every grant request.
#[derive(Debug, Clone)]
pub struct ClientCredentials {
    pub client_id: ClientId,
    pub client_secret: ClientSecret,
    pub redirect_uri: Option<RedirectUrl>,
}

impl ClientCredentials {
    pub fn new(
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        redirect_uri: Option<&str>,
    ) -> Result<Self, OIDCError> {
        let redirect_uri = redirect_uri
            .map(|uri| RedirectUrl::new(uri.to_string()))
            .transpose()?;
        Ok(Self {
            client_id: ClientId::new(client_id.into()),
            client_secret: ClientSecret::new(client_secret.into()),
            redirect_uri,
        })
    }
}

#[derive(Debug, Clone)]
pub struct OpenIdProviderOptions {
    pub credentials: ClientCredentials,
    /// Full url of the `.well-known/openid-configuration` document.
    pub openid_configuration_url: String,
    pub http_timeout: Duration,
    /// Seconds of tolerance on `exp`, `nbf` and `iat`.
    pub clock_skew: u64,
}

impl OpenIdProviderOptions {
    pub fn new(
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        redirect_uri: &str,
        openid_configuration_url: impl Into<String>,
    ) -> Result<Self, OIDCError> {
        Ok(Self {
            credentials: ClientCredentials::new(client_id, client_secret, Some(redirect_uri))?,
            openid_configuration_url: openid_configuration_url.into(),
            http_timeout: DEFAULT_HTTP_TIMEOUT,
            clock_skew: DEFAULT_CLOCK_SKEW,
        })
    }

    pub fn with_http_timeout(mut self, timeout: Duration) -> Self {
        self.http_timeout = timeout;
        self
    }

    pub fn with_clock_skew(mut self, seconds: u64) -> Self {
        self.clock_skew = seconds;
        self
    }

    pub fn client_id(&self) -> &ClientId {
        &self.credentials.client_id
    }

    /// Loads options from the environment.
    ///
    /// Reads `CLIENT_ID`, `CLIENT_SECRET` (or a file named by
    /// `CLIENT_SECRET_FILE`), `REDIRECT_URI`, `OPENID_CONFIGURATION_URL` and
    /// the optional `OIDC_HTTP_TIMEOUT_SECS`.
    ///
    /// # Errors
    /// Returns the matching `Missing*` error when a required variable is
    /// unset, or an IO error when the secret file cannot be read.
    pub fn from_env() -> Result<Self, OIDCError> {
        let client_id = env::var("CLIENT_ID").map_err(|_| OIDCError::MissingClientId)?;
        let client_secret = match (env::var("CLIENT_SECRET"), env::var("CLIENT_SECRET_FILE")) {
            (Ok(secret), _) => secret,
            (Err(_), Ok(path)) => load_client_secret(path)?,
            _ => return Err(OIDCError::MissingClientSecret),
        };
        let redirect_uri = env::var("REDIRECT_URI").map_err(|_| OIDCError::MissingRedirectUri)?;
        let configuration_url =
            env::var("OPENID_CONFIGURATION_URL").map_err(|_| OIDCError::MissingConfigurationUrl)?;

        let mut options =
            Self::new(client_id, client_secret, &redirect_uri, configuration_url)?;
        if let Ok(secs) = env::var("OIDC_HTTP_TIMEOUT_SECS") {
            let secs = secs
                .trim()
                .parse::<u64>()
                .map_err(|_| OIDCError::Custom(format!("invalid OIDC_HTTP_TIMEOUT_SECS: {secs}")))?;
            options.http_timeout = Duration::from_secs(secs);
        }
        Ok(options)
    }
}

/// Reads a client secret from a file, dropping trailing whitespace.
pub fn load_client_secret<P: AsRef<Path>>(secret_file: P) -> Result<String, OIDCError> {
    let contents = std::fs::read_to_string(secret_file.as_ref())?;
    Ok(contents.trim_end().to_string())
}
