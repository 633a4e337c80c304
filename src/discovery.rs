use crate::errors::OIDCError;
use crate::http;
use serde_derive::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// OpenID Connect discovery document, see
/// <https://openid.net/specs/openid-connect-discovery-1_0.html#ProviderMetadata>.
///
/// Only the fields this crate acts on are typed; everything else is kept in
/// `additional`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct OpenIdConfiguration {
    /// Issuer identifier, compared verbatim against the `iss` claim.
    #[serde(default)]
    pub issuer: String,

    /// URL of the authorization endpoint the user agent is redirected to.
    #[serde(default)]
    pub authorization_endpoint: String,

    /// URL of the token endpoint used for code, refresh and bearer grants.
    #[serde(default)]
    pub token_endpoint: String,

    /// URL of the JSON Web Key Set used to verify id_token signatures.
    #[serde(default)]
    pub jwks_uri: String,

    /// URL of the userinfo endpoint, if the provider has one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub userinfo_endpoint: Option<String>,

    #[serde(flatten)]
    pub additional: Map<String, Value>,
}

impl OpenIdConfiguration {
    /// Fetches and validates the document at `url`.
    pub async fn fetch(client: &reqwest::Client, url: &str) -> Result<Self, OIDCError> {
        tracing::debug!(url, "fetching openid configuration");
        let body = http::get_parsed(client, url, None).await?;
        Self::from_value(body)
    }

    pub fn from_value(value: Value) -> Result<Self, OIDCError> {
        if !value.is_object() {
            return Err(OIDCError::DiscoveryFetch(
                "openid configuration is not a JSON object".to_string(),
            ));
        }
        let configuration: Self = serde_json::from_value(value)
            .map_err(|err| OIDCError::DiscoveryFetch(err.to_string()))?;
        configuration.validate()?;
        Ok(configuration)
    }

    /// Ensures every endpoint the OpenID flow depends on is present.
    pub fn validate(&self) -> Result<(), OIDCError> {
        let required = [
            ("issuer", &self.issuer),
            ("authorization_endpoint", &self.authorization_endpoint),
            ("token_endpoint", &self.token_endpoint),
            ("jwks_uri", &self.jwks_uri),
        ];
        for (name, value) in required {
            if value.trim().is_empty() {
                return Err(OIDCError::DiscoveryFetch(format!(
                    "openid configuration is missing '{name}'"
                )));
            }
        }
        Ok(())
    }
}
