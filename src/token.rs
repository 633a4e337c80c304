use crate::config::ClientCredentials;
use crate::errors::OIDCError;
use crate::http;
use crate::utils::{now_secs, timestamp};
use openidconnect::{AccessToken, AuthorizationCode, RefreshToken};
use serde_derive::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;

/// Grant type of the JWT bearer (on-behalf-of) flow.
pub const JWT_BEARER_GRANT_TYPE: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";

// Values above this are absolute timestamps, below it a number of seconds from now.
const EXPIRES_TIMESTAMP_THRESHOLD: i64 = 60 * 60 * 24 * 365 * 10;

/// Tokens returned by a token endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TokenResponse {
    access_token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    refresh_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    id_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    token_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    scope: Option<String>,
    /// Absolute expiry as a UNIX timestamp.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    expires: Option<i64>,
    #[serde(flatten)]
    values: Map<String, Value>,
}

impl TokenResponse {
    /// Builds a token from a parsed token endpoint body.
    ///
    /// `expires_in` is turned into an absolute `expires`; an `expires` that
    /// looks like a duration rather than a timestamp is treated the same way.
    pub fn from_value(value: Value) -> Result<Self, OIDCError> {
        let Value::Object(mut fields) = value else {
            return Err(OIDCError::UnexpectedResponseFormat);
        };

        let access_token = match fields.remove("access_token") {
            Some(Value::String(token)) if !token.is_empty() => token,
            _ => {
                tracing::warn!("token response without an access_token");
                return Err(OIDCError::UnexpectedResponseFormat);
            }
        };

        let now = now_secs();
        let expires = match (fields.remove("expires_in"), fields.remove("expires")) {
            (Some(expires_in), _) => Some(now.saturating_add(seconds(&expires_in)?)),
            (None, Some(expires)) => {
                let expires = seconds(&expires)?;
                Some(if expires > EXPIRES_TIMESTAMP_THRESHOLD {
                    expires
                } else {
                    now.saturating_add(expires)
                })
            }
            (None, None) => None,
        };

        Ok(Self {
            access_token,
            refresh_token: take_string(&mut fields, "refresh_token"),
            id_token: take_string(&mut fields, "id_token"),
            token_type: take_string(&mut fields, "token_type"),
            scope: take_string(&mut fields, "scope"),
            expires,
            values: fields,
        })
    }

    pub fn access_token(&self) -> AccessToken {
        AccessToken::new(self.access_token.clone())
    }

    pub fn refresh_token(&self) -> Option<RefreshToken> {
        self.refresh_token.clone().map(RefreshToken::new)
    }

    pub fn id_token(&self) -> Option<&str> {
        self.id_token.as_deref()
    }

    pub fn token_type(&self) -> Option<&str> {
        self.token_type.as_deref()
    }

    pub fn scope(&self) -> Option<&str> {
        self.scope.as_deref()
    }

    pub fn expires(&self) -> Option<i64> {
        self.expires
    }

    /// Fields the provider returned beyond the standard ones.
    pub fn values(&self) -> &Map<String, Value> {
        &self.values
    }

    /// A token without an expiry never expires.
    pub fn has_expired(&self) -> bool {
        self.expires.is_some_and(|expires| expires <= now_secs())
    }

    pub(crate) fn refresh_token_str(&self) -> Option<&str> {
        self.refresh_token.as_deref()
    }

    /// Keeps `refresh_token` when the provider did not rotate it.
    pub(crate) fn with_fallback_refresh_token(mut self, refresh_token: &str) -> Self {
        if self.refresh_token.is_none() {
            self.refresh_token = Some(refresh_token.to_string());
        }
        self
    }
}

fn take_string(fields: &mut Map<String, Value>, key: &str) -> Option<String> {
    match fields.remove(key) {
        Some(Value::String(value)) => Some(value),
        Some(Value::Null) | None => None,
        // keep non standard encodings around untouched
        Some(other) => {
            fields.insert(key.to_string(), other);
            None
        }
    }
}

fn seconds(value: &Value) -> Result<i64, OIDCError> {
    timestamp(value)
        .or_else(|| value.as_str().and_then(|s| s.trim().parse().ok()))
        .ok_or_else(|| OIDCError::Custom(format!("invalid token expiry: {value}")))
}

/// An OAuth2 grant presented to a token endpoint.
#[derive(Debug, Clone)]
pub enum Grant {
    AuthorizationCode {
        code: AuthorizationCode,
    },
    RefreshToken {
        refresh_token: RefreshToken,
    },
    /// On-behalf-of flow exchanging an assertion for a new token.
    JwtBearer {
        assertion: String,
        requested_token_use: String,
    },
}

impl Grant {
    pub fn grant_type(&self) -> &'static str {
        match self {
            Grant::AuthorizationCode { .. } => "authorization_code",
            Grant::RefreshToken { .. } => "refresh_token",
            Grant::JwtBearer { .. } => JWT_BEARER_GRANT_TYPE,
        }
    }

    /// Form parameters of the grant, `grant_type` included.
    ///
    /// # Errors
    /// `InvalidRefreshToken` for a blank refresh token, `MissingGrantParameter`
    /// for any other blank required parameter.
    pub fn params(&self) -> Result<Vec<(String, String)>, OIDCError> {
        let mut params = vec![("grant_type".to_string(), self.grant_type().to_string())];
        match self {
            Grant::AuthorizationCode { code } => {
                params.push(("code".to_string(), required("code", code.secret())?));
            }
            Grant::RefreshToken { refresh_token } => {
                if refresh_token.secret().trim().is_empty() {
                    return Err(OIDCError::InvalidRefreshToken);
                }
                params.push(("refresh_token".to_string(), refresh_token.secret().clone()));
            }
            Grant::JwtBearer {
                assertion,
                requested_token_use,
            } => {
                params.push((
                    "requested_token_use".to_string(),
                    required("requested_token_use", requested_token_use)?,
                ));
                params.push(("assertion".to_string(), required("assertion", assertion)?));
            }
        }
        Ok(params)
    }
}

fn required(name: &'static str, value: &str) -> Result<String, OIDCError> {
    if value.trim().is_empty() {
        return Err(OIDCError::MissingGrantParameter(name));
    }
    Ok(value.to_string())
}

/// Requests a token from `token_url` with `grant`.
///
/// # Arguments
/// * `client` - http client of the provider.
/// * `token_url` - the provider's token endpoint.
/// * `credentials` - client id, secret and redirect uri sent with every grant.
/// * `grant` - the grant being exchanged.
/// * `extra` - additional parameters, overriding defaults with the same name.
pub(crate) async fn request_access_token(
    client: &reqwest::Client,
    token_url: &str,
    credentials: &ClientCredentials,
    grant: &Grant,
    extra: &[(String, String)],
) -> Result<TokenResponse, OIDCError> {
    let mut params: HashMap<String, String> = HashMap::new();
    params.insert("client_id".to_string(), credentials.client_id.as_str().to_string());
    params.insert(
        "client_secret".to_string(),
        credentials.client_secret.secret().to_string(),
    );
    if let Some(redirect_uri) = &credentials.redirect_uri {
        params.insert("redirect_uri".to_string(), redirect_uri.as_str().to_string());
    }
    params.extend(extra.iter().cloned());
    params.extend(grant.params()?);

    tracing::debug!(token_url, grant_type = grant.grant_type(), "requesting access token");
    let params: Vec<(String, String)> = params.into_iter().collect();
    let body = http::post_form_parsed(client, token_url, &params).await?;
    TokenResponse::from_value(body)
}
