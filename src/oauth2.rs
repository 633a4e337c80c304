//! Plain OAuth2 providers.
//!
//! Every vendor shares the same authorization code flow and only differs in
//! endpoints, scopes and a few default parameters, so a single
//! [`OAuth2Provider`] is parameterized by a [`VendorConfig`]. Ready made
//! configurations live in [`crate::vendors`].
use crate::authorization::{AuthorizationOptions, AuthorizationRequest, QueryParams, merge_extra};
use crate::config::{ClientCredentials, DEFAULT_HTTP_TIMEOUT};
use crate::errors::OIDCError;
use crate::http;
use crate::resource_owner::ResourceOwner;
use crate::state::{DEFAULT_SALT_LENGTH, SessionBasedHashService, StateAware, StateService};
use crate::storage::{self, AccessTokenStorage};
use crate::token::{Grant, TokenResponse, request_access_token};
use crate::utils::generate_random_bytes;
use openidconnect::{AccessToken, AuthorizationCode, ClientId, RefreshToken};
use std::sync::Arc;
use std::time::Duration;

/// Endpoints and defaults of one OAuth2 vendor.
#[derive(Debug, Clone, PartialEq)]
pub struct VendorConfig {
    pub name: String,
    pub authorization_url: String,
    pub token_url: String,
    /// Profile endpoint queried with the access token, if the vendor has one.
    pub resource_owner_url: Option<String>,
    pub default_scopes: Vec<String>,
    pub scope_separator: String,
    /// Authorization parameters applied before caller options.
    pub authorization_defaults: Vec<(String, String)>,
    /// Parameters sent with every authorization code exchange.
    pub token_defaults: Vec<(String, String)>,
    /// Field of the profile payload holding the user id.
    pub resource_owner_id_key: String,
}

impl VendorConfig {
    pub fn new(
        name: impl Into<String>,
        authorization_url: impl Into<String>,
        token_url: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            authorization_url: authorization_url.into(),
            token_url: token_url.into(),
            resource_owner_url: None,
            default_scopes: Vec::new(),
            scope_separator: " ".to_string(),
            authorization_defaults: Vec::new(),
            token_defaults: Vec::new(),
            resource_owner_id_key: "id".to_string(),
        }
    }

    pub fn resource_owner_url(mut self, url: impl Into<String>) -> Self {
        self.resource_owner_url = Some(url.into());
        self
    }

    pub fn default_scopes<I, S>(mut self, scopes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.default_scopes = scopes.into_iter().map(Into::into).collect();
        self
    }

    pub fn scope_separator(mut self, separator: impl Into<String>) -> Self {
        self.scope_separator = separator.into();
        self
    }

    pub fn authorization_default(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.authorization_defaults.push((key.into(), value.into()));
        self
    }

    pub fn token_default(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.token_defaults.push((key.into(), value.into()));
        self
    }

    pub fn resource_owner_id_key(mut self, key: impl Into<String>) -> Self {
        self.resource_owner_id_key = key.into();
        self
    }
}

#[derive(Clone)]
pub struct OAuth2Provider {
    vendor: VendorConfig,
    credentials: ClientCredentials,
    http_client: reqwest::Client,
    state_service: Option<Arc<dyn StateService>>,
}

impl std::fmt::Debug for OAuth2Provider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OAuth2Provider")
            .field("vendor", &self.vendor.name)
            .field("client_id", &self.credentials.client_id)
            .field("state_aware", &self.state_service.is_some())
            .finish()
    }
}

impl OAuth2Provider {
    /// Builds a provider without a state service.
    pub fn new(vendor: VendorConfig, credentials: ClientCredentials) -> Result<Self, OIDCError> {
        Self::with_http_timeout(vendor, credentials, DEFAULT_HTTP_TIMEOUT)
    }

    pub fn with_http_timeout(
        vendor: VendorConfig,
        credentials: ClientCredentials,
        timeout: Duration,
    ) -> Result<Self, OIDCError> {
        Ok(Self {
            vendor,
            credentials,
            http_client: http::build_http_client(timeout)?,
            state_service: None,
        })
    }

    pub fn with_state_service(mut self, state_service: Arc<dyn StateService>) -> Self {
        self.state_service = Some(state_service);
        self
    }

    /// A copy of this provider whose state is bound to `session_id`.
    ///
    /// # Errors
    /// `MissingSessionId` when `session_id` is blank.
    pub fn for_session(&self, session_id: &str) -> Result<Self, OIDCError> {
        let service = SessionBasedHashService::new(session_id);
        if !service.is_bound() {
            return Err(OIDCError::MissingSessionId);
        }
        Ok(self.clone().with_state_service(Arc::new(service)))
    }

    pub fn vendor(&self) -> &VendorConfig {
        &self.vendor
    }

    pub fn client_id(&self) -> &ClientId {
        &self.credentials.client_id
    }

    /// Builds the vendor's authorization url.
    ///
    /// Without a state service and without a caller supplied state, a random
    /// state is used; it cannot be validated later.
    pub fn authorization_url(
        &self,
        options: AuthorizationOptions,
    ) -> Result<AuthorizationRequest, OIDCError> {
        let state = match options.state.filter(|state| !state.is_empty()) {
            Some(state) => state,
            None => match &self.state_service {
                Some(service) => service.generate_state(),
                None => hex::encode(generate_random_bytes(DEFAULT_SALT_LENGTH)),
            },
        };
        let scopes = options
            .scopes
            .filter(|scopes| !scopes.is_empty())
            .unwrap_or_else(|| self.vendor.default_scopes.clone());

        let mut params = QueryParams::default();
        params.set("response_type", "code");
        params.set("approval_prompt", "auto");
        for (key, value) in &self.vendor.authorization_defaults {
            params.set(key, value.clone());
        }
        if !scopes.is_empty() {
            params.set("scope", scopes.join(&self.vendor.scope_separator));
        }
        merge_extra(&mut params, &options.extra);
        if let Some(redirect_uri) = options.redirect_uri {
            params.set("redirect_uri", redirect_uri);
        } else if let Some(redirect_uri) = &self.credentials.redirect_uri {
            params.set_default("redirect_uri", redirect_uri.as_str());
        }
        params.set("state", state.as_str());
        params.set("client_id", self.credentials.client_id.as_str());

        let url = params.append_to(&self.vendor.authorization_url)?;
        Ok(AuthorizationRequest {
            url,
            state,
            nonce: None,
        })
    }

    /// Exchanges an authorization code, sending the vendor's token defaults and then `extra`.
    pub async fn access_token_by_authorization_code(
        &self,
        code: AuthorizationCode,
        extra: &[(String, String)],
    ) -> Result<TokenResponse, OIDCError> {
        let mut params = self.vendor.token_defaults.clone();
        params.extend_from_slice(extra);
        self.request_token(&Grant::AuthorizationCode { code }, &params)
            .await
    }

    pub async fn access_token_by_refresh_token(
        &self,
        refresh_token: RefreshToken,
    ) -> Result<TokenResponse, OIDCError> {
        self.request_token(&Grant::RefreshToken { refresh_token }, &[])
            .await
    }

    async fn request_token(
        &self,
        grant: &Grant,
        extra: &[(String, String)],
    ) -> Result<TokenResponse, OIDCError> {
        request_access_token(
            &self.http_client,
            &self.vendor.token_url,
            &self.credentials,
            grant,
            extra,
        )
        .await
    }

    pub async fn retrieve_access_token<S: AccessTokenStorage>(
        &self,
        storage: &S,
        refresh_token: &str,
    ) -> Result<TokenResponse, OIDCError> {
        storage::retrieve_or_refresh(storage, refresh_token, |refresh_token| {
            self.access_token_by_refresh_token(refresh_token)
        })
        .await
    }

    pub async fn resource_owner(&self, access_token: &AccessToken) -> Result<ResourceOwner, OIDCError> {
        let url = self
            .vendor
            .resource_owner_url
            .as_deref()
            .ok_or(OIDCError::ResourceOwnerUnsupported)?;
        tracing::debug!(vendor = %self.vendor.name, "fetching resource owner");
        let body = http::get_parsed(&self.http_client, url, Some(access_token.secret())).await?;
        Ok(ResourceOwner::from_value(
            body,
            self.vendor.resource_owner_id_key.clone(),
        ))
    }
}

impl StateAware for OAuth2Provider {
    fn state_service(&self) -> Option<&dyn StateService> {
        self.state_service.as_deref()
    }
}
