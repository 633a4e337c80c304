//! OpenID Connect provider.
//!
//! [`OpenIdProvider`] is built once from a discovery document and shared.
//! Everything that depends on the user's session (state, nonce, id_token
//! validation) goes through an [`OpenIdSession`] obtained with
//! [`OpenIdProvider::for_session`], so concurrent authorization flows never
//! share mutable state.
use crate::authorization::{AuthorizationOptions, AuthorizationRequest, QueryParams, merge_extra};
use crate::config::{ClientCredentials, OpenIdProviderOptions};
use crate::discovery::OpenIdConfiguration;
use crate::errors::OIDCError;
use crate::http;
use crate::id_token::{
    DEFAULT_USER_ID_KEY, IdToken, IdTokenFactory, IdTokenParser, IdTokenValidator,
};
use crate::jwks::{JwksResponse, JwksResponseParser, VerificationKeys};
use crate::resource_owner::ResourceOwner;
use crate::state::{NonceService, SessionBasedHashService, StateAware, StateService};
use crate::storage::{self, AccessTokenStorage};
use crate::token::{Grant, TokenResponse, request_access_token};
use openidconnect::{AccessToken, AuthorizationCode, ClientId, RefreshToken};
use std::sync::Arc;

const DEFAULT_SCOPES: [&str; 1] = ["openid"];
const SCOPE_SEPARATOR: &str = " ";

#[derive(Debug, Clone)]
pub struct OpenIdProvider {
    credentials: ClientCredentials,
    configuration: OpenIdConfiguration,
    http_client: reqwest::Client,
    clock_skew: u64,
    user_id_key: String,
}

impl OpenIdProvider {
    /// Builds a provider by fetching the discovery document named in `options`.
    ///
    /// # Errors
    /// Fails when the HTTP client cannot be built or the discovery document
    /// cannot be fetched, parsed or lacks a required endpoint.
    pub async fn new(options: OpenIdProviderOptions) -> Result<Self, OIDCError> {
        let http_client = http::build_http_client(options.http_timeout)?;
        let configuration =
            OpenIdConfiguration::fetch(&http_client, &options.openid_configuration_url).await?;
        tracing::debug!(issuer = %configuration.issuer, "openid configuration loaded");
        Ok(Self::with_parts(options, configuration, http_client))
    }

    /// Builds a provider from an already known discovery document.
    pub fn from_configuration(
        options: OpenIdProviderOptions,
        configuration: OpenIdConfiguration,
    ) -> Result<Self, OIDCError> {
        configuration.validate()?;
        let http_client = http::build_http_client(options.http_timeout)?;
        Ok(Self::with_parts(options, configuration, http_client))
    }

    fn with_parts(
        options: OpenIdProviderOptions,
        configuration: OpenIdConfiguration,
        http_client: reqwest::Client,
    ) -> Self {
        Self {
            credentials: options.credentials,
            configuration,
            http_client,
            clock_skew: options.clock_skew,
            user_id_key: DEFAULT_USER_ID_KEY.to_string(),
        }
    }

    /// Reads the user id from `key` instead of `sub`.
    pub fn with_user_id_key(mut self, key: impl Into<String>) -> Self {
        self.user_id_key = key.into();
        self
    }

    pub fn configuration(&self) -> &OpenIdConfiguration {
        &self.configuration
    }

    pub fn client_id(&self) -> &ClientId {
        &self.credentials.client_id
    }

    pub fn issuer(&self) -> &str {
        &self.configuration.issuer
    }

    /// Binds the provider to a session, using session hashes for both state and nonce.
    ///
    /// # Errors
    /// `MissingSessionId` when `session_id` is blank.
    pub fn for_session(&self, session_id: &str) -> Result<OpenIdSession<'_>, OIDCError> {
        let service = SessionBasedHashService::new(session_id);
        if !service.is_bound() {
            return Err(OIDCError::MissingSessionId);
        }
        let service = Arc::new(service);
        Ok(self.with_services(service.clone(), service))
    }

    /// Binds the provider to caller supplied state and nonce services.
    pub fn with_services(
        &self,
        state_service: Arc<dyn StateService>,
        nonce_service: Arc<dyn NonceService>,
    ) -> OpenIdSession<'_> {
        OpenIdSession {
            provider: self,
            state_service,
            nonce_service,
        }
    }

    /// Exchanges an authorization code for tokens.
    ///
    /// `extra` parameters are sent along with the grant.
    pub async fn access_token_by_authorization_code(
        &self,
        code: AuthorizationCode,
        extra: &[(String, String)],
    ) -> Result<TokenResponse, OIDCError> {
        self.request_token(&Grant::AuthorizationCode { code }, extra)
            .await
    }

    /// # Errors
    /// `InvalidRefreshToken` when `refresh_token` is blank, without any request being made.
    pub async fn access_token_by_refresh_token(
        &self,
        refresh_token: RefreshToken,
    ) -> Result<TokenResponse, OIDCError> {
        self.request_token(&Grant::RefreshToken { refresh_token }, &[])
            .await
    }

    /// On-behalf-of exchange of `assertion` using the JWT bearer grant.
    pub async fn access_token_by_jwt_bearer(
        &self,
        assertion: &str,
        requested_token_use: &str,
    ) -> Result<TokenResponse, OIDCError> {
        let grant = Grant::JwtBearer {
            assertion: assertion.to_string(),
            requested_token_use: requested_token_use.to_string(),
        };
        self.request_token(&grant, &[]).await
    }

    async fn request_token(
        &self,
        grant: &Grant,
        extra: &[(String, String)],
    ) -> Result<TokenResponse, OIDCError> {
        request_access_token(
            &self.http_client,
            &self.configuration.token_endpoint,
            &self.credentials,
            grant,
            extra,
        )
        .await
    }

    /// Returns a stored access token for `refresh_token`, refreshing and storing it when
    /// the store has none or it has expired.
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

    /// Fetches the provider's current signing keys. Nothing is cached.
    pub async fn verification_keys(&self) -> Result<VerificationKeys, OIDCError> {
        let body = http::get_parsed(&self.http_client, &self.configuration.jwks_uri, None).await?;
        let jwks = JwksResponse::from_value(body)?;
        Ok(JwksResponseParser::new().verification_keys(&jwks))
    }

    /// Fetches the end user's profile from the userinfo endpoint.
    pub async fn resource_owner(&self, access_token: &AccessToken) -> Result<ResourceOwner, OIDCError> {
        let url = self
            .configuration
            .userinfo_endpoint
            .as_deref()
            .ok_or(OIDCError::ResourceOwnerUnsupported)?;
        let body = http::get_parsed(&self.http_client, url, Some(access_token.secret())).await?;
        Ok(ResourceOwner::from_value(body, self.user_id_key.clone()))
    }
}

/// An [`OpenIdProvider`] bound to one session's state and nonce services.
#[derive(Clone)]
pub struct OpenIdSession<'a> {
    provider: &'a OpenIdProvider,
    state_service: Arc<dyn StateService>,
    nonce_service: Arc<dyn NonceService>,
}

impl std::fmt::Debug for OpenIdSession<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenIdSession")
            .field("provider", self.provider)
            .finish_non_exhaustive()
    }
}

impl OpenIdSession<'_> {
    pub fn provider(&self) -> &OpenIdProvider {
        self.provider
    }

    /// Builds the authorization endpoint url.
    ///
    /// `state` and `nonce` are generated unless supplied in `options`, and
    /// returned alongside the url. `client_id` always comes from the provider.
    pub fn authorization_url(
        &self,
        options: AuthorizationOptions,
    ) -> Result<AuthorizationRequest, OIDCError> {
        let state = options
            .state
            .filter(|state| !state.is_empty())
            .unwrap_or_else(|| self.state_service.generate_state());
        let nonce = options
            .nonce
            .filter(|nonce| !nonce.is_empty())
            .unwrap_or_else(|| self.nonce_service.generate_nonce());
        let scopes = options
            .scopes
            .filter(|scopes| !scopes.is_empty())
            .unwrap_or_else(|| DEFAULT_SCOPES.iter().map(|s| s.to_string()).collect());
        let credentials = &self.provider.credentials;

        let mut params = QueryParams::default();
        params.set("response_type", "code");
        params.set("approval_prompt", "auto");
        params.set("scope", scopes.join(SCOPE_SEPARATOR));
        merge_extra(&mut params, &options.extra);
        if let Some(redirect_uri) = options.redirect_uri {
            params.set("redirect_uri", redirect_uri);
        } else if let Some(redirect_uri) = &credentials.redirect_uri {
            params.set_default("redirect_uri", redirect_uri.as_str());
        }
        params.set("state", state.as_str());
        params.set("nonce", nonce.as_str());
        params.set("client_id", credentials.client_id.as_str());

        let url = params.append_to(&self.provider.configuration.authorization_endpoint)?;
        Ok(AuthorizationRequest {
            url,
            state,
            nonce: Some(nonce),
        })
    }

    /// Checks the `state` echoed back on the callback.
    pub fn validate_state(&self, state: &str) -> bool {
        self.state_service.validate_state(state)
    }

    pub fn validate_nonce(&self, nonce: &str) -> bool {
        self.nonce_service.validate_nonce(nonce)
    }

    fn id_token_factory(&self) -> IdTokenFactory {
        let validator = IdTokenValidator::new(self.nonce_service.clone())
            .with_clock_skew(self.provider.clock_skew);
        IdTokenFactory::new(IdTokenParser::new(), validator)
    }

    /// Verifies `jwt` against freshly fetched signing keys and validates its claims.
    pub async fn parse_id_token(&self, jwt: &str) -> Result<IdToken, OIDCError> {
        self.parse_id_token_with_nonce(jwt, None).await
    }

    /// Like [`Self::parse_id_token`], additionally requiring the nonce to equal `expected_nonce`.
    pub async fn parse_id_token_with_nonce(
        &self,
        jwt: &str,
        expected_nonce: Option<&str>,
    ) -> Result<IdToken, OIDCError> {
        let keys = self.provider.verification_keys().await?;
        self.id_token_factory().create_id_token(
            jwt,
            &keys,
            self.provider.client_id().as_str(),
            self.provider.issuer(),
            expected_nonce,
            Some(self.provider.user_id_key.as_str()),
        )
    }

    /// Verifies the `id_token` carried by a token response.
    pub async fn id_token_from_response(
        &self,
        token: &TokenResponse,
        expected_nonce: Option<&str>,
    ) -> Result<IdToken, OIDCError> {
        let jwt = token.id_token().ok_or(OIDCError::MissingIdToken)?;
        self.parse_id_token_with_nonce(jwt, expected_nonce).await
    }

    /// Exchanges `code` and verifies the returned id_token in one step.
    pub async fn id_token_by_authorization_code(
        &self,
        code: AuthorizationCode,
    ) -> Result<(TokenResponse, IdToken), OIDCError> {
        let token = self
            .provider
            .access_token_by_authorization_code(code, &[])
            .await?;
        let id_token = self.id_token_from_response(&token, None).await?;
        Ok((token, id_token))
    }
}

impl StateAware for OpenIdSession<'_> {
    fn state_service(&self) -> Option<&dyn StateService> {
        Some(self.state_service.as_ref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ClaimError;
    use crate::sign::{OidcSigner, TEST_KEYS, jwk_for};
    use crate::storage::MemoryAccessTokenStorage;
    use serde_json::{Value, json};
    use wiremock::matchers::{body_string_contains, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn options(server: &MockServer) -> OpenIdProviderOptions {
        OpenIdProviderOptions::new(
            "client123",
            "secret",
            "https://app.example/callback",
            format!("{}/.well-known/openid-configuration", server.uri()),
        )
        .unwrap()
    }

    fn discovery(server: &MockServer) -> Value {
        json!({
            "issuer": "https://idp.example",
            "authorization_endpoint": "https://idp.example/auth",
            "token_endpoint": format!("{}/token", server.uri()),
            "jwks_uri": format!("{}/jwks", server.uri()),
            "userinfo_endpoint": format!("{}/userinfo", server.uri()),
        })
    }

    async fn provider(server: &MockServer) -> OpenIdProvider {
        Mock::given(method("GET"))
            .and(path("/.well-known/openid-configuration"))
            .respond_with(ResponseTemplate::new(200).set_body_json(discovery(server)))
            .expect(1)
            .mount(server)
            .await;
        OpenIdProvider::new(options(server)).await.expect("provider")
    }

    async fn mount_jwks(server: &MockServer) {
        Mock::given(method("GET"))
            .and(path("/jwks"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "keys": [jwk_for(&TEST_KEYS.primary, "kid1")]
            })))
            .mount(server)
            .await;
    }

    fn id_token_claims(nonce: &str) -> Value {
        let now = crate::utils::now_secs();
        json!({
            "aud": "client123",
            "iss": "https://idp.example",
            "sub": "user1",
            "nonce": nonce,
            "iat": now,
            "exp": now + 600,
        })
    }

    fn query(request: &AuthorizationRequest) -> Vec<(String, String)> {
        request.url.query_pairs().into_owned().collect()
    }

    fn param<'a>(pairs: &'a [(String, String)], key: &str) -> Option<&'a str> {
        pairs.iter().find(|(k, _)| k == key).map(|(_, v)| v.as_str())
    }

    #[tokio::test]
    async fn authorization_url_carries_state_and_nonce() {
        let server = MockServer::start().await;
        let provider = provider(&server).await;
        let session = provider.for_session("session-1").unwrap();

        let request = session.authorization_url(AuthorizationOptions::new()).unwrap();
        let url = request.url.to_string();
        assert!(url.starts_with("https://idp.example/auth?"));
        assert!(url.contains("response_type=code"));
        assert!(url.contains("client_id=client123"));
        assert!(url.contains("scope=openid"));

        let pairs = query(&request);
        let state = param(&pairs, "state").unwrap();
        let nonce = param(&pairs, "nonce").unwrap();
        assert_ne!(state, nonce);
        assert_eq!(state, request.state);
        assert_eq!(Some(nonce), request.nonce.as_deref());
        assert_eq!(param(&pairs, "redirect_uri"), Some("https://app.example/callback"));

        assert!(session.validate_state(state));
        assert!(session.validate_nonce(nonce));
        assert!(!provider.for_session("session-2").unwrap().validate_state(state));
    }

    #[tokio::test]
    async fn authorization_options_override_defaults() {
        let server = MockServer::start().await;
        let provider = provider(&server).await;
        let session = provider.for_session("session-1").unwrap();

        let request = session
            .authorization_url(
                AuthorizationOptions::new()
                    .scopes(["openid", "email"])
                    .state("fixed-state")
                    .redirect_uri("https://other.example/cb")
                    .param("prompt", "login")
                    .param("client_id", "spoofed"),
            )
            .unwrap();
        let pairs = query(&request);
        assert_eq!(param(&pairs, "scope"), Some("openid email"));
        assert_eq!(param(&pairs, "state"), Some("fixed-state"));
        assert_eq!(param(&pairs, "redirect_uri"), Some("https://other.example/cb"));
        assert_eq!(param(&pairs, "prompt"), Some("login"));
        assert_eq!(param(&pairs, "client_id"), Some("client123"));
        assert_eq!(request.state, "fixed-state");
    }

    #[tokio::test]
    async fn parse_id_token_end_to_end() {
        let server = MockServer::start().await;
        let provider = provider(&server).await;
        mount_jwks(&server).await;
        let session = provider.for_session("session-1").unwrap();

        let nonce = session
            .authorization_url(AuthorizationOptions::new())
            .unwrap()
            .nonce
            .unwrap();
        let jwt = OidcSigner::from_private_key(&TEST_KEYS.primary, "kid1").sign(&id_token_claims(&nonce));

        let id_token = session.parse_id_token(&jwt).await.expect("valid id_token");
        assert_eq!(id_token.user_id(), Some(&json!("user1")));

        // keys are fetched again for every parse
        session.parse_id_token(&jwt).await.unwrap();
        let jwks_calls = server
            .received_requests()
            .await
            .unwrap()
            .iter()
            .filter(|request| request.url.path() == "/jwks")
            .count();
        assert_eq!(jwks_calls, 2);
    }

    /// Accepts exactly one nonce value.
    struct FixedNonce(&'static str);

    impl NonceService for FixedNonce {
        fn generate_nonce(&self) -> String {
            self.0.to_string()
        }

        fn validate_nonce(&self, nonce: &str) -> bool {
            nonce == self.0
        }
    }

    #[tokio::test]
    async fn caller_supplied_nonce_service() {
        let server = MockServer::start().await;
        let provider = provider(&server).await;
        mount_jwks(&server).await;
        let session = provider.with_services(
            Arc::new(SessionBasedHashService::new("session-1")),
            Arc::new(FixedNonce("N1")),
        );

        let request = session.authorization_url(AuthorizationOptions::new()).unwrap();
        assert_eq!(request.nonce.as_deref(), Some("N1"));

        let signer = OidcSigner::from_private_key(&TEST_KEYS.primary, "kid1");
        let id_token = session
            .parse_id_token(&signer.sign(&id_token_claims("N1")))
            .await
            .expect("nonce accepted by the service");
        assert_eq!(id_token.user_id(), Some(&json!("user1")));

        match session.parse_id_token(&signer.sign(&id_token_claims("N2"))).await {
            Err(OIDCError::InvalidClaim(ClaimError::Nonce)) => {}
            other => panic!("expected nonce rejection, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn blank_session_id_is_refused() {
        let server = MockServer::start().await;
        let provider = provider(&server).await;
        for session_id in ["", "  "] {
            match provider.for_session(session_id) {
                Err(OIDCError::MissingSessionId) => {}
                other => panic!("expected MissingSessionId, got {:?}", other.map(|_| ())),
            }
        }
    }

    #[tokio::test]
    async fn id_token_from_another_session_is_rejected() {
        let server = MockServer::start().await;
        let provider = provider(&server).await;
        mount_jwks(&server).await;

        let foreign_nonce = SessionBasedHashService::new("attacker").generate();
        let jwt = OidcSigner::from_private_key(&TEST_KEYS.primary, "kid1")
            .sign(&id_token_claims(&foreign_nonce));

        match provider.for_session("victim").unwrap().parse_id_token(&jwt).await {
            Err(OIDCError::InvalidClaim(ClaimError::Nonce)) => {}
            other => panic!("expected nonce rejection, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn code_exchange_and_id_token_verification() {
        let server = MockServer::start().await;
        let provider = provider(&server).await;
        mount_jwks(&server).await;
        let session = provider.for_session("session-1").unwrap();
        let nonce = SessionBasedHashService::new("session-1").generate();
        let jwt = OidcSigner::from_private_key(&TEST_KEYS.primary, "kid1").sign(&id_token_claims(&nonce));

        Mock::given(method("POST"))
            .and(path("/token"))
            .and(body_string_contains("grant_type=authorization_code"))
            .and(body_string_contains("code=the-code"))
            .and(body_string_contains("client_id=client123"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "access_token": "at",
                "refresh_token": "rt",
                "id_token": jwt,
                "token_type": "Bearer",
                "expires_in": 3600,
            })))
            .expect(1)
            .mount(&server)
            .await;

        let (token, id_token) = session
            .id_token_by_authorization_code(AuthorizationCode::new("the-code".to_string()))
            .await
            .expect("exchange");
        assert_eq!(token.access_token().secret(), "at");
        assert_eq!(id_token.claim("nonce"), Some(&json!(nonce)));
    }

    #[tokio::test]
    async fn token_endpoint_error_becomes_identity_provider_error() {
        let server = MockServer::start().await;
        let provider = provider(&server).await;
        Mock::given(method("POST"))
            .and(path("/token"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                "error": { "message": "ERROR_MESSAGE_1234", "code": 567890 }
            })))
            .mount(&server)
            .await;

        let result = provider
            .access_token_by_authorization_code(AuthorizationCode::new("code".to_string()), &[])
            .await;
        match result {
            Err(OIDCError::IdentityProvider { message, status, .. }) => {
                assert_eq!(message, "ERROR_MESSAGE_1234");
                assert_eq!(status, 400);
            }
            other => panic!("expected IdentityProvider, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn blank_refresh_token_is_rejected_without_request() {
        let server = MockServer::start().await;
        let provider = provider(&server).await;
        Mock::given(method("POST"))
            .and(path("/token"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        match provider
            .access_token_by_refresh_token(RefreshToken::new(String::new()))
            .await
        {
            Err(OIDCError::InvalidRefreshToken) => {}
            other => panic!("expected InvalidRefreshToken, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn retrieve_access_token_uses_storage_then_refreshes() {
        let server = MockServer::start().await;
        let provider = provider(&server).await;
        Mock::given(method("POST"))
            .and(path("/token"))
            .and(body_string_contains("grant_type=refresh_token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "access_token": "fresh",
                "expires_in": 3600,
            })))
            .expect(1)
            .mount(&server)
            .await;

        let storage = MemoryAccessTokenStorage::new();
        let first = provider.retrieve_access_token(&storage, "rt").await.unwrap();
        assert_eq!(first.access_token().secret(), "fresh");
        assert_eq!(first.refresh_token().map(|t| t.secret().clone()), Some("rt".to_string()));

        // served from storage, the mock expects a single call
        let second = provider.retrieve_access_token(&storage, "rt").await.unwrap();
        assert_eq!(second, first);

        match provider.retrieve_access_token(&storage, "").await {
            Err(OIDCError::InvalidRefreshToken) => {}
            other => panic!("expected InvalidRefreshToken, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn jwt_bearer_grant_is_posted() {
        let server = MockServer::start().await;
        let provider = provider(&server).await;
        Mock::given(method("POST"))
            .and(path("/token"))
            .and(body_string_contains("grant_type=urn%3Aietf%3Aparams%3Aoauth%3Agrant-type%3Ajwt-bearer"))
            .and(body_string_contains("requested_token_use=on_behalf_of"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "access_token": "obo" })))
            .expect(1)
            .mount(&server)
            .await;

        let token = provider
            .access_token_by_jwt_bearer("a.b.c", "on_behalf_of")
            .await
            .unwrap();
        assert_eq!(token.access_token().secret(), "obo");
    }

    #[tokio::test]
    async fn resource_owner_from_userinfo() {
        let server = MockServer::start().await;
        let provider = provider(&server).await;
        Mock::given(method("GET"))
            .and(path("/userinfo"))
            .and(header("authorization", "Bearer at"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "sub": "user1",
                "email": "user1@example.com",
            })))
            .mount(&server)
            .await;

        let owner = provider
            .resource_owner(&AccessToken::new("at".to_string()))
            .await
            .unwrap();
        assert_eq!(owner.id().as_deref(), Some("user1"));
        assert_eq!(owner.email(), Some("user1@example.com"));
    }

    #[tokio::test]
    async fn discovery_failure_fails_construction() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/.well-known/openid-configuration"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "issuer": "x" })))
            .mount(&server)
            .await;

        match OpenIdProvider::new(options(&server)).await {
            Err(OIDCError::DiscoveryFetch(_)) => {}
            other => panic!("expected DiscoveryFetch, got {:?}", other.map(|_| ())),
        }
    }

    #[tokio::test]
    async fn jwks_server_error_surfaces() {
        let server = MockServer::start().await;
        let provider = provider(&server).await;
        Mock::given(method("GET"))
            .and(path("/jwks"))
            .respond_with(ResponseTemplate::new(500).set_body_string("<html>down</html>"))
            .mount(&server)
            .await;

        match provider.for_session("s").unwrap().parse_id_token("a.b.c").await {
            Err(OIDCError::UnexpectedResponseFormat) => {}
            other => panic!("expected UnexpectedResponseFormat, got {:?}", other),
        }
    }

    #[test]
    fn session_is_state_aware() {
        let configuration = OpenIdConfiguration {
            issuer: "https://idp.example".to_string(),
            authorization_endpoint: "https://idp.example/auth".to_string(),
            token_endpoint: "https://idp.example/token".to_string(),
            jwks_uri: "https://idp.example/jwks".to_string(),
            ..Default::default()
        };
        let options = OpenIdProviderOptions::new(
            "client123",
            "secret",
            "https://app.example/callback",
            "https://idp.example/.well-known/openid-configuration",
        )
        .unwrap();
        let provider = OpenIdProvider::from_configuration(options, configuration).unwrap();
        let session = provider.for_session("s").unwrap();
        let state = StateAware::generate_state(&session).unwrap();
        assert_eq!(StateAware::validate_state(&session, &state).ok(), Some(true));
    }
}
