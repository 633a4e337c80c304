//! Authorization request construction.
use crate::errors::OIDCError;
use url::Url;

/// Caller supplied overrides for an authorization request.
#[derive(Debug, Clone, Default)]
pub struct AuthorizationOptions {
    /// Replaces the provider's default scopes.
    pub scopes: Option<Vec<String>>,
    /// Uses this `state` instead of generating one.
    pub state: Option<String>,
    /// Uses this `nonce` instead of generating one.
    pub nonce: Option<String>,
    /// Replaces the configured redirect uri for this request only.
    pub redirect_uri: Option<String>,
    /// Additional query parameters; they win over provider defaults.
    pub extra: Vec<(String, String)>,
}

impl AuthorizationOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn scopes<I, S>(mut self, scopes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.scopes = Some(scopes.into_iter().map(Into::into).collect());
        self
    }

    pub fn state(mut self, state: impl Into<String>) -> Self {
        self.state = Some(state.into());
        self
    }

    pub fn nonce(mut self, nonce: impl Into<String>) -> Self {
        self.nonce = Some(nonce.into());
        self
    }

    pub fn redirect_uri(mut self, redirect_uri: impl Into<String>) -> Self {
        self.redirect_uri = Some(redirect_uri.into());
        self
    }

    pub fn param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.extra.push((key.into(), value.into()));
        self
    }
}

/// A built authorization url together with the values the callback must echo.
#[derive(Debug, Clone, PartialEq)]
pub struct AuthorizationRequest {
    pub url: Url,
    pub state: String,
    /// Absent for plain OAuth2 providers.
    pub nonce: Option<String>,
}

/// Ordered query parameters where a later `set` replaces an earlier value.
#[derive(Debug, Clone, Default)]
pub(crate) struct QueryParams(Vec<(String, String)>);

impl QueryParams {
    pub fn set(&mut self, key: &str, value: impl Into<String>) {
        let value = value.into();
        match self.0.iter_mut().find(|(k, _)| k == key) {
            Some((_, existing)) => *existing = value,
            None => self.0.push((key.to_string(), value)),
        }
    }

    pub fn set_default(&mut self, key: &str, value: impl Into<String>) {
        if !self.contains(key) {
            self.0.push((key.to_string(), value.into()));
        }
    }

    pub fn contains(&self, key: &str) -> bool {
        self.0.iter().any(|(k, _)| k == key)
    }

    /// Appends every parameter to `base`, keeping any query it already has.
    pub fn append_to(&self, base: &str) -> Result<Url, OIDCError> {
        let mut url = Url::parse(base)?;
        {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in &self.0 {
                pairs.append_pair(key, value);
            }
        }
        Ok(url)
    }
}

/// Parameters `options` may not override.
pub(crate) const PROVIDER_OWNED: [&str; 3] = ["client_id", "state", "nonce"];

/// Merges caller extras over `params`, skipping provider owned keys.
pub(crate) fn merge_extra(params: &mut QueryParams, extra: &[(String, String)]) {
    for (key, value) in extra {
        if PROVIDER_OWNED.contains(&key.as_str()) {
            tracing::warn!(key, "ignoring provider owned authorization parameter");
            continue;
        }
        params.set(key, value.clone());
    }
}
