//! Pluggable access token persistence.
use crate::errors::OIDCError;
use crate::token::TokenResponse;
use openidconnect::RefreshToken;
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Persists access tokens under the refresh token that produced them.
pub trait AccessTokenStorage: Send + Sync {
    fn retrieve_access_token(
        &self,
        refresh_token: &str,
    ) -> impl Future<Output = Result<Option<TokenResponse>, OIDCError>> + Send;

    fn store_access_token(
        &self,
        token: &TokenResponse,
    ) -> impl Future<Output = Result<(), OIDCError>> + Send;
}

/// In process storage, shared between clones.
#[derive(Debug, Clone, Default)]
pub struct MemoryAccessTokenStorage {
    tokens: Arc<RwLock<HashMap<String, TokenResponse>>>,
}

impl MemoryAccessTokenStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.tokens.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.tokens.read().await.is_empty()
    }
}

impl AccessTokenStorage for MemoryAccessTokenStorage {
    async fn retrieve_access_token(
        &self,
        refresh_token: &str,
    ) -> Result<Option<TokenResponse>, OIDCError> {
        Ok(self.tokens.read().await.get(refresh_token).cloned())
    }

    async fn store_access_token(&self, token: &TokenResponse) -> Result<(), OIDCError> {
        match token.refresh_token_str() {
            Some(refresh_token) => {
                self.tokens
                    .write()
                    .await
                    .insert(refresh_token.to_string(), token.clone());
            }
            None => tracing::debug!("not storing access token without a refresh token"),
        }
        Ok(())
    }
}

/// Returns the stored token for `refresh_token`, or refreshes, stores and returns a new one
/// when the store has none or it has expired.
///
/// A provider that does not rotate refresh tokens gets the one it was called with
/// attached to the new token, so it can be found again.
pub(crate) async fn retrieve_or_refresh<S, F, Fut>(
    storage: &S,
    refresh_token: &str,
    refresh: F,
) -> Result<TokenResponse, OIDCError>
where
    S: AccessTokenStorage,
    F: FnOnce(RefreshToken) -> Fut,
    Fut: Future<Output = Result<TokenResponse, OIDCError>>,
{
    if refresh_token.trim().is_empty() {
        return Err(OIDCError::InvalidRefreshToken);
    }
    if let Some(token) = storage.retrieve_access_token(refresh_token).await? {
        if !token.has_expired() {
            return Ok(token);
        }
        tracing::debug!("stored access token expired, refreshing");
    }
    let token = refresh(RefreshToken::new(refresh_token.to_string()))
        .await?
        .with_fallback_refresh_token(refresh_token);
    storage.store_access_token(&token).await?;
    Ok(token)
}
