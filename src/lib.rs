/*!
OAuth2 and OpenID Connect client adapters.

[`OpenIdProvider`] speaks to any OpenID Connect provider from its discovery
document and verifies the `id_token` it returns: signature against the
provider's JWKS, then audience, issuer, nonce and time claims. Plain OAuth2
vendors (Google, Microsoft, Auth0, ...) go through [`OAuth2Provider`] with a
preset from [`vendors`].

```rust,no_run
use oidc_providers::errors::OIDCError;
use oidc_providers::{AuthorizationOptions, OpenIdProvider, OpenIdProviderOptions};

#[tokio::main]
async fn main() -> Result<(), OIDCError> {
    let provider = OpenIdProvider::new(OpenIdProviderOptions::from_env()?).await?;

    // state and nonce are bound to the user's session id
    let session = provider.for_session("session-id")?;
    let request = session.authorization_url(AuthorizationOptions::new())?;
    println!("redirect the user to {}", request.url);

    // ...then, on the callback
    assert!(session.validate_state(&request.state));
    let id_token = session.parse_id_token("header.payload.signature").await?;
    println!("signed in as {:?}", id_token.user_id());
    Ok(())
}
```
*/
pub mod authorization;
pub mod config;
pub mod crypto;
pub mod discovery;
pub mod errors;
mod http;
pub mod id_token;
pub mod jwks;
pub mod oauth2;
pub mod provider;
pub mod resource_owner;
pub mod state;
pub mod storage;
pub mod token;
pub mod utils;
pub mod vendors;

#[cfg(test)]
pub(crate) mod sign;

pub use authorization::{AuthorizationOptions, AuthorizationRequest};
pub use config::{ClientCredentials, OpenIdProviderOptions};
pub use discovery::OpenIdConfiguration;
pub use errors::{ClaimError, OIDCError};
pub use id_token::{IdToken, IdTokenFactory, IdTokenParser, IdTokenValidator};
pub use jwks::{JwksResponse, JwksResponseParser, VerificationKeys};
pub use oauth2::{OAuth2Provider, VendorConfig};
pub use provider::{OpenIdProvider, OpenIdSession};
pub use resource_owner::ResourceOwner;
pub use state::{NonceService, SessionBasedHashService, StateAware, StateService};
pub use storage::{AccessTokenStorage, MemoryAccessTokenStorage};
pub use token::{Grant, TokenResponse};

pub use openidconnect::{AccessToken, AuthorizationCode, ClientId, ClientSecret, RefreshToken};
