//! Preset [`VendorConfig`]s for common identity providers.
use crate::oauth2::VendorConfig;

pub const GOOGLE_USERINFO_EMAIL: &str = "https://www.googleapis.com/auth/userinfo.email";
pub const GOOGLE_USERINFO_PROFILE: &str = "https://www.googleapis.com/auth/userinfo.profile";
pub const GOOGLE_MAIL: &str = "https://mail.google.com/";

pub const OUTLOOK_EMAILS: &str = "wl.emails";
pub const OUTLOOK_BASIC_PROFILE: &str = "wl.basic";
pub const OUTLOOK_IMAP: &str = "wl.imap";
pub const OUTLOOK_OFFLINE_ACCESS: &str = "wl.offline_access";

const AZURE_AUTHORIZE_URL: &str = "https://login.microsoftonline.com/common/oauth2/authorize";
const AZURE_TOKEN_URL: &str = "https://login.microsoftonline.com/common/oauth2/token";
const AZURE_AD_GRAPH: &str = "https://graph.windows.net";

/// Google, requesting offline access so a refresh token is issued.
pub fn google() -> VendorConfig {
    VendorConfig::new(
        "google",
        "https://accounts.google.com/o/oauth2/v2/auth",
        "https://oauth2.googleapis.com/token",
    )
    .resource_owner_url("https://www.googleapis.com/oauth2/v2/userinfo?alt=json")
    .default_scopes([GOOGLE_USERINFO_EMAIL, GOOGLE_USERINFO_PROFILE, GOOGLE_MAIL])
    .authorization_default("approval_prompt", "force")
    .authorization_default("access_type", "offline")
    .resource_owner_id_key("id")
}

/// Azure Active Directory (v1 endpoints).
pub fn microsoft() -> VendorConfig {
    VendorConfig::new("microsoft", AZURE_AUTHORIZE_URL, AZURE_TOKEN_URL)
        .resource_owner_url(format!("{AZURE_AD_GRAPH}/me?api-version=1.6"))
        .authorization_default("prompt", "consent")
        .resource_owner_id_key("oid")
}

pub fn microsoft_graph() -> VendorConfig {
    VendorConfig::new(
        "microsoft_graph",
        "https://login.microsoftonline.com/common/oauth2/v2.0/authorize",
        "https://login.microsoftonline.com/common/oauth2/v2.0/token",
    )
    .resource_owner_url("https://graph.microsoft.com/v1.0/me")
    .default_scopes(["openid", "offline_access", "User.Read"])
    .authorization_default("prompt", "consent")
    .resource_owner_id_key("id")
}

/// Office 365 through Azure AD, forcing a fresh login and requesting the AD graph resource.
pub fn office365() -> VendorConfig {
    VendorConfig::new("office365", AZURE_AUTHORIZE_URL, AZURE_TOKEN_URL)
        .resource_owner_url(format!("{AZURE_AD_GRAPH}/me?api-version=1.6"))
        .authorization_default("prompt", "login")
        .token_default("resource", AZURE_AD_GRAPH)
        .resource_owner_id_key("objectId")
}

/// Outlook.com (Windows Live). Scopes are comma separated.
pub fn outlook() -> VendorConfig {
    VendorConfig::new(
        "outlook",
        "https://login.live.com/oauth20_authorize.srf",
        "https://login.live.com/oauth20_token.srf",
    )
    .resource_owner_url("https://apis.live.net/v5.0/me")
    .default_scopes([
        OUTLOOK_EMAILS,
        OUTLOOK_BASIC_PROFILE,
        OUTLOOK_IMAP,
        OUTLOOK_OFFLINE_ACCESS,
    ])
    .scope_separator(",")
    .authorization_default("display", "popup")
    .resource_owner_id_key("id")
}

/// Auth0 tenant at `base_url`, e.g. `https://tenant.auth0.com`.
pub fn auth0(base_url: &str) -> VendorConfig {
    let base_url = base_url.trim_end_matches('/');
    VendorConfig::new(
        "auth0",
        format!("{base_url}/authorize"),
        format!("{base_url}/oauth/token"),
    )
    .resource_owner_url(format!("{base_url}/userinfo"))
    .default_scopes(["openid", "profile"])
    .resource_owner_id_key("user_id")
}

/// A server exposing `oauth2/auth` and `oauth2/token` under `base_url`.
pub fn basic(base_url: &str) -> VendorConfig {
    let base_url = base_url.trim_end_matches('/');
    VendorConfig::new(
        "basic",
        format!("{base_url}/oauth2/auth"),
        format!("{base_url}/oauth2/token"),
    )
}
