//! HTTP plumbing shared by every provider.
//!
//! Bodies are parsed the same way regardless of endpoint: url encoded forms
//! become JSON objects, JSON is parsed, and anything else is kept as a string.
//! Parsed bodies are then checked for provider error payloads.
use crate::errors::OIDCError;
use reqwest::StatusCode;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use serde_json::{Map, Value};
use std::time::Duration;

/// Largest body accepted from discovery, JWKS, token or userinfo endpoints.
pub(crate) const MAX_RESPONSE_BYTES: usize = 1024 * 1024;

/// Builds the client used for every provider call.
///
/// Redirects are never followed and every request is bounded by `timeout`.
/// Nothing is retried.
pub(crate) fn build_http_client(timeout: Duration) -> Result<reqwest::Client, OIDCError> {
    Ok(reqwest::ClientBuilder::new()
        // Following redirects opens the client up to SSRF vulnerabilities.
        .redirect(reqwest::redirect::Policy::none())
        .timeout(timeout)
        .build()?)
}

/// GET `url` and return the parsed, error checked body.
pub(crate) async fn get_parsed(
    client: &reqwest::Client,
    url: &str,
    bearer: Option<&str>,
) -> Result<Value, OIDCError> {
    let mut request = client.get(url).header(ACCEPT, "application/json");
    if let Some(token) = bearer {
        request = request.bearer_auth(token);
    }
    read_response(request.send().await?).await
}

/// POST `params` as a form to `url` and return the parsed, error checked body.
pub(crate) async fn post_form_parsed(
    client: &reqwest::Client,
    url: &str,
    params: &[(String, String)],
) -> Result<Value, OIDCError> {
    let response = client
        .post(url)
        .header(ACCEPT, "application/json")
        .form(params)
        .send()
        .await?;
    read_response(response).await
}

pub(crate) async fn read_response(response: reqwest::Response) -> Result<Value, OIDCError> {
    let status = response.status();
    let content_type = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default()
        .to_string();
    let body = read_body(response, MAX_RESPONSE_BYTES).await?;

    let parsed = parse_response(status, &content_type, &body)?;
    check_response(status, &parsed)?;
    Ok(parsed)
}

async fn read_body(mut response: reqwest::Response, limit: usize) -> Result<String, OIDCError> {
    if response
        .content_length()
        .is_some_and(|len| len > limit as u64)
    {
        return Err(OIDCError::ResponseTooLarge(limit));
    }
    let mut body = Vec::new();
    while let Some(chunk) = response.chunk().await? {
        if body.len() + chunk.len() > limit {
            return Err(OIDCError::ResponseTooLarge(limit));
        }
        body.extend_from_slice(&chunk);
    }
    Ok(String::from_utf8_lossy(&body).into_owned())
}

pub(crate) fn parse_response(
    status: StatusCode,
    content_type: &str,
    body: &str,
) -> Result<Value, OIDCError> {
    if content_type.contains("urlencoded") {
        let form: Map<String, Value> = url::form_urlencoded::parse(body.as_bytes())
            .map(|(key, value)| (key.into_owned(), Value::String(value.into_owned())))
            .collect();
        return Ok(Value::Object(form));
    }

    match serde_json::from_str::<Value>(body) {
        Ok(value) => Ok(value),
        Err(err) if content_type.contains("json") => {
            tracing::warn!(status = status.as_u16(), error = %err, "invalid JSON body from identity provider");
            Err(OIDCError::UnexpectedResponseFormat)
        }
        Err(_) if status == StatusCode::INTERNAL_SERVER_ERROR => {
            tracing::warn!("identity provider server error without a JSON body");
            Err(OIDCError::UnexpectedResponseFormat)
        }
        Err(_) => Ok(Value::String(body.to_string())),
    }
}

/// Converts provider error payloads and failing statuses into [`OIDCError::IdentityProvider`].
///
/// Recognises both `{"error": ...}` and the OData `{"odata.error": ...}` shapes.
pub(crate) fn check_response(status: StatusCode, parsed: &Value) -> Result<(), OIDCError> {
    let has_error_payload = ["odata.error", "error"]
        .iter()
        .any(|key| parsed.get(key).is_some_and(is_present));

    if has_error_payload || !status.is_success() {
        let message = error_message(parsed)
            .or_else(|| status.canonical_reason().map(str::to_string))
            .unwrap_or_else(|| "unknown error".to_string());
        tracing::warn!(status = status.as_u16(), %message, "identity provider returned an error");
        return Err(OIDCError::IdentityProvider {
            message,
            status: status.as_u16(),
            response: parsed.clone(),
        });
    }
    Ok(())
}

fn is_present(value: &Value) -> bool {
    match value {
        Value::Null | Value::Bool(false) => false,
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
        Value::Bool(true) | Value::Number(_) => true,
    }
}

fn error_message(parsed: &Value) -> Option<String> {
    let candidates = [
        parsed.pointer("/odata.error/message/value"),
        parsed.pointer("/error/message"),
        parsed.get("error_description"),
        parsed.get("error"),
    ];
    candidates
        .into_iter()
        .flatten()
        .find_map(|value| value.as_str().filter(|s| !s.is_empty()))
        .map(str::to_string)
}
