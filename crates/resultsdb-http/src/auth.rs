// resultsdb-http/src/auth.rs
// ============================================================================
// Module: Token Login
// Description: Exchange of an API token for a ResultsDB access token.
// Purpose: Perform the login handshake before any database call.
// Dependencies: reqwest, serde_json
// ============================================================================

//! ## Overview
//! The login endpoint accepts `{"apiToken": "<token>"}` and answers with a
//! JSON object whose `id` field is the access token. The API token is only
//! ever sent in the request body.

// ============================================================================
// SECTION: Imports
// ============================================================================

use resultsdb_core::ClientError;
use serde_json::Value;
use serde_json::json;

use crate::client::HttpClientConfig;
use crate::client::build_http_client;
use crate::client::parse_json;
use crate::client::parse_service_url;
use crate::client::send_request;

// ============================================================================
// SECTION: Login
// ============================================================================

/// Exchanges an API token for an access token.
///
/// # Errors
///
/// Returns [`ClientError`] when the request fails, the server rejects the
/// token, or the response carries no `id`.
pub fn authenticate(
    login_url: &str,
    api_token: &str,
    config: &HttpClientConfig,
) -> Result<String, ClientError> {
    if api_token.trim().is_empty() {
        return Err(ClientError::transport("api token must not be empty"));
    }
    let url = parse_service_url(login_url)?;
    let client = build_http_client(config)?;
    let body = send_request(
        client.post(url).json(&json!({"apiToken": api_token})),
        config.max_response_bytes,
    )?;
    let response = parse_json(&body)?;
    response
        .get("id")
        .and_then(Value::as_str)
        .filter(|token| !token.is_empty())
        .map(ToString::to_string)
        .ok_or_else(|| ClientError::transport("login response did not contain an access token"))
}
