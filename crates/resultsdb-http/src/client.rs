// resultsdb-http/src/client.rs
// ============================================================================
// Module: HTTP Experiment Client
// Description: Blocking reqwest implementation of the experiment client.
// Purpose: Perform one bounded round trip per collaborator call.
// Dependencies: resultsdb-core, reqwest, serde_json, url
// ============================================================================

//! ## Overview
//! [`HttpExperimentClient`] maps each [`ExperimentClient`] call onto one
//! request against the ResultsDB REST routes, relative to the database URL.
//! Non-success responses become [`ClientError`] values carrying the status and
//! the (truncated) response text; requests that never produced a response
//! carry no status.
//!
//! Invariants:
//! - Redirects are never followed.
//! - Response bodies are read with a hard byte cap.
//! - The access token travels only in the `x-access-token` header.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::io::Read;
use std::time::Duration;

use reqwest::StatusCode;
use reqwest::blocking::Client;
use reqwest::blocking::RequestBuilder;
use reqwest::blocking::Response;
use reqwest::header::CONTENT_TYPE;
use reqwest::redirect::Policy;
use resultsdb_core::AnalysisResultListParams;
use resultsdb_core::ClientError;
use resultsdb_core::ExperimentClient;
use resultsdb_core::ExperimentId;
use resultsdb_core::ExperimentListParams;
use resultsdb_core::ResultId;
use resultsdb_core::UploadMode;
use serde_json::Map;
use serde_json::Value;
use url::Url;

use crate::auth::authenticate;
use crate::query::QueryPairs;
use crate::query::analysis_result_query_pairs;
use crate::query::experiment_query_pairs;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default ResultsDB database URL.
pub const DEFAULT_DATABASE_URL: &str = "https://api.quantum-computing.ibm.com/resultsdb";
/// Header carrying the access token.
pub const ACCESS_TOKEN_HEADER: &str = "x-access-token";
/// Content type used for figure uploads.
pub const FIGURE_CONTENT_TYPE: &str = "image/svg+xml";
/// Content type used for data file uploads.
const JSON_CONTENT_TYPE: &str = "application/json";
/// Maximum characters of a failed response body kept in error messages.
const MAX_ERROR_TEXT_CHARS: usize = 512;

// ============================================================================
// SECTION: Configuration
// ============================================================================

/// Configuration for the HTTP transport.
///
/// # Invariants
/// - `base_url` must be an `http` or `https` URL without credentials.
/// - `max_response_bytes` is a hard upper bound on every response body.
/// - `timeout_ms` applies to the full request lifecycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpClientConfig {
    /// ResultsDB database URL; routes are resolved below it.
    pub base_url: String,
    /// Access token obtained from the login handshake.
    pub access_token: Option<String>,
    /// Request timeout in milliseconds.
    pub timeout_ms: u64,
    /// Maximum response size allowed, in bytes.
    pub max_response_bytes: usize,
    /// User agent string for outbound requests.
    pub user_agent: String,
    /// Verify TLS certificates.
    pub verify: bool,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_DATABASE_URL.to_string(),
            access_token: None,
            timeout_ms: 30_000,
            max_response_bytes: 32 * 1024 * 1024,
            user_agent: "resultsdb-client/0.1".to_string(),
            verify: true,
        }
    }
}

// ============================================================================
// SECTION: Client
// ============================================================================

/// Blocking HTTP client for the ResultsDB backend.
pub struct HttpExperimentClient {
    /// Database URL every route is resolved against.
    base_url: Url,
    /// Access token sent with every request.
    access_token: Option<String>,
    /// Response body cap, in bytes.
    max_response_bytes: usize,
    /// Underlying reqwest client.
    client: Client,
}

impl HttpExperimentClient {
    /// Creates a client from the given configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError`] when the URL is invalid or the HTTP client
    /// cannot be built.
    pub fn new(config: HttpClientConfig) -> Result<Self, ClientError> {
        let base_url = parse_service_url(&config.base_url)?;
        let client = build_http_client(&config)?;
        Ok(Self {
            base_url,
            access_token: config.access_token,
            max_response_bytes: config.max_response_bytes,
            client,
        })
    }

    /// Logs in with an API token and creates a client using the issued
    /// access token.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError`] when the login handshake or client
    /// construction fails.
    pub fn login(
        config: HttpClientConfig,
        login_url: &str,
        api_token: &str,
    ) -> Result<Self, ClientError> {
        let access_token = authenticate(login_url, api_token, &config)?;
        Self::new(HttpClientConfig {
            access_token: Some(access_token),
            ..config
        })
    }

    /// Returns the database URL.
    #[must_use]
    pub const fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Resolves a route below the database URL.
    fn endpoint(&self, segments: &[&str]) -> Result<Url, ClientError> {
        let mut url = self.base_url.clone();
        {
            let mut path = url
                .path_segments_mut()
                .map_err(|()| ClientError::transport("database url cannot carry a path"))?;
            path.pop_if_empty().extend(segments);
        }
        Ok(url)
    }

    /// Resolves a route and appends query parameters.
    fn endpoint_with_query(
        &self,
        segments: &[&str],
        pairs: &QueryPairs,
    ) -> Result<Url, ClientError> {
        let mut url = self.endpoint(segments)?;
        if !pairs.is_empty() {
            url.query_pairs_mut().extend_pairs(pairs.iter().map(|(key, value)| (*key, value)));
        }
        Ok(url)
    }

    /// Sends a request with the access token attached and returns the body.
    fn execute(&self, builder: RequestBuilder) -> Result<Vec<u8>, ClientError> {
        let builder = match &self.access_token {
            Some(token) => builder.header(ACCESS_TOKEN_HEADER, token.as_str()),
            None => builder,
        };
        send_request(builder, self.max_response_bytes)
    }

    /// Issues a GET and parses the JSON body.
    fn get_json(&self, url: Url) -> Result<Value, ClientError> {
        let body = self.execute(self.client.get(url))?;
        parse_json(&body)
    }

    /// Uploads figure bytes with the given method.
    fn send_figure(
        &self,
        builder: RequestBuilder,
        figure: &[u8],
    ) -> Result<Value, ClientError> {
        let body = self.execute(
            builder.header(CONTENT_TYPE, FIGURE_CONTENT_TYPE).body(figure.to_vec()),
        )?;
        parse_json(&body)
    }

    /// Resolves a figure route with the upload mode parameter.
    fn figure_endpoint(
        &self,
        experiment_id: &ExperimentId,
        figure_name: &str,
        mode: UploadMode,
    ) -> Result<Url, ClientError> {
        let pairs = vec![("sync_upload", mode.is_sync().to_string())];
        self.endpoint_with_query(
            &["experiments", experiment_id.as_str(), "plots", figure_name],
            &pairs,
        )
    }
}

impl ExperimentClient for HttpExperimentClient {
    fn experiments(&self, params: &ExperimentListParams) -> Result<Value, ClientError> {
        let url = self.endpoint_with_query(&["experiments"], &experiment_query_pairs(params))?;
        self.get_json(url)
    }

    fn experiment_get(&self, experiment_id: &ExperimentId) -> Result<Value, ClientError> {
        self.get_json(self.endpoint(&["experiments", experiment_id.as_str()])?)
    }

    fn experiment_upload(&self, payload: &Map<String, Value>) -> Result<Value, ClientError> {
        let url = self.endpoint(&["experiments"])?;
        let body = self.execute(self.client.post(url).json(payload))?;
        parse_json(&body)
    }

    fn experiment_update(
        &self,
        experiment_id: &ExperimentId,
        payload: &Map<String, Value>,
    ) -> Result<(), ClientError> {
        let url = self.endpoint(&["experiments", experiment_id.as_str()])?;
        self.execute(self.client.put(url).json(payload)).map(drop)
    }

    fn experiment_delete(&self, experiment_id: &ExperimentId) -> Result<(), ClientError> {
        let url = self.endpoint(&["experiments", experiment_id.as_str()])?;
        self.execute(self.client.delete(url)).map(drop)
    }

    fn analysis_results(&self, params: &AnalysisResultListParams) -> Result<Value, ClientError> {
        let pairs = analysis_result_query_pairs(params);
        self.get_json(self.endpoint_with_query(&["analysis_results"], &pairs)?)
    }

    fn analysis_result_get(&self, result_id: &ResultId) -> Result<Value, ClientError> {
        self.get_json(self.endpoint(&["analysis_results", result_id.as_str()])?)
    }

    fn analysis_result_create(&self, payload: &Map<String, Value>) -> Result<Value, ClientError> {
        let url = self.endpoint(&["analysis_results"])?;
        let body = self.execute(self.client.post(url).json(payload))?;
        parse_json(&body)
    }

    fn analysis_result_update(
        &self,
        result_id: &ResultId,
        payload: &Map<String, Value>,
    ) -> Result<(), ClientError> {
        let url = self.endpoint(&["analysis_results", result_id.as_str()])?;
        self.execute(self.client.put(url).json(payload)).map(drop)
    }

    fn analysis_result_delete(&self, result_id: &ResultId) -> Result<(), ClientError> {
        let url = self.endpoint(&["analysis_results", result_id.as_str()])?;
        self.execute(self.client.delete(url)).map(drop)
    }

    fn figure_upload(
        &self,
        experiment_id: &ExperimentId,
        figure_name: &str,
        figure: &[u8],
        mode: UploadMode,
    ) -> Result<Value, ClientError> {
        let url = self.figure_endpoint(experiment_id, figure_name, mode)?;
        self.send_figure(self.client.post(url), figure)
    }

    fn figure_update(
        &self,
        experiment_id: &ExperimentId,
        figure_name: &str,
        figure: &[u8],
        mode: UploadMode,
    ) -> Result<Value, ClientError> {
        let url = self.figure_endpoint(experiment_id, figure_name, mode)?;
        self.send_figure(self.client.put(url), figure)
    }

    fn figure_get(
        &self,
        experiment_id: &ExperimentId,
        figure_name: &str,
    ) -> Result<Vec<u8>, ClientError> {
        let url = self.endpoint(&["experiments", experiment_id.as_str(), "plots", figure_name])?;
        self.execute(self.client.get(url))
    }

    fn figure_delete(
        &self,
        experiment_id: &ExperimentId,
        figure_name: &str,
    ) -> Result<(), ClientError> {
        let url = self.endpoint(&["experiments", experiment_id.as_str(), "plots", figure_name])?;
        self.execute(self.client.delete(url)).map(drop)
    }

    fn files(&self, experiment_id: &ExperimentId) -> Result<Value, ClientError> {
        self.get_json(self.endpoint(&["experiments", experiment_id.as_str(), "files"])?)
    }

    fn file_upload(
        &self,
        experiment_id: &ExperimentId,
        file_name: &str,
        contents: &str,
    ) -> Result<(), ClientError> {
        let url = self.endpoint(&["experiments", experiment_id.as_str(), "files", file_name])?;
        let builder =
            self.client.put(url).header(CONTENT_TYPE, JSON_CONTENT_TYPE).body(contents.to_string());
        self.execute(builder).map(drop)
    }

    fn file_download(
        &self,
        experiment_id: &ExperimentId,
        file_name: &str,
    ) -> Result<String, ClientError> {
        let url = self.endpoint(&["experiments", experiment_id.as_str(), "files", file_name])?;
        let body = self.execute(self.client.get(url))?;
        String::from_utf8(body)
            .map_err(|_| ClientError::transport(format!("file {file_name} is not valid UTF-8")))
    }

    fn devices(&self) -> Result<Value, ClientError> {
        self.get_json(self.endpoint(&["devices"])?)
    }

    fn device_components(&self, backend_name: Option<&str>) -> Result<Value, ClientError> {
        let pairs: QueryPairs =
            backend_name.map(|name| ("device_name", name.to_string())).into_iter().collect();
        self.get_json(self.endpoint_with_query(&["device_components"], &pairs)?)
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Parses and validates a service URL.
pub(crate) fn parse_service_url(raw: &str) -> Result<Url, ClientError> {
    let url = Url::parse(raw)
        .map_err(|err| ClientError::transport(format!("invalid url {raw}: {err}")))?;
    match url.scheme() {
        "https" | "http" => {}
        other => {
            return Err(ClientError::transport(format!("unsupported url scheme: {other}")));
        }
    }
    if !url.username().is_empty() || url.password().is_some() {
        return Err(ClientError::transport("url credentials are not allowed"));
    }
    if url.host_str().is_none() {
        return Err(ClientError::transport("url host required"));
    }
    Ok(url)
}

/// Builds the blocking reqwest client.
pub(crate) fn build_http_client(config: &HttpClientConfig) -> Result<Client, ClientError> {
    Client::builder()
        .timeout(Duration::from_millis(config.timeout_ms))
        .user_agent(config.user_agent.clone())
        .redirect(Policy::none())
        .danger_accept_invalid_certs(!config.verify)
        .build()
        .map_err(|err| ClientError::transport(format!("http client build failed: {err}")))
}

/// Sends a request and returns the body of a successful response.
///
/// # Errors
///
/// Returns [`ClientError`] with the status for non-success responses, and
/// without a status when no response was received.
pub(crate) fn send_request(
    builder: RequestBuilder,
    max_bytes: usize,
) -> Result<Vec<u8>, ClientError> {
    let mut response = builder.send().map_err(|err| {
        if err.is_timeout() {
            ClientError::transport("http request timed out")
        } else {
            ClientError::transport(format!("http request failed: {err}"))
        }
    })?;
    let status = response.status();
    if status.is_redirection() {
        return Err(ClientError::with_status(status.as_u16(), "http redirect not allowed"));
    }
    if !status.is_success() {
        let body = read_response_limited(&mut response, max_bytes).unwrap_or_default();
        return Err(ClientError::with_status(status.as_u16(), failure_text(status, &body)));
    }
    read_response_limited(&mut response, max_bytes)
        .map_err(|message| ClientError::with_status(status.as_u16(), message))
}

/// Parses a JSON body; an empty body is `null`.
pub(crate) fn parse_json(body: &[u8]) -> Result<Value, ClientError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(Value::Null);
    }
    serde_json::from_slice(body)
        .map_err(|err| ClientError::transport(format!("invalid json response: {err}")))
}

/// Returns the message for a failed response.
fn failure_text(status: StatusCode, body: &[u8]) -> String {
    let text = String::from_utf8_lossy(body);
    let text = text.trim();
    if text.is_empty() {
        return status.canonical_reason().unwrap_or("request failed").to_string();
    }
    text.chars().take(MAX_ERROR_TEXT_CHARS).collect()
}

/// Reads the response body while enforcing a byte limit.
fn read_response_limited(response: &mut Response, max_bytes: usize) -> Result<Vec<u8>, String> {
    let expected_len = response.content_length();
    let max_bytes_u64 =
        u64::try_from(max_bytes).map_err(|_| "response size limit exceeds u64".to_string())?;
    if let Some(expected) = expected_len
        && expected > max_bytes_u64
    {
        return Err("http response exceeds size limit".to_string());
    }
    let mut buf = Vec::new();
    let mut handle = response.take(max_bytes_u64.saturating_add(1));
    handle.read_to_end(&mut buf).map_err(|_| "failed to read response".to_string())?;
    if buf.len() > max_bytes {
        return Err("http response exceeds size limit".to_string());
    }
    if let Some(expected) = expected_len {
        let expected =
            usize::try_from(expected).map_err(|_| "invalid response length".to_string())?;
        if buf.len() < expected {
            return Err("http response truncated".to_string());
        }
    }
    Ok(buf)
}
