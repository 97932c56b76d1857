// resultsdb-http/tests/http_client.rs
// ============================================================================
// Module: HTTP Client Tests
// Description: Request shaping and response handling against a local server.
// Purpose: Pin routes, headers, query encoding, and error classification.
// Dependencies: resultsdb-http, resultsdb-core, tiny_http
// ============================================================================

//! ## Overview
//! Each test starts a one-shot `tiny_http` server, issues a single call, and
//! inspects both the captured request and the client's result.

#![allow(
    clippy::panic,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only assertions and helpers are permitted."
)]

use std::net::TcpListener;
use std::sync::Arc;
use std::thread;

use resultsdb_core::AccountContext;
use resultsdb_core::ClientError;
use resultsdb_core::DeleteOutcome;
use resultsdb_core::ExperimentClient;
use resultsdb_core::ExperimentError;
use resultsdb_core::ExperimentId;
use resultsdb_core::ExperimentListParams;
use resultsdb_core::ExperimentService;
use resultsdb_core::NoopEventSink;
use resultsdb_core::UploadMode;
use resultsdb_http::HttpClientConfig;
use resultsdb_http::HttpExperimentClient;
use resultsdb_http::authenticate;
use serde_json::Value;
use serde_json::json;
use tiny_http::Header;
use tiny_http::Response;
use tiny_http::Server;
use url::Url;

/// Response type produced by the test helpers.
type TestResponse = Response<std::io::Cursor<Vec<u8>>>;

// ============================================================================
// SECTION: Test Helpers
// ============================================================================

/// Request details captured by the one-shot server.
struct Captured {
    /// HTTP method.
    method: String,
    /// Path and query as received.
    url: String,
    /// Value of the access token header, if sent.
    token: Option<String>,
    /// Value of the content type header, if sent.
    content_type: Option<String>,
    /// Request body.
    body: String,
}

impl Captured {
    /// Returns the decoded query pairs in order.
    fn query(&self) -> Vec<(String, String)> {
        let url = Url::parse(&format!("http://localhost{}", self.url)).unwrap();
        url.query_pairs().map(|(key, value)| (key.into_owned(), value.into_owned())).collect()
    }

    /// Returns the raw path without the query.
    fn path(&self) -> &str {
        self.url.split('?').next().unwrap_or_default()
    }
}

/// Starts a server answering one request and returns its database URL.
fn serve_once(response: TestResponse) -> (String, thread::JoinHandle<Captured>) {
    let server = Server::http("127.0.0.1:0").unwrap();
    let addr = server.server_addr().to_ip().unwrap();
    let handle = thread::spawn(move || {
        let mut request = server.recv().unwrap();
        let header = |name: &'static str| {
            request
                .headers()
                .iter()
                .find(|header| header.field.equiv(name))
                .map(|header| header.value.as_str().to_string())
        };
        let token = header("x-access-token");
        let content_type = header("Content-Type");
        let method = request.method().to_string();
        let url = request.url().to_string();
        let mut body = String::new();
        request.as_reader().read_to_string(&mut body).unwrap();
        request.respond(response).unwrap();
        Captured {
            method,
            url,
            token,
            content_type,
            body,
        }
    });
    (format!("http://{addr}/resultsdb"), handle)
}

/// Builds a JSON response with the given status.
fn json_response(status: u16, body: &Value) -> TestResponse {
    Response::from_data(body.to_string().into_bytes())
        .with_status_code(status)
        .with_header(Header::from_bytes(&b"Content-Type"[..], &b"application/json"[..]).unwrap())
}

/// Builds a plain text response with the given status.
fn text_response(status: u16, body: &str) -> TestResponse {
    Response::from_data(body.as_bytes().to_vec()).with_status_code(status)
}

/// Creates a client for the given database URL.
fn client(base_url: String) -> HttpExperimentClient {
    HttpExperimentClient::new(HttpClientConfig {
        base_url,
        access_token: Some("access-token".to_string()),
        timeout_ms: 5_000,
        ..HttpClientConfig::default()
    })
    .unwrap()
}

// ============================================================================
// SECTION: Request Shaping
// ============================================================================

#[test]
fn experiment_listing_encodes_compiled_filters() {
    let (base_url, handle) = serve_once(json_response(200, &json!({"experiments": []})));
    let params = ExperimentListParams {
        limit: Some(7),
        marker: Some("m1".to_string()),
        tags: Some("any:a,b".to_string()),
        start_time: vec![
            "ge:2024-01-01T00:00:00Z".to_string(),
            "le:2024-02-01T00:00:00Z".to_string(),
        ],
        public_only: true,
        exclude_mine: true,
        sort_by: Some("start_time:desc".to_string()),
        ..ExperimentListParams::default()
    };
    let page = client(base_url).experiments(&params).unwrap();
    let captured = handle.join().unwrap();

    assert_eq!(page, json!({"experiments": []}));
    assert_eq!(captured.method, "GET");
    assert_eq!(captured.path(), "/resultsdb/experiments");
    assert_eq!(captured.token.as_deref(), Some("access-token"));
    let expected: Vec<(String, String)> = [
        ("limit", "7"),
        ("marker", "m1"),
        ("start_time", "ge:2024-01-01T00:00:00Z"),
        ("start_time", "le:2024-02-01T00:00:00Z"),
        ("tags", "any:a,b"),
        ("visibility", "public"),
        ("owner", "!me"),
        ("sort", "start_time:desc"),
    ]
    .iter()
    .map(|(key, value)| ((*key).to_string(), (*value).to_string()))
    .collect();
    assert_eq!(captured.query(), expected);
}

#[test]
fn experiment_upload_posts_json_payload() {
    let (base_url, handle) = serve_once(json_response(200, &json!({"uuid": "exp-1"})));
    let mut payload = serde_json::Map::new();
    payload.insert("type".to_string(), json!("T1"));
    let response = client(base_url).experiment_upload(&payload).unwrap();
    let captured = handle.join().unwrap();

    assert_eq!(response, json!({"uuid": "exp-1"}));
    assert_eq!(captured.method, "POST");
    assert_eq!(captured.path(), "/resultsdb/experiments");
    assert_eq!(captured.content_type.as_deref(), Some("application/json"));
    let sent: Value = serde_json::from_str(&captured.body).unwrap();
    assert_eq!(sent, json!({"type": "T1"}));
}

#[test]
fn figure_upload_sends_svg_with_sync_flag() {
    let (base_url, handle) = serve_once(json_response(200, &json!({"name": "my fig.svg"})));
    let receipt = client(base_url)
        .figure_upload(&ExperimentId::new("exp-1"), "my fig.svg", b"<svg/>", UploadMode::Async)
        .unwrap();
    let captured = handle.join().unwrap();

    assert_eq!(receipt, json!({"name": "my fig.svg"}));
    assert_eq!(captured.method, "POST");
    assert_eq!(captured.path(), "/resultsdb/experiments/exp-1/plots/my%20fig.svg");
    assert_eq!(captured.query(), vec![("sync_upload".to_string(), "false".to_string())]);
    assert_eq!(captured.content_type.as_deref(), Some("image/svg+xml"));
    assert_eq!(captured.body, "<svg/>");
}

#[test]
fn device_components_filter_by_backend() {
    let (base_url, handle) = serve_once(json_response(200, &json!([])));
    client(base_url).device_components(Some("backend-a")).unwrap();
    let captured = handle.join().unwrap();

    assert_eq!(captured.path(), "/resultsdb/device_components");
    assert_eq!(captured.query(), vec![("device_name".to_string(), "backend-a".to_string())]);
}

#[test]
fn file_download_returns_text() {
    let (base_url, handle) = serve_once(text_response(200, "{\"a\": 1}"));
    let text = client(base_url).file_download(&ExperimentId::new("exp-1"), "data.json").unwrap();
    let captured = handle.join().unwrap();

    assert_eq!(text, "{\"a\": 1}");
    assert_eq!(captured.path(), "/resultsdb/experiments/exp-1/files/data.json");
}

// ============================================================================
// SECTION: Error Classification
// ============================================================================

#[test]
fn failed_response_keeps_status_and_body() {
    let (base_url, handle) = serve_once(text_response(404, "Experiment missing"));
    let err = client(base_url).experiment_get(&ExperimentId::new("exp-1")).unwrap_err();
    handle.join().unwrap();

    assert_eq!(err, ClientError::with_status(404, "Experiment missing"));
}

#[test]
fn empty_failure_body_uses_reason_phrase() {
    let (base_url, handle) = serve_once(text_response(409, ""));
    let err = client(base_url).experiment_upload(&serde_json::Map::new()).unwrap_err();
    handle.join().unwrap();

    assert_eq!(err, ClientError::with_status(409, "Conflict"));
}

#[test]
fn redirects_are_not_followed() {
    let response = text_response(302, "").with_header(
        Header::from_bytes(&b"Location"[..], &b"http://127.0.0.1:1/elsewhere"[..]).unwrap(),
    );
    let (base_url, handle) = serve_once(response);
    let err = client(base_url).devices().unwrap_err();
    handle.join().unwrap();

    assert_eq!(err.status, Some(302));
}

#[test]
fn oversized_response_is_rejected() {
    let (base_url, handle) = serve_once(text_response(200, &"x".repeat(64)));
    let client = HttpExperimentClient::new(HttpClientConfig {
        base_url,
        max_response_bytes: 8,
        ..HttpClientConfig::default()
    })
    .unwrap();
    let err = client.devices().unwrap_err();
    handle.join().unwrap();

    assert!(err.message.contains("size limit"), "{err}");
}

#[test]
fn unreachable_server_has_no_status() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    let err = client(format!("http://{addr}/resultsdb")).devices().unwrap_err();

    assert_eq!(err.status, None);
}

#[test]
fn invalid_base_urls_are_rejected() {
    for base_url in ["ftp://host/resultsdb", "https://user:pw@host/resultsdb", "not a url"] {
        let result = HttpExperimentClient::new(HttpClientConfig {
            base_url: base_url.to_string(),
            ..HttpClientConfig::default()
        });
        assert!(result.is_err(), "{base_url}");
    }
}

// ============================================================================
// SECTION: Login
// ============================================================================

#[test]
fn login_exchanges_api_token_for_access_token() {
    let (base_url, handle) = serve_once(json_response(200, &json!({"id": "access-1"})));
    let login_url = base_url.replace("/resultsdb", "/v2/users/loginWithToken");
    let token = authenticate(&login_url, "secret", &HttpClientConfig::default()).unwrap();
    let captured = handle.join().unwrap();

    assert_eq!(token, "access-1");
    assert_eq!(captured.method, "POST");
    assert_eq!(captured.path(), "/v2/users/loginWithToken");
    assert_eq!(captured.token, None);
    let sent: Value = serde_json::from_str(&captured.body).unwrap();
    assert_eq!(sent, json!({"apiToken": "secret"}));
}

#[test]
fn login_without_id_fails() {
    let (base_url, handle) = serve_once(json_response(200, &json!({"ttl": 10})));
    let err = authenticate(&base_url, "secret", &HttpClientConfig::default()).unwrap_err();
    handle.join().unwrap();

    assert_eq!(err.status, None);
}

#[test]
fn rejected_login_keeps_status() {
    let (base_url, handle) = serve_once(text_response(401, "bad token"));
    let err = authenticate(&base_url, "secret", &HttpClientConfig::default()).unwrap_err();
    handle.join().unwrap();

    assert_eq!(err, ClientError::with_status(401, "bad token"));
}

// ============================================================================
// SECTION: Service Integration
// ============================================================================

#[test]
fn service_maps_http_not_found() {
    let (base_url, handle) = serve_once(text_response(404, "Experiment missing"));
    let service = ExperimentService::new(client(base_url), AccountContext::default())
        .with_event_sink(Arc::new(NoopEventSink));
    let err = service.experiment(&ExperimentId::new("exp-1")).unwrap_err();
    handle.join().unwrap();

    assert_eq!(
        err,
        ExperimentError::NotFound(
            "Experiment exp-1 not found. The server responded with Experiment missing \
             (status 404)"
                .to_string()
        )
    );
}

#[test]
fn service_delete_of_missing_experiment_is_already_absent() {
    let (base_url, handle) = serve_once(text_response(404, ""));
    let service = ExperimentService::new(client(base_url), AccountContext::default())
        .with_prompt_for_delete(false)
        .with_event_sink(Arc::new(NoopEventSink));
    let outcome = service.delete_experiment(&ExperimentId::new("exp-1")).unwrap();
    let captured = handle.join().unwrap();

    assert_eq!(outcome, DeleteOutcome::AlreadyAbsent);
    assert_eq!(captured.method, "DELETE");
    assert_eq!(captured.path(), "/resultsdb/experiments/exp-1");
}
