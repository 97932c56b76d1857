// resultsdb-config/src/builder.rs
// ============================================================================
// Module: Service Construction
// Description: Turns validated configuration into a ready service.
// Purpose: Wire account, transport, options, and event sinks in one place.
// Dependencies: resultsdb-core, resultsdb-http
// ============================================================================

//! ## Overview
//! [`build_service`] performs the token login and returns an
//! [`ExperimentService`] over [`HttpExperimentClient`]. Configurations with
//! `account.local = true` are served by [`build_local_service`] instead, which
//! never touches the network. Logging settings fall back to the
//! `RESULTSDB_LOG_LEVEL` and `RESULTSDB_LOG_FILE` environment variables.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::path::PathBuf;
use std::sync::Arc;

use resultsdb_core::AccountContext;
use resultsdb_core::ExperimentClient;
use resultsdb_core::ExperimentService;
use resultsdb_core::InMemoryExperimentClient;
use resultsdb_core::LOG_FILE_ENV;
use resultsdb_core::LOG_LEVEL_ENV;
use resultsdb_core::ServiceEventSink;
use resultsdb_core::ServiceOptions;
use resultsdb_core::build_sink;
use resultsdb_http::HttpClientConfig;
use resultsdb_http::HttpExperimentClient;

use crate::config::ConfigError;
use crate::config::ResultsDbConfig;

// ============================================================================
// SECTION: Builders
// ============================================================================

/// Builds the account context used by service operations.
///
/// # Errors
///
/// Returns [`ConfigError::Invalid`] when the preferences are not a table.
pub fn account_context(config: &ResultsDbConfig) -> Result<AccountContext, ConfigError> {
    Ok(AccountContext {
        hub: config.account.hub.clone(),
        group: config.account.group.clone(),
        project: config.account.project.clone(),
        preferences: config.service.preferences_json()?,
    })
}

/// Builds the service options.
///
/// # Errors
///
/// Returns [`ConfigError::Invalid`] when the offset is malformed.
pub fn service_options(config: &ResultsDbConfig) -> Result<ServiceOptions, ConfigError> {
    Ok(ServiceOptions {
        prompt_for_delete: config.service.prompt_for_delete,
        zone: config.service.zone()?,
    })
}

/// Builds the HTTP transport configuration.
#[must_use]
pub fn http_client_config(
    config: &ResultsDbConfig,
    access_token: Option<String>,
) -> HttpClientConfig {
    HttpClientConfig {
        base_url: config.account.database_url(),
        access_token,
        timeout_ms: config.http.timeout_ms,
        max_response_bytes: config.http.max_response_bytes,
        user_agent: config.http.user_agent.clone(),
        verify: config.account.verify,
    }
}

/// Builds the event sink, with environment variables as fallback.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] when the log file cannot be opened.
pub fn build_event_sink(
    config: &ResultsDbConfig,
) -> Result<Arc<dyn ServiceEventSink>, ConfigError> {
    let level = config.logging.level.clone().or_else(|| std::env::var(LOG_LEVEL_ENV).ok());
    let file = config.logging.file.clone().or_else(|| {
        std::env::var(LOG_FILE_ENV).ok().filter(|file| !file.is_empty()).map(PathBuf::from)
    });
    build_sink(level.as_deref(), file.as_deref())
        .map_err(|err| ConfigError::Io(format!("failed to open log file: {err}")))
}

/// Logs in and builds a service over the HTTP transport.
///
/// # Errors
///
/// Returns [`ConfigError::Invalid`] for local-mode configurations or a
/// missing token, and [`ConfigError::Client`] when the login fails.
pub fn build_service(
    config: &ResultsDbConfig,
) -> Result<ExperimentService<HttpExperimentClient>, ConfigError> {
    if config.account.local {
        return Err(ConfigError::Invalid(
            "account.local selects the in-process backend; use build_local_service".to_string(),
        ));
    }
    let token = config.account.resolved_token().ok_or_else(|| {
        ConfigError::Invalid("account.token or RESULTSDB_TOKEN must be set".to_string())
    })?;
    let client = HttpExperimentClient::login(
        http_client_config(config, None),
        &config.account.login_url(),
        &token,
    )
    .map_err(|err| ConfigError::Client(err.to_string()))?;
    assemble(client, config)
}

/// Builds a service over the in-process backend.
///
/// # Errors
///
/// Returns [`ConfigError`] when the service settings are invalid or the log
/// file cannot be opened.
pub fn build_local_service(
    config: &ResultsDbConfig,
) -> Result<ExperimentService<InMemoryExperimentClient>, ConfigError> {
    assemble(InMemoryExperimentClient::new(), config)
}

/// Wraps a client with the configured account, options, and sink.
fn assemble<C: ExperimentClient>(
    client: C,
    config: &ResultsDbConfig,
) -> Result<ExperimentService<C>, ConfigError> {
    Ok(ExperimentService::new(client, account_context(config)?)
        .with_options(service_options(config)?)
        .with_event_sink(build_event_sink(config)?))
}
