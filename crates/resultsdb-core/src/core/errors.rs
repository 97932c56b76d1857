// resultsdb-core/src/core/errors.rs
// ============================================================================
// Module: ResultsDB Error Taxonomy
// Description: Domain errors and the transport error contract.
// Purpose: Give every service operation one closed, caller-facing error type.
// Dependencies: thiserror
// ============================================================================

//! ## Overview
//! [`ExperimentError`] is the only error callers see. Transport collaborators
//! report [`ClientError`] values, which are folded into domain errors by the
//! scoped mapping boundary in [`crate::runtime::error_map`]. Domain errors
//! never keep the transport error as a source: its text and status are part of
//! the message instead.

// ============================================================================
// SECTION: Imports
// ============================================================================

use thiserror::Error;

// ============================================================================
// SECTION: Transport Errors
// ============================================================================

/// Failure reported by an [`crate::ExperimentClient`] implementation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}{}", status_suffix(.status.as_ref()))]
pub struct ClientError {
    /// HTTP status code, or `None` when no response was received.
    pub status: Option<u16>,
    /// Human-readable failure description.
    pub message: String,
}

impl ClientError {
    /// Creates a transport error carrying an HTTP status code.
    #[must_use]
    pub fn with_status(status: u16, message: impl Into<String>) -> Self {
        Self {
            status: Some(status),
            message: message.into(),
        }
    }

    /// Creates a transport error for a request that produced no response.
    #[must_use]
    pub fn transport(message: impl Into<String>) -> Self {
        Self {
            status: None,
            message: message.into(),
        }
    }
}

/// Renders the status suffix of a transport error message.
fn status_suffix(status: Option<&u16>) -> String {
    status.map(|status| format!(" (status {status})")).unwrap_or_default()
}

// ============================================================================
// SECTION: Domain Errors
// ============================================================================

/// Errors returned by ResultsDB service operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExperimentError {
    /// The requested entry does not exist (wire 404).
    #[error("{0}")]
    NotFound(String),
    /// The entry being created already exists (wire 409).
    #[error("{0}")]
    AlreadyExists(String),
    /// Any other transport failure.
    #[error("{message}")]
    Api {
        /// Original HTTP status, when one was received.
        status: Option<u16>,
        /// Context-annotated failure message.
        message: String,
    },
    /// Caller input failed local validation before any network call.
    #[error("invalid input: {0}")]
    Validation(String),
    /// The server response violated the expected schema.
    #[error("unexpected server response: {0}")]
    Protocol(String),
    /// A local file operation failed.
    #[error("io error: {0}")]
    Io(String),
}

impl ExperimentError {
    /// Returns a stable label for the error kind, used in structured events.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "not_found",
            Self::AlreadyExists(_) => "already_exists",
            Self::Api {
                ..
            } => "api",
            Self::Validation(_) => "validation",
            Self::Protocol(_) => "protocol",
            Self::Io(_) => "io",
        }
    }
}
