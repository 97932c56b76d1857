// resultsdb-core/src/runtime/error_map.rs
// ============================================================================
// Module: ResultsDB Error Mapper
// Description: Scoped translation of transport failures into domain errors.
// Purpose: Give every transport call one context-annotated error boundary.
// Dependencies: crate::core
// ============================================================================

//! ## Overview
//! Every transport call made by the service goes through exactly one of the
//! two boundaries here:
//! - [`map_api_error`]: 409 becomes [`ExperimentError::AlreadyExists`], 404
//!   becomes [`ExperimentError::NotFound`], anything else becomes
//!   [`ExperimentError::Api`].
//! - [`map_delete_error`]: 404 is reported as [`DeleteOutcome::AlreadyAbsent`]
//!   instead of an error.
//!
//! The transport error is folded into the message and then dropped, so the
//! domain error has no source chain.

use crate::core::errors::ClientError;
use crate::core::errors::ExperimentError;
use crate::core::records::DeleteOutcome;

/// Status code for a duplicate entry.
const STATUS_CONFLICT: u16 = 409;
/// Status code for a missing entry.
const STATUS_NOT_FOUND: u16 = 404;

/// Runs one transport call inside the error mapping boundary.
///
/// # Errors
///
/// Returns the domain error translated from the transport failure.
pub fn map_api_error<T>(
    context: &str,
    call: impl FnOnce() -> Result<T, ClientError>,
) -> Result<T, ExperimentError> {
    call().map_err(|err| translate(context, &err))
}

/// Runs one delete call, treating a missing target as already deleted.
///
/// # Errors
///
/// Returns [`ExperimentError::Api`] for every failure other than 404.
pub fn map_delete_error(
    call: impl FnOnce() -> Result<(), ClientError>,
) -> Result<DeleteOutcome, ExperimentError> {
    match call() {
        Ok(()) => Ok(DeleteOutcome::Deleted),
        Err(err) if err.status == Some(STATUS_NOT_FOUND) => Ok(DeleteOutcome::AlreadyAbsent),
        Err(err) => Err(ExperimentError::Api {
            status: err.status,
            message: format!("Failed to process the request: {err}"),
        }),
    }
}

/// Translates one transport failure using the operation context.
#[must_use]
pub fn translate(context: &str, err: &ClientError) -> ExperimentError {
    match err.status {
        Some(STATUS_CONFLICT) => {
            ExperimentError::AlreadyExists(format!("{context} The server responded with {err}"))
        }
        Some(STATUS_NOT_FOUND) => {
            ExperimentError::NotFound(format!("{context} The server responded with {err}"))
        }
        status => ExperimentError::Api {
            status,
            message: format!(
                "{context} Failed to process the request: The server responded with {err}"
            ),
        },
    }
}
