// resultsdb-core/src/interfaces/mod.rs
// ============================================================================
// Module: ResultsDB Interfaces
// Description: Transport collaborator contract used by the service runtime.
// Purpose: Keep HTTP, authentication, and storage out of the core logic.
// Dependencies: crate::core, serde_json
// ============================================================================

//! ## Overview
//! [`ExperimentClient`] is the only surface through which the runtime talks to
//! the ResultsDB backend. Implementations perform one round trip per call,
//! return raw JSON (or bytes/text for artifacts), and report failures as
//! [`ClientError`] values carrying the HTTP status when one was received.
//! Interpreting payloads is left to the record converter.
//!
//! List parameters arrive already compiled: every filter string is in its
//! final wire form (`any:a,b`, `like:T1`, `ge:2024-01-01T00:00:00Z`, ...).

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde_json::Map;
use serde_json::Value;

use crate::core::errors::ClientError;
use crate::core::identifiers::ExperimentId;
use crate::core::identifiers::ResultId;

// ============================================================================
// SECTION: List Parameters
// ============================================================================

/// Compiled device component filter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ComponentFilter {
    /// Exact match against the raw component list.
    Exact(Vec<String>),
    /// Pre-encoded `contains:` filter.
    Contains(String),
}

impl ComponentFilter {
    /// Returns the query values for this filter, one per repeated parameter.
    #[must_use]
    pub fn query_values(&self) -> Vec<String> {
        match self {
            Self::Exact(components) => components.clone(),
            Self::Contains(encoded) => vec![encoded.clone()],
        }
    }
}

/// Parameters for one experiment list request.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ExperimentListParams {
    /// Remaining number of records wanted, if bounded.
    pub limit: Option<u64>,
    /// Continuation marker from the previous page.
    pub marker: Option<String>,
    /// Backend name.
    pub backend_name: Option<String>,
    /// Experiment type, possibly `like:` encoded.
    pub experiment_type: Option<String>,
    /// Start time range filters (`ge:`/`le:`).
    pub start_time: Vec<String>,
    /// Device component filter.
    pub device_components: Option<ComponentFilter>,
    /// Tag filter (`any:` or `contains:`).
    pub tags: Option<String>,
    /// Hub scope.
    pub hub: Option<String>,
    /// Group scope.
    pub group: Option<String>,
    /// Project scope.
    pub project: Option<String>,
    /// Exclude public experiments.
    pub exclude_public: bool,
    /// Only public experiments.
    pub public_only: bool,
    /// Exclude the caller's experiments.
    pub exclude_mine: bool,
    /// Only the caller's experiments.
    pub mine_only: bool,
    /// Parent experiment identifier.
    pub parent_id: Option<ExperimentId>,
    /// Comma-joined sort specs in wire keys.
    pub sort_by: Option<String>,
}

/// Parameters for one analysis result list request.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AnalysisResultListParams {
    /// Remaining number of records wanted, if bounded.
    pub limit: Option<u64>,
    /// Continuation marker from the previous page.
    pub marker: Option<String>,
    /// Backend name.
    pub backend_name: Option<String>,
    /// Device component filter.
    pub device_components: Option<ComponentFilter>,
    /// Owning experiment.
    pub experiment_id: Option<ExperimentId>,
    /// Result type, possibly `like:` encoded.
    pub result_type: Option<String>,
    /// Quality filter: a bare wire value or an `in:` list.
    pub quality: Option<String>,
    /// Verification flag.
    pub verified: Option<bool>,
    /// Tag filter (`any:` or `contains:`).
    pub tags: Option<String>,
    /// Creation time range filters (`ge:`/`le:`).
    pub created_at: Vec<String>,
    /// Comma-joined sort specs in wire keys.
    pub sort_by: Option<String>,
}

/// Figure upload mode, passed through to the transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UploadMode {
    /// The server stores the figure before responding.
    #[default]
    Sync,
    /// The server acknowledges first and stores in the background.
    Async,
}

impl UploadMode {
    /// Returns true for synchronous uploads.
    #[must_use]
    pub const fn is_sync(self) -> bool {
        matches!(self, Self::Sync)
    }
}

// ============================================================================
// SECTION: Experiment Client
// ============================================================================

/// Transport collaborator for the ResultsDB backend.
///
/// # Invariants
/// - Each method performs at most one round trip and never retries.
/// - Non-success responses surface as [`ClientError`] with `status` set.
pub trait ExperimentClient {
    /// Fetches one page of experiments.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError`] when the request fails.
    fn experiments(&self, params: &ExperimentListParams) -> Result<Value, ClientError>;

    /// Fetches one experiment.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError`] when the request fails.
    fn experiment_get(&self, experiment_id: &ExperimentId) -> Result<Value, ClientError>;

    /// Creates an experiment and returns the server response.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError`] when the request fails.
    fn experiment_upload(&self, payload: &Map<String, Value>) -> Result<Value, ClientError>;

    /// Applies a partial update to an experiment.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError`] when the request fails.
    fn experiment_update(
        &self,
        experiment_id: &ExperimentId,
        payload: &Map<String, Value>,
    ) -> Result<(), ClientError>;

    /// Deletes an experiment.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError`] when the request fails.
    fn experiment_delete(&self, experiment_id: &ExperimentId) -> Result<(), ClientError>;

    /// Fetches one page of analysis results.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError`] when the request fails.
    fn analysis_results(&self, params: &AnalysisResultListParams) -> Result<Value, ClientError>;

    /// Fetches one analysis result.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError`] when the request fails.
    fn analysis_result_get(&self, result_id: &ResultId) -> Result<Value, ClientError>;

    /// Creates an analysis result and returns the server response.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError`] when the request fails.
    fn analysis_result_create(&self, payload: &Map<String, Value>) -> Result<Value, ClientError>;

    /// Applies a partial update to an analysis result.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError`] when the request fails.
    fn analysis_result_update(
        &self,
        result_id: &ResultId,
        payload: &Map<String, Value>,
    ) -> Result<(), ClientError>;

    /// Deletes an analysis result.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError`] when the request fails.
    fn analysis_result_delete(&self, result_id: &ResultId) -> Result<(), ClientError>;

    /// Uploads a new figure and returns the server acknowledgement.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError`] when the request fails.
    fn figure_upload(
        &self,
        experiment_id: &ExperimentId,
        figure_name: &str,
        figure: &[u8],
        mode: UploadMode,
    ) -> Result<Value, ClientError>;

    /// Replaces an existing figure and returns the server acknowledgement.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError`] when the request fails.
    fn figure_update(
        &self,
        experiment_id: &ExperimentId,
        figure_name: &str,
        figure: &[u8],
        mode: UploadMode,
    ) -> Result<Value, ClientError>;

    /// Downloads a figure.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError`] when the request fails.
    fn figure_get(&self, experiment_id: &ExperimentId, figure_name: &str)
    -> Result<Vec<u8>, ClientError>;

    /// Deletes a figure.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError`] when the request fails.
    fn figure_delete(&self, experiment_id: &ExperimentId, figure_name: &str)
    -> Result<(), ClientError>;

    /// Lists data file metadata for an experiment.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError`] when the request fails.
    fn files(&self, experiment_id: &ExperimentId) -> Result<Value, ClientError>;

    /// Uploads a JSON data file.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError`] when the request fails.
    fn file_upload(
        &self,
        experiment_id: &ExperimentId,
        file_name: &str,
        contents: &str,
    ) -> Result<(), ClientError>;

    /// Downloads a JSON data file as text.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError`] when the request fails.
    fn file_download(&self, experiment_id: &ExperimentId, file_name: &str)
    -> Result<String, ClientError>;

    /// Lists the backends available for experiments.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError`] when the request fails.
    fn devices(&self) -> Result<Value, ClientError>;

    /// Lists device components, optionally for one backend.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError`] when the request fails.
    fn device_components(&self, backend_name: Option<&str>) -> Result<Value, ClientError>;
}
