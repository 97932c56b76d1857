// resultsdb-core/src/core/records.rs
// ============================================================================
// Module: ResultsDB Records
// Description: Local record shapes, create drafts, and partial updates.
// Purpose: Model experiments and analysis results independently of the wire.
// Dependencies: serde_json, time
// ============================================================================

//! ## Overview
//! Decoded records ([`ExperimentRecord`], [`AnalysisResultRecord`]) hold local
//! timestamps. Outgoing data is described by drafts (creation) and updates.
//! Every optional field of a draft or update is an explicit `Option`: `None`
//! means "leave untouched", while `Some` is always transmitted, even when the
//! value is empty or zero.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde_json::Map;
use serde_json::Value;
use time::OffsetDateTime;

use crate::core::device::DeviceComponents;
use crate::core::identifiers::ExperimentId;
use crate::core::identifiers::ResultId;
use crate::core::levels::MemberInput;
use crate::core::levels::ResultQuality;
use crate::core::levels::ShareLevel;
use crate::core::time::DateTimeInput;

// ============================================================================
// SECTION: Decoded Records
// ============================================================================

/// Experiment as returned by the server, with local timestamps.
#[derive(Debug, Clone, PartialEq)]
pub struct ExperimentRecord {
    /// Experiment type.
    pub experiment_type: String,
    /// Backend the experiment ran on.
    pub backend_name: String,
    /// Experiment identifier.
    pub experiment_id: ExperimentId,
    /// Parent experiment identifier.
    pub parent_id: Option<ExperimentId>,
    /// Job identifiers, in server order.
    pub job_ids: Vec<String>,
    /// Tags attached to the experiment.
    pub tags: Vec<String>,
    /// Freeform notes (empty when absent).
    pub notes: String,
    /// Visibility of the experiment.
    pub share_level: Option<ShareLevel>,
    /// Opaque experiment metadata.
    pub metadata: Map<String, Value>,
    /// Names of figures stored for the experiment.
    pub figure_names: Vec<String>,
    /// Creation time.
    pub creation_datetime: Option<OffsetDateTime>,
    /// Start time.
    pub start_datetime: Option<OffsetDateTime>,
    /// End time.
    pub end_datetime: Option<OffsetDateTime>,
    /// Last update time.
    pub updated_datetime: Option<OffsetDateTime>,
    /// Owner identifier (empty when absent).
    pub owner: String,
    /// Hub identifier (empty when absent).
    pub hub: String,
    /// Group identifier (empty when absent).
    pub group: String,
    /// Project identifier (empty when absent).
    pub project: String,
}

/// Analysis result as returned by the server, with local timestamps.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisResultRecord {
    /// Analysis result identifier.
    pub result_id: ResultId,
    /// Experiment the result belongs to.
    pub experiment_id: ExperimentId,
    /// Analysis result type.
    pub result_type: String,
    /// Fit payload.
    pub result_data: Map<String, Value>,
    /// Device components the result pertains to.
    pub device_components: DeviceComponents,
    /// Tags attached to the result.
    pub tags: Vec<String>,
    /// Quality classification, when the server reports one.
    pub quality: Option<ResultQuality>,
    /// Whether the quality has been verified.
    pub verified: bool,
    /// Chi-square of the fit. A server value of zero decodes as `None`.
    pub chisq: Option<f64>,
    /// Creation time.
    pub creation_datetime: Option<OffsetDateTime>,
    /// Last update time.
    pub updated_datetime: Option<OffsetDateTime>,
    /// Backend the result was produced on.
    pub backend_name: String,
}

// ============================================================================
// SECTION: Experiment Drafts
// ============================================================================

/// Fields for creating an experiment.
#[derive(Debug, Clone, PartialEq)]
pub struct ExperimentDraft {
    /// Experiment type.
    pub experiment_type: String,
    /// Backend the experiment ran on.
    pub backend_name: String,
    /// Experiment metadata.
    pub metadata: Option<Map<String, Value>>,
    /// Caller-chosen identifier (UUID v4); the server assigns one when `None`.
    pub experiment_id: Option<ExperimentId>,
    /// Parent experiment identifier.
    pub parent_id: Option<ExperimentId>,
    /// Job identifiers.
    pub job_ids: Option<Vec<String>>,
    /// Tags.
    pub tags: Option<Vec<String>>,
    /// Freeform notes.
    pub notes: Option<String>,
    /// Visibility, as a member or a case-insensitive name.
    pub share_level: Option<MemberInput<ShareLevel>>,
    /// Start time in local time.
    pub start_datetime: Option<DateTimeInput>,
}

impl ExperimentDraft {
    /// Creates a draft with only the required fields set.
    #[must_use]
    pub fn new(experiment_type: impl Into<String>, backend_name: impl Into<String>) -> Self {
        Self {
            experiment_type: experiment_type.into(),
            backend_name: backend_name.into(),
            metadata: None,
            experiment_id: None,
            parent_id: None,
            job_ids: None,
            tags: None,
            notes: None,
            share_level: None,
            start_datetime: None,
        }
    }
}

/// Partial update of an experiment. Only `Some` fields are transmitted.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ExperimentUpdate {
    /// Replacement metadata.
    pub metadata: Option<Map<String, Value>>,
    /// Replacement job identifiers.
    pub job_ids: Option<Vec<String>>,
    /// Replacement notes.
    pub notes: Option<String>,
    /// Replacement tags.
    pub tags: Option<Vec<String>>,
    /// Replacement visibility.
    pub share_level: Option<MemberInput<ShareLevel>>,
    /// End time in local time.
    pub end_datetime: Option<DateTimeInput>,
}

impl ExperimentUpdate {
    /// Returns true when no field would be transmitted.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.metadata.is_none()
            && self.job_ids.is_none()
            && self.notes.is_none()
            && self.tags.is_none()
            && self.share_level.is_none()
            && self.end_datetime.is_none()
    }
}

// ============================================================================
// SECTION: Analysis Result Drafts
// ============================================================================

/// Fields for creating an analysis result.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisResultDraft {
    /// Experiment the result belongs to.
    pub experiment_id: ExperimentId,
    /// Fit payload.
    pub result_data: Map<String, Value>,
    /// Analysis result type.
    pub result_type: String,
    /// Device components the result pertains to.
    pub device_components: DeviceComponents,
    /// Tags.
    pub tags: Option<Vec<String>>,
    /// Quality, as a member or a case-insensitive name.
    pub quality: MemberInput<ResultQuality>,
    /// Whether the quality has been verified.
    pub verified: bool,
    /// Caller-chosen identifier (UUID v4); the server assigns one when `None`.
    pub result_id: Option<ResultId>,
    /// Chi-square of the fit.
    pub chisq: Option<f64>,
}

impl AnalysisResultDraft {
    /// Creates a draft with unknown, unverified quality and no optional fields.
    #[must_use]
    pub fn new(
        experiment_id: ExperimentId,
        result_type: impl Into<String>,
        result_data: Map<String, Value>,
    ) -> Self {
        Self {
            experiment_id,
            result_data,
            result_type: result_type.into(),
            device_components: DeviceComponents::default(),
            tags: None,
            quality: MemberInput::Member(ResultQuality::Unknown),
            verified: false,
            result_id: None,
            chisq: None,
        }
    }
}

/// Partial update of an analysis result. Only `Some` fields are transmitted.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AnalysisResultUpdate {
    /// Replacement fit payload.
    pub result_data: Option<Map<String, Value>>,
    /// Replacement tags.
    pub tags: Option<Vec<String>>,
    /// Replacement quality.
    pub quality: Option<MemberInput<ResultQuality>>,
    /// Replacement verification flag.
    pub verified: Option<bool>,
    /// Replacement chi-square.
    pub chisq: Option<f64>,
}

impl AnalysisResultUpdate {
    /// Returns true when no field would be transmitted.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.result_data.is_none()
            && self.tags.is_none()
            && self.quality.is_none()
            && self.verified.is_none()
            && self.chisq.is_none()
    }
}

// ============================================================================
// SECTION: Artifacts and Outcomes
// ============================================================================

/// Server acknowledgement of a stored figure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FigureReceipt {
    /// Stored figure name.
    pub name: String,
    /// Stored size in bytes.
    pub size: u64,
}

/// Payload of a data file upload.
#[derive(Debug, Clone, PartialEq)]
pub enum FileData {
    /// JSON value serialized before upload.
    Json(Value),
    /// Pre-serialized JSON text, uploaded as-is.
    Text(String),
}

/// Result of a delete call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    /// The server deleted the entry.
    Deleted,
    /// The entry did not exist on the server.
    AlreadyAbsent,
    /// The caller declined the confirmation prompt; nothing was sent.
    Cancelled,
}

/// Result of an update call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateOutcome {
    /// The update was sent and accepted.
    Applied,
    /// No field was supplied; nothing was sent.
    NothingToUpdate,
}

// ============================================================================
// SECTION: Account Context
// ============================================================================

/// Per-client account context shared by all operations of one service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountContext {
    /// Hub used when creating experiments.
    pub hub: Option<String>,
    /// Group used when creating experiments.
    pub group: Option<String>,
    /// Project used when creating experiments.
    pub project: Option<String>,
    /// Application preferences (not interpreted by the service).
    pub preferences: Map<String, Value>,
}

impl Default for AccountContext {
    fn default() -> Self {
        let mut preferences = Map::new();
        preferences.insert("auto_save".to_string(), Value::Bool(false));
        Self {
            hub: None,
            group: None,
            project: None,
            preferences,
        }
    }
}
