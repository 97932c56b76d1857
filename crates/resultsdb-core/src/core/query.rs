// resultsdb-core/src/core/query.rs
// ============================================================================
// Module: ResultsDB Queries
// Description: Caller-facing filter inputs for list operations.
// Purpose: Describe list queries before they are compiled to wire filters.
// Dependencies: crate::core
// ============================================================================

//! ## Overview
//! Queries are plain data. Nothing here is validated; validation happens when
//! the filter compiler turns a query into transport parameters, before any
//! network call. Both queries default to a limit of 10 and the `OR` tag
//! operator.

use crate::core::device::DeviceComponent;
use crate::core::identifiers::ExperimentId;
use crate::core::levels::MemberInput;
use crate::core::levels::ResultQuality;
use crate::core::time::DateTimeInput;

/// Default number of records returned by a list call.
pub const DEFAULT_LIST_LIMIT: i64 = 10;

/// Default tag operator.
pub const DEFAULT_TAGS_OPERATOR: &str = "OR";

// ============================================================================
// SECTION: Experiment Query
// ============================================================================

/// Filters for listing experiments.
#[derive(Debug, Clone, PartialEq)]
pub struct ExperimentQuery {
    /// Maximum number of experiments; `None` fetches everything.
    pub limit: Option<i64>,
    /// Device components the experiments must involve.
    pub device_components: Option<Vec<DeviceComponent>>,
    /// Device component operator (`contains`), or `None` for exact match.
    pub device_components_operator: Option<String>,
    /// Experiment type.
    pub experiment_type: Option<String>,
    /// Experiment type operator (`like`).
    pub experiment_type_operator: Option<String>,
    /// Backend name.
    pub backend_name: Option<String>,
    /// Tags to match.
    pub tags: Option<Vec<String>>,
    /// Tag operator (`AND` or `OR`, case-insensitive).
    pub tags_operator: String,
    /// Lower bound on the start time, in local time.
    pub start_datetime_after: Option<DateTimeInput>,
    /// Upper bound on the start time, in local time.
    pub start_datetime_before: Option<DateTimeInput>,
    /// Hub scope.
    pub hub: Option<String>,
    /// Group scope; requires `hub`.
    pub group: Option<String>,
    /// Project scope; requires `group` and `hub`.
    pub project: Option<String>,
    /// Exclude public experiments.
    pub exclude_public: bool,
    /// Only public experiments.
    pub public_only: bool,
    /// Exclude the caller's own experiments.
    pub exclude_mine: bool,
    /// Only the caller's own experiments.
    pub mine_only: bool,
    /// Parent experiment identifier.
    pub parent_id: Option<ExperimentId>,
    /// Sort specs (`key:direction`), primary first.
    pub sort_by: Vec<String>,
}

impl Default for ExperimentQuery {
    fn default() -> Self {
        Self {
            limit: Some(DEFAULT_LIST_LIMIT),
            device_components: None,
            device_components_operator: None,
            experiment_type: None,
            experiment_type_operator: None,
            backend_name: None,
            tags: None,
            tags_operator: DEFAULT_TAGS_OPERATOR.to_string(),
            start_datetime_after: None,
            start_datetime_before: None,
            hub: None,
            group: None,
            project: None,
            exclude_public: false,
            public_only: false,
            exclude_mine: false,
            mine_only: false,
            parent_id: None,
            sort_by: Vec::new(),
        }
    }
}

impl ExperimentQuery {
    /// Returns the query with the given limit.
    #[must_use]
    pub fn with_limit(mut self, limit: Option<i64>) -> Self {
        self.limit = limit;
        self
    }

    /// Returns the query with one more sort spec appended.
    #[must_use]
    pub fn sorted_by(mut self, spec: impl Into<String>) -> Self {
        self.sort_by.push(spec.into());
        self
    }
}

// ============================================================================
// SECTION: Analysis Result Query
// ============================================================================

/// Filters for listing analysis results.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisResultQuery {
    /// Maximum number of results; `None` fetches everything.
    pub limit: Option<i64>,
    /// Device components the results must pertain to.
    pub device_components: Option<Vec<DeviceComponent>>,
    /// Device component operator (`contains`), or `None` for exact match.
    pub device_components_operator: Option<String>,
    /// Owning experiment.
    pub experiment_id: Option<ExperimentId>,
    /// Result type.
    pub result_type: Option<String>,
    /// Result type operator (`like`).
    pub result_type_operator: Option<String>,
    /// Backend name.
    pub backend_name: Option<String>,
    /// Accepted qualities; empty means any.
    pub quality: Vec<MemberInput<ResultQuality>>,
    /// Verification flag.
    pub verified: Option<bool>,
    /// Tags to match.
    pub tags: Option<Vec<String>>,
    /// Tag operator (`AND` or `OR`, case-insensitive).
    pub tags_operator: String,
    /// Lower bound on the creation time, in local time.
    pub creation_datetime_after: Option<DateTimeInput>,
    /// Upper bound on the creation time, in local time.
    pub creation_datetime_before: Option<DateTimeInput>,
    /// Sort specs (`key:direction`), primary first.
    pub sort_by: Vec<String>,
}

impl Default for AnalysisResultQuery {
    fn default() -> Self {
        Self {
            limit: Some(DEFAULT_LIST_LIMIT),
            device_components: None,
            device_components_operator: None,
            experiment_id: None,
            result_type: None,
            result_type_operator: None,
            backend_name: None,
            quality: Vec::new(),
            verified: None,
            tags: None,
            tags_operator: DEFAULT_TAGS_OPERATOR.to_string(),
            creation_datetime_after: None,
            creation_datetime_before: None,
            sort_by: Vec::new(),
        }
    }
}

impl AnalysisResultQuery {
    /// Returns the query with the given limit.
    #[must_use]
    pub fn with_limit(mut self, limit: Option<i64>) -> Self {
        self.limit = limit;
        self
    }

    /// Returns the query with one more sort spec appended.
    #[must_use]
    pub fn sorted_by(mut self, spec: impl Into<String>) -> Self {
        self.sort_by.push(spec.into());
        self
    }
}
