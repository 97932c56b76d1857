// resultsdb-http/src/query.rs
// ============================================================================
// Module: Query String Encoding
// Description: Wire query parameters for compiled list requests.
// Purpose: Map compiled list parameters onto the backend's parameter names.
// Dependencies: resultsdb-core
// ============================================================================

//! ## Overview
//! List parameters arrive fully compiled by the filter compiler, so encoding
//! is a renaming step. Range filters and exact device component lists are
//! sent as repeated parameters. The four visibility flags become `visibility`
//! and `owner` parameters with an optional `!` negation.

// ============================================================================
// SECTION: Imports
// ============================================================================

use resultsdb_core::AnalysisResultListParams;
use resultsdb_core::ComponentFilter;
use resultsdb_core::ExperimentListParams;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Ordered query parameter pairs; a key may repeat.
pub type QueryPairs = Vec<(&'static str, String)>;

// ============================================================================
// SECTION: Encoders
// ============================================================================

/// Encodes experiment list parameters.
#[must_use]
pub fn experiment_query_pairs(params: &ExperimentListParams) -> QueryPairs {
    let mut pairs = QueryPairs::new();
    push_paging(&mut pairs, params.limit, params.marker.as_deref());
    push_opt(&mut pairs, "device_name", params.backend_name.as_deref());
    push_opt(&mut pairs, "type", params.experiment_type.as_deref());
    push_all(&mut pairs, "start_time", &params.start_time);
    push_components(&mut pairs, params.device_components.as_ref());
    push_opt(&mut pairs, "tags", params.tags.as_deref());
    push_opt(&mut pairs, "hub_id", params.hub.as_deref());
    push_opt(&mut pairs, "group_id", params.group.as_deref());
    push_opt(&mut pairs, "project_id", params.project.as_deref());
    if let Some(visibility) = flag_value("public", params.public_only, params.exclude_public) {
        pairs.push(("visibility", visibility));
    }
    if let Some(owner) = flag_value("me", params.mine_only, params.exclude_mine) {
        pairs.push(("owner", owner));
    }
    push_opt(
        &mut pairs,
        "parent_experiment_uuid",
        params.parent_id.as_ref().map(|id| id.as_str()),
    );
    push_opt(&mut pairs, "sort", params.sort_by.as_deref());
    pairs
}

/// Encodes analysis result list parameters.
#[must_use]
pub fn analysis_result_query_pairs(params: &AnalysisResultListParams) -> QueryPairs {
    let mut pairs = QueryPairs::new();
    push_paging(&mut pairs, params.limit, params.marker.as_deref());
    push_opt(&mut pairs, "device_name", params.backend_name.as_deref());
    push_components(&mut pairs, params.device_components.as_ref());
    push_opt(&mut pairs, "experiment_uuid", params.experiment_id.as_ref().map(|id| id.as_str()));
    push_opt(&mut pairs, "type", params.result_type.as_deref());
    push_opt(&mut pairs, "quality", params.quality.as_deref());
    if let Some(verified) = params.verified {
        pairs.push(("verified", verified.to_string()));
    }
    push_opt(&mut pairs, "tags", params.tags.as_deref());
    push_all(&mut pairs, "created_at", &params.created_at);
    push_opt(&mut pairs, "sort", params.sort_by.as_deref());
    pairs
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Pushes the limit and marker parameters.
fn push_paging(pairs: &mut QueryPairs, limit: Option<u64>, marker: Option<&str>) {
    if let Some(limit) = limit {
        pairs.push(("limit", limit.to_string()));
    }
    push_opt(pairs, "marker", marker);
}

/// Pushes a parameter when a value is present.
fn push_opt(pairs: &mut QueryPairs, key: &'static str, value: Option<&str>) {
    if let Some(value) = value {
        pairs.push((key, value.to_string()));
    }
}

/// Pushes one parameter per value.
fn push_all(pairs: &mut QueryPairs, key: &'static str, values: &[String]) {
    pairs.extend(values.iter().map(|value| (key, value.clone())));
}

/// Pushes the device component filter as repeated parameters.
fn push_components(pairs: &mut QueryPairs, filter: Option<&ComponentFilter>) {
    if let Some(filter) = filter {
        pairs.extend(filter.query_values().into_iter().map(|value| ("device_components", value)));
    }
}

/// Returns the value for an inclusive/exclusive flag pair.
fn flag_value(value: &str, only: bool, exclude: bool) -> Option<String> {
    if only {
        Some(value.to_string())
    } else if exclude {
        Some(format!("!{value}"))
    } else {
        None
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use resultsdb_core::ExperimentId;

    use super::*;

    #[test]
    fn empty_params_encode_to_nothing() {
        assert!(experiment_query_pairs(&ExperimentListParams::default()).is_empty());
        assert!(analysis_result_query_pairs(&AnalysisResultListParams::default()).is_empty());
    }

    #[test]
    fn visibility_flags_use_negation() {
        let params = ExperimentListParams {
            exclude_public: true,
            mine_only: true,
            ..ExperimentListParams::default()
        };
        assert_eq!(
            experiment_query_pairs(&params),
            vec![("visibility", "!public".to_string()), ("owner", "me".to_string())]
        );
    }

    #[test]
    fn ranges_and_components_repeat() {
        let params = AnalysisResultListParams {
            limit: Some(4),
            device_components: Some(ComponentFilter::Exact(vec![
                "Q0".to_string(),
                "Q1".to_string(),
            ])),
            experiment_id: Some(ExperimentId::new("exp")),
            verified: Some(false),
            created_at: vec!["ge:a".to_string(), "le:b".to_string()],
            ..AnalysisResultListParams::default()
        };
        assert_eq!(
            analysis_result_query_pairs(&params),
            vec![
                ("limit", "4".to_string()),
                ("device_components", "Q0".to_string()),
                ("device_components", "Q1".to_string()),
                ("experiment_uuid", "exp".to_string()),
                ("verified", "false".to_string()),
                ("created_at", "ge:a".to_string()),
                ("created_at", "le:b".to_string()),
            ]
        );
    }
}
