// resultsdb-core/tests/filter_compiler.rs
// ============================================================================
// Module: Filter Compiler Tests
// Description: Compilation of caller queries into wire list parameters.
// Purpose: Pin operator encodings, validation messages, and exclusivity rules.
// Dependencies: resultsdb-core, time
// ============================================================================

//! Filter compilation tests.

#![allow(
    clippy::panic,
    clippy::unwrap_used,
    clippy::expect_used,
    reason = "Test-only assertions and helpers are permitted."
)]

use resultsdb_core::AnalysisResultQuery;
use resultsdb_core::ComponentFilter;
use resultsdb_core::DateTimeInput;
use resultsdb_core::DeviceComponent;
use resultsdb_core::ExperimentError;
use resultsdb_core::ExperimentId;
use resultsdb_core::ExperimentQuery;
use resultsdb_core::LocalZone;
use resultsdb_core::MemberInput;
use resultsdb_core::ResultQuality;
use resultsdb_core::runtime::filters::ANALYSIS_RESULT_SORT_KEYS;
use resultsdb_core::runtime::filters::EXPERIMENT_SORT_KEYS;
use resultsdb_core::runtime::filters::check_scope;
use resultsdb_core::runtime::filters::compile_analysis_result_query;
use resultsdb_core::runtime::filters::compile_device_components;
use resultsdb_core::runtime::filters::compile_experiment_query;
use resultsdb_core::runtime::filters::compile_item_type;
use resultsdb_core::runtime::filters::compile_quality;
use resultsdb_core::runtime::filters::compile_sort;
use resultsdb_core::runtime::filters::compile_tags;
use resultsdb_core::runtime::filters::validate_limit;
use time::macros::offset;

fn tags(values: &[&str]) -> Vec<String> {
    values.iter().map(ToString::to_string).collect()
}

fn validation_message(result: Result<impl std::fmt::Debug, ExperimentError>) -> String {
    match result {
        Err(ExperimentError::Validation(message)) => message,
        other => panic!("expected validation error, got {other:?}"),
    }
}

// ============================================================================
// SECTION: Filter Families
// ============================================================================

#[test]
fn tags_compile_by_operator() -> Result<(), ExperimentError> {
    let list = tags(&["a", "b"]);
    assert_eq!(compile_tags(Some(list.as_slice()), "OR")?, Some("any:a,b".to_string()));
    assert_eq!(compile_tags(Some(list.as_slice()), "AND")?, Some("contains:a,b".to_string()));
    assert_eq!(compile_tags(Some(list.as_slice()), "and")?, Some("contains:a,b".to_string()));
    assert_eq!(compile_tags(Some(Vec::<String>::new().as_slice()), "XOR")?, None);
    assert_eq!(compile_tags(None, "OR")?, None);
    Ok(())
}

#[test]
fn unknown_tags_operator_is_rejected() {
    let message = validation_message(compile_tags(Some(tags(&["a"]).as_slice()), "XOR"));
    assert!(message.contains("tags_operator"), "{message}");
}

#[test]
fn device_components_compile_exact_or_contains() -> Result<(), ExperimentError> {
    let components = vec![DeviceComponent::Qubit(0), DeviceComponent::Resonator(1)];
    assert_eq!(
        compile_device_components(Some(components.as_slice()), None)?,
        Some(ComponentFilter::Exact(vec!["Q0".to_string(), "R1".to_string()]))
    );
    let contains = compile_device_components(Some(components.as_slice()), Some("contains"))?;
    assert_eq!(contains, Some(ComponentFilter::Contains("contains:Q0,R1".to_string())));
    assert_eq!(
        contains.map(|filter| filter.query_values()),
        Some(vec!["contains:Q0,R1".to_string()])
    );
    assert!(compile_device_components(Some(components.as_slice()), Some("like")).is_err());
    assert_eq!(compile_device_components(None, Some("like"))?, None);
    Ok(())
}

#[test]
fn item_type_operator_applies_only_with_value() -> Result<(), ExperimentError> {
    assert_eq!(compile_item_type(Some("T1"), Some("like"))?, Some("like:T1".to_string()));
    assert_eq!(compile_item_type(Some("T1"), None)?, Some("T1".to_string()));
    assert_eq!(compile_item_type(None, Some("bogus"))?, None);
    assert!(compile_item_type(Some("T1"), Some("contains")).is_err());
    Ok(())
}

#[test]
fn sort_specs_map_to_wire_keys() -> Result<(), ExperimentError> {
    assert_eq!(
        compile_sort(&["start_datetime:desc", "experiment_type:asc"], EXPERIMENT_SORT_KEYS)?,
        Some("start_time:desc,type:asc".to_string())
    );
    assert_eq!(
        compile_sort(&["Creation_Datetime: asc"], ANALYSIS_RESULT_SORT_KEYS)?,
        Some("created_at:asc".to_string())
    );
    assert_eq!(compile_sort::<&str>(&[], EXPERIMENT_SORT_KEYS)?, None);
    Ok(())
}

#[test]
fn malformed_sort_specs_are_rejected() {
    assert!(compile_sort(&["start_datetime"], EXPERIMENT_SORT_KEYS).is_err());
    assert!(compile_sort(&["a:b:c"], EXPERIMENT_SORT_KEYS).is_err());
    assert!(compile_sort(&["start_datetime:up"], EXPERIMENT_SORT_KEYS).is_err());
    let message = validation_message(compile_sort(&["owner:asc"], EXPERIMENT_SORT_KEYS));
    assert!(message.contains("start_datetime, experiment_type"), "{message}");
}

#[test]
fn quality_collapses_to_bare_in_or_nothing() -> Result<(), ExperimentError> {
    assert_eq!(compile_quality(&[])?, None);
    assert_eq!(compile_quality(&[ResultQuality::Good.into()])?, Some("GOOD".to_string()));
    assert_eq!(
        compile_quality(&[ResultQuality::Good.into(), MemberInput::Name("good".to_string())])?,
        Some("GOOD".to_string())
    );
    assert_eq!(
        compile_quality(&[ResultQuality::Bad.into(), "perfect".into()])?,
        Some("in:BAD,PERFECT".to_string())
    );
    let all: Vec<MemberInput<ResultQuality>> = vec![
        ResultQuality::Unknown.into(),
        ResultQuality::Bad.into(),
        ResultQuality::Good.into(),
        ResultQuality::Perfect.into(),
    ];
    assert_eq!(compile_quality(&all)?, None);
    assert!(compile_quality(&["excellent".into()]).is_err());
    Ok(())
}

#[test]
fn scope_requires_wider_levels() {
    assert!(check_scope(Some("h"), Some("g"), Some("p")).is_ok());
    assert!(check_scope(Some("h"), None, None).is_ok());
    assert_eq!(
        validation_message(check_scope(None, None, Some("p"))),
        "If project is specified, group and hub must also be specified."
    );
    assert_eq!(
        validation_message(check_scope(None, Some("g"), None)),
        "If group is specified, hub must also be specified."
    );
}

#[test]
fn limit_must_be_positive() -> Result<(), ExperimentError> {
    assert_eq!(validate_limit(None)?, None);
    assert_eq!(validate_limit(Some(3))?, Some(3));
    assert_eq!(
        validation_message(validate_limit(Some(0))),
        "0 is not a valid `limit`, which has to be a positive integer."
    );
    assert!(validate_limit(Some(-4)).is_err());
    Ok(())
}

// ============================================================================
// SECTION: Query Compilation
// ============================================================================

#[test]
fn default_experiment_query_has_limit_ten_and_no_filters() -> Result<(), ExperimentError> {
    let params = compile_experiment_query(&ExperimentQuery::default(), LocalZone::utc())?;
    assert_eq!(params.limit, Some(10));
    assert_eq!(params.marker, None);
    assert!(params.start_time.is_empty());
    assert_eq!(params.tags, None);
    assert_eq!(params.sort_by, None);
    Ok(())
}

#[test]
fn experiment_query_compiles_every_filter() -> Result<(), ExperimentError> {
    let query = ExperimentQuery {
        limit: None,
        experiment_type: Some("Rabi".to_string()),
        experiment_type_operator: Some("like".to_string()),
        backend_name: Some("backend-a".to_string()),
        tags: Some(tags(&["x", "y"])),
        tags_operator: "AND".to_string(),
        start_datetime_after: Some(DateTimeInput::Text("2024-01-01T02:00:00".to_string())),
        start_datetime_before: Some(DateTimeInput::Text("2024-01-02T02:00:00".to_string())),
        hub: Some("h".to_string()),
        group: Some("g".to_string()),
        project: Some("p".to_string()),
        public_only: true,
        mine_only: true,
        parent_id: Some(ExperimentId::new("parent")),
        ..ExperimentQuery::default()
    }
    .sorted_by("start_datetime:desc");
    let params = compile_experiment_query(&query, LocalZone::fixed(offset!(+2)))?;
    assert_eq!(params.limit, None);
    assert_eq!(params.experiment_type.as_deref(), Some("like:Rabi"));
    assert_eq!(params.tags.as_deref(), Some("contains:x,y"));
    assert_eq!(
        params.start_time,
        vec!["ge:2024-01-01T00:00:00Z".to_string(), "le:2024-01-02T00:00:00Z".to_string()]
    );
    assert_eq!(params.sort_by.as_deref(), Some("start_time:desc"));
    assert!(params.public_only && params.mine_only);
    assert_eq!(params.parent_id, Some(ExperimentId::new("parent")));
    Ok(())
}

#[test]
fn exclusive_visibility_flags_are_rejected() {
    let query = ExperimentQuery {
        exclude_public: true,
        public_only: true,
        ..ExperimentQuery::default()
    };
    assert_eq!(
        validation_message(compile_experiment_query(&query, LocalZone::utc())),
        "exclude_public and public_only cannot both be true"
    );
    let query = ExperimentQuery {
        exclude_mine: true,
        mine_only: true,
        ..ExperimentQuery::default()
    };
    assert_eq!(
        validation_message(compile_experiment_query(&query, LocalZone::utc())),
        "exclude_mine and mine_only cannot both be true"
    );
}

#[test]
fn analysis_result_query_compiles_every_filter() -> Result<(), ExperimentError> {
    let query = AnalysisResultQuery {
        limit: Some(5),
        device_components: Some(vec![DeviceComponent::Qubit(1)]),
        device_components_operator: Some("contains".to_string()),
        experiment_id: Some(ExperimentId::new("exp")),
        result_type: Some("T1".to_string()),
        quality: vec![ResultQuality::Good.into(), ResultQuality::Perfect.into()],
        verified: Some(true),
        tags: Some(tags(&["a"])),
        creation_datetime_after: Some("2024-05-01T00:00:00Z".into()),
        ..AnalysisResultQuery::default()
    }
    .sorted_by("result_type:asc");
    let params = compile_analysis_result_query(&query, LocalZone::utc())?;
    assert_eq!(params.limit, Some(5));
    assert_eq!(
        params.device_components,
        Some(ComponentFilter::Contains("contains:Q1".to_string()))
    );
    assert_eq!(params.result_type.as_deref(), Some("T1"));
    assert_eq!(params.quality.as_deref(), Some("in:GOOD,PERFECT"));
    assert_eq!(params.verified, Some(true));
    assert_eq!(params.tags.as_deref(), Some("any:a"));
    assert_eq!(params.created_at, vec!["ge:2024-05-01T00:00:00Z".to_string()]);
    assert_eq!(params.sort_by.as_deref(), Some("type:asc"));
    Ok(())
}

#[test]
fn invalid_quality_name_is_rejected_before_compilation() {
    let query = AnalysisResultQuery {
        quality: vec![MemberInput::Name("meh".to_string())],
        ..AnalysisResultQuery::default()
    };
    let message = validation_message(compile_analysis_result_query(&query, LocalZone::utc()));
    assert!(message.contains("\"meh\""), "{message}");
}
