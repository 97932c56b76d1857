// resultsdb-core/tests/record_converter.rs
// ============================================================================
// Module: Record Converter Tests
// Description: Decoding wire records and encoding drafts and updates.
// Purpose: Pin field mappings, null handling, and schema violations.
// Dependencies: resultsdb-core, serde_json, time
// ============================================================================

//! Record conversion tests.

#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::float_cmp,
    reason = "Test-only assertions and helpers are permitted."
)]

use resultsdb_core::AccountContext;
use resultsdb_core::AnalysisResultDraft;
use resultsdb_core::AnalysisResultUpdate;
use resultsdb_core::DeviceComponent;
use resultsdb_core::DeviceComponents;
use resultsdb_core::ExperimentDraft;
use resultsdb_core::ExperimentError;
use resultsdb_core::ExperimentId;
use resultsdb_core::ExperimentUpdate;
use resultsdb_core::LocalZone;
use resultsdb_core::MemberInput;
use resultsdb_core::ResultId;
use resultsdb_core::ResultQuality;
use resultsdb_core::ShareLevel;
use resultsdb_core::runtime::convert::decode_analysis_result;
use resultsdb_core::runtime::convert::decode_experiment;
use resultsdb_core::runtime::convert::decode_figure_receipt;
use resultsdb_core::runtime::convert::encode_analysis_result_draft;
use resultsdb_core::runtime::convert::encode_analysis_result_update;
use resultsdb_core::runtime::convert::encode_experiment_draft;
use resultsdb_core::runtime::convert::encode_experiment_update;
use resultsdb_core::runtime::convert::extract_page;
use resultsdb_core::runtime::convert::group_device_components;
use serde_json::Map;
use serde_json::Value;
use serde_json::json;
use time::macros::datetime;
use time::macros::offset;

const EXPERIMENT_UUID: &str = "0c4e1b9a-5a2f-4d3e-9f61-6f0a2b9d7c11";
const PARENT_UUID: &str = "7d2e4f6a-1b3c-4d5e-8f90-a1b2c3d4e5f6";

fn plus_two() -> LocalZone {
    LocalZone::fixed(offset!(+2))
}

fn full_experiment() -> Value {
    json!({
        "type": "Rabi",
        "device_name": "backend-a",
        "uuid": EXPERIMENT_UUID,
        "parent_experiment_uuid": PARENT_UUID,
        "jobs": ["job-1", "job-2"],
        "tags": ["calibration"],
        "notes": "first run",
        "visibility": "project",
        "extra": {"shots": 1024},
        "plot_names": ["rabi.svg"],
        "created_at": "2024-01-01T10:00:00Z",
        "start_time": "2024-01-01T10:05:00Z",
        "end_time": "",
        "updated_at": null,
        "owner": "alice",
        "hub_id": "hub",
        "group_id": "group",
        "project_id": "project"
    })
}

// ============================================================================
// SECTION: Experiment Decode
// ============================================================================

#[test]
fn experiment_fields_decode_with_local_timestamps() -> Result<(), ExperimentError> {
    let record = decode_experiment(&full_experiment(), plus_two())?;
    assert_eq!(record.experiment_type, "Rabi");
    assert_eq!(record.backend_name, "backend-a");
    assert_eq!(record.experiment_id, ExperimentId::new(EXPERIMENT_UUID));
    assert_eq!(record.parent_id, Some(ExperimentId::new(PARENT_UUID)));
    assert_eq!(record.job_ids, vec!["job-1".to_string(), "job-2".to_string()]);
    assert_eq!(record.tags, vec!["calibration".to_string()]);
    assert_eq!(record.notes, "first run");
    assert_eq!(record.share_level, Some(ShareLevel::Project));
    assert_eq!(record.metadata.get("shots"), Some(&json!(1024)));
    assert_eq!(record.figure_names, vec!["rabi.svg".to_string()]);
    assert_eq!(record.creation_datetime, Some(datetime!(2024-01-01 12:00 +02:00)));
    assert_eq!(record.start_datetime, Some(datetime!(2024-01-01 12:05 +02:00)));
    assert_eq!(record.end_datetime, None);
    assert_eq!(record.updated_datetime, None);
    assert_eq!(record.owner, "alice");
    assert_eq!(record.hub, "hub");
    Ok(())
}

#[test]
fn experiment_optional_fields_default_when_absent() -> Result<(), ExperimentError> {
    let raw = json!({"type": "T1", "device_name": "b", "uuid": "u", "jobs": []});
    let record = decode_experiment(&raw, LocalZone::utc())?;
    assert!(record.tags.is_empty());
    assert!(record.metadata.is_empty());
    assert_eq!(record.share_level, None);
    assert_eq!(record.parent_id, None);
    assert_eq!(record.notes, "");
    Ok(())
}

#[test]
fn experiment_without_jobs_is_a_protocol_error() {
    let raw = json!({"type": "T1", "device_name": "b", "uuid": "u"});
    assert!(matches!(decode_experiment(&raw, LocalZone::utc()), Err(ExperimentError::Protocol(_))));
}

#[test]
fn unknown_visibility_is_a_protocol_error() {
    let raw = json!({
        "type": "T1", "device_name": "b", "uuid": "u", "jobs": [], "visibility": "team"
    });
    assert!(matches!(decode_experiment(&raw, LocalZone::utc()), Err(ExperimentError::Protocol(_))));
}

#[test]
fn bad_server_timestamp_is_a_protocol_error() {
    let raw = json!({
        "type": "T1", "device_name": "b", "uuid": "u", "jobs": [], "created_at": "not a time"
    });
    assert!(matches!(decode_experiment(&raw, LocalZone::utc()), Err(ExperimentError::Protocol(_))));
}

// ============================================================================
// SECTION: Analysis Result Decode
// ============================================================================

#[test]
fn analysis_result_fields_decode() -> Result<(), ExperimentError> {
    let raw = json!({
        "uuid": "r1",
        "experiment_uuid": EXPERIMENT_UUID,
        "type": "T1",
        "fit": {"value": 12.5},
        "device_components": ["Q1", "R0"],
        "tags": ["a"],
        "quality": "GOOD",
        "verified": true,
        "chisq": 1.25,
        "created_at": "2024-02-01T00:00:00Z",
        "device_name": "backend-a"
    });
    let record = decode_analysis_result(&raw, LocalZone::utc())?;
    assert_eq!(record.result_id, ResultId::new("r1"));
    assert_eq!(record.result_type, "T1");
    assert_eq!(record.result_data.get("value"), Some(&json!(12.5)));
    assert_eq!(
        record.device_components,
        DeviceComponents::new(vec![DeviceComponent::Resonator(0), DeviceComponent::Qubit(1)])
    );
    assert_eq!(record.quality, Some(ResultQuality::Good));
    assert!(record.verified);
    assert_eq!(record.chisq, Some(1.25));
    assert_eq!(record.creation_datetime, Some(datetime!(2024-02-01 00:00 UTC)));
    assert_eq!(record.backend_name, "backend-a");
    Ok(())
}

#[test]
fn zero_chisq_and_empty_fields_decode_as_absent() -> Result<(), ExperimentError> {
    let raw = json!({
        "uuid": "r1",
        "experiment_uuid": "e1",
        "type": "T1",
        "chisq": 0,
        "quality": "",
        "device_name": "backend-a"
    });
    let record = decode_analysis_result(&raw, LocalZone::utc())?;
    assert_eq!(record.chisq, None);
    assert_eq!(record.quality, None);
    assert!(!record.verified);
    assert!(record.device_components.is_empty());
    Ok(())
}

#[test]
fn analysis_result_without_backend_is_a_protocol_error() {
    let raw = json!({"uuid": "r1", "experiment_uuid": "e1", "type": "T1"});
    let err = decode_analysis_result(&raw, LocalZone::utc()).unwrap_err();
    assert!(
        matches!(&err, ExperimentError::Protocol(message) if message.contains("device_name")),
        "{err}"
    );
}

#[test]
fn unknown_quality_is_a_protocol_error() {
    let raw = json!({"uuid": "r1", "experiment_uuid": "e1", "type": "T1", "quality": "MEH"});
    assert!(matches!(
        decode_analysis_result(&raw, LocalZone::utc()),
        Err(ExperimentError::Protocol(_))
    ));
}

// ============================================================================
// SECTION: Responses
// ============================================================================

#[test]
fn page_marker_is_normalized() -> Result<(), ExperimentError> {
    let page = extract_page(json!({"experiments": [{"a": 1}], "marker": ""}), "experiments")?;
    assert_eq!(page.items.len(), 1);
    assert_eq!(page.marker, None);
    let page = extract_page(json!({"experiments": [], "marker": "m1"}), "experiments")?;
    assert_eq!(page.marker.as_deref(), Some("m1"));
    assert!(extract_page(json!({"other": []}), "experiments").is_err());
    assert!(extract_page(json!({"experiments": {}}), "experiments").is_err());
    Ok(())
}

#[test]
fn figure_receipt_and_device_components_decode() -> Result<(), ExperimentError> {
    let receipt = decode_figure_receipt(&json!({"name": "a.svg", "size": 42}))?;
    assert_eq!(receipt.name, "a.svg");
    assert_eq!(receipt.size, 42);
    let grouped = group_device_components(&json!([
        {"device_name": "b1", "type": "qubit"},
        {"device_name": "b2", "type": "coupler"},
        {"device_name": "b1", "type": "resonator"}
    ]))?;
    assert_eq!(grouped.get("b1"), Some(&vec!["qubit".to_string(), "resonator".to_string()]));
    assert_eq!(grouped.get("b2"), Some(&vec!["coupler".to_string()]));
    Ok(())
}

// ============================================================================
// SECTION: Encode
// ============================================================================

#[test]
fn experiment_draft_carries_account_scope_and_utc_start() -> Result<(), ExperimentError> {
    let account = AccountContext {
        hub: Some("hub".to_string()),
        group: Some("group".to_string()),
        project: None,
        ..AccountContext::default()
    };
    let mut draft = ExperimentDraft::new("Rabi", "backend-a");
    draft.experiment_id = Some(ExperimentId::new(EXPERIMENT_UUID));
    draft.share_level = Some(MemberInput::Name("Public".to_string()));
    draft.start_datetime = Some(datetime!(2024-01-01 12:00).into());
    draft.job_ids = Some(vec!["job-1".to_string()]);
    let payload = encode_experiment_draft(&draft, &account, plus_two())?;
    assert_eq!(payload.get("type"), Some(&json!("Rabi")));
    assert_eq!(payload.get("device_name"), Some(&json!("backend-a")));
    assert_eq!(payload.get("hub_id"), Some(&json!("hub")));
    assert_eq!(payload.get("project_id"), Some(&Value::Null));
    assert_eq!(payload.get("uuid"), Some(&json!(EXPERIMENT_UUID)));
    assert_eq!(payload.get("visibility"), Some(&json!("public")));
    assert_eq!(payload.get("start_time"), Some(&json!("2024-01-01T10:00:00Z")));
    assert_eq!(payload.get("jobs"), Some(&json!(["job-1"])));
    assert!(!payload.contains_key("tags"));
    assert!(!payload.contains_key("notes"));
    Ok(())
}

#[test]
fn experiment_draft_rejects_bad_ids() {
    let mut draft = ExperimentDraft::new("Rabi", "backend-a");
    draft.experiment_id = Some(ExperimentId::new("not-a-uuid"));
    let result = encode_experiment_draft(&draft, &AccountContext::default(), LocalZone::utc());
    assert!(matches!(result, Err(ExperimentError::Validation(_))));

    draft.experiment_id = Some(ExperimentId::new(EXPERIMENT_UUID));
    draft.parent_id = Some(ExperimentId::new(EXPERIMENT_UUID));
    let result = encode_experiment_draft(&draft, &AccountContext::default(), LocalZone::utc());
    assert!(matches!(result, Err(ExperimentError::Validation(_))));
}

#[test]
fn experiment_update_sends_only_supplied_fields() -> Result<(), ExperimentError> {
    let update = ExperimentUpdate {
        tags: Some(vec!["done".to_string()]),
        ..ExperimentUpdate::default()
    };
    let payload = encode_experiment_update(&update, LocalZone::utc())?;
    let expected: Map<String, Value> =
        [("tags".to_string(), json!(["done"]))].into_iter().collect();
    assert_eq!(payload, expected);
    assert!(encode_experiment_update(&ExperimentUpdate::default(), LocalZone::utc())?.is_empty());
    Ok(())
}

#[test]
fn analysis_result_draft_has_fixed_fields() -> Result<(), ExperimentError> {
    let mut data = Map::new();
    data.insert("value".to_string(), json!(3));
    let mut draft = AnalysisResultDraft::new(ExperimentId::new("e1"), "T1", data);
    draft.device_components = vec![DeviceComponent::Qubit(2)].into();
    draft.chisq = Some(0.5);
    let payload = encode_analysis_result_draft(&draft)?;
    assert_eq!(payload.get("experiment_uuid"), Some(&json!("e1")));
    assert_eq!(payload.get("device_components"), Some(&json!(["Q2"])));
    assert_eq!(payload.get("fit"), Some(&json!({"value": 3})));
    assert_eq!(payload.get("type"), Some(&json!("T1")));
    assert_eq!(payload.get("quality"), Some(&json!("UNKNOWN")));
    assert_eq!(payload.get("verified"), Some(&json!(false)));
    assert_eq!(payload.get("chisq"), Some(&json!(0.5)));
    assert!(!payload.contains_key("uuid"));
    assert!(!payload.contains_key("tags"));
    Ok(())
}

#[test]
fn analysis_result_update_rejects_non_finite_chisq() {
    let update = AnalysisResultUpdate {
        chisq: Some(f64::NAN),
        ..AnalysisResultUpdate::default()
    };
    assert!(matches!(
        encode_analysis_result_update(&update),
        Err(ExperimentError::Validation(_))
    ));
}

#[test]
fn analysis_result_update_encodes_quality_by_wire_value() -> Result<(), ExperimentError> {
    let update = AnalysisResultUpdate {
        quality: Some("perfect".into()),
        verified: Some(true),
        ..AnalysisResultUpdate::default()
    };
    let payload = encode_analysis_result_update(&update)?;
    assert_eq!(payload.get("quality"), Some(&json!("PERFECT")));
    assert_eq!(payload.get("verified"), Some(&json!(true)));
    assert_eq!(payload.len(), 2);
    Ok(())
}
