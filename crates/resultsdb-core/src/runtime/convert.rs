// resultsdb-core/src/runtime/convert.rs
// ============================================================================
// Module: ResultsDB Record Converter
// Description: Mapping between wire JSON objects and local records.
// Purpose: Decode server payloads strictly and encode only supplied fields.
// Dependencies: crate::core, serde_json
// ============================================================================

//! ## Overview
//! Decoding is fail-closed: a missing mandatory field, a value of the wrong
//! JSON type, or an unknown enum wire value is [`ExperimentError::Protocol`].
//! JSON `null` is treated like an absent field. Timestamps are converted to
//! local time and are only set when present and non-empty.
//!
//! Encoding builds the outgoing object from the fields the caller supplied.
//! A `Some` value is always transmitted, even when empty or zero, so an update
//! can clear tags or record a chi-square of exactly zero.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;

use serde_json::Map;
use serde_json::Number;
use serde_json::Value;
use time::OffsetDateTime;

use crate::core::device::DeviceComponent;
use crate::core::device::DeviceComponents;
use crate::core::errors::ExperimentError;
use crate::core::identifiers::ExperimentId;
use crate::core::identifiers::ResultId;
use crate::core::levels::NamedMember;
use crate::core::levels::ResultQuality;
use crate::core::levels::ShareLevel;
use crate::core::levels::member_from_wire;
use crate::core::records::AccountContext;
use crate::core::records::AnalysisResultDraft;
use crate::core::records::AnalysisResultRecord;
use crate::core::records::AnalysisResultUpdate;
use crate::core::records::ExperimentDraft;
use crate::core::records::ExperimentRecord;
use crate::core::records::ExperimentUpdate;
use crate::core::records::FigureReceipt;
use crate::core::time::LocalZone;
use crate::core::time::UtcSuffix;

// ============================================================================
// SECTION: Pages
// ============================================================================

/// List key of experiment pages.
pub const EXPERIMENTS_KEY: &str = "experiments";
/// List key of analysis result pages.
pub const ANALYSIS_RESULTS_KEY: &str = "analysis_results";

/// Raw items and continuation marker of one list response.
#[derive(Debug, Clone, PartialEq)]
pub struct RawPage {
    /// Wire records in server order.
    pub items: Vec<Value>,
    /// Next marker; `None` when absent or empty.
    pub marker: Option<String>,
}

/// Splits a list response into its items and next marker.
///
/// # Errors
///
/// Returns [`ExperimentError::Protocol`] when the list key is missing or not
/// an array, or the marker is not a string.
pub fn extract_page(mut response: Value, list_key: &str) -> Result<RawPage, ExperimentError> {
    let object = response
        .as_object_mut()
        .ok_or_else(|| protocol(format!("{list_key} response is not a JSON object")))?;
    let items = match object.remove(list_key) {
        Some(Value::Array(items)) => items,
        Some(_) => return Err(protocol(format!("\"{list_key}\" is not an array"))),
        None => return Err(protocol(format!("missing \"{list_key}\" in list response"))),
    };
    let marker = match object.get("marker") {
        None | Some(Value::Null) => None,
        Some(Value::String(marker)) if marker.is_empty() => None,
        Some(Value::String(marker)) => Some(marker.clone()),
        Some(_) => return Err(protocol("\"marker\" is not a string".to_string())),
    };
    Ok(RawPage {
        items,
        marker,
    })
}

/// Reads the identifier assigned by a create call.
///
/// # Errors
///
/// Returns [`ExperimentError::Protocol`] when `uuid` is missing.
pub fn extract_created_id(response: &Value) -> Result<String, ExperimentError> {
    required_str(as_object(response, "create response")?, "uuid")
}

/// Decodes a figure upload acknowledgement.
///
/// # Errors
///
/// Returns [`ExperimentError::Protocol`] when `name` or `size` is missing.
pub fn decode_figure_receipt(response: &Value) -> Result<FigureReceipt, ExperimentError> {
    let object = as_object(response, "figure response")?;
    let name = required_str(object, "name")?;
    let size = object
        .get("size")
        .and_then(Value::as_u64)
        .ok_or_else(|| protocol("missing or invalid \"size\" in figure response".to_string()))?;
    Ok(FigureReceipt {
        name,
        size,
    })
}

/// Groups device component descriptors by backend name.
///
/// # Errors
///
/// Returns [`ExperimentError::Protocol`] when an entry lacks `device_name` or
/// `type`.
pub fn group_device_components(
    response: &Value,
) -> Result<BTreeMap<String, Vec<String>>, ExperimentError> {
    let entries = response
        .as_array()
        .ok_or_else(|| protocol("device components response is not an array".to_string()))?;
    let mut grouped: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for entry in entries {
        let object = as_object(entry, "device component")?;
        let backend = required_str(object, "device_name")?;
        let component_type = required_str(object, "type")?;
        grouped.entry(backend).or_default().push(component_type);
    }
    Ok(grouped)
}

// ============================================================================
// SECTION: Experiment Decode
// ============================================================================

/// Decodes a wire experiment.
///
/// # Errors
///
/// Returns [`ExperimentError::Protocol`] when the payload violates the schema.
pub fn decode_experiment(
    raw: &Value,
    zone: LocalZone,
) -> Result<ExperimentRecord, ExperimentError> {
    let object = as_object(raw, "experiment")?;
    let share_level = optional_str(object, "visibility")?
        .map(|value| member_from_wire::<ShareLevel>(&value))
        .transpose()?;
    Ok(ExperimentRecord {
        experiment_type: required_str(object, "type")?,
        backend_name: required_str(object, "device_name")?,
        experiment_id: ExperimentId::new(required_str(object, "uuid")?),
        parent_id: optional_str(object, "parent_experiment_uuid")?.map(ExperimentId::new),
        job_ids: string_list(object, "jobs")?
            .ok_or_else(|| protocol("missing \"jobs\" in experiment".to_string()))?,
        tags: string_list(object, "tags")?.unwrap_or_default(),
        notes: optional_str(object, "notes")?.unwrap_or_default(),
        share_level,
        metadata: optional_object(object, "extra")?.unwrap_or_default(),
        figure_names: string_list(object, "plot_names")?.unwrap_or_default(),
        creation_datetime: timestamp(object, "created_at", zone)?,
        start_datetime: timestamp(object, "start_time", zone)?,
        end_datetime: timestamp(object, "end_time", zone)?,
        updated_datetime: timestamp(object, "updated_at", zone)?,
        owner: optional_str(object, "owner")?.unwrap_or_default(),
        hub: optional_str(object, "hub_id")?.unwrap_or_default(),
        group: optional_str(object, "group_id")?.unwrap_or_default(),
        project: optional_str(object, "project_id")?.unwrap_or_default(),
    })
}

// ============================================================================
// SECTION: Analysis Result Decode
// ============================================================================

/// Decodes a wire analysis result.
///
/// # Errors
///
/// Returns [`ExperimentError::Protocol`] when the payload violates the schema.
/// A missing `device_name` and an unknown quality value both count.
pub fn decode_analysis_result(
    raw: &Value,
    zone: LocalZone,
) -> Result<AnalysisResultRecord, ExperimentError> {
    let object = as_object(raw, "analysis result")?;
    let quality = optional_str(object, "quality")?
        .filter(|value| !value.is_empty())
        .map(|value| member_from_wire::<ResultQuality>(&value))
        .transpose()?;
    let chisq = match object.get("chisq") {
        None | Some(Value::Null) => None,
        Some(Value::Number(number)) => number.as_f64().filter(|value| *value != 0.0),
        Some(_) => return Err(protocol("\"chisq\" is not a number".to_string())),
    };
    let verified = match object.get("verified") {
        None | Some(Value::Null) => false,
        Some(Value::Bool(flag)) => *flag,
        Some(_) => return Err(protocol("\"verified\" is not a boolean".to_string())),
    };
    let device_components: DeviceComponents = string_list(object, "device_components")?
        .unwrap_or_default()
        .into_iter()
        .map(DeviceComponent::from)
        .collect();
    Ok(AnalysisResultRecord {
        result_id: ResultId::new(required_str(object, "uuid")?),
        experiment_id: ExperimentId::new(required_str(object, "experiment_uuid")?),
        result_type: required_str(object, "type")?,
        result_data: optional_object(object, "fit")?.unwrap_or_default(),
        device_components,
        tags: string_list(object, "tags")?.unwrap_or_default(),
        quality,
        verified,
        chisq,
        creation_datetime: timestamp(object, "created_at", zone)?,
        updated_datetime: timestamp(object, "updated_at", zone)?,
        backend_name: required_str(object, "device_name")?,
    })
}

// ============================================================================
// SECTION: Experiment Encode
// ============================================================================

/// Encodes an experiment draft for creation.
///
/// # Errors
///
/// Returns [`ExperimentError::Validation`] for malformed ids, a self-parent,
/// unknown share levels, or unconvertible start times.
pub fn encode_experiment_draft(
    draft: &ExperimentDraft,
    account: &AccountContext,
    zone: LocalZone,
) -> Result<Map<String, Value>, ExperimentError> {
    let mut out = Map::new();
    out.insert("type".to_string(), Value::String(draft.experiment_type.clone()));
    out.insert("device_name".to_string(), Value::String(draft.backend_name.clone()));
    out.insert("hub_id".to_string(), nullable(account.hub.as_deref()));
    out.insert("group_id".to_string(), nullable(account.group.as_deref()));
    out.insert("project_id".to_string(), nullable(account.project.as_deref()));
    if let Some(metadata) = &draft.metadata {
        out.insert("extra".to_string(), Value::Object(metadata.clone()));
    }
    if let Some(experiment_id) = &draft.experiment_id {
        if !experiment_id.validate_uuid_v4() {
            return Err(ExperimentError::Validation(format!(
                "experiment id \"{experiment_id}\" is not a UUID v4"
            )));
        }
        out.insert("uuid".to_string(), Value::String(experiment_id.to_string()));
    }
    if let Some(parent_id) = &draft.parent_id {
        if draft.experiment_id.as_ref() == Some(parent_id) {
            return Err(ExperimentError::Validation(
                "an experiment cannot be its own parent".to_string(),
            ));
        }
        out.insert("parent_experiment_uuid".to_string(), Value::String(parent_id.to_string()));
    }
    if let Some(share_level) = &draft.share_level {
        out.insert("visibility".to_string(), wire_str(share_level.resolve()?));
    }
    if let Some(tags) = &draft.tags {
        out.insert("tags".to_string(), string_array(tags));
    }
    if let Some(job_ids) = &draft.job_ids {
        out.insert("jobs".to_string(), string_array(job_ids));
    }
    if let Some(notes) = &draft.notes {
        out.insert("notes".to_string(), Value::String(notes.clone()));
    }
    if let Some(start) = &draft.start_datetime {
        let text = zone.local_to_utc_string(start.clone(), UtcSuffix::Z)?;
        out.insert("start_time".to_string(), Value::String(text));
    }
    Ok(out)
}

/// Encodes a partial experiment update.
///
/// # Errors
///
/// Returns [`ExperimentError::Validation`] for unknown share levels or
/// unconvertible end times.
pub fn encode_experiment_update(
    update: &ExperimentUpdate,
    zone: LocalZone,
) -> Result<Map<String, Value>, ExperimentError> {
    let mut out = Map::new();
    if let Some(metadata) = &update.metadata {
        out.insert("extra".to_string(), Value::Object(metadata.clone()));
    }
    if let Some(share_level) = &update.share_level {
        out.insert("visibility".to_string(), wire_str(share_level.resolve()?));
    }
    if let Some(tags) = &update.tags {
        out.insert("tags".to_string(), string_array(tags));
    }
    if let Some(job_ids) = &update.job_ids {
        out.insert("jobs".to_string(), string_array(job_ids));
    }
    if let Some(notes) = &update.notes {
        out.insert("notes".to_string(), Value::String(notes.clone()));
    }
    if let Some(end) = &update.end_datetime {
        let text = zone.local_to_utc_string(end.clone(), UtcSuffix::Z)?;
        out.insert("end_time".to_string(), Value::String(text));
    }
    Ok(out)
}

// ============================================================================
// SECTION: Analysis Result Encode
// ============================================================================

/// Encodes an analysis result draft for creation.
///
/// # Errors
///
/// Returns [`ExperimentError::Validation`] for malformed ids, unknown quality
/// names, or a non-finite chi-square.
pub fn encode_analysis_result_draft(
    draft: &AnalysisResultDraft,
) -> Result<Map<String, Value>, ExperimentError> {
    let mut out = Map::new();
    out.insert("experiment_uuid".to_string(), Value::String(draft.experiment_id.to_string()));
    out.insert(
        "device_components".to_string(),
        string_array(&draft.device_components.to_strings()),
    );
    out.insert("fit".to_string(), Value::Object(draft.result_data.clone()));
    out.insert("type".to_string(), Value::String(draft.result_type.clone()));
    if let Some(tags) = &draft.tags {
        out.insert("tags".to_string(), string_array(tags));
    }
    out.insert("quality".to_string(), wire_str(draft.quality.resolve()?));
    out.insert("verified".to_string(), Value::Bool(draft.verified));
    if let Some(result_id) = &draft.result_id {
        if !result_id.validate_uuid_v4() {
            return Err(ExperimentError::Validation(format!(
                "analysis result id \"{result_id}\" is not a UUID v4"
            )));
        }
        out.insert("uuid".to_string(), Value::String(result_id.to_string()));
    }
    if let Some(chisq) = draft.chisq {
        out.insert("chisq".to_string(), finite_number(chisq)?);
    }
    Ok(out)
}

/// Encodes a partial analysis result update.
///
/// # Errors
///
/// Returns [`ExperimentError::Validation`] for unknown quality names or a
/// non-finite chi-square.
pub fn encode_analysis_result_update(
    update: &AnalysisResultUpdate,
) -> Result<Map<String, Value>, ExperimentError> {
    let mut out = Map::new();
    if let Some(result_data) = &update.result_data {
        out.insert("fit".to_string(), Value::Object(result_data.clone()));
    }
    if let Some(tags) = &update.tags {
        out.insert("tags".to_string(), string_array(tags));
    }
    if let Some(quality) = &update.quality {
        out.insert("quality".to_string(), wire_str(quality.resolve()?));
    }
    if let Some(verified) = update.verified {
        out.insert("verified".to_string(), Value::Bool(verified));
    }
    if let Some(chisq) = update.chisq {
        out.insert("chisq".to_string(), finite_number(chisq)?);
    }
    Ok(out)
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Builds a protocol error.
fn protocol(message: String) -> ExperimentError {
    ExperimentError::Protocol(message)
}

/// Requires a JSON object.
fn as_object<'a>(
    value: &'a Value,
    what: &str,
) -> Result<&'a Map<String, Value>, ExperimentError> {
    value.as_object().ok_or_else(|| protocol(format!("{what} is not a JSON object")))
}

/// Reads a mandatory string field.
fn required_str(object: &Map<String, Value>, key: &str) -> Result<String, ExperimentError> {
    optional_str(object, key)?.ok_or_else(|| protocol(format!("missing \"{key}\"")))
}

/// Reads an optional string field.
fn optional_str(object: &Map<String, Value>, key: &str) -> Result<Option<String>, ExperimentError> {
    match object.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(text)) => Ok(Some(text.clone())),
        Some(_) => Err(protocol(format!("\"{key}\" is not a string"))),
    }
}

/// Reads an optional object field.
fn optional_object(
    object: &Map<String, Value>,
    key: &str,
) -> Result<Option<Map<String, Value>>, ExperimentError> {
    match object.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Object(inner)) => Ok(Some(inner.clone())),
        Some(_) => Err(protocol(format!("\"{key}\" is not an object"))),
    }
}

/// Reads an optional array-of-strings field.
fn string_list(
    object: &Map<String, Value>,
    key: &str,
) -> Result<Option<Vec<String>>, ExperimentError> {
    match object.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| {
                item.as_str()
                    .map(ToString::to_string)
                    .ok_or_else(|| protocol(format!("\"{key}\" contains a non-string entry")))
            })
            .collect::<Result<Vec<_>, _>>()
            .map(Some),
        Some(_) => Err(protocol(format!("\"{key}\" is not an array"))),
    }
}

/// Reads an optional server timestamp and converts it to local time.
fn timestamp(
    object: &Map<String, Value>,
    key: &str,
    zone: LocalZone,
) -> Result<Option<OffsetDateTime>, ExperimentError> {
    match optional_str(object, key)? {
        Some(text) if !text.is_empty() => zone.server_to_local(&text).map(Some),
        _ => Ok(None),
    }
}

/// Encodes an optional string as a JSON string or `null`.
fn nullable(value: Option<&str>) -> Value {
    value.map_or(Value::Null, |text| Value::String(text.to_string()))
}

/// Encodes a string slice as a JSON array.
fn string_array(values: &[String]) -> Value {
    Value::Array(values.iter().cloned().map(Value::String).collect())
}

/// Encodes an enum member by its wire value.
fn wire_str<T: NamedMember>(member: T) -> Value {
    Value::String(member.wire_value().to_string())
}

/// Encodes a finite float.
fn finite_number(value: f64) -> Result<Value, ExperimentError> {
    Number::from_f64(value).map(Value::Number).ok_or_else(|| {
        ExperimentError::Validation(format!("chisq must be a finite number, got {value}"))
    })
}
