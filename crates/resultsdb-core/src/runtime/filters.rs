// resultsdb-core/src/runtime/filters.rs
// ============================================================================
// Module: ResultsDB Filter Compiler
// Description: Compilation of caller filters into wire query strings.
// Purpose: Validate filters locally and emit the backend's operator syntax.
// Dependencies: crate::core, crate::interfaces
// ============================================================================

//! ## Overview
//! Each compiler function validates one filter family and returns its wire
//! form, or `None` when the filter is absent. Failures are always
//! [`ExperimentError::Validation`] and are raised before any network call.
//!
//! Wire syntax:
//! - tags: `any:a,b` (`OR`) or `contains:a,b` (`AND`)
//! - device components: raw list, or `contains:Q0,Q1`
//! - item type: raw value, or `like:<type>`
//! - sort: `wire_key:direction` entries joined by `,`, primary first
//! - quality: bare wire value, or `in:Bad,Good`
//! - time ranges: `ge:<utc>` and `le:<utc>`

// ============================================================================
// SECTION: Imports
// ============================================================================

use crate::core::device::DeviceComponent;
use crate::core::errors::ExperimentError;
use crate::core::levels::MemberInput;
use crate::core::levels::NamedMember;
use crate::core::levels::ResultQuality;
use crate::core::query::AnalysisResultQuery;
use crate::core::query::ExperimentQuery;
use crate::core::time::DateTimeInput;
use crate::core::time::LocalZone;
use crate::core::time::UtcSuffix;
use crate::interfaces::AnalysisResultListParams;
use crate::interfaces::ComponentFilter;
use crate::interfaces::ExperimentListParams;

// ============================================================================
// SECTION: Sort Key Tables
// ============================================================================

/// Sort keys accepted for experiments, mapped to wire field names.
pub const EXPERIMENT_SORT_KEYS: &[(&str, &str)] =
    &[("start_datetime", "start_time"), ("experiment_type", "type")];

/// Sort keys accepted for analysis results, mapped to wire field names.
pub const ANALYSIS_RESULT_SORT_KEYS: &[(&str, &str)] = &[
    ("creation_datetime", "created_at"),
    ("device_components", "device_components"),
    ("result_type", "type"),
];

// ============================================================================
// SECTION: Filter Families
// ============================================================================

/// Compiles a tag filter.
///
/// # Errors
///
/// Returns [`ExperimentError::Validation`] when the operator is not `AND` or
/// `OR`.
pub fn compile_tags(
    tags: Option<&[String]>,
    operator: &str,
) -> Result<Option<String>, ExperimentError> {
    let Some(tags) = tags.filter(|tags| !tags.is_empty()) else {
        return Ok(None);
    };
    let prefix = if operator.eq_ignore_ascii_case("OR") {
        "any"
    } else if operator.eq_ignore_ascii_case("AND") {
        "contains"
    } else {
        return Err(ExperimentError::Validation(format!(
            "{operator} is not a valid `tags_operator`. Valid values are \"AND\" and \"OR\"."
        )));
    };
    Ok(Some(format!("{prefix}:{}", tags.join(","))))
}

/// Compiles a device component filter.
///
/// # Errors
///
/// Returns [`ExperimentError::Validation`] when an operator other than
/// `contains` is supplied.
pub fn compile_device_components(
    components: Option<&[DeviceComponent]>,
    operator: Option<&str>,
) -> Result<Option<ComponentFilter>, ExperimentError> {
    let Some(components) = components.filter(|components| !components.is_empty()) else {
        return Ok(None);
    };
    let names: Vec<String> = components.iter().map(ToString::to_string).collect();
    match operator {
        None => Ok(Some(ComponentFilter::Exact(names))),
        Some("contains") => Ok(Some(ComponentFilter::Contains(format!(
            "contains:{}",
            names.join(",")
        )))),
        Some(other) => Err(ExperimentError::Validation(format!(
            "{other} is not a valid device_components_operator value. Valid values are None \
             and \"contains\""
        ))),
    }
}

/// Compiles an experiment or result type filter.
///
/// The operator is only applied when a type value is present.
///
/// # Errors
///
/// Returns [`ExperimentError::Validation`] when both are given and the
/// operator is not `like`.
pub fn compile_item_type(
    item_type: Option<&str>,
    operator: Option<&str>,
) -> Result<Option<String>, ExperimentError> {
    match (item_type, operator) {
        (Some(value), Some("like")) => Ok(Some(format!("like:{value}"))),
        (Some(_), Some(other)) => Err(ExperimentError::Validation(format!(
            "\"{other}\" is not a valid type operator value. Valid values are None and \"like\"."
        ))),
        (value, _) => Ok(value.map(ToString::to_string)),
    }
}

/// Compiles sort specs using a key table of `(caller key, wire key)` pairs.
///
/// # Errors
///
/// Returns [`ExperimentError::Validation`] for malformed specs, unknown keys,
/// or directions other than `asc` and `desc`.
pub fn compile_sort<S: AsRef<str>>(
    specs: &[S],
    keys: &[(&str, &str)],
) -> Result<Option<String>, ExperimentError> {
    if specs.is_empty() {
        return Ok(None);
    }
    let mut compiled = Vec::with_capacity(specs.len());
    for spec in specs {
        let spec = spec.as_ref();
        let Some((key, direction)) = spec.split_once(':').filter(|(_, rest)| !rest.contains(':'))
        else {
            return Err(ExperimentError::Validation(format!(
                "\"{spec}\" is not a valid sort spec. Expected \"key:direction\"."
            )));
        };
        let key = key.trim().to_lowercase();
        let Some((_, wire_key)) = keys.iter().find(|(name, _)| *name == key) else {
            let valid: Vec<&str> = keys.iter().map(|(name, _)| *name).collect();
            return Err(ExperimentError::Validation(format!(
                "\"{key}\" is not a valid sort key. Valid sort keys are {}",
                valid.join(", ")
            )));
        };
        let direction = direction.trim();
        if direction != "asc" && direction != "desc" {
            return Err(ExperimentError::Validation(format!(
                "\"{direction}\" is not a valid sorting direction. Valid directions are \"asc\" \
                 and \"desc\"."
            )));
        }
        compiled.push(format!("{wire_key}:{direction}"));
    }
    Ok(Some(compiled.join(",")))
}

/// Compiles a quality filter.
///
/// # Errors
///
/// Returns [`ExperimentError::Validation`] for unknown quality names.
pub fn compile_quality(
    qualities: &[MemberInput<ResultQuality>],
) -> Result<Option<String>, ExperimentError> {
    let mut wire_values: Vec<&'static str> = Vec::new();
    for quality in qualities {
        let wire = quality.resolve()?.wire_value();
        if !wire_values.contains(&wire) {
            wire_values.push(wire);
        }
    }
    match wire_values.len() {
        0 => Ok(None),
        1 => Ok(wire_values.first().map(|wire| (*wire).to_string())),
        n if n == ResultQuality::members().len() => Ok(None),
        _ => Ok(Some(format!("in:{}", wire_values.join(",")))),
    }
}

/// Rejects a pair of mutually exclusive flags that are both set.
///
/// # Errors
///
/// Returns [`ExperimentError::Validation`] when both flags are true.
pub fn check_exclusive(
    left: (&str, bool),
    right: (&str, bool),
) -> Result<(), ExperimentError> {
    if left.1 && right.1 {
        return Err(ExperimentError::Validation(format!(
            "{} and {} cannot both be true",
            left.0, right.0
        )));
    }
    Ok(())
}

/// Checks that narrower scopes are only given together with wider ones.
///
/// # Errors
///
/// Returns [`ExperimentError::Validation`] naming the missing scopes.
pub fn check_scope(
    hub: Option<&str>,
    group: Option<&str>,
    project: Option<&str>,
) -> Result<(), ExperimentError> {
    let levels = [("project", project), ("group", group), ("hub", hub)];
    for (index, (name, value)) in levels.iter().enumerate() {
        let wider = levels.get(index + 1..).unwrap_or_default();
        if value.is_some() && wider.iter().any(|(_, wider_value)| wider_value.is_none()) {
            let required: Vec<&str> = wider.iter().map(|(wider_name, _)| *wider_name).collect();
            return Err(ExperimentError::Validation(format!(
                "If {name} is specified, {} must also be specified.",
                required.join(" and ")
            )));
        }
    }
    Ok(())
}

/// Compiles an optional time range into `ge:`/`le:` UTC filters.
///
/// # Errors
///
/// Returns [`ExperimentError::Validation`] when a bound cannot be converted.
pub fn compile_time_range(
    zone: LocalZone,
    after: Option<&DateTimeInput>,
    before: Option<&DateTimeInput>,
) -> Result<Vec<String>, ExperimentError> {
    let mut filters = Vec::new();
    if let Some(after) = after {
        filters.push(format!("ge:{}", zone.local_to_utc_string(after.clone(), UtcSuffix::Z)?));
    }
    if let Some(before) = before {
        filters.push(format!("le:{}", zone.local_to_utc_string(before.clone(), UtcSuffix::Z)?));
    }
    Ok(filters)
}

/// Validates a caller limit; `None` means unbounded.
///
/// # Errors
///
/// Returns [`ExperimentError::Validation`] for zero or negative limits.
pub fn validate_limit(limit: Option<i64>) -> Result<Option<u64>, ExperimentError> {
    match limit {
        None => Ok(None),
        Some(value) => u64::try_from(value).ok().filter(|value| *value > 0).map(Some).ok_or_else(
            || {
                ExperimentError::Validation(format!(
                    "{value} is not a valid `limit`, which has to be a positive integer."
                ))
            },
        ),
    }
}

// ============================================================================
// SECTION: Query Compilation
// ============================================================================

/// Compiles an experiment query into first-page list parameters.
///
/// # Errors
///
/// Returns [`ExperimentError::Validation`] when any filter is invalid.
pub fn compile_experiment_query(
    query: &ExperimentQuery,
    zone: LocalZone,
) -> Result<ExperimentListParams, ExperimentError> {
    let limit = validate_limit(query.limit)?;
    check_scope(query.hub.as_deref(), query.group.as_deref(), query.project.as_deref())?;
    let start_time = compile_time_range(
        zone,
        query.start_datetime_after.as_ref(),
        query.start_datetime_before.as_ref(),
    )?;
    check_exclusive(("exclude_public", query.exclude_public), ("public_only", query.public_only))?;
    check_exclusive(("exclude_mine", query.exclude_mine), ("mine_only", query.mine_only))?;
    let tags = compile_tags(query.tags.as_deref(), &query.tags_operator)?;
    let sort_by = compile_sort(&query.sort_by, EXPERIMENT_SORT_KEYS)?;
    let device_components = compile_device_components(
        query.device_components.as_deref(),
        query.device_components_operator.as_deref(),
    )?;
    let experiment_type = compile_item_type(
        query.experiment_type.as_deref(),
        query.experiment_type_operator.as_deref(),
    )?;
    Ok(ExperimentListParams {
        limit,
        marker: None,
        backend_name: query.backend_name.clone(),
        experiment_type,
        start_time,
        device_components,
        tags,
        hub: query.hub.clone(),
        group: query.group.clone(),
        project: query.project.clone(),
        exclude_public: query.exclude_public,
        public_only: query.public_only,
        exclude_mine: query.exclude_mine,
        mine_only: query.mine_only,
        parent_id: query.parent_id.clone(),
        sort_by,
    })
}

/// Compiles an analysis result query into first-page list parameters.
///
/// # Errors
///
/// Returns [`ExperimentError::Validation`] when any filter is invalid.
pub fn compile_analysis_result_query(
    query: &AnalysisResultQuery,
    zone: LocalZone,
) -> Result<AnalysisResultListParams, ExperimentError> {
    let limit = validate_limit(query.limit)?;
    let quality = compile_quality(&query.quality)?;
    let created_at = compile_time_range(
        zone,
        query.creation_datetime_after.as_ref(),
        query.creation_datetime_before.as_ref(),
    )?;
    let tags = compile_tags(query.tags.as_deref(), &query.tags_operator)?;
    let sort_by = compile_sort(&query.sort_by, ANALYSIS_RESULT_SORT_KEYS)?;
    let device_components = compile_device_components(
        query.device_components.as_deref(),
        query.device_components_operator.as_deref(),
    )?;
    let result_type =
        compile_item_type(query.result_type.as_deref(), query.result_type_operator.as_deref())?;
    Ok(AnalysisResultListParams {
        limit,
        marker: None,
        backend_name: query.backend_name.clone(),
        device_components,
        experiment_id: query.experiment_id.clone(),
        result_type,
        quality,
        verified: query.verified,
        tags,
        created_at,
        sort_by,
    })
}
