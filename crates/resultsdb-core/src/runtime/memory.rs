// resultsdb-core/src/runtime/memory.rs
// ============================================================================
// Module: ResultsDB In-Memory Client
// Description: In-process ExperimentClient for tests, demos, and local mode.
// Purpose: Emulate the backend contract deterministically without a network.
// Dependencies: crate::core, crate::interfaces, serde_json, time
// ============================================================================

//! ## Overview
//! [`InMemoryExperimentClient`] stores wire records in insertion order and
//! answers list calls with offset markers, applying the compiled filters the
//! way the backend does. It also records every list parameter set and payload
//! it receives, and can be told to fail the next call of an operation with a
//! given [`ClientError`]. It is not intended for production use.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::collections::BTreeSet;
use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::MutexGuard;

use serde_json::Map;
use serde_json::Value;
use serde_json::json;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

use crate::core::errors::ClientError;
use crate::core::identifiers::ExperimentId;
use crate::core::identifiers::ResultId;
use crate::interfaces::AnalysisResultListParams;
use crate::interfaces::ComponentFilter;
use crate::interfaces::ExperimentClient;
use crate::interfaces::ExperimentListParams;
use crate::interfaces::UploadMode;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default number of records per page.
const DEFAULT_PAGE_SIZE: usize = 25;

/// Owner assigned to records created through this client.
pub const LOCAL_OWNER: &str = "local-user";

// ============================================================================
// SECTION: Recorded Calls
// ============================================================================

/// One call received by the client.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedCall {
    /// Operation name (matches the [`ExperimentClient`] method).
    pub operation: &'static str,
    /// Target identifier or name, when the call has one.
    pub target: Option<String>,
    /// JSON payload, when the call has one.
    pub payload: Option<Map<String, Value>>,
}

/// Mutable state behind the client.
#[derive(Debug, Default)]
struct MemoryState {
    /// Experiments in insertion order.
    experiments: Vec<Map<String, Value>>,
    /// Analysis results in insertion order.
    analysis_results: Vec<Map<String, Value>>,
    /// Figures keyed by experiment and name.
    figures: BTreeMap<(String, String), Vec<u8>>,
    /// Data files keyed by experiment and name.
    files: BTreeMap<(String, String), String>,
    /// Backend descriptors.
    devices: Vec<Value>,
    /// Device component descriptors.
    device_components: Vec<Value>,
    /// Injected failures per operation, consumed in order.
    failures: BTreeMap<&'static str, VecDeque<ClientError>>,
    /// Calls in arrival order.
    calls: Vec<RecordedCall>,
    /// Experiment list parameters in arrival order.
    experiment_params: Vec<ExperimentListParams>,
    /// Analysis result list parameters in arrival order.
    analysis_result_params: Vec<AnalysisResultListParams>,
    /// Upload modes of figure calls in arrival order.
    upload_modes: Vec<UploadMode>,
}

// ============================================================================
// SECTION: Client
// ============================================================================

/// In-memory ResultsDB backend.
#[derive(Debug, Clone)]
pub struct InMemoryExperimentClient {
    /// Shared state protected by a mutex.
    state: Arc<Mutex<MemoryState>>,
    /// Maximum records per page.
    page_size: usize,
}

impl Default for InMemoryExperimentClient {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryExperimentClient {
    /// Creates an empty client with the default page size.
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(MemoryState::default())),
            page_size: DEFAULT_PAGE_SIZE,
        }
    }

    /// Returns the client with a different page size (at least one).
    #[must_use]
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    /// Stores a wire experiment as-is.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError`] when the value is not an object or the state
    /// lock is poisoned.
    pub fn insert_experiment(&self, raw: Value) -> Result<(), ClientError> {
        let Value::Object(object) = raw else {
            return Err(ClientError::with_status(400, "experiment must be a JSON object"));
        };
        self.lock()?.experiments.push(object);
        Ok(())
    }

    /// Stores a wire analysis result as-is.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError`] when the value is not an object or the state
    /// lock is poisoned.
    pub fn insert_analysis_result(&self, raw: Value) -> Result<(), ClientError> {
        let Value::Object(object) = raw else {
            return Err(ClientError::with_status(400, "analysis result must be a JSON object"));
        };
        self.lock()?.analysis_results.push(object);
        Ok(())
    }

    /// Registers a backend descriptor.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError`] when the state lock is poisoned.
    pub fn add_device(&self, descriptor: Value) -> Result<(), ClientError> {
        self.lock()?.devices.push(descriptor);
        Ok(())
    }

    /// Registers a device component of a backend.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError`] when the state lock is poisoned.
    pub fn add_device_component(
        &self,
        backend_name: &str,
        component_type: &str,
    ) -> Result<(), ClientError> {
        self.lock()?
            .device_components
            .push(json!({"device_name": backend_name, "type": component_type}));
        Ok(())
    }

    /// Makes the next call of `operation` fail with `error`.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError`] when the state lock is poisoned.
    pub fn fail_next(
        &self,
        operation: &'static str,
        error: ClientError,
    ) -> Result<(), ClientError> {
        self.lock()?.failures.entry(operation).or_default().push_back(error);
        Ok(())
    }

    /// Returns the calls received so far.
    #[must_use]
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.state.lock().map(|state| state.calls.clone()).unwrap_or_default()
    }

    /// Returns the payload of the most recent call of `operation`.
    #[must_use]
    pub fn last_payload(&self, operation: &str) -> Option<Map<String, Value>> {
        self.calls()
            .into_iter()
            .rev()
            .find(|call| call.operation == operation)
            .and_then(|call| call.payload)
    }

    /// Returns the experiment list parameters received so far.
    #[must_use]
    pub fn experiment_list_params(&self) -> Vec<ExperimentListParams> {
        self.state.lock().map(|state| state.experiment_params.clone()).unwrap_or_default()
    }

    /// Returns the analysis result list parameters received so far.
    #[must_use]
    pub fn analysis_result_list_params(&self) -> Vec<AnalysisResultListParams> {
        self.state.lock().map(|state| state.analysis_result_params.clone()).unwrap_or_default()
    }

    /// Returns the upload modes of figure uploads and updates so far.
    #[must_use]
    pub fn upload_modes(&self) -> Vec<UploadMode> {
        self.state.lock().map(|state| state.upload_modes.clone()).unwrap_or_default()
    }

    /// Returns the number of calls received by `operation`, including reads.
    #[must_use]
    pub fn call_count(&self, operation: &str) -> usize {
        self.calls().iter().filter(|call| call.operation == operation).count()
    }

    /// Locks the state, mapping poisoning to a transport error.
    fn lock(&self) -> Result<MutexGuard<'_, MemoryState>, ClientError> {
        self.state
            .lock()
            .map_err(|_| ClientError::transport("in-memory client state lock poisoned"))
    }

    /// Locks the state, records the call, and consumes an injected failure.
    fn begin(
        &self,
        operation: &'static str,
        target: Option<&str>,
        payload: Option<&Map<String, Value>>,
    ) -> Result<MutexGuard<'_, MemoryState>, ClientError> {
        let mut state = self.lock()?;
        state.calls.push(RecordedCall {
            operation,
            target: target.map(ToString::to_string),
            payload: payload.cloned(),
        });
        if let Some(error) = state.failures.get_mut(operation).and_then(VecDeque::pop_front) {
            return Err(error);
        }
        Ok(state)
    }
}

// ============================================================================
// SECTION: ExperimentClient Implementation
// ============================================================================

impl ExperimentClient for InMemoryExperimentClient {
    fn experiments(&self, params: &ExperimentListParams) -> Result<Value, ClientError> {
        let mut state = self.begin("experiments", None, None)?;
        state.experiment_params.push(params.clone());
        let mut matching: Vec<&Map<String, Value>> =
            state.experiments.iter().filter(|item| experiment_matches(item, params)).collect();
        sort_records(&mut matching, params.sort_by.as_deref());
        paginate("experiments", &matching, params.marker.as_deref(), params.limit, self.page_size)
    }

    fn experiment_get(&self, experiment_id: &ExperimentId) -> Result<Value, ClientError> {
        let state = self.begin("experiment_get", Some(experiment_id.as_str()), None)?;
        find_by_uuid(&state.experiments, experiment_id.as_str())
            .map(|item| Value::Object(item.clone()))
            .ok_or_else(|| not_found("Experiment", experiment_id.as_str()))
    }

    fn experiment_upload(&self, payload: &Map<String, Value>) -> Result<Value, ClientError> {
        let mut state = self.begin("experiment_upload", None, Some(payload))?;
        let uuid = match payload.get("uuid").and_then(Value::as_str) {
            Some(uuid) if find_by_uuid(&state.experiments, uuid).is_some() => {
                return Err(ClientError::with_status(409, format!("Experiment {uuid} exists")));
            }
            Some(uuid) => uuid.to_string(),
            None => ExperimentId::generate().to_string(),
        };
        let mut record = payload.clone();
        let now = now_utc_text();
        record.insert("uuid".to_string(), Value::String(uuid.clone()));
        record.entry("jobs").or_insert_with(|| Value::Array(Vec::new()));
        record.entry("visibility").or_insert_with(|| Value::String("private".to_string()));
        record.insert("owner".to_string(), Value::String(LOCAL_OWNER.to_string()));
        record.insert("created_at".to_string(), Value::String(now.clone()));
        record.insert("updated_at".to_string(), Value::String(now));
        state.experiments.push(record);
        Ok(json!({"uuid": uuid}))
    }

    fn experiment_update(
        &self,
        experiment_id: &ExperimentId,
        payload: &Map<String, Value>,
    ) -> Result<(), ClientError> {
        let mut state =
            self.begin("experiment_update", Some(experiment_id.as_str()), Some(payload))?;
        let record = find_by_uuid_mut(&mut state.experiments, experiment_id.as_str())
            .ok_or_else(|| not_found("Experiment", experiment_id.as_str()))?;
        for (key, value) in payload {
            record.insert(key.clone(), value.clone());
        }
        record.insert("updated_at".to_string(), Value::String(now_utc_text()));
        Ok(())
    }

    fn experiment_delete(&self, experiment_id: &ExperimentId) -> Result<(), ClientError> {
        let mut state = self.begin("experiment_delete", Some(experiment_id.as_str()), None)?;
        let id = experiment_id.as_str();
        if find_by_uuid(&state.experiments, id).is_none() {
            return Err(not_found("Experiment", id));
        }
        state.experiments.retain(|item| uuid_of(item) != Some(id));
        state
            .analysis_results
            .retain(|item| item.get("experiment_uuid").and_then(Value::as_str) != Some(id));
        state.figures.retain(|(owner, _), _| owner != id);
        state.files.retain(|(owner, _), _| owner != id);
        Ok(())
    }

    fn analysis_results(&self, params: &AnalysisResultListParams) -> Result<Value, ClientError> {
        let mut state = self.begin("analysis_results", None, None)?;
        state.analysis_result_params.push(params.clone());
        let mut matching: Vec<&Map<String, Value>> = state
            .analysis_results
            .iter()
            .filter(|item| analysis_result_matches(item, params))
            .collect();
        sort_records(&mut matching, params.sort_by.as_deref());
        paginate(
            "analysis_results",
            &matching,
            params.marker.as_deref(),
            params.limit,
            self.page_size,
        )
    }

    fn analysis_result_get(&self, result_id: &ResultId) -> Result<Value, ClientError> {
        let state = self.begin("analysis_result_get", Some(result_id.as_str()), None)?;
        find_by_uuid(&state.analysis_results, result_id.as_str())
            .map(|item| Value::Object(item.clone()))
            .ok_or_else(|| not_found("Analysis result", result_id.as_str()))
    }

    fn analysis_result_create(&self, payload: &Map<String, Value>) -> Result<Value, ClientError> {
        let mut state = self.begin("analysis_result_create", None, Some(payload))?;
        let experiment_id =
            payload.get("experiment_uuid").and_then(Value::as_str).unwrap_or_default().to_string();
        let Some(device_name) = find_by_uuid(&state.experiments, &experiment_id)
            .and_then(|experiment| experiment.get("device_name").cloned())
        else {
            return Err(ClientError::with_status(
                400,
                format!("Experiment {experiment_id} does not exist"),
            ));
        };
        let uuid = match payload.get("uuid").and_then(Value::as_str) {
            Some(uuid) if find_by_uuid(&state.analysis_results, uuid).is_some() => {
                return Err(ClientError::with_status(
                    409,
                    format!("Analysis result {uuid} exists"),
                ));
            }
            Some(uuid) => uuid.to_string(),
            None => ResultId::generate().to_string(),
        };
        let mut record = payload.clone();
        let now = now_utc_text();
        record.insert("uuid".to_string(), Value::String(uuid.clone()));
        record.insert("device_name".to_string(), device_name);
        record.insert("created_at".to_string(), Value::String(now.clone()));
        record.insert("updated_at".to_string(), Value::String(now));
        state.analysis_results.push(record);
        Ok(json!({"uuid": uuid}))
    }

    fn analysis_result_update(
        &self,
        result_id: &ResultId,
        payload: &Map<String, Value>,
    ) -> Result<(), ClientError> {
        let mut state =
            self.begin("analysis_result_update", Some(result_id.as_str()), Some(payload))?;
        let record = find_by_uuid_mut(&mut state.analysis_results, result_id.as_str())
            .ok_or_else(|| not_found("Analysis result", result_id.as_str()))?;
        for (key, value) in payload {
            record.insert(key.clone(), value.clone());
        }
        record.insert("updated_at".to_string(), Value::String(now_utc_text()));
        Ok(())
    }

    fn analysis_result_delete(&self, result_id: &ResultId) -> Result<(), ClientError> {
        let mut state = self.begin("analysis_result_delete", Some(result_id.as_str()), None)?;
        let id = result_id.as_str();
        if find_by_uuid(&state.analysis_results, id).is_none() {
            return Err(not_found("Analysis result", id));
        }
        state.analysis_results.retain(|item| uuid_of(item) != Some(id));
        Ok(())
    }

    fn figure_upload(
        &self,
        experiment_id: &ExperimentId,
        figure_name: &str,
        figure: &[u8],
        mode: UploadMode,
    ) -> Result<Value, ClientError> {
        let mut state = self.begin("figure_upload", Some(figure_name), None)?;
        state.upload_modes.push(mode);
        let id = experiment_id.as_str();
        let key = (id.to_string(), figure_name.to_string());
        if state.figures.contains_key(&key) {
            return Err(ClientError::with_status(409, format!("Figure {figure_name} exists")));
        }
        let experiment = find_by_uuid_mut(&mut state.experiments, id)
            .ok_or_else(|| not_found("Experiment", id))?;
        let names = experiment.entry("plot_names").or_insert_with(|| Value::Array(Vec::new()));
        if let Value::Array(names) = names {
            names.push(Value::String(figure_name.to_string()));
        }
        state.figures.insert(key, figure.to_vec());
        Ok(json!({"name": figure_name, "size": figure.len()}))
    }

    fn figure_update(
        &self,
        experiment_id: &ExperimentId,
        figure_name: &str,
        figure: &[u8],
        mode: UploadMode,
    ) -> Result<Value, ClientError> {
        let mut state = self.begin("figure_update", Some(figure_name), None)?;
        state.upload_modes.push(mode);
        let key = (experiment_id.to_string(), figure_name.to_string());
        let stored = state.figures.get_mut(&key).ok_or_else(|| not_found("Figure", figure_name))?;
        *stored = figure.to_vec();
        Ok(json!({"name": figure_name, "size": figure.len()}))
    }

    fn figure_get(
        &self,
        experiment_id: &ExperimentId,
        figure_name: &str,
    ) -> Result<Vec<u8>, ClientError> {
        let state = self.begin("figure_get", Some(figure_name), None)?;
        state
            .figures
            .get(&(experiment_id.to_string(), figure_name.to_string()))
            .cloned()
            .ok_or_else(|| not_found("Figure", figure_name))
    }

    fn figure_delete(
        &self,
        experiment_id: &ExperimentId,
        figure_name: &str,
    ) -> Result<(), ClientError> {
        let mut state = self.begin("figure_delete", Some(figure_name), None)?;
        let key = (experiment_id.to_string(), figure_name.to_string());
        if state.figures.remove(&key).is_none() {
            return Err(not_found("Figure", figure_name));
        }
        if let Some(Value::Array(names)) =
            find_by_uuid_mut(&mut state.experiments, experiment_id.as_str())
                .and_then(|experiment| experiment.get_mut("plot_names"))
        {
            names.retain(|name| name.as_str() != Some(figure_name));
        }
        Ok(())
    }

    fn files(&self, experiment_id: &ExperimentId) -> Result<Value, ClientError> {
        let state = self.begin("files", Some(experiment_id.as_str()), None)?;
        let id = experiment_id.as_str();
        if find_by_uuid(&state.experiments, id).is_none() {
            return Err(not_found("Experiment", id));
        }
        let files: Vec<Value> = state
            .files
            .iter()
            .filter(|((owner, _), _)| owner == id)
            .map(|((_, name), contents)| json!({"Key": name, "Size": contents.len()}))
            .collect();
        Ok(json!({"files": files}))
    }

    fn file_upload(
        &self,
        experiment_id: &ExperimentId,
        file_name: &str,
        contents: &str,
    ) -> Result<(), ClientError> {
        let mut state = self.begin("file_upload", Some(file_name), None)?;
        let id = experiment_id.as_str();
        if find_by_uuid(&state.experiments, id).is_none() {
            return Err(not_found("Experiment", id));
        }
        state.files.insert((id.to_string(), file_name.to_string()), contents.to_string());
        Ok(())
    }

    fn file_download(
        &self,
        experiment_id: &ExperimentId,
        file_name: &str,
    ) -> Result<String, ClientError> {
        let state = self.begin("file_download", Some(file_name), None)?;
        state
            .files
            .get(&(experiment_id.to_string(), file_name.to_string()))
            .cloned()
            .ok_or_else(|| not_found("File", file_name))
    }

    fn devices(&self) -> Result<Value, ClientError> {
        let state = self.begin("devices", None, None)?;
        Ok(Value::Array(state.devices.clone()))
    }

    fn device_components(&self, backend_name: Option<&str>) -> Result<Value, ClientError> {
        let state = self.begin("device_components", backend_name, None)?;
        let components = state
            .device_components
            .iter()
            .filter(|entry| {
                backend_name.is_none_or(|name| {
                    entry.get("device_name").and_then(Value::as_str) == Some(name)
                })
            })
            .cloned()
            .collect();
        Ok(Value::Array(components))
    }
}

// ============================================================================
// SECTION: Filtering
// ============================================================================

/// Returns true when an experiment satisfies the list parameters.
fn experiment_matches(item: &Map<String, Value>, params: &ExperimentListParams) -> bool {
    let visibility = str_field(item, "visibility");
    let owner = str_field(item, "owner");
    equals_if_set(item, "device_name", params.backend_name.as_deref())
        && type_matches(item, params.experiment_type.as_deref())
        && tags_match(item, params.tags.as_deref())
        && components_match(item, params.device_components.as_ref())
        && equals_if_set(item, "hub_id", params.hub.as_deref())
        && equals_if_set(item, "group_id", params.group.as_deref())
        && equals_if_set(item, "project_id", params.project.as_deref())
        && equals_if_set(
            item,
            "parent_experiment_uuid",
            params.parent_id.as_ref().map(ExperimentId::as_str),
        )
        && !(params.exclude_public && visibility == Some("public"))
        && (!params.public_only || visibility == Some("public"))
        && !(params.exclude_mine && owner == Some(LOCAL_OWNER))
        && (!params.mine_only || owner == Some(LOCAL_OWNER))
        && range_matches(item, "start_time", &params.start_time)
}

/// Returns true when an analysis result satisfies the list parameters.
fn analysis_result_matches(item: &Map<String, Value>, params: &AnalysisResultListParams) -> bool {
    equals_if_set(item, "device_name", params.backend_name.as_deref())
        && equals_if_set(
            item,
            "experiment_uuid",
            params.experiment_id.as_ref().map(ExperimentId::as_str),
        )
        && type_matches(item, params.result_type.as_deref())
        && quality_matches(item, params.quality.as_deref())
        && params
            .verified
            .is_none_or(|verified| item.get("verified").and_then(Value::as_bool) == Some(verified))
        && tags_match(item, params.tags.as_deref())
        && components_match(item, params.device_components.as_ref())
        && range_matches(item, "created_at", &params.created_at)
}

/// Reads a string field.
fn str_field<'a>(item: &'a Map<String, Value>, key: &str) -> Option<&'a str> {
    item.get(key).and_then(Value::as_str)
}

/// Reads an array-of-strings field.
fn str_list<'a>(item: &'a Map<String, Value>, key: &str) -> Vec<&'a str> {
    item.get(key)
        .and_then(Value::as_array)
        .map(|values| values.iter().filter_map(Value::as_str).collect())
        .unwrap_or_default()
}

/// Matches a string field against an optional expected value.
fn equals_if_set(item: &Map<String, Value>, key: &str, expected: Option<&str>) -> bool {
    expected.is_none_or(|expected| str_field(item, key) == Some(expected))
}

/// Matches `type` against a raw or `like:` filter.
fn type_matches(item: &Map<String, Value>, filter: Option<&str>) -> bool {
    let Some(filter) = filter else {
        return true;
    };
    let actual = str_field(item, "type").unwrap_or_default();
    match filter.strip_prefix("like:") {
        Some(fragment) => actual.contains(fragment),
        None => actual == filter,
    }
}

/// Matches tags against an `any:` or `contains:` filter.
fn tags_match(item: &Map<String, Value>, filter: Option<&str>) -> bool {
    let Some(filter) = filter else {
        return true;
    };
    let tags = str_list(item, "tags");
    if let Some(wanted) = filter.strip_prefix("any:") {
        return wanted.split(',').any(|tag| tags.contains(&tag));
    }
    if let Some(wanted) = filter.strip_prefix("contains:") {
        return wanted.split(',').all(|tag| tags.contains(&tag));
    }
    false
}

/// Matches device components against an exact or `contains:` filter.
fn components_match(item: &Map<String, Value>, filter: Option<&ComponentFilter>) -> bool {
    let actual: BTreeSet<&str> = str_list(item, "device_components").into_iter().collect();
    match filter {
        None => true,
        Some(ComponentFilter::Exact(expected)) => {
            actual == expected.iter().map(String::as_str).collect::<BTreeSet<&str>>()
        }
        Some(ComponentFilter::Contains(encoded)) => encoded
            .strip_prefix("contains:")
            .is_some_and(|wanted| wanted.split(',').all(|component| actual.contains(component))),
    }
}

/// Matches quality against a bare or `in:` filter.
fn quality_matches(item: &Map<String, Value>, filter: Option<&str>) -> bool {
    let Some(filter) = filter else {
        return true;
    };
    let actual = str_field(item, "quality").unwrap_or_default();
    match filter.strip_prefix("in:") {
        Some(values) => values.split(',').any(|value| value == actual),
        None => actual == filter,
    }
}

/// Matches a timestamp field against `ge:`/`le:` filters.
fn range_matches(item: &Map<String, Value>, key: &str, filters: &[String]) -> bool {
    if filters.is_empty() {
        return true;
    }
    let Some(actual) = str_field(item, key).and_then(parse_utc) else {
        return false;
    };
    filters.iter().all(|filter| {
        if let Some(bound) = filter.strip_prefix("ge:").and_then(parse_utc) {
            actual >= bound
        } else if let Some(bound) = filter.strip_prefix("le:").and_then(parse_utc) {
            actual <= bound
        } else {
            false
        }
    })
}

/// Parses an RFC 3339 timestamp.
fn parse_utc(text: &str) -> Option<OffsetDateTime> {
    OffsetDateTime::parse(text, &Rfc3339).ok()
}

// ============================================================================
// SECTION: Sorting and Paging
// ============================================================================

/// Stable-sorts records by comma-joined `wire_key:direction` specs.
fn sort_records(records: &mut [&Map<String, Value>], sort_by: Option<&str>) {
    let Some(sort_by) = sort_by else {
        return;
    };
    let specs: Vec<(&str, bool)> = sort_by
        .split(',')
        .filter_map(|spec| spec.split_once(':'))
        .map(|(key, direction)| (key, direction == "desc"))
        .collect();
    records.sort_by(|left, right| {
        specs
            .iter()
            .map(|(key, descending)| {
                let ordering = sort_key(left, key).cmp(&sort_key(right, key));
                if *descending { ordering.reverse() } else { ordering }
            })
            .find(|ordering| *ordering != Ordering::Equal)
            .unwrap_or(Ordering::Equal)
    });
}

/// Returns a comparable text form of a field.
fn sort_key(record: &Map<String, Value>, key: &str) -> String {
    match record.get(key) {
        Some(Value::String(text)) => text.clone(),
        Some(other) => other.to_string(),
        None => String::new(),
    }
}

/// Builds one list page starting at the offset encoded in `marker`.
fn paginate(
    list_key: &str,
    records: &[&Map<String, Value>],
    marker: Option<&str>,
    limit: Option<u64>,
    page_size: usize,
) -> Result<Value, ClientError> {
    let offset = match marker {
        None => 0,
        Some(marker) => marker
            .parse::<usize>()
            .map_err(|_| ClientError::with_status(400, format!("invalid marker \"{marker}\"")))?,
    };
    let wanted = limit.map_or(page_size, |limit| {
        page_size.min(usize::try_from(limit).unwrap_or(usize::MAX))
    });
    let page: Vec<Value> = records
        .iter()
        .skip(offset)
        .take(wanted)
        .map(|record| Value::Object((*record).clone()))
        .collect();
    let next = offset + page.len();
    let mut response = Map::new();
    response.insert(list_key.to_string(), Value::Array(page));
    if next < records.len() {
        response.insert("marker".to_string(), Value::String(next.to_string()));
    }
    Ok(Value::Object(response))
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Returns the `uuid` field of a record.
fn uuid_of(record: &Map<String, Value>) -> Option<&str> {
    str_field(record, "uuid")
}

/// Finds a record by `uuid`.
fn find_by_uuid<'a>(
    records: &'a [Map<String, Value>],
    uuid: &str,
) -> Option<&'a Map<String, Value>> {
    records.iter().find(|record| uuid_of(record) == Some(uuid))
}

/// Finds a mutable record by `uuid`.
fn find_by_uuid_mut<'a>(
    records: &'a mut [Map<String, Value>],
    uuid: &str,
) -> Option<&'a mut Map<String, Value>> {
    records.iter_mut().find(|record| uuid_of(record) == Some(uuid))
}

/// Builds a 404 transport error.
fn not_found(kind: &str, name: &str) -> ClientError {
    ClientError::with_status(404, format!("{kind} {name} not found"))
}

/// Returns the current UTC time as RFC 3339 text.
fn now_utc_text() -> String {
    OffsetDateTime::now_utc().format(&Rfc3339).unwrap_or_default()
}
