// resultsdb-core/src/runtime/service.rs
// ============================================================================
// Module: ResultsDB Experiment Service
// Description: Caller-facing operations over an ExperimentClient.
// Purpose: Compose filters, error mapping, conversion, and pagination.
// Dependencies: crate::core, crate::interfaces, crate::runtime
// ============================================================================

//! ## Overview
//! [`ExperimentService`] owns one [`ExperimentClient`] and one
//! [`AccountContext`], so several independent services can coexist in a
//! process. Every operation follows the same path: validate and compile caller
//! input, make one transport call per round trip inside the error mapper, and
//! decode the response.
//!
//! Deletes ask a [`DeleteConfirmation`] first when `prompt_for_delete` is on
//! and treat a missing target as already deleted. Updates with no fields are
//! skipped without a network call.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::io;
use std::io::BufRead;
use std::io::Write;
use std::path::Path;
use std::sync::Arc;

use serde_json::Map;
use serde_json::Value;
use time::OffsetDateTime;

use crate::core::errors::ExperimentError;
use crate::core::identifiers::ExperimentId;
use crate::core::identifiers::ResultId;
use crate::core::naming::data_file_name;
use crate::core::naming::figure_file_name;
use crate::core::naming::generated_figure_name;
use crate::core::query::AnalysisResultQuery;
use crate::core::query::ExperimentQuery;
use crate::core::records::AccountContext;
use crate::core::records::AnalysisResultDraft;
use crate::core::records::AnalysisResultRecord;
use crate::core::records::AnalysisResultUpdate;
use crate::core::records::DeleteOutcome;
use crate::core::records::ExperimentDraft;
use crate::core::records::ExperimentRecord;
use crate::core::records::ExperimentUpdate;
use crate::core::records::FigureReceipt;
use crate::core::records::FileData;
use crate::core::records::UpdateOutcome;
use crate::core::time::LocalZone;
use crate::interfaces::AnalysisResultListParams;
use crate::interfaces::ExperimentClient;
use crate::interfaces::ExperimentListParams;
use crate::interfaces::UploadMode;
use crate::runtime::convert::ANALYSIS_RESULTS_KEY;
use crate::runtime::convert::EXPERIMENTS_KEY;
use crate::runtime::convert::decode_analysis_result;
use crate::runtime::convert::decode_experiment;
use crate::runtime::convert::decode_figure_receipt;
use crate::runtime::convert::encode_analysis_result_draft;
use crate::runtime::convert::encode_analysis_result_update;
use crate::runtime::convert::encode_experiment_draft;
use crate::runtime::convert::encode_experiment_update;
use crate::runtime::convert::extract_created_id;
use crate::runtime::convert::extract_page;
use crate::runtime::convert::group_device_components;
use crate::runtime::error_map::map_api_error;
use crate::runtime::error_map::map_delete_error;
use crate::runtime::filters::compile_analysis_result_query;
use crate::runtime::filters::compile_experiment_query;
use crate::runtime::paginator::Page;
use crate::runtime::paginator::collect_pages;
use crate::runtime::telemetry::EventLevel;
use crate::runtime::telemetry::ServiceEvent;
use crate::runtime::telemetry::ServiceEventSink;
use crate::runtime::telemetry::StderrEventSink;
use crate::runtime::telemetry::sink_from_env;

// ============================================================================
// SECTION: Delete Confirmation
// ============================================================================

/// Approves destructive operations before they reach the network.
pub trait DeleteConfirmation: Send + Sync {
    /// Returns true when the delete described by `prompt` may proceed.
    fn confirm(&self, prompt: &str) -> bool;
}

/// Asks on stdin; only `y` or `Y` approves.
pub struct StdinConfirmation;

impl DeleteConfirmation for StdinConfirmation {
    fn confirm(&self, prompt: &str) -> bool {
        let mut stdout = io::stdout();
        let _ = write!(stdout, "\n{prompt}");
        let _ = stdout.flush();
        let mut answer = String::new();
        if io::stdin().lock().read_line(&mut answer).is_err() {
            return false;
        }
        matches!(answer.trim_end_matches(['\r', '\n']), "y" | "Y")
    }
}

/// Gives the same answer to every prompt.
#[derive(Debug, Clone, Copy)]
pub struct FixedConfirmation(pub bool);

impl DeleteConfirmation for FixedConfirmation {
    fn confirm(&self, _prompt: &str) -> bool {
        self.0
    }
}

/// Prompt shown before deleting an experiment.
const DELETE_EXPERIMENT_PROMPT: &str = "Are you sure you want to delete the experiment? Results \
                                        and plots for the experiment will also be deleted. [y/N]: ";
/// Prompt shown before deleting an analysis result.
const DELETE_ANALYSIS_RESULT_PROMPT: &str =
    "Are you sure you want to delete the analysis result? [y/N]: ";
/// Prompt shown before deleting a figure.
const DELETE_FIGURE_PROMPT: &str = "Are you sure you want to delete the experiment plot? [y/N]: ";

// ============================================================================
// SECTION: Options
// ============================================================================

/// Behavior switches of a service instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServiceOptions {
    /// Require confirmation before deletes.
    pub prompt_for_delete: bool,
    /// Local zone used for caller-facing timestamps.
    pub zone: LocalZone,
}

impl Default for ServiceOptions {
    fn default() -> Self {
        Self {
            prompt_for_delete: true,
            zone: LocalZone::system(),
        }
    }
}

// ============================================================================
// SECTION: Service
// ============================================================================

/// Experiment and analysis result operations over a transport client.
pub struct ExperimentService<C> {
    /// Transport collaborator.
    client: C,
    /// Account context used by every operation.
    account: AccountContext,
    /// Behavior switches.
    options: ServiceOptions,
    /// Delete approval collaborator.
    confirmation: Box<dyn DeleteConfirmation>,
    /// Structured event sink.
    events: Arc<dyn ServiceEventSink>,
}

impl<C: ExperimentClient> ExperimentService<C> {
    /// Creates a service with default options, stdin confirmation, and the
    /// environment-configured event sink.
    #[must_use]
    pub fn new(client: C, account: AccountContext) -> Self {
        let events = sink_from_env().unwrap_or_else(|_| Arc::new(StderrEventSink));
        Self {
            client,
            account,
            options: ServiceOptions::default(),
            confirmation: Box::new(StdinConfirmation),
            events,
        }
    }

    /// Replaces the options.
    #[must_use]
    pub const fn with_options(mut self, options: ServiceOptions) -> Self {
        self.options = options;
        self
    }

    /// Replaces the local zone.
    #[must_use]
    pub const fn with_zone(mut self, zone: LocalZone) -> Self {
        self.options.zone = zone;
        self
    }

    /// Enables or disables delete confirmation.
    #[must_use]
    pub const fn with_prompt_for_delete(mut self, prompt: bool) -> Self {
        self.options.prompt_for_delete = prompt;
        self
    }

    /// Replaces the delete confirmation collaborator.
    #[must_use]
    pub fn with_confirmation(mut self, confirmation: impl DeleteConfirmation + 'static) -> Self {
        self.confirmation = Box::new(confirmation);
        self
    }

    /// Replaces the event sink.
    #[must_use]
    pub fn with_event_sink(mut self, events: Arc<dyn ServiceEventSink>) -> Self {
        self.events = events;
        self
    }

    /// Returns the transport client.
    #[must_use]
    pub const fn client(&self) -> &C {
        &self.client
    }

    /// Returns the account context.
    #[must_use]
    pub const fn account(&self) -> &AccountContext {
        &self.account
    }

    /// Returns the options.
    #[must_use]
    pub const fn options(&self) -> &ServiceOptions {
        &self.options
    }

    /// Returns the application preferences of the account.
    #[must_use]
    pub const fn preferences(&self) -> &Map<String, Value> {
        &self.account.preferences
    }

    // ------------------------------------------------------------------------
    // Backends
    // ------------------------------------------------------------------------

    /// Lists the backends that can be used for experiments.
    ///
    /// # Errors
    ///
    /// Returns [`ExperimentError`] when the call fails or the response is not
    /// an array.
    pub fn backends(&self) -> Result<Vec<Value>, ExperimentError> {
        let response = map_api_error("Backends call failed.", || self.client.devices())?;
        match response {
            Value::Array(backends) => Ok(backends),
            _ => Err(ExperimentError::Protocol("devices response is not an array".to_string())),
        }
    }

    /// Returns device component types grouped by backend name.
    ///
    /// With `backend_name`, only that backend's entry is present.
    ///
    /// # Errors
    ///
    /// Returns [`ExperimentError`] when the call fails or an entry is malformed.
    pub fn device_components(
        &self,
        backend_name: Option<&str>,
    ) -> Result<BTreeMap<String, Vec<String>>, ExperimentError> {
        let context = format!(
            "Device components call for backend {} failed.",
            backend_name.unwrap_or("None")
        );
        let response = map_api_error(&context, || self.client.device_components(backend_name))?;
        let mut grouped = group_device_components(&response)?;
        if let Some(name) = backend_name {
            grouped.retain(|backend, _| backend == name);
        }
        Ok(grouped)
    }

    /// Returns the device component types of one backend.
    ///
    /// # Errors
    ///
    /// Returns [`ExperimentError`] when the call fails or an entry is malformed.
    pub fn backend_device_components(
        &self,
        backend_name: &str,
    ) -> Result<Vec<String>, ExperimentError> {
        Ok(self.device_components(Some(backend_name))?.remove(backend_name).unwrap_or_default())
    }

    // ------------------------------------------------------------------------
    // Experiments
    // ------------------------------------------------------------------------

    /// Creates an experiment and returns its identifier.
    ///
    /// # Errors
    ///
    /// Returns [`ExperimentError::Validation`] for invalid input,
    /// [`ExperimentError::AlreadyExists`] when the id is taken, or another
    /// [`ExperimentError`] when the call fails.
    pub fn create_experiment(
        &self,
        draft: &ExperimentDraft,
    ) -> Result<ExperimentId, ExperimentError> {
        let payload = encode_experiment_draft(draft, &self.account, self.options.zone)?;
        let context = match &draft.experiment_id {
            Some(id) => format!("Experiment {id} creation failed."),
            None => "Experiment creation failed.".to_string(),
        };
        let response = map_api_error(&context, || self.client.experiment_upload(&payload))?;
        let id = ExperimentId::new(extract_created_id(&response)?);
        self.emit(
            ServiceEvent::new(
                "experiment_created",
                EventLevel::Info,
                "create_experiment",
                "created",
            )
            .with_entity(id.as_str()),
        );
        Ok(id)
    }

    /// Applies a partial update to an experiment.
    ///
    /// # Errors
    ///
    /// Returns [`ExperimentError::NotFound`] when the experiment does not exist,
    /// or another [`ExperimentError`] when validation or the call fails.
    pub fn update_experiment(
        &self,
        experiment_id: &ExperimentId,
        update: &ExperimentUpdate,
    ) -> Result<UpdateOutcome, ExperimentError> {
        let payload = encode_experiment_update(update, self.options.zone)?;
        if payload.is_empty() {
            self.emit(
                ServiceEvent::new(
                    "nothing_to_update",
                    EventLevel::Warning,
                    "update_experiment",
                    "update_experiment() called with nothing to update.",
                )
                .with_entity(experiment_id.as_str()),
            );
            return Ok(UpdateOutcome::NothingToUpdate);
        }
        map_api_error(&format!("Experiment {experiment_id} update failed."), || {
            self.client.experiment_update(experiment_id, &payload)
        })?;
        self.emit(
            ServiceEvent::new(
                "experiment_updated",
                EventLevel::Info,
                "update_experiment",
                "updated",
            )
            .with_entity(experiment_id.as_str()),
        );
        Ok(UpdateOutcome::Applied)
    }

    /// Retrieves one experiment.
    ///
    /// # Errors
    ///
    /// Returns [`ExperimentError::NotFound`] when the experiment does not exist,
    /// [`ExperimentError::Protocol`] for malformed responses, or another
    /// [`ExperimentError`] when the call fails.
    pub fn experiment(
        &self,
        experiment_id: &ExperimentId,
    ) -> Result<ExperimentRecord, ExperimentError> {
        let raw = map_api_error(&format!("Experiment {experiment_id} not found."), || {
            self.client.experiment_get(experiment_id)
        })?;
        decode_experiment(&raw, self.options.zone)
    }

    /// Lists experiments matching `query`, following markers to completion.
    ///
    /// # Errors
    ///
    /// Returns [`ExperimentError::Validation`] before any call for invalid
    /// filters, [`ExperimentError::Protocol`] for malformed pages, or another
    /// [`ExperimentError`] when a call fails.
    pub fn experiments(
        &self,
        query: &ExperimentQuery,
    ) -> Result<Vec<ExperimentRecord>, ExperimentError> {
        let base = compile_experiment_query(query, self.options.zone)?;
        let zone = self.options.zone;
        collect_pages(base.limit, |request| {
            let params = ExperimentListParams {
                limit: request.limit,
                marker: request.marker,
                ..base.clone()
            };
            let response = map_api_error("Request failed.", || self.client.experiments(&params))?;
            let page = extract_page(response, EXPERIMENTS_KEY)?;
            self.emit_page("experiments", page.items.len(), page.marker.is_some());
            let items = page
                .items
                .iter()
                .map(|raw| decode_experiment(raw, zone))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(Page {
                items,
                marker: page.marker,
            })
        })
    }

    /// Deletes an experiment together with its results and figures.
    ///
    /// # Errors
    ///
    /// Returns [`ExperimentError::Api`] for failures other than a missing
    /// experiment.
    pub fn delete_experiment(
        &self,
        experiment_id: &ExperimentId,
    ) -> Result<DeleteOutcome, ExperimentError> {
        self.guarded_delete(
            "delete_experiment",
            DELETE_EXPERIMENT_PROMPT,
            &format!("Experiment {experiment_id} not found."),
            experiment_id.as_str(),
            || self.client.experiment_delete(experiment_id),
        )
    }

    // ------------------------------------------------------------------------
    // Analysis Results
    // ------------------------------------------------------------------------

    /// Creates an analysis result and returns its identifier.
    ///
    /// # Errors
    ///
    /// Returns [`ExperimentError::Validation`] for invalid input,
    /// [`ExperimentError::AlreadyExists`] when the id is taken, or another
    /// [`ExperimentError`] when the call fails.
    pub fn create_analysis_result(
        &self,
        draft: &AnalysisResultDraft,
    ) -> Result<ResultId, ExperimentError> {
        let payload = encode_analysis_result_draft(draft)?;
        let context = match &draft.result_id {
            Some(id) => format!("Analysis result {id} creation failed."),
            None => "Analysis result creation failed.".to_string(),
        };
        let response = map_api_error(&context, || self.client.analysis_result_create(&payload))?;
        let id = ResultId::new(extract_created_id(&response)?);
        self.emit(
            ServiceEvent::new(
                "analysis_result_created",
                EventLevel::Info,
                "create_analysis_result",
                "created",
            )
            .with_entity(id.as_str()),
        );
        Ok(id)
    }

    /// Applies a partial update to an analysis result.
    ///
    /// # Errors
    ///
    /// Returns [`ExperimentError::NotFound`] when the result does not exist, or
    /// another [`ExperimentError`] when validation or the call fails.
    pub fn update_analysis_result(
        &self,
        result_id: &ResultId,
        update: &AnalysisResultUpdate,
    ) -> Result<UpdateOutcome, ExperimentError> {
        let payload = encode_analysis_result_update(update)?;
        if payload.is_empty() {
            self.emit(
                ServiceEvent::new(
                    "nothing_to_update",
                    EventLevel::Warning,
                    "update_analysis_result",
                    "update_analysis_result() called with nothing to update.",
                )
                .with_entity(result_id.as_str()),
            );
            return Ok(UpdateOutcome::NothingToUpdate);
        }
        map_api_error(&format!("Analysis result {result_id} update failed."), || {
            self.client.analysis_result_update(result_id, &payload)
        })?;
        self.emit(
            ServiceEvent::new(
                "analysis_result_updated",
                EventLevel::Info,
                "update_analysis_result",
                "updated",
            )
            .with_entity(result_id.as_str()),
        );
        Ok(UpdateOutcome::Applied)
    }

    /// Retrieves one analysis result.
    ///
    /// # Errors
    ///
    /// Returns [`ExperimentError::NotFound`] when the result does not exist,
    /// [`ExperimentError::Protocol`] for malformed responses, or another
    /// [`ExperimentError`] when the call fails.
    pub fn analysis_result(
        &self,
        result_id: &ResultId,
    ) -> Result<AnalysisResultRecord, ExperimentError> {
        let raw = map_api_error(&format!("Analysis result {result_id} not found."), || {
            self.client.analysis_result_get(result_id)
        })?;
        decode_analysis_result(&raw, self.options.zone)
    }

    /// Lists analysis results matching `query`, following markers to completion.
    ///
    /// # Errors
    ///
    /// Returns [`ExperimentError::Validation`] before any call for invalid
    /// filters, [`ExperimentError::Protocol`] for malformed pages, or another
    /// [`ExperimentError`] when a call fails.
    pub fn analysis_results(
        &self,
        query: &AnalysisResultQuery,
    ) -> Result<Vec<AnalysisResultRecord>, ExperimentError> {
        let base = compile_analysis_result_query(query, self.options.zone)?;
        let zone = self.options.zone;
        collect_pages(base.limit, |request| {
            let params = AnalysisResultListParams {
                limit: request.limit,
                marker: request.marker,
                ..base.clone()
            };
            let response =
                map_api_error("Request failed.", || self.client.analysis_results(&params))?;
            let page = extract_page(response, ANALYSIS_RESULTS_KEY)?;
            self.emit_page("analysis_results", page.items.len(), page.marker.is_some());
            let items = page
                .items
                .iter()
                .map(|raw| decode_analysis_result(raw, zone))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(Page {
                items,
                marker: page.marker,
            })
        })
    }

    /// Deletes an analysis result.
    ///
    /// # Errors
    ///
    /// Returns [`ExperimentError::Api`] for failures other than a missing
    /// result.
    pub fn delete_analysis_result(
        &self,
        result_id: &ResultId,
    ) -> Result<DeleteOutcome, ExperimentError> {
        self.guarded_delete(
            "delete_analysis_result",
            DELETE_ANALYSIS_RESULT_PROMPT,
            &format!("Analysis result {result_id} not found."),
            result_id.as_str(),
            || self.client.analysis_result_delete(result_id),
        )
    }

    // ------------------------------------------------------------------------
    // Figures
    // ------------------------------------------------------------------------

    /// Stores a new figure. Without a name, one is generated from the time.
    ///
    /// # Errors
    ///
    /// Returns [`ExperimentError::AlreadyExists`] when the figure exists, or
    /// another [`ExperimentError`] when the call fails.
    pub fn create_figure(
        &self,
        experiment_id: &ExperimentId,
        figure: &[u8],
        figure_name: Option<&str>,
        mode: UploadMode,
    ) -> Result<FigureReceipt, ExperimentError> {
        let name = figure_name.map_or_else(
            || generated_figure_name(OffsetDateTime::now_utc()),
            figure_file_name,
        );
        let response = map_api_error(&format!("Figure {name} creation failed."), || {
            self.client.figure_upload(experiment_id, &name, figure, mode)
        })?;
        let receipt = decode_figure_receipt(&response)?;
        self.emit(
            ServiceEvent::new(
                "figure_created",
                EventLevel::Info,
                "create_figure",
                receipt.name.clone(),
            )
            .with_entity(experiment_id.as_str()),
        );
        Ok(receipt)
    }

    /// Stores a new figure read from a local file.
    ///
    /// Without a name, the file name is used.
    ///
    /// # Errors
    ///
    /// Returns [`ExperimentError::Io`] when the file cannot be read, or the
    /// errors of [`Self::create_figure`].
    pub fn create_figure_from_file(
        &self,
        experiment_id: &ExperimentId,
        path: &Path,
        figure_name: Option<&str>,
        mode: UploadMode,
    ) -> Result<FigureReceipt, ExperimentError> {
        let figure = std::fs::read(path).map_err(|err| {
            ExperimentError::Io(format!("failed to read {}: {err}", path.display()))
        })?;
        let file_name = path.file_name().and_then(|name| name.to_str());
        self.create_figure(experiment_id, &figure, figure_name.or(file_name), mode)
    }

    /// Replaces an existing figure.
    ///
    /// # Errors
    ///
    /// Returns [`ExperimentError::NotFound`] when the figure does not exist, or
    /// another [`ExperimentError`] when the call fails.
    pub fn update_figure(
        &self,
        experiment_id: &ExperimentId,
        figure: &[u8],
        figure_name: &str,
        mode: UploadMode,
    ) -> Result<FigureReceipt, ExperimentError> {
        let name = figure_file_name(figure_name);
        let response = map_api_error(&format!("Figure {name} update failed."), || {
            self.client.figure_update(experiment_id, &name, figure, mode)
        })?;
        decode_figure_receipt(&response)
    }

    /// Retrieves a figure's bytes.
    ///
    /// # Errors
    ///
    /// Returns [`ExperimentError::NotFound`] when the figure does not exist, or
    /// another [`ExperimentError`] when the call fails.
    pub fn figure(
        &self,
        experiment_id: &ExperimentId,
        figure_name: &str,
    ) -> Result<Vec<u8>, ExperimentError> {
        let name = figure_file_name(figure_name);
        map_api_error(&format!("Figure {name} not found."), || {
            self.client.figure_get(experiment_id, &name)
        })
    }

    /// Retrieves a figure and writes it to `path`, returning the byte count.
    ///
    /// # Errors
    ///
    /// Returns [`ExperimentError::Io`] when the file cannot be written, or the
    /// errors of [`Self::figure`].
    pub fn save_figure(
        &self,
        experiment_id: &ExperimentId,
        figure_name: &str,
        path: &Path,
    ) -> Result<u64, ExperimentError> {
        let bytes = self.figure(experiment_id, figure_name)?;
        std::fs::write(path, &bytes).map_err(|err| {
            ExperimentError::Io(format!("failed to write {}: {err}", path.display()))
        })?;
        Ok(u64::try_from(bytes.len()).unwrap_or(u64::MAX))
    }

    /// Deletes a figure.
    ///
    /// # Errors
    ///
    /// Returns [`ExperimentError::Api`] for failures other than a missing
    /// figure.
    pub fn delete_figure(
        &self,
        experiment_id: &ExperimentId,
        figure_name: &str,
    ) -> Result<DeleteOutcome, ExperimentError> {
        let name = figure_file_name(figure_name);
        self.guarded_delete(
            "delete_figure",
            DELETE_FIGURE_PROMPT,
            &format!("Figure {name} not found."),
            &name,
            || self.client.figure_delete(experiment_id, &name),
        )
    }

    // ------------------------------------------------------------------------
    // Data Files
    // ------------------------------------------------------------------------

    /// Returns the data file metadata of an experiment.
    ///
    /// # Errors
    ///
    /// Returns [`ExperimentError::NotFound`] when the experiment does not
    /// exist, or another [`ExperimentError`] when the call fails.
    pub fn files(&self, experiment_id: &ExperimentId) -> Result<Value, ExperimentError> {
        map_api_error(&format!("Experiment {experiment_id} file list not received."), || {
            self.client.files(experiment_id)
        })
    }

    /// Uploads a data file, adding a `.json` suffix when missing.
    ///
    /// # Errors
    ///
    /// Returns [`ExperimentError::Validation`] when the data cannot be
    /// serialized, or another [`ExperimentError`] when the call fails.
    pub fn file_upload(
        &self,
        experiment_id: &ExperimentId,
        file_name: &str,
        data: &FileData,
    ) -> Result<(), ExperimentError> {
        let name = data_file_name(file_name);
        let contents = match data {
            FileData::Json(value) => serde_json::to_string(value).map_err(|err| {
                ExperimentError::Validation(format!("file data is not serializable: {err}"))
            })?,
            FileData::Text(text) => text.clone(),
        };
        map_api_error(&format!("File {name} upload failed."), || {
            self.client.file_upload(experiment_id, &name, &contents)
        })?;
        self.emit(
            ServiceEvent::new("file_uploaded", EventLevel::Info, "file_upload", name)
                .with_entity(experiment_id.as_str()),
        );
        Ok(())
    }

    /// Downloads a data file and parses it as JSON.
    ///
    /// # Errors
    ///
    /// Returns [`ExperimentError::NotFound`] when the file does not exist,
    /// [`ExperimentError::Protocol`] when it is not JSON, or another
    /// [`ExperimentError`] when the call fails.
    pub fn file_download(
        &self,
        experiment_id: &ExperimentId,
        file_name: &str,
    ) -> Result<Value, ExperimentError> {
        let name = data_file_name(file_name);
        let text = map_api_error(&format!("File {name} not found."), || {
            self.client.file_download(experiment_id, &name)
        })?;
        serde_json::from_str(&text).map_err(|err| {
            ExperimentError::Protocol(format!("data file {name} is not valid JSON: {err}"))
        })
    }

    // ------------------------------------------------------------------------
    // Helpers
    // ------------------------------------------------------------------------

    /// Runs a delete behind the confirmation prompt and the delete mapper.
    fn guarded_delete(
        &self,
        operation: &'static str,
        prompt: &str,
        missing_message: &str,
        entity: &str,
        call: impl FnOnce() -> Result<(), crate::core::errors::ClientError>,
    ) -> Result<DeleteOutcome, ExperimentError> {
        if self.options.prompt_for_delete && !self.confirmation.confirm(prompt) {
            self.emit(
                ServiceEvent::new("delete_cancelled", EventLevel::Warning, operation, "cancelled")
                    .with_entity(entity),
            );
            return Ok(DeleteOutcome::Cancelled);
        }
        let outcome = map_delete_error(call)?;
        let event = match outcome {
            DeleteOutcome::AlreadyAbsent => ServiceEvent::new(
                "delete_target_missing",
                EventLevel::Warning,
                operation,
                missing_message,
            ),
            DeleteOutcome::Deleted | DeleteOutcome::Cancelled => {
                ServiceEvent::new("deleted", EventLevel::Info, operation, "deleted")
            }
        };
        self.emit(event.with_entity(entity));
        Ok(outcome)
    }

    /// Emits a page-fetch debug event.
    fn emit_page(&self, operation: &'static str, count: usize, has_marker: bool) {
        self.emit(ServiceEvent::new(
            "page_fetched",
            EventLevel::Debug,
            operation,
            format!("received {count} items (more pages: {has_marker})"),
        ));
    }

    /// Sends an event to the sink.
    fn emit(&self, event: ServiceEvent) {
        self.events.record(&event);
    }
}
