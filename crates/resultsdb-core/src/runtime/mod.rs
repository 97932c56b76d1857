// resultsdb-core/src/runtime/mod.rs
// ============================================================================
// Module: ResultsDB Runtime
// Description: Filter compilation, conversion, pagination, and the service.
// Purpose: Turn caller requests into transport calls and decoded records.
// Dependencies: crate::core, crate::interfaces
// ============================================================================

//! ## Overview
//! The runtime layers are independent and composable:
//! [`filters`] compiles queries, [`error_map`] translates transport failures,
//! [`convert`] decodes and encodes records, and [`paginator`] follows markers.
//! [`service`] wires them together over an
//! [`ExperimentClient`](crate::interfaces::ExperimentClient).
//! Invariants:
//! - Validation errors are raised before any transport call.
//! - Each transport call is made once; nothing retries.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod convert;
pub mod error_map;
pub mod filters;
pub mod memory;
pub mod paginator;
pub mod service;
pub mod telemetry;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use error_map::map_api_error;
pub use error_map::map_delete_error;
pub use memory::InMemoryExperimentClient;
pub use memory::RecordedCall;
pub use paginator::Page;
pub use paginator::PageRequest;
pub use paginator::Paginator;
pub use paginator::PaginatorState;
pub use paginator::collect_pages;
pub use service::DeleteConfirmation;
pub use service::ExperimentService;
pub use service::FixedConfirmation;
pub use service::ServiceOptions;
pub use service::StdinConfirmation;
pub use telemetry::EventLevel;
pub use telemetry::LOG_FILE_ENV;
pub use telemetry::LOG_LEVEL_ENV;
pub use telemetry::FileEventSink;
pub use telemetry::LevelFilterSink;
pub use telemetry::MemoryEventSink;
pub use telemetry::NoopEventSink;
pub use telemetry::ServiceEvent;
pub use telemetry::ServiceEventSink;
pub use telemetry::StderrEventSink;
pub use telemetry::build_sink;
pub use telemetry::sink_from_env;
