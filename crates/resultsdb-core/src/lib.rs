// resultsdb-core/src/lib.rs
// ============================================================================
// Module: ResultsDB Core
// Description: Client-side metadata service for an experiment results database.
// Purpose: Validate, compile, page, and decode ResultsDB traffic.
// Dependencies: serde, serde_json, thiserror, time, uuid
// ============================================================================

//! ## Overview
//! This crate implements the client-side logic in front of a ResultsDB
//! backend: timestamp normalization between local time and the server's UTC,
//! filter compilation into wire query parameters, error translation, record
//! conversion, and marker-based pagination. Transports plug in through
//! [`ExperimentClient`]; [`InMemoryExperimentClient`] is the reference
//! backend used by tests.
//! Invariants:
//! - Invalid caller input is rejected before any network call.
//! - Timestamps cross the wire as UTC and reach callers in local time.
//! - List operations never return more items than the requested limit.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod core;
pub mod interfaces;
pub mod runtime;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use crate::core::*;
pub use crate::runtime::*;
pub use interfaces::AnalysisResultListParams;
pub use interfaces::ComponentFilter;
pub use interfaces::ExperimentClient;
pub use interfaces::ExperimentListParams;
pub use interfaces::UploadMode;
