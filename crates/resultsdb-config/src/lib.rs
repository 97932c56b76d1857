// resultsdb-config/src/lib.rs
// ============================================================================
// Module: ResultsDB Config Library
// Description: Configuration model, validation, and service construction.
// Purpose: Single source of truth for resultsdb.toml semantics.
// Dependencies: resultsdb-core, resultsdb-http, serde, toml
// ============================================================================

//! ## Overview
//! `resultsdb-config` defines the `resultsdb.toml` model with strict,
//! fail-closed loading, a canonical example file, and builders that turn a
//! validated configuration into a ready [`resultsdb_core::ExperimentService`].

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod builder;
pub mod config;
pub mod examples;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use builder::account_context;
pub use builder::build_event_sink;
pub use builder::build_local_service;
pub use builder::build_service;
pub use builder::http_client_config;
pub use builder::service_options;
pub use config::*;
pub use examples::config_toml_example;
