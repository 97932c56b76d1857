// resultsdb-http/src/lib.rs
// ============================================================================
// Module: ResultsDB HTTP Transport
// Description: Blocking HTTP implementation of the experiment client.
// Purpose: Connect the ResultsDB service runtime to the REST backend.
// Dependencies: resultsdb-core, reqwest, serde_json, url
// ============================================================================

//! ## Overview
//! This crate provides [`HttpExperimentClient`], the production
//! [`resultsdb_core::ExperimentClient`], and [`authenticate`], the token login
//! handshake that yields the access token it sends with every request.
//! Compiled list parameters are encoded by the [`query`] module.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod auth;
pub mod client;
pub mod query;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use auth::authenticate;
pub use client::ACCESS_TOKEN_HEADER;
pub use client::DEFAULT_DATABASE_URL;
pub use client::FIGURE_CONTENT_TYPE;
pub use client::HttpClientConfig;
pub use client::HttpExperimentClient;
pub use query::QueryPairs;
pub use query::analysis_result_query_pairs;
pub use query::experiment_query_pairs;
