// resultsdb-core/src/core/identifiers.rs
// ============================================================================
// Module: ResultsDB Identifiers
// Description: Opaque identifiers for experiments and analysis results.
// Purpose: Provide strongly typed, serializable IDs with stable string forms.
// Dependencies: serde, uuid
// ============================================================================

//! ## Overview
//! Experiment and analysis result identifiers are opaque strings assigned by
//! the server (or supplied by the caller at creation). Wrappers never validate
//! on construction; ids decoded from the server are trusted as-is. Caller
//! supplied ids are checked with [`ExperimentId::validate_uuid_v4`] at the
//! creation boundary.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use serde::Deserialize;
use serde::Serialize;
use uuid::Uuid;

// ============================================================================
// SECTION: Identifier Types
// ============================================================================

/// Identifier of an experiment record.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExperimentId(String);

impl ExperimentId {
    /// Creates a new experiment identifier.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generates a fresh random UUID v4 identifier.
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns true when the identifier is a UUID v4 string.
    #[must_use]
    pub fn validate_uuid_v4(&self) -> bool {
        is_uuid_v4(&self.0)
    }
}

impl fmt::Display for ExperimentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<&str> for ExperimentId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for ExperimentId {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

/// Identifier of an analysis result record.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResultId(String);

impl ResultId {
    /// Creates a new analysis result identifier.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generates a fresh random UUID v4 identifier.
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns true when the identifier is a UUID v4 string.
    #[must_use]
    pub fn validate_uuid_v4(&self) -> bool {
        is_uuid_v4(&self.0)
    }
}

impl fmt::Display for ResultId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<&str> for ResultId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for ResultId {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Returns true when `value` parses as a hyphenated UUID with version 4.
fn is_uuid_v4(value: &str) -> bool {
    // Uuid::parse_str also accepts braced and URN forms; the server only
    // accepts the hyphenated one.
    value.len() == 36
        && Uuid::parse_str(value).is_ok_and(|parsed| parsed.get_version_num() == 4)
}
