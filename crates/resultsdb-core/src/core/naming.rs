// resultsdb-core/src/core/naming.rs
// ============================================================================
// Module: ResultsDB Artifact Names
// Description: Filename normalization for figures and data files.
// Purpose: Apply the server's suffix rules before any transport call.
// Dependencies: time
// ============================================================================

//! ## Overview
//! The server only accepts figures ending in `.svg` and data files ending in
//! `.json`. Names are normalized by appending the suffix when absent; names
//! that already carry it are returned unchanged.

use time::OffsetDateTime;
use time::format_description::BorrowedFormatItem;
use time::macros::format_description;

/// Suffix required on figure names.
pub const FIGURE_SUFFIX: &str = ".svg";
/// Suffix required on data file names.
pub const DATA_FILE_SUFFIX: &str = ".json";

/// Timestamp layout used in generated figure names.
const GENERATED_NAME_STAMP: &[BorrowedFormatItem<'static>] =
    format_description!("[year]-[month]-[day]T[hour]:[minute]:[second].[subsecond digits:6]");

/// Returns the figure name with a `.svg` suffix.
#[must_use]
pub fn figure_file_name(name: &str) -> String {
    with_suffix(name, FIGURE_SUFFIX)
}

/// Returns the data file name with a `.json` suffix.
#[must_use]
pub fn data_file_name(name: &str) -> String {
    with_suffix(name, DATA_FILE_SUFFIX)
}

/// Builds a figure name for uploads that did not supply one.
#[must_use]
pub fn generated_figure_name(now: OffsetDateTime) -> String {
    let stamp = now
        .format(GENERATED_NAME_STAMP)
        .unwrap_or_else(|_| now.unix_timestamp().to_string());
    format!("figure_{stamp}{FIGURE_SUFFIX}")
}

/// Appends `suffix` unless `name` already ends with it.
fn with_suffix(name: &str, suffix: &str) -> String {
    if name.ends_with(suffix) { name.to_string() } else { format!("{name}{suffix}") }
}
