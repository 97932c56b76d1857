// resultsdb-core/src/core/time.rs
// ============================================================================
// Module: ResultsDB Timestamp Normalizer
// Description: Conversions between caller-local time and UTC wire timestamps.
// Purpose: Store and transmit UTC while presenting local time to callers.
// Dependencies: time
// ============================================================================

//! ## Overview
//! The server stores every timestamp in UTC. Callers speak local time. A
//! [`LocalZone`] is either a fixed offset or the process time zone. The
//! process zone is consulted for each converted instant, so dates on either
//! side of a daylight-saving switch get their own offsets.
//!
//! Conversion rules:
//! - `local_to_utc`: a value without an offset, or with a non-zero offset, is
//!   treated as local: the local offset for that wall-clock time is attached
//!   (replacing any offset it carried) and the instant converted to UTC. A
//!   value already at offset zero passes through unchanged.
//! - `utc_to_local`: the input is forced to UTC (any embedded offset is
//!   overwritten, not interpreted) and then converted to the local offset.
//!
//! Output strings follow ISO-8601 with microsecond precision when non-zero,
//! ending in `Z` or `+00:00` depending on [`UtcSuffix`].

// ============================================================================
// SECTION: Imports
// ============================================================================

use time::Date;
use time::OffsetDateTime;
use time::PrimitiveDateTime;
use time::UtcOffset;
use time::format_description::BorrowedFormatItem;
use time::format_description::well_known::Rfc3339;
use time::macros::format_description;

use crate::core::errors::ExperimentError;

// ============================================================================
// SECTION: Formats
// ============================================================================

/// Naive ISO-8601 date-time with whole seconds.
const NAIVE_SECONDS: &[BorrowedFormatItem<'static>] =
    format_description!("[year]-[month]-[day]T[hour]:[minute]:[second]");
/// Naive ISO-8601 date-time with fractional seconds.
const NAIVE_FRACTION: &[BorrowedFormatItem<'static>] =
    format_description!("[year]-[month]-[day]T[hour]:[minute]:[second].[subsecond]");
/// Naive ISO-8601 date-time without seconds.
const NAIVE_MINUTES: &[BorrowedFormatItem<'static>] =
    format_description!("[year]-[month]-[day]T[hour]:[minute]");
/// Signed `±HH:MM` offset.
const OFFSET: &[BorrowedFormatItem<'static>] =
    format_description!("[offset_hour sign:mandatory]:[offset_minute]");
/// Calendar date only (midnight).
const DATE_ONLY: &[BorrowedFormatItem<'static>] = format_description!("[year]-[month]-[day]");

// ============================================================================
// SECTION: Types
// ============================================================================

/// Date-time argument accepted by the normalizer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DateTimeInput {
    /// Date-time carrying an explicit UTC offset.
    Zoned(OffsetDateTime),
    /// Date-time without any offset.
    Naive(PrimitiveDateTime),
    /// ISO-8601 text, with or without an offset.
    Text(String),
}

impl From<OffsetDateTime> for DateTimeInput {
    fn from(value: OffsetDateTime) -> Self {
        Self::Zoned(value)
    }
}

impl From<PrimitiveDateTime> for DateTimeInput {
    fn from(value: PrimitiveDateTime) -> Self {
        Self::Naive(value)
    }
}

impl From<&str> for DateTimeInput {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for DateTimeInput {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

/// Suffix convention for UTC strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UtcSuffix {
    /// Render the zero offset as `Z`.
    #[default]
    Z,
    /// Render the zero offset as `+00:00`.
    Offset,
}

/// Parsed form of a [`DateTimeInput`].
enum Resolved {
    /// Value with an offset.
    Zoned(OffsetDateTime),
    /// Value without an offset.
    Naive(PrimitiveDateTime),
}

// ============================================================================
// SECTION: Local Zone
// ============================================================================

/// Explicit local time zone used for caller-facing timestamps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LocalZone {
    /// How the offset for an instant is chosen.
    rule: ZoneRule,
}

/// Offset selection for a [`LocalZone`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ZoneRule {
    /// Process time zone, looked up per instant.
    System {
        /// Offset used when the process zone cannot be read.
        fallback: UtcOffset,
    },
    /// One offset for every instant.
    Fixed(UtcOffset),
}

impl Default for LocalZone {
    fn default() -> Self {
        Self::system()
    }
}

impl LocalZone {
    /// Uses the process time zone, including its daylight-saving rules.
    ///
    /// Offsets are resolved for each converted instant. When the platform
    /// cannot report one, the offset in effect at construction is used, and
    /// UTC when that is unavailable too.
    #[must_use]
    pub fn system() -> Self {
        Self {
            rule: ZoneRule::System {
                fallback: UtcOffset::current_local_offset().unwrap_or(UtcOffset::UTC),
            },
        }
    }

    /// Uses a fixed offset.
    #[must_use]
    pub const fn fixed(offset: UtcOffset) -> Self {
        Self {
            rule: ZoneRule::Fixed(offset),
        }
    }

    /// Uses UTC as local time.
    #[must_use]
    pub const fn utc() -> Self {
        Self::fixed(UtcOffset::UTC)
    }

    /// Parses a `±HH:MM` offset.
    ///
    /// # Errors
    ///
    /// Returns [`ExperimentError::Validation`] for malformed offsets.
    pub fn parse_offset(text: &str) -> Result<Self, ExperimentError> {
        let offset = UtcOffset::parse(text.trim(), OFFSET).map_err(|_| {
            ExperimentError::Validation(format!("\"{text}\" is not a valid utc offset"))
        })?;
        Ok(Self::fixed(offset))
    }

    /// Returns the local offset in effect now.
    #[must_use]
    pub fn offset(self) -> UtcOffset {
        self.offset_at(OffsetDateTime::now_utc())
    }

    /// Returns the local offset in effect at `instant`.
    #[must_use]
    pub fn offset_at(self, instant: OffsetDateTime) -> UtcOffset {
        match self.rule {
            ZoneRule::System {
                fallback,
            } => UtcOffset::local_offset_at(instant).unwrap_or(fallback),
            ZoneRule::Fixed(offset) => offset,
        }
    }

    /// Converts a local date-time into a UTC date-time.
    ///
    /// # Errors
    ///
    /// Returns [`ExperimentError::Validation`] when text input is not ISO-8601
    /// or the converted instant is out of range.
    pub fn local_to_utc(
        self,
        input: impl Into<DateTimeInput>,
    ) -> Result<OffsetDateTime, ExperimentError> {
        match resolve(input.into()).map_err(ExperimentError::Validation)? {
            Resolved::Zoned(value) if value.offset().is_utc() => Ok(value),
            Resolved::Zoned(value) => {
                let wall = PrimitiveDateTime::new(value.date(), value.time());
                to_offset(self.attach(wall), UtcOffset::UTC).map_err(ExperimentError::Validation)
            }
            Resolved::Naive(value) => {
                to_offset(self.attach(value), UtcOffset::UTC).map_err(ExperimentError::Validation)
            }
        }
    }

    /// Converts a local date-time into an ISO-8601 UTC string.
    ///
    /// # Errors
    ///
    /// Returns [`ExperimentError::Validation`] when the input cannot be
    /// converted.
    pub fn local_to_utc_string(
        self,
        input: impl Into<DateTimeInput>,
        suffix: UtcSuffix,
    ) -> Result<String, ExperimentError> {
        let utc = self.local_to_utc(input)?;
        format_utc(utc, suffix).map_err(ExperimentError::Validation)
    }

    /// Converts a UTC date-time into local time.
    ///
    /// # Errors
    ///
    /// Returns [`ExperimentError::Validation`] when text input is not ISO-8601
    /// or the converted instant is out of range.
    pub fn utc_to_local(
        self,
        input: impl Into<DateTimeInput>,
    ) -> Result<OffsetDateTime, ExperimentError> {
        self.force_utc_then_local(input.into()).map_err(ExperimentError::Validation)
    }

    /// Decodes a server timestamp, reporting failures as protocol errors.
    pub(crate) fn server_to_local(self, text: &str) -> Result<OffsetDateTime, ExperimentError> {
        self.force_utc_then_local(DateTimeInput::Text(text.to_string()))
            .map_err(|err| ExperimentError::Protocol(format!("invalid server timestamp: {err}")))
    }

    /// Overwrites the zone with UTC, then converts to the local offset.
    fn force_utc_then_local(self, input: DateTimeInput) -> Result<OffsetDateTime, String> {
        let utc = match resolve(input)? {
            Resolved::Zoned(value) => value.replace_offset(UtcOffset::UTC),
            Resolved::Naive(value) => value.assume_utc(),
        };
        to_offset(utc, self.offset_at(utc))
    }

    /// Attaches the local offset in effect at a wall-clock time.
    fn attach(self, wall: PrimitiveDateTime) -> OffsetDateTime {
        attach_offset(wall, |instant| self.offset_at(instant))
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Resolves text input into a typed date-time.
fn resolve(input: DateTimeInput) -> Result<Resolved, String> {
    match input {
        DateTimeInput::Zoned(value) => Ok(Resolved::Zoned(value)),
        DateTimeInput::Naive(value) => Ok(Resolved::Naive(value)),
        DateTimeInput::Text(text) => parse_iso8601(&text),
    }
}

/// Parses ISO-8601 text with or without an offset.
fn parse_iso8601(text: &str) -> Result<Resolved, String> {
    let trimmed = text.trim();
    let normalized = normalize_separator(trimmed);
    if let Ok(value) = OffsetDateTime::parse(&normalized, &Rfc3339) {
        return Ok(Resolved::Zoned(value));
    }
    for format in [NAIVE_FRACTION, NAIVE_SECONDS, NAIVE_MINUTES] {
        if let Ok(value) = PrimitiveDateTime::parse(&normalized, format) {
            return Ok(Resolved::Naive(value));
        }
    }
    if let Ok(date) = Date::parse(&normalized, DATE_ONLY) {
        return Ok(Resolved::Naive(date.midnight()));
    }
    Err(format!("\"{text}\" is not a valid ISO-8601 datetime"))
}

/// Accepts a space between date and time in place of `T`.
fn normalize_separator(text: &str) -> String {
    if text.len() > 10 && text.as_bytes()[10] == b' ' {
        let mut owned = text.to_string();
        owned.replace_range(10..11, "T");
        return owned;
    }
    text.to_string()
}

/// Attaches the offset `offset_at` reports for a wall-clock time.
///
/// The first lookup reads the wall clock as UTC. The offset is then re-checked
/// at the resulting instant, which settles values near a transition.
fn attach_offset(
    wall: PrimitiveDateTime,
    offset_at: impl Fn(OffsetDateTime) -> UtcOffset,
) -> OffsetDateTime {
    let guess = offset_at(wall.assume_utc());
    let candidate = wall.assume_offset(guess);
    let settled = offset_at(candidate);
    if settled == guess { candidate } else { wall.assume_offset(settled) }
}

/// Converts to the target offset without panicking on range overflow.
fn to_offset(value: OffsetDateTime, offset: UtcOffset) -> Result<OffsetDateTime, String> {
    value
        .checked_to_offset(offset)
        .ok_or_else(|| "datetime is out of the supported range".to_string())
}

/// Formats a UTC date-time as ISO-8601 text.
fn format_utc(value: OffsetDateTime, suffix: UtcSuffix) -> Result<String, String> {
    let mut text = value.format(NAIVE_SECONDS).map_err(|err| err.to_string())?;
    let micros = value.microsecond();
    if micros != 0 {
        text.push_str(&format!(".{micros:06}"));
    }
    text.push_str(match suffix {
        UtcSuffix::Z => "Z",
        UtcSuffix::Offset => "+00:00",
    });
    Ok(text)
}

// ============================================================================
// SECTION: Tests
// ============================================================================
