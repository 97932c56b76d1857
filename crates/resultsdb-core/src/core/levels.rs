// resultsdb-core/src/core/levels.rs
// ============================================================================
// Module: ResultsDB Enumerations
// Description: Share levels, result quality, and their wire mappings.
// Purpose: Parse caller-supplied names through one closed, validated path.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! Both enumerations implement [`NamedMember`], whose [`parse_member`]
//! function is the single place where case-insensitive names become enum
//! members. Wire values are a fixed bijection: decoding a value that is not
//! in the table is a protocol error, never a silent default.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use serde::Deserialize;
use serde::Serialize;

use crate::core::errors::ExperimentError;

// ============================================================================
// SECTION: Named Members
// ============================================================================

/// Closed enumeration with caller-facing names and wire values.
pub trait NamedMember: Copy + PartialEq + 'static {
    /// Label used in validation messages (for example `share_level`).
    const KIND: &'static str;

    /// Every member, in declaration order.
    fn members() -> &'static [Self];

    /// Caller-facing name of the member.
    fn name(self) -> &'static str;

    /// Value exchanged with the server.
    fn wire_value(self) -> &'static str;
}

/// Parses a member from its case-insensitive name.
///
/// # Errors
///
/// Returns [`ExperimentError::Validation`] when no member has that name.
pub fn parse_member<T: NamedMember>(name: &str) -> Result<T, ExperimentError> {
    let trimmed = name.trim();
    T::members()
        .iter()
        .copied()
        .find(|member| member.name().eq_ignore_ascii_case(trimmed))
        .ok_or_else(|| {
            let valid: Vec<&str> = T::members().iter().map(|member| member.name()).collect();
            ExperimentError::Validation(format!(
                "\"{name}\" is not a valid {}. Valid values are {}",
                T::KIND,
                valid.join(", ")
            ))
        })
}

/// Decodes a member from its wire value.
///
/// # Errors
///
/// Returns [`ExperimentError::Protocol`] when the wire value is unknown.
pub fn member_from_wire<T: NamedMember>(value: &str) -> Result<T, ExperimentError> {
    T::members().iter().copied().find(|member| member.wire_value() == value).ok_or_else(|| {
        ExperimentError::Protocol(format!("unknown {} value \"{value}\" from server", T::KIND))
    })
}

/// Enum argument accepted either as a member or as its name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MemberInput<T> {
    /// Already-typed member.
    Member(T),
    /// Name to be parsed case-insensitively.
    Name(String),
}

impl<T: NamedMember> MemberInput<T> {
    /// Resolves the input to a member.
    ///
    /// # Errors
    ///
    /// Returns [`ExperimentError::Validation`] for unknown names.
    pub fn resolve(&self) -> Result<T, ExperimentError> {
        match self {
            Self::Member(member) => Ok(*member),
            Self::Name(name) => parse_member(name),
        }
    }
}

// ============================================================================
// SECTION: Share Level
// ============================================================================

/// Visibility scope of an experiment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShareLevel {
    /// Visible to the owner only.
    Private,
    /// Shared within the project.
    Project,
    /// Shared within the group.
    Group,
    /// Shared within the hub.
    Hub,
    /// Visible to everyone.
    Public,
}

impl NamedMember for ShareLevel {
    const KIND: &'static str = "share_level";

    fn members() -> &'static [Self] {
        &[Self::Private, Self::Project, Self::Group, Self::Hub, Self::Public]
    }

    fn name(self) -> &'static str {
        self.wire_value()
    }

    fn wire_value(self) -> &'static str {
        match self {
            Self::Private => "private",
            Self::Project => "project",
            Self::Group => "group",
            Self::Hub => "hub",
            Self::Public => "public",
        }
    }
}

impl fmt::Display for ShareLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl From<ShareLevel> for MemberInput<ShareLevel> {
    fn from(value: ShareLevel) -> Self {
        Self::Member(value)
    }
}

impl From<&str> for MemberInput<ShareLevel> {
    fn from(value: &str) -> Self {
        Self::Name(value.to_string())
    }
}

impl From<String> for MemberInput<ShareLevel> {
    fn from(value: String) -> Self {
        Self::Name(value)
    }
}

// ============================================================================
// SECTION: Result Quality
// ============================================================================

/// Confidence classification of an analysis result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ResultQuality {
    /// No quality information.
    Unknown,
    /// Known to be bad.
    Bad,
    /// Known to be good.
    Good,
    /// Verified as perfect.
    Perfect,
}

impl NamedMember for ResultQuality {
    const KIND: &'static str = "quality";

    fn members() -> &'static [Self] {
        &[Self::Unknown, Self::Bad, Self::Good, Self::Perfect]
    }

    fn name(self) -> &'static str {
        match self {
            Self::Unknown => "UNKNOWN",
            Self::Bad => "BAD",
            Self::Good => "GOOD",
            Self::Perfect => "PERFECT",
        }
    }

    fn wire_value(self) -> &'static str {
        match self {
            Self::Unknown => "No Information",
            Self::Bad => "Bad",
            Self::Good => "Good",
            Self::Perfect => "Perfect",
        }
    }
}

impl fmt::Display for ResultQuality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl From<ResultQuality> for MemberInput<ResultQuality> {
    fn from(value: ResultQuality) -> Self {
        Self::Member(value)
    }
}

impl From<&str> for MemberInput<ResultQuality> {
    fn from(value: &str) -> Self {
        Self::Name(value.to_string())
    }
}

impl From<String> for MemberInput<ResultQuality> {
    fn from(value: String) -> Self {
        Self::Name(value)
    }
}
