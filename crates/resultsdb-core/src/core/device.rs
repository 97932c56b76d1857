// resultsdb-core/src/core/device.rs
// ============================================================================
// Module: ResultsDB Device Components
// Description: Addressable sub-units of a backend (qubits, resonators, ...).
// Purpose: Give device components a typed form with a stable string encoding.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! Device components travel as strings such as `Q0` or `R3`. Parsing never
//! fails: strings outside the known prefixes become [`DeviceComponent::Unknown`]
//! and keep their original text. [`DeviceComponents`] compares two component
//! lists as sets while keeping insertion order for display and encoding.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeSet;
use std::fmt;

use serde::Deserialize;
use serde::Serialize;

// ============================================================================
// SECTION: Device Component
// ============================================================================

/// A single device component.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum DeviceComponent {
    /// Qubit with its index (`Q<n>`).
    Qubit(u32),
    /// Readout resonator with its index (`R<n>`).
    Resonator(u32),
    /// Coupler with its index (`C<n>`).
    Coupler(u32),
    /// Component with an unrecognized name.
    Unknown(String),
}

impl DeviceComponent {
    /// Parses a component from its string form.
    #[must_use]
    pub fn parse(text: &str) -> Self {
        let mut chars = text.chars();
        let prefix = chars.next();
        let index = chars.as_str();
        // Leading zeros would not survive a round trip through the index.
        let canonical = index.len() == 1 || !index.starts_with('0');
        let parsed = if index.is_empty()
            || !canonical
            || !index.bytes().all(|byte| byte.is_ascii_digit())
        {
            None
        } else {
            index.parse::<u32>().ok()
        };
        match (prefix, parsed) {
            (Some('Q'), Some(index)) => Self::Qubit(index),
            (Some('R'), Some(index)) => Self::Resonator(index),
            (Some('C'), Some(index)) => Self::Coupler(index),
            _ => Self::Unknown(text.to_string()),
        }
    }
}

impl fmt::Display for DeviceComponent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Qubit(index) => write!(f, "Q{index}"),
            Self::Resonator(index) => write!(f, "R{index}"),
            Self::Coupler(index) => write!(f, "C{index}"),
            Self::Unknown(text) => f.write_str(text),
        }
    }
}

impl From<&str> for DeviceComponent {
    fn from(value: &str) -> Self {
        Self::parse(value)
    }
}

impl From<String> for DeviceComponent {
    fn from(value: String) -> Self {
        Self::parse(&value)
    }
}

impl Serialize for DeviceComponent {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for DeviceComponent {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        Ok(Self::parse(&text))
    }
}

// ============================================================================
// SECTION: Component Collections
// ============================================================================

/// Ordered list of device components with set-like equality.
#[derive(Debug, Clone, Default, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DeviceComponents(Vec<DeviceComponent>);

impl DeviceComponents {
    /// Creates a collection preserving the given order.
    #[must_use]
    pub const fn new(components: Vec<DeviceComponent>) -> Self {
        Self(components)
    }

    /// Returns the components in insertion order.
    #[must_use]
    pub fn as_slice(&self) -> &[DeviceComponent] {
        &self.0
    }

    /// Returns the string form of every component, in insertion order.
    #[must_use]
    pub fn to_strings(&self) -> Vec<String> {
        self.0.iter().map(ToString::to_string).collect()
    }

    /// Returns true when there are no components.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the number of components.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }
}

impl PartialEq for DeviceComponents {
    fn eq(&self, other: &Self) -> bool {
        let left: BTreeSet<&DeviceComponent> = self.0.iter().collect();
        let right: BTreeSet<&DeviceComponent> = other.0.iter().collect();
        left == right
    }
}

impl fmt::Display for DeviceComponents {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_strings().join(","))
    }
}

impl From<Vec<DeviceComponent>> for DeviceComponents {
    fn from(value: Vec<DeviceComponent>) -> Self {
        Self::new(value)
    }
}

impl FromIterator<DeviceComponent> for DeviceComponents {
    fn from_iter<I: IntoIterator<Item = DeviceComponent>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}
