//! Canonical value types exchanged by every operation.

use serde::{Deserialize, Serialize};

/// Default category axis name when a record carries none.
pub const DEFAULT_CATEGORY: &str = "category";

/// Default measure axis name when a record carries none.
pub const DEFAULT_MEASURE: &str = "value";

/// One observed or derived data point.
///
/// `id` stays `None` until the stage that produced the datum completes;
/// the sequencer then backfills `"<stageKey>_<index>"`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Datum {
    /// Name of the category axis (e.g. "year")
    pub category: String,
    /// Name of the measure axis (e.g. "cases")
    pub measure: String,
    /// Label of this point within its axis
    pub target: String,
    /// Series discriminator, `None` for ungrouped charts
    #[serde(default)]
    pub group: Option<String>,
    /// Always finite
    pub value: f64,
    /// Stage-scoped identifier
    #[serde(default)]
    pub id: Option<String>,
    /// Optional display name overriding `target` in the terminal stage
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl Datum {
    /// Create an ungrouped datum without an id
    pub fn new(
        category: impl Into<String>,
        measure: impl Into<String>,
        target: impl Into<String>,
        value: f64,
    ) -> Self {
        Self {
            category: category.into(),
            measure: measure.into(),
            target: target.into(),
            group: None,
            value,
            id: None,
            name: None,
        }
    }

    /// Set the group
    pub fn with_group(mut self, group: impl Into<String>) -> Self {
        self.group = Some(group.into());
        self
    }

    /// Set the group from an optional value
    pub fn with_optional_group(mut self, group: Option<String>) -> Self {
        self.group = group;
        self
    }

    /// Set the id
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Set the display name
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Returns true if the datum belongs to `group` (string comparison)
    pub fn in_group(&self, group: &str) -> bool {
        self.group.as_deref() == Some(group)
    }

    /// Returns true if `id` is set and equals `key`
    pub fn has_id(&self, key: &str) -> bool {
        self.id.as_deref() == Some(key)
    }
}

/// Result of a boolean comparison.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoolValue {
    pub label: String,
    pub bool: bool,
}

impl BoolValue {
    pub fn new(label: impl Into<String>, bool: bool) -> Self {
        Self {
            label: label.into(),
            bool,
        }
    }
}

/// Result of determineRange.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntervalValue {
    pub label: String,
    pub min: f64,
    pub max: f64,
}

impl IntervalValue {
    pub fn new(label: impl Into<String>, min: f64, max: f64) -> Self {
        Self {
            label: label.into(),
            min,
            max,
        }
    }

    /// Width of the interval
    pub fn span(&self) -> f64 {
        self.max - self.min
    }
}

/// Minimal numeric wrapper.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScalarValue {
    pub value: f64,
}

impl ScalarValue {
    pub fn new(value: f64) -> Self {
        Self { value }
    }
}
