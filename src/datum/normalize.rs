//! Normalization of raw source rows into Datum
//!
//! Rows arrive already filtered/aggregated by the chart collaborator as flat
//! JSON records. A field mapping names which keys carry the category,
//! measure and (optionally) group.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::types::Datum;

/// Maps record keys onto Datum axes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldMapping {
    pub category_field: String,
    pub measure_field: String,
    #[serde(default)]
    pub group_field: Option<String>,
}

impl FieldMapping {
    pub fn new(category_field: impl Into<String>, measure_field: impl Into<String>) -> Self {
        Self {
            category_field: category_field.into(),
            measure_field: measure_field.into(),
            group_field: None,
        }
    }

    pub fn with_group_field(mut self, group_field: impl Into<String>) -> Self {
        self.group_field = Some(group_field.into());
        self
    }
}

/// The chart's original rows plus their field mapping.
///
/// Every ordinary stage re-normalizes from this, never from a previous
/// stage's output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BaseDataset {
    pub fields: FieldMapping,
    #[serde(default)]
    pub values: Vec<Map<String, Value>>,
}

impl BaseDataset {
    pub fn new(fields: FieldMapping, values: Vec<Map<String, Value>>) -> Self {
        Self { fields, values }
    }

    /// Build from an array of JSON objects; non-object entries are skipped
    pub fn from_values(fields: FieldMapping, values: Vec<Value>) -> Self {
        let values = values
            .into_iter()
            .filter_map(|v| match v {
                Value::Object(map) => Some(map),
                _ => None,
            })
            .collect();
        Self { fields, values }
    }

    /// Fresh Datum copy of the rows
    pub fn to_datums(&self) -> Vec<Datum> {
        normalize_rows(&self.values, &self.fields)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Normalize rows into Datum.
///
/// - missing category → `"Result <i+1>"`
/// - non-finite or missing measure → 0
/// - group only when a group field is mapped and present
pub fn normalize_rows(rows: &[Map<String, Value>], fields: &FieldMapping) -> Vec<Datum> {
    rows.iter()
        .enumerate()
        .map(|(idx, row)| {
            let target = row
                .get(&fields.category_field)
                .and_then(label_of)
                .unwrap_or_else(|| format!("Result {}", idx + 1));
            let value = row
                .get(&fields.measure_field)
                .and_then(number_of)
                .unwrap_or(0.0);
            let group = fields
                .group_field
                .as_ref()
                .and_then(|g| row.get(g))
                .and_then(label_of);

            Datum::new(
                fields.category_field.as_str(),
                fields.measure_field.as_str(),
                target,
                value,
            )
            .with_optional_group(group)
        })
        .collect()
}

/// String form of a scalar JSON value. Null, arrays and objects have none.
pub fn label_of(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(match n.as_f64() {
            Some(f) if n.is_f64() => format_number(f),
            _ => n.to_string(),
        }),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Finite numeric form of a JSON value. Numeric strings parse; blanks do not.
pub fn number_of(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64().filter(|f| f.is_finite()),
        Value::String(s) => parse_number(s),
        _ => None,
    }
}

/// Parse a trimmed, non-empty string as a finite number
pub fn parse_number(s: &str) -> Option<f64> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.parse::<f64>().ok().filter(|f| f.is_finite())
}

/// Render a number the way labels show it (`9` rather than `9.0`)
pub fn format_number(value: f64) -> String {
    format!("{}", value)
}
