//! Operation descriptors
//!
//! Every step of an explanation is one of these. The set is closed: a
//! descriptor whose `op` is not recognized becomes `Unsupported` instead of
//! failing the whole spec, and the interpreter passes its input through.

use serde::de::{self, Deserializer};
use serde::ser::{self, Serializer};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::datum::label_of;

/// All operation kinds
#[derive(Debug, Clone, PartialEq)]
pub enum Operation {
    RetrieveValue(RetrieveValueOp),
    Filter(FilterOp),
    FindExtremum(ExtremumOp),
    DetermineRange(RangeOp),
    Compare(CompareOp),
    CompareBool(CompareOp),
    Sort(SortOp),
    Sum(AggregateOp),
    Average(AggregateOp),
    Diff(DiffOp),
    Nth(NthOp),
    Count(CountOp),
    LagDiff(LagDiffOp),
    /// Descriptor with an unrecognized `op`
    Unsupported { name: String },
}

impl Operation {
    /// Operation name as written in descriptors
    pub fn name(&self) -> &str {
        match self {
            Self::RetrieveValue(_) => "retrieveValue",
            Self::Filter(_) => "filter",
            Self::FindExtremum(_) => "findExtremum",
            Self::DetermineRange(_) => "determineRange",
            Self::Compare(_) => "compare",
            Self::CompareBool(_) => "compareBool",
            Self::Sort(_) => "sort",
            Self::Sum(_) => "sum",
            Self::Average(_) => "average",
            Self::Diff(_) => "diff",
            Self::Nth(_) => "nth",
            Self::Count(_) => "count",
            Self::LagDiff(_) => "lagDiff",
            Self::Unsupported { name } => name.as_str(),
        }
    }

    /// Returns true if the kind was recognized
    pub fn is_supported(&self) -> bool {
        !matches!(self, Self::Unsupported { .. })
    }

    /// Build from a JSON descriptor `{ "op": "...", ...params }`.
    ///
    /// A missing `op` or malformed parameters of a known kind are errors;
    /// an unknown `op` is not.
    pub fn from_value(raw: Value) -> Result<Self, serde_json::Error> {
        let name = match raw.get("op") {
            Some(Value::String(s)) => s.clone(),
            Some(_) => return Err(de::Error::custom("\"op\" must be a string")),
            None => return Err(de::Error::missing_field("op")),
        };

        let op = match name.as_str() {
            "retrieveValue" => Self::RetrieveValue(serde_json::from_value(raw)?),
            "filter" => Self::Filter(serde_json::from_value(raw)?),
            "findExtremum" => Self::FindExtremum(serde_json::from_value(raw)?),
            "determineRange" => Self::DetermineRange(serde_json::from_value(raw)?),
            "compare" => Self::Compare(serde_json::from_value(raw)?),
            "compareBool" => Self::CompareBool(serde_json::from_value(raw)?),
            "sort" => Self::Sort(serde_json::from_value(raw)?),
            "sum" => Self::Sum(serde_json::from_value(raw)?),
            "average" => Self::Average(serde_json::from_value(raw)?),
            "diff" => Self::Diff(serde_json::from_value(raw)?),
            "nth" => Self::Nth(serde_json::from_value(raw)?),
            "count" => Self::Count(serde_json::from_value(raw)?),
            "lagDiff" => Self::LagDiff(serde_json::from_value(raw)?),
            _ => Self::Unsupported { name },
        };
        Ok(op)
    }

    /// Descriptor form, the inverse of `from_value`
    pub fn to_value(&self) -> Result<Value, serde_json::Error> {
        let params = match self {
            Self::RetrieveValue(p) => serde_json::to_value(p)?,
            Self::Filter(p) => serde_json::to_value(p)?,
            Self::FindExtremum(p) => serde_json::to_value(p)?,
            Self::DetermineRange(p) => serde_json::to_value(p)?,
            Self::Compare(p) | Self::CompareBool(p) => serde_json::to_value(p)?,
            Self::Sort(p) => serde_json::to_value(p)?,
            Self::Sum(p) | Self::Average(p) => serde_json::to_value(p)?,
            Self::Diff(p) => serde_json::to_value(p)?,
            Self::Nth(p) => serde_json::to_value(p)?,
            Self::Count(p) => serde_json::to_value(p)?,
            Self::LagDiff(p) => serde_json::to_value(p)?,
            Self::Unsupported { .. } => Value::Object(Map::new()),
        };

        let mut object = match params {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        object.insert("op".to_string(), Value::String(self.name().to_string()));
        Ok(Value::Object(object))
    }
}

impl<'de> Deserialize<'de> for Operation {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Value::deserialize(deserializer)?;
        Operation::from_value(raw).map_err(de::Error::custom)
    }
}

impl Serialize for Operation {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_value()
            .map_err(ser::Error::custom)?
            .serialize(serializer)
    }
}

/// Which end of the order to pick
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Extremum {
    #[default]
    #[serde(alias = "maximum", alias = "MAX", alias = "Max")]
    Max,
    #[serde(alias = "minimum", alias = "MIN", alias = "Min")]
    Min,
}

/// How the Datums of one comparison side collapse to a number
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Aggregate {
    #[default]
    Sum,
    #[serde(alias = "average", alias = "mean")]
    Avg,
    Min,
    Max,
}

impl Aggregate {
    /// Collapse finite values. `None` when nothing finite remains.
    pub fn apply(&self, values: impl IntoIterator<Item = f64>) -> Option<f64> {
        let finite: Vec<f64> = values.into_iter().filter(|v| v.is_finite()).collect();
        if finite.is_empty() {
            return None;
        }
        let total: f64 = finite.iter().sum();
        let result = match self {
            Aggregate::Sum => total,
            Aggregate::Avg => total / finite.len() as f64,
            Aggregate::Min => finite.iter().copied().fold(f64::INFINITY, f64::min),
            Aggregate::Max => finite.iter().copied().fold(f64::NEG_INFINITY, f64::max),
        };
        Some(result)
    }
}

/// Sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    #[serde(alias = "ascending", alias = "ASC")]
    Asc,
    #[serde(alias = "descending", alias = "DESC")]
    Desc,
}

/// Counting direction for `nth`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    #[default]
    Left,
    Right,
}

/// A selection key: a single label, an object, or a list of either.
///
/// Numbers are accepted and compared through their label (`2021` matches
/// the target `"2021"`). Objects name one Datum as `{id}`, `{target, group}`
/// or `{category, series}`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Selector(pub Value);

/// One side of a binary operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SideQuery {
    pub key: String,
    pub group: Option<String>,
    /// `key` is a Datum id rather than a target label
    pub by_id: bool,
}

impl Selector {
    pub fn new(value: impl Into<Value>) -> Self {
        Self(value.into())
    }

    /// Labels named by this selector
    pub fn keys(&self) -> Vec<String> {
        match &self.0 {
            Value::Array(items) => items.iter().filter_map(key_of).collect(),
            other => key_of(other).into_iter().collect(),
        }
    }

    /// First label, used for the sides of binary operations
    pub fn key(&self) -> Option<String> {
        self.keys().into_iter().next()
    }

    /// First entry as a side query. Object selectors bring their own group;
    /// everything else is scoped to `fallback_group`.
    pub fn side(&self, fallback_group: Option<&str>) -> Option<SideQuery> {
        let first = match &self.0 {
            Value::Array(items) => items.first()?,
            other => other,
        };
        match first {
            Value::Object(fields) => object_side(fields, fallback_group),
            other => label_of(other).map(|key| SideQuery {
                key,
                group: fallback_group.map(str::to_string),
                by_id: false,
            }),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.keys().is_empty()
    }
}

fn first_label(fields: &Map<String, Value>, names: &[&str]) -> Option<String> {
    names.iter().find_map(|name| fields.get(*name).and_then(label_of))
}

fn object_side(fields: &Map<String, Value>, fallback_group: Option<&str>) -> Option<SideQuery> {
    let group = first_label(fields, &["series", "group", "key"])
        .or_else(|| fallback_group.map(str::to_string));

    if let Some(id) = first_label(fields, &["id"]) {
        return Some(SideQuery {
            key: id,
            group,
            by_id: true,
        });
    }
    let key = first_label(fields, &["category", "target", "facet"])?;
    Some(SideQuery {
        key,
        group,
        by_id: false,
    })
}

fn key_of(value: &Value) -> Option<String> {
    match value {
        Value::Object(fields) => first_label(fields, &["id", "category", "target", "facet"]),
        other => label_of(other),
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RetrieveValueOp {
    #[serde(default)]
    pub target: Selector,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterOp {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operator: Option<String>,
    #[serde(default)]
    pub value: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value2: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtremumOp {
    #[serde(default)]
    pub which: Extremum,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RangeOp {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
}

/// Parameters shared by `compare` and `compareBool`
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompareOp {
    #[serde(default)]
    pub target_a: Selector,
    #[serde(default)]
    pub target_b: Selector,
    #[serde(default)]
    pub aggregate: Aggregate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub which: Option<Extremum>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operator: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SortOp {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    #[serde(default)]
    pub order: SortOrder,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aggregate: Option<Aggregate>,
}

/// Parameters shared by `sum` and `average`
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregateOp {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiffOp {
    #[serde(default)]
    pub target_a: Selector,
    #[serde(default)]
    pub target_b: Selector,
    #[serde(default)]
    pub aggregate: Aggregate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
    /// Decimal places to round the difference to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub precision: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NthOp {
    /// 1-based position; defaults to 1
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub n: Option<i64>,
    #[serde(default)]
    pub from: Side,
    /// `"group"` or `"target"`: pick every Datum of the nth distinct key
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_by: Option<String>,
}

/// `count` counts every Datum; `group` only labels the result
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CountOp {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LagDiffOp {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
}
