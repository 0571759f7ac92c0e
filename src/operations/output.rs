//! Operation outputs

use serde::{Deserialize, Serialize};

use crate::datum::{BoolValue, Datum, IntervalValue, ScalarValue};

/// Result of applying one operation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum OpOutput {
    Data(Vec<Datum>),
    Datum(Datum),
    Bool(BoolValue),
    Interval(IntervalValue),
    Scalar(ScalarValue),
    Null,
}

impl OpOutput {
    /// Variant name for logs
    pub fn kind(&self) -> &'static str {
        match self {
            OpOutput::Data(_) => "data",
            OpOutput::Datum(_) => "datum",
            OpOutput::Bool(_) => "bool",
            OpOutput::Interval(_) => "interval",
            OpOutput::Scalar(_) => "scalar",
            OpOutput::Null => "null",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, OpOutput::Null)
    }

    /// Number of Datums carried (0 for non-Datum outputs)
    pub fn datum_count(&self) -> usize {
        match self {
            OpOutput::Data(items) => items.len(),
            OpOutput::Datum(_) => 1,
            _ => 0,
        }
    }

    /// Borrow the Datums carried by this output, if it carries any shape of
    /// Datum at all
    pub fn datums(&self) -> Option<&[Datum]> {
        match self {
            OpOutput::Data(items) => Some(items),
            OpOutput::Datum(d) => Some(std::slice::from_ref(d)),
            _ => None,
        }
    }

    /// Dataset the next operation receives.
    ///
    /// `Data` passes as itself, `Datum` as a one-element list and `Null` as
    /// an empty list. `Bool`, `Interval` and `Scalar` are not datasets; the
    /// previous input is carried forward.
    pub fn into_next_input(self, previous: Vec<Datum>) -> Vec<Datum> {
        match self {
            OpOutput::Data(items) => items,
            OpOutput::Datum(d) => vec![d],
            OpOutput::Null => Vec::new(),
            OpOutput::Bool(_) | OpOutput::Interval(_) | OpOutput::Scalar(_) => previous,
        }
    }
}

impl From<Vec<Datum>> for OpOutput {
    fn from(items: Vec<Datum>) -> Self {
        OpOutput::Data(items)
    }
}

impl From<Option<Datum>> for OpOutput {
    fn from(datum: Option<Datum>) -> Self {
        datum.map(OpOutput::Datum).unwrap_or(OpOutput::Null)
    }
}
