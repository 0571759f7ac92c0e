//! Datum model
//!
//! Canonical value types exchanged by every operation, and normalization of
//! the chart's raw rows into them.

mod normalize;
mod types;

pub use normalize::{
    format_number, label_of, normalize_rows, number_of, parse_number, BaseDataset, FieldMapping,
};
pub use types::{BoolValue, Datum, IntervalValue, ScalarValue, DEFAULT_CATEGORY, DEFAULT_MEASURE};
