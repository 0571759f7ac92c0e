//! Filter predicate engine
//!
//! Shared by the `filter` operation and by adapters that need to highlight
//! the same subset the operation selected.

mod engine;
mod field;
mod operator;
mod temporal;

pub use engine::{FieldClass, FilterEngine, FilterRequest};
pub use field::{FieldAccessor, FieldValue};
pub use operator::FilterOperator;
pub use temporal::{clears_threshold, parse_temporal, parse_temporal_value, DEFAULT_TEMPORAL_THRESHOLD};
