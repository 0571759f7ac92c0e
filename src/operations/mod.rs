//! Operation library
//!
//! One pure function per operation kind, dispatched by `Interpreter`.
//! Functions take the current dataset by slice and return a fresh
//! `OpOutput`; they never modify or hand back their input.

mod aggregate;
mod compare;
mod extremum;
mod interpreter;
mod operation;
mod output;
mod select;
mod sort;

pub use aggregate::{average, count, lag_diff, sum};
pub use compare::{compare, compare_bool, diff};
pub use extremum::{determine_range, find_extremum};
pub use interpreter::Interpreter;
pub use operation::{
    Aggregate, AggregateOp, CompareOp, CountOp, DiffOp, Extremum, ExtremumOp, FilterOp, LagDiffOp, NthOp,
    Operation, RangeOp, RetrieveValueOp, Selector, Side, SideQuery, SortOp, SortOrder,
};
pub use output::OpOutput;
pub use select::{filter, nth, retrieve_value};
pub use sort::{natural_cmp, sort};
