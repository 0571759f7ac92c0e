//! Exhaustive dispatch from `Operation` to the operation functions

use crate::datum::Datum;
use crate::observability::{log_event, Event};
use crate::predicate::FilterEngine;

use super::aggregate::{average, count, lag_diff, sum};
use super::compare::{compare, compare_bool, diff};
use super::extremum::{determine_range, find_extremum};
use super::operation::Operation;
use super::output::OpOutput;
use super::select::{filter, nth, retrieve_value};
use super::sort::sort;

/// Applies operations to datasets.
///
/// Stateless apart from the filter engine's configuration; every call is
/// pure with respect to its input slice.
#[derive(Debug, Clone, Copy, Default)]
pub struct Interpreter {
    engine: FilterEngine,
}

impl Interpreter {
    pub fn new(engine: FilterEngine) -> Self {
        Self { engine }
    }

    pub fn filter_engine(&self) -> &FilterEngine {
        &self.engine
    }

    /// Apply one operation. `is_last` enables id-based lookups for the
    /// terminal stage.
    pub fn apply(&self, data: &[Datum], op: &Operation, is_last: bool) -> OpOutput {
        let output = match op {
            Operation::RetrieveValue(p) => retrieve_value(data, p, is_last),
            Operation::Filter(p) => filter(&self.engine, data, p),
            Operation::FindExtremum(p) => find_extremum(data, p),
            Operation::DetermineRange(p) => determine_range(data, p),
            Operation::Compare(p) => compare(data, p, is_last),
            Operation::CompareBool(p) => compare_bool(data, p, is_last),
            Operation::Sort(p) => sort(data, p),
            Operation::Sum(p) => sum(data, p),
            Operation::Average(p) => average(data, p),
            Operation::Diff(p) => diff(data, p, is_last),
            Operation::Nth(p) => nth(data, p),
            Operation::Count(p) => count(data, p),
            Operation::LagDiff(p) => lag_diff(data, p),
            Operation::Unsupported { name } => {
                log_event(Event::OperationUnsupported, &[("op", name.as_str())]);
                return OpOutput::Data(data.to_vec());
            }
        };

        let items = output.datum_count().to_string();
        log_event(
            Event::OperationApplied,
            &[("op", op.name()), ("kind", output.kind()), ("items", items.as_str())],
        );
        output
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::operations::CountOp;
    use serde_json::json;

    fn years() -> Vec<Datum> {
        vec![
            Datum::new("year", "cases", "2020", 5.0),
            Datum::new("year", "cases", "2021", 9.0),
        ]
    }

    fn op(raw: serde_json::Value) -> Operation {
        Operation::from_value(raw).unwrap()
    }

    #[test]
    fn test_dispatch() {
        let interp = Interpreter::default();
        let data = years();

        let out = interp.apply(&data, &op(json!({"op": "findExtremum", "which": "max"})), false);
        assert_eq!(out, OpOutput::Datum(data[1].clone()));

        let out = interp.apply(
            &data,
            &op(json!({"op": "filter", "field": "value", "operator": ">", "value": 5})),
            false,
        );
        assert_eq!(out, OpOutput::Data(vec![data[1].clone()]));
    }

    #[test]
    fn test_unsupported_passes_through() {
        let interp = Interpreter::default();
        let data = years();
        let out = interp.apply(&data, &op(json!({"op": "explode"})), false);
        assert_eq!(out, OpOutput::Data(data));
    }

    #[test]
    fn test_count_on_empty() {
        let interp = Interpreter::default();
        match interp.apply(&[], &Operation::Count(CountOp::default()), false) {
            OpOutput::Datum(d) => assert_eq!(d.value, 0.0),
            other => panic!("unexpected {:?}", other),
        }
    }
}
