//! Aggregates: sum, average, count, lagDiff

use crate::datum::{Datum, DEFAULT_CATEGORY, DEFAULT_MEASURE};

use super::operation::{AggregateOp, CountOp, LagDiffOp};
use super::output::OpOutput;
use super::select::{in_scope, measure_of};

fn axis_names(data: &[Datum]) -> (&str, &str) {
    data.first()
        .map(|d| (d.category.as_str(), d.measure.as_str()))
        .unwrap_or((DEFAULT_CATEGORY, DEFAULT_MEASURE))
}

fn finite_values(data: &[Datum], op: &AggregateOp) -> Option<Vec<f64>> {
    if data.is_empty() {
        return None;
    }
    let scope = in_scope(data, op.group.as_deref());
    if scope.is_empty() {
        return None;
    }
    Some(
        scope
            .into_iter()
            .map(|d| measure_of(d, op.field.as_deref()))
            .filter(|v| v.is_finite())
            .collect(),
    )
}

/// Total of the finite values in scope, as a Datum targeted `"Sum"`
pub fn sum(data: &[Datum], op: &AggregateOp) -> OpOutput {
    let values = match finite_values(data, op) {
        Some(v) => v,
        None => return OpOutput::Null,
    };
    let (category, measure) = axis_names(data);
    let total: f64 = values.iter().sum();
    OpOutput::Datum(Datum::new(category, measure, "Sum", total).with_optional_group(op.group.clone()))
}

/// Mean of the finite values in scope, as a Datum targeted `"Average"`
pub fn average(data: &[Datum], op: &AggregateOp) -> OpOutput {
    let values = match finite_values(data, op) {
        Some(v) if !v.is_empty() => v,
        _ => return OpOutput::Null,
    };
    let (category, measure) = axis_names(data);
    let mean = values.iter().sum::<f64>() / values.len() as f64;
    OpOutput::Datum(
        Datum::new(category, measure, "Average", mean).with_optional_group(op.group.clone()),
    )
}

/// Number of Datums. Never `Null`; an empty dataset counts 0. The
/// descriptor's group is carried on the result, not used as a scope.
pub fn count(data: &[Datum], op: &CountOp) -> OpOutput {
    let (category, measure) = axis_names(data);
    OpOutput::Datum(
        Datum::new(category, measure, "Count", data.len() as f64).with_optional_group(op.group.clone()),
    )
}

/// Consecutive differences in the current order.
///
/// One Datum per element after the first, carrying that element's target
/// and group with `value = current - previous`.
pub fn lag_diff(data: &[Datum], op: &LagDiffOp) -> OpOutput {
    let scope = in_scope(data, op.group.as_deref());
    if scope.len() < 2 {
        return OpOutput::Data(Vec::new());
    }

    let changes = scope
        .windows(2)
        .map(|pair| {
            let (prev, cur) = (pair[0], pair[1]);
            Datum::new(
                cur.category.as_str(),
                cur.measure.as_str(),
                cur.target.as_str(),
                cur.value - prev.value,
            )
            .with_optional_group(cur.group.clone())
        })
        .collect();

    OpOutput::Data(changes)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grouped() -> Vec<Datum> {
        vec![
            Datum::new("year", "cases", "2020", 5.0).with_group("a"),
            Datum::new("year", "cases", "2020", 3.0).with_group("b"),
            Datum::new("year", "cases", "2021", 9.0).with_group("a"),
            Datum::new("year", "cases", "2021", f64::NAN).with_group("b"),
        ]
    }

    fn value_of(out: OpOutput) -> f64 {
        match out {
            OpOutput::Datum(d) => d.value,
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_sum_skips_non_finite() {
        assert_eq!(value_of(sum(&grouped(), &AggregateOp::default())), 17.0);
    }

    #[test]
    fn test_sum_in_group_carries_group() {
        let op = AggregateOp {
            group: Some("a".into()),
            field: None,
        };
        match sum(&grouped(), &op) {
            OpOutput::Datum(d) => {
                assert_eq!(d.target, "Sum");
                assert_eq!(d.value, 14.0);
                assert_eq!(d.group.as_deref(), Some("a"));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_sum_and_average_empty() {
        assert!(sum(&[], &AggregateOp::default()).is_null());
        assert!(average(&[], &AggregateOp::default()).is_null());

        let op = AggregateOp {
            group: Some("zzz".into()),
            field: None,
        };
        assert!(sum(&grouped(), &op).is_null());
    }

    #[test]
    fn test_average() {
        let op = AggregateOp {
            group: Some("b".into()),
            field: None,
        };
        assert_eq!(value_of(average(&grouped(), &op)), 3.0);

        let all_nan = vec![Datum::new("k", "v", "x", f64::NAN)];
        assert!(average(&all_nan, &AggregateOp::default()).is_null());
    }

    #[test]
    fn test_count() {
        assert_eq!(value_of(count(&grouped(), &CountOp::default())), 4.0);
        match count(&[], &CountOp::default()) {
            OpOutput::Datum(d) => {
                assert_eq!(d.value, 0.0);
                assert_eq!(d.target, "Count");
                assert_eq!(d.category, DEFAULT_CATEGORY);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_count_carries_group() {
        let op = CountOp {
            group: Some("a".into()),
        };
        match count(&grouped(), &op) {
            OpOutput::Datum(d) => {
                assert_eq!(d.value, 4.0);
                assert_eq!(d.group.as_deref(), Some("a"));
            }
            other => panic!("unexpected {:?}", other),
        }
        assert!(matches!(count(&grouped(), &CountOp::default()), OpOutput::Datum(d) if d.group.is_none()));
    }

    #[test]
    fn test_lag_diff() {
        let data = vec![
            Datum::new("year", "cases", "2020", 5.0),
            Datum::new("year", "cases", "2021", 9.0),
            Datum::new("year", "cases", "2022", 7.0),
        ];
        let out = lag_diff(&data, &LagDiffOp::default());
        let items = out.datums().unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].target, "2021");
        assert_eq!(items[0].value, 4.0);
        assert_eq!(items[1].value, -2.0);

        let single = &data[..1];
        assert_eq!(lag_diff(single, &LagDiffOp::default()), OpOutput::Data(vec![]));
    }
}
