//! findExtremum and determineRange

use crate::datum::{Datum, IntervalValue};

use super::operation::{Extremum, ExtremumOp, RangeOp};
use super::output::OpOutput;
use super::select::{in_scope, measure_of};

/// First Datum holding the minimum or maximum finite value in scope.
///
/// Comparison is strict, so the earliest Datum wins a tie.
pub fn find_extremum(data: &[Datum], op: &ExtremumOp) -> OpOutput {
    let field = op.field.as_deref();
    let mut best: Option<(&Datum, f64)> = None;

    for d in in_scope(data, op.group.as_deref()) {
        let v = measure_of(d, field);
        if !v.is_finite() {
            continue;
        }
        let better = match best {
            None => true,
            Some((_, current)) => match op.which {
                Extremum::Max => v > current,
                Extremum::Min => v < current,
            },
        };
        if better {
            best = Some((d, v));
        }
    }

    best.map(|(d, _)| d.clone()).into()
}

/// Value interval of the scope.
///
/// With a group: min and max over that series, labelled with the group.
/// Without: min and max over per-target totals across series, labelled
/// with the category axis name. For ungrouped data the totals are the
/// plain values.
pub fn determine_range(data: &[Datum], op: &RangeOp) -> OpOutput {
    let field = op.field.as_deref();

    let (label, values) = match op.group.as_deref() {
        Some(group) => {
            let values: Vec<f64> = in_scope(data, Some(group))
                .into_iter()
                .map(|d| measure_of(d, field))
                .filter(|v| v.is_finite())
                .collect();
            (group.to_string(), values)
        }
        None => {
            let label = match data.first() {
                Some(d) => d.category.clone(),
                None => return OpOutput::Null,
            };
            (label, target_totals(data, field).into_iter().map(|(_, v)| v).collect())
        }
    };

    if values.is_empty() {
        return OpOutput::Null;
    }

    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    OpOutput::Interval(IntervalValue::new(label, min, max))
}

/// Finite totals per target, in first-appearance order
pub(crate) fn target_totals(data: &[Datum], field: Option<&str>) -> Vec<(String, f64)> {
    let mut totals: Vec<(String, f64)> = Vec::new();
    for d in data {
        let v = measure_of(d, field);
        if !v.is_finite() {
            continue;
        }
        match totals.iter_mut().find(|(t, _)| *t == d.target) {
            Some((_, total)) => *total += v,
            None => totals.push((d.target.clone(), v)),
        }
    }
    totals
}

#[cfg(test)]
mod tests {
    use super::*;

    fn simple() -> Vec<Datum> {
        vec![
            Datum::new("year", "cases", "2020", 5.0),
            Datum::new("year", "cases", "2021", 9.0),
            Datum::new("year", "cases", "2022", 9.0),
            Datum::new("year", "cases", "2023", f64::NAN),
        ]
    }

    #[test]
    fn test_max_first_encounter_wins() {
        let data = simple();
        let out = find_extremum(&data, &ExtremumOp::default());
        assert_eq!(out, OpOutput::Datum(data[1].clone()));
    }

    #[test]
    fn test_min() {
        let data = simple();
        let op = ExtremumOp {
            which: Extremum::Min,
            ..Default::default()
        };
        assert_eq!(find_extremum(&data, &op), OpOutput::Datum(data[0].clone()));
    }

    #[test]
    fn test_extremum_without_finite_values() {
        let data = vec![Datum::new("year", "cases", "2020", f64::NAN)];
        assert!(find_extremum(&data, &ExtremumOp::default()).is_null());
        assert!(find_extremum(&[], &ExtremumOp::default()).is_null());
    }

    #[test]
    fn test_range_global_uses_target_totals() {
        let data = vec![
            Datum::new("year", "cases", "2020", 5.0).with_group("a"),
            Datum::new("year", "cases", "2020", 3.0).with_group("b"),
            Datum::new("year", "cases", "2021", 2.0).with_group("a"),
            Datum::new("year", "cases", "2021", 1.0).with_group("b"),
        ];
        let out = determine_range(&data, &RangeOp::default());
        assert_eq!(out, OpOutput::Interval(IntervalValue::new("year", 3.0, 8.0)));
    }

    #[test]
    fn test_range_in_group() {
        let data = vec![
            Datum::new("year", "cases", "2020", 5.0).with_group("a"),
            Datum::new("year", "cases", "2020", 3.0).with_group("b"),
            Datum::new("year", "cases", "2021", 2.0).with_group("a"),
        ];
        let op = RangeOp {
            group: Some("a".into()),
            field: None,
        };
        let out = determine_range(&data, &op);
        assert_eq!(out, OpOutput::Interval(IntervalValue::new("a", 2.0, 5.0)));
    }

    #[test]
    fn test_range_empty_scope() {
        assert!(determine_range(&[], &RangeOp::default()).is_null());
        let op = RangeOp {
            group: Some("zzz".into()),
            field: None,
        };
        assert!(determine_range(&simple(), &op).is_null());
    }
}
