//! Binary comparisons: compare, compareBool, diff
//!
//! Each side is a label or an object selector resolved with `resolve_side`
//! and collapsed with the descriptor's aggregate. A side that matches nothing, or has no finite
//! values, yields `Null`.

use crate::datum::{BoolValue, Datum, DEFAULT_CATEGORY, DEFAULT_MEASURE};
use crate::observability::{log_event, Event};
use crate::predicate::FilterOperator;

use super::operation::{Aggregate, CompareOp, DiffOp, Extremum, Selector, SideQuery};
use super::output::OpOutput;
use super::select::{measure_of, resolve_side};

/// Decimal places an f64 can carry; larger precisions are clamped
const MAX_DIFF_PRECISION: u32 = 15;

struct Sides<'a> {
    a_key: String,
    b_key: String,
    a: Vec<&'a Datum>,
    a_value: f64,
    b_value: f64,
    b: Vec<&'a Datum>,
}

#[allow(clippy::too_many_arguments)]
fn resolve_sides<'a>(
    data: &'a [Datum],
    op_name: &str,
    target_a: &Selector,
    target_b: &Selector,
    group: Option<&str>,
    field: Option<&str>,
    aggregate: Aggregate,
    is_last: bool,
) -> Option<Sides<'a>> {
    let unnamed = || SideQuery {
        key: String::new(),
        group: group.map(str::to_string),
        by_id: false,
    };
    let a_side = target_a.side(group).unwrap_or_else(unnamed);
    let b_side = target_b.side(group).unwrap_or_else(unnamed);

    let a = resolve_side(data, &a_side, is_last);
    let b = resolve_side(data, &b_side, is_last);
    let (a_key, b_key) = (a_side.key, b_side.key);
    if a.is_empty() || b.is_empty() {
        let missing = if a.is_empty() { &a_key } else { &b_key };
        log_event(Event::NoMatch, &[("op", op_name), ("target", missing.as_str())]);
        return None;
    }

    let a_value = aggregate.apply(a.iter().map(|d| measure_of(d, field)))?;
    let b_value = aggregate.apply(b.iter().map(|d| measure_of(d, field)))?;

    Some(Sides {
        a_key,
        b_key,
        a,
        a_value,
        b_value,
        b,
    })
}

/// The winning side's first Datum.
///
/// The mode is `which` when given, else derived from `operator` (`<`/`<=`
/// pick the smaller side, `>`/`>=` the larger), else max. Equal sides
/// have no winner.
pub fn compare(data: &[Datum], op: &CompareOp, is_last: bool) -> OpOutput {
    let sides = match resolve_sides(
        data,
        "compare",
        &op.target_a,
        &op.target_b,
        op.group.as_deref(),
        op.field.as_deref(),
        op.aggregate,
        is_last,
    ) {
        Some(s) => s,
        None => return OpOutput::Null,
    };

    let mode = op.which.unwrap_or_else(|| {
        match op.operator.as_deref().and_then(FilterOperator::parse) {
            Some(FilterOperator::Lt) | Some(FilterOperator::Lte) => Extremum::Min,
            _ => Extremum::Max,
        }
    });

    if sides.a_value == sides.b_value {
        return OpOutput::Null;
    }
    let a_wins = match mode {
        Extremum::Max => sides.a_value > sides.b_value,
        Extremum::Min => sides.a_value < sides.b_value,
    };

    let winner = if a_wins { &sides.a } else { &sides.b };
    OpOutput::Datum(winner[0].clone())
}

/// `A op B` as a BoolValue. Operators outside the six comparisons read as `>`.
pub fn compare_bool(data: &[Datum], op: &CompareOp, is_last: bool) -> OpOutput {
    let sides = match resolve_sides(
        data,
        "compareBool",
        &op.target_a,
        &op.target_b,
        op.group.as_deref(),
        op.field.as_deref(),
        op.aggregate,
        is_last,
    ) {
        Some(s) => s,
        None => return OpOutput::Null,
    };

    let operator = op
        .operator
        .as_deref()
        .and_then(FilterOperator::parse)
        .filter(|o| {
            matches!(
                o,
                FilterOperator::Gt
                    | FilterOperator::Gte
                    | FilterOperator::Lt
                    | FilterOperator::Lte
                    | FilterOperator::Eq
                    | FilterOperator::Ne
            )
        })
        .unwrap_or(FilterOperator::Gt);

    let result = operator.compare(sides.a_value, sides.b_value, sides.b_value);
    let label = format!("{} {} {}", sides.a_key, operator, sides.b_key);
    OpOutput::Bool(BoolValue::new(label, result))
}

/// `A - B` as a Datum targeted `"Diff"`. `Null` if the difference overflows.
pub fn diff(data: &[Datum], op: &DiffOp, is_last: bool) -> OpOutput {
    let sides = match resolve_sides(
        data,
        "diff",
        &op.target_a,
        &op.target_b,
        op.group.as_deref(),
        op.field.as_deref(),
        op.aggregate,
        is_last,
    ) {
        Some(s) => s,
        None => return OpOutput::Null,
    };

    let mut value = sides.a_value - sides.b_value;
    if !value.is_finite() {
        return OpOutput::Null;
    }
    if let Some(places) = op.precision {
        let factor = 10f64.powi(places.min(MAX_DIFF_PRECISION) as i32);
        let rounded = (value * factor).round() / factor;
        if rounded.is_finite() {
            value = rounded;
        }
    }

    let (category, measure) = data
        .first()
        .map(|d| (d.category.as_str(), d.measure.as_str()))
        .unwrap_or((DEFAULT_CATEGORY, DEFAULT_MEASURE));

    let group = op
        .group
        .clone()
        .or_else(|| sides.a.first().and_then(|d| d.group.clone()));
    OpOutput::Datum(Datum::new(category, measure, "Diff", value).with_optional_group(group))
}
