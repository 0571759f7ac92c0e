//! Stable sort with natural label ordering

use std::cmp::Ordering;
use std::sync::OnceLock;

use regex::Regex;

use crate::datum::Datum;
use crate::predicate::FieldAccessor;

use super::extremum::target_totals;
use super::operation::{Aggregate, SortOp, SortOrder};
use super::output::OpOutput;
use super::select::measure_of;

fn chunk_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\d+|\D+").expect("chunk pattern compiles"))
}

/// Natural ordering: digit runs compare numerically, text case-insensitively.
///
/// `"Q2" < "Q10"`, `"item 9" < "item 10"`, `"apple" == "Apple"`.
pub fn natural_cmp(a: &str, b: &str) -> Ordering {
    let pattern = chunk_pattern();
    let mut left = pattern.find_iter(a).map(|m| m.as_str());
    let mut right = pattern.find_iter(b).map(|m| m.as_str());

    loop {
        match (left.next(), right.next()) {
            (None, None) => return Ordering::Equal,
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(x), Some(y)) => {
                let ord = compare_chunk(x, y);
                if ord != Ordering::Equal {
                    return ord;
                }
            }
        }
    }
}

fn compare_chunk(x: &str, y: &str) -> Ordering {
    let x_digits = x.bytes().all(|b| b.is_ascii_digit());
    let y_digits = y.bytes().all(|b| b.is_ascii_digit());

    if x_digits && y_digits {
        // Compare by magnitude without parsing, so long runs cannot overflow
        let x = x.trim_start_matches('0');
        let y = y.trim_start_matches('0');
        x.len().cmp(&y.len()).then_with(|| x.cmp(y))
    } else {
        x.to_lowercase().cmp(&y.to_lowercase())
    }
}

/// Non-finite values sort after every finite one, whatever the direction
fn numeric_cmp(a: f64, b: f64, order: SortOrder) -> Ordering {
    match (a.is_finite(), b.is_finite()) {
        (false, false) => Ordering::Equal,
        (false, true) => Ordering::Greater,
        (true, false) => Ordering::Less,
        (true, true) => {
            let ord = a.partial_cmp(&b).unwrap_or(Ordering::Equal);
            match order {
                SortOrder::Asc => ord,
                SortOrder::Desc => ord.reverse(),
            }
        }
    }
}

/// Reorder a copy of the dataset.
///
/// The field defaults to the target. Fields resolving to the measure sort
/// numerically; with `aggregate: sum` Datums order by their target's total
/// across series. Everything else sorts by natural label order.
pub fn sort(data: &[Datum], op: &SortOp) -> OpOutput {
    let mut sorted = data.to_vec();
    let Some(first) = data.first() else {
        return OpOutput::Data(sorted);
    };

    let field = op.field.as_deref().unwrap_or("target");
    let accessor = FieldAccessor::resolve(field, first);

    if accessor.is_numeric() {
        if op.aggregate == Some(Aggregate::Sum) {
            let totals = target_totals(data, None);
            let total_of = |d: &Datum| {
                totals
                    .iter()
                    .find(|(t, _)| *t == d.target)
                    .map(|(_, v)| *v)
                    .unwrap_or(f64::NAN)
            };
            sorted.sort_by(|a, b| numeric_cmp(total_of(a), total_of(b), op.order));
        } else {
            sorted.sort_by(|a, b| {
                numeric_cmp(measure_of(a, None), measure_of(b, None), op.order)
            });
        }
    } else {
        sorted.sort_by(|a, b| {
            let ord = natural_cmp(&accessor.read(a).as_label(), &accessor.read(b).as_label());
            match op.order {
                SortOrder::Asc => ord,
                SortOrder::Desc => ord.reverse(),
            }
        });
    }

    OpOutput::Data(sorted)
}
