//! Terminal dataset assembly
//!
//! Flattens the result store into the dataset the terminal stage runs
//! against. Each stored Datum gets a display label; labels that collide
//! within a group are disambiguated with value and stage key.

use std::collections::HashMap;

use crate::datum::{format_number, Datum, DEFAULT_CATEGORY, DEFAULT_MEASURE};
use crate::store::StoredDatum;

/// Default separator between a label and its group
pub const DEFAULT_LABEL_SEPARATOR: &str = " · ";

/// Build the terminal dataset from stored results, in store order.
///
/// Stored ids are kept so terminal operations can address earlier results
/// by `"<stage>_<index>"`.
pub fn build_terminal_dataset(stored: &[StoredDatum], separator: &str) -> Vec<Datum> {
    let category = shared(stored, |d| d.category.as_str()).unwrap_or(DEFAULT_CATEGORY);
    let measure = shared(stored, |d| d.measure.as_str()).unwrap_or(DEFAULT_MEASURE);

    let labels: Vec<String> = stored
        .iter()
        .enumerate()
        .map(|(i, s)| base_label(&s.datum, i, separator))
        .collect();

    let mut occurrences: HashMap<(&str, Option<&str>), usize> = HashMap::new();
    for (label, s) in labels.iter().zip(stored) {
        *occurrences.entry((label.as_str(), s.datum.group.as_deref())).or_default() += 1;
    }

    stored
        .iter()
        .zip(labels.iter())
        .map(|(s, label)| {
            let collides = occurrences
                .get(&(label.as_str(), s.datum.group.as_deref()))
                .is_some_and(|n| *n > 1);
            let target = if collides {
                format!("{} ({} @ {})", label, format_number(s.datum.value), s.key)
            } else {
                label.clone()
            };

            Datum {
                category: category.to_string(),
                measure: measure.to_string(),
                target,
                group: s.datum.group.clone(),
                value: s.datum.value,
                id: s.datum.id.clone().or_else(|| Some(s.key.clone())),
                name: s.datum.name.clone(),
            }
        })
        .collect()
}

fn base_label(datum: &Datum, index: usize, separator: &str) -> String {
    let base = datum
        .name
        .as_deref()
        .filter(|n| !n.is_empty())
        .or_else(|| Some(datum.target.as_str()).filter(|t| !t.is_empty()))
        .map(str::to_string)
        .unwrap_or_else(|| format!("Result {}", index + 1));

    match datum.group.as_deref() {
        Some(group) if !group.is_empty() => format!("{}{}{}", base, separator, group),
        _ => base,
    }
}

fn shared<'a>(stored: &'a [StoredDatum], field: impl Fn(&'a Datum) -> &'a str) -> Option<&'a str> {
    let first = field(&stored.first()?.datum);
    stored.iter().all(|s| field(&s.datum) == first).then_some(first)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stored(key: &str, datum: Datum) -> StoredDatum {
        StoredDatum {
            key: key.to_string(),
            datum,
        }
    }

    #[test]
    fn test_labels_and_canonical_axes() {
        let items = vec![
            stored("ops", Datum::new("year", "cases", "2020", 5.0).with_id("ops_0")),
            stored("ops2", Datum::new("year", "cases", "2021", 9.0).with_group("north").with_id("ops2_0")),
        ];
        let out = build_terminal_dataset(&items, DEFAULT_LABEL_SEPARATOR);

        assert_eq!(out[0].target, "2020");
        assert_eq!(out[1].target, "2021 · north");
        assert_eq!(out[0].category, "year");
        assert_eq!(out[1].measure, "cases");
        assert!(out[0].has_id("ops_0"));
        assert!(out[1].has_id("ops2_0"));
    }

    #[test]
    fn test_mixed_axes_fall_back_to_defaults() {
        let items = vec![
            stored("a", Datum::new("year", "cases", "x", 1.0)),
            stored("b", Datum::new("month", "cases", "y", 2.0)),
        ];
        let out = build_terminal_dataset(&items, DEFAULT_LABEL_SEPARATOR);
        assert_eq!(out[0].category, DEFAULT_CATEGORY);
        assert_eq!(out[0].measure, "cases");
    }

    #[test]
    fn test_collisions_disambiguated() {
        let items = vec![
            stored("ops", Datum::new("year", "cases", "2021", 9.0).with_id("ops_0")),
            stored("ops2", Datum::new("year", "cases", "2021", 12.5).with_id("ops2_0")),
            stored("ops3", Datum::new("year", "cases", "2022", 1.0).with_id("ops3_0")),
        ];
        let out = build_terminal_dataset(&items, DEFAULT_LABEL_SEPARATOR);
        assert_eq!(out[0].target, "2021 (9 @ ops)");
        assert_eq!(out[1].target, "2021 (12.5 @ ops2)");
        assert_eq!(out[2].target, "2022");
    }

    /// Stage keys are used whole, even when they end in `_<digits>`.
    #[test]
    fn test_collision_suffix_keeps_full_stage_key() {
        let items = vec![
            stored("step_1", Datum::new("year", "cases", "2021", 9.0).with_id("step_1_0")),
            stored("step_2", Datum::new("year", "cases", "2021", 9.0).with_id("step_2_0")),
        ];
        let out = build_terminal_dataset(&items, DEFAULT_LABEL_SEPARATOR);
        assert_eq!(out[0].target, "2021 (9 @ step_1)");
        assert_eq!(out[1].target, "2021 (9 @ step_2)");
        assert_ne!(out[0].target, out[1].target);
    }

    #[test]
    fn test_name_then_placeholder() {
        let items = vec![
            stored("a", Datum::new("year", "cases", "2021", 1.0).with_name("Peak")),
            stored("b", Datum::new("year", "cases", "", 2.0)),
        ];
        let out = build_terminal_dataset(&items, " / ");
        assert_eq!(out[0].target, "Peak");
        assert_eq!(out[1].target, "Result 2");
        assert!(out[1].has_id("b"));
    }

    #[test]
    fn test_empty_store() {
        assert!(build_terminal_dataset(&[], DEFAULT_LABEL_SEPARATOR).is_empty());
    }
}
