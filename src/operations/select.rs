//! Selection operations: retrieveValue, filter, nth
//!
//! Also holds the scope and side-resolution helpers the other operations
//! share.

use crate::datum::Datum;
use crate::observability::{log_event, Event};
use crate::predicate::{FieldAccessor, FilterEngine, FilterRequest};

use super::operation::{FilterOp, NthOp, RetrieveValueOp, Side, SideQuery};
use super::output::OpOutput;

/// Datums in `group`, or all of them
pub(crate) fn in_scope<'a>(data: &'a [Datum], group: Option<&str>) -> Vec<&'a Datum> {
    match group {
        Some(g) => data.iter().filter(|d| d.in_group(g)).collect(),
        None => data.iter().collect(),
    }
}

/// Numeric reading of a Datum. Without a field this is `value`; a field
/// that resolves to a label reads as its numeric parse. NaN when absent.
pub(crate) fn measure_of(d: &Datum, field: Option<&str>) -> f64 {
    match field {
        None => d.value,
        Some(f) => FieldAccessor::resolve(f, d)
            .read(d)
            .as_number()
            .unwrap_or(f64::NAN),
    }
}

/// Datums one side query refers to.
///
/// An id query selects by `id` only. In the terminal stage a label that
/// equals some Datum's `id` also selects by id (ids are unique, so the
/// group is ignored). Otherwise it selects by `target` within the side's
/// group.
pub(crate) fn resolve_side<'a>(data: &'a [Datum], side: &SideQuery, is_last: bool) -> Vec<&'a Datum> {
    if side.by_id || is_last {
        let by_id: Vec<&Datum> = data.iter().filter(|d| d.has_id(&side.key)).collect();
        if side.by_id || !by_id.is_empty() {
            return by_id;
        }
    }
    let group = side.group.as_deref();
    data.iter()
        .filter(|d| d.target == side.key && group.map_or(true, |g| d.in_group(g)))
        .collect()
}

/// Datums matching any of the requested targets, in input order
pub fn retrieve_value(data: &[Datum], op: &RetrieveValueOp, is_last: bool) -> OpOutput {
    let keys = op.target.keys();
    let group = op.group.as_deref();

    if keys.is_empty() {
        // A bare group selects the whole series
        return match group {
            Some(g) => OpOutput::Data(in_scope(data, Some(g)).into_iter().cloned().collect()),
            None => OpOutput::Data(Vec::new()),
        };
    }

    let id_keys: Vec<bool> = keys
        .iter()
        .map(|k| is_last && data.iter().any(|d| d.has_id(k)))
        .collect();

    let matched: Vec<Datum> = data
        .iter()
        .filter(|d| {
            keys.iter().zip(&id_keys).any(|(key, by_id)| {
                if *by_id {
                    d.has_id(key)
                } else {
                    d.target == *key && group.map_or(true, |g| d.in_group(g))
                }
            })
        })
        .cloned()
        .collect();

    if matched.is_empty() {
        let wanted = keys.join(",");
        log_event(
            Event::NoMatch,
            &[("op", "retrieveValue"), ("target", wanted.as_str())],
        );
    }

    OpOutput::Data(matched)
}

/// Delegate to the predicate engine
pub fn filter(engine: &FilterEngine, data: &[Datum], op: &FilterOp) -> OpOutput {
    let request = FilterRequest {
        field: op.field.as_deref(),
        operator: op.operator.as_deref(),
        value: &op.value,
        value2: op.value2.as_ref(),
        group: op.group.as_deref(),
    };
    OpOutput::Data(engine.filter(data, &request))
}

/// Element at a 1-based position, counted from either end.
///
/// With `groupBy`, positions count distinct keys instead of Datums and
/// every Datum carrying the picked key is returned.
pub fn nth(data: &[Datum], op: &NthOp) -> OpOutput {
    let n = op.n.unwrap_or(1);
    if n <= 0 {
        return OpOutput::Null;
    }
    let n = n as usize;

    let position = |total: usize| -> Option<usize> {
        if n > total {
            return None;
        }
        Some(match op.from {
            Side::Left => n - 1,
            Side::Right => total - n,
        })
    };

    match op.group_by.as_deref() {
        Some(group_by) => {
            let key_of = |d: &Datum| FieldAccessor::resolve(group_by, d).read(d).as_label();

            let mut keys: Vec<String> = Vec::new();
            for d in data {
                let key = key_of(d);
                if !keys.contains(&key) {
                    keys.push(key);
                }
            }

            match position(keys.len()) {
                Some(idx) => {
                    let picked = &keys[idx];
                    OpOutput::Data(data.iter().filter(|d| key_of(*d) == *picked).cloned().collect())
                }
                None => OpOutput::Null,
            }
        }
        None => match position(data.len()) {
            Some(idx) => OpOutput::Datum(data[idx].clone()),
            None => OpOutput::Null,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::operations::operation::Selector;
    use serde_json::json;

    fn grouped() -> Vec<Datum> {
        vec![
            Datum::new("year", "cases", "2020", 5.0).with_group("north"),
            Datum::new("year", "cases", "2020", 3.0).with_group("south"),
            Datum::new("year", "cases", "2021", 9.0).with_group("north"),
            Datum::new("year", "cases", "2021", 4.0).with_group("south"),
        ]
    }

    #[test]
    fn test_retrieve_by_target_and_group() {
        let data = grouped();
        let op = RetrieveValueOp {
            target: Selector::new("2021"),
            group: Some("south".into()),
        };
        let out = retrieve_value(&data, &op, false);
        assert_eq!(out.datums().unwrap(), &[data[3].clone()]);
    }

    #[test]
    fn test_retrieve_list_keeps_input_order() {
        let data = grouped();
        let op = RetrieveValueOp {
            target: Selector::new(json!(["2021", 2020])),
            group: Some("north".into()),
        };
        let out = retrieve_value(&data, &op, false);
        let values: Vec<f64> = out.datums().unwrap().iter().map(|d| d.value).collect();
        assert_eq!(values, vec![5.0, 9.0]);
    }

    #[test]
    fn test_retrieve_prefers_id_in_terminal_stage() {
        let data = vec![
            Datum::new("year", "cases", "s1_0", 1.0),
            Datum::new("year", "cases", "2021", 9.0).with_id("s1_0"),
        ];
        let op = RetrieveValueOp {
            target: Selector::new("s1_0"),
            group: None,
        };

        let last = retrieve_value(&data, &op, true);
        assert_eq!(last.datums().unwrap()[0].value, 9.0);

        let ordinary = retrieve_value(&data, &op, false);
        assert_eq!(ordinary.datums().unwrap()[0].value, 1.0);
    }

    #[test]
    fn test_retrieve_no_match() {
        let data = grouped();
        let op = RetrieveValueOp {
            target: Selector::new("1999"),
            group: None,
        };
        assert_eq!(retrieve_value(&data, &op, false), OpOutput::Data(vec![]));
    }

    #[test]
    fn test_nth_from_both_ends() {
        let data = grouped();
        let op = NthOp {
            n: Some(2),
            ..Default::default()
        };
        assert_eq!(nth(&data, &op), OpOutput::Datum(data[1].clone()));

        let op = NthOp {
            n: Some(1),
            from: Side::Right,
            group_by: None,
        };
        assert_eq!(nth(&data, &op), OpOutput::Datum(data[3].clone()));
    }

    #[test]
    fn test_nth_out_of_range() {
        let data = grouped();
        for n in [0, -1, 5] {
            let op = NthOp {
                n: Some(n),
                ..Default::default()
            };
            assert!(nth(&data, &op).is_null());
        }
    }

    #[test]
    fn test_nth_group_by() {
        let data = grouped();
        let op = NthOp {
            n: Some(2),
            from: Side::Left,
            group_by: Some("target".into()),
        };
        let out = nth(&data, &op);
        let picked = out.datums().unwrap();
        assert_eq!(picked.len(), 2);
        assert!(picked.iter().all(|d| d.target == "2021"));

        let op = NthOp {
            n: Some(1),
            from: Side::Right,
            group_by: Some("group".into()),
        };
        let out = nth(&data, &op);
        assert!(out.datums().unwrap().iter().all(|d| d.in_group("south")));
    }
}
