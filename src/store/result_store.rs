//! Keyed cache of normalized per-stage results
//!
//! Holds Datum only. Entries keep first-insertion order so the terminal
//! stage sees stage results in the order the stages ran.

use crate::datum::{Datum, DEFAULT_CATEGORY, DEFAULT_MEASURE};
use crate::observability::{log_event, Event};
use crate::operations::OpOutput;

/// Build a store key from a stage key and an index: `"<stage>_<index>"`
pub fn make_key(stage: &str, index: usize) -> String {
    format!("{}_{}", stage, index)
}

/// A Datum read back from the store, with the key it was stored under
#[derive(Debug, Clone, PartialEq)]
pub struct StoredDatum {
    pub key: String,
    pub datum: Datum,
}

/// Cross-stage result cache for one operation-spec execution
#[derive(Debug, Clone, Default)]
pub struct ResultStore {
    entries: Vec<(String, Vec<Datum>)>,
}

impl ResultStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Normalize `output` to Datums and store it under `key`.
    ///
    /// - `Data` keeps each Datum, `Datum` keeps one
    /// - `Scalar` becomes one Datum whose target is the key
    /// - `Bool`, `Interval` and `Null` carry no Datum
    ///
    /// Non-finite values are dropped and Datums without an id take the key
    /// as id. When nothing remains the key is removed. Returns the number
    /// of Datums stored.
    pub fn store(&mut self, key: &str, output: &OpOutput) -> usize {
        let normalized: Vec<Datum> = match output {
            OpOutput::Data(items) => items.clone(),
            OpOutput::Datum(d) => vec![d.clone()],
            OpOutput::Scalar(s) => vec![Datum::new(DEFAULT_CATEGORY, DEFAULT_MEASURE, key, s.value)],
            OpOutput::Bool(_) | OpOutput::Interval(_) | OpOutput::Null => Vec::new(),
        }
        .into_iter()
        .filter(|d| d.value.is_finite())
        .map(|mut d| {
            if d.id.is_none() {
                d.id = Some(key.to_string());
            }
            d
        })
        .collect();

        if normalized.is_empty() {
            self.remove(key);
            log_event(Event::ResultDropped, &[("key", key), ("kind", output.kind())]);
            return 0;
        }

        let count = normalized.len();
        match self.entries.iter_mut().find(|(k, _)| k == key) {
            Some((_, slot)) => *slot = normalized,
            None => self.entries.push((key.to_string(), normalized)),
        }

        let items = count.to_string();
        log_event(Event::ResultStored, &[("key", key), ("items", items.as_str())]);
        count
    }

    /// Clone of the Datums stored under `key`; empty when absent
    pub fn read(&self, key: &str) -> Vec<Datum> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, items)| items.clone())
            .unwrap_or_default()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.iter().any(|(k, _)| k == key)
    }

    /// Remove one key. Returns true if it was present.
    pub fn remove(&mut self, key: &str) -> bool {
        let before = self.entries.len();
        self.entries.retain(|(k, _)| k != key);
        self.entries.len() != before
    }

    /// Drop every entry
    pub fn reset(&mut self) {
        self.entries.clear();
    }

    /// Keys in insertion order
    pub fn keys(&self) -> Vec<&str> {
        self.entries.iter().map(|(k, _)| k.as_str()).collect()
    }

    /// Number of keys
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Every stored Datum, entry by entry in insertion order
    pub fn flatten(&self) -> Vec<StoredDatum> {
        self.entries
            .iter()
            .flat_map(|(key, items)| {
                items.iter().map(move |d| StoredDatum {
                    key: key.clone(),
                    datum: d.clone(),
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::datum::{BoolValue, IntervalValue, ScalarValue};

    fn d(target: &str, value: f64) -> Datum {
        Datum::new("year", "cases", target, value)
    }

    #[test]
    fn test_make_key() {
        assert_eq!(make_key("ops", 0), "ops_0");
        assert_eq!(make_key("s2", 3), "s2_3");
    }

    #[test]
    fn test_store_and_read() {
        let mut store = ResultStore::new();
        let stored = store.store("s1", &OpOutput::Data(vec![d("2020", 5.0), d("2021", 9.0)]));
        assert_eq!(stored, 2);

        let read = store.read("s1");
        assert_eq!(read.len(), 2);
        assert!(read.iter().all(|d| d.has_id("s1")));
    }

    #[test]
    fn test_existing_ids_are_kept() {
        let mut store = ResultStore::new();
        store.store("s1", &OpOutput::Datum(d("2021", 9.0).with_id("s1_0")));
        assert!(store.read("s1")[0].has_id("s1_0"));
    }

    #[test]
    fn test_scalar_becomes_datum() {
        let mut store = ResultStore::new();
        store.store("total", &OpOutput::Scalar(ScalarValue::new(42.0)));
        let read = store.read("total");
        assert_eq!(read[0].target, "total");
        assert_eq!(read[0].value, 42.0);
        assert_eq!(read[0].category, DEFAULT_CATEGORY);
    }

    #[test]
    fn test_non_datum_outputs_delete_key() {
        let mut store = ResultStore::new();
        store.store("s1", &OpOutput::Datum(d("2021", 9.0)));
        assert!(store.contains("s1"));

        store.store("s1", &OpOutput::Bool(BoolValue::new("a > b", true)));
        assert!(!store.contains("s1"));

        store.store("s2", &OpOutput::Interval(IntervalValue::new("year", 1.0, 2.0)));
        store.store("s3", &OpOutput::Null);
        assert!(store.is_empty());
    }

    #[test]
    fn test_non_finite_dropped() {
        let mut store = ResultStore::new();
        let stored = store.store("s1", &OpOutput::Data(vec![d("a", f64::NAN), d("b", 1.0)]));
        assert_eq!(stored, 1);

        store.store("s2", &OpOutput::Datum(d("c", f64::INFINITY)));
        assert!(!store.contains("s2"));
    }

    #[test]
    fn test_read_returns_clones() {
        let mut store = ResultStore::new();
        store.store("s1", &OpOutput::Datum(d("2021", 9.0)));

        let mut copy = store.read("s1");
        copy[0].value = -1.0;
        assert_eq!(store.read("s1")[0].value, 9.0);
        assert!(store.read("missing").is_empty());
    }

    #[test]
    fn test_insertion_order_survives_overwrite() {
        let mut store = ResultStore::new();
        store.store("b", &OpOutput::Datum(d("x", 1.0)));
        store.store("a", &OpOutput::Datum(d("y", 2.0)));
        store.store("b", &OpOutput::Datum(d("z", 3.0)));
        assert_eq!(store.keys(), vec!["b", "a"]);

        let flat = store.flatten();
        assert_eq!(flat[0].key, "b");
        assert_eq!(flat[0].datum.target, "z");
        assert_eq!(flat[1].key, "a");
    }

    #[test]
    fn test_reset() {
        let mut store = ResultStore::new();
        store.store("s1", &OpOutput::Datum(d("2021", 9.0)));
        store.reset();
        assert!(store.is_empty());
        assert!(store.flatten().is_empty());
    }
}
