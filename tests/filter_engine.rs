//! Filter Engine Tests
//!
//! - Idempotence on the temporal, numeric and membership paths
//! - Fail-closed behavior for unknown operators and open ranges
//! - Field classification against the temporal threshold
//! - Order dependence of the ordinal fallback

use chartstep::datum::Datum;
use chartstep::predicate::{FieldClass, FilterEngine, FilterRequest};
use serde_json::{json, Value};

fn dated() -> Vec<Datum> {
    vec![
        Datum::new("date", "cases", "2020-01-05", 3.0),
        Datum::new("date", "cases", "2020-03-01", 8.0),
        Datum::new("date", "cases", "2020-06-15", 4.0),
        Datum::new("date", "cases", "2021-02-10", 11.0),
    ]
}

fn targets(data: &[Datum]) -> Vec<&str> {
    data.iter().map(|d| d.target.as_str()).collect()
}

// =============================================================================
// Idempotence
// =============================================================================

#[test]
fn test_temporal_between_is_idempotent() {
    let engine = FilterEngine::default();
    let lo = json!("2020-02-01");
    let hi = json!("2020-12-31");
    let request = FilterRequest::new("target", "between", &lo).with_upper(&hi);

    let once = engine.filter(&dated(), &request);
    assert_eq!(targets(&once), vec!["2020-03-01", "2020-06-15"]);

    let twice = engine.filter(&once, &request);
    assert_eq!(once, twice);
}

#[test]
fn test_numeric_filter_is_idempotent() {
    let engine = FilterEngine::default();
    let five = json!(5);
    let request = FilterRequest::new("value", ">=", &five);

    let once = engine.filter(&dated(), &request);
    assert_eq!(targets(&once), vec!["2020-03-01", "2021-02-10"]);
    assert_eq!(engine.filter(&once, &request), once);
}

#[test]
fn test_membership_is_idempotent() {
    let engine = FilterEngine::default();
    let set = json!(["2020-01-05", "2021-02-10"]);
    let request = FilterRequest::new("target", "in", &set);

    let once = engine.filter(&dated(), &request);
    assert_eq!(once.len(), 2);
    assert_eq!(engine.filter(&once, &request), once);

    let not_in = engine.filter(&dated(), &FilterRequest::new("target", "not_in", &set));
    assert_eq!(targets(&not_in), vec!["2020-03-01", "2020-06-15"]);
}

// =============================================================================
// Fail-Closed Cases
// =============================================================================

#[test]
fn test_unknown_operator_is_empty() {
    let engine = FilterEngine::default();
    let v = json!(1);
    assert!(engine.filter(&dated(), &FilterRequest::new("value", "approximately", &v)).is_empty());
}

#[test]
fn test_between_without_upper_is_empty() {
    let engine = FilterEngine::default();
    let v = json!(4);
    assert!(engine.filter(&dated(), &FilterRequest::new("value", "between", &v)).is_empty());
}

#[test]
fn test_missing_operator_passes_through() {
    let engine = FilterEngine::default();
    let request = FilterRequest {
        field: Some("value"),
        operator: None,
        value: &Value::Null,
        value2: None,
        group: None,
    };
    assert_eq!(engine.filter(&dated(), &request), dated());
}

#[test]
fn test_group_scope_without_members_is_empty() {
    let engine = FilterEngine::default();
    let v = json!(0);
    let request = FilterRequest::new("value", ">", &v).in_group("nowhere");
    assert!(engine.filter(&dated(), &request).is_empty());
}

// =============================================================================
// Classification
// =============================================================================

#[test]
fn test_classification_threshold() {
    let engine = FilterEngine::default();
    assert_eq!(engine.classify_field(&dated(), "target"), FieldClass::Temporal);
    assert_eq!(engine.classify_field(&dated(), "value"), FieldClass::Numeric);

    // 2 of 5 labels are dates: under floor(5 * 0.6) = 3
    let mixed = vec![
        Datum::new("x", "y", "2020-01-01", 1.0),
        Datum::new("x", "y", "2020-02-01", 1.0),
        Datum::new("x", "y", "north", 1.0),
        Datum::new("x", "y", "south", 1.0),
        Datum::new("x", "y", "east", 1.0),
    ];
    assert_eq!(engine.classify_field(&mixed, "target"), FieldClass::Label);

    // floor(5 * 0.4) = 2
    let lenient = FilterEngine::new(0.4);
    assert_eq!(lenient.classify_field(&mixed, "target"), FieldClass::Temporal);
}

// =============================================================================
// Ordinal Fallback
// =============================================================================

/// The ordinal path slices by position, so the same request over a
/// reordered dataset selects a different subset.
#[test]
fn test_ordinal_between_depends_on_order() {
    let engine = FilterEngine::default();
    let data = vec![
        Datum::new("fruit", "sold", "apple", 1.0),
        Datum::new("fruit", "sold", "banana", 2.0),
        Datum::new("fruit", "sold", "cherry", 3.0),
        Datum::new("fruit", "sold", "date", 4.0),
    ];
    let lo = json!("banana");
    let hi = json!("date");
    let request = FilterRequest::new("target", "between", &lo).with_upper(&hi);

    let forward = engine.filter(&data, &request);
    assert_eq!(targets(&forward), vec!["banana", "cherry", "date"]);

    let mut reversed = data.clone();
    reversed.reverse();
    let backward = engine.filter(&reversed, &request);
    assert_ne!(targets(&backward), targets(&forward));
}
