//! Filter predicate engine
//!
//! Classifies the filtered field per call (temporal, numeric or label) and
//! applies the operator on the matching path:
//!
//! - membership and equality: timestamp set, numeric set, else string set
//! - text operators: case-insensitive substring tests on labels
//! - range operators: sorted timestamps with binary-searched bounds, else
//!   numeric comparison, else an ordinal slice between the first and last
//!   positions of the boundary labels in the current order
//!
//! The ordinal fallback depends on the incoming order. It is the least
//! reliable path and only runs when neither of the others applies.

use serde_json::Value;

use crate::datum::{label_of, number_of, Datum};
use crate::observability::{log_event, Event};

use super::field::{FieldAccessor, FieldValue};
use super::operator::FilterOperator;
use super::temporal::{clears_threshold, parse_temporal_value, DEFAULT_TEMPORAL_THRESHOLD};

/// Parameters of one filter call
#[derive(Debug, Clone, Copy)]
pub struct FilterRequest<'a> {
    pub field: Option<&'a str>,
    pub operator: Option<&'a str>,
    pub value: &'a Value,
    pub value2: Option<&'a Value>,
    pub group: Option<&'a str>,
}

impl<'a> FilterRequest<'a> {
    pub fn new(field: &'a str, operator: &'a str, value: &'a Value) -> Self {
        Self {
            field: Some(field),
            operator: Some(operator),
            value,
            value2: None,
            group: None,
        }
    }

    pub fn with_upper(mut self, value2: &'a Value) -> Self {
        self.value2 = Some(value2);
        self
    }

    pub fn in_group(mut self, group: &'a str) -> Self {
        self.group = Some(group);
        self
    }

    /// Lower (or only) boundary literal. A leading array element counts.
    fn lower(&self) -> &'a Value {
        match self.value {
            Value::Array(items) => items.first().unwrap_or(&Value::Null),
            other => other,
        }
    }

    /// Upper boundary: `value2`, else the second element of an array `value`.
    fn upper(&self) -> Option<&'a Value> {
        match (self.value2, self.value) {
            (Some(v), _) if !v.is_null() => Some(v),
            (_, Value::Array(items)) if items.len() >= 2 => items.get(1),
            _ => None,
        }
    }

    /// Literal set for membership operators
    fn members(&self) -> Vec<&'a Value> {
        match self.value {
            Value::Array(items) => items.iter().collect(),
            Value::Null => Vec::new(),
            other => vec![other],
        }
    }
}

/// How the filtered field is compared
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldClass {
    Temporal,
    Numeric,
    Label,
}

/// Generalized comparator behind the `filter` operation
#[derive(Debug, Clone, Copy)]
pub struct FilterEngine {
    temporal_threshold: f64,
}

impl Default for FilterEngine {
    fn default() -> Self {
        Self {
            temporal_threshold: DEFAULT_TEMPORAL_THRESHOLD,
        }
    }
}

impl FilterEngine {
    pub fn new(temporal_threshold: f64) -> Self {
        Self { temporal_threshold }
    }

    pub fn temporal_threshold(&self) -> f64 {
        self.temporal_threshold
    }

    /// Apply a filter. Returns a new vector; `data` is never modified.
    ///
    /// A missing field or operator returns a copy of the input. An operator
    /// that does not parse returns an empty result.
    pub fn filter(&self, data: &[Datum], request: &FilterRequest<'_>) -> Vec<Datum> {
        let (field, operator) = match (request.field, request.operator) {
            (Some(f), Some(o)) if !f.is_empty() && !o.is_empty() => (f, o),
            _ => return data.to_vec(),
        };

        let operator = match FilterOperator::parse(operator) {
            Some(op) => op,
            None => {
                log_event(Event::FilterOperatorUnknown, &[("operator", operator)]);
                return Vec::new();
            }
        };

        let scope: Vec<&Datum> = match request.group {
            Some(group) => data.iter().filter(|d| d.in_group(group)).collect(),
            None => data.iter().collect(),
        };
        if scope.is_empty() {
            return Vec::new();
        }

        let values: Vec<FieldValue<'_>> = scope
            .iter()
            .map(|d| FieldAccessor::resolve(field, d).read(d))
            .collect();
        let class = self.classify(&values);

        let selected: Vec<&Datum> = if operator.is_text() {
            Self::text_match(&scope, &values, operator, request)
        } else if operator.is_range() {
            match class {
                FieldClass::Temporal => Self::temporal_range(&scope, &values, operator, request),
                _ => match Self::numeric_range(&scope, &values, operator, request) {
                    Some(hits) => hits,
                    None => Self::ordinal_range(&scope, &values, operator, request),
                },
            }
        } else {
            Self::set_match(&scope, &values, operator, request, class)
        };

        selected.into_iter().cloned().collect()
    }

    /// Classify field values. Temporal wins when enough values parse as
    /// dates; numeric requires every value to be numeric.
    pub fn classify(&self, values: &[FieldValue<'_>]) -> FieldClass {
        let hits = values.iter().filter(|v| v.as_timestamp().is_some()).count();
        if clears_threshold(hits, values.len(), self.temporal_threshold) {
            FieldClass::Temporal
        } else if values.iter().all(|v| v.as_number().is_some()) {
            FieldClass::Numeric
        } else {
            FieldClass::Label
        }
    }

    /// Classify `field` over a whole dataset
    pub fn classify_field(&self, data: &[Datum], field: &str) -> FieldClass {
        let values: Vec<FieldValue<'_>> = data
            .iter()
            .map(|d| FieldAccessor::resolve(field, d).read(d))
            .collect();
        self.classify(&values)
    }

    fn set_match<'d>(
        scope: &[&'d Datum],
        values: &[FieldValue<'_>],
        operator: FilterOperator,
        request: &FilterRequest<'_>,
        class: FieldClass,
    ) -> Vec<&'d Datum> {
        let negate = matches!(operator, FilterOperator::Ne | FilterOperator::NotIn);
        let literals = match operator {
            FilterOperator::In | FilterOperator::NotIn => request.members(),
            _ => vec![request.lower()],
        };

        let matcher: Box<dyn Fn(&FieldValue<'_>) -> bool> = match class {
            FieldClass::Temporal => {
                let stamps: Vec<i64> = literals
                    .iter()
                    .filter_map(|v| parse_temporal_value(v))
                    .collect();
                if stamps.is_empty() {
                    return Vec::new();
                }
                Box::new(move |v: &FieldValue<'_>| v.as_timestamp().map_or(false, |t| stamps.contains(&t)))
            }
            _ => {
                let numbers: Option<Vec<f64>> = literals.iter().map(|v| number_of(v)).collect();
                match numbers {
                    Some(nums) if class == FieldClass::Numeric && !nums.is_empty() => {
                        Box::new(move |v: &FieldValue<'_>| v.as_number().map_or(false, |n| nums.contains(&n)))
                    }
                    _ => {
                        let labels: Vec<String> =
                            literals.iter().filter_map(|v| label_of(v)).collect();
                        Box::new(move |v: &FieldValue<'_>| labels.contains(&v.as_label()))
                    }
                }
            }
        };

        scope
            .iter()
            .zip(values)
            .filter(|(_, v)| matcher(v) != negate)
            .map(|(d, _)| *d)
            .collect()
    }

    fn text_match<'d>(
        scope: &[&'d Datum],
        values: &[FieldValue<'_>],
        operator: FilterOperator,
        request: &FilterRequest<'_>,
    ) -> Vec<&'d Datum> {
        let needles: Vec<String> = request
            .members()
            .iter()
            .filter_map(|v| label_of(v))
            .map(|s| s.to_lowercase())
            .collect();
        if needles.is_empty() {
            return Vec::new();
        }

        scope
            .iter()
            .zip(values)
            .filter(|(_, v)| {
                let hay = v.as_label().to_lowercase();
                needles.iter().any(|n| match operator {
                    FilterOperator::Contains => hay.contains(n.as_str()),
                    FilterOperator::StartsWith => hay.starts_with(n.as_str()),
                    _ => hay.ends_with(n.as_str()),
                })
            })
            .map(|(d, _)| *d)
            .collect()
    }

    fn temporal_range<'d>(
        scope: &[&'d Datum],
        values: &[FieldValue<'_>],
        operator: FilterOperator,
        request: &FilterRequest<'_>,
    ) -> Vec<&'d Datum> {
        let lo = match parse_temporal_value(request.lower()) {
            Some(t) => t,
            None => return Vec::new(),
        };
        let hi = if operator.is_two_sided() {
            match request.upper().and_then(parse_temporal_value) {
                Some(t) => t,
                None => return Vec::new(),
            }
        } else {
            lo
        };

        let mut stamped: Vec<(i64, &'d Datum)> = scope
            .iter()
            .zip(values)
            .filter_map(|(d, v)| v.as_timestamp().map(|t| (t, *d)))
            .collect();
        // stable, so equal timestamps keep their incoming order
        stamped.sort_by_key(|(t, _)| *t);

        let first_ge = |x: i64| stamped.partition_point(|(t, _)| *t < x);
        let first_gt = |x: i64| stamped.partition_point(|(t, _)| *t <= x);

        let (start, end) = match operator {
            FilterOperator::Gt => (first_gt(lo), stamped.len()),
            FilterOperator::Gte => (first_ge(lo), stamped.len()),
            FilterOperator::Lt => (0, first_ge(lo)),
            FilterOperator::Lte => (0, first_gt(lo)),
            FilterOperator::Between => (first_ge(lo), first_gt(hi)),
            FilterOperator::BetweenExclusive => (first_gt(lo), first_ge(hi)),
            _ => (0, 0),
        };
        if start >= end {
            return Vec::new();
        }

        stamped[start..end].iter().map(|(_, d)| *d).collect()
    }

    /// `None` when the field or the boundaries are not all numeric
    fn numeric_range<'d>(
        scope: &[&'d Datum],
        values: &[FieldValue<'_>],
        operator: FilterOperator,
        request: &FilterRequest<'_>,
    ) -> Option<Vec<&'d Datum>> {
        let numbers: Vec<f64> = values
            .iter()
            .map(|v| v.as_number())
            .collect::<Option<Vec<f64>>>()?;
        let lo = number_of(request.lower())?;
        let hi = if operator.is_two_sided() {
            match request.upper() {
                Some(v) => number_of(v)?,
                None => return Some(Vec::new()),
            }
        } else {
            lo
        };

        Some(
            scope
                .iter()
                .zip(numbers)
                .filter(|(_, n)| operator.compare(*n, lo, hi))
                .map(|(d, _)| *d)
                .collect(),
        )
    }

    fn ordinal_range<'d>(
        scope: &[&'d Datum],
        values: &[FieldValue<'_>],
        operator: FilterOperator,
        request: &FilterRequest<'_>,
    ) -> Vec<&'d Datum> {
        let labels: Vec<String> = values.iter().map(|v| v.as_label()).collect();
        let first_index = |literal: &Value| -> Option<usize> {
            let needle = label_of(literal)?;
            labels.iter().position(|l| *l == needle)
        };
        let last_index = |literal: &Value| -> Option<usize> {
            let needle = label_of(literal)?;
            labels.iter().rposition(|l| *l == needle)
        };

        let range = match operator {
            FilterOperator::Gt => last_index(request.lower()).map(|i| (i + 1, labels.len())),
            FilterOperator::Gte => first_index(request.lower()).map(|i| (i, labels.len())),
            FilterOperator::Lt => first_index(request.lower()).map(|i| (0, i)),
            FilterOperator::Lte => last_index(request.lower()).map(|i| (0, i + 1)),
            FilterOperator::Between => {
                let end = request.upper().and_then(|u| last_index(u));
                match (first_index(request.lower()), end) {
                    (Some(a), Some(b)) => Some((a, b + 1)),
                    _ => None,
                }
            }
            FilterOperator::BetweenExclusive => {
                let end = request.upper().and_then(|u| first_index(u));
                match (last_index(request.lower()), end) {
                    (Some(a), Some(b)) => Some((a + 1, b)),
                    _ => None,
                }
            }
            _ => None,
        };

        match range {
            Some((start, end)) if start < end => scope[start..end].to_vec(),
            _ => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn years() -> Vec<Datum> {
        vec![
            Datum::new("year", "cases", "2020", 5.0),
            Datum::new("year", "cases", "2021", 9.0),
            Datum::new("year", "cases", "2022", 7.0),
        ]
    }

    fn targets(data: &[Datum]) -> Vec<&str> {
        data.iter().map(|d| d.target.as_str()).collect()
    }

    #[test]
    fn test_numeric_value_filter() {
        let engine = FilterEngine::default();
        let data = years();
        let value = json!(5);
        let result = engine.filter(&data, &FilterRequest::new("value", ">", &value));
        assert_eq!(targets(&result), vec!["2021", "2022"]);
    }

    #[test]
    fn test_temporal_range_on_years() {
        let engine = FilterEngine::default();
        let data = years();
        let value = json!("2021");
        let result = engine.filter(&data, &FilterRequest::new("year", ">=", &value));
        assert_eq!(targets(&result), vec!["2021", "2022"]);
    }

    #[test]
    fn test_temporal_between_with_array_bounds() {
        let engine = FilterEngine::default();
        let data = vec![
            Datum::new("date", "v", "2021-03-01", 1.0),
            Datum::new("date", "v", "2021-01-01", 2.0),
            Datum::new("date", "v", "2021-02-01", 3.0),
        ];
        let value = json!(["2021-01-15", "2021-03-01"]);
        let result = engine.filter(&data, &FilterRequest::new("target", "between", &value));
        // sorted by time
        assert_eq!(targets(&result), vec!["2021-02-01", "2021-03-01"]);
    }

    #[test]
    fn test_membership_on_labels() {
        let engine = FilterEngine::default();
        let data = vec![
            Datum::new("fruit", "n", "apple", 1.0),
            Datum::new("fruit", "n", "pear", 2.0),
            Datum::new("fruit", "n", "plum", 3.0),
        ];
        let value = json!(["apple", "plum"]);
        let hit = engine.filter(&data, &FilterRequest::new("fruit", "in", &value));
        assert_eq!(targets(&hit), vec!["apple", "plum"]);

        let miss = engine.filter(&data, &FilterRequest::new("fruit", "not-in", &value));
        assert_eq!(targets(&miss), vec!["pear"]);
    }

    #[test]
    fn test_equality_numeric_and_label() {
        let engine = FilterEngine::default();
        let data = years();
        let nine = json!("9");
        let result = engine.filter(&data, &FilterRequest::new("y", "==", &nine));
        assert_eq!(targets(&result), vec!["2021"]);

        let fruit = vec![
            Datum::new("fruit", "n", "apple", 1.0),
            Datum::new("fruit", "n", "pear", 2.0),
        ];
        let pear = json!("pear");
        let result = engine.filter(&fruit, &FilterRequest::new("x", "!=", &pear));
        assert_eq!(targets(&result), vec!["apple"]);
    }

    #[test]
    fn test_text_operators_ignore_case() {
        let engine = FilterEngine::default();
        let data = vec![
            Datum::new("country", "gdp", "South Korea", 1.0),
            Datum::new("country", "gdp", "North Korea", 2.0),
            Datum::new("country", "gdp", "Japan", 3.0),
        ];
        let korea = json!("korea");
        let result = engine.filter(&data, &FilterRequest::new("x", "contains", &korea));
        assert_eq!(targets(&result), vec!["South Korea", "North Korea"]);

        let south = json!("SOUTH");
        let result = engine.filter(&data, &FilterRequest::new("x", "startsWith", &south));
        assert_eq!(targets(&result), vec!["South Korea"]);
    }

    #[test]
    fn test_ordinal_fallback_slices_by_position() {
        let engine = FilterEngine::default();
        let data = vec![
            Datum::new("size", "n", "small", 1.0),
            Datum::new("size", "n", "medium", 2.0),
            Datum::new("size", "n", "large", 3.0),
        ];
        let medium = json!("medium");
        let result = engine.filter(&data, &FilterRequest::new("x", ">", &medium));
        assert_eq!(targets(&result), vec!["large"]);

        let result = engine.filter(&data, &FilterRequest::new("x", "<=", &medium));
        assert_eq!(targets(&result), vec!["small", "medium"]);
    }

    #[test]
    fn test_group_scope() {
        let engine = FilterEngine::default();
        let data = vec![
            Datum::new("year", "n", "2020", 1.0).with_group("a"),
            Datum::new("year", "n", "2020", 8.0).with_group("b"),
            Datum::new("year", "n", "2021", 9.0).with_group("a"),
        ];
        let value = json!(5);
        let request = FilterRequest::new("value", ">", &value).in_group("a");
        let result = engine.filter(&data, &request);
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].value, 9.0);

        let request = FilterRequest::new("value", ">", &value).in_group("zzz");
        assert!(engine.filter(&data, &request).is_empty());
    }

    #[test]
    fn test_missing_operator_passes_through() {
        let engine = FilterEngine::default();
        let data = years();
        let value = json!(5);
        let request = FilterRequest {
            field: Some("value"),
            operator: None,
            value: &value,
            value2: None,
            group: None,
        };
        assert_eq!(engine.filter(&data, &request), data);
    }

    #[test]
    fn test_unknown_operator_fails_closed() {
        let engine = FilterEngine::default();
        let data = years();
        let value = json!(5);
        let result = engine.filter(&data, &FilterRequest::new("value", "~=", &value));
        assert!(result.is_empty());
    }

    #[test]
    fn test_between_without_upper_bound_is_empty() {
        let engine = FilterEngine::default();
        let data = years();
        let value = json!(5);
        let result = engine.filter(&data, &FilterRequest::new("value", "between", &value));
        assert!(result.is_empty());
    }

    #[test]
    fn test_classify_threshold() {
        let engine = FilterEngine::default();
        let mostly_dates = [
            FieldValue::Text("2020"),
            FieldValue::Text("2021"),
            FieldValue::Text("n/a"),
        ];
        assert_eq!(engine.classify(&mostly_dates), FieldClass::Temporal);

        let strict = FilterEngine::new(1.0);
        assert_eq!(strict.classify(&mostly_dates), FieldClass::Label);

        let numbers = [FieldValue::Number(1.0), FieldValue::Text("2.5")];
        assert_eq!(engine.classify(&numbers), FieldClass::Numeric);
    }

    #[test]
    fn test_input_is_not_modified() {
        let engine = FilterEngine::default();
        let data = years();
        let before = data.clone();
        let value = json!(6);
        let _ = engine.filter(&data, &FilterRequest::new("value", "<", &value));
        assert_eq!(data, before);
    }
}
