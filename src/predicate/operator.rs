//! Filter operators

use std::fmt;

/// Comparison operator accepted by `filter`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterOperator {
    Gt,
    Gte,
    Lt,
    Lte,
    Eq,
    Ne,
    Between,
    BetweenExclusive,
    In,
    NotIn,
    Contains,
    StartsWith,
    EndsWith,
}

impl FilterOperator {
    /// Parse an operator token. Matching ignores case and surrounding space.
    pub fn parse(token: &str) -> Option<Self> {
        let op = match token.trim().to_ascii_lowercase().as_str() {
            ">" | "gt" => FilterOperator::Gt,
            ">=" | "gte" => FilterOperator::Gte,
            "<" | "lt" => FilterOperator::Lt,
            "<=" | "lte" => FilterOperator::Lte,
            "==" | "=" | "===" | "eq" => FilterOperator::Eq,
            "!=" | "!==" | "<>" | "ne" | "neq" => FilterOperator::Ne,
            "between" => FilterOperator::Between,
            "betweenexclusive" | "between_exclusive" => FilterOperator::BetweenExclusive,
            "in" => FilterOperator::In,
            "not-in" | "not_in" | "notin" | "nin" => FilterOperator::NotIn,
            "contains" => FilterOperator::Contains,
            "startswith" | "starts_with" => FilterOperator::StartsWith,
            "endswith" | "ends_with" => FilterOperator::EndsWith,
            _ => return None,
        };
        Some(op)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FilterOperator::Gt => ">",
            FilterOperator::Gte => ">=",
            FilterOperator::Lt => "<",
            FilterOperator::Lte => "<=",
            FilterOperator::Eq => "==",
            FilterOperator::Ne => "!=",
            FilterOperator::Between => "between",
            FilterOperator::BetweenExclusive => "betweenExclusive",
            FilterOperator::In => "in",
            FilterOperator::NotIn => "not-in",
            FilterOperator::Contains => "contains",
            FilterOperator::StartsWith => "startsWith",
            FilterOperator::EndsWith => "endsWith",
        }
    }

    /// Ordering operators that select a contiguous range
    pub fn is_range(&self) -> bool {
        matches!(
            self,
            FilterOperator::Gt
                | FilterOperator::Gte
                | FilterOperator::Lt
                | FilterOperator::Lte
                | FilterOperator::Between
                | FilterOperator::BetweenExclusive
        )
    }

    /// Operators that need an upper bound
    pub fn is_two_sided(&self) -> bool {
        matches!(self, FilterOperator::Between | FilterOperator::BetweenExclusive)
    }

    /// Case-insensitive substring operators
    pub fn is_text(&self) -> bool {
        matches!(
            self,
            FilterOperator::Contains | FilterOperator::StartsWith | FilterOperator::EndsWith
        )
    }

    /// Numeric comparison for the range operators. `hi` is only read by
    /// the two-sided operators.
    pub fn compare(&self, value: f64, lo: f64, hi: f64) -> bool {
        match self {
            FilterOperator::Gt => value > lo,
            FilterOperator::Gte => value >= lo,
            FilterOperator::Lt => value < lo,
            FilterOperator::Lte => value <= lo,
            FilterOperator::Between => value >= lo && value <= hi,
            FilterOperator::BetweenExclusive => value > lo && value < hi,
            FilterOperator::Eq => value == lo,
            FilterOperator::Ne => value != lo,
            _ => false,
        }
    }
}

impl fmt::Display for FilterOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_symbols_and_words() {
        assert_eq!(FilterOperator::parse(">"), Some(FilterOperator::Gt));
        assert_eq!(FilterOperator::parse("gte"), Some(FilterOperator::Gte));
        assert_eq!(FilterOperator::parse("=="), Some(FilterOperator::Eq));
        assert_eq!(FilterOperator::parse(" != "), Some(FilterOperator::Ne));
        assert_eq!(FilterOperator::parse("not-in"), Some(FilterOperator::NotIn));
        assert_eq!(FilterOperator::parse("startsWith"), Some(FilterOperator::StartsWith));
        assert_eq!(FilterOperator::parse("BETWEEN"), Some(FilterOperator::Between));
        assert_eq!(FilterOperator::parse("<>"), Some(FilterOperator::Ne));
        assert_eq!(
            FilterOperator::parse("betweenExclusive"),
            Some(FilterOperator::BetweenExclusive)
        );
    }

    #[test]
    fn test_parse_unknown() {
        assert_eq!(FilterOperator::parse("~="), None);
        assert_eq!(FilterOperator::parse(""), None);
    }

    #[test]
    fn test_compare_between_inclusive() {
        let op = FilterOperator::Between;
        assert!(op.compare(2.0, 2.0, 5.0));
        assert!(op.compare(5.0, 2.0, 5.0));
        assert!(!op.compare(5.1, 2.0, 5.0));

        let op = FilterOperator::BetweenExclusive;
        assert!(!op.compare(2.0, 2.0, 5.0));
        assert!(op.compare(3.0, 2.0, 5.0));
    }

    #[test]
    fn test_display_round_trips_through_parse() {
        for op in [FilterOperator::Lte, FilterOperator::In, FilterOperator::EndsWith] {
            assert_eq!(FilterOperator::parse(op.as_str()), Some(op));
        }
    }
}
