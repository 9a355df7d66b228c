//! Filter, sort, projection and pagination criteria
//!
//! These are the values a list query is narrowed with before it is handed to a
//! [`QueryHandle`](super::QueryHandle) for execution.
//!
//! # Example
//!
//! ```rust
//! use tourbook::repository::{FilterClause, Pagination, Projection, Sort};
//!
//! let filters = vec![
//!     FilterClause::eq("difficulty", "easy"),
//!     FilterClause::gte("duration", 5_i64),
//! ];
//! let sort = Sort::descending("price").then_ascending("name");
//! let projection = Projection::include(["name", "price"]);
//! let pagination = Pagination::new(3, 10);
//!
//! assert_eq!(filters.len(), 2);
//! assert_eq!(sort.keys.len(), 2);
//! assert!(projection.includes("name"));
//! assert_eq!(pagination.skip(), 20);
//! ```

use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};

/// Parse an RFC 3339 timestamp or a bare `YYYY-MM-DD` date
pub(crate) fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(s) {
        return Some(ts.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
}

/// Direction for ordering results
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OrderDirection {
    /// Sort in ascending order (A-Z, 0-9)
    #[default]
    Ascending,
    /// Sort in descending order (Z-A, 9-0)
    Descending,
}

impl fmt::Display for OrderDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ascending => write!(f, "asc"),
            Self::Descending => write!(f, "desc"),
        }
    }
}

/// One ordering key of a [`Sort`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortKey {
    /// Field to order by
    pub field: String,
    /// Direction of the ordering
    pub direction: OrderDirection,
}

/// Ordered list of sort keys; the first key is the primary one
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Sort {
    /// Keys in tie-break order
    pub keys: Vec<SortKey>,
}

impl Sort {
    /// Single ascending key
    #[must_use]
    pub fn ascending(field: impl Into<String>) -> Self {
        Self::default().then_ascending(field)
    }

    /// Single descending key
    #[must_use]
    pub fn descending(field: impl Into<String>) -> Self {
        Self::default().then_descending(field)
    }

    /// Append an ascending tie-break key
    #[must_use]
    pub fn then_ascending(mut self, field: impl Into<String>) -> Self {
        self.keys.push(SortKey {
            field: field.into(),
            direction: OrderDirection::Ascending,
        });
        self
    }

    /// Append a descending tie-break key
    #[must_use]
    pub fn then_descending(mut self, field: impl Into<String>) -> Self {
        self.keys.push(SortKey {
            field: field.into(),
            direction: OrderDirection::Descending,
        });
        self
    }
}

/// Field projection: either an include set or an exclude set, never both
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Projection {
    /// Keep exactly these fields (the identifier is always kept)
    Include(Vec<String>),
    /// Drop these fields and keep everything else
    Exclude(Vec<String>),
}

impl Projection {
    /// Build an include projection
    pub fn include<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Include(fields.into_iter().map(Into::into).collect())
    }

    /// Build an exclude projection
    pub fn exclude<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Exclude(fields.into_iter().map(Into::into).collect())
    }

    /// Whether this projection explicitly includes `field`
    pub fn includes(&self, field: &str) -> bool {
        matches!(self, Self::Include(fields) if fields.iter().any(|f| f == field))
    }
}

/// Page window over a result set (1-indexed page)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    /// Page number, at least 1
    pub page: u64,
    /// Page size, at least 1
    pub limit: u64,
}

impl Pagination {
    /// Create pagination parameters; zero values are raised to 1
    #[must_use]
    pub const fn new(page: u64, limit: u64) -> Self {
        Self {
            page: if page == 0 { 1 } else { page },
            limit: if limit == 0 { 1 } else { limit },
        }
    }

    /// Number of documents skipped before this page
    pub const fn skip(&self) -> u64 {
        self.page.saturating_sub(1).saturating_mul(self.limit)
    }
}

/// Comparison operators for filter clauses
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterOperator {
    /// Equal to (=)
    Equal,
    /// Greater than (>)
    GreaterThan,
    /// Greater than or equal to (>=)
    GreaterThanOrEqual,
    /// Less than (<)
    LessThan,
    /// Less than or equal to (<=)
    LessThanOrEqual,
}

impl FilterOperator {
    /// Parse the bracket suffix of a query key (`price[gte]`)
    pub fn from_suffix(suffix: &str) -> Option<Self> {
        match suffix {
            "gt" => Some(Self::GreaterThan),
            "gte" => Some(Self::GreaterThanOrEqual),
            "lt" => Some(Self::LessThan),
            "lte" => Some(Self::LessThanOrEqual),
            _ => None,
        }
    }
}

impl fmt::Display for FilterOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Equal => write!(f, "="),
            Self::GreaterThan => write!(f, ">"),
            Self::GreaterThanOrEqual => write!(f, ">="),
            Self::LessThan => write!(f, "<"),
            Self::LessThanOrEqual => write!(f, "<="),
        }
    }
}

/// A value a field is compared against
#[derive(Debug, Clone, PartialEq)]
pub enum FilterValue {
    /// String value
    String(String),
    /// 64-bit integer value
    Integer(i64),
    /// 64-bit floating point value
    Float(f64),
    /// Boolean value
    Boolean(bool),
    /// Point in time
    Date(DateTime<Utc>),
}

impl From<&str> for FilterValue {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

impl From<String> for FilterValue {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<i64> for FilterValue {
    fn from(n: i64) -> Self {
        Self::Integer(n)
    }
}

impl From<f64> for FilterValue {
    fn from(n: f64) -> Self {
        Self::Float(n)
    }
}

impl From<bool> for FilterValue {
    fn from(b: bool) -> Self {
        Self::Boolean(b)
    }
}

impl From<DateTime<Utc>> for FilterValue {
    fn from(d: DateTime<Utc>) -> Self {
        Self::Date(d)
    }
}

/// One field-comparison constraint
#[derive(Debug, Clone, PartialEq)]
pub struct FilterClause {
    /// The field name to filter on
    pub field: String,
    /// The comparison operator
    pub operator: FilterOperator,
    /// The value to compare against
    pub value: FilterValue,
    /// Text the value was coerced from, compared against string fields
    pub raw: Option<String>,
}

impl FilterClause {
    /// Create a new filter clause
    pub fn new(field: impl Into<String>, operator: FilterOperator, value: FilterValue) -> Self {
        Self {
            field: field.into(),
            operator,
            value,
            raw: None,
        }
    }

    /// Keep the text `value` was coerced from
    ///
    /// String fields compare against this text, so `code=007` matches a
    /// stored `"007"` even though the value is the integer 7.
    #[must_use]
    pub fn with_raw(mut self, raw: impl Into<String>) -> Self {
        self.raw = Some(raw.into());
        self
    }

    /// Equality clause (field = value)
    pub fn eq(field: impl Into<String>, value: impl Into<FilterValue>) -> Self {
        Self::new(field, FilterOperator::Equal, value.into())
    }

    /// Greater-than clause (field > value)
    pub fn gt(field: impl Into<String>, value: impl Into<FilterValue>) -> Self {
        Self::new(field, FilterOperator::GreaterThan, value.into())
    }

    /// Greater-than-or-equal clause (field >= value)
    pub fn gte(field: impl Into<String>, value: impl Into<FilterValue>) -> Self {
        Self::new(field, FilterOperator::GreaterThanOrEqual, value.into())
    }

    /// Less-than clause (field < value)
    pub fn lt(field: impl Into<String>, value: impl Into<FilterValue>) -> Self {
        Self::new(field, FilterOperator::LessThan, value.into())
    }

    /// Less-than-or-equal clause (field <= value)
    pub fn lte(field: impl Into<String>, value: impl Into<FilterValue>) -> Self {
        Self::new(field, FilterOperator::LessThanOrEqual, value.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_order_direction_display() {
        assert_eq!(OrderDirection::Ascending.to_string(), "asc");
        assert_eq!(OrderDirection::Descending.to_string(), "desc");
        assert_eq!(OrderDirection::default(), OrderDirection::Ascending);
    }

    #[test]
    fn test_sort_builder_keeps_order() {
        let sort = Sort::descending("price").then_ascending("name");
        assert_eq!(sort.keys[0].field, "price");
        assert_eq!(sort.keys[0].direction, OrderDirection::Descending);
        assert_eq!(sort.keys[1].field, "name");
        assert_eq!(sort.keys[1].direction, OrderDirection::Ascending);
    }

    #[test]
    fn test_projection_includes() {
        let include = Projection::include(["name", "price"]);
        assert!(include.includes("price"));
        assert!(!include.includes("summary"));

        let exclude = Projection::exclude(["__v"]);
        assert!(!exclude.includes("__v"));
    }

    #[test]
    fn test_pagination_skip() {
        assert_eq!(Pagination::new(1, 100).skip(), 0);
        assert_eq!(Pagination::new(3, 10).skip(), 20);
    }

    #[test]
    fn test_pagination_zero_is_raised() {
        let pagination = Pagination::new(0, 0);
        assert_eq!(pagination.page, 1);
        assert_eq!(pagination.limit, 1);
    }

    #[test]
    fn test_filter_operator_from_suffix() {
        assert_eq!(
            FilterOperator::from_suffix("gte"),
            Some(FilterOperator::GreaterThanOrEqual)
        );
        assert_eq!(FilterOperator::from_suffix("lt"), Some(FilterOperator::LessThan));
        assert_eq!(FilterOperator::from_suffix("ne"), None);
        assert_eq!(FilterOperator::from_suffix("$gte"), None);
    }

    #[test]
    fn test_parse_timestamp() {
        let ts = parse_timestamp("2021-03-01T09:30:00.000Z").unwrap();
        assert_eq!(ts.to_rfc3339(), "2021-03-01T09:30:00+00:00");
        let day = parse_timestamp("2021-03-01").unwrap();
        assert_eq!(day.to_rfc3339(), "2021-03-01T00:00:00+00:00");
        assert!(parse_timestamp("2021-13-01").is_none());
        assert!(parse_timestamp("easy").is_none());
    }

    #[test]
    fn test_filter_clause_helpers() {
        let clause = FilterClause::lte("price", 500_i64);
        assert_eq!(clause.field, "price");
        assert_eq!(clause.operator, FilterOperator::LessThanOrEqual);
        assert_eq!(clause.value, FilterValue::Integer(500));

        let clause = FilterClause::eq("active", true);
        assert_eq!(clause.value, FilterValue::Boolean(true));
    }
}
