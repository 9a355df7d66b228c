//! List query builder
//!
//! Turns [`QueryParams`] into filter clauses, a sort order, a projection and a
//! page window, and narrows a [`QueryHandle`] with each of them in turn.
//! Malformed input never fails here: bad numbers fall back to defaults and
//! unknown fields are passed through to the collection.

use crate::repository::{
    FilterClause, FilterOperator, FilterValue, Pagination, Projection, QueryHandle, Document,
    RepositoryResult, Sort, CREATED_AT_FIELD, VERSION_FIELD,
};

use super::params::QueryParams;

/// Control keys that never become filter clauses
pub const RESERVED_KEYS: [&str; 4] = ["page", "sort", "limit", "fields"];

/// Page used when `page` is absent or not a positive integer
pub const DEFAULT_PAGE: u64 = 1;

/// Page size used when `limit` is absent or not a positive integer
pub const DEFAULT_LIMIT: u64 = 100;

/// Coerce a raw filter value
///
/// Tried in order: integer, finite float, `true` or `false`, timestamp, and
/// finally the string itself.
///
/// ```rust
/// use tourbook::query::coerce_value;
/// use tourbook::repository::FilterValue;
///
/// assert_eq!(coerce_value("5"), FilterValue::Integer(5));
/// assert_eq!(coerce_value("4.5"), FilterValue::Float(4.5));
/// assert_eq!(coerce_value("easy"), FilterValue::String("easy".into()));
/// assert_eq!(coerce_value("false"), FilterValue::Boolean(false));
/// assert_eq!(coerce_value("NaN"), FilterValue::String("NaN".into()));
/// ```
pub fn coerce_value(raw: &str) -> FilterValue {
    let trimmed = raw.trim();
    if let Ok(n) = trimmed.parse::<i64>() {
        return FilterValue::Integer(n);
    }
    if let Ok(f) = trimmed.parse::<f64>() {
        // "inf" and "NaN" parse as floats but are not numbers a client meant
        if f.is_finite() && trimmed.chars().any(|c| c.is_ascii_digit()) {
            return FilterValue::Float(f);
        }
    }
    match trimmed {
        "true" => return FilterValue::Boolean(true),
        "false" => return FilterValue::Boolean(false),
        _ => {}
    }
    if let Some(ts) = crate::repository::parse_timestamp(trimmed) {
        return FilterValue::Date(ts);
    }
    FilterValue::String(raw.to_string())
}

// "price[gte]" -> ("price", Some(gte)); anything else is a plain field name
fn split_operator(key: &str) -> (&str, Option<FilterOperator>) {
    if let Some(open) = key.find('[') {
        if let Some(inner) = key[open + 1..].strip_suffix(']') {
            if let Some(op) = FilterOperator::from_suffix(inner) {
                return (&key[..open], Some(op));
            }
        }
    }
    (key, None)
}

/// Filter clauses for every non-reserved key
pub fn filter_clauses(params: &QueryParams, reserved: &[&str]) -> Vec<FilterClause> {
    params
        .iter()
        .filter_map(|(key, value)| {
            let (field, operator) = split_operator(key);
            let base = field.split('[').next().unwrap_or(field);
            if reserved.contains(&base) {
                return None;
            }
            Some(
                FilterClause::new(
                    field,
                    operator.unwrap_or(FilterOperator::Equal),
                    coerce_value(value),
                )
                .with_raw(value),
            )
        })
        .collect()
}

fn split_list(raw: &str) -> impl Iterator<Item = &str> {
    raw.split(',').map(str::trim).filter(|s| !s.is_empty())
}

/// Sort order from `sort`; newest first when absent
pub fn sort_order(params: &QueryParams) -> Sort {
    let mut sort = Sort::default();
    if let Some(raw) = params.get("sort") {
        for token in split_list(raw) {
            match token.strip_prefix('-') {
                Some("") => {}
                Some(field) => sort = sort.then_descending(field),
                None => sort = sort.then_ascending(token),
            }
        }
    }
    if sort.keys.is_empty() {
        sort = Sort::descending(CREATED_AT_FIELD);
    }
    sort
}

/// Projection from `fields`; everything but the version field when absent
///
/// A list made only of `-field` tokens excludes those fields; otherwise the
/// plain tokens are the include set.
pub fn projection(params: &QueryParams) -> Projection {
    let tokens: Vec<&str> = params.get("fields").map(|raw| split_list(raw).collect()).unwrap_or_default();
    let (excluded, included): (Vec<&str>, Vec<&str>) =
        tokens.into_iter().partition(|t| t.starts_with('-'));

    if !included.is_empty() {
        return Projection::include(included);
    }
    let excluded: Vec<&str> = excluded
        .into_iter()
        .filter_map(|t| t.strip_prefix('-'))
        .filter(|t| !t.is_empty())
        .collect();
    if excluded.is_empty() {
        Projection::exclude([VERSION_FIELD])
    } else {
        Projection::exclude(excluded)
    }
}

// Positive integer or nothing: "0", "-3", "abc" and "" all fall back
fn positive_integer(raw: Option<&str>) -> Option<u64> {
    let raw = raw?.trim();
    if let Ok(n) = raw.parse::<u64>() {
        return (n > 0).then_some(n);
    }
    let f = raw.parse::<f64>().ok()?;
    (f.is_finite() && f >= 1.0 && f.fract() == 0.0 && f <= u64::MAX as f64).then(|| f as u64)
}

/// Page window from `page` and `limit`
///
/// ```rust
/// use tourbook::query::{pagination, QueryParams};
///
/// let window = pagination(&QueryParams::from_pairs([("page", "3"), ("limit", "10")]));
/// assert_eq!((window.page, window.limit, window.skip()), (3, 10, 20));
///
/// let window = pagination(&QueryParams::from_pairs([("page", "0")]));
/// assert_eq!((window.page, window.limit), (1, 100));
/// ```
pub fn pagination(params: &QueryParams) -> Pagination {
    Pagination::new(
        positive_integer(params.get("page")).unwrap_or(DEFAULT_PAGE),
        positive_integer(params.get("limit")).unwrap_or(DEFAULT_LIMIT),
    )
}

/// Builder threading one pending query through the four stages
///
/// Stages must run in order: filter, sort, limit_fields, paginate.
///
/// ```rust,ignore
/// let built = QueryBuilder::new(collection.find_many(&scope), &params)
///     .filter(&RESERVED_KEYS)
///     .sort()
///     .limit_fields()
///     .paginate();
/// let docs = built.execute().await?;
/// ```
pub struct QueryBuilder<'p, Q> {
    query: Q,
    params: &'p QueryParams,
    filters: Vec<FilterClause>,
    pagination: Option<Pagination>,
}

impl<'p, Q: QueryHandle> QueryBuilder<'p, Q> {
    /// Start from a pending query and the request's parameters
    pub fn new(query: Q, params: &'p QueryParams) -> Self {
        Self {
            query,
            params,
            filters: Vec::new(),
            pagination: None,
        }
    }

    /// Narrow by every non-reserved key
    #[must_use]
    pub fn filter(mut self, reserved: &[&str]) -> Self {
        self.filters = filter_clauses(self.params, reserved);
        self.query = self.query.apply_filter(&self.filters);
        self
    }

    /// Order by `sort`
    #[must_use]
    pub fn sort(mut self) -> Self {
        self.query = self.query.apply_sort(&sort_order(self.params));
        self
    }

    /// Project to `fields`
    #[must_use]
    pub fn limit_fields(mut self) -> Self {
        self.query = self.query.apply_projection(&projection(self.params));
        self
    }

    /// Window by `page` and `limit`
    #[must_use]
    pub fn paginate(mut self) -> Self {
        let window = pagination(self.params);
        self.query = self.query.apply_skip_limit(window.skip(), window.limit);
        self.pagination = Some(window);
        self
    }

    /// Clauses added by the filter stage
    pub fn filters(&self) -> &[FilterClause] {
        &self.filters
    }

    /// Window chosen by the paginate stage, if it ran
    pub fn window(&self) -> Option<Pagination> {
        self.pagination
    }

    /// Run the narrowed query
    pub async fn execute(self) -> RepositoryResult<Vec<Document>> {
        self.query.execute().await
    }
}
