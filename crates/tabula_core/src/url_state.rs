//! Flat key/value state shared through a URL.

use crate::{DateRange, QueryState, SortOrder, parse_day};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::str::FromStr;
use tabula_error::{ValidationError, ValidationErrorKind};

/// Key holding the trimmed search text.
pub const SEARCH_KEY: &str = "search";
/// Key holding the JSON-encoded `{from_date, to_date}` object.
pub const DATE_RANGE_KEY: &str = "dateRange";
/// Key holding the page number.
pub const PAGE_KEY: &str = "page";
/// Key holding the page size.
pub const PAGE_SIZE_KEY: &str = "pageSize";
/// Key holding the sort column. Empty means explicitly unsorted.
pub const SORT_BY_KEY: &str = "sortBy";
/// Key holding `asc` or `desc`.
pub const SORT_ORDER_KEY: &str = "sortOrder";
/// Key holding the JSON-encoded column filter object.
pub const FILTERS_KEY: &str = "filters";

/// Keys owned by the controller. Everything else passes through untouched.
pub const MANAGED_KEYS: &[&str] = &[
    SEARCH_KEY,
    DATE_RANGE_KEY,
    PAGE_KEY,
    PAGE_SIZE_KEY,
    SORT_BY_KEY,
    SORT_ORDER_KEY,
    FILTERS_KEY,
];

#[derive(Debug, Default, Serialize, Deserialize)]
struct DateRangeParam {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    from_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    to_date: Option<String>,
}

/// Shareable external representation of a table's query state.
///
/// A flat string map, typically the search part of a URL. Only the keys in
/// [`MANAGED_KEYS`] are interpreted; all others are carried along as-is.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UrlState(BTreeMap<String, String>);

impl UrlState {
    /// Empty state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a form-encoded query string. A leading `?` is ignored.
    pub fn from_query_string(query: &str) -> Self {
        let query = query.strip_prefix('?').unwrap_or(query);
        Self(
            url::form_urlencoded::parse(query.as_bytes())
                .into_owned()
                .collect(),
        )
    }

    /// Form-encodes the state, keys in sorted order.
    pub fn to_query_string(&self) -> String {
        url::form_urlencoded::Serializer::new(String::new())
            .extend_pairs(self.0.iter())
            .finish()
    }

    /// Value for `key`.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    /// Sets `key`, returning the previous value.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) -> Option<String> {
        self.0.insert(key.into(), value.into())
    }

    /// Removes `key`, returning its value.
    pub fn remove(&mut self, key: &str) -> Option<String> {
        self.0.remove(key)
    }

    /// Whether no keys are set.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// All entries in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Copy with every managed key removed.
    pub fn without_managed(&self) -> Self {
        Self(
            self.0
                .iter()
                .filter(|(k, _)| !MANAGED_KEYS.contains(&k.as_str()))
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
        )
    }

    /// Copy with the managed keys rewritten to describe `query`.
    ///
    /// Fields equal to their value in `defaults` are left out so that a
    /// pristine table produces a clean URL. Unknown keys are preserved.
    pub fn merged_with(&self, query: &QueryState, defaults: &QueryState) -> Self {
        let mut state = self.without_managed();

        if !query.search().is_empty() {
            state.insert(SEARCH_KEY, query.search().clone());
        }

        if let Some(range) = query.date_range() {
            let param = DateRangeParam {
                from_date: range.from_day_string(),
                to_date: range.to_day_string(),
            };
            match serde_json::to_string(&param) {
                Ok(json) => {
                    state.insert(DATE_RANGE_KEY, json);
                }
                Err(e) => tracing::warn!(error = %e, "Failed to encode date range"),
            }
        }

        if query.page() != defaults.page() {
            state.insert(PAGE_KEY, query.page().to_string());
        }
        if query.page_size() != defaults.page_size() {
            state.insert(PAGE_SIZE_KEY, query.page_size().to_string());
        }

        let sort_differs =
            query.sort_by() != defaults.sort_by() || query.sort_order() != defaults.sort_order();
        if sort_differs {
            state.insert(SORT_BY_KEY, query.sort_by().clone().unwrap_or_default());
            state.insert(SORT_ORDER_KEY, query.sort_order().to_string());
        }

        if !query.filters().is_empty() {
            match serde_json::to_string(query.filters()) {
                Ok(json) => {
                    state.insert(FILTERS_KEY, json);
                }
                Err(e) => tracing::warn!(error = %e, "Failed to encode column filters"),
            }
        }

        state
    }

    /// Reads a query state, starting from `defaults`.
    ///
    /// Malformed entries never fail the decode: they are left at their
    /// default and reported in [`DecodedQuery::rejected`].
    pub fn decode(&self, defaults: &QueryState) -> DecodedQuery {
        let mut rejected = Vec::new();
        let mut query = defaults.clone();

        if let Some(search) = self.get(SEARCH_KEY) {
            query = query.with_search(search);
        }

        if let Some(raw) = self.get(DATE_RANGE_KEY) {
            query = query.with_date_range(decode_date_range(raw, &mut rejected));
        }

        if let Some(page) = self.get(PAGE_KEY).and_then(|v| positive(PAGE_KEY, v, &mut rejected)) {
            query = query.with_page(page);
        }
        if let Some(size) = self
            .get(PAGE_SIZE_KEY)
            .and_then(|v| positive(PAGE_SIZE_KEY, v, &mut rejected))
        {
            query = query.with_page_size(size);
        }

        let order = match self.get(SORT_ORDER_KEY) {
            Some(raw) => SortOrder::from_str(raw).unwrap_or_else(|_| {
                rejected.push(ValidationError::new(ValidationErrorKind::SortOrder(
                    raw.to_string(),
                )));
                *defaults.sort_order()
            }),
            None => *defaults.sort_order(),
        };
        let sort_by = match self.get(SORT_BY_KEY) {
            Some(raw) => Some(raw.to_string()),
            None => defaults.sort_by().clone(),
        };
        query = query.with_sort(sort_by, order);

        if let Some(raw) = self.get(FILTERS_KEY) {
            match serde_json::from_str::<BTreeMap<String, String>>(raw) {
                Ok(filters) => query = query.with_filters(filters),
                Err(e) => rejected.push(ValidationError::new(ValidationErrorKind::Json {
                    key: FILTERS_KEY.to_string(),
                    message: e.to_string(),
                })),
            }
        }

        for error in &rejected {
            tracing::warn!(%error, "Ignoring malformed external state entry");
        }

        DecodedQuery { query, rejected }
    }
}

impl FromIterator<(String, String)> for UrlState {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Outcome of reading a [`QueryState`] out of a [`UrlState`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedQuery {
    /// The recovered state
    pub query: QueryState,
    /// Entries that were ignored
    pub rejected: Vec<ValidationError>,
}

fn positive(key: &str, raw: &str, rejected: &mut Vec<ValidationError>) -> Option<u32> {
    match raw.trim().parse::<u32>() {
        Ok(n) if n > 0 => Some(n),
        _ => {
            rejected.push(ValidationError::new(ValidationErrorKind::NotPositive {
                key: key.to_string(),
                value: raw.to_string(),
            }));
            None
        }
    }
}

fn decode_date_range(raw: &str, rejected: &mut Vec<ValidationError>) -> Option<DateRange> {
    let param: DateRangeParam = match serde_json::from_str(raw) {
        Ok(param) => param,
        Err(e) => {
            rejected.push(ValidationError::new(ValidationErrorKind::Json {
                key: DATE_RANGE_KEY.to_string(),
                message: e.to_string(),
            }));
            return None;
        }
    };

    let mut bound = |value: Option<String>, key: &str| {
        let value = value.filter(|v| !v.trim().is_empty())?;
        let day = parse_day(&value);
        if day.is_none() {
            rejected.push(ValidationError::new(ValidationErrorKind::Date {
                key: key.to_string(),
                value,
            }));
        }
        day
    };

    let from = bound(param.from_date, "dateRange.from_date");
    let to = bound(param.to_date, "dateRange.to_date");
    let range = DateRange::new(from, to);
    (!range.is_cleared()).then_some(range)
}
