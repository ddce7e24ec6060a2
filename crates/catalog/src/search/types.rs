//! Search engine types.
//!
//! Provides the data carried between pipeline stages:
//! - RawQueryInput: loosely-typed query parameters as they arrive
//! - FilterState: canonical, alias-resolved search intent
//! - SearchResult: the envelope returned to the presentation layer

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::models::Listing;

/// A single raw query value: one string or a repeated key's values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawValue {
    Single(String),
    Many(Vec<String>),
}

impl RawValue {
    /// Iterate the raw strings in arrival order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        let slice: &[String] = match self {
            RawValue::Single(value) => std::slice::from_ref(value),
            RawValue::Many(values) => values.as_slice(),
        };
        slice.iter().map(String::as_str)
    }
}

/// Raw query parameters keyed by parameter name.
///
/// Repeated keys accumulate into [`RawValue::Many`]; a trailing `[]` on a key
/// (`brand[]`) is stripped so array-style encodings land on the bare key.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawQueryInput {
    params: BTreeMap<String, RawValue>,
}

impl RawQueryInput {
    /// Create an empty input.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from `(key, value)` pairs, e.g. a decoded query string.
    pub fn from_pairs<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        let mut input = Self::new();
        for (key, value) in pairs {
            input.push(key, value);
        }
        input
    }

    /// Append one value under `key`, promoting to a sequence on repeat.
    pub fn push(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let key = key.strip_suffix("[]").map(str::to_string).unwrap_or(key);
        let value = value.into();

        match self.params.remove(&key) {
            None => {
                self.params.insert(key, RawValue::Single(value));
            }
            Some(RawValue::Single(first)) => {
                self.params.insert(key, RawValue::Many(vec![first, value]));
            }
            Some(RawValue::Many(mut values)) => {
                values.push(value);
                self.params.insert(key, RawValue::Many(values));
            }
        }
    }

    /// Builder-style [`push`](Self::push).
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.push(key, value);
        self
    }

    /// Set `key` to an explicit sequence, replacing any previous value.
    pub fn with_many<S: Into<String>>(
        mut self,
        key: impl Into<String>,
        values: impl IntoIterator<Item = S>,
    ) -> Self {
        let values = values.into_iter().map(Into::into).collect();
        self.params.insert(key.into(), RawValue::Many(values));
        self
    }

    /// Look up the raw value for `key`.
    pub fn get(&self, key: &str) -> Option<&RawValue> {
        self.params.get(key)
    }
}

/// Canonical search intent produced by the normalizer.
///
/// Every field is either absent or carries a non-empty, trimmed value.
/// Absence means "no constraint". Numeric bounds stay as strings; the
/// compiler decides whether they parse.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterState {
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub brand: BTreeSet<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,

    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub movement: BTreeSet<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price_min: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price_max: Option<String>,

    /// Exact year. Takes precedence over `year_from`/`year_to`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year_from: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year_to: Option<String>,

    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub condition: BTreeSet<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,

    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub audience: BTreeSet<String>,

    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub box_papers: BTreeSet<String>,

    #[serde(default, skip_serializing_if = "is_false")]
    pub verified_only: bool,

    #[serde(default, skip_serializing_if = "is_false")]
    pub authenticated_only: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<String>,
}

fn is_false(value: &bool) -> bool {
    !*value
}

impl FilterState {
    /// Whether no filter (ignoring sort and page) is set.
    pub fn has_no_filters(&self) -> bool {
        let paging_only = FilterState {
            sort: self.sort.clone(),
            page: self.page.clone(),
            ..Default::default()
        };
        *self == paging_only
    }

    /// Copy of this state with sort and page cleared.
    pub fn filters_only(&self) -> FilterState {
        FilterState {
            sort: None,
            page: None,
            ..self.clone()
        }
    }
}

/// Search result envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResult {
    /// Listings on the requested page.
    pub items: Vec<Listing>,

    /// Total matches (before paging).
    pub total: u64,

    /// `ceil(total / page_size)`.
    pub total_pages: u32,

    /// Distinct brands across the publicly visible catalog.
    pub facet_brands: Vec<String>,

    /// Current page number (1-indexed).
    pub page: u32,
}

impl SearchResult {
    /// Create a new result with paging calculations.
    pub fn new(
        items: Vec<Listing>,
        total: u64,
        facet_brands: Vec<String>,
        page: u32,
        page_size: u32,
    ) -> Self {
        let total_pages = if page_size > 0 {
            total.div_ceil(u64::from(page_size))
        } else {
            0
        };

        Self {
            items,
            total,
            total_pages: u32::try_from(total_pages).unwrap_or(u32::MAX),
            facet_brands,
            page,
        }
    }
}
