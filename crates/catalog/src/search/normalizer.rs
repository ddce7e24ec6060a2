//! Parameter normalizer.
//!
//! Turns a [`RawQueryInput`] into the canonical [`FilterState`]. Every
//! logical parameter is addressed by one or more raw keys; the keys of a
//! [`FilterParam`] are consulted in their listed order and the first key
//! carrying a non-empty value wins.

use std::collections::BTreeSet;

use super::types::{FilterState, RawQueryInput};

/// Logical search parameters and the raw keys that address them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FilterParam {
    Brand,
    Model,
    Reference,
    Movement,
    PriceMin,
    PriceMax,
    Year,
    YearFrom,
    YearTo,
    Condition,
    Location,
    Audience,
    BoxPapers,
    Verified,
    Authenticated,
    Sort,
    Page,
}

impl FilterParam {
    pub const ALL: [FilterParam; 17] = [
        FilterParam::Brand,
        FilterParam::Model,
        FilterParam::Reference,
        FilterParam::Movement,
        FilterParam::PriceMin,
        FilterParam::PriceMax,
        FilterParam::Year,
        FilterParam::YearFrom,
        FilterParam::YearTo,
        FilterParam::Condition,
        FilterParam::Location,
        FilterParam::Audience,
        FilterParam::BoxPapers,
        FilterParam::Verified,
        FilterParam::Authenticated,
        FilterParam::Sort,
        FilterParam::Page,
    ];

    /// Raw keys in priority order. The first one is canonical.
    pub const fn keys(self) -> &'static [&'static str] {
        match self {
            FilterParam::Brand => &["brand", "brands"],
            FilterParam::Model => &["model"],
            FilterParam::Reference => &["ref", "reference"],
            FilterParam::Movement => &["movement", "movements"],
            FilterParam::PriceMin => &["min", "minPrice"],
            FilterParam::PriceMax => &["max", "maxPrice"],
            FilterParam::Year => &["year"],
            FilterParam::YearFrom => &["yearFrom", "minYear"],
            FilterParam::YearTo => &["yearTo", "maxYear"],
            FilterParam::Condition => &["cond", "condition"],
            FilterParam::Location => &["loc", "location"],
            FilterParam::Audience => &["gender", "audience"],
            FilterParam::BoxPapers => &["boxPapers", "box"],
            FilterParam::Verified => &["verified", "verifiedSeller"],
            FilterParam::Authenticated => &["authenticated", "idVerified"],
            FilterParam::Sort => &["sort"],
            FilterParam::Page => &["page"],
        }
    }

    /// Key used when serializing a state back into query pairs.
    pub const fn canonical_key(self) -> &'static str {
        self.keys()[0]
    }

    /// Whether the parameter accepts several comma-joined or repeated values.
    pub const fn is_multi(self) -> bool {
        matches!(
            self,
            FilterParam::Brand
                | FilterParam::Movement
                | FilterParam::Condition
                | FilterParam::Audience
                | FilterParam::BoxPapers
        )
    }

    pub const fn is_flag(self) -> bool {
        matches!(self, FilterParam::Verified | FilterParam::Authenticated)
    }

    /// Resolve any alias (with or without a trailing `[]`) to its parameter.
    pub fn from_key(key: &str) -> Option<FilterParam> {
        let key = key.strip_suffix("[]").unwrap_or(key);
        Self::ALL
            .into_iter()
            .find(|param| param.keys().contains(&key))
    }
}

/// Values accepted as "on" for flag parameters (ASCII case-insensitive).
const TRUTHY: [&str; 4] = ["1", "true", "yes", "on"];

pub fn is_truthy(value: &str) -> bool {
    TRUTHY.iter().any(|t| t.eq_ignore_ascii_case(value.trim()))
}

/// Normalize raw query parameters into a canonical filter state.
pub fn normalize(raw: &RawQueryInput) -> FilterState {
    FilterState {
        brand: multi(raw, FilterParam::Brand),
        model: single(raw, FilterParam::Model),
        reference: single(raw, FilterParam::Reference),
        movement: multi(raw, FilterParam::Movement),
        price_min: single(raw, FilterParam::PriceMin),
        price_max: single(raw, FilterParam::PriceMax),
        year: single(raw, FilterParam::Year),
        year_from: single(raw, FilterParam::YearFrom),
        year_to: single(raw, FilterParam::YearTo),
        condition: multi(raw, FilterParam::Condition),
        location: single(raw, FilterParam::Location),
        audience: multi(raw, FilterParam::Audience),
        box_papers: multi(raw, FilterParam::BoxPapers),
        verified_only: flag(raw, FilterParam::Verified),
        authenticated_only: flag(raw, FilterParam::Authenticated),
        sort: single(raw, FilterParam::Sort),
        page: single(raw, FilterParam::Page),
    }
}

/// Comma-split, trimmed, de-duplicated tokens of the first alias that has any.
fn multi(raw: &RawQueryInput, param: FilterParam) -> BTreeSet<String> {
    for key in param.keys() {
        let Some(value) = raw.get(key) else {
            continue;
        };
        let tokens: BTreeSet<String> = value
            .iter()
            .flat_map(|v| v.split(','))
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_string)
            .collect();
        if !tokens.is_empty() {
            return tokens;
        }
    }
    BTreeSet::new()
}

/// First non-empty trimmed value across the aliases.
///
/// Single-valued parameters are not comma-split: a location such as
/// "Geneva, CH" stays whole.
fn single(raw: &RawQueryInput, param: FilterParam) -> Option<String> {
    param.keys().iter().find_map(|key| {
        raw.get(key)?
            .iter()
            .map(str::trim)
            .find(|v| !v.is_empty())
            .map(str::to_string)
    })
}

fn flag(raw: &RawQueryInput, param: FilterParam) -> bool {
    single(raw, param).is_some_and(|value| is_truthy(&value))
}
