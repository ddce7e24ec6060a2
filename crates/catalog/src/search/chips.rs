//! Active filter chips.
//!
//! The filter UI shows one removable chip per active value. Removing a chip
//! drops exactly that value; the remaining state serializes back to query
//! pairs under canonical keys, and normalizing those pairs reproduces the
//! state.

use std::collections::BTreeSet;

use serde::Serialize;

use super::normalizer::FilterParam;
use super::types::FilterState;

/// One removable active-filter value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterChip {
    /// Canonical query key.
    pub param: &'static str,
    pub value: String,
    pub label: String,
}

impl FilterChip {
    fn new(param: FilterParam, value: &str, label: String) -> Self {
        Self {
            param: param.canonical_key(),
            value: value.to_string(),
            label,
        }
    }
}

/// Chips for every active filter value, in parameter order.
///
/// Sort and page are not filters and get no chip. Year range chips are
/// omitted while an exact year is set, since the range does not constrain
/// the search then.
pub fn active_filters(state: &FilterState) -> Vec<FilterChip> {
    if state.has_no_filters() {
        return Vec::new();
    }

    let mut chips = Vec::new();
    for param in FilterParam::ALL {
        let shadowed_range =
            matches!(param, FilterParam::YearFrom | FilterParam::YearTo) && state.year.is_some();
        if matches!(param, FilterParam::Sort | FilterParam::Page) || shadowed_range {
            continue;
        }
        for value in state.values(param) {
            chips.push(FilterChip::new(param, &value, chip_label(param, &value)));
        }
    }
    chips
}

fn chip_label(param: FilterParam, value: &str) -> String {
    match param {
        FilterParam::PriceMin => format!("From {value}"),
        FilterParam::PriceMax => format!("Up to {value}"),
        FilterParam::Year => format!("Year {value}"),
        FilterParam::YearFrom => format!("From {value}"),
        FilterParam::YearTo => format!("Until {value}"),
        FilterParam::Model => format!("Model: {value}"),
        FilterParam::Reference => format!("Ref. {value}"),
        FilterParam::Location => format!("Near {value}"),
        FilterParam::Verified => "Verified sellers".to_string(),
        FilterParam::Authenticated => "ID-verified sellers".to_string(),
        FilterParam::BoxPapers => match value.to_ascii_lowercase().as_str() {
            "box" => "Box".to_string(),
            "papers" => "Papers".to_string(),
            "both" => "Box and papers".to_string(),
            "none" => "No box or papers".to_string(),
            _ => value.to_string(),
        },
        _ => value.to_string(),
    }
}

/// Flag values serialize as this token.
const FLAG_ON: &str = "true";

impl FilterState {
    /// Active values of one parameter as strings; empty when unset.
    pub fn values(&self, param: FilterParam) -> Vec<String> {
        let set = |values: &BTreeSet<String>| -> Vec<String> { values.iter().cloned().collect() };
        let one = |value: &Option<String>| -> Vec<String> { value.iter().cloned().collect() };
        let flag = |on: bool| if on { vec![FLAG_ON.to_string()] } else { Vec::new() };

        match param {
            FilterParam::Brand => set(&self.brand),
            FilterParam::Model => one(&self.model),
            FilterParam::Reference => one(&self.reference),
            FilterParam::Movement => set(&self.movement),
            FilterParam::PriceMin => one(&self.price_min),
            FilterParam::PriceMax => one(&self.price_max),
            FilterParam::Year => one(&self.year),
            FilterParam::YearFrom => one(&self.year_from),
            FilterParam::YearTo => one(&self.year_to),
            FilterParam::Condition => set(&self.condition),
            FilterParam::Location => one(&self.location),
            FilterParam::Audience => set(&self.audience),
            FilterParam::BoxPapers => set(&self.box_papers),
            FilterParam::Verified => flag(self.verified_only),
            FilterParam::Authenticated => flag(self.authenticated_only),
            FilterParam::Sort => one(&self.sort),
            FilterParam::Page => one(&self.page),
        }
    }

    /// Copy of this state with one value of `param` removed.
    ///
    /// Multi-valued filters keep their other values. Single-valued filters and
    /// flags are cleared when `value` matches. The page is reset because the
    /// result set changes.
    pub fn without_value(&self, param: FilterParam, value: &str) -> FilterState {
        let mut next = self.clone();

        let clear = |slot: &mut Option<String>| {
            if slot.as_deref() == Some(value) {
                *slot = None;
            }
        };

        match param {
            FilterParam::Brand => {
                next.brand.remove(value);
            }
            FilterParam::Movement => {
                next.movement.remove(value);
            }
            FilterParam::Condition => {
                next.condition.remove(value);
            }
            FilterParam::Audience => {
                next.audience.remove(value);
            }
            FilterParam::BoxPapers => {
                next.box_papers.remove(value);
            }
            FilterParam::Model => clear(&mut next.model),
            FilterParam::Reference => clear(&mut next.reference),
            FilterParam::PriceMin => clear(&mut next.price_min),
            FilterParam::PriceMax => clear(&mut next.price_max),
            FilterParam::Year => clear(&mut next.year),
            FilterParam::YearFrom => clear(&mut next.year_from),
            FilterParam::YearTo => clear(&mut next.year_to),
            FilterParam::Location => clear(&mut next.location),
            FilterParam::Sort => clear(&mut next.sort),
            FilterParam::Page => clear(&mut next.page),
            FilterParam::Verified => next.verified_only = false,
            FilterParam::Authenticated => next.authenticated_only = false,
        }

        if param != FilterParam::Page && next != *self {
            next.page = None;
        }
        next
    }

    /// Serialize to query pairs under canonical keys, one pair per value.
    pub fn to_query_pairs(&self) -> Vec<(&'static str, String)> {
        FilterParam::ALL
            .into_iter()
            .flat_map(|param| {
                self.values(param)
                    .into_iter()
                    .map(move |value| (param.canonical_key(), value))
            })
            .collect()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::search::normalizer::normalize;
    use crate::search::types::RawQueryInput;

    fn state(pairs: &[(&str, &str)]) -> FilterState {
        normalize(&RawQueryInput::from_pairs(pairs.iter().copied()))
    }

    #[test]
    fn one_chip_per_value() {
        let s = state(&[
            ("brands", "Rolex,Omega"),
            ("minPrice", "1000"),
            ("box", "both"),
            ("verifiedSeller", "on"),
            ("sort", "oldest"),
        ]);

        let chips = active_filters(&s);
        let summary: Vec<(&str, &str, &str)> = chips
            .iter()
            .map(|c| (c.param, c.value.as_str(), c.label.as_str()))
            .collect();

        assert_eq!(
            summary,
            vec![
                ("brand", "Omega", "Omega"),
                ("brand", "Rolex", "Rolex"),
                ("min", "1000", "From 1000"),
                ("boxPapers", "both", "Box and papers"),
                ("verified", "true", "Verified sellers"),
            ]
        );
    }

    #[test]
    fn no_chips_without_filters() {
        assert!(active_filters(&state(&[("sort", "oldest"), ("page", "2")])).is_empty());
    }

    #[test]
    fn year_range_chips_hidden_behind_exact_year() {
        let s = state(&[("year", "2001"), ("yearFrom", "1990")]);
        let params: Vec<&str> = active_filters(&s).iter().map(|c| c.param).collect();
        assert_eq!(params, vec!["year"]);
    }

    #[test]
    fn removing_one_value_keeps_the_rest() {
        let s = state(&[("brand", "Rolex,Omega,Tudor"), ("cond", "New"), ("page", "3")]);
        let next = s.without_value(FilterParam::Brand, "Omega");

        assert_eq!(
            next.brand,
            BTreeSet::from(["Rolex".to_string(), "Tudor".to_string()])
        );
        assert_eq!(next.condition, s.condition);
        assert_eq!(next.page, None);
    }

    #[test]
    fn removing_unknown_value_is_a_no_op() {
        let s = state(&[("model", "Daytona"), ("page", "2")]);
        assert_eq!(s.without_value(FilterParam::Model, "Submariner"), s);
        assert_eq!(s.without_value(FilterParam::Brand, "Rolex"), s);
    }

    #[test]
    fn removing_single_values_and_flags() {
        let s = state(&[("loc", "Geneva"), ("authenticated", "1")]);
        assert_eq!(s.without_value(FilterParam::Location, "Geneva").location, None);
        assert!(!s.without_value(FilterParam::Authenticated, "true").authenticated_only);
    }

    #[test]
    fn query_pairs_round_trip_through_normalize() {
        let states = [
            FilterState::default(),
            state(&[
                ("brand", "Rolex,Omega"),
                ("model", "Speedmaster"),
                ("ref", "311.30"),
                ("movements", "Manual"),
                ("min", "1000"),
                ("maxPrice", "5000"),
                ("minYear", "1990"),
                ("yearTo", "2005"),
                ("condition", "New,Very Good"),
                ("location", "Geneva, CH"),
                ("audience", "Men"),
                ("box", "papers,none"),
                ("verified", "yes"),
                ("idVerified", "1"),
                ("sort", "price-desc"),
                ("page", "4"),
            ]),
            state(&[("year", "2001"), ("yearFrom", "1990")]),
        ];

        for s in states {
            let pairs = s.to_query_pairs();
            assert_eq!(normalize(&RawQueryInput::from_pairs(pairs)), s);
        }
    }

    #[test]
    fn query_pairs_use_canonical_keys() {
        let s = state(&[("brands", "Rolex"), ("minPrice", "10"), ("verifiedSeller", "1")]);
        assert_eq!(
            s.to_query_pairs(),
            vec![
                ("brand", "Rolex".to_string()),
                ("min", "10".to_string()),
                ("verified", "true".to_string()),
            ]
        );
    }
}
