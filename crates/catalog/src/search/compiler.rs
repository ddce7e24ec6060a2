//! Predicate compiler.
//!
//! Each rule turns one part of a [`FilterState`] into an optional
//! [`Predicate`] fragment; [`compile`] AND-s the fragments onto the
//! visibility clause. Invalid input contributes no fragment.

use std::collections::BTreeSet;

use super::predicate::{Field, Predicate};
use super::types::FilterState;
use crate::models::ListingStatus;

/// Condition grades, best first.
pub const CONDITION_GRADES: [&str; 6] = ["New", "Unworn", "Excellent", "Very Good", "Good", "Fair"];

/// Audience labels stored in the listing's gender column.
pub const AUDIENCES: [&str; 3] = ["Men", "Women", "Unisex"];

/// Prices arrive in major units and are stored in minor units.
const PRICE_SCALE: i64 = 100;

/// Identity-check status a seller must have for the authenticated filter.
pub const IDENTITY_APPROVED: &str = "approved";

/// Restrict to publicly visible listings.
pub fn visibility() -> Predicate {
    Predicate::eq(Field::Status, ListingStatus::Approved.as_str())
}

/// Compile a filter state into a predicate.
///
/// The result is always a top-level AND whose first conjunct is
/// [`visibility`]. Sort and page are not part of the predicate.
pub fn compile(state: &FilterState) -> Predicate {
    let fragments = [
        Some(visibility()),
        any_contains(Field::Brand, &state.brand),
        state.model.as_deref().map(|m| Predicate::contains(Field::Model, m)),
        state
            .reference
            .as_deref()
            .map(|r| Predicate::contains(Field::Reference, r)),
        any_contains(Field::Movement, &state.movement),
        price_clause(state.price_min.as_deref(), state.price_max.as_deref()),
        year_clause(state),
        any_enumerated(Field::Condition, &state.condition, &CONDITION_GRADES),
        state.location.as_deref().map(location_clause),
        any_enumerated(Field::Gender, &state.audience, &AUDIENCES),
        box_papers_clause(&state.box_papers),
        state.verified_only.then(verified_seller),
        state.authenticated_only.then(authenticated_seller),
    ];

    Predicate::and(fragments.into_iter().flatten())
}

/// OR of case-insensitive containment checks, one per value.
fn any_contains(field: Field, values: &BTreeSet<String>) -> Option<Predicate> {
    if values.is_empty() {
        return None;
    }
    Some(Predicate::or(
        values.iter().map(|v| Predicate::contains(field, v.as_str())),
    ))
}

/// OR of equality checks against the canonical labels the values name.
///
/// Labels keep the order of `options`; values naming no option are dropped.
fn any_enumerated(
    field: Field,
    values: &BTreeSet<String>,
    options: &[&'static str],
) -> Option<Predicate> {
    let selected: Vec<&'static str> = options
        .iter()
        .copied()
        .filter(|option| values.iter().any(|v| v.eq_ignore_ascii_case(option)))
        .collect();
    if selected.is_empty() {
        return None;
    }
    Some(Predicate::or(
        selected.into_iter().map(|label| Predicate::eq(field, label)),
    ))
}

/// Parse a major-unit price bound and scale it to minor units.
pub fn parse_price(value: &str) -> Option<i64> {
    value.trim().parse::<i64>().ok()?.checked_mul(PRICE_SCALE)
}

pub fn parse_year(value: &str) -> Option<i64> {
    value.trim().parse::<i64>().ok()
}

fn price_clause(min: Option<&str>, max: Option<&str>) -> Option<Predicate> {
    let min = min.and_then(parse_price);
    let max = max.and_then(parse_price);
    if min.is_none() && max.is_none() {
        return None;
    }
    Some(Predicate::range(Field::PriceMinorUnits, min, max))
}

/// An exact year, when present, excludes the range bounds entirely.
fn year_clause(state: &FilterState) -> Option<Predicate> {
    if let Some(year) = state.year.as_deref() {
        return parse_year(year).map(|y| Predicate::eq(Field::Year, y));
    }
    let from = state.year_from.as_deref().and_then(parse_year);
    let to = state.year_to.as_deref().and_then(parse_year);
    if from.is_none() && to.is_none() {
        return None;
    }
    Some(Predicate::range(Field::Year, from, to))
}

/// One token matched against the listing and its seller's whereabouts.
fn location_clause(location: &str) -> Predicate {
    Predicate::or([
        Predicate::contains(Field::Location, location),
        Predicate::contains(Field::SellerCity, location),
        Predicate::contains(Field::SellerCountry, location),
    ])
}

/// Fragment for one box/papers token, `None` for unknown tokens.
fn box_papers_fragment(token: &str) -> Option<Predicate> {
    let has_box = || Predicate::contains(Field::BoxPapers, "box");
    let has_papers = || Predicate::contains(Field::BoxPapers, "papers");

    match token.to_ascii_lowercase().as_str() {
        "box" => Some(has_box()),
        "papers" => Some(has_papers()),
        "both" => Some(Predicate::and([has_box(), has_papers()])),
        "none" => Some(Predicate::or([
            Predicate::is_null(Field::BoxPapers),
            Predicate::is_empty(Field::BoxPapers),
        ])),
        _ => None,
    }
}

fn box_papers_clause(tokens: &BTreeSet<String>) -> Option<Predicate> {
    let mut fragments: Vec<Predicate> = Vec::new();
    for fragment in tokens.iter().filter_map(|t| box_papers_fragment(t)) {
        if !fragments.contains(&fragment) {
            fragments.push(fragment);
        }
    }
    if fragments.is_empty() {
        return None;
    }
    Some(Predicate::or(fragments))
}

fn verified_seller() -> Predicate {
    Predicate::eq(Field::SellerVerified, true)
}

fn authenticated_seller() -> Predicate {
    Predicate::eq(Field::SellerIdentityStatus, IDENTITY_APPROVED)
}
