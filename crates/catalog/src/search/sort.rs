//! Sort resolver.
//!
//! Maps a sort key to ordered `(field, direction, nulls)` directives. The
//! mapping is total: unknown or absent keys resolve to [`SortKey::Newest`].

use serde::{Deserialize, Serialize};

use super::predicate::Field;

/// Sort direction.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

/// NULL ordering preference.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum NullsOrder {
    First,
    Last,
}

/// One ordering term.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct OrderDirective {
    pub field: Field,
    pub direction: SortDirection,
    /// `None` leaves NULL placement to the storage default.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nulls: Option<NullsOrder>,
}

impl OrderDirective {
    pub const fn asc(field: Field) -> Self {
        Self {
            field,
            direction: SortDirection::Asc,
            nulls: None,
        }
    }

    pub const fn desc(field: Field) -> Self {
        Self {
            field,
            direction: SortDirection::Desc,
            nulls: None,
        }
    }

    pub const fn nulls_last(self) -> Self {
        Self {
            nulls: Some(NullsOrder::Last),
            ..self
        }
    }
}

/// Known sort keys.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum SortKey {
    #[default]
    Newest,
    Oldest,
    PriceAsc,
    PriceDesc,
    YearAsc,
    YearDesc,
    /// Verified sellers first, then newest.
    Relevance,
}

impl SortKey {
    pub const ALL: [SortKey; 7] = [
        SortKey::Newest,
        SortKey::Oldest,
        SortKey::PriceAsc,
        SortKey::PriceDesc,
        SortKey::YearAsc,
        SortKey::YearDesc,
        SortKey::Relevance,
    ];

    /// Parse a key, matched exactly after trimming.
    pub fn parse(key: &str) -> Option<SortKey> {
        let key = key.trim();
        Self::ALL.into_iter().find(|k| k.as_str() == key)
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            SortKey::Newest => "newest",
            SortKey::Oldest => "oldest",
            SortKey::PriceAsc => "price-asc",
            SortKey::PriceDesc => "price-desc",
            SortKey::YearAsc => "year-asc",
            SortKey::YearDesc => "year-desc",
            SortKey::Relevance => "relevance",
        }
    }

    /// Ordering terms, primary first. Every key but `newest`/`oldest` breaks
    /// ties by newest.
    pub fn directives(self) -> Vec<OrderDirective> {
        let newest = OrderDirective::desc(Field::Created);
        match self {
            SortKey::Newest => vec![newest],
            SortKey::Oldest => vec![OrderDirective::asc(Field::Created)],
            SortKey::PriceAsc => vec![OrderDirective::asc(Field::PriceMinorUnits), newest],
            SortKey::PriceDesc => vec![OrderDirective::desc(Field::PriceMinorUnits), newest],
            SortKey::YearAsc => vec![OrderDirective::asc(Field::Year).nulls_last(), newest],
            SortKey::YearDesc => vec![OrderDirective::desc(Field::Year).nulls_last(), newest],
            SortKey::Relevance => vec![OrderDirective::desc(Field::SellerVerified), newest],
        }
    }
}

/// Resolve an optional key, falling back to newest.
pub fn resolve_sort_key(key: Option<&str>) -> SortKey {
    key.and_then(SortKey::parse).unwrap_or_default()
}

/// Resolve an optional key straight to its directives.
pub fn resolve_sort(key: Option<&str>) -> Vec<OrderDirective> {
    resolve_sort_key(key).directives()
}
