//! Storage-agnostic predicate tree.
//!
//! A [`Predicate`] is pure data: field comparisons composed with AND/OR.
//! Storage adapters translate it into their own query language; the
//! degrading executor rewrites it structurally.
//!
//! # Examples
//!
//! ```
//! use tickmark_catalog::search::{Field, Predicate};
//!
//! let visible_rolex = Predicate::and([
//!     Predicate::eq(Field::Status, "approved"),
//!     Predicate::or([
//!         Predicate::contains(Field::Brand, "Rolex"),
//!         Predicate::contains(Field::Brand, "Tudor"),
//!     ]),
//! ]);
//!
//! assert_eq!(
//!     visible_rolex.to_string(),
//!     r#"status = "approved" AND (brand ~ "Rolex" OR brand ~ "Tudor")"#
//! );
//! ```

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Which record a field lives on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Relation {
    Listing,
    Seller,
}

/// Filterable and sortable catalog fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Field {
    #[serde(rename = "status")]
    Status,
    #[serde(rename = "brand")]
    Brand,
    #[serde(rename = "model")]
    Model,
    #[serde(rename = "reference")]
    Reference,
    #[serde(rename = "movement")]
    Movement,
    #[serde(rename = "price_minor_units")]
    PriceMinorUnits,
    #[serde(rename = "year")]
    Year,
    #[serde(rename = "condition")]
    Condition,
    #[serde(rename = "location")]
    Location,
    #[serde(rename = "gender")]
    Gender,
    #[serde(rename = "box_papers")]
    BoxPapers,
    #[serde(rename = "created")]
    Created,
    #[serde(rename = "seller.is_verified")]
    SellerVerified,
    #[serde(rename = "seller.identity_status")]
    SellerIdentityStatus,
    #[serde(rename = "seller.city")]
    SellerCity,
    #[serde(rename = "seller.country")]
    SellerCountry,
}

impl Field {
    /// Dotted path, `relation.column` for seller fields.
    pub const fn path(self) -> &'static str {
        match self {
            Field::Status => "status",
            Field::Brand => "brand",
            Field::Model => "model",
            Field::Reference => "reference",
            Field::Movement => "movement",
            Field::PriceMinorUnits => "price_minor_units",
            Field::Year => "year",
            Field::Condition => "condition",
            Field::Location => "location",
            Field::Gender => "gender",
            Field::BoxPapers => "box_papers",
            Field::Created => "created",
            Field::SellerVerified => "seller.is_verified",
            Field::SellerIdentityStatus => "seller.identity_status",
            Field::SellerCity => "seller.city",
            Field::SellerCountry => "seller.country",
        }
    }

    /// Column name without the relation prefix.
    pub fn column(self) -> &'static str {
        let path = self.path();
        path.rsplit('.').next().unwrap_or(path)
    }

    pub const fn relation(self) -> Relation {
        match self {
            Field::SellerVerified
            | Field::SellerIdentityStatus
            | Field::SellerCity
            | Field::SellerCountry => Relation::Seller,
            _ => Relation::Listing,
        }
    }

    /// Fields of the seller-verification relationship.
    ///
    /// These columns arrive with a later migration and may be missing from
    /// a database that has not been migrated yet.
    pub const fn is_seller_verification(self) -> bool {
        matches!(self, Field::SellerVerified | Field::SellerIdentityStatus)
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

/// Comparison operand.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    Bool(bool),
    Integer(i64),
    Text(String),
}

impl From<bool> for Scalar {
    fn from(value: bool) -> Self {
        Scalar::Bool(value)
    }
}

impl From<i64> for Scalar {
    fn from(value: i64) -> Self {
        Scalar::Integer(value)
    }
}

impl From<&str> for Scalar {
    fn from(value: &str) -> Self {
        Scalar::Text(value.to_string())
    }
}

impl From<String> for Scalar {
    fn from(value: String) -> Self {
        Scalar::Text(value)
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Bool(b) => write!(f, "{b}"),
            Scalar::Integer(i) => write!(f, "{i}"),
            Scalar::Text(s) => write!(f, "{s:?}"),
        }
    }
}

/// Leaf comparison kinds.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Comparison {
    /// Exact, case-sensitive equality.
    Equals { value: Scalar },
    /// Case-insensitive substring containment.
    Contains { value: String },
    /// Value is one of the set.
    In { values: Vec<Scalar> },
    /// Inclusive numeric range; `None` leaves that side open.
    Range { min: Option<i64>, max: Option<i64> },
    /// Field is NULL.
    IsNull,
    /// Field is the empty string.
    IsEmpty,
}

/// Boolean expression over catalog fields.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Predicate {
    Compare { field: Field, comparison: Comparison },
    /// All children hold. An empty list is "no constraint".
    And(Vec<Predicate>),
    /// At least one child holds.
    Or(Vec<Predicate>),
}

impl Predicate {
    // ========== Leaf Constructors ==========

    pub fn compare(field: Field, comparison: Comparison) -> Self {
        Self::Compare { field, comparison }
    }

    #[inline]
    pub fn eq(field: Field, value: impl Into<Scalar>) -> Self {
        Self::compare(field, Comparison::Equals { value: value.into() })
    }

    #[inline]
    pub fn contains(field: Field, value: impl Into<String>) -> Self {
        Self::compare(field, Comparison::Contains { value: value.into() })
    }

    #[inline]
    pub fn in_set<S: Into<Scalar>>(field: Field, values: impl IntoIterator<Item = S>) -> Self {
        Self::compare(
            field,
            Comparison::In {
                values: values.into_iter().map(Into::into).collect(),
            },
        )
    }

    #[inline]
    pub fn range(field: Field, min: Option<i64>, max: Option<i64>) -> Self {
        Self::compare(field, Comparison::Range { min, max })
    }

    #[inline]
    pub fn is_null(field: Field) -> Self {
        Self::compare(field, Comparison::IsNull)
    }

    #[inline]
    pub fn is_empty(field: Field) -> Self {
        Self::compare(field, Comparison::IsEmpty)
    }

    // ========== Composite Constructors ==========

    /// Combine with AND logic.
    #[inline]
    pub fn and(children: impl IntoIterator<Item = Predicate>) -> Self {
        Self::And(children.into_iter().collect())
    }

    /// Combine with OR logic. A single child is returned as-is.
    pub fn or(children: impl IntoIterator<Item = Predicate>) -> Self {
        let mut children: Vec<Predicate> = children.into_iter().collect();
        if children.len() == 1
            && let Some(only) = children.pop()
        {
            return only;
        }
        Self::Or(children)
    }

    /// The "no constraint" predicate.
    #[inline]
    pub fn always() -> Self {
        Self::And(Vec::new())
    }

    // ========== Inspection ==========

    pub fn is_unconstrained(&self) -> bool {
        matches!(self, Predicate::And(children) if children.is_empty())
    }

    /// Every field referenced anywhere in the tree.
    pub fn fields(&self) -> BTreeSet<Field> {
        let mut fields = BTreeSet::new();
        self.collect_fields(&mut fields);
        fields
    }

    fn collect_fields(&self, into: &mut BTreeSet<Field>) {
        match self {
            Predicate::Compare { field, .. } => {
                into.insert(*field);
            }
            Predicate::And(children) | Predicate::Or(children) => {
                for child in children {
                    child.collect_fields(into);
                }
            }
        }
    }

    /// Whether any leaf references a field matching `test`.
    pub fn references(&self, test: impl Fn(Field) -> bool + Copy) -> bool {
        match self {
            Predicate::Compare { field, .. } => test(*field),
            Predicate::And(children) | Predicate::Or(children) => {
                children.iter().any(|child| child.references(test))
            }
        }
    }

    /// Top-level AND-conjuncts. A non-AND predicate is its own single conjunct.
    pub fn conjuncts(&self) -> &[Predicate] {
        match self {
            Predicate::And(children) => children,
            other => std::slice::from_ref(other),
        }
    }

    // ========== Rewriting ==========

    /// Drop every top-level conjunct for which `drop` returns true.
    ///
    /// The result is always an AND list; dropping every conjunct yields
    /// [`Predicate::always`].
    pub fn without_conjuncts(&self, drop: impl Fn(&Predicate) -> bool) -> Predicate {
        Predicate::And(
            self.conjuncts()
                .iter()
                .filter(|conjunct| !drop(conjunct))
                .cloned()
                .collect(),
        )
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Predicate::Compare { field, comparison } => match comparison {
                Comparison::Equals { value } => write!(f, "{field} = {value}"),
                Comparison::Contains { value } => write!(f, "{field} ~ {value:?}"),
                Comparison::In { values } => {
                    let rendered: Vec<String> = values.iter().map(ToString::to_string).collect();
                    write!(f, "{field} IN ({})", rendered.join(", "))
                }
                Comparison::Range { min, max } => match (min, max) {
                    (Some(min), Some(max)) if min == max => write!(f, "{field} = {min}"),
                    (Some(min), Some(max)) => write!(f, "{field} >= {min} AND {field} <= {max}"),
                    (Some(min), None) => write!(f, "{field} >= {min}"),
                    (None, Some(max)) => write!(f, "{field} <= {max}"),
                    (None, None) => write!(f, "{field} IS NOT NULL"),
                },
                Comparison::IsNull => write!(f, "{field} IS NULL"),
                Comparison::IsEmpty => write!(f, "{field} = \"\""),
            },
            Predicate::And(children) => {
                if children.is_empty() {
                    return f.write_str("TRUE");
                }
                let rendered: Vec<String> = children.iter().map(render_nested).collect();
                f.write_str(&rendered.join(" AND "))
            }
            Predicate::Or(children) => {
                if children.is_empty() {
                    return f.write_str("FALSE");
                }
                let rendered: Vec<String> = children.iter().map(render_nested).collect();
                f.write_str(&rendered.join(" OR "))
            }
        }
    }
}

/// Render a child, parenthesizing composites with more than one member.
fn render_nested(child: &Predicate) -> String {
    match child {
        Predicate::And(children) | Predicate::Or(children) if children.len() > 1 => {
            format!("({child})")
        }
        other => other.to_string(),
    }
}
