//! In-memory listing store.
//!
//! Evaluates predicates with the same semantics as the Postgres
//! translation. Test hooks:
//! - [`MemoryStore::drop_column`] makes reads that reference a field fail
//!   with [`StoreError::UnknownField`], like an unmigrated schema
//! - [`MemoryStore::fail_next`] queues errors returned by the next reads
//! - [`MemoryStore::read_count`] counts read calls

use std::cmp::Ordering;
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};

use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};
use uuid::Uuid;

use super::{ListingStore, ListingWriter, StoreError};
use crate::models::{CreateListing, Listing, ListingStatus, Seller, UpdateListing};
use crate::search::paginator::PageWindow;
use crate::search::predicate::{Comparison, Field, Predicate, Scalar};
use crate::search::sort::{NullsOrder, OrderDirective, SortDirection};

#[derive(Default)]
struct Tables {
    listings: Vec<Listing>,
    sellers: HashMap<Uuid, Seller>,
}

/// Listing store backed by process memory.
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
    missing_columns: RwLock<HashSet<Field>>,
    failures: Mutex<VecDeque<StoreError>>,
    reads: AtomicU64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_seller(&self, seller: Seller) {
        self.tables.write().sellers.insert(seller.id, seller);
    }

    /// Insert a listing as-is, keeping its id, status and timestamps.
    pub fn add_listing(&self, listing: Listing) {
        self.tables.write().listings.push(listing);
    }

    /// Simulate a schema without `field`.
    pub fn drop_column(&self, field: Field) {
        self.missing_columns.write().insert(field);
    }

    pub fn restore_column(&self, field: Field) {
        self.missing_columns.write().remove(&field);
    }

    /// Queue an error for an upcoming read. Each read consumes at most one.
    pub fn fail_next(&self, error: StoreError) {
        self.failures.lock().push_back(error);
    }

    /// Number of read calls served or failed so far.
    pub fn read_count(&self) -> u64 {
        self.reads.load(AtomicOrdering::SeqCst)
    }

    pub fn listing_count(&self) -> usize {
        self.tables.read().listings.len()
    }

    pub fn get(&self, id: Uuid) -> Option<Listing> {
        let tables = self.tables.read();
        tables
            .listings
            .iter()
            .find(|l| l.id == id)
            .map(|l| tables.joined(l))
    }

    /// Common prologue of every read: count it, then surface injected
    /// failures and missing columns.
    fn begin_read(
        &self,
        predicate: &Predicate,
        sort: &[OrderDirective],
    ) -> Result<(), StoreError> {
        self.reads.fetch_add(1, AtomicOrdering::SeqCst);

        if let Some(error) = self.failures.lock().pop_front() {
            return Err(error);
        }

        let missing = self.missing_columns.read();
        let referenced = predicate
            .fields()
            .into_iter()
            .chain(sort.iter().map(|d| d.field));
        for field in referenced {
            if missing.contains(&field) {
                return Err(StoreError::UnknownField {
                    field: field.path().to_string(),
                });
            }
        }
        Ok(())
    }
}

impl Tables {
    /// Listing with its seller columns filled from the seller table.
    fn joined(&self, listing: &Listing) -> Listing {
        let mut listing = listing.clone();
        let seller = self.sellers.get(&listing.seller_id);
        listing.seller_city = seller.and_then(|s| s.city.clone());
        listing.seller_country = seller.and_then(|s| s.country.clone());
        listing
    }

    fn matching<'a>(&'a self, predicate: &'a Predicate) -> impl Iterator<Item = &'a Listing> {
        self.listings
            .iter()
            .filter(move |listing| self.matches(listing, predicate))
    }

    fn matches(&self, listing: &Listing, predicate: &Predicate) -> bool {
        match predicate {
            Predicate::And(children) => children.iter().all(|c| self.matches(listing, c)),
            Predicate::Or(children) => children.iter().any(|c| self.matches(listing, c)),
            Predicate::Compare { field, comparison } => {
                let value = self.value_of(listing, *field);
                compare(value.as_ref(), comparison)
            }
        }
    }

    /// Column value, `None` for NULL.
    fn value_of(&self, listing: &Listing, field: Field) -> Option<Scalar> {
        let text = |value: &Option<String>| value.clone().map(Scalar::Text);
        let seller = self.sellers.get(&listing.seller_id);

        match field {
            Field::Status => Some(Scalar::Text(listing.status.clone())),
            Field::Brand => Some(Scalar::Text(listing.brand.clone())),
            Field::Model => text(&listing.model),
            Field::Reference => text(&listing.reference),
            Field::Movement => text(&listing.movement),
            Field::PriceMinorUnits => Some(Scalar::Integer(listing.price_minor_units)),
            Field::Year => listing.year.map(|y| Scalar::Integer(i64::from(y))),
            Field::Condition => text(&listing.condition),
            Field::Location => text(&listing.location),
            Field::Gender => text(&listing.gender),
            Field::BoxPapers => text(&listing.box_papers),
            Field::Created => Some(Scalar::Integer(listing.created)),
            Field::SellerVerified => seller.map(|s| Scalar::Bool(s.is_verified)),
            Field::SellerIdentityStatus => seller.and_then(|s| text(&s.identity_status)),
            Field::SellerCity => seller.and_then(|s| text(&s.city)),
            Field::SellerCountry => seller.and_then(|s| text(&s.country)),
        }
    }

    fn order(&self, a: &Listing, b: &Listing, sort: &[OrderDirective]) -> Ordering {
        for directive in sort {
            let left = self.value_of(a, directive.field);
            let right = self.value_of(b, directive.field);
            let ordering = order_values(left.as_ref(), right.as_ref(), directive);
            if ordering != Ordering::Equal {
                return ordering;
            }
        }
        Ordering::Equal
    }
}

/// SQL three-valued comparison collapsed to "matches"; NULL never matches
/// except for `IsNull`.
fn compare(value: Option<&Scalar>, comparison: &Comparison) -> bool {
    match (comparison, value) {
        (Comparison::IsNull, value) => value.is_none(),
        (_, None) => false,
        (Comparison::Equals { value: expected }, Some(actual)) => actual == expected,
        (Comparison::In { values }, Some(actual)) => values.contains(actual),
        (Comparison::Contains { value: needle }, Some(Scalar::Text(haystack))) => {
            haystack.to_lowercase().contains(&needle.to_lowercase())
        }
        (Comparison::Range { min, max }, Some(Scalar::Integer(n))) => {
            min.is_none_or(|min| *n >= min) && max.is_none_or(|max| *n <= max)
        }
        (Comparison::IsEmpty, Some(Scalar::Text(s))) => s.is_empty(),
        _ => false,
    }
}

/// Order two column values under one directive. Without an explicit NULLS
/// clause, NULLs sort as if larger than any value, as Postgres does.
fn order_values(a: Option<&Scalar>, b: Option<&Scalar>, directive: &OrderDirective) -> Ordering {
    let nulls = directive.nulls.unwrap_or(match directive.direction {
        SortDirection::Asc => NullsOrder::Last,
        SortDirection::Desc => NullsOrder::First,
    });

    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => match nulls {
            NullsOrder::First => Ordering::Less,
            NullsOrder::Last => Ordering::Greater,
        },
        (Some(_), None) => match nulls {
            NullsOrder::First => Ordering::Greater,
            NullsOrder::Last => Ordering::Less,
        },
        (Some(a), Some(b)) => {
            let ordering = match (a, b) {
                (Scalar::Integer(a), Scalar::Integer(b)) => a.cmp(b),
                (Scalar::Text(a), Scalar::Text(b)) => a.cmp(b),
                (Scalar::Bool(a), Scalar::Bool(b)) => a.cmp(b),
                _ => Ordering::Equal,
            };
            match directive.direction {
                SortDirection::Asc => ordering,
                SortDirection::Desc => ordering.reverse(),
            }
        }
    }
}

#[async_trait]
impl ListingStore for MemoryStore {
    async fn find_page(
        &self,
        predicate: &Predicate,
        sort: &[OrderDirective],
        window: PageWindow,
    ) -> Result<Vec<Listing>, StoreError> {
        self.begin_read(predicate, sort)?;

        let tables = self.tables.read();
        let mut rows: Vec<&Listing> = tables.matching(predicate).collect();
        rows.sort_by(|a, b| tables.order(a, b, sort));

        let offset = usize::try_from(window.offset).unwrap_or(usize::MAX);
        let limit = usize::try_from(window.limit).unwrap_or(usize::MAX);
        Ok(rows
            .into_iter()
            .skip(offset)
            .take(limit)
            .map(|l| tables.joined(l))
            .collect())
    }

    async fn count(&self, predicate: &Predicate) -> Result<u64, StoreError> {
        self.begin_read(predicate, &[])?;

        let tables = self.tables.read();
        Ok(tables.matching(predicate).count() as u64)
    }

    async fn facet_brands(
        &self,
        predicate: &Predicate,
        limit: u32,
    ) -> Result<Vec<String>, StoreError> {
        self.begin_read(predicate, &[])?;

        let tables = self.tables.read();
        let mut brands: Vec<String> = tables
            .matching(predicate)
            .map(|l| l.brand.clone())
            .collect::<std::collections::BTreeSet<_>>()
            .into_iter()
            .collect();
        brands.truncate(usize::try_from(limit).unwrap_or(usize::MAX));
        Ok(brands)
    }
}

#[async_trait]
impl ListingWriter for MemoryStore {
    async fn insert(&self, input: CreateListing) -> Result<Listing, StoreError> {
        let now = chrono::Utc::now().timestamp();
        let listing = Listing {
            id: Uuid::now_v7(),
            title: input.title,
            brand: input.brand,
            model: input.model,
            reference: input.reference,
            movement: input.movement,
            price_minor_units: input.price_minor_units,
            year: input.year,
            condition: input.condition,
            location: input.location,
            gender: input.gender,
            box_papers: input.box_papers,
            status: input
                .status
                .unwrap_or(ListingStatus::Pending)
                .as_str()
                .to_string(),
            created: now,
            changed: now,
            seller_id: input.seller_id,
            seller_city: None,
            seller_country: None,
        };

        let mut tables = self.tables.write();
        let joined = tables.joined(&listing);
        tables.listings.push(listing);
        Ok(joined)
    }

    async fn update(&self, id: Uuid, input: UpdateListing) -> Result<Option<Listing>, StoreError> {
        let mut tables = self.tables.write();
        let Some(listing) = tables.listings.iter_mut().find(|l| l.id == id) else {
            return Ok(None);
        };
        input.apply_to(listing);
        listing.changed = chrono::Utc::now().timestamp();
        let updated = listing.clone();
        Ok(Some(tables.joined(&updated)))
    }

    async fn set_status(
        &self,
        id: Uuid,
        status: ListingStatus,
    ) -> Result<Option<Listing>, StoreError> {
        let mut tables = self.tables.write();
        let Some(listing) = tables.listings.iter_mut().find(|l| l.id == id) else {
            return Ok(None);
        };
        listing.status = status.as_str().to_string();
        listing.changed = chrono::Utc::now().timestamp();
        let updated = listing.clone();
        Ok(Some(tables.joined(&updated)))
    }
}
