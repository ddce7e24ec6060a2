//! Postgres listing store.
//!
//! SQL is generated with SeaQuery from the predicate tree. Listings are
//! LEFT JOINed to their seller so seller-relation fields can be filtered
//! and sorted on; the selected row never includes the seller-verification
//! columns.

use async_trait::async_trait;
use sea_query::{
    Alias, Asterisk, Cond, Expr, Func, JoinType, NullOrdering, Order,
    PostgresQueryBuilder, Query, SelectStatement, SimpleExpr,
};
use sqlx::PgPool;
use tracing::debug;
use uuid::Uuid;

use super::{ListingStore, ListingWriter, StoreError};
use crate::models::{CreateListing, Listing, ListingStatus, UpdateListing};
use crate::search::paginator::PageWindow;
use crate::search::predicate::{Comparison, Field, Predicate, Relation, Scalar};
use crate::search::sort::{NullsOrder, OrderDirective, SortDirection};

const LISTING_TABLE: &str = "listing";
const SELLER_TABLE: &str = "seller";

/// Listing columns selected for every item read.
const LISTING_COLUMNS: [&str; 16] = [
    "id",
    "title",
    "brand",
    "model",
    "reference",
    "movement",
    "price_minor_units",
    "year",
    "condition",
    "location",
    "gender",
    "box_papers",
    "status",
    "created",
    "changed",
    "seller_id",
];

/// SQL generator for catalog reads.
pub struct ListingQuery<'a> {
    predicate: &'a Predicate,
    sort: &'a [OrderDirective],
}

impl<'a> ListingQuery<'a> {
    pub fn new(predicate: &'a Predicate, sort: &'a [OrderDirective]) -> Self {
        Self { predicate, sort }
    }

    /// Build the page SELECT.
    pub fn build(&self, window: PageWindow) -> String {
        let mut query = Query::select();
        add_listing_columns(&mut query);
        query.from(Alias::new(LISTING_TABLE));
        add_seller_join(&mut query);
        self.add_filters(&mut query);
        self.add_sorts(&mut query);
        query.limit(u64::from(window.limit));
        query.offset(window.offset);

        query.to_string(PostgresQueryBuilder)
    }

    /// Build a COUNT query for total results.
    pub fn build_count(&self) -> String {
        let mut query = Query::select();
        query.expr(Expr::col(Asterisk).count());
        query.from(Alias::new(LISTING_TABLE));
        add_seller_join(&mut query);
        self.add_filters(&mut query);

        query.to_string(PostgresQueryBuilder)
    }

    /// Build the distinct-brand facet query.
    pub fn build_facets(&self, limit: u32) -> String {
        let brand = (Alias::new(LISTING_TABLE), Alias::new(Field::Brand.column()));

        let mut query = Query::select();
        query.distinct();
        query.column(brand.clone());
        query.from(Alias::new(LISTING_TABLE));
        add_seller_join(&mut query);
        self.add_filters(&mut query);
        query.order_by(brand, Order::Asc);
        query.limit(u64::from(limit));

        query.to_string(PostgresQueryBuilder)
    }

    /// Each top-level conjunct becomes one WHERE term.
    fn add_filters(&self, query: &mut SelectStatement) {
        for conjunct in self.predicate.conjuncts() {
            query.and_where(condition(conjunct));
        }
    }

    fn add_sorts(&self, query: &mut SelectStatement) {
        for directive in self.sort {
            let order = match directive.direction {
                SortDirection::Asc => Order::Asc,
                SortDirection::Desc => Order::Desc,
            };
            let col = column_ref(directive.field);

            match directive.nulls {
                Some(NullsOrder::First) => {
                    query.order_by_with_nulls(col, order, NullOrdering::First);
                }
                Some(NullsOrder::Last) => {
                    query.order_by_with_nulls(col, order, NullOrdering::Last);
                }
                None => {
                    query.order_by(col, order);
                }
            }
        }
    }
}

/// Single-listing SELECT used after writes.
fn build_by_id(id: Uuid) -> String {
    let mut query = Query::select();
    add_listing_columns(&mut query);
    query.from(Alias::new(LISTING_TABLE));
    add_seller_join(&mut query);
    query.and_where(Expr::col((Alias::new(LISTING_TABLE), Alias::new("id"))).eq(id));

    query.to_string(PostgresQueryBuilder)
}

fn add_listing_columns(query: &mut SelectStatement) {
    query.columns(
        LISTING_COLUMNS
            .iter()
            .map(|col| (Alias::new(LISTING_TABLE), Alias::new(*col))),
    );
    query.expr_as(
        Expr::col((Alias::new(SELLER_TABLE), Alias::new("city"))),
        Alias::new("seller_city"),
    );
    query.expr_as(
        Expr::col((Alias::new(SELLER_TABLE), Alias::new("country"))),
        Alias::new("seller_country"),
    );
}

fn add_seller_join(query: &mut SelectStatement) {
    query.join(
        JoinType::LeftJoin,
        Alias::new(SELLER_TABLE),
        Expr::col((Alias::new(LISTING_TABLE), Alias::new("seller_id")))
            .equals((Alias::new(SELLER_TABLE), Alias::new("id"))),
    );
}

fn column_ref(field: Field) -> (Alias, Alias) {
    let table = match field.relation() {
        Relation::Listing => LISTING_TABLE,
        Relation::Seller => SELLER_TABLE,
    };
    (Alias::new(table), Alias::new(field.column()))
}

fn column(field: Field) -> Expr {
    Expr::col(column_ref(field))
}

fn scalar(value: &Scalar) -> SimpleExpr {
    match value {
        Scalar::Bool(b) => Expr::val(*b).into(),
        Scalar::Integer(i) => Expr::val(*i).into(),
        Scalar::Text(s) => Expr::val(s.as_str()).into(),
    }
}

/// Translate a predicate node into a SQL expression.
fn condition(predicate: &Predicate) -> SimpleExpr {
    match predicate {
        Predicate::Compare { field, comparison } => comparison_expr(*field, comparison),
        Predicate::And(children) if children.is_empty() => Expr::cust("TRUE"),
        Predicate::Or(children) if children.is_empty() => Expr::cust("FALSE"),
        Predicate::And(children) => children
            .iter()
            .fold(Cond::all(), |cond, child| cond.add(condition(child)))
            .into(),
        Predicate::Or(children) => children
            .iter()
            .fold(Cond::any(), |cond, child| cond.add(condition(child)))
            .into(),
    }
}

fn comparison_expr(field: Field, comparison: &Comparison) -> SimpleExpr {
    match comparison {
        Comparison::Equals { value } => column(field).eq(scalar(value)),
        Comparison::Contains { value } => Expr::expr(Func::lower(column(field))).like(format!(
            "%{}%",
            escape_like_wildcards(&value.to_lowercase())
        )),
        Comparison::In { values } => {
            if values.is_empty() {
                return Expr::cust("FALSE");
            }
            column(field).is_in(values.iter().map(scalar))
        }
        Comparison::Range { min, max } => match (min, max) {
            (Some(min), Some(max)) => Cond::all()
                .add(column(field).gte(*min))
                .add(column(field).lte(*max))
                .into(),
            (Some(min), None) => column(field).gte(*min),
            (None, Some(max)) => column(field).lte(*max),
            (None, None) => column(field).is_not_null(),
        },
        Comparison::IsNull => column(field).is_null(),
        Comparison::IsEmpty => column(field).eq(""),
    }
}

/// Escape SQL LIKE wildcard characters (`%`, `_`, `\`) in a value.
fn escape_like_wildcards(value: &str) -> String {
    value
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

/// Listing store backed by a Postgres pool.
#[derive(Clone)]
pub struct PgListingStore {
    pool: PgPool,
}

impl PgListingStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn fetch(&self, id: Uuid) -> Result<Option<Listing>, StoreError> {
        let sql = build_by_id(id);
        let listing = sqlx::query_as::<_, Listing>(&sql)
            .fetch_optional(&self.pool)
            .await?;
        Ok(listing)
    }
}

#[async_trait]
impl ListingStore for PgListingStore {
    async fn find_page(
        &self,
        predicate: &Predicate,
        sort: &[OrderDirective],
        window: PageWindow,
    ) -> Result<Vec<Listing>, StoreError> {
        let sql = ListingQuery::new(predicate, sort).build(window);
        debug!(sql = %sql, "catalog page query");

        let rows = sqlx::query_as::<_, Listing>(&sql)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    async fn count(&self, predicate: &Predicate) -> Result<u64, StoreError> {
        let sql = ListingQuery::new(predicate, &[]).build_count();
        debug!(sql = %sql, "catalog count query");

        let total = sqlx::query_scalar::<_, i64>(&sql).fetch_one(&self.pool).await?;
        Ok(u64::try_from(total).unwrap_or(0))
    }

    async fn facet_brands(
        &self,
        predicate: &Predicate,
        limit: u32,
    ) -> Result<Vec<String>, StoreError> {
        let sql = ListingQuery::new(predicate, &[]).build_facets(limit);
        debug!(sql = %sql, "catalog facet query");

        let brands = sqlx::query_scalar::<_, String>(&sql).fetch_all(&self.pool).await?;
        Ok(brands)
    }
}

#[async_trait]
impl ListingWriter for PgListingStore {
    async fn insert(&self, input: CreateListing) -> Result<Listing, StoreError> {
        let now = chrono::Utc::now().timestamp();
        let id = Uuid::now_v7();
        let status = input.status.unwrap_or(ListingStatus::Pending);

        sqlx::query(
            r#"
            INSERT INTO listing (id, title, brand, model, reference, movement, price_minor_units, year, condition, location, gender, box_papers, status, created, changed, seller_id)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16)
            "#,
        )
        .bind(id)
        .bind(&input.title)
        .bind(&input.brand)
        .bind(&input.model)
        .bind(&input.reference)
        .bind(&input.movement)
        .bind(input.price_minor_units)
        .bind(input.year)
        .bind(&input.condition)
        .bind(&input.location)
        .bind(&input.gender)
        .bind(&input.box_papers)
        .bind(status.as_str())
        .bind(now)
        .bind(now)
        .bind(input.seller_id)
        .execute(&self.pool)
        .await?;

        self.fetch(id)
            .await?
            .ok_or_else(|| StoreError::Unavailable(format!("listing {id} vanished after insert")))
    }

    async fn update(&self, id: Uuid, input: UpdateListing) -> Result<Option<Listing>, StoreError> {
        let Some(mut listing) = self.fetch(id).await? else {
            return Ok(None);
        };
        input.apply_to(&mut listing);
        listing.changed = chrono::Utc::now().timestamp();

        sqlx::query(
            r#"
            UPDATE listing
            SET title = $2, brand = $3, model = $4, reference = $5, movement = $6,
                price_minor_units = $7, year = $8, condition = $9, location = $10,
                gender = $11, box_papers = $12, changed = $13
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(&listing.title)
        .bind(&listing.brand)
        .bind(&listing.model)
        .bind(&listing.reference)
        .bind(&listing.movement)
        .bind(listing.price_minor_units)
        .bind(listing.year)
        .bind(&listing.condition)
        .bind(&listing.location)
        .bind(&listing.gender)
        .bind(&listing.box_papers)
        .bind(listing.changed)
        .execute(&self.pool)
        .await?;

        Ok(Some(listing))
    }

    async fn set_status(
        &self,
        id: Uuid,
        status: ListingStatus,
    ) -> Result<Option<Listing>, StoreError> {
        let result = sqlx::query("UPDATE listing SET status = $2, changed = $3 WHERE id = $1")
            .bind(id)
            .bind(status.as_str())
            .bind(chrono::Utc::now().timestamp())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }
        self.fetch(id).await
    }
}
