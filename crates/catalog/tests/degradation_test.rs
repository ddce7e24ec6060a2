#![allow(clippy::unwrap_used, clippy::expect_used)]
//! Schema-mismatch recovery against a store missing the seller-verification
//! columns.

mod common;

use std::sync::Arc;

use tickmark_catalog::cache::SearchCache;
use tickmark_catalog::search::{
    CatalogSearch, DegradingExecutor, Field, PageWindow, Predicate, RawQueryInput, compile,
    normalize, resolve_sort,
};
use tickmark_catalog::store::{MemoryStore, StoreError};

use common::seeded_store;

fn store_without_verification() -> Arc<MemoryStore> {
    let (store, _) = seeded_store();
    store.drop_column(Field::SellerVerified);
    store.drop_column(Field::SellerIdentityStatus);
    store
}

fn window() -> PageWindow {
    PageWindow::new(1, 24)
}

#[tokio::test]
async fn lone_verification_clause_degrades_to_no_constraint() {
    let store = store_without_verification();
    let executor = DegradingExecutor::new(store, 50);
    let predicate = Predicate::and([Predicate::eq(Field::SellerVerified, true)]);

    let result = executor
        .execute(&predicate, &resolve_sort(None), window())
        .await
        .unwrap();

    assert!(result.degraded);
    assert_eq!(result.predicate, Predicate::always());
    assert!(result.predicate.is_unconstrained());
    // No visibility clause either, so every seeded listing comes back.
    assert_eq!(result.contents.total, 7);
}

#[tokio::test]
async fn a_single_injected_mismatch_is_recovered() {
    let (store, _) = seeded_store();
    store.fail_next(StoreError::UnknownField {
        field: "seller.is_verified".to_string(),
    });
    let executor = DegradingExecutor::new(store, 50);
    let predicate = Predicate::and([Predicate::eq(Field::SellerVerified, true)]);

    let result = executor
        .execute(&predicate, &resolve_sort(None), window())
        .await
        .unwrap();

    assert!(result.degraded);
    assert_eq!(result.predicate, Predicate::always());
}

#[tokio::test]
async fn degraded_search_keeps_the_other_filters() {
    let store = store_without_verification();
    let executor = DegradingExecutor::new(store, 50);
    let state = normalize(
        &RawQueryInput::new()
            .with("brand", "Rolex")
            .with("verified", "1")
            .with("authenticated", "1"),
    );

    let result = executor
        .execute(&compile(&state), &resolve_sort(None), window())
        .await
        .unwrap();

    assert!(result.degraded);
    assert_eq!(result.predicate.conjuncts().len(), 2);
    assert!(!result.predicate.references(Field::is_seller_verification));
    // Both visible Rolex listings, verified seller or not.
    assert_eq!(result.contents.total, 2);
    assert_eq!(result.contents.items.len(), 2);
}

#[tokio::test]
async fn relevance_sort_survives_a_missing_verification_column() {
    let store = store_without_verification();
    let search = CatalogSearch::new(store, SearchCache::default(), common::settings());

    let outcome = search
        .search(&RawQueryInput::new().with("sort", "relevance"))
        .await
        .unwrap();

    assert_eq!(outcome.result.total, 5);
    // Falls back to the newest-first tiebreaker.
    assert_eq!(outcome.result.items[0].brand, "Tudor");
}

#[tokio::test]
async fn second_mismatch_propagates() {
    let store = store_without_verification();
    store.drop_column(Field::Brand);
    let executor = DegradingExecutor::new(store, 50);
    let state = normalize(&RawQueryInput::new().with("brand", "Rolex").with("verified", "1"));

    let err = executor
        .execute(&compile(&state), &resolve_sort(None), window())
        .await
        .unwrap_err();

    assert!(matches!(err, StoreError::UnknownField { ref field } if field == "brand"));
}

#[tokio::test]
async fn mismatch_outside_verification_is_not_retried() {
    let (store, _) = seeded_store();
    store.drop_column(Field::Brand);
    let executor = DegradingExecutor::new(store.clone(), 50);
    let state = normalize(&RawQueryInput::new().with("brand", "Rolex"));

    let err = executor
        .execute(&compile(&state), &resolve_sort(None), window())
        .await
        .unwrap_err();

    assert!(err.is_unknown_field());
    // One attempt issues at most three reads.
    assert!(store.read_count() <= 3);
}

#[tokio::test]
async fn other_store_errors_propagate_unmodified() {
    let (store, _) = seeded_store();
    store.fail_next(StoreError::Unavailable("connection reset".to_string()));
    let search = CatalogSearch::new(store, SearchCache::default(), common::settings());

    let err = search
        .search(&RawQueryInput::new().with("verified", "1"))
        .await
        .unwrap_err();

    assert!(matches!(
        err.store_error(),
        StoreError::Unavailable(reason) if reason == "connection reset"
    ));
}
