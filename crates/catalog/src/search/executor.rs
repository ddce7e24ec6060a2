//! Degrading executor.
//!
//! Runs a compiled predicate against the store. When the store reports an
//! unknown field, the executor strips the seller-verification conjuncts and
//! sort terms and retries exactly once:
//!
//! ```text
//! Fresh ──ok──────────────────────────▶ Done
//!   │
//!   └─unknown field─▶ Degrading ──ok──▶ Done(degraded)
//!                         └─────err───▶ Failed (error returned as-is)
//! ```
//!
//! Any other error on the first attempt is returned unmodified.

use std::sync::Arc;

use tracing::{debug, warn};

use super::paginator::{self, PageContents, PageWindow};
use super::predicate::{Field, Predicate};
use super::sort::OrderDirective;
use crate::store::{ListingStore, StoreError};

/// Outcome of an execution, with the predicate and sort that produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct RawQueryResult {
    pub contents: PageContents,
    /// True when the seller-verification constraints were dropped.
    pub degraded: bool,
    pub predicate: Predicate,
    pub sort: Vec<OrderDirective>,
}

/// Executor with one-shot schema-mismatch recovery.
#[derive(Clone)]
pub struct DegradingExecutor {
    store: Arc<dyn ListingStore>,
    facet_limit: u32,
}

impl DegradingExecutor {
    pub fn new(store: Arc<dyn ListingStore>, facet_limit: u32) -> Self {
        Self { store, facet_limit }
    }

    pub async fn execute(
        &self,
        predicate: &Predicate,
        sort: &[OrderDirective],
        window: PageWindow,
    ) -> Result<RawQueryResult, StoreError> {
        let error = match self.attempt(predicate, sort, window).await {
            Ok(contents) => {
                return Ok(RawQueryResult {
                    contents,
                    degraded: false,
                    predicate: predicate.clone(),
                    sort: sort.to_vec(),
                });
            }
            Err(e) if e.is_unknown_field() => e,
            Err(e) => return Err(e),
        };

        let degraded_predicate = degrade_predicate(predicate);
        let degraded_sort = degrade_sort(sort);

        let dropped_conjuncts = predicate.conjuncts().len() - degraded_predicate.conjuncts().len();
        let dropped_sort_terms = sort.len() - degraded_sort.len();
        if dropped_conjuncts == 0 && dropped_sort_terms == 0 {
            debug!(error = %error, "unknown field outside seller verification; not retrying");
            return Err(error);
        }

        warn!(
            error = %error,
            dropped_conjuncts,
            dropped_sort_terms,
            "search degraded: retrying without seller-verification constraints"
        );

        let contents = self
            .attempt(&degraded_predicate, &degraded_sort, window)
            .await?;

        Ok(RawQueryResult {
            contents,
            degraded: true,
            predicate: degraded_predicate,
            sort: degraded_sort,
        })
    }

    async fn attempt(
        &self,
        predicate: &Predicate,
        sort: &[OrderDirective],
        window: PageWindow,
    ) -> Result<PageContents, StoreError> {
        paginator::fetch_page(self.store.as_ref(), predicate, sort, window, self.facet_limit).await
    }
}

/// Drop every top-level conjunct that touches seller verification.
pub fn degrade_predicate(predicate: &Predicate) -> Predicate {
    predicate.without_conjuncts(|conjunct| conjunct.references(Field::is_seller_verification))
}

/// Drop sort terms ordering by seller verification.
pub fn degrade_sort(sort: &[OrderDirective]) -> Vec<OrderDirective> {
    sort.iter()
        .filter(|directive| !directive.field.is_seller_verification())
        .copied()
        .collect()
}
