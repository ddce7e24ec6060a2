//! Paginator and facet aggregator.

use super::compiler;
use super::executor::RawQueryResult;
use super::predicate::Predicate;
use super::sort::OrderDirective;
use super::types::SearchResult;
use crate::models::Listing;
use crate::store::{ListingStore, StoreError};

/// Default listings per page.
pub const DEFAULT_PAGE_SIZE: u32 = 24;

/// Default maximum number of facet brands.
pub const DEFAULT_FACET_LIMIT: u32 = 50;

/// Offset/limit window for one page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    /// 1-based page number.
    pub page: u32,
    pub offset: u64,
    pub limit: u32,
}

impl PageWindow {
    pub fn new(page: u32, page_size: u32) -> Self {
        let page = page.max(1);
        Self {
            page,
            offset: u64::from(page - 1) * u64::from(page_size),
            limit: page_size,
        }
    }
}

/// Resolve a raw page parameter. Non-numeric or < 1 clamps to 1.
pub fn resolve_page(raw: Option<&str>) -> u32 {
    let Some(page) = raw.and_then(|p| p.trim().parse::<i64>().ok()) else {
        return 1;
    };
    u32::try_from(page.max(1)).unwrap_or(u32::MAX)
}

/// Everything one execution attempt reads.
#[derive(Debug, Clone, PartialEq)]
pub struct PageContents {
    pub items: Vec<Listing>,
    pub total: u64,
    pub facet_brands: Vec<String>,
}

/// Issue the items, count and facet reads concurrently.
///
/// Items and count share `predicate`. Facets cover the whole visible
/// catalog regardless of the active filter.
pub async fn fetch_page(
    store: &dyn ListingStore,
    predicate: &Predicate,
    sort: &[OrderDirective],
    window: PageWindow,
    facet_limit: u32,
) -> Result<PageContents, StoreError> {
    let facet_scope = compiler::visibility();

    let (items, total, facet_brands) = tokio::try_join!(
        store.find_page(predicate, sort, window),
        store.count(predicate),
        store.facet_brands(&facet_scope, facet_limit),
    )?;

    Ok(PageContents {
        items,
        total,
        facet_brands,
    })
}

/// Build the result envelope for an executed page.
pub fn assemble(raw: RawQueryResult, window: PageWindow) -> SearchResult {
    let mut items = raw.contents.items;
    items.truncate(usize::try_from(window.limit).unwrap_or(usize::MAX));

    SearchResult::new(
        items,
        raw.contents.total,
        raw.contents.facet_brands,
        window.page,
        window.limit,
    )
}
