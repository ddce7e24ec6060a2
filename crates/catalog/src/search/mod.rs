//! Catalog search and filter engine.
//!
//! Pipeline, leaf-first:
//! - [`normalizer`]: raw query parameters to a canonical [`FilterState`]
//! - [`compiler`]: filter state to a storage-agnostic [`Predicate`]
//! - [`sort`]: sort key to ordered directives
//! - [`executor`]: runs the predicate, degrading once on schema mismatch
//! - [`paginator`]: page window, concurrent reads, result envelope
//!
//! [`CatalogSearch`] drives the pipeline behind the search cache.

pub mod chips;
pub mod compiler;
pub mod executor;
pub mod normalizer;
pub mod paginator;
pub mod predicate;
pub mod service;
pub mod sort;
pub mod types;

pub use chips::{FilterChip, active_filters};
pub use compiler::compile;
pub use executor::{DegradingExecutor, RawQueryResult};
pub use normalizer::{FilterParam, normalize};
pub use paginator::{PageWindow, resolve_page};
pub use predicate::{Comparison, Field, Predicate, Scalar};
pub use service::{CatalogSearch, SearchError, SearchOutcome, SearchSettings};
pub use sort::{NullsOrder, OrderDirective, SortDirection, SortKey, resolve_sort};
pub use types::{FilterState, RawQueryInput, RawValue, SearchResult};
