//! Tickmark marketplace catalog.
//!
//! Search and filter engine over watch listings, its storage adapters,
//! the listing mutation service and the HTTP API. The `tickmark` binary
//! wires these together.

pub mod cache;
pub mod config;
pub mod db;
pub mod error;
pub mod listings;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod search;
pub mod state;
pub mod store;
