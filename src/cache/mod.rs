//! In-memory catalog cache.
//!
//! The storefront never queries the document store per request. Categories,
//! product types and products are fetched together on first access and kept as
//! one immutable [`CatalogSnapshot`]; every read view is derived from it.
//!
//! Admin writes call [`CatalogCache::invalidate`] so the next storefront read
//! fetches again.

mod catalog;
mod lock;
mod snapshot;
pub mod views;

pub use catalog::{CatalogCache, CatalogError};
pub use snapshot::CatalogSnapshot;
pub use views::BrowseFilter;
