//! Storefront catalog service and admin back-office for a small apparel shop.
//!
//! Products, categories and product types live in a hosted document store;
//! pictures live on an image host. The storefront reads one shared in-memory
//! snapshot of the catalog, and the admin surface writes straight through to
//! the store before invalidating that snapshot.

pub mod application;
pub mod cache;
pub mod config;
pub mod domain;
pub mod infra;
pub mod presentation;
