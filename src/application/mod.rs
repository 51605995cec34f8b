//! Application services layer.

pub mod admin;
pub mod error;
pub mod images;
pub mod repos;
pub mod session;
