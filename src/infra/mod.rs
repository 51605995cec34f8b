//! Infrastructure adapters and runtime bootstrap.

pub mod cloudinary;
pub mod error;
pub mod firestore;
pub mod http;
pub mod http_client;
pub mod identity;
pub mod telemetry;
