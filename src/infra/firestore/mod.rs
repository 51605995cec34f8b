//! Document store adapter over the Firestore REST API.

mod client;
mod codec;
pub mod value;

pub use client::FirestoreClient;
