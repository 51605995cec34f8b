//! Application services for the administrative surface.

pub mod products;
pub mod taxonomy;

pub use products::{AdminProductError, AdminProductService};
pub use taxonomy::{AdminTaxonomyError, AdminTaxonomyService};
