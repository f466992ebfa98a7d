//! Infrastructure layer: in-memory adapters for the catalog and order ports.

pub mod catalog;
pub mod orders;
pub mod seed;


pub use catalog::InMemoryCatalog;
pub use orders::InMemoryOrderStore;
pub use seed::seed_demo_catalog;
