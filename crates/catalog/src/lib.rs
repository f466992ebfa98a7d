//! Catalog read model for the marketplace core.
//!
//! Product, category and offer editing is owned by an outer CRUD surface; the
//! core only reads from it through [`CatalogReader`].

pub mod category;
pub mod product;
pub mod reader;

pub use category::{Category, Offer};
pub use product::{Discount, Product};
pub use reader::{CatalogReader, ProductView};
