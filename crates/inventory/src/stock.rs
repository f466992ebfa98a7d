use std::sync::Arc;

use thiserror::Error;

use souk_core::{DomainError, ExpectedVersion, Money, ProductId};

/// The stock-relevant slice of a product at one version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StockSnapshot {
    pub product_id: ProductId,
    pub name: String,
    pub stock: i64,
    /// Bumped on every stock write.
    pub version: u64,
    pub unit_price: Money,
    pub is_active: bool,
    pub minimum_order: i64,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StockStoreError {
    #[error("product {0} not found")]
    NotFound(ProductId),

    #[error("stock version conflict for {product_id} (expected {expected:?}, actual {actual:?})")]
    VersionConflict {
        product_id: ProductId,
        expected: ExpectedVersion,
        actual: Option<u64>,
    },

    #[error("stock for {0} cannot go negative")]
    NegativeStock(ProductId),

    #[error("stock backend failure: {0}")]
    Backend(String),
}

impl From<StockStoreError> for DomainError {
    fn from(err: StockStoreError) -> Self {
        match err {
            StockStoreError::NotFound(id) => DomainError::not_found(format!("product {id}")),
            StockStoreError::VersionConflict { .. } => DomainError::conflict(err.to_string()),
            StockStoreError::NegativeStock(_) => DomainError::invalid_request(err.to_string()),
            StockStoreError::Backend(msg) => DomainError::internal(msg),
        }
    }
}

/// Versioned stock storage.
///
/// `compare_and_set` must be atomic: it succeeds only when the stored version
/// still equals `expected`, and returns the new version.
pub trait StockStore: Send + Sync {
    fn snapshot(&self, product_id: ProductId) -> Result<Option<StockSnapshot>, StockStoreError>;

    fn compare_and_set(
        &self,
        product_id: ProductId,
        expected: ExpectedVersion,
        new_stock: i64,
    ) -> Result<u64, StockStoreError>;

    /// Atomically add `quantity` to the stored stock, whatever the current
    /// version. Returns the new version.
    fn restock(&self, product_id: ProductId, quantity: i64) -> Result<u64, StockStoreError>;
}

impl<S> StockStore for Arc<S>
where
    S: StockStore + ?Sized,
{
    fn snapshot(&self, product_id: ProductId) -> Result<Option<StockSnapshot>, StockStoreError> {
        (**self).snapshot(product_id)
    }

    fn compare_and_set(
        &self,
        product_id: ProductId,
        expected: ExpectedVersion,
        new_stock: i64,
    ) -> Result<u64, StockStoreError> {
        (**self).compare_and_set(product_id, expected, new_stock)
    }

    fn restock(&self, product_id: ProductId, quantity: i64) -> Result<u64, StockStoreError> {
        (**self).restock(product_id, quantity)
    }
}
