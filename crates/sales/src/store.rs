//! Persistence port for orders and deliveries.

use std::sync::Arc;

use thiserror::Error;

use souk_core::{DeliveryId, DomainError, ExpectedVersion, OrderId};

use crate::delivery::Delivery;
use crate::order::Order;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// A unique key (order number, tracking code) is already taken.
    #[error("duplicate {field}: {value}")]
    Duplicate { field: &'static str, value: String },

    #[error("version conflict on {record} (expected {expected:?}, actual {actual:?})")]
    VersionConflict {
        record: String,
        expected: ExpectedVersion,
        actual: Option<u64>,
    },

    #[error("storage failure: {0}")]
    Backend(String),
}

impl From<StoreError> for DomainError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Duplicate { .. } | StoreError::VersionConflict { .. } => {
                DomainError::conflict(err.to_string())
            }
            StoreError::Backend(msg) => DomainError::internal(msg),
        }
    }
}

/// Records written together: every check passes and every record lands, or nothing does.
///
/// Each record is paired with the version it is expected to replace
/// (`Absent` for an insert).
#[derive(Debug, Clone, Default)]
pub struct WriteBatch {
    pub orders: Vec<(Order, ExpectedVersion)>,
    pub deliveries: Vec<(Delivery, ExpectedVersion)>,
}

impl WriteBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_order(mut self, order: Order) -> Self {
        self.orders.push((order, ExpectedVersion::Absent));
        self
    }

    /// Replace an order loaded at `loaded_version`.
    pub fn update_order(mut self, order: Order, loaded_version: u64) -> Self {
        self.orders.push((order, ExpectedVersion::Exact(loaded_version)));
        self
    }

    pub fn insert_delivery(mut self, delivery: Delivery) -> Self {
        self.deliveries.push((delivery, ExpectedVersion::Absent));
        self
    }

    pub fn update_delivery(mut self, delivery: Delivery, loaded_version: u64) -> Self {
        self.deliveries.push((delivery, ExpectedVersion::Exact(loaded_version)));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.orders.is_empty() && self.deliveries.is_empty()
    }
}

/// Order and delivery storage.
///
/// `commit` must enforce the expected versions plus uniqueness of order
/// numbers and tracking codes atomically across the whole batch.
pub trait OrderStore: Send + Sync {
    fn commit(&self, batch: WriteBatch) -> Result<(), StoreError>;

    fn order(&self, id: OrderId) -> Result<Option<Order>, StoreError>;

    fn orders(&self) -> Result<Vec<Order>, StoreError>;

    fn delivery(&self, id: DeliveryId) -> Result<Option<Delivery>, StoreError>;

    fn delivery_by_tracking_code(&self, code: &str) -> Result<Option<Delivery>, StoreError>;

    fn deliveries(&self) -> Result<Vec<Delivery>, StoreError>;
}

impl<S> OrderStore for Arc<S>
where
    S: OrderStore + ?Sized,
{
    fn commit(&self, batch: WriteBatch) -> Result<(), StoreError> {
        (**self).commit(batch)
    }

    fn order(&self, id: OrderId) -> Result<Option<Order>, StoreError> {
        (**self).order(id)
    }

    fn orders(&self) -> Result<Vec<Order>, StoreError> {
        (**self).orders()
    }

    fn delivery(&self, id: DeliveryId) -> Result<Option<Delivery>, StoreError> {
        (**self).delivery(id)
    }

    fn delivery_by_tracking_code(&self, code: &str) -> Result<Option<Delivery>, StoreError> {
        (**self).delivery_by_tracking_code(code)
    }

    fn deliveries(&self) -> Result<Vec<Delivery>, StoreError> {
        (**self).deliveries()
    }
}
