use std::collections::{HashMap, HashSet};
use std::sync::RwLock;

use souk_core::{AggregateRoot, DeliveryId, OrderId};
use souk_sales::{Delivery, Order, OrderStore, StoreError, WriteBatch};

#[derive(Debug, Default)]
struct OrderState {
    orders: HashMap<OrderId, Order>,
    order_numbers: HashMap<String, OrderId>,
    deliveries: HashMap<DeliveryId, Delivery>,
    tracking_codes: HashMap<String, DeliveryId>,
}

/// In-memory order and delivery store.
///
/// A batch is validated in full under the write lock before any record is
/// written, so a rejected batch leaves no trace.
#[derive(Debug, Default)]
pub struct InMemoryOrderStore {
    inner: RwLock<OrderState>,
}

fn poisoned() -> StoreError {
    StoreError::Backend("order store lock poisoned".to_string())
}

impl InMemoryOrderStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl OrderState {
    fn check(&self, batch: &WriteBatch) -> Result<(), StoreError> {
        let mut numbers = HashSet::new();
        for (order, expected) in &batch.orders {
            let actual = self.orders.get(order.id()).map(|o| o.version());
            if !expected.matches(actual) {
                return Err(StoreError::VersionConflict {
                    record: format!("order {}", order.id()),
                    expected: *expected,
                    actual,
                });
            }
            let owner = self.order_numbers.get(order.order_number());
            if owner.is_some_and(|id| id != order.id()) || !numbers.insert(order.order_number()) {
                return Err(StoreError::Duplicate {
                    field: "order_number",
                    value: order.order_number().to_string(),
                });
            }
        }

        let mut codes = HashSet::new();
        for (delivery, expected) in &batch.deliveries {
            let actual = self.deliveries.get(delivery.id()).map(|d| d.version());
            if !expected.matches(actual) {
                return Err(StoreError::VersionConflict {
                    record: format!("delivery {}", delivery.id()),
                    expected: *expected,
                    actual,
                });
            }
            let owner = self.tracking_codes.get(delivery.tracking_code());
            if owner.is_some_and(|id| id != delivery.id()) || !codes.insert(delivery.tracking_code()) {
                return Err(StoreError::Duplicate {
                    field: "tracking_code",
                    value: delivery.tracking_code().to_string(),
                });
            }
        }
        Ok(())
    }
}

impl OrderStore for InMemoryOrderStore {
    fn commit(&self, batch: WriteBatch) -> Result<(), StoreError> {
        let mut state = self.inner.write().map_err(|_| poisoned())?;
        state.check(&batch)?;

        for (order, _) in batch.orders {
            state.order_numbers.insert(order.order_number().to_string(), *order.id());
            state.orders.insert(*order.id(), order);
        }
        for (delivery, _) in batch.deliveries {
            state.tracking_codes.insert(delivery.tracking_code().to_string(), *delivery.id());
            state.deliveries.insert(*delivery.id(), delivery);
        }
        Ok(())
    }

    fn order(&self, id: OrderId) -> Result<Option<Order>, StoreError> {
        let state = self.inner.read().map_err(|_| poisoned())?;
        Ok(state.orders.get(&id).cloned())
    }

    fn orders(&self) -> Result<Vec<Order>, StoreError> {
        let state = self.inner.read().map_err(|_| poisoned())?;
        Ok(state.orders.values().cloned().collect())
    }

    fn delivery(&self, id: DeliveryId) -> Result<Option<Delivery>, StoreError> {
        let state = self.inner.read().map_err(|_| poisoned())?;
        Ok(state.deliveries.get(&id).cloned())
    }

    fn delivery_by_tracking_code(&self, code: &str) -> Result<Option<Delivery>, StoreError> {
        let state = self.inner.read().map_err(|_| poisoned())?;
        Ok(state
            .tracking_codes
            .get(code)
            .and_then(|id| state.deliveries.get(id))
            .cloned())
    }

    fn deliveries(&self) -> Result<Vec<Delivery>, StoreError> {
        let state = self.inner.read().map_err(|_| poisoned())?;
        Ok(state.deliveries.values().cloned().collect())
    }
}
