//! Minimal stores for unit tests. The real adapters live in `souk-infra`.

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use souk_core::{AggregateRoot, DeliveryId, ExpectedVersion, Money, OrderId, ProductId};
use souk_inventory::{StockSnapshot, StockStore, StockStoreError};

use crate::delivery::Delivery;
use crate::order::Order;
use crate::store::{OrderStore, StoreError, WriteBatch};

#[derive(Default)]
pub struct MemStock {
    rows: Mutex<HashMap<ProductId, StockSnapshot>>,
    restock_down: AtomicBool,
}

impl MemStock {
    pub fn add(&self, name: &str, stock: i64, price: i64) -> ProductId {
        let id = ProductId::new();
        self.rows.lock().unwrap().insert(
            id,
            StockSnapshot {
                product_id: id,
                name: name.to_string(),
                stock,
                version: 1,
                unit_price: Money::from_minor(price),
                is_active: true,
                minimum_order: 1,
            },
        );
        id
    }

    pub fn stock(&self, id: ProductId) -> i64 {
        self.rows.lock().unwrap()[&id].stock
    }

    /// Make every later `restock` fail with a backend error.
    pub fn break_restock(&self) {
        self.restock_down.store(true, Ordering::SeqCst);
    }

    pub fn set_price(&self, id: ProductId, price: i64) {
        self.rows.lock().unwrap().get_mut(&id).unwrap().unit_price = Money::from_minor(price);
    }
}

impl StockStore for MemStock {
    fn snapshot(&self, product_id: ProductId) -> Result<Option<StockSnapshot>, StockStoreError> {
        Ok(self.rows.lock().unwrap().get(&product_id).cloned())
    }

    fn compare_and_set(
        &self,
        product_id: ProductId,
        expected: ExpectedVersion,
        new_stock: i64,
    ) -> Result<u64, StockStoreError> {
        let mut rows = self.rows.lock().unwrap();
        let row = rows.get_mut(&product_id).ok_or(StockStoreError::NotFound(product_id))?;
        if !expected.matches(Some(row.version)) {
            return Err(StockStoreError::VersionConflict {
                product_id,
                expected,
                actual: Some(row.version),
            });
        }
        row.stock = new_stock;
        row.version += 1;
        Ok(row.version)
    }

    fn restock(&self, product_id: ProductId, quantity: i64) -> Result<u64, StockStoreError> {
        if self.restock_down.load(Ordering::SeqCst) {
            return Err(StockStoreError::Backend("stock table unavailable".into()));
        }
        let mut rows = self.rows.lock().unwrap();
        let row = rows.get_mut(&product_id).ok_or(StockStoreError::NotFound(product_id))?;
        row.stock += quantity;
        row.version += 1;
        Ok(row.version)
    }
}

#[derive(Default)]
pub struct MemOrders {
    inner: Mutex<(HashMap<OrderId, Order>, HashMap<DeliveryId, Delivery>)>,
}

impl OrderStore for MemOrders {
    fn commit(&self, batch: WriteBatch) -> Result<(), StoreError> {
        let mut guard = self.inner.lock().unwrap();
        let (orders, deliveries) = &mut *guard;
        for (order, expected) in &batch.orders {
            let actual = orders.get(order.id()).map(|o| o.version());
            if !expected.matches(actual) {
                return Err(StoreError::VersionConflict {
                    record: order.order_number().to_string(),
                    expected: *expected,
                    actual,
                });
            }
            let taken = orders
                .values()
                .any(|o| o.id() != order.id() && o.order_number() == order.order_number());
            if taken {
                return Err(StoreError::Duplicate {
                    field: "order_number",
                    value: order.order_number().to_string(),
                });
            }
        }
        for (delivery, expected) in &batch.deliveries {
            let actual = deliveries.get(delivery.id()).map(|d| d.version());
            if !expected.matches(actual) {
                return Err(StoreError::VersionConflict {
                    record: delivery.tracking_code().to_string(),
                    expected: *expected,
                    actual,
                });
            }
            let taken = deliveries
                .values()
                .any(|d| d.id() != delivery.id() && d.tracking_code() == delivery.tracking_code());
            if taken {
                return Err(StoreError::Duplicate {
                    field: "tracking_code",
                    value: delivery.tracking_code().to_string(),
                });
            }
        }
        for (order, _) in batch.orders {
            orders.insert(*order.id(), order);
        }
        for (delivery, _) in batch.deliveries {
            deliveries.insert(*delivery.id(), delivery);
        }
        Ok(())
    }

    fn order(&self, id: OrderId) -> Result<Option<Order>, StoreError> {
        Ok(self.inner.lock().unwrap().0.get(&id).cloned())
    }

    fn orders(&self) -> Result<Vec<Order>, StoreError> {
        Ok(self.inner.lock().unwrap().0.values().cloned().collect())
    }

    fn delivery(&self, id: DeliveryId) -> Result<Option<Delivery>, StoreError> {
        Ok(self.inner.lock().unwrap().1.get(&id).cloned())
    }

    fn delivery_by_tracking_code(&self, code: &str) -> Result<Option<Delivery>, StoreError> {
        Ok(self
            .inner
            .lock()
            .unwrap()
            .1
            .values()
            .find(|d| d.tracking_code() == code)
            .cloned())
    }

    fn deliveries(&self) -> Result<Vec<Delivery>, StoreError> {
        Ok(self.inner.lock().unwrap().1.values().cloned().collect())
    }
}
