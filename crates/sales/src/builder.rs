use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use souk_auth::{Operation, Principal};
use souk_core::{Aggregate, DomainError, DomainResult, Event, OrderId, ProductId};
use souk_inventory::{InventoryLedger, ReservationBatch, StockStore};

use crate::order::{Order, OrderCommand, PlaceOrder, PricedLine};
use crate::store::{OrderStore, StoreError, WriteBatch};

#[derive(Debug, Clone, Copy)]
pub struct OrderBuilderConfig {
    /// Fresh order numbers to try before giving up with `Conflict`.
    pub order_number_attempts: u32,
}

impl Default for OrderBuilderConfig {
    fn default() -> Self {
        Self {
            order_number_attempts: 5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineRequest {
    pub product_id: ProductId,
    pub quantity: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaceOrderRequest {
    pub items: Vec<LineRequest>,
    pub shipping_address: String,
    #[serde(default)]
    pub payment_method: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

fn random_upper_hex(len: usize) -> String {
    let mut hex = Uuid::new_v4().simple().to_string().to_ascii_uppercase();
    hex.truncate(len);
    hex
}

/// `ORD-` + 8 upper-case hex digits.
pub fn generate_order_number() -> String {
    format!("ORD-{}", random_upper_hex(8))
}

/// `TRK-` + 12 upper-case hex digits.
pub fn generate_tracking_code() -> String {
    format!("TRK-{}", random_upper_hex(12))
}

/// Turns a cart into a priced, stock-consistent order.
pub struct OrderBuilder<S, O> {
    ledger: InventoryLedger<S>,
    orders: O,
    config: OrderBuilderConfig,
    next_number: fn() -> String,
}

impl<S: StockStore, O: OrderStore> OrderBuilder<S, O> {
    pub fn new(ledger: InventoryLedger<S>, orders: O) -> Self {
        Self {
            ledger,
            orders,
            config: OrderBuilderConfig::default(),
            next_number: generate_order_number,
        }
    }

    pub fn with_config(mut self, config: OrderBuilderConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_order_numbers(mut self, next_number: fn() -> String) -> Self {
        self.next_number = next_number;
        self
    }

    pub fn ledger(&self) -> &InventoryLedger<S> {
        &self.ledger
    }

    /// Reserve stock for every line, price the order, and persist it.
    ///
    /// All-or-nothing: on any failure the reservations taken so far are
    /// released and no order is stored. A release that cannot be applied is
    /// reported as `Internal` in place of the original error.
    ///
    /// Reservations are visible to other callers before the order is stored,
    /// so a concurrent order may see `InsufficientStock` because of stock that
    /// is later released.
    pub fn place_order(
        &self,
        principal: &Principal,
        request: PlaceOrderRequest,
        now: DateTime<Utc>,
    ) -> DomainResult<Order> {
        principal.require(Operation::PlaceOrder)?;
        self.place(principal, request, now).inspect_err(|err| {
            tracing::warn!(customer_id = %principal.user_id, error = %err, kind = err.kind(), "order rejected");
        })
    }

    fn place(&self, principal: &Principal, request: PlaceOrderRequest, now: DateTime<Utc>) -> DomainResult<Order> {
        if request.items.is_empty() {
            return Err(DomainError::invalid_request("an order needs at least one item"));
        }
        if request.shipping_address.trim().is_empty() {
            return Err(DomainError::invalid_request("shipping address is required"));
        }

        let mut reservations = self.ledger.batch();
        match self.reserve_and_store(&mut reservations, principal, &request, now) {
            Ok(order) => {
                reservations.commit();
                Ok(order)
            }
            Err(err) => {
                reservations.rollback()?;
                Err(err)
            }
        }
    }

    fn reserve_and_store(
        &self,
        reservations: &mut ReservationBatch<'_, S>,
        principal: &Principal,
        request: &PlaceOrderRequest,
        now: DateTime<Utc>,
    ) -> DomainResult<Order> {
        for item in &request.items {
            reservations.reserve(item.product_id, item.quantity)?;
        }
        let lines: Vec<PricedLine> = reservations
            .reservations()
            .iter()
            .map(|r| PricedLine {
                product_id: r.product_id,
                product_name: r.product_name.clone(),
                quantity: r.quantity,
                unit_price: r.unit_price,
            })
            .collect();

        for attempt in 1..=self.config.order_number_attempts.max(1) {
            let order_id = OrderId::new();
            let mut order = Order::empty(order_id);
            let events = order.execute(&OrderCommand::PlaceOrder(PlaceOrder {
                order_id,
                order_number: (self.next_number)(),
                customer_id: principal.user_id,
                lines: lines.clone(),
                shipping_address: request.shipping_address.clone(),
                payment_method: request.payment_method.clone(),
                notes: request.notes.clone(),
                occurred_at: now,
            }))?;

            match self.orders.commit(WriteBatch::new().insert_order(order.clone())) {
                Ok(()) => {
                    for event in &events {
                        tracing::info!(
                            event_type = event.event_type(),
                            order_number = order.order_number(),
                            customer_id = %order.customer_id(),
                            total = %order.total(),
                            lines = order.lines().len(),
                            "order placed"
                        );
                    }
                    return Ok(order);
                }
                Err(StoreError::Duplicate { field, value }) => {
                    tracing::warn!(field, value = %value, attempt, "order number collision, regenerating");
                }
                Err(other) => return Err(other.into()),
            }
        }

        Err(DomainError::conflict("could not allocate a unique order number"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use souk_core::{Money, UserId};

    use crate::status::{OrderStatus, PaymentStatus};
    use crate::testing::{MemOrders, MemStock};

    type Builder = OrderBuilder<Arc<MemStock>, Arc<MemOrders>>;

    fn builder() -> (Builder, Arc<MemStock>, Arc<MemOrders>) {
        let stock = Arc::new(MemStock::default());
        let orders = Arc::new(MemOrders::default());
        let b = OrderBuilder::new(InventoryLedger::new(stock.clone()), orders.clone());
        (b, stock, orders)
    }

    fn request(items: Vec<(ProductId, i64)>) -> PlaceOrderRequest {
        PlaceOrderRequest {
            items: items
                .into_iter()
                .map(|(product_id, quantity)| LineRequest { product_id, quantity })
                .collect(),
            shipping_address: "12 Harbour Road".into(),
            payment_method: None,
            notes: None,
        }
    }

    fn customer() -> Principal {
        Principal::customer(UserId::new())
    }

    #[test]
    fn places_priced_order_and_decrements_stock() {
        let (b, stock, orders) = builder();
        let rice = stock.add("Rice", 5, 450);
        let oil = stock.add("Oil", 2, 1299);

        let order = b
            .place_order(&customer(), request(vec![(rice, 2), (oil, 1)]), Utc::now())
            .unwrap();

        assert_eq!(order.total(), Money::from_minor(2199));
        assert_eq!(order.status(), OrderStatus::Pending);
        assert_eq!(order.payment_status(), PaymentStatus::Pending);
        assert!(order.order_number().starts_with("ORD-"));
        assert_eq!(order.order_number().len(), 12);
        assert_eq!(stock.stock(rice), 3);
        assert_eq!(stock.stock(oil), 1);
        assert_eq!(orders.orders().unwrap().len(), 1);
    }

    #[test]
    fn failing_line_rolls_back_earlier_reservations() {
        let (b, stock, orders) = builder();
        let rice = stock.add("Rice", 5, 450);
        let oil = stock.add("Oil", 1, 1299);

        let err = b
            .place_order(&customer(), request(vec![(rice, 3), (oil, 2)]), Utc::now())
            .unwrap_err();

        assert_eq!(err.kind(), "insufficient_stock");
        assert_eq!(stock.stock(rice), 5);
        assert_eq!(stock.stock(oil), 1);
        assert!(orders.orders().unwrap().is_empty());
    }

    #[test]
    fn unreleasable_stock_is_reported_as_internal() {
        let (b, stock, orders) = builder();
        let rice = stock.add("Rice", 5, 450);
        let oil = stock.add("Oil", 0, 1299);
        stock.break_restock();

        let err = b
            .place_order(&customer(), request(vec![(rice, 3), (oil, 1)]), Utc::now())
            .unwrap_err();

        assert_eq!(err.kind(), "internal");
        assert!(orders.orders().unwrap().is_empty());
    }

    #[test]
    fn duplicate_products_reserve_independently() {
        let (b, stock, _) = builder();
        let rice = stock.add("Rice", 5, 100);

        let order = b
            .place_order(&customer(), request(vec![(rice, 2), (rice, 3)]), Utc::now())
            .unwrap();
        assert_eq!(order.lines().len(), 2);
        assert_eq!(stock.stock(rice), 0);
    }

    #[test]
    fn rejects_empty_cart_blank_address_and_admins() {
        let (b, stock, _) = builder();
        let rice = stock.add("Rice", 5, 100);

        let err = b.place_order(&customer(), request(vec![]), Utc::now()).unwrap_err();
        assert_eq!(err.kind(), "invalid_request");

        let mut blank = request(vec![(rice, 1)]);
        blank.shipping_address = "  ".into();
        assert_eq!(b.place_order(&customer(), blank, Utc::now()).unwrap_err().kind(), "invalid_request");

        let admin = Principal::admin(UserId::new());
        let err = b.place_order(&admin, request(vec![(rice, 1)]), Utc::now()).unwrap_err();
        assert_eq!(err.kind(), "access_denied");
        assert_eq!(stock.stock(rice), 5);
    }

    #[test]
    fn later_price_changes_do_not_touch_placed_orders() {
        let (b, stock, orders) = builder();
        let rice = stock.add("Rice", 5, 450);
        let order = b.place_order(&customer(), request(vec![(rice, 2)]), Utc::now()).unwrap();

        stock.set_price(rice, 9_999);

        let stored = orders.order(order.id_typed()).unwrap().unwrap();
        assert_eq!(stored.lines()[0].unit_price, Money::from_minor(450));
        assert_eq!(stored.total(), Money::from_minor(900));
    }

    #[test]
    fn exhausted_order_numbers_surface_conflict_and_release_stock() {
        let (b, stock, _) = builder();
        let b = b
            .with_order_numbers(|| "ORD-SAMESAME".to_string())
            .with_config(OrderBuilderConfig { order_number_attempts: 3 });
        let rice = stock.add("Rice", 5, 100);

        b.place_order(&customer(), request(vec![(rice, 1)]), Utc::now()).unwrap();
        let err = b.place_order(&customer(), request(vec![(rice, 1)]), Utc::now()).unwrap_err();

        assert_eq!(err.kind(), "conflict");
        assert_eq!(stock.stock(rice), 4);
    }

    #[test]
    fn generated_codes_have_expected_shape() {
        let number = generate_order_number();
        let code = generate_tracking_code();
        assert_eq!(number.len(), 12);
        assert_eq!(code.len(), 16);
        assert!(code[4..].chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_lowercase()));
    }
}
