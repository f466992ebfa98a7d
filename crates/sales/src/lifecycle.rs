//! Payment, order and delivery status transitions plus the read side.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use souk_auth::{Operation, Principal};
use souk_core::{Aggregate, AggregateRoot, DeliveryId, DomainError, DomainResult, Event, OrderId};

use crate::builder::generate_tracking_code;
use crate::delivery::{CreateDelivery, Delivery, DeliveryCommand, UpdateDeliveryStatus};
use crate::order::{ChangeOrderStatus, ConfirmOrder, FollowDelivery, Order, OrderCommand, SetPaymentStatus};
use crate::status::{DeliveryStatus, OrderStatus, PaymentStatus};
use crate::store::{OrderStore, StoreError, WriteBatch};

#[derive(Debug, Clone, Copy)]
pub struct LifecycleConfig {
    /// Fresh tracking codes to try before giving up with `Conflict`.
    pub tracking_code_attempts: u32,
    pub default_per_page: u32,
    pub max_per_page: u32,
}

impl Default for LifecycleConfig {
    fn default() -> Self {
        Self {
            tracking_code_attempts: 5,
            default_per_page: 20,
            max_per_page: 100,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewDelivery {
    pub carrier: String,
    #[serde(default)]
    pub initial_status: Option<DeliveryStatus>,
    #[serde(default)]
    pub estimated_delivery: Option<DateTime<Utc>>,
    #[serde(default)]
    pub initial_location: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryUpdate {
    pub status: DeliveryStatus,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

/// Admin order listing filter. Date bounds are inclusive.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrderQuery {
    pub product_name: Option<String>,
    pub created_from: Option<DateTime<Utc>>,
    pub created_to: Option<DateTime<Utc>>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: usize,
    pub page: u32,
    pub per_page: u32,
    pub pages: usize,
}

pub struct LifecycleController<O> {
    orders: O,
    config: LifecycleConfig,
    next_tracking_code: fn() -> String,
}

impl<O: OrderStore> LifecycleController<O> {
    pub fn new(orders: O) -> Self {
        Self {
            orders,
            config: LifecycleConfig::default(),
            next_tracking_code: generate_tracking_code,
        }
    }

    pub fn with_config(mut self, config: LifecycleConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_tracking_codes(mut self, next: fn() -> String) -> Self {
        self.next_tracking_code = next;
        self
    }

    fn load_order(&self, id: OrderId) -> DomainResult<Order> {
        self.orders
            .order(id)?
            .ok_or_else(|| DomainError::not_found(format!("order {id}")))
    }

    fn load_delivery(&self, id: DeliveryId) -> DomainResult<Delivery> {
        self.orders
            .delivery(id)?
            .ok_or_else(|| DomainError::not_found(format!("delivery {id}")))
    }

    /// Run one command against a loaded order and write it back at the loaded version.
    fn change_order(&self, mut order: Order, command: OrderCommand) -> DomainResult<Order> {
        let loaded = order.version();
        let events = order.execute(&command)?;
        self.orders.commit(WriteBatch::new().update_order(order.clone(), loaded))?;
        log_order_events(&order, &events);
        Ok(order)
    }

    pub fn set_payment_status(
        &self,
        principal: &Principal,
        order_id: OrderId,
        status: PaymentStatus,
        note: Option<String>,
        now: DateTime<Utc>,
    ) -> DomainResult<Order> {
        principal.require(Operation::SetPaymentStatus)?;
        let order = self.load_order(order_id)?;
        self.change_order(
            order,
            OrderCommand::SetPaymentStatus(SetPaymentStatus {
                order_id,
                status,
                note,
                occurred_at: now,
            }),
        )
    }

    /// Customer re-affirms an order before payment is verified.
    pub fn confirm_order(
        &self,
        principal: &Principal,
        order_id: OrderId,
        shipping_address: Option<String>,
        now: DateTime<Utc>,
    ) -> DomainResult<Order> {
        principal.require(Operation::ConfirmOrder)?;
        let order = self.load_order(order_id)?;
        principal.ensure_owns(order.customer_id())?;
        self.change_order(
            order,
            OrderCommand::ConfirmOrder(ConfirmOrder {
                order_id,
                shipping_address,
                occurred_at: now,
            }),
        )
    }

    pub fn update_order_status(
        &self,
        principal: &Principal,
        order_id: OrderId,
        status: OrderStatus,
        now: DateTime<Utc>,
    ) -> DomainResult<Order> {
        principal.require(Operation::UpdateOrderStatus)?;
        let order = self.load_order(order_id)?;
        self.change_order(
            order,
            OrderCommand::ChangeOrderStatus(ChangeOrderStatus {
                order_id,
                status,
                occurred_at: now,
            }),
        )
    }

    /// Open a delivery for a paid order; a pending order moves to `on_transit`.
    pub fn create_delivery(
        &self,
        principal: &Principal,
        order_id: OrderId,
        request: NewDelivery,
        now: DateTime<Utc>,
    ) -> DomainResult<Delivery> {
        principal.require(Operation::CreateDelivery)?;
        let mut order = self.load_order(order_id)?;

        if order.payment_status() != PaymentStatus::Paid {
            tracing::warn!(order_number = order.order_number(), payment_status = %order.payment_status(), "delivery refused before payment");
            return Err(DomainError::invalid_status(format!(
                "order {} must be paid before it ships (payment is {})",
                order.order_number(),
                order.payment_status()
            )));
        }
        if order.status().is_terminal() {
            return Err(DomainError::invalid_status(format!(
                "order {} is {} and cannot ship",
                order.order_number(),
                order.status()
            )));
        }

        let initial_status = request.initial_status.unwrap_or(DeliveryStatus::Pending);
        let loaded = order.version();
        let order_events = order.execute(&OrderCommand::FollowDelivery(FollowDelivery {
            order_id,
            delivery_status: initial_status,
            occurred_at: now,
        }))?;

        for attempt in 1..=self.config.tracking_code_attempts.max(1) {
            let delivery_id = DeliveryId::new();
            let mut delivery = Delivery::empty(delivery_id);
            let events = delivery.execute(&DeliveryCommand::CreateDelivery(CreateDelivery {
                delivery_id,
                order_id,
                order_number: order.order_number().to_string(),
                customer_id: order.customer_id(),
                tracking_code: (self.next_tracking_code)(),
                carrier: request.carrier.clone(),
                initial_status,
                estimated_delivery: request.estimated_delivery,
                initial_location: request.initial_location.clone(),
                notes: request.notes.clone(),
                occurred_at: now,
            }))?;

            let mut batch = WriteBatch::new().insert_delivery(delivery.clone());
            if !order_events.is_empty() {
                batch = batch.update_order(order.clone(), loaded);
            }

            match self.orders.commit(batch) {
                Ok(()) => {
                    log_order_events(&order, &order_events);
                    log_delivery_events(&delivery, &events);
                    return Ok(delivery);
                }
                Err(StoreError::Duplicate { field, value }) => {
                    tracing::warn!(field, value = %value, attempt, "tracking code collision, regenerating");
                }
                Err(other) => return Err(other.into()),
            }
        }

        Err(DomainError::conflict("could not allocate a unique tracking code"))
    }

    /// Append a status change to a delivery and cascade it onto the order.
    pub fn update_delivery_status(
        &self,
        principal: &Principal,
        delivery_id: DeliveryId,
        update: DeliveryUpdate,
        now: DateTime<Utc>,
    ) -> DomainResult<Delivery> {
        principal.require(Operation::UpdateDeliveryStatus)?;
        let mut delivery = self.load_delivery(delivery_id)?;
        let mut order = self.load_order(delivery.order_id())?;
        let (delivery_loaded, order_loaded) = (delivery.version(), order.version());

        let events = delivery.execute(&DeliveryCommand::UpdateDeliveryStatus(UpdateDeliveryStatus {
            delivery_id,
            status: update.status,
            location: update.location,
            description: update.description,
            occurred_at: now,
        }))?;
        let order_events = order.execute(&OrderCommand::FollowDelivery(FollowDelivery {
            order_id: order.id_typed(),
            delivery_status: update.status,
            occurred_at: now,
        }))?;

        let mut batch = WriteBatch::new().update_delivery(delivery.clone(), delivery_loaded);
        if !order_events.is_empty() {
            batch = batch.update_order(order.clone(), order_loaded);
        }
        self.orders.commit(batch)?;

        log_delivery_events(&delivery, &events);
        log_order_events(&order, &order_events);
        Ok(delivery)
    }

    pub fn order(&self, principal: &Principal, order_id: OrderId) -> DomainResult<Order> {
        principal.require(Operation::ViewOrder)?;
        let order = self.load_order(order_id)?;
        principal.ensure_owns(order.customer_id())?;
        Ok(order)
    }

    /// The caller's own orders, newest first.
    pub fn orders_for_customer(&self, principal: &Principal) -> DomainResult<Vec<Order>> {
        principal.require(Operation::ViewOrder)?;
        let mut mine: Vec<Order> = self
            .orders
            .orders()?
            .into_iter()
            .filter(|o| o.customer_id() == principal.user_id)
            .collect();
        newest_first(&mut mine, Order::created_at);
        Ok(mine)
    }

    pub fn list_orders(&self, principal: &Principal, query: &OrderQuery) -> DomainResult<Page<Order>> {
        principal.require(Operation::ListAllOrders)?;
        let needle = query
            .product_name
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty());

        let mut matching: Vec<Order> = self
            .orders
            .orders()?
            .into_iter()
            .filter(|o| needle.is_none_or(|n| o.mentions_product(n)))
            .filter(|o| query.created_from.is_none_or(|from| o.created_at() >= from))
            .filter(|o| query.created_to.is_none_or(|to| o.created_at() <= to))
            .collect();
        newest_first(&mut matching, Order::created_at);

        Ok(paginate(matching, query.page, query.per_page, &self.config))
    }

    pub fn delivery(&self, principal: &Principal, delivery_id: DeliveryId) -> DomainResult<Delivery> {
        principal.require(Operation::ViewDelivery)?;
        let delivery = self.load_delivery(delivery_id)?;
        principal.ensure_owns(delivery.customer_id())?;
        Ok(delivery)
    }

    /// Tracking codes are matched case-insensitively.
    pub fn track(&self, principal: &Principal, tracking_code: &str) -> DomainResult<Delivery> {
        principal.require(Operation::ViewDelivery)?;
        let code = tracking_code.trim().to_ascii_uppercase();
        let delivery = self
            .orders
            .delivery_by_tracking_code(&code)?
            .ok_or_else(|| DomainError::not_found(format!("tracking code {code}")))?;
        principal.ensure_owns(delivery.customer_id())?;
        Ok(delivery)
    }

    /// Oldest first.
    pub fn deliveries_for_order(&self, principal: &Principal, order_id: OrderId) -> DomainResult<Vec<Delivery>> {
        principal.require(Operation::ViewDelivery)?;
        let order = self.load_order(order_id)?;
        principal.ensure_owns(order.customer_id())?;

        let mut deliveries: Vec<Delivery> = self
            .orders
            .deliveries()?
            .into_iter()
            .filter(|d| d.order_id() == order_id)
            .collect();
        deliveries.sort_by_key(Delivery::created_at);
        Ok(deliveries)
    }

    pub fn all_deliveries(&self, principal: &Principal) -> DomainResult<Vec<Delivery>> {
        principal.require(Operation::ListAllDeliveries)?;
        let mut deliveries = self.orders.deliveries()?;
        newest_first(&mut deliveries, Delivery::created_at);
        Ok(deliveries)
    }
}

fn newest_first<T>(items: &mut [T], key: impl Fn(&T) -> DateTime<Utc>) {
    items.sort_by(|a, b| key(b).cmp(&key(a)));
}

fn paginate<T>(items: Vec<T>, page: Option<u32>, per_page: Option<u32>, config: &LifecycleConfig) -> Page<T> {
    let page = page.unwrap_or(1).max(1);
    let per_page = per_page
        .unwrap_or(config.default_per_page)
        .clamp(1, config.max_per_page.max(1));
    let total = items.len();
    let offset = (page as usize - 1).saturating_mul(per_page as usize);
    Page {
        items: items.into_iter().skip(offset).take(per_page as usize).collect(),
        total,
        page,
        per_page,
        pages: total.div_ceil(per_page as usize),
    }
}

fn log_order_events(order: &Order, events: &[<Order as Aggregate>::Event]) {
    for event in events {
        tracing::info!(
            event_type = event.event_type(),
            order_number = order.order_number(),
            status = %order.status(),
            payment_status = %order.payment_status(),
            "order updated"
        );
    }
}

fn log_delivery_events(delivery: &Delivery, events: &[<Delivery as Aggregate>::Event]) {
    for event in events {
        tracing::info!(
            event_type = event.event_type(),
            tracking_code = delivery.tracking_code(),
            status = %delivery.status(),
            "delivery updated"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use chrono::Duration;
    use souk_core::UserId;
    use souk_inventory::InventoryLedger;

    use crate::builder::{LineRequest, OrderBuilder, PlaceOrderRequest};
    use crate::testing::{MemOrders, MemStock};

    struct World {
        builder: OrderBuilder<Arc<MemStock>, Arc<MemOrders>>,
        lifecycle: LifecycleController<Arc<MemOrders>>,
        stock: Arc<MemStock>,
        admin: Principal,
        customer: Principal,
    }

    fn world() -> World {
        let stock = Arc::new(MemStock::default());
        let orders = Arc::new(MemOrders::default());
        World {
            builder: OrderBuilder::new(InventoryLedger::new(stock.clone()), orders.clone()),
            lifecycle: LifecycleController::new(orders),
            stock,
            admin: Principal::admin(UserId::new()),
            customer: Principal::customer(UserId::new()),
        }
    }

    impl World {
        fn place(&self, who: &Principal, product: &str, at: DateTime<Utc>) -> Order {
            let id = self.stock.add(product, 10, 500);
            self.builder
                .place_order(
                    who,
                    PlaceOrderRequest {
                        items: vec![LineRequest {
                            product_id: id,
                            quantity: 1,
                        }],
                        shipping_address: "12 Harbour Road".into(),
                        payment_method: None,
                        notes: None,
                    },
                    at,
                )
                .unwrap()
        }

        fn paid_order(&self) -> Order {
            let order = self.place(&self.customer, "Rice", Utc::now());
            self.lifecycle
                .set_payment_status(&self.admin, order.id_typed(), PaymentStatus::Paid, Some("ref 7".into()), Utc::now())
                .unwrap()
        }

        fn ship(&self, order: &Order) -> DomainResult<Delivery> {
            self.lifecycle.create_delivery(
                &self.admin,
                order.id_typed(),
                NewDelivery {
                    carrier: "Souk Express".into(),
                    ..NewDelivery::default()
                },
                Utc::now(),
            )
        }

        fn move_delivery(&self, delivery: &Delivery, status: DeliveryStatus, at: DateTime<Utc>) -> DomainResult<Delivery> {
            self.lifecycle.update_delivery_status(
                &self.admin,
                delivery.id_typed(),
                DeliveryUpdate {
                    status,
                    location: None,
                    description: None,
                },
                at,
            )
        }
    }

    #[test]
    fn delivery_requires_paid_order_regardless_of_order_status() {
        let w = world();
        let order = w.place(&w.customer, "Rice", Utc::now());
        assert_eq!(w.ship(&order).unwrap_err().kind(), "invalid_status");

        w.lifecycle
            .set_payment_status(&w.admin, order.id_typed(), PaymentStatus::Failed, None, Utc::now())
            .unwrap();
        assert_eq!(w.ship(&order).unwrap_err().kind(), "invalid_status");

        let other = w.place(&w.customer, "Oil", Utc::now());
        w.lifecycle
            .update_order_status(&w.admin, other.id_typed(), OrderStatus::OnTransit, Utc::now())
            .unwrap();
        assert_eq!(w.ship(&other).unwrap_err().kind(), "invalid_status");
        assert!(w.lifecycle.all_deliveries(&w.admin).unwrap().is_empty());
    }

    #[test]
    fn creating_delivery_moves_pending_order_on_transit() {
        let w = world();
        let order = w.paid_order();
        let delivery = w.ship(&order).unwrap();

        assert!(delivery.tracking_code().starts_with("TRK-"));
        assert_eq!(delivery.history().len(), 1);
        assert_eq!(
            delivery.history()[0].description,
            format!("Delivery created for order {}", order.order_number())
        );

        let order = w.lifecycle.order(&w.customer, order.id_typed()).unwrap();
        assert_eq!(order.status(), OrderStatus::OnTransit);
        assert_eq!(order.payment_note(), Some("ref 7"));
    }

    #[test]
    fn cancelled_order_cannot_ship_and_ignores_delivered_cascade() {
        let w = world();
        let order = w.paid_order();
        let delivery = w.ship(&order).unwrap();

        w.lifecycle
            .update_order_status(&w.admin, order.id_typed(), OrderStatus::Cancelled, Utc::now())
            .unwrap();
        assert_eq!(w.ship(&order).unwrap_err().kind(), "invalid_status");

        w.move_delivery(&delivery, DeliveryStatus::Delivered, Utc::now()).unwrap();
        let order = w.lifecycle.order(&w.admin, order.id_typed()).unwrap();
        assert_eq!(order.status(), OrderStatus::Cancelled);
    }

    #[test]
    fn delivered_is_idempotent_and_cascades() {
        let w = world();
        let order = w.paid_order();
        let delivery = w.ship(&order).unwrap();
        let first = Utc::now();

        let once = w.move_delivery(&delivery, DeliveryStatus::Delivered, first).unwrap();
        let twice = w
            .move_delivery(&delivery, DeliveryStatus::Delivered, first + Duration::minutes(5))
            .unwrap();

        assert_eq!(once.actual_delivery(), Some(first));
        assert_eq!(twice.actual_delivery(), Some(first));
        assert_eq!(twice.history().len(), 3);
        assert_eq!(
            w.lifecycle.order(&w.admin, order.id_typed()).unwrap().status(),
            OrderStatus::Delivered
        );

        let err = w.move_delivery(&delivery, DeliveryStatus::OnTransit, Utc::now()).unwrap_err();
        assert_eq!(err.kind(), "invalid_status");
    }

    #[test]
    fn ownership_and_roles_are_enforced() {
        let w = world();
        let order = w.place(&w.customer, "Rice", Utc::now());
        let stranger = Principal::customer(UserId::new());

        assert_eq!(w.lifecycle.order(&stranger, order.id_typed()).unwrap_err().kind(), "access_denied");
        assert_eq!(
            w.lifecycle
                .confirm_order(&stranger, order.id_typed(), None, Utc::now())
                .unwrap_err()
                .kind(),
            "access_denied"
        );
        assert_eq!(
            w.lifecycle
                .set_payment_status(&w.customer, order.id_typed(), PaymentStatus::Paid, None, Utc::now())
                .unwrap_err()
                .kind(),
            "access_denied"
        );
        assert_eq!(w.lifecycle.order(&w.admin, OrderId::new()).unwrap_err().kind(), "not_found");

        let confirmed = w
            .lifecycle
            .confirm_order(&w.customer, order.id_typed(), Some("3 New Street".into()), Utc::now())
            .unwrap();
        assert_eq!(confirmed.shipping_address(), "3 New Street");
    }

    #[test]
    fn confirming_an_unpaid_order_in_transit_resets_it() {
        let w = world();
        let order = w.place(&w.customer, "Rice", Utc::now());
        let moved = w
            .lifecycle
            .update_order_status(&w.admin, order.id_typed(), OrderStatus::OnTransit, Utc::now())
            .unwrap();
        assert_eq!(moved.status(), OrderStatus::OnTransit);

        let confirmed = w
            .lifecycle
            .confirm_order(&w.customer, order.id_typed(), None, Utc::now())
            .unwrap();
        assert_eq!(confirmed.status(), OrderStatus::Pending);
        assert_eq!(
            w.lifecycle.order(&w.admin, order.id_typed()).unwrap().status(),
            OrderStatus::Pending
        );
    }

    #[test]
    fn tracking_lookup_and_per_order_history() {
        let w = world();
        let order = w.paid_order();
        let delivery = w.ship(&order).unwrap();
        let stranger = Principal::customer(UserId::new());

        let code = delivery.tracking_code().to_lowercase();
        assert_eq!(w.lifecycle.track(&w.customer, &code).unwrap().id_typed(), delivery.id_typed());
        assert_eq!(w.lifecycle.track(&stranger, &code).unwrap_err().kind(), "access_denied");
        assert_eq!(w.lifecycle.track(&w.customer, "TRK-NOPE").unwrap_err().kind(), "not_found");

        let second = w.ship(&order).unwrap();
        let listed = w.lifecycle.deliveries_for_order(&w.customer, order.id_typed()).unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[1].id_typed(), second.id_typed());
        assert_eq!(w.lifecycle.all_deliveries(&w.customer).unwrap_err().kind(), "access_denied");
    }

    #[test]
    fn tracking_code_collisions_surface_conflict() {
        let mut w = world();
        w.lifecycle = w.lifecycle.with_tracking_codes(|| "TRK-000000000000".to_string());

        let order = w.paid_order();
        w.ship(&order).unwrap();
        assert_eq!(w.ship(&order).unwrap_err().kind(), "conflict");
        assert_eq!(w.lifecycle.deliveries_for_order(&w.admin, order.id_typed()).unwrap().len(), 1);
    }

    #[test]
    fn admin_listing_filters_and_paginates() {
        let w = world();
        let now = Utc::now();
        for days in 0..5 {
            w.place(&w.customer, "Basmati Rice", now - Duration::days(days));
        }
        w.place(&w.customer, "Olive Oil", now);

        let page = w
            .lifecycle
            .list_orders(
                &w.admin,
                &OrderQuery {
                    product_name: Some("RICE".into()),
                    created_from: Some(now - Duration::days(3)),
                    per_page: Some(2),
                    ..OrderQuery::default()
                },
            )
            .unwrap();
        assert_eq!(page.total, 4);
        assert_eq!(page.pages, 2);
        assert_eq!(page.items.len(), 2);
        assert!(page.items[0].created_at() >= page.items[1].created_at());

        assert_eq!(
            w.lifecycle.list_orders(&w.customer, &OrderQuery::default()).unwrap_err().kind(),
            "access_denied"
        );
        assert_eq!(w.lifecycle.orders_for_customer(&w.customer).unwrap().len(), 6);
    }
}
