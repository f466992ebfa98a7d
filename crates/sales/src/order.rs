use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use souk_core::{Aggregate, AggregateRoot, DomainError, Event, Money, OrderId, ProductId, UserId};

use crate::status::{DeliveryStatus, OrderStatus, PaymentStatus};

/// One priced line of an order. Immutable once the order is placed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderLine {
    pub line_no: u32,
    pub product_id: ProductId,
    pub product_name: String,
    pub quantity: i64,
    /// Catalog price captured when the order was placed.
    pub unit_price: Money,
    pub subtotal: Money,
}

/// Aggregate root: Order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Order {
    id: OrderId,
    order_number: String,
    customer_id: UserId,
    lines: Vec<OrderLine>,
    total: Money,
    status: OrderStatus,
    payment_status: PaymentStatus,
    payment_note: Option<String>,
    shipping_address: String,
    payment_method: Option<String>,
    notes: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    version: u64,
    created: bool,
}

impl Order {
    /// Create an empty, not-yet-placed aggregate instance.
    pub fn empty(id: OrderId) -> Self {
        Self {
            id,
            order_number: String::new(),
            customer_id: UserId::default(),
            lines: Vec::new(),
            total: Money::ZERO,
            status: OrderStatus::Pending,
            payment_status: PaymentStatus::Pending,
            payment_note: None,
            shipping_address: String::new(),
            payment_method: None,
            notes: None,
            created_at: DateTime::<Utc>::UNIX_EPOCH,
            updated_at: DateTime::<Utc>::UNIX_EPOCH,
            version: 0,
            created: false,
        }
    }

    pub fn id_typed(&self) -> OrderId {
        self.id
    }

    pub fn order_number(&self) -> &str {
        &self.order_number
    }

    pub fn customer_id(&self) -> UserId {
        self.customer_id
    }

    pub fn lines(&self) -> &[OrderLine] {
        &self.lines
    }

    pub fn total(&self) -> Money {
        self.total
    }

    pub fn status(&self) -> OrderStatus {
        self.status
    }

    pub fn payment_status(&self) -> PaymentStatus {
        self.payment_status
    }

    pub fn payment_note(&self) -> Option<&str> {
        self.payment_note.as_deref()
    }

    pub fn shipping_address(&self) -> &str {
        &self.shipping_address
    }

    pub fn payment_method(&self) -> Option<&str> {
        self.payment_method.as_deref()
    }

    pub fn notes(&self) -> Option<&str> {
        self.notes.as_deref()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    pub fn is_placed(&self) -> bool {
        self.created
    }

    /// Case-insensitive substring match over line product names.
    pub fn mentions_product(&self, needle: &str) -> bool {
        let needle = needle.to_lowercase();
        self.lines
            .iter()
            .any(|l| l.product_name.to_lowercase().contains(&needle))
    }
}

impl AggregateRoot for Order {
    type Id = OrderId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn version(&self) -> u64 {
        self.version
    }
}

/// A line already priced and reserved by the inventory ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricedLine {
    pub product_id: ProductId,
    pub product_name: String,
    pub quantity: i64,
    pub unit_price: Money,
}

/// Command: PlaceOrder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaceOrder {
    pub order_id: OrderId,
    pub order_number: String,
    pub customer_id: UserId,
    pub lines: Vec<PricedLine>,
    pub shipping_address: String,
    pub payment_method: Option<String>,
    pub notes: Option<String>,
    pub occurred_at: DateTime<Utc>,
}

/// Command: ConfirmOrder (customer re-affirms before payment is verified; puts a
/// non-terminal order back to `pending`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfirmOrder {
    pub order_id: OrderId,
    pub shipping_address: Option<String>,
    pub occurred_at: DateTime<Utc>,
}

/// Command: SetPaymentStatus.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetPaymentStatus {
    pub order_id: OrderId,
    pub status: PaymentStatus,
    pub note: Option<String>,
    pub occurred_at: DateTime<Utc>,
}

/// Command: ChangeOrderStatus (explicit admin move).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeOrderStatus {
    pub order_id: OrderId,
    pub status: OrderStatus,
    pub occurred_at: DateTime<Utc>,
}

/// Command: FollowDelivery (cascade from one of the order's deliveries).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FollowDelivery {
    pub order_id: OrderId,
    pub delivery_status: DeliveryStatus,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderCommand {
    PlaceOrder(PlaceOrder),
    ConfirmOrder(ConfirmOrder),
    SetPaymentStatus(SetPaymentStatus),
    ChangeOrderStatus(ChangeOrderStatus),
    FollowDelivery(FollowDelivery),
}

/// Event: OrderPlaced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderPlaced {
    pub order_id: OrderId,
    pub order_number: String,
    pub customer_id: UserId,
    pub lines: Vec<OrderLine>,
    pub total: Money,
    pub shipping_address: String,
    pub payment_method: Option<String>,
    pub notes: Option<String>,
    pub occurred_at: DateTime<Utc>,
}

/// Event: OrderConfirmed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderConfirmed {
    pub order_id: OrderId,
    pub shipping_address: Option<String>,
    pub occurred_at: DateTime<Utc>,
}

/// Event: PaymentStatusChanged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentStatusChanged {
    pub order_id: OrderId,
    pub from: PaymentStatus,
    pub to: PaymentStatus,
    pub note: Option<String>,
    pub occurred_at: DateTime<Utc>,
}

/// Event: OrderStatusChanged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderStatusChanged {
    pub order_id: OrderId,
    pub from: OrderStatus,
    pub to: OrderStatus,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderEvent {
    OrderPlaced(OrderPlaced),
    OrderConfirmed(OrderConfirmed),
    PaymentStatusChanged(PaymentStatusChanged),
    OrderStatusChanged(OrderStatusChanged),
}

impl Event for OrderEvent {
    fn event_type(&self) -> &'static str {
        match self {
            OrderEvent::OrderPlaced(_) => "sales.order.placed",
            OrderEvent::OrderConfirmed(_) => "sales.order.confirmed",
            OrderEvent::PaymentStatusChanged(_) => "sales.order.payment_status_changed",
            OrderEvent::OrderStatusChanged(_) => "sales.order.status_changed",
        }
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            OrderEvent::OrderPlaced(e) => e.occurred_at,
            OrderEvent::OrderConfirmed(e) => e.occurred_at,
            OrderEvent::PaymentStatusChanged(e) => e.occurred_at,
            OrderEvent::OrderStatusChanged(e) => e.occurred_at,
        }
    }
}

impl Aggregate for Order {
    type Command = OrderCommand;
    type Event = OrderEvent;
    type Error = DomainError;

    fn apply(&mut self, event: &Self::Event) {
        match event {
            OrderEvent::OrderPlaced(e) => {
                self.id = e.order_id;
                self.order_number = e.order_number.clone();
                self.customer_id = e.customer_id;
                self.lines = e.lines.clone();
                self.total = e.total;
                self.status = OrderStatus::Pending;
                self.payment_status = PaymentStatus::Pending;
                self.shipping_address = e.shipping_address.clone();
                self.payment_method = e.payment_method.clone();
                self.notes = e.notes.clone();
                self.created_at = e.occurred_at;
                self.created = true;
            }
            OrderEvent::OrderConfirmed(e) => {
                self.status = OrderStatus::Pending;
                if let Some(address) = &e.shipping_address {
                    self.shipping_address = address.clone();
                }
            }
            OrderEvent::PaymentStatusChanged(e) => {
                self.payment_status = e.to;
                if e.note.is_some() {
                    self.payment_note = e.note.clone();
                }
            }
            OrderEvent::OrderStatusChanged(e) => {
                self.status = e.to;
            }
        }

        self.updated_at = event.occurred_at();
        self.version += 1;
    }

    fn handle(&self, command: &Self::Command) -> Result<Vec<Self::Event>, Self::Error> {
        match command {
            OrderCommand::PlaceOrder(cmd) => self.handle_place(cmd),
            OrderCommand::ConfirmOrder(cmd) => self.handle_confirm(cmd),
            OrderCommand::SetPaymentStatus(cmd) => self.handle_payment(cmd),
            OrderCommand::ChangeOrderStatus(cmd) => self.handle_change_status(cmd),
            OrderCommand::FollowDelivery(cmd) => self.handle_follow_delivery(cmd),
        }
    }
}

fn non_blank(text: &Option<String>) -> Option<String> {
    text.as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
}

impl Order {
    fn ensure_placed(&self, order_id: OrderId) -> Result<(), DomainError> {
        if !self.created {
            return Err(DomainError::not_found(format!("order {order_id}")));
        }
        if self.id != order_id {
            return Err(DomainError::internal("order_id mismatch"));
        }
        Ok(())
    }

    fn handle_place(&self, cmd: &PlaceOrder) -> Result<Vec<OrderEvent>, DomainError> {
        if self.created {
            return Err(DomainError::conflict("order already exists"));
        }
        if cmd.lines.is_empty() {
            return Err(DomainError::invalid_request("an order needs at least one line"));
        }
        let shipping_address = cmd.shipping_address.trim();
        if shipping_address.is_empty() {
            return Err(DomainError::invalid_request("shipping address is required"));
        }

        let mut total = Money::ZERO;
        let mut lines = Vec::with_capacity(cmd.lines.len());
        for (idx, line) in cmd.lines.iter().enumerate() {
            if line.quantity <= 0 {
                return Err(DomainError::invalid_request("quantity must be positive"));
            }
            let subtotal = line
                .unit_price
                .checked_times(line.quantity)
                .ok_or_else(|| DomainError::invalid_request("line subtotal out of range"))?;
            total = total
                .checked_add(subtotal)
                .ok_or_else(|| DomainError::invalid_request("order total out of range"))?;
            lines.push(OrderLine {
                line_no: idx as u32 + 1,
                product_id: line.product_id,
                product_name: line.product_name.clone(),
                quantity: line.quantity,
                unit_price: line.unit_price,
                subtotal,
            });
        }

        Ok(vec![OrderEvent::OrderPlaced(OrderPlaced {
            order_id: cmd.order_id,
            order_number: cmd.order_number.clone(),
            customer_id: cmd.customer_id,
            lines,
            total,
            shipping_address: shipping_address.to_string(),
            payment_method: non_blank(&cmd.payment_method),
            notes: non_blank(&cmd.notes),
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_confirm(&self, cmd: &ConfirmOrder) -> Result<Vec<OrderEvent>, DomainError> {
        self.ensure_placed(cmd.order_id)?;

        if self.payment_status != PaymentStatus::Pending {
            return Err(DomainError::invalid_status(format!(
                "order {} can no longer be confirmed: payment is {}",
                self.order_number, self.payment_status
            )));
        }
        if self.status.is_terminal() {
            return Err(DomainError::invalid_status(format!(
                "order {} can no longer be confirmed: order is {}",
                self.order_number, self.status
            )));
        }

        Ok(vec![OrderEvent::OrderConfirmed(OrderConfirmed {
            order_id: cmd.order_id,
            shipping_address: non_blank(&cmd.shipping_address),
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_payment(&self, cmd: &SetPaymentStatus) -> Result<Vec<OrderEvent>, DomainError> {
        self.ensure_placed(cmd.order_id)?;

        if !self.payment_status.can_transition_to(cmd.status) {
            return Err(DomainError::invalid_status(format!(
                "payment cannot move from {} to {}",
                self.payment_status, cmd.status
            )));
        }

        Ok(vec![OrderEvent::PaymentStatusChanged(PaymentStatusChanged {
            order_id: cmd.order_id,
            from: self.payment_status,
            to: cmd.status,
            note: non_blank(&cmd.note),
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_change_status(&self, cmd: &ChangeOrderStatus) -> Result<Vec<OrderEvent>, DomainError> {
        self.ensure_placed(cmd.order_id)?;

        if !self.status.can_transition_to(cmd.status) {
            return Err(DomainError::invalid_status(format!(
                "order cannot move from {} to {}",
                self.status, cmd.status
            )));
        }

        Ok(vec![self.status_changed(cmd.status, cmd.occurred_at)])
    }

    /// Creating or moving a delivery drags the order along; never out of `cancelled`.
    fn handle_follow_delivery(&self, cmd: &FollowDelivery) -> Result<Vec<OrderEvent>, DomainError> {
        self.ensure_placed(cmd.order_id)?;

        let next = match (self.status, cmd.delivery_status) {
            (OrderStatus::Cancelled | OrderStatus::Delivered, _) => None,
            (_, DeliveryStatus::Delivered) => Some(OrderStatus::Delivered),
            (OrderStatus::Pending, _) => Some(OrderStatus::OnTransit),
            (OrderStatus::OnTransit, _) => None,
        };

        Ok(next
            .map(|to| self.status_changed(to, cmd.occurred_at))
            .into_iter()
            .collect())
    }

    fn status_changed(&self, to: OrderStatus, occurred_at: DateTime<Utc>) -> OrderEvent {
        OrderEvent::OrderStatusChanged(OrderStatusChanged {
            order_id: self.id,
            from: self.status,
            to,
            occurred_at,
        })
    }
}
