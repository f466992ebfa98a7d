//! Sales context: order placement and the order/payment/delivery lifecycle.
//!
//! `Order` and `Delivery` are aggregates in the usual handle/apply style.
//! [`OrderBuilder`] and [`LifecycleController`] drive them against the
//! inventory ledger and the [`OrderStore`] port.

pub mod builder;
pub mod delivery;
pub mod lifecycle;
pub mod order;
pub mod status;
pub mod store;

#[cfg(test)]
mod testing;

pub use builder::{
    generate_order_number, generate_tracking_code, LineRequest, OrderBuilder, OrderBuilderConfig,
    PlaceOrderRequest,
};
pub use delivery::{
    CreateDelivery, Delivery, DeliveryChange, DeliveryCommand, DeliveryCreated, DeliveryEvent,
    DeliveryStatusChanged, UpdateDeliveryStatus,
};
pub use lifecycle::{DeliveryUpdate, LifecycleConfig, LifecycleController, NewDelivery, OrderQuery, Page};
pub use order::{
    ChangeOrderStatus, ConfirmOrder, FollowDelivery, Order, OrderCommand, OrderConfirmed, OrderEvent,
    OrderLine, OrderPlaced, OrderStatusChanged, PaymentStatusChanged, PlaceOrder, PricedLine,
    SetPaymentStatus,
};
pub use status::{DeliveryStatus, OrderStatus, PaymentStatus};
pub use store::{OrderStore, StoreError, WriteBatch};
