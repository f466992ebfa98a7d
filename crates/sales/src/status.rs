//! The three status axes of an order's lifecycle and their allowed moves.

use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Serialize};

use souk_core::DomainError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Pending,
    OnTransit,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    pub const ALL: [OrderStatus; 4] = [
        OrderStatus::Pending,
        OrderStatus::OnTransit,
        OrderStatus::Delivered,
        OrderStatus::Cancelled,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::OnTransit => "on_transit",
            OrderStatus::Delivered => "delivered",
            OrderStatus::Cancelled => "cancelled",
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, OrderStatus::Delivered | OrderStatus::Cancelled)
    }

    /// Moves an admin may request explicitly.
    pub fn can_transition_to(self, next: OrderStatus) -> bool {
        use OrderStatus::*;
        matches!(
            (self, next),
            (Pending, OnTransit) | (OnTransit, Delivered) | (Pending, Cancelled) | (OnTransit, Cancelled)
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Pending,
    Paid,
    Failed,
    Refunded,
}

impl PaymentStatus {
    pub const ALL: [PaymentStatus; 4] = [
        PaymentStatus::Pending,
        PaymentStatus::Paid,
        PaymentStatus::Failed,
        PaymentStatus::Refunded,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Paid => "paid",
            PaymentStatus::Failed => "failed",
            PaymentStatus::Refunded => "refunded",
        }
    }

    pub fn can_transition_to(self, next: PaymentStatus) -> bool {
        use PaymentStatus::*;
        // failed -> pending lets an admin re-open verification after a bad check.
        matches!(
            (self, next),
            (Pending, Paid) | (Pending, Failed) | (Paid, Refunded) | (Failed, Pending)
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryStatus {
    Pending,
    OnTransit,
    Delivered,
}

impl DeliveryStatus {
    pub const ALL: [DeliveryStatus; 3] = [
        DeliveryStatus::Pending,
        DeliveryStatus::OnTransit,
        DeliveryStatus::Delivered,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            DeliveryStatus::Pending => "pending",
            DeliveryStatus::OnTransit => "on_transit",
            DeliveryStatus::Delivered => "delivered",
        }
    }

    /// Any move is allowed except leaving `delivered`; repeating `delivered` is fine.
    pub fn can_transition_to(self, next: DeliveryStatus) -> bool {
        self != DeliveryStatus::Delivered || next == DeliveryStatus::Delivered
    }
}

macro_rules! impl_status_text {
    ($t:ty, $name:literal) => {
        impl fmt::Display for $t {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $t {
            type Err = DomainError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let wanted = s.trim();
                <$t>::ALL
                    .into_iter()
                    .find(|status| status.as_str().eq_ignore_ascii_case(wanted))
                    .ok_or_else(|| DomainError::invalid_status(format!("unknown {} '{}'", $name, s)))
            }
        }
    };
}

impl_status_text!(OrderStatus, "order status");
impl_status_text!(PaymentStatus, "payment status");
impl_status_text!(DeliveryStatus, "delivery status");
