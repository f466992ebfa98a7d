use serde::Serialize;
use thiserror::Error;

use souk_core::DomainError;

use crate::Principal;

/// Every entry point of the order/search core that needs an authorization decision.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    SearchCatalog,
    PlaceOrder,
    ConfirmOrder,
    ViewOrder,
    ListAllOrders,
    SetPaymentStatus,
    UpdateOrderStatus,
    CreateDelivery,
    UpdateDeliveryStatus,
    ViewDelivery,
    ListAllDeliveries,
}

impl Operation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::SearchCatalog => "search_catalog",
            Operation::PlaceOrder => "place_order",
            Operation::ConfirmOrder => "confirm_order",
            Operation::ViewOrder => "view_order",
            Operation::ListAllOrders => "list_all_orders",
            Operation::SetPaymentStatus => "set_payment_status",
            Operation::UpdateOrderStatus => "update_order_status",
            Operation::CreateDelivery => "create_delivery",
            Operation::UpdateDeliveryStatus => "update_delivery_status",
            Operation::ViewDelivery => "view_delivery",
            Operation::ListAllDeliveries => "list_all_deliveries",
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthzError {
    #[error("forbidden: role '{role}' may not perform '{operation}'")]
    Forbidden {
        role: &'static str,
        operation: &'static str,
    },
}

impl From<AuthzError> for DomainError {
    fn from(value: AuthzError) -> Self {
        DomainError::access_denied(value.to_string())
    }
}

/// Authorize a principal for one operation.
///
/// - No IO
/// - No panics
/// - No business logic (pure policy check)
pub fn authorize(principal: &Principal, op: Operation) -> Result<(), AuthzError> {
    if principal.role.authorize(op) {
        Ok(())
    } else {
        tracing::debug!(
            user_id = %principal.user_id,
            role = principal.role.as_str(),
            operation = op.as_str(),
            "authorization denied"
        );
        Err(AuthzError::Forbidden {
            role: principal.role.as_str(),
            operation: op.as_str(),
        })
    }
}
