use core::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::authorize::Operation;

/// Caller role. The marketplace has exactly two.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Customer,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Customer => "customer",
            Role::Admin => "admin",
        }
    }

    /// The single capability check: may a caller in this role perform `op`?
    pub fn authorize(self, op: Operation) -> bool {
        use Operation::*;
        match self {
            Role::Customer => matches!(
                op,
                SearchCatalog | PlaceOrder | ConfirmOrder | ViewOrder | ViewDelivery
            ),
            // Placing and confirming are customer flows.
            Role::Admin => !matches!(op, PlaceOrder | ConfirmOrder),
        }
    }
}

impl core::fmt::Display for Role {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "customer" => Ok(Role::Customer),
            "admin" => Ok(Role::Admin),
            other => Err(format!("unknown role '{other}'")),
        }
    }
}
