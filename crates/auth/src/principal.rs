use serde::{Deserialize, Serialize};

use souk_core::{DomainError, DomainResult, UserId};

use crate::authorize::{authorize, Operation};
use crate::Role;

/// An authenticated caller: identity + role, as resolved by the auth layer.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    pub user_id: UserId,
    pub role: Role,
}

impl Principal {
    pub fn new(user_id: UserId, role: Role) -> Self {
        Self { user_id, role }
    }

    pub fn customer(user_id: UserId) -> Self {
        Self::new(user_id, Role::Customer)
    }

    pub fn admin(user_id: UserId) -> Self {
        Self::new(user_id, Role::Admin)
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    /// Role gate for `op`, mapped into the domain taxonomy.
    pub fn require(&self, op: Operation) -> DomainResult<()> {
        authorize(self, op).map_err(DomainError::from)
    }

    /// Ownership gate: admins may act on any record, customers only on their own.
    pub fn ensure_owns(&self, owner: UserId) -> DomainResult<()> {
        if self.is_admin() || self.user_id == owner {
            Ok(())
        } else {
            Err(DomainError::access_denied("record belongs to another customer"))
        }
    }
}
