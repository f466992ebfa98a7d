//! Domain error model.

use thiserror::Error;

/// Result type used across the domain layer.
pub type DomainResult<T> = Result<T, DomainError>;

/// Domain-level error.
///
/// Every failure carries a stable kind (see [`DomainError::kind`]) plus a
/// human-readable message. Port-specific errors convert into this type.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// Malformed or missing input.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// A referenced entity does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// Authorization failure (role or ownership).
    #[error("access denied: {0}")]
    AccessDenied(String),

    /// The product exists but is not available for ordering.
    #[error("product inactive: {0}")]
    ProductInactive(String),

    #[error("insufficient stock for {product}: requested {requested}, available {available}")]
    InsufficientStock {
        product: String,
        requested: i64,
        available: i64,
    },

    /// State-machine guard violation or an unknown status value.
    #[error("invalid status: {0}")]
    InvalidStatus(String),

    /// Concurrent modification detected; retryable by the caller.
    #[error("conflict: {0}")]
    Conflict(String),

    /// Unexpected failure. The message is logged, never shown to callers.
    #[error("internal error: {0}")]
    Internal(String),
}

impl DomainError {
    pub fn invalid_request(msg: impl Into<String>) -> Self {
        Self::InvalidRequest(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn access_denied(msg: impl Into<String>) -> Self {
        Self::AccessDenied(msg.into())
    }

    pub fn product_inactive(msg: impl Into<String>) -> Self {
        Self::ProductInactive(msg.into())
    }

    pub fn insufficient_stock(product: impl Into<String>, requested: i64, available: i64) -> Self {
        Self::InsufficientStock {
            product: product.into(),
            requested,
            available,
        }
    }

    pub fn invalid_status(msg: impl Into<String>) -> Self {
        Self::InvalidStatus(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Stable, machine-readable error kind.
    pub fn kind(&self) -> &'static str {
        match self {
            DomainError::InvalidRequest(_) => "invalid_request",
            DomainError::NotFound(_) => "not_found",
            DomainError::AccessDenied(_) => "access_denied",
            DomainError::ProductInactive(_) => "product_inactive",
            DomainError::InsufficientStock { .. } => "insufficient_stock",
            DomainError::InvalidStatus(_) => "invalid_status",
            DomainError::Conflict(_) => "conflict",
            DomainError::Internal(_) => "internal",
        }
    }

    /// True for failures the caller may simply retry.
    pub fn is_retryable(&self) -> bool {
        matches!(self, DomainError::Conflict(_))
    }
}
