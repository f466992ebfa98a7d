//! `souk-core`: domain foundation building blocks.
//!
//! This crate contains **pure domain** primitives shared by the marketplace
//! contexts (no infrastructure concerns).

pub mod aggregate;
pub mod error;
pub mod event;
pub mod id;
pub mod money;

pub use aggregate::{Aggregate, AggregateRoot, ExpectedVersion};
pub use error::{DomainError, DomainResult};
pub use event::Event;
pub use id::{CategoryId, DeliveryId, OfferId, OrderId, ProductId, UserId};
pub use money::Money;
