//! Inventory ledger: race-safe stock reservation.
//!
//! Stock lives in the catalog; this crate only reads and decrements it
//! through the [`StockStore`] port, using optimistic compare-and-set writes.

pub mod ledger;
pub mod stock;

pub use ledger::{InventoryLedger, LedgerConfig, Reservation, ReservationBatch};
pub use stock::{StockSnapshot, StockStore, StockStoreError};
