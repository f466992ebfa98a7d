use souk_core::{DomainError, DomainResult, ExpectedVersion, Money, ProductId};

use crate::stock::{StockStore, StockStoreError};

#[derive(Debug, Clone, Copy)]
pub struct LedgerConfig {
    /// Compare-and-set attempts per reservation before giving up with `Conflict`.
    pub max_attempts: u32,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self { max_attempts: 8 }
    }
}

/// Stock taken for one line item, priced at the instant it was taken.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reservation {
    pub product_id: ProductId,
    pub product_name: String,
    pub quantity: i64,
    pub unit_price: Money,
}

#[derive(Debug, Clone)]
pub struct InventoryLedger<S> {
    store: S,
    config: LedgerConfig,
}

impl<S: StockStore> InventoryLedger<S> {
    pub fn new(store: S) -> Self {
        Self::with_config(store, LedgerConfig::default())
    }

    pub fn with_config(store: S, config: LedgerConfig) -> Self {
        Self { store, config }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Atomically check and decrement stock for one line.
    ///
    /// The returned unit price is the full catalog price; discounts never apply.
    pub fn validate_and_reserve(&self, product_id: ProductId, quantity: i64) -> DomainResult<Reservation> {
        if quantity <= 0 {
            return Err(DomainError::invalid_request(format!(
                "quantity must be a positive integer, got {quantity}"
            )));
        }

        for attempt in 1..=self.config.max_attempts.max(1) {
            let snapshot = self
                .store
                .snapshot(product_id)?
                .ok_or_else(|| DomainError::not_found(format!("product {product_id}")))?;

            if !snapshot.is_active {
                return Err(DomainError::product_inactive(format!(
                    "{} is not available for ordering",
                    snapshot.name
                )));
            }
            if quantity < snapshot.minimum_order {
                return Err(DomainError::invalid_request(format!(
                    "{} has a minimum order of {}, got {quantity}",
                    snapshot.name, snapshot.minimum_order
                )));
            }
            if quantity > snapshot.stock {
                return Err(DomainError::insufficient_stock(snapshot.name, quantity, snapshot.stock));
            }

            match self.store.compare_and_set(
                product_id,
                ExpectedVersion::Exact(snapshot.version),
                snapshot.stock - quantity,
            ) {
                Ok(version) => {
                    tracing::debug!(%product_id, quantity, remaining = snapshot.stock - quantity, version, "stock reserved");
                    return Ok(Reservation {
                        product_id,
                        product_name: snapshot.name,
                        quantity,
                        unit_price: snapshot.unit_price,
                    });
                }
                Err(StockStoreError::VersionConflict { .. }) => {
                    tracing::debug!(%product_id, attempt, "stock reservation lost a race, retrying");
                }
                Err(other) => return Err(other.into()),
            }
        }

        tracing::warn!(%product_id, quantity, attempts = self.config.max_attempts, "stock reservation gave up under contention");
        Err(DomainError::conflict(format!(
            "stock for product {product_id} is under heavy contention, retry the order"
        )))
    }

    /// Put `quantity` back. Only used to compensate a reservation that will not be committed.
    ///
    /// Any failure here means stock has leaked, so it is reported as `Internal`.
    pub fn release(&self, product_id: ProductId, quantity: i64) -> DomainResult<()> {
        match self.store.restock(product_id, quantity) {
            Ok(version) => {
                tracing::debug!(%product_id, quantity, version, "stock released");
                Ok(())
            }
            Err(err) => Err(DomainError::internal(format!(
                "could not release {quantity} units of {product_id}: {err}"
            ))),
        }
    }

    /// Start an all-or-nothing group of reservations.
    pub fn batch(&self) -> ReservationBatch<'_, S> {
        ReservationBatch {
            ledger: self,
            held: Vec::new(),
            settled: false,
        }
    }
}

/// Reservations taken for one order submission.
///
/// Settle it with [`ReservationBatch::commit`] or [`ReservationBatch::rollback`].
/// Dropping an unsettled batch also releases every reservation, newest first,
/// but can only log a failed release.
#[derive(Debug)]
pub struct ReservationBatch<'a, S: StockStore> {
    ledger: &'a InventoryLedger<S>,
    held: Vec<Reservation>,
    settled: bool,
}

impl<S: StockStore> ReservationBatch<'_, S> {
    pub fn reserve(&mut self, product_id: ProductId, quantity: i64) -> DomainResult<&Reservation> {
        let reservation = self.ledger.validate_and_reserve(product_id, quantity)?;
        self.held.push(reservation);
        Ok(&self.held[self.held.len() - 1])
    }

    pub fn reservations(&self) -> &[Reservation] {
        &self.held
    }

    /// Keep the decrements.
    pub fn commit(mut self) -> Vec<Reservation> {
        self.settled = true;
        std::mem::take(&mut self.held)
    }

    /// Release every reservation, newest first.
    ///
    /// Keeps going past a failed release and returns the first failure.
    pub fn rollback(mut self) -> DomainResult<()> {
        self.settled = true;
        self.release_held()
    }

    fn release_held(&mut self) -> DomainResult<()> {
        let mut first_failure = None;
        for r in self.held.drain(..).rev() {
            if let Err(err) = self.ledger.release(r.product_id, r.quantity) {
                tracing::error!(product_id = %r.product_id, quantity = r.quantity, error = %err, "failed to release reserved stock");
                if first_failure.is_none() {
                    first_failure = Some(err);
                }
            }
        }
        first_failure.map_or(Ok(()), Err)
    }
}

impl<S: StockStore> Drop for ReservationBatch<'_, S> {
    fn drop(&mut self) {
        if !self.settled {
            // Failures are already logged by `release_held`.
            let _ = self.release_held();
        }
    }
}
