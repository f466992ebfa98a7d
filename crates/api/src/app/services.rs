use std::sync::Arc;

use souk_infra::{seed_demo_catalog, InMemoryCatalog, InMemoryOrderStore};
use souk_inventory::{InventoryLedger, StockStoreError};
use souk_sales::{LifecycleController, OrderBuilder};
use souk_search::SearchConfig;

pub type Catalog = Arc<InMemoryCatalog>;
pub type Orders = Arc<InMemoryOrderStore>;

/// Everything a handler needs, shared behind one `Arc`.
pub struct AppServices {
    pub catalog: Catalog,
    pub orders: Orders,
    pub builder: OrderBuilder<Catalog, Orders>,
    pub lifecycle: LifecycleController<Orders>,
    pub search: SearchConfig,
}

impl AppServices {
    pub fn new(catalog: Catalog, orders: Orders) -> Self {
        let ledger = InventoryLedger::new(catalog.clone());
        Self {
            builder: OrderBuilder::new(ledger, orders.clone()),
            lifecycle: LifecycleController::new(orders.clone()),
            search: SearchConfig::default(),
            catalog,
            orders,
        }
    }

    pub fn in_memory() -> Self {
        Self::new(Arc::new(InMemoryCatalog::new()), Arc::new(InMemoryOrderStore::new()))
    }

    /// In-memory services with the demo catalog loaded.
    pub fn demo() -> Result<Self, StockStoreError> {
        let services = Self::in_memory();
        seed_demo_catalog(&services.catalog)?;
        Ok(services)
    }
}
