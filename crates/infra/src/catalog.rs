use std::collections::HashMap;
use std::sync::RwLock;

use souk_catalog::{CatalogReader, Category, Offer, Product};
use souk_core::{CategoryId, DomainResult, ExpectedVersion, Money, OfferId, ProductId};
use souk_inventory::{StockSnapshot, StockStore, StockStoreError};

#[derive(Debug, Default)]
struct CatalogState {
    /// Insertion order of products.
    order: Vec<ProductId>,
    products: HashMap<ProductId, (Product, u64)>,
    categories: HashMap<CategoryId, Category>,
    offers: HashMap<OfferId, Offer>,
}

/// In-memory catalog, readable by search and decremented by the inventory ledger.
///
/// Every product carries a stock version bumped on each stock write, so
/// `compare_and_set` is a true compare-and-swap under the write lock.
#[derive(Debug, Default)]
pub struct InMemoryCatalog {
    inner: RwLock<CatalogState>,
}

fn poisoned() -> StockStoreError {
    StockStoreError::Backend("catalog lock poisoned".to_string())
}

impl InMemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a product. Replacing bumps its stock version.
    pub fn upsert_product(&self, product: Product) -> Result<(), StockStoreError> {
        if product.stock < 0 {
            return Err(StockStoreError::NegativeStock(product.id));
        }
        let mut state = self.inner.write().map_err(|_| poisoned())?;
        let id = product.id;
        match state.products.get_mut(&id) {
            Some((existing, version)) => {
                *existing = product;
                *version += 1;
            }
            None => {
                state.products.insert(id, (product, 1));
                state.order.push(id);
            }
        }
        Ok(())
    }

    pub fn upsert_category(&self, category: Category) -> Result<(), StockStoreError> {
        let mut state = self.inner.write().map_err(|_| poisoned())?;
        state.categories.insert(category.id, category);
        Ok(())
    }

    pub fn upsert_offer(&self, offer: Offer) -> Result<(), StockStoreError> {
        let mut state = self.inner.write().map_err(|_| poisoned())?;
        state.offers.insert(offer.id, offer);
        Ok(())
    }

    /// Catalog-side price edit. Placed orders keep the price they captured.
    pub fn set_price(&self, id: ProductId, unit_price: Money) -> Result<(), StockStoreError> {
        let mut state = self.inner.write().map_err(|_| poisoned())?;
        let (product, _) = state
            .products
            .get_mut(&id)
            .ok_or(StockStoreError::NotFound(id))?;
        product.unit_price = unit_price;
        Ok(())
    }
}

impl CatalogReader for InMemoryCatalog {
    fn product(&self, id: ProductId) -> DomainResult<Option<Product>> {
        let state = self.inner.read().map_err(|_| poisoned())?;
        Ok(state.products.get(&id).map(|(p, _)| p.clone()))
    }

    fn category(&self, id: CategoryId) -> DomainResult<Option<Category>> {
        let state = self.inner.read().map_err(|_| poisoned())?;
        Ok(state.categories.get(&id).cloned())
    }

    fn offer(&self, id: OfferId) -> DomainResult<Option<Offer>> {
        let state = self.inner.read().map_err(|_| poisoned())?;
        Ok(state.offers.get(&id).cloned())
    }

    fn products(&self) -> DomainResult<Vec<Product>> {
        let state = self.inner.read().map_err(|_| poisoned())?;
        Ok(state
            .order
            .iter()
            .filter_map(|id| state.products.get(id).map(|(p, _)| p.clone()))
            .collect())
    }
}

impl StockStore for InMemoryCatalog {
    fn snapshot(&self, product_id: ProductId) -> Result<Option<StockSnapshot>, StockStoreError> {
        let state = self.inner.read().map_err(|_| poisoned())?;
        Ok(state.products.get(&product_id).map(|(p, version)| StockSnapshot {
            product_id,
            name: p.name.clone(),
            stock: p.stock,
            version: *version,
            unit_price: p.unit_price,
            is_active: p.is_active,
            minimum_order: p.minimum_order,
        }))
    }

    fn compare_and_set(
        &self,
        product_id: ProductId,
        expected: ExpectedVersion,
        new_stock: i64,
    ) -> Result<u64, StockStoreError> {
        let mut state = self.inner.write().map_err(|_| poisoned())?;
        let (product, version) = state
            .products
            .get_mut(&product_id)
            .ok_or(StockStoreError::NotFound(product_id))?;

        if !expected.matches(Some(*version)) {
            return Err(StockStoreError::VersionConflict {
                product_id,
                expected,
                actual: Some(*version),
            });
        }
        if new_stock < 0 {
            return Err(StockStoreError::NegativeStock(product_id));
        }

        product.stock = new_stock;
        *version += 1;
        Ok(*version)
    }

    fn restock(&self, product_id: ProductId, quantity: i64) -> Result<u64, StockStoreError> {
        let mut state = self.inner.write().map_err(|_| poisoned())?;
        let (product, version) = state
            .products
            .get_mut(&product_id)
            .ok_or(StockStoreError::NotFound(product_id))?;

        let restocked = product
            .stock
            .checked_add(quantity)
            .ok_or_else(|| StockStoreError::Backend(format!("stock overflow for {product_id}")))?;
        if restocked < 0 {
            return Err(StockStoreError::NegativeStock(product_id));
        }

        product.stock = restocked;
        *version += 1;
        Ok(*version)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rice(stock: i64) -> Product {
        Product::new(ProductId::new(), "Rice", Money::from_minor(450), stock)
    }

    #[test]
    fn products_keep_insertion_order() {
        let catalog = InMemoryCatalog::new();
        let names = ["Rice", "Oil", "Mint"];
        for name in names {
            catalog
                .upsert_product(Product::new(ProductId::new(), name, Money::from_minor(100), 1))
                .unwrap();
        }
        let listed: Vec<String> = catalog.products().unwrap().into_iter().map(|p| p.name).collect();
        assert_eq!(listed, names);
    }

    #[test]
    fn compare_and_set_rejects_stale_versions() {
        let catalog = InMemoryCatalog::new();
        let p = rice(5);
        let id = p.id;
        catalog.upsert_product(p).unwrap();

        let snap = catalog.snapshot(id).unwrap().unwrap();
        assert_eq!(snap.version, 1);
        assert_eq!(catalog.compare_and_set(id, ExpectedVersion::Exact(1), 3).unwrap(), 2);

        let err = catalog.compare_and_set(id, ExpectedVersion::Exact(1), 0).unwrap_err();
        assert!(matches!(err, StockStoreError::VersionConflict { actual: Some(2), .. }));
        assert_eq!(catalog.product(id).unwrap().unwrap().stock, 3);
    }

    #[test]
    fn negative_stock_is_refused() {
        let catalog = InMemoryCatalog::new();
        let p = rice(1);
        let id = p.id;
        catalog.upsert_product(p).unwrap();

        let err = catalog.compare_and_set(id, ExpectedVersion::Exact(1), -1).unwrap_err();
        assert_eq!(err, StockStoreError::NegativeStock(id));
        assert!(catalog.upsert_product(rice(-2)).is_err());
    }

    #[test]
    fn poisoned_lock_is_an_internal_error() {
        let catalog = std::sync::Arc::new(InMemoryCatalog::new());
        catalog.upsert_product(rice(5)).unwrap();

        let held = catalog.clone();
        let _ = std::thread::spawn(move || {
            let _guard = held.inner.write().unwrap();
            panic!("writer died holding the catalog lock");
        })
        .join();

        assert_eq!(catalog.products().unwrap_err().kind(), "internal");
        assert_eq!(catalog.product(ProductId::new()).unwrap_err().kind(), "internal");
    }

    #[test]
    fn unknown_product_is_not_found() {
        let catalog = InMemoryCatalog::new();
        let id = ProductId::new();
        assert_eq!(catalog.snapshot(id).unwrap(), None);
        assert_eq!(
            catalog.compare_and_set(id, ExpectedVersion::Exact(1), 1).unwrap_err(),
            StockStoreError::NotFound(id)
        );
    }
}
