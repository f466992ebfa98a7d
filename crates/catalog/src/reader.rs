use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;

use souk_core::{CategoryId, DomainResult, Money, OfferId, ProductId};

use crate::{Category, Offer, Product};

/// Read port onto the catalog owned by the outer CRUD surface.
///
/// A missing row is `Ok(None)`; `Err` means the catalog could not be read.
pub trait CatalogReader: Send + Sync {
    fn product(&self, id: ProductId) -> DomainResult<Option<Product>>;
    fn category(&self, id: CategoryId) -> DomainResult<Option<Category>>;
    fn offer(&self, id: OfferId) -> DomainResult<Option<Offer>>;

    /// Point-in-time snapshot of every product, in catalog insertion order.
    fn products(&self) -> DomainResult<Vec<Product>>;
}

impl<S> CatalogReader for Arc<S>
where
    S: CatalogReader + ?Sized,
{
    fn product(&self, id: ProductId) -> DomainResult<Option<Product>> {
        (**self).product(id)
    }

    fn category(&self, id: CategoryId) -> DomainResult<Option<Category>> {
        (**self).category(id)
    }

    fn offer(&self, id: OfferId) -> DomainResult<Option<Offer>> {
        (**self).offer(id)
    }

    fn products(&self) -> DomainResult<Vec<Product>> {
        (**self).products()
    }
}

/// Product enriched with its category, offer and display price.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProductView {
    pub product: Product,
    pub category: Option<Category>,
    pub offer: Option<Offer>,
    pub discounted_price: Option<Money>,
}

impl ProductView {
    pub fn project<R: CatalogReader + ?Sized>(reader: &R, product: Product, now: DateTime<Utc>) -> DomainResult<Self> {
        let category = match product.category_id {
            Some(id) => reader.category(id)?,
            None => None,
        };
        let offer = match product.offer_id {
            Some(id) => reader.offer(id)?,
            None => None,
        };
        let discounted_price = product.discounted_price(now);
        Ok(Self {
            product,
            category,
            offer,
            discounted_price,
        })
    }
}
