use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use souk_core::{CategoryId, Money, OfferId, ProductId};

/// Percentage discount with a validity window.
///
/// Display-only: orders always price at the full unit price.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Discount {
    /// 1250 = 12.50%.
    pub basis_points: u32,
    pub starts_at: Option<DateTime<Utc>>,
    pub ends_at: Option<DateTime<Utc>>,
}

impl Discount {
    /// Live only when both bounds are set and `starts_at <= now <= ends_at`.
    pub fn is_live(&self, now: DateTime<Utc>) -> bool {
        match (self.starts_at, self.ends_at) {
            (Some(start), Some(end)) => self.basis_points > 0 && start <= now && now <= end,
            _ => false,
        }
    }
}

/// Catalog product as seen by the order/search core.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub sku: Option<String>,
    pub name: String,
    pub description: Option<String>,
    pub unit_price: Money,
    /// Never negative; only the inventory ledger decrements it.
    pub stock: i64,
    pub is_active: bool,
    pub is_featured: bool,
    pub minimum_order: i64,
    pub unit_term: String,
    pub discount: Option<Discount>,
    pub category_id: Option<CategoryId>,
    pub offer_id: Option<OfferId>,
    pub supplier_name: Option<String>,
    pub item_location: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Product {
    pub fn new(id: ProductId, name: impl Into<String>, unit_price: Money, stock: i64) -> Self {
        Self {
            id,
            sku: None,
            name: name.into(),
            description: None,
            unit_price,
            stock,
            is_active: true,
            is_featured: false,
            minimum_order: 1,
            unit_term: "units".to_string(),
            discount: None,
            category_id: None,
            offer_id: None,
            supplier_name: None,
            item_location: None,
            created_at: Utc::now(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_category(mut self, category_id: CategoryId) -> Self {
        self.category_id = Some(category_id);
        self
    }

    pub fn with_offer(mut self, offer_id: OfferId) -> Self {
        self.offer_id = Some(offer_id);
        self
    }

    pub fn with_minimum_order(mut self, minimum_order: i64) -> Self {
        self.minimum_order = minimum_order.max(1);
        self
    }

    pub fn with_supplier(mut self, supplier: impl Into<String>) -> Self {
        self.supplier_name = Some(supplier.into());
        self
    }

    pub fn with_discount(mut self, discount: Discount) -> Self {
        self.discount = Some(discount);
        self
    }

    pub fn inactive(mut self) -> Self {
        self.is_active = false;
        self
    }

    pub fn featured(mut self) -> Self {
        self.is_featured = true;
        self
    }

    pub fn created_at(mut self, at: DateTime<Utc>) -> Self {
        self.created_at = at;
        self
    }

    /// Discount-adjusted price, when a discount is live at `now`.
    pub fn discounted_price(&self, now: DateTime<Utc>) -> Option<Money> {
        self.discount
            .filter(|d| d.is_live(now))
            .map(|d| self.unit_price.less_percent(d.basis_points))
    }
}
