//! Small demo catalog for local runs.

use chrono::{Duration, Utc};

use souk_catalog::{Category, Discount, Offer, Product};
use souk_core::{CategoryId, Money, OfferId, ProductId};
use souk_inventory::StockStoreError;

use crate::catalog::InMemoryCatalog;

pub fn seed_demo_catalog(catalog: &InMemoryCatalog) -> Result<usize, StockStoreError> {
    let now = Utc::now();
    let produce = Category::new(CategoryId::new(), "Fresh Produce");
    let pantry = Category::new(CategoryId::new(), "Pantry");
    let harvest = Offer {
        id: OfferId::new(),
        name: "Harvest Week".into(),
        description: Some("Seasonal prices from local growers".into()),
        starts_at: now - Duration::days(1),
        ends_at: now + Duration::days(6),
        is_active: true,
    };

    let products = vec![
        Product::new(ProductId::new(), "Tomatoes", Money::from_minor(349), 120)
            .with_description("Vine-ripened, sold by the kilo")
            .with_category(produce.id)
            .with_supplier("Green Acres")
            .with_offer(harvest.id)
            .with_discount(Discount {
                basis_points: 1500,
                starts_at: Some(harvest.starts_at),
                ends_at: Some(harvest.ends_at),
            })
            .featured(),
        Product::new(ProductId::new(), "Red Onions", Money::from_minor(199), 200)
            .with_category(produce.id)
            .with_supplier("Green Acres"),
        Product::new(ProductId::new(), "Basmati Rice", Money::from_minor(1299), 40)
            .with_description("Aged long-grain rice, 5 kg bag")
            .with_category(pantry.id)
            .with_minimum_order(2),
        Product::new(ProductId::new(), "Sunflower Oil", Money::from_minor(899), 25)
            .with_category(pantry.id),
        Product::new(ProductId::new(), "Saffron Threads", Money::from_minor(2450), 0)
            .with_category(pantry.id)
            .inactive(),
    ];

    catalog.upsert_category(produce)?;
    catalog.upsert_category(pantry)?;
    catalog.upsert_offer(harvest)?;
    let count = products.len();
    for product in products {
        catalog.upsert_product(product)?;
    }

    tracing::info!(products = count, "demo catalog seeded");
    Ok(count)
}
