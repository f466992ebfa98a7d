//! Paginated catalog search: exact filters, pagination, then fuzzy ranking of
//! the page.
//!
//! Ranking only ever sees one page of candidates. A strong fuzzy match that
//! sorts onto page 2 cannot surface while searching page 1; in exchange the
//! scoring pass is bounded by `per_page`.

use chrono::{DateTime, Utc};
use serde::Serialize;

use souk_catalog::{CatalogReader, ProductView};
use souk_core::{CategoryId, DomainResult};

use crate::ranker::SearchRanker;

#[derive(Debug, Clone, Copy)]
pub struct SearchConfig {
    pub ranker: SearchRanker,
    pub default_per_page: u32,
    pub max_per_page: u32,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            ranker: SearchRanker::default(),
            default_per_page: 20,
            max_per_page: 100,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct SearchRequest {
    pub query: Option<String>,
    pub category_id: Option<CategoryId>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
    /// Admin callers also see inactive products.
    pub include_inactive: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchHit {
    #[serde(flatten)]
    pub view: ProductView,
    /// Present when the hit came from fuzzy ranking.
    pub score: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchPage {
    pub items: Vec<SearchHit>,
    /// With a query: the number of items returned, not the size of the matching set.
    pub total: usize,
    pub page: u32,
    pub per_page: u32,
    /// Always 1 with a query.
    pub pages: usize,
}

/// Run one search over a point-in-time snapshot of the catalog.
///
/// Fails only when the catalog itself cannot be read.
pub fn search<R>(
    reader: &R,
    request: &SearchRequest,
    config: &SearchConfig,
    now: DateTime<Utc>,
) -> DomainResult<SearchPage>
where
    R: CatalogReader + ?Sized,
{
    let page = request.page.unwrap_or(1).max(1);
    let per_page = request
        .per_page
        .unwrap_or(config.default_per_page)
        .clamp(1, config.max_per_page.max(1));
    let query = request.query.as_deref().map(str::trim).filter(|q| !q.is_empty());

    let mut candidates: Vec<_> = reader
        .products()?
        .into_iter()
        .filter(|p| request.include_inactive || p.is_active)
        .filter(|p| request.category_id.is_none() || p.category_id == request.category_id)
        .collect();

    // Featured first, then newest. Stable, so catalog order breaks remaining ties.
    candidates.sort_by(|a, b| {
        b.is_featured
            .cmp(&a.is_featured)
            .then_with(|| b.created_at.cmp(&a.created_at))
    });

    let filtered = candidates.len();
    let offset = (page as usize - 1).saturating_mul(per_page as usize);
    let page_views: Vec<ProductView> = candidates
        .into_iter()
        .skip(offset)
        .take(per_page as usize)
        .map(|p| ProductView::project(reader, p, now))
        .collect::<DomainResult<_>>()?;

    match query {
        Some(query) => {
            let items: Vec<SearchHit> = config
                .ranker
                .rank(query, page_views)
                .into_iter()
                .map(|r| SearchHit {
                    view: r.item,
                    score: Some(r.score),
                })
                .collect();
            tracing::info!(query, page, per_page, results = items.len(), "catalog search ranked");
            Ok(SearchPage {
                total: items.len(),
                items,
                page,
                per_page,
                pages: 1,
            })
        }
        None => Ok(SearchPage {
            items: page_views
                .into_iter()
                .map(|view| SearchHit { view, score: None })
                .collect(),
            total: filtered,
            page,
            per_page,
            pages: filtered.div_ceil(per_page as usize),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    use chrono::Duration;
    use souk_catalog::{Category, Offer, Product};
    use souk_core::{DomainError, Money, OfferId, ProductId};

    #[derive(Default)]
    struct FixedCatalog {
        products: Vec<Product>,
        categories: HashMap<CategoryId, Category>,
        broken_categories: bool,
    }

    impl CatalogReader for FixedCatalog {
        fn product(&self, id: ProductId) -> DomainResult<Option<Product>> {
            Ok(self.products.iter().find(|p| p.id == id).cloned())
        }

        fn category(&self, id: CategoryId) -> DomainResult<Option<Category>> {
            if self.broken_categories {
                return Err(DomainError::internal("category table unavailable"));
            }
            Ok(self.categories.get(&id).cloned())
        }

        fn offer(&self, _id: OfferId) -> DomainResult<Option<Offer>> {
            Ok(None)
        }

        fn products(&self) -> DomainResult<Vec<Product>> {
            Ok(self.products.clone())
        }
    }

    fn product(name: &str, age_minutes: i64) -> Product {
        Product::new(ProductId::new(), name, Money::from_minor(500), 10)
            .created_at(Utc::now() - Duration::minutes(age_minutes))
    }

    fn names(page: &SearchPage) -> Vec<String> {
        page.items.iter().map(|h| h.view.product.name.clone()).collect()
    }

    fn query(q: &str) -> SearchRequest {
        SearchRequest {
            query: Some(q.to_string()),
            ..SearchRequest::default()
        }
    }

    #[test]
    fn misspelled_query_ranks_matching_product() {
        let catalog = FixedCatalog {
            products: vec![product("Onions", 1), product("Tomatoes", 2), product("Rice", 3)],
            ..FixedCatalog::default()
        };
        let page = search(&catalog, &query("tomatos"), &SearchConfig::default(), Utc::now()).unwrap();
        assert_eq!(names(&page), vec!["Tomatoes"]);
        assert!(page.items[0].score.unwrap() >= 0.7);
        assert_eq!(page.total, 1);
        assert_eq!(page.pages, 1);
    }

    #[test]
    fn gibberish_query_returns_empty_page() {
        let catalog = FixedCatalog {
            products: vec![product("Tomatoes", 1)],
            ..FixedCatalog::default()
        };
        let page = search(&catalog, &query("xyz123"), &SearchConfig::default(), Utc::now()).unwrap();
        assert!(page.items.is_empty());
        assert_eq!(page.total, 0);
        assert_eq!(page.pages, 1);
    }

    #[test]
    fn blank_query_paginates_everything() {
        let catalog = FixedCatalog {
            products: (0..25).map(|i| product(&format!("Item {i}"), i)).collect(),
            ..FixedCatalog::default()
        };
        let request = SearchRequest {
            query: Some("   ".into()),
            page: Some(2),
            per_page: Some(10),
            ..SearchRequest::default()
        };
        let page = search(&catalog, &request, &SearchConfig::default(), Utc::now()).unwrap();
        assert_eq!(page.total, 25);
        assert_eq!(page.pages, 3);
        assert_eq!(page.items.len(), 10);
        // newest first: page 2 starts at the 11th newest
        assert_eq!(page.items[0].view.product.name, "Item 10");
        assert!(page.items.iter().all(|h| h.score.is_none()));
    }

    #[test]
    fn inactive_products_hidden_unless_requested() {
        let catalog = FixedCatalog {
            products: vec![product("Rice", 1).inactive(), product("Rice Flour", 2)],
            ..FixedCatalog::default()
        };
        let page = search(&catalog, &SearchRequest::default(), &SearchConfig::default(), Utc::now()).unwrap();
        assert_eq!(names(&page), vec!["Rice Flour"]);

        let admin = SearchRequest {
            include_inactive: true,
            ..SearchRequest::default()
        };
        let page = search(&catalog, &admin, &SearchConfig::default(), Utc::now()).unwrap();
        assert_eq!(page.total, 2);
    }

    #[test]
    fn featured_products_come_first() {
        let catalog = FixedCatalog {
            products: vec![product("New", 1), product("Old Featured", 100).featured()],
            ..FixedCatalog::default()
        };
        let page = search(&catalog, &SearchRequest::default(), &SearchConfig::default(), Utc::now()).unwrap();
        assert_eq!(names(&page), vec!["Old Featured", "New"]);
    }

    #[test]
    fn category_filter_and_category_name_matching() {
        let grains = Category::new(CategoryId::new(), "Grains");
        let catalog = FixedCatalog {
            products: vec![
                product("Basmati", 1).with_category(grains.id),
                product("Grains of Paradise", 2),
            ],
            categories: HashMap::from([(grains.id, grains.clone())]),
            ..FixedCatalog::default()
        };
        let request = SearchRequest {
            query: Some("grains".into()),
            category_id: Some(grains.id),
            ..SearchRequest::default()
        };
        let page = search(&catalog, &request, &SearchConfig::default(), Utc::now()).unwrap();
        assert_eq!(names(&page), vec!["Basmati"]);
        assert_eq!(page.items[0].view.category.as_ref().map(|c| c.name.as_str()), Some("Grains"));
        assert_eq!(page.items[0].score, Some(0.6));
    }

    #[test]
    fn relevant_match_on_later_page_is_not_seen() {
        // "Tomatoes" is the oldest product and lands on page 2 of 2.
        let mut products: Vec<Product> = (0..5).map(|i| product(&format!("Bag {i}"), i)).collect();
        products.push(product("Tomatoes", 50));
        let catalog = FixedCatalog {
            products,
            ..FixedCatalog::default()
        };
        let request = SearchRequest {
            query: Some("tomatoes".into()),
            per_page: Some(5),
            ..SearchRequest::default()
        };
        let page = search(&catalog, &request, &SearchConfig::default(), Utc::now()).unwrap();
        assert!(page.items.is_empty());

        let request = SearchRequest {
            page: Some(2),
            ..request
        };
        let page = search(&catalog, &request, &SearchConfig::default(), Utc::now()).unwrap();
        assert_eq!(names(&page), vec!["Tomatoes"]);
    }

    #[test]
    fn unreadable_catalog_fails_the_search() {
        let grains = CategoryId::new();
        let catalog = FixedCatalog {
            products: vec![product("Basmati", 1).with_category(grains)],
            broken_categories: true,
            ..FixedCatalog::default()
        };
        let err = search(&catalog, &SearchRequest::default(), &SearchConfig::default(), Utc::now()).unwrap_err();
        assert_eq!(err.kind(), "internal");
    }

    #[test]
    fn per_page_is_clamped() {
        let catalog = FixedCatalog {
            products: vec![product("Rice", 1)],
            ..FixedCatalog::default()
        };
        let request = SearchRequest {
            page: Some(0),
            per_page: Some(1_000),
            ..SearchRequest::default()
        };
        let page = search(&catalog, &request, &SearchConfig::default(), Utc::now()).unwrap();
        assert_eq!(page.page, 1);
        assert_eq!(page.per_page, 100);
    }
}
