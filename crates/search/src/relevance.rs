//! Field-weighted relevance of one product for one query.

use souk_catalog::ProductView;

use crate::similarity::similarity;

pub const NAME_WEIGHT: f64 = 1.0;
pub const NAME_TOKEN_WEIGHT: f64 = 0.9;
pub const DESCRIPTION_WEIGHT: f64 = 0.8;
pub const DESCRIPTION_TOKEN_WEIGHT: f64 = 0.7;
pub const CATEGORY_WEIGHT: f64 = 0.6;
pub const SUPPLIER_WEIGHT: f64 = 0.6;

/// The text fields of a product that take part in matching.
#[derive(Debug, Clone, Copy, Default)]
pub struct SearchFields<'a> {
    pub name: &'a str,
    pub description: Option<&'a str>,
    pub category_name: Option<&'a str>,
    pub supplier_name: Option<&'a str>,
}

impl<'a> SearchFields<'a> {
    pub fn of(view: &'a ProductView) -> Self {
        Self {
            name: &view.product.name,
            description: view.product.description.as_deref(),
            category_name: view.category.as_ref().map(|c| c.name.as_str()),
            supplier_name: view.product.supplier_name.as_deref(),
        }
    }
}

/// Scores a product as the **maximum** weighted similarity over its fields.
///
/// Scores are never summed: a product matching on several weak fields must not
/// outrank a single perfect name match.
#[derive(Debug, Clone, Copy)]
pub struct RelevanceScorer {
    /// Minimum whole-field similarity that counts.
    pub whole_field_min: f64,
    /// Minimum token-to-token similarity that counts.
    pub token_min: f64,
}

impl Default for RelevanceScorer {
    fn default() -> Self {
        Self {
            whole_field_min: 0.6,
            token_min: 0.7,
        }
    }
}

impl RelevanceScorer {
    /// Weighted maximum across all qualifying field scores; `0.0` when nothing qualifies.
    pub fn score(&self, fields: &SearchFields<'_>, query: &str) -> f64 {
        let query = query.to_lowercase();
        let query_tokens: Vec<&str> = query.split_whitespace().collect();

        let mut best = self.whole(&query, fields.name, NAME_WEIGHT);
        best = best.max(self.tokens(&query_tokens, fields.name, NAME_TOKEN_WEIGHT));

        if let Some(description) = fields.description {
            best = best.max(self.whole(&query, description, DESCRIPTION_WEIGHT));
            best = best.max(self.tokens(&query_tokens, description, DESCRIPTION_TOKEN_WEIGHT));
        }
        if let Some(category) = fields.category_name {
            best = best.max(self.whole(&query, category, CATEGORY_WEIGHT));
        }
        if let Some(supplier) = fields.supplier_name {
            best = best.max(self.whole(&query, supplier, SUPPLIER_WEIGHT));
        }

        best
    }

    fn whole(&self, query: &str, field: &str, weight: f64) -> f64 {
        let s = similarity(query, field);
        if s >= self.whole_field_min { s * weight } else { 0.0 }
    }

    fn tokens(&self, query_tokens: &[&str], field: &str, weight: f64) -> f64 {
        let field = field.to_lowercase();
        let mut best = 0.0f64;
        for field_token in field.split_whitespace() {
            for query_token in query_tokens {
                let s = similarity(query_token, field_token);
                if s >= self.token_min {
                    best = best.max(s * weight);
                }
            }
        }
        best
    }
}
