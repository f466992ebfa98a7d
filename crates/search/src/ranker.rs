//! Bounded top-N relevance ranking over a candidate set.

use serde::Serialize;
use souk_catalog::ProductView;

use crate::relevance::{RelevanceScorer, SearchFields};

/// A candidate together with its relevance score.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Ranked<T> {
    pub item: T,
    pub score: f64,
}

/// Filters candidates by a minimum relevance and keeps the best `limit`.
#[derive(Debug, Clone, Copy)]
pub struct SearchRanker {
    scorer: RelevanceScorer,
    /// Candidates must score strictly above this.
    min_score: f64,
    limit: usize,
}

impl Default for SearchRanker {
    fn default() -> Self {
        Self::new(RelevanceScorer::default(), 0.5, 10)
    }
}

impl SearchRanker {
    pub fn new(scorer: RelevanceScorer, min_score: f64, limit: usize) -> Self {
        Self {
            scorer,
            min_score,
            limit,
        }
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Rank catalog views for `query`.
    pub fn rank(&self, query: &str, candidates: Vec<ProductView>) -> Vec<Ranked<ProductView>> {
        self.rank_by(query, candidates, |view| SearchFields::of(view))
    }

    /// Rank arbitrary candidates, reading their searchable text through `fields`.
    ///
    /// Output is sorted by descending score; equal scores keep candidate order.
    /// A blank query yields nothing: callers are expected to skip ranking then.
    pub fn rank_by<T, F>(&self, query: &str, candidates: impl IntoIterator<Item = T>, fields: F) -> Vec<Ranked<T>>
    where
        F: for<'a> Fn(&'a T) -> SearchFields<'a>,
    {
        let query = query.trim();
        if query.is_empty() {
            return Vec::new();
        }

        let mut ranked: Vec<Ranked<T>> = candidates
            .into_iter()
            .filter_map(|item| {
                let score = self.scorer.score(&fields(&item), query);
                (score > self.min_score).then_some(Ranked { item, score })
            })
            .collect();

        // `sort_by` is stable, so ties keep insertion order.
        ranked.sort_by(|a, b| b.score.total_cmp(&a.score));
        ranked.truncate(self.limit);

        tracing::debug!(query, matches = ranked.len(), "ranked search candidates");
        ranked
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rank_names(query: &str, names: &[&'static str]) -> Vec<Ranked<&'static str>> {
        SearchRanker::default().rank_by(query, names.iter().copied(), |name| SearchFields {
            name,
            ..SearchFields::default()
        })
    }

    #[test]
    fn misspelled_query_finds_product() {
        let ranked = rank_names("tomatos", &["Onions", "Tomatoes", "Rice"]);
        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].item, "Tomatoes");
        assert!(ranked[0].score >= 0.7);
    }

    #[test]
    fn gibberish_returns_nothing() {
        assert!(rank_names("xyz123", &["Onions", "Tomatoes", "Rice"]).is_empty());
    }

    #[test]
    fn sorted_by_descending_score() {
        let ranked = rank_names("tomato", &["Cherry Tomato Mix", "Tomato", "Tomatillo"]);
        let scores: Vec<f64> = ranked.iter().map(|r| r.score).collect();
        assert_eq!(ranked[0].item, "Tomato");
        assert!(scores.windows(2).all(|w| w[0] >= w[1]));
    }

    #[test]
    fn ties_keep_insertion_order() {
        let ranked = rank_names("rice", &["Rice", "RICE", "rice"]);
        let items: Vec<&str> = ranked.iter().map(|r| r.item).collect();
        assert_eq!(items, vec!["Rice", "RICE", "rice"]);
    }

    #[test]
    fn truncates_to_limit() {
        let names = ["Rice"; 25];
        assert_eq!(rank_names("rice", &names).len(), 10);
    }

    #[test]
    fn blank_query_is_not_ranked() {
        assert!(rank_names("   ", &["Rice"]).is_empty());
    }

    mod proptest_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn results_bounded_above_threshold_and_sorted(
                names in proptest::collection::vec("[a-e]{1,6}( [a-e]{1,6})?", 0..40),
                query in "[a-e]{1,6}"
            ) {
                let ranker = SearchRanker::default();
                let ranked = ranker.rank_by(&query, names.iter(), |name| SearchFields {
                    name: name.as_str(),
                    ..SearchFields::default()
                });
                prop_assert!(ranked.len() <= 10);
                prop_assert!(ranked.iter().all(|r| r.score > 0.5));
                prop_assert!(ranked.windows(2).all(|w| w[0].score >= w[1].score));
            }
        }
    }
}
