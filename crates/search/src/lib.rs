//! Catalog search ranking engine.
//!
//! Free-text queries are matched with typo-tolerant edit-distance scoring
//! instead of exact substring search:
//!
//! ```text
//! search(query, page)
//!   -> candidate page (active/category filters, featured-then-newest, paginated)
//!   -> SearchRanker: RelevanceScorer per candidate (StringSimilarity per field)
//!   -> keep score > 0.5, stable sort by score, top 10
//! ```
//!
//! Ranking is pure: no locks, no shared mutable state.

pub mod query;
pub mod ranker;
pub mod relevance;
pub mod similarity;

pub use query::{search, SearchConfig, SearchHit, SearchPage, SearchRequest};
pub use ranker::{Ranked, SearchRanker};
pub use relevance::{RelevanceScorer, SearchFields};
pub use similarity::{levenshtein, similarity};
