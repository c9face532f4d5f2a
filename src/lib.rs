//! readnext: item-to-item collaborative filtering for book recommendations.
//!
//! The precompute pipeline (join → filter → rating matrix → similarity
//! matrix) runs once, offline or at process startup, and publishes an
//! immutable model; query serving (fuzzy title resolution → top-k neighbor
//! ranking) is lock-free and read-only over that model. CSV ingestion and
//! the web transport layer live outside this crate and talk to it through
//! [`Recommender`].

// Module declarations
pub mod artifacts;
pub mod dataset;
pub mod engine;
pub mod errors;
pub mod neighbor_ranker;
pub mod popularity;
pub mod rating_filter;
pub mod rating_matrix;
pub mod similarity;
pub mod title_resolver;
pub mod types;

// Re-exports for commonly used types
pub use engine::{RecommendModel, Recommender};
pub use errors::{BuildError, BuildResult, QueryError, QueryResult};
pub use popularity::{PopularityRecord, PopularityTable};
pub use rating_matrix::RatingMatrix;
pub use similarity::SimilarityMatrix;
pub use types::{Book, ModelStatus, Rating, Recommendation, RecommenderConfig};
