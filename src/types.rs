use serde::{Deserialize, Serialize};

/// A raw rating row as delivered by the ingestion layer
///
/// The score is kept as the untrusted textual value from the source data;
/// coercion to a number happens during the catalog join so that malformed
/// values degrade to "missing" instead of failing the pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Rating {
    /// Opaque identifier of the rating user
    pub user_id: String,
    /// Opaque identifier of the rated edition
    pub isbn: String,
    /// Raw score value; may be non-numeric
    pub score: String,
}

impl Rating {
    pub fn new(user_id: impl Into<String>, isbn: impl Into<String>, score: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            isbn: isbn.into(),
            score: score.into(),
        }
    }
}

/// A catalog entry for one edition of a book
///
/// A title may appear under multiple ISBNs (edition variants); display
/// metadata collapses to one representative record per title downstream.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Book {
    pub isbn: String,
    pub title: String,
    pub author: String,
    pub cover_image_url: String,
}

impl Book {
    pub fn new(
        isbn: impl Into<String>,
        title: impl Into<String>,
        author: impl Into<String>,
        cover_image_url: impl Into<String>,
    ) -> Self {
        Self {
            isbn: isbn.into(),
            title: title.into(),
            author: author.into(),
            cover_image_url: cover_image_url.into(),
        }
    }
}

/// Configuration for the recommendation pipeline
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecommenderConfig {
    /// A user survives filtering with strictly more than this many ratings
    pub min_user_ratings: usize,
    /// A title survives filtering with at least this many ratings among active users
    pub min_title_ratings: usize,
    /// Minimum fuzzy-match score (0.0-1.0) for a title query to resolve
    pub resolver_cutoff: f64,
    /// Default number of neighbors returned by a recommendation query
    pub default_k: usize,
}

impl Default for RecommenderConfig {
    fn default() -> Self {
        Self {
            min_user_ratings: 200,
            min_title_ratings: 50,
            resolver_cutoff: 0.3,
            default_k: 5,
        }
    }
}

/// One recommended book, as handed to the transport layer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Recommendation {
    pub title: String,
    pub author: String,
    pub cover_image_url: String,
    pub num_ratings: usize,
    pub avg_rating: f64,
    /// Cosine similarity between the queried title and this one
    pub similarity: f64,
}

/// Snapshot of the serving state, for health reporting
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelStatus {
    /// Whether a collaborative model has been published
    pub collaborative_ready: bool,
    /// Number of titles in the rating matrix (0 when not ready)
    pub indexed_titles: usize,
    /// Number of users in the rating matrix (0 when not ready)
    pub indexed_users: usize,
    /// Number of titles with display metadata available
    pub catalog_titles: usize,
}
