//! Build pipeline and serving facade.
//!
//! `RecommendModel` owns the three precomputed artifacts (rating matrix,
//! similarity matrix, popularity table). It is constructed fully by one
//! build run and never mutated afterwards; `Recommender` publishes it
//! behind an `Arc` so any number of concurrent request handlers can serve
//! from it without locking. Replacing the model means building a new one
//! and publishing a new handle; there is no partial update path.

use std::path::Path;
use std::sync::Arc;

use chrono::Utc;

use crate::artifacts::{
    self, ArtifactResult, POPULARITY_FILE, RATING_MATRIX_FILE, SIMILARITY_FILE,
};
use crate::dataset::join_ratings;
use crate::errors::{BuildResult, QueryError, QueryResult};
use crate::neighbor_ranker::rank_neighbors;
use crate::popularity::{PopularityRecord, PopularityTable};
use crate::rating_filter::filter_ratings;
use crate::rating_matrix::RatingMatrix;
use crate::similarity::SimilarityMatrix;
use crate::title_resolver::resolve_title;
use crate::types::{Book, ModelStatus, Rating, Recommendation, RecommenderConfig};

/// The precomputed, immutable artifacts of one build run
#[derive(Debug, Clone)]
pub struct RecommendModel {
    matrix: RatingMatrix,
    similarity: SimilarityMatrix,
    popularity: PopularityTable,
}

impl RecommendModel {
    /// Run the full precompute pipeline: join, filter, matrix, similarity
    ///
    /// The popularity table is derived from the unfiltered join so that
    /// display metadata exists for every rated title, while the matrices
    /// cover only the filtered subset. All three artifacts come out of a
    /// single pass over the same joined rows and are published together.
    pub fn build(
        ratings: &[Rating],
        books: &[Book],
        config: &RecommenderConfig,
    ) -> BuildResult<Self> {
        let joined = join_ratings(ratings, books);
        let popularity = PopularityTable::build(&joined, books);

        let filtered = filter_ratings(&joined, config)?;
        let matrix = RatingMatrix::build(&filtered);
        let similarity = SimilarityMatrix::compute(&matrix);

        log::info!(
            "✅ Model build complete: {} titles × {} users, {} catalog titles",
            matrix.n_titles(),
            matrix.n_users(),
            popularity.len()
        );

        Ok(Self {
            matrix,
            similarity,
            popularity,
        })
    }

    /// Persist the artifacts as a paired set of blobs in `dir`
    ///
    /// Every blob carries the same build fingerprint, derived from the
    /// rating matrix contents, so `load` can detect a mixed set.
    pub fn save(&self, dir: &Path) -> ArtifactResult<()> {
        let fingerprint = artifacts::sha256_hex(&self.matrix.canonical_bytes());
        let built_at = Utc::now();

        artifacts::write_blob(
            &dir.join(RATING_MATRIX_FILE),
            &self.matrix,
            &fingerprint,
            built_at,
        )?;
        artifacts::write_blob(
            &dir.join(SIMILARITY_FILE),
            &self.similarity,
            &fingerprint,
            built_at,
        )?;
        artifacts::write_blob(
            &dir.join(POPULARITY_FILE),
            &self.popularity,
            &fingerprint,
            built_at,
        )?;

        log::info!("💾 Saved model artifacts to {}", dir.display());
        Ok(())
    }

    /// Load a previously saved artifact set from `dir`
    ///
    /// Rejects sets whose blobs carry different build fingerprints: a
    /// similarity table must never be served against a rating matrix it
    /// was not computed from.
    pub fn load(dir: &Path) -> ArtifactResult<Self> {
        let (matrix_header, matrix): (_, RatingMatrix) =
            artifacts::read_blob(&dir.join(RATING_MATRIX_FILE))?;
        let (similarity_header, similarity): (_, SimilarityMatrix) =
            artifacts::read_blob(&dir.join(SIMILARITY_FILE))?;
        let (popularity_header, mut popularity): (_, PopularityTable) =
            artifacts::read_blob(&dir.join(POPULARITY_FILE))?;

        artifacts::verify_paired(&[
            (RATING_MATRIX_FILE, &matrix_header),
            (SIMILARITY_FILE, &similarity_header),
            (POPULARITY_FILE, &popularity_header),
        ])?;

        popularity.reindex();

        log::info!(
            "✅ Loaded model artifacts from {} ({} titles)",
            dir.display(),
            matrix.n_titles()
        );

        Ok(Self {
            matrix,
            similarity,
            popularity,
        })
    }

    pub fn matrix(&self) -> &RatingMatrix {
        &self.matrix
    }

    pub fn similarity(&self) -> &SimilarityMatrix {
        &self.similarity
    }

    pub fn popularity(&self) -> &PopularityTable {
        &self.popularity
    }
}

/// Read-only serving handle over an optionally published model
///
/// Constructed empty at process startup when no artifacts exist yet; every
/// query then fails fast with `DataUnavailable`. Cloning is cheap and each
/// clone serves from the same published model.
#[derive(Debug, Clone)]
pub struct Recommender {
    config: RecommenderConfig,
    model: Option<Arc<RecommendModel>>,
}

impl Recommender {
    /// A handle with no published model; all queries yield `DataUnavailable`
    pub fn empty(config: RecommenderConfig) -> Self {
        Self {
            config,
            model: None,
        }
    }

    /// Publish a fully built model for serving
    pub fn publish(config: RecommenderConfig, model: RecommendModel) -> Self {
        Self {
            config,
            model: Some(Arc::new(model)),
        }
    }

    pub fn config(&self) -> &RecommenderConfig {
        &self.config
    }

    fn model(&self) -> QueryResult<&Arc<RecommendModel>> {
        self.model.as_ref().ok_or(QueryError::DataUnavailable)
    }

    /// Resolve a free-text title and rank its top-k neighbors
    ///
    /// This is the query entry point the transport layer calls. The query
    /// is fuzzy-resolved against the rating matrix row titles; the winner's
    /// neighbors are ranked by similarity and joined with display metadata.
    pub fn resolve_and_rank(&self, query: &str, k: usize) -> QueryResult<Vec<Recommendation>> {
        let model = self.model()?;

        let resolved = resolve_title(query, model.matrix.titles(), self.config.resolver_cutoff)?;

        rank_neighbors(
            &resolved.title,
            k,
            &model.matrix,
            &model.similarity,
            &model.popularity,
        )
    }

    /// `resolve_and_rank` with the configured default k
    pub fn recommend(&self, query: &str) -> QueryResult<Vec<Recommendation>> {
        self.resolve_and_rank(query, self.config.default_k)
    }

    /// The `n` most-rated titles with display metadata
    pub fn popular(&self, n: usize) -> QueryResult<Vec<PopularityRecord>> {
        let model = self.model()?;
        Ok(model
            .popularity
            .top_by_num_ratings(n)
            .into_iter()
            .cloned()
            .collect())
    }

    /// Serving-state snapshot for health reporting
    pub fn status(&self) -> ModelStatus {
        match &self.model {
            Some(model) => ModelStatus {
                collaborative_ready: true,
                indexed_titles: model.matrix.n_titles(),
                indexed_users: model.matrix.n_users(),
                catalog_titles: model.popularity.len(),
            },
            None => ModelStatus {
                collaborative_ready: false,
                indexed_titles: 0,
                indexed_users: 0,
                catalog_titles: 0,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// A small catalog with two clearly similar titles and one outlier
    fn sample_data() -> (Vec<Rating>, Vec<Book>) {
        let books = vec![
            Book::new("h1", "Hobbit", "J.R.R. Tolkien", "http://img/hobbit"),
            Book::new("f1", "Fellowship", "J.R.R. Tolkien", "http://img/fellowship"),
            Book::new("m1", "Mystery Book", "A. Nonymous", "http://img/mystery"),
        ];

        let mut ratings = Vec::new();
        // Three active users who rate Hobbit and Fellowship alike
        for (user, h, f) in [("u1", "9", "9"), ("u2", "7", "7"), ("u3", "8", "8")] {
            for i in 0..3 {
                ratings.push(Rating::new(user, "h1", h));
                ratings.push(Rating::new(user, "f1", f));
                // Mystery gets scattered, disagreeing scores
                ratings.push(Rating::new(user, "m1", if i == 0 { "1" } else { "0" }));
            }
        }
        (ratings, books)
    }

    fn test_config() -> RecommenderConfig {
        RecommenderConfig {
            min_user_ratings: 5,
            min_title_ratings: 3,
            ..RecommenderConfig::default()
        }
    }

    #[test]
    fn test_build_and_query_end_to_end() {
        let (ratings, books) = sample_data();
        let model = RecommendModel::build(&ratings, &books, &test_config()).unwrap();
        let recommender = Recommender::publish(test_config(), model);

        let recs = recommender.resolve_and_rank("Hobbit", 1).unwrap();
        assert_eq!(recs[0].title, "Fellowship");
        assert_eq!(recs[0].author, "J.R.R. Tolkien");
    }

    #[test]
    fn test_typo_query_resolves_before_ranking() {
        let (ratings, books) = sample_data();
        let model = RecommendModel::build(&ratings, &books, &test_config()).unwrap();
        let recommender = Recommender::publish(test_config(), model);

        let recs = recommender.resolve_and_rank("The Hobit", 1).unwrap();
        assert_eq!(recs[0].title, "Fellowship");
    }

    #[test]
    fn test_empty_recommender_is_unavailable() {
        let recommender = Recommender::empty(RecommenderConfig::default());

        assert_eq!(
            recommender.resolve_and_rank("Hobbit", 5).unwrap_err(),
            QueryError::DataUnavailable
        );
        assert_eq!(recommender.popular(10).unwrap_err(), QueryError::DataUnavailable);
        assert!(!recommender.status().collaborative_ready);
    }

    #[test]
    fn test_status_reports_dimensions() {
        let (ratings, books) = sample_data();
        let model = RecommendModel::build(&ratings, &books, &test_config()).unwrap();
        let recommender = Recommender::publish(test_config(), model);

        let status = recommender.status();
        assert!(status.collaborative_ready);
        assert_eq!(status.indexed_titles, 3);
        assert_eq!(status.indexed_users, 3);
        assert_eq!(status.catalog_titles, 3);
    }

    #[test]
    fn test_recommend_uses_default_k() {
        let (ratings, books) = sample_data();
        let config = RecommenderConfig {
            default_k: 1,
            ..test_config()
        };
        let model = RecommendModel::build(&ratings, &books, &config).unwrap();
        let recommender = Recommender::publish(config, model);

        let recs = recommender.recommend("Hobbit").unwrap();
        assert_eq!(recs.len(), 1);
    }

    #[test]
    fn test_cloned_handles_share_the_model() {
        let (ratings, books) = sample_data();
        let model = RecommendModel::build(&ratings, &books, &test_config()).unwrap();
        let recommender = Recommender::publish(test_config(), model);
        let handle = recommender.clone();

        assert_eq!(
            recommender.resolve_and_rank("Hobbit", 2).unwrap().len(),
            handle.resolve_and_rank("Hobbit", 2).unwrap().len()
        );
    }

    #[test]
    fn test_popular_orders_by_rating_count() {
        let (mut ratings, books) = sample_data();
        // Give Mystery extra rating volume from casual users
        for i in 0..20 {
            ratings.push(Rating::new(format!("casual-{}", i), "m1", "5"));
        }

        let model = RecommendModel::build(&ratings, &books, &test_config()).unwrap();
        let recommender = Recommender::publish(test_config(), model);

        let popular = recommender.popular(1).unwrap();
        assert_eq!(popular[0].title, "Mystery Book");
    }
}
