//! Integration tests for model artifact persistence.
//!
//! Covers the startup path: save a built model, load it in a fresh
//! process, and serve identical results, with mismatched or damaged
//! artifact sets rejected instead of silently served.

use std::fs;

use tempfile::TempDir;

use readnext::artifacts::{ArtifactError, RATING_MATRIX_FILE, SIMILARITY_FILE};
use readnext::{Book, Rating, RecommendModel, Recommender, RecommenderConfig};

fn sample_catalog() -> Vec<Book> {
    vec![
        Book::new("a1", "Alpha", "Author One", "http://covers/a.jpg"),
        Book::new("b1", "Beta", "Author Two", "http://covers/b.jpg"),
        Book::new("c1", "Gamma", "Author Three", "http://covers/c.jpg"),
    ]
}

fn sample_ratings(scale: &str) -> Vec<Rating> {
    let mut ratings = Vec::new();
    for user in ["u1", "u2", "u3"] {
        for isbn in ["a1", "b1", "c1"] {
            for _ in 0..3 {
                ratings.push(Rating::new(user, isbn, scale));
            }
        }
    }
    ratings
}

fn config() -> RecommenderConfig {
    RecommenderConfig {
        min_user_ratings: 5,
        min_title_ratings: 3,
        ..RecommenderConfig::default()
    }
}

#[test]
fn save_and_load_roundtrip_preserves_the_model() {
    let dir = TempDir::new().unwrap();
    let model = RecommendModel::build(&sample_ratings("7"), &sample_catalog(), &config()).unwrap();
    model.save(dir.path()).unwrap();

    let loaded = RecommendModel::load(dir.path()).unwrap();

    assert_eq!(loaded.matrix(), model.matrix());
    assert_eq!(loaded.similarity(), model.similarity());
    assert_eq!(loaded.popularity(), model.popularity());
}

#[test]
fn loaded_model_serves_the_same_recommendations() {
    let dir = TempDir::new().unwrap();
    let model = RecommendModel::build(&sample_ratings("7"), &sample_catalog(), &config()).unwrap();
    let direct = Recommender::publish(config(), model.clone());
    model.save(dir.path()).unwrap();

    let loaded = Recommender::publish(config(), RecommendModel::load(dir.path()).unwrap());

    let from_direct = direct.resolve_and_rank("Alpha", 2).unwrap();
    let from_loaded = loaded.resolve_and_rank("Alpha", 2).unwrap();
    assert_eq!(from_direct.len(), from_loaded.len());
    for (a, b) in from_direct.iter().zip(from_loaded.iter()) {
        assert_eq!(a.title, b.title);
        assert_eq!(a.similarity, b.similarity);
    }
}

#[test]
fn mixed_artifact_sets_are_rejected() {
    let dir_one = TempDir::new().unwrap();
    let dir_two = TempDir::new().unwrap();

    // Two different builds
    RecommendModel::build(&sample_ratings("7"), &sample_catalog(), &config())
        .unwrap()
        .save(dir_one.path())
        .unwrap();
    RecommendModel::build(&sample_ratings("3"), &sample_catalog(), &config())
        .unwrap()
        .save(dir_two.path())
        .unwrap();

    // Splice the second build's similarity table into the first set
    fs::copy(
        dir_two.path().join(SIMILARITY_FILE),
        dir_one.path().join(SIMILARITY_FILE),
    )
    .unwrap();

    let err = RecommendModel::load(dir_one.path()).unwrap_err();
    assert!(matches!(err, ArtifactError::PairMismatch { .. }));
}

#[test]
fn missing_artifact_file_fails_the_load() {
    let dir = TempDir::new().unwrap();
    let model = RecommendModel::build(&sample_ratings("7"), &sample_catalog(), &config()).unwrap();
    model.save(dir.path()).unwrap();

    fs::remove_file(dir.path().join(SIMILARITY_FILE)).unwrap();

    let err = RecommendModel::load(dir.path()).unwrap_err();
    assert!(matches!(err, ArtifactError::Io { .. }));
}

#[test]
fn truncated_artifact_file_fails_the_load() {
    let dir = TempDir::new().unwrap();
    let model = RecommendModel::build(&sample_ratings("7"), &sample_catalog(), &config()).unwrap();
    model.save(dir.path()).unwrap();

    let path = dir.path().join(RATING_MATRIX_FILE);
    let bytes = fs::read(&path).unwrap();
    fs::write(&path, &bytes[..bytes.len() / 2]).unwrap();

    assert!(RecommendModel::load(dir.path()).is_err());
}
