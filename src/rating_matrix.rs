//! Dense book×user rating matrix construction.
//!
//! Rows are distinct titles, columns distinct user ids, both in first-seen
//! order of the filtered rating set, which makes the layout stable for a
//! given input ordering. Cells hold the user's score for the title; a
//! (title, user) pair rated more than once (edition variants collapse onto
//! one title) takes the mean of its numeric scores, which is reproducible
//! under input reordering where last-write-wins would not be. Unobserved
//! pairs fill with 0.0.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::rating_filter::FilteredRatingSet;

/// Dense title×user rating matrix
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RatingMatrix {
    titles: Vec<String>,
    user_ids: Vec<String>,
    /// Row-major cell values, `titles.len() * user_ids.len()` entries
    values: Vec<f64>,
}

impl RatingMatrix {
    /// Build the matrix from a filtered rating set
    pub fn build(filtered: &FilteredRatingSet) -> Self {
        let mut titles: Vec<String> = Vec::new();
        let mut title_index: HashMap<&str, usize> = HashMap::new();
        let mut user_ids: Vec<String> = Vec::new();
        let mut user_index: HashMap<&str, usize> = HashMap::new();

        for row in filtered.rows() {
            if !title_index.contains_key(row.title.as_str()) {
                title_index.insert(row.title.as_str(), titles.len());
                titles.push(row.title.clone());
            }
            if !user_index.contains_key(row.user_id.as_str()) {
                user_index.insert(row.user_id.as_str(), user_ids.len());
                user_ids.push(row.user_id.clone());
            }
        }

        let n_users = user_ids.len();
        let mut sums = vec![0.0f64; titles.len() * n_users];
        let mut counts = vec![0usize; titles.len() * n_users];

        for row in filtered.rows() {
            let Some(score) = row.score else { continue };
            let cell = title_index[row.title.as_str()] * n_users + user_index[row.user_id.as_str()];
            sums[cell] += score;
            counts[cell] += 1;
        }

        let values: Vec<f64> = sums
            .iter()
            .zip(counts.iter())
            .map(|(&sum, &count)| if count > 0 { sum / count as f64 } else { 0.0 })
            .collect();

        log::info!(
            "🧮 Built rating matrix: {} titles × {} users",
            titles.len(),
            n_users
        );

        Self {
            titles,
            user_ids,
            values,
        }
    }

    /// Row keys in matrix order
    pub fn titles(&self) -> &[String] {
        &self.titles
    }

    /// Column keys in matrix order
    pub fn user_ids(&self) -> &[String] {
        &self.user_ids
    }

    pub fn n_titles(&self) -> usize {
        self.titles.len()
    }

    pub fn n_users(&self) -> usize {
        self.user_ids.len()
    }

    /// Row index of a title, by exact match
    pub fn title_index(&self, title: &str) -> Option<usize> {
        self.titles.iter().position(|t| t == title)
    }

    /// One matrix row as a slice of per-user scores
    pub fn row(&self, index: usize) -> &[f64] {
        let n = self.user_ids.len();
        &self.values[index * n..(index + 1) * n]
    }

    /// Single cell value
    pub fn get(&self, title_idx: usize, user_idx: usize) -> f64 {
        self.values[title_idx * self.user_ids.len() + user_idx]
    }

    /// Canonical byte encoding of the matrix contents, used to fingerprint
    /// a build so the persisted artifact pair can be verified as matching
    pub fn canonical_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::new();
        for title in &self.titles {
            bytes.extend_from_slice(title.as_bytes());
            bytes.push(0);
        }
        for user in &self.user_ids {
            bytes.extend_from_slice(user.as_bytes());
            bytes.push(0);
        }
        for value in &self.values {
            bytes.extend_from_slice(&value.to_bits().to_le_bytes());
        }
        bytes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::JoinedRating;
    use crate::rating_filter::filter_ratings;
    use crate::types::RecommenderConfig;

    fn row(user: &str, title: &str, score: Option<f64>) -> JoinedRating {
        JoinedRating {
            user_id: user.to_string(),
            title: title.to_string(),
            score,
        }
    }

    fn loose_config() -> RecommenderConfig {
        RecommenderConfig {
            min_user_ratings: 0,
            min_title_ratings: 1,
            ..RecommenderConfig::default()
        }
    }

    fn build_matrix(rows: Vec<JoinedRating>) -> RatingMatrix {
        let filtered = filter_ratings(&rows, &loose_config()).unwrap();
        RatingMatrix::build(&filtered)
    }

    #[test]
    fn test_rows_and_columns_in_first_seen_order() {
        let matrix = build_matrix(vec![
            row("u2", "B", Some(1.0)),
            row("u1", "A", Some(2.0)),
            row("u2", "A", Some(3.0)),
        ]);

        assert_eq!(matrix.titles(), &["B".to_string(), "A".to_string()]);
        assert_eq!(matrix.user_ids(), &["u2".to_string(), "u1".to_string()]);
    }

    #[test]
    fn test_cells_hold_scores_and_zero_fill() {
        let matrix = build_matrix(vec![
            row("u1", "A", Some(8.0)),
            row("u2", "B", Some(6.0)),
        ]);

        let a = matrix.title_index("A").unwrap();
        let b = matrix.title_index("B").unwrap();
        assert_eq!(matrix.get(a, 0), 8.0); // u1 rated A
        assert_eq!(matrix.get(a, 1), 0.0); // u2 never rated A
        assert_eq!(matrix.get(b, 0), 0.0);
        assert_eq!(matrix.get(b, 1), 6.0);
    }

    #[test]
    fn test_duplicate_cell_takes_mean() {
        // Same user rated two editions of one title
        let matrix = build_matrix(vec![
            row("u1", "A", Some(4.0)),
            row("u1", "A", Some(8.0)),
        ]);

        assert_eq!(matrix.get(0, 0), 6.0);
    }

    #[test]
    fn test_duplicate_mean_is_order_independent() {
        let forward = build_matrix(vec![
            row("u1", "A", Some(3.0)),
            row("u1", "A", Some(9.0)),
        ]);
        let reversed = build_matrix(vec![
            row("u1", "A", Some(9.0)),
            row("u1", "A", Some(3.0)),
        ]);

        assert_eq!(forward.get(0, 0), reversed.get(0, 0));
    }

    #[test]
    fn test_missing_scores_fill_zero_never_nan() {
        let matrix = build_matrix(vec![
            row("u1", "A", None),
            row("u1", "A", Some(5.0)),
            row("u2", "A", None),
        ]);

        // Mean ignores the missing row; all-missing cell falls back to fill
        assert_eq!(matrix.get(0, 0), 5.0);
        assert_eq!(matrix.get(0, 1), 0.0);
        assert!(matrix.row(0).iter().all(|v| v.is_finite()));
    }

    #[test]
    fn test_every_row_covers_full_column_set() {
        let matrix = build_matrix(vec![
            row("u1", "A", Some(1.0)),
            row("u2", "B", Some(2.0)),
            row("u3", "C", Some(3.0)),
        ]);

        for i in 0..matrix.n_titles() {
            assert_eq!(matrix.row(i).len(), matrix.n_users());
        }
    }

    #[test]
    fn test_rebuild_on_identical_input_is_identical() {
        let rows = vec![
            row("u1", "A", Some(1.0)),
            row("u2", "A", Some(2.0)),
            row("u1", "B", Some(3.0)),
        ];

        let first = build_matrix(rows.clone());
        let second = build_matrix(rows);
        assert_eq!(first, second);
        assert_eq!(first.canonical_bytes(), second.canonical_bytes());
    }

    #[test]
    fn test_canonical_bytes_distinguish_different_builds() {
        let a = build_matrix(vec![row("u1", "A", Some(1.0))]);
        let b = build_matrix(vec![row("u1", "A", Some(2.0))]);
        assert_ne!(a.canonical_bytes(), b.canonical_bytes());
    }

    #[test]
    fn test_serde_roundtrip() {
        let matrix = build_matrix(vec![
            row("u1", "A", Some(8.0)),
            row("u2", "B", Some(6.0)),
        ]);

        let encoded = bincode::serialize(&matrix).unwrap();
        let decoded: RatingMatrix = bincode::deserialize(&encoded).unwrap();
        assert_eq!(matrix, decoded);
    }
}
