//! Statistical filtering of the joined rating set.
//!
//! Keeps only users engaged enough and titles popular enough to carry
//! signal for collaborative filtering. The two stages are ordered: title
//! popularity is measured among the rows of surviving users only, so it
//! reflects the rating behavior of engaged readers rather than global
//! traffic. That ordering is part of the contract.

use std::collections::HashMap;

use crate::dataset::JoinedRating;
use crate::errors::{BuildError, BuildResult};
use crate::types::RecommenderConfig;

/// The joined rating rows that survived both filter stages
#[derive(Debug, Clone)]
pub struct FilteredRatingSet {
    rows: Vec<JoinedRating>,
    /// Threshold the user stage was run with
    pub min_user_ratings: usize,
    /// Threshold the title stage was run with
    pub min_title_ratings: usize,
}

impl FilteredRatingSet {
    pub fn rows(&self) -> &[JoinedRating] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Run the two-stage rating filter
///
/// Stage one keeps users with strictly more than `min_user_ratings` rows;
/// a user with exactly the threshold is excluded. Stage two keeps titles
/// with at least `min_title_ratings` rows among the surviving users. Both
/// counts are row counts: rows with a missing score still count.
///
/// An empty outcome at either stage is a typed error so that downstream
/// components never see a degenerate matrix.
pub fn filter_ratings(
    joined: &[JoinedRating],
    config: &RecommenderConfig,
) -> BuildResult<FilteredRatingSet> {
    // Stage one: users with enough committed rating activity
    let mut rows_per_user: HashMap<&str, usize> = HashMap::new();
    for row in joined {
        *rows_per_user.entry(row.user_id.as_str()).or_insert(0) += 1;
    }

    let active_rows: Vec<&JoinedRating> = joined
        .iter()
        .filter(|row| rows_per_user[row.user_id.as_str()] > config.min_user_ratings)
        .collect();

    if active_rows.is_empty() {
        return Err(BuildError::NoActiveUsers {
            threshold: config.min_user_ratings,
        });
    }

    // Stage two: titles popular among those users
    let mut rows_per_title: HashMap<&str, usize> = HashMap::new();
    for row in &active_rows {
        *rows_per_title.entry(row.title.as_str()).or_insert(0) += 1;
    }

    let rows: Vec<JoinedRating> = active_rows
        .into_iter()
        .filter(|row| rows_per_title[row.title.as_str()] >= config.min_title_ratings)
        .cloned()
        .collect();

    if rows.is_empty() {
        return Err(BuildError::NoPopularTitles {
            threshold: config.min_title_ratings,
        });
    }

    log::info!(
        "📊 Rating filter kept {} of {} joined rows ({} active users, {} popular titles)",
        rows.len(),
        joined.len(),
        rows.iter().map(|r| r.user_id.as_str()).collect::<std::collections::HashSet<_>>().len(),
        rows.iter().map(|r| r.title.as_str()).collect::<std::collections::HashSet<_>>().len(),
    );

    Ok(FilteredRatingSet {
        rows,
        min_user_ratings: config.min_user_ratings,
        min_title_ratings: config.min_title_ratings,
    })
}
