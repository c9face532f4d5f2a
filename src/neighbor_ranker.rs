//! Top-k neighbor ranking over the similarity matrix.
//!
//! Given a resolved title, ranks every other title by similarity and joins
//! the winners against the popularity table for display metadata.

use std::cmp::Ordering;

use crate::errors::{QueryError, QueryResult};
use crate::popularity::PopularityTable;
use crate::rating_matrix::RatingMatrix;
use crate::similarity::SimilarityMatrix;
use crate::types::Recommendation;

/// Rank the top-k most similar titles to `title`, excluding itself
///
/// Candidates sort descending by similarity with a stable tie-break on
/// ascending row index. The query's own row is excluded by index rather
/// than by dropping the first entry: a duplicate rating row ties the self
/// entry at similarity 1.0 and may sort ahead of it, and the query title
/// must never appear in its own results.
///
/// A candidate whose title has no popularity record is skipped with a
/// warning (the two tables derive from the same join, so this indicates a
/// data inconsistency rather than a user error), which can leave the
/// result with fewer than `k` entries. Zero joinable candidates is the
/// `EmptyNeighborSet` condition, distinct from a failed title resolution.
pub fn rank_neighbors(
    title: &str,
    k: usize,
    matrix: &RatingMatrix,
    similarity: &SimilarityMatrix,
    popularity: &PopularityTable,
) -> QueryResult<Vec<Recommendation>> {
    let row_index = matrix
        .title_index(title)
        .ok_or_else(|| QueryError::TitleNotFound {
            title: title.to_string(),
        })?;

    let mut candidates: Vec<(usize, f64)> = similarity
        .row(row_index)
        .iter()
        .copied()
        .enumerate()
        .collect();

    candidates.sort_by(|a, b| {
        b.1.partial_cmp(&a.1)
            .unwrap_or(Ordering::Equal)
            .then(a.0.cmp(&b.0))
    });

    let mut recommendations = Vec::with_capacity(k);
    for (candidate_index, score) in candidates {
        if candidate_index == row_index {
            continue;
        }
        if recommendations.len() == k {
            break;
        }

        let candidate_title = &matrix.titles()[candidate_index];
        match popularity.get(candidate_title) {
            Some(record) => recommendations.push(Recommendation {
                title: record.title.clone(),
                author: record.author.clone(),
                cover_image_url: record.cover_image_url.clone(),
                num_ratings: record.num_ratings,
                avg_rating: record.avg_rating,
                similarity: score,
            }),
            None => {
                log::warn!(
                    "⚠️ No popularity record for candidate '{}'; skipping",
                    candidate_title
                );
            }
        }
    }

    if recommendations.is_empty() {
        return Err(QueryError::EmptyNeighborSet {
            title: title.to_string(),
        });
    }

    Ok(recommendations)
}
