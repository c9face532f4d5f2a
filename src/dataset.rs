//! Joining raw ratings against the book catalog.
//!
//! Produces the joined rating rows every downstream component consumes.
//! Score coercion happens here: a value that does not parse as a number
//! becomes "missing" and is counted, never propagated as a fault.

use std::collections::HashMap;

use crate::types::{Book, Rating};

/// A rating joined with its catalog entry, keyed by title
#[derive(Debug, Clone, PartialEq)]
pub struct JoinedRating {
    pub user_id: String,
    pub title: String,
    /// Numeric score, or None when the raw value was missing or malformed
    pub score: Option<f64>,
}

/// Join ratings with books on ISBN, coercing scores to numbers
///
/// Ratings whose ISBN has no catalog entry are dropped, matching an inner
/// join. Rows with unparseable scores are kept with a missing score: they
/// still count toward user and title activity in the filtering stage.
pub fn join_ratings(ratings: &[Rating], books: &[Book]) -> Vec<JoinedRating> {
    let titles_by_isbn: HashMap<&str, &str> = books
        .iter()
        .map(|book| (book.isbn.as_str(), book.title.as_str()))
        .collect();

    let mut joined = Vec::with_capacity(ratings.len());
    let mut malformed = 0usize;

    for rating in ratings {
        let Some(title) = titles_by_isbn.get(rating.isbn.as_str()) else {
            continue;
        };

        let score = coerce_score(&rating.score);
        if score.is_none() && !rating.score.trim().is_empty() {
            malformed += 1;
        }

        joined.push(JoinedRating {
            user_id: rating.user_id.clone(),
            title: (*title).to_string(),
            score,
        });
    }

    if malformed > 0 {
        log::warn!(
            "⚠️ Coerced {} malformed rating scores to missing during catalog join",
            malformed
        );
    }
    log::debug!(
        "Joined {} of {} ratings against {} catalog entries",
        joined.len(),
        ratings.len(),
        books.len()
    );

    joined
}

/// Parse a raw score value, treating anything unparseable as missing
fn coerce_score(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.parse::<f64>().ok().filter(|score| score.is_finite())
}
