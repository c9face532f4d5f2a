//! Approximate resolution of a free-text query into a catalog title.
//!
//! Matching is literal: titles are compared exactly as stored, with no case
//! folding or whitespace normalization beyond what the similarity measure
//! itself performs. Only the single best match is consumed downstream, so
//! ties keep the earliest row index and nothing more is guaranteed.

use crate::errors::{QueryError, QueryResult};

/// A resolved title with its match score
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedTitle {
    /// Index of the matched title in the corpus it was resolved against
    pub index: usize,
    /// The matched title, exactly as stored
    pub title: String,
    /// Normalized Levenshtein similarity in [0.0, 1.0]
    pub score: f64,
}

/// Resolve a query against a corpus of titles
///
/// Scores every corpus title with normalized Levenshtein similarity and
/// returns the best one if its score reaches `cutoff` (inclusive, matching
/// the original behavior of the system this engine replaces). Querying the
/// exact text of a corpus title always resolves to itself with score 1.0.
pub fn resolve_title(query: &str, corpus: &[String], cutoff: f64) -> QueryResult<ResolvedTitle> {
    let mut best: Option<ResolvedTitle> = None;

    for (index, title) in corpus.iter().enumerate() {
        let score = strsim::normalized_levenshtein(query, title);
        let better = match &best {
            Some(current) => score > current.score,
            None => true,
        };
        if better {
            best = Some(ResolvedTitle {
                index,
                title: title.clone(),
                score,
            });
        }
    }

    match best {
        Some(resolved) if resolved.score >= cutoff => {
            log::debug!(
                "Resolved '{}' to '{}' (score {:.3})",
                query,
                resolved.title,
                resolved.score
            );
            Ok(resolved)
        }
        _ => Err(QueryError::NoMatch {
            query: query.to_string(),
        }),
    }
}
