//! Per-title popularity records over the unfiltered joined ratings.
//!
//! One record per distinct title, holding display metadata plus rating
//! volume and mean. The Neighbor Ranker depends on the row-per-title shape
//! for its metadata join; the top-N query serves the popularity listing.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::dataset::JoinedRating;
use crate::types::Book;

/// Display metadata and rating statistics for one title
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PopularityRecord {
    pub title: String,
    pub author: String,
    pub cover_image_url: String,
    /// Count of numeric ratings; missing scores are not counted
    pub num_ratings: usize,
    /// Mean of numeric ratings; 0.0 when none exist
    pub avg_rating: f64,
}

/// All popularity records, indexed by exact title
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PopularityTable {
    records: Vec<PopularityRecord>,
    #[serde(skip)]
    index: HashMap<String, usize>,
}

/// Equality is over the records; the index is derived state
impl PartialEq for PopularityTable {
    fn eq(&self, other: &Self) -> bool {
        self.records == other.records
    }
}

impl PopularityTable {
    /// Build one record per distinct title from the unfiltered join
    ///
    /// Rating statistics aggregate numeric scores only. Book metadata
    /// collapses edition variants to the first catalog record seen for
    /// each title.
    pub fn build(joined: &[JoinedRating], books: &[Book]) -> Self {
        // First catalog record per title wins
        let mut book_by_title: HashMap<&str, &Book> = HashMap::new();
        for book in books {
            book_by_title.entry(book.title.as_str()).or_insert(book);
        }

        let mut order: Vec<&str> = Vec::new();
        let mut stats: HashMap<&str, (usize, f64)> = HashMap::new();
        for row in joined {
            let entry = stats.entry(row.title.as_str()).or_insert_with(|| {
                order.push(row.title.as_str());
                (0, 0.0)
            });
            if let Some(score) = row.score {
                entry.0 += 1;
                entry.1 += score;
            }
        }

        let records: Vec<PopularityRecord> = order
            .iter()
            .filter_map(|title| {
                let book = book_by_title.get(title)?;
                let (count, sum) = stats[title];
                Some(PopularityRecord {
                    title: (*title).to_string(),
                    author: book.author.clone(),
                    cover_image_url: book.cover_image_url.clone(),
                    num_ratings: count,
                    avg_rating: if count > 0 { sum / count as f64 } else { 0.0 },
                })
            })
            .collect();

        log::debug!("Built popularity table with {} titles", records.len());

        Self::from_records(records)
    }

    fn from_records(records: Vec<PopularityRecord>) -> Self {
        let index = records
            .iter()
            .enumerate()
            .map(|(i, record)| (record.title.clone(), i))
            .collect();
        Self { records, index }
    }

    /// Rebuild the title index after deserialization
    pub fn reindex(&mut self) {
        self.index = self
            .records
            .iter()
            .enumerate()
            .map(|(i, record)| (record.title.clone(), i))
            .collect();
    }

    /// Look up a record by exact title
    pub fn get(&self, title: &str) -> Option<&PopularityRecord> {
        self.index.get(title).map(|&i| &self.records[i])
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// The `n` most-rated titles, descending by rating count
    ///
    /// Ties keep their table order, so repeated calls return the same list.
    pub fn top_by_num_ratings(&self, n: usize) -> Vec<&PopularityRecord> {
        let mut sorted: Vec<&PopularityRecord> = self.records.iter().collect();
        sorted.sort_by(|a, b| b.num_ratings.cmp(&a.num_ratings));
        sorted.truncate(n);
        sorted
    }
}
