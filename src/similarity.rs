//! Pairwise cosine similarity between rating matrix rows.
//!
//! This module computes the square similarity table the Neighbor Ranker
//! serves from. Cosine similarity suits rating vectors because it normalizes
//! for how much a title has been rated, comparing rating *patterns* rather
//! than absolute volume.
//!
//! ## Mathematical Foundation
//!
//! ```text
//! cosine_similarity(A, B) = (A · B) / (||A|| * ||B||)
//! ```
//!
//! **Properties:**
//! - Range: [-1, 1]; with the non-negative zero-filled rating rows used
//!   here, values land in [0, 1]
//! - Symmetric: sim(A, B) = sim(B, A)
//! - Scale invariant: sim(kA, B) = sim(A, B) for k > 0
//!
//! ## Implementation Notes
//!
//! The naive pairwise pass is O(R²·C) for R titles and C users. Rows are
//! unit-normalized once up front, which reduces every pairwise cell to a
//! plain dot product, and the per-row loop is distributed across cores with
//! rayon. Cell (i,j) and cell (j,i) execute the identical floating-point
//! sequence, so the output is symmetric bitwise, well inside the 1e-9
//! contract tolerance.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::rating_matrix::RatingMatrix;

/// Calculate cosine similarity between two vectors
///
/// A zero vector has no direction, so any comparison involving one yields
/// 0.0 rather than dividing by zero. The title filter makes all-zero rating
/// rows unreachable in practice, but the guard stays.
///
/// # Example
///
/// ```
/// use readnext::similarity::cosine_similarity;
///
/// let sim = cosine_similarity(&[1.0, 2.0, 3.0], &[4.0, 5.0, 6.0]);
/// assert!((sim - 0.9746318).abs() < 1e-6);
/// ```
pub fn cosine_similarity(vector_a: &[f64], vector_b: &[f64]) -> f64 {
    debug_assert_eq!(vector_a.len(), vector_b.len());

    let mut dot_product = 0.0;
    let mut sum_sq_a = 0.0;
    let mut sum_sq_b = 0.0;

    // Single pass: dot product and both squared magnitudes together
    for i in 0..vector_a.len() {
        let a_val = vector_a[i];
        let b_val = vector_b[i];
        dot_product += a_val * b_val;
        sum_sq_a += a_val * a_val;
        sum_sq_b += b_val * b_val;
    }

    let magnitude_a = sum_sq_a.sqrt();
    let magnitude_b = sum_sq_b.sqrt();

    if magnitude_a == 0.0 || magnitude_b == 0.0 {
        return 0.0;
    }

    (dot_product / (magnitude_a * magnitude_b)).clamp(-1.0, 1.0)
}

/// Square, symmetric cosine similarity table over rating matrix rows
///
/// Same row ordering as the matrix it was computed from; the two are built
/// and published together and never go stale relative to each other.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SimilarityMatrix {
    n: usize,
    /// Row-major `n * n` cell values
    values: Vec<f64>,
}

impl SimilarityMatrix {
    /// Compute the full pairwise similarity table for a rating matrix
    ///
    /// Every row is unit-normalized once, then each cell (i,j) is the dot
    /// product of unit rows i and j. The diagonal is pinned to 1.0 for
    /// non-degenerate rows (0.0 for an all-zero row) and off-diagonal cells
    /// are clamped to [-1, 1], which together guarantee the diagonal is the
    /// maximum of its row.
    pub fn compute(matrix: &RatingMatrix) -> Self {
        let n = matrix.n_titles();

        log::info!("⚡ Computing similarity matrix for {} titles...", n);

        // Normalize rows up front; a zero row stays all-zero and reports
        // similarity 0.0 against everything, including itself.
        let unit_rows: Vec<Vec<f64>> = (0..n)
            .map(|i| {
                let row = matrix.row(i);
                let magnitude = row.iter().map(|v| v * v).sum::<f64>().sqrt();
                if magnitude == 0.0 {
                    vec![0.0; row.len()]
                } else {
                    row.iter().map(|v| v / magnitude).collect()
                }
            })
            .collect();

        let rows: Vec<Vec<f64>> = (0..n)
            .into_par_iter()
            .map(|i| {
                let unit_i = &unit_rows[i];
                let degenerate = unit_i.iter().all(|&v| v == 0.0);
                (0..n)
                    .map(|j| {
                        if i == j {
                            if degenerate {
                                0.0
                            } else {
                                1.0
                            }
                        } else {
                            dot(unit_i, &unit_rows[j]).clamp(-1.0, 1.0)
                        }
                    })
                    .collect()
            })
            .collect();

        let values = rows.into_iter().flatten().collect();

        Self { n, values }
    }

    /// Number of rows (== number of titles in the source matrix)
    pub fn len(&self) -> usize {
        self.n
    }

    pub fn is_empty(&self) -> bool {
        self.n == 0
    }

    /// One full similarity row
    pub fn row(&self, index: usize) -> &[f64] {
        &self.values[index * self.n..(index + 1) * self.n]
    }

    pub fn get(&self, i: usize, j: usize) -> f64 {
        self.values[i * self.n + j]
    }
}

/// Dot product with a fixed iteration order
///
/// Keeping the index order identical for (a,b) and (b,a) is what makes the
/// computed table symmetric at the bit level.
fn dot(a: &[f64], b: &[f64]) -> f64 {
    let mut sum = 0.0;
    for k in 0..a.len() {
        sum += a[k] * b[k];
    }
    sum
}
