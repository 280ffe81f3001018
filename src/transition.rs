//! Per-venture transition models.
//!
//! A transition model maps a funding level to a distribution over discrete
//! outcome buckets. The same row drives two things:
//! - the expected sale outcome `Σ_j P(level, j) * j` in the reward, and
//! - the probability of moving from committed funds `level` to next-fortnight
//!   funding `j` in the continuation value.
//!
//! The solver only reads models through [`TransitionModel`]. The stock
//! implementation is the dense row-stochastic [`TransitionMatrix`] loaded from
//! problem files.

use serde::{Deserialize, Serialize};

use crate::constants::ROW_SUM_TOLERANCE;
use crate::error::{Result, SolverError};

/// Read-only view of one venture's transition probabilities.
pub trait TransitionModel: Sync {
    /// Number of funding levels (rows) the model covers.
    fn level_count(&self) -> usize;

    /// Number of outcome buckets (columns) per row.
    fn bucket_count(&self) -> usize;

    /// P(bucket | level). Zero outside the model's domain.
    fn probability(&self, level: u32, bucket: u32) -> f64;

    /// Expected bucket index under `level`.
    fn expected_bucket(&self, level: u32) -> f64 {
        (0..self.bucket_count() as u32)
            .map(|j| self.probability(level, j) * j as f64)
            .sum()
    }

    /// Check that the model covers `levels` funding levels with stochastic rows.
    fn validate(&self, levels: usize, venture: usize) -> Result<()> {
        validate_model(self, levels, venture)
    }
}

/// Dense row-stochastic matrix, `rows[level][bucket]`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TransitionMatrix {
    rows: Vec<Vec<f64>>,
}

impl TransitionMatrix {
    pub fn new(rows: Vec<Vec<f64>>) -> Self {
        Self { rows }
    }

    /// Identity matrix of size `n`: funding stays where it is with certainty.
    pub fn identity(n: usize) -> Self {
        let rows = (0..n)
            .map(|i| (0..n).map(|j| if i == j { 1.0 } else { 0.0 }).collect())
            .collect();
        Self { rows }
    }
}

impl TransitionModel for TransitionMatrix {
    fn level_count(&self) -> usize {
        self.rows.len()
    }

    fn bucket_count(&self) -> usize {
        self.rows.first().map_or(0, |r| r.len())
    }

    #[inline]
    fn probability(&self, level: u32, bucket: u32) -> f64 {
        self.rows
            .get(level as usize)
            .and_then(|r| r.get(bucket as usize))
            .copied()
            .unwrap_or(0.0)
    }

    fn validate(&self, levels: usize, venture: usize) -> Result<()> {
        validate_matrix(self, levels, venture)
    }
}

/// Check that `model` covers `levels` funding levels and every row is a
/// probability distribution.
pub fn validate_model<M: TransitionModel + ?Sized>(
    model: &M,
    levels: usize,
    venture: usize,
) -> Result<()> {
    if model.level_count() != levels {
        return Err(SolverError::configuration(format!(
            "venture {}: transition model has {} rows, expected {} (one per funding level 0..={})",
            venture,
            model.level_count(),
            levels,
            levels.saturating_sub(1)
        )));
    }
    let buckets = model.bucket_count();
    if buckets == 0 {
        return Err(SolverError::configuration(format!(
            "venture {}: transition model has no outcome buckets",
            venture
        )));
    }
    for level in 0..levels as u32 {
        let mut sum = 0.0;
        for bucket in 0..buckets as u32 {
            let p = model.probability(level, bucket);
            if !p.is_finite() || !(0.0..=1.0).contains(&p) {
                return Err(SolverError::configuration(format!(
                    "venture {}: P({} -> {}) = {} is not a probability",
                    venture, level, bucket, p
                )));
            }
            sum += p;
        }
        if (sum - 1.0).abs() > ROW_SUM_TOLERANCE {
            return Err(SolverError::configuration(format!(
                "venture {}: row {} sums to {}, expected 1",
                venture, level, sum
            )));
        }
    }
    Ok(())
}

/// Reject ragged matrices before they reach [`validate_model`], which only
/// sees the width of the first row.
fn validate_matrix(matrix: &TransitionMatrix, levels: usize, venture: usize) -> Result<()> {
    let width = matrix.bucket_count();
    if let Some((level, row)) = matrix
        .rows
        .iter()
        .enumerate()
        .find(|(_, r)| r.len() != width)
    {
        return Err(SolverError::configuration(format!(
            "venture {}: row {} has {} buckets, expected {}",
            venture,
            level,
            row.len(),
            width
        )));
    }
    validate_model(matrix, levels, venture)
}
