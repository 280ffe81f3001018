//! Error types for the funding solver.

use thiserror::Error;

/// Result type alias for solver operations.
pub type Result<T> = std::result::Result<T, SolverError>;

/// Errors raised while configuring, solving, querying or persisting a policy.
///
/// A state with no feasible action is not an error: it is stored as a
/// zero-value "do nothing" entry.
#[derive(Error, Debug)]
pub enum SolverError {
    /// The problem description is inconsistent (budgets, prices or transition shapes).
    #[error("Invalid configuration: {message}")]
    Configuration { message: String },

    /// A query referenced a (funding, fortnights left) pair that was never populated.
    #[error("No policy entry for funding {ventures:?} with {fortnights_left} fortnights left")]
    NotFound {
        ventures: Vec<u32>,
        fortnights_left: u32,
    },

    /// A query was issued before the offline computation finished.
    #[error("Policy table has not been computed yet")]
    NotComputed,

    /// Reading or writing a policy table file failed.
    #[error("Policy table I/O error: {0}")]
    Storage(#[from] std::io::Error),

    /// A policy table file is truncated or has the wrong format.
    #[error("Corrupt policy table: {message}")]
    CorruptTable { message: String },

    /// A problem file could not be parsed.
    #[error("Problem file error: {0}")]
    Problem(#[from] serde_json::Error),
}

impl SolverError {
    /// Create a configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Create a not-found error for a funding vector and horizon distance.
    pub fn not_found(ventures: &[u32], fortnights_left: u32) -> Self {
        Self::NotFound {
            ventures: ventures.to_vec(),
            fortnights_left,
        }
    }

    /// Create a corrupt-table error.
    pub fn corrupt(message: impl Into<String>) -> Self {
        Self::CorruptTable {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = SolverError::configuration("venture count must be positive");
        assert_eq!(
            err.to_string(),
            "Invalid configuration: venture count must be positive"
        );

        let err = SolverError::not_found(&[1, 2], 3);
        assert_eq!(
            err.to_string(),
            "No policy entry for funding [1, 2] with 3 fortnights left"
        );
    }
}
