//! Reward constants and policy-table file format identifiers.
//!
//! The reward model has two fixed coefficients:
//! - [`RETURN_RATE`]: fraction of the sale price realised per expected sale bucket
//! - [`WRITE_DOWN_RATE`]: fraction of the sale price lost when a venture holds no funding

/// Fraction of the sale price returned per unit of expected sale outcome.
pub const RETURN_RATE: f64 = 0.6;

/// Fraction of the sale price written off for a venture left with zero funding.
pub const WRITE_DOWN_RATE: f64 = 0.25;

/// Tolerance when checking that transition rows sum to 1.
pub const ROW_SUM_TOLERANCE: f64 = 1e-6;

/// Policy table file magic number: "FPOL" in hex.
pub const POLICY_FILE_MAGIC: u32 = 0x4C4F5046;

/// Policy table file format version.
pub const POLICY_FILE_VERSION: u32 = 2;

/// Default location of the persisted policy table.
pub const POLICY_FILE_PATH: &str = "data/policy_table.bin";
