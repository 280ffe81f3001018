//! Problem description: ventures, budgets and horizon.
//!
//! Problem files are JSON. Budgets can be spelled out or taken from a venture
//! [`VentureTier`] preset; explicit values win over the preset.
//!
//! ```json
//! {
//!   "tier": "bronze",
//!   "fortnights": 3,
//!   "ventures": [
//!     { "sale_price": 10.0, "transitions": [[1.0, 0.0, 0.0, 0.0], ...] },
//!     { "sale_price": 20.0, "transitions": [[1.0, 0.0, 0.0, 0.0], ...] }
//!   ]
//! }
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::{Result, SolverError};
use crate::transition::{TransitionMatrix, TransitionModel};

/// Preset budget levels: (venture count, max manufacturing funds, max additional funding).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VentureTier {
    Bronze,
    Silver,
    Gold,
    Platinum,
}

impl VentureTier {
    pub fn venture_count(self) -> usize {
        match self {
            VentureTier::Bronze | VentureTier::Silver => 2,
            VentureTier::Gold | VentureTier::Platinum => 3,
        }
    }

    pub fn max_manufacturing_funds(self) -> u32 {
        match self {
            VentureTier::Bronze => 3,
            VentureTier::Silver => 5,
            VentureTier::Gold => 6,
            VentureTier::Platinum => 8,
        }
    }

    pub fn max_additional_funding(self) -> u32 {
        match self {
            VentureTier::Bronze => 3,
            VentureTier::Silver => 4,
            VentureTier::Gold => 4,
            VentureTier::Platinum => 5,
        }
    }
}

/// One funding target: its sale price and transition model.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Venture<M = TransitionMatrix> {
    pub sale_price: f64,
    pub transitions: M,
}

/// Fully resolved problem instance.
#[derive(Clone, Debug)]
pub struct ProblemSpec<M = TransitionMatrix> {
    pub ventures: Vec<Venture<M>>,
    /// Budget bounding the state space and every (state + action) total.
    pub max_manufacturing_funds: u32,
    /// Budget bounding the action space.
    pub max_additional_funding: u32,
    /// Horizon length H; rounds run over fortnights left `0..=H`.
    pub fortnights: u32,
}

/// On-disk form of a problem, before tier resolution.
#[derive(Deserialize)]
struct ProblemFile {
    #[serde(default)]
    tier: Option<VentureTier>,
    #[serde(default)]
    max_manufacturing_funds: Option<u32>,
    #[serde(default)]
    max_additional_funding: Option<u32>,
    fortnights: u32,
    ventures: Vec<Venture<TransitionMatrix>>,
}

impl ProblemSpec<TransitionMatrix> {
    /// Parse and validate a JSON problem description.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let file: ProblemFile = serde_json::from_str(json)?;

        if let Some(tier) = file.tier {
            if tier.venture_count() != file.ventures.len() {
                return Err(SolverError::configuration(format!(
                    "tier {:?} expects {} ventures, got {}",
                    tier,
                    tier.venture_count(),
                    file.ventures.len()
                )));
            }
        }

        let max_manufacturing_funds = file
            .max_manufacturing_funds
            .or(file.tier.map(VentureTier::max_manufacturing_funds))
            .ok_or_else(|| {
                SolverError::configuration("missing max_manufacturing_funds (or a tier)")
            })?;
        let max_additional_funding = file
            .max_additional_funding
            .or(file.tier.map(VentureTier::max_additional_funding))
            .ok_or_else(|| {
                SolverError::configuration("missing max_additional_funding (or a tier)")
            })?;

        let spec = ProblemSpec {
            ventures: file.ventures,
            max_manufacturing_funds,
            max_additional_funding,
            fortnights: file.fortnights,
        };
        spec.validate()?;
        Ok(spec)
    }

    /// Read and validate a JSON problem file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json_str(&content)
    }
}

impl<M: TransitionModel> ProblemSpec<M> {
    pub fn venture_count(&self) -> usize {
        self.ventures.len()
    }

    pub fn sale_prices(&self) -> Vec<f64> {
        self.ventures.iter().map(|v| v.sale_price).collect()
    }

    /// Check budgets, prices and transition shapes. Must pass before solving.
    pub fn validate(&self) -> Result<()> {
        if self.ventures.is_empty() {
            return Err(SolverError::configuration(
                "venture count must be positive",
            ));
        }
        // Any action above the manufacturing budget is infeasible from every state.
        if self.max_additional_funding > self.max_manufacturing_funds {
            return Err(SolverError::configuration(format!(
                "max_additional_funding {} exceeds max_manufacturing_funds {}",
                self.max_additional_funding, self.max_manufacturing_funds
            )));
        }
        let levels = self.max_manufacturing_funds as usize + 1;
        for (i, venture) in self.ventures.iter().enumerate() {
            if !venture.sale_price.is_finite() || venture.sale_price < 0.0 {
                return Err(SolverError::configuration(format!(
                    "venture {}: sale price {} must be finite and non-negative",
                    i, venture.sale_price
                )));
            }
            venture.transitions.validate(levels, i)?;
        }
        Ok(())
    }

    /// SHA-256 over budgets, horizon, prices and every transition probability,
    /// truncated to 64 bits. Identifies the problem a stored table was solved for.
    pub fn fingerprint(&self) -> u64 {
        let mut hasher = Sha256::new();
        hasher.update(self.max_manufacturing_funds.to_le_bytes());
        hasher.update(self.max_additional_funding.to_le_bytes());
        hasher.update(self.fortnights.to_le_bytes());
        hasher.update((self.ventures.len() as u64).to_le_bytes());
        for venture in &self.ventures {
            hasher.update(venture.sale_price.to_bits().to_le_bytes());
            let model = &venture.transitions;
            let levels = model.level_count();
            let buckets = model.bucket_count();
            hasher.update((levels as u64).to_le_bytes());
            hasher.update((buckets as u64).to_le_bytes());
            for level in 0..levels as u32 {
                for bucket in 0..buckets as u32 {
                    hasher.update(model.probability(level, bucket).to_bits().to_le_bytes());
                }
            }
        }
        let digest = hasher.finalize();
        let mut head = [0u8; 8];
        head.copy_from_slice(&digest[..8]);
        u64::from_le_bytes(head)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BRONZE: &str = r#"{
        "tier": "bronze",
        "fortnights": 2,
        "ventures": [
            { "sale_price": 10.0, "transitions": [
                [1.0, 0.0, 0.0, 0.0],
                [0.5, 0.5, 0.0, 0.0],
                [0.2, 0.3, 0.5, 0.0],
                [0.1, 0.2, 0.3, 0.4]
            ]},
            { "sale_price": 20.0, "transitions": [
                [1.0, 0.0, 0.0, 0.0],
                [0.6, 0.4, 0.0, 0.0],
                [0.3, 0.4, 0.3, 0.0],
                [0.1, 0.1, 0.4, 0.4]
            ]}
        ]
    }"#;

    #[test]
    fn test_tier_presets() {
        assert_eq!(VentureTier::Bronze.venture_count(), 2);
        assert_eq!(VentureTier::Silver.max_manufacturing_funds(), 5);
        assert_eq!(VentureTier::Gold.max_additional_funding(), 4);
        assert_eq!(VentureTier::Platinum.venture_count(), 3);
        assert_eq!(VentureTier::Platinum.max_manufacturing_funds(), 8);
    }

    #[test]
    fn test_parse_bronze() {
        let spec = ProblemSpec::from_json_str(BRONZE).unwrap();
        assert_eq!(spec.venture_count(), 2);
        assert_eq!(spec.max_manufacturing_funds, 3);
        assert_eq!(spec.max_additional_funding, 3);
        assert_eq!(spec.fortnights, 2);
        assert_eq!(spec.sale_prices(), vec![10.0, 20.0]);
    }

    #[test]
    fn test_explicit_budget_overrides_tier() {
        let json = BRONZE.replace(
            "\"tier\": \"bronze\",",
            "\"tier\": \"bronze\", \"max_additional_funding\": 1,",
        );
        let spec = ProblemSpec::from_json_str(&json).unwrap();
        assert_eq!(spec.max_additional_funding, 1);
        assert_eq!(spec.max_manufacturing_funds, 3);
    }

    #[test]
    fn test_missing_budget_is_configuration_error() {
        let json = BRONZE.replace("\"tier\": \"bronze\",", "");
        let err = ProblemSpec::from_json_str(&json).unwrap_err();
        assert!(matches!(err, SolverError::Configuration { .. }));
    }

    #[test]
    fn test_tier_venture_count_mismatch() {
        let json = BRONZE.replace("\"bronze\"", "\"gold\"");
        let err = ProblemSpec::from_json_str(&json).unwrap_err();
        assert!(err.to_string().contains("expects 3 ventures"));
    }

    #[test]
    fn test_row_count_must_match_funding_levels() {
        let json = BRONZE.replace(
            "\"tier\": \"bronze\",",
            "\"tier\": \"bronze\", \"max_manufacturing_funds\": 4,",
        );
        let err = ProblemSpec::from_json_str(&json).unwrap_err();
        assert!(matches!(err, SolverError::Configuration { .. }));
    }

    #[test]
    fn test_additional_funding_above_manufacturing_rejected() {
        let json = BRONZE.replace(
            "\"tier\": \"bronze\",",
            "\"tier\": \"bronze\", \"max_additional_funding\": 4294967295,",
        );
        let err = ProblemSpec::from_json_str(&json).unwrap_err();
        assert!(matches!(err, SolverError::Configuration { .. }));
        assert!(err.to_string().contains("exceeds max_manufacturing_funds"));

        let mut spec = ProblemSpec::from_json_str(BRONZE).unwrap();
        spec.max_additional_funding = 4;
        assert!(spec.validate().is_err());
        spec.max_additional_funding = 3;
        assert!(spec.validate().is_ok());
    }

    #[test]
    fn test_fingerprint_tracks_problem_contents() {
        let base = ProblemSpec::from_json_str(BRONZE).unwrap();
        assert_eq!(
            base.fingerprint(),
            ProblemSpec::from_json_str(BRONZE).unwrap().fingerprint()
        );

        let mut priced = base.clone();
        priced.ventures[1].sale_price = 1000.0;
        assert_ne!(base.fingerprint(), priced.fingerprint());

        let mut budget = base.clone();
        budget.max_additional_funding = 2;
        assert_ne!(base.fingerprint(), budget.fingerprint());

        let mut horizon = base.clone();
        horizon.fortnights = 5;
        assert_ne!(base.fingerprint(), horizon.fingerprint());

        let json = BRONZE.replace("[0.5, 0.5, 0.0, 0.0]", "[0.4, 0.6, 0.0, 0.0]");
        let reweighted = ProblemSpec::from_json_str(&json).unwrap();
        assert_ne!(base.fingerprint(), reweighted.fingerprint());
    }

    #[test]
    fn test_negative_price_rejected() {
        let json = BRONZE.replace("10.0", "-1.0");
        assert!(ProblemSpec::from_json_str(&json).is_err());
    }

    #[test]
    fn test_malformed_json() {
        let err = ProblemSpec::from_json_str("{ not json").unwrap_err();
        assert!(matches!(err, SolverError::Problem(_)));
    }
}
