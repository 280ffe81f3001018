//! # Funding — optimal multi-venture funding allocation
//!
//! Computes an optimal funding policy for N independent ventures under a
//! finite-horizon, undiscounted MDP using **backward induction**.
//!
//! ## Algorithm overview
//!
//! | Step | Rust module | Description |
//! |------|-------------|-------------|
//! | 0 | [`problem`] | Load and validate ventures, budgets, horizon and transition models |
//! | 1 | [`lattice`] | Enumerate the action space (total ≤ additional-funding budget) and state space (total ≤ manufacturing budget) |
//! | 2 | [`state_computation`] | Rounds `t = 0..=H`: score every feasible (state, action) pair, keep the zero-floored first-wins argmax |
//! | 3 | [`types::PolicyTable`] | Finished (funding, fortnights left) → (action, value) mapping |
//!
//! Each (state, action) pair is scored by [`reward::RewardEvaluator`]: the
//! immediate expected sale value plus, for `t > 0`, the expected value of the
//! round `t - 1` policy over the funding levels reachable from `state + action`.
//!
//! ## State representation
//!
//! A state is a [`types::VentureVector`] (one funding level per venture) plus
//! the number of fortnights left. Keys are value types with position-sensitive
//! equality and hashing.
//!
//! ## Entry points
//!
//! [`solver::FundingSolver`] wraps the pipeline:
//! `new(problem)` → `run_offline_computation()` → `query_optimal_action(funding, t)`.

pub mod constants;
pub mod env_config;
pub mod error;
pub mod lattice;
pub mod problem;
pub mod reward;
pub mod server;
pub mod solver;
pub mod state_computation;
pub mod storage;
pub mod transition;
pub mod types;

pub use error::{Result, SolverError};
pub use solver::FundingSolver;
