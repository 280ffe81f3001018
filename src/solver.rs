//! Top-level funding agent: owns the problem, its lattices and the finished table.
//!
//! Lifecycle:
//! 1. [`FundingSolver::new`] validates the problem and enumerates the action and
//!    state spaces.
//! 2. [`FundingSolver::run_offline_computation`] runs backward induction once.
//! 3. `query_*` methods read the finished table. Querying earlier is a usage
//!    error ([`SolverError::NotComputed`]).

use tracing::info;

use crate::error::{Result, SolverError};
use crate::lattice::enumerate_within;
use crate::problem::ProblemSpec;
use crate::state_computation::compute_policy_table;
use crate::transition::{TransitionMatrix, TransitionModel};
use crate::types::{PolicyEntry, PolicyTable, VentureVector};

#[derive(Debug)]
pub struct FundingSolver<M: TransitionModel = TransitionMatrix> {
    problem: ProblemSpec<M>,
    actions: Vec<VentureVector>,
    states: Vec<VentureVector>,
    table: Option<PolicyTable>,
}

impl<M: TransitionModel> FundingSolver<M> {
    pub fn new(problem: ProblemSpec<M>) -> Result<Self> {
        problem.validate()?;
        let n = problem.venture_count();
        let actions = enumerate_within(n, problem.max_additional_funding);
        let states = enumerate_within(n, problem.max_manufacturing_funds);
        info!(
            ventures = n,
            actions = actions.len(),
            states = states.len(),
            fortnights = problem.fortnights,
            "enumerated action and state spaces"
        );
        Ok(Self {
            problem,
            actions,
            states,
            table: None,
        })
    }

    /// Attach a previously computed table (e.g. loaded from disk).
    ///
    /// The table must have been solved for this exact problem: same
    /// fingerprint, state space and horizon.
    pub fn with_table(problem: ProblemSpec<M>, table: PolicyTable) -> Result<Self> {
        let mut solver = Self::new(problem)?;
        let fingerprint = solver.problem.fingerprint();
        if table.fingerprint() != fingerprint {
            return Err(SolverError::configuration(format!(
                "policy table fingerprint {:016x} does not match problem fingerprint {:016x}",
                table.fingerprint(),
                fingerprint
            )));
        }
        if table.states() != solver.states.as_slice() {
            return Err(SolverError::configuration(
                "policy table state space does not match the problem",
            ));
        }
        if table.horizon() != solver.problem.fortnights {
            return Err(SolverError::configuration(format!(
                "policy table covers {} fortnights, problem has {}",
                table.horizon(),
                solver.problem.fortnights
            )));
        }
        solver.table = Some(table);
        Ok(solver)
    }

    pub fn problem(&self) -> &ProblemSpec<M> {
        &self.problem
    }

    pub fn action_space(&self) -> &[VentureVector] {
        &self.actions
    }

    pub fn state_space(&self) -> &[VentureVector] {
        &self.states
    }

    pub fn is_computed(&self) -> bool {
        self.table.is_some()
    }

    /// Populate the policy table. Repeated calls return the existing table.
    pub fn run_offline_computation(&mut self) -> Result<&PolicyTable> {
        if self.table.is_none() {
            let table = compute_policy_table(&self.problem, &self.states, &self.actions)?;
            self.table = Some(table);
        }
        self.table()
    }

    /// The finished table, or `NotComputed`.
    pub fn table(&self) -> Result<&PolicyTable> {
        self.table.as_ref().ok_or(SolverError::NotComputed)
    }

    pub fn into_table(self) -> Option<PolicyTable> {
        self.table
    }

    /// Full entry for `(current_funding, fortnights_left)`.
    pub fn query_entry(
        &self,
        current_funding: &[u32],
        fortnights_left: u32,
    ) -> Result<&PolicyEntry> {
        self.table()?.entry(current_funding, fortnights_left)
    }

    /// Optimal additional funding. `None` means commit nothing this fortnight.
    pub fn query_optimal_action(
        &self,
        current_funding: &[u32],
        fortnights_left: u32,
    ) -> Result<Option<VentureVector>> {
        Ok(self
            .query_entry(current_funding, fortnights_left)?
            .action
            .clone())
    }

    /// Expected return from following the policy from this state.
    pub fn query_value(&self, current_funding: &[u32], fortnights_left: u32) -> Result<f64> {
        Ok(self.query_entry(current_funding, fortnights_left)?.value)
    }
}
