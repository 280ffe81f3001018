//! Backward induction: fill the policy table round by round.
//!
//! Round `t` holds the optimal decision with `t` fortnights left. Round 0 scores
//! every feasible action by its terminal value alone. Round `t > 0` adds the
//! continuation value against round `t - 1`, which is complete before round `t`
//! starts.
//!
//! Within a round each state depends only on the previous round, so states are
//! solved in parallel with rayon `par_iter`. `collect()` keeps StateSpace order,
//! and each state's own arithmetic is sequential, so repeated runs produce
//! identical tables regardless of thread count.
//!
//! ## Action selection
//!
//! The incumbent starts as "no action" worth 0. Actions are tried in ActionSpace
//! order and replace the incumbent only when strictly better. The first of
//! several tied actions wins, and a state whose feasible actions are all worth
//! at most 0 stores `(None, 0.0)`.

use std::time::Instant;

use rayon::prelude::*;
use tracing::{debug, info};

use crate::error::Result;
use crate::problem::ProblemSpec;
use crate::reward::RewardEvaluator;
use crate::transition::TransitionModel;
use crate::types::{PolicyEntry, PolicyTable, PolicyTableBuilder, VentureVector};

/// Progress tracker for the round loop.
struct ComputeProgress {
    rounds: u32,
    states: usize,
    actions: usize,
    start_time: Instant,
    evaluations: u64,
}

impl ComputeProgress {
    fn new(rounds: u32, states: usize, actions: usize) -> Self {
        Self {
            rounds,
            states,
            actions,
            start_time: Instant::now(),
            evaluations: 0,
        }
    }

    fn finish_round(&mut self, round: u32, round_start: Instant, evaluations: u64, idle: usize) {
        self.evaluations += evaluations;
        let dur = round_start.elapsed().as_secs_f64();
        info!(
            round,
            of = self.rounds - 1,
            evaluations,
            idle_states = idle,
            "round completed in {:.3}s ({:.0} evaluations/s)",
            dur,
            evaluations as f64 / dur.max(1e-9)
        );
    }

    fn report(&self) {
        let total = self.start_time.elapsed().as_secs_f64();
        info!(
            rounds = self.rounds,
            states = self.states,
            actions = self.actions,
            evaluations = self.evaluations,
            "policy table complete in {:.3}s",
            total
        );
    }
}

/// Is `action` affordable from `state` under the manufacturing budget?
#[inline]
pub fn is_feasible(
    state: &VentureVector,
    action: &VentureVector,
    max_manufacturing_funds: u32,
) -> bool {
    state.total() + action.total() <= max_manufacturing_funds as u64
}

/// Pick the best feasible action for `state` under `score`.
///
/// Zero-floored, first-wins argmax; see the module docs. Returns the entry and
/// the number of feasible actions scored.
pub fn select_action<F>(
    state: &VentureVector,
    actions: &[VentureVector],
    max_manufacturing_funds: u32,
    score: F,
) -> (PolicyEntry, u64)
where
    F: Fn(&VentureVector) -> f64,
{
    let mut best_value = 0.0;
    let mut best_action: Option<usize> = None;
    let mut evaluated = 0u64;
    for (ai, action) in actions.iter().enumerate() {
        if !is_feasible(state, action, max_manufacturing_funds) {
            continue;
        }
        evaluated += 1;
        let value = score(action);
        if value > best_value {
            best_value = value;
            best_action = Some(ai);
        }
    }
    let entry = PolicyEntry {
        action: best_action.map(|ai| actions[ai].clone()),
        value: best_value,
    };
    (entry, evaluated)
}

/// Solve one round given the previous round's finished slice (`None` for round 0).
pub fn solve_round<M: TransitionModel>(
    evaluator: &RewardEvaluator<'_, M>,
    states: &[VentureVector],
    actions: &[VentureVector],
    max_manufacturing_funds: u32,
    prior: Option<&[PolicyEntry]>,
) -> (Vec<PolicyEntry>, u64) {
    let results: Vec<(PolicyEntry, u64)> = states
        .par_iter()
        .map(|state| match prior {
            None => select_action(state, actions, max_manufacturing_funds, |action| {
                evaluator.terminal_value(state, action)
            }),
            Some(prior) => select_action(state, actions, max_manufacturing_funds, |action| {
                evaluator.step_value(states, prior, state, action)
            }),
        })
        .collect();

    let evaluations: u64 = results.iter().map(|(_, n)| n).sum();
    let entries: Vec<PolicyEntry> = results.into_iter().map(|(e, _)| e).collect();
    (entries, evaluations)
}

/// Run backward induction over fortnights left `0..=problem.fortnights`.
pub fn compute_policy_table<M: TransitionModel>(
    problem: &ProblemSpec<M>,
    states: &[VentureVector],
    actions: &[VentureVector],
) -> Result<PolicyTable> {
    let rounds = problem.fortnights + 1;
    let mut progress = ComputeProgress::new(rounds, states.len(), actions.len());

    info!(
        ventures = problem.venture_count(),
        states = states.len(),
        actions = actions.len(),
        rounds,
        "starting value iteration"
    );

    let evaluator = RewardEvaluator::new(problem);
    let mut builder = PolicyTableBuilder::new(problem.fingerprint(), states.to_vec());

    for round in 0..rounds {
        let round_start = Instant::now();
        let (entries, evaluations) = solve_round(
            &evaluator,
            builder.states(),
            actions,
            problem.max_manufacturing_funds,
            builder.last_round(),
        );
        let idle = entries.iter().filter(|e| e.action.is_none()).count();
        debug!(round, idle, "storing round");
        builder.push_round(entries);
        progress.finish_round(round, round_start, evaluations, idle);
    }

    progress.report();
    builder.finish()
}
