//! Immediate and continuation values of a (state, action) pair.
//!
//! With committed funds `f = state + action`:
//!
//! - terminal value: Σ_i `-WRITE_DOWN_RATE * price_i` if `f_i == 0`, else
//!   `RETURN_RATE * price_i * E[bucket | f_i]`
//! - continuation value: Σ_k `Π_i P_i(f_i → k_i) * V_{t-1}(k)` over the states
//!   `k` of the previous round with `k ≤ f` componentwise
//!
//! Each venture's factor in the joint probability comes from that venture's
//! own model, indexed by its own committed funds and its own target level.

use crate::constants::{RETURN_RATE, WRITE_DOWN_RATE};
use crate::problem::ProblemSpec;
use crate::transition::TransitionModel;
use crate::types::{PolicyEntry, VentureVector};

/// Reward evaluator bound to one problem.
///
/// Caches `E[bucket | level]` for every venture and every level up to the
/// manufacturing budget; the terminal value is evaluated once per
/// (state, action) pair per round, so the expectation is hoisted out.
pub struct RewardEvaluator<'a, M: TransitionModel> {
    problem: &'a ProblemSpec<M>,
    expected_sales: Vec<Vec<f64>>,
}

impl<'a, M: TransitionModel> RewardEvaluator<'a, M> {
    pub fn new(problem: &'a ProblemSpec<M>) -> Self {
        let levels = problem.max_manufacturing_funds;
        let expected_sales = problem
            .ventures
            .iter()
            .map(|v| (0..=levels).map(|f| v.transitions.expected_bucket(f)).collect())
            .collect();
        Self {
            problem,
            expected_sales,
        }
    }

    fn expected_bucket(&self, venture: usize, level: u32) -> f64 {
        match self.expected_sales[venture].get(level as usize) {
            Some(&e) => e,
            None => self.problem.ventures[venture]
                .transitions
                .expected_bucket(level),
        }
    }

    /// Expected monetary value of committing `state + action` this fortnight.
    pub fn terminal_value(&self, state: &[u32], action: &[u32]) -> f64 {
        let mut total = 0.0;
        for (i, venture) in self.problem.ventures.iter().enumerate() {
            let funds = state[i] + action[i];
            total += if funds == 0 {
                -WRITE_DOWN_RATE * venture.sale_price
            } else {
                RETURN_RATE * venture.sale_price * self.expected_bucket(i, funds)
            };
        }
        total
    }

    /// Joint probability of moving from committed `funds` to `next`.
    pub fn transition_probability(&self, funds: &[u32], next: &[u32]) -> f64 {
        let mut p = 1.0;
        for (i, venture) in self.problem.ventures.iter().enumerate() {
            p *= venture.transitions.probability(funds[i], next[i]);
            if p == 0.0 {
                break;
            }
        }
        p
    }

    /// Expected value of the previous round's policy, reached from `state + action`.
    ///
    /// `states` and `prior` are parallel: `prior[k]` is the finished entry for
    /// `states[k]` one fortnight closer to the end.
    pub fn continuation_value(
        &self,
        states: &[VentureVector],
        prior: &[PolicyEntry],
        state: &[u32],
        action: &[u32],
    ) -> f64 {
        debug_assert_eq!(states.len(), prior.len());
        let funds: Vec<u32> = state.iter().zip(action).map(|(s, a)| s + a).collect();
        states
            .iter()
            .zip(prior)
            .filter(|(next, _)| next.fits_within(&funds))
            .map(|(next, entry)| {
                let p = self.transition_probability(&funds, next);
                if p == 0.0 {
                    0.0
                } else {
                    p * entry.value
                }
            })
            .sum()
    }

    /// One-step reward plus continuation value.
    pub fn step_value(
        &self,
        states: &[VentureVector],
        prior: &[PolicyEntry],
        state: &[u32],
        action: &[u32],
    ) -> f64 {
        self.terminal_value(state, action) + self.continuation_value(states, prior, state, action)
    }
}
