//! Lattice enumeration for the action and state spaces.
//!
//! Both spaces are "sum-bounded" integer lattices: every length-N vector whose
//! components sum to strictly less than an exclusive `bound`. The action space
//! uses `max_additional_funding + 1`, the state space
//! `max_manufacturing_funds + 1`, so each holds the vectors with total at most
//! the respective budget.
//!
//! Vectors come out in lexicographic order (outermost axis slowest), the same
//! order a hand-written nest of loops produces. The engine breaks ties by this
//! order, so it must stay stable.

use crate::types::VentureVector;

/// Enumerate every length-`venture_count` vector with component sum `< bound`.
///
/// Odometer walk: bump the innermost axis while the running sum allows it,
/// otherwise reset that axis and carry into the next outer one.
pub fn enumerate_below(venture_count: usize, bound: u32) -> Vec<VentureVector> {
    let mut out = Vec::with_capacity(lattice_size(venture_count, bound).unwrap_or(0));
    if venture_count == 0 || bound == 0 {
        return out;
    }

    let mut current = vec![0u32; venture_count];
    let mut sum = 0u32;
    loop {
        out.push(VentureVector::new(current.clone()));

        let mut axis = venture_count;
        loop {
            if axis == 0 {
                return out;
            }
            axis -= 1;
            if sum + 1 < bound {
                current[axis] += 1;
                sum += 1;
                break;
            }
            sum -= current[axis];
            current[axis] = 0;
        }
    }
}

/// Vectors with total at most `budget` (inclusive).
///
/// `u32::MAX` has no exclusive bound and yields nothing; callers validate
/// budgets before enumerating.
pub fn enumerate_within(venture_count: usize, budget: u32) -> Vec<VentureVector> {
    match budget.checked_add(1) {
        Some(bound) => enumerate_below(venture_count, bound),
        None => Vec::new(),
    }
}

/// Number of vectors [`enumerate_below`] yields: C(bound - 1 + n, n).
/// `None` when the count does not fit in `usize`.
pub fn lattice_size(venture_count: usize, bound: u32) -> Option<usize> {
    if venture_count == 0 || bound == 0 {
        return Some(0);
    }
    let total = (bound - 1) as usize;
    // C(total + n, n), built incrementally to stay exact.
    let mut size = 1usize;
    for k in 1..=venture_count {
        size = size.checked_mul(total.checked_add(k)?)? / k;
    }
    Some(size)
}
