//! Core data structures: funding vectors, policy keys and the policy table.
//!
//! The central type is [`PolicyTable`], the result of backward induction. It is
//! assembled round by round through a [`PolicyTableBuilder`] owned by the engine
//! and is read-only once [`PolicyTableBuilder::finish`] hands it over.
//!
//! ## Layout
//!
//! Entries are stored as one slice per round (`fortnights_left`), each slice in
//! StateSpace order. A hash index maps a funding vector to its position in the
//! StateSpace, so a lookup is one hash probe plus two array reads.

use std::borrow::Borrow;
use std::collections::HashMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::ops::Deref;

use serde::{Deserialize, Serialize};

use crate::error::{Result, SolverError};

/// One non-negative integer per venture: funding levels (state) or
/// additional funding (action).
///
/// Equality and hashing are structural and position-sensitive: `[1, 0]` and
/// `[0, 1]` are different vectors.
#[derive(Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VentureVector(Vec<u32>);

impl VentureVector {
    pub fn new(levels: Vec<u32>) -> Self {
        Self(levels)
    }

    pub fn zeros(venture_count: usize) -> Self {
        Self(vec![0; venture_count])
    }

    pub fn as_slice(&self) -> &[u32] {
        &self.0
    }

    /// Sum over all ventures.
    pub fn total(&self) -> u64 {
        self.0.iter().map(|&v| v as u64).sum()
    }

    /// Elementwise sum with `other` (state + action = committed funds).
    pub fn combined(&self, other: &VentureVector) -> VentureVector {
        debug_assert_eq!(self.len(), other.len());
        VentureVector(self.0.iter().zip(&other.0).map(|(a, b)| a + b).collect())
    }

    /// True if every component is at most the matching component of `funds`.
    pub fn fits_within(&self, funds: &[u32]) -> bool {
        self.0.len() == funds.len() && self.0.iter().zip(funds).all(|(k, f)| k <= f)
    }

    pub fn into_inner(self) -> Vec<u32> {
        self.0
    }
}

impl Deref for VentureVector {
    type Target = [u32];

    fn deref(&self) -> &[u32] {
        &self.0
    }
}

impl Borrow<[u32]> for VentureVector {
    fn borrow(&self) -> &[u32] {
        &self.0
    }
}

// Hash as a slice so `HashMap<VentureVector, _>` can be probed with `&[u32]`.
impl Hash for VentureVector {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.as_slice().hash(state);
    }
}

impl From<Vec<u32>> for VentureVector {
    fn from(levels: Vec<u32>) -> Self {
        Self(levels)
    }
}

impl fmt::Display for VentureVector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (i, v) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", v)?;
        }
        write!(f, "]")
    }
}

/// A decision point: funding levels plus fortnights remaining (0 = terminal).
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct PolicyKey {
    pub ventures: VentureVector,
    pub fortnights_left: u32,
}

impl PolicyKey {
    pub fn new(ventures: VentureVector, fortnights_left: u32) -> Self {
        Self {
            ventures,
            fortnights_left,
        }
    }
}

/// Optimal decision for one [`PolicyKey`].
///
/// `action` is `None` when no feasible action scored above zero; `value` is
/// then 0.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PolicyEntry {
    pub action: Option<VentureVector>,
    pub value: f64,
}

impl PolicyEntry {
    /// The "do nothing" entry.
    pub fn idle() -> Self {
        Self {
            action: None,
            value: 0.0,
        }
    }
}

/// Finished mapping (funding, fortnights left) → [`PolicyEntry`].
///
/// Holds exactly one entry per StateSpace vector for every round `0..=horizon`.
#[derive(Debug)]
pub struct PolicyTable {
    /// [`crate::problem::ProblemSpec::fingerprint`] of the problem this table solves.
    fingerprint: u64,
    states: Vec<VentureVector>,
    index: HashMap<VentureVector, usize>,
    rounds: Vec<Vec<PolicyEntry>>,
}

impl PolicyTable {
    /// Reassemble a table from its StateSpace and per-round slices.
    ///
    /// Every round must hold one entry per state, and the state space must
    /// not be empty.
    pub fn from_parts(
        fingerprint: u64,
        states: Vec<VentureVector>,
        rounds: Vec<Vec<PolicyEntry>>,
    ) -> Result<Self> {
        if states.is_empty() {
            return Err(SolverError::corrupt("policy table has no states"));
        }
        if rounds.is_empty() {
            return Err(SolverError::corrupt("policy table has no rounds"));
        }
        for (t, round) in rounds.iter().enumerate() {
            if round.len() != states.len() {
                return Err(SolverError::corrupt(format!(
                    "round {} has {} entries, expected {}",
                    t,
                    round.len(),
                    states.len()
                )));
            }
        }
        let index = build_index(&states);
        if index.len() != states.len() {
            return Err(SolverError::corrupt("duplicate states in state space"));
        }
        Ok(Self {
            fingerprint,
            states,
            index,
            rounds,
        })
    }

    pub fn fingerprint(&self) -> u64 {
        self.fingerprint
    }

    /// Largest `fortnights_left` with entries.
    pub fn horizon(&self) -> u32 {
        (self.rounds.len() - 1) as u32
    }

    pub fn states(&self) -> &[VentureVector] {
        &self.states
    }

    /// Total number of stored entries.
    pub fn len(&self) -> usize {
        self.states.len() * self.rounds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Look up the entry for a key, if it was populated.
    pub fn get(&self, key: &PolicyKey) -> Option<&PolicyEntry> {
        self.lookup(&key.ventures, key.fortnights_left)
    }

    fn lookup(&self, ventures: &[u32], fortnights_left: u32) -> Option<&PolicyEntry> {
        let round = self.rounds.get(fortnights_left as usize)?;
        let &si = self.index.get(ventures)?;
        round.get(si)
    }

    /// Entry for `(ventures, fortnights_left)`, or `NotFound`.
    pub fn entry(&self, ventures: &[u32], fortnights_left: u32) -> Result<&PolicyEntry> {
        self.lookup(ventures, fortnights_left)
            .ok_or_else(|| SolverError::not_found(ventures, fortnights_left))
    }

    /// Stored optimal action; `Ok(None)` means "do nothing this fortnight".
    pub fn optimal_action(
        &self,
        ventures: &[u32],
        fortnights_left: u32,
    ) -> Result<Option<&VentureVector>> {
        Ok(self.entry(ventures, fortnights_left)?.action.as_ref())
    }

    /// Iterate one round's `(state, entry)` pairs in StateSpace order.
    pub fn iter_round(
        &self,
        fortnights_left: u32,
    ) -> impl Iterator<Item = (&VentureVector, &PolicyEntry)> + '_ {
        let round = self
            .rounds
            .get(fortnights_left as usize)
            .map(|r| r.as_slice())
            .unwrap_or(&[]);
        self.states.iter().zip(round.iter())
    }

    /// Round slices in increasing `fortnights_left` order.
    pub fn rounds(&self) -> &[Vec<PolicyEntry>] {
        &self.rounds
    }
}

/// Single-writer builder: the engine appends one complete round at a time.
pub struct PolicyTableBuilder {
    fingerprint: u64,
    states: Vec<VentureVector>,
    rounds: Vec<Vec<PolicyEntry>>,
}

impl PolicyTableBuilder {
    pub fn new(fingerprint: u64, states: Vec<VentureVector>) -> Self {
        Self {
            fingerprint,
            states,
            rounds: Vec::new(),
        }
    }

    pub fn states(&self) -> &[VentureVector] {
        &self.states
    }

    /// Number of completed rounds.
    pub fn rounds_completed(&self) -> usize {
        self.rounds.len()
    }

    /// The most recently completed round, used as the continuation slice.
    pub fn last_round(&self) -> Option<&[PolicyEntry]> {
        self.rounds.last().map(|r| r.as_slice())
    }

    /// Append a finished round. Its entries must be in StateSpace order.
    pub fn push_round(&mut self, entries: Vec<PolicyEntry>) {
        assert_eq!(
            entries.len(),
            self.states.len(),
            "round must hold one entry per state"
        );
        self.rounds.push(entries);
    }

    pub fn finish(self) -> Result<PolicyTable> {
        PolicyTable::from_parts(self.fingerprint, self.states, self.rounds)
    }
}

fn build_index(states: &[VentureVector]) -> HashMap<VentureVector, usize> {
    states
        .iter()
        .enumerate()
        .map(|(i, s)| (s.clone(), i))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn v(levels: &[u32]) -> VentureVector {
        VentureVector::new(levels.to_vec())
    }

    #[test]
    fn test_key_equality_is_positional() {
        let a = PolicyKey::new(v(&[1, 0]), 2);
        let b = PolicyKey::new(v(&[0, 1]), 2);
        let c = PolicyKey::new(v(&[1, 0]), 2);
        assert_ne!(a, b);
        assert_eq!(a, c);

        let set: HashSet<PolicyKey> = [a, b, c].into_iter().collect();
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_key_equality_includes_time() {
        assert_ne!(PolicyKey::new(v(&[1, 1]), 0), PolicyKey::new(v(&[1, 1]), 1));
    }

    #[test]
    fn test_combined_and_fits_within() {
        let funds = v(&[1, 2]).combined(&v(&[2, 0]));
        assert_eq!(funds, v(&[3, 2]));
        assert_eq!(funds.total(), 5);
        assert!(v(&[3, 0]).fits_within(&funds));
        assert!(!v(&[0, 3]).fits_within(&funds));
        assert_eq!(funds.to_string(), "[3, 2]");
    }

    #[test]
    fn test_builder_and_lookup() {
        let states = vec![v(&[0, 0]), v(&[0, 1]), v(&[1, 0])];
        let mut builder = PolicyTableBuilder::new(7, states);
        assert!(builder.last_round().is_none());

        builder.push_round(vec![
            PolicyEntry::idle(),
            PolicyEntry {
                action: Some(v(&[1, 0])),
                value: 2.5,
            },
            PolicyEntry::idle(),
        ]);
        builder.push_round(vec![PolicyEntry::idle(); 3]);
        assert_eq!(builder.rounds_completed(), 2);

        let table = builder.finish().unwrap();
        assert_eq!(table.horizon(), 1);
        assert_eq!(table.len(), 6);
        assert_eq!(table.fingerprint(), 7);

        let key = PolicyKey::new(v(&[0, 1]), 0);
        assert_eq!(table.get(&key).unwrap().value, 2.5);
        assert_eq!(table.optimal_action(&[0, 1], 0).unwrap(), Some(&v(&[1, 0])));
        assert_eq!(table.optimal_action(&[0, 0], 1).unwrap(), None);

        assert!(matches!(
            table.entry(&[5, 5], 0),
            Err(SolverError::NotFound { .. })
        ));
        assert!(matches!(
            table.entry(&[0, 0], 2),
            Err(SolverError::NotFound { .. })
        ));
    }

    #[test]
    fn test_from_parts_rejects_short_round() {
        let states = vec![v(&[0]), v(&[1])];
        let err = PolicyTable::from_parts(0, states, vec![vec![PolicyEntry::idle()]]);
        assert!(matches!(err, Err(SolverError::CorruptTable { .. })));
    }

    #[test]
    fn test_from_parts_rejects_empty_state_space() {
        let err = PolicyTable::from_parts(0, Vec::new(), vec![Vec::new(); 3]);
        assert!(matches!(err, Err(SolverError::CorruptTable { .. })));
    }
}
