//! End-to-end tests for the offline computation and policy queries.
//!
//! Small problems with hand-computed optima, plus checks against the bundled
//! problem files under `problems/`.

use funding::lattice::enumerate_within;
use funding::problem::{ProblemSpec, Venture};
use funding::reward::RewardEvaluator;
use funding::state_computation::is_feasible;
use funding::transition::TransitionMatrix;
use funding::types::{PolicyKey, VentureVector};
use funding::{FundingSolver, SolverError};

fn v(levels: &[u32]) -> VentureVector {
    VentureVector::new(levels.to_vec())
}

fn assert_close(actual: f64, expected: f64) {
    assert!(
        (actual - expected).abs() < 1e-9,
        "expected {expected}, got {actual}"
    );
}

/// Two ventures, budgets 2/2. Venture 0 (price 10) has expected sales
/// 0 / 0.5 / 1.3 at funding 0 / 1 / 2; venture 1 (price 4) keeps its funding
/// with certainty, so its expected sales equal the funding level.
///
/// Terminal contributions:
///   venture 0: f=0 → -2.5, f=1 → 3.0, f=2 → 7.8
///   venture 1: f=0 → -1.0, f=1 → 2.4, f=2 → 4.8
fn hand_problem(fortnights: u32) -> ProblemSpec {
    ProblemSpec {
        ventures: vec![
            Venture {
                sale_price: 10.0,
                transitions: TransitionMatrix::new(vec![
                    vec![1.0, 0.0, 0.0],
                    vec![0.5, 0.5, 0.0],
                    vec![0.2, 0.3, 0.5],
                ]),
            },
            Venture {
                sale_price: 4.0,
                transitions: TransitionMatrix::identity(3),
            },
        ],
        max_manufacturing_funds: 2,
        max_additional_funding: 2,
        fortnights,
    }
}

fn solved(problem: ProblemSpec) -> FundingSolver {
    let mut solver = FundingSolver::new(problem).unwrap();
    solver.run_offline_computation().unwrap();
    solver
}

fn bundled(name: &str) -> ProblemSpec {
    let path = format!("{}/problems/{}", env!("CARGO_MANIFEST_DIR"), name);
    ProblemSpec::load(path).unwrap()
}

#[test]
fn test_terminal_round_hand_computed() {
    let solver = solved(hand_problem(0));

    let expected: [(&[u32], Option<VentureVector>, f64); 6] = [
        (&[0, 0], Some(v(&[2, 0])), 6.8),
        (&[0, 1], Some(v(&[1, 0])), 5.4),
        (&[0, 2], Some(v(&[0, 0])), 2.3),
        (&[1, 0], Some(v(&[1, 0])), 6.8),
        (&[1, 1], Some(v(&[0, 0])), 5.4),
        (&[2, 0], Some(v(&[0, 0])), 6.8),
    ];
    for (funding, action, value) in expected {
        let entry = solver.query_entry(funding, 0).unwrap();
        assert_eq!(entry.action, action, "funding {:?}", funding);
        assert_close(entry.value, value);
    }
}

#[test]
fn test_one_fortnight_query_hand_computed() {
    let solver = solved(hand_problem(1));

    // From [0, 0] with one fortnight left:
    //   [2,0]: 6.8 + (0.2 + 0.3 + 0.5) * 6.8 = 13.6
    //   [1,1]: 5.4 + 0.5 * 5.4 + 0.5 * 5.4   = 10.8
    //   [1,0]: 2.0 + 0.5 * 6.8 + 0.5 * 6.8   = 8.8
    assert_eq!(
        solver.query_optimal_action(&[0, 0], 1).unwrap(),
        Some(v(&[2, 0]))
    );
    assert_close(solver.query_value(&[0, 0], 1).unwrap(), 13.6);

    // From [0, 1] only totals ≤ 1 are affordable; [1,0] reaches [1,1]:
    //   5.4 + 0.5 * V0([0,1]) + 0.5 * V0([1,1]) = 10.8
    assert_eq!(
        solver.query_optimal_action(&[0, 1], 1).unwrap(),
        Some(v(&[1, 0]))
    );
    assert_close(solver.query_value(&[0, 1], 1).unwrap(), 10.8);

    // From [0, 2] nothing can be added: 2.3 + V0([0,2]) = 4.6
    assert_eq!(
        solver.query_optimal_action(&[0, 2], 1).unwrap(),
        Some(v(&[0, 0]))
    );
    assert_close(solver.query_value(&[0, 2], 1).unwrap(), 4.6);
}

#[test]
fn test_zero_funding_write_down() {
    let problem = ProblemSpec {
        ventures: vec![
            Venture {
                sale_price: 10.0,
                transitions: TransitionMatrix::identity(3),
            },
            Venture {
                sale_price: 20.0,
                transitions: TransitionMatrix::identity(3),
            },
        ],
        max_manufacturing_funds: 2,
        max_additional_funding: 2,
        fortnights: 0,
    };
    let eval = RewardEvaluator::new(&problem);
    assert_close(eval.terminal_value(&[0, 0], &[0, 0]), -7.5);
}

#[test]
fn test_zero_floor_leaves_state_idle() {
    // No venture ever sells: funded ventures earn 0, unfunded ones lose 25%.
    let never_sells = TransitionMatrix::new(vec![vec![1.0, 0.0, 0.0]; 3]);
    let problem = ProblemSpec {
        ventures: vec![
            Venture {
                sale_price: 10.0,
                transitions: never_sells.clone(),
            },
            Venture {
                sale_price: 20.0,
                transitions: never_sells,
            },
        ],
        max_manufacturing_funds: 2,
        max_additional_funding: 2,
        fortnights: 2,
    };
    let solver = solved(problem);
    let table = solver.table().unwrap();
    for t in 0..=2 {
        for (state, entry) in table.iter_round(t) {
            assert_eq!(entry.action, None, "state {} t={}", state, t);
            assert_eq!(entry.value, 0.0);
        }
    }
}

#[test]
fn test_missing_state_is_not_found() {
    let solver = solved(hand_problem(1));

    // Total above the manufacturing budget: never enumerated.
    assert!(matches!(
        solver.query_optimal_action(&[2, 2], 0),
        Err(SolverError::NotFound { .. })
    ));
    // Horizon beyond H.
    assert!(matches!(
        solver.query_optimal_action(&[0, 0], 2),
        Err(SolverError::NotFound { .. })
    ));
    // Wrong arity.
    assert!(matches!(
        solver.query_optimal_action(&[0, 0, 0], 0),
        Err(SolverError::NotFound { .. })
    ));
}

#[test]
fn test_completeness_and_feasibility_bronze() {
    let problem = bundled("bronze.json");
    let max_funds = problem.max_manufacturing_funds;
    let horizon = problem.fortnights;
    let solver = solved(problem);
    let table = solver.table().unwrap();

    assert_eq!(table.horizon(), horizon);
    assert_eq!(
        table.len(),
        solver.state_space().len() * (horizon as usize + 1)
    );

    for t in 0..=horizon {
        for state in solver.state_space() {
            let key = PolicyKey::new(state.clone(), t);
            let entry = table.get(&key).expect("every (state, t) is populated");
            if let Some(action) = &entry.action {
                assert!(is_feasible(state, action, max_funds));
                assert!(entry.value > 0.0);
            } else {
                assert_eq!(entry.value, 0.0);
            }
        }
    }
}

#[test]
fn test_terminal_correctness_gold() {
    let problem = bundled("gold.json");
    let solver = solved(problem.clone());
    let eval = RewardEvaluator::new(&problem);
    let actions = enumerate_within(3, problem.max_additional_funding);

    for state in solver.state_space() {
        let entry = solver.query_entry(state, 0).unwrap();
        if let Some(action) = &entry.action {
            assert_close(entry.value, eval.terminal_value(state, action));
        }
        for action in actions
            .iter()
            .filter(|a| is_feasible(state, a, problem.max_manufacturing_funds))
        {
            assert!(entry.value >= eval.terminal_value(state, action) - 1e-12);
        }
    }
}

#[test]
fn test_determinism() {
    let a = solved(bundled("gold.json"));
    let b = solved(bundled("gold.json"));
    let (ta, tb) = (a.table().unwrap(), b.table().unwrap());
    assert_eq!(ta.states(), tb.states());
    for (ra, rb) in ta.rounds().iter().zip(tb.rounds()) {
        for (ea, eb) in ra.iter().zip(rb) {
            assert_eq!(ea.action, eb.action);
            assert_eq!(ea.value.to_bits(), eb.value.to_bits());
        }
    }
}

#[test]
fn test_values_grow_with_horizon() {
    // With non-negative continuation values, an extra fortnight never hurts.
    let solver = solved(bundled("bronze.json"));
    let table = solver.table().unwrap();
    for state in solver.state_space() {
        for t in 1..=table.horizon() {
            let now = table.entry(state, t).unwrap().value;
            let before = table.entry(state, t - 1).unwrap().value;
            assert!(now >= before - 1e-12, "state {} t={}", state, t);
        }
    }
}
