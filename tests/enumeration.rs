//! Solution enumeration: all distinct models, then unsat

use std::collections::HashSet;

use relic::ast::{Expression, Relation};
use relic::config::Options;
use relic::instance::{Bounds, Universe};
use relic::solver::{Outcome, Solution, Solver};

#[test]
fn enumerates_every_subset() {
    let u = Universe::new(&["A", "B", "C"]);
    let f = u.factory();
    let r = Relation::unary("r");
    let mut bounds = Bounds::new(u);
    bounds.bound(&r, f.none(1), f.all(1));

    // some r: 2^3 - 1 nonempty subsets
    let formula = Expression::from(&r).some();
    let solver = Solver::new(Options::default());

    let mut seen = HashSet::new();
    let mut last = None;
    for solution in solver.solve_all(&formula, &bounds) {
        let solution = solution.unwrap();
        if let Some(instance) = solution.instance() {
            let atoms: Vec<usize> = instance.tuples(&r).unwrap().indices().collect();
            assert!(seen.insert(atoms), "duplicate model");
        }
        last = Some(solution.outcome());
        assert!(seen.len() <= 7, "enumeration must terminate");
    }
    assert_eq!(seen.len(), 7);
    assert_eq!(last, Some(Outcome::Unsatisfiable));
}

#[test]
fn exactly_one_model_per_atom() {
    let u = Universe::new(&["A", "B", "C", "D"]);
    let f = u.factory();
    let r = Relation::unary("r");
    let mut bounds = Bounds::new(u);
    bounds.bound(&r, f.none(1), f.all(1));

    let formula = Expression::from(&r).one();
    let solver = Solver::new(Options::default());
    let solutions: Vec<Solution> = solver
        .solve_all(&formula, &bounds)
        .map(|s| s.unwrap())
        .collect();

    // four singletons and the closing unsat
    assert_eq!(solutions.len(), 5);
    assert!(solutions[..4].iter().all(Solution::is_sat));
    assert_eq!(solutions[4].outcome(), Outcome::Unsatisfiable);
}

#[test]
fn unsat_formula_yields_one_element() {
    let u = Universe::new(&["A"]);
    let f = u.factory();
    let r = Relation::unary("r");
    let mut bounds = Bounds::new(u);
    bounds.bound(&r, f.none(1), f.all(1));

    let formula = Expression::from(&r).some().and(Expression::from(&r).no());
    let solver = Solver::new(Options::default());
    let solutions: Vec<Solution> = solver
        .solve_all(&formula, &bounds)
        .map(|s| s.unwrap())
        .collect();
    assert_eq!(solutions.len(), 1);
    assert_eq!(solutions[0].outcome(), Outcome::Unsatisfiable);
}

#[test]
fn trivial_models_are_blocked_through_bounds() {
    let u = Universe::new(&["A", "B"]);
    let f = u.factory();
    let r = Relation::unary("r");
    let mut bounds = Bounds::new(u);
    bounds.bound(&r, f.tuple_set(&[&["A"]]), f.all(1));

    // trivially satisfied by {A}; {A, B} remains after blocking
    let formula = Expression::from(&r).some();
    let solver = Solver::new(Options::default());

    let outcomes: Vec<Outcome> = solver
        .solve_all(&formula, &bounds)
        .map(|s| s.unwrap().outcome())
        .collect();
    assert_eq!(
        outcomes,
        vec![
            Outcome::TriviallySatisfiable,
            Outcome::Satisfiable,
            Outcome::Unsatisfiable
        ]
    );
}

#[test]
fn iterator_is_fused_after_unsat() {
    let u = Universe::new(&["A"]);
    let bounds = Bounds::new(u);
    let solver = Solver::new(Options::default());
    let mut iter = solver.solve_all(&relic::ast::Formula::FALSE, &bounds);
    assert!(iter.next().is_some());
    assert!(iter.next().is_none());
    assert!(iter.next().is_none());
}
