//! Trivial formula detection: constants never reach the SAT solver

use relic::ast::{Expression, Formula, Relation};
use relic::config::Options;
use relic::instance::{Bounds, Universe};
use relic::solver::{Outcome, Solver};

fn empty_stats(solution: &relic::Solution) {
    let stats = solution.statistics();
    assert_eq!(stats.primary_variables(), 0);
    assert_eq!(stats.num_variables(), 0);
    assert_eq!(stats.num_clauses(), 0);
}

#[test]
fn constant_formulas() {
    let u = Universe::new(&["A"]);
    let bounds = Bounds::new(u);
    let solver = Solver::new(Options::default());

    let sat = solver.solve(&Formula::TRUE, &bounds).unwrap();
    assert_eq!(sat.outcome(), Outcome::TriviallySatisfiable);
    empty_stats(&sat);

    let unsat = solver.solve(&Formula::FALSE, &bounds).unwrap();
    assert_eq!(unsat.outcome(), Outcome::TriviallyUnsatisfiable);
    empty_stats(&unsat);
}

#[test]
fn tautology_folds_during_translation() {
    let u = Universe::new(&["A", "B"]);
    let f = u.factory();
    let r = Relation::unary("r");
    let mut bounds = Bounds::new(u);
    bounds.bound(&r, f.none(1), f.all(1));

    // r in r folds cell by cell to true
    let formula = Expression::from(&r).in_set(Expression::from(&r));
    let solution = Solver::new(Options::default()).solve(&formula, &bounds).unwrap();
    assert_eq!(solution.outcome(), Outcome::TriviallySatisfiable);
    empty_stats(&solution);
}

#[test]
fn contradiction_folds_during_translation() {
    let u = Universe::new(&["A", "B"]);
    let f = u.factory();
    let r = Relation::unary("r");
    let mut bounds = Bounds::new(u);
    bounds.bound(&r, f.none(1), f.all(1));

    let formula = Expression::from(&r).equals(Expression::from(&r)).not();
    let solution = Solver::new(Options::default()).solve(&formula, &bounds).unwrap();
    assert_eq!(solution.outcome(), Outcome::TriviallyUnsatisfiable);
    empty_stats(&solution);
}

#[test]
fn exact_bounds_can_decide_a_formula() {
    let u = Universe::new(&["A", "B", "C"]);
    let f = u.factory();
    let r = Relation::unary("r");
    let s = Relation::unary("s");
    let mut bounds = Bounds::new(u);
    bounds.bound_exactly(&r, f.tuple_set(&[&["A"]]));
    bounds.bound_exactly(&s, f.tuple_set(&[&["A"], &["B"]]));

    // r in s holds in the single possible instance
    let holds = Expression::from(&r).in_set(Expression::from(&s));
    let solution = Solver::new(Options::default()).solve(&holds, &bounds).unwrap();
    assert_eq!(solution.outcome(), Outcome::TriviallySatisfiable);

    // and the trivially satisfying instance carries the exact bounds
    let instance = solution.instance().unwrap();
    assert_eq!(instance.tuples(&r).unwrap(), bounds.lower_bound(&r).unwrap());
    assert_eq!(instance.tuples(&s).unwrap(), bounds.lower_bound(&s).unwrap());

    // s in r fails in the single possible instance
    let fails = Expression::from(&s).in_set(Expression::from(&r));
    let solution = Solver::new(Options::default()).solve(&fails, &bounds).unwrap();
    assert_eq!(solution.outcome(), Outcome::TriviallyUnsatisfiable);
}

#[test]
fn trivially_satisfiable_instances_pad_unrelated_relations() {
    let u = Universe::new(&["A", "B"]);
    let f = u.factory();
    let r = Relation::unary("r");
    let other = Relation::unary("other");
    let mut bounds = Bounds::new(u);
    bounds.bound_exactly(&r, f.tuple_set(&[&["A"]]));
    bounds.bound(&other, f.tuple_set(&[&["B"]]), f.all(1));

    let solution = Solver::new(Options::default())
        .solve(&Expression::from(&r).some(), &bounds)
        .unwrap();
    assert_eq!(solution.outcome(), Outcome::TriviallySatisfiable);

    let instance = solution.instance().unwrap();
    assert_eq!(
        instance.tuples(&other).unwrap(),
        bounds.lower_bound(&other).unwrap()
    );
}
