//! End-to-end integer constraints: cardinality, sums, and comparisons

use relic::ast::{Expression, IntExpression, Relation};
use relic::config::Options;
use relic::engine::Evaluator;
use relic::instance::{Bounds, Universe};
use relic::solver::{Outcome, Solver};

/// A universe whose atoms 0..4 are bound to their own values.
fn numeric_bounds() -> (Bounds, Relation) {
    let u = Universe::new(&["0", "1", "2", "3", "4"]);
    let f = u.factory();
    let set = Relation::unary("set");
    let mut bounds = Bounds::new(u);
    bounds.bound(&set, f.none(1), f.all(1));
    for i in 0..5 {
        let name = i.to_string();
        bounds.bound_int(i, f.tuple_set(&[&[name.as_str()]]));
    }
    (bounds, set)
}

#[test]
fn cardinality_constraint_sat() {
    let (bounds, set) = numeric_bounds();
    let formula = Expression::from(&set).count().eq(IntExpression::constant(3));
    let solution = Solver::new(Options::default()).solve(&formula, &bounds).unwrap();

    assert_eq!(solution.outcome(), Outcome::Satisfiable);
    let instance = solution.instance().unwrap();
    assert_eq!(instance.tuples(&set).unwrap().size(), 3);
}

#[test]
fn cardinality_constraint_unsat() {
    let (bounds, set) = numeric_bounds();
    // only five atoms exist
    let formula = Expression::from(&set).count().gte(IntExpression::constant(6));
    let solution = Solver::new(Options::default()).solve(&formula, &bounds).unwrap();
    assert!(solution.is_unsat());
}

#[test]
fn sum_of_chosen_atoms() {
    let (bounds, set) = numeric_bounds();
    // the sum of the chosen values is exactly 7, and 0 is excluded
    let formula = Expression::from(&set)
        .sum()
        .eq(IntExpression::constant(7))
        .and(
            IntExpression::constant(0)
                .to_expression()
                .intersection(Expression::from(&set))
                .no(),
        );
    let solution = Solver::new(Options::default()).solve(&formula, &bounds).unwrap();

    assert_eq!(solution.outcome(), Outcome::Satisfiable);
    let instance = solution.instance().unwrap();
    let mut evaluator = Evaluator::new(instance, &Options::default());
    assert_eq!(
        evaluator
            .evaluate_int(&Expression::from(&set).sum())
            .unwrap(),
        7
    );
    assert!(!instance.tuples(&set).unwrap().contains_index(0));
}

#[test]
fn constant_arithmetic_is_trivial() {
    let u = Universe::new(&["A"]);
    let bounds = Bounds::new(u);
    let solver = Solver::new(Options { bitwidth: 8, ..Options::default() });

    // (3 + 4) * 2 = 14 folds away entirely
    let formula = IntExpression::constant(3)
        .plus(IntExpression::constant(4))
        .multiply(IntExpression::constant(2))
        .eq(IntExpression::constant(14));
    let solution = solver.solve(&formula, &bounds).unwrap();
    assert_eq!(solution.outcome(), Outcome::TriviallySatisfiable);

    let formula = IntExpression::constant(10)
        .divide(IntExpression::constant(3))
        .eq(IntExpression::constant(4));
    let solution = solver.solve(&formula, &bounds).unwrap();
    assert_eq!(solution.outcome(), Outcome::TriviallyUnsatisfiable);
}

#[test]
fn int_cast_round_trip() {
    let (bounds, set) = numeric_bounds();
    // set = {2} expressed through the int cast
    let formula = Expression::from(&set)
        .equals(IntExpression::constant(2).to_expression());
    let solution = Solver::new(Options::default()).solve(&formula, &bounds).unwrap();

    assert_eq!(solution.outcome(), Outcome::Satisfiable);
    let instance = solution.instance().unwrap();
    let tuples = instance.tuples(&set).unwrap();
    assert_eq!(tuples.size(), 1);
    assert!(tuples.contains_index(2));
}

#[test]
fn comparisons_respect_two_complement_wrapping() {
    let u = Universe::new(&["A"]);
    let bounds = Bounds::new(u);
    // at bitwidth 4, 7 + 1 wraps negative
    let solver = Solver::new(Options::default());
    let formula = IntExpression::constant(7)
        .plus(IntExpression::constant(1))
        .lt(IntExpression::constant(0));
    let solution = solver.solve(&formula, &bounds).unwrap();
    assert_eq!(solution.outcome(), Outcome::TriviallySatisfiable);
}
