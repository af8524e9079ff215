//! Determinism of the translation: identical inputs yield identical
//! variable and clause counts, with primary variables numbered by bounds
//! insertion order

use relic::ast::{Decl, Decls, Expression, Formula, Relation, Variable};
use relic::config::Options;
use relic::engine::MockSolver;
use relic::instance::{Bounds, Universe};
use relic::translator::{translate, Translated};

fn counts(formula: &Formula, bounds: &Bounds, options: &Options) -> (u32, u32, u32) {
    let mut solver = MockSolver::new();
    match translate(formula, bounds, options, &mut solver).unwrap() {
        Translated::Cnf(t) => (t.num_primary_variables(), t.num_variables(), t.num_clauses()),
        Translated::Trivial { .. } => panic!("expected a non-trivial translation"),
    }
}

fn ring_formula(node: &Relation, next: &Relation) -> Formula {
    let n = Variable::unary("n");
    let closed = Expression::from(next).in_set(Expression::from(node).product(Expression::from(node)));
    let successor = Formula::forall(
        Decls::from(Decl::one_of(&n, Expression::from(node))),
        Expression::from(&n).join(Expression::from(next)).one(),
    );
    let reaches_all = Formula::forall(
        Decls::from(Decl::one_of(&n, Expression::from(node))),
        Expression::from(&n)
            .join(Expression::from(next).closure())
            .equals(Expression::from(node)),
    );
    closed.and(successor).and(reaches_all)
}

fn ring_bounds(size: usize) -> (Bounds, Relation, Relation) {
    let atoms: Vec<String> = (0..size).map(|i| format!("N{}", i)).collect();
    let refs: Vec<&str> = atoms.iter().map(String::as_str).collect();
    let universe = Universe::new(&refs);
    let f = universe.factory();

    let node = Relation::unary("Node");
    let next = Relation::binary("next");
    let mut bounds = Bounds::new(universe);
    bounds.bound_exactly(&node, f.all(1));
    bounds.bound(&next, f.none(2), f.all(2));
    (bounds, node, next)
}

#[test]
fn repeated_translations_are_identical() {
    let (bounds, node, next) = ring_bounds(4);
    let formula = ring_formula(&node, &next);
    let options = Options::default();

    let first = counts(&formula, &bounds, &options);
    let second = counts(&formula, &bounds, &options);
    let third = counts(&formula, &bounds, &options);
    assert_eq!(first, second);
    assert_eq!(second, third);
    // 16 possible next-tuples, all free
    assert_eq!(first.0, 16);
}

#[test]
fn rebuilt_problems_translate_identically() {
    // building the same problem twice from scratch must yield the same
    // counts: numbering depends only on bounds order and tuple order
    let build = || {
        let (bounds, node, next) = ring_bounds(3);
        let formula = ring_formula(&node, &next);
        counts(&formula, &bounds, &Options::default())
    };
    assert_eq!(build(), build());
}

#[test]
fn primary_variables_follow_bounds_insertion_order() {
    let u = Universe::new(&["A", "B"]);
    let f = u.factory();
    let r = Relation::unary("r");
    let s = Relation::unary("s");

    let mut rs = Bounds::new(u.clone());
    rs.bound(&r, f.none(1), f.all(1));
    rs.bound(&s, f.none(1), f.all(1));

    let mut sr = Bounds::new(u);
    sr.bound(&s, f.none(1), f.all(1));
    sr.bound(&r, f.none(1), f.all(1));

    let formula = Expression::from(&r).some().and(Expression::from(&s).no());

    let mut solver = MockSolver::new();
    let Ok(Translated::Cnf(t_rs)) = translate(&formula, &rs, &Options::default(), &mut solver)
    else {
        panic!("expected a cnf");
    };
    let mut solver = MockSolver::new();
    let Ok(Translated::Cnf(t_sr)) = translate(&formula, &sr, &Options::default(), &mut solver)
    else {
        panic!("expected a cnf");
    };

    assert_eq!(t_rs.primary_variables(&r), Some(1..3));
    assert_eq!(t_rs.primary_variables(&s), Some(3..5));
    assert_eq!(t_sr.primary_variables(&s), Some(1..3));
    assert_eq!(t_sr.primary_variables(&r), Some(3..5));
}

#[test]
fn skolemized_translations_are_deterministic() {
    let (bounds, node, next) = ring_bounds(3);
    let x = Variable::unary("x");
    let y = Variable::unary("y");
    let formula = Formula::forall(
        Decls::from(Decl::one_of(&x, Expression::from(&node))),
        Formula::exists(
            Decls::from(Decl::one_of(&y, Expression::from(&node))),
            Expression::from(&x)
                .product(Expression::from(&y))
                .in_set(Expression::from(&next)),
        ),
    );

    let options = Options { skolem_depth: 1, ..Options::default() };
    let first = counts(&formula, &bounds, &options);
    let second = counts(&formula, &bounds, &options);
    assert_eq!(first, second);
    // the skolem function adds 9 primaries on top of next's 9
    assert_eq!(first.0, 18);
}

#[test]
fn sharing_detection_does_not_change_counts_across_runs() {
    let (bounds, node, next) = ring_bounds(3);
    // a deliberately shared subexpression
    let hops = Expression::from(&next).closure();
    let formula = Expression::from(&node)
        .in_set(Expression::from(&node).join(hops.clone()))
        .and(Expression::from(&node).join(hops).some());

    let options = Options::default();
    assert_eq!(counts(&formula, &bounds, &options), counts(&formula, &bounds, &options));
}
