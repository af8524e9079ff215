//! Skolemization preserves satisfiability and shows up in models

use relic::ast::{Decl, Decls, Expression, Formula, Relation, Variable};
use relic::config::Options;
use relic::instance::{Bounds, Universe};
use relic::solver::{Outcome, Solver};

fn solve(formula: &Formula, bounds: &Bounds, skolem_depth: i32) -> Outcome {
    let options = Options { skolem_depth, ..Options::default() };
    Solver::new(options).solve(formula, bounds).unwrap().outcome()
}

/// Trivial and solver-found outcomes agree up to triviality.
fn sat_equivalent(a: Outcome, b: Outcome) -> bool {
    let is_sat =
        |o: Outcome| matches!(o, Outcome::Satisfiable | Outcome::TriviallySatisfiable);
    is_sat(a) == is_sat(b)
}

fn setup() -> (Bounds, Relation, Relation) {
    let u = Universe::new(&["A", "B", "C", "D"]);
    let f = u.factory();
    let p = Relation::unary("P");
    let r = Relation::binary("r");
    let mut bounds = Bounds::new(u);
    bounds.bound(&p, f.tuple_set(&[&["A"]]), f.tuple_set(&[&["A"], &["B"], &["C"]]));
    bounds.bound(&r, f.none(2), f.all(2));
    (bounds, p, r)
}

#[test]
fn skolemization_preserves_outcomes() {
    let (bounds, p, r) = setup();
    let x = Variable::unary("x");
    let y = Variable::unary("y");

    let formulas = vec![
        // exists x: P | x->x in r
        Formula::exists(
            Decls::from(Decl::one_of(&x, Expression::from(&p))),
            Expression::from(&x)
                .product(Expression::from(&x))
                .in_set(Expression::from(&r)),
        ),
        // all x: P | exists y: P | x->y in r
        Formula::forall(
            Decls::from(Decl::one_of(&x, Expression::from(&p))),
            Formula::exists(
                Decls::from(Decl::one_of(&y, Expression::from(&p))),
                Expression::from(&x)
                    .product(Expression::from(&y))
                    .in_set(Expression::from(&r)),
            ),
        ),
        // !(all x: P | x->x in r)
        Formula::forall(
            Decls::from(Decl::one_of(&x, Expression::from(&p))),
            Expression::from(&x)
                .product(Expression::from(&x))
                .in_set(Expression::from(&r)),
        )
        .not(),
        // an unsatisfiable existential: exists x: P | x not in P
        Formula::exists(
            Decls::from(Decl::one_of(&x, Expression::from(&p))),
            Expression::from(&x).in_set(Expression::from(&p)).not(),
        ),
    ];

    for formula in &formulas {
        let unskolemized = solve(formula, &bounds, -1);
        let shallow = solve(formula, &bounds, 0);
        let deep = solve(formula, &bounds, 2);
        assert!(
            sat_equivalent(unskolemized, shallow),
            "depth 0 changed the outcome of {:?}: {:?} vs {:?}",
            formula,
            unskolemized,
            shallow
        );
        assert!(
            sat_equivalent(unskolemized, deep),
            "depth 2 changed the outcome of {:?}: {:?} vs {:?}",
            formula,
            unskolemized,
            deep
        );
    }
}

#[test]
fn skolem_constants_appear_in_the_model() {
    let (bounds, p, r) = setup();
    let x = Variable::unary("x");

    let formula = Formula::exists(
        Decls::from(Decl::one_of(&x, Expression::from(&p))),
        Expression::from(&x)
            .product(Expression::from(&x))
            .in_set(Expression::from(&r)),
    );

    let solution = Solver::new(Options::default()).solve(&formula, &bounds).unwrap();
    assert!(solution.is_sat());

    let instance = solution.instance().unwrap();
    let skolem = instance
        .relations()
        .find(|rel| rel.name() == "$x")
        .cloned()
        .expect("the skolem constant belongs to the instance");
    // the witness is a single atom drawn from P's upper bound
    let witness = instance.tuples(&skolem).unwrap();
    assert_eq!(witness.size(), 1);
}

#[test]
fn skolem_function_under_a_universal() {
    let (bounds, p, r) = setup();
    let x = Variable::unary("x");
    let y = Variable::unary("y");

    let formula = Formula::forall(
        Decls::from(Decl::one_of(&x, Expression::from(&p))),
        Formula::exists(
            Decls::from(Decl::one_of(&y, Expression::from(&p))),
            Expression::from(&x)
                .product(Expression::from(&y))
                .in_set(Expression::from(&r)),
        ),
    );

    let options = Options { skolem_depth: 1, ..Options::default() };
    let solution = Solver::new(options).solve(&formula, &bounds).unwrap();
    assert!(solution.is_sat());

    let instance = solution.instance().unwrap();
    let skolem = instance
        .relations()
        .find(|rel| rel.name() == "$y")
        .cloned()
        .expect("the skolem function belongs to the instance");
    assert_eq!(skolem.arity(), 2);
}

#[test]
fn disabled_skolemization_still_solves_existentials() {
    let (bounds, p, r) = setup();
    let x = Variable::unary("x");

    let formula = Formula::exists(
        Decls::from(Decl::one_of(&x, Expression::from(&p))),
        Expression::from(&x)
            .product(Expression::from(&x))
            .in_set(Expression::from(&r)),
    );

    let options = Options { skolem_depth: -1, ..Options::default() };
    let solution = Solver::new(options).solve(&formula, &bounds).unwrap();
    assert!(solution.is_sat());
    // no skolem relation was introduced
    assert!(solution
        .instance()
        .unwrap()
        .relations()
        .all(|rel| !rel.name().starts_with('$')));
}
