//! Pigeonhole principle: n pigeons cannot nest injectively in fewer holes

use relic::ast::{Decl, Decls, Expression, Formula, Relation, Variable};
use relic::config::Options;
use relic::engine::Evaluator;
use relic::instance::{Bounds, Universe};
use relic::solver::{Outcome, Solver};

struct Pigeonhole {
    pigeon: Relation,
    hole: Relation,
    nest: Relation,
}

impl Pigeonhole {
    fn new() -> Self {
        Self {
            pigeon: Relation::unary("Pigeon"),
            hole: Relation::unary("Hole"),
            nest: Relation::binary("nest"),
        }
    }

    /// Every pigeon nests in exactly one hole, and no two pigeons share.
    fn invariants(&self) -> Formula {
        let p = Variable::unary("p");
        let q = Variable::unary("q");

        let total = Formula::forall(
            Decls::from(Decl::one_of(&p, Expression::from(&self.pigeon))),
            Expression::from(&p).join(Expression::from(&self.nest)).one(),
        );

        let disjoint = Formula::forall(
            Decls::from(Decl::one_of(&p, Expression::from(&self.pigeon)))
                .and(Decl::one_of(&q, Expression::from(&self.pigeon))),
            Expression::from(&p)
                .equals(Expression::from(&q))
                .not()
                .implies(
                    Expression::from(&p)
                        .join(Expression::from(&self.nest))
                        .intersection(Expression::from(&q).join(Expression::from(&self.nest)))
                        .no(),
                ),
        );

        total.and(disjoint)
    }

    fn bounds(&self, pigeons: usize, holes: usize) -> Bounds {
        let pigeon_atoms: Vec<String> = (0..pigeons).map(|i| format!("Pigeon{}", i)).collect();
        let hole_atoms: Vec<String> = (0..holes).map(|i| format!("Hole{}", i)).collect();
        let atoms: Vec<&str> = pigeon_atoms
            .iter()
            .chain(hole_atoms.iter())
            .map(String::as_str)
            .collect();
        let universe = Universe::new(&atoms);
        let factory = universe.factory();

        let pigeon_rows: Vec<Vec<&str>> = pigeon_atoms.iter().map(|a| vec![a.as_str()]).collect();
        let pigeon_refs: Vec<&[&str]> = pigeon_rows.iter().map(Vec::as_slice).collect();
        let hole_rows: Vec<Vec<&str>> = hole_atoms.iter().map(|a| vec![a.as_str()]).collect();
        let hole_refs: Vec<&[&str]> = hole_rows.iter().map(Vec::as_slice).collect();

        let pigeons_set = factory.tuple_set(&pigeon_refs);
        let holes_set = factory.tuple_set(&hole_refs);

        let mut bounds = Bounds::new(universe);
        bounds.bound_exactly(&self.pigeon, pigeons_set.clone());
        bounds.bound_exactly(&self.hole, holes_set.clone());
        bounds.bound(&self.nest, factory.none(2), pigeons_set.product(&holes_set));
        bounds
    }
}

#[test]
fn four_pigeons_three_holes_unsat() {
    let model = Pigeonhole::new();
    let bounds = model.bounds(4, 3);
    let solution = Solver::new(Options::default())
        .solve(&model.invariants(), &bounds)
        .unwrap();
    assert_eq!(solution.outcome(), Outcome::Unsatisfiable);
}

#[test]
fn three_pigeons_three_holes_sat() {
    let model = Pigeonhole::new();
    let bounds = model.bounds(3, 3);
    let formula = model.invariants();
    let solution = Solver::new(Options::default()).solve(&formula, &bounds).unwrap();
    assert_eq!(solution.outcome(), Outcome::Satisfiable);

    // the model really satisfies the invariants
    let instance = solution.instance().unwrap();
    let mut evaluator = Evaluator::new(instance, &Options::default());
    assert!(evaluator.evaluate(&formula).unwrap());
    assert_eq!(instance.tuples(&model.nest).unwrap().size(), 3);
}
