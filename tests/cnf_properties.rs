//! Equisatisfiability of the definitional CNF
//!
//! For random small circuits and every assignment of the primary variables,
//! the CNF (with the primaries fixed by unit clauses) is satisfiable exactly
//! when the circuit evaluates to true.

use proptest::prelude::*;

use relic::bool::{BoolValue, BooleanFactory, GateOp};
use relic::cnf::clausify;
use relic::engine::{MockSolver, RustSatAdapter, SatSolver};
use rustsat_batsat::BasicSolver;

const VARS: u32 = 4;

/// A circuit description independent of any factory.
#[derive(Debug, Clone)]
enum Shape {
    Var(u32),
    Not(Box<Shape>),
    And(Box<Shape>, Box<Shape>),
    Or(Box<Shape>, Box<Shape>),
    Ite(Box<Shape>, Box<Shape>, Box<Shape>),
}

fn shapes() -> impl Strategy<Value = Shape> {
    let leaf = (1..=VARS).prop_map(Shape::Var);
    leaf.prop_recursive(4, 32, 3, |inner| {
        prop_oneof![
            inner.clone().prop_map(|s| Shape::Not(Box::new(s))),
            (inner.clone(), inner.clone())
                .prop_map(|(a, b)| Shape::And(Box::new(a), Box::new(b))),
            (inner.clone(), inner.clone())
                .prop_map(|(a, b)| Shape::Or(Box::new(a), Box::new(b))),
            (inner.clone(), inner.clone(), inner)
                .prop_map(|(c, t, e)| Shape::Ite(Box::new(c), Box::new(t), Box::new(e))),
        ]
    })
}

fn build(shape: &Shape, f: &BooleanFactory) -> BoolValue {
    match shape {
        Shape::Var(v) => f.variable(*v),
        Shape::Not(s) => f.not(build(s, f)),
        Shape::And(a, b) => f.and(build(a, f), build(b, f)),
        Shape::Or(a, b) => f.or(build(a, f), build(b, f)),
        Shape::Ite(c, t, e) => f.ite(build(c, f), build(t, f), build(e, f)),
    }
}

/// Reference semantics of a shape, independent of the circuit layer.
fn eval_shape(shape: &Shape, assignment: &[bool]) -> bool {
    match shape {
        Shape::Var(v) => assignment[(*v - 1) as usize],
        Shape::Not(s) => !eval_shape(s, assignment),
        Shape::And(a, b) => eval_shape(a, assignment) && eval_shape(b, assignment),
        Shape::Or(a, b) => eval_shape(a, assignment) || eval_shape(b, assignment),
        Shape::Ite(c, t, e) => {
            if eval_shape(c, assignment) {
                eval_shape(t, assignment)
            } else {
                eval_shape(e, assignment)
            }
        }
    }
}

/// Evaluates a circuit under an assignment of the primary variables.
fn eval(value: &BoolValue, assignment: &[bool]) -> bool {
    match value {
        BoolValue::True => true,
        BoolValue::False => false,
        BoolValue::Var(v) => assignment[(*v - 1) as usize],
        BoolValue::Not(inner) => !eval(inner, assignment),
        BoolValue::Gate(gate) => match gate.op() {
            GateOp::And(inputs) => inputs.iter().all(|i| eval(i, assignment)),
            GateOp::Or(inputs) => inputs.iter().any(|i| eval(i, assignment)),
            GateOp::Ite { condition, then_value, else_value } => {
                if eval(condition, assignment) {
                    eval(then_value, assignment)
                } else {
                    eval(else_value, assignment)
                }
            }
        },
    }
}

/// Decides the recorded clauses with the primary variables pinned.
fn cnf_sat_under(clauses: &[Vec<i32>], total_vars: u32, assignment: &[bool]) -> bool {
    let mut solver = RustSatAdapter::new(BasicSolver::default());
    solver.add_variables(total_vars);
    for clause in clauses {
        solver.add_clause(clause);
    }
    for (i, &value) in assignment.iter().enumerate() {
        let lit = (i + 1) as i32;
        solver.add_clause(&[if value { lit } else { -lit }]);
    }
    solver.solve().unwrap()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn definitional_cnf_is_equisatisfiable(shape in shapes()) {
        let factory = BooleanFactory::new(VARS, true, 4);
        let circuit = build(&shape, &factory);

        let mut recorder = MockSolver::new();
        let constant = circuit.as_constant();
        if constant.is_none() {
            clausify(&circuit, VARS, &mut recorder);
        }

        for bits in 0..(1u32 << VARS) {
            let assignment: Vec<bool> = (0..VARS).map(|i| bits & (1 << i) != 0).collect();
            let expected = eval_shape(&shape, &assignment);
            match constant {
                Some(folded) => prop_assert_eq!(expected, folded),
                None => {
                    let actual = cnf_sat_under(
                        recorder.clauses(),
                        recorder.num_variables(),
                        &assignment,
                    );
                    prop_assert_eq!(
                        expected, actual,
                        "assignment {:?} disagrees for {:?}", assignment, shape
                    );
                }
            }
        }
    }

    #[test]
    fn folding_preserves_semantics(shape in shapes()) {
        // the factory's folding and interning must not change the function
        let shared = BooleanFactory::new(VARS, true, 4);
        let unshared = BooleanFactory::new(VARS, false, 4);
        let a = build(&shape, &shared);
        let b = build(&shape, &unshared);

        for bits in 0..(1u32 << VARS) {
            let assignment: Vec<bool> = (0..VARS).map(|i| bits & (1 << i) != 0).collect();
            let reference = eval_shape(&shape, &assignment);
            prop_assert_eq!(eval(&a, &assignment), reference);
            prop_assert_eq!(eval(&b, &assignment), reference);
        }
    }
}
