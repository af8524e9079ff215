//! Definitional translation of circuits to CNF
//!
//! Two passes over the gate DAG. The first records, per gate, the set of
//! polarities under which it is reachable from the root. The second emits
//! defining clauses, but only the halves the observed polarities require: a
//! gate seen only positively gets the clauses that force its inputs when the
//! gate is asserted, and dually. A final unit clause asserts the root
//! literal.

use rustc_hash::FxHashSet;

use crate::bool::{BoolValue, Gate, GateOp};
use crate::engine::SatSolver;

const POS: u8 = 1;
const NEG: u8 = 2;

/// Clausifies `root` into `solver` and returns the asserted root literal.
///
/// `num_primary` is the number of primary variables allocated by the
/// relational translation; gate labels start above it, and the solver's
/// vocabulary is grown to `max(num_primary, |root label|)` before any clause
/// is added.
///
/// # Panics
/// Panics if `root` is a constant; trivial circuits never reach CNF.
pub fn clausify<S: SatSolver>(root: &BoolValue, num_primary: u32, solver: &mut S) -> i32 {
    assert!(!root.is_constant(), "constant circuits are handled before clausification");
    let max_literal = root.label().unsigned_abs();
    solver.add_variables(num_primary.max(max_literal));

    let root_literal = if max_literal > num_primary {
        let mut polarity = PolarityDetector::new(num_primary, max_literal);
        polarity.apply(root);
        let mut translator = Definitional {
            solver,
            polarity,
            visited: FxHashSet::default(),
        };
        translator.literal(root)
    } else {
        // a bare (possibly negated) primary variable
        root.label()
    };

    solver.add_clause(&[root_literal]);
    root_literal
}

/// Records, for every gate reachable from the root, the polarities it was
/// reached under. Gate labels are contiguous above the primary variables, so
/// the state is a flat byte array indexed by `label - offset`.
struct PolarityDetector {
    offset: u32,
    flags: Vec<u8>,
}

impl PolarityDetector {
    fn new(num_primary: u32, max_literal: u32) -> Self {
        Self {
            offset: num_primary + 1,
            flags: vec![0; (max_literal - num_primary) as usize],
        }
    }

    fn apply(&mut self, root: &BoolValue) {
        self.visit(root, POS);
    }

    fn positive(&self, label: i32) -> bool {
        self.flags[(label as u32 - self.offset) as usize] & POS != 0
    }

    fn negative(&self, label: i32) -> bool {
        self.flags[(label as u32 - self.offset) as usize] & NEG != 0
    }

    fn visit(&mut self, value: &BoolValue, polarity: u8) {
        match value {
            BoolValue::True | BoolValue::False | BoolValue::Var(_) => {}
            BoolValue::Not(inner) => {
                let flipped = ((polarity & POS) << 1) | ((polarity & NEG) >> 1);
                self.visit(inner, flipped);
            }
            BoolValue::Gate(gate) => {
                let slot = (gate.label() as u32 - self.offset) as usize;
                let seen = self.flags[slot];
                if seen | polarity == seen {
                    return;
                }
                self.flags[slot] = seen | polarity;
                match gate.op() {
                    GateOp::And(inputs) | GateOp::Or(inputs) => {
                        for input in inputs {
                            self.visit(input, polarity);
                        }
                    }
                    GateOp::Ite { condition, then_value, else_value } => {
                        // the condition is effectively under both polarities
                        self.visit(condition, POS | NEG);
                        self.visit(then_value, polarity);
                        self.visit(else_value, polarity);
                    }
                }
            }
        }
    }
}

struct Definitional<'a, S> {
    solver: &'a mut S,
    polarity: PolarityDetector,
    visited: FxHashSet<i32>,
}

impl<S: SatSolver> Definitional<'_, S> {
    /// Returns the CNF literal for a value, emitting the defining clauses of
    /// any gate not yet visited.
    fn literal(&mut self, value: &BoolValue) -> i32 {
        match value {
            BoolValue::Var(v) => *v as i32,
            BoolValue::Not(inner) => -self.literal(inner),
            BoolValue::Gate(gate) => {
                self.visit_gate(gate);
                gate.label()
            }
            BoolValue::True | BoolValue::False => {
                unreachable!("constants are folded before reaching a gate input")
            }
        }
    }

    fn visit_gate(&mut self, gate: &Gate) {
        let output = gate.label();
        if !self.visited.insert(output) {
            return;
        }
        match gate.op() {
            GateOp::And(inputs) => self.multi_gate(output, inputs, 1),
            GateOp::Or(inputs) => self.multi_gate(output, inputs, -1),
            GateOp::Ite { condition, then_value, else_value } => {
                let c = self.literal(condition);
                let t = self.literal(then_value);
                let e = self.literal(else_value);
                if self.polarity.positive(output) {
                    self.solver.add_clause(&[-c, t, -output]);
                    self.solver.add_clause(&[c, e, -output]);
                }
                if self.polarity.negative(output) {
                    self.solver.add_clause(&[-c, -t, output]);
                    self.solver.add_clause(&[c, -e, output]);
                }
            }
        }
    }

    /// Emits the defining clauses of an AND (`sign` 1) or OR (`sign` -1)
    /// gate. The operators are dual: OR with a given polarity needs the
    /// clause shapes AND needs under the opposite one.
    fn multi_gate(&mut self, output: i32, inputs: &[BoolValue], sign: i32) {
        let (unit_half, long_half) = if sign == 1 {
            (self.polarity.positive(output), self.polarity.negative(output))
        } else {
            (self.polarity.negative(output), self.polarity.positive(output))
        };

        let mut long_clause = if long_half {
            Vec::with_capacity(inputs.len() + 1)
        } else {
            Vec::new()
        };
        for input in inputs {
            let lit = self.literal(input);
            if unit_half {
                self.solver.add_clause(&[lit * sign, -output * sign]);
            }
            if long_half {
                long_clause.push(-lit * sign);
            }
        }
        if long_half {
            long_clause.push(output * sign);
            self.solver.add_clause(&long_clause);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bool::BooleanFactory;
    use crate::engine::MockSolver;

    fn factory(vars: u32) -> BooleanFactory {
        BooleanFactory::new(vars, true, 4)
    }

    #[test]
    fn positive_and_emits_binary_clauses_only() {
        let f = factory(2);
        let root = f.and(f.variable(1), f.variable(2));

        let mut solver = MockSolver::new();
        let root_lit = clausify(&root, 2, &mut solver);

        assert_eq!(root_lit, 3);
        assert_eq!(solver.num_variables(), 3);
        // (-3 1) (-3 2) (3)
        assert_eq!(solver.clauses(), &[vec![1, -3], vec![2, -3], vec![3]]);
    }

    #[test]
    fn negated_and_emits_the_long_clause_only() {
        let f = factory(2);
        let root = f.not(f.and(f.variable(1), f.variable(2)));

        let mut solver = MockSolver::new();
        let root_lit = clausify(&root, 2, &mut solver);

        assert_eq!(root_lit, -3);
        assert_eq!(solver.clauses(), &[vec![-1, -2, 3], vec![-3]]);
    }

    #[test]
    fn positive_or_emits_the_long_clause_only() {
        let f = factory(2);
        let root = f.or(f.variable(1), f.variable(2));

        let mut solver = MockSolver::new();
        clausify(&root, 2, &mut solver);

        assert_eq!(solver.clauses(), &[vec![1, 2, -3], vec![3]]);
    }

    #[test]
    fn both_polarities_emit_both_halves() {
        let f = factory(2);
        let gate = f.and(f.variable(1), f.variable(2));
        // gate appears positively and negatively: gate | !gate is folded away
        // by the factory, so feed the two polarities through an OR of gate
        // with a negated second gate
        let other = f.or(f.variable(1), f.variable(2));
        let root = f.or(gate.clone(), f.not(other.clone()));

        let mut solver = MockSolver::new();
        clausify(&root, 2, &mut solver);

        // the AND gate (label 3) is positive only: 2 clauses
        // the OR gate (label 4) is negative only: 2 clauses
        // the root OR (label 5) is positive only: 1 clause, plus the unit
        assert_eq!(solver.num_clauses(), 6);
    }

    #[test]
    fn shared_gates_are_translated_once() {
        let f = factory(3);
        let shared = f.and(f.variable(1), f.variable(2));
        let left = f.or(shared.clone(), f.variable(3));
        let right = f.or(shared.clone(), f.not(f.variable(3)));
        let root = f.and(left, right);

        let mut solver = MockSolver::new();
        clausify(&root, 3, &mut solver);

        // shared gate 4: two positive half-clauses, once
        let defining: Vec<_> = solver
            .clauses()
            .iter()
            .filter(|c| c.contains(&-4))
            .collect();
        assert_eq!(defining.len(), 2);
    }

    #[test]
    fn ite_condition_gets_both_polarities() {
        let f = factory(3);
        let root = f.ite(f.variable(1), f.variable(2), f.variable(3));

        let mut solver = MockSolver::new();
        clausify(&root, 3, &mut solver);

        // positive-only ITE: two ternary clauses plus the unit
        assert_eq!(
            solver.clauses(),
            &[vec![-1, 2, -4], vec![1, 3, -4], vec![4]]
        );
    }

    #[test]
    fn bare_variable_root() {
        let f = factory(4);
        let root = f.variable(2);

        let mut solver = MockSolver::new();
        let root_lit = clausify(&root, 4, &mut solver);

        assert_eq!(root_lit, 2);
        assert_eq!(solver.num_variables(), 4);
        assert_eq!(solver.clauses(), &[vec![2]]);
    }

    #[test]
    fn negated_variable_root() {
        let f = factory(2);
        let root = f.not(f.variable(1));

        let mut solver = MockSolver::new();
        let root_lit = clausify(&root, 2, &mut solver);

        assert_eq!(root_lit, -1);
        assert_eq!(solver.clauses(), &[vec![-1]]);
    }
}
