//! Circuit factory with gate interning and constant folding
//!
//! The factory owns label allocation for one translation. It uses interior
//! mutability so gates can be created through `&self` while matrices and the
//! translator hold shared references to it.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use rustc_hash::{FxHashMap, FxHashSet};

use super::{BoolValue, BooleanMatrix, Dimensions, Gate, GateOp};

/// Creates and interns Boolean values.
///
/// Variables are labeled `1..=num_variables`; gate labels follow. A gate is
/// interned by its operation and sorted input labels, so structurally equal
/// gates are the same object and the circuit is a DAG.
pub struct BooleanFactory {
    num_variables: u32,
    next_label: Cell<i32>,
    sharing: bool,
    bitwidth: u32,
    gates: RefCell<FxHashMap<GateKey, BoolValue>>,
}

#[derive(PartialEq, Eq, Hash)]
enum GateKey {
    And(Vec<i32>),
    Or(Vec<i32>),
    Ite(i32, i32, i32),
}

impl BooleanFactory {
    /// Creates a factory with the given number of variables.
    ///
    /// `sharing` enables gate interning; `bitwidth` is the width of integer
    /// circuits built over this factory.
    pub fn new(num_variables: u32, sharing: bool, bitwidth: u32) -> Self {
        assert!((1..=32).contains(&bitwidth), "bitwidth must be in 1..=32");
        Self {
            num_variables,
            next_label: Cell::new(num_variables as i32 + 1),
            sharing,
            bitwidth,
            gates: RefCell::new(FxHashMap::default()),
        }
    }

    /// Returns the number of variables.
    pub fn num_variables(&self) -> u32 {
        self.num_variables
    }

    /// Returns the integer bitwidth.
    pub fn bitwidth(&self) -> u32 {
        self.bitwidth
    }

    /// Returns the given constant.
    pub fn constant(&self, value: bool) -> BoolValue {
        if value { BoolValue::True } else { BoolValue::False }
    }

    /// Returns the variable with the given label.
    ///
    /// # Panics
    /// Panics unless `1 <= label <= num_variables`.
    pub fn variable(&self, label: u32) -> BoolValue {
        assert!(
            label >= 1 && label <= self.num_variables,
            "variable label must be in 1..={}",
            self.num_variables
        );
        BoolValue::Var(label)
    }

    /// Creates an empty matrix with the given dimensions.
    pub fn matrix(&self, dims: Dimensions) -> BooleanMatrix {
        BooleanMatrix::empty(dims)
    }

    fn fresh_label(&self) -> i32 {
        let label = self.next_label.get();
        self.next_label.set(label + 1);
        label
    }

    /// Negation of `value`. Constants fold, double negations cancel.
    pub fn not(&self, value: BoolValue) -> BoolValue {
        match value {
            BoolValue::True => BoolValue::False,
            BoolValue::False => BoolValue::True,
            BoolValue::Not(inner) => (*inner).clone(),
            other => BoolValue::Not(Rc::new(other)),
        }
    }

    /// Conjunction of `left` and `right`.
    pub fn and(&self, left: BoolValue, right: BoolValue) -> BoolValue {
        self.and_multi(vec![left, right])
    }

    /// Disjunction of `left` and `right`.
    pub fn or(&self, left: BoolValue, right: BoolValue) -> BoolValue {
        self.or_multi(vec![left, right])
    }

    /// Conjunction of all inputs; true when empty.
    ///
    /// Folds constants, drops duplicates, and collapses an input together
    /// with its complement to false.
    pub fn and_multi(&self, inputs: Vec<BoolValue>) -> BoolValue {
        self.multi_gate(inputs, true)
    }

    /// Disjunction of all inputs; false when empty.
    ///
    /// Folds constants, drops duplicates, and collapses an input together
    /// with its complement to true.
    pub fn or_multi(&self, inputs: Vec<BoolValue>) -> BoolValue {
        self.multi_gate(inputs, false)
    }

    // `conjunctive` selects AND semantics; OR is its dual with the constants
    // swapped.
    fn multi_gate(&self, inputs: Vec<BoolValue>, conjunctive: bool) -> BoolValue {
        let short_circuit = self.constant(!conjunctive);
        let identity = self.constant(conjunctive);

        let mut seen = FxHashSet::default();
        let mut flat = Vec::with_capacity(inputs.len());
        for input in inputs {
            if input == short_circuit {
                return short_circuit;
            }
            if input == identity {
                continue;
            }
            let label = input.label();
            if seen.contains(&-label) {
                // v and !v together
                return short_circuit;
            }
            if seen.insert(label) {
                flat.push(input);
            }
        }

        match flat.len() {
            0 => identity,
            1 => flat.into_iter().next().unwrap(),
            _ => {
                flat.sort_by_key(BoolValue::label);
                let labels: Vec<i32> = flat.iter().map(BoolValue::label).collect();
                let key = if conjunctive { GateKey::And(labels) } else { GateKey::Or(labels) };
                self.intern(key, || {
                    if conjunctive { GateOp::And(flat) } else { GateOp::Or(flat) }
                })
            }
        }
    }

    /// The value of `then_value` when `condition` holds, else `else_value`.
    pub fn ite(&self, condition: BoolValue, then_value: BoolValue, else_value: BoolValue) -> BoolValue {
        match condition {
            BoolValue::True => return then_value,
            BoolValue::False => return else_value,
            _ => {}
        }
        if then_value == else_value {
            return then_value;
        }
        match (then_value.as_constant(), else_value.as_constant()) {
            (Some(true), Some(false)) => return condition,
            (Some(false), Some(true)) => return self.not(condition),
            (Some(true), None) => return self.or(condition, else_value),
            (Some(false), None) => {
                let not_c = self.not(condition);
                return self.and(not_c, else_value);
            }
            (None, Some(true)) => {
                let not_c = self.not(condition);
                return self.or(not_c, then_value);
            }
            (None, Some(false)) => return self.and(condition, then_value),
            _ => {}
        }
        let key = GateKey::Ite(condition.label(), then_value.label(), else_value.label());
        self.intern(key, || GateOp::Ite { condition, then_value, else_value })
    }

    fn intern(&self, key: GateKey, build: impl FnOnce() -> GateOp) -> BoolValue {
        if self.sharing {
            if let Some(cached) = self.gates.borrow().get(&key) {
                return cached.clone();
            }
        }
        let gate = BoolValue::Gate(Gate::new(self.fresh_label(), build()));
        if self.sharing {
            self.gates.borrow_mut().insert(key, gate.clone());
        }
        gate
    }

    /// The implication from `a` to `b`: `!a | b`.
    pub fn implies(&self, a: BoolValue, b: BoolValue) -> BoolValue {
        let not_a = self.not(a);
        self.or(not_a, b)
    }

    /// The biconditional of `a` and `b`: `(!a | b) & (!b | a)`.
    pub fn iff(&self, a: BoolValue, b: BoolValue) -> BoolValue {
        let forward = self.implies(a.clone(), b.clone());
        let backward = self.implies(b, a);
        self.and(forward, backward)
    }

    /// The exclusive or of `a` and `b`.
    pub fn xor(&self, a: BoolValue, b: BoolValue) -> BoolValue {
        let same = self.iff(a, b);
        self.not(same)
    }

    /// Full-adder sum bit: `a ^ b ^ cin`.
    pub fn sum(&self, a: BoolValue, b: BoolValue, cin: BoolValue) -> BoolValue {
        let ab = self.xor(a, b);
        self.xor(ab, cin)
    }

    /// Full-adder carry bit: `(a & b) | (cin & (a ^ b))`.
    pub fn carry(&self, a: BoolValue, b: BoolValue, cin: BoolValue) -> BoolValue {
        let ab = self.and(a.clone(), b.clone());
        let axb = self.xor(a, b);
        let c = self.and(cin, axb);
        self.or(ab, c)
    }
}
