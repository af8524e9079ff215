//! Interpretation of leaf expressions as matrices
//!
//! The exact interpreter allocates one primary variable per tuple in each
//! relation's upper-minus-lower bound, numbering relations in bounds
//! insertion order and tuples in ascending index order, so the numbering is
//! a deterministic function of the bounds. The over-approximating variant
//! allocates nothing and maps every upper-bound tuple to constant true; the
//! skolemizer uses it to bound skolem relations.

use std::ops::Range;

use indexmap::IndexMap;

use crate::ast::Relation;
use crate::bool::{BoolValue, BooleanFactory, BooleanMatrix, Dimensions};
use crate::instance::{Bounds, TupleSet, Universe};
use crate::{RelicError, Result};

struct RelationEntry {
    lower: TupleSet,
    upper: TupleSet,
    vars: Range<u32>,
}

/// Maps relation and constant leaves to Boolean matrices.
pub struct LeafInterpreter {
    universe: Universe,
    entries: IndexMap<Relation, RelationEntry>,
    ints: IndexMap<i32, usize>,
    num_primary: u32,
    exact: bool,
}

impl LeafInterpreter {
    /// Creates the exact interpreter for the given bounds, allocating
    /// primary variables `1..=n`.
    pub fn exact(bounds: &Bounds) -> Self {
        Self::build(bounds, true)
    }

    /// Creates the over-approximating interpreter: upper-bound tuples are
    /// constant true and no variables exist.
    pub fn overapproximating(bounds: &Bounds) -> Self {
        Self::build(bounds, false)
    }

    fn build(bounds: &Bounds, exact: bool) -> Self {
        let mut entries = IndexMap::new();
        let mut next_var: u32 = 1;
        for relation in bounds.relations() {
            let lower = bounds.lower_bound(relation).unwrap().clone();
            let upper = bounds.upper_bound(relation).unwrap().clone();
            let free = if exact { (upper.size() - lower.size()) as u32 } else { 0 };
            entries.insert(
                relation.clone(),
                RelationEntry { lower, upper, vars: next_var..next_var + free },
            );
            next_var += free;
        }
        let ints = bounds
            .ints()
            .map(|i| {
                let atom = bounds.int_bound(i).unwrap().indices().next().unwrap();
                (i, atom)
            })
            .collect();
        Self {
            universe: bounds.universe().clone(),
            entries,
            ints,
            num_primary: next_var - 1,
            exact,
        }
    }

    /// Returns the universe.
    pub fn universe(&self) -> &Universe {
        &self.universe
    }

    /// Returns the number of allocated primary variables.
    pub fn num_primary_variables(&self) -> u32 {
        self.num_primary
    }

    /// Returns the primary-variable range of each relation, in bounds
    /// insertion order.
    pub fn variable_ranges(&self) -> IndexMap<Relation, Range<u32>> {
        self.entries
            .iter()
            .map(|(r, e)| (r.clone(), e.vars.clone()))
            .collect()
    }

    /// Returns the bound integers and the atom index each maps to, in bounds
    /// insertion order.
    pub fn ints(&self) -> impl Iterator<Item = (i32, usize)> + '_ {
        self.ints.iter().map(|(&i, &atom)| (i, atom))
    }

    fn dims(&self, arity: usize) -> Dimensions {
        Dimensions::new(arity, self.universe.size())
    }

    /// Returns the matrix of the given relation.
    ///
    /// # Errors
    /// Returns [`RelicError::UnboundLeaf`] if the relation has no bounds.
    pub fn interpret(&self, relation: &Relation, f: &BooleanFactory) -> Result<BooleanMatrix> {
        let entry = self
            .entries
            .get(relation)
            .ok_or_else(|| RelicError::UnboundLeaf(relation.name().to_string()))?;
        let mut matrix = BooleanMatrix::empty(self.dims(relation.arity()));
        let mut var = entry.vars.start;
        for index in entry.upper.indices() {
            if entry.lower.contains_index(index) {
                matrix.set(index, BoolValue::True);
            } else if self.exact {
                matrix.set(index, f.variable(var));
                var += 1;
            } else {
                matrix.set(index, BoolValue::True);
            }
        }
        Ok(matrix)
    }

    /// Returns the all-true unary matrix.
    pub fn univ(&self) -> BooleanMatrix {
        let mut matrix = BooleanMatrix::empty(self.dims(1));
        for i in 0..self.universe.size() {
            matrix.set(i, BoolValue::True);
        }
        matrix
    }

    /// Returns the empty unary matrix.
    pub fn none(&self) -> BooleanMatrix {
        BooleanMatrix::empty(self.dims(1))
    }

    /// Returns the identity matrix.
    pub fn iden(&self) -> BooleanMatrix {
        BooleanMatrix::identity(self.universe.size())
    }

    /// Returns the unary matrix holding every atom bound to an integer.
    pub fn int_atoms(&self) -> BooleanMatrix {
        let mut matrix = BooleanMatrix::empty(self.dims(1));
        for &atom in self.ints.values() {
            matrix.set(atom, BoolValue::True);
        }
        matrix
    }
}
