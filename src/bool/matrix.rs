//! Sparse matrices of circuit values
//!
//! A matrix encodes a relation: cell `i` holds the circuit value deciding
//! whether the tuple with flat index `i` is in the relation. Cells that are
//! constant false are not stored. The relational operators mirror the
//! expression language; all of them go through a [`BooleanFactory`], which
//! folds constants as the matrices combine.

use std::collections::BTreeMap;

use super::{BoolValue, BooleanFactory, Dimensions};

/// A sparse symbolic matrix over one universe.
#[derive(Debug, Clone)]
pub struct BooleanMatrix {
    dims: Dimensions,
    cells: BTreeMap<usize, BoolValue>,
}

impl BooleanMatrix {
    /// Creates an all-false matrix with the given dimensions.
    pub fn empty(dims: Dimensions) -> Self {
        Self { dims, cells: BTreeMap::new() }
    }

    /// Creates the identity matrix over a universe of the given size.
    pub fn identity(size: usize) -> Self {
        let mut m = Self::empty(Dimensions::new(2, size));
        for i in 0..size {
            m.cells.insert(i * size + i, BoolValue::True);
        }
        m
    }

    /// Returns the dimensions of this matrix.
    pub fn dims(&self) -> Dimensions {
        self.dims
    }

    /// Returns the number of stored (non-false) cells.
    pub fn density(&self) -> usize {
        self.cells.len()
    }

    /// Returns the value at the given cell index; absent cells are false.
    ///
    /// # Panics
    /// Panics if the index is out of range.
    pub fn get(&self, index: usize) -> BoolValue {
        assert!(index < self.dims.capacity(), "cell index {} out of range", index);
        self.cells.get(&index).cloned().unwrap_or(BoolValue::False)
    }

    /// Sets the value at the given cell index; storing false clears the cell.
    ///
    /// # Panics
    /// Panics if the index is out of range.
    pub fn set(&mut self, index: usize, value: BoolValue) {
        assert!(index < self.dims.capacity(), "cell index {} out of range", index);
        if value == BoolValue::False {
            self.cells.remove(&index);
        } else {
            self.cells.insert(index, value);
        }
    }

    /// Returns the stored cells in ascending index order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &BoolValue)> {
        self.cells.iter().map(|(&i, v)| (i, v))
    }

    /// Returns the indices of all stored cells, in ascending order.
    pub fn dense_indices(&self) -> Vec<usize> {
        self.cells.keys().copied().collect()
    }

    fn check_same_shape(&self, other: &BooleanMatrix) {
        assert_eq!(self.dims, other.dims, "matrix dimension mismatch");
    }

    fn check_same_universe(&self, other: &BooleanMatrix) {
        assert_eq!(self.dims.size(), other.dims.size(), "matrices over different universes");
    }

    /// Pointwise disjunction.
    pub fn union(&self, other: &BooleanMatrix, f: &BooleanFactory) -> BooleanMatrix {
        self.check_same_shape(other);
        let mut result = self.clone();
        for (i, v) in other.iter() {
            let merged = f.or(result.get(i), v.clone());
            result.set(i, merged);
        }
        result
    }

    /// Pointwise conjunction.
    pub fn intersection(&self, other: &BooleanMatrix, f: &BooleanFactory) -> BooleanMatrix {
        self.check_same_shape(other);
        let mut result = BooleanMatrix::empty(self.dims);
        for (i, v) in self.iter() {
            if let Some(w) = other.cells.get(&i) {
                result.set(i, f.and(v.clone(), w.clone()));
            }
        }
        result
    }

    /// Pointwise `self & !other`.
    pub fn difference(&self, other: &BooleanMatrix, f: &BooleanFactory) -> BooleanMatrix {
        self.check_same_shape(other);
        let mut result = BooleanMatrix::empty(self.dims);
        for (i, v) in self.iter() {
            let masked = f.and(v.clone(), f.not(other.get(i)));
            result.set(i, masked);
        }
        result
    }

    /// Relational join: matrix product over the Boolean semiring. The last
    /// column of `self` is matched against the first column of `other`.
    ///
    /// # Panics
    /// Panics if the combined arity is less than 3 or the universes differ.
    pub fn dot(&self, other: &BooleanMatrix, f: &BooleanFactory) -> BooleanMatrix {
        self.check_same_universe(other);
        let (a, b) = (self.dims.arity(), other.dims.arity());
        assert!(a + b >= 3, "cannot join two unary matrices");

        let size = self.dims.size();
        let tail_width = size.pow(b as u32 - 1);
        let result_dims = Dimensions::new(a + b - 2, size);

        // other's cells grouped by their leading atom
        let mut by_head: Vec<Vec<(usize, &BoolValue)>> = vec![Vec::new(); size];
        for (j, w) in other.iter() {
            by_head[j / tail_width].push((j % tail_width, w));
        }

        let mut terms: BTreeMap<usize, Vec<BoolValue>> = BTreeMap::new();
        for (i, v) in self.iter() {
            let head = i / size;
            let mid = i % size;
            for &(tail, w) in &by_head[mid] {
                let product = f.and(v.clone(), w.clone());
                if product != BoolValue::False {
                    terms.entry(head * tail_width + tail).or_default().push(product);
                }
            }
        }

        let mut result = BooleanMatrix::empty(result_dims);
        for (index, values) in terms {
            result.set(index, f.or_multi(values));
        }
        result
    }

    /// Cross product.
    ///
    /// # Panics
    /// Panics if the universes differ.
    pub fn cross(&self, other: &BooleanMatrix, f: &BooleanFactory) -> BooleanMatrix {
        self.check_same_universe(other);
        let size = self.dims.size();
        let shift = size.pow(other.dims.arity() as u32);
        let mut result =
            BooleanMatrix::empty(Dimensions::new(self.dims.arity() + other.dims.arity(), size));
        for (i, v) in self.iter() {
            for (j, w) in other.iter() {
                result.set(i * shift + j, f.and(v.clone(), w.clone()));
            }
        }
        result
    }

    /// Transpose of a binary matrix.
    ///
    /// # Panics
    /// Panics unless this matrix is binary.
    pub fn transpose(&self) -> BooleanMatrix {
        assert_eq!(self.dims.arity(), 2, "transpose requires a binary matrix");
        let size = self.dims.size();
        let mut result = BooleanMatrix::empty(self.dims);
        for (i, v) in self.iter() {
            result.cells.insert((i % size) * size + i / size, v.clone());
        }
        result
    }

    /// Transitive closure of a binary matrix, by squaring: log2(size) rounds
    /// suffice because reachability saturates at paths of length `size`.
    ///
    /// # Panics
    /// Panics unless this matrix is binary.
    pub fn closure(&self, f: &BooleanFactory) -> BooleanMatrix {
        assert_eq!(self.dims.arity(), 2, "closure requires a binary matrix");
        let mut result = self.clone();
        let mut reach = 1;
        while reach < self.dims.size() {
            let squared = result.dot(&result, f);
            result = result.union(&squared, f);
            reach *= 2;
        }
        result
    }

    /// Override: `other`'s cells win in any row where `other` has a cell;
    /// rows are keyed by the leading atom.
    ///
    /// # Panics
    /// Panics if the dimensions differ.
    pub fn override_with(&self, other: &BooleanMatrix, f: &BooleanFactory) -> BooleanMatrix {
        self.check_same_shape(other);
        let row_width = self.dims.capacity() / self.dims.size();

        let mut row_flags: BTreeMap<usize, Vec<BoolValue>> = BTreeMap::new();
        for (j, w) in other.iter() {
            row_flags.entry(j / row_width).or_default().push(w.clone());
        }
        let row_flags: BTreeMap<usize, BoolValue> = row_flags
            .into_iter()
            .map(|(row, values)| (row, f.or_multi(values)))
            .collect();

        let mut result = other.clone();
        for (i, v) in self.iter() {
            let flag = row_flags.get(&(i / row_width)).cloned().unwrap_or(BoolValue::False);
            let kept = f.and(v.clone(), f.not(flag));
            let merged = f.or(other.get(i), kept);
            result.set(i, merged);
        }
        result
    }

    /// The formula stating that every tuple of `self` is in `other`.
    pub fn subset(&self, other: &BooleanMatrix, f: &BooleanFactory) -> BoolValue {
        self.check_same_shape(other);
        let conjuncts: Vec<BoolValue> = self
            .iter()
            .map(|(i, v)| f.implies(v.clone(), other.get(i)))
            .collect();
        f.and_multi(conjuncts)
    }

    /// The formula stating that `self` and `other` hold the same tuples.
    pub fn equals(&self, other: &BooleanMatrix, f: &BooleanFactory) -> BoolValue {
        self.check_same_shape(other);
        let mut indices: Vec<usize> = self.cells.keys().copied().collect();
        for i in other.cells.keys() {
            if !self.cells.contains_key(i) {
                indices.push(*i);
            }
        }
        indices.sort_unstable();
        let conjuncts: Vec<BoolValue> = indices
            .into_iter()
            .map(|i| f.iff(self.get(i), other.get(i)))
            .collect();
        f.and_multi(conjuncts)
    }

    /// The formula stating that this matrix holds no tuple.
    pub fn none(&self, f: &BooleanFactory) -> BoolValue {
        let any = self.some(f);
        f.not(any)
    }

    /// The formula stating that this matrix holds at least one tuple.
    pub fn some(&self, f: &BooleanFactory) -> BoolValue {
        let values: Vec<BoolValue> = self.cells.values().cloned().collect();
        f.or_multi(values)
    }

    /// The formula stating that this matrix holds at most one tuple, encoded
    /// as a linear ladder over the cells.
    pub fn lone(&self, f: &BooleanFactory) -> BoolValue {
        let mut values = self.cells.values().cloned();
        let Some(first) = values.next() else {
            return BoolValue::True;
        };
        let mut preceding = first;
        let mut constraints = Vec::with_capacity(self.density().saturating_sub(1));
        for v in values {
            let clash = f.or(f.not(v.clone()), f.not(preceding.clone()));
            constraints.push(clash);
            preceding = f.or(preceding, v);
        }
        f.and_multi(constraints)
    }

    /// The formula stating that this matrix holds exactly one tuple.
    pub fn one(&self, f: &BooleanFactory) -> BoolValue {
        let lone = self.lone(f);
        let some = self.some(f);
        f.and(lone, some)
    }
}
