//! Problem domain types: Universe, Tuple, TupleSet, TupleFactory, Bounds, and Instance
//!
//! A universe fixes the atoms a problem ranges over; tuple sets are ordered
//! sets of base-|U| tuple indices; bounds assign each relation a lower and an
//! upper tuple set; an instance is a total assignment produced by the solver.

use std::collections::BTreeSet;
use std::fmt;
use std::rc::Rc;

use indexmap::IndexMap;
use rustc_hash::FxHashMap;

use crate::ast::Relation;

/// An ordered set of distinct atoms.
///
/// Atoms are interned strings; their position in the universe determines the
/// base-|U| encoding of tuples. Two universes are equal iff they are the same
/// object.
#[derive(Clone)]
pub struct Universe {
    inner: Rc<UniverseInner>,
}

struct UniverseInner {
    atoms: Vec<Rc<str>>,
    index: FxHashMap<Rc<str>, usize>,
}

impl Universe {
    /// Creates a universe from the given atom names, in order.
    ///
    /// # Panics
    /// Panics if `atoms` is empty or contains a duplicate.
    pub fn new<S: AsRef<str>>(atoms: &[S]) -> Self {
        assert!(!atoms.is_empty(), "universe must contain at least one atom");
        let mut interned = Vec::with_capacity(atoms.len());
        let mut index = FxHashMap::default();
        for (i, atom) in atoms.iter().enumerate() {
            let atom: Rc<str> = Rc::from(atom.as_ref());
            assert!(
                index.insert(Rc::clone(&atom), i).is_none(),
                "atom {:?} appears multiple times",
                atom
            );
            interned.push(atom);
        }
        Self {
            inner: Rc::new(UniverseInner { atoms: interned, index }),
        }
    }

    /// Returns the number of atoms.
    pub fn size(&self) -> usize {
        self.inner.atoms.len()
    }

    /// Returns the atom at the given index.
    ///
    /// # Panics
    /// Panics if `index >= self.size()`.
    pub fn atom(&self, index: usize) -> &str {
        &self.inner.atoms[index]
    }

    /// Returns the index of the given atom, if it is in this universe.
    pub fn index_of(&self, atom: &str) -> Option<usize> {
        self.inner.index.get(atom).copied()
    }

    /// Returns an iterator over the atoms in index order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.inner.atoms.iter().map(|a| &**a)
    }

    /// Returns a factory for creating tuples and tuple sets over this universe.
    pub fn factory(&self) -> TupleFactory {
        TupleFactory { universe: self.clone() }
    }
}

impl PartialEq for Universe {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

impl Eq for Universe {}

impl fmt::Debug for Universe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Universe{:?}", self.inner.atoms)
    }
}

/// A tuple of atoms, represented by its flat base-|U| index.
#[derive(Clone)]
pub struct Tuple {
    universe: Universe,
    atom_indices: Vec<usize>,
    index: usize,
}

impl Tuple {
    fn new(universe: Universe, atom_indices: Vec<usize>) -> Self {
        let base = universe.size();
        let index = atom_indices.iter().fold(0, |acc, &i| acc * base + i);
        Self { universe, atom_indices, index }
    }

    /// Returns the universe this tuple draws its atoms from.
    pub fn universe(&self) -> &Universe {
        &self.universe
    }

    /// Returns the number of atoms in this tuple.
    pub fn arity(&self) -> usize {
        self.atom_indices.len()
    }

    /// Returns the flat index of this tuple: its digits in base |U| are the
    /// atom indices, most significant first.
    pub fn index(&self) -> usize {
        self.index
    }

    /// Returns the atom at position `i`.
    pub fn atom(&self, i: usize) -> &str {
        self.universe.atom(self.atom_indices[i])
    }

    /// Returns an iterator over the atoms of this tuple.
    pub fn atoms(&self) -> impl Iterator<Item = &str> {
        self.atom_indices.iter().map(|&i| self.universe.atom(i))
    }
}

impl PartialEq for Tuple {
    fn eq(&self, other: &Self) -> bool {
        self.universe == other.universe
            && self.arity() == other.arity()
            && self.index == other.index
    }
}

impl Eq for Tuple {}

impl fmt::Debug for Tuple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut t = f.debug_tuple("");
        for atom in self.atoms() {
            t.field(&atom);
        }
        t.finish()
    }
}

/// A set of tuples of uniform arity over one universe.
///
/// Stored as an ordered set of flat tuple indices, so iteration is always in
/// ascending index order. Every index is less than |U|^arity.
#[derive(Clone)]
pub struct TupleSet {
    universe: Universe,
    arity: usize,
    indices: BTreeSet<usize>,
}

impl TupleSet {
    /// Creates an empty tuple set of the given arity.
    ///
    /// # Panics
    /// Panics if `arity` is zero.
    pub fn empty(universe: Universe, arity: usize) -> Self {
        assert!(arity >= 1, "arity must be at least 1");
        Self { universe, arity, indices: BTreeSet::new() }
    }

    /// Returns the universe of this set.
    pub fn universe(&self) -> &Universe {
        &self.universe
    }

    /// Returns the arity of the tuples in this set.
    pub fn arity(&self) -> usize {
        self.arity
    }

    /// Returns the number of tuples.
    pub fn size(&self) -> usize {
        self.indices.len()
    }

    /// Returns true if this set contains no tuples.
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Adds a tuple to this set.
    ///
    /// # Panics
    /// Panics if the tuple's universe or arity does not match.
    pub fn add(&mut self, tuple: &Tuple) {
        assert!(tuple.universe() == &self.universe, "tuple from a different universe");
        assert_eq!(tuple.arity(), self.arity, "tuple arity mismatch");
        self.indices.insert(tuple.index());
    }

    /// Adds the tuple with the given flat index.
    ///
    /// # Panics
    /// Panics if the index is out of range for this arity.
    pub fn add_index(&mut self, index: usize) {
        assert!(index < self.capacity(), "tuple index {} out of range", index);
        self.indices.insert(index);
    }

    /// Returns true if this set contains the tuple with the given index.
    pub fn contains_index(&self, index: usize) -> bool {
        self.indices.contains(&index)
    }

    /// Returns true if this set contains the given tuple.
    pub fn contains(&self, tuple: &Tuple) -> bool {
        tuple.universe() == &self.universe
            && tuple.arity() == self.arity
            && self.indices.contains(&tuple.index())
    }

    /// Returns true if every tuple of `other` is in this set.
    pub fn contains_set(&self, other: &TupleSet) -> bool {
        self.universe == other.universe
            && self.arity == other.arity
            && other.indices.is_subset(&self.indices)
    }

    /// Returns an iterator over the tuple indices in ascending order.
    pub fn indices(&self) -> impl Iterator<Item = usize> + '_ {
        self.indices.iter().copied()
    }

    /// Returns an iterator over the tuples in ascending index order.
    pub fn iter(&self) -> impl Iterator<Item = Tuple> + '_ {
        let factory = self.universe.factory();
        let arity = self.arity;
        self.indices
            .iter()
            .map(move |&i| factory.tuple_from_index(arity, i))
    }

    /// Returns the number of possible tuples of this arity: |U|^arity.
    pub fn capacity(&self) -> usize {
        self.universe.size().pow(self.arity as u32)
    }

    fn check_compatible(&self, other: &TupleSet) {
        assert!(self.universe == other.universe, "tuple sets from different universes");
        assert_eq!(self.arity, other.arity, "tuple set arity mismatch");
    }

    /// Returns the union of this set and `other`.
    pub fn union(&self, other: &TupleSet) -> TupleSet {
        self.check_compatible(other);
        TupleSet {
            universe: self.universe.clone(),
            arity: self.arity,
            indices: self.indices.union(&other.indices).copied().collect(),
        }
    }

    /// Returns the intersection of this set and `other`.
    pub fn intersection(&self, other: &TupleSet) -> TupleSet {
        self.check_compatible(other);
        TupleSet {
            universe: self.universe.clone(),
            arity: self.arity,
            indices: self.indices.intersection(&other.indices).copied().collect(),
        }
    }

    /// Returns the tuples of this set that are not in `other`.
    pub fn difference(&self, other: &TupleSet) -> TupleSet {
        self.check_compatible(other);
        TupleSet {
            universe: self.universe.clone(),
            arity: self.arity,
            indices: self.indices.difference(&other.indices).copied().collect(),
        }
    }

    /// Returns the cross product of this set and `other`.
    ///
    /// # Panics
    /// Panics if the sets are over different universes.
    pub fn product(&self, other: &TupleSet) -> TupleSet {
        assert!(self.universe == other.universe, "tuple sets from different universes");
        let shift = self.universe.size().pow(other.arity as u32);
        let mut indices = BTreeSet::new();
        for &i in &self.indices {
            for &j in &other.indices {
                indices.insert(i * shift + j);
            }
        }
        TupleSet {
            universe: self.universe.clone(),
            arity: self.arity + other.arity,
            indices,
        }
    }
}

impl PartialEq for TupleSet {
    fn eq(&self, other: &Self) -> bool {
        self.universe == other.universe
            && self.arity == other.arity
            && self.indices == other.indices
    }
}

impl Eq for TupleSet {}

impl fmt::Debug for TupleSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

/// Creates tuples and tuple sets over a fixed universe.
#[derive(Clone)]
pub struct TupleFactory {
    universe: Universe,
}

impl TupleFactory {
    /// Returns the universe of this factory.
    pub fn universe(&self) -> &Universe {
        &self.universe
    }

    /// Creates a tuple from the given atoms.
    ///
    /// # Panics
    /// Panics if `atoms` is empty or names an atom not in the universe.
    pub fn tuple<S: AsRef<str>>(&self, atoms: &[S]) -> Tuple {
        assert!(!atoms.is_empty(), "cannot create an empty tuple");
        let indices = atoms
            .iter()
            .map(|a| {
                self.universe
                    .index_of(a.as_ref())
                    .unwrap_or_else(|| panic!("atom {:?} not in universe", a.as_ref()))
            })
            .collect();
        Tuple::new(self.universe.clone(), indices)
    }

    /// Reconstructs the tuple of the given arity with the given flat index.
    ///
    /// # Panics
    /// Panics if the index is out of range.
    pub fn tuple_from_index(&self, arity: usize, index: usize) -> Tuple {
        let base = self.universe.size();
        assert!(index < base.pow(arity as u32), "tuple index {} out of range", index);
        let mut atom_indices = vec![0; arity];
        let mut rest = index;
        for pos in (0..arity).rev() {
            atom_indices[pos] = rest % base;
            rest /= base;
        }
        Tuple { universe: self.universe.clone(), atom_indices, index }
    }

    /// Creates a tuple set from rows of atom names; all rows must have the
    /// same arity.
    pub fn tuple_set(&self, tuples: &[&[&str]]) -> TupleSet {
        assert!(!tuples.is_empty(), "cannot create a tuple set from no rows");
        let arity = tuples[0].len();
        let mut set = TupleSet::empty(self.universe.clone(), arity);
        for row in tuples {
            assert_eq!(row.len(), arity, "all tuples must have the same arity");
            set.add(&self.tuple(row));
        }
        set
    }

    /// Creates an empty tuple set of the given arity.
    pub fn none(&self, arity: usize) -> TupleSet {
        TupleSet::empty(self.universe.clone(), arity)
    }

    /// Creates the tuple set containing every tuple of the given arity.
    pub fn all(&self, arity: usize) -> TupleSet {
        let mut set = TupleSet::empty(self.universe.clone(), arity);
        for i in 0..self.universe.size().pow(arity as u32) {
            set.indices.insert(i);
        }
        set
    }

    /// Creates a tuple set of the given arity from flat tuple indices.
    pub fn set_of<I: IntoIterator<Item = usize>>(&self, arity: usize, indices: I) -> TupleSet {
        let mut set = TupleSet::empty(self.universe.clone(), arity);
        for i in indices {
            set.add_index(i);
        }
        set
    }
}

/// Lower and upper bounds on the relations of a problem.
///
/// The lower bound of a relation holds the tuples it must contain; the upper
/// bound holds the tuples it may contain. Integers are bound exactly to
/// single unary tuples. Relations are kept in insertion order; translation
/// numbers primary variables in that order, so bounds insertion order is part
/// of a problem's identity.
#[derive(Clone)]
pub struct Bounds {
    universe: Universe,
    lowers: IndexMap<Relation, TupleSet>,
    uppers: IndexMap<Relation, TupleSet>,
    ints: IndexMap<i32, TupleSet>,
}

impl Bounds {
    /// Creates empty bounds over the given universe.
    pub fn new(universe: Universe) -> Self {
        Self {
            universe,
            lowers: IndexMap::new(),
            uppers: IndexMap::new(),
            ints: IndexMap::new(),
        }
    }

    /// Returns the universe of these bounds.
    pub fn universe(&self) -> &Universe {
        &self.universe
    }

    /// Bounds `relation` below by `lower` and above by `upper`.
    ///
    /// # Panics
    /// Panics unless both sets are over this universe, both have the
    /// relation's arity, and `lower` is a subset of `upper`.
    pub fn bound(&mut self, relation: &Relation, lower: TupleSet, upper: TupleSet) {
        assert!(
            lower.universe() == &self.universe && upper.universe() == &self.universe,
            "bounds for {} drawn from a different universe",
            relation.name()
        );
        assert!(
            lower.arity() == relation.arity() && upper.arity() == relation.arity(),
            "bound arity does not match the arity of {}",
            relation.name()
        );
        assert!(
            upper.contains_set(&lower),
            "lower bound of {} is not contained in its upper bound",
            relation.name()
        );
        self.lowers.insert(relation.clone(), lower);
        self.uppers.insert(relation.clone(), upper);
    }

    /// Bounds `relation` exactly: lower = upper = `tuples`.
    pub fn bound_exactly(&mut self, relation: &Relation, tuples: TupleSet) {
        self.bound(relation, tuples.clone(), tuples);
    }

    /// Returns the lower bound of `relation`, if it is bound.
    pub fn lower_bound(&self, relation: &Relation) -> Option<&TupleSet> {
        self.lowers.get(relation)
    }

    /// Returns the upper bound of `relation`, if it is bound.
    pub fn upper_bound(&self, relation: &Relation) -> Option<&TupleSet> {
        self.uppers.get(relation)
    }

    /// Returns the bound relations in insertion order.
    pub fn relations(&self) -> impl Iterator<Item = &Relation> {
        self.uppers.keys()
    }

    /// Binds the integer `i` exactly to the given singleton unary tuple set.
    ///
    /// # Panics
    /// Panics unless `tuples` is a unary singleton over this universe.
    pub fn bound_int(&mut self, i: i32, tuples: TupleSet) {
        assert!(tuples.universe() == &self.universe, "int bound from a different universe");
        assert_eq!(tuples.arity(), 1, "int bound must be unary");
        assert_eq!(tuples.size(), 1, "int bound must contain exactly one tuple");
        self.ints.insert(i, tuples);
    }

    /// Returns the tuple set bound to the integer `i`, if any.
    pub fn int_bound(&self, i: i32) -> Option<&TupleSet> {
        self.ints.get(&i)
    }

    /// Returns the bound integers in insertion order.
    pub fn ints(&self) -> impl Iterator<Item = i32> + '_ {
        self.ints.keys().copied()
    }
}

impl fmt::Debug for Bounds {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut map = f.debug_map();
        for (r, upper) in &self.uppers {
            map.entry(&r.name(), &(&self.lowers[r], upper));
        }
        map.finish()
    }
}

/// A total assignment from relations (and bound integers) to tuple sets.
pub struct Instance {
    universe: Universe,
    relations: IndexMap<Relation, TupleSet>,
    ints: IndexMap<i32, TupleSet>,
}

impl Instance {
    /// Creates an empty instance over the given universe.
    pub fn new(universe: Universe) -> Self {
        Self {
            universe,
            relations: IndexMap::new(),
            ints: IndexMap::new(),
        }
    }

    /// Returns the universe of this instance.
    pub fn universe(&self) -> &Universe {
        &self.universe
    }

    /// Maps `relation` to `tuples`.
    ///
    /// # Panics
    /// Panics if the tuple set's universe or arity does not match.
    pub fn add(&mut self, relation: Relation, tuples: TupleSet) {
        assert!(tuples.universe() == &self.universe, "tuple set from a different universe");
        assert_eq!(tuples.arity(), relation.arity(), "tuple set arity mismatch");
        self.relations.insert(relation, tuples);
    }

    /// Maps the integer `i` to the given singleton unary tuple set.
    pub fn add_int(&mut self, i: i32, tuples: TupleSet) {
        assert!(tuples.universe() == &self.universe, "tuple set from a different universe");
        assert_eq!(tuples.arity(), 1, "int binding must be unary");
        self.ints.insert(i, tuples);
    }

    /// Returns the tuples assigned to `relation`, if any.
    pub fn tuples(&self, relation: &Relation) -> Option<&TupleSet> {
        self.relations.get(relation)
    }

    /// Returns the tuples assigned to the integer `i`, if any.
    pub fn int_tuples(&self, i: i32) -> Option<&TupleSet> {
        self.ints.get(&i)
    }

    /// Returns true if this instance assigns tuples to `relation`.
    pub fn contains(&self, relation: &Relation) -> bool {
        self.relations.contains_key(relation)
    }

    /// Returns the relations of this instance in insertion order.
    pub fn relations(&self) -> impl Iterator<Item = &Relation> {
        self.relations.keys()
    }

    /// Returns the integers of this instance in insertion order.
    pub fn ints(&self) -> impl Iterator<Item = i32> + '_ {
        self.ints.keys().copied()
    }
}

impl fmt::Debug for Instance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut map = f.debug_map();
        for (r, tuples) in &self.relations {
            map.entry(&r.name(), tuples);
        }
        map.finish()
    }
}
