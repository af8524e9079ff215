//! Abstract syntax of the relational logic
//!
//! AST nodes are immutable and shared; equality is reference equality
//! everywhere, so visitors can key caches on node identity. Leaves are the
//! named `Relation` and `Variable` symbols defined here; the expression,
//! formula, and integer-expression DAGs live in the submodules.

use std::fmt;
use std::sync::Arc;

mod expr;
mod formula;
mod int_expr;
pub mod visitor;

pub use expr::{BinaryExprOp, ExprInner, Expression, UnaryExprOp};
pub use formula::{
    BinaryFormulaOp, CompareOp, Decl, Decls, Formula, FormulaInner, Multiplicity, Quantifier,
    RelationPredicate,
};
pub use int_expr::{
    BinaryIntOp, CastOp, IntCompareOp, IntExprInner, IntExpression, UnaryIntOp,
};

/// A named k-ary relation symbol.
///
/// Relations are leaf expressions. Two relations are equal iff they are the
/// same object; names are for display only.
#[derive(Clone)]
pub struct Relation {
    inner: Arc<LeafInner>,
}

/// A named k-ary placeholder bound by a quantifier, comprehension, or sum
/// declaration. Identity semantics match [`Relation`].
#[derive(Clone)]
pub struct Variable {
    inner: Arc<LeafInner>,
}

struct LeafInner {
    name: String,
    arity: usize,
}

macro_rules! leaf_impl {
    ($ty:ident, $what:literal) => {
        impl $ty {
            /// Creates a leaf with the given name and arity.
            ///
            /// # Panics
            /// Panics if `arity < 1`.
            pub fn nary(name: impl Into<String>, arity: usize) -> Self {
                assert!(arity >= 1, "arity must be at least 1, got {}", arity);
                Self {
                    inner: Arc::new(LeafInner { name: name.into(), arity }),
                }
            }

            /// Creates a unary leaf.
            pub fn unary(name: impl Into<String>) -> Self {
                Self::nary(name, 1)
            }

            /// Creates a binary leaf.
            pub fn binary(name: impl Into<String>) -> Self {
                Self::nary(name, 2)
            }

            /// Creates a ternary leaf.
            pub fn ternary(name: impl Into<String>) -> Self {
                Self::nary(name, 3)
            }

            /// Returns the name of this leaf.
            pub fn name(&self) -> &str {
                &self.inner.name
            }

            /// Returns the arity of this leaf.
            pub fn arity(&self) -> usize {
                self.inner.arity
            }
        }

        impl PartialEq for $ty {
            fn eq(&self, other: &Self) -> bool {
                Arc::ptr_eq(&self.inner, &other.inner)
            }
        }

        impl Eq for $ty {}

        impl std::hash::Hash for $ty {
            fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
                Arc::as_ptr(&self.inner).hash(state);
            }
        }

        impl fmt::Debug for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($what, "({}/{})"), self.name(), self.arity())
            }
        }

        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.name())
            }
        }
    };
}

leaf_impl!(Relation, "Relation");
leaf_impl!(Variable, "Variable");
