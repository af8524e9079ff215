//! Relational expressions

use std::sync::Arc;

use super::formula::{Decls, Formula};
use super::int_expr::IntExpression;
use super::{Relation, Variable};

/// Binary expression operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryExprOp {
    /// Set union
    Union,
    /// Set intersection
    Intersection,
    /// Set difference
    Difference,
    /// Relational join
    Join,
    /// Cross product
    Product,
    /// Override: `a ++ b` prefers `b`'s rows
    Override,
}

/// Unary expression operators; all require a binary operand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnaryExprOp {
    /// Transpose
    Transpose,
    /// Transitive closure
    Closure,
    /// Reflexive transitive closure
    ReflexiveClosure,
}

/// A relational expression.
///
/// Leaves are relations, variables, and the four constants; everything else
/// is an `Arc`-shared inner node, so clones are cheap and equality is
/// reference equality.
#[derive(Clone, Debug)]
pub enum Expression {
    /// A relation leaf
    Relation(Relation),
    /// A variable leaf
    Variable(Variable),
    /// The universal unary relation
    Univ,
    /// The empty unary relation
    None,
    /// The binary identity relation
    Iden,
    /// The unary relation of atoms bound to integers
    Ints,
    /// A compound expression
    Ref(Arc<ExprInner>),
}

/// Inner representation of compound expressions.
#[derive(Clone, Debug)]
pub enum ExprInner {
    /// Binary expression
    Binary {
        /// Operator
        op: BinaryExprOp,
        /// Left operand
        left: Expression,
        /// Right operand
        right: Expression,
        /// Arity of the result
        arity: usize,
    },
    /// Unary expression (transpose or a closure)
    Unary {
        /// Operator
        op: UnaryExprOp,
        /// Operand, always binary
        expr: Expression,
    },
    /// Set comprehension `{ decls | formula }`
    Comprehension {
        /// Bound declarations
        decls: Decls,
        /// Membership condition
        formula: Formula,
    },
    /// Conditional expression
    IfThenElse {
        /// Condition
        condition: Formula,
        /// Value when the condition holds
        then_expr: Expression,
        /// Value otherwise
        else_expr: Expression,
    },
    /// Cast of an integer expression to the atom(s) representing its value
    IntCast(IntExpression),
}

impl Expression {
    /// The universal unary relation.
    pub const UNIV: Expression = Expression::Univ;
    /// The empty unary relation.
    pub const NONE: Expression = Expression::None;
    /// The binary identity relation.
    pub const IDEN: Expression = Expression::Iden;
    /// The unary relation of all atoms bound to integers.
    pub const INTS: Expression = Expression::Ints;

    /// Returns the arity of this expression.
    pub fn arity(&self) -> usize {
        match self {
            Expression::Relation(r) => r.arity(),
            Expression::Variable(v) => v.arity(),
            Expression::Univ | Expression::None | Expression::Ints => 1,
            Expression::Iden => 2,
            Expression::Ref(inner) => match &**inner {
                ExprInner::Binary { arity, .. } => *arity,
                ExprInner::Unary { .. } => 2,
                ExprInner::Comprehension { decls, .. } => {
                    decls.iter().map(|d| d.variable().arity()).sum()
                }
                ExprInner::IfThenElse { then_expr, .. } => then_expr.arity(),
                ExprInner::IntCast(_) => 1,
            },
        }
    }

    fn binary(op: BinaryExprOp, left: Expression, right: Expression, arity: usize) -> Expression {
        Expression::Ref(Arc::new(ExprInner::Binary { op, left, right, arity }))
    }

    fn same_arity(op: BinaryExprOp, left: Expression, right: Expression) -> Expression {
        assert_eq!(
            left.arity(),
            right.arity(),
            "arity mismatch in {:?}: {} vs {}",
            op,
            left.arity(),
            right.arity()
        );
        let arity = left.arity();
        Expression::binary(op, left, right, arity)
    }

    /// Union of this expression and `other`.
    ///
    /// # Panics
    /// Panics if the arities differ.
    pub fn union(self, other: Expression) -> Expression {
        Expression::same_arity(BinaryExprOp::Union, self, other)
    }

    /// Intersection of this expression and `other`.
    ///
    /// # Panics
    /// Panics if the arities differ.
    pub fn intersection(self, other: Expression) -> Expression {
        Expression::same_arity(BinaryExprOp::Intersection, self, other)
    }

    /// Difference of this expression and `other`.
    ///
    /// # Panics
    /// Panics if the arities differ.
    pub fn difference(self, other: Expression) -> Expression {
        Expression::same_arity(BinaryExprOp::Difference, self, other)
    }

    /// Override: tuples of `other`, plus tuples of `self` whose leading atom
    /// heads no tuple of `other`.
    ///
    /// # Panics
    /// Panics if the arities differ.
    pub fn override_with(self, other: Expression) -> Expression {
        Expression::same_arity(BinaryExprOp::Override, self, other)
    }

    /// Relational join of this expression and `other`; the result has arity
    /// `self.arity() + other.arity() - 2`.
    ///
    /// # Panics
    /// Panics if the combined arity is less than 3.
    pub fn join(self, other: Expression) -> Expression {
        let (a, b) = (self.arity(), other.arity());
        assert!(a + b >= 3, "cannot join two unary expressions");
        Expression::binary(BinaryExprOp::Join, self, other, a + b - 2)
    }

    /// Cross product of this expression and `other`.
    pub fn product(self, other: Expression) -> Expression {
        let arity = self.arity() + other.arity();
        Expression::binary(BinaryExprOp::Product, self, other, arity)
    }

    fn unary(op: UnaryExprOp, expr: Expression) -> Expression {
        assert_eq!(expr.arity(), 2, "{:?} requires a binary operand", op);
        Expression::Ref(Arc::new(ExprInner::Unary { op, expr }))
    }

    /// Transpose of this binary expression.
    ///
    /// # Panics
    /// Panics unless this expression is binary.
    pub fn transpose(self) -> Expression {
        Expression::unary(UnaryExprOp::Transpose, self)
    }

    /// Transitive closure of this binary expression.
    ///
    /// # Panics
    /// Panics unless this expression is binary.
    pub fn closure(self) -> Expression {
        Expression::unary(UnaryExprOp::Closure, self)
    }

    /// Reflexive transitive closure of this binary expression.
    ///
    /// # Panics
    /// Panics unless this expression is binary.
    pub fn reflexive_closure(self) -> Expression {
        Expression::unary(UnaryExprOp::ReflexiveClosure, self)
    }

    /// The comprehension `{ decls | formula }`.
    pub fn comprehension(decls: Decls, formula: Formula) -> Expression {
        Expression::Ref(Arc::new(ExprInner::Comprehension { decls, formula }))
    }

    pub(crate) fn if_then_else(
        condition: Formula,
        then_expr: Expression,
        else_expr: Expression,
    ) -> Expression {
        assert_eq!(
            then_expr.arity(),
            else_expr.arity(),
            "arity mismatch between conditional branches"
        );
        Expression::Ref(Arc::new(ExprInner::IfThenElse { condition, then_expr, else_expr }))
    }
}

impl PartialEq for Expression {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Expression::Relation(a), Expression::Relation(b)) => a == b,
            (Expression::Variable(a), Expression::Variable(b)) => a == b,
            (Expression::Univ, Expression::Univ)
            | (Expression::None, Expression::None)
            | (Expression::Iden, Expression::Iden)
            | (Expression::Ints, Expression::Ints) => true,
            (Expression::Ref(a), Expression::Ref(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl Eq for Expression {}

impl std::hash::Hash for Expression {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            Expression::Relation(r) => r.hash(state),
            Expression::Variable(v) => v.hash(state),
            Expression::Ref(inner) => Arc::as_ptr(inner).hash(state),
            _ => {}
        }
    }
}

impl From<Relation> for Expression {
    fn from(r: Relation) -> Self {
        Expression::Relation(r)
    }
}

impl From<&Relation> for Expression {
    fn from(r: &Relation) -> Self {
        Expression::Relation(r.clone())
    }
}

impl From<Variable> for Expression {
    fn from(v: Variable) -> Self {
        Expression::Variable(v)
    }
}

impl From<&Variable> for Expression {
    fn from(v: &Variable) -> Self {
        Expression::Variable(v.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn arity_rules() {
        let r = Expression::from(Relation::binary("r"));
        let s = Expression::from(Relation::unary("s"));

        assert_eq!(r.clone().join(s.clone()).arity(), 1);
        assert_eq!(s.clone().product(r.clone()).arity(), 3);
        assert_eq!(r.clone().transpose().arity(), 2);
        assert_eq!(r.clone().closure().arity(), 2);
        assert_eq!(Expression::IDEN.arity(), 2);
        assert_eq!(Expression::UNIV.arity(), 1);
    }

    #[test]
    #[should_panic(expected = "arity mismatch")]
    fn union_rejects_mixed_arity() {
        let r = Expression::from(Relation::binary("r"));
        let s = Expression::from(Relation::unary("s"));
        let _ = r.union(s);
    }

    #[test]
    #[should_panic(expected = "cannot join two unary")]
    fn join_rejects_unary_pair() {
        let a = Expression::from(Relation::unary("a"));
        let b = Expression::from(Relation::unary("b"));
        let _ = a.join(b);
    }

    #[test]
    #[should_panic(expected = "requires a binary operand")]
    fn closure_rejects_ternary() {
        let t = Expression::from(Relation::ternary("t"));
        let _ = t.closure();
    }

    #[test]
    fn identity_equality() {
        let r = Relation::unary("r");
        let e1 = Expression::from(&r).union(Expression::from(&r));
        let e2 = Expression::from(&r).union(Expression::from(&r));
        assert_eq!(e1, e1.clone());
        // structurally identical but distinct nodes
        assert_ne!(e1, e2);
    }
}
