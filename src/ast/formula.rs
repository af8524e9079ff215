//! Formulas, declarations, and relation predicates

use std::sync::Arc;

use super::expr::Expression;
use super::int_expr::{IntCompareOp, IntExpression};
use super::{Relation, Variable};

/// Binary formula operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryFormulaOp {
    /// Conjunction
    And,
    /// Disjunction
    Or,
    /// Implication
    Implies,
    /// Biconditional
    Iff,
}

/// Expression comparison operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompareOp {
    /// Set equality
    Equals,
    /// Subset
    Subset,
}

/// Multiplicities, used both in declarations and in multiplicity formulas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Multiplicity {
    /// No elements (formulas only)
    No,
    /// At most one element
    Lone,
    /// Exactly one element
    One,
    /// At least one element
    Some,
    /// Any number of elements (declarations only)
    Set,
}

/// Quantifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Quantifier {
    /// Universal quantification
    All,
    /// Existential quantification
    Some,
}

/// A first-order formula.
///
/// The constants are inline variants; compound formulas are `Arc`-shared and
/// compared by reference.
#[derive(Clone, Debug)]
pub enum Formula {
    /// Constant true
    True,
    /// Constant false
    False,
    /// A compound formula
    Ref(Arc<FormulaInner>),
}

/// Inner representation of compound formulas.
#[derive(Clone, Debug)]
pub enum FormulaInner {
    /// Negation
    Not(Formula),
    /// Binary formula
    Binary {
        /// Operator
        op: BinaryFormulaOp,
        /// Left operand
        left: Formula,
        /// Right operand
        right: Formula,
    },
    /// Expression comparison
    Comparison {
        /// Operator
        op: CompareOp,
        /// Left operand
        left: Expression,
        /// Right operand
        right: Expression,
    },
    /// Multiplicity constraint on an expression
    Multiplicity {
        /// The multiplicity; never `Set`
        mult: Multiplicity,
        /// Constrained expression
        expr: Expression,
    },
    /// Quantified formula
    Quantified {
        /// The quantifier
        quantifier: Quantifier,
        /// Bound declarations
        decls: Decls,
        /// Body
        body: Formula,
    },
    /// Integer comparison
    IntComparison {
        /// Operator
        op: IntCompareOp,
        /// Left operand
        left: IntExpression,
        /// Right operand
        right: IntExpression,
    },
    /// Relation predicate
    Predicate(RelationPredicate),
}

impl Formula {
    /// Constant true formula.
    pub const TRUE: Formula = Formula::True;
    /// Constant false formula.
    pub const FALSE: Formula = Formula::False;

    /// Returns the constant formula with the given value.
    pub fn constant(value: bool) -> Formula {
        if value { Formula::True } else { Formula::False }
    }

    fn wrap(inner: FormulaInner) -> Formula {
        Formula::Ref(Arc::new(inner))
    }

    /// Negation of this formula.
    pub fn not(self) -> Formula {
        Formula::wrap(FormulaInner::Not(self))
    }

    /// Conjunction of this formula and `other`.
    pub fn and(self, other: Formula) -> Formula {
        self.compose(BinaryFormulaOp::And, other)
    }

    /// Disjunction of this formula and `other`.
    pub fn or(self, other: Formula) -> Formula {
        self.compose(BinaryFormulaOp::Or, other)
    }

    /// Implication from this formula to `other`.
    pub fn implies(self, other: Formula) -> Formula {
        self.compose(BinaryFormulaOp::Implies, other)
    }

    /// Biconditional of this formula and `other`.
    pub fn iff(self, other: Formula) -> Formula {
        self.compose(BinaryFormulaOp::Iff, other)
    }

    /// Combines this formula with `other` using the given operator.
    pub fn compose(self, op: BinaryFormulaOp, other: Formula) -> Formula {
        Formula::wrap(FormulaInner::Binary { op, left: self, right: other })
    }

    /// Conjunction of all the given formulas; true when empty.
    pub fn and_all<I: IntoIterator<Item = Formula>>(formulas: I) -> Formula {
        let mut iter = formulas.into_iter();
        match iter.next() {
            Option::None => Formula::True,
            Option::Some(first) => iter.fold(first, Formula::and),
        }
    }

    /// Disjunction of all the given formulas; false when empty.
    pub fn or_all<I: IntoIterator<Item = Formula>>(formulas: I) -> Formula {
        let mut iter = formulas.into_iter();
        match iter.next() {
            Option::None => Formula::False,
            Option::Some(first) => iter.fold(first, Formula::or),
        }
    }

    /// Universal quantification of `body` over `decls`.
    pub fn forall(decls: Decls, body: Formula) -> Formula {
        Formula::quantify(Quantifier::All, decls, body)
    }

    /// Existential quantification of `body` over `decls`.
    pub fn exists(decls: Decls, body: Formula) -> Formula {
        Formula::quantify(Quantifier::Some, decls, body)
    }

    /// Quantification of `body` over `decls` with the given quantifier.
    pub fn quantify(quantifier: Quantifier, decls: Decls, body: Formula) -> Formula {
        Formula::wrap(FormulaInner::Quantified { quantifier, decls, body })
    }

    /// Comparison of two integer expressions.
    pub fn int_comparison(left: IntExpression, op: IntCompareOp, right: IntExpression) -> Formula {
        Formula::wrap(FormulaInner::IntComparison { op, left, right })
    }

    /// Wraps a relation predicate as a formula.
    pub fn predicate(pred: RelationPredicate) -> Formula {
        Formula::wrap(FormulaInner::Predicate(pred))
    }

    /// The comprehension `{ decls | self }`.
    pub fn comprehension(self, decls: Decls) -> Expression {
        Expression::comprehension(decls, self)
    }

    /// The expression that is `then_expr` when this formula holds and
    /// `else_expr` otherwise.
    ///
    /// # Panics
    /// Panics if the branch arities differ.
    pub fn then_else(self, then_expr: Expression, else_expr: Expression) -> Expression {
        Expression::if_then_else(self, then_expr, else_expr)
    }

    /// The integer expression that is `then_expr` when this formula holds and
    /// `else_expr` otherwise.
    pub fn then_else_int(self, then_expr: IntExpression, else_expr: IntExpression) -> IntExpression {
        IntExpression::if_then_else(self, then_expr, else_expr)
    }
}

impl PartialEq for Formula {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Formula::True, Formula::True) | (Formula::False, Formula::False) => true,
            (Formula::Ref(a), Formula::Ref(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl Eq for Formula {}

impl std::hash::Hash for Formula {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        if let Formula::Ref(inner) = self {
            Arc::as_ptr(inner).hash(state);
        }
    }
}

impl Expression {
    /// The formula `self = other`.
    ///
    /// # Panics
    /// Panics if the arities differ.
    pub fn equals(self, other: Expression) -> Formula {
        assert_eq!(self.arity(), other.arity(), "cannot compare expressions of different arity");
        Formula::wrap(FormulaInner::Comparison { op: CompareOp::Equals, left: self, right: other })
    }

    /// The formula `self in other`.
    ///
    /// # Panics
    /// Panics if the arities differ.
    pub fn in_set(self, other: Expression) -> Formula {
        assert_eq!(self.arity(), other.arity(), "cannot compare expressions of different arity");
        Formula::wrap(FormulaInner::Comparison { op: CompareOp::Subset, left: self, right: other })
    }

    /// The formula stating this expression has at least one tuple.
    pub fn some(self) -> Formula {
        self.apply(Multiplicity::Some)
    }

    /// The formula stating this expression has exactly one tuple.
    pub fn one(self) -> Formula {
        self.apply(Multiplicity::One)
    }

    /// The formula stating this expression has at most one tuple.
    pub fn lone(self) -> Formula {
        self.apply(Multiplicity::Lone)
    }

    /// The formula stating this expression has no tuples.
    pub fn no(self) -> Formula {
        self.apply(Multiplicity::No)
    }

    /// The multiplicity formula `mult self`.
    ///
    /// # Panics
    /// Panics if `mult` is `Set`, which is meaningful only in declarations.
    pub fn apply(self, mult: Multiplicity) -> Formula {
        assert!(mult != Multiplicity::Set, "`set` is not a multiplicity formula");
        Formula::wrap(FormulaInner::Multiplicity { mult, expr: self })
    }
}

/// A declaration binding one variable to an expression with a multiplicity.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Decl {
    variable: Variable,
    multiplicity: Multiplicity,
    expression: Expression,
}

impl Decl {
    /// Creates a declaration.
    ///
    /// # Panics
    /// Panics if the variable's arity differs from the expression's, or the
    /// multiplicity is `No`.
    pub fn new(variable: Variable, multiplicity: Multiplicity, expression: Expression) -> Self {
        assert_eq!(
            variable.arity(),
            expression.arity(),
            "declared variable and expression must have the same arity"
        );
        assert!(multiplicity != Multiplicity::No, "`no` is not a declaration multiplicity");
        Self { variable, multiplicity, expression }
    }

    /// Declares `variable: one expression`.
    pub fn one_of(variable: &Variable, expression: Expression) -> Self {
        Self::new(variable.clone(), Multiplicity::One, expression)
    }

    /// Declares `variable: lone expression`.
    pub fn lone_of(variable: &Variable, expression: Expression) -> Self {
        Self::new(variable.clone(), Multiplicity::Lone, expression)
    }

    /// Declares `variable: some expression`.
    pub fn some_of(variable: &Variable, expression: Expression) -> Self {
        Self::new(variable.clone(), Multiplicity::Some, expression)
    }

    /// Declares `variable: set expression`.
    pub fn set_of(variable: &Variable, expression: Expression) -> Self {
        Self::new(variable.clone(), Multiplicity::Set, expression)
    }

    /// Returns the declared variable.
    pub fn variable(&self) -> &Variable {
        &self.variable
    }

    /// Returns the multiplicity.
    pub fn multiplicity(&self) -> Multiplicity {
        self.multiplicity
    }

    /// Returns the domain expression.
    pub fn expression(&self) -> &Expression {
        &self.expression
    }
}

/// A nonempty ordered sequence of declarations.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Decls {
    decls: Arc<Vec<Decl>>,
}

impl Decls {
    /// Creates a sequence holding a single declaration.
    pub fn from(decl: Decl) -> Self {
        Self { decls: Arc::new(vec![decl]) }
    }

    /// Creates a sequence from the given declarations.
    ///
    /// # Panics
    /// Panics if `decls` is empty.
    pub fn from_vec(decls: Vec<Decl>) -> Self {
        assert!(!decls.is_empty(), "declarations must be nonempty");
        Self { decls: Arc::new(decls) }
    }

    /// Returns a new sequence with `decl` appended.
    pub fn and(&self, decl: Decl) -> Self {
        let mut decls = (*self.decls).clone();
        decls.push(decl);
        Self { decls: Arc::new(decls) }
    }

    /// Returns the number of declarations.
    pub fn size(&self) -> usize {
        self.decls.len()
    }

    /// Returns the declaration at the given position.
    pub fn get(&self, i: usize) -> &Decl {
        &self.decls[i]
    }

    /// Returns an iterator over the declarations.
    pub fn iter(&self) -> impl Iterator<Item = &Decl> {
        self.decls.iter()
    }
}

/// Built-in predicates over relations, expanded to their relational
/// definitions during translation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RelationPredicate {
    /// The relation has no cycles: `no (^r & iden)`.
    Acyclic {
        /// Constrained binary relation
        relation: Relation,
    },
    /// The relation is a total function from `domain` to `range`.
    Function {
        /// Constrained binary relation
        relation: Relation,
        /// Domain of the function
        domain: Expression,
        /// Range of the function
        range: Expression,
    },
    /// The relation totally orders `ordered` with endpoints `first` and `last`.
    TotalOrdering {
        /// Constrained binary relation
        relation: Relation,
        /// Ordered set
        ordered: Relation,
        /// First element
        first: Relation,
        /// Last element
        last: Relation,
    },
}

impl RelationPredicate {
    /// Creates an acyclicity predicate.
    ///
    /// # Panics
    /// Panics unless `relation` is binary.
    pub fn acyclic(relation: Relation) -> Self {
        assert_eq!(relation.arity(), 2, "acyclic requires a binary relation");
        RelationPredicate::Acyclic { relation }
    }

    /// Creates a function predicate.
    ///
    /// # Panics
    /// Panics unless `relation` is binary and `domain`/`range` are unary.
    pub fn function(relation: Relation, domain: Expression, range: Expression) -> Self {
        assert_eq!(relation.arity(), 2, "function requires a binary relation");
        assert_eq!(domain.arity(), 1, "function domain must be unary");
        assert_eq!(range.arity(), 1, "function range must be unary");
        RelationPredicate::Function { relation, domain, range }
    }

    /// Creates a total-ordering predicate.
    ///
    /// # Panics
    /// Panics unless `relation` is binary and the other relations are unary.
    pub fn total_ordering(relation: Relation, ordered: Relation, first: Relation, last: Relation) -> Self {
        assert_eq!(relation.arity(), 2, "total ordering requires a binary relation");
        assert_eq!(ordered.arity(), 1, "ordered set must be unary");
        assert_eq!(first.arity(), 1, "first must be unary");
        assert_eq!(last.arity(), 1, "last must be unary");
        RelationPredicate::TotalOrdering { relation, ordered, first, last }
    }

    /// Returns the relation constrained by this predicate.
    pub fn relation(&self) -> &Relation {
        match self {
            RelationPredicate::Acyclic { relation }
            | RelationPredicate::Function { relation, .. }
            | RelationPredicate::TotalOrdering { relation, .. } => relation,
        }
    }

    /// Expands this predicate to the formula that defines it.
    pub fn to_constraints(&self) -> Formula {
        match self {
            RelationPredicate::Acyclic { relation } => Expression::from(relation)
                .closure()
                .intersection(Expression::IDEN)
                .no(),
            RelationPredicate::Function { relation, domain, range } => {
                // r in domain->range && all x: domain | one x.r
                let in_product = Expression::from(relation)
                    .in_set(domain.clone().product(range.clone()));
                let x = Variable::unary(format!("x_{}", relation.name()));
                let image_one = Expression::from(&x).join(Expression::from(relation)).one();
                let total = Formula::forall(
                    Decls::from(Decl::one_of(&x, domain.clone())),
                    image_one,
                );
                in_product.and(total)
            }
            RelationPredicate::TotalOrdering { relation, ordered, first, last } => {
                let r = || Expression::from(relation);
                let endpoints = Expression::from(first)
                    .one()
                    .and(Expression::from(last).one())
                    .and(Expression::from(last).in_set(Expression::from(ordered)));
                // ordered = first.*r
                let span = Expression::from(ordered)
                    .equals(Expression::from(first).join(r().reflexive_closure()));
                // nothing precedes first, nothing follows last
                let ends = r()
                    .join(Expression::from(first))
                    .no()
                    .and(Expression::from(last).join(r()).no());
                // every non-last element has exactly one successor
                let e = Variable::unary(format!("e_{}", relation.name()));
                let successor = Formula::forall(
                    Decls::from(Decl::one_of(
                        &e,
                        Expression::from(ordered).difference(Expression::from(last)),
                    )),
                    Expression::from(&e).join(r()).one(),
                );
                endpoints.and(span).and(ends).and(successor)
            }
        }
    }
}
