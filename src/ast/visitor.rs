//! Structural sharing analysis and node-level detectors
//!
//! The AST is a DAG: subtrees reachable through more than one parent are
//! translated once and reused. [`AnnotatedNode`] records which nodes those
//! are, keyed by node identity; later passes consult it to decide what may be
//! cached. Free-variable and quantified-descendant detection live here too,
//! since cache safety depends on both.

use std::rc::Rc;
use std::sync::Arc;

use rustc_hash::{FxHashMap, FxHashSet};

use super::{
    Decls, ExprInner, Expression, Formula, FormulaInner, IntExprInner, IntExpression,
    RelationPredicate, Variable,
};

/// The identity of an internal AST node.
///
/// Leaves and inline constants have no identity; they are never shared in the
/// sense that matters to translation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

/// Returns the identity of an expression node, if it is an internal node.
pub fn expr_id(expr: &Expression) -> Option<NodeId> {
    match expr {
        Expression::Ref(inner) => Some(NodeId(Arc::as_ptr(inner) as usize)),
        _ => None,
    }
}

/// Returns the identity of a formula node, if it is an internal node.
pub fn formula_id(formula: &Formula) -> Option<NodeId> {
    match formula {
        Formula::Ref(inner) => Some(NodeId(Arc::as_ptr(inner) as usize)),
        _ => None,
    }
}

/// Returns the identity of an integer expression node, if it is an internal
/// node.
pub fn int_expr_id(expr: &IntExpression) -> Option<NodeId> {
    match expr {
        IntExpression::Ref(inner) => Some(NodeId(Arc::as_ptr(inner) as usize)),
        _ => None,
    }
}

/// A formula annotated with the identities of its shared descendants.
pub struct AnnotatedNode {
    root: Formula,
    shared: FxHashSet<NodeId>,
    sources: FxHashMap<NodeId, Formula>,
}

impl AnnotatedNode {
    /// Annotates `root` by detecting its shared internal descendants.
    pub fn new(root: Formula) -> Self {
        let mut detector = SharingDetector::default();
        detector.visit_formula(&root);
        let shared = detector
            .status
            .into_iter()
            .filter_map(|(id, shared)| shared.then_some(id))
            .collect();
        Self { root, shared, sources: FxHashMap::default() }
    }

    /// Annotates a rewritten formula, recording for each rewritten node the
    /// node it was derived from.
    pub fn with_sources(root: Formula, sources: FxHashMap<NodeId, Formula>) -> Self {
        let mut annotated = Self::new(root);
        annotated.sources = sources;
        annotated
    }

    /// Returns the annotated formula.
    pub fn root(&self) -> &Formula {
        &self.root
    }

    /// Returns the identities of all internal descendants with more than one
    /// parent.
    pub fn shared(&self) -> &FxHashSet<NodeId> {
        &self.shared
    }

    /// Returns the node the given rewritten node was derived from, if it was
    /// recorded.
    pub fn source_of(&self, id: NodeId) -> Option<&Formula> {
        self.sources.get(&id)
    }

    /// Returns the rewritten-node provenance map.
    pub fn sources(&self) -> &FxHashMap<NodeId, Formula> {
        &self.sources
    }
}

/// Maps each visited internal node to false on first sight and true on any
/// later sight; children are descended only once.
#[derive(Default)]
struct SharingDetector {
    status: FxHashMap<NodeId, bool>,
}

impl SharingDetector {
    /// Records a visit; returns true if the node was seen before.
    fn visited(&mut self, id: NodeId) -> bool {
        match self.status.entry(id) {
            std::collections::hash_map::Entry::Occupied(mut e) => {
                e.insert(true);
                true
            }
            std::collections::hash_map::Entry::Vacant(e) => {
                e.insert(false);
                false
            }
        }
    }

    fn visit_formula(&mut self, formula: &Formula) {
        let Some(id) = formula_id(formula) else { return };
        if self.visited(id) {
            return;
        }
        match formula.inner() {
            FormulaInner::Not(f) => self.visit_formula(f),
            FormulaInner::Binary { left, right, .. } => {
                self.visit_formula(left);
                self.visit_formula(right);
            }
            FormulaInner::Comparison { left, right, .. } => {
                self.visit_expr(left);
                self.visit_expr(right);
            }
            FormulaInner::Multiplicity { expr, .. } => self.visit_expr(expr),
            FormulaInner::Quantified { decls, body, .. } => {
                self.visit_decls(decls);
                self.visit_formula(body);
            }
            FormulaInner::IntComparison { left, right, .. } => {
                self.visit_int(left);
                self.visit_int(right);
            }
            FormulaInner::Predicate(pred) => {
                if let RelationPredicate::Function { domain, range, .. } = pred {
                    self.visit_expr(domain);
                    self.visit_expr(range);
                }
            }
        }
    }

    fn visit_expr(&mut self, expr: &Expression) {
        let Some(id) = expr_id(expr) else { return };
        if self.visited(id) {
            return;
        }
        match expr.inner() {
            ExprInner::Binary { left, right, .. } => {
                self.visit_expr(left);
                self.visit_expr(right);
            }
            ExprInner::Unary { expr, .. } => self.visit_expr(expr),
            ExprInner::Comprehension { decls, formula } => {
                self.visit_decls(decls);
                self.visit_formula(formula);
            }
            ExprInner::IfThenElse { condition, then_expr, else_expr } => {
                self.visit_formula(condition);
                self.visit_expr(then_expr);
                self.visit_expr(else_expr);
            }
            ExprInner::IntCast(int) => self.visit_int(int),
        }
    }

    fn visit_int(&mut self, int: &IntExpression) {
        let Some(id) = int_expr_id(int) else { return };
        if self.visited(id) {
            return;
        }
        match int.inner() {
            IntExprInner::Unary { expr, .. } => self.visit_int(expr),
            IntExprInner::Binary { left, right, .. } => {
                self.visit_int(left);
                self.visit_int(right);
            }
            IntExprInner::Sum { decls, body } => {
                self.visit_decls(decls);
                self.visit_int(body);
            }
            IntExprInner::Cast { expr, .. } => self.visit_expr(expr),
            IntExprInner::IfThenElse { condition, then_expr, else_expr } => {
                self.visit_formula(condition);
                self.visit_int(then_expr);
                self.visit_int(else_expr);
            }
        }
    }

    fn visit_decls(&mut self, decls: &Decls) {
        for decl in decls.iter() {
            self.visit_expr(decl.expression());
        }
    }
}

impl Formula {
    /// Returns the inner node of a compound formula.
    ///
    /// # Panics
    /// Panics on the constants; callers match those first.
    pub(crate) fn inner(&self) -> &FormulaInner {
        match self {
            Formula::Ref(inner) => inner,
            _ => panic!("constant formula has no inner node"),
        }
    }
}

impl Expression {
    pub(crate) fn inner(&self) -> &ExprInner {
        match self {
            Expression::Ref(inner) => inner,
            _ => panic!("leaf expression has no inner node"),
        }
    }
}

impl IntExpression {
    pub(crate) fn inner(&self) -> &IntExprInner {
        match self {
            IntExpression::Ref(inner) => inner,
            IntExpression::Constant(_) => panic!("constant has no inner node"),
        }
    }
}

/// Computes, per node, the set of variables free in that node; results for
/// shared nodes are cached, since a node's free variables do not depend on
/// where it occurs.
pub struct FreeVariableDetector<'a> {
    shared: &'a FxHashSet<NodeId>,
    cache: FxHashMap<NodeId, Rc<FxHashSet<Variable>>>,
    empty: Rc<FxHashSet<Variable>>,
}

impl<'a> FreeVariableDetector<'a> {
    /// Creates a detector caching results for the given shared nodes.
    pub fn new(shared: &'a FxHashSet<NodeId>) -> Self {
        Self {
            shared,
            cache: FxHashMap::default(),
            empty: Rc::new(FxHashSet::default()),
        }
    }

    /// Returns true if the formula has no free variables.
    pub fn closed(&mut self, formula: &Formula) -> bool {
        self.free_in_formula(formula).is_empty()
    }

    /// Returns true if the expression has no free variables.
    pub fn closed_expr(&mut self, expr: &Expression) -> bool {
        self.free_in_expr(expr).is_empty()
    }

    /// Returns true if the integer expression has no free variables.
    pub fn closed_int(&mut self, int: &IntExpression) -> bool {
        self.free_in_int(int).is_empty()
    }

    fn merge(&self, sets: Vec<Rc<FxHashSet<Variable>>>) -> Rc<FxHashSet<Variable>> {
        let mut nonempty: Vec<_> = sets.into_iter().filter(|s| !s.is_empty()).collect();
        match nonempty.len() {
            0 => Rc::clone(&self.empty),
            1 => nonempty.pop().unwrap(),
            _ => {
                let mut merged = FxHashSet::default();
                for set in nonempty {
                    merged.extend(set.iter().cloned());
                }
                Rc::new(merged)
            }
        }
    }

    /// Free variables of `decls` and a body already analyzed to `body_free`:
    /// each declaration's expression sees the variables declared before it,
    /// and the body sees them all.
    fn scope(&mut self, decls: &Decls, body_free: Rc<FxHashSet<Variable>>) -> Rc<FxHashSet<Variable>> {
        let mut free = FxHashSet::default();
        let mut bound: FxHashSet<Variable> = FxHashSet::default();
        for decl in decls.iter() {
            let expr_free = self.free_in_expr(decl.expression());
            free.extend(expr_free.iter().filter(|v| !bound.contains(v)).cloned());
            bound.insert(decl.variable().clone());
        }
        free.extend(body_free.iter().filter(|v| !bound.contains(v)).cloned());
        if free.is_empty() {
            Rc::clone(&self.empty)
        } else {
            Rc::new(free)
        }
    }

    /// Returns the free variables of a formula.
    pub fn free_in_formula(&mut self, formula: &Formula) -> Rc<FxHashSet<Variable>> {
        let id = formula_id(formula);
        if let Some(id) = id {
            if let Some(cached) = self.cache.get(&id) {
                return Rc::clone(cached);
            }
        }
        let result = match formula {
            Formula::True | Formula::False => Rc::clone(&self.empty),
            Formula::Ref(_) => match formula.inner() {
                FormulaInner::Not(f) => self.free_in_formula(f),
                FormulaInner::Binary { left, right, .. } => {
                    let sets = vec![self.free_in_formula(left), self.free_in_formula(right)];
                    self.merge(sets)
                }
                FormulaInner::Comparison { left, right, .. } => {
                    let sets = vec![self.free_in_expr(left), self.free_in_expr(right)];
                    self.merge(sets)
                }
                FormulaInner::Multiplicity { expr, .. } => self.free_in_expr(expr),
                FormulaInner::Quantified { decls, body, .. } => {
                    let body_free = self.free_in_formula(body);
                    self.scope(decls, body_free)
                }
                FormulaInner::IntComparison { left, right, .. } => {
                    let sets = vec![self.free_in_int(left), self.free_in_int(right)];
                    self.merge(sets)
                }
                FormulaInner::Predicate(pred) => match pred {
                    RelationPredicate::Function { domain, range, .. } => {
                        let sets = vec![self.free_in_expr(domain), self.free_in_expr(range)];
                        self.merge(sets)
                    }
                    _ => Rc::clone(&self.empty),
                },
            },
        };
        if let Some(id) = id {
            if self.shared.contains(&id) {
                self.cache.insert(id, Rc::clone(&result));
            }
        }
        result
    }

    /// Returns the free variables of an expression.
    pub fn free_in_expr(&mut self, expr: &Expression) -> Rc<FxHashSet<Variable>> {
        let id = expr_id(expr);
        if let Some(id) = id {
            if let Some(cached) = self.cache.get(&id) {
                return Rc::clone(cached);
            }
        }
        let result = match expr {
            Expression::Variable(v) => {
                let mut set = FxHashSet::default();
                set.insert(v.clone());
                Rc::new(set)
            }
            Expression::Ref(_) => match expr.inner() {
                ExprInner::Binary { left, right, .. } => {
                    let sets = vec![self.free_in_expr(left), self.free_in_expr(right)];
                    self.merge(sets)
                }
                ExprInner::Unary { expr, .. } => self.free_in_expr(expr),
                ExprInner::Comprehension { decls, formula } => {
                    let body_free = self.free_in_formula(formula);
                    self.scope(decls, body_free)
                }
                ExprInner::IfThenElse { condition, then_expr, else_expr } => {
                    let sets = vec![
                        self.free_in_formula(condition),
                        self.free_in_expr(then_expr),
                        self.free_in_expr(else_expr),
                    ];
                    self.merge(sets)
                }
                ExprInner::IntCast(int) => self.free_in_int(int),
            },
            _ => Rc::clone(&self.empty),
        };
        if let Some(id) = id {
            if self.shared.contains(&id) {
                self.cache.insert(id, Rc::clone(&result));
            }
        }
        result
    }

    /// Returns the free variables of an integer expression.
    pub fn free_in_int(&mut self, int: &IntExpression) -> Rc<FxHashSet<Variable>> {
        let id = int_expr_id(int);
        if let Some(id) = id {
            if let Some(cached) = self.cache.get(&id) {
                return Rc::clone(cached);
            }
        }
        let result = match int {
            IntExpression::Constant(_) => Rc::clone(&self.empty),
            IntExpression::Ref(_) => match int.inner() {
                IntExprInner::Unary { expr, .. } => self.free_in_int(expr),
                IntExprInner::Binary { left, right, .. } => {
                    let sets = vec![self.free_in_int(left), self.free_in_int(right)];
                    self.merge(sets)
                }
                IntExprInner::Sum { decls, body } => {
                    let body_free = self.free_in_int(body);
                    self.scope(decls, body_free)
                }
                IntExprInner::Cast { expr, .. } => self.free_in_expr(expr),
                IntExprInner::IfThenElse { condition, then_expr, else_expr } => {
                    let sets = vec![
                        self.free_in_formula(condition),
                        self.free_in_int(then_expr),
                        self.free_in_int(else_expr),
                    ];
                    self.merge(sets)
                }
            },
        };
        if let Some(id) = id {
            if self.shared.contains(&id) {
                self.cache.insert(id, Rc::clone(&result));
            }
        }
        result
    }
}

/// Detects whether a node has a quantified-formula descendant, caching
/// results for shared nodes.
pub struct QuantifiedFormulaDetector<'a> {
    shared: &'a FxHashSet<NodeId>,
    cache: FxHashMap<NodeId, bool>,
}

impl<'a> QuantifiedFormulaDetector<'a> {
    /// Creates a detector caching results for the given shared nodes.
    pub fn new(shared: &'a FxHashSet<NodeId>) -> Self {
        Self { shared, cache: FxHashMap::default() }
    }

    /// Returns true if the formula is or contains a quantified formula.
    pub fn detect(&mut self, formula: &Formula) -> bool {
        let id = formula_id(formula);
        if let Some(id) = id {
            if let Some(&cached) = self.cache.get(&id) {
                return cached;
            }
        }
        let result = match formula {
            Formula::True | Formula::False => false,
            Formula::Ref(_) => match formula.inner() {
                FormulaInner::Quantified { .. } => true,
                FormulaInner::Not(f) => self.detect(f),
                FormulaInner::Binary { left, right, .. } => self.detect(left) || self.detect(right),
                FormulaInner::Comparison { left, right, .. } => {
                    self.detect_expr(left) || self.detect_expr(right)
                }
                FormulaInner::Multiplicity { expr, .. } => self.detect_expr(expr),
                FormulaInner::IntComparison { left, right, .. } => {
                    self.detect_int(left) || self.detect_int(right)
                }
                FormulaInner::Predicate(pred) => match pred {
                    RelationPredicate::Function { domain, range, .. } => {
                        self.detect_expr(domain) || self.detect_expr(range)
                    }
                    _ => false,
                },
            },
        };
        if let Some(id) = id {
            if self.shared.contains(&id) {
                self.cache.insert(id, result);
            }
        }
        result
    }

    fn detect_expr(&mut self, expr: &Expression) -> bool {
        match expr {
            Expression::Ref(_) => match expr.inner() {
                ExprInner::Binary { left, right, .. } => {
                    self.detect_expr(left) || self.detect_expr(right)
                }
                ExprInner::Unary { expr, .. } => self.detect_expr(expr),
                ExprInner::Comprehension { decls, formula } => {
                    decls.iter().any(|d| self.detect_expr(d.expression()))
                        || self.detect(formula)
                }
                ExprInner::IfThenElse { condition, then_expr, else_expr } => {
                    self.detect(condition)
                        || self.detect_expr(then_expr)
                        || self.detect_expr(else_expr)
                }
                ExprInner::IntCast(int) => self.detect_int(int),
            },
            _ => false,
        }
    }

    fn detect_int(&mut self, int: &IntExpression) -> bool {
        match int {
            IntExpression::Constant(_) => false,
            IntExpression::Ref(_) => match int.inner() {
                IntExprInner::Unary { expr, .. } => self.detect_int(expr),
                IntExprInner::Binary { left, right, .. } => {
                    self.detect_int(left) || self.detect_int(right)
                }
                IntExprInner::Sum { decls, body } => {
                    decls.iter().any(|d| self.detect_expr(d.expression()))
                        || self.detect_int(body)
                }
                IntExprInner::Cast { expr, .. } => self.detect_expr(expr),
                IntExprInner::IfThenElse { condition, then_expr, else_expr } => {
                    self.detect(condition)
                        || self.detect_int(then_expr)
                        || self.detect_int(else_expr)
                }
            },
        }
    }
}
