//! Translation of relational formulas to SAT
//!
//! The pipeline: annotate the formula with sharing information, skolemize,
//! interpret relation leaves as matrices of primary variables, evaluate the
//! AST into a single circuit value, then clausify it into a SAT solver. A
//! root that folds to a constant short-circuits as a trivial result instead
//! of reaching CNF.

pub(crate) mod environment;
mod leaf_interpreter;

pub use leaf_interpreter::LeafInterpreter;

use std::ops::Range;

use indexmap::IndexMap;
use rustc_hash::{FxHashMap, FxHashSet};

use crate::ast::visitor::{
    expr_id, formula_id, int_expr_id, AnnotatedNode, FreeVariableDetector, NodeId,
};
use crate::ast::{
    BinaryExprOp, BinaryFormulaOp, BinaryIntOp, CastOp, CompareOp, Decl, Decls, ExprInner,
    Expression, Formula, FormulaInner, IntCompareOp, IntExprInner, IntExpression, Multiplicity,
    Quantifier, Relation, UnaryExprOp, UnaryIntOp,
};
use crate::bool::{BoolValue, BooleanFactory, BooleanMatrix, Dimensions, Int};
use crate::cnf::clausify;
use crate::config::Options;
use crate::engine::SatSolver;
use crate::instance::{Bounds, Instance};
use crate::simplify::Skolemizer;
use crate::{RelicError, Result};

use environment::Environment;

/// The outcome of translation: a CNF loaded into the solver, or a formula
/// that folded to a constant before the root was reified.
pub enum Translated {
    /// The clauses are in the solver; the payload maps them back to
    /// relations.
    Cnf(Translation),
    /// The root circuit was constant; no variables or clauses exist.
    Trivial {
        /// The constant the formula folded to.
        value: bool,
        /// The bounds as of the fold, including any skolem relations.
        bounds: Bounds,
    },
}

/// The relational view of a loaded CNF: which primary variables belong to
/// which relation, over which (possibly skolem-extended) bounds.
pub struct Translation {
    bounds: Bounds,
    primary: IndexMap<Relation, Range<u32>>,
    num_primary: u32,
    num_variables: u32,
    num_clauses: u32,
    log: Option<TranslationLog>,
}

impl Translation {
    /// Returns the bounds the translation ran against, including skolem
    /// relations.
    pub fn bounds(&self) -> &Bounds {
        &self.bounds
    }

    /// Returns the number of primary variables.
    pub fn num_primary_variables(&self) -> u32 {
        self.num_primary
    }

    /// Returns the total number of CNF variables.
    pub fn num_variables(&self) -> u32 {
        self.num_variables
    }

    /// Returns the number of CNF clauses.
    pub fn num_clauses(&self) -> u32 {
        self.num_clauses
    }

    /// Returns the primary variables allocated to `relation`, if any.
    pub fn primary_variables(&self, relation: &Relation) -> Option<Range<u32>> {
        self.primary.get(relation).cloned()
    }

    /// Returns the translation log, when `log_translation` was set.
    pub fn log(&self) -> Option<&TranslationLog> {
        self.log.as_ref()
    }

    /// Reconstructs the instance encoded by the solver's current model.
    /// Meaningful only after a successful solve.
    pub fn interpret<S: SatSolver>(&self, solver: &S) -> Instance {
        let mut instance = Instance::new(self.bounds.universe().clone());
        for relation in self.bounds.relations() {
            let lower = self.bounds.lower_bound(relation).unwrap();
            let upper = self.bounds.upper_bound(relation).unwrap();
            let mut tuples = lower.clone();
            let mut var = self.primary[relation].start;
            for index in upper.indices() {
                if !lower.contains_index(index) {
                    if solver.value_of(var) {
                        tuples.add_index(index);
                    }
                    var += 1;
                }
            }
            instance.add(relation.clone(), tuples);
        }
        for i in self.bounds.ints() {
            instance.add_int(i, self.bounds.int_bound(i).unwrap().clone());
        }
        instance
    }
}

/// Provenance recorded during skolemization: maps rewritten formulas back to
/// the nodes they were derived from.
pub struct TranslationLog {
    sources: FxHashMap<NodeId, Formula>,
}

impl TranslationLog {
    /// Returns the formula the given rewritten formula was derived from, if
    /// it was recorded.
    pub fn source_of(&self, rewritten: &Formula) -> Option<&Formula> {
        formula_id(rewritten).and_then(|id| self.sources.get(&id))
    }

    /// Returns the number of recorded rewrites.
    pub fn len(&self) -> usize {
        self.sources.len()
    }

    /// Returns true if nothing was rewritten.
    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }
}

/// Translates `formula` under `bounds` into `solver`.
///
/// The passed bounds are not touched; skolem relations extend an internal
/// copy that travels with the result.
///
/// # Errors
/// [`RelicError::UnboundLeaf`] for a free variable or unbound relation,
/// [`RelicError::HigherOrderDecl`] for a non-enumerable declaration that
/// survives skolemization, and [`RelicError::Aborted`] on cooperative
/// cancellation.
pub fn translate<S: SatSolver>(
    formula: &Formula,
    bounds: &Bounds,
    options: &Options,
    solver: &mut S,
) -> Result<Translated> {
    let annotated = AnnotatedNode::new(formula.clone());
    let mut work = bounds.clone();
    let annotated = if options.skolem_depth >= 0 {
        Skolemizer::skolemize(annotated, &mut work, options)?
    } else {
        annotated
    };

    options.reporter.translating_to_boolean();
    let interpreter = LeafInterpreter::exact(&work);
    let num_primary = interpreter.num_primary_variables();
    let factory = BooleanFactory::new(num_primary, options.sharing > 0, options.bitwidth);

    let root = Fol2Bool::new(&interpreter, &factory, options, annotated.shared())
        .formula(annotated.root())?;

    if let Some(value) = root.as_constant() {
        return Ok(Translated::Trivial { value, bounds: work });
    }

    options.reporter.translating_to_cnf();
    clausify(&root, num_primary, solver);

    let log = options
        .log_translation
        .then(|| TranslationLog { sources: annotated.sources().clone() });
    Ok(Translated::Cnf(Translation {
        primary: interpreter.variable_ranges(),
        bounds: work,
        num_primary,
        num_variables: solver.num_variables(),
        num_clauses: solver.num_clauses(),
        log,
    }))
}

/// Evaluates the AST into circuit values under an environment of variable
/// bindings.
struct Fol2Bool<'a> {
    interpreter: &'a LeafInterpreter,
    factory: &'a BooleanFactory,
    options: &'a Options,
    env: Environment<BooleanMatrix>,
    shared: &'a FxHashSet<NodeId>,
    free: FreeVariableDetector<'a>,
    formula_cache: FxHashMap<NodeId, BoolValue>,
    expr_cache: FxHashMap<NodeId, BooleanMatrix>,
    int_cache: FxHashMap<NodeId, Int>,
}

impl<'a> Fol2Bool<'a> {
    fn new(
        interpreter: &'a LeafInterpreter,
        factory: &'a BooleanFactory,
        options: &'a Options,
        shared: &'a FxHashSet<NodeId>,
    ) -> Self {
        Self {
            interpreter,
            factory,
            options,
            env: Environment::new(),
            shared,
            free: FreeVariableDetector::new(shared),
            formula_cache: FxHashMap::default(),
            expr_cache: FxHashMap::default(),
            int_cache: FxHashMap::default(),
        }
    }

    /// A declaration that reaches translation must range over single atoms.
    fn enumerable(&self, decl: &Decl) -> Result<()> {
        if decl.multiplicity() != Multiplicity::One || decl.variable().arity() != 1 {
            return Err(RelicError::HigherOrderDecl(format!(
                "{}: {:?} of arity {}",
                decl.variable(),
                decl.multiplicity(),
                decl.variable().arity()
            )));
        }
        Ok(())
    }

    fn formula(&mut self, formula: &Formula) -> Result<BoolValue> {
        if self.options.interrupted() {
            return Err(RelicError::Aborted("translation interrupted".to_string()));
        }
        let inner = match formula {
            Formula::True => return Ok(BoolValue::True),
            Formula::False => return Ok(BoolValue::False),
            Formula::Ref(_) => formula.inner(),
        };
        let id = formula_id(formula);
        if let Some(id) = id {
            if let Some(hit) = self.formula_cache.get(&id) {
                return Ok(hit.clone());
            }
        }

        let result = match inner {
            FormulaInner::Not(f) => {
                let value = self.formula(f)?;
                self.factory.not(value)
            }
            FormulaInner::Binary { op, left, right } => {
                let l = self.formula(left)?;
                let r = self.formula(right)?;
                match op {
                    BinaryFormulaOp::And => self.factory.and(l, r),
                    BinaryFormulaOp::Or => self.factory.or(l, r),
                    BinaryFormulaOp::Implies => self.factory.implies(l, r),
                    BinaryFormulaOp::Iff => self.factory.iff(l, r),
                }
            }
            FormulaInner::Comparison { op, left, right } => {
                let l = self.expression(left)?;
                let r = self.expression(right)?;
                match op {
                    CompareOp::Subset => l.subset(&r, self.factory),
                    CompareOp::Equals => l.equals(&r, self.factory),
                }
            }
            FormulaInner::Multiplicity { mult, expr } => {
                let m = self.expression(expr)?;
                match mult {
                    Multiplicity::No => m.none(self.factory),
                    Multiplicity::Some => m.some(self.factory),
                    Multiplicity::One => m.one(self.factory),
                    Multiplicity::Lone => m.lone(self.factory),
                    Multiplicity::Set => unreachable!("set multiplicity formulas cannot be built"),
                }
            }
            FormulaInner::Quantified { quantifier, decls, body } => {
                self.quantified(*quantifier, decls, body)?
            }
            FormulaInner::IntComparison { op, left, right } => {
                let l = self.int(left)?;
                let r = self.int(right)?;
                match op {
                    IntCompareOp::Eq => l.equals(&r, self.factory),
                    IntCompareOp::Lt => l.lt(&r, self.factory),
                    IntCompareOp::Lte => l.lte(&r, self.factory),
                    IntCompareOp::Gt => l.gt(&r, self.factory),
                    IntCompareOp::Gte => l.gte(&r, self.factory),
                }
            }
            FormulaInner::Predicate(pred) => {
                let expanded = pred.to_constraints();
                self.formula(&expanded)?
            }
        };

        if let Some(id) = id {
            if self.shared.contains(&id) && self.free.closed(formula) {
                self.formula_cache.insert(id, result.clone());
            }
        }
        Ok(result)
    }

    fn expression(&mut self, expr: &Expression) -> Result<BooleanMatrix> {
        let inner = match expr {
            Expression::Relation(r) => return self.interpreter.interpret(r, self.factory),
            Expression::Variable(v) => {
                return self
                    .env
                    .lookup(v)
                    .cloned()
                    .ok_or_else(|| RelicError::UnboundLeaf(v.name().to_string()));
            }
            Expression::Univ => return Ok(self.interpreter.univ()),
            Expression::None => return Ok(self.interpreter.none()),
            Expression::Iden => return Ok(self.interpreter.iden()),
            Expression::Ints => return Ok(self.interpreter.int_atoms()),
            Expression::Ref(_) => expr.inner(),
        };
        let id = expr_id(expr);
        if let Some(id) = id {
            if let Some(hit) = self.expr_cache.get(&id) {
                return Ok(hit.clone());
            }
        }

        let result = match inner {
            ExprInner::Binary { op, left, right, .. } => {
                let l = self.expression(left)?;
                let r = self.expression(right)?;
                match op {
                    BinaryExprOp::Union => l.union(&r, self.factory),
                    BinaryExprOp::Intersection => l.intersection(&r, self.factory),
                    BinaryExprOp::Difference => l.difference(&r, self.factory),
                    BinaryExprOp::Join => l.dot(&r, self.factory),
                    BinaryExprOp::Product => l.cross(&r, self.factory),
                    BinaryExprOp::Override => l.override_with(&r, self.factory),
                }
            }
            ExprInner::Unary { op, expr } => {
                let m = self.expression(expr)?;
                match op {
                    UnaryExprOp::Transpose => m.transpose(),
                    UnaryExprOp::Closure => m.closure(self.factory),
                    UnaryExprOp::ReflexiveClosure => {
                        let closed = m.closure(self.factory);
                        closed.union(&self.interpreter.iden(), self.factory)
                    }
                }
            }
            ExprInner::Comprehension { decls, formula } => {
                let dims = Dimensions::new(decls.size(), self.interpreter.universe().size());
                let mut result = BooleanMatrix::empty(dims);
                self.comprehension(decls, formula, 0, 0, BoolValue::True, &mut result)?;
                result
            }
            ExprInner::IfThenElse { condition, then_expr, else_expr } => {
                let c = self.formula(condition)?;
                let t = self.expression(then_expr)?;
                let e = self.expression(else_expr)?;
                let mut indices = t.dense_indices();
                for i in e.dense_indices() {
                    if t.get(i) == BoolValue::False {
                        indices.push(i);
                    }
                }
                indices.sort_unstable();
                let mut result = BooleanMatrix::empty(t.dims());
                for i in indices {
                    let value = self.factory.ite(c.clone(), t.get(i), e.get(i));
                    result.set(i, value);
                }
                result
            }
            ExprInner::IntCast(int) => {
                let value = self.int(int)?;
                let mut result = BooleanMatrix::empty(Dimensions::new(
                    1,
                    self.interpreter.universe().size(),
                ));
                for (i, atom) in self.interpreter.ints() {
                    let constant = Int::constant(self.factory, i);
                    result.set(atom, value.equals(&constant, self.factory));
                }
                result
            }
        };

        if let Some(id) = id {
            if self.shared.contains(&id) && self.free.closed_expr(expr) {
                self.expr_cache.insert(id, result.clone());
            }
        }
        Ok(result)
    }

    fn int(&mut self, int: &IntExpression) -> Result<Int> {
        let inner = match int {
            IntExpression::Constant(v) => return Ok(Int::constant(self.factory, *v)),
            IntExpression::Ref(_) => int.inner(),
        };
        let id = int_expr_id(int);
        if let Some(id) = id {
            if let Some(hit) = self.int_cache.get(&id) {
                return Ok(hit.clone());
            }
        }

        let result = match inner {
            IntExprInner::Unary { op, expr } => {
                let e = self.int(expr)?;
                match op {
                    UnaryIntOp::Negate => e.negate(self.factory),
                    UnaryIntOp::Abs => e.abs(self.factory),
                    UnaryIntOp::Signum => e.signum(self.factory),
                }
            }
            IntExprInner::Binary { op, left, right } => {
                let l = self.int(left)?;
                let r = self.int(right)?;
                match op {
                    BinaryIntOp::Plus => l.plus(&r, self.factory),
                    BinaryIntOp::Minus => l.minus(&r, self.factory),
                    BinaryIntOp::Multiply => l.multiply(&r, self.factory),
                    BinaryIntOp::Divide => l.divide(&r, self.factory),
                    BinaryIntOp::Modulo => l.modulo(&r, self.factory),
                    BinaryIntOp::And => l.bit_and(&r, self.factory),
                    BinaryIntOp::Or => l.bit_or(&r, self.factory),
                    BinaryIntOp::Xor => l.bit_xor(&r, self.factory),
                    BinaryIntOp::Shl => l.shl(&r, self.factory),
                    BinaryIntOp::Shr => l.shr(&r, self.factory),
                    BinaryIntOp::Sha => l.sha(&r, self.factory),
                }
            }
            IntExprInner::Sum { decls, body } => {
                let zero = Int::constant(self.factory, 0);
                self.sum_over(decls, body, 0, BoolValue::True, zero)?
            }
            IntExprInner::Cast { op, expr } => {
                let m = self.expression(expr)?;
                match op {
                    CastOp::Cardinality => {
                        let bits: Vec<BoolValue> = m.iter().map(|(_, v)| v.clone()).collect();
                        Int::count(self.factory, bits)
                    }
                    CastOp::Sum => {
                        let zero = Int::constant(self.factory, 0);
                        let mut acc = zero.clone();
                        for (i, atom) in self.interpreter.ints() {
                            let lit = m.get(atom);
                            let value = Int::constant(self.factory, i);
                            let term = Int::choose(self.factory, lit, &value, &zero);
                            acc = acc.plus(&term, self.factory);
                        }
                        acc
                    }
                }
            }
            IntExprInner::IfThenElse { condition, then_expr, else_expr } => {
                let c = self.formula(condition)?;
                let t = self.int(then_expr)?;
                let e = self.int(else_expr)?;
                Int::choose(self.factory, c, &t, &e)
            }
        };

        if let Some(id) = id {
            if self.shared.contains(&id) && self.free.closed_int(int) {
                self.int_cache.insert(id, result.clone());
            }
        }
        Ok(result)
    }

    fn quantified(&mut self, quantifier: Quantifier, decls: &Decls, body: &Formula) -> Result<BoolValue> {
        let mut acc = Vec::new();
        match quantifier {
            Quantifier::All => {
                self.forall(decls, body, 0, BoolValue::False, &mut acc)?;
                Ok(self.factory.and_multi(acc))
            }
            Quantifier::Some => {
                self.exists(decls, body, 0, BoolValue::True, &mut acc)?;
                Ok(self.factory.or_multi(acc))
            }
        }
    }

    /// Enumerates the declaration domains in ascending tuple order,
    /// accumulating the disjunction of negated membership literals; each
    /// complete binding contributes `!d1 | ... | !dk | body` to `acc`.
    fn forall(
        &mut self,
        decls: &Decls,
        body: &Formula,
        depth: usize,
        negated_domain: BoolValue,
        acc: &mut Vec<BoolValue>,
    ) -> Result<()> {
        if depth == decls.size() {
            let b = self.formula(body)?;
            acc.push(self.factory.or(negated_domain, b));
            return Ok(());
        }
        let decl = decls.get(depth);
        self.enumerable(decl)?;
        let domain = self.expression(decl.expression())?;
        let cells: Vec<(usize, BoolValue)> = domain.iter().map(|(i, v)| (i, v.clone())).collect();
        for (index, lit) in cells {
            let mut unit = BooleanMatrix::empty(domain.dims());
            unit.set(index, BoolValue::True);
            self.env.bind(decl.variable().clone(), unit);
            let widened = self.factory.or(negated_domain.clone(), self.factory.not(lit));
            self.forall(decls, body, depth + 1, widened, acc)?;
            self.env.unbind();
        }
        Ok(())
    }

    /// Dual of `forall`: each complete binding contributes
    /// `d1 & ... & dk & body` to `acc`.
    fn exists(
        &mut self,
        decls: &Decls,
        body: &Formula,
        depth: usize,
        domain: BoolValue,
        acc: &mut Vec<BoolValue>,
    ) -> Result<()> {
        if depth == decls.size() {
            let b = self.formula(body)?;
            acc.push(self.factory.and(domain, b));
            return Ok(());
        }
        let decl = decls.get(depth);
        self.enumerable(decl)?;
        let matrix = self.expression(decl.expression())?;
        let cells: Vec<(usize, BoolValue)> = matrix.iter().map(|(i, v)| (i, v.clone())).collect();
        for (index, lit) in cells {
            let mut unit = BooleanMatrix::empty(matrix.dims());
            unit.set(index, BoolValue::True);
            self.env.bind(decl.variable().clone(), unit);
            let narrowed = self.factory.and(domain.clone(), lit);
            self.exists(decls, body, depth + 1, narrowed, acc)?;
            self.env.unbind();
        }
        Ok(())
    }

    fn comprehension(
        &mut self,
        decls: &Decls,
        body: &Formula,
        depth: usize,
        index: usize,
        membership: BoolValue,
        result: &mut BooleanMatrix,
    ) -> Result<()> {
        if depth == decls.size() {
            let b = self.formula(body)?;
            result.set(index, self.factory.and(membership, b));
            return Ok(());
        }
        let decl = decls.get(depth);
        self.enumerable(decl)?;
        let domain = self.expression(decl.expression())?;
        let size = self.interpreter.universe().size();
        let cells: Vec<(usize, BoolValue)> = domain.iter().map(|(i, v)| (i, v.clone())).collect();
        for (cell, lit) in cells {
            let mut unit = BooleanMatrix::empty(domain.dims());
            unit.set(cell, BoolValue::True);
            self.env.bind(decl.variable().clone(), unit);
            let narrowed = self.factory.and(membership.clone(), lit);
            self.comprehension(decls, body, depth + 1, index * size + cell, narrowed, result)?;
            self.env.unbind();
        }
        Ok(())
    }

    fn sum_over(
        &mut self,
        decls: &Decls,
        body: &IntExpression,
        depth: usize,
        membership: BoolValue,
        acc: Int,
    ) -> Result<Int> {
        if depth == decls.size() {
            let value = self.int(body)?;
            let zero = Int::constant(self.factory, 0);
            let term = Int::choose(self.factory, membership, &value, &zero);
            return Ok(acc.plus(&term, self.factory));
        }
        let decl = decls.get(depth);
        self.enumerable(decl)?;
        let domain = self.expression(decl.expression())?;
        let cells: Vec<(usize, BoolValue)> = domain.iter().map(|(i, v)| (i, v.clone())).collect();
        let mut acc = acc;
        for (cell, lit) in cells {
            let mut unit = BooleanMatrix::empty(domain.dims());
            unit.set(cell, BoolValue::True);
            self.env.bind(decl.variable().clone(), unit);
            let narrowed = self.factory.and(membership.clone(), lit);
            acc = self.sum_over(decls, body, depth + 1, narrowed, acc)?;
            self.env.unbind();
        }
        Ok(acc)
    }
}

/// Computes a sound over-approximation of an expression's tuple set: every
/// tuple the expression could possibly contain maps to constant true.
///
/// Non-monotone operators fall back to their monotone envelopes: difference
/// keeps its left operand, override and conditionals become unions, and a
/// comprehension is the product of its declaration domains with the
/// membership condition ignored.
pub(crate) fn approximate(
    expr: &Expression,
    bounds: &Bounds,
    env: &mut Environment<BooleanMatrix>,
) -> Result<BooleanMatrix> {
    let interpreter = LeafInterpreter::overapproximating(bounds);
    let factory = BooleanFactory::new(0, true, 4);
    approx(expr, &interpreter, &factory, env)
}

fn approx(
    expr: &Expression,
    interpreter: &LeafInterpreter,
    factory: &BooleanFactory,
    env: &mut Environment<BooleanMatrix>,
) -> Result<BooleanMatrix> {
    let inner = match expr {
        Expression::Relation(r) => return interpreter.interpret(r, factory),
        Expression::Variable(v) => {
            return env
                .lookup(v)
                .cloned()
                .ok_or_else(|| RelicError::UnboundLeaf(v.name().to_string()));
        }
        Expression::Univ => return Ok(interpreter.univ()),
        Expression::None => return Ok(interpreter.none()),
        Expression::Iden => return Ok(interpreter.iden()),
        Expression::Ints => return Ok(interpreter.int_atoms()),
        Expression::Ref(_) => expr.inner(),
    };
    let result = match inner {
        ExprInner::Binary { op, left, right, .. } => {
            let l = approx(left, interpreter, factory, env)?;
            match op {
                BinaryExprOp::Difference => l,
                BinaryExprOp::Union | BinaryExprOp::Override => {
                    let r = approx(right, interpreter, factory, env)?;
                    l.union(&r, factory)
                }
                BinaryExprOp::Intersection => {
                    let r = approx(right, interpreter, factory, env)?;
                    l.intersection(&r, factory)
                }
                BinaryExprOp::Join => {
                    let r = approx(right, interpreter, factory, env)?;
                    l.dot(&r, factory)
                }
                BinaryExprOp::Product => {
                    let r = approx(right, interpreter, factory, env)?;
                    l.cross(&r, factory)
                }
            }
        }
        ExprInner::Unary { op, expr } => {
            let m = approx(expr, interpreter, factory, env)?;
            match op {
                UnaryExprOp::Transpose => m.transpose(),
                UnaryExprOp::Closure => m.closure(factory),
                UnaryExprOp::ReflexiveClosure => m.closure(factory).union(&interpreter.iden(), factory),
            }
        }
        ExprInner::Comprehension { decls, .. } => {
            let mark = env.len();
            let mut product: Option<BooleanMatrix> = None;
            for decl in decls.iter() {
                let domain = approx(decl.expression(), interpreter, factory, env)?;
                env.bind(decl.variable().clone(), domain.clone());
                product = Some(match product {
                    None => domain,
                    Some(acc) => acc.cross(&domain, factory),
                });
            }
            env.truncate(mark);
            product.expect("declarations are nonempty")
        }
        ExprInner::IfThenElse { then_expr, else_expr, .. } => {
            let t = approx(then_expr, interpreter, factory, env)?;
            let e = approx(else_expr, interpreter, factory, env)?;
            t.union(&e, factory)
        }
        ExprInner::IntCast(_) => interpreter.int_atoms(),
    };
    Ok(result)
}
