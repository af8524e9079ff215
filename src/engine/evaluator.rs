//! Direct evaluation of formulas against instances
//!
//! Computes the value of a formula, expression, or integer expression in a
//! concrete instance, without circuits or a SAT solver. The test suite uses
//! this to check that models returned by the solver actually satisfy the
//! formulas they were found for. Integer arithmetic wraps at the same
//! bitwidth the translator uses.

use crate::ast::{
    BinaryExprOp, BinaryFormulaOp, BinaryIntOp, CastOp, CompareOp, Decl, Decls, ExprInner,
    Expression, Formula, FormulaInner, IntCompareOp, IntExprInner, IntExpression, Multiplicity,
    Quantifier, UnaryExprOp, UnaryIntOp,
};
use crate::config::Options;
use crate::instance::{Instance, TupleSet};
use crate::translator::environment::Environment;
use crate::{RelicError, Result};

/// Evaluates AST nodes in a fixed instance.
pub struct Evaluator<'a> {
    instance: &'a Instance,
    bitwidth: u32,
    env: Environment<TupleSet>,
}

impl<'a> Evaluator<'a> {
    /// Creates an evaluator for the given instance, taking the integer
    /// bitwidth from `options`.
    pub fn new(instance: &'a Instance, options: &Options) -> Self {
        Self {
            instance,
            bitwidth: options.bitwidth,
            env: Environment::new(),
        }
    }

    /// Returns the truth value of `formula` in the instance.
    ///
    /// # Errors
    /// Returns [`RelicError::UnboundLeaf`] for a free variable or a relation
    /// the instance does not map, and [`RelicError::HigherOrderDecl`] for a
    /// declaration that cannot be enumerated.
    pub fn evaluate(&mut self, formula: &Formula) -> Result<bool> {
        let inner = match formula {
            Formula::True => return Ok(true),
            Formula::False => return Ok(false),
            Formula::Ref(_) => formula.inner(),
        };
        match inner {
            FormulaInner::Not(f) => Ok(!self.evaluate(f)?),
            FormulaInner::Binary { op, left, right } => {
                let l = self.evaluate(left)?;
                match op {
                    BinaryFormulaOp::And => Ok(l && self.evaluate(right)?),
                    BinaryFormulaOp::Or => Ok(l || self.evaluate(right)?),
                    BinaryFormulaOp::Implies => Ok(!l || self.evaluate(right)?),
                    BinaryFormulaOp::Iff => Ok(l == self.evaluate(right)?),
                }
            }
            FormulaInner::Comparison { op, left, right } => {
                let l = self.evaluate_expr(left)?;
                let r = self.evaluate_expr(right)?;
                match op {
                    CompareOp::Equals => Ok(l == r),
                    CompareOp::Subset => Ok(r.contains_set(&l)),
                }
            }
            FormulaInner::Multiplicity { mult, expr } => {
                let tuples = self.evaluate_expr(expr)?;
                Ok(match mult {
                    Multiplicity::No => tuples.is_empty(),
                    Multiplicity::Some => !tuples.is_empty(),
                    Multiplicity::One => tuples.size() == 1,
                    Multiplicity::Lone => tuples.size() <= 1,
                    Multiplicity::Set => unreachable!("set multiplicity formulas cannot be built"),
                })
            }
            FormulaInner::Quantified { quantifier, decls, body } => match quantifier {
                Quantifier::All => self.forall(decls, 0, body),
                Quantifier::Some => self.exists(decls, 0, body),
            },
            FormulaInner::IntComparison { op, left, right } => {
                let l = self.evaluate_int(left)?;
                let r = self.evaluate_int(right)?;
                Ok(match op {
                    IntCompareOp::Eq => l == r,
                    IntCompareOp::Lt => l < r,
                    IntCompareOp::Lte => l <= r,
                    IntCompareOp::Gt => l > r,
                    IntCompareOp::Gte => l >= r,
                })
            }
            FormulaInner::Predicate(pred) => {
                let expanded = pred.to_constraints();
                self.evaluate(&expanded)
            }
        }
    }

    fn domain(&mut self, decl: &Decl) -> Result<TupleSet> {
        if decl.multiplicity() != Multiplicity::One || decl.variable().arity() != 1 {
            return Err(RelicError::HigherOrderDecl(format!(
                "{}: {:?} of arity {}",
                decl.variable(),
                decl.multiplicity(),
                decl.variable().arity()
            )));
        }
        self.evaluate_expr(decl.expression())
    }

    fn forall(&mut self, decls: &Decls, depth: usize, body: &Formula) -> Result<bool> {
        if depth == decls.size() {
            return self.evaluate(body);
        }
        let decl = decls.get(depth);
        let domain = self.domain(decl)?;
        for tuple in domain.iter() {
            let mut singleton = TupleSet::empty(domain.universe().clone(), 1);
            singleton.add(&tuple);
            self.env.bind(decl.variable().clone(), singleton);
            let holds = self.forall(decls, depth + 1, body);
            self.env.unbind();
            if !holds? {
                return Ok(false);
            }
        }
        Ok(true)
    }

    fn exists(&mut self, decls: &Decls, depth: usize, body: &Formula) -> Result<bool> {
        if depth == decls.size() {
            return self.evaluate(body);
        }
        let decl = decls.get(depth);
        let domain = self.domain(decl)?;
        for tuple in domain.iter() {
            let mut singleton = TupleSet::empty(domain.universe().clone(), 1);
            singleton.add(&tuple);
            self.env.bind(decl.variable().clone(), singleton);
            let holds = self.exists(decls, depth + 1, body);
            self.env.unbind();
            if holds? {
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// Returns the tuple set `expr` denotes in the instance.
    pub fn evaluate_expr(&mut self, expr: &Expression) -> Result<TupleSet> {
        let universe = self.instance.universe().clone();
        let size = universe.size();
        let inner = match expr {
            Expression::Relation(r) => {
                return self
                    .instance
                    .tuples(r)
                    .cloned()
                    .ok_or_else(|| RelicError::UnboundLeaf(r.name().to_string()));
            }
            Expression::Variable(v) => {
                return self
                    .env
                    .lookup(v)
                    .cloned()
                    .ok_or_else(|| RelicError::UnboundLeaf(v.name().to_string()));
            }
            Expression::Univ => return Ok(universe.factory().all(1)),
            Expression::None => return Ok(universe.factory().none(1)),
            Expression::Iden => {
                return Ok(universe
                    .factory()
                    .set_of(2, (0..size).map(|i| i * size + i)));
            }
            Expression::Ints => {
                let mut atoms = universe.factory().none(1);
                for i in self.instance.ints() {
                    let bound = self.instance.int_tuples(i).unwrap();
                    atoms = atoms.union(bound);
                }
                return Ok(atoms);
            }
            Expression::Ref(_) => expr.inner(),
        };
        match inner {
            ExprInner::Binary { op, left, right, .. } => {
                let l = self.evaluate_expr(left)?;
                let r = self.evaluate_expr(right)?;
                Ok(match op {
                    BinaryExprOp::Union => l.union(&r),
                    BinaryExprOp::Intersection => l.intersection(&r),
                    BinaryExprOp::Difference => l.difference(&r),
                    BinaryExprOp::Product => l.product(&r),
                    BinaryExprOp::Join => join(&l, &r),
                    BinaryExprOp::Override => override_sets(&l, &r),
                })
            }
            ExprInner::Unary { op, expr } => {
                let m = self.evaluate_expr(expr)?;
                Ok(match op {
                    UnaryExprOp::Transpose => transpose(&m),
                    UnaryExprOp::Closure => closure(&m),
                    UnaryExprOp::ReflexiveClosure => {
                        let iden = universe.factory().set_of(2, (0..size).map(|i| i * size + i));
                        closure(&m).union(&iden)
                    }
                })
            }
            ExprInner::Comprehension { decls, formula } => {
                let mut result =
                    TupleSet::empty(universe.clone(), decls.size());
                self.comprehension(decls, formula, 0, 0, &mut result)?;
                Ok(result)
            }
            ExprInner::IfThenElse { condition, then_expr, else_expr } => {
                if self.evaluate(condition)? {
                    self.evaluate_expr(then_expr)
                } else {
                    self.evaluate_expr(else_expr)
                }
            }
            ExprInner::IntCast(int) => {
                let value = self.evaluate_int(int)?;
                let mut result = universe.factory().none(1);
                for i in self.instance.ints() {
                    if i == value {
                        result = result.union(self.instance.int_tuples(i).unwrap());
                    }
                }
                Ok(result)
            }
        }
    }

    fn comprehension(
        &mut self,
        decls: &Decls,
        body: &Formula,
        depth: usize,
        index: usize,
        result: &mut TupleSet,
    ) -> Result<()> {
        if depth == decls.size() {
            if self.evaluate(body)? {
                result.add_index(index);
            }
            return Ok(());
        }
        let decl = decls.get(depth);
        let domain = self.domain(decl)?;
        let size = domain.universe().size();
        for atom in domain.indices().collect::<Vec<_>>() {
            let singleton = domain.universe().factory().set_of(1, [atom]);
            self.env.bind(decl.variable().clone(), singleton);
            let step = self.comprehension(decls, body, depth + 1, index * size + atom, result);
            self.env.unbind();
            step?;
        }
        Ok(())
    }

    // sign-extends the low `bitwidth` bits
    fn wrap(&self, value: i64) -> i32 {
        let w = self.bitwidth;
        let shifted = (value as u64) << (64 - w);
        ((shifted as i64) >> (64 - w)) as i32
    }

    fn unsigned(&self, value: i32) -> u64 {
        let w = self.bitwidth;
        (value as u64) & (u64::MAX >> (64 - w))
    }

    /// Returns the integer `int` denotes in the instance, wrapped at the
    /// evaluator's bitwidth.
    pub fn evaluate_int(&mut self, int: &IntExpression) -> Result<i32> {
        let inner = match int {
            IntExpression::Constant(v) => return Ok(self.wrap(*v as i64)),
            IntExpression::Ref(_) => int.inner(),
        };
        let value = match inner {
            IntExprInner::Unary { op, expr } => {
                let e = self.evaluate_int(expr)? as i64;
                match op {
                    UnaryIntOp::Negate => -e,
                    UnaryIntOp::Abs => e.abs(),
                    UnaryIntOp::Signum => e.signum(),
                }
            }
            IntExprInner::Binary { op, left, right } => {
                let l = self.evaluate_int(left)?;
                let r = self.evaluate_int(right)?;
                match op {
                    BinaryIntOp::Plus => l as i64 + r as i64,
                    BinaryIntOp::Minus => l as i64 - r as i64,
                    BinaryIntOp::Multiply => l as i64 * r as i64,
                    BinaryIntOp::Divide => {
                        if r == 0 { 0 } else { (l / r) as i64 }
                    }
                    BinaryIntOp::Modulo => {
                        if r == 0 { l as i64 } else { (l % r) as i64 }
                    }
                    BinaryIntOp::And => (l & r) as i64,
                    BinaryIntOp::Or => (l | r) as i64,
                    BinaryIntOp::Xor => (l ^ r) as i64,
                    BinaryIntOp::Shl => {
                        let amount = self.unsigned(r);
                        if amount >= self.bitwidth as u64 { 0 } else { (l as i64) << amount }
                    }
                    BinaryIntOp::Shr => {
                        let amount = self.unsigned(r);
                        if amount >= self.bitwidth as u64 {
                            0
                        } else {
                            (self.unsigned(l) >> amount) as i64
                        }
                    }
                    BinaryIntOp::Sha => {
                        let amount = self.unsigned(r).min(self.bitwidth as u64 - 1);
                        (l as i64) >> amount
                    }
                }
            }
            IntExprInner::Sum { decls, body } => self.sum(decls, body, 0)? as i64,
            IntExprInner::Cast { op, expr } => {
                let tuples = self.evaluate_expr(expr)?;
                match op {
                    CastOp::Cardinality => tuples.size() as i64,
                    CastOp::Sum => {
                        let mut total: i64 = 0;
                        for i in self.instance.ints() {
                            let atom = self.instance.int_tuples(i).unwrap();
                            if tuples.contains_set(atom) {
                                total += i as i64;
                            }
                        }
                        total
                    }
                }
            }
            IntExprInner::IfThenElse { condition, then_expr, else_expr } => {
                if self.evaluate(condition)? {
                    self.evaluate_int(then_expr)? as i64
                } else {
                    self.evaluate_int(else_expr)? as i64
                }
            }
        };
        Ok(self.wrap(value))
    }

    fn sum(&mut self, decls: &Decls, body: &IntExpression, depth: usize) -> Result<i32> {
        if depth == decls.size() {
            return self.evaluate_int(body);
        }
        let decl = decls.get(depth);
        let domain = self.domain(decl)?;
        let mut total: i64 = 0;
        for atom in domain.indices().collect::<Vec<_>>() {
            let singleton = domain.universe().factory().set_of(1, [atom]);
            self.env.bind(decl.variable().clone(), singleton);
            let term = self.sum(decls, body, depth + 1);
            self.env.unbind();
            total += term? as i64;
        }
        Ok(self.wrap(total))
    }
}

fn join(a: &TupleSet, b: &TupleSet) -> TupleSet {
    let universe = a.universe().clone();
    let size = universe.size();
    let tail_width = size.pow(b.arity() as u32 - 1);
    let mut result = TupleSet::empty(universe, a.arity() + b.arity() - 2);
    for i in a.indices() {
        let (head, mid) = (i / size, i % size);
        for k in b.indices() {
            if k / tail_width == mid {
                result.add_index(head * tail_width + k % tail_width);
            }
        }
    }
    result
}

fn transpose(a: &TupleSet) -> TupleSet {
    let size = a.universe().size();
    let indices: Vec<usize> = a.indices().map(|i| (i % size) * size + i / size).collect();
    a.universe().factory().set_of(2, indices)
}

fn closure(a: &TupleSet) -> TupleSet {
    let mut result = a.clone();
    loop {
        let step = result.union(&join(&result, &result));
        if step == result {
            return result;
        }
        result = step;
    }
}

fn override_sets(a: &TupleSet, b: &TupleSet) -> TupleSet {
    let size = a.universe().size();
    let row_width = a.universe().size().pow(a.arity() as u32) / size;
    let mut result = b.clone();
    for i in a.indices() {
        let row = i / row_width;
        if !b.indices().any(|j| j / row_width == row) {
            result.add_index(i);
        }
    }
    result
}
