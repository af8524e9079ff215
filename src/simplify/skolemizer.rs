//! Bounded skolemization
//!
//! Rewrites a formula so that existential quantifiers in positive position
//! (and universals in negative position) are replaced by fresh skolem
//! relations, up to a configured nesting depth inside universals. A skolem
//! relation for `x: m E` under enclosing universals `u1..uk` has arity
//! `k + arity(x)`, is bounded by the cross product of the universals' upper
//! bounds with an over-approximation of `E`, and replaces `x` with the join
//! `uk . ( ... (u1 . $x))`. The constraint `$x in E && m $x` (subset alone
//! for `set`) is conjoined with the body, or made an antecedent when the
//! surrounding polarity is universal.

use rustc_hash::{FxHashMap, FxHashSet};

use crate::ast::visitor::{
    expr_id, formula_id, int_expr_id, AnnotatedNode, FreeVariableDetector, NodeId,
    QuantifiedFormulaDetector,
};
use crate::ast::{
    BinaryExprOp, BinaryFormulaOp, CompareOp, Decl, Decls, ExprInner, Expression, Formula,
    FormulaInner, IntExprInner, IntExpression, Multiplicity, Quantifier, Relation,
    RelationPredicate, UnaryExprOp,
};
use crate::bool::{BooleanFactory, BooleanMatrix};
use crate::config::Options;
use crate::instance::Bounds;
use crate::translator::environment::Environment;
use crate::{RelicError, Result};

/// A non-skolemizable universal declaration in scope, with its lazily
/// computed over-approximated upper bound.
struct DeclInfo {
    decl: Decl,
    upper: Option<BooleanMatrix>,
}

/// Rewrites existentials into skolem relations; see the module docs.
pub struct Skolemizer<'a> {
    bounds: &'a mut Bounds,
    options: &'a Options,
    rep_env: Environment<Expression>,
    non_skolems: Vec<DeclInfo>,
    negated: bool,
    skolem_depth: i32,
    shared: &'a FxHashSet<NodeId>,
    free: FreeVariableDetector<'a>,
    quantified: QuantifiedFormulaDetector<'a>,
    formula_cache: FxHashMap<NodeId, Formula>,
    expr_cache: FxHashMap<NodeId, Expression>,
    int_cache: FxHashMap<NodeId, IntExpression>,
    sources: FxHashMap<NodeId, Formula>,
    log: bool,
}

impl Skolemizer<'_> {
    /// Skolemizes the annotated formula up to `options.skolem_depth`,
    /// extending `bounds` with the skolem relations.
    ///
    /// # Errors
    /// Returns [`RelicError::UnboundLeaf`] if the formula has a free
    /// variable.
    pub fn skolemize(
        annotated: AnnotatedNode,
        bounds: &mut Bounds,
        options: &Options,
    ) -> Result<AnnotatedNode> {
        let shared = annotated.shared().clone();
        let mut skolemizer = Skolemizer {
            bounds,
            options,
            rep_env: Environment::new(),
            non_skolems: Vec::new(),
            negated: false,
            skolem_depth: options.skolem_depth,
            shared: &shared,
            free: FreeVariableDetector::new(&shared),
            quantified: QuantifiedFormulaDetector::new(&shared),
            formula_cache: FxHashMap::default(),
            expr_cache: FxHashMap::default(),
            int_cache: FxHashMap::default(),
            sources: FxHashMap::default(),
            log: options.log_translation,
        };
        let rewritten = skolemizer.formula(annotated.root())?;
        let sources = skolemizer.sources;
        if rewritten == *annotated.root() {
            Ok(annotated)
        } else {
            Ok(AnnotatedNode::with_sources(rewritten, sources))
        }
    }

    fn record(&mut self, result: &Formula, original: &Formula) {
        if self.log && result != original {
            if let Some(id) = formula_id(result) {
                self.sources.insert(id, original.clone());
            }
        }
    }

    fn formula(&mut self, formula: &Formula) -> Result<Formula> {
        let inner = match formula {
            Formula::True | Formula::False => return Ok(formula.clone()),
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
                self.negated = !self.negated;
                let child = self.formula(f);
                self.negated = !self.negated;
                let child = child?;
                if child == *f { formula.clone() } else { child.not() }
            }
            FormulaInner::Binary { op, left, right } => {
                let old_depth = self.skolem_depth;
                let blocked = *op == BinaryFormulaOp::Iff
                    || (self.negated && *op == BinaryFormulaOp::And)
                    || (!self.negated
                        && (*op == BinaryFormulaOp::Or || *op == BinaryFormulaOp::Implies));
                if blocked {
                    self.skolem_depth = -1;
                }
                let result: Result<Formula> = (|| {
                    let (l, r) = if *op == BinaryFormulaOp::Implies {
                        // the left of an implication is under one negation
                        self.negated = !self.negated;
                        let l = self.formula(left);
                        self.negated = !self.negated;
                        (l?, self.formula(right)?)
                    } else {
                        (self.formula(left)?, self.formula(right)?)
                    };
                    Ok(if l == *left && r == *right {
                        formula.clone()
                    } else {
                        l.compose(*op, r)
                    })
                })();
                self.skolem_depth = old_depth;
                result?
            }
            FormulaInner::Comparison { op, left, right } => {
                let old_depth = self.skolem_depth;
                self.skolem_depth = -1;
                let result: Result<Formula> = (|| {
                    let l = self.expr(left)?;
                    let r = self.expr(right)?;
                    Ok(if l == *left && r == *right {
                        formula.clone()
                    } else {
                        match op {
                            CompareOp::Equals => l.equals(r),
                            CompareOp::Subset => l.in_set(r),
                        }
                    })
                })();
                self.skolem_depth = old_depth;
                result?
            }
            FormulaInner::Multiplicity { mult, expr } => {
                let old_depth = self.skolem_depth;
                self.skolem_depth = -1;
                let result = self.expr(expr);
                self.skolem_depth = old_depth;
                let e = result?;
                if e == *expr { formula.clone() } else { e.apply(*mult) }
            }
            FormulaInner::IntComparison { op, left, right } => {
                let old_depth = self.skolem_depth;
                self.skolem_depth = -1;
                let result: Result<Formula> = (|| {
                    let l = self.int_expr(left)?;
                    let r = self.int_expr(right)?;
                    Ok(if l == *left && r == *right {
                        formula.clone()
                    } else {
                        Formula::int_comparison(l, *op, r)
                    })
                })();
                self.skolem_depth = old_depth;
                result?
            }
            FormulaInner::Predicate(pred) => {
                let old_depth = self.skolem_depth;
                self.skolem_depth = -1;
                let result: Result<Formula> = (|| match pred {
                    RelationPredicate::Function { relation, domain, range } => {
                        let d = self.expr(domain)?;
                        let r = self.expr(range)?;
                        Ok(if d == *domain && r == *range {
                            formula.clone()
                        } else {
                            Formula::predicate(RelationPredicate::function(relation.clone(), d, r))
                        })
                    }
                    _ => Ok(formula.clone()),
                })();
                self.skolem_depth = old_depth;
                result?
            }
            FormulaInner::Quantified { quantifier, decls, body } => {
                self.quantified_formula(*quantifier, decls, body, formula)?
            }
        };

        self.record(&result, formula);
        if let Some(id) = id {
            if self.shared.contains(&id)
                && self.free.closed(formula)
                && !self.quantified.detect(formula)
            {
                self.formula_cache.insert(id, result.clone());
            }
        }
        Ok(result)
    }

    fn quantified_formula(
        &mut self,
        quantifier: Quantifier,
        decls: &Decls,
        body: &Formula,
        original: &Formula,
    ) -> Result<Formula> {
        let skolemizable = self.skolem_depth >= 0
            && ((self.negated && quantifier == Quantifier::All)
                || (!self.negated && quantifier == Quantifier::Some));
        let env_mark = self.rep_env.len();

        let result = if skolemizable {
            let mut constraints = Formula::TRUE;
            for decl in decls.iter() {
                let new_decl = self.decl(decl)?;
                let skolem_expr = self.skolem_expr(&new_decl)?;
                self.rep_env.bind(decl.variable().clone(), skolem_expr.clone());
                constraints = self.add_constraints(constraints, &new_decl, skolem_expr);
            }
            let rewritten_body = self.formula(body)?;
            let op = if self.negated { BinaryFormulaOp::Implies } else { BinaryFormulaOp::And };
            constraints.compose(op, rewritten_body)
        } else {
            let mut new_decls = Vec::with_capacity(decls.size());
            let mut changed = false;
            for decl in decls.iter() {
                let new_decl = self.decl(decl)?;
                changed |= new_decl != *decl;
                self.rep_env
                    .bind(decl.variable().clone(), Expression::from(decl.variable()));
                new_decls.push(new_decl);
            }
            let new_decls = if changed { Decls::from_vec(new_decls) } else { decls.clone() };

            let budget = (self.non_skolems.len() + new_decls.size()) as i32;
            let rewritten_body = if self.skolem_depth >= budget {
                let mark = self.non_skolems.len();
                for decl in new_decls.iter() {
                    self.non_skolems.push(DeclInfo { decl: decl.clone(), upper: None });
                }
                let rewritten = self.formula(body);
                self.non_skolems.truncate(mark);
                rewritten?
            } else {
                let old_depth = self.skolem_depth;
                self.skolem_depth = -1;
                let rewritten = self.formula(body);
                self.skolem_depth = old_depth;
                rewritten?
            };

            if !changed && rewritten_body == *body {
                original.clone()
            } else {
                Formula::quantify(quantifier, new_decls, rewritten_body)
            }
        };

        self.rep_env.truncate(env_mark);
        Ok(result)
    }

    /// Visits a declaration's expression only; the variable must not be
    /// rewritten even when it shadows a skolemized one.
    fn decl(&mut self, decl: &Decl) -> Result<Decl> {
        let old_depth = self.skolem_depth;
        self.skolem_depth = -1;
        let expression = self.expr(decl.expression());
        self.skolem_depth = old_depth;
        let expression = expression?;
        Ok(if expression == *decl.expression() {
            decl.clone()
        } else {
            Decl::new(decl.variable().clone(), decl.multiplicity(), expression)
        })
    }

    /// Creates and bounds the skolem relation for `decl`, returning the
    /// expression that replaces its variable.
    fn skolem_expr(&mut self, decl: &Decl) -> Result<Expression> {
        let depth = self.non_skolems.len();
        let arity = depth + decl.variable().arity();
        let skolem = Relation::nary(format!("${}", decl.variable().name()), arity);

        let universals: Vec<Decl> = self.non_skolems.iter().map(|info| info.decl.clone()).collect();
        self.options.reporter.skolemizing(decl, &skolem, &universals);

        let mut skolem_expr = Expression::from(&skolem);
        let mut approx_env: Environment<BooleanMatrix> = Environment::new();
        for info in self.non_skolems.iter_mut() {
            if info.upper.is_none() {
                info.upper = Some(crate::translator::approximate(
                    info.decl.expression(),
                    self.bounds,
                    &mut approx_env,
                )?);
            }
            approx_env.bind(info.decl.variable().clone(), info.upper.clone().unwrap());
            skolem_expr = Expression::from(info.decl.variable()).join(skolem_expr);
        }

        let mut matrix_bound =
            crate::translator::approximate(decl.expression(), self.bounds, &mut approx_env)?;
        let scratch = BooleanFactory::new(0, true, 4);
        for info in self.non_skolems.iter().rev() {
            matrix_bound = info.upper.as_ref().unwrap().cross(&matrix_bound, &scratch);
        }

        let factory = self.bounds.universe().factory();
        let upper = factory.set_of(arity, matrix_bound.dense_indices());
        self.bounds.bound(&skolem, factory.none(arity), upper);

        Ok(skolem_expr)
    }

    /// Conjoins `$x in E` and, for a non-`set` multiplicity, `m $x` onto the
    /// accumulated skolem constraints.
    fn add_constraints(&self, constraints: Formula, decl: &Decl, skolem_expr: Expression) -> Formula {
        let subset = skolem_expr.clone().in_set(decl.expression().clone());
        if decl.multiplicity() == Multiplicity::Set {
            constraints.and(subset)
        } else {
            let mult = skolem_expr.apply(decl.multiplicity());
            constraints.and(subset.and(mult))
        }
    }

    fn expr(&mut self, expr: &Expression) -> Result<Expression> {
        let inner = match expr {
            Expression::Variable(v) => {
                return self
                    .rep_env
                    .lookup(v)
                    .cloned()
                    .ok_or_else(|| RelicError::UnboundLeaf(v.name().to_string()));
            }
            Expression::Relation(_)
            | Expression::Univ
            | Expression::None
            | Expression::Iden
            | Expression::Ints => return Ok(expr.clone()),
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
                let l = self.expr(left)?;
                let r = self.expr(right)?;
                if l == *left && r == *right {
                    expr.clone()
                } else {
                    match op {
                        BinaryExprOp::Union => l.union(r),
                        BinaryExprOp::Intersection => l.intersection(r),
                        BinaryExprOp::Difference => l.difference(r),
                        BinaryExprOp::Join => l.join(r),
                        BinaryExprOp::Product => l.product(r),
                        BinaryExprOp::Override => l.override_with(r),
                    }
                }
            }
            ExprInner::Unary { op, expr: operand } => {
                let e = self.expr(operand)?;
                if e == *operand {
                    expr.clone()
                } else {
                    match op {
                        UnaryExprOp::Transpose => e.transpose(),
                        UnaryExprOp::Closure => e.closure(),
                        UnaryExprOp::ReflexiveClosure => e.reflexive_closure(),
                    }
                }
            }
            ExprInner::Comprehension { decls, formula } => {
                let env_mark = self.rep_env.len();
                let result: Result<Expression> = (|| {
                    let (new_decls, changed) = self.identity_decls(decls)?;
                    let body = self.formula(formula)?;
                    Ok(if !changed && body == *formula {
                        expr.clone()
                    } else {
                        Expression::comprehension(new_decls, body)
                    })
                })();
                self.rep_env.truncate(env_mark);
                result?
            }
            ExprInner::IfThenElse { condition, then_expr, else_expr } => {
                let c = self.formula(condition)?;
                let t = self.expr(then_expr)?;
                let e = self.expr(else_expr)?;
                if c == *condition && t == *then_expr && e == *else_expr {
                    expr.clone()
                } else {
                    c.then_else(t, e)
                }
            }
            ExprInner::IntCast(int) => {
                let i = self.int_expr(int)?;
                if i == *int { expr.clone() } else { i.to_expression() }
            }
        };

        if let Some(id) = id {
            if self.shared.contains(&id) && self.free.closed_expr(expr) {
                self.expr_cache.insert(id, result.clone());
            }
        }
        Ok(result)
    }

    fn int_expr(&mut self, int: &IntExpression) -> Result<IntExpression> {
        let inner = match int {
            IntExpression::Constant(_) => return Ok(int.clone()),
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
                let e = self.int_expr(expr)?;
                if e == *expr {
                    int.clone()
                } else {
                    use crate::ast::UnaryIntOp::*;
                    match op {
                        Negate => e.negate(),
                        Abs => e.abs(),
                        Signum => e.signum(),
                    }
                }
            }
            IntExprInner::Binary { op, left, right } => {
                let l = self.int_expr(left)?;
                let r = self.int_expr(right)?;
                if l == *left && r == *right {
                    int.clone()
                } else {
                    use crate::ast::BinaryIntOp::*;
                    match op {
                        Plus => l.plus(r),
                        Minus => l.minus(r),
                        Multiply => l.multiply(r),
                        Divide => l.divide(r),
                        Modulo => l.modulo(r),
                        And => l.bit_and(r),
                        Or => l.bit_or(r),
                        Xor => l.bit_xor(r),
                        Shl => l.shl(r),
                        Shr => l.shr(r),
                        Sha => l.sha(r),
                    }
                }
            }
            IntExprInner::Sum { decls, body } => {
                let env_mark = self.rep_env.len();
                let result: Result<IntExpression> = (|| {
                    let (new_decls, changed) = self.identity_decls(decls)?;
                    let b = self.int_expr(body)?;
                    Ok(if !changed && b == *body {
                        int.clone()
                    } else {
                        IntExpression::sum(new_decls, b)
                    })
                })();
                self.rep_env.truncate(env_mark);
                result?
            }
            IntExprInner::Cast { op, expr } => {
                let e = self.expr(expr)?;
                if e == *expr {
                    int.clone()
                } else {
                    match op {
                        crate::ast::CastOp::Cardinality => e.count(),
                        crate::ast::CastOp::Sum => e.sum(),
                    }
                }
            }
            IntExprInner::IfThenElse { condition, then_expr, else_expr } => {
                let c = self.formula(condition)?;
                let t = self.int_expr(then_expr)?;
                let e = self.int_expr(else_expr)?;
                if c == *condition && t == *then_expr && e == *else_expr {
                    int.clone()
                } else {
                    c.then_else_int(t, e)
                }
            }
        };

        if let Some(id) = id {
            if self.shared.contains(&id) && self.free.closed_int(int) {
                self.int_cache.insert(id, result.clone());
            }
        }
        Ok(result)
    }

    /// Visits a declaration sequence inside a non-skolemizable scope,
    /// binding each variable to itself.
    fn identity_decls(&mut self, decls: &Decls) -> Result<(Decls, bool)> {
        let mut new_decls = Vec::with_capacity(decls.size());
        let mut changed = false;
        for decl in decls.iter() {
            let new_decl = self.decl(decl)?;
            changed |= new_decl != *decl;
            self.rep_env
                .bind(decl.variable().clone(), Expression::from(decl.variable()));
            new_decls.push(new_decl);
        }
        let new_decls = if changed { Decls::from_vec(new_decls) } else { decls.clone() };
        Ok((new_decls, changed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::Variable;
    use crate::instance::Universe;

    fn skolemize(formula: &Formula, bounds: &mut Bounds, depth: i32) -> Formula {
        let mut options = Options::default();
        options.skolem_depth = depth;
        let annotated = AnnotatedNode::new(formula.clone());
        Skolemizer::skolemize(annotated, bounds, &options)
            .unwrap()
            .root()
            .clone()
    }

    fn person_bounds() -> (Bounds, Relation) {
        let u = Universe::new(&["A", "B", "C"]);
        let f = u.factory();
        let p = Relation::unary("P");
        let mut bounds = Bounds::new(u);
        bounds.bound(&p, f.none(1), f.all(1));
        (bounds, p)
    }

    #[test]
    fn top_level_existential_is_eliminated() {
        let (mut bounds, p) = person_bounds();
        let x = Variable::unary("x");
        let formula = Formula::exists(
            Decls::from(Decl::one_of(&x, Expression::from(&p))),
            Expression::from(&x).in_set(Expression::from(&p)),
        );

        let result = skolemize(&formula, &mut bounds, 0);
        assert!(!matches!(
            &result,
            Formula::Ref(inner) if matches!(&**inner, FormulaInner::Quantified { .. })
        ));

        // a unary skolem relation was added and bounded by P's upper bound
        let skolem = bounds.relations().find(|r| r.name() == "$x").cloned().unwrap();
        assert_eq!(skolem.arity(), 1);
        assert_eq!(bounds.upper_bound(&skolem).unwrap().size(), 3);
        assert!(bounds.lower_bound(&skolem).unwrap().is_empty());
    }

    #[test]
    fn negated_universal_is_eliminated() {
        let (mut bounds, p) = person_bounds();
        let x = Variable::unary("x");
        let formula = Formula::forall(
            Decls::from(Decl::one_of(&x, Expression::from(&p))),
            Expression::from(&x).in_set(Expression::from(&p)),
        )
        .not();

        skolemize(&formula, &mut bounds, 0);
        assert!(bounds.relations().any(|r| r.name() == "$x"));
    }

    #[test]
    fn existential_under_universal_needs_depth() {
        let (mut bounds, p) = person_bounds();
        let q = Relation::binary("q");
        {
            let f = bounds.universe().factory();
            let none = f.none(2);
            let all = f.all(2);
            bounds.bound(&q, none, all);
        }
        let x = Variable::unary("x");
        let y = Variable::unary("y");
        let formula = Formula::forall(
            Decls::from(Decl::one_of(&x, Expression::from(&p))),
            Formula::exists(
                Decls::from(Decl::one_of(&y, Expression::from(&p))),
                Expression::from(&x)
                    .product(Expression::from(&y))
                    .in_set(Expression::from(&q)),
            ),
        );

        // depth 0: the inner existential survives
        let mut bounds0 = bounds.clone();
        skolemize(&formula, &mut bounds0, 0);
        assert!(!bounds0.relations().any(|r| r.name() == "$y"));

        // depth 1: it is skolemized to a binary skolem function
        skolemize(&formula, &mut bounds, 1);
        let skolem = bounds.relations().find(|r| r.name() == "$y").cloned().unwrap();
        assert_eq!(skolem.arity(), 2);
        // bounded by upper(P) x upper(P)
        assert_eq!(bounds.upper_bound(&skolem).unwrap().size(), 9);
    }

    #[test]
    fn negative_position_existential_is_kept() {
        let (mut bounds, p) = person_bounds();
        let x = Variable::unary("x");
        let formula = Formula::exists(
            Decls::from(Decl::one_of(&x, Expression::from(&p))),
            Expression::from(&x).in_set(Expression::from(&p)),
        )
        .not();

        let result = skolemize(&formula, &mut bounds, 0);
        assert!(!bounds.relations().any(|r| r.name() == "$x"));
        // the formula comes back structurally unchanged
        assert_eq!(result, formula);
    }

    #[test]
    fn skolemization_disabled_below_disjunction() {
        let (mut bounds, p) = person_bounds();
        let x = Variable::unary("x");
        let existential = Formula::exists(
            Decls::from(Decl::one_of(&x, Expression::from(&p))),
            Expression::from(&x).in_set(Expression::from(&p)),
        );
        let formula = existential.or(Expression::from(&p).no());

        skolemize(&formula, &mut bounds, 0);
        assert!(!bounds.relations().any(|r| r.name() == "$x"));
    }

    #[test]
    fn implication_flips_polarity_on_the_left() {
        let (mut bounds, p) = person_bounds();
        let x = Variable::unary("x");
        // !(all x: P | x in P) in the left of => is positive again under
        // the implicit negation, so nothing may be skolemized there; but a
        // negated implication makes its left side existential
        let universal = Formula::forall(
            Decls::from(Decl::one_of(&x, Expression::from(&p))),
            Expression::from(&x).in_set(Expression::from(&p)),
        );
        let formula = universal.implies(Expression::from(&p).some()).not();

        skolemize(&formula, &mut bounds, 0);
        // under the negation, the implication's left is positive: the
        // universal stays; no skolem relation appears
        assert!(!bounds.relations().any(|r| r.name() == "$x"));
    }

    #[test]
    fn free_variable_is_reported() {
        let (mut bounds, p) = person_bounds();
        let x = Variable::unary("x");
        let formula = Expression::from(&x).in_set(Expression::from(&p));
        let annotated = AnnotatedNode::new(formula);
        let result = Skolemizer::skolemize(annotated, &mut bounds, &Options::default());
        assert!(matches!(result, Err(RelicError::UnboundLeaf(_))));
    }

    #[test]
    fn unchanged_formulas_are_returned_as_is() {
        let (mut bounds, p) = person_bounds();
        let formula = Expression::from(&p).some();
        let result = skolemize(&formula, &mut bounds, 0);
        assert_eq!(result, formula);
    }
}
