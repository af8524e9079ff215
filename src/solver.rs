//! The solving front end
//!
//! Ties the pipeline together: translate, detect trivial outcomes, hand the
//! CNF to a SAT backend, and read models back as instances padded with the
//! caller's lower bounds. `solve_all` enumerates every model by adding
//! blocking clauses over the primary variables; trivially satisfiable models
//! are blocked at the bounds level and re-translated.

use std::time::{Duration, Instant};

use rustsat_batsat::BasicSolver;

use crate::ast::{Expression, Formula, Relation};
use crate::config::Options;
use crate::engine::{RustSatAdapter, SatSolver};
use crate::instance::{Bounds, Instance};
use crate::translator::{translate, Translated, Translation};
use crate::Result;

/// Solves relational formulas against finite bounds.
pub struct Solver {
    options: Options,
}

impl Solver {
    /// Creates a solver with the given options.
    pub fn new(options: Options) -> Self {
        Self { options }
    }

    /// Returns the options guiding translation and solving.
    pub fn options(&self) -> &Options {
        &self.options
    }

    /// Solves `formula` under `bounds` with the default batsat backend.
    ///
    /// # Errors
    /// Translation errors (`UnboundLeaf`, `HigherOrderDecl`), cooperative
    /// cancellation (`Aborted`), and solver timeouts surface here; trivial
    /// formulas are ordinary solutions, not errors.
    pub fn solve(&self, formula: &Formula, bounds: &Bounds) -> Result<Solution> {
        let mut solver = RustSatAdapter::new(BasicSolver::default());
        self.solve_with(&mut solver, formula, bounds)
    }

    /// Solves with a caller-provided SAT backend.
    pub fn solve_with<S: SatSolver>(
        &self,
        solver: &mut S,
        formula: &Formula,
        bounds: &Bounds,
    ) -> Result<Solution> {
        solver.set_timeout(self.options.timeout);
        let translation_start = Instant::now();
        match translate(formula, bounds, &self.options, solver)? {
            Translated::Trivial { value, bounds: augmented } => {
                let stats = Statistics::trivial(translation_start.elapsed());
                if value {
                    let instance = pad_instance(lower_bound_instance(&augmented), bounds);
                    Ok(Solution::TriviallySat { instance, stats })
                } else {
                    Ok(Solution::TriviallyUnsat { stats })
                }
            }
            Translated::Cnf(translation) => {
                let translation_time = translation_start.elapsed();
                self.options.reporter.solving_cnf(
                    translation.num_primary_variables(),
                    translation.num_variables(),
                    translation.num_clauses(),
                );
                let solving_start = Instant::now();
                let sat = solver.solve()?;
                let stats = Statistics::of(&translation, translation_time, solving_start.elapsed());
                if sat {
                    let instance = pad_instance(translation.interpret(solver), bounds);
                    Ok(Solution::Sat { instance, stats })
                } else {
                    Ok(Solution::Unsat { stats })
                }
            }
        }
    }

    /// Returns an iterator over all solutions, using the default backend.
    ///
    /// Each satisfiable solution is followed by more until the final
    /// element, whose outcome is `Unsatisfiable` or
    /// `TriviallyUnsatisfiable`.
    pub fn solve_all(&self, formula: &Formula, bounds: &Bounds) -> SolutionIterator {
        SolutionIterator {
            options: self.options.clone(),
            formula: Some(formula.clone()),
            bounds: Some(bounds.clone()),
            state: None,
            trivial: 0,
        }
    }
}

/// Builds the instance assigning every relation its lower bound.
fn lower_bound_instance(bounds: &Bounds) -> Instance {
    let mut instance = Instance::new(bounds.universe().clone());
    for relation in bounds.relations() {
        instance.add(relation.clone(), bounds.lower_bound(relation).unwrap().clone());
    }
    for i in bounds.ints() {
        instance.add_int(i, bounds.int_bound(i).unwrap().clone());
    }
    instance
}

/// Pads `instance` with the lower bound of every relation the caller bound
/// but translation assigned no tuples.
fn pad_instance(mut instance: Instance, bounds: &Bounds) -> Instance {
    for relation in bounds.relations() {
        if !instance.contains(relation) {
            instance.add(relation.clone(), bounds.lower_bound(relation).unwrap().clone());
        }
    }
    for i in bounds.ints() {
        if instance.int_tuples(i).is_none() {
            instance.add_int(i, bounds.int_bound(i).unwrap().clone());
        }
    }
    instance
}

/// How a solve ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Outcome {
    /// A model was found by the SAT solver.
    Satisfiable,
    /// The SAT solver proved there is no model.
    Unsatisfiable,
    /// The formula folded to true before CNF; the lower bounds are a model.
    TriviallySatisfiable,
    /// The formula folded to false before CNF.
    TriviallyUnsatisfiable,
}

/// The result of a solve: an outcome, statistics, and a model when one
/// exists.
#[derive(Debug)]
pub enum Solution {
    /// Satisfiable, with a model.
    Sat {
        /// The satisfying instance.
        instance: Instance,
        /// Translation and solving statistics.
        stats: Statistics,
    },
    /// Trivially satisfiable: the formula folded to true.
    TriviallySat {
        /// The lower-bound instance.
        instance: Instance,
        /// Translation statistics; no CNF was built.
        stats: Statistics,
    },
    /// Unsatisfiable.
    Unsat {
        /// Translation and solving statistics.
        stats: Statistics,
    },
    /// Trivially unsatisfiable: the formula folded to false.
    TriviallyUnsat {
        /// Translation statistics; no CNF was built.
        stats: Statistics,
    },
}

impl Solution {
    /// Returns the outcome of this solution.
    pub fn outcome(&self) -> Outcome {
        match self {
            Solution::Sat { .. } => Outcome::Satisfiable,
            Solution::TriviallySat { .. } => Outcome::TriviallySatisfiable,
            Solution::Unsat { .. } => Outcome::Unsatisfiable,
            Solution::TriviallyUnsat { .. } => Outcome::TriviallyUnsatisfiable,
        }
    }

    /// Returns true for either satisfiable outcome.
    pub fn is_sat(&self) -> bool {
        matches!(self, Solution::Sat { .. } | Solution::TriviallySat { .. })
    }

    /// Returns true for either unsatisfiable outcome.
    pub fn is_unsat(&self) -> bool {
        !self.is_sat()
    }

    /// Returns true if the formula never reached the SAT solver.
    pub fn is_trivial(&self) -> bool {
        matches!(self, Solution::TriviallySat { .. } | Solution::TriviallyUnsat { .. })
    }

    /// Returns the model, when one exists.
    pub fn instance(&self) -> Option<&Instance> {
        match self {
            Solution::Sat { instance, .. } | Solution::TriviallySat { instance, .. } => {
                Some(instance)
            }
            _ => None,
        }
    }

    /// Returns the statistics of this solve.
    pub fn statistics(&self) -> &Statistics {
        match self {
            Solution::Sat { stats, .. }
            | Solution::TriviallySat { stats, .. }
            | Solution::Unsat { stats }
            | Solution::TriviallyUnsat { stats } => stats,
        }
    }
}

/// Sizes and timings of one solve.
#[derive(Debug, Clone)]
pub struct Statistics {
    primary_variables: u32,
    num_variables: u32,
    num_clauses: u32,
    translation_time: Duration,
    solving_time: Duration,
}

impl Statistics {
    fn of(translation: &Translation, translation_time: Duration, solving_time: Duration) -> Self {
        Self {
            primary_variables: translation.num_primary_variables(),
            num_variables: translation.num_variables(),
            num_clauses: translation.num_clauses(),
            translation_time,
            solving_time,
        }
    }

    fn trivial(translation_time: Duration) -> Self {
        Self {
            primary_variables: 0,
            num_variables: 0,
            num_clauses: 0,
            translation_time,
            solving_time: Duration::ZERO,
        }
    }

    /// Returns the number of primary variables.
    pub fn primary_variables(&self) -> u32 {
        self.primary_variables
    }

    /// Returns the total number of CNF variables.
    pub fn num_variables(&self) -> u32 {
        self.num_variables
    }

    /// Returns the number of CNF clauses.
    pub fn num_clauses(&self) -> u32 {
        self.num_clauses
    }

    /// Returns the time spent translating.
    pub fn translation_time(&self) -> Duration {
        self.translation_time
    }

    /// Returns the time spent in the SAT solver.
    pub fn solving_time(&self) -> Duration {
        self.solving_time
    }
}

/// Lazily enumerates all solutions of a formula.
///
/// Non-trivial models are excluded from further search by a blocking clause
/// over the primary variables; trivially satisfiable models are excluded by
/// binding fresh witness relations to the found tuples and conjoining a
/// disequality, then re-translating.
pub struct SolutionIterator {
    options: Options,
    formula: Option<Formula>,
    bounds: Option<Bounds>,
    state: Option<IteratorState>,
    trivial: u32,
}

struct IteratorState {
    solver: RustSatAdapter<BasicSolver>,
    translation: Translation,
    translation_time: Duration,
}

impl SolutionIterator {
    /// Translates the current formula; returns the trivial solution if the
    /// translation folded, updating the formula and bounds to exclude a
    /// trivially satisfiable model.
    fn start(&mut self) -> Option<Result<Solution>> {
        let formula = self.formula.as_ref().unwrap();
        let bounds = self.bounds.as_ref().unwrap();

        let mut solver = RustSatAdapter::new(BasicSolver::default());
        solver.set_timeout(self.options.timeout);
        let translation_start = Instant::now();
        match translate(formula, bounds, &self.options, &mut solver) {
            Err(e) => {
                self.formula = None;
                self.bounds = None;
                Some(Err(e))
            }
            Ok(Translated::Trivial { value, bounds: augmented }) => {
                let stats = Statistics::trivial(translation_start.elapsed());
                if value {
                    self.trivial += 1;
                    let raw = lower_bound_instance(&augmented);
                    let solution = Solution::TriviallySat {
                        instance: pad_instance(lower_bound_instance(&augmented), bounds),
                        stats,
                    };
                    self.block_trivial_model(&raw);
                    Some(Ok(solution))
                } else {
                    self.formula = None;
                    self.bounds = None;
                    Some(Ok(Solution::TriviallyUnsat { stats }))
                }
            }
            Ok(Translated::Cnf(translation)) => {
                self.state = Some(IteratorState {
                    solver,
                    translation,
                    translation_time: translation_start.elapsed(),
                });
                None
            }
        }
    }

    /// Excludes the given trivially found model: each of its relations is
    /// mirrored by a fresh exactly-bound witness, and the formula gains the
    /// requirement that some relation differ from its witness.
    fn block_trivial_model(&mut self, model: &Instance) {
        let mut bounds = self.bounds.take().unwrap();
        let mut not_model = Formula::FALSE;
        for relation in model.relations() {
            let witness =
                Relation::nary(format!("{}_{}", relation.name(), self.trivial), relation.arity());
            bounds.bound_exactly(&witness, model.tuples(relation).unwrap().clone());
            let differs = Expression::from(relation)
                .equals(Expression::from(&witness))
                .not();
            not_model = not_model.or(differs);
        }
        self.formula = Some(self.formula.take().unwrap().and(not_model));
        self.bounds = Some(bounds);
    }

    /// Solves the current CNF, blocking the found model for the next call.
    fn next_model(&mut self) -> Result<Solution> {
        let state = self.state.as_mut().unwrap();
        self.options.reporter.solving_cnf(
            state.translation.num_primary_variables(),
            state.translation.num_variables(),
            state.translation.num_clauses(),
        );

        let solving_start = Instant::now();
        let sat = match state.solver.solve() {
            Ok(sat) => sat,
            Err(e) => {
                self.formula = None;
                self.bounds = None;
                self.state = None;
                return Err(e.into());
            }
        };
        let stats = Statistics::of(
            &state.translation,
            state.translation_time,
            solving_start.elapsed(),
        );

        if sat {
            let instance =
                pad_instance(state.translation.interpret(&state.solver), self.bounds.as_ref().unwrap());
            let primary = state.translation.num_primary_variables();
            let blocking: Vec<i32> = (1..=primary)
                .map(|v| if state.solver.value_of(v) { -(v as i32) } else { v as i32 })
                .collect();
            state.solver.add_clause(&blocking);
            Ok(Solution::Sat { instance, stats })
        } else {
            self.formula = None;
            self.bounds = None;
            self.state = None;
            Ok(Solution::Unsat { stats })
        }
    }
}

impl Iterator for SolutionIterator {
    type Item = Result<Solution>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.formula.is_none() {
            return None;
        }
        if self.state.is_none() {
            if let Some(trivial_or_error) = self.start() {
                return Some(trivial_or_error);
            }
        }
        Some(self.next_model())
    }
}
