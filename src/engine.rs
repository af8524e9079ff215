//! SAT backend interface
//!
//! The translator streams clauses into anything implementing [`SatSolver`].
//! The bundled backend is batsat behind [`RustSatAdapter`]; [`MockSolver`]
//! records clauses for pipeline tests without solving anything.

pub mod evaluator;
pub mod rustsat_adapter;

pub use evaluator::Evaluator;
pub use rustsat_adapter::RustSatAdapter;

use std::time::Duration;

use thiserror::Error;

/// Failures of a SAT backend.
#[derive(Error, Debug)]
pub enum SatError {
    /// The solver exceeded its time budget.
    #[error("sat solver timed out")]
    Timeout,
    /// The solver was interrupted or failed internally.
    #[error("sat solving aborted: {0}")]
    Aborted(String),
}

/// The interface every SAT backend must provide.
///
/// Variables are numbered from 1; a literal is a nonzero integer whose sign
/// selects the phase and whose magnitude is at most `num_variables()`.
/// Native resources are released when the solver is dropped.
pub trait SatSolver {
    /// Grows the vocabulary by `n` variables.
    fn add_variables(&mut self, n: u32);

    /// Returns the number of variables.
    fn num_variables(&self) -> u32;

    /// Returns the number of clauses added so far.
    fn num_clauses(&self) -> u32;

    /// Adds a clause; repeated and complementary literals are permitted and
    /// keep their natural meaning. Returns false if the solver can already
    /// tell the formula became unsatisfiable.
    fn add_clause(&mut self, lits: &[i32]) -> bool;

    /// Decides the conjunction of the added clauses.
    ///
    /// # Errors
    /// Returns [`SatError::Timeout`] past the configured budget and
    /// [`SatError::Aborted`] on interruption or backend failure.
    fn solve(&mut self) -> Result<bool, SatError>;

    /// Returns the assignment of `var`; meaningful only after `solve`
    /// returned true.
    fn value_of(&self, var: u32) -> bool;

    /// Sets the time budget for subsequent `solve` calls.
    fn set_timeout(&mut self, timeout: Option<Duration>);

    /// Returns the configured time budget.
    fn timeout(&self) -> Option<Duration>;
}

/// A recording pseudo-solver for tests of the translation pipeline.
///
/// `solve` succeeds with an all-false assignment; the recorded clauses are
/// exposed for inspection.
#[derive(Default)]
pub struct MockSolver {
    num_vars: u32,
    clauses: Vec<Vec<i32>>,
    timeout: Option<Duration>,
}

impl MockSolver {
    /// Creates an empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the recorded clauses in the order they were added.
    pub fn clauses(&self) -> &[Vec<i32>] {
        &self.clauses
    }
}

impl SatSolver for MockSolver {
    fn add_variables(&mut self, n: u32) {
        self.num_vars += n;
    }

    fn num_variables(&self) -> u32 {
        self.num_vars
    }

    fn num_clauses(&self) -> u32 {
        self.clauses.len() as u32
    }

    fn add_clause(&mut self, lits: &[i32]) -> bool {
        for &lit in lits {
            debug_assert!(lit != 0 && lit.unsigned_abs() <= self.num_vars);
        }
        self.clauses.push(lits.to_vec());
        true
    }

    fn solve(&mut self) -> Result<bool, SatError> {
        Ok(true)
    }

    fn value_of(&self, _var: u32) -> bool {
        false
    }

    fn set_timeout(&mut self, timeout: Option<Duration>) {
        self.timeout = timeout;
    }

    fn timeout(&self) -> Option<Duration> {
        self.timeout
    }
}
