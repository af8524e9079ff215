//! # relic
//!
//! A finite-model finder for first-order relational logic. Given a formula
//! over relational variables and finite lower/upper bounds on those
//! variables, `relic` decides satisfiability over the bounded universe by
//! translating to propositional logic: relations become matrices of Boolean
//! circuit values, formulas become circuits, circuits become CNF via the
//! polarity-based definitional encoding, and an external SAT solver does the
//! rest. Satisfying assignments are read back as concrete instances.
//!
//! ## Example
//!
//! ```
//! use relic::ast::{Expression, Relation};
//! use relic::config::Options;
//! use relic::instance::{Bounds, Universe};
//! use relic::solver::Solver;
//!
//! // a universe of three atoms
//! let universe = Universe::new(&["A", "B", "C"]);
//! let factory = universe.factory();
//!
//! // Person may be any subset of the universe
//! let person = Relation::unary("Person");
//! let mut bounds = Bounds::new(universe);
//! bounds.bound(&person, factory.none(1), factory.all(1));
//!
//! // some Person
//! let formula = Expression::from(&person).some();
//!
//! let solver = Solver::new(Options::default());
//! let solution = solver.solve(&formula, &bounds)?;
//! assert!(solution.is_sat());
//! # Ok::<(), relic::RelicError>(())
//! ```

#![warn(missing_docs)]
#![warn(rust_2024_compatibility)]

pub mod ast;
pub mod bool;
pub mod cnf;
pub mod config;
pub mod engine;
pub mod instance;
pub mod simplify;
pub mod solver;
pub mod translator;

use thiserror::Error;

use crate::engine::SatError;

/// Errors raised while solving.
///
/// Violations of constructor preconditions (arity mismatches, empty
/// universes, uncontained bounds) panic at the call site instead; these
/// variants cover failures that depend on the data being solved.
#[derive(Error, Debug)]
pub enum RelicError {
    /// A variable occurs free, or a relation has no bounds.
    #[error("unbound leaf: {0}")]
    UnboundLeaf(String),

    /// A declaration that is not `one`-of-arity-1 survived to translation.
    #[error("higher-order declaration: {0}")]
    HigherOrderDecl(String),

    /// Translation or solving was cancelled cooperatively.
    #[error("aborted: {0}")]
    Aborted(String),

    /// The SAT solver exceeded its time budget.
    #[error("sat solver timed out")]
    Timeout,
}

impl From<SatError> for RelicError {
    fn from(e: SatError) -> Self {
        match e {
            SatError::Timeout => RelicError::Timeout,
            SatError::Aborted(message) => RelicError::Aborted(message),
        }
    }
}

/// Result alias for solving operations.
pub type Result<T> = std::result::Result<T, RelicError>;

pub use solver::{Outcome, Solution, Solver};
