//! Adapter for rustsat solver backends
//!
//! Wraps any `rustsat::solvers::Solve` implementation in the crate's
//! [`SatSolver`] interface. The default backend is batsat's `BasicSolver`,
//! which is incremental and so supports solution enumeration.

use std::time::Duration;

use rustsat::solvers::{Solve, SolverResult};
use rustsat::types::{Clause, Lit, TernaryVal, Var};

use super::{SatError, SatSolver};

/// Bridges a rustsat solver to the [`SatSolver`] interface.
pub struct RustSatAdapter<S> {
    solver: S,
    num_vars: u32,
    num_clauses: u32,
    timeout: Option<Duration>,
}

impl<S> RustSatAdapter<S> {
    /// Wraps the given rustsat solver.
    pub fn new(solver: S) -> Self {
        Self {
            solver,
            num_vars: 0,
            num_clauses: 0,
            timeout: None,
        }
    }
}

impl<S: Solve> SatSolver for RustSatAdapter<S> {
    fn add_variables(&mut self, n: u32) {
        // rustsat creates variables on demand as clauses mention them
        self.num_vars += n;
    }

    fn num_variables(&self) -> u32 {
        self.num_vars
    }

    fn num_clauses(&self) -> u32 {
        self.num_clauses
    }

    fn add_clause(&mut self, lits: &[i32]) -> bool {
        let lits: Vec<Lit> = lits
            .iter()
            .map(|&lit| {
                let idx = lit.unsigned_abs() - 1;
                assert!(idx <= Var::MAX_IDX, "variable index {} exceeds the backend maximum", idx);
                let var = Var::new(idx);
                if lit > 0 { var.pos_lit() } else { var.neg_lit() }
            })
            .collect();
        self.num_clauses += 1;
        self.solver.add_clause(Clause::from(&lits[..])).is_ok()
    }

    fn solve(&mut self) -> Result<bool, SatError> {
        match self.solver.solve() {
            Ok(SolverResult::Sat) => Ok(true),
            Ok(SolverResult::Unsat) => Ok(false),
            Ok(SolverResult::Interrupted) => Err(SatError::Aborted("interrupted".into())),
            Err(e) => Err(SatError::Aborted(e.to_string())),
        }
    }

    fn value_of(&self, var: u32) -> bool {
        if var == 0 || var > self.num_vars {
            return false;
        }
        let v = Var::new(var - 1);
        match self.solver.solution(v) {
            Ok(assignment) => assignment.var_value(v) == TernaryVal::True,
            Err(_) => false,
        }
    }

    fn set_timeout(&mut self, timeout: Option<Duration>) {
        // stored for reporting; batsat has no native budget enforcement
        self.timeout = timeout;
    }

    fn timeout(&self) -> Option<Duration> {
        self.timeout
    }
}
