//! Solver configuration and progress reporting

use std::fmt;
use std::rc::Rc;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::time::Duration;

use crate::ast::{Decl, Relation};

/// Progress callbacks invoked by the translation pipeline.
///
/// All methods default to doing nothing. The core invokes `skolemizing`,
/// `translating_to_boolean`, `translating_to_cnf`, and `solving_cnf`; the
/// symmetry hooks exist for external preprocessors that rewrite bounds
/// before translation.
pub trait Reporter {
    /// The given declaration is being replaced by the skolem relation, under
    /// the given enclosing universal declarations.
    fn skolemizing(&self, _decl: &Decl, _skolem: &Relation, _universals: &[Decl]) {}

    /// Symmetries of the bounds are being computed.
    fn detecting_symmetries(&self) {}

    /// A symmetry-breaking predicate is being generated.
    fn generating_sbp(&self) {}

    /// The formula is being translated to a Boolean circuit.
    fn translating_to_boolean(&self) {}

    /// The circuit is being translated to CNF.
    fn translating_to_cnf(&self) {}

    /// The CNF is being handed to the SAT solver.
    fn solving_cnf(&self, _primary_variables: u32, _variables: u32, _clauses: u32) {}
}

/// A reporter that ignores every callback.
#[derive(Debug, Default, Clone, Copy)]
pub struct SilentReporter;

impl Reporter for SilentReporter {}

/// A reporter that traces pipeline progress to stderr.
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleReporter;

impl Reporter for ConsoleReporter {
    fn skolemizing(&self, decl: &Decl, skolem: &Relation, universals: &[Decl]) {
        eprintln!(
            "skolemizing {} with {:?} under {} universal(s)",
            decl.variable(),
            skolem,
            universals.len()
        );
    }

    fn detecting_symmetries(&self) {
        eprintln!("detecting symmetries");
    }

    fn generating_sbp(&self) {
        eprintln!("generating symmetry-breaking predicate");
    }

    fn translating_to_boolean(&self) {
        eprintln!("translating to boolean circuit");
    }

    fn translating_to_cnf(&self) {
        eprintln!("translating to cnf");
    }

    fn solving_cnf(&self, primary_variables: u32, variables: u32, clauses: u32) {
        eprintln!(
            "solving cnf: {} primary vars, {} vars, {} clauses",
            primary_variables, variables, clauses
        );
    }
}

/// Translation and solving options.
#[derive(Clone)]
pub struct Options {
    /// Progress callback sink.
    pub reporter: Rc<dyn Reporter>,
    /// Width of the two's-complement integer encoding, in `1..=32`.
    pub bitwidth: u32,
    /// Maximum universal-quantifier nesting under which existentials are
    /// still skolemized; -1 disables skolemization entirely.
    pub skolem_depth: i32,
    /// Circuit sharing-detection depth; 0 disables gate interning.
    pub sharing: u32,
    /// Retain the skolemizer's rewritten-node provenance on the translation.
    pub log_translation: bool,
    /// Track formulas through translation; meaningful only to core-extracting
    /// backends and otherwise ignored.
    pub track_formulas: bool,
    /// Time budget handed to the SAT backend.
    pub timeout: Option<Duration>,
    /// Cooperative cancellation flag, polled at translation step boundaries.
    pub interrupt: Option<Arc<AtomicBool>>,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            reporter: Rc::new(SilentReporter),
            bitwidth: 4,
            skolem_depth: 0,
            sharing: 3,
            log_translation: false,
            track_formulas: false,
            timeout: None,
            interrupt: None,
        }
    }
}

impl Options {
    /// Returns true if the cancellation flag is set.
    pub(crate) fn interrupted(&self) -> bool {
        self.interrupt
            .as_ref()
            .is_some_and(|flag| flag.load(std::sync::atomic::Ordering::Relaxed))
    }
}

impl fmt::Debug for Options {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Options")
            .field("bitwidth", &self.bitwidth)
            .field("skolem_depth", &self.skolem_depth)
            .field("sharing", &self.sharing)
            .field("log_translation", &self.log_translation)
            .field("track_formulas", &self.track_formulas)
            .field("timeout", &self.timeout)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let options = Options::default();
        assert_eq!(options.bitwidth, 4);
        assert_eq!(options.skolem_depth, 0);
        assert_eq!(options.sharing, 3);
        assert!(!options.log_translation);
        assert!(options.timeout.is_none());
    }

    #[test]
    fn interrupt_flag() {
        let mut options = Options::default();
        assert!(!options.interrupted());

        let flag = Arc::new(AtomicBool::new(false));
        options.interrupt = Some(Arc::clone(&flag));
        assert!(!options.interrupted());
        flag.store(true, std::sync::atomic::Ordering::Relaxed);
        assert!(options.interrupted());
    }
}
