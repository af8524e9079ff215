//! Formula rewriting passes that run before translation

mod skolemizer;

pub use skolemizer::Skolemizer;
