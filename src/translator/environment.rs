//! Lexical environments for translation passes
//!
//! A plain binding stack: lookups scan from the innermost binding out, so
//! shadowing behaves like nested scopes.

use crate::ast::Variable;

pub(crate) struct Environment<T> {
    bindings: Vec<(Variable, T)>,
}

impl<T> Environment<T> {
    pub(crate) fn new() -> Self {
        Self { bindings: Vec::new() }
    }

    pub(crate) fn bind(&mut self, variable: Variable, value: T) {
        self.bindings.push((variable, value));
    }

    /// Removes the innermost binding.
    pub(crate) fn unbind(&mut self) {
        self.bindings.pop();
    }

    pub(crate) fn lookup(&self, variable: &Variable) -> Option<&T> {
        self.bindings
            .iter()
            .rev()
            .find(|(v, _)| v == variable)
            .map(|(_, value)| value)
    }

    pub(crate) fn len(&self) -> usize {
        self.bindings.len()
    }

    pub(crate) fn truncate(&mut self, len: usize) {
        self.bindings.truncate(len);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn innermost_binding_wins() {
        let x = Variable::unary("x");
        let y = Variable::unary("y");

        let mut env: Environment<i32> = Environment::new();
        env.bind(x.clone(), 1);
        env.bind(y.clone(), 2);
        env.bind(x.clone(), 3);

        assert_eq!(env.lookup(&x), Some(&3));
        assert_eq!(env.lookup(&y), Some(&2));

        env.unbind();
        assert_eq!(env.lookup(&x), Some(&1));
    }

    #[test]
    fn truncate_restores_scope() {
        let x = Variable::unary("x");
        let mut env: Environment<i32> = Environment::new();
        let mark = env.len();
        env.bind(x.clone(), 1);
        env.truncate(mark);
        assert_eq!(env.lookup(&x), None);
    }
}
