//! Scope stack for resolving binder names to de Bruijn indices.
//!
//! Every `lam` pushes one binder. A name resolves to its distance from the
//! innermost binder, counting from 1, so the nearest binding wins:
//! ```text
//! (lam x (lam y [x y]))   =>   (lam (lam [2 1]))
//! (lam x (lam x x))       =>   (lam (lam 1))
//! ```

use std::fmt;

/// A stack of bound names, innermost last.
#[derive(Debug, Default)]
pub struct ScopeStack<'s> {
    names: Vec<&'s str>,
}

impl<'s> ScopeStack<'s> {
    /// Create a new empty scope stack.
    pub fn new() -> Self {
        Self { names: Vec::new() }
    }

    /// Enter the body of a binder.
    pub fn push(&mut self, name: &'s str) {
        self.names.push(name);
    }

    /// Leave the innermost binder.
    ///
    /// Returns an error if the stack is empty.
    pub fn pop(&mut self) -> Result<(), PopError> {
        self.names.pop().ok_or(PopError::EmptyStack)?;
        Ok(())
    }

    /// Look up a name, searching binders from innermost to outermost.
    ///
    /// Returns the 1-based de Bruijn index, or None for a free name.
    pub fn lookup(&self, name: &str) -> Option<usize> {
        self.names
            .iter()
            .rev()
            .position(|bound| *bound == name)
            .map(|distance| distance + 1)
    }

    /// Number of enclosing binders.
    pub fn depth(&self) -> usize {
        self.names.len()
    }
}

/// Error when trying to pop a scope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PopError {
    /// The stack is empty.
    EmptyStack,
}

impl fmt::Display for PopError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PopError::EmptyStack => write!(f, "Cannot pop from empty scope stack"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_counts_from_innermost() {
        let mut stack = ScopeStack::new();
        stack.push("a");
        stack.push("b");
        stack.push("c");

        assert_eq!(stack.lookup("c"), Some(1));
        assert_eq!(stack.lookup("b"), Some(2));
        assert_eq!(stack.lookup("a"), Some(3));
        assert_eq!(stack.lookup("d"), None);
    }

    #[test]
    fn test_shadowing() {
        let mut stack = ScopeStack::new();
        stack.push("a");
        stack.push("b");
        stack.push("a");

        // Inner 'a' shadows the outer one
        assert_eq!(stack.lookup("a"), Some(1));
        assert_eq!(stack.lookup("b"), Some(2));

        stack.pop().unwrap();

        // Original 'a' is visible again
        assert_eq!(stack.lookup("a"), Some(2));
    }

    #[test]
    fn test_pop_empty_stack_error() {
        let mut stack = ScopeStack::new();
        assert_eq!(stack.pop(), Err(PopError::EmptyStack));
        assert_eq!(stack.depth(), 0);
    }
}
