//! # Scope Stack
//!
//! The base document URIs under which pointers are resolved. Pushing is only
//! possible through [`ScopeGuard`] (or the [`ScopeStack::scoped`] closure), so
//! the stack is back to its prior state after every step, on success, on error
//! and on unwind.

use std::ops::{Deref, DerefMut};
use url::Url;

/// Ordered base URIs; the last one is the current scope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScopeStack {
    root: Url,
    pushed: Vec<Url>,
}

impl ScopeStack {
    /// Creates a stack whose bottom (and current) scope is `root`.
    pub fn new(root: Url) -> Self {
        Self {
            root,
            pushed: Vec::new(),
        }
    }

    /// The scope used to resolve local references.
    pub fn current(&self) -> &Url {
        self.pushed.last().unwrap_or(&self.root)
    }

    /// Number of scopes, including the root.
    pub fn depth(&self) -> usize {
        self.pushed.len() + 1
    }

    /// Whether `uri` is on the stack.
    pub fn contains(&self, uri: &Url) -> bool {
        &self.root == uri || self.pushed.iter().any(|scope| scope == uri)
    }

    /// Enters `uri`; the scope is left when the returned guard is dropped.
    pub fn push(&mut self, uri: Url) -> ScopeGuard<'_> {
        self.pushed.push(uri);
        ScopeGuard { stack: self }
    }

    /// Runs `f` with `uri` pushed, popping it afterwards whatever `f` returns.
    pub fn scoped<T>(&mut self, uri: Url, f: impl FnOnce(&mut ScopeStack) -> T) -> T {
        let mut guard = self.push(uri);
        f(&mut guard)
    }
}

/// Keeps a scope pushed for its lifetime.
#[derive(Debug)]
pub struct ScopeGuard<'a> {
    stack: &'a mut ScopeStack,
}

impl Deref for ScopeGuard<'_> {
    type Target = ScopeStack;

    fn deref(&self) -> &ScopeStack {
        self.stack
    }
}

impl DerefMut for ScopeGuard<'_> {
    fn deref_mut(&mut self) -> &mut ScopeStack {
        self.stack
    }
}

impl Drop for ScopeGuard<'_> {
    fn drop(&mut self) {
        self.stack.pushed.pop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[test]
    fn test_guard_pops_on_drop() {
        let mut stack = ScopeStack::new(url("http://example.invalid/root.json"));
        {
            let guard = stack.push(url("http://example.invalid/other.json"));
            assert_eq!(guard.current().as_str(), "http://example.invalid/other.json");
            assert_eq!(guard.depth(), 2);
        }
        assert_eq!(stack.depth(), 1);
        assert_eq!(stack.current().as_str(), "http://example.invalid/root.json");
    }

    #[test]
    fn test_nested_guards() {
        let mut stack = ScopeStack::new(url("http://example.invalid/a"));
        {
            let mut outer = stack.push(url("http://example.invalid/b"));
            {
                let inner = outer.push(url("http://example.invalid/c"));
                assert_eq!(inner.depth(), 3);
                assert!(inner.contains(&url("http://example.invalid/b")));
            }
            assert_eq!(outer.current().as_str(), "http://example.invalid/b");
        }
        assert_eq!(stack.depth(), 1);
    }

    #[test]
    fn test_scoped_restores_on_error() {
        let mut stack = ScopeStack::new(url("http://example.invalid/a"));
        let result: Result<(), &str> = stack.scoped(url("http://example.invalid/b"), |inner| {
            assert_eq!(inner.depth(), 2);
            Err("failed")
        });
        assert!(result.is_err());
        assert_eq!(stack.depth(), 1);
    }

    #[test]
    fn test_scoped_restores_on_panic() {
        let mut stack = ScopeStack::new(url("http://example.invalid/a"));
        let outcome = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            stack.scoped(url("http://example.invalid/b"), |_| panic!("boom"));
        }));
        assert!(outcome.is_err());
        assert_eq!(stack.depth(), 1);
    }
}
