use indexmap::IndexMap;

use crate::token::Token;

/// Name → token mapping. One global scope lives for the whole process;
/// local scopes are MEMORY records consulted before it on reads and never
/// written through.
#[derive(Debug, Default)]
pub struct Scope {
    bindings: IndexMap<String, Token>,
}

impl Scope {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores or replaces the binding.
    pub fn write(&mut self, name: impl Into<String>, value: Token) {
        self.bindings.insert(name.into(), value);
    }

    pub fn read(&self, name: &str) -> Option<&Token> {
        self.bindings.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.bindings.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}
