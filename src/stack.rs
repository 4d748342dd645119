use crate::{
    diagnostics::{Diagnostic, ErrorKind, NumenError},
    token::Token,
};

/// The operand stack: a last-in-first-out sequence of tokens shared by every
/// operation. Typed pops fail loudly, naming the calling operation and the
/// tag actually observed.
#[derive(Debug, Default)]
pub struct OperandStack {
    items: Vec<Token>,
}

impl OperandStack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, token: Token) {
        self.items.push(token);
    }

    /// Insert below everything else. Reverses a parameter list into call
    /// order when bindings are drained off the stack one by one.
    pub fn push_front(&mut self, token: Token) {
        self.items.insert(0, token);
    }

    pub fn peek(&self) -> Option<&Token> {
        self.items.last()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn as_slice(&self) -> &[Token] {
        &self.items
    }

    pub fn pop_any(&mut self, caller: &str) -> Result<Token, NumenError> {
        self.items.pop().ok_or_else(|| underflow(caller))
    }

    pub fn pop_int(&mut self, caller: &str) -> Result<i64, NumenError> {
        match self.pop_any(caller)? {
            Token::Int(n) => Ok(n),
            other => Err(mismatch(caller, "Integer", &other)),
        }
    }

    pub fn pop_float(&mut self, caller: &str) -> Result<f64, NumenError> {
        match self.pop_any(caller)? {
            Token::Float(n) => Ok(n),
            other => Err(mismatch(caller, "Float", &other)),
        }
    }

    /// Accepts STRING or SYMBOL; a symbol's textual name is its payload.
    pub fn pop_string(&mut self, caller: &str) -> Result<String, NumenError> {
        match self.pop_any(caller)? {
            Token::Str(s) => Ok(s),
            Token::Symbol(name) => Ok(name),
            other => Err(mismatch(caller, "String or Symbol", &other)),
        }
    }

    pub fn pop_boolean(&mut self, caller: &str) -> Result<bool, NumenError> {
        match self.pop_any(caller)? {
            Token::Bool(b) => Ok(b),
            other => Err(mismatch(caller, "Boolean", &other)),
        }
    }

    pub fn pop_block(&mut self, caller: &str) -> Result<String, NumenError> {
        match self.pop_any(caller)? {
            Token::Block(body) => Ok(body),
            other => Err(mismatch(caller, "Block", &other)),
        }
    }

    pub fn pop_stack(&mut self, caller: &str) -> Result<Vec<Token>, NumenError> {
        match self.pop_any(caller)? {
            Token::Stack(items) => Ok(items),
            other => Err(mismatch(caller, "Stack", &other)),
        }
    }
}

fn underflow(caller: &str) -> NumenError {
    NumenError::from(Diagnostic::new(
        ErrorKind::StackUnderflow,
        format!("`{caller}` called on an empty stack"),
    ))
}

fn mismatch(caller: &str, expected: &str, observed: &Token) -> NumenError {
    NumenError::from(Diagnostic::new(
        ErrorKind::TypeError,
        format!(
            "`{caller}` expected {expected}, found {}",
            observed.type_name()
        ),
    ))
}
