use crate::{
    builtins::BuiltinTable,
    diagnostics::{NumenError, Result},
    parser::Parser,
    scope::Scope,
    stack::OperandStack,
    token::{Memory, Token},
};

/// Outcome of dispatching one token or executing one block. `Break` is the
/// distinguished unwinding signal raised by `break`: not an error, carries
/// no payload, and is caught by the nearest enclosing `loop`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Break,
}

/// Per-loop state entry. Only the innermost context is the target of
/// `break`.
#[derive(Debug, Default)]
pub(crate) struct LoopContext {
    pub should_break: bool,
}

/// Consumes token streams and drives the operand stack, global scope, and
/// loop-control stack.
pub struct Interpreter {
    pub(crate) stack: OperandStack,
    pub(crate) globals: Scope,
    pub(crate) loops: Vec<LoopContext>,
    builtins: BuiltinTable,
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}

impl Interpreter {
    pub fn new() -> Self {
        Self {
            stack: OperandStack::new(),
            globals: Scope::new(),
            loops: Vec::new(),
            builtins: BuiltinTable::standard(),
        }
    }

    /// Runs a top-level program. The alternative entry point to the file
    /// based front-end: callers hand over source text directly.
    pub fn run_source(&mut self, source: &str) -> Result<()> {
        self.run_block(source, None)?;
        Ok(())
    }

    /// Executes block text against the given local scope. Re-enters the
    /// parser on the text and consumes the resulting stream.
    pub(crate) fn run_block(&mut self, source: &str, local: Option<&Memory>) -> Result<Flow> {
        let mut stream = Parser::new(source);
        while let Some(item) = stream.next() {
            let token = item.map_err(NumenError::from)?;
            if let Flow::Break = self.dispatch(token, local)? {
                // Drain the rest of the stream so the parser finishes
                // cleanly, then let the enclosing loop observe the flag.
                for _ in stream.by_ref() {}
                return Ok(Flow::Break);
            }
        }
        Ok(Flow::Continue)
    }

    fn dispatch(&mut self, token: Token, local: Option<&Memory>) -> Result<Flow> {
        let Token::Symbol(name) = token else {
            self.stack.push(token);
            return Ok(Flow::Continue);
        };
        if let Some(run) = self.builtins.lookup(&name) {
            return run(self, local);
        }
        if let Some(value) = local.and_then(|memory| memory.get(&name)) {
            self.stack.push(value.clone());
            return Ok(Flow::Continue);
        }
        // Unresolved names stay on the stack in quoted form; `store`,
        // `load` and the record operations consume them as names.
        self.stack.push(Token::Symbol(name));
        Ok(Flow::Continue)
    }

    /// Reads a name through the local scope first, then the global scope.
    pub(crate) fn read_scoped(&self, name: &str, local: Option<&Memory>) -> Option<Token> {
        if let Some(value) = local.and_then(|memory| memory.get(name)) {
            return Some(value.clone());
        }
        self.globals.read(name).cloned()
    }

    /// The operand stack, bottom to top.
    pub fn operands(&self) -> &[Token] {
        self.stack.as_slice()
    }

    pub fn top(&self) -> Option<&Token> {
        self.stack.peek()
    }

    /// Looks up a binding in the global scope.
    pub fn global(&self, name: &str) -> Option<&Token> {
        self.globals.read(name)
    }
}
