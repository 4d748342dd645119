//! Core library for the Numen concatenative language: a streaming
//! character-driven parser, the operand-stack interpreter, and the built-in
//! operation table, plus REPL utilities for the CLI front-end.

pub mod builtins;
pub mod diagnostics;
pub mod interpreter;
pub mod parser;
pub mod repl;
pub mod scope;
pub mod stack;
pub mod token;

pub use diagnostics::{Diagnostic, ErrorKind, NumenError, SourceSpan};
pub use interpreter::{Flow, Interpreter};
pub use repl::Repl;
pub use token::{Memory, Token, TypeLiteral};
