use std::fmt;

use indexmap::IndexMap;

use crate::diagnostics::{Diagnostic, ErrorKind};

/// Payload of a `[ … ]` record. Key lookup order is insertion order, which
/// keeps rendering deterministic; record semantics do not depend on it.
pub type Memory = IndexMap<String, Token>;

/// A parsed Numen value. Everything the parser emits and everything the
/// operand stack holds is one of these.
#[derive(Clone, PartialEq)]
pub enum Token {
    Int(i64),
    Float(f64),
    Str(String),
    Bool(bool),
    /// Unparsed source text of a `{ … }` body, outer braces removed and
    /// surrounding whitespace trimmed. Parsed only when executed.
    Block(String),
    /// Eagerly parsed contents of a `( … )` group.
    Stack(Vec<Token>),
    Memory(Memory),
    Type(TypeLiteral),
    Symbol(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeLiteral {
    Int,
    Float,
    Str,
    Bool,
    Block,
    Stack,
    Memory,
    Any,
}

impl TypeLiteral {
    /// Case-insensitive lookup against the fixed set of type names.
    pub fn parse(word: &str) -> Option<Self> {
        let literal = match word.to_ascii_lowercase().as_str() {
            "int" => Self::Int,
            "float" => Self::Float,
            "str" => Self::Str,
            "bool" => Self::Bool,
            "block" => Self::Block,
            "stack" => Self::Stack,
            "memory" => Self::Memory,
            "any" => Self::Any,
            _ => return None,
        };
        Some(literal)
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Int => "int",
            Self::Float => "float",
            Self::Str => "str",
            Self::Bool => "bool",
            Self::Block => "block",
            Self::Stack => "stack",
            Self::Memory => "memory",
            Self::Any => "any",
        }
    }
}

impl fmt::Display for TypeLiteral {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl Token {
    pub fn type_name(&self) -> &'static str {
        match self {
            Token::Int(_) => "Integer",
            Token::Float(_) => "Float",
            Token::Str(_) => "String",
            Token::Bool(_) => "Boolean",
            Token::Block(_) => "Block",
            Token::Stack(_) => "Stack",
            Token::Memory(_) => "Memory",
            Token::Type(_) => "Type",
            Token::Symbol(_) => "Symbol",
        }
    }

    pub fn expect_block(&self) -> Result<&str, Diagnostic> {
        match self {
            Token::Block(body) => Ok(body),
            other => Err(Diagnostic::new(
                ErrorKind::TypeError,
                format!("expected Block, found {}", other.type_name()),
            )),
        }
    }

    pub fn expect_memory(&self) -> Result<&Memory, Diagnostic> {
        match self {
            Token::Memory(entries) => Ok(entries),
            other => Err(Diagnostic::new(
                ErrorKind::TypeError,
                format!("expected Memory, found {}", other.type_name()),
            )),
        }
    }

    /// Canonical source rendering: parsing the result yields an equal token.
    /// Floats always carry a decimal point so they do not collapse to
    /// integers on the way back in.
    pub fn to_source(&self) -> String {
        match self {
            Token::Int(n) => n.to_string(),
            Token::Float(n) => {
                if n.is_finite() && n.fract() == 0.0 {
                    format!("{n:.1}")
                } else {
                    n.to_string()
                }
            }
            Token::Str(s) => {
                let mut quoted = String::with_capacity(s.len() + 2);
                quoted.push('"');
                for ch in s.chars() {
                    match ch {
                        '\\' => quoted.push_str("\\\\"),
                        '"' => quoted.push_str("\\\""),
                        '\n' => quoted.push_str("\\n"),
                        '\t' => quoted.push_str("\\t"),
                        other => quoted.push(other),
                    }
                }
                quoted.push('"');
                quoted
            }
            Token::Bool(b) => b.to_string(),
            Token::Block(body) => format!("{{ {body} }}"),
            Token::Stack(items) => {
                let inner: Vec<String> = items.iter().map(Token::to_source).collect();
                format!("( {} )", inner.join(" "))
            }
            Token::Memory(_) => "[]".to_string(),
            Token::Type(literal) => literal.name().to_string(),
            Token::Symbol(name) => name.clone(),
        }
    }
}

/// Human rendering, used by `dbgprint` and `print`: bare payloads, no tags.
impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Int(n) => write!(f, "{n}"),
            Token::Float(n) => write!(f, "{n}"),
            Token::Str(s) => write!(f, "{s}"),
            Token::Bool(b) => write!(f, "{b}"),
            Token::Block(body) => write!(f, "{{ {body} }}"),
            Token::Stack(items) => {
                write!(f, "(")?;
                for (idx, item) in items.iter().enumerate() {
                    if idx > 0 {
                        write!(f, " ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, ")")
            }
            Token::Memory(entries) => {
                write!(f, "[")?;
                for (idx, (key, value)) in entries.iter().enumerate() {
                    if idx > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{key}: {value}")?;
                }
                write!(f, "]")
            }
            Token::Type(literal) => write!(f, "{literal}"),
            Token::Symbol(name) => write!(f, "{name}"),
        }
    }
}

/// Tagged rendering: `<Tag value>`, strings in quotes, stacks with their
/// members spelled out.
impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Str(s) => write!(f, "<String \"{s}\">"),
            Token::Block(body) => write!(f, "<Block {body}>"),
            Token::Stack(items) => {
                write!(f, "<Stack (")?;
                for (idx, item) in items.iter().enumerate() {
                    if idx > 0 {
                        write!(f, " ")?;
                    }
                    write!(f, "{item:?}")?;
                }
                write!(f, ")>")
            }
            Token::Memory(entries) => {
                write!(f, "<Memory {{")?;
                for (idx, (key, value)) in entries.iter().enumerate() {
                    if idx > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{key}: {value:?}")?;
                }
                write!(f, "}}>")
            }
            other => write!(f, "<{} {}>", other.type_name(), other),
        }
    }
}
