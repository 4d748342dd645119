use std::str::CharIndices;

use crate::{
    diagnostics::{Diagnostic, ErrorKind, SourceSpan},
    token::{Memory, Token, TypeLiteral},
};

/// Parse a complete source text into a finite token sequence. This is the
/// collection-sink entry point; `( … )` groups use it to parse their
/// contents eagerly.
pub fn parse_collect(source: &str) -> Result<Vec<Token>, Diagnostic> {
    Parser::new(source).collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Parsing,
    String,
    Block,
    Procedure,
    Memory,
    LineComment,
    BlockComment,
}

/// A single-pass, character-driven parser that yields tokens lazily in
/// document order. The interpreter pulls tokens as it executes; abandoning
/// the iterator is how a stream is drained.
pub struct Parser<'a> {
    source: &'a str,
    chars: CharIndices<'a>,
    state: State,
    word: String,
    has_digit: bool,
    has_letter: bool,
    has_dot: bool,
    depth: usize,
    comment_slash: bool,
    closing_star: bool,
    string_escape: bool,
    construct_start: usize,
    done: bool,
}

impl<'a> Parser<'a> {
    pub fn new(source: &'a str) -> Self {
        Self {
            source,
            chars: source.char_indices(),
            state: State::Parsing,
            word: String::new(),
            has_digit: false,
            has_letter: false,
            has_dot: false,
            depth: 0,
            comment_slash: false,
            closing_star: false,
            string_escape: false,
            construct_start: 0,
            done: false,
        }
    }

    fn step(&mut self, idx: usize, ch: char) -> Option<Result<Token, Diagnostic>> {
        match self.state {
            State::Parsing => {
                if self.comment_slash {
                    self.comment_slash = false;
                    match ch {
                        '/' => {
                            self.state = State::LineComment;
                            return self.flush_word();
                        }
                        '*' => {
                            self.state = State::BlockComment;
                            self.closing_star = false;
                            self.construct_start = idx.saturating_sub(1);
                            return self.flush_word();
                        }
                        // Not a comment after all; the slash belongs to the
                        // current word, so a lone `/` resolves as a symbol.
                        _ => self.word_char('/'),
                    }
                }
                self.parsing_char(idx, ch)
            }
            State::LineComment => {
                if ch == '\n' {
                    self.state = State::Parsing;
                }
                None
            }
            State::BlockComment => {
                if ch == '*' {
                    self.closing_star = true;
                } else if self.closing_star && ch == '/' {
                    self.closing_star = false;
                    self.state = State::Parsing;
                } else {
                    self.closing_star = false;
                }
                None
            }
            State::String => self.string_char(ch),
            State::Block => {
                match ch {
                    '{' => {
                        self.depth += 1;
                        self.word.push(ch);
                    }
                    '}' => {
                        self.depth -= 1;
                        if self.depth == 0 {
                            self.state = State::Parsing;
                            let body = std::mem::take(&mut self.word);
                            return Some(Ok(Token::Block(body.trim().to_string())));
                        }
                        self.word.push(ch);
                    }
                    _ => self.word.push(ch),
                }
                None
            }
            State::Procedure => {
                match ch {
                    '(' => {
                        self.depth += 1;
                        self.word.push(ch);
                    }
                    ')' => {
                        self.depth -= 1;
                        if self.depth == 0 {
                            self.state = State::Parsing;
                            let inner = std::mem::take(&mut self.word);
                            return Some(parse_collect(&inner).map(Token::Stack));
                        }
                        self.word.push(ch);
                    }
                    _ => self.word.push(ch),
                }
                None
            }
            State::Memory => {
                match ch {
                    '[' => {
                        self.depth += 1;
                        self.word.push(ch);
                    }
                    ']' => {
                        self.depth -= 1;
                        if self.depth == 0 {
                            self.state = State::Parsing;
                            let inner = std::mem::take(&mut self.word);
                            if inner.trim().is_empty() {
                                return Some(Ok(Token::Memory(Memory::new())));
                            }
                            return Some(Err(Diagnostic::new(
                                ErrorKind::Parse,
                                "memory literals must be empty",
                            )
                            .with_span(SourceSpan::new(
                                self.construct_start,
                                idx + ch.len_utf8(),
                            ))
                            .with_note(
                                "the grammar for non-empty memory contents is not fixed yet",
                            )));
                        }
                        self.word.push(ch);
                    }
                    _ => self.word.push(ch),
                }
                None
            }
        }
    }

    fn parsing_char(&mut self, idx: usize, ch: char) -> Option<Result<Token, Diagnostic>> {
        match ch {
            c if c.is_whitespace() => self.flush_word(),
            '"' => {
                let pending = self.flush_word();
                self.state = State::String;
                self.construct_start = idx;
                pending
            }
            '{' => {
                let pending = self.flush_word();
                self.state = State::Block;
                self.depth = 1;
                self.construct_start = idx;
                pending
            }
            '(' => {
                let pending = self.flush_word();
                self.state = State::Procedure;
                self.depth = 1;
                self.construct_start = idx;
                pending
            }
            '[' => {
                let pending = self.flush_word();
                self.state = State::Memory;
                self.depth = 1;
                self.construct_start = idx;
                pending
            }
            '/' => {
                self.comment_slash = true;
                None
            }
            _ => {
                self.word_char(ch);
                None
            }
        }
    }

    fn string_char(&mut self, ch: char) -> Option<Result<Token, Diagnostic>> {
        if self.string_escape {
            self.string_escape = false;
            match ch {
                'n' => self.word.push('\n'),
                't' => self.word.push('\t'),
                '"' => self.word.push('"'),
                '\\' => self.word.push('\\'),
                // Unrecognised escape: the backslash and its follower are
                // both dropped.
                _ => {}
            }
            return None;
        }
        match ch {
            '"' => {
                self.state = State::Parsing;
                let text = std::mem::take(&mut self.word);
                Some(Ok(Token::Str(text)))
            }
            '\\' => {
                self.string_escape = true;
                None
            }
            _ => {
                self.word.push(ch);
                None
            }
        }
    }

    fn word_char(&mut self, ch: char) {
        if ch.is_alphabetic() {
            self.has_letter = true;
        } else if ch.is_ascii_digit() {
            self.has_digit = true;
        } else if ch == '.' {
            self.has_dot = true;
        }
        self.word.push(ch);
    }

    /// Classify and emit the accumulated word, if any. Returns `None` both
    /// for an empty buffer and for a skipped unparseable numeral.
    fn flush_word(&mut self) -> Option<Result<Token, Diagnostic>> {
        if self.word.is_empty() {
            return None;
        }
        let word = std::mem::take(&mut self.word);
        let (has_digit, has_letter, has_dot) = (self.has_digit, self.has_letter, self.has_dot);
        self.has_digit = false;
        self.has_letter = false;
        self.has_dot = false;

        if let Some(value) = parse_radix_int(&word) {
            return Some(Ok(Token::Int(value)));
        }
        if has_digit && !has_letter {
            if has_dot {
                return match word.parse::<f64>() {
                    Ok(value) => Some(Ok(Token::Float(value))),
                    Err(err) => {
                        eprintln!("[parser] skipping unparseable float literal `{word}`: {err}");
                        None
                    }
                };
            }
            return match word.parse::<i64>() {
                Ok(value) => Some(Ok(Token::Int(value))),
                Err(err) => {
                    eprintln!("[parser] skipping unparseable integer literal `{word}`: {err}");
                    None
                }
            };
        }
        if word == "true" {
            return Some(Ok(Token::Bool(true)));
        }
        if word == "false" {
            return Some(Ok(Token::Bool(false)));
        }
        if let Some(literal) = TypeLiteral::parse(&word) {
            return Some(Ok(Token::Type(literal)));
        }
        Some(Ok(Token::Symbol(word)))
    }

    fn finish(&mut self) -> Option<Result<Token, Diagnostic>> {
        if self.done {
            return None;
        }
        self.done = true;
        let end = self.source.len();
        let unclosed = |message: &str, start: usize| {
            Some(Err(Diagnostic::new(ErrorKind::Parse, message)
                .with_span(SourceSpan::new(start, end))))
        };
        match self.state {
            State::Parsing => {
                if self.comment_slash {
                    self.comment_slash = false;
                    self.word_char('/');
                }
                self.flush_word()
            }
            State::LineComment => None,
            State::String => unclosed(
                "string never closed, might be a missing `\"`",
                self.construct_start,
            ),
            State::Block => unclosed(
                "block never closed, might be a missing `}`",
                self.construct_start,
            ),
            State::Procedure => unclosed(
                "stack never closed, might be a missing `)`",
                self.construct_start,
            ),
            State::Memory => unclosed(
                "memory never closed, might be a missing `]`",
                self.construct_start,
            ),
            State::BlockComment => unclosed(
                "block comment never closed, might be a missing `*/`",
                self.construct_start,
            ),
        }
    }
}

impl<'a> Iterator for Parser<'a> {
    type Item = Result<Token, Diagnostic>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        while let Some((idx, ch)) = self.chars.next() {
            if let Some(item) = self.step(idx, ch) {
                if item.is_err() {
                    self.done = true;
                }
                return Some(item);
            }
        }
        self.finish()
    }
}

fn parse_radix_int(word: &str) -> Option<i64> {
    let (negative, unsigned) = match word.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, word.strip_prefix('+').unwrap_or(word)),
    };
    let (radix, digits) = if let Some(hex) = strip_prefix_ci(unsigned, "0x") {
        (16, hex)
    } else if let Some(octal) = strip_prefix_ci(unsigned, "0o") {
        (8, octal)
    } else if let Some(binary) = strip_prefix_ci(unsigned, "0b") {
        (2, binary)
    } else {
        return None;
    };
    if digits.is_empty() {
        return None;
    }
    let value = i64::from_str_radix(digits, radix).ok()?;
    Some(if negative { -value } else { value })
}

fn strip_prefix_ci<'a>(word: &'a str, prefix: &str) -> Option<&'a str> {
    let head = word.get(..prefix.len())?;
    if head.eq_ignore_ascii_case(prefix) {
        Some(&word[prefix.len()..])
    } else {
        None
    }
}
