//! Parser for Rust `Debug` struct text.
//!
//! The puzzle generator prints its results with `{:?}`. This module reads
//! that notation into a [`serde_json::Value`] so the caller can deserialize
//! typed values with serde:
//!
//! ```text
//! Pos { y: 3, x: 4 }                 ->  {"y": 3, "x": 4}
//! [Move { c: 1, d: 2 }]              ->  [{"c": 1, "d": 2}]
//! ```
//!
//! Type names in front of struct bodies are dropped. Bare identifiers other
//! than `true` and `false` become strings, which covers unit enum variants.

use serde_json::{Map, Value};

/// Errors raised while reading debug text. Offsets are byte positions.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DebugTextError {
    #[error("unexpected end of input at byte {offset}, expected {expected}")]
    UnexpectedEnd { offset: usize, expected: &'static str },

    #[error("unexpected {found:?} at byte {offset}, expected {expected}")]
    Unexpected {
        offset: usize,
        found: char,
        expected: &'static str,
    },

    #[error("integer out of range at byte {offset}")]
    IntegerRange { offset: usize },

    #[error("duplicate field `{field}` at byte {offset}")]
    DuplicateField { offset: usize, field: String },
}

/// Parses one complete debug-formatted value.
pub fn parse_debug_text(text: &str) -> Result<Value, DebugTextError> {
    let mut parser = Parser { src: text, pos: 0 };
    let value = parser.value()?;
    parser.skip_whitespace();
    match parser.peek() {
        None => Ok(value),
        Some(found) => Err(DebugTextError::Unexpected {
            offset: parser.pos,
            found,
            expected: "end of input",
        }),
    }
}

struct Parser<'a> {
    src: &'a str,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn peek(&self) -> Option<char> {
        self.src[self.pos..].chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn skip_whitespace(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.bump();
        }
    }

    fn error(&self, expected: &'static str) -> DebugTextError {
        match self.peek() {
            Some(found) => DebugTextError::Unexpected {
                offset: self.pos,
                found,
                expected,
            },
            None => DebugTextError::UnexpectedEnd {
                offset: self.pos,
                expected,
            },
        }
    }

    fn expect(&mut self, wanted: char, expected: &'static str) -> Result<(), DebugTextError> {
        self.skip_whitespace();
        if self.peek() == Some(wanted) {
            self.bump();
            Ok(())
        } else {
            Err(self.error(expected))
        }
    }

    fn value(&mut self) -> Result<Value, DebugTextError> {
        self.skip_whitespace();
        match self.peek() {
            Some('[') => self.list(),
            Some('"') => self.string().map(Value::String),
            Some(c) if c == '-' || c.is_ascii_digit() => self.integer(),
            Some(c) if is_ident_start(c) => {
                let name = self.ident();
                self.skip_whitespace();
                if self.peek() == Some('{') {
                    return self.struct_body();
                }
                Ok(match name {
                    "true" => Value::Bool(true),
                    "false" => Value::Bool(false),
                    other => Value::String(other.to_string()),
                })
            }
            _ => Err(self.error("a value")),
        }
    }

    fn ident(&mut self) -> &'a str {
        let src = self.src;
        let start = self.pos;
        while self
            .peek()
            .is_some_and(|c| c.is_alphanumeric() || c == '_')
        {
            self.bump();
        }
        &src[start..self.pos]
    }

    fn integer(&mut self) -> Result<Value, DebugTextError> {
        let start = self.pos;
        if self.peek() == Some('-') {
            self.bump();
        }
        if !self.peek().is_some_and(|c| c.is_ascii_digit()) {
            return Err(self.error("a digit"));
        }
        while self.peek().is_some_and(|c| c.is_ascii_digit()) {
            self.bump();
        }
        let digits = &self.src[start..self.pos];
        digits
            .parse::<i64>()
            .map(Value::from)
            .map_err(|_| DebugTextError::IntegerRange { offset: start })
    }

    fn string(&mut self) -> Result<String, DebugTextError> {
        self.expect('"', "'\"'")?;
        let mut out = String::new();
        loop {
            match self.bump() {
                Some('"') => return Ok(out),
                Some('\\') => match self.bump() {
                    Some('n') => out.push('\n'),
                    Some('t') => out.push('\t'),
                    Some('r') => out.push('\r'),
                    Some(c @ ('\\' | '"' | '\'')) => out.push(c),
                    _ => return Err(self.error("an escape sequence")),
                },
                Some(c) => out.push(c),
                None => return Err(self.error("closing '\"'")),
            }
        }
    }

    fn struct_body(&mut self) -> Result<Value, DebugTextError> {
        self.expect('{', "'{'")?;
        let mut fields = Map::new();
        loop {
            self.skip_whitespace();
            match self.peek() {
                Some('}') => {
                    self.bump();
                    return Ok(Value::Object(fields));
                }
                Some(c) if is_ident_start(c) => {}
                _ => return Err(self.error("a field name or '}'")),
            }

            let offset = self.pos;
            let name = self.ident().to_string();
            self.expect(':', "':'")?;
            let value = self.value()?;
            if fields.insert(name.clone(), value).is_some() {
                return Err(DebugTextError::DuplicateField {
                    offset,
                    field: name,
                });
            }

            self.skip_whitespace();
            match self.peek() {
                Some(',') => {
                    self.bump();
                }
                Some('}') => {}
                _ => return Err(self.error("',' or '}'")),
            }
        }
    }

    fn list(&mut self) -> Result<Value, DebugTextError> {
        self.expect('[', "'['")?;
        let mut items = Vec::new();
        loop {
            self.skip_whitespace();
            if self.peek() == Some(']') {
                self.bump();
                return Ok(Value::Array(items));
            }

            items.push(self.value()?);

            self.skip_whitespace();
            match self.peek() {
                Some(',') => {
                    self.bump();
                }
                Some(']') => {}
                _ => return Err(self.error("',' or ']'")),
            }
        }
    }
}

fn is_ident_start(c: char) -> bool {
    c.is_alphabetic() || c == '_'
}
