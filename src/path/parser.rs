//! Finite-state parser for path expressions
//!
//! ```text
//! expr    := ws* (element (ws* sep ws* element)*)? ws*
//! element := '"' char* '"' | ('0' | '0x' | '0X') hexdigit*
//! sep     := '/' | '-'
//! ```
//!
//! The driver reads one character at a time and feeds it to the current
//! state. The only lookahead is a single character of pushback, used when a
//! hex run ends: the terminating character is handed back so the
//! `AfterElement` state can decide whether it is a legal terminator.

use super::{KeyPath, ParseFailure, PathError};
use crate::key::Key;
use std::str::Chars;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    /// Nothing read yet; end of input here means the root
    Start,
    /// A separator was read, an element must follow
    BeforeElement,
    /// Inside a quoted string
    InString,
    /// Reading hex digits; `prefix_open` while an `x` may still follow the `0`
    HexDigits { prefix_open: bool },
    /// An element was completed
    AfterElement,
}

/// Where the element being read will be stored
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Slot {
    Bucket,
    Value,
}

/// Character source with a single character of pushback
struct Scanner<'a> {
    chars: Chars<'a>,
    pushed_back: Option<char>,
    /// Offset of the next character to be returned
    position: usize,
}

impl<'a> Scanner<'a> {
    fn new(input: &'a str) -> Self {
        Self {
            chars: input.chars(),
            pushed_back: None,
            position: 0,
        }
    }

    fn next(&mut self) -> Option<char> {
        let c = self.pushed_back.take().or_else(|| self.chars.next())?;
        self.position += 1;
        Some(c)
    }

    fn unread(&mut self, c: char) {
        debug_assert!(self.pushed_back.is_none(), "only one character of pushback");
        self.pushed_back = Some(c);
        self.position -= 1;
    }

    /// Offset of the character returned by the last `next`
    const fn last(&self) -> usize {
        self.position.saturating_sub(1)
    }
}

struct Parser<'a> {
    scanner: Scanner<'a>,
    path: KeyPath,
    value: Option<Key>,
    slot: Slot,
    buffer: String,
    element_start: usize,
}

pub(super) fn parse(expression: &str) -> Result<(KeyPath, Option<Key>), PathError> {
    let mut parser = Parser {
        scanner: Scanner::new(expression),
        path: KeyPath::root(),
        value: None,
        slot: Slot::Bucket,
        buffer: String::new(),
        element_start: 0,
    };

    let mut state = State::Start;
    loop {
        let c = parser.scanner.next();
        match parser.advance(state, c)? {
            Some(next) => state = next,
            None => return Ok((parser.path, parser.value)),
        }
    }
}

impl Parser<'_> {
    /// Feed one character (or end of input) to `state`
    ///
    /// Returns the next state, or `None` once the input is accepted.
    fn advance(&mut self, state: State, c: Option<char>) -> Result<Option<State>, PathError> {
        match state {
            State::Start => match c {
                None => Ok(None),
                Some(c) if c.is_whitespace() => Ok(Some(State::Start)),
                // A value directly under the root
                Some('-') => {
                    self.slot = Slot::Value;
                    Ok(Some(State::BeforeElement))
                }
                Some(c) => self.begin_element(c),
            },

            State::BeforeElement => match c {
                None => Err(PathError::at(
                    self.scanner.position,
                    ParseFailure::MissingElement,
                )),
                Some(c) if c.is_whitespace() => Ok(Some(State::BeforeElement)),
                Some(c) => self.begin_element(c),
            },

            State::InString => match c {
                None => Err(PathError::at(
                    self.element_start,
                    ParseFailure::UnterminatedString,
                )),
                Some('"') => {
                    let key = Key::from_text(std::mem::take(&mut self.buffer));
                    self.finish_element(key);
                    Ok(Some(State::AfterElement))
                }
                Some(c) => {
                    self.buffer.push(c);
                    Ok(Some(State::InString))
                }
            },

            State::HexDigits { prefix_open } => match c {
                Some('x' | 'X') if prefix_open => Ok(Some(State::HexDigits { prefix_open: false })),
                Some(c) if c.is_ascii_hexdigit() => {
                    self.buffer.push(c);
                    Ok(Some(State::HexDigits { prefix_open: false }))
                }
                None => {
                    self.finish_hex()?;
                    Ok(None)
                }
                Some(c) => {
                    self.finish_hex()?;
                    self.scanner.unread(c);
                    Ok(Some(State::AfterElement))
                }
            },

            State::AfterElement => match c {
                None => Ok(None),
                Some(c) if c.is_whitespace() => Ok(Some(State::AfterElement)),
                Some(sep @ ('/' | '-')) => {
                    if self.value.is_some() {
                        return Err(PathError::at(
                            self.scanner.last(),
                            ParseFailure::BucketAfterValue,
                        ));
                    }
                    self.slot = if sep == '-' { Slot::Value } else { Slot::Bucket };
                    Ok(Some(State::BeforeElement))
                }
                Some(c) => Err(self.unexpected(c)),
            },
        }
    }

    fn begin_element(&mut self, c: char) -> Result<Option<State>, PathError> {
        self.element_start = self.scanner.last();
        self.buffer.clear();
        match c {
            '"' => Ok(Some(State::InString)),
            '0' => Ok(Some(State::HexDigits { prefix_open: true })),
            c => Err(self.unexpected(c)),
        }
    }

    fn finish_hex(&mut self) -> Result<(), PathError> {
        let key = Key::from_hex(&self.buffer)
            .map_err(|e| PathError::at(self.element_start, ParseFailure::MalformedHex(e)))?;
        self.buffer.clear();
        self.finish_element(key);
        Ok(())
    }

    fn finish_element(&mut self, key: Key) {
        match self.slot {
            Slot::Bucket => self.path.push(key),
            Slot::Value => self.value = Some(key),
        }
    }

    fn unexpected(&self, c: char) -> PathError {
        PathError::at(self.scanner.last(), ParseFailure::UnexpectedCharacter(c))
    }
}
