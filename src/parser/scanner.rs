//! A forward-only cursor over journal text
use std::fmt;
use std::str::Chars;

use super::syntax::{Error, ErrorKind, Range};

/// A position in the scanned text
///
/// Lines and columns start at 1, offsets at 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Location {
    pub byte: usize,
    pub rune: usize,
    pub line: usize,
    pub column: usize,
}

impl Default for Location {
    fn default() -> Self {
        Location {
            byte: 0,
            rune: 0,
            line: 1,
            column: 1,
        }
    }
}

impl Location {
    fn step(&mut self, ch: char) {
        self.byte += ch.len_utf8();
        self.rune += 1;
        if ch == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
    }

    /// The location of byte offset `pos` in `text`, if `pos` lies on a character boundary
    pub fn find(text: &str, pos: usize) -> Option<Location> {
        if pos > text.len() || !text.is_char_boundary(pos) {
            return None;
        }
        let mut location = Location::default();
        for ch in text[..pos].chars() {
            location.step(ch);
        }
        Some(location)
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

pub struct Scanner<'a> {
    text: &'a str,
    chars: Chars<'a>,
    current: Option<char>,
    location: Location,
}

impl<'a> Scanner<'a> {
    pub fn new(text: &'a str) -> Scanner<'a> {
        let mut chars = text.chars();
        let current = chars.next();
        Scanner {
            text,
            chars,
            current,
            location: Location::default(),
        }
    }

    pub fn text(&self) -> &'a str {
        self.text
    }

    /// The character under the cursor, `None` at the end of the text
    pub fn current(&self) -> Option<char> {
        self.current
    }

    pub fn location(&self) -> Location {
        self.location
    }

    pub fn offset(&self) -> usize {
        self.location.byte
    }

    /// The unread text, starting with the current character
    pub fn rest(&self) -> &'a str {
        &self.text[self.location.byte..]
    }

    /// The first character of the unread text that does not satisfy `pred`
    pub fn peek_past(&self, pred: impl Fn(char) -> bool) -> Option<char> {
        self.rest().chars().find(|c| !pred(*c))
    }

    pub fn range_from(&self, start: usize) -> Range {
        Range::new(start, self.location.byte)
    }

    pub fn advance(&mut self) {
        if let Some(ch) = self.current {
            self.location.step(ch);
            self.current = self.chars.next();
        }
    }

    /// Consumes characters while `pred` holds and returns their range
    pub fn read_while(&mut self, pred: impl Fn(char) -> bool) -> Range {
        let start = self.offset();
        while let Some(ch) = self.current {
            if !pred(ch) {
                break;
            }
            self.advance();
        }
        self.range_from(start)
    }

    /// Consumes exactly the character `want`
    pub fn read_char(&mut self, want: char) -> Result<Range, Error> {
        self.read_char_with(&format!("`{}`", want), |c| c == want)
    }

    /// Consumes one character satisfying `pred`; `want` describes it in errors
    pub fn read_char_with(&mut self, want: &str, pred: impl Fn(char) -> bool) -> Result<Range, Error> {
        let start = self.offset();
        match self.current {
            Some(ch) if pred(ch) => {
                self.advance();
                Ok(self.range_from(start))
            }
            _ => Err(self.unexpected(want)),
        }
    }

    /// Consumes the exact string `s`
    pub fn read_string(&mut self, s: &str) -> Result<Range, Error> {
        let start = self.offset();
        for want in s.chars() {
            if self.current != Some(want) {
                return Err(Error::wrap(
                    format!("while reading {:?}", s),
                    self.range_from(start),
                    self.unexpected(&format!("`{}`", want)),
                ));
            }
            self.advance();
        }
        Ok(self.range_from(start))
    }

    /// Consumes `n` characters, failing at the end of the text
    pub fn read_n(&mut self, n: usize) -> Result<Range, Error> {
        let start = self.offset();
        for i in 0..n {
            if self.current.is_none() {
                return Err(self.unexpected(&format!("{} more characters", n - i)));
            }
            self.advance();
        }
        Ok(self.range_from(start))
    }

    /// An error for the current character, or for the end of the text
    pub fn unexpected(&self, want: &str) -> Error {
        let kind = match self.current {
            Some(got) => ErrorKind::UnexpectedCharacter {
                got,
                want: want.to_string(),
            },
            None => ErrorKind::UnexpectedEof {
                want: want.to_string(),
            },
        };
        Error::new(kind, Range::at(self.offset()))
    }

    /// Like [`Scanner::unexpected`], for expectations spanning several characters
    pub fn unexpected_input(&self, want: &str) -> Error {
        let kind = match self.current {
            Some(_) => ErrorKind::UnexpectedInput {
                want: want.to_string(),
            },
            None => ErrorKind::UnexpectedEof {
                want: want.to_string(),
            },
        };
        Error::new(kind, Range::at(self.offset()))
    }
}
