//! Positioned syntax tree
//!
//! Every node keeps the byte range it was read from, so the original text of any
//! element can be recovered with [`Range::extract`]. Nothing is interpreted here: dates
//! are not validated and decimals are kept as text. Turning a [`File`] into model
//! directives is the job of [`crate::parser::build`].

use std::fmt;

use super::scanner::Location;

/// A half-open byte range `[start, end)` into the parsed text
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Range {
    pub start: usize,
    pub end: usize,
}

impl Range {
    pub fn new(start: usize, end: usize) -> Range {
        Range { start, end }
    }

    /// An empty range at the given offset
    pub fn at(offset: usize) -> Range {
        Range::new(offset, offset)
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// The text covered by the range
    pub fn extract<'t>(&self, text: &'t str) -> &'t str {
        &text[self.start..self.end]
    }
}

macro_rules! leaf {
    ($($(#[$doc:meta])* $name:ident),* $(,)?) => {
        $(
            $(#[$doc])*
            #[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
            pub struct $name {
                pub range: Range,
            }

            impl $name {
                pub fn extract<'t>(&self, text: &'t str) -> &'t str {
                    self.range.extract(text)
                }
            }
        )*
    };
}

leaf!(
    /// `YYYY-MM-DD`, not validated as a calendar date
    Date,
    /// An optionally negative decimal number such as `-10.25`
    Decimal,
    Commodity,
    /// One of the interval keywords accepted by `@accrue`
    Interval,
    /// `#tag`, the range includes the hash sign
    Tag,
);

/// An account name, or an account macro when it starts with `$`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Account {
    pub range: Range,
    pub is_macro: bool,
}

impl Account {
    pub fn extract<'t>(&self, text: &'t str) -> &'t str {
        self.range.extract(text)
    }
}

/// A double-quoted string; `content` excludes the quotes
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QuotedString {
    pub range: Range,
    pub content: Range,
}

/// `{<price> <commodity>[, "<label>"][, <date>]}` after a booking
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Lot {
    pub range: Range,
    pub price: Decimal,
    pub commodity: Commodity,
    pub label: Option<QuotedString>,
    pub date: Option<Date>,
}

/// A parenthesized commodity list, used by `@performance` and by bookings
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Performance {
    pub range: Range,
    pub targets: Vec<Commodity>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Accrual {
    pub range: Range,
    pub interval: Interval,
    pub start: Date,
    pub end: Date,
    pub account: Account,
}

/// The annotation lines preceding a transaction
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Addons {
    pub range: Range,
    pub performance: Option<Performance>,
    pub accrual: Option<Accrual>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Booking {
    pub range: Range,
    pub credit: Account,
    pub debit: Account,
    pub amount: Decimal,
    pub commodity: Commodity,
    pub lot: Option<Lot>,
    pub targets: Option<Performance>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Transaction {
    pub range: Range,
    pub addons: Option<Addons>,
    pub date: Date,
    pub description: QuotedString,
    pub tags: Vec<Tag>,
    pub bookings: Vec<Booking>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Open {
    pub range: Range,
    pub date: Date,
    pub account: Account,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Close {
    pub range: Range,
    pub date: Date,
    pub account: Account,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Price {
    pub range: Range,
    pub date: Date,
    pub commodity: Commodity,
    pub price: Decimal,
    pub target: Commodity,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Assertion {
    pub range: Range,
    pub date: Date,
    pub account: Account,
    pub amount: Decimal,
    pub commodity: Commodity,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Include {
    pub range: Range,
    pub path: QuotedString,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DirectiveKind {
    Transaction(Transaction),
    Open(Open),
    Close(Close),
    Price(Price),
    Assertion(Assertion),
    Include(Include),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Directive {
    pub range: Range,
    pub kind: DirectiveKind,
}

/// A parsed journal file
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct File {
    pub path: String,
    pub text: String,
    pub range: Range,
    pub directives: Vec<Directive>,
}

/// What went wrong at one level of a syntax error chain
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ErrorKind {
    #[error("{0}")]
    Context(String),
    #[error("unexpected character `{got}`, want {want}")]
    UnexpectedCharacter { got: char, want: String },
    #[error("unexpected end of file, want {want}")]
    UnexpectedEof { want: String },
    #[error("unexpected input, want {want}")]
    UnexpectedInput { want: String },
    #[error("duplicate {0}")]
    Duplicate(&'static str),
}

/// A syntax error with the stack of contexts it occurred in
///
/// The outermost error describes the widest context ("while parsing file"), each
/// `wrapped` error a narrower one, down to the scanner error that stopped the parse.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Error {
    pub kind: ErrorKind,
    pub range: Range,
    pub wrapped: Option<Box<Error>>,
}

impl Error {
    pub fn new(kind: ErrorKind, range: Range) -> Error {
        Error {
            kind,
            range,
            wrapped: None,
        }
    }

    /// Wraps `inner` into a context error covering `range`
    pub fn wrap(context: impl Into<String>, range: Range, inner: Error) -> Error {
        Error {
            kind: ErrorKind::Context(context.into()),
            range,
            wrapped: Some(Box::new(inner)),
        }
    }

    pub fn message(&self) -> String {
        self.kind.to_string()
    }

    /// Iterates from the outermost context to the root cause
    pub fn chain(&self) -> Chain<'_> {
        Chain {
            current: Some(self),
        }
    }

    pub fn root_cause(&self) -> &Error {
        self.chain().last().unwrap_or(self)
    }

    /// One line per level, prefixed with `path:line:column`
    pub fn render(&self, path: &str, text: &str) -> String {
        self.chain()
            .enumerate()
            .map(|(depth, e)| {
                let location = Location::find(text, e.range.start).unwrap_or_default();
                format!(
                    "{:indent$}{}:{}: {}",
                    "",
                    path,
                    location,
                    e.kind,
                    indent = 2 * depth
                )
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, e) in self.chain().enumerate() {
            if i > 0 {
                write!(f, ": ")?;
            }
            write!(f, "{}", e.kind)?;
        }
        Ok(())
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.wrapped
            .as_deref()
            .map(|e| e as &(dyn std::error::Error + 'static))
    }
}

pub struct Chain<'a> {
    current: Option<&'a Error>,
}

impl<'a> Iterator for Chain<'a> {
    type Item = &'a Error;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.current?;
        self.current = current.wrapped.as_deref();
        Some(current)
    }
}

/// A file that failed to parse, with everything read up to the failure
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{error}")]
pub struct PartialFile {
    pub file: File,
    pub error: Error,
}
