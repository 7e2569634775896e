use chrono::NaiveDate;
use num::rational::BigRational;
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;

use crate::models::quantity::format_quantity;
use crate::models::{Account, Commodity};
use crate::parser::syntax;

/// Everything that can make a run fail
#[derive(Debug, Error)]
pub enum Error {
    #[error("{}: {error}", path.display())]
    Syntax { path: PathBuf, error: syntax::Error },

    #[error("{}:{}..{}: {error}", path.display(), range.start, range.end)]
    Model {
        path: PathBuf,
        range: syntax::Range,
        error: ModelError,
    },

    #[error(transparent)]
    Ledger(#[from] LedgerError),

    #[error("{}: error including {}", from.display(), path.display())]
    Include {
        from: PathBuf,
        path: PathBuf,
        #[source]
        error: io::Error,
    },

    #[error("{} is included more than once", path.display())]
    DuplicateInclude { path: PathBuf },

    #[error("configuration, line {line}: {message}")]
    Config { line: usize, message: String },

    #[error("cancelled")]
    Cancelled,
}

impl Error {
    /// Renders the error with `line:column` positions, given the text the error
    /// refers to
    pub fn render(&self, text: &str) -> String {
        match self {
            Error::Syntax { path, error } => error.render(&path.display().to_string(), text),
            other => other.to_string(),
        }
    }
}

/// Failures turning parsed text into model values
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModelError {
    #[error("invalid date `{0}`")]
    InvalidDate(String),
    #[error("invalid decimal `{0}`")]
    InvalidDecimal(String),
    #[error("invalid account type in `{0}`")]
    InvalidAccountType(String),
    #[error("invalid account name `{0}`")]
    InvalidAccountName(String),
    #[error("invalid interval `{0}`")]
    InvalidInterval(String),
    #[error("unresolved account macro `{0}`")]
    UnresolvedMacro(String),
    #[error("accrual period from {start} to {end} is empty")]
    EmptyAccrual { start: NaiveDate, end: NaiveDate },
    #[error("price of {0} is zero")]
    ZeroPrice(String),
}

/// Violations of the bookkeeping rules, found while computing balances
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LedgerError {
    #[error("{date}: account {account} is already open")]
    AccountAlreadyOpen { date: NaiveDate, account: Arc<Account> },

    #[error("{date}: balance assertion on account {account}, which is not open")]
    AssertionOnUnopenedAccount { date: NaiveDate, account: Arc<Account> },

    #[error("{date}: posting to account {account}, which is not open")]
    PostingToUnopenedOrClosedAccount { date: NaiveDate, account: Arc<Account> },

    #[error(
        "{date}: assertion failed: account {account} has {} {commodity}, want {} {commodity}",
        format_quantity(.actual),
        format_quantity(.expected)
    )]
    AssertionFailed {
        date: NaiveDate,
        account: Arc<Account>,
        commodity: Arc<Commodity>,
        expected: BigRational,
        actual: BigRational,
    },

    #[error(
        "{date}: cannot close account {account}, it still holds {} {commodity}",
        format_quantity(.amount)
    )]
    CloseWithNonZeroBalance {
        date: NaiveDate,
        account: Arc<Account>,
        commodity: Arc<Commodity>,
        amount: BigRational,
    },

    #[error("{date}: cannot close account {account}, it is not open")]
    CloseOfUnopenedAccount { date: NaiveDate, account: Arc<Account> },
}
