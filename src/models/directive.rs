use chrono::NaiveDate;
use num::rational::BigRational;
use std::cmp::Ordering;
use std::fmt;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;
use std::sync::Arc;

use super::date::{Interval, Partition, Period};
use super::quantity::{format_quantity, split};
use super::{Account, Commodity};

/// Where a directive was read from
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Source {
    pub path: Arc<PathBuf>,
    pub start: usize,
    pub end: usize,
}

impl Display for Source {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}..{}", self.path.display(), self.start, self.end)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Open {
    pub source: Source,
    pub date: NaiveDate,
    pub account: Arc<Account>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Close {
    pub source: Source,
    pub date: NaiveDate,
    pub account: Arc<Account>,
}

/// `1 commodity = price target` on a date
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Price {
    pub source: Source,
    pub date: NaiveDate,
    pub commodity: Arc<Commodity>,
    pub price: BigRational,
    pub target: Arc<Commodity>,
}

/// The expected balance of a position at the end of a date
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assertion {
    pub source: Source,
    pub date: NaiveDate,
    pub account: Arc<Account>,
    pub amount: BigRational,
    pub commodity: Arc<Commodity>,
}

/// Acquisition details of a booking
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lot {
    pub price: BigRational,
    pub commodity: Arc<Commodity>,
    pub label: Option<String>,
    pub date: Option<NaiveDate>,
}

/// Moves `quantity` of `commodity` from `credit` to `debit`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Posting {
    pub credit: Arc<Account>,
    pub debit: Arc<Account>,
    pub commodity: Arc<Commodity>,
    pub quantity: BigRational,
    pub lot: Option<Lot>,
    pub targets: Option<Vec<Arc<Commodity>>>,
}

impl Posting {
    pub fn new(
        credit: Arc<Account>,
        debit: Arc<Account>,
        commodity: Arc<Commodity>,
        quantity: BigRational,
    ) -> Posting {
        Posting {
            credit,
            debit,
            commodity,
            quantity,
            lot: None,
            targets: None,
        }
    }
}

impl Display for Posting {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {} {}",
            self.credit,
            self.debit,
            format_quantity(&self.quantity),
            self.commodity
        )
    }
}

/// Spreads the income and expenses of a transaction over a period
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Accrual {
    pub interval: Interval,
    pub period: Period,
    pub account: Arc<Account>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transaction {
    pub source: Source,
    pub date: NaiveDate,
    pub description: String,
    pub tags: Vec<String>,
    pub postings: Vec<Posting>,
    pub accrual: Option<Accrual>,
    /// `None` without a `@performance` annotation, `Some(vec![])` for `@performance()`
    pub targets: Option<Vec<Arc<Commodity>>>,
}

impl Transaction {
    /// Orders transactions by date, then by where they were declared
    pub fn compare(&self, other: &Transaction) -> Ordering {
        self.date
            .cmp(&other.date)
            .then_with(|| self.source.path.cmp(&other.source.path))
            .then_with(|| self.source.start.cmp(&other.source.start))
    }

    /// Expands the accrual annotation, if any, into plain transactions
    ///
    /// Bookings from or to an income or expense account are moved to the accrual
    /// account on the transaction date; the income or expense side is then booked
    /// from the accrual account in equal parts at the end of every partition period
    /// of the accrual. Other bookings are left on the transaction date.
    pub fn expand_accrual(&self) -> Vec<Transaction> {
        let accrual = match &self.accrual {
            None => return vec![self.clone()],
            Some(accrual) => accrual,
        };
        let dates = Partition::new(accrual.period, accrual.interval, 0).end_dates();
        let mut head = Transaction {
            postings: Vec::new(),
            accrual: None,
            ..self.clone()
        };
        if dates.is_empty() {
            head.postings = self.postings.clone();
            return vec![head];
        }
        let n = dates.len();
        let mut parts: Vec<Vec<Posting>> = vec![Vec::new(); n];
        for posting in self.postings.iter() {
            let account = &accrual.account;
            let (booked, credit, debit) = if posting.credit.is_ie() {
                let booked = Posting {
                    credit: account.clone(),
                    ..posting.clone()
                };
                (booked, posting.credit.clone(), account.clone())
            } else if posting.debit.is_ie() {
                let booked = Posting {
                    debit: account.clone(),
                    ..posting.clone()
                };
                (booked, account.clone(), posting.debit.clone())
            } else {
                head.postings.push(posting.clone());
                continue;
            };
            head.postings.push(booked);
            for (i, quantity) in split(&posting.quantity, n).into_iter().enumerate() {
                parts[i].push(Posting::new(
                    credit.clone(),
                    debit.clone(),
                    posting.commodity.clone(),
                    quantity,
                ));
            }
        }
        let mut result = vec![head];
        for (i, (date, postings)) in dates.into_iter().zip(parts).enumerate() {
            if postings.is_empty() {
                continue;
            }
            result.push(Transaction {
                source: self.source.clone(),
                date,
                description: format!("{} (accrual {}/{})", self.description, i + 1, n),
                tags: self.tags.clone(),
                postings,
                accrual: None,
                targets: self.targets.clone(),
            });
        }
        result
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Include {
    pub source: Source,
    pub path: PathBuf,
}

/// A parsed and resolved journal directive
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Directive {
    Open(Open),
    Close(Close),
    Price(Price),
    Assertion(Assertion),
    Transaction(Transaction),
    Include(Include),
}

impl Directive {
    /// The date the directive applies to; includes have none
    pub fn date(&self) -> Option<NaiveDate> {
        match self {
            Directive::Open(d) => Some(d.date),
            Directive::Close(d) => Some(d.date),
            Directive::Price(d) => Some(d.date),
            Directive::Assertion(d) => Some(d.date),
            Directive::Transaction(d) => Some(d.date),
            Directive::Include(_) => None,
        }
    }

    pub fn source(&self) -> &Source {
        match self {
            Directive::Open(d) => &d.source,
            Directive::Close(d) => &d.source,
            Directive::Price(d) => &d.source,
            Directive::Assertion(d) => &d.source,
            Directive::Transaction(d) => &d.source,
            Directive::Include(d) => &d.source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::quantity::parse_decimal;
    use crate::models::Registry;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn accruals_spread_income_and_expenses() {
        let registry = Registry::new();
        let chf = registry.commodity("CHF");
        let cash = registry.account("Assets:Cash").unwrap();
        let rent = registry.account("Expenses:Rent").unwrap();
        let payable = registry.account("Liabilities:Accrued").unwrap();
        let savings = registry.account("Assets:Savings").unwrap();
        let transaction = Transaction {
            source: Source::default(),
            date: date("2022-01-01"),
            description: "rent".to_string(),
            tags: vec![],
            postings: vec![
                Posting::new(
                    cash.clone(),
                    rent.clone(),
                    chf.clone(),
                    parse_decimal("100").unwrap(),
                ),
                Posting::new(
                    cash.clone(),
                    savings.clone(),
                    chf.clone(),
                    parse_decimal("7").unwrap(),
                ),
            ],
            accrual: Some(Accrual {
                interval: Interval::Monthly,
                period: Period::new(date("2022-01-01"), date("2022-03-31")),
                account: payable.clone(),
            }),
            targets: None,
        };
        let expanded = transaction.expand_accrual();
        assert_eq!(expanded.len(), 4);
        assert_eq!(expanded[0].date, date("2022-01-01"));
        assert_eq!(expanded[0].postings[0].debit, payable);
        assert_eq!(expanded[0].postings[1].debit, savings);
        assert!(expanded[0].accrual.is_none());
        let dates: Vec<NaiveDate> = expanded[1..].iter().map(|t| t.date).collect();
        assert_eq!(
            dates,
            vec![date("2022-01-31"), date("2022-02-28"), date("2022-03-31")]
        );
        assert_eq!(expanded[1].description, "rent (accrual 1/3)");
        assert_eq!(expanded[1].postings[0].credit, payable);
        assert_eq!(expanded[1].postings[0].debit, rent);
        assert_eq!(
            expanded[1].postings[0].quantity,
            parse_decimal("33.34").unwrap()
        );
        assert_eq!(
            expanded[3].postings[0].quantity,
            parse_decimal("33.33").unwrap()
        );
    }

    #[test]
    fn transactions_without_accrual_are_kept() {
        let transaction = Transaction {
            source: Source::default(),
            date: date("2022-01-01"),
            description: "nothing".to_string(),
            tags: vec![],
            postings: vec![],
            accrual: None,
            targets: Some(vec![]),
        };
        assert_eq!(transaction.expand_accrual(), vec![transaction]);
    }
}
