use chrono::NaiveDate;
use std::collections::HashMap;
use std::sync::Arc;

use super::date::Period;
use super::{Amounts, Assertion, Close, Directive, NormalizedPrices, Open, Position, Price, Transaction};

/// Everything that happens on one date
///
/// The directive lists are filled by the [`Journal`]; the derived state is filled
/// in by the processing stages, each stage seeing the day after the previous one
/// is done with it.
#[derive(Debug, Clone)]
pub struct Day {
    pub date: NaiveDate,
    pub opens: Vec<Open>,
    pub closes: Vec<Close>,
    pub prices: Vec<Price>,
    pub assertions: Vec<Assertion>,
    pub transactions: Vec<Transaction>,

    /// Conversion factors into the valuation commodity, valid on this date
    pub normalized: Option<Arc<NormalizedPrices>>,
    /// Running balances at the end of the date
    pub amounts: Option<Arc<Amounts<Position>>>,
    /// `amounts` in the valuation commodity
    pub value: Option<Arc<Amounts<Position>>>,
}

impl Day {
    pub fn new(date: NaiveDate) -> Day {
        Day {
            date,
            opens: Vec::new(),
            closes: Vec::new(),
            prices: Vec::new(),
            assertions: Vec::new(),
            transactions: Vec::new(),
            normalized: None,
            amounts: None,
            value: None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.opens.is_empty()
            && self.closes.is_empty()
            && self.prices.is_empty()
            && self.assertions.is_empty()
            && self.transactions.is_empty()
    }
}

/// Directives grouped by date
#[derive(Debug, Clone, Default)]
pub struct Journal {
    days: HashMap<NaiveDate, Day>,
}

impl Journal {
    pub fn new() -> Journal {
        Journal::default()
    }

    /// The day for `date`, created on first use
    pub fn day(&mut self, date: NaiveDate) -> &mut Day {
        self.days.entry(date).or_insert_with(|| Day::new(date))
    }

    /// Adds a directive to the day of its date
    ///
    /// Transactions with an accrual are expanded first, so their parts land on the
    /// days they are booked on. Includes carry no date and are ignored.
    pub fn insert(&mut self, directive: Directive) {
        match directive {
            Directive::Open(open) => self.day(open.date).opens.push(open),
            Directive::Close(close) => self.day(close.date).closes.push(close),
            Directive::Price(price) => self.day(price.date).prices.push(price),
            Directive::Assertion(assertion) => {
                self.day(assertion.date).assertions.push(assertion)
            }
            Directive::Transaction(transaction) => {
                if transaction.accrual.is_some() {
                    for t in transaction.expand_accrual() {
                        self.day(t.date).transactions.push(t);
                    }
                } else {
                    self.day(transaction.date).transactions.push(transaction);
                }
            }
            Directive::Include(_) => (),
        }
    }

    /// The first and last date with any directive
    pub fn period(&self) -> Option<Period> {
        let start = self.days.keys().min()?;
        let end = self.days.keys().max()?;
        Some(Period::new(*start, *end))
    }

    pub fn len(&self) -> usize {
        self.days.len()
    }

    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }

    /// All days in ascending order, with transactions in declaration order
    pub fn sorted_days(self) -> Vec<Day> {
        let mut days: Vec<Day> = self.days.into_values().collect();
        days.sort_by_key(|d| d.date);
        for day in days.iter_mut() {
            day.transactions.sort_by(|a, b| a.compare(b));
        }
        days
    }
}

impl Extend<Directive> for Journal {
    fn extend<I: IntoIterator<Item = Directive>>(&mut self, iter: I) {
        for directive in iter {
            self.insert(directive);
        }
    }
}
