use std::collections::HashSet;
use std::sync::Arc;

use super::{Emit, Processor};
use crate::error::LedgerError;
use crate::models::quantity::approx_eq;
use crate::models::{Account, Amounts, Day, Position};
use crate::Error;

/// Carries the running balances from day to day and enforces the bookkeeping rules
///
/// Within a day, opens come first, then transactions, then assertions, then
/// closes. Every day leaves with a snapshot of the balances at its end, and with
/// their value when the day has conversion factors.
#[derive(Debug, Default)]
pub struct Balancer {
    open: HashSet<Arc<Account>>,
    amounts: Amounts<Position>,
}

impl Balancer {
    pub fn new() -> Balancer {
        Balancer::default()
    }

    fn open(&mut self, day: &Day) -> Result<(), LedgerError> {
        for open in day.opens.iter() {
            if !self.open.insert(open.account.clone()) {
                return Err(LedgerError::AccountAlreadyOpen {
                    date: day.date,
                    account: open.account.clone(),
                });
            }
        }
        Ok(())
    }

    fn book(&mut self, day: &Day) -> Result<(), LedgerError> {
        for transaction in day.transactions.iter() {
            for posting in transaction.postings.iter() {
                for account in [&posting.credit, &posting.debit] {
                    if !self.open.contains(account) {
                        return Err(LedgerError::PostingToUnopenedOrClosedAccount {
                            date: day.date,
                            account: account.clone(),
                        });
                    }
                }
                let credit = Position::new(posting.credit.clone(), posting.commodity.clone());
                let debit = Position::new(posting.debit.clone(), posting.commodity.clone());
                self.amounts.add(credit, &-&posting.quantity);
                self.amounts.add(debit, &posting.quantity);
            }
        }
        Ok(())
    }

    fn check(&self, day: &Day) -> Result<(), LedgerError> {
        for assertion in day.assertions.iter() {
            if !self.open.contains(&assertion.account) {
                return Err(LedgerError::AssertionOnUnopenedAccount {
                    date: day.date,
                    account: assertion.account.clone(),
                });
            }
            let position = Position::new(assertion.account.clone(), assertion.commodity.clone());
            let actual = self.amounts.amount(&position);
            if !approx_eq(&actual, &assertion.amount) {
                return Err(LedgerError::AssertionFailed {
                    date: day.date,
                    account: assertion.account.clone(),
                    commodity: assertion.commodity.clone(),
                    expected: assertion.amount.clone(),
                    actual,
                });
            }
        }
        Ok(())
    }

    fn close(&mut self, day: &Day) -> Result<(), LedgerError> {
        for close in day.closes.iter() {
            if !self.open.contains(&close.account) {
                return Err(LedgerError::CloseOfUnopenedAccount {
                    date: day.date,
                    account: close.account.clone(),
                });
            }
            if let Some((position, amount)) = self
                .amounts
                .iter()
                .find(|(position, _)| position.account == close.account)
            {
                return Err(LedgerError::CloseWithNonZeroBalance {
                    date: day.date,
                    account: close.account.clone(),
                    commodity: position.commodity.clone(),
                    amount: amount.clone(),
                });
            }
            self.open.remove(&close.account);
        }
        Ok(())
    }
}

impl Processor for Balancer {
    type Input = Day;
    type Output = Day;

    fn name(&self) -> &'static str {
        "balance"
    }

    fn process(&mut self, mut day: Day, emit: &mut Emit<Day>) -> Result<(), Error> {
        self.open(&day)?;
        self.book(&day)?;
        self.check(&day)?;
        self.close(&day)?;
        let amounts = Arc::new(self.amounts.clone());
        day.value = day
            .normalized
            .as_ref()
            .map(|normalized| Arc::new(normalized.valuate(&amounts)));
        day.amounts = Some(amounts);
        emit(day)
    }
}
