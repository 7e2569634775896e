use num::rational::BigRational;
use std::sync::Arc;

use super::{Emit, PeriodAggregate, Processor, Snapshot};
use crate::models::{Account, Amounts, Position};
use crate::Error;

/// Closes income and expenses of earlier periods into retained earnings
///
/// Whatever income and expense balances exist at the end of the previous period
/// are moved to the retained earnings account, in both snapshots. The end
/// snapshot then only shows the income and expenses of the period itself, and the
/// balance sheet still balances. Closing an already closed aggregate changes
/// nothing.
#[derive(Debug)]
pub struct Closer {
    retained: Arc<Account>,
}

impl Closer {
    pub fn new(retained: Arc<Account>) -> Closer {
        Closer { retained }
    }

    /// The closing entries for `snapshot`
    fn closing(&self, snapshot: &Snapshot) -> Vec<(Position, BigRational)> {
        snapshot
            .amounts
            .iter()
            .filter(|(position, _)| position.account.is_ie())
            .map(|(position, quantity)| (position.clone(), quantity.clone()))
            .collect()
    }

    fn apply(&self, snapshot: &Snapshot, closing: &[(Position, BigRational)]) -> Snapshot {
        let mut amounts: Amounts<Position> = (*snapshot.amounts).clone();
        for (position, quantity) in closing {
            amounts.add(position.clone(), &-quantity);
            let retained = Position::new(self.retained.clone(), position.commodity.clone());
            amounts.add(retained, quantity);
        }
        let value = snapshot
            .normalized
            .as_ref()
            .map(|normalized| Arc::new(normalized.valuate(&amounts)));
        Snapshot {
            amounts: Arc::new(amounts),
            value,
            normalized: snapshot.normalized.clone(),
        }
    }
}

impl Processor for Closer {
    type Input = PeriodAggregate;
    type Output = PeriodAggregate;

    fn name(&self) -> &'static str {
        "close"
    }

    fn process(
        &mut self,
        mut aggregate: PeriodAggregate,
        emit: &mut Emit<PeriodAggregate>,
    ) -> Result<(), Error> {
        let closing = self.closing(&aggregate.prev);
        if !closing.is_empty() {
            tracing::trace!(
                "closing {} positions at {}",
                closing.len(),
                aggregate.period.start
            );
            aggregate.end = self.apply(&aggregate.end, &closing);
            aggregate.prev = self.apply(&aggregate.prev, &closing);
        }
        emit(aggregate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::quantity::parse_decimal;
    use crate::models::{Period, Registry};
    use chrono::NaiveDate;
    use num::Zero;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn snapshot(registry: &Registry, entries: &[(&str, &str)]) -> Snapshot {
        let mut amounts = Amounts::new();
        for (account, quantity) in entries {
            let position = Position::new(
                registry.account(account).unwrap(),
                registry.commodity("CHF"),
            );
            amounts.add(position, &parse_decimal(quantity).unwrap());
        }
        Snapshot {
            amounts: Arc::new(amounts),
            ..Snapshot::default()
        }
    }

    #[test]
    fn earlier_income_moves_to_retained_earnings() {
        let registry = Registry::new();
        let aggregate = PeriodAggregate {
            period: Period::new(date("2022-02-01"), date("2022-02-28")),
            days: vec![],
            prev: snapshot(&registry, &[("Assets:Cash", "100"), ("Income:Salary", "-100")]),
            end: snapshot(
                &registry,
                &[
                    ("Assets:Cash", "130"),
                    ("Income:Salary", "-150"),
                    ("Expenses:Food", "20"),
                ],
            ),
        };
        let mut closer = Closer::new(registry.retained_earnings());
        let closed = closer.run_all(vec![aggregate]).unwrap();
        let closed = &closed[0];

        let chf = registry.commodity("CHF");
        let at = |snapshot: &Snapshot, account: &str| {
            snapshot
                .amounts
                .amount(&Position::new(registry.account(account).unwrap(), chf.clone()))
        };
        let q = |s: &str| parse_decimal(s).unwrap();
        assert_eq!(at(&closed.prev, "Income:Salary"), BigRational::zero());
        assert_eq!(at(&closed.prev, "Equity:RetainedEarnings"), q("-100"));
        assert_eq!(at(&closed.end, "Income:Salary"), q("-50"));
        assert_eq!(at(&closed.end, "Expenses:Food"), q("20"));
        assert_eq!(at(&closed.end, "Equity:RetainedEarnings"), q("-100"));
        assert!(closed.end.amounts.sum().is_zero());

        let again = closer.run_all(vec![closed.clone()]).unwrap();
        assert_eq!(again[0].end.amounts, closed.end.amounts);
        assert_eq!(again[0].prev.amounts, closed.prev.amounts);
    }
}
