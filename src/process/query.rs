use num::rational::BigRational;
use num::Zero;
use std::sync::Arc;

use super::{Emit, PeriodAggregate, Processor, Snapshot};
use crate::filter::{allow_all, Filter};
use crate::mapper::KeyMapper;
use crate::models::{Account, Amounts, Commodity, Key, Position};
use crate::Error;

/// What a query reports for every period
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum QueryMode {
    /// Balances at the end of the period
    #[default]
    Balance,
    /// Change of the balances over the period
    Diff,
    /// One entry per booking side
    Register,
}

/// Turns period aggregates into report entries
///
/// Keys are filtered as they come out of the journal, then mapped. Entries are
/// dated with the end of their period. With a valuation commodity, the entries
/// hold values instead of quantities.
pub struct Query {
    pub mode: QueryMode,
    pub valuation: Option<Arc<Commodity>>,
    pub filter: Filter<Key>,
    pub mapper: KeyMapper,
}

impl Default for Query {
    fn default() -> Self {
        Query {
            mode: QueryMode::default(),
            valuation: None,
            filter: allow_all(),
            mapper: KeyMapper::default(),
        }
    }
}

impl Query {
    fn push(&self, entries: &mut Vec<(Key, BigRational)>, key: Key, amount: BigRational) {
        if amount.is_zero() || !(self.filter)(&key) {
            return;
        }
        entries.push((self.mapper.map(key), amount));
    }

    fn balances(&self, aggregate: &PeriodAggregate) -> Vec<(Key, BigRational)> {
        let pick = |snapshot: &Snapshot| -> Arc<Amounts<Position>> {
            match &self.valuation {
                Some(_) => snapshot.value.clone().unwrap_or_default(),
                None => snapshot.amounts.clone(),
            }
        };
        let mut amounts = (*pick(&aggregate.end)).clone();
        if self.mode == QueryMode::Diff {
            amounts.subtract(&pick(&aggregate.prev));
        }
        let mut entries = Vec::new();
        for (position, amount) in amounts {
            let key = Key::position(aggregate.period.end, &position, self.valuation.as_ref());
            self.push(&mut entries, key, amount);
        }
        entries
    }

    fn register(&self, aggregate: &PeriodAggregate) -> Vec<(Key, BigRational)> {
        let mut entries = Vec::new();
        for day in aggregate.days.iter() {
            for transaction in day.transactions.iter() {
                for posting in transaction.postings.iter() {
                    let amount = match (&self.valuation, &day.normalized) {
                        (None, _) => Some(posting.quantity.clone()),
                        (Some(_), Some(normalized)) => {
                            normalized.value(&posting.commodity, &posting.quantity)
                        }
                        (Some(_), None) => None,
                    };
                    let Some(amount) = amount else {
                        tracing::trace!("no value for {} on {}", posting, day.date);
                        continue;
                    };
                    let key = |account: &Arc<Account>, other: &Arc<Account>| Key {
                        date: Some(aggregate.period.end),
                        account: Some(account.clone()),
                        other: Some(other.clone()),
                        commodity: Some(posting.commodity.clone()),
                        valuation: self.valuation.clone(),
                        description: Some(transaction.description.clone()),
                    };
                    self.push(
                        &mut entries,
                        key(&posting.credit, &posting.debit),
                        -amount.clone(),
                    );
                    self.push(&mut entries, key(&posting.debit, &posting.credit), amount);
                }
            }
        }
        entries
    }
}

impl Processor for Query {
    type Input = PeriodAggregate;
    type Output = Vec<(Key, BigRational)>;

    fn name(&self) -> &'static str {
        "query"
    }

    fn process(
        &mut self,
        aggregate: PeriodAggregate,
        emit: &mut Emit<Vec<(Key, BigRational)>>,
    ) -> Result<(), Error> {
        let entries = match self.mode {
            QueryMode::Balance | QueryMode::Diff => self.balances(&aggregate),
            QueryMode::Register => self.register(&aggregate),
        };
        emit(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::{by_name, filter_account};
    use crate::mapper::remove;
    use crate::models::quantity::parse_decimal;
    use crate::models::{Day, Period, Posting, Registry, Source, Transaction};
    use chrono::NaiveDate;
    use regex::Regex;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn q(s: &str) -> BigRational {
        parse_decimal(s).unwrap()
    }

    fn snapshot(registry: &Registry, entries: &[(&str, &str)]) -> Snapshot {
        let mut amounts = Amounts::new();
        for (account, quantity) in entries {
            let position = Position::new(
                registry.account(account).unwrap(),
                registry.commodity("CHF"),
            );
            amounts.add(position, &q(quantity));
        }
        Snapshot {
            amounts: Arc::new(amounts),
            ..Snapshot::default()
        }
    }

    fn aggregate(registry: &Registry) -> PeriodAggregate {
        let mut day = Day::new(date("2022-01-15"));
        day.transactions.push(Transaction {
            source: Source::default(),
            date: day.date,
            description: "lunch".to_string(),
            tags: vec![],
            postings: vec![Posting::new(
                registry.account("Assets:Cash").unwrap(),
                registry.account("Expenses:Food").unwrap(),
                registry.commodity("CHF"),
                q("20"),
            )],
            accrual: None,
            targets: None,
        });
        PeriodAggregate {
            period: Period::new(date("2022-01-01"), date("2022-01-31")),
            days: vec![day],
            prev: snapshot(registry, &[("Assets:Cash", "100"), ("Equity:Opening", "-100")]),
            end: snapshot(
                registry,
                &[
                    ("Assets:Cash", "80"),
                    ("Equity:Opening", "-100"),
                    ("Expenses:Food", "20"),
                ],
            ),
        }
    }

    fn find(entries: &[(Key, BigRational)], account: &str) -> Option<BigRational> {
        entries
            .iter()
            .find(|(key, _)| key.account.as_ref().map(|a| a.to_string()).as_deref() == Some(account))
            .map(|(_, amount)| amount.clone())
    }

    #[test]
    fn balances_and_diffs() {
        let registry = Registry::new();
        let mut query = Query::default();
        let entries = query.run_all(vec![aggregate(&registry)]).unwrap().remove(0);
        assert_eq!(entries.len(), 3);
        assert_eq!(find(&entries, "Assets:Cash"), Some(q("80")));
        assert!(entries
            .iter()
            .all(|(key, _)| key.date == Some(date("2022-01-31"))));

        let mut query = Query {
            mode: QueryMode::Diff,
            ..Query::default()
        };
        let entries = query.run_all(vec![aggregate(&registry)]).unwrap().remove(0);
        assert_eq!(entries.len(), 2);
        assert_eq!(find(&entries, "Assets:Cash"), Some(q("-20")));
        assert_eq!(find(&entries, "Equity:Opening"), None);
    }

    #[test]
    fn register_emits_both_sides() {
        let registry = Registry::new();
        let mut query = Query {
            mode: QueryMode::Register,
            ..Query::default()
        };
        let entries = query.run_all(vec![aggregate(&registry)]).unwrap().remove(0);
        assert_eq!(entries.len(), 2);
        let (key, amount) = &entries[0];
        assert_eq!(key.account.as_ref().map(|a| a.to_string()), Some("Assets:Cash".into()));
        assert_eq!(key.other.as_ref().map(|a| a.to_string()), Some("Expenses:Food".into()));
        assert_eq!(key.description.as_deref(), Some("lunch"));
        assert_eq!(amount, &q("-20"));
        assert_eq!(find(&entries, "Expenses:Food"), Some(q("20")));
    }

    #[test]
    fn filters_before_mapping() {
        let registry = Registry::new();
        let mut query = Query {
            filter: filter_account(by_name(vec![Regex::new("^Assets").unwrap()])),
            mapper: KeyMapper {
                account: remove(),
                ..KeyMapper::default()
            },
            ..Query::default()
        };
        let entries = query.run_all(vec![aggregate(&registry)]).unwrap().remove(0);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].0.account, None);
        assert_eq!(entries[0].1, q("80"));
    }
}
