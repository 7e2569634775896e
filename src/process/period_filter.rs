use chrono::NaiveDate;
use std::mem;
use std::sync::Arc;

use super::{Emit, Processor};
use crate::models::{Amounts, Day, Interval, NormalizedPrices, Partition, Period, Position};
use crate::Error;

/// The balances at the end of some day
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    pub amounts: Arc<Amounts<Position>>,
    pub value: Option<Arc<Amounts<Position>>>,
    pub normalized: Option<Arc<NormalizedPrices>>,
}

impl Snapshot {
    pub fn of(day: &Day) -> Snapshot {
        Snapshot {
            amounts: day.amounts.clone().unwrap_or_default(),
            value: day.value.clone(),
            normalized: day.normalized.clone(),
        }
    }
}

/// The days of one period, with the balances at its end and at the end of the
/// period before
#[derive(Debug, Clone)]
pub struct PeriodAggregate {
    pub period: Period,
    pub days: Vec<Day>,
    pub end: Snapshot,
    pub prev: Snapshot,
}

/// Groups days into the periods of a partition
///
/// The partition is built when the first day with a transaction arrives: it
/// starts no earlier than that day and ends with the period containing `to`
/// (today if unset). Every period is emitted, including periods without any
/// day, which carry the balances forward.
#[derive(Debug)]
pub struct PeriodFilter {
    from: Option<NaiveDate>,
    to: Option<NaiveDate>,
    interval: Interval,
    last: usize,

    partition: Option<Partition>,
    current: usize,
    days: Vec<Day>,
    latest: Snapshot,
    previous: Snapshot,
}

impl PeriodFilter {
    pub fn new(
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
        interval: Interval,
        last: usize,
    ) -> PeriodFilter {
        PeriodFilter {
            from,
            to,
            interval,
            last,
            partition: None,
            current: 0,
            days: Vec::new(),
            latest: Snapshot::default(),
            previous: Snapshot::default(),
        }
    }

    /// The partition, once the first transaction has been seen
    pub fn partition(&self) -> Option<&Partition> {
        self.partition.as_ref()
    }

    fn init(&mut self, first: NaiveDate) {
        let start = self.from.map_or(first, |from| from.max(first));
        let to = self.to.unwrap_or_else(|| chrono::Local::now().date_naive());
        let span = Period::new(start, self.interval.end_of(to));
        let partition = Partition::new(span, self.interval, self.last);
        tracing::debug!(
            "partitioned {} into {} {} periods",
            span,
            partition.size(),
            self.interval
        );
        self.partition = Some(partition);
    }

    fn period(&self, index: usize) -> Option<Period> {
        self.partition
            .as_ref()
            .and_then(|p| p.periods().get(index).copied())
    }

    fn emit_current(&mut self, emit: &mut Emit<PeriodAggregate>) -> Result<(), Error> {
        let Some(period) = self.period(self.current) else {
            return Ok(());
        };
        let aggregate = PeriodAggregate {
            period,
            days: mem::take(&mut self.days),
            end: self.latest.clone(),
            prev: mem::replace(&mut self.previous, self.latest.clone()),
        };
        self.current += 1;
        emit(aggregate)
    }
}

impl Processor for PeriodFilter {
    type Input = Day;
    type Output = PeriodAggregate;

    fn name(&self) -> &'static str {
        "periods"
    }

    fn process(&mut self, day: Day, emit: &mut Emit<PeriodAggregate>) -> Result<(), Error> {
        if self.partition.is_none() {
            if day.transactions.is_empty() {
                return Ok(());
            }
            self.init(day.date);
        }
        while let Some(period) = self.period(self.current) {
            if period.end >= day.date {
                break;
            }
            self.emit_current(emit)?;
        }
        match self.period(self.current) {
            Some(period) if period.contains(day.date) => {
                self.latest = Snapshot::of(&day);
                self.days.push(day);
            }
            Some(_) => {
                self.latest = Snapshot::of(&day);
                self.previous = self.latest.clone();
            }
            None => (),
        }
        Ok(())
    }

    fn finish(&mut self, emit: &mut Emit<PeriodAggregate>) -> Result<(), Error> {
        while self.period(self.current).is_some() {
            self.emit_current(emit)?;
        }
        Ok(())
    }
}
