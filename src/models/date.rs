//! Intervals, periods and partitions of the calendar
use chrono::{Datelike, Duration, Months, NaiveDate};
use std::fmt;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

use crate::ModelError;

/// The step size of a partition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Interval {
    Once,
    Daily,
    Weekly,
    Monthly,
    Quarterly,
    Yearly,
}

impl Default for Interval {
    fn default() -> Self {
        Interval::Once
    }
}

impl FromStr for Interval {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "once" => Ok(Interval::Once),
            "daily" => Ok(Interval::Daily),
            "weekly" => Ok(Interval::Weekly),
            "monthly" => Ok(Interval::Monthly),
            "quarterly" => Ok(Interval::Quarterly),
            "yearly" => Ok(Interval::Yearly),
            _ => Err(ModelError::InvalidInterval(s.to_string())),
        }
    }
}

impl Display for Interval {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let name = match self {
            Interval::Once => "once",
            Interval::Daily => "daily",
            Interval::Weekly => "weekly",
            Interval::Monthly => "monthly",
            Interval::Quarterly => "quarterly",
            Interval::Yearly => "yearly",
        };
        write!(f, "{}", name)
    }
}

impl Interval {
    /// The first date of the interval containing `date`
    ///
    /// Weeks start on Monday.
    pub fn start_of(&self, date: NaiveDate) -> NaiveDate {
        match self {
            Interval::Once | Interval::Daily => date,
            Interval::Weekly => {
                date - Duration::days(date.weekday().num_days_from_monday() as i64)
            }
            Interval::Monthly => date.with_day(1).unwrap_or(date),
            Interval::Quarterly => {
                NaiveDate::from_ymd_opt(date.year(), (date.month() - 1) / 3 * 3 + 1, 1)
                    .unwrap_or(date)
            }
            Interval::Yearly => NaiveDate::from_ymd_opt(date.year(), 1, 1).unwrap_or(date),
        }
    }

    /// The last date of the interval containing `date`
    pub fn end_of(&self, date: NaiveDate) -> NaiveDate {
        let after = |months: u32| {
            self.start_of(date)
                .checked_add_months(Months::new(months))
                .and_then(|d| d.pred_opt())
                .unwrap_or(date)
        };
        match self {
            Interval::Once | Interval::Daily => date,
            Interval::Weekly => {
                date + Duration::days(6 - date.weekday().num_days_from_monday() as i64)
            }
            Interval::Monthly => after(1),
            Interval::Quarterly => after(3),
            Interval::Yearly => NaiveDate::from_ymd_opt(date.year(), 12, 31).unwrap_or(date),
        }
    }
}

/// A closed range of dates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Period {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl Period {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Period {
        Period { start, end }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    pub fn is_empty(&self) -> bool {
        self.start > self.end
    }
}

impl Display for Period {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.start, self.end)
    }
}

/// A contiguous decomposition of a period into interval-sized periods
///
/// The first element of `periods` is the zero-width "before" period standing for
/// everything that happened before the partition starts; the others are sorted by
/// their end date and leave no gaps.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Partition {
    span: Period,
    interval: Interval,
    periods: Vec<Period>,
}

impl Partition {
    /// Partitions `span` by walking backward from its end, keeping only the `last`
    /// periods when `last > 0`.
    pub fn new(span: Period, interval: Interval, last: usize) -> Partition {
        let mut periods = Vec::new();
        if !span.is_empty() {
            if interval == Interval::Once {
                periods.push(span);
            } else {
                let mut end = span.end;
                loop {
                    let start = interval.start_of(end).max(span.start);
                    periods.push(Period::new(start, end));
                    if last > 0 && periods.len() >= last {
                        break;
                    }
                    match start.pred_opt() {
                        Some(previous) if previous >= span.start => end = previous,
                        _ => break,
                    }
                }
            }
        }
        let first = periods.last().map(|p| p.start).unwrap_or(span.start);
        let before = first.pred_opt().unwrap_or(first);
        periods.push(Period::new(before, before));
        periods.reverse();
        Partition {
            span,
            interval,
            periods,
        }
    }

    pub fn span(&self) -> Period {
        self.span
    }

    pub fn interval(&self) -> Interval {
        self.interval
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.span.contains(date)
    }

    /// The periods, without the leading "before" period
    pub fn periods(&self) -> &[Period] {
        &self.periods[1..]
    }

    /// The leading zero-width period
    pub fn before(&self) -> Period {
        self.periods[0]
    }

    pub fn size(&self) -> usize {
        self.periods.len() - 1
    }

    pub fn end_dates(&self) -> Vec<NaiveDate> {
        self.periods().iter().map(|p| p.end).collect()
    }

    /// Maps `date` to the end date of the first period ending on or after it
    ///
    /// Dates before the partition map to the "before" period; dates after its last
    /// period have no bucket.
    pub fn align(&self, date: NaiveDate) -> Option<NaiveDate> {
        let index = self.periods.partition_point(|p| p.end < date);
        self.periods.get(index).map(|p| p.end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn start_and_end_of() {
        let d = date("2022-05-18");
        assert_eq!(Interval::Weekly.start_of(d), date("2022-05-16"));
        assert_eq!(Interval::Weekly.end_of(d), date("2022-05-22"));
        assert_eq!(Interval::Monthly.start_of(d), date("2022-05-01"));
        assert_eq!(Interval::Monthly.end_of(d), date("2022-05-31"));
        assert_eq!(Interval::Quarterly.start_of(d), date("2022-04-01"));
        assert_eq!(Interval::Quarterly.end_of(d), date("2022-06-30"));
        assert_eq!(Interval::Yearly.start_of(d), date("2022-01-01"));
        assert_eq!(Interval::Yearly.end_of(d), date("2022-12-31"));
        assert_eq!(Interval::Monthly.end_of(date("2024-02-10")), date("2024-02-29"));
        assert_eq!(Interval::Daily.end_of(d), d);
    }

    #[test]
    fn parse_interval() {
        assert_eq!("quarterly".parse::<Interval>(), Ok(Interval::Quarterly));
        assert!("fortnightly".parse::<Interval>().is_err());
        assert_eq!(Interval::Weekly.to_string(), "weekly");
    }

    #[test]
    fn monthly_partition() {
        let partition = Partition::new(
            Period::new(date("2022-01-15"), date("2022-03-31")),
            Interval::Monthly,
            0,
        );
        assert_eq!(
            partition.periods(),
            &[
                Period::new(date("2022-01-15"), date("2022-01-31")),
                Period::new(date("2022-02-01"), date("2022-02-28")),
                Period::new(date("2022-03-01"), date("2022-03-31")),
            ]
        );
        assert_eq!(partition.before().end, date("2022-01-14"));
        assert_eq!(partition.align(date("2021-12-01")), Some(date("2022-01-14")));
        assert_eq!(partition.align(date("2022-02-10")), Some(date("2022-02-28")));
        assert_eq!(partition.align(date("2022-04-01")), None);
    }

    #[test]
    fn last_keeps_the_latest_periods() {
        let partition = Partition::new(
            Period::new(date("2021-01-01"), date("2022-01-31")),
            Interval::Monthly,
            5,
        );
        assert_eq!(
            partition.end_dates(),
            vec![
                date("2021-09-30"),
                date("2021-10-31"),
                date("2021-11-30"),
                date("2021-12-31"),
                date("2022-01-31"),
            ]
        );
        assert_eq!(partition.before().end, date("2021-08-31"));
        assert_eq!(partition.size(), 5);
    }

    #[test]
    fn once_is_a_single_period() {
        let span = Period::new(date("2022-01-01"), date("2022-12-31"));
        let partition = Partition::new(span, Interval::Once, 0);
        assert_eq!(partition.periods(), &[span]);
    }

    #[test]
    fn empty_span_has_no_periods() {
        let span = Period::new(date("2022-02-01"), date("2022-01-01"));
        let partition = Partition::new(span, Interval::Daily, 0);
        assert_eq!(partition.size(), 0);
        assert_eq!(partition.align(date("2022-01-15")), None);
    }

    #[test]
    fn partitions_cover_the_span() {
        let spans = [
            Period::new(date("2020-02-29"), date("2021-03-01")),
            Period::new(date("2021-12-31"), date("2022-01-01")),
            Period::new(date("2022-03-15"), date("2022-03-15")),
        ];
        let intervals = [
            Interval::Daily,
            Interval::Weekly,
            Interval::Monthly,
            Interval::Quarterly,
            Interval::Yearly,
        ];
        for span in spans.iter() {
            for interval in intervals.iter() {
                let partition = Partition::new(*span, *interval, 0);
                let periods = partition.periods();
                assert_eq!(periods[0].start, span.start);
                assert_eq!(periods[periods.len() - 1].end, span.end);
                for pair in periods.windows(2) {
                    assert_eq!(pair[0].end.succ_opt(), Some(pair[1].start));
                }
                let mut d = span.start;
                while d <= span.end {
                    let end = partition.align(d).unwrap();
                    let period = periods.iter().find(|p| p.end == end).unwrap();
                    assert!(period.contains(d), "{} not in {} ({})", d, period, interval);
                    d = d.succ_opt().unwrap();
                }
            }
        }
    }
}
