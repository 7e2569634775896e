use chrono::NaiveDate;
use indoc::indoc;
use num::rational::BigRational;

use tally::commands::balance;
use tally::config::Config;
use tally::models::{Interval, Partition, Period};
use tally::report::{Node, Report};

mod common;
use common::{config, date, init_tracing, q, single};

const GIFTS: &str = indoc! {r#"
    2021-01-01 open Assets:Cash
    2021-01-01 open Equity:Opening

    2021-01-01 "Opening"
    Equity:Opening Assets:Cash 100 CHF

    2022-01-01 "Gift"
    Equity:Opening Assets:Cash 150 CHF

    2022-01-04 "Gift"
    Equity:Opening Assets:Cash 50 CHF
"#};

fn amounts_of(report: &Report, account: &str) -> Vec<(Option<NaiveDate>, BigRational)> {
    fn find<'a>(node: &'a Node, account: &str) -> Option<&'a Node> {
        if node.account().map(|a| a.to_string()).as_deref() == Some(account) {
            return Some(node);
        }
        node.children().into_iter().find_map(|c| find(c, account))
    }
    let node = find(report.al(), account)
        .or_else(|| find(report.eie(), account))
        .unwrap();
    let mut amounts: Vec<_> = node
        .amounts()
        .iter()
        .map(|(key, amount)| (key.date, amount.clone()))
        .collect();
    amounts.sort();
    amounts
}

fn last_five_months() -> Config {
    Config {
        interval: Interval::Monthly,
        to: Some(date("2022-01-10")),
        last: 5,
        ..config()
    }
}

#[test]
fn quiet_periods_carry_the_last_balance() {
    init_tracing();
    let report = balance::execute(&last_five_months(), &single(GIFTS)).unwrap();
    assert_eq!(
        amounts_of(&report, "Assets:Cash"),
        vec![
            (Some(date("2021-09-30")), q("100")),
            (Some(date("2021-10-31")), q("100")),
            (Some(date("2021-11-30")), q("100")),
            (Some(date("2021-12-31")), q("100")),
            (Some(date("2022-01-31")), q("300")),
        ]
    );
}

#[test]
fn diffs_only_show_changes() {
    let config = Config {
        diff: true,
        ..last_five_months()
    };
    let report = balance::execute(&config, &single(GIFTS)).unwrap();
    assert_eq!(
        amounts_of(&report, "Assets:Cash"),
        vec![(Some(date("2022-01-31")), q("200"))]
    );
}

#[test]
fn closing_moves_earlier_income_to_retained_earnings() {
    let text = indoc! {r#"
        2022-01-01 open Assets:Cash
        2022-01-01 open Income:Salary

        2022-01-25 "Salary"
        Income:Salary Assets:Cash 1000 CHF

        2022-02-25 "Salary"
        Income:Salary Assets:Cash 1000 CHF
    "#};
    let config = Config {
        interval: Interval::Monthly,
        to: Some(date("2022-02-28")),
        close: true,
        ..config()
    };
    let report = balance::execute(&config, &single(text)).unwrap();
    assert_eq!(
        amounts_of(&report, "Income:Salary"),
        vec![
            (Some(date("2022-01-31")), q("-1000")),
            (Some(date("2022-02-28")), q("-1000")),
        ]
    );
    assert_eq!(
        amounts_of(&report, "Equity:RetainedEarnings"),
        vec![(Some(date("2022-02-28")), q("-1000"))]
    );
    assert_eq!(
        amounts_of(&report, "Assets:Cash"),
        vec![
            (Some(date("2022-01-31")), q("1000")),
            (Some(date("2022-02-28")), q("2000")),
        ]
    );
}

#[test]
fn partitions_cover_their_span() {
    let span = Period::new(date("2020-02-12"), date("2022-11-03"));
    for interval in [
        Interval::Daily,
        Interval::Weekly,
        Interval::Monthly,
        Interval::Quarterly,
        Interval::Yearly,
    ] {
        let partition = Partition::new(span, interval, 0);
        let periods = partition.periods();
        assert_eq!(periods.first().map(|p| p.start), Some(span.start));
        assert_eq!(periods.last().map(|p| p.end), Some(span.end));
        for pair in periods.windows(2) {
            assert_eq!(pair[0].end.succ_opt(), Some(pair[1].start));
        }
        let mut day = span.start;
        while day <= span.end {
            let end = partition.align(day).unwrap();
            assert!(periods.iter().any(|p| p.end == end && p.contains(day)));
            day = day.succ_opt().unwrap();
        }
        assert_eq!(partition.align(span.end.succ_opt().unwrap()), None);
    }
}
