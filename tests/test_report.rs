use indoc::indoc;

use tally::commands::{balance, register};
use tally::config::Config;
use tally::models::Interval;

mod common;
use common::{child_names, config, date, q, single};

const JOURNAL: &str = indoc! {r#"
    2021-01-01 open Assets:Cash
    2021-01-01 open Expenses:Rent
    2021-01-01 open Expenses:Food
    2021-01-01 open Expenses:Fun

    2021-01-02 "Snacks"
    Assets:Cash Expenses:Food 50 CHF

    2021-01-03 "Parking"
    Assets:Cash Expenses:Rent 10 CHF

    2021-02-03 "Cinema"
    Assets:Cash Expenses:Fun 20 CHF
"#};

fn valued() -> Config {
    Config {
        valuation: Some("CHF".to_string()),
        to: Some(date("2021-01-31")),
        ..config()
    }
}

#[test]
fn children_are_ordered_by_weight() {
    let report = balance::execute(&valued(), &single(JOURNAL)).unwrap();
    let expenses = report.eie().children()[0];
    assert_eq!(child_names(expenses), vec!["Expenses:Food", "Expenses:Rent"]);
    let weights: Vec<f64> = expenses.children().iter().map(|n| n.weight()).collect();
    assert_eq!(weights, vec![-50.0, -10.0]);
    assert_eq!(expenses.weight(), -60.0);
    assert_eq!(report.al().weight(), -60.0);
}

#[test]
fn unvalued_reports_order_by_name() {
    let config = Config {
        valuation: None,
        ..valued()
    };
    let report = balance::execute(&config, &single(JOURNAL)).unwrap();
    let expenses = report.eie().children()[0];
    assert_eq!(child_names(expenses), vec!["Expenses:Food", "Expenses:Rent"]);
    assert_eq!(expenses.weight(), 0.0);
}

#[test]
fn register_lists_both_sides_per_period() {
    let config = Config {
        interval: Interval::Monthly,
        to: Some(date("2021-02-28")),
        ..config()
    };
    let register = register::execute(&config, &single(JOURNAL)).unwrap();
    assert_eq!(register.len(), 2);

    let january = register.entries(Some(date("2021-01-31")));
    let lines: Vec<String> = january
        .iter()
        .map(|(key, amount)| format!("{} {}", key, amount))
        .collect();
    assert_eq!(
        lines,
        vec![
            "2021-01-31 Assets:Cash Expenses:Food CHF \"Snacks\" -50",
            "2021-01-31 Assets:Cash Expenses:Rent CHF \"Parking\" -10",
            "2021-01-31 Expenses:Food Assets:Cash CHF \"Snacks\" 50",
            "2021-01-31 Expenses:Rent Assets:Cash CHF \"Parking\" 10",
        ]
    );
    let february = register.get(Some(date("2021-02-28"))).unwrap();
    assert_eq!(february.len(), 2);
    assert_eq!(february.sum(), q("0"));
}
