#![allow(dead_code)]
use chrono::NaiveDate;
use num::rational::BigRational;
use std::path::PathBuf;
use std::sync::{Arc, Once};

use tally::config::Config;
use tally::models::{Key, Registry};
use tally::parser::MemoryLoader;
use tally::report::Node;

static TRACING: Once = Once::new();

/// Routes log output to the test harness; `RUST_LOG` selects the level
pub fn init_tracing() {
    TRACING.call_once(|| {
        use tracing_subscriber::{fmt, EnvFilter};

        let filter = EnvFilter::from_default_env().add_directive("tally=info".parse().unwrap());
        let _ = fmt().with_env_filter(filter).with_test_writer().try_init();
    });
}

pub fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

pub fn q(s: &str) -> BigRational {
    tally::models::quantity::parse_decimal(s).unwrap()
}

/// A loader serving a single journal at `main.journal`
pub fn single(text: &str) -> MemoryLoader {
    MemoryLoader::new().with("main.journal", text)
}

/// A configuration reporting on `main.journal`
pub fn config() -> Config {
    Config {
        journal: PathBuf::from("main.journal"),
        ..Config::default()
    }
}

/// The amount of `account` in `commodity` in a flat list of totals
pub fn amount_of(
    totals: &tally::models::Amounts<Key>,
    account: &str,
    commodity: &str,
) -> Option<BigRational> {
    totals
        .iter()
        .find(|(key, _)| {
            key.account.as_ref().map(|a| a.to_string()).as_deref() == Some(account)
                && key.commodity.as_ref().map(|c| c.to_string()).as_deref() == Some(commodity)
        })
        .map(|(_, amount)| amount.clone())
}

/// Names of the children of `node`, in report order
pub fn child_names(node: &Node) -> Vec<String> {
    node.children()
        .iter()
        .filter_map(|n| n.account().map(|a| a.to_string()))
        .collect()
}

pub fn registry() -> Arc<Registry> {
    Arc::new(Registry::new())
}
