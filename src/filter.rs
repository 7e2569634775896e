//! Predicates over report keys
//!
//! A [`Filter`] decides whether a value takes part in a report. Filters are
//! plain shareable closures, combined with [`and`], [`or`] and [`not`].
use regex::Regex;
use std::sync::Arc;

use crate::models::{Account, Commodity, HasName, Key};

pub type Filter<T> = Arc<dyn Fn(&T) -> bool + Send + Sync>;

pub fn allow_all<T: 'static>() -> Filter<T> {
    Arc::new(|_: &T| true)
}

/// Passes if every filter passes
pub fn and<T: 'static>(filters: Vec<Filter<T>>) -> Filter<T> {
    Arc::new(move |t: &T| filters.iter().all(|f| f(t)))
}

/// Passes if any filter passes
pub fn or<T: 'static>(filters: Vec<Filter<T>>) -> Filter<T> {
    Arc::new(move |t: &T| filters.iter().any(|f| f(t)))
}

pub fn not<T: 'static>(filter: Filter<T>) -> Filter<T> {
    Arc::new(move |t: &T| !filter(t))
}

/// Passes names matching any of the regexes; an empty list passes everything
pub fn by_name<T: HasName + 'static>(regexes: Vec<Regex>) -> Filter<T> {
    if regexes.is_empty() {
        return allow_all();
    }
    Arc::new(move |t: &T| regexes.iter().any(|r| r.is_match(t.get_name())))
}

/// Applies an account filter to the account or the counter-account of a key
pub fn filter_account(filter: Filter<Account>) -> Filter<Key> {
    Arc::new(move |key: &Key| {
        key.account.as_ref().map_or(false, |a| filter(a))
            || key.other.as_ref().map_or(false, |a| filter(a))
    })
}

pub fn filter_commodity(filter: Filter<Commodity>) -> Filter<Key> {
    Arc::new(move |key: &Key| key.commodity.as_ref().map_or(true, |c| filter(c)))
}
