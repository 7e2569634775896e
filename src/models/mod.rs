//! The journal model
//!
//! Commodities and accounts are interned in a [`Registry`], directives refer to
//! them through `Arc`s. Directives are grouped into [`Day`]s by the [`Journal`],
//! which the processing stages then enrich with prices, balances and values.
use parking_lot::RwLock;
use std::sync::Arc;

pub use account::{Account, AccountType};
pub use amounts::Amounts;
pub use commodity::Commodity;
pub use date::{Interval, Partition, Period};
pub use directive::{
    Accrual, Assertion, Close, Directive, Include, Lot, Open, Posting, Price, Source,
    Transaction,
};
pub use journal::{Day, Journal};
pub use key::{Key, Position};
pub use price::{NormalizedPrices, PriceGraph};

use crate::{List, ModelError};

mod account;
mod amounts;
mod commodity;
pub mod date;
mod directive;
mod journal;
mod key;
mod price;
pub mod quantity;

/// Name of the account income and expenses are closed into
pub const RETAINED_EARNINGS: &str = "Equity:RetainedEarnings";

pub trait HasName {
    fn get_name(&self) -> &str;
}

/// Interning tables for commodities and accounts
///
/// The registry is shared by every parser thread, so lookups take a read lock and
/// only first-time insertions take the write lock.
#[derive(Debug, Default)]
pub struct Registry {
    commodities: RwLock<List<Commodity>>,
    accounts: RwLock<List<Account>>,
}

impl Registry {
    pub fn new() -> Registry {
        Registry::default()
    }

    pub fn commodity(&self, name: &str) -> Arc<Commodity> {
        if let Some(commodity) = self.commodities.read().get(name) {
            return commodity.clone();
        }
        self.commodities.write().insert(Commodity::new(name))
    }

    pub fn account(&self, name: &str) -> Result<Arc<Account>, ModelError> {
        if let Some(account) = self.accounts.read().get(name) {
            return Ok(account.clone());
        }
        let account = Account::new(name)?;
        Ok(self.accounts.write().insert(account))
    }

    /// The account and its ancestors, outermost first
    pub fn ancestors(&self, account: &Account) -> Vec<Arc<Account>> {
        account
            .path()
            .into_iter()
            .filter_map(|name| self.account(name).ok())
            .collect()
    }

    /// The ancestor of `account` at depth `level`, or the account itself when it
    /// is not deeper than that
    pub fn ancestor_at(&self, account: &Arc<Account>, level: usize) -> Arc<Account> {
        if level == 0 || account.depth() <= level {
            return account.clone();
        }
        self.ancestors(account)
            .into_iter()
            .nth(level - 1)
            .unwrap_or_else(|| account.clone())
    }

    pub fn retained_earnings(&self) -> Arc<Account> {
        if let Some(account) = self.accounts.read().get(RETAINED_EARNINGS) {
            return account.clone();
        }
        self.accounts.write().insert(Account::retained_earnings())
    }

    /// All accounts, in report order
    pub fn accounts(&self) -> Vec<Arc<Account>> {
        let mut accounts: Vec<Arc<Account>> = self.accounts.read().values().cloned().collect();
        accounts.sort();
        accounts
    }
}
