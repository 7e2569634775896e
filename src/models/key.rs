use chrono::NaiveDate;
use std::fmt;
use std::fmt::{Display, Formatter};
use std::sync::Arc;

use super::{Account, Commodity};

/// A running balance position: how much of a commodity sits in an account
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Position {
    pub account: Arc<Account>,
    pub commodity: Arc<Commodity>,
}

impl Position {
    pub fn new(account: Arc<Account>, commodity: Arc<Commodity>) -> Position {
        Position { account, commodity }
    }
}

impl Display for Position {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.account, self.commodity)
    }
}

/// The key reports aggregate amounts under
///
/// Every field is optional so that mappers can drop the dimensions a report does
/// not care about: a balance report keeps `account` and `commodity`, a register also
/// keeps `other` and `description`, a commodity summary only keeps `commodity`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Key {
    pub date: Option<NaiveDate>,
    pub account: Option<Arc<Account>>,
    pub other: Option<Arc<Account>>,
    pub commodity: Option<Arc<Commodity>>,
    pub valuation: Option<Arc<Commodity>>,
    pub description: Option<String>,
}

impl Key {
    /// A key for the end-of-period balance of a position
    pub fn position(
        date: NaiveDate,
        position: &Position,
        valuation: Option<&Arc<Commodity>>,
    ) -> Key {
        Key {
            date: Some(date),
            account: Some(position.account.clone()),
            commodity: Some(position.commodity.clone()),
            valuation: valuation.cloned(),
            ..Key::default()
        }
    }
}

impl Display for Key {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let mut fields = Vec::new();
        if let Some(date) = &self.date {
            fields.push(date.to_string());
        }
        if let Some(account) = &self.account {
            fields.push(account.to_string());
        }
        if let Some(other) = &self.other {
            fields.push(other.to_string());
        }
        if let Some(commodity) = &self.commodity {
            fields.push(commodity.to_string());
        }
        if let Some(valuation) = &self.valuation {
            fields.push(format!("@{}", valuation));
        }
        if let Some(description) = &self.description {
            fields.push(format!("{:?}", description));
        }
        write!(f, "{}", fields.join(" "))
    }
}
