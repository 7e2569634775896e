use std::cmp::Ordering;
use std::fmt;
use std::fmt::{Display, Formatter};
use std::hash::{Hash, Hasher};
use std::str::FromStr;

use crate::models::HasName;
use crate::ModelError;

/// The kind of an account, given by the first segment of its name
///
/// The declaration order is the display order of reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum AccountType {
    Assets,
    Liabilities,
    Equity,
    Income,
    Expenses,
}

impl FromStr for AccountType {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Assets" => Ok(AccountType::Assets),
            "Liabilities" => Ok(AccountType::Liabilities),
            "Equity" => Ok(AccountType::Equity),
            "Income" => Ok(AccountType::Income),
            "Expenses" => Ok(AccountType::Expenses),
            _ => Err(ModelError::InvalidAccountType(s.to_string())),
        }
    }
}

impl Display for AccountType {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let name = match self {
            AccountType::Assets => "Assets",
            AccountType::Liabilities => "Liabilities",
            AccountType::Equity => "Equity",
            AccountType::Income => "Income",
            AccountType::Expenses => "Expenses",
        };
        write!(f, "{}", name)
    }
}

/// An account
///
/// Accounts are `:`-separated paths such as `Assets:Bank:Checking`. Two accounts are
/// the same account if they have the same name.
#[derive(Debug, Clone)]
pub struct Account {
    name: String,
    account_type: AccountType,
}

impl Account {
    pub fn new(name: &str) -> Result<Account, ModelError> {
        if name.split(':').any(|segment| segment.is_empty()) {
            return Err(ModelError::InvalidAccountName(name.to_string()));
        }
        let first = name.split(':').next().unwrap_or_default();
        let account_type = first
            .parse::<AccountType>()
            .map_err(|_| ModelError::InvalidAccountType(name.to_string()))?;
        Ok(Account {
            name: name.to_string(),
            account_type,
        })
    }

    pub(crate) fn retained_earnings() -> Account {
        Account {
            name: super::RETAINED_EARNINGS.to_string(),
            account_type: AccountType::Equity,
        }
    }

    pub fn account_type(&self) -> AccountType {
        self.account_type
    }

    /// Depth of the account, useful for filters and other
    pub fn depth(&self) -> usize {
        self.name.chars().filter(|c| *c == ':').count() + 1
    }

    /// The last segment of the name
    pub fn segment(&self) -> &str {
        self.name.rsplit(':').next().unwrap_or(&self.name)
    }

    pub fn parent_name(&self) -> Option<&str> {
        self.name.rfind(':').map(|i| &self.name[..i])
    }

    /// Names of the account and all its ancestors, outermost first
    pub fn path(&self) -> Vec<&str> {
        self.name
            .match_indices(':')
            .map(|(i, _)| &self.name[..i])
            .chain(std::iter::once(self.name.as_str()))
            .collect()
    }

    /// Balance sheet accounts: assets and liabilities
    pub fn is_al(&self) -> bool {
        matches!(
            self.account_type,
            AccountType::Assets | AccountType::Liabilities
        )
    }

    /// Income statement accounts: income and expenses
    pub fn is_ie(&self) -> bool {
        matches!(
            self.account_type,
            AccountType::Income | AccountType::Expenses
        )
    }
}

impl Display for Account {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

impl PartialEq for Account {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Eq for Account {}

impl Hash for Account {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
    }
}

impl PartialOrd for Account {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Account {
    fn cmp(&self, other: &Self) -> Ordering {
        self.account_type
            .cmp(&other.account_type)
            .then_with(|| self.name.cmp(&other.name))
    }
}

impl HasName for Account {
    fn get_name(&self) -> &str {
        self.name.as_str()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn account_types() {
        let account = Account::new("Expenses:Travel:Flights").unwrap();
        assert_eq!(account.account_type(), AccountType::Expenses);
        assert_eq!(account.depth(), 3);
        assert_eq!(account.segment(), "Flights");
        assert_eq!(account.parent_name(), Some("Expenses:Travel"));
        assert_eq!(
            account.path(),
            vec!["Expenses", "Expenses:Travel", "Expenses:Travel:Flights"]
        );
        assert!(account.is_ie());
        assert!(!account.is_al());
    }

    #[test]
    fn invalid_accounts() {
        assert_eq!(
            Account::new("Cash:Wallet"),
            Err(ModelError::InvalidAccountType("Cash:Wallet".to_string()))
        );
        assert!(matches!(
            Account::new("Assets::Cash"),
            Err(ModelError::InvalidAccountName(_))
        ));
    }

    #[test]
    fn ordering_is_by_type_then_name() {
        let mut accounts = vec![
            Account::new("Expenses:Food").unwrap(),
            Account::new("Assets:Cash").unwrap(),
            Account::new("Equity:Opening").unwrap(),
            Account::new("Assets:Bank").unwrap(),
        ];
        accounts.sort();
        let names: Vec<&str> = accounts.iter().map(|a| a.get_name()).collect();
        assert_eq!(
            names,
            vec!["Assets:Bank", "Assets:Cash", "Equity:Opening", "Expenses:Food"]
        );
    }
}
