//! Key transformations applied while aggregating reports
//!
//! A [`KeyMapper`] holds one mapping function per key field. Mapping several keys
//! to the same key merges their amounts, which is how reports drop dimensions
//! (all fields mapped to `None`) or roll accounts up ([`shorten`]).
use chrono::NaiveDate;
use regex::Regex;
use std::sync::Arc;

use crate::models::{Account, Commodity, Key, Registry};
use crate::Error;

pub type Mapper<T> = Arc<dyn Fn(T) -> T + Send + Sync>;

pub fn identity<T: 'static>() -> Mapper<T> {
    Arc::new(|t: T| t)
}

/// Maps every value to `None`
pub fn remove<T: 'static>() -> Mapper<Option<T>> {
    Arc::new(|_: Option<T>| None)
}

/// Field-wise mapping of report keys
#[derive(Clone)]
pub struct KeyMapper {
    pub date: Mapper<Option<NaiveDate>>,
    pub account: Mapper<Option<Arc<Account>>>,
    pub other: Mapper<Option<Arc<Account>>>,
    pub commodity: Mapper<Option<Arc<Commodity>>>,
    pub valuation: Mapper<Option<Arc<Commodity>>>,
    pub description: Mapper<Option<String>>,
}

impl Default for KeyMapper {
    fn default() -> Self {
        KeyMapper {
            date: identity(),
            account: identity(),
            other: identity(),
            commodity: identity(),
            valuation: identity(),
            description: identity(),
        }
    }
}

impl KeyMapper {
    pub fn map(&self, key: Key) -> Key {
        Key {
            date: (self.date)(key.date),
            account: (self.account)(key.account),
            other: (self.other)(key.other),
            commodity: (self.commodity)(key.commodity),
            valuation: (self.valuation)(key.valuation),
            description: (self.description)(key.description),
        }
    }
}

/// A rule collapsing matching accounts to their ancestor at `level`
#[derive(Debug, Clone)]
pub struct ShortenRule {
    pub level: usize,
    pub regex: Regex,
}

impl ShortenRule {
    /// Parses `<level>,<regex>`
    pub fn parse(rule: &str) -> Result<ShortenRule, Error> {
        let invalid = |message: String| Error::Config { line: 0, message };
        let (level, regex) = rule
            .split_once(',')
            .ok_or_else(|| invalid(format!("invalid shorten rule `{}`, want <level>,<regex>", rule)))?;
        let level = level
            .trim()
            .parse::<usize>()
            .map_err(|_| invalid(format!("invalid level `{}` in shorten rule", level)))?;
        let regex = Regex::new(regex.trim())
            .map_err(|e| invalid(format!("invalid regex in shorten rule: {}", e)))?;
        Ok(ShortenRule { level, regex })
    }
}

/// Collapses every account matching a rule to its ancestor at the rule's level;
/// the first matching rule wins, other accounts are kept
pub fn shorten(registry: Arc<Registry>, rules: Vec<ShortenRule>) -> Mapper<Option<Arc<Account>>> {
    if rules.is_empty() {
        return identity();
    }
    Arc::new(move |account: Option<Arc<Account>>| {
        let account = account?;
        match rules.iter().find(|r| r.regex.is_match(&account.to_string())) {
            Some(rule) => Some(registry.ancestor_at(&account, rule.level)),
            None => Some(account),
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shorten_collapses_matching_accounts() {
        let registry = Arc::new(Registry::new());
        let checking = registry.account("Assets:Bank:Checking").unwrap();
        let food = registry.account("Expenses:Food:Groceries").unwrap();
        let rules = vec![ShortenRule::parse("2,^Assets").unwrap()];
        let mapper = shorten(registry.clone(), rules);
        assert_eq!(
            mapper(Some(checking)).map(|a| a.to_string()),
            Some("Assets:Bank".to_string())
        );
        assert_eq!(mapper(Some(food.clone())), Some(food));
        assert_eq!(mapper(None), None);
    }

    #[test]
    fn invalid_rules() {
        assert!(ShortenRule::parse("Assets").is_err());
        assert!(ShortenRule::parse("x,Assets").is_err());
        assert!(ShortenRule::parse("1,(").is_err());
    }

    #[test]
    fn key_mapper_drops_fields() {
        let registry = Registry::new();
        let key = Key {
            account: Some(registry.account("Assets:Cash").unwrap()),
            description: Some("lunch".to_string()),
            ..Key::default()
        };
        let mapper = KeyMapper {
            description: remove(),
            ..KeyMapper::default()
        };
        let mapped = mapper.map(key.clone());
        assert_eq!(mapped.description, None);
        assert_eq!(mapped.account, key.account);
    }
}
