use num::rational::BigRational;
use num::Zero;
use std::collections::hash_map::Iter;
use std::collections::HashMap;
use std::fmt;
use std::fmt::{Display, Formatter};
use std::hash::Hash;

use crate::models::quantity::format_quantity;

/// Quantities indexed by a key, for example by account and commodity
///
/// Entries that sum up to zero are removed, so a missing key and a zero quantity
/// mean the same thing.
#[derive(Debug, Clone, PartialEq)]
pub struct Amounts<K: Eq + Hash> {
    amounts: HashMap<K, BigRational>,
}

impl<K: Eq + Hash> Default for Amounts<K> {
    fn default() -> Self {
        Amounts {
            amounts: HashMap::new(),
        }
    }
}

impl<K: Eq + Hash + Clone> Amounts<K> {
    pub fn new() -> Self {
        Amounts::default()
    }

    pub fn add(&mut self, key: K, quantity: &BigRational) {
        if quantity.is_zero() {
            return;
        }
        let total = self.amounts.entry(key.clone()).or_insert_with(BigRational::zero);
        *total += quantity;
        if total.is_zero() {
            self.amounts.remove(&key);
        }
    }

    pub fn get(&self, key: &K) -> Option<&BigRational> {
        self.amounts.get(key)
    }

    /// The quantity for `key`, zero if absent
    pub fn amount(&self, key: &K) -> BigRational {
        self.amounts.get(key).cloned().unwrap_or_else(BigRational::zero)
    }

    pub fn iter(&self) -> Iter<'_, K, BigRational> {
        self.amounts.iter()
    }

    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.amounts.keys()
    }

    pub fn len(&self) -> usize {
        self.amounts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.amounts.is_empty()
    }

    pub fn sum(&self) -> BigRational {
        self.amounts.values().sum()
    }

    /// The sum of the entries whose key satisfies `pred`
    pub fn sum_over(&self, pred: impl Fn(&K) -> bool) -> BigRational {
        self.amounts
            .iter()
            .filter(|(k, _)| pred(k))
            .map(|(_, v)| v)
            .sum()
    }

    pub fn merge(&mut self, other: &Amounts<K>) {
        for (k, v) in other.iter() {
            self.add(k.clone(), v);
        }
    }

    pub fn subtract(&mut self, other: &Amounts<K>) {
        for (k, v) in other.iter() {
            self.add(k.clone(), &-v);
        }
    }

    /// Re-keys every entry with `f`, summing entries that map to the same key
    pub fn map_keys<K2: Eq + Hash + Clone>(&self, f: impl Fn(&K) -> K2) -> Amounts<K2> {
        let mut result = Amounts::new();
        for (k, v) in self.iter() {
            result.add(f(k), v);
        }
        result
    }
}

impl<K: Eq + Hash + Clone> FromIterator<(K, BigRational)> for Amounts<K> {
    fn from_iter<I: IntoIterator<Item = (K, BigRational)>>(iter: I) -> Self {
        let mut amounts = Amounts::new();
        for (k, v) in iter {
            amounts.add(k, &v);
        }
        amounts
    }
}

impl<K: Eq + Hash> IntoIterator for Amounts<K> {
    type Item = (K, BigRational);
    type IntoIter = std::collections::hash_map::IntoIter<K, BigRational>;

    fn into_iter(self) -> Self::IntoIter {
        self.amounts.into_iter()
    }
}

impl<K: Eq + Hash + Display> Display for Amounts<K> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let mut lines: Vec<String> = self
            .amounts
            .iter()
            .map(|(k, v)| format!("{} {}", k, format_quantity(v)))
            .collect();
        lines.sort();
        write!(f, "{}", lines.join("\n"))
    }
}
