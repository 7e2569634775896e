//! Aggregation of query entries into reports
//!
//! A [`Report`] arranges entries in two account trees: assets and liabilities
//! on one side, equity, income and expenses on the other. A [`Register`] keeps
//! them flat, grouped by date.
use chrono::NaiveDate;
use num::rational::BigRational;
use num::{Signed, ToPrimitive};
use std::collections::btree_map;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use crate::mapper::KeyMapper;
use crate::models::{Account, Amounts, Key, Registry};
use crate::parallel::{fork_join, fork_join_mut};

/// Receives the entries produced by a query
pub trait Collector {
    fn insert(&mut self, key: Key, amount: &BigRational);
}

/// A node of an account tree
///
/// Amounts are kept on the node of the account they were posted to; parents
/// only hold what was posted to them directly.
#[derive(Debug, Clone, Default)]
pub struct Node {
    account: Option<Arc<Account>>,
    children: HashMap<Arc<Account>, Node>,
    amounts: Amounts<Key>,
    weight: f64,
}

impl Node {
    fn new(account: Option<Arc<Account>>) -> Node {
        Node {
            account,
            ..Node::default()
        }
    }

    /// `None` for the root
    pub fn account(&self) -> Option<&Arc<Account>> {
        self.account.as_ref()
    }

    pub fn amounts(&self) -> &Amounts<Key> {
        &self.amounts
    }

    pub fn weight(&self) -> f64 {
        self.weight
    }

    pub fn is_empty(&self) -> bool {
        self.amounts.is_empty() && self.children.values().all(Node::is_empty)
    }

    /// The node for the last account of `ancestors`, created with its parents
    /// on first use
    pub fn leaf(&mut self, ancestors: &[Arc<Account>]) -> &mut Node {
        match ancestors.split_first() {
            None => self,
            Some((first, rest)) => self
                .children
                .entry(first.clone())
                .or_insert_with(|| Node::new(Some(first.clone())))
                .leaf(rest),
        }
    }

    /// Children ordered by account type, weight and name
    pub fn children(&self) -> Vec<&Node> {
        let mut children: Vec<&Node> = self.children.values().collect();
        children.sort_by(|a, b| {
            let type_of = |n: &Node| n.account.as_ref().map(|a| a.account_type());
            type_of(*a)
                .cmp(&type_of(*b))
                .then_with(|| a.weight.total_cmp(&b.weight))
                .then_with(|| a.account.cmp(&b.account))
        });
        children
    }

    /// Sets the weight of every node: the negated magnitude of the valued amounts
    /// posted to it, plus the weights of its children
    pub fn compute_weights(&mut self) {
        fork_join_mut(&mut self.children, |(_, child)| child.compute_weights());
        let own = self
            .amounts
            .sum_over(|key| key.valuation.is_some())
            .abs()
            .to_f64()
            .unwrap_or(0.0);
        self.weight = -own + self.children.values().map(|c| c.weight).sum::<f64>();
    }

    /// The amounts of the whole subtree, with every key passed through `mapper`
    pub fn totals(&self, mapper: &KeyMapper) -> Amounts<Key> {
        let mut totals = self.amounts.map_keys(|key| mapper.map(key.clone()));
        for child in fork_join(&self.children, |(_, child)| child.totals(mapper)) {
            totals.merge(&child);
        }
        totals
    }
}

/// Entries arranged in account trees
#[derive(Debug)]
pub struct Report {
    registry: Arc<Registry>,
    al: Node,
    eie: Node,
}

impl Report {
    pub fn new(registry: Arc<Registry>) -> Report {
        Report {
            registry,
            al: Node::new(None),
            eie: Node::new(None),
        }
    }

    /// Assets and liabilities; entries without an account are kept on its root
    pub fn al(&self) -> &Node {
        &self.al
    }

    /// Equity, income and expenses
    pub fn eie(&self) -> &Node {
        &self.eie
    }

    pub fn compute_weights(&mut self) {
        let Report { al, eie, .. } = self;
        rayon::join(|| al.compute_weights(), || eie.compute_weights());
        tracing::debug!("report weights: al={} eie={}", al.weight, eie.weight);
    }

    /// The amounts of both trees, with every key passed through `mapper`
    pub fn totals(&self, mapper: &KeyMapper) -> Amounts<Key> {
        let (mut al, eie) = rayon::join(|| self.al.totals(mapper), || self.eie.totals(mapper));
        al.merge(&eie);
        al
    }
}

impl Collector for Report {
    fn insert(&mut self, key: Key, amount: &BigRational) {
        let node = match key.account.clone() {
            None => &mut self.al,
            Some(account) => {
                let ancestors = self.registry.ancestors(&account);
                let root = if account.is_al() {
                    &mut self.al
                } else {
                    &mut self.eie
                };
                root.leaf(&ancestors)
            }
        };
        node.amounts.add(key, amount);
    }
}

/// Entries grouped by date, in date order
#[derive(Debug, Clone, Default)]
pub struct Register {
    rows: BTreeMap<Option<NaiveDate>, Amounts<Key>>,
}

impl Register {
    pub fn new() -> Register {
        Register::default()
    }

    pub fn get(&self, date: Option<NaiveDate>) -> Option<&Amounts<Key>> {
        self.rows.get(&date)
    }

    pub fn iter(&self) -> btree_map::Iter<'_, Option<NaiveDate>, Amounts<Key>> {
        self.rows.iter()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Entries of one date, ordered by key
    pub fn entries(&self, date: Option<NaiveDate>) -> Vec<(&Key, &BigRational)> {
        let mut entries: Vec<(&Key, &BigRational)> = match self.rows.get(&date) {
            Some(amounts) => amounts.iter().collect(),
            None => Vec::new(),
        };
        entries.sort_by(|a, b| a.0.cmp(b.0));
        entries
    }
}

impl Collector for Register {
    fn insert(&mut self, key: Key, amount: &BigRational) {
        self.rows.entry(key.date).or_default().add(key, amount);
    }
}
