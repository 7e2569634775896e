use std::collections::hash_map::{Iter, Values};
use std::collections::HashMap;
use std::sync::Arc;

use crate::models::HasName;

/// A list of interned things
///
/// This structure holds the master elements of the ledger, such as commodities or
/// accounts. Every name maps to exactly one shared instance, so two directives
/// referring to `Assets:Cash` hold the same `Arc`.
///
/// It provides methods for:
/// - Adding new elements to the list, or getting the existing one back
/// - Retrieving elements by name
#[derive(Debug, Clone)]
pub struct List<T> {
    list: HashMap<String, Arc<T>>,
}

impl<T> Default for List<T> {
    fn default() -> Self {
        List {
            list: HashMap::new(),
        }
    }
}

impl<T: HasName> List<T> {
    pub fn new() -> Self {
        List::default()
    }

    /// Inserts an ```element``` in the list, unless one with the same name exists.
    /// Returns the element stored under that name.
    pub fn insert(&mut self, element: T) -> Arc<T> {
        self.list
            .entry(element.get_name().to_string())
            .or_insert_with(|| Arc::new(element))
            .clone()
    }

    pub fn get(&self, name: &str) -> Option<&Arc<T>> {
        self.list.get(name)
    }

    pub fn iter(&self) -> Iter<'_, String, Arc<T>> {
        self.list.iter()
    }
    pub fn values(&self) -> Values<'_, String, Arc<T>> {
        self.list.values()
    }
    pub fn len(&self) -> usize {
        self.list.len()
    }
    pub fn is_empty(&self) -> bool {
        self.list.is_empty()
    }
}
