use chrono::NaiveDate;
use num::rational::BigRational;
use num::{One, Zero};
use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap, HashSet};
use std::sync::Arc;

use super::{Amounts, Commodity, HasName, Position, Price};

#[derive(Debug, Clone)]
struct Quote {
    date: NaiveDate,
    price: BigRational,
}

/// Conversion graph built from price directives
///
/// Every price `1 commodity = price target` adds an edge in both directions: one
/// unit of `commodity` is worth `price` units of `target`, one unit of `target` is
/// worth `1 / price` units of `commodity`. A newer quote for the same pair replaces
/// the older one, so the graph always holds the most recent prices.
#[derive(Debug, Clone, Default)]
pub struct PriceGraph {
    // edges[n][m] is the value of one unit of m expressed in n
    edges: HashMap<Arc<Commodity>, HashMap<Arc<Commodity>, Quote>>,
}

impl PriceGraph {
    pub fn new() -> PriceGraph {
        PriceGraph::default()
    }

    pub fn insert(&mut self, price: &Price) {
        if price.price.is_zero() {
            return;
        }
        self.edges
            .entry(price.target.clone())
            .or_default()
            .insert(
                price.commodity.clone(),
                Quote {
                    date: price.date,
                    price: price.price.clone(),
                },
            );
        self.edges
            .entry(price.commodity.clone())
            .or_default()
            .insert(
                price.target.clone(),
                Quote {
                    date: price.date,
                    price: price.price.recip(),
                },
            );
    }

    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    /// Resolves, for every commodity reachable from `valuation`, the factor that
    /// converts it into `valuation`
    ///
    /// This uses the [Dijkstra algorithm](https://en.wikipedia.org/wiki/Dijkstra%27s_algorithm),
    /// where each hop costs one plus the age of its quote in days on `date`; among paths of
    /// equal cost the one through commodities with smaller names wins. Commodities
    /// disconnected from `valuation` get no factor.
    pub fn normalize(&self, valuation: &Arc<Commodity>, date: NaiveDate) -> NormalizedPrices {
        let mut factors: HashMap<Arc<Commodity>, BigRational> = HashMap::new();
        let mut distances: HashMap<Arc<Commodity>, i64> = HashMap::new();
        let mut queue = BinaryHeap::new();
        distances.insert(valuation.clone(), 0);
        factors.insert(valuation.clone(), BigRational::one());
        queue.push(Reverse((0i64, valuation.get_name().to_string(), valuation.clone())));

        let mut done = HashSet::new();
        while let Some(Reverse((distance, _, current))) = queue.pop() {
            if !done.insert(current.clone()) {
                continue;
            }
            let factor = match factors.get(&current) {
                Some(factor) => factor.clone(),
                None => continue,
            };
            let neighbours = match self.edges.get(&current) {
                Some(neighbours) => neighbours,
                None => continue,
            };
            for (next, quote) in neighbours.iter() {
                if done.contains(next) {
                    continue;
                }
                let age = (date - quote.date).num_days().max(0);
                let alternative = distance + 1 + age;
                let better = match distances.get(next) {
                    None => true,
                    Some(known) => alternative < *known,
                };
                if better {
                    distances.insert(next.clone(), alternative);
                    factors.insert(next.clone(), &factor * &quote.price);
                    queue.push(Reverse((alternative, next.get_name().to_string(), next.clone())));
                }
            }
        }
        NormalizedPrices {
            valuation: valuation.clone(),
            date,
            factors,
        }
    }
}

/// Conversion factors into one valuation commodity, as of one date
#[derive(Debug, Clone)]
pub struct NormalizedPrices {
    valuation: Arc<Commodity>,
    date: NaiveDate,
    factors: HashMap<Arc<Commodity>, BigRational>,
}

impl NormalizedPrices {
    pub fn valuation(&self) -> &Arc<Commodity> {
        &self.valuation
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn factor(&self, commodity: &Commodity) -> Option<&BigRational> {
        self.factors.get(commodity)
    }

    pub fn value(&self, commodity: &Commodity, quantity: &BigRational) -> Option<BigRational> {
        self.factor(commodity).map(|f| f * quantity)
    }

    /// Values every position; positions in commodities without a factor are left out
    pub fn valuate(&self, amounts: &Amounts<Position>) -> Amounts<Position> {
        let mut result = Amounts::new();
        for (position, quantity) in amounts.iter() {
            match self.value(&position.commodity, quantity) {
                Some(value) => result.add(position.clone(), &value),
                None => tracing::trace!(
                    "no price for {} in {} on {}",
                    position.commodity,
                    self.valuation,
                    self.date
                ),
            }
        }
        result
    }
}
