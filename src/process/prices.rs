use std::sync::Arc;

use super::{Emit, Processor};
use crate::models::{Commodity, Day, NormalizedPrices, PriceGraph};
use crate::Error;

/// Maintains the price graph and attaches conversion factors to every day
///
/// Without a valuation commodity the days pass through untouched.
#[derive(Debug, Default)]
pub struct PriceUpdater {
    valuation: Option<Arc<Commodity>>,
    graph: PriceGraph,
    normalized: Option<Arc<NormalizedPrices>>,
}

impl PriceUpdater {
    pub fn new(valuation: Option<Arc<Commodity>>) -> PriceUpdater {
        PriceUpdater {
            valuation,
            ..PriceUpdater::default()
        }
    }
}

impl Processor for PriceUpdater {
    type Input = Day;
    type Output = Day;

    fn name(&self) -> &'static str {
        "prices"
    }

    fn process(&mut self, mut day: Day, emit: &mut Emit<Day>) -> Result<(), Error> {
        if let Some(valuation) = &self.valuation {
            for price in day.prices.iter() {
                self.graph.insert(price);
            }
            if !day.prices.is_empty() || self.normalized.is_none() {
                self.normalized = Some(Arc::new(self.graph.normalize(valuation, day.date)));
            }
            day.normalized = self.normalized.clone();
        }
        emit(day)
    }
}
