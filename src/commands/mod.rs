//! Report commands
//!
//! Each command loads the journal named by a [`Config`], streams it through a
//! [`Pipeline`] and returns the aggregated result for the caller to render.
use std::sync::Arc;

use crate::config::Config;
use crate::filter::{and, by_name, filter_account, filter_commodity};
use crate::mapper::{shorten, KeyMapper};
use crate::models::{Day, Registry};
use crate::parallel::CancellationToken;
use crate::parser::{load, Loader};
use crate::process::{Balancer, Closer, PeriodFilter, Pipeline, PriceUpdater, Query, QueryMode};
use crate::report::Collector;
use crate::Error;

pub mod balance;
pub mod register;

/// Loads the journal and returns its days in date order
fn days(config: &Config, loader: &dyn Loader, registry: &Registry) -> Result<Vec<Day>, Error> {
    let journal = load(loader, registry, &config.journal)?;
    tracing::info!(
        "loaded {} with {} days",
        config.journal.display(),
        journal.len()
    );
    Ok(journal.sorted_days())
}

/// Runs the whole pipeline for `config`, inserting the entries into `collector`
fn run(
    config: &Config,
    loader: &dyn Loader,
    registry: &Arc<Registry>,
    mode: QueryMode,
    mapper: KeyMapper,
    collector: &mut dyn Collector,
) -> Result<(), Error> {
    let days = days(config, loader, registry)?;
    let valuation = config.valuation.as_deref().map(|v| registry.commodity(v));
    let filter = and(vec![
        filter_account(by_name(config.accounts.clone())),
        filter_commodity(by_name(config.commodities.clone())),
    ]);
    let pipeline = Pipeline {
        prices: PriceUpdater::new(valuation.clone()),
        balancer: Balancer::new(),
        filter: PeriodFilter::new(config.from, config.to, config.interval, config.last),
        closer: if config.close {
            Some(Closer::new(registry.retained_earnings()))
        } else {
            None
        },
        query: Query {
            mode,
            valuation,
            filter,
            mapper,
        },
    };
    pipeline.run(days, collector, CancellationToken::new())
}

/// Collapses accounts by the configured shortening rules
fn account_mapper(config: &Config, registry: &Arc<Registry>) -> KeyMapper {
    let accounts = shorten(registry.clone(), config.shorten.clone());
    KeyMapper {
        account: accounts.clone(),
        other: accounts,
        ..KeyMapper::default()
    }
}
