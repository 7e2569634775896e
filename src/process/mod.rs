//! The sequential processing stages
//!
//! Days flow through the stages in date order:
//!
//! 1. [`PriceUpdater`] keeps the price graph and attaches conversion factors
//! 2. [`Balancer`] applies the directives to the running balances
//! 3. [`PeriodFilter`] groups the days into periods
//! 4. [`Closer`] closes income and expenses into retained earnings (optional)
//! 5. [`Query`] turns every period into report entries
//!
//! Each stage is a [`Processor`]. A [`Pipeline`] runs them on their own threads,
//! connected by bounded channels; [`Processor::run_all`] runs a single stage
//! in place.

use num::rational::BigRational;
use std::sync::mpsc::{sync_channel, Receiver};
use std::thread::{self, Scope};

use crate::models::{Day, Key};
use crate::parallel::{CancellationToken, Context, CHANNEL_SIZE};
use crate::report::Collector;
use crate::Error;

mod balance;
mod close;
mod period_filter;
mod prices;
mod query;

pub use balance::Balancer;
pub use close::Closer;
pub use period_filter::{PeriodAggregate, PeriodFilter, Snapshot};
pub use prices::PriceUpdater;
pub use query::{Query, QueryMode};

/// Receives the outputs of a stage
pub type Emit<'a, T> = dyn FnMut(T) -> Result<(), Error> + 'a;

/// One stage of the pipeline
pub trait Processor: Send {
    type Input: Send;
    type Output: Send;

    fn name(&self) -> &'static str;

    /// Handles one input, emitting any number of outputs
    fn process(&mut self, input: Self::Input, emit: &mut Emit<Self::Output>) -> Result<(), Error>;

    /// Called once after the last input
    fn finish(&mut self, _emit: &mut Emit<Self::Output>) -> Result<(), Error> {
        Ok(())
    }

    /// Runs the stage over all `inputs` on the current thread
    fn run_all<I>(&mut self, inputs: I) -> Result<Vec<Self::Output>, Error>
    where
        I: IntoIterator<Item = Self::Input>,
        Self: Sized,
    {
        let mut outputs = Vec::new();
        let mut emit = |output: Self::Output| -> Result<(), Error> {
            outputs.push(output);
            Ok(())
        };
        for input in inputs {
            self.process(input, &mut emit)?;
        }
        self.finish(&mut emit)?;
        Ok(outputs)
    }
}

/// Runs `stage` on a scoped thread, reading from `input` and returning the channel
/// its outputs are sent to
///
/// A failing stage records its error in `context`, which cancels every other stage.
pub fn spawn_stage<'scope, 'env, P>(
    scope: &'scope Scope<'scope, 'env>,
    context: &'scope Context,
    mut stage: P,
    input: Receiver<P::Input>,
) -> Receiver<P::Output>
where
    P: Processor + 'scope,
{
    let (tx, rx) = sync_channel(CHANNEL_SIZE);
    scope.spawn(move || {
        let token = context.token();
        tracing::debug!("stage {} started", stage.name());
        let mut emit = |output: P::Output| token.push(&tx, output);
        let mut run = || -> Result<(), Error> {
            while let Some(value) = token.pop(&input)? {
                stage.process(value, &mut emit)?;
            }
            stage.finish(&mut emit)
        };
        match run() {
            Ok(()) => tracing::debug!("stage {} finished", stage.name()),
            Err(error) => context.fail(error),
        }
    });
    rx
}

/// The full chain of stages, from sorted days to report entries
pub struct Pipeline {
    pub prices: PriceUpdater,
    pub balancer: Balancer,
    pub filter: PeriodFilter,
    pub closer: Option<Closer>,
    pub query: Query,
}

impl Pipeline {
    /// Streams `days` through all stages and inserts the resulting entries into
    /// `collector`
    ///
    /// Fails with the first error of any stage; the collector may then hold a
    /// partial result and should be discarded.
    pub fn run(
        self,
        days: Vec<Day>,
        collector: &mut dyn Collector,
        token: CancellationToken,
    ) -> Result<(), Error> {
        let context = Context::new(token);
        let count = days.len();
        thread::scope(|scope| {
            let (tx, source) = sync_channel(CHANNEL_SIZE);
            let context = &context;
            scope.spawn(move || {
                for day in days {
                    if let Err(error) = context.token().push(&tx, day) {
                        context.fail(error);
                        return;
                    }
                }
            });
            let days = spawn_stage(scope, context, self.prices, source);
            let days = spawn_stage(scope, context, self.balancer, days);
            let periods = spawn_stage(scope, context, self.filter, days);
            let periods = match self.closer {
                Some(closer) => spawn_stage(scope, context, closer, periods),
                None => periods,
            };
            let entries = spawn_stage(scope, context, self.query, periods);
            loop {
                match context.token().pop(&entries) {
                    Ok(Some(entries)) => insert_all(collector, entries),
                    Ok(None) => break,
                    Err(error) => {
                        context.fail(error);
                        break;
                    }
                }
            }
        });
        tracing::debug!("pipeline processed {} days", count);
        context.into_result()
    }
}

fn insert_all(collector: &mut dyn Collector, entries: Vec<(Key, BigRational)>) {
    for (key, amount) in entries {
        collector.insert(key, &amount);
    }
}
