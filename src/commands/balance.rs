use std::sync::Arc;

use super::{account_mapper, run};
use crate::config::Config;
use crate::models::Registry;
use crate::parser::Loader;
use crate::process::QueryMode;
use crate::report::Report;
use crate::Error;

/// Balance report
///
/// Returns the balances at the end of every period (their changes with `diff`),
/// arranged in account trees with weights computed.
pub fn execute(config: &Config, loader: &dyn Loader) -> Result<Report, Error> {
    let registry = Arc::new(Registry::new());
    let mode = if config.diff {
        QueryMode::Diff
    } else {
        QueryMode::Balance
    };
    let mut report = Report::new(registry.clone());
    run(
        config,
        loader,
        &registry,
        mode,
        account_mapper(config, &registry),
        &mut report,
    )?;
    report.compute_weights();
    Ok(report)
}
