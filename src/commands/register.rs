use std::sync::Arc;

use super::{account_mapper, run};
use crate::config::Config;
use crate::models::Registry;
use crate::parser::Loader;
use crate::process::QueryMode;
use crate::report::Register;
use crate::Error;

/// Register report: every booking, from both sides, grouped by period
pub fn execute(config: &Config, loader: &dyn Loader) -> Result<Register, Error> {
    let registry = Arc::new(Registry::new());
    let mut register = Register::new();
    run(
        config,
        loader,
        &registry,
        QueryMode::Register,
        account_mapper(config, &registry),
        &mut register,
    )?;
    Ok(register)
}
