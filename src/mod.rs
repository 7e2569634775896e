//! # tally
//!
//! A plain-text bookkeeping engine. Journals are parsed into directives, grouped
//! by day and streamed through a pipeline of stages that values, balances and
//! checks them, groups them into periods and aggregates them into reports.
//!
//! The entry points are [`commands::balance::execute`] and
//! [`commands::register::execute`]; the building blocks are public for callers
//! that assemble their own pipelines.

pub mod commands;
pub mod config;
mod error;
pub mod filter;
mod list;
pub mod mapper;
pub mod models;
pub mod parallel;
pub mod parser;
pub mod process;
pub mod report;

pub use error::{Error, LedgerError, ModelError};
pub use list::List;
