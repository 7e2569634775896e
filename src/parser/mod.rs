//! Parser module
//!
//! Parsing happens in two steps. The [`Parser`] reads journal text into a
//! positioned [`syntax`] tree, failing with a nested error chain that pinpoints
//! the offending character. [`build`] then turns the tree into model directives,
//! interning accounts and commodities in a [`Registry`](crate::models::Registry).
//! The [`include`] module ties both together for journals spread over several files.

use std::path::Path;

use crate::models::{Directive, Registry};
use crate::Error;

mod build;
mod grammar;
pub mod include;
mod scanner;
pub mod syntax;

pub use build::build;
pub use grammar::Parser;
pub use include::{load, FileSystemLoader, Loader, MemoryLoader, RecursiveParser};
pub use scanner::Location;

/// Parses and builds the directives of a single text, ignoring includes
pub fn parse_str(text: &str, path: &Path, registry: &Registry) -> Result<Vec<Directive>, Error> {
    let name = path.to_string_lossy();
    let file = Parser::new(text, &name)
        .parse_file()
        .map_err(|partial| Error::Syntax {
            path: path.to_path_buf(),
            error: partial.error,
        })?;
    build(&file, registry)
}
