//! Loading a journal together with the files it includes
//!
//! Every file is parsed on its own scoped thread; files discovered through
//! `include` directives are spawned as soon as they are seen. All threads push
//! their directives into one bounded channel, which the calling thread drains into
//! a [`Journal`].

use glob::Pattern;
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};
use std::sync::mpsc::{sync_channel, SyncSender};
use std::thread::{self, Scope};

use super::build::build;
use super::grammar::Parser;
use crate::models::{Directive, Journal, Registry};
use crate::parallel::{CancellationToken, CHANNEL_SIZE};
use crate::Error;

/// Access to journal files
pub trait Loader: Send + Sync {
    /// Reads the file at `path`
    fn load(&self, path: &Path) -> io::Result<String>;

    /// The files matched by an include pattern, which may contain wildcards
    fn expand(&self, pattern: &Path) -> io::Result<Vec<PathBuf>>;

    /// The identity of the file at `path`; two paths naming the same file give the
    /// same result
    fn canonicalize(&self, path: &Path) -> PathBuf;
}

/// Drops `.` components and folds `..` into the component before it, without
/// looking at the filesystem
pub fn normalize(path: &Path) -> PathBuf {
    let mut result = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match result.components().next_back() {
                Some(Component::Normal(_)) => {
                    result.pop();
                }
                Some(Component::RootDir) | Some(Component::Prefix(_)) => {}
                _ => result.push(".."),
            },
            other => result.push(other.as_os_str()),
        }
    }
    result
}

fn has_wildcards(pattern: &str) -> bool {
    pattern.contains(|c| c == '*' || c == '?' || c == '[')
}

/// Loads journals from disk
#[derive(Debug, Clone, Copy, Default)]
pub struct FileSystemLoader;

impl Loader for FileSystemLoader {
    fn load(&self, path: &Path) -> io::Result<String> {
        fs::read_to_string(path)
    }

    fn expand(&self, pattern: &Path) -> io::Result<Vec<PathBuf>> {
        let text = pattern.to_string_lossy();
        if !has_wildcards(&text) {
            return Ok(vec![pattern.to_path_buf()]);
        }
        let paths = glob::glob(&text)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e.to_string()))?;
        let mut result = Vec::new();
        for path in paths {
            result.push(path.map_err(io::Error::from)?);
        }
        result.sort();
        Ok(result)
    }

    fn canonicalize(&self, path: &Path) -> PathBuf {
        fs::canonicalize(path).unwrap_or_else(|_| normalize(path))
    }
}

/// Serves journals from memory
#[derive(Debug, Clone, Default)]
pub struct MemoryLoader {
    files: HashMap<PathBuf, String>,
}

impl MemoryLoader {
    pub fn new() -> MemoryLoader {
        MemoryLoader::default()
    }

    pub fn insert(&mut self, path: impl Into<PathBuf>, text: impl Into<String>) {
        self.files.insert(normalize(&path.into()), text.into());
    }

    pub fn with(mut self, path: impl Into<PathBuf>, text: impl Into<String>) -> MemoryLoader {
        self.insert(path, text);
        self
    }
}

impl Loader for MemoryLoader {
    fn load(&self, path: &Path) -> io::Result<String> {
        self.files.get(&normalize(path)).cloned().ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::NotFound,
                format!("{} not found", path.display()),
            )
        })
    }

    fn expand(&self, pattern: &Path) -> io::Result<Vec<PathBuf>> {
        let text = pattern.to_string_lossy();
        if !has_wildcards(&text) {
            return Ok(vec![pattern.to_path_buf()]);
        }
        let pattern = Pattern::new(&normalize(pattern).to_string_lossy())
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e.to_string()))?;
        let mut result: Vec<PathBuf> = self
            .files
            .keys()
            .filter(|p| pattern.matches_path(p))
            .cloned()
            .collect();
        result.sort();
        Ok(result)
    }

    fn canonicalize(&self, path: &Path) -> PathBuf {
        normalize(path)
    }
}

type Item = Result<Directive, Error>;

/// Parses a journal and, recursively, the files it includes
pub struct RecursiveParser<'a> {
    loader: &'a dyn Loader,
    registry: &'a Registry,
    token: CancellationToken,
    seen: Mutex<HashSet<PathBuf>>,
}

impl<'a> RecursiveParser<'a> {
    pub fn new(
        loader: &'a dyn Loader,
        registry: &'a Registry,
        token: CancellationToken,
    ) -> RecursiveParser<'a> {
        RecursiveParser {
            loader,
            registry,
            token,
            seen: Mutex::new(HashSet::new()),
        }
    }

    /// Parses `root` and everything it includes into a journal
    ///
    /// The first error, from whichever file, cancels the remaining parses and is
    /// returned.
    pub fn parse(&self, root: &Path) -> Result<Journal, Error> {
        self.seen.lock().insert(self.loader.canonicalize(root));
        let (tx, rx) = sync_channel::<Item>(CHANNEL_SIZE);
        thread::scope(|scope| {
            self.spawn(scope, root.to_path_buf(), None, tx);
            let mut journal = Journal::new();
            let mut count = 0;
            loop {
                match self.token.pop(&rx)? {
                    Some(Ok(directive)) => {
                        journal.insert(directive);
                        count += 1;
                    }
                    Some(Err(error)) => {
                        self.token.cancel();
                        return Err(error);
                    }
                    None => break,
                }
            }
            tracing::info!("loaded {} directives from {}", count, root.display());
            Ok(journal)
        })
    }

    fn spawn<'scope, 'env>(
        &'scope self,
        scope: &'scope Scope<'scope, 'env>,
        path: PathBuf,
        from: Option<PathBuf>,
        tx: SyncSender<Item>,
    ) {
        scope.spawn(move || {
            if let Err(error) = self.parse_file(scope, &path, from, &tx) {
                if !matches!(error, Error::Cancelled) {
                    let _ = self.token.push(&tx, Err(error));
                }
            }
        });
    }

    fn parse_file<'scope, 'env>(
        &'scope self,
        scope: &'scope Scope<'scope, 'env>,
        path: &Path,
        from: Option<PathBuf>,
        tx: &SyncSender<Item>,
    ) -> Result<(), Error> {
        tracing::debug!("parsing {}", path.display());
        let text = self.loader.load(path).map_err(|error| Error::Include {
            from: from.unwrap_or_else(|| path.to_path_buf()),
            path: path.to_path_buf(),
            error,
        })?;
        let name = path.to_string_lossy();
        let file = Parser::new(&text, &name)
            .parse_file()
            .map_err(|partial| Error::Syntax {
                path: path.to_path_buf(),
                error: partial.error,
            })?;
        let directives = build(&file, self.registry)?;
        tracing::debug!("parsed {} directives in {}", directives.len(), path.display());
        for directive in directives {
            match directive {
                Directive::Include(include) => {
                    let written = include.path.to_string_lossy();
                    let expanded = shellexpand::tilde(&written).into_owned();
                    let pattern = path
                        .parent()
                        .unwrap_or_else(|| Path::new(""))
                        .join(expanded);
                    let paths = self.loader.expand(&pattern).map_err(|error| Error::Include {
                        from: path.to_path_buf(),
                        path: pattern.clone(),
                        error,
                    })?;
                    for included in paths {
                        if !self.seen.lock().insert(self.loader.canonicalize(&included)) {
                            return Err(Error::DuplicateInclude { path: included });
                        }
                        tracing::debug!("{} includes {}", path.display(), included.display());
                        self.spawn(scope, included, Some(path.to_path_buf()), tx.clone());
                    }
                }
                directive => self.token.push(tx, Ok(directive))?,
            }
        }
        Ok(())
    }
}

/// Loads the journal at `path` with everything it includes
pub fn load(loader: &dyn Loader, registry: &Registry, path: &Path) -> Result<Journal, Error> {
    RecursiveParser::new(loader, registry, CancellationToken::new()).parse(path)
}
