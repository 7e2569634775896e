use indoc::indoc;
use std::ffi::OsStr;
use std::fs;
use std::path::{Path, PathBuf};

use tally::commands::balance;
use tally::config::Config;
use tally::mapper::KeyMapper;
use tally::models::Registry;
use tally::parser::{load, FileSystemLoader, MemoryLoader};
use tally::Error;

mod common;
use common::{amount_of, date, init_tracing, q};

fn write(dir: &Path, name: &str, text: &str) {
    let path = dir.join(name);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, text).unwrap();
}

#[test]
fn includes_on_disk_with_wildcards() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    write(
        dir.path(),
        "main.journal",
        indoc! {r#"
            include "accounts.journal"
            include "years/*.journal"
        "#},
    );
    write(
        dir.path(),
        "accounts.journal",
        indoc! {r#"
            2020-01-01 open Assets:Cash
            2020-01-01 open Expenses:Food
        "#},
    );
    write(
        dir.path(),
        "years/2020.journal",
        indoc! {r#"
            2020-05-01 "Lunch"
            Assets:Cash Expenses:Food 20 CHF
        "#},
    );
    write(
        dir.path(),
        "years/2021.journal",
        indoc! {r#"
            2021-05-01 "Dinner"
            Assets:Cash Expenses:Food 30 CHF
        "#},
    );

    let registry = Registry::new();
    let journal = load(&FileSystemLoader, &registry, &dir.path().join("main.journal")).unwrap();
    assert_eq!(journal.len(), 3);

    let config = Config {
        journal: dir.path().join("main.journal"),
        to: Some(date("2021-12-31")),
        ..Config::default()
    };
    let report = balance::execute(&config, &FileSystemLoader).unwrap();
    let totals = report.totals(&KeyMapper::default());
    assert_eq!(amount_of(&totals, "Expenses:Food", "CHF"), Some(q("50")));
}

#[test]
fn missing_includes_name_the_including_file() {
    let loader = MemoryLoader::new().with("books/main.journal", "include \"missing.journal\"\n");
    let registry = Registry::new();
    match load(&loader, &registry, Path::new("books/main.journal")) {
        Err(Error::Include { from, path, .. }) => {
            assert_eq!(from, PathBuf::from("books/main.journal"));
            assert_eq!(path, PathBuf::from("books/missing.journal"));
        }
        other => panic!("unexpected result {:?}", other.map(|j| j.len())),
    }
}

#[test]
fn files_included_twice_are_rejected() {
    let loader = MemoryLoader::new()
        .with("main.journal", "include \"a.journal\"\ninclude \"b.journal\"\n")
        .with("a.journal", "include \"b.journal\"\n")
        .with("b.journal", "2020-01-01 open Assets:Cash\n");
    let registry = Registry::new();
    let result = load(&loader, &registry, Path::new("main.journal"));
    assert!(matches!(result, Err(Error::DuplicateInclude { .. })));
}

#[test]
fn syntax_errors_in_included_files() {
    let loader = MemoryLoader::new()
        .with("main.journal", "include \"sub/a.journal\"\n2020-01-01 open Assets:Cash\n")
        .with("sub/a.journal", "2020-01-01 open Assets:Bank\n2020-01-02 clsoe Assets:Bank\n");
    let registry = Registry::new();
    match load(&loader, &registry, Path::new("main.journal")) {
        Err(Error::Syntax { path, error }) => {
            assert_eq!(path, PathBuf::from("sub/a.journal"));
            assert_eq!(error.root_cause().range.start, 41);
        }
        other => panic!("unexpected result {:?}", other.map(|j| j.len())),
    }
}

#[test]
fn include_cycles_through_parent_directories_on_disk() {
    let dir = tempfile::tempdir().unwrap();
    write(
        dir.path(),
        "main.journal",
        "include \"sub/a.journal\"\n2020-01-01 open Assets:Cash\n",
    );
    write(dir.path(), "sub/a.journal", "include \"../main.journal\"\n");
    let registry = Registry::new();
    let root = dir.path().join("main.journal");
    match load(&FileSystemLoader, &registry, &root) {
        Err(Error::DuplicateInclude { path }) => {
            assert_eq!(path.file_name(), Some(OsStr::new("main.journal")));
        }
        other => panic!("unexpected result {:?}", other.map(|j| j.len())),
    }
}

#[test]
fn a_failing_include_stops_its_siblings() {
    init_tracing();
    let mut large = String::new();
    for i in 0..2000 {
        large.push_str(&format!("2020-01-01 open Assets:Account{}\n", i));
    }
    let loader = MemoryLoader::new()
        .with(
            "main.journal",
            "include \"large.journal\"\ninclude \"broken.journal\"\n",
        )
        .with("large.journal", large)
        .with("broken.journal", "2020-01-01 opne Assets:Cash\n");
    let registry = Registry::new();
    match load(&loader, &registry, Path::new("main.journal")) {
        Err(Error::Syntax { path, .. }) => assert_eq!(path, PathBuf::from("broken.journal")),
        other => panic!("unexpected result {:?}", other.map(|j| j.len())),
    }
}
