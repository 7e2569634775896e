//! Report options
//!
//! Options come from an init file in the ledger style: one `--option value` per
//! line, with comments starting with `;`, `#`, `!` or `%`.
use chrono::NaiveDate;
use lazy_static::lazy_static;
use regex::Regex;
use std::fs::read_to_string;
use std::path::PathBuf;

use crate::mapper::ShortenRule;
use crate::models::Interval;
use crate::Error;

#[derive(Debug, Clone, Default)]
pub struct Config {
    /// The root journal file
    pub journal: PathBuf,
    /// Commodity to value everything in
    pub valuation: Option<String>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub interval: Interval,
    /// Only report the last periods, all of them if zero
    pub last: usize,
    /// Close income and expenses into retained earnings at every period start
    pub close: bool,
    /// Report changes instead of balances
    pub diff: bool,
    pub accounts: Vec<Regex>,
    pub commodities: Vec<Regex>,
    pub shorten: Vec<ShortenRule>,
}

impl Config {
    /// Reads the options from the text of an init file
    pub fn from_init_file(text: &str) -> Result<Config, Error> {
        let mut config = Config::default();
        for (index, line) in text.lines().enumerate() {
            let line_number = index + 1;
            let line = line.trim();
            match line.chars().next() {
                None | Some(';') | Some('#') | Some('!') | Some('%') => continue,
                Some('-') => {
                    let (option, value) = match line.split_once(char::is_whitespace) {
                        Some((option, value)) => (option, value.trim()),
                        None => (line, ""),
                    };
                    config.set(option, value, line_number)?;
                }
                Some(_) => {
                    return Err(Error::Config {
                        line: line_number,
                        message: format!("expected an option, got `{}`", line),
                    })
                }
            }
        }
        Ok(config)
    }

    /// Reads an init file; a relative journal path is taken relative to the
    /// init file
    pub fn load(path: &str) -> Result<Config, Error> {
        let path = expand(path);
        let text = read_to_string(&path).map_err(|e| Error::Config {
            line: 0,
            message: format!("cannot read {}: {}", path.display(), e),
        })?;
        let mut config = Config::from_init_file(&text)?;
        if config.journal.is_relative() {
            if let Some(dir) = path.parent() {
                config.journal = dir.join(&config.journal);
            }
        }
        tracing::debug!("loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Applies one option; `line` is only used for error messages
    pub fn set(&mut self, option: &str, value: &str, line: usize) -> Result<(), Error> {
        let invalid = |message: String| Error::Config { line, message };
        let required = || {
            if value.is_empty() {
                Err(invalid(format!("option {} needs a value", option)))
            } else {
                Ok(value)
            }
        };
        let regex = |value: &str| {
            Regex::new(value).map_err(|e| invalid(format!("invalid regex `{}`: {}", value, e)))
        };
        match option {
            "--file" | "-f" => self.journal = expand(required()?),
            "--exchange" | "-X" => self.valuation = Some(required()?.to_string()),
            "--begin" | "-b" => self.from = Some(date_parser(required()?).map_err(|_| {
                invalid(format!("invalid date `{}`", value))
            })?),
            "--end" | "-e" => self.to = Some(date_parser(required()?).map_err(|_| {
                invalid(format!("invalid date `{}`", value))
            })?),
            "--interval" => {
                self.interval = required()?
                    .parse()
                    .map_err(|_| invalid(format!("invalid interval `{}`", value)))?
            }
            "--daily" => self.interval = Interval::Daily,
            "--weekly" => self.interval = Interval::Weekly,
            "--monthly" => self.interval = Interval::Monthly,
            "--quarterly" => self.interval = Interval::Quarterly,
            "--yearly" => self.interval = Interval::Yearly,
            "--last" => {
                self.last = required()?
                    .parse()
                    .map_err(|_| invalid(format!("invalid number `{}`", value)))?
            }
            "--close" => self.close = true,
            "--diff" => self.diff = true,
            "--account" => self.accounts.push(regex(required()?)?),
            "--commodity" => self.commodities.push(regex(required()?)?),
            "--shorten" => {
                let rule = ShortenRule::parse(required()?).map_err(|e| match e {
                    Error::Config { message, .. } => invalid(message),
                    other => other,
                })?;
                self.shorten.push(rule)
            }
            _ => return Err(invalid(format!("unknown option {}", option))),
        }
        Ok(())
    }
}

fn expand(path: &str) -> PathBuf {
    PathBuf::from(shellexpand::tilde(path).into_owned())
}

/// Parses `YYYY-MM-DD`, `YYYY-MM` (first of the month) and `YYYY` (first of
/// the year); `/` works as a separator too
pub fn date_parser(date: &str) -> Result<NaiveDate, Error> {
    lazy_static! {
        static ref RE_DATE: Regex = Regex::new(r"^(\d{4})[/-](\d\d?)[/-](\d\d?)$").unwrap();
        static ref RE_MONTH: Regex = Regex::new(r"^(\d{4})[/-](\d\d?)$").unwrap();
        static ref RE_YEAR: Regex = Regex::new(r"^(\d{4})$").unwrap();
    }
    let invalid = || Error::Config {
        line: 0,
        message: format!("invalid date `{}`", date),
    };
    let date = date.trim();
    let captures = RE_DATE
        .captures(date)
        .or_else(|| RE_MONTH.captures(date))
        .or_else(|| RE_YEAR.captures(date))
        .ok_or_else(invalid)?;
    let number = |i: usize| -> Result<u32, Error> {
        match captures.get(i) {
            Some(m) => m.as_str().parse::<u32>().map_err(|_| invalid()),
            None => Ok(1),
        }
    };
    let year = number(1)? as i32;
    NaiveDate::from_ymd_opt(year, number(2)?, number(3)?).ok_or_else(invalid)
}
