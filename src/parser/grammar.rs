//! Recursive-descent parser for the journal language
//!
//! Each `parse_*` method reads one grammar element starting at the cursor and returns
//! it with its byte range. On failure the error is wrapped into a context describing
//! what was being parsed, so the final error reads from the file level down to the
//! offending character.

use super::scanner::Scanner;
use super::syntax::*;

const INTERVALS: [&str; 6] = ["once", "daily", "weekly", "monthly", "quarterly", "yearly"];
const WANT_INTERVAL: &str =
    "one of {`once`, `daily`, `weekly`, `monthly`, `quarterly`, `yearly`}";
const WANT_ADDON: &str = "one of {`@performance`, `@accrue`}";
const WANT_COMMENT: &str = "one of {`*`, `//`, `#`}";
const WANT_DIRECTIVE: &str = "one of {`\"`, `open`, `close`, `price`, `balance`}";

fn is_whitespace(c: char) -> bool {
    c == ' ' || c == '\t' || c == '\r'
}

fn is_digit(c: char) -> bool {
    c.is_ascii_digit()
}

fn is_alphanumeric(c: char) -> bool {
    c.is_alphanumeric()
}

fn starts_booking(c: char) -> bool {
    c.is_alphanumeric() || c == '$'
}

pub struct Parser<'a> {
    path: &'a str,
    scanner: Scanner<'a>,
}

impl<'a> Parser<'a> {
    pub fn new(text: &'a str, path: &'a str) -> Parser<'a> {
        Parser {
            path,
            scanner: Scanner::new(text),
        }
    }

    fn wrap<T>(
        &mut self,
        start: usize,
        context: &str,
        parse: impl FnOnce(&mut Self) -> Result<T, Error>,
    ) -> Result<T, Error> {
        parse(self).map_err(|e| Error::wrap(context, self.scanner.range_from(start), e))
    }

    /// Parses the whole text
    ///
    /// On failure the returned [`PartialFile`] still holds every directive read
    /// before the error.
    pub fn parse_file(mut self) -> Result<File, PartialFile> {
        let mut file = File {
            path: self.path.to_string(),
            text: self.scanner.text().to_string(),
            ..File::default()
        };
        let result = self.parse_directives(&mut file.directives);
        file.range = self.scanner.range_from(0);
        tracing::trace!("stopped at line {} of {}", self.scanner.location().line, self.path);
        match result {
            Ok(()) => Ok(file),
            Err(e) => {
                let error = Error::wrap(format!("while parsing file `{}`", self.path), file.range, e);
                Err(PartialFile { file, error })
            }
        }
    }

    fn parse_directives(&mut self, directives: &mut Vec<Directive>) -> Result<(), Error> {
        while let Some(c) = self.scanner.current() {
            match c {
                '*' | '/' | '#' => {
                    self.read_comment()?;
                }
                c if is_whitespace(c) || c == '\n' => {}
                _ => directives.push(self.parse_directive()?),
            }
            self.read_rest_of_whitespace_line()?;
        }
        Ok(())
    }

    pub fn parse_directive(&mut self) -> Result<Directive, Error> {
        let start = self.scanner.offset();
        self.wrap(start, "while parsing directive", |p| {
            let kind = p.parse_directive_kind(start)?;
            Ok(Directive {
                range: p.scanner.range_from(start),
                kind,
            })
        })
    }

    fn parse_directive_kind(&mut self, start: usize) -> Result<DirectiveKind, Error> {
        if self.scanner.current() == Some('i') {
            return self.parse_include().map(DirectiveKind::Include);
        }
        let addons = match self.scanner.current() {
            Some('@') => Some(self.parse_addons()?),
            _ => None,
        };
        let date = self.parse_date()?;
        self.read_whitespace1()?;
        if addons.is_some() {
            return self
                .parse_transaction(start, date, addons)
                .map(DirectiveKind::Transaction);
        }
        match self.scanner.current() {
            Some('"') => self
                .parse_transaction(start, date, None)
                .map(DirectiveKind::Transaction),
            Some('o') => self.parse_open(start, date).map(DirectiveKind::Open),
            Some('c') => self.parse_close(start, date).map(DirectiveKind::Close),
            Some('p') => self.parse_price(start, date).map(DirectiveKind::Price),
            Some('b') => self.parse_assertion(start, date).map(DirectiveKind::Assertion),
            _ => Err(self.scanner.unexpected(WANT_DIRECTIVE)),
        }
    }

    pub fn parse_transaction(
        &mut self,
        start: usize,
        date: Date,
        addons: Option<Addons>,
    ) -> Result<Transaction, Error> {
        self.wrap(start, "while parsing transaction", |p| {
            let description = p.parse_quoted_string()?;
            let tags = p.parse_tags()?;
            p.read_rest_of_whitespace_line()?;
            let mut bookings = Vec::new();
            while p.scanner.current().map_or(false, starts_booking) {
                bookings.push(p.parse_booking()?);
                p.read_rest_of_whitespace_line()?;
            }
            Ok(Transaction {
                range: p.scanner.range_from(start),
                addons,
                date,
                description,
                tags,
                bookings,
            })
        })
    }

    fn parse_tags(&mut self) -> Result<Vec<Tag>, Error> {
        let mut tags = Vec::new();
        while self.scanner.peek_past(is_whitespace) == Some('#') {
            self.scanner.read_while(is_whitespace);
            let start = self.scanner.offset();
            let tag = self.wrap(start, "while parsing tag", |p| {
                p.scanner.read_char('#')?;
                p.scanner.read_char_with("a letter or a digit", is_alphanumeric)?;
                p.scanner.read_while(is_alphanumeric);
                Ok(Tag {
                    range: p.scanner.range_from(start),
                })
            })?;
            tags.push(tag);
        }
        Ok(tags)
    }

    pub fn parse_addons(&mut self) -> Result<Addons, Error> {
        let start = self.scanner.offset();
        self.wrap(start, "while parsing addons", |p| {
            let mut addons = Addons::default();
            loop {
                let pos = p.scanner.offset();
                if p.scanner.rest().starts_with("@performance") {
                    p.scanner.read_string("@performance")?;
                    if addons.performance.is_some() {
                        return Err(Error::new(
                            ErrorKind::Duplicate("performance annotation"),
                            p.scanner.range_from(pos),
                        ));
                    }
                    let mut performance = p.parse_performance()?;
                    performance.range.start = pos;
                    addons.performance = Some(performance);
                } else if p.scanner.rest().starts_with("@accrue") {
                    p.scanner.read_string("@accrue")?;
                    if addons.accrual.is_some() {
                        return Err(Error::new(
                            ErrorKind::Duplicate("accrue annotation"),
                            p.scanner.range_from(pos),
                        ));
                    }
                    let mut accrual = p.parse_accrual()?;
                    accrual.range.start = pos;
                    addons.accrual = Some(accrual);
                } else {
                    return Err(p.scanner.unexpected_input(WANT_ADDON));
                }
                p.read_rest_of_whitespace_line()?;
                if p.scanner.current() != Some('@') {
                    break;
                }
            }
            addons.range = p.scanner.range_from(start);
            Ok(addons)
        })
    }

    /// Parses `(<commodity>, ...)`; the list may be empty
    pub fn parse_performance(&mut self) -> Result<Performance, Error> {
        let start = self.scanner.offset();
        self.wrap(start, "while parsing performance", |p| p.parse_commodity_list())
    }

    fn parse_commodity_list(&mut self) -> Result<Performance, Error> {
        let start = self.scanner.offset();
        self.scanner.read_char('(')?;
        self.scanner.read_while(is_whitespace);
        let mut targets = Vec::new();
        while self.scanner.current() != Some(')') {
            if !targets.is_empty() {
                self.scanner.read_char(',')?;
                self.scanner.read_while(is_whitespace);
            }
            targets.push(self.parse_commodity()?);
            self.scanner.read_while(is_whitespace);
        }
        self.scanner.read_char(')')?;
        Ok(Performance {
            range: self.scanner.range_from(start),
            targets,
        })
    }

    /// Parses the arguments of `@accrue`: interval, start date, end date and account
    pub fn parse_accrual(&mut self) -> Result<Accrual, Error> {
        let start = self.scanner.offset();
        self.wrap(start, "while parsing accrual", |p| {
            p.read_whitespace1()?;
            let interval = p.parse_interval()?;
            p.read_whitespace1()?;
            let period_start = p.parse_date()?;
            p.read_whitespace1()?;
            let period_end = p.parse_date()?;
            p.read_whitespace1()?;
            let account = p.parse_account()?;
            Ok(Accrual {
                range: p.scanner.range_from(start),
                interval,
                start: period_start,
                end: period_end,
                account,
            })
        })
    }

    pub fn parse_interval(&mut self) -> Result<Interval, Error> {
        let start = self.scanner.offset();
        self.wrap(start, "while parsing interval", |p| {
            let word = p.scanner.read_while(char::is_alphabetic);
            if word.is_empty() {
                return Err(p.scanner.unexpected(WANT_INTERVAL));
            }
            if !INTERVALS.contains(&word.extract(p.scanner.text())) {
                return Err(Error::new(
                    ErrorKind::UnexpectedInput {
                        want: WANT_INTERVAL.to_string(),
                    },
                    word,
                ));
            }
            Ok(Interval { range: word })
        })
    }

    pub fn parse_booking(&mut self) -> Result<Booking, Error> {
        let start = self.scanner.offset();
        self.wrap(start, "while parsing booking", |p| {
            let credit = p.parse_account()?;
            p.read_space1()?;
            let debit = p.parse_account()?;
            p.read_space1()?;
            let amount = p.parse_decimal()?;
            p.read_space1()?;
            let commodity = p.parse_commodity()?;
            let mut booking = Booking {
                credit,
                debit,
                amount,
                commodity,
                ..Booking::default()
            };
            loop {
                match p.scanner.peek_past(is_whitespace) {
                    Some('{') => {
                        p.scanner.read_while(is_whitespace);
                        if booking.lot.is_some() {
                            return Err(Error::new(
                                ErrorKind::Duplicate("lot"),
                                p.scanner.range_from(p.scanner.offset()),
                            ));
                        }
                        booking.lot = Some(p.parse_lot()?);
                    }
                    Some('(') => {
                        p.scanner.read_while(is_whitespace);
                        if booking.targets.is_some() {
                            return Err(Error::new(
                                ErrorKind::Duplicate("target commodities"),
                                p.scanner.range_from(p.scanner.offset()),
                            ));
                        }
                        let targets_start = p.scanner.offset();
                        booking.targets = Some(p.wrap(
                            targets_start,
                            "while parsing targets",
                            |p| p.parse_commodity_list(),
                        )?);
                    }
                    _ => break,
                }
            }
            booking.range = p.scanner.range_from(start);
            Ok(booking)
        })
    }

    pub fn parse_lot(&mut self) -> Result<Lot, Error> {
        let start = self.scanner.offset();
        self.wrap(start, "while parsing lot", |p| {
            p.scanner.read_char('{')?;
            p.scanner.read_while(is_whitespace);
            let price = p.parse_decimal()?;
            p.read_space1()?;
            let commodity = p.parse_commodity()?;
            let mut lot = Lot {
                price,
                commodity,
                ..Lot::default()
            };
            loop {
                p.scanner.read_while(is_whitespace);
                if p.scanner.current() != Some(',') {
                    break;
                }
                p.scanner.advance();
                p.scanner.read_while(is_whitespace);
                let pos = p.scanner.offset();
                match p.scanner.current() {
                    Some('"') if lot.label.is_none() => lot.label = Some(p.parse_quoted_string()?),
                    Some(c) if is_digit(c) && lot.date.is_none() => lot.date = Some(p.parse_date()?),
                    Some('"') => {
                        return Err(Error::new(ErrorKind::Duplicate("lot label"), Range::at(pos)))
                    }
                    Some(c) if is_digit(c) => {
                        return Err(Error::new(ErrorKind::Duplicate("lot date"), Range::at(pos)))
                    }
                    _ => return Err(p.scanner.unexpected("a quoted label or a date")),
                }
            }
            p.scanner.read_char('}')?;
            lot.range = p.scanner.range_from(start);
            Ok(lot)
        })
    }

    pub fn parse_account(&mut self) -> Result<Account, Error> {
        let start = self.scanner.offset();
        self.wrap(start, "while parsing account", |p| {
            if p.scanner.current() == Some('$') {
                p.scanner.advance();
                p.scanner.read_char_with("a letter", char::is_alphabetic)?;
                p.scanner.read_while(char::is_alphabetic);
                return Ok(Account {
                    range: p.scanner.range_from(start),
                    is_macro: true,
                });
            }
            loop {
                p.scanner.read_char_with("a letter or a digit", is_alphanumeric)?;
                p.scanner.read_while(is_alphanumeric);
                if p.scanner.current() != Some(':') {
                    break;
                }
                p.scanner.advance();
            }
            Ok(Account {
                range: p.scanner.range_from(start),
                is_macro: false,
            })
        })
    }

    pub fn parse_commodity(&mut self) -> Result<Commodity, Error> {
        let start = self.scanner.offset();
        self.wrap(start, "while parsing commodity", |p| {
            p.scanner.read_char_with("a letter or a digit", is_alphanumeric)?;
            p.scanner.read_while(is_alphanumeric);
            Ok(Commodity {
                range: p.scanner.range_from(start),
            })
        })
    }

    pub fn parse_decimal(&mut self) -> Result<Decimal, Error> {
        let start = self.scanner.offset();
        self.wrap(start, "while parsing decimal", |p| {
            if p.scanner.current() == Some('-') {
                p.scanner.advance();
            }
            p.scanner.read_char_with("a digit", is_digit)?;
            p.scanner.read_while(is_digit);
            if p.scanner.current() == Some('.') {
                p.scanner.advance();
                p.scanner.read_char_with("a digit", is_digit)?;
                p.scanner.read_while(is_digit);
            }
            Ok(Decimal {
                range: p.scanner.range_from(start),
            })
        })
    }

    pub fn parse_date(&mut self) -> Result<Date, Error> {
        let start = self.scanner.offset();
        self.wrap(start, "while parsing the date", |p| {
            for (i, digits) in [4, 2, 2].into_iter().enumerate() {
                if i > 0 {
                    p.scanner.read_char('-')?;
                }
                for _ in 0..digits {
                    p.scanner.read_char_with("a digit", is_digit)?;
                }
            }
            Ok(Date {
                range: p.scanner.range_from(start),
            })
        })
    }

    pub fn parse_quoted_string(&mut self) -> Result<QuotedString, Error> {
        let start = self.scanner.offset();
        self.wrap(start, "while parsing quoted string", |p| {
            p.scanner.read_char('"')?;
            let content = p.scanner.read_while(|c| c != '"');
            p.scanner.read_char('"')?;
            Ok(QuotedString {
                range: p.scanner.range_from(start),
                content,
            })
        })
    }

    pub fn parse_include(&mut self) -> Result<Include, Error> {
        let start = self.scanner.offset();
        self.wrap(start, "while parsing `include` statement", |p| {
            p.scanner.read_string("include")?;
            p.read_whitespace1()?;
            let path = p.parse_quoted_string()?;
            Ok(Include {
                range: p.scanner.range_from(start),
                path,
            })
        })
    }

    fn parse_open(&mut self, start: usize, date: Date) -> Result<Open, Error> {
        self.wrap(start, "while parsing `open` directive", |p| {
            p.scanner.read_string("open")?;
            p.read_whitespace1()?;
            let account = p.parse_account()?;
            Ok(Open {
                range: p.scanner.range_from(start),
                date,
                account,
            })
        })
    }

    fn parse_close(&mut self, start: usize, date: Date) -> Result<Close, Error> {
        self.wrap(start, "while parsing `close` directive", |p| {
            p.scanner.read_string("close")?;
            p.read_whitespace1()?;
            let account = p.parse_account()?;
            Ok(Close {
                range: p.scanner.range_from(start),
                date,
                account,
            })
        })
    }

    fn parse_price(&mut self, start: usize, date: Date) -> Result<Price, Error> {
        self.wrap(start, "while parsing `price` directive", |p| {
            p.scanner.read_string("price")?;
            p.read_whitespace1()?;
            let commodity = p.parse_commodity()?;
            p.read_whitespace1()?;
            let price = p.parse_decimal()?;
            p.read_whitespace1()?;
            let target = p.parse_commodity()?;
            Ok(Price {
                range: p.scanner.range_from(start),
                date,
                commodity,
                price,
                target,
            })
        })
    }

    fn parse_assertion(&mut self, start: usize, date: Date) -> Result<Assertion, Error> {
        self.wrap(start, "while parsing `balance` directive", |p| {
            p.scanner.read_string("balance")?;
            p.read_whitespace1()?;
            let account = p.parse_account()?;
            p.read_whitespace1()?;
            let amount = p.parse_decimal()?;
            p.read_whitespace1()?;
            let commodity = p.parse_commodity()?;
            Ok(Assertion {
                range: p.scanner.range_from(start),
                date,
                account,
                amount,
                commodity,
            })
        })
    }

    /// Reads a comment up to, but excluding, the end of the line
    pub fn read_comment(&mut self) -> Result<Range, Error> {
        let start = self.scanner.offset();
        let rest = self.scanner.rest();
        let marker = if rest.starts_with("//") {
            2
        } else if rest.starts_with('*') || rest.starts_with('#') {
            1
        } else {
            return Err(Error::wrap(
                "while reading comment",
                Range::at(start),
                self.scanner.unexpected_input(WANT_COMMENT),
            ));
        };
        self.scanner.read_n(marker)?;
        self.scanner.read_while(|c| c != '\n');
        Ok(self.scanner.range_from(start))
    }

    /// Reads trailing whitespace and the newline ending the line; the end of the
    /// text also ends a line
    pub fn read_rest_of_whitespace_line(&mut self) -> Result<Range, Error> {
        let start = self.scanner.offset();
        self.scanner.read_while(is_whitespace);
        if self.scanner.current().is_some() {
            if let Err(e) = self.scanner.read_char('\n') {
                return Err(Error::wrap(
                    "while reading the rest of the line",
                    self.scanner.range_from(start),
                    e,
                ));
            }
        }
        Ok(self.scanner.range_from(start))
    }

    /// Reads whitespace; at least one character is required unless the line or the
    /// text ends here
    pub fn read_whitespace1(&mut self) -> Result<Range, Error> {
        match self.scanner.current() {
            None | Some('\n') => Ok(self.scanner.range_from(self.scanner.offset())),
            Some(c) if is_whitespace(c) => Ok(self.scanner.read_while(is_whitespace)),
            Some(_) => Err(self.scanner.unexpected("whitespace or a newline")),
        }
    }

    /// Reads at least one whitespace character, newlines excluded
    fn read_space1(&mut self) -> Result<Range, Error> {
        let start = self.scanner.offset();
        self.scanner.read_char_with("whitespace", is_whitespace)?;
        self.scanner.read_while(is_whitespace);
        Ok(self.scanner.range_from(start))
    }
}
