//! Conversion of the syntax tree into model directives
use chrono::NaiveDate;
use num::rational::BigRational;
use num::Zero;
use std::path::PathBuf;
use std::sync::Arc;

use super::syntax;
use crate::models::quantity::parse_decimal;
use crate::models::{
    Accrual, Account, Assertion, Close, Commodity, Directive, Include, Interval, Lot, Open,
    Period, Posting, Price, Registry, Source, Transaction,
};
use crate::{Error, ModelError};

/// Builds the model directives of a parsed file
///
/// Accounts and commodities are interned in `registry`. The first semantic error,
/// such as a date that does not exist, stops the conversion.
pub fn build(file: &syntax::File, registry: &Registry) -> Result<Vec<Directive>, Error> {
    let builder = Builder {
        path: Arc::new(PathBuf::from(&file.path)),
        text: &file.text,
        registry,
    };
    file.directives
        .iter()
        .map(|directive| builder.directive(directive))
        .collect()
}

struct Builder<'a> {
    path: Arc<PathBuf>,
    text: &'a str,
    registry: &'a Registry,
}

impl<'a> Builder<'a> {
    fn error(&self, range: syntax::Range, error: ModelError) -> Error {
        Error::Model {
            path: self.path.as_ref().clone(),
            range,
            error,
        }
    }

    fn source(&self, range: syntax::Range) -> Source {
        Source {
            path: self.path.clone(),
            start: range.start,
            end: range.end,
        }
    }

    fn directive(&self, directive: &syntax::Directive) -> Result<Directive, Error> {
        let source = self.source(directive.range);
        let result = match &directive.kind {
            syntax::DirectiveKind::Open(open) => Directive::Open(Open {
                source,
                date: self.date(&open.date)?,
                account: self.account(&open.account)?,
            }),
            syntax::DirectiveKind::Close(close) => Directive::Close(Close {
                source,
                date: self.date(&close.date)?,
                account: self.account(&close.account)?,
            }),
            syntax::DirectiveKind::Price(price) => {
                let quote = self.decimal(&price.price)?;
                if quote.is_zero() {
                    return Err(self.error(
                        price.price.range,
                        ModelError::ZeroPrice(price.commodity.extract(self.text).to_string()),
                    ));
                }
                Directive::Price(Price {
                    source,
                    date: self.date(&price.date)?,
                    commodity: self.commodity(&price.commodity),
                    price: quote,
                    target: self.commodity(&price.target),
                })
            }
            syntax::DirectiveKind::Assertion(assertion) => Directive::Assertion(Assertion {
                source,
                date: self.date(&assertion.date)?,
                account: self.account(&assertion.account)?,
                amount: self.decimal(&assertion.amount)?,
                commodity: self.commodity(&assertion.commodity),
            }),
            syntax::DirectiveKind::Transaction(transaction) => {
                Directive::Transaction(self.transaction(source, transaction)?)
            }
            syntax::DirectiveKind::Include(include) => Directive::Include(Include {
                source,
                path: PathBuf::from(include.path.content.extract(self.text)),
            }),
        };
        Ok(result)
    }

    fn transaction(
        &self,
        source: Source,
        transaction: &syntax::Transaction,
    ) -> Result<Transaction, Error> {
        let mut accrual = None;
        let mut targets = None;
        if let Some(addons) = &transaction.addons {
            if let Some(performance) = &addons.performance {
                targets = Some(self.commodities(&performance.targets));
            }
            if let Some(a) = &addons.accrual {
                accrual = Some(self.accrual(a)?);
            }
        }
        let postings = transaction
            .bookings
            .iter()
            .map(|b| self.posting(b))
            .collect::<Result<Vec<Posting>, Error>>()?;
        Ok(Transaction {
            source,
            date: self.date(&transaction.date)?,
            description: transaction.description.content.extract(self.text).to_string(),
            tags: transaction
                .tags
                .iter()
                .map(|t| t.extract(self.text).trim_start_matches('#').to_string())
                .collect(),
            postings,
            accrual,
            targets,
        })
    }

    fn accrual(&self, accrual: &syntax::Accrual) -> Result<Accrual, Error> {
        let interval = accrual
            .interval
            .extract(self.text)
            .parse::<Interval>()
            .map_err(|e| self.error(accrual.interval.range, e))?;
        let start = self.date(&accrual.start)?;
        let end = self.date(&accrual.end)?;
        if start > end {
            return Err(self.error(accrual.range, ModelError::EmptyAccrual { start, end }));
        }
        Ok(Accrual {
            interval,
            period: Period::new(start, end),
            account: self.account(&accrual.account)?,
        })
    }

    fn posting(&self, booking: &syntax::Booking) -> Result<Posting, Error> {
        let lot = match &booking.lot {
            None => None,
            Some(lot) => Some(Lot {
                price: self.decimal(&lot.price)?,
                commodity: self.commodity(&lot.commodity),
                label: lot
                    .label
                    .as_ref()
                    .map(|l| l.content.extract(self.text).to_string()),
                date: lot.date.as_ref().map(|d| self.date(d)).transpose()?,
            }),
        };
        Ok(Posting {
            credit: self.account(&booking.credit)?,
            debit: self.account(&booking.debit)?,
            commodity: self.commodity(&booking.commodity),
            quantity: self.decimal(&booking.amount)?,
            lot,
            targets: booking
                .targets
                .as_ref()
                .map(|t| self.commodities(&t.targets)),
        })
    }

    fn date(&self, date: &syntax::Date) -> Result<NaiveDate, Error> {
        let text = date.extract(self.text);
        NaiveDate::parse_from_str(text, "%Y-%m-%d")
            .map_err(|_| self.error(date.range, ModelError::InvalidDate(text.to_string())))
    }

    fn decimal(&self, decimal: &syntax::Decimal) -> Result<BigRational, Error> {
        let text = decimal.extract(self.text);
        parse_decimal(text)
            .ok_or_else(|| self.error(decimal.range, ModelError::InvalidDecimal(text.to_string())))
    }

    fn account(&self, account: &syntax::Account) -> Result<Arc<Account>, Error> {
        let name = account.extract(self.text);
        if account.is_macro {
            return Err(self.error(
                account.range,
                ModelError::UnresolvedMacro(name.to_string()),
            ));
        }
        self.registry
            .account(name)
            .map_err(|e| self.error(account.range, e))
    }

    fn commodity(&self, commodity: &syntax::Commodity) -> Arc<Commodity> {
        self.registry.commodity(commodity.extract(self.text))
    }

    fn commodities(&self, commodities: &[syntax::Commodity]) -> Vec<Arc<Commodity>> {
        commodities.iter().map(|c| self.commodity(c)).collect()
    }
}
