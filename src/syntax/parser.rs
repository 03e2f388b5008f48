use std::{
    path::{Path, PathBuf},
    rc::Rc,
};

use chrono::NaiveDate;
use log::warn;

use crate::model::{
    entities::{Commodity, CommodityFormat, CommodityType, Location, Lot, Posting, Transaction, Value},
    journal::Journal,
    registry::Registry,
};

use super::{
    error::SyntaxError,
    scanner::{field, tidy, RawAmount, Scan, Scanner},
};

/// Assembles transactions and directives from the lines of one file.
pub struct Parser<'a> {
    scanner: Scanner<'a>,
    registry: &'a Registry,
    journal: Journal,
    transactions: Vec<Transaction>,
}

impl<'a> Parser<'a> {
    pub fn new(
        file: Rc<str>,
        source: &'a [u8],
        journal: Journal,
        registry: &'a Registry,
    ) -> Parser<'a> {
        Parser {
            scanner: Scanner::new(file, source),
            registry,
            journal,
            transactions: Vec::new(),
        }
    }

    /// Reads the whole file. Bad lines are recorded in the journal's errors
    /// and skipped. `stack` holds the canonical paths of the files being read.
    pub fn parse(mut self, stack: &mut Vec<PathBuf>) -> (Journal, Vec<Transaction>) {
        while let Some(line) = self.scanner.next_line() {
            let (line, empty, _) = tidy(line);
            if empty {
                continue;
            }
            match self.parse_transaction(line) {
                Ok(Some(tx)) => {
                    self.transactions.push(tx);
                    continue;
                }
                Ok(None) => (),
                Err(e) => {
                    self.journal.errors.push(e);
                    continue;
                }
            }
            match self.parse_directive(line, stack) {
                Ok(true) => (),
                Ok(false) => {
                    let e = self
                        .scanner
                        .error(format!("skipped line: '{}'", String::from_utf8_lossy(line)));
                    self.journal.errors.push(e);
                }
                Err(e) => self.journal.errors.push(e),
            }
        }
        (self.journal, self.transactions)
    }

    /// `None` if the line does not start with a date.
    fn parse_transaction(&mut self, line: &'a [u8]) -> Result<Option<Transaction>, SyntaxError> {
        let row = self.scanner.row();
        let (date, tail) = match self.scanner.date(line) {
            Scan::Matched(date, tail) => (date, tail),
            Scan::NoMatch(_) => return Ok(None),
            Scan::Error(e) => return Err(e),
        };
        let (pending, tail) = field!(self.scanner.pending(tail), false);
        let (code, tail) = field!(self.scanner.code(tail).map(Some), None);
        let ((description, tags), _) = field!(self.scanner.description(tail), Default::default());

        let mut tx = Transaction::new(date, &description);
        tx.loc = Some(Location {
            file: self.scanner.file.clone(),
            row,
        });
        tx.pending = pending;
        tx.code = code;
        tx.tags = tags;

        while let Some(line) = self.scanner.next_line() {
            let (line, empty, had_comment) = tidy(line);
            if empty {
                if had_comment {
                    continue;
                }
                break;
            }
            let posting = self.parse_posting(line, date)?;
            tx.postings.push(posting);
        }
        Ok(Some(tx))
    }

    fn parse_posting(&mut self, line: &'a [u8], date: NaiveDate) -> Result<Posting, SyntaxError> {
        let (_, tail) = field!(self.scanner.indent(line), ());
        let (account, tail) = field!(self.scanner.account(tail), String::new());
        let (negative, tail) = field!(self.scanner.negation(tail), false);
        let mut posting = Posting::new(
            &self.journal.resolve_alias(&account),
            Lot {
                date: Some(date),
                ..Default::default()
            },
        );
        if tail.is_empty() {
            return Ok(posting);
        }

        let (amount, tail) = field!(self.scanner.amount(tail), RawAmount::default());
        let lot = &mut posting.lot;
        lot.commodity = self.resolve_commodity(&amount);
        lot.amount = if negative { -amount.value } else { amount.value };

        let (price, tail) = field!(self.scanner.price(tail).map(Some), None);
        if let Some(price) = price {
            let commodity = self.resolve_commodity(&price.amount);
            let mut unit = price.amount.value;
            if price.total && !lot.amount.is_zero() {
                unit = unit
                    .checked_div(lot.amount.abs())
                    .ok_or_else(|| self.scanner.error("unit value out of range"))?;
            }
            lot.unit_value = Value::new(unit, commodity);
        }

        if !tail.is_empty() {
            warn!(
                "{}",
                self.scanner.error(format!(
                    "unexpected tokens after transaction posting: '{}'",
                    String::from_utf8_lossy(tail)
                ))
            );
        }
        Ok(posting)
    }

    /// Quoted codes are non-fungible, other codes are currencies or stocks.
    /// Without a code the symbols decide; a lookup failure is recorded and
    /// the journal's default currency used.
    fn resolve_commodity(&mut self, amount: &RawAmount) -> Commodity {
        if let Some(label) = unquote(&amount.code) {
            return Commodity::new(CommodityType::Other, label);
        }
        if !amount.code.is_empty() {
            return self.registry.commodity(&amount.code);
        }
        let format = CommodityFormat::new(&amount.prefix, "", &amount.decimal, &amount.postfix);
        match self
            .registry
            .find_currency(&format, &self.journal.default_currency)
        {
            Ok(commodity) => commodity,
            Err(e) => {
                let fallback = e
                    .fallback()
                    .cloned()
                    .unwrap_or_else(|| self.journal.default_currency.clone());
                self.journal.errors.push(self.scanner.error(e.to_string()));
                fallback
            }
        }
    }

    /// `Ok(false)` if the line is not a known directive.
    fn parse_directive(
        &mut self,
        line: &'a [u8],
        stack: &mut Vec<PathBuf>,
    ) -> Result<bool, SyntaxError> {
        let (keyword, arg) = match line.iter().position(u8::is_ascii_whitespace) {
            Some(i) => (&line[..i], line[i..].trim_ascii()),
            None => (line, &line[line.len()..]),
        };
        match keyword {
            b"include" => self.include(arg, stack)?,
            b"alias" => self.alias(arg)?,
            b"D" => self.default_commodity(arg)?,
            _ => return Ok(false),
        }
        Ok(true)
    }

    /// Parses the included file in place. Its transactions and diagnostics
    /// join this file's.
    fn include(&mut self, arg: &[u8], stack: &mut Vec<PathBuf>) -> Result<(), SyntaxError> {
        if arg.is_empty() {
            return Err(self.scanner.error("missing include path"));
        }
        let target = PathBuf::from(String::from_utf8_lossy(arg).as_ref());
        let path = if target.is_absolute() {
            target
        } else {
            self.journal
                .path
                .parent()
                .unwrap_or(Path::new(""))
                .join(target)
        };
        let mut inherited = Journal::new(
            path.clone(),
            self.journal.default_currency.clone(),
            &self.journal.decimal,
        );
        inherited.aliases = self.journal.aliases.clone();

        let (mut sub, txs) = super::load(&path, inherited, self.registry, stack)
            .map_err(|e| self.scanner.error(e.to_string()))?;
        self.journal.errors.extend(std::mem::take(&mut sub.errors));
        self.transactions.extend(txs);
        self.journal.includes.push(sub);
        Ok(())
    }

    /// `alias from = to`
    fn alias(&mut self, arg: &[u8]) -> Result<(), SyntaxError> {
        let arg = String::from_utf8_lossy(arg);
        match arg.split_once('=') {
            Some((from, to)) if !from.trim().is_empty() && !to.trim().is_empty() => {
                self.journal
                    .aliases
                    .insert(from.trim().to_string(), to.trim().to_string());
                Ok(())
            }
            _ => Err(self.scanner.error(format!("bad alias directive: '{arg}'"))),
        }
    }

    /// `D amount`: sets the default currency for the rest of the file.
    fn default_commodity(&mut self, arg: &'a [u8]) -> Result<(), SyntaxError> {
        let (amount, _) = field!(self.scanner.amount(arg), RawAmount::default());
        let commodity = self.resolve_commodity(&amount);
        let Some(format) = self.registry.format(&commodity.code) else {
            return Err(self.scanner.error(format!(
                "default commodity must be a currency: '{}'",
                commodity.code
            )));
        };
        self.journal.decimal = format.decimal.clone();
        self.journal.default_currency = commodity;
        Ok(())
    }
}

fn unquote(code: &str) -> Option<&str> {
    code.strip_prefix('"')
        .and_then(|c| c.strip_suffix('"'))
        .or_else(|| code.strip_prefix('\'').and_then(|c| c.strip_suffix('\'')))
        .filter(|c| !c.is_empty())
}
