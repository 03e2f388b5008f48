use std::{
    fmt::Write as _,
    fs::{File, OpenOptions},
    io::{self, Read, Seek, SeekFrom, Write},
};

use log::info;
use rust_decimal::{Decimal, RoundingStrategy};

use crate::model::{
    entities::{Commodity, CommodityType, Transaction},
    journal::Journal,
    registry::Registry,
};

/// Appends `transactions` to the journal's file, which must exist.
pub fn append_transactions(
    journal: &Journal,
    transactions: &[Transaction],
    registry: &Registry,
) -> io::Result<()> {
    let mut file = OpenOptions::new()
        .read(true)
        .append(true)
        .open(&journal.path)?;
    let separator = separator(&mut file)?;
    file.write_all(separator.as_bytes())?;
    for tx in transactions {
        file.write_all(write_transaction(tx, registry).as_bytes())?;
    }
    file.flush()?;
    info!(
        "appended {} transactions to {}",
        transactions.len(),
        journal.path.display()
    );
    Ok(())
}

/// Newlines needed so that appended text starts after exactly one blank line.
fn separator(file: &mut File) -> io::Result<&'static str> {
    let len = file.metadata()?.len();
    if len == 0 {
        return Ok("");
    }
    let n = len.min(4);
    file.seek(SeekFrom::End(-(n as i64)))?;
    let mut buf = [0u8; 4];
    let tail = &mut buf[..n as usize];
    file.read_exact(tail)?;
    let newlines = tail
        .iter()
        .rev()
        .filter(|&&b| b != b'\r')
        .take_while(|&&b| b == b'\n')
        .take(2)
        .count();
    Ok(["\n\n", "\n", ""][newlines])
}

/// Renders a transaction in canonical journal syntax, followed by a blank line.
pub fn write_transaction(tx: &Transaction, registry: &Registry) -> String {
    let mut s = String::with_capacity(64 + 48 * tx.postings.len());
    let _ = write!(s, "{}", tx.date.format("%Y/%m/%d"));
    if tx.pending {
        s.push_str(" !");
    }
    if let Some(code) = &tx.code {
        let _ = write!(s, " ({code})");
    }
    if !tx.description.is_empty() {
        if !tx.pending && tx.code.is_none() {
            s.push(' ');
        }
        s.push(' ');
        s.push_str(&tx.description);
    }
    s.push('\n');

    let account_width = tx
        .postings
        .iter()
        .map(|p| p.account.chars().count())
        .max()
        .unwrap_or_default()
        + 2;
    let amount_width = tx
        .postings
        .iter()
        .map(|p| AmountParts::new(p.lot.amount, &p.lot.commodity, registry).width())
        .max()
        .unwrap_or_default();

    for p in &tx.postings {
        let padding = account_width - p.account.chars().count();
        let _ = write!(
            s,
            "\t{}{}{}",
            p.account,
            " ".repeat(padding),
            format_amount(p.lot.amount, &p.lot.commodity, amount_width, registry)
        );
        let unit = &p.lot.unit_value;
        if !unit.is_zero() {
            let _ = write!(
                s,
                " @ {}",
                format_amount(unit.amount, &unit.commodity, 0, registry)
            );
        }
        s.push('\n');
    }
    s.push('\n');
    s
}

/// Renders an amount with two decimals in the commodity's format.
///
/// With `width == 0` a non-negative amount gets no sign column. Otherwise
/// the amount is right-aligned to `width` characters after the sign.
pub fn format_amount(
    amount: Decimal,
    commodity: &Commodity,
    width: usize,
    registry: &Registry,
) -> String {
    let parts = AmountParts::new(amount, commodity, registry);
    let sign = if parts.negative {
        "- "
    } else if width == 0 {
        ""
    } else {
        "  "
    };
    format!(
        "{sign}{}{}{}{}{}",
        parts.prefix,
        " ".repeat(width.saturating_sub(parts.width())),
        parts.number,
        parts.postfix,
        parts.suffix
    )
}

struct AmountParts<'a> {
    negative: bool,
    prefix: &'a str,
    number: String,
    postfix: &'a str,
    suffix: String,
}

impl<'a> AmountParts<'a> {
    fn new(amount: Decimal, commodity: &'a Commodity, registry: &'a Registry) -> Self {
        let commodity = if commodity.code.is_empty() {
            registry.default_currency()
        } else {
            commodity
        };
        let rounded = amount.round_dp_with_strategy(2, RoundingStrategy::MidpointNearestEven);
        let suffix = match commodity.kind {
            CommodityType::Other => format!(" \"{}\"", commodity.code),
            _ if commodity.code == registry.default_currency().code => String::new(),
            _ => format!(" {}", commodity.code),
        };
        let (prefix, postfix, format) = match registry.format(&commodity.code) {
            Some(f) if commodity.kind == CommodityType::Currency => {
                (f.prefix.as_str(), f.postfix.as_str(), f)
            }
            _ => (
                "",
                "",
                registry.format_or_default(&registry.default_currency().code),
            ),
        };
        AmountParts {
            negative: rounded.is_sign_negative() && !rounded.is_zero(),
            prefix,
            number: group(rounded.abs(), &format.thousands, &format.decimal),
            postfix,
            suffix,
        }
    }

    /// Characters after the sign column.
    fn width(&self) -> usize {
        self.prefix.chars().count()
            + self.number.chars().count()
            + self.postfix.chars().count()
            + self.suffix.chars().count()
    }
}

/// `1234567.5` -> `1,234,567.50`
fn group(mut value: Decimal, thousands: &str, decimal: &str) -> String {
    value.rescale(2);
    let fixed = value.to_string();
    let (int, frac) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));
    let mut res = String::with_capacity(fixed.len() + int.len() / 3 * thousands.len());
    for (i, ch) in int.chars().enumerate() {
        if i > 0 && (int.len() - i) % 3 == 0 {
            res.push_str(thousands);
        }
        res.push(ch);
    }
    res.push_str(if decimal.is_empty() { "." } else { decimal });
    res.push_str(frac);
    res
}
