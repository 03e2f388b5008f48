use std::{fmt::Display, rc::Rc};

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;

#[derive(Debug, Clone, Copy, Default, Hash, PartialEq, Eq, Ord, PartialOrd, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CommodityType {
    /// Fungible, with a known display format.
    #[default]
    Currency,
    /// Fungible, format unknown (tickers and the like).
    Stock,
    /// Non-fungible, e.g. a free-text asset label.
    Other,
}

#[derive(Debug, Clone, Default, Hash, PartialEq, Eq, Ord, PartialOrd, Serialize)]
pub struct Commodity {
    #[serde(rename = "type")]
    pub kind: CommodityType,
    pub code: String,
}

impl Commodity {
    pub fn new(kind: CommodityType, code: &str) -> Commodity {
        Commodity {
            kind,
            code: code.into(),
        }
    }

    pub fn currency(code: &str) -> Commodity {
        Self::new(CommodityType::Currency, code)
    }
}

impl Display for Commodity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.code)
    }
}

/// How amounts of a currency are written: `{prefix}1{thousands}000{decimal}00{postfix}`.
#[derive(Debug, Clone, Default, Hash, PartialEq, Eq, Serialize)]
pub struct CommodityFormat {
    pub prefix: String,
    pub thousands: String,
    pub decimal: String,
    pub postfix: String,
}

impl CommodityFormat {
    pub fn new(prefix: &str, thousands: &str, decimal: &str, postfix: &str) -> Self {
        CommodityFormat {
            prefix: prefix.into(),
            thousands: thousands.into(),
            decimal: decimal.into(),
            postfix: postfix.into(),
        }
    }

    /// Prefix and postfix with the padding whitespace stripped, which is
    /// how symbols come out of the field extractors.
    pub fn symbols(&self) -> (&str, &str) {
        (self.prefix.trim(), self.postfix.trim())
    }
}

impl Display for CommodityFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{{prefix: {:?}, thousands: {:?}, decimal: {:?}, postfix: {:?}}}",
            self.prefix, self.thousands, self.decimal, self.postfix
        )
    }
}

/// A per-unit cost or price.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Value {
    pub amount: Decimal,
    pub commodity: Commodity,
}

impl Value {
    pub fn new(amount: Decimal, commodity: Commodity) -> Self {
        Value { amount, commodity }
    }

    pub fn is_zero(&self) -> bool {
        self.amount.is_zero()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Lot {
    /// `None` means the date of the transaction holding the lot.
    pub date: Option<NaiveDate>,
    pub amount: Decimal,
    pub unit_value: Value,
    pub commodity: Commodity,
}

impl Lot {
    pub fn new(amount: Decimal, commodity: Commodity) -> Self {
        Lot {
            amount,
            commodity,
            ..Default::default()
        }
    }

    pub fn with_unit_value(mut self, unit_value: Value) -> Self {
        self.unit_value = unit_value;
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Posting {
    pub account: String,
    pub lot: Lot,
}

impl Posting {
    pub fn new(account: &str, lot: Lot) -> Self {
        Posting {
            account: account.into(),
            lot,
        }
    }
}

/// Where a transaction header was read from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    pub file: Rc<str>,
    pub row: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transaction {
    pub loc: Option<Location>,
    pub date: NaiveDate,
    pub description: String,
    pub code: Option<String>,
    /// In order of first appearance, without duplicates.
    pub tags: Vec<String>,
    pub pending: bool,
    pub postings: Vec<Posting>,
}

impl Transaction {
    pub fn new(date: NaiveDate, description: &str) -> Self {
        Transaction {
            loc: None,
            date,
            description: description.into(),
            code: None,
            tags: Vec::new(),
            pending: false,
            postings: Vec::with_capacity(2),
        }
    }
}
