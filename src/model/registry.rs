use std::collections::HashMap;

use super::{
    entities::{Commodity, CommodityFormat, CommodityType},
    error::ModelError,
};

/// Known currencies and how their amounts are written:
/// (code, prefix, thousands separator, decimal separator, postfix).
const CURRENCIES: &[(&str, &str, &str, &str, &str)] = &[
    ("ARS", "$ ", ".", ",", ""),
    ("AUD", "$ ", ".", ",", ""),
    ("BRL", "R$ ", ".", ",", ""),
    ("CAD", "$ ", ",", ".", ""),
    ("CLP", "$ ", ",", ".", ""),
    ("CNY", "¥ ", ",", ".", ""),
    ("COP", "$ ", ",", ".", ""),
    ("CZK", "", ".", ",", " Kč"),
    ("DKK", "kr. ", ".", ",", ""),
    ("EUR", "€", ".", ",", ""),
    ("HKD", "HK$ ", ",", ".", ""),
    ("HUF", "", ".", ",", " Ft"),
    ("INR", "₹ ", ",", ".", ""),
    ("ILS", "₪ ", ".", ",", ""),
    ("JPY", "¥ ", ",", ".", ""),
    ("KRW", "₩ ", ",", ".", ""),
    ("MYR", "RM ", ",", ".", ""),
    ("MXN", "$ ", ",", ".", ""),
    ("MAD", "", ",", ".", " .د.م."),
    ("NZD", "$ ", ",", ".", ""),
    ("NOK", "kr ", ",", ".", ""),
    ("PHP", "₱ ", ",", ".", ""),
    ("PLN", "", ".", ",", " zł"),
    ("RUB", "", ".", ",", " p."),
    ("SAR", "", ",", ".", " ﷼"),
    ("SGD", "$", ",", ".", ""),
    ("ZAR", "R ", ",", ".", ""),
    ("SEK", "", ".", ",", " kr"),
    ("CHF", "fr. ", ".", ",", ""),
    ("TWD", "元 ", ",", ".", ""),
    ("THB", "", ",", ".", " ฿"),
    ("TRY", "", ",", ".", " ₺"),
    ("GBP", "£", ",", ".", ""),
    ("USD", "$", ",", ".", ""),
    ("VND", "", ".", ",", " ₫"),
];

pub const DEFAULT_CURRENCY: &str = "USD";

/// Read-only table of currency formats plus the process default currency.
#[derive(Debug, Clone)]
pub struct Registry {
    formats: Vec<(String, CommodityFormat)>,
    index: HashMap<String, usize>,
    default: Commodity,
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

impl Registry {
    pub fn new() -> Self {
        let formats = CURRENCIES
            .iter()
            .map(|(code, prefix, thousands, decimal, postfix)| {
                (
                    code.to_string(),
                    CommodityFormat::new(prefix, thousands, decimal, postfix),
                )
            })
            .collect::<Vec<_>>();
        Self::build(formats, Commodity::currency(DEFAULT_CURRENCY))
    }

    pub fn with_default(code: &str) -> Result<Self, ModelError> {
        Self::new().set_default(code)
    }

    /// A registry over an arbitrary table. The default must be part of it.
    pub fn from_table(
        formats: Vec<(String, CommodityFormat)>,
        default: &str,
    ) -> Result<Self, ModelError> {
        Self::build(formats, Commodity::currency(default)).set_default(default)
    }

    fn build(formats: Vec<(String, CommodityFormat)>, default: Commodity) -> Self {
        let index = formats
            .iter()
            .enumerate()
            .map(|(i, (code, _))| (code.clone(), i))
            .collect();
        Registry {
            formats,
            index,
            default,
        }
    }

    fn set_default(mut self, code: &str) -> Result<Self, ModelError> {
        if !self.is_currency(code) {
            return Err(ModelError::UnknownCurrency(code.into()));
        }
        self.default = Commodity::currency(code);
        Ok(self)
    }

    pub fn default_currency(&self) -> &Commodity {
        &self.default
    }

    pub fn format(&self, code: &str) -> Option<&CommodityFormat> {
        self.index.get(code).map(|&i| &self.formats[i].1)
    }

    /// The format of `code`, or of the default currency for unknown codes.
    pub fn format_or_default(&self, code: &str) -> &CommodityFormat {
        self.format(code)
            .or_else(|| self.format(&self.default.code))
            .unwrap_or(&self.formats[0].1)
    }

    pub fn is_currency(&self, code: &str) -> bool {
        self.index.contains_key(code)
    }

    /// Currency if the code is known, stock otherwise.
    pub fn commodity(&self, code: &str) -> Commodity {
        if self.is_currency(code) {
            Commodity::currency(code)
        } else {
            Commodity::new(CommodityType::Stock, code)
        }
    }

    /// Maps the symbols of a parsed amount back to a currency.
    ///
    /// The `default` wins whenever its own symbols match. A bare `$` that is
    /// not the default's is ambiguous. Otherwise the table is scanned in order
    /// and the first currency with the same symbols wins. Errors carry
    /// `default` as a fallback.
    pub fn find_currency(
        &self,
        format: &CommodityFormat,
        default: &Commodity,
    ) -> Result<Commodity, ModelError> {
        let wanted = (format.prefix.as_str(), format.postfix.as_str());
        if wanted == ("", "") {
            return Ok(default.clone());
        }
        if self
            .format(&default.code)
            .is_some_and(|f| f.symbols() == wanted)
        {
            return Ok(default.clone());
        }
        if format.prefix == "$" {
            return Err(ModelError::AmbiguousFormat {
                format: format.clone(),
                fallback: default.clone(),
            });
        }
        self.formats
            .iter()
            .find(|(_, f)| f.symbols() == wanted)
            .map(|(code, _)| Commodity::currency(code))
            .ok_or_else(|| ModelError::UnknownFormat {
                format: format.clone(),
                fallback: default.clone(),
            })
    }
}
