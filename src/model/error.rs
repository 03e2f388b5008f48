use rust_decimal::Decimal;
use thiserror::Error;

use super::entities::{Commodity, CommodityFormat};

#[derive(Error, Debug, Eq, PartialEq, Clone)]
pub enum ModelError {
    #[error("missing posting amount, cannot infer more than one")]
    TooManyInferred,
    #[error("transaction is not balanced: {residual} {commodity}")]
    Unbalanced {
        commodity: Commodity,
        residual: Decimal,
    },
    #[error("ambiguous currency format {format}, using {fallback}")]
    AmbiguousFormat {
        format: CommodityFormat,
        fallback: Commodity,
    },
    #[error("unknown currency format {format}, using {fallback}")]
    UnknownFormat {
        format: CommodityFormat,
        fallback: Commodity,
    },
    #[error("unknown currency code: {0}")]
    UnknownCurrency(String),
    #[error("sum of postings out of range: {0}")]
    Overflow(Commodity),
}

impl ModelError {
    /// The commodity a caller may proceed with after a format lookup failed.
    pub fn fallback(&self) -> Option<&Commodity> {
        match self {
            Self::AmbiguousFormat { fallback, .. } | Self::UnknownFormat { fallback, .. } => {
                Some(fallback)
            }
            _ => None,
        }
    }
}
