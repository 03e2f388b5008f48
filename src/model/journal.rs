use std::{collections::BTreeMap, path::PathBuf};

use crate::syntax::error::ParseErrors;

use super::entities::Commodity;

/// A parsed journal file and the files it includes.
#[derive(Debug, Clone, Default)]
pub struct Journal {
    pub path: PathBuf,
    pub aliases: BTreeMap<String, String>,
    /// Decimal separator of the default commodity.
    pub decimal: String,
    pub default_currency: Commodity,
    pub includes: Vec<Journal>,
    pub errors: ParseErrors,
}

impl Journal {
    pub fn new(path: PathBuf, default_currency: Commodity, decimal: &str) -> Self {
        Journal {
            path,
            aliases: BTreeMap::new(),
            decimal: decimal.into(),
            default_currency,
            includes: Vec::new(),
            errors: ParseErrors::default(),
        }
    }

    /// Fails with every collected diagnostic, if there are any.
    pub fn check(&self) -> Result<(), ParseErrors> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(self.errors.clone())
        }
    }

    /// Rewrites `account` through the alias table.
    ///
    /// An alias matches the whole account or its leading segments.
    pub fn resolve_alias(&self, account: &str) -> String {
        for (from, to) in self.aliases.iter().rev() {
            if account == from {
                return to.clone();
            }
            if let Some(rest) = account.strip_prefix(from.as_str()) {
                if rest.starts_with(':') {
                    return format!("{to}{rest}");
                }
            }
        }
        account.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax::error::SyntaxError;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_check() {
        let mut j = Journal::new("a.journal".into(), Commodity::currency("USD"), ".");
        assert!(j.check().is_ok());
        j.errors
            .push(SyntaxError::new("a.journal".into(), 2, 0, "skipped line"));
        assert_eq!(j.check().unwrap_err().to_string(), "a.journal:2:0: skipped line\r\n");
    }

    #[test]
    fn test_resolve_alias() {
        let mut j = Journal::default();
        j.aliases.insert("chk".into(), "assets:bank:checking".into());
        j.aliases.insert("cc".into(), "liabilities:credit card".into());
        assert_eq!(j.resolve_alias("chk"), "assets:bank:checking");
        assert_eq!(j.resolve_alias("cc:visa"), "liabilities:credit card:visa");
        assert_eq!(j.resolve_alias("chkx"), "chkx");
        assert_eq!(j.resolve_alias("expenses:food"), "expenses:food");
    }
}
