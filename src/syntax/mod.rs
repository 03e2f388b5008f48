use std::{
    fs,
    path::{Path, PathBuf},
    rc::Rc,
};

use log::debug;

use self::{
    error::{FileError, SyntaxError},
    parser::Parser,
};
use crate::model::{
    balancer::balance_transaction, entities::Transaction, journal::Journal, registry::Registry,
};

pub mod decimal;
pub mod error;
pub mod format;
pub mod parser;
pub mod scanner;

/// Parses a journal file and everything it includes, then balances every
/// transaction.
///
/// Only failing to read `root` is fatal. All other problems end up in the
/// returned journal's `errors`, next to the transactions that did parse.
pub fn parse_journal(
    root: &Path,
    registry: &Registry,
) -> Result<(Journal, Vec<Transaction>), FileError> {
    let journal = root_journal(root.to_path_buf(), registry);
    let (mut journal, mut transactions) = load(root, journal, registry, &mut Vec::new())?;
    balance_all(&mut journal, &mut transactions);
    Ok((journal, transactions))
}

/// Like [`parse_journal`] for text already in memory. Includes resolve
/// against the working directory.
pub fn parse_str(name: &str, text: &str, registry: &Registry) -> (Journal, Vec<Transaction>) {
    let journal = root_journal(PathBuf::from(name), registry);
    let (mut journal, mut transactions) =
        Parser::new(name.into(), text.as_bytes(), journal, registry).parse(&mut Vec::new());
    balance_all(&mut journal, &mut transactions);
    (journal, transactions)
}

fn root_journal(path: PathBuf, registry: &Registry) -> Journal {
    let default = registry.default_currency().clone();
    let decimal = registry.format_or_default(&default.code).decimal.clone();
    Journal::new(path, default, &decimal)
}

/// Parses one file into `journal`. `stack` holds the canonical paths of the
/// files currently being read; meeting one of them again is a cycle.
fn load(
    path: &Path,
    journal: Journal,
    registry: &Registry,
    stack: &mut Vec<PathBuf>,
) -> Result<(Journal, Vec<Transaction>), FileError> {
    let canonical = path
        .canonicalize()
        .map_err(|e| FileError::Io(path.to_path_buf(), e))?;
    if stack.contains(&canonical) {
        return Err(FileError::Cycle(canonical));
    }
    let source = fs::read(&canonical).map_err(|e| FileError::Io(path.to_path_buf(), e))?;
    debug!("parsing {}", path.display());

    stack.push(canonical);
    let name: Rc<str> = path.to_string_lossy().into();
    let (journal, transactions) = Parser::new(name, &source, journal, registry).parse(stack);
    stack.pop();

    debug!(
        "parsed {} transactions from {}",
        transactions.len(),
        path.display()
    );
    Ok((journal, transactions))
}

fn balance_all(journal: &mut Journal, transactions: &mut [Transaction]) {
    for tx in transactions.iter_mut() {
        if let Err(e) = balance_transaction(tx) {
            let (file, row) = match &tx.loc {
                Some(loc) => (loc.file.clone(), loc.row),
                None => (journal.path.to_string_lossy().into(), 0),
            };
            journal
                .errors
                .push(SyntaxError::new(file, row, 0, e.to_string()));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rust_decimal::Decimal;
    use std::{collections::BTreeMap, fs};
    use tempfile::TempDir;

    fn write(dir: &TempDir, name: &str, text: &str) -> PathBuf {
        let path = dir.path().join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(&path, text).unwrap();
        path
    }

    fn sums(transactions: &[Transaction]) -> BTreeMap<String, Decimal> {
        let mut res = BTreeMap::new();
        for tx in transactions {
            for p in &tx.postings {
                *res.entry(p.lot.commodity.code.clone()).or_default() += p.lot.amount;
            }
        }
        res
    }

    #[test]
    fn test_parse_journal() {
        let dir = TempDir::new().unwrap();
        let root = write(
            &dir,
            "main.journal",
            "2023/01/01 pay\n\tassets:checking  $1000\n\tincome:salary\n\n\
             2023/01/05 mortgage payment\n\tassets:checking  -$900\n\tliabilities:mortgage\n",
        );
        let (journal, txs) = parse_journal(&root, &Registry::new()).unwrap();
        assert!(journal.check().is_ok(), "{}", journal.errors);
        assert_eq!(journal.path, root);
        assert_eq!(txs.len(), 2);
        assert_eq!(txs[1].postings[1].lot.amount, Decimal::from(900));
        assert!(sums(&txs).values().all(Decimal::is_zero));
    }

    #[test]
    fn test_missing_root_is_fatal() {
        let dir = TempDir::new().unwrap();
        let res = parse_journal(&dir.path().join("nope.journal"), &Registry::new());
        assert!(matches!(res, Err(FileError::Io(..))));
    }

    #[test]
    fn test_include() {
        let dir = TempDir::new().unwrap();
        write(
            &dir,
            "sub/expenses.journal",
            "2023/01/02 lunch\n\texpenses:food  $12\n\tassets:cash\n",
        );
        let root = write(
            &dir,
            "main.journal",
            "alias cash = assets:cash\n\
             2023/01/01 atm\n\tcash  $100\n\tassets:checking\n\n\
             include sub/expenses.journal\n\n\
             2023/01/03 atm\n\tcash  $50\n\tassets:checking\n",
        );
        let (journal, txs) = parse_journal(&root, &Registry::new()).unwrap();
        assert!(journal.check().is_ok(), "{}", journal.errors);
        let descriptions: Vec<_> = txs.iter().map(|t| t.description.as_str()).collect();
        assert_eq!(descriptions, vec!["atm", "lunch", "atm"]);
        assert_eq!(journal.includes.len(), 1);
        assert_eq!(journal.includes[0].path, dir.path().join("sub/expenses.journal"));
        assert_eq!(
            journal.includes[0].aliases.get("cash").map(String::as_str),
            Some("assets:cash")
        );
        assert_eq!(txs[1].postings[1].lot.amount, Decimal::from(-12));
    }

    #[test]
    fn test_include_missing() {
        let dir = TempDir::new().unwrap();
        let root = write(
            &dir,
            "main.journal",
            "include missing.journal\n\n\
             2023/01/01 still here\n\texpenses  $1\n\tassets\n",
        );
        let (journal, txs) = parse_journal(&root, &Registry::new()).unwrap();
        assert_eq!(txs.len(), 1);
        assert_eq!(journal.errors.len(), 1);
        let e = &journal.errors.0[0];
        assert_eq!((e.row, e.col), (1, 0));
        assert!(e.msg.starts_with("error reading file"));
        assert!(journal.includes.is_empty());
        assert!(journal.check().is_err());
    }

    #[test]
    fn test_include_cycle() {
        let dir = TempDir::new().unwrap();
        write(
            &dir,
            "b.journal",
            "2023/01/02 b\n\texpenses  $2\n\tassets\n\ninclude a.journal\n",
        );
        let root = write(
            &dir,
            "a.journal",
            "2023/01/01 a\n\texpenses  $1\n\tassets\n\ninclude b.journal\n",
        );
        let (journal, txs) = parse_journal(&root, &Registry::new()).unwrap();
        assert_eq!(txs.len(), 2);
        assert_eq!(journal.errors.len(), 1);
        let e = &journal.errors.0[0];
        assert!(e.msg.starts_with("include cycle detected"), "{e}");
        assert!(e.file.ends_with("b.journal"));
    }

    #[test]
    fn test_include_errors_are_folded() {
        let dir = TempDir::new().unwrap();
        write(&dir, "bad.journal", "garbage\n");
        let root = write(&dir, "main.journal", "include bad.journal\n");
        let (journal, _) = parse_journal(&root, &Registry::new()).unwrap();
        let messages: Vec<_> = journal.errors.iter().map(|e| e.to_string()).collect();
        assert_eq!(messages.len(), 1);
        assert!(messages[0].ends_with("bad.journal:1:0: skipped line: 'garbage'"));
        assert!(journal.includes[0].errors.is_empty());
    }

    #[test]
    fn test_balancing_runs_once_over_all_files() {
        let dir = TempDir::new().unwrap();
        write(
            &dir,
            "sub.journal",
            "2023/01/02 unbalanced\n\texpenses  $2\n\tassets  $2\n",
        );
        let root = write(&dir, "main.journal", "include sub.journal\n");
        let (journal, _) = parse_journal(&root, &Registry::new()).unwrap();
        assert_eq!(journal.errors.len(), 1);
        assert!(journal.errors.0[0].file.ends_with("sub.journal"));
        assert_eq!(journal.errors.0[0].row, 1);
    }
}
