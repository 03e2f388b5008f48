use crate::model::{entities::Transaction, registry::Registry};
use crate::syntax::{format::write_transaction, parse_journal};
use clap::Args;
use regex::Regex;
use std::io::{stdout, Write};
use std::{error::Error, path::PathBuf};

#[derive(Args)]
pub struct Command {
    journal: PathBuf,

    /// Only print transactions whose description or an account matches
    #[arg(short, long)]
    filter: Option<Regex>,
}

impl Command {
    pub fn run(&self, registry: &Registry) -> Result<(), Box<dyn Error>> {
        let (journal, transactions) = parse_journal(&self.journal, registry)?;
        let mut lock = stdout().lock();
        for tx in transactions
            .iter()
            .filter(|tx| self.filter.as_ref().map_or(true, |f| is_match(tx, f)))
        {
            lock.write_all(write_transaction(tx, registry).as_bytes())?;
        }
        lock.flush()?;
        journal.check()?;
        Ok(())
    }
}

fn is_match(tx: &Transaction, filter: &Regex) -> bool {
    filter.is_match(&tx.description) || tx.postings.iter().any(|p| filter.is_match(&p.account))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax::parse_str;

    #[test]
    fn test_filter() {
        let registry = Registry::new();
        let (journal, txs) = parse_str(
            "test.journal",
            "2023/01/01 groceries\n\texpenses:food  $10\n\tassets:cash\n\n\
             2023/01/02 rent\n\texpenses:housing  $900\n\tassets:checking\n",
            &registry,
        );
        assert!(journal.check().is_ok());
        let by_description = Regex::new("^groc").unwrap();
        assert!(is_match(&txs[0], &by_description));
        assert!(!is_match(&txs[1], &by_description));
        let by_account = Regex::new("checking").unwrap();
        assert!(!is_match(&txs[0], &by_account));
        assert!(is_match(&txs[1], &by_account));
    }
}
