use crate::model::{
    balancer::balance_transaction, entities::Transaction, journal::Journal, registry::Registry,
};
use crate::syntax::{
    error::ParseErrors,
    format::{append_transactions, write_transaction},
    parse_journal,
    parser::Parser,
    scanner::START_OF_COMMENT,
};
use chrono::NaiveDate;
use clap::Args;
use std::{error::Error, path::PathBuf};

#[derive(Args)]
pub struct Command {
    journal: PathBuf,

    date: NaiveDate,

    description: String,

    /// A posting in journal syntax, e.g. "expenses:food  $12.50"
    #[arg(short, long = "posting", required = true)]
    postings: Vec<String>,
}

impl Command {
    pub fn run(&self, registry: &Registry) -> Result<(), Box<dyn Error>> {
        let (journal, _) = parse_journal(&self.journal, registry)?;
        journal.check()?;
        let tx = self.transaction(&journal, registry)?;
        append_transactions(&journal, std::slice::from_ref(&tx), registry)?;
        print!("{}", write_transaction(&tx, registry));
        Ok(())
    }

    /// Assembles the postings with the journal's aliases and default currency.
    fn transaction(
        &self,
        journal: &Journal,
        registry: &Registry,
    ) -> Result<Transaction, Box<dyn Error>> {
        check_line("description", &self.description)?;
        if self.description.trim_start().starts_with(['!', '(']) {
            return Err(format!(
                "description must not start with a pending flag or code: '{}'",
                self.description
            )
            .into());
        }
        for posting in &self.postings {
            check_line("posting", posting)?;
        }
        let mut text = format!("{}  {}\n", self.date.format("%Y/%m/%d"), self.description);
        for posting in &self.postings {
            text.push('\t');
            text.push_str(posting.trim());
            text.push('\n');
        }
        let seed = Journal {
            includes: Vec::new(),
            errors: ParseErrors::default(),
            ..journal.clone()
        };
        let (parsed, mut transactions) =
            Parser::new("<command line>".into(), text.as_bytes(), seed, registry)
                .parse(&mut Vec::new());
        parsed.check()?;
        let mut tx = match (transactions.pop(), transactions.is_empty()) {
            (Some(tx), true) => tx,
            _ => return Err("postings must form exactly one transaction".into()),
        };
        balance_transaction(&mut tx)?;
        tx.loc = None;
        Ok(tx)
    }
}

/// Text spliced into a journal line must not end the line or start a comment.
fn check_line(what: &str, text: &str) -> Result<(), Box<dyn Error>> {
    if text
        .bytes()
        .any(|b| b == START_OF_COMMENT || b == b'\n' || b == b'\r')
    {
        return Err(format!("{what} must not contain line breaks or ';': '{text}'").into());
    }
    Ok(())
}
