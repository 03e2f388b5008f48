use crate::model::registry::Registry;
use crate::syntax::parse_journal;
use clap::Args;
use std::{error::Error, path::PathBuf};

#[derive(Args)]
pub struct Command {
    journal: PathBuf,
}

impl Command {
    pub fn run(&self, registry: &Registry) -> Result<(), Box<dyn Error>> {
        let (journal, transactions) = parse_journal(&self.journal, registry)?;
        journal.check()?;
        println!(
            "{}: {} transactions, no errors",
            self.journal.display(),
            transactions.len()
        );
        Ok(())
    }
}
