use crate::model::registry::Registry;
use crate::report::statement::{compute_balance_statement, BalanceStatement};
use crate::report::table::TextRenderer;
use crate::syntax::parse_journal;
use clap::Args;
use std::borrow::BorrowMut;
use std::io::{stdout, Write};
use std::{error::Error, path::PathBuf};

#[derive(Args)]
pub struct Command {
    journal: PathBuf,

    /// Print the statement as JSON
    #[arg(long)]
    json: bool,

    #[arg(long, default_value_t = 2)]
    round: u32,
}

impl Command {
    pub fn run(&self, registry: &Registry) -> Result<(), Box<dyn Error>> {
        let (journal, transactions) = parse_journal(&self.journal, registry)?;
        journal.check()?;
        let statement = compute_balance_statement(&BalanceStatement::default(), &transactions);
        let mut lock = stdout().lock();
        if self.json {
            serde_json::to_writer_pretty(lock.borrow_mut(), &statement)?;
            writeln!(lock)?;
        } else {
            TextRenderer::new(statement.to_table(), self.round).render(lock.borrow_mut())?;
        }
        lock.flush()?;
        Ok(())
    }
}
