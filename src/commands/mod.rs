use clap::Subcommand;

pub mod add;
pub mod balance;
pub mod check;
pub mod income;
pub mod print;

#[derive(Subcommand)]
pub enum Commands {
    /// Parses a journal and reports every diagnostic
    Check(check::Command),
    /// Prints the journal's transactions in canonical form
    Print(print::Command),
    /// Balance sheet of asset and liability accounts
    Balance(balance::Command),
    /// Income statement of revenue and expense accounts
    Income(income::Command),
    /// Appends a new transaction to a journal
    Add(add::Command),
}
