pub mod commands;
pub mod model;
pub mod report;
pub mod syntax;

pub use model::{entities::Transaction, journal::Journal, registry::Registry};
pub use report::statement::{compute_balance_statement, compute_income_statement};
pub use syntax::{
    format::{append_transactions, write_transaction},
    parse_journal,
};
