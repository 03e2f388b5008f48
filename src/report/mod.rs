pub mod statement;
pub mod table;
