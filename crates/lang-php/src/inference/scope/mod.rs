//! Variable scopes: the table and the statement replay that fills it.

mod builder;
mod table;

pub use builder::VariableTableBuilder;
pub use table::VariableTable;
