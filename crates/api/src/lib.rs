pub mod models;
pub mod store;

pub use models::*;
pub use store::{DEFAULT_HIERARCHY_DEPTH, MemberMatch, SymbolStore};
