pub mod symbol;
pub mod types;

pub use symbol::*;
pub use types::*;
