pub mod config;
pub mod document;
pub mod error;
pub mod logging;
pub mod store;

pub use config::AnalysisConfig;
pub use document::TextDocument;
pub use error::{PhpscopeError, Result};
pub use store::MemorySymbolStore;
