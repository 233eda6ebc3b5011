pub mod context;
pub mod inference;
pub mod naming;
pub mod parser;
pub mod phpdoc;
pub mod signature;
pub mod workspace;

pub use context::Context;
pub use inference::{ExpressionTypeResolver, VariableTable};
pub use naming::{ImportKind, NameResolver};
pub use parser::{ParsedDocument, PhpParser, SymbolReader};
pub use signature::{SignatureSite, signature_site};
pub use workspace::Workspace;
