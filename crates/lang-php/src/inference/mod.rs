//! PHP Type Inference
//!
//! # Architecture
//!
//! ```text
//! VariableTableBuilder  →  replays statements up to the cursor
//!       │
//!       ▼
//! VariableTable         →  variable name → TypeString, with branch merging
//!       │
//!       ▼
//! ExpressionTypeResolver →  one match over ExprKind
//!       │
//!       ▼
//! SymbolStore (trait)   →  class, function, constant and member lookup
//! ```
//!
//! All of it borrows an [`InferContext`] carrying the source, the store, the
//! name resolver in effect and the enclosing class.
//!
//! # Usage
//!
//! ```ignore
//! use phpscope_lang::inference::{ExpressionTypeResolver, InferContext, VariableTableBuilder};
//!
//! let ctx = InferContext::new(source, &store, &names, &config);
//! let table = VariableTableBuilder::new(&ctx, offset).build(scope_node);
//! let ty = ExpressionTypeResolver::new(&ctx, &table).resolve(&node);
//! ```

pub mod context;
pub mod expr;
pub mod members;
pub mod scope;

pub use context::{ClassContext, InferContext};
pub use expr::ExpressionTypeResolver;
pub use members::{MemberKind, find_member, find_method, member_type, visible_members};
pub use scope::{VariableTable, VariableTableBuilder};
