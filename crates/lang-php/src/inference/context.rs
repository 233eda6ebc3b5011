//! Context for type inference.
//!
//! Holds the state shared by the expression resolver and the variable
//! table builder for one resolution request.

use crate::naming::NameResolver;
use phpscope_api::store::SymbolStore;
use phpscope_core::config::AnalysisConfig;

/// The class a piece of code is written in.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClassContext {
    /// Fully-qualified name bound to `self` and `static`.
    pub self_class: Option<String>,
    /// Fully-qualified name bound to `parent`.
    pub parent_class: Option<String>,
}

/// Context for type inference
#[derive(Clone)]
pub struct InferContext<'a> {
    /// Source code being analyzed
    pub source: &'a str,
    /// Indexed declarations
    pub store: &'a dyn SymbolStore,
    /// Namespace and imports in effect
    pub names: &'a NameResolver,
    pub config: &'a AnalysisConfig,
    pub class: ClassContext,
}

impl<'a> InferContext<'a> {
    pub fn new(
        source: &'a str,
        store: &'a dyn SymbolStore,
        names: &'a NameResolver,
        config: &'a AnalysisConfig,
    ) -> Self {
        Self {
            source,
            store,
            names,
            config,
            class: ClassContext::default(),
        }
    }

    pub fn with_class(mut self, class: ClassContext) -> Self {
        self.class = class;
        self
    }

    /// Resolves a class reference as written in source, binding the
    /// `self`/`static`/`parent` keywords to the class context.
    pub fn class_reference(&self, text: &str) -> Option<String> {
        match text.to_ascii_lowercase().as_str() {
            "self" | "static" => self.class.self_class.clone(),
            "parent" => self.class.parent_class.clone(),
            "" => None,
            _ => Some(self.names.resolve_class(text)),
        }
    }
}
