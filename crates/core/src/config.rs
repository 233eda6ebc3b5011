//! Analysis limits.

use serde::{Deserialize, Serialize};

pub const DEFAULT_MAX_INFERENCE_DEPTH: usize = 32;
pub const DEFAULT_MAX_HIERARCHY_DEPTH: usize = phpscope_api::DEFAULT_HIERARCHY_DEPTH;

/// Tunables for a resolution request and for indexing.
///
/// Read from LSP initialization options (camelCase keys) or the environment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AnalysisConfig {
    /// Maximum nesting of expressions followed by the type resolver.
    pub max_inference_depth: usize,
    /// Maximum number of ancestors visited by a member lookup.
    pub max_hierarchy_depth: usize,
    /// Worker threads for indexing; 0 uses the rayon default.
    pub index_threads: usize,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            max_inference_depth: DEFAULT_MAX_INFERENCE_DEPTH,
            max_hierarchy_depth: DEFAULT_MAX_HIERARCHY_DEPTH,
            index_threads: 0,
        }
    }
}

impl AnalysisConfig {
    /// Defaults overridden by `PHPSCOPE_MAX_INFERENCE_DEPTH` and
    /// `PHPSCOPE_MAX_HIERARCHY_DEPTH`. Unparsable values are ignored.
    pub fn from_env() -> Self {
        Self::default().with_overrides(|key| std::env::var(key).ok())
    }

    pub fn from_json(value: serde_json::Value) -> crate::Result<Self> {
        Ok(serde_json::from_value(value)?)
    }

    fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let parse = |key: &str| lookup(key).and_then(|v| v.trim().parse::<usize>().ok());
        if let Some(depth) = parse("PHPSCOPE_MAX_INFERENCE_DEPTH") {
            self.max_inference_depth = depth;
        }
        if let Some(depth) = parse("PHPSCOPE_MAX_HIERARCHY_DEPTH") {
            self.max_hierarchy_depth = depth;
        }
        if let Some(threads) = parse("PHPSCOPE_INDEX_THREADS") {
            self.index_threads = threads;
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn json_uses_camel_case_and_fills_defaults() {
        let config = AnalysisConfig::from_json(serde_json::json!({ "maxHierarchyDepth": 4 })).unwrap();
        assert_eq!(config.max_hierarchy_depth, 4);
        assert_eq!(config.max_inference_depth, DEFAULT_MAX_INFERENCE_DEPTH);
        assert_eq!(config.index_threads, 0);
    }

    #[test]
    fn environment_overrides_skip_garbage() {
        let env: HashMap<&str, &str> = [
            ("PHPSCOPE_MAX_INFERENCE_DEPTH", "8"),
            ("PHPSCOPE_MAX_HIERARCHY_DEPTH", "lots"),
        ]
        .into_iter()
        .collect();
        let config =
            AnalysisConfig::default().with_overrides(|key| env.get(key).map(|v| v.to_string()));
        assert_eq!(config.max_inference_depth, 8);
        assert_eq!(config.max_hierarchy_depth, DEFAULT_MAX_HIERARCHY_DEPTH);
    }
}
