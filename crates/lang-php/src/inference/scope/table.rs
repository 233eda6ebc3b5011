//! Flow-sensitive variable table.

use phpscope_api::models::types::TypeString;
use std::collections::HashMap;

type Variables = HashMap<String, TypeString>;

/// Variable name (with `$`) to type, per scope, with branch merging.
///
/// Lookups only see the innermost scope: PHP functions do not inherit the
/// variables of their enclosing scope except through explicit capture.
#[derive(Debug, Clone)]
pub struct VariableTable {
    scopes: Vec<Scope>,
}

#[derive(Debug, Clone, Default)]
struct Scope {
    variables: Variables,
    branches: Vec<BranchSet>,
}

/// A set of mutually exclusive branches being recorded.
#[derive(Debug, Clone)]
struct BranchSet {
    before: Variables,
    finished: Vec<Variables>,
}

impl Default for VariableTable {
    fn default() -> Self {
        Self {
            scopes: vec![Scope::default()],
        }
    }
}

impl VariableTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Type of `name`; unknown when never assigned.
    pub fn get(&self, name: &str) -> TypeString {
        self.current()
            .variables
            .get(name)
            .cloned()
            .unwrap_or_default()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.current().variables.contains_key(name)
    }

    pub fn set(&mut self, name: impl Into<String>, ty: TypeString) {
        self.current_mut().variables.insert(name.into(), ty);
    }

    /// Variables visible in the innermost scope, sorted by name.
    pub fn variables(&self) -> Vec<(&str, &TypeString)> {
        let mut vars: Vec<_> = self
            .current()
            .variables
            .iter()
            .map(|(k, v)| (k.as_str(), v))
            .collect();
        vars.sort_by(|a, b| a.0.cmp(b.0));
        vars
    }

    /// Opens a nested scope seeded with captured variables.
    pub fn push_scope(&mut self, captured: impl IntoIterator<Item = (String, TypeString)>) {
        self.scopes.push(Scope {
            variables: captured.into_iter().collect(),
            branches: Vec::new(),
        });
    }

    pub fn pop_scope(&mut self) {
        if self.scopes.len() > 1 {
            self.scopes.pop();
        }
    }

    pub fn depth(&self) -> usize {
        self.scopes.len()
    }

    /// Starts a set of mutually exclusive branches.
    pub fn begin_branches(&mut self) {
        let scope = self.current_mut();
        let before = scope.variables.clone();
        scope.branches.push(BranchSet {
            before,
            finished: Vec::new(),
        });
    }

    /// Starts one branch from the pre-branch state.
    pub fn begin_branch(&mut self) {
        let scope = self.current_mut();
        if let Some(set) = scope.branches.last() {
            scope.variables = set.before.clone();
        }
    }

    pub fn end_branch(&mut self) {
        let scope = self.current_mut();
        if let Some(set) = scope.branches.last_mut() {
            set.finished.push(scope.variables.clone());
            scope.variables = set.before.clone();
        }
    }

    /// Merges the finished branches. Unless `exhaustive`, the pre-branch state
    /// counts as one more branch.
    pub fn end_branches(&mut self, exhaustive: bool) {
        let scope = self.current_mut();
        let Some(mut set) = scope.branches.pop() else {
            return;
        };
        if !exhaustive || set.finished.is_empty() {
            set.finished.push(set.before.clone());
        }
        let mut merged = Variables::new();
        for branch in &set.finished {
            for (name, ty) in branch {
                merged
                    .entry(name.clone())
                    .and_modify(|existing| existing.union_with(ty))
                    .or_insert_with(|| ty.clone());
            }
        }
        scope.variables = merged;
    }

    fn current(&self) -> &Scope {
        // The root scope is never popped.
        &self.scopes[self.scopes.len() - 1]
    }

    fn current_mut(&mut self) -> &mut Scope {
        let last = self.scopes.len() - 1;
        &mut self.scopes[last]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(s: &str) -> TypeString {
        s.parse().unwrap()
    }

    #[test]
    fn exhaustive_branches_union_their_assignments() {
        let mut table = VariableTable::new();
        table.begin_branches();
        table.begin_branch();
        table.set("$x", t("int"));
        table.end_branch();
        table.begin_branch();
        table.set("$x", t("string"));
        table.end_branch();
        table.end_branches(true);
        assert_eq!(table.get("$x"), t("int|string"));
    }

    #[test]
    fn non_exhaustive_branches_keep_pre_branch_type() {
        let mut table = VariableTable::new();
        table.set("$x", t("Foo"));
        table.begin_branches();
        table.begin_branch();
        table.set("$x", t("Bar"));
        table.end_branch();
        table.end_branches(false);
        assert_eq!(table.get("$x"), t("Foo|Bar"));
    }

    #[test]
    fn untouched_variables_keep_their_type() {
        let mut table = VariableTable::new();
        table.set("$a", t("int"));
        table.begin_branches();
        table.begin_branch();
        table.set("$b", t("string"));
        table.end_branch();
        table.begin_branch();
        table.end_branch();
        table.end_branches(true);
        assert_eq!(table.get("$a"), t("int"));
        assert_eq!(table.get("$b"), t("string"));
    }

    #[test]
    fn scopes_isolate_variables() {
        let mut table = VariableTable::new();
        table.set("$outer", t("int"));
        table.push_scope([("$captured".to_string(), t("Foo"))]);
        assert!(table.get("$outer").is_empty());
        assert_eq!(table.get("$captured"), t("Foo"));
        table.pop_scope();
        assert_eq!(table.get("$outer"), t("int"));
        table.pop_scope();
        assert_eq!(table.depth(), 1);
    }
}
