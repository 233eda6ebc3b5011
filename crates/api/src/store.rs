//! Symbol store interface and the class hierarchy walk.

use crate::models::symbol::{PhpSymbol, SymbolKind};
use std::collections::HashSet;
use std::sync::Arc;

/// Hierarchy depth used when the caller does not supply one.
pub const DEFAULT_HIERARCHY_DEPTH: usize = 16;

/// A member found through the hierarchy walk.
#[derive(Debug, Clone)]
pub struct MemberMatch {
    pub member: Arc<PhpSymbol>,
    /// The class-like symbol that declares the member.
    pub declaring: Arc<PhpSymbol>,
}

/// Read access to the indexed declarations of a workspace.
///
/// Implementors only provide [`SymbolStore::find_symbols`]; the hierarchy
/// helpers are built on top of it.
pub trait SymbolStore: Send + Sync {
    /// All records registered under a fully-qualified name (no leading `\`).
    fn find_symbols(&self, fqn: &str) -> Vec<Arc<PhpSymbol>>;

    fn find_class(&self, fqn: &str) -> Option<Arc<PhpSymbol>> {
        self.find_symbols(fqn)
            .into_iter()
            .find(|s| s.is_class_like())
    }

    fn find_function(&self, fqn: &str) -> Option<Arc<PhpSymbol>> {
        self.find_symbols(fqn)
            .into_iter()
            .find(|s| s.kind == SymbolKind::Function)
    }

    fn find_constant(&self, fqn: &str) -> Option<Arc<PhpSymbol>> {
        self.find_symbols(fqn)
            .into_iter()
            .find(|s| s.kind == SymbolKind::Constant)
    }

    /// Class-like symbols in member lookup order: the class, its traits
    /// (recursively, in declared order), then the same for each ancestor,
    /// then every reachable interface. Each symbol appears once.
    fn lookup_order(&self, class: &Arc<PhpSymbol>, max_depth: usize) -> Vec<Arc<PhpSymbol>> {
        let mut order = Vec::new();
        let mut visited = HashSet::new();
        let mut pending_interfaces: Vec<String> = Vec::new();

        let mut current = Some(class.clone());
        let mut depth = 0;
        while let Some(symbol) = current.take() {
            if depth > max_depth || !visited.insert(symbol.name.to_ascii_lowercase()) {
                break;
            }
            order.push(symbol.clone());
            push_traits(self, &symbol, &mut order, &mut visited, depth, max_depth);
            pending_interfaces.extend(symbol.interfaces().map(str::to_string));
            current = symbol.base_class().and_then(|base| self.find_class(base));
            depth += 1;
        }

        let mut queue = pending_interfaces;
        queue.reverse();
        let mut steps = 0;
        while let Some(name) = queue.pop() {
            steps += 1;
            if steps > max_depth * 4 {
                break;
            }
            let Some(iface) = self.find_class(&name) else {
                continue;
            };
            if !visited.insert(iface.name.to_ascii_lowercase()) {
                continue;
            }
            for parent in iface.interfaces().collect::<Vec<_>>().into_iter().rev() {
                queue.push(parent.to_string());
            }
            order.push(iface);
        }
        order
    }

    /// Classes reachable through `extends`, nearest first.
    fn base_classes(&self, class: &Arc<PhpSymbol>, max_depth: usize) -> Vec<Arc<PhpSymbol>> {
        let mut bases = Vec::new();
        let mut visited = HashSet::new();
        visited.insert(class.name.to_ascii_lowercase());
        let mut current = class.base_class().and_then(|b| self.find_class(b));
        while let Some(base) = current.take() {
            if bases.len() >= max_depth || !visited.insert(base.name.to_ascii_lowercase()) {
                break;
            }
            current = base.base_class().and_then(|b| self.find_class(b));
            bases.push(base);
        }
        bases
    }

    /// Members visible on `class`. With `include_inherited`, members hidden by
    /// an earlier declaration in lookup order are skipped and at most
    /// `max_depth` ancestors are visited.
    fn find_members(
        &self,
        class: &Arc<PhpSymbol>,
        include_inherited: bool,
        max_depth: usize,
    ) -> Vec<Arc<PhpSymbol>> {
        if !include_inherited {
            return class.members().cloned().collect();
        }
        let mut seen = HashSet::new();
        let mut members = Vec::new();
        for owner in self.lookup_order(class, max_depth) {
            for member in owner.members() {
                let key = match member.kind {
                    SymbolKind::Method => (member.kind, member.name.to_ascii_lowercase()),
                    kind => (kind, member.name.clone()),
                };
                if seen.insert(key) {
                    members.push(member.clone());
                }
            }
        }
        members
    }

    /// First member named `name` of the given kind in lookup order.
    fn find_member(
        &self,
        class: &Arc<PhpSymbol>,
        kind: SymbolKind,
        name: &str,
        max_depth: usize,
    ) -> Option<MemberMatch> {
        self.lookup_order(class, max_depth)
            .into_iter()
            .find_map(|owner| {
                let member = owner
                    .members()
                    .find(|m| m.matches_member(kind, name))?
                    .clone();
                Some(MemberMatch {
                    member,
                    declaring: owner,
                })
            })
    }
}

fn push_traits<S: SymbolStore + ?Sized>(
    store: &S,
    symbol: &PhpSymbol,
    order: &mut Vec<Arc<PhpSymbol>>,
    visited: &mut HashSet<String>,
    depth: usize,
    max_depth: usize,
) {
    if depth > max_depth {
        return;
    }
    for name in symbol.traits() {
        let Some(used) = store.find_class(name) else {
            continue;
        };
        if !visited.insert(used.name.to_ascii_lowercase()) {
            continue;
        }
        order.push(used.clone());
        push_traits(store, &used, order, visited, depth + 1, max_depth);
    }
}
