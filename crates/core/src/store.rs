//! Concurrent in-memory symbol index.

use dashmap::DashMap;
use phpscope_api::models::symbol::{PhpSymbol, SymbolKind};
use phpscope_api::store::SymbolStore;
use std::collections::HashSet;
use std::sync::Arc;

/// Symbol index keyed by lowercased fully-qualified name.
///
/// Each document's records are swapped key by key under the shard lock, so
/// a concurrent reader observes either the old or the new record for any
/// name.
#[derive(Debug, Default)]
pub struct MemorySymbolStore {
    index: DashMap<String, Vec<Arc<PhpSymbol>>>,
    documents: DashMap<String, Vec<Arc<PhpSymbol>>>,
}

impl MemorySymbolStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces every record previously read from `uri` with `symbols`.
    pub fn add_document(&self, uri: &str, symbols: Vec<Arc<PhpSymbol>>) {
        let mut indexed: Vec<(String, Vec<Arc<PhpSymbol>>)> = Vec::new();
        for symbol in &symbols {
            collect_indexed(symbol, &mut indexed);
        }

        let new_keys: HashSet<&str> = indexed.iter().map(|(k, _)| k.as_str()).collect();
        let stale_keys: Vec<String> = self
            .documents
            .get(uri)
            .map(|old| {
                let mut keys = Vec::new();
                for symbol in old.iter() {
                    collect_keys(symbol, &mut keys);
                }
                keys.into_iter()
                    .filter(|k| !new_keys.contains(k.as_str()))
                    .collect()
            })
            .unwrap_or_default();

        for (key, records) in indexed {
            self.index
                .entry(key)
                .and_modify(|existing| {
                    existing.retain(|s| s.uri != uri);
                    existing.extend(records.iter().cloned());
                })
                .or_insert(records);
        }
        for key in stale_keys {
            self.remove_from_key(&key, uri);
        }

        tracing::trace!(uri, count = symbols.len(), "document symbols replaced");
        self.documents.insert(uri.to_string(), symbols);
    }

    pub fn remove_document(&self, uri: &str) {
        let Some((_, old)) = self.documents.remove(uri) else {
            return;
        };
        let mut keys = Vec::new();
        for symbol in &old {
            collect_keys(symbol, &mut keys);
        }
        for key in keys {
            self.remove_from_key(&key, uri);
        }
    }

    /// Top-level records read from `uri`, in source order.
    pub fn document_symbols(&self, uri: &str) -> Vec<Arc<PhpSymbol>> {
        self.documents
            .get(uri)
            .map(|symbols| symbols.clone())
            .unwrap_or_default()
    }

    pub fn document_count(&self) -> usize {
        self.documents.len()
    }

    pub fn symbol_count(&self) -> usize {
        self.index.iter().map(|entry| entry.value().len()).sum()
    }

    fn remove_from_key(&self, key: &str, uri: &str) {
        if let Some(mut records) = self.index.get_mut(key) {
            records.retain(|s| s.uri != uri);
        }
        self.index.remove_if(key, |_, records| records.is_empty());
    }
}

impl SymbolStore for MemorySymbolStore {
    fn find_symbols(&self, fqn: &str) -> Vec<Arc<PhpSymbol>> {
        let key = fqn.trim_start_matches('\\').to_ascii_lowercase();
        let Some(records) = self.index.get(&key) else {
            return Vec::new();
        };
        let exact = fqn.trim_start_matches('\\');
        records
            .iter()
            // Constants are case-sensitive.
            .filter(|s| s.kind != SymbolKind::Constant || s.name == exact)
            .cloned()
            .collect()
    }
}

fn is_indexed(symbol: &PhpSymbol) -> bool {
    match symbol.kind {
        SymbolKind::Function => !symbol.modifiers.is_anonymous,
        SymbolKind::Constant => true,
        kind => kind.is_class_like(),
    }
}

fn collect_indexed(symbol: &Arc<PhpSymbol>, out: &mut Vec<(String, Vec<Arc<PhpSymbol>>)>) {
    if is_indexed(symbol) {
        let key = symbol.name.to_ascii_lowercase();
        match out.iter_mut().find(|(k, _)| *k == key) {
            Some((_, records)) => records.push(symbol.clone()),
            None => out.push((key, vec![symbol.clone()])),
        }
    }
    if symbol.kind == SymbolKind::Namespace {
        for child in &symbol.children {
            collect_indexed(child, out);
        }
    }
}

fn collect_keys(symbol: &PhpSymbol, out: &mut Vec<String>) {
    if is_indexed(symbol) {
        out.push(symbol.name.to_ascii_lowercase());
    }
    if symbol.kind == SymbolKind::Namespace {
        for child in &symbol.children {
            collect_keys(child, out);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use phpscope_api::models::types::TypeString;

    fn class(name: &str, uri: &str) -> Arc<PhpSymbol> {
        Arc::new(PhpSymbol::new(SymbolKind::Class, name).with_uri(uri))
    }

    #[test]
    fn lookup_is_case_insensitive_for_classes() {
        let store = MemorySymbolStore::new();
        store.add_document("file:///a.php", vec![class("App\\User", "file:///a.php")]);
        assert_eq!(store.find_symbols("\\app\\user").len(), 1);
        assert!(store.find_class("App\\User").is_some());
    }

    #[test]
    fn constants_are_case_sensitive() {
        let store = MemorySymbolStore::new();
        let constant = PhpSymbol::new(SymbolKind::Constant, "App\\LIMIT")
            .with_type(TypeString::atom("int"))
            .with_uri("file:///c.php");
        store.add_document("file:///c.php", vec![Arc::new(constant)]);
        assert!(store.find_constant("App\\LIMIT").is_some());
        assert!(store.find_constant("App\\limit").is_none());
    }

    #[test]
    fn reindexing_replaces_previous_records() {
        let store = MemorySymbolStore::new();
        store.add_document(
            "file:///a.php",
            vec![class("A", "file:///a.php"), class("Old", "file:///a.php")],
        );
        store.add_document("file:///b.php", vec![class("A", "file:///b.php")]);
        assert_eq!(store.find_symbols("A").len(), 2);

        store.add_document("file:///a.php", vec![class("A", "file:///a.php")]);
        assert_eq!(store.find_symbols("A").len(), 2);
        assert!(store.find_symbols("Old").is_empty());

        store.remove_document("file:///b.php");
        assert_eq!(store.find_symbols("A").len(), 1);
        assert_eq!(store.document_count(), 1);
        assert_eq!(store.symbol_count(), 1);
    }

    #[test]
    fn namespace_children_are_indexed() {
        let store = MemorySymbolStore::new();
        let ns = PhpSymbol::new(SymbolKind::Namespace, "App")
            .with_child(PhpSymbol::new(SymbolKind::Function, "App\\helper"))
            .with_uri("file:///n.php");
        store.add_document("file:///n.php", vec![Arc::new(ns)]);
        assert!(store.find_function("app\\HELPER").is_some());
        assert!(store.find_symbols("App").is_empty());
    }
}
