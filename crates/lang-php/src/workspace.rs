//! Workspace indexing.
//!
//! Parses documents, reads their declarations into the shared
//! [`MemorySymbolStore`] and keeps the latest snapshot of each open document.

use crate::context::Context;
use crate::parser::{ParsedDocument, PhpParser, SymbolReader};
use dashmap::DashMap;
use ignore::WalkBuilder;
use lsp_types::Position;
use phpscope_core::config::AnalysisConfig;
use phpscope_core::error::{PhpscopeError, Result};
use phpscope_core::store::MemorySymbolStore;
use rayon::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

pub struct Workspace {
    parser: PhpParser,
    store: Arc<MemorySymbolStore>,
    documents: DashMap<String, Arc<ParsedDocument>>,
    config: AnalysisConfig,
}

impl Workspace {
    pub fn new(config: AnalysisConfig) -> Result<Self> {
        Ok(Self {
            parser: PhpParser::new()?,
            store: Arc::new(MemorySymbolStore::new()),
            documents: DashMap::new(),
            config,
        })
    }

    pub fn store(&self) -> &Arc<MemorySymbolStore> {
        &self.store
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// Parses `text`, replaces the document's records and keeps the snapshot.
    pub fn open(&self, uri: &str, text: &str) -> Result<Arc<ParsedDocument>> {
        let document = Arc::new(self.parser.parse(uri, text)?);
        self.store
            .add_document(uri, SymbolReader::read_document(&document));
        self.documents.insert(uri.to_string(), document.clone());
        Ok(document)
    }

    /// Drops the snapshot; the indexed records stay.
    pub fn close(&self, uri: &str) {
        self.documents.remove(uri);
    }

    /// Drops both the snapshot and the indexed records.
    pub fn remove(&self, uri: &str) {
        self.documents.remove(uri);
        self.store.remove_document(uri);
    }

    pub fn document(&self, uri: &str) -> Option<Arc<ParsedDocument>> {
        self.documents.get(uri).map(|entry| entry.value().clone())
    }

    /// Indexes `(uri, text)` pairs in parallel and returns how many were
    /// indexed. Documents that fail to parse are logged and skipped.
    pub fn index_all(&self, documents: Vec<(String, String)>) -> Result<usize> {
        let total = documents.len();
        let index = || {
            documents
                .par_iter()
                .filter(|(uri, text)| match self.index_one(uri, text) {
                    Ok(()) => true,
                    Err(err) => {
                        tracing::warn!(uri = %uri, error = %err, "failed to index document");
                        false
                    }
                })
                .count()
        };
        let indexed = if self.config.index_threads > 0 {
            rayon::ThreadPoolBuilder::new()
                .num_threads(self.config.index_threads)
                .build()
                .map_err(|e| PhpscopeError::Internal(e.to_string()))?
                .install(index)
        } else {
            index()
        };
        tracing::info!(indexed, total, "indexed document batch");
        Ok(indexed)
    }

    fn index_one(&self, uri: &str, text: &str) -> Result<()> {
        let document = self.parser.parse(uri, text)?;
        self.store
            .add_document(uri, SymbolReader::read_document(&document));
        Ok(())
    }

    /// Indexes every `.php` file under `root`, honouring ignore files.
    pub fn index_directory(&self, root: &Path) -> Result<usize> {
        let paths = collect_php_files(root);
        tracing::info!(root = %root.display(), files = paths.len(), "scanning workspace");
        let documents: Vec<(String, String)> = paths
            .par_iter()
            .filter_map(|path| match fs::read_to_string(path) {
                Ok(text) => Some((path_to_uri(path), text)),
                Err(err) => {
                    tracing::warn!(path = %path.display(), error = %err, "failed to read file");
                    None
                }
            })
            .collect();
        self.index_all(documents)
    }

    /// A resolution context for `position` in `document`.
    pub fn context<'a>(&'a self, document: &'a ParsedDocument, position: Position) -> Context<'a> {
        Context::with_config(document, self.store.as_ref(), position, self.config.clone())
    }
}

fn collect_php_files(root: &Path) -> Vec<PathBuf> {
    WalkBuilder::new(root)
        .build()
        .filter_map(|entry| {
            let entry = entry.ok()?;
            let path = entry.path();
            if path.is_file() && path.extension().is_some_and(|ext| ext == "php") {
                return Some(path.to_path_buf());
            }
            None
        })
        .collect()
}

pub fn path_to_uri(path: &Path) -> String {
    format!("file://{}", path.display())
}
