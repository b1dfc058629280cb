//! Fact Store - in-memory index of every file's declaration facts
//!
//! Populated once by the scan phase (single writer), then shared read-only
//! by every resolver. Keyed and iterated in file-key order so all derived
//! output is deterministic.

use crate::facts::{FileFacts, RouterFacts};
use crate::router_id::RouterId;
use std::collections::BTreeMap;

#[derive(Debug, Default, Clone)]
pub struct FactStore {
    files: BTreeMap<String, FileFacts>,
}

impl FactStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert the facts of one file, replacing any previous entry for its key.
    pub fn insert(&mut self, facts: FileFacts) {
        self.files.insert(facts.file_key.clone(), facts);
    }

    pub fn get(&self, file_key: &str) -> Option<&FileFacts> {
        self.files.get(file_key)
    }

    pub fn contains(&self, file_key: &str) -> bool {
        self.files.contains_key(file_key)
    }

    /// Look up the router a [`RouterId`] points at.
    pub fn router(&self, id: &RouterId) -> Option<(&FileFacts, &RouterFacts)> {
        let file = self.files.get(&id.file)?;
        let router = file.routers.get(&id.variable)?;
        Some((file, router))
    }

    /// All files, in file-key order.
    pub fn files(&self) -> impl Iterator<Item = &FileFacts> {
        self.files.values()
    }

    pub fn file_keys(&self) -> impl Iterator<Item = &str> {
        self.files.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn stats(&self) -> StoreStats {
        let mut stats = StoreStats {
            files: self.files.len(),
            ..StoreStats::default()
        };
        for file in self.files.values() {
            stats.routers += file.routers.len();
            stats.routes += file.route_count();
            stats.models += file.models.len();
            stats.imports += file.imports.len();
            if file.app_router().is_some() {
                stats.applications += 1;
            }
        }
        stats
    }
}

impl FromIterator<FileFacts> for FactStore {
    fn from_iter<I: IntoIterator<Item = FileFacts>>(iter: I) -> Self {
        let mut store = Self::new();
        for facts in iter {
            store.insert(facts);
        }
        store
    }
}

/// Counts over the whole store.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize)]
pub struct StoreStats {
    pub files: usize,
    pub applications: usize,
    pub routers: usize,
    pub routes: usize,
    pub models: usize,
    pub imports: usize,
}

impl std::fmt::Display for StoreStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Fact Store Statistics:")?;
        writeln!(f, "  Files: {}", self.files)?;
        writeln!(f, "  Applications: {}", self.applications)?;
        writeln!(f, "  Routers: {} (routes: {})", self.routers, self.routes)?;
        writeln!(f, "  Models: {}", self.models)?;
        writeln!(f, "  Imports: {}", self.imports)
    }
}
