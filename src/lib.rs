//! # Routemap - static route surface discovery for Python web services
//!
//! Routemap reads a source tree without executing it and answers "what API
//! does this codebase expose, and how is it wired together?"
//!
//! - Tree-sitter based extraction of per-file facts with pluggable framework
//!   adapters (CRUD router convention, FastAPI)
//! - Cross-file resolution of imports, model inheritance and router nesting
//!   into a flat list of fully-prefixed routes
//! - File-level module dependency graph with folder aggregation
//! - CLI, table output and a small HTTP API over the same analysis

pub mod facts;
pub mod router_id;
pub mod store;
pub mod adapter;
pub mod linker;
pub mod graph;
pub mod filter;
pub mod scan;
pub mod analysis;
pub mod config;
pub mod output;
pub mod server;
pub mod ui;

// Re-exports for convenient access
pub use analysis::{Analysis, AnalysisStats};
pub use facts::{FileFacts, ModelFacts, RouteFacts, RouterFacts, SchemaField};
pub use graph::{DependencyGraph, DependencyGraphBuilder};
pub use linker::{ResolvedRoute, RouterHierarchyResolver};
pub use router_id::RouterId;
pub use store::FactStore;

/// Result type alias for Routemap operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for Routemap operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Adapter error: {0}")]
    Adapter(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Invalid router id: {0}")]
    InvalidRouterId(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Message sent from scan workers to the coordinator
#[derive(Debug)]
pub enum ScanMessage {
    Extracted { file_key: String, facts: FileFacts },
    Failed { file_key: String, reason: String },
}
