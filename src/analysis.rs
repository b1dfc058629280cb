//! One full pass over a source tree: scan, resolve routes, build the graph.

use crate::adapter::{LanguageExtractor, PythonExtractor};
use crate::config::RoutemapConfig;
use crate::graph::{DependencyGraph, DependencyGraphBuilder};
use crate::filter::IgnoreFilter;
use crate::linker::{ResolutionStats, ResolvedRoute, RouterHierarchyResolver};
use crate::scan::{ScanFailure, Scanner};
use crate::store::{FactStore, StoreStats};
use crate::Result;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisStats {
    pub store: StoreStats,
    pub resolution: ResolutionStats,
    pub graph_nodes: usize,
    pub graph_edges: usize,
    pub failures: Vec<ScanFailure>,
    pub elapsed_ms: u128,
}

#[derive(Debug)]
pub struct Analysis {
    pub root: PathBuf,
    pub store: FactStore,
    pub routes: Vec<ResolvedRoute>,
    pub graph: DependencyGraph,
    pub stats: AnalysisStats,
}

impl Analysis {
    pub fn run(root: &Path, config: &RoutemapConfig, show_progress: bool) -> Result<Self> {
        let root = std::fs::canonicalize(root)?;
        let extractor = PythonExtractor::with_registry(config.adapter_registry()?);
        let filter = IgnoreFilter::new(&root, &config.exclude, config.respect_gitignore);

        let report = Scanner::new(&root, &extractor, filter)
            .with_threads(config.worker_count())
            .with_progress(show_progress)
            .scan()?;
        let store = report.store;

        let conventions = extractor.conventions();
        let (routes, resolution) = RouterHierarchyResolver::new(&store, conventions).resolve_with_stats();

        let root_str = root.to_string_lossy();
        let graph = DependencyGraphBuilder::new(&store, conventions, &root_str)
            .with_options(config.graph_options())
            .build();

        info!(
            "{} files, {} routes, {} graph nodes in {:?}",
            store.len(),
            routes.len(),
            graph.nodes.len(),
            report.elapsed
        );

        let stats = AnalysisStats {
            store: store.stats(),
            resolution,
            graph_nodes: graph.nodes.len(),
            graph_edges: graph.edges.len(),
            failures: report.failures,
            elapsed_ms: report.elapsed.as_millis(),
        };

        Ok(Self {
            root,
            store,
            routes,
            graph,
            stats,
        })
    }
}
