//! Module Dependency Graph - file-level import graph with folder aggregation
//!
//! Nodes are identified by absolute path (scan root joined with the file
//! key) so a frontend can map them back onto the filesystem. Large graphs
//! are collapsed into one node per directory.

use crate::adapter::SourceConventions;
use crate::linker::ImportResolver;
use crate::store::FactStore;
use serde::Serialize;
use std::collections::HashSet;
use tracing::debug;

pub const DEFAULT_FOLDER_THRESHOLD: usize = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    File,
    Folder,
    External,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphNode {
    pub id: String,
    pub label: String,
    #[serde(rename = "type")]
    pub kind: NodeKind,
    pub is_external: bool,
}

impl GraphNode {
    fn file(id: String) -> Self {
        Self {
            label: last_segment(&id).to_string(),
            id,
            kind: NodeKind::File,
            is_external: false,
        }
    }

    fn folder(id: String) -> Self {
        Self {
            label: last_segment(&id).to_string(),
            id,
            kind: NodeKind::Folder,
            is_external: false,
        }
    }

    fn external(reference: &str) -> Self {
        Self {
            id: reference.to_string(),
            label: reference.to_string(),
            kind: NodeKind::External,
            is_external: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct GraphEdge {
    pub source: String,
    pub target: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DependencyGraph {
    pub nodes: Vec<GraphNode>,
    pub edges: Vec<GraphEdge>,
}

impl DependencyGraph {
    pub fn node(&self, id: &str) -> Option<&GraphNode> {
        self.nodes.iter().find(|n| n.id == id)
    }

    /// Whether the graph was collapsed into folders.
    pub fn is_aggregated(&self) -> bool {
        self.nodes.iter().any(|n| n.kind == NodeKind::Folder)
    }
}

/// Builder options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GraphOptions {
    /// Aggregate into folders above this many nodes
    pub folder_threshold: usize,
    /// Keep unresolved imports as `external` nodes
    pub include_external: bool,
}

impl Default for GraphOptions {
    fn default() -> Self {
        Self {
            folder_threshold: DEFAULT_FOLDER_THRESHOLD,
            include_external: false,
        }
    }
}

pub struct DependencyGraphBuilder<'a> {
    store: &'a FactStore,
    imports: ImportResolver<'a>,
    root: String,
    options: GraphOptions,
}

impl<'a> DependencyGraphBuilder<'a> {
    pub fn new(store: &'a FactStore, conventions: &'a SourceConventions, root: &str) -> Self {
        Self {
            store,
            imports: ImportResolver::new(store, conventions),
            root: root.replace('\\', "/").trim_end_matches('/').to_string(),
            options: GraphOptions::default(),
        }
    }

    pub fn with_options(mut self, options: GraphOptions) -> Self {
        self.options = options;
        self
    }

    fn node_id(&self, file_key: &str) -> String {
        if self.root.is_empty() {
            file_key.to_string()
        } else {
            format!("{}/{}", self.root, file_key)
        }
    }

    /// File-level graph, folded into folders above the threshold.
    ///
    /// Edges are unique per (source, target) pair already at file level: a
    /// file importing several names from one module yields a single edge.
    pub fn build(&self) -> DependencyGraph {
        let mut graph = GraphBuild::default();

        for file in self.store.files() {
            graph.add_node(GraphNode::file(self.node_id(&file.file_key)));
        }

        for file in self.store.files() {
            let source = self.node_id(&file.file_key);
            for reference in file.imports.values() {
                match self.imports.resolve(reference) {
                    Some(target) => {
                        let target = self.node_id(&target.file);
                        graph.add_node(GraphNode::file(target.clone()));
                        graph.add_edge(&source, &target);
                    }
                    None if self.options.include_external => {
                        graph.add_node(GraphNode::external(reference));
                        graph.add_edge(&source, reference);
                    }
                    None => {}
                }
            }
        }

        let graph = graph.finish();
        if graph.nodes.len() > self.options.folder_threshold {
            debug!(
                "{} nodes exceed threshold {}, aggregating by folder",
                graph.nodes.len(),
                self.options.folder_threshold
            );
            aggregate_by_folder(&graph)
        } else {
            graph
        }
    }
}

/// Collapse file nodes into their parent directories.
pub fn aggregate_by_folder(graph: &DependencyGraph) -> DependencyGraph {
    let mut folders = GraphBuild::default();

    let group_of = |id: &str| -> String {
        match graph.node(id) {
            Some(node) if node.kind == NodeKind::External => node.id.clone(),
            _ => parent_dir(id).to_string(),
        }
    };

    for node in &graph.nodes {
        if node.kind == NodeKind::External {
            folders.add_node(node.clone());
        } else {
            folders.add_node(GraphNode::folder(parent_dir(&node.id).to_string()));
        }
    }

    for edge in &graph.edges {
        let source = group_of(&edge.source);
        let target = group_of(&edge.target);
        if source != target {
            folders.add_edge(&source, &target);
        }
    }

    folders.finish()
}

/// Insertion-ordered node and edge sets.
#[derive(Default)]
struct GraphBuild {
    graph: DependencyGraph,
    node_ids: HashSet<String>,
    edge_keys: HashSet<(String, String)>,
}

impl GraphBuild {
    fn add_node(&mut self, node: GraphNode) {
        if self.node_ids.insert(node.id.clone()) {
            self.graph.nodes.push(node);
        }
    }

    fn add_edge(&mut self, source: &str, target: &str) {
        if self.edge_keys.insert((source.to_string(), target.to_string())) {
            self.graph.edges.push(GraphEdge {
                source: source.to_string(),
                target: target.to_string(),
            });
        }
    }

    fn finish(self) -> DependencyGraph {
        self.graph
    }
}

fn last_segment(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

fn parent_dir(path: &str) -> &str {
    path.rsplit_once('/').map(|(dir, _)| dir).unwrap_or("")
}
