//! In-memory graph storage
//!
//! Nodes and edges live in dense arenas indexed by `NodeId` / `EdgeId`, with
//! adjacency lists kept in both directions so that pattern matchers can walk
//! edges either way without scanning.

use super::edge::Edge;
use super::node::Node;
use super::property::PropertyMap;
use super::types::{EdgeId, Label, NodeId};
use std::collections::HashMap;
use thiserror::Error;

/// Errors that can occur during graph operations
#[derive(Error, Debug, PartialEq)]
pub enum GraphError {
    #[error("Node {0} not found")]
    NodeNotFound(NodeId),

    #[error("Edge {0} not found")]
    EdgeNotFound(EdgeId),
}

pub type GraphResult<T> = Result<T, GraphError>;

/// In-memory graph storage
///
/// - nodes: NodeId -> Node (arena)
/// - edges: EdgeId -> Edge (arena)
/// - node_index: node key -> NodeId
/// - outgoing / incoming: NodeId -> Vec<EdgeId>
/// - label_index: Label -> Vec<NodeId>
#[derive(Debug, Clone)]
pub struct GraphStore {
    directed: bool,
    nodes: Vec<Node>,
    edges: Vec<Edge>,
    node_index: HashMap<String, NodeId>,
    outgoing: Vec<Vec<EdgeId>>,
    incoming: Vec<Vec<EdgeId>>,
    label_index: HashMap<Label, Vec<NodeId>>,
}

impl GraphStore {
    /// Create a new empty graph
    pub fn new(directed: bool) -> Self {
        GraphStore {
            directed,
            nodes: Vec::new(),
            edges: Vec::new(),
            node_index: HashMap::new(),
            outgoing: Vec::new(),
            incoming: Vec::new(),
            label_index: HashMap::new(),
        }
    }

    /// Create a new empty directed graph
    pub fn directed() -> Self {
        Self::new(true)
    }

    /// Create a new empty undirected graph
    pub fn undirected() -> Self {
        Self::new(false)
    }

    /// Whether edge orientation is significant
    pub fn is_directed(&self) -> bool {
        self.directed
    }

    /// Get or create the node with the given key
    pub fn add_node(&mut self, key: impl Into<String>) -> NodeId {
        let key = key.into();
        if let Some(id) = self.node_index.get(&key) {
            return *id;
        }
        let id = NodeId::new(self.nodes.len() as u64);
        self.nodes.push(Node::new(id, key.clone()));
        self.outgoing.push(Vec::new());
        self.incoming.push(Vec::new());
        self.node_index.insert(key, id);
        id
    }

    /// Attach a label to a node, keeping the label index current
    pub fn add_label(&mut self, id: NodeId, label: impl Into<Label>) -> GraphResult<()> {
        let label = label.into();
        let node = self
            .nodes
            .get_mut(id.index())
            .ok_or(GraphError::NodeNotFound(id))?;
        if !node.has_label(&label) {
            node.add_label(label.clone());
            self.label_index.entry(label).or_default().push(id);
        }
        Ok(())
    }

    /// Add an edge between two node keys, creating missing nodes.
    ///
    /// Repeated (source, target) pairs produce parallel edges.
    pub fn add_edge(
        &mut self,
        source: impl Into<String>,
        target: impl Into<String>,
        properties: PropertyMap,
    ) -> EdgeId {
        let src = self.add_node(source);
        let tgt = self.add_node(target);
        self.push_edge(src, tgt, properties)
    }

    /// Add an edge between two existing nodes
    pub fn add_edge_between(
        &mut self,
        source: NodeId,
        target: NodeId,
        properties: PropertyMap,
    ) -> GraphResult<EdgeId> {
        if source.index() >= self.nodes.len() {
            return Err(GraphError::NodeNotFound(source));
        }
        if target.index() >= self.nodes.len() {
            return Err(GraphError::NodeNotFound(target));
        }
        Ok(self.push_edge(source, target, properties))
    }

    fn push_edge(&mut self, source: NodeId, target: NodeId, properties: PropertyMap) -> EdgeId {
        let id = EdgeId::new(self.edges.len() as u64);
        self.edges.push(Edge::new(id, source, target, properties));
        self.outgoing[source.index()].push(id);
        self.incoming[target.index()].push(id);
        id
    }

    /// Get a node by ID
    pub fn get_node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.index())
    }

    /// Get a mutable node by ID (labels must go through `add_label`)
    pub fn get_node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(id.index())
    }

    /// Look up a node ID by key
    pub fn node_id(&self, key: &str) -> Option<NodeId> {
        self.node_index.get(key).copied()
    }

    /// Look up a node by key
    pub fn node_by_key(&self, key: &str) -> Option<&Node> {
        self.node_id(key).and_then(|id| self.get_node(id))
    }

    /// Get an edge by ID
    pub fn get_edge(&self, id: EdgeId) -> Option<&Edge> {
        self.edges.get(id.index())
    }

    /// Get a mutable edge by ID
    pub fn get_edge_mut(&mut self, id: EdgeId) -> Option<&mut Edge> {
        self.edges.get_mut(id.index())
    }

    /// All nodes in insertion order
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.iter()
    }

    /// All edges in insertion order
    pub fn edges(&self) -> impl Iterator<Item = &Edge> {
        self.edges.iter()
    }

    /// Edges stored with `id` as their source
    pub fn outgoing_edges(&self, id: NodeId) -> &[EdgeId] {
        self.outgoing.get(id.index()).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Edges stored with `id` as their target
    pub fn incoming_edges(&self, id: NodeId) -> &[EdgeId] {
        self.incoming.get(id.index()).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Edges joining `source` to `target`. In an undirected graph both
    /// stored orientations qualify.
    pub fn edges_between(&self, source: NodeId, target: NodeId) -> Vec<EdgeId> {
        let mut found: Vec<EdgeId> = self
            .outgoing_edges(source)
            .iter()
            .copied()
            .filter(|e| self.edges[e.index()].target == target)
            .collect();
        if !self.directed && source != target {
            found.extend(
                self.outgoing_edges(target)
                    .iter()
                    .copied()
                    .filter(|e| self.edges[e.index()].target == source),
            );
        }
        found
    }

    /// Nodes carrying a label
    pub fn nodes_with_label(&self, label: &Label) -> &[NodeId] {
        self.label_index.get(label).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Number of outgoing edges (all incident edges when undirected)
    pub fn out_degree(&self, id: NodeId) -> usize {
        if self.directed {
            self.outgoing_edges(id).len()
        } else {
            self.degree(id)
        }
    }

    /// Number of incoming edges (all incident edges when undirected)
    pub fn in_degree(&self, id: NodeId) -> usize {
        if self.directed {
            self.incoming_edges(id).len()
        } else {
            self.degree(id)
        }
    }

    /// Number of incident edge endpoints
    pub fn degree(&self, id: NodeId) -> usize {
        self.outgoing_edges(id).len() + self.incoming_edges(id).len()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }
}

impl Default for GraphStore {
    fn default() -> Self {
        Self::directed()
    }
}
