//! Edge implementation for the in-memory graph
//!
//! Edges are stored source -> target. Whether that orientation matters is a
//! property of the owning store (see `GraphStore::is_directed`). Several
//! edges may join the same pair of nodes.

use super::property::{PropertyMap, PropertyValue};
use super::types::{EdgeId, EdgeType, NodeId};
use serde::{Deserialize, Serialize};

/// An edge in the property graph
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Edge {
    /// Dense identifier for this edge
    pub id: EdgeId,

    /// Source node (edge goes FROM this node)
    pub source: NodeId,

    /// Target node (edge goes TO this node)
    pub target: NodeId,

    /// Relationship types (only openCypher collections carry these)
    pub types: Vec<EdgeType>,

    /// Attributes associated with this edge
    pub properties: PropertyMap,
}

impl Edge {
    /// Create a new edge with properties
    pub fn new(id: EdgeId, source: NodeId, target: NodeId, properties: PropertyMap) -> Self {
        Edge {
            id,
            source,
            target,
            types: Vec::new(),
            properties,
        }
    }

    /// Check if edge carries a relationship type
    pub fn has_type(&self, edge_type: &EdgeType) -> bool {
        self.types.contains(edge_type)
    }

    /// Get a property value
    pub fn get_property(&self, key: &str) -> Option<&PropertyValue> {
        self.properties.get(key)
    }

    /// Check if this is a self-loop
    pub fn is_self_loop(&self) -> bool {
        self.source == self.target
    }

    /// The endpoint opposite `node`, if `node` is an endpoint
    pub fn other_end(&self, node: NodeId) -> Option<NodeId> {
        if node == self.source {
            Some(self.target)
        } else if node == self.target {
            Some(self.source)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_edge_endpoints() {
        let mut props = PropertyMap::new();
        props.insert("weight".to_string(), "5".into());
        let mut edge = Edge::new(EdgeId::new(0), NodeId::new(1), NodeId::new(2), props);
        edge.types.push(EdgeType::new("KNOWS"));

        assert!(edge.has_type(&EdgeType::new("KNOWS")));
        assert!(!edge.is_self_loop());
        assert_eq!(edge.other_end(NodeId::new(1)), Some(NodeId::new(2)));
        assert_eq!(edge.other_end(NodeId::new(9)), None);
        assert_eq!(edge.get_property("weight"), Some(&PropertyValue::from("5")));
    }
}
