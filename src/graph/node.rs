//! Node implementation for the in-memory graph
//!
//! A node is addressed by the string key its source file gave it (an edge
//! list token, a GraphML `id`, a GML `label`, an openCypher `~id`).

use super::property::{PropertyMap, PropertyValue};
use super::types::{Label, NodeId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// A node in the property graph
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Node {
    /// Dense identifier for this node
    pub id: NodeId,

    /// Key the node was loaded under
    pub key: String,

    /// Labels (only openCypher collections carry these)
    pub labels: BTreeSet<Label>,

    /// Attributes associated with this node
    pub properties: PropertyMap,
}

impl Node {
    /// Create a new unlabeled node
    pub fn new(id: NodeId, key: impl Into<String>) -> Self {
        Node {
            id,
            key: key.into(),
            labels: BTreeSet::new(),
            properties: PropertyMap::new(),
        }
    }

    /// Add a label to this node
    pub fn add_label(&mut self, label: impl Into<Label>) {
        self.labels.insert(label.into());
    }

    /// Check if node has a specific label
    pub fn has_label(&self, label: &Label) -> bool {
        self.labels.contains(label)
    }

    /// Set a property value
    pub fn set_property(
        &mut self,
        key: impl Into<String>,
        value: impl Into<PropertyValue>,
    ) -> Option<PropertyValue> {
        self.properties.insert(key.into(), value.into())
    }

    /// Get a property value
    pub fn get_property(&self, key: &str) -> Option<&PropertyValue> {
        self.properties.get(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_labels_and_properties() {
        let mut node = Node::new(NodeId::new(0), "alice");
        node.add_label("Person");
        node.set_property("age", 30i64);

        assert_eq!(node.key, "alice");
        assert!(node.has_label(&Label::new("Person")));
        assert_eq!(node.get_property("age"), Some(&PropertyValue::Integer(30)));
        assert!(node.get_property("missing").is_none());
    }
}
