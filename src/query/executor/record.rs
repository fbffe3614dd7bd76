//! Record structures for query execution
//!
//! A record maps pattern variables to the graph elements (or computed
//! values) they are bound to for one match.

use crate::graph::{EdgeId, GraphStore, NodeId, PropertyValue};
use std::collections::HashMap;

/// Value types that can be bound to variables or produced by expressions
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Value {
    /// A node reference
    Node(NodeId),
    /// An edge reference
    Edge(EdgeId),
    /// Edges traversed by a variable-length relationship, in path order
    EdgeList(Vec<EdgeId>),
    /// A property value (including null)
    Property(PropertyValue),
}

impl Value {
    pub fn null() -> Self {
        Value::Property(PropertyValue::Null)
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Property(PropertyValue::Null))
    }

    pub fn as_property(&self) -> Option<&PropertyValue> {
        match self {
            Value::Property(p) => Some(p),
            _ => None,
        }
    }

    /// Result-table form: nodes become their key, edges their attribute map
    pub fn to_output(&self, store: &GraphStore) -> PropertyValue {
        match self {
            Value::Node(id) => store
                .get_node(*id)
                .map(|n| PropertyValue::String(n.key.clone()))
                .unwrap_or(PropertyValue::Null),
            Value::Edge(id) => edge_output(store, *id),
            Value::EdgeList(ids) => {
                PropertyValue::Array(ids.iter().map(|id| edge_output(store, *id)).collect())
            }
            Value::Property(p) => p.clone(),
        }
    }

    /// Short type description for error messages
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Node(_) => "Node",
            Value::Edge(_) => "Relationship",
            Value::EdgeList(_) => "List<Relationship>",
            Value::Property(p) => p.type_name(),
        }
    }
}

fn edge_output(store: &GraphStore, id: EdgeId) -> PropertyValue {
    store
        .get_edge(id)
        .map(|e| PropertyValue::Map(e.properties.clone()))
        .unwrap_or(PropertyValue::Null)
}

impl From<PropertyValue> for Value {
    fn from(value: PropertyValue) -> Self {
        Value::Property(value)
    }
}

/// A single record flowing through the query pipeline
#[derive(Debug, Clone, Default)]
pub struct Record {
    /// Variable bindings (variable name -> value)
    bindings: HashMap<String, Value>,
}

impl Record {
    /// Create a new empty record
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind a variable to a value
    pub fn bind(&mut self, variable: impl Into<String>, value: Value) {
        self.bindings.insert(variable.into(), value);
    }

    /// Get a bound value
    pub fn get(&self, variable: &str) -> Option<&Value> {
        self.bindings.get(variable)
    }

    /// Check if a variable is bound
    pub fn has(&self, variable: &str) -> bool {
        self.bindings.contains_key(variable)
    }
}
