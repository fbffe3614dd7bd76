//! In-memory property graph
//!
//! This module implements the graph every loader produces and every query
//! engine reads:
//! - Nodes keyed by the string their source file used, with attributes
//! - Directed or undirected edges with attributes, parallel edges allowed
//! - Optional node labels and edge types (openCypher collections)

pub mod edge;
pub mod node;
pub mod property;
pub mod store;
pub mod types;

use std::sync::Arc;

// Re-export main types
pub use edge::Edge;
pub use node::Node;
pub use property::{PropertyMap, PropertyValue};
pub use store::{GraphError, GraphResult, GraphStore};
pub use types::{EdgeId, EdgeType, Label, NodeId};

/// Shared, read-only handle to the loaded graph
pub type GraphHandle = Arc<GraphStore>;
