//! grandlite
//!
//! Load a graph from a local file, a URL or a set of openCypher CSV files,
//! then query it with Cypher or DotMotif, interactively or in batch.
//!
//! # Architecture
//!
//! - [`source`]: classifies a location and loads it into a [`GraphStore`]
//!   (edge lists, GML, GraphML, vertex/edge collections, remote files)
//! - [`query`]: Cypher parser and backtracking executor
//! - [`motif`]: DotMotif parser and subgraph monomorphism search
//! - [`session`]: one language bound to one graph, with the last result cached
//! - [`export`]: CSV, JSON, JSON lines, Markdown and HTML writers
//! - [`shell`]: REPL and batch drivers
//!
//! ## Example Usage
//!
//! ```rust
//! use grandlite::graph::{GraphStore, PropertyMap};
//! use grandlite::session::{open_session, Language};
//! use std::sync::Arc;
//!
//! let mut store = GraphStore::directed();
//! store.add_edge("A", "B", PropertyMap::new());
//! store.add_edge("B", "C", PropertyMap::new());
//!
//! let graph = Arc::new(store);
//! let cypher = open_session(Language::Cypher, graph.clone());
//! let table = cypher.run_query("MATCH (a)-->(b) RETURN a, b").unwrap();
//! assert_eq!(table.row_count(), 2);
//!
//! let motifs = open_session(Language::DotMotif, graph);
//! assert_eq!(motifs.run_query("X -> Y\nY -> Z").unwrap().row_count(), 1);
//! ```

#![allow(missing_docs)]
#![warn(clippy::all)]

pub mod export;
pub mod graph;
pub mod motif;
pub mod query;
pub mod result;
pub mod session;
pub mod shell;
pub mod source;

// Re-export main types for convenience
pub use graph::{
    Edge, EdgeId, EdgeType, GraphError, GraphHandle, GraphResult, GraphStore, Label, Node, NodeId,
    PropertyMap, PropertyValue,
};

pub use export::{save, write_result, ExportFormat};
pub use query::{parse_query, CypherError, Query, QueryEngine};
pub use result::TabularResult;
pub use session::{open_session, InputMode, Language, QueryError, QuerySession, SessionError};
pub use source::{resolve, Resolver, ResolverConfig, SourceError, SourceKind};

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Get version string
pub fn version() -> &'static str {
    VERSION
}
