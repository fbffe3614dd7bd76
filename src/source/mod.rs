//! Graph-source resolution
//!
//! A source location (local path, URL, scheme-prefixed path or vertex/edge
//! collection) is turned into a single read-only [`GraphHandle`]:
//!
//! 1. remote locations are downloaded to a temporary file,
//! 2. the location is classified into a [`SourceKind`],
//! 3. the matching loader builds the graph.
//!
//! Every failure here is fatal for the run; nothing downstream can proceed
//! without a graph.

pub mod collection;
pub mod edgelist;
pub mod fetch;
pub mod gml;
pub mod graphml;
pub mod kind;
pub mod sniff;

pub use kind::{classify, SourceKind};
pub use sniff::guess_delimiter;

use crate::graph::{GraphError, GraphHandle, GraphStore};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::info;

/// Errors raised while resolving or loading a graph source
#[derive(Error, Debug)]
pub enum SourceError {
    #[error("could not fetch {url}: {message}")]
    Unreachable { url: String, message: String },

    #[error("could not determine the graph format of '{0}'")]
    Unclassifiable(String),

    #[error("malformed row at line {line}: expected {expected} fields, found {found}")]
    MalformedRow {
        line: u64,
        expected: usize,
        found: usize,
    },

    #[error("column '{column}' not found in the header of {path}")]
    MissingColumn { column: String, path: String },

    #[error("could not determine the delimiter")]
    UndeterminedDelimiter,

    #[error("unsupported graph format: {0}")]
    UnsupportedFormat(String),

    #[error("{format} parse error: {message}")]
    Parse {
        format: &'static str,
        message: String,
    },

    #[error("graph error: {0}")]
    Graph(#[from] GraphError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

pub type SourceResult<T> = Result<T, SourceError>;

/// Bounds for the resolver's network and sniffing work
#[derive(Debug, Clone)]
pub struct ResolverConfig {
    /// Timeout for the whole remote download
    pub fetch_timeout: Duration,
    /// Bytes read when sniffing file contents
    pub sniff_bytes: usize,
    /// Leading lines sampled for delimiter detection
    pub sniff_lines: usize,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            fetch_timeout: Duration::from_secs(30),
            sniff_bytes: 500,
            sniff_lines: 5,
        }
    }
}

/// Resolves source locations into graph handles
#[derive(Debug, Clone, Default)]
pub struct Resolver {
    config: ResolverConfig,
}

impl Resolver {
    pub fn new(config: ResolverConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    /// Resolve a location into a loaded, immutable graph
    pub fn resolve(&self, location: &str) -> SourceResult<GraphHandle> {
        info!(%location, "resolving graph source");

        // The download must outlive loading; it is deleted on drop
        let downloaded = if fetch::is_remote(location) {
            Some(fetch::fetch_to_temp(location, self.config.fetch_timeout)?)
        } else {
            None
        };
        let local = match &downloaded {
            Some(path) => path.to_string_lossy().into_owned(),
            None => location.to_string(),
        };

        let kind = classify(&local, &self.config)?;
        info!(kind = kind.name(), "classified graph source");
        let store = self.load(&kind)?;
        info!(
            nodes = store.node_count(),
            edges = store.edge_count(),
            directed = store.is_directed(),
            "graph loaded"
        );
        Ok(Arc::new(store))
    }

    /// Run the loader for an already classified source
    pub fn load(&self, kind: &SourceKind) -> SourceResult<GraphStore> {
        match kind {
            SourceKind::HeaderedEdgeList {
                source_column,
                target_column,
                path,
            } => edgelist::load_headered_edge_list(path, source_column, target_column, &self.config),
            SourceKind::EdgeList { path } => edgelist::load_edge_list(path, &self.config),
            SourceKind::Gml { path, compressed } => gml::load_gml(path, *compressed),
            SourceKind::GraphMl { path, compressed } => graphml::load_graphml(path, *compressed),
            SourceKind::LegacyPickle { path } => Err(SourceError::UnsupportedFormat(format!(
                "{} is a Python pickle; convert it to GraphML or GML first",
                path.display()
            ))),
            SourceKind::Collection {
                vertex_files,
                edge_files,
            } => collection::load_collection(vertex_files, edge_files),
        }
    }
}

/// Resolve a location with the default configuration
pub fn resolve(location: &str) -> SourceResult<GraphHandle> {
    Resolver::default().resolve(location)
}
