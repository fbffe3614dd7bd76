//! Cypher query processing
//!
//! Supports the read-only core of openCypher:
//! - Pattern matching over one or more MATCH clauses
//! - WHERE filtering with Cypher null semantics
//! - RETURN projections, aggregation and DISTINCT
//! - ORDER BY, SKIP and LIMIT
//!
//! Text is parsed with a pest grammar into [`ast::Query`] and then executed
//! by a backtracking matcher against a [`GraphStore`].

pub mod ast;
pub mod executor;
pub mod parser;

// Re-export main types
pub use ast::Query;
pub use executor::{ExecutionError, ExecutionResult, QueryExecutor, Record, Value};
pub use parser::{parse_query, ParseError, ParseResult};

use crate::graph::GraphStore;
use crate::result::TabularResult;
use thiserror::Error;

/// Any failure while running Cypher text
#[derive(Error, Debug)]
pub enum CypherError {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Execution(#[from] ExecutionError),
}

/// Query engine - high-level interface for executing queries
#[derive(Debug, Default, Clone, Copy)]
pub struct QueryEngine;

impl QueryEngine {
    /// Create a new query engine
    pub fn new() -> Self {
        Self
    }

    /// Parse and execute a read-only Cypher query
    pub fn execute(&self, query_str: &str, store: &GraphStore) -> Result<TabularResult, CypherError> {
        let query = parse_query(query_str)?;
        let executor = QueryExecutor::new(store);
        Ok(executor.execute(&query)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::PropertyMap;

    #[test]
    fn test_engine_reports_parse_and_execution_errors() {
        let mut store = GraphStore::directed();
        store.add_node("a");
        let engine = QueryEngine::new();
        assert!(matches!(
            engine.execute("MATCH (n RETURN n", &store),
            Err(CypherError::Parse(_))
        ));
        assert!(matches!(
            engine.execute("MATCH (n) RETURN 1 / 0", &store),
            Err(CypherError::Execution(ExecutionError::RuntimeError(_)))
        ));
    }

    #[test]
    fn test_engine_runs_against_store() {
        let mut store = GraphStore::undirected();
        store.add_edge("1", "2", PropertyMap::new());
        store.add_edge("2", "3", PropertyMap::new());
        let result = QueryEngine::new()
            .execute("MATCH (a)--(b) WHERE a.missing IS NULL RETURN count(*) AS pairs", &store)
            .unwrap();
        assert_eq!(result.columns(), &["pairs"]);
        assert_eq!(result.rows()[0][0], crate::graph::PropertyValue::Integer(4));
    }
}
