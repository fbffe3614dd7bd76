//! Cypher session

use super::{format_status, InputMode, Language, QueryError, QuerySession, ResultCache, SessionError};
use crate::graph::GraphHandle;
use crate::query::QueryEngine;
use crate::result::TabularResult;

pub struct CypherSession {
    graph: GraphHandle,
    engine: QueryEngine,
    cache: ResultCache,
}

impl CypherSession {
    pub fn new(graph: GraphHandle) -> Self {
        Self {
            graph,
            engine: QueryEngine::new(),
            cache: ResultCache::new(),
        }
    }

    pub fn cache(&self) -> &ResultCache {
        &self.cache
    }
}

impl QuerySession for CypherSession {
    fn language(&self) -> Language {
        Language::Cypher
    }

    fn prompt_label(&self) -> String {
        "cypher> ".to_string()
    }

    fn input_mode(&self) -> InputMode {
        InputMode { multiline: false }
    }

    fn status_line(&self) -> String {
        format_status(self.language(), &self.graph, &self.cache)
    }

    fn run_query(&self, text: &str) -> Result<TabularResult, QueryError> {
        Ok(self.engine.execute(text, &self.graph)?)
    }

    fn submit(&mut self, text: &str) -> Result<String, SessionError> {
        let (graph, engine) = (&self.graph, &self.engine);
        self.cache.submit(text, |q| Ok(engine.execute(q, graph)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{GraphStore, PropertyMap};
    use std::sync::Arc;

    fn session() -> CypherSession {
        let mut store = GraphStore::directed();
        store.add_edge("A", "B", PropertyMap::new());
        store.add_edge("B", "C", PropertyMap::new());
        CypherSession::new(Arc::new(store))
    }

    #[test]
    fn test_status_line_tracks_last_result() {
        let mut session = session();
        assert_eq!(session.status_line(), "Language: Cypher    Vertices: 3    Edges: 2");
        session.submit("MATCH (a)-->(b) RETURN a, b").unwrap();
        assert_eq!(
            session.status_line(),
            "Language: Cypher    Vertices: 3    Edges: 2    Last results: 2"
        );
    }

    #[test]
    fn test_submit_renders_markdown() {
        let mut session = session();
        let out = session.submit("MATCH (a)-->(b) WHERE a = 'x' OR b IS NOT NULL RETURN a ORDER BY a").unwrap();
        assert_eq!(out, "| a |\n| --- |\n| A |\n| B |\n");
    }

    #[test]
    fn test_error_keeps_previous_result() {
        let mut session = session();
        session.submit("MATCH (a) RETURN a").unwrap();
        assert!(session.submit("MATCH (a RETURN a").is_err());
        assert_eq!(session.cache().row_count(), Some(3));
    }

    #[test]
    fn test_repeated_queries_are_idempotent() {
        let session = session();
        let first = session.run_query("MATCH (a)-->(b) RETURN a, b").unwrap();
        let second = session.run_query("MATCH (a)-->(b) RETURN a, b").unwrap();
        assert_eq!(first, second);
    }
}
