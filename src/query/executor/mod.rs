//! Query execution
//!
//! MATCH clauses run in order through the backtracking [`PatternMatcher`],
//! each one extending the records produced by the previous clause. The
//! surviving records are then projected through RETURN.

pub mod eval;
pub mod matcher;
pub mod projection;
pub mod record;

pub use matcher::PatternMatcher;
pub use record::{Record, Value};

use crate::graph::{GraphError, GraphStore};
use crate::query::ast::Query;
use crate::result::TabularResult;
use thiserror::Error;
use tracing::debug;

/// Execution errors
#[derive(Error, Debug)]
pub enum ExecutionError {
    /// Graph store error
    #[error("Graph error: {0}")]
    GraphError(String),

    /// Query shape the executor cannot evaluate
    #[error("Planning error: {0}")]
    PlanningError(String),

    /// Runtime error
    #[error("Runtime error: {0}")]
    RuntimeError(String),

    /// Type error
    #[error("Type error: {0}")]
    TypeError(String),

    /// Variable not found
    #[error("Variable not found: {0}")]
    VariableNotFound(String),
}

impl From<GraphError> for ExecutionError {
    fn from(e: GraphError) -> Self {
        ExecutionError::GraphError(e.to_string())
    }
}

pub type ExecutionResult<T> = Result<T, ExecutionError>;

/// Query executor for read-only queries
pub struct QueryExecutor<'a> {
    store: &'a GraphStore,
}

impl<'a> QueryExecutor<'a> {
    /// Create a new query executor
    pub fn new(store: &'a GraphStore) -> Self {
        Self { store }
    }

    /// Execute a query and return its table
    pub fn execute(&self, query: &Query) -> ExecutionResult<TabularResult> {
        let matcher = PatternMatcher::new(self.store);
        let mut records = vec![Record::new()];
        for clause in &query.match_clauses {
            records = matcher.match_clause(clause, records)?;
            debug!(records = records.len(), "MATCH clause evaluated");
        }
        projection::project(query, records, self.store)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{EdgeType, Label, PropertyMap, PropertyValue};
    use crate::query::parser::parse_query;

    fn people() -> GraphStore {
        let mut store = GraphStore::directed();
        let rows = [
            ("alice", "Alice", Some(30i64), "Berlin"),
            ("bob", "Bob", Some(25), "Paris"),
            ("carol", "Carol", Some(35), "Berlin"),
            ("dave", "Dave", None, "Paris"),
        ];
        for (key, name, age, city) in rows {
            let id = store.add_node(key);
            store.add_label(id, Label::new("Person")).unwrap();
            let node = store.get_node_mut(id).unwrap();
            node.set_property("name", name);
            node.set_property("city", city);
            if let Some(age) = age {
                node.set_property("age", age);
            }
        }
        for (src, tgt, since) in [("alice", "bob", 2010i64), ("alice", "carol", 2015), ("bob", "carol", 2020)] {
            let mut props = PropertyMap::new();
            props.insert("since".to_string(), PropertyValue::Integer(since));
            let e = store.add_edge(src, tgt, props);
            store.get_edge_mut(e).unwrap().types.push(EdgeType::new("KNOWS"));
        }
        store
    }

    fn run(store: &GraphStore, text: &str) -> ExecutionResult<TabularResult> {
        let query = parse_query(text).unwrap();
        QueryExecutor::new(store).execute(&query)
    }

    fn v(value: impl Into<PropertyValue>) -> PropertyValue {
        value.into()
    }

    fn column(result: &TabularResult, index: usize) -> Vec<PropertyValue> {
        result.rows().iter().map(|row| row[index].clone()).collect()
    }

    #[test]
    fn test_nodes_project_as_keys() {
        let store = people();
        let result = run(&store, "MATCH (n:Person) RETURN n ORDER BY n.name").unwrap();
        assert_eq!(result.columns(), &["n".to_string()]);
        assert_eq!(
            column(&result, 0),
            vec![v("alice"), v("bob"), v("carol"), v("dave")]
        );
    }

    #[test]
    fn test_relationships_project_as_attribute_maps() {
        let store = people();
        let result = run(&store, "MATCH (:Person {name: 'Bob'})-[r]->() RETURN r").unwrap();
        let mut expected = PropertyMap::new();
        expected.insert("since".to_string(), PropertyValue::Integer(2020));
        assert_eq!(column(&result, 0), vec![PropertyValue::Map(expected)]);
    }

    #[test]
    fn test_is_not_null_filter() {
        let store = people();
        let result = run(&store, "MATCH (n:Person) WHERE n.age IS NULL RETURN n.name").unwrap();
        assert_eq!(column(&result, 0), vec![v("Dave")]);
    }

    #[test]
    fn test_grouped_aggregation_keeps_first_seen_group_order() {
        let store = people();
        let result = run(
            &store,
            "MATCH (n:Person) RETURN n.city AS city, count(*) AS people, avg(n.age) AS mean",
        )
        .unwrap();
        assert_eq!(result.columns(), &["city", "people", "mean"]);
        assert_eq!(
            result.rows(),
            &[
                vec![v("Berlin"), v(2), v(32.5)],
                vec![v("Paris"), v(2), v(25.0)],
            ]
        );
    }

    #[test]
    fn test_aggregates_over_empty_input() {
        let store = people();
        let result = run(&store, "MATCH (n:Robot) RETURN count(n), sum(n.age), collect(n)").unwrap();
        assert_eq!(
            result.rows(),
            &[vec![v(0), v(0), PropertyValue::Array(vec![])]]
        );

        let grouped = run(&store, "MATCH (n:Robot) RETURN n.city, count(n)").unwrap();
        assert!(grouped.is_empty());
    }

    #[test]
    fn test_count_distinct_and_min_max() {
        let store = people();
        let result = run(
            &store,
            "MATCH (n:Person) RETURN count(DISTINCT n.city), min(n.age), max(n.name)",
        )
        .unwrap();
        assert_eq!(result.rows(), &[vec![v(2), v(25), v("Dave")]]);
    }

    #[test]
    fn test_order_by_alias_desc_with_skip_and_limit() {
        let store = people();
        let result = run(
            &store,
            "MATCH (n:Person) WHERE n.age IS NOT NULL RETURN n.name AS name, n.age AS age ORDER BY age DESC SKIP 1 LIMIT 1",
        )
        .unwrap();
        assert_eq!(result.rows(), &[vec![v("Alice"), v(30)]]);
    }

    #[test]
    fn test_order_by_expression_not_returned() {
        let store = people();
        let result = run(&store, "MATCH (n:Person) RETURN n.name ORDER BY n.age").unwrap();
        // nulls sort last
        assert_eq!(
            column(&result, 0),
            vec![v("Bob"), v("Alice"), v("Carol"), v("Dave")]
        );
    }

    #[test]
    fn test_return_distinct() {
        let store = people();
        let result = run(&store, "MATCH (n:Person) RETURN DISTINCT n.city ORDER BY n.city").unwrap();
        assert_eq!(column(&result, 0), vec![v("Berlin"), v("Paris")]);
    }

    #[test]
    fn test_default_column_names_use_expression_text() {
        let store = people();
        let result = run(&store, "MATCH (a)-[:KNOWS]->(b) RETURN a.name, count(b)").unwrap();
        assert_eq!(result.columns(), &["a.name", "count(b)"]);
        assert_eq!(
            result.rows(),
            &[vec![v("Alice"), v(2)], vec![v("Bob"), v(1)]]
        );
    }

    #[test]
    fn test_nested_aggregate_is_rejected() {
        let store = people();
        assert!(matches!(
            run(&store, "MATCH (n) RETURN count(n) + 1"),
            Err(ExecutionError::PlanningError(_))
        ));
    }

    #[test]
    fn test_duplicate_column_names_are_rejected() {
        let store = people();
        for query in [
            "MATCH (a)-[:KNOWS]->(b) RETURN a AS x, b AS x",
            "MATCH (n) RETURN n.name, n.name",
            "MATCH (n) RETURN n.age AS name, n.name",
        ] {
            match run(&store, query) {
                Err(ExecutionError::PlanningError(message)) => {
                    assert!(message.contains("same name"), "{}", message)
                }
                other => panic!("{} should be rejected, got {:?}", query, other),
            }
        }
    }

    #[test]
    fn test_unknown_variable_in_return() {
        let store = people();
        assert!(matches!(
            run(&store, "MATCH (n) RETURN m"),
            Err(ExecutionError::VariableNotFound(_))
        ));
    }
}
