//! Backtracking pattern matcher for MATCH clauses
//!
//! Each clause extends every incoming record with all bindings of its
//! paths. Relationships bound within one clause are never reused by that
//! clause, and a variable that is already bound pins the element it refers
//! to.

use super::eval::{evaluate, is_true, values_equal};
use super::record::{Record, Value};
use super::{ExecutionError, ExecutionResult};
use crate::graph::{EdgeId, GraphStore, NodeId};
use crate::query::ast::{Direction, EdgePattern, Expression, MatchClause, NodePattern, PathPattern, PathSegment};
use std::collections::HashSet;

/// Partial match: bindings so far plus the relationships they consumed
#[derive(Debug, Clone, Default)]
struct State {
    record: Record,
    used: HashSet<EdgeId>,
}

pub struct PatternMatcher<'a> {
    store: &'a GraphStore,
}

impl<'a> PatternMatcher<'a> {
    pub fn new(store: &'a GraphStore) -> Self {
        Self { store }
    }

    /// Apply one MATCH clause (and its WHERE) to a set of input records
    pub fn match_clause(&self, clause: &MatchClause, input: Vec<Record>) -> ExecutionResult<Vec<Record>> {
        let mut output = Vec::new();
        for record in input {
            let state = State {
                record,
                used: HashSet::new(),
            };
            let mut matched = Vec::new();
            self.match_paths(&clause.pattern.paths, state, &mut matched)?;

            for record in matched {
                let keep = match &clause.where_clause {
                    Some(where_clause) => is_true(&evaluate(&where_clause.predicate, &record, self.store)?),
                    None => true,
                };
                if keep {
                    output.push(record);
                }
            }
        }
        Ok(output)
    }

    fn match_paths(&self, paths: &[PathPattern], state: State, out: &mut Vec<Record>) -> ExecutionResult<()> {
        let Some((path, rest)) = paths.split_first() else {
            out.push(state.record);
            return Ok(());
        };

        let mut partials = Vec::new();
        for candidate in self.start_candidates(&path.start, &state.record)? {
            if let Some(bound) = self.bind_node(&path.start, candidate, state.clone())? {
                self.extend(&path.segments, candidate, bound, &mut partials)?;
            }
        }
        for partial in partials {
            self.match_paths(rest, partial, out)?;
        }
        Ok(())
    }

    fn start_candidates(&self, pattern: &NodePattern, record: &Record) -> ExecutionResult<Vec<NodeId>> {
        if let Some(variable) = &pattern.variable {
            match record.get(variable) {
                Some(Value::Node(id)) => return Ok(vec![*id]),
                Some(other) => {
                    return Err(ExecutionError::TypeError(format!(
                        "Variable '{}' is bound to a {}, not a node",
                        variable,
                        other.type_name()
                    )))
                }
                None => {}
            }
        }
        Ok(match pattern.labels.first() {
            Some(label) => self.store.nodes_with_label(label).to_vec(),
            None => self.store.nodes().map(|n| n.id).collect(),
        })
    }

    /// Check a node against its pattern and bind it; `None` when it does not fit
    fn bind_node(&self, pattern: &NodePattern, id: NodeId, mut state: State) -> ExecutionResult<Option<State>> {
        let Some(node) = self.store.get_node(id) else {
            return Err(ExecutionError::GraphError(format!("Node {} not found", id)));
        };
        if !pattern.labels.iter().all(|l| node.has_label(l)) {
            return Ok(None);
        }
        if let Some(variable) = &pattern.variable {
            match state.record.get(variable) {
                Some(Value::Node(bound)) if *bound != id => return Ok(None),
                Some(Value::Node(_)) | None => {}
                Some(other) => {
                    return Err(ExecutionError::TypeError(format!(
                        "Variable '{}' is bound to a {}, not a node",
                        variable,
                        other.type_name()
                    )))
                }
            }
        }
        if !self.properties_match(&pattern.properties, Value::Node(id), &state.record)? {
            return Ok(None);
        }
        if let Some(variable) = &pattern.variable {
            state.record.bind(variable.clone(), Value::Node(id));
        }
        Ok(Some(state))
    }

    fn properties_match(
        &self,
        constraints: &[(String, Expression)],
        element: Value,
        record: &Record,
    ) -> ExecutionResult<bool> {
        for (key, expected) in constraints {
            let expected = evaluate(expected, record, self.store)?;
            let actual = match element {
                Value::Node(id) => self.store.get_node(id).and_then(|n| n.get_property(key)),
                Value::Edge(id) => self.store.get_edge(id).and_then(|e| e.get_property(key)),
                _ => None,
            };
            let Some(actual) = actual else {
                return Ok(false);
            };
            if values_equal(&Value::Property(actual.clone()), &expected) != Some(true) {
                return Ok(false);
            }
        }
        Ok(true)
    }

    fn edge_fits(&self, pattern: &EdgePattern, id: EdgeId, record: &Record) -> ExecutionResult<bool> {
        let Some(edge) = self.store.get_edge(id) else {
            return Err(ExecutionError::GraphError(format!("Edge {} not found", id)));
        };
        if !pattern.types.is_empty() && !pattern.types.iter().any(|t| edge.has_type(t)) {
            return Ok(false);
        }
        self.properties_match(&pattern.properties, Value::Edge(id), record)
    }

    /// Edges leaving `node` in the requested direction, paired with the far end
    fn neighbours(&self, node: NodeId, direction: Direction) -> Vec<(EdgeId, NodeId)> {
        let direction = if self.store.is_directed() {
            direction
        } else {
            Direction::Both
        };
        let mut found = Vec::new();
        if matches!(direction, Direction::Outgoing | Direction::Both) {
            for &e in self.store.outgoing_edges(node) {
                if let Some(edge) = self.store.get_edge(e) {
                    found.push((e, edge.target));
                }
            }
        }
        if matches!(direction, Direction::Incoming | Direction::Both) {
            for &e in self.store.incoming_edges(node) {
                if let Some(edge) = self.store.get_edge(e) {
                    // self-loops were already reported from the outgoing side
                    if direction == Direction::Both && edge.is_self_loop() {
                        continue;
                    }
                    found.push((e, edge.source));
                }
            }
        }
        found
    }

    fn extend(&self, segments: &[PathSegment], current: NodeId, state: State, out: &mut Vec<State>) -> ExecutionResult<()> {
        let Some((segment, rest)) = segments.split_first() else {
            out.push(state);
            return Ok(());
        };

        if let Some(length) = segment.edge.length {
            let mut path = Vec::new();
            return self.walk(segment, rest, current, &mut path, length.min, length.max, &state, out);
        }

        for (edge, next) in self.neighbours(current, segment.edge.direction) {
            if state.used.contains(&edge) || !self.edge_fits(&segment.edge, edge, &state.record)? {
                continue;
            }
            let mut candidate = state.clone();
            if let Some(variable) = &segment.edge.variable {
                match candidate.record.get(variable) {
                    Some(Value::Edge(bound)) if *bound != edge => continue,
                    Some(Value::Edge(_)) | None => {}
                    Some(other) => {
                        return Err(ExecutionError::TypeError(format!(
                            "Variable '{}' is bound to a {}, not a relationship",
                            variable,
                            other.type_name()
                        )))
                    }
                }
                candidate.record.bind(variable.clone(), Value::Edge(edge));
            }
            candidate.used.insert(edge);
            if let Some(bound) = self.bind_node(&segment.node, next, candidate)? {
                self.extend(rest, next, bound, out)?;
            }
        }
        Ok(())
    }

    /// Depth-first expansion of a variable-length relationship
    #[allow(clippy::too_many_arguments)]
    fn walk(
        &self,
        segment: &PathSegment,
        rest: &[PathSegment],
        node: NodeId,
        path: &mut Vec<EdgeId>,
        min: usize,
        max: Option<usize>,
        state: &State,
        out: &mut Vec<State>,
    ) -> ExecutionResult<()> {
        if path.len() >= min {
            let mut candidate = state.clone();
            candidate.used.extend(path.iter().copied());
            if let Some(variable) = &segment.edge.variable {
                candidate.record.bind(variable.clone(), Value::EdgeList(path.clone()));
            }
            if let Some(bound) = self.bind_node(&segment.node, node, candidate)? {
                self.extend(rest, node, bound, out)?;
            }
        }

        if max.is_some_and(|max| path.len() >= max) {
            return Ok(());
        }
        for (edge, next) in self.neighbours(node, segment.edge.direction) {
            if state.used.contains(&edge) || path.contains(&edge) {
                continue;
            }
            if !self.edge_fits(&segment.edge, edge, &state.record)? {
                continue;
            }
            path.push(edge);
            self.walk(segment, rest, next, path, min, max, state, out)?;
            path.pop();
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{EdgeType, Label, PropertyMap};
    use crate::query::parser::parse_query;

    fn social() -> GraphStore {
        let mut store = GraphStore::directed();
        for (key, name, age) in [("a", "Alice", 30i64), ("b", "Bob", 25), ("c", "Carol", 35)] {
            let id = store.add_node(key);
            store.add_label(id, Label::new("Person")).unwrap();
            let node = store.get_node_mut(id).unwrap();
            node.set_property("name", name);
            node.set_property("age", age);
        }
        for (src, tgt, ty) in [("a", "b", "KNOWS"), ("b", "c", "KNOWS"), ("a", "c", "LIKES")] {
            let e = store.add_edge(src, tgt, PropertyMap::new());
            store.get_edge_mut(e).unwrap().types.push(EdgeType::new(ty));
        }
        store
    }

    fn run(store: &GraphStore, text: &str) -> Vec<Record> {
        let query = parse_query(text).unwrap();
        let matcher = PatternMatcher::new(store);
        let mut records = vec![Record::new()];
        for clause in &query.match_clauses {
            records = matcher.match_clause(clause, records).unwrap();
        }
        records
    }

    fn keys(store: &GraphStore, records: &[Record], variable: &str) -> Vec<String> {
        let mut keys: Vec<String> = records
            .iter()
            .map(|r| match r.get(variable) {
                Some(Value::Node(id)) => store.get_node(*id).unwrap().key.clone(),
                other => panic!("unexpected binding {:?}", other),
            })
            .collect();
        keys.sort();
        keys
    }

    #[test]
    fn test_label_scan_and_where() {
        let store = social();
        let records = run(&store, "MATCH (n:Person) WHERE n.age > 28 RETURN n");
        assert_eq!(keys(&store, &records, "n"), vec!["a", "c"]);
    }

    #[test]
    fn test_directions() {
        let store = social();
        let out = run(&store, "MATCH (a {name: 'Alice'})-[:KNOWS]->(b) RETURN b");
        assert_eq!(keys(&store, &out, "b"), vec!["b"]);

        let incoming = run(&store, "MATCH (c {name: 'Carol'})<-[]-(x) RETURN x");
        assert_eq!(keys(&store, &incoming, "x"), vec!["a", "b"]);

        let both = run(&store, "MATCH (b {name: 'Bob'})--(x) RETURN x");
        assert_eq!(keys(&store, &both, "x"), vec!["a", "c"]);
    }

    #[test]
    fn test_type_alternatives() {
        let store = social();
        let records = run(&store, "MATCH (a)-[:KNOWS|LIKES]->(b) RETURN a");
        assert_eq!(records.len(), 3);
    }

    #[test]
    fn test_variable_length() {
        let store = social();
        let records = run(&store, "MATCH (a {name: 'Alice'})-[r:KNOWS*1..2]->(x) RETURN x");
        assert_eq!(keys(&store, &records, "x"), vec!["b", "c"]);
        let two_hops = records
            .iter()
            .find(|r| matches!(r.get("r"), Some(Value::EdgeList(edges)) if edges.len() == 2));
        assert!(two_hops.is_some());
    }

    #[test]
    fn test_relationship_uniqueness_within_clause() {
        let mut store = GraphStore::undirected();
        store.add_edge("x", "y", PropertyMap::new());
        // a single undirected edge cannot be walked back along itself
        let records = run(&store, "MATCH (a)--(b)--(c) RETURN a");
        assert!(records.is_empty());
        let records = run(&store, "MATCH (a)--(b) RETURN a");
        assert_eq!(records.len(), 2);
    }

    #[test]
    fn test_bound_variables_join_across_clauses() {
        let store = social();
        let records = run(
            &store,
            "MATCH (a)-[:KNOWS]->(b) MATCH (b)-[:KNOWS]->(c) RETURN c",
        );
        assert_eq!(keys(&store, &records, "c"), vec!["c"]);
    }

    #[test]
    fn test_comma_separated_paths_share_bindings() {
        let store = social();
        let records = run(&store, "MATCH (a)-[:KNOWS]->(b), (a)-[:LIKES]->(c) RETURN a");
        assert_eq!(keys(&store, &records, "a"), vec!["a"]);
        assert_eq!(keys(&store, &records, "c"), vec!["c"]);
    }

    #[test]
    fn test_self_loop_reported_once_for_undirected_pattern() {
        let mut store = GraphStore::directed();
        store.add_edge("a", "a", PropertyMap::new());
        let records = run(&store, "MATCH (x)-[r]-(y) RETURN r");
        assert_eq!(records.len(), 1);
    }
}
