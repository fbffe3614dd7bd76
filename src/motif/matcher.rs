//! Subgraph monomorphism search for motifs
//!
//! Motif nodes are assigned one at a time to distinct host nodes. A motif
//! node adjacent to an already assigned one only considers that node's
//! neighbours, and every edge whose endpoints are both assigned is checked
//! as soon as the second endpoint is placed.

use super::ast::{Comparator, Constraint, Motif, MotifEdge};
use crate::graph::{GraphStore, NodeId, PropertyMap, PropertyValue};
use std::cmp::Ordering;
use std::collections::HashSet;
use tracing::debug;

pub struct MotifMatcher<'a> {
    store: &'a GraphStore,
    motif: &'a Motif,
    /// Search order over motif node indices
    order: Vec<usize>,
}

impl<'a> MotifMatcher<'a> {
    pub fn new(store: &'a GraphStore, motif: &'a Motif) -> Self {
        let order = search_order(motif);
        Self {
            store,
            motif,
            order,
        }
    }

    /// All injective assignments, as host node ids indexed like `motif.nodes`
    pub fn find_all(&self) -> Vec<Vec<NodeId>> {
        let mut assignment = vec![None; self.motif.nodes.len()];
        let mut used = HashSet::new();
        let mut found = Vec::new();
        self.search(0, &mut assignment, &mut used, &mut found);
        debug!(matches = found.len(), "motif search finished");
        found
    }

    fn search(
        &self,
        depth: usize,
        assignment: &mut [Option<NodeId>],
        used: &mut HashSet<NodeId>,
        found: &mut Vec<Vec<NodeId>>,
    ) {
        if depth == self.order.len() {
            found.push(assignment.iter().flatten().copied().collect());
            return;
        }

        let current = self.order[depth];
        for candidate in self.candidates(current, assignment) {
            if used.contains(&candidate) || !self.node_fits(current, candidate) {
                continue;
            }
            assignment[current] = Some(candidate);
            if self.edges_hold(current, assignment) {
                used.insert(candidate);
                self.search(depth + 1, assignment, used, found);
                used.remove(&candidate);
            }
            assignment[current] = None;
        }
    }

    /// Host nodes worth trying for a motif node, in id order
    fn candidates(&self, node: usize, assignment: &[Option<NodeId>]) -> Vec<NodeId> {
        let anchored = self.motif.positive_edges().find_map(|edge| {
            if edge.target == node {
                assignment[edge.source].map(|host| (host, true))
            } else if edge.source == node {
                assignment[edge.target].map(|host| (host, false))
            } else {
                None
            }
        });

        let mut candidates: Vec<NodeId> = match anchored {
            Some((host, forward)) => {
                let mut ids = Vec::new();
                let directed = self.store.is_directed();
                if forward || !directed {
                    ids.extend(
                        self.store
                            .outgoing_edges(host)
                            .iter()
                            .filter_map(|e| self.store.get_edge(*e).map(|e| e.target)),
                    );
                }
                if !forward || !directed {
                    ids.extend(
                        self.store
                            .incoming_edges(host)
                            .iter()
                            .filter_map(|e| self.store.get_edge(*e).map(|e| e.source)),
                    );
                }
                ids
            }
            None => self.store.nodes().map(|n| n.id).collect(),
        };
        candidates.sort();
        candidates.dedup();
        candidates
    }

    fn node_fits(&self, node: usize, host: NodeId) -> bool {
        let Some(properties) = self.store.get_node(host).map(|n| &n.properties) else {
            return false;
        };
        self.motif
            .node_constraints
            .iter()
            .filter(|c| c.node == node)
            .all(|c| satisfies(properties, &c.constraint))
    }

    /// Check every motif edge touching `node` whose other end is placed
    fn edges_hold(&self, node: usize, assignment: &[Option<NodeId>]) -> bool {
        self.motif
            .edges
            .iter()
            .filter(|edge| edge.source == node || edge.target == node)
            .all(|edge| match (assignment[edge.source], assignment[edge.target]) {
                (Some(source), Some(target)) => self.edge_holds(edge, source, target),
                _ => true,
            })
    }

    fn edge_holds(&self, edge: &MotifEdge, source: NodeId, target: NodeId) -> bool {
        let present = self
            .store
            .edges_between(source, target)
            .into_iter()
            .filter_map(|id| self.store.get_edge(id))
            .any(|e| edge.constraints.iter().all(|c| satisfies(&e.properties, c)));
        present == edge.exists
    }
}

/// Place motif nodes so each one (where possible) touches an earlier one
fn search_order(motif: &Motif) -> Vec<usize> {
    let mut order: Vec<usize> = Vec::with_capacity(motif.nodes.len());
    let mut placed = vec![false; motif.nodes.len()];

    while order.len() < motif.nodes.len() {
        let connected = (0..motif.nodes.len()).find(|&n| {
            !placed[n]
                && motif.positive_edges().any(|e| {
                    (e.source == n && placed[e.target]) || (e.target == n && placed[e.source])
                })
        });
        let next = connected
            .or_else(|| (0..motif.nodes.len()).find(|&n| !placed[n]))
            .unwrap_or_default();
        placed[next] = true;
        order.push(next);
    }
    order
}

/// Whether an attribute map satisfies one constraint. A missing attribute
/// never satisfies anything.
pub fn satisfies(properties: &PropertyMap, constraint: &Constraint) -> bool {
    let Some(actual) = properties.get(&constraint.attribute) else {
        return false;
    };
    let expected = &constraint.value;

    match constraint.comparator {
        Comparator::Eq => loose_eq(actual, expected),
        Comparator::Ne => !loose_eq(actual, expected),
        Comparator::Lt => loose_cmp(actual, expected) == Some(Ordering::Less),
        Comparator::Le => matches!(loose_cmp(actual, expected), Some(Ordering::Less | Ordering::Equal)),
        Comparator::Gt => loose_cmp(actual, expected) == Some(Ordering::Greater),
        Comparator::Ge => matches!(loose_cmp(actual, expected), Some(Ordering::Greater | Ordering::Equal)),
        Comparator::In => contains(expected, actual),
        Comparator::NotIn => !contains(expected, actual),
        Comparator::Contains => contains(actual, expected),
        Comparator::NotContains => !contains(actual, expected),
    }
}

/// Numeric view of a value; numeric-looking strings count as numbers
fn numeric(value: &PropertyValue) -> Option<f64> {
    match value {
        PropertyValue::String(s) => s.trim().parse().ok(),
        other => other.as_number(),
    }
}

fn loose_eq(actual: &PropertyValue, expected: &PropertyValue) -> bool {
    if expected.as_number().is_some() || actual.as_number().is_some() {
        if let (Some(a), Some(b)) = (numeric(actual), numeric(expected)) {
            return a == b;
        }
    }
    actual == expected
}

fn loose_cmp(actual: &PropertyValue, expected: &PropertyValue) -> Option<Ordering> {
    match (actual, expected) {
        (PropertyValue::String(a), PropertyValue::String(b)) => Some(a.cmp(b)),
        _ => numeric(actual)?.partial_cmp(&numeric(expected)?),
    }
}

fn contains(haystack: &PropertyValue, needle: &PropertyValue) -> bool {
    match haystack {
        PropertyValue::Array(items) => items.iter().any(|item| loose_eq(item, needle)),
        PropertyValue::String(s) => match needle {
            PropertyValue::String(n) => s.contains(n.as_str()),
            other => s.contains(&other.to_string()),
        },
        PropertyValue::Map(map) => needle.as_string().is_some_and(|key| map.contains_key(key)),
        _ => false,
    }
}
