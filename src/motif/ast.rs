//! Motif structure produced by the parser

use crate::graph::PropertyValue;

/// A parsed motif: named nodes, required/forbidden edges and node constraints
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Motif {
    /// Motif node names in first-appearance order
    pub nodes: Vec<String>,
    pub edges: Vec<MotifEdge>,
    pub node_constraints: Vec<NodeConstraint>,
}

impl Motif {
    /// Register a node name, keeping first-appearance order
    pub fn add_node(&mut self, name: &str) -> usize {
        match self.nodes.iter().position(|n| n == name) {
            Some(index) => index,
            None => {
                self.nodes.push(name.to_string());
                self.nodes.len() - 1
            }
        }
    }

    pub fn node_index(&self, name: &str) -> Option<usize> {
        self.nodes.iter().position(|n| n == name)
    }

    /// Edges that must be present in a match
    pub fn positive_edges(&self) -> impl Iterator<Item = &MotifEdge> {
        self.edges.iter().filter(|e| e.exists)
    }
}

/// `A -> B [...]` (exists) or `A !> B [...]` (must not exist)
#[derive(Debug, Clone, PartialEq)]
pub struct MotifEdge {
    pub source: usize,
    pub target: usize,
    pub exists: bool,
    pub constraints: Vec<Constraint>,
}

/// `A.attr op value`
#[derive(Debug, Clone, PartialEq)]
pub struct NodeConstraint {
    pub node: usize,
    pub constraint: Constraint,
}

/// `attr op value`
#[derive(Debug, Clone, PartialEq)]
pub struct Constraint {
    pub attribute: String,
    pub comparator: Comparator,
    pub value: PropertyValue,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparator {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    In,
    NotIn,
    Contains,
    NotContains,
}

impl Comparator {
    pub fn from_symbol(symbol: &str) -> Option<Self> {
        Some(match symbol {
            "=" | "==" => Comparator::Eq,
            "!=" => Comparator::Ne,
            "<" => Comparator::Lt,
            "<=" => Comparator::Le,
            ">" => Comparator::Gt,
            ">=" => Comparator::Ge,
            "in" => Comparator::In,
            "!in" => Comparator::NotIn,
            "contains" => Comparator::Contains,
            "!contains" => Comparator::NotContains,
            _ => return None,
        })
    }
}
