//! Abstract Syntax Tree for the supported Cypher subset

use crate::graph::{EdgeType, Label, PropertyValue};

/// Complete read-only Cypher query
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    /// MATCH clauses, each with its own optional WHERE
    pub match_clauses: Vec<MatchClause>,
    /// RETURN clause
    pub return_clause: ReturnClause,
    /// ORDER BY clause (optional)
    pub order_by: Option<OrderByClause>,
    /// SKIP clause (optional)
    pub skip: Option<usize>,
    /// LIMIT clause (optional)
    pub limit: Option<usize>,
}

/// MATCH clause: MATCH (n:Person)-[:KNOWS]->(m) WHERE n.age > 30
#[derive(Debug, Clone, PartialEq)]
pub struct MatchClause {
    /// Pattern to match
    pub pattern: Pattern,
    /// Filter applied to this clause's matches
    pub where_clause: Option<WhereClause>,
}

/// Graph pattern: one or more comma-separated paths
#[derive(Debug, Clone, PartialEq)]
pub struct Pattern {
    pub paths: Vec<PathPattern>,
}

/// Path pattern: (n:Person)-[:KNOWS*1..3]->(m:Person)
#[derive(Debug, Clone, PartialEq)]
pub struct PathPattern {
    /// Start node
    pub start: NodePattern,
    /// Edges and nodes
    pub segments: Vec<PathSegment>,
}

/// Segment of a path (edge + node)
#[derive(Debug, Clone, PartialEq)]
pub struct PathSegment {
    pub edge: EdgePattern,
    pub node: NodePattern,
}

/// Node pattern: (n:Person:Employee {name: "Alice"})
#[derive(Debug, Clone, PartialEq)]
pub struct NodePattern {
    pub variable: Option<String>,
    pub labels: Vec<Label>,
    /// Inline property constraints, in source order
    pub properties: Vec<(String, Expression)>,
}

/// Edge pattern: -[:KNOWS|FOLLOWS*1..5]->
#[derive(Debug, Clone, PartialEq)]
pub struct EdgePattern {
    pub variable: Option<String>,
    /// Any of these types matches; empty means any edge
    pub types: Vec<EdgeType>,
    pub direction: Direction,
    /// Variable length pattern
    pub length: Option<LengthPattern>,
    pub properties: Vec<(String, Expression)>,
}

/// Edge direction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Outgoing: ->
    Outgoing,
    /// Incoming: <-
    Incoming,
    /// Both: -
    Both,
}

/// Variable length pattern: *1..5 or * or *3
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LengthPattern {
    pub min: usize,
    /// None = unbounded
    pub max: Option<usize>,
}

/// WHERE clause with predicates
#[derive(Debug, Clone, PartialEq)]
pub struct WhereClause {
    pub predicate: Expression,
}

/// Expression in WHERE, RETURN, ORDER BY or an inline property map
#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    /// Property access: n.name
    Property {
        variable: String,
        property: String,
    },
    /// Literal value
    Literal(PropertyValue),
    /// List literal: [1, 2, n.x]
    List(Vec<Expression>),
    /// Binary operation
    Binary {
        left: Box<Expression>,
        op: BinaryOp,
        right: Box<Expression>,
    },
    /// Unary operation
    Unary {
        op: UnaryOp,
        expr: Box<Expression>,
    },
    /// Function call, including aggregates
    Function {
        name: String,
        distinct: bool,
        args: Vec<Expression>,
    },
    /// count(*)
    CountStar,
    /// Variable reference
    Variable(String),
}

impl Expression {
    /// Whether this expression is an aggregate call at its root
    pub fn is_aggregate(&self) -> bool {
        match self {
            Expression::CountStar => true,
            Expression::Function { name, .. } => is_aggregate_function(name),
            _ => false,
        }
    }

    /// Whether an aggregate call appears anywhere in this expression
    pub fn contains_aggregate(&self) -> bool {
        match self {
            Expression::CountStar => true,
            Expression::Function { name, args, .. } => {
                is_aggregate_function(name) || args.iter().any(Expression::contains_aggregate)
            }
            Expression::List(items) => items.iter().any(Expression::contains_aggregate),
            Expression::Binary { left, right, .. } => {
                left.contains_aggregate() || right.contains_aggregate()
            }
            Expression::Unary { expr, .. } => expr.contains_aggregate(),
            Expression::Property { .. } | Expression::Literal(_) | Expression::Variable(_) => false,
        }
    }
}

/// Aggregate function names, lowercase
pub const AGGREGATE_FUNCTIONS: &[&str] = &["count", "sum", "avg", "min", "max", "collect"];

pub fn is_aggregate_function(name: &str) -> bool {
    AGGREGATE_FUNCTIONS
        .iter()
        .any(|f| f.eq_ignore_ascii_case(name))
}

/// Binary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    And,
    Or,
    Xor,
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    StartsWith,
    EndsWith,
    Contains,
    /// IN list membership
    In,
    /// Regex match (=~)
    RegexMatch,
}

/// Unary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Not,
    Minus,
    IsNull,
    IsNotNull,
}

/// RETURN clause
#[derive(Debug, Clone, PartialEq)]
pub struct ReturnClause {
    pub items: Vec<ReturnItem>,
    pub distinct: bool,
}

/// Return item: n, n.name AS name, count(n)
#[derive(Debug, Clone, PartialEq)]
pub struct ReturnItem {
    pub expression: Expression,
    pub alias: Option<String>,
    /// Source text of the expression, used as the default column name
    pub text: String,
}

impl ReturnItem {
    /// Output column name
    pub fn column_name(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.text)
    }
}

/// ORDER BY clause
#[derive(Debug, Clone, PartialEq)]
pub struct OrderByClause {
    pub items: Vec<OrderByItem>,
}

/// ORDER BY item
#[derive(Debug, Clone, PartialEq)]
pub struct OrderByItem {
    pub expression: Expression,
    pub ascending: bool,
}
