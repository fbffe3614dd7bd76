//! DotMotif parser using Pest
//!
//! Statements are separated by newlines or `;`. Node names are registered in
//! the order they first appear, which is also the column order of results.

use super::ast::{Comparator, Constraint, Motif, MotifEdge, NodeConstraint};
use super::{MotifError, MotifResult};
use crate::graph::PropertyValue;
use pest::iterators::Pair;
use pest::Parser;
use pest_derive::Parser;

#[derive(Parser)]
#[grammar = "motif/motif.pest"]
struct MotifParser;

/// Parse motif text into a [`Motif`]
pub fn parse_motif(input: &str) -> MotifResult<Motif> {
    let mut pairs = MotifParser::parse(Rule::motif, input).map_err(Box::new)?;
    let root = pairs
        .next()
        .ok_or_else(|| MotifError::Invalid("Empty motif".to_string()))?;

    let mut motif = Motif::default();
    for statement in root.into_inner() {
        match statement.as_rule() {
            Rule::edge => parse_edge(statement, &mut motif)?,
            Rule::node_constraint => parse_node_constraint(statement, &mut motif)?,
            _ => {}
        }
    }

    if motif.nodes.is_empty() {
        return Err(MotifError::Invalid("Motif declares no nodes".to_string()));
    }
    check_conflicts(&motif)?;
    Ok(motif)
}

fn parse_edge(pair: Pair<Rule>, motif: &mut Motif) -> MotifResult<()> {
    let mut names = Vec::new();
    let mut exists = true;
    let mut constraints = Vec::new();

    for inner in pair.into_inner() {
        match inner.as_rule() {
            Rule::node_name => names.push(motif.add_node(inner.as_str())),
            Rule::edge_op => exists = inner.as_str() == "->",
            Rule::constraints => {
                for c in inner.into_inner() {
                    constraints.push(parse_constraint(c.into_inner())?);
                }
            }
            _ => {}
        }
    }

    let [source, target] = names[..] else {
        return Err(MotifError::Invalid("Edge needs two endpoints".to_string()));
    };
    motif.edges.push(MotifEdge {
        source,
        target,
        exists,
        constraints,
    });
    Ok(())
}

fn parse_node_constraint(pair: Pair<Rule>, motif: &mut Motif) -> MotifResult<()> {
    let mut inner = pair.into_inner();
    let name = inner
        .next()
        .ok_or_else(|| MotifError::Invalid("Node constraint without a node".to_string()))?;
    let node = motif.add_node(name.as_str());
    let constraint = parse_constraint(inner)?;
    motif.node_constraints.push(NodeConstraint { node, constraint });
    Ok(())
}

/// `attribute comparator value`, from the remaining pairs of a rule
fn parse_constraint<'a>(mut pairs: impl Iterator<Item = Pair<'a, Rule>>) -> MotifResult<Constraint> {
    let missing = || MotifError::Invalid("Incomplete constraint".to_string());

    let attribute = pairs.next().ok_or_else(missing)?;
    let attribute = match attribute.into_inner().next() {
        Some(p) if p.as_rule() == Rule::string => string_body(p),
        Some(p) => p.as_str().to_string(),
        None => return Err(missing()),
    };

    let symbol = pairs.next().ok_or_else(missing)?;
    let comparator = Comparator::from_symbol(symbol.as_str())
        .ok_or_else(|| MotifError::Invalid(format!("Unknown comparator: {}", symbol.as_str())))?;

    let value = parse_value(pairs.next().ok_or_else(missing)?)?;
    Ok(Constraint {
        attribute,
        comparator,
        value,
    })
}

fn parse_value(pair: Pair<Rule>) -> MotifResult<PropertyValue> {
    let pair = match pair.as_rule() {
        Rule::value => pair
            .into_inner()
            .next()
            .ok_or_else(|| MotifError::Invalid("Missing value".to_string()))?,
        _ => pair,
    };

    match pair.as_rule() {
        Rule::number => {
            let text = pair.as_str();
            if let Ok(i) = text.parse::<i64>() {
                Ok(PropertyValue::Integer(i))
            } else {
                text.parse::<f64>()
                    .map(PropertyValue::Float)
                    .map_err(|_| MotifError::Invalid(format!("Invalid number: {}", text)))
            }
        }
        Rule::boolean => Ok(PropertyValue::Boolean(pair.as_str().eq_ignore_ascii_case("true"))),
        Rule::string => Ok(PropertyValue::String(string_body(pair))),
        Rule::list => pair
            .into_inner()
            .map(parse_value)
            .collect::<MotifResult<Vec<_>>>()
            .map(PropertyValue::Array),
        other => Err(MotifError::Invalid(format!("Unexpected value: {:?}", other))),
    }
}

fn string_body(pair: Pair<Rule>) -> String {
    let body = pair.into_inner().next().map(|p| p.as_str()).unwrap_or("");
    let mut out = String::with_capacity(body.len());
    let mut chars = body.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            if let Some(escaped) = chars.next() {
                out.push(escaped);
                continue;
            }
        }
        out.push(c);
    }
    out
}

/// An edge cannot be both required and forbidden
fn check_conflicts(motif: &Motif) -> MotifResult<()> {
    for required in motif.positive_edges() {
        let forbidden = motif.edges.iter().any(|e| {
            !e.exists
                && e.constraints.is_empty()
                && e.source == required.source
                && e.target == required.target
        });
        if forbidden {
            return Err(MotifError::Invalid(format!(
                "Edge {} -> {} is both required and forbidden",
                motif.nodes[required.source], motif.nodes[required.target]
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_edges_in_first_appearance_order() {
        let motif = parse_motif("B -> A\nA -> C; C !> B").unwrap();
        assert_eq!(motif.nodes, vec!["B", "A", "C"]);
        assert_eq!(motif.edges.len(), 3);
        assert!(motif.edges[0].exists);
        assert!(!motif.edges[2].exists);
        assert_eq!((motif.edges[2].source, motif.edges[2].target), (2, 0));
    }

    #[test]
    fn test_parse_edge_constraints() {
        let motif = parse_motif("A -> B [weight >= 4, type != \"inhibitory\", \"tag name\" in [1, 2.5]]").unwrap();
        let constraints = &motif.edges[0].constraints;
        assert_eq!(constraints.len(), 3);
        assert_eq!(constraints[0].attribute, "weight");
        assert_eq!(constraints[0].comparator, Comparator::Ge);
        assert_eq!(constraints[0].value, PropertyValue::Integer(4));
        assert_eq!(constraints[1].value, PropertyValue::String("inhibitory".to_string()));
        assert_eq!(constraints[2].attribute, "tag name");
        assert_eq!(constraints[2].comparator, Comparator::In);
        assert_eq!(
            constraints[2].value,
            PropertyValue::Array(vec![PropertyValue::Integer(1), PropertyValue::Float(2.5)])
        );
    }

    #[test]
    fn test_parse_node_constraints_and_comments() {
        let text = "# neurons\nA -> B  # feedforward\n\nA.size > 10\nB.name !contains 'x'\nC.flag = true\n";
        let motif = parse_motif(text).unwrap();
        assert_eq!(motif.nodes, vec!["A", "B", "C"]);
        assert_eq!(motif.node_constraints.len(), 3);
        assert_eq!(motif.node_constraints[1].constraint.comparator, Comparator::NotContains);
        assert_eq!(motif.node_constraints[2].constraint.value, PropertyValue::Boolean(true));
    }

    #[test]
    fn test_multiline_constraint_block() {
        let motif = parse_motif("A -> B [\n  weight > 1,\n  weight < 5\n]").unwrap();
        assert_eq!(motif.edges[0].constraints.len(), 2);
    }

    #[test]
    fn test_rejects_malformed_motifs() {
        assert!(matches!(parse_motif("A -> "), Err(MotifError::Syntax(_))));
        assert!(matches!(parse_motif("A => B"), Err(MotifError::Syntax(_))));
        assert!(matches!(parse_motif("# nothing\n"), Err(MotifError::Invalid(_))));
        assert!(matches!(parse_motif("A -> B\nA !> B"), Err(MotifError::Invalid(_))));
    }
}
