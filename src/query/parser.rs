//! Cypher query parser using Pest
//!
//! The grammar covers read-only `MATCH ... RETURN` queries. Operator
//! precedence is resolved with a Pratt parser, lowest first:
//! `OR`, `XOR`, `AND`, `NOT`, comparisons / string predicates / `IN`,
//! `IS [NOT] NULL`, `+ -`, `* / %`, unary minus.

use crate::graph::{EdgeType, Label, PropertyValue};
use crate::query::ast::*;
use pest::iterators::Pair;
use pest::pratt_parser::{Assoc, Op, PrattParser};
use pest::Parser;
use pest_derive::Parser;
use std::sync::LazyLock;
use thiserror::Error;

#[derive(Parser)]
#[grammar = "query/cypher.pest"]
struct CypherParser;

static PRATT_PARSER: LazyLock<PrattParser<Rule>> = LazyLock::new(|| {
    PrattParser::new()
        .op(Op::infix(Rule::or_op, Assoc::Left))
        .op(Op::infix(Rule::xor_op, Assoc::Left))
        .op(Op::infix(Rule::and_op, Assoc::Left))
        .op(Op::prefix(Rule::not_op))
        .op(Op::infix(Rule::comparison_op, Assoc::Left)
            | Op::infix(Rule::string_op, Assoc::Left)
            | Op::infix(Rule::in_op, Assoc::Left))
        .op(Op::postfix(Rule::is_null) | Op::postfix(Rule::is_not_null))
        .op(Op::infix(Rule::add_sub_op, Assoc::Left))
        .op(Op::infix(Rule::mul_div_mod_op, Assoc::Left))
        .op(Op::prefix(Rule::neg_op))
});

/// Parser errors
#[derive(Error, Debug)]
pub enum ParseError {
    /// Pest parsing error
    #[error("Parse error: {0}")]
    PestError(#[from] Box<pest::error::Error<Rule>>),

    /// Semantic error
    #[error("Semantic error: {0}")]
    SemanticError(String),
}

pub type ParseResult<T> = Result<T, ParseError>;

/// Parse a Cypher query string into an AST
pub fn parse_query(input: &str) -> ParseResult<Query> {
    let mut pairs = CypherParser::parse(Rule::query, input).map_err(Box::new)?;
    let query_pair = pairs
        .next()
        .ok_or_else(|| ParseError::SemanticError("Empty query".to_string()))?;

    let mut match_clauses = Vec::new();
    let mut return_clause = None;
    let mut order_by = None;
    let mut skip = None;
    let mut limit = None;

    for inner in query_pair.into_inner() {
        match inner.as_rule() {
            Rule::match_clause => match_clauses.push(parse_match_clause(inner)?),
            Rule::return_clause => return_clause = Some(parse_return_clause(inner)?),
            Rule::order_by_clause => order_by = Some(parse_order_by_clause(inner)?),
            Rule::skip_clause => skip = Some(parse_count_clause(inner)?),
            Rule::limit_clause => limit = Some(parse_count_clause(inner)?),
            _ => {}
        }
    }

    Ok(Query {
        match_clauses,
        return_clause: return_clause
            .ok_or_else(|| ParseError::SemanticError("Missing RETURN clause".to_string()))?,
        order_by,
        skip,
        limit,
    })
}

fn parse_match_clause(pair: Pair<Rule>) -> ParseResult<MatchClause> {
    let mut pattern = None;
    let mut where_clause = None;

    for inner in pair.into_inner() {
        match inner.as_rule() {
            Rule::pattern => pattern = Some(parse_pattern(inner)?),
            Rule::where_clause => where_clause = Some(parse_where_clause(inner)?),
            _ => {}
        }
    }

    Ok(MatchClause {
        pattern: pattern
            .ok_or_else(|| ParseError::SemanticError("MATCH without a pattern".to_string()))?,
        where_clause,
    })
}

fn parse_count_clause(pair: Pair<Rule>) -> ParseResult<usize> {
    for inner in pair.into_inner() {
        if inner.as_rule() == Rule::integer {
            return parse_usize(inner.as_str());
        }
    }
    Err(ParseError::SemanticError("Expected an integer".to_string()))
}

fn parse_usize(text: &str) -> ParseResult<usize> {
    text.parse()
        .map_err(|_| ParseError::SemanticError(format!("Integer out of range: {}", text)))
}

fn parse_pattern(pair: Pair<Rule>) -> ParseResult<Pattern> {
    let mut paths = Vec::new();

    for inner in pair.into_inner() {
        if inner.as_rule() == Rule::path {
            paths.push(parse_path(inner)?);
        }
    }

    Ok(Pattern { paths })
}

fn parse_path(pair: Pair<Rule>) -> ParseResult<PathPattern> {
    let mut nodes = Vec::new();
    let mut edges = Vec::new();

    for inner in pair.into_inner() {
        match inner.as_rule() {
            Rule::node => nodes.push(parse_node(inner)?),
            Rule::edge_pattern => edges.push(parse_edge(inner)?),
            _ => {}
        }
    }

    if nodes.is_empty() {
        return Err(ParseError::SemanticError(
            "Path must have at least one node".to_string(),
        ));
    }

    let start = nodes.remove(0);
    let segments = edges
        .into_iter()
        .zip(nodes)
        .map(|(edge, node)| PathSegment { edge, node })
        .collect();

    Ok(PathPattern { start, segments })
}

/// Strip the backticks of a quoted identifier
fn identifier(text: &str) -> String {
    text.strip_prefix('`')
        .and_then(|t| t.strip_suffix('`'))
        .unwrap_or(text)
        .to_string()
}

fn parse_node(pair: Pair<Rule>) -> ParseResult<NodePattern> {
    let mut variable = None;
    let mut labels = Vec::new();
    let mut properties = Vec::new();

    for inner in pair.into_inner() {
        match inner.as_rule() {
            Rule::variable => variable = Some(identifier(inner.as_str())),
            Rule::labels => {
                for label_pair in inner.into_inner() {
                    if label_pair.as_rule() == Rule::label {
                        labels.push(Label::new(identifier(label_pair.as_str())));
                    }
                }
            }
            Rule::properties => properties = parse_properties(inner)?,
            _ => {}
        }
    }

    Ok(NodePattern {
        variable,
        labels,
        properties,
    })
}

fn parse_edge(pair: Pair<Rule>) -> ParseResult<EdgePattern> {
    let mut left = false;
    let mut right = false;
    let mut variable = None;
    let mut types = Vec::new();
    let mut length = None;
    let mut properties = Vec::new();

    for inner in pair.into_inner() {
        match inner.as_rule() {
            Rule::left_arrow => left = true,
            Rule::right_arrow => right = true,
            Rule::edge_detail => {
                for detail in inner.into_inner() {
                    match detail.as_rule() {
                        Rule::variable => variable = Some(identifier(detail.as_str())),
                        Rule::edge_types => {
                            for type_pair in detail.into_inner() {
                                if type_pair.as_rule() == Rule::edge_type {
                                    types.push(EdgeType::new(identifier(type_pair.as_str())));
                                }
                            }
                        }
                        Rule::length_pattern => length = Some(parse_length_pattern(detail)?),
                        Rule::properties => properties = parse_properties(detail)?,
                        _ => {}
                    }
                }
            }
            _ => {}
        }
    }

    let direction = match (left, right) {
        (true, false) => Direction::Incoming,
        (false, true) => Direction::Outgoing,
        _ => Direction::Both,
    };

    Ok(EdgePattern {
        variable,
        types,
        direction,
        length,
        properties,
    })
}

fn parse_length_pattern(pair: Pair<Rule>) -> ParseResult<LengthPattern> {
    // A bare `*` means 1..unbounded
    let mut length = LengthPattern { min: 1, max: None };

    for inner in pair.into_inner() {
        match inner.as_rule() {
            Rule::exact_length => {
                let exact = parse_usize(inner.as_str())?;
                length = LengthPattern {
                    min: exact,
                    max: Some(exact),
                };
            }
            Rule::range_bounds => {
                for bound in inner.into_inner() {
                    match bound.as_rule() {
                        Rule::range_min => length.min = parse_usize(bound.as_str())?,
                        Rule::range_max => length.max = Some(parse_usize(bound.as_str())?),
                        _ => {}
                    }
                }
            }
            _ => {}
        }
    }

    if let Some(max) = length.max {
        if max < length.min {
            return Err(ParseError::SemanticError(format!(
                "Invalid range *{}..{}",
                length.min, max
            )));
        }
    }
    Ok(length)
}

fn parse_properties(pair: Pair<Rule>) -> ParseResult<Vec<(String, Expression)>> {
    let mut props = Vec::new();

    for prop in pair.into_inner() {
        if prop.as_rule() == Rule::property {
            let mut key = String::new();
            let mut value = Expression::Literal(PropertyValue::Null);

            for part in prop.into_inner() {
                match part.as_rule() {
                    Rule::property_key => key = identifier(part.as_str()),
                    Rule::expression => value = parse_expression(part)?,
                    _ => {}
                }
            }

            props.push((key, value));
        }
    }

    Ok(props)
}

fn parse_where_clause(pair: Pair<Rule>) -> ParseResult<WhereClause> {
    for inner in pair.into_inner() {
        if inner.as_rule() == Rule::expression {
            return Ok(WhereClause {
                predicate: parse_expression(inner)?,
            });
        }
    }
    Err(ParseError::SemanticError("Invalid WHERE clause".to_string()))
}

fn parse_return_clause(pair: Pair<Rule>) -> ParseResult<ReturnClause> {
    let mut distinct = false;
    let mut items = Vec::new();

    for inner in pair.into_inner() {
        match inner.as_rule() {
            Rule::distinct => distinct = true,
            Rule::return_items => {
                for item_pair in inner.into_inner() {
                    if item_pair.as_rule() == Rule::return_item {
                        items.push(parse_return_item(item_pair)?);
                    }
                }
            }
            _ => {}
        }
    }

    Ok(ReturnClause { items, distinct })
}

fn parse_return_item(pair: Pair<Rule>) -> ParseResult<ReturnItem> {
    let mut expression = None;
    let mut text = String::new();
    let mut alias = None;

    for inner in pair.into_inner() {
        match inner.as_rule() {
            Rule::expression => {
                text = inner.as_str().trim().to_string();
                expression = Some(parse_expression(inner)?);
            }
            Rule::variable => alias = Some(identifier(inner.as_str())),
            _ => {}
        }
    }

    Ok(ReturnItem {
        expression: expression.ok_or_else(|| {
            ParseError::SemanticError("Missing expression in RETURN".to_string())
        })?,
        alias,
        text,
    })
}

fn parse_order_by_clause(pair: Pair<Rule>) -> ParseResult<OrderByClause> {
    let mut items = Vec::new();

    for inner in pair.into_inner() {
        if inner.as_rule() == Rule::order_item {
            items.push(parse_order_item(inner)?);
        }
    }

    Ok(OrderByClause { items })
}

fn parse_order_item(pair: Pair<Rule>) -> ParseResult<OrderByItem> {
    let mut expression = None;
    let mut ascending = true;

    for inner in pair.into_inner() {
        match inner.as_rule() {
            Rule::expression => expression = Some(parse_expression(inner)?),
            Rule::order_direction => {
                ascending = inner.as_str().to_ascii_lowercase().starts_with("asc");
            }
            _ => {}
        }
    }

    Ok(OrderByItem {
        expression: expression.ok_or_else(|| {
            ParseError::SemanticError("Missing expression in ORDER BY".to_string())
        })?,
        ascending,
    })
}

fn parse_expression(pair: Pair<Rule>) -> ParseResult<Expression> {
    PRATT_PARSER
        .map_primary(parse_primary)
        .map_prefix(|op, expr| {
            let op = match op.as_rule() {
                Rule::not_op => UnaryOp::Not,
                Rule::neg_op => UnaryOp::Minus,
                other => {
                    return Err(ParseError::SemanticError(format!(
                        "Unexpected prefix operator: {:?}",
                        other
                    )))
                }
            };
            Ok(Expression::Unary {
                op,
                expr: Box::new(expr?),
            })
        })
        .map_postfix(|expr, op| {
            let op = match op.as_rule() {
                Rule::is_null => UnaryOp::IsNull,
                Rule::is_not_null => UnaryOp::IsNotNull,
                other => {
                    return Err(ParseError::SemanticError(format!(
                        "Unexpected postfix operator: {:?}",
                        other
                    )))
                }
            };
            Ok(Expression::Unary {
                op,
                expr: Box::new(expr?),
            })
        })
        .map_infix(|left, op, right| {
            let left = left?;
            let right = right?;

            let op = match op.as_rule() {
                Rule::or_op => BinaryOp::Or,
                Rule::xor_op => BinaryOp::Xor,
                Rule::and_op => BinaryOp::And,
                Rule::in_op => BinaryOp::In,
                Rule::comparison_op
                | Rule::string_op
                | Rule::add_sub_op
                | Rule::mul_div_mod_op => parse_op_str(op.as_str())?,
                other => {
                    return Err(ParseError::SemanticError(format!(
                        "Unexpected operator: {:?}",
                        other
                    )))
                }
            };

            Ok(Expression::Binary {
                left: Box::new(left),
                op,
                right: Box::new(right),
            })
        })
        .parse(pair.into_inner())
}

fn parse_op_str(op_str: &str) -> ParseResult<BinaryOp> {
    // Multi-word operators may contain any whitespace between words
    let normalized = op_str
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_ascii_uppercase();
    Ok(match normalized.as_str() {
        "==" | "=" => BinaryOp::Eq,
        "!=" | "<>" => BinaryOp::Ne,
        "<" => BinaryOp::Lt,
        "<=" => BinaryOp::Le,
        ">" => BinaryOp::Gt,
        ">=" => BinaryOp::Ge,
        "+" => BinaryOp::Add,
        "-" => BinaryOp::Sub,
        "*" => BinaryOp::Mul,
        "/" => BinaryOp::Div,
        "%" => BinaryOp::Mod,
        "=~" => BinaryOp::RegexMatch,
        "STARTS WITH" => BinaryOp::StartsWith,
        "ENDS WITH" => BinaryOp::EndsWith,
        "CONTAINS" => BinaryOp::Contains,
        _ => {
            return Err(ParseError::SemanticError(format!(
                "Unknown operator: {}",
                op_str
            )))
        }
    })
}

fn parse_primary(pair: Pair<Rule>) -> ParseResult<Expression> {
    match pair.as_rule() {
        Rule::count_star => Ok(Expression::CountStar),
        Rule::function_call => parse_function_call(pair),
        Rule::list_literal => {
            let items = pair
                .into_inner()
                .filter(|p| p.as_rule() == Rule::expression)
                .map(parse_expression)
                .collect::<ParseResult<Vec<_>>>()?;
            Ok(Expression::List(items))
        }
        Rule::property_access => {
            let mut variable = String::new();
            let mut property = String::new();
            for inner in pair.into_inner() {
                match inner.as_rule() {
                    Rule::variable => variable = identifier(inner.as_str()),
                    Rule::property_key => property = identifier(inner.as_str()),
                    _ => {}
                }
            }
            Ok(Expression::Property { variable, property })
        }
        Rule::variable => Ok(Expression::Variable(identifier(pair.as_str()))),
        Rule::expression => parse_expression(pair),
        Rule::null => Ok(Expression::Literal(PropertyValue::Null)),
        Rule::boolean => Ok(Expression::Literal(PropertyValue::Boolean(
            pair.as_str().eq_ignore_ascii_case("true"),
        ))),
        Rule::integer => pair
            .as_str()
            .parse::<i64>()
            .map(|i| Expression::Literal(PropertyValue::Integer(i)))
            .map_err(|_| {
                ParseError::SemanticError(format!("Integer out of range: {}", pair.as_str()))
            }),
        Rule::float => pair
            .as_str()
            .parse::<f64>()
            .map(|f| Expression::Literal(PropertyValue::Float(f)))
            .map_err(|_| ParseError::SemanticError(format!("Invalid float: {}", pair.as_str()))),
        Rule::string => {
            let body = pair
                .into_inner()
                .next()
                .map(|p| p.as_str())
                .unwrap_or_default();
            Ok(Expression::Literal(PropertyValue::String(unescape(body))))
        }
        other => Err(ParseError::SemanticError(format!(
            "Unexpected expression: {:?}",
            other
        ))),
    }
}

fn parse_function_call(pair: Pair<Rule>) -> ParseResult<Expression> {
    let mut name = String::new();
    let mut distinct = false;
    let mut args = Vec::new();

    for inner in pair.into_inner() {
        match inner.as_rule() {
            Rule::function_name => name = inner.as_str().to_string(),
            Rule::distinct => distinct = true,
            Rule::expression => args.push(parse_expression(inner)?),
            _ => {}
        }
    }

    if distinct && !is_aggregate_function(&name) {
        return Err(ParseError::SemanticError(format!(
            "DISTINCT is only allowed in aggregate functions, not {}()",
            name
        )));
    }

    Ok(Expression::Function {
        name,
        distinct,
        args,
    })
}

/// Resolve backslash escapes inside a string literal
fn unescape(body: &str) -> String {
    let mut out = String::with_capacity(body.len());
    let mut chars = body.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }
    out
}
