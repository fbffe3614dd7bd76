//! Expression evaluation
//!
//! Follows Cypher's null semantics: comparisons and predicates involving
//! null yield null, and boolean operators use three-valued logic. Only a
//! `true` predicate keeps a row.

use super::record::{Record, Value};
use super::{ExecutionError, ExecutionResult};
use crate::graph::{GraphStore, PropertyValue};
use crate::query::ast::{is_aggregate_function, BinaryOp, Expression, UnaryOp};
use regex::Regex;
use std::cmp::Ordering;

/// Evaluate a non-aggregate expression against one record
pub fn evaluate(expr: &Expression, record: &Record, store: &GraphStore) -> ExecutionResult<Value> {
    match expr {
        Expression::Literal(value) => Ok(Value::Property(value.clone())),
        Expression::Variable(name) => record
            .get(name)
            .cloned()
            .ok_or_else(|| ExecutionError::VariableNotFound(name.clone())),
        Expression::Property { variable, property } => {
            let target = record
                .get(variable)
                .ok_or_else(|| ExecutionError::VariableNotFound(variable.clone()))?;
            property_of(target, property, store)
        }
        Expression::List(items) => {
            let values = items
                .iter()
                .map(|item| evaluate(item, record, store).map(|v| v.to_output(store)))
                .collect::<ExecutionResult<Vec<_>>>()?;
            Ok(Value::Property(PropertyValue::Array(values)))
        }
        Expression::Unary { op, expr } => {
            let value = evaluate(expr, record, store)?;
            evaluate_unary(*op, value)
        }
        Expression::Binary { left, op, right } => {
            let left = evaluate(left, record, store)?;
            // Short-circuit where the left side alone decides the result
            match (op, truth(&left)) {
                (BinaryOp::And, Ok(Some(false))) => return Ok(boolean(false)),
                (BinaryOp::Or, Ok(Some(true))) => return Ok(boolean(true)),
                _ => {}
            }
            let right = evaluate(right, record, store)?;
            evaluate_binary(*op, &left, &right)
        }
        Expression::Function { name, args, .. } => {
            if is_aggregate_function(name) {
                return Err(ExecutionError::PlanningError(format!(
                    "Aggregate function {}() is only allowed in RETURN",
                    name
                )));
            }
            let args = args
                .iter()
                .map(|arg| evaluate(arg, record, store))
                .collect::<ExecutionResult<Vec<_>>>()?;
            call_function(name, args, store)
        }
        Expression::CountStar => Err(ExecutionError::PlanningError(
            "count(*) is only allowed in RETURN".to_string(),
        )),
    }
}

/// Whether a predicate result keeps its row
pub fn is_true(value: &Value) -> bool {
    matches!(value, Value::Property(PropertyValue::Boolean(true)))
}

fn boolean(b: bool) -> Value {
    Value::Property(PropertyValue::Boolean(b))
}

fn ternary(b: Option<bool>) -> Value {
    b.map(boolean).unwrap_or_else(Value::null)
}

/// Three-valued truth of a boolean operand
fn truth(value: &Value) -> ExecutionResult<Option<bool>> {
    match value {
        Value::Property(PropertyValue::Boolean(b)) => Ok(Some(*b)),
        Value::Property(PropertyValue::Null) => Ok(None),
        other => Err(ExecutionError::TypeError(format!(
            "Expected a Boolean, got {}",
            other.type_name()
        ))),
    }
}

fn property_of(target: &Value, property: &str, store: &GraphStore) -> ExecutionResult<Value> {
    let found = match target {
        Value::Node(id) => store
            .get_node(*id)
            .and_then(|n| n.get_property(property))
            .cloned(),
        Value::Edge(id) => store
            .get_edge(*id)
            .and_then(|e| e.get_property(property))
            .cloned(),
        Value::Property(PropertyValue::Map(map)) => map.get(property).cloned(),
        Value::Property(PropertyValue::Null) => None,
        other => {
            return Err(ExecutionError::TypeError(format!(
                "Cannot read property '{}' of a {}",
                property,
                other.type_name()
            )))
        }
    };
    Ok(Value::Property(found.unwrap_or(PropertyValue::Null)))
}

/// Cypher equality; `None` when either side is null
pub fn values_equal(left: &Value, right: &Value) -> Option<bool> {
    match (left, right) {
        (Value::Property(a), Value::Property(b)) => properties_equal(a, b),
        (a, b) if a.is_null() || b.is_null() => None,
        (a, b) => Some(a == b),
    }
}

fn properties_equal(a: &PropertyValue, b: &PropertyValue) -> Option<bool> {
    match (a, b) {
        (PropertyValue::Null, _) | (_, PropertyValue::Null) => None,
        (PropertyValue::Integer(i), PropertyValue::Float(f))
        | (PropertyValue::Float(f), PropertyValue::Integer(i)) => Some(*i as f64 == *f),
        (PropertyValue::Array(xs), PropertyValue::Array(ys)) => {
            if xs.len() != ys.len() {
                return Some(false);
            }
            let mut result = Some(true);
            for (x, y) in xs.iter().zip(ys) {
                match properties_equal(x, y) {
                    Some(false) => return Some(false),
                    None => result = None,
                    Some(true) => {}
                }
            }
            result
        }
        (a, b) => Some(a == b),
    }
}

/// Ordering for `<`, `<=`, `>`, `>=`; `None` when the values are not comparable
fn compare(a: &PropertyValue, b: &PropertyValue) -> Option<Ordering> {
    match (a, b) {
        (PropertyValue::Integer(x), PropertyValue::Integer(y)) => Some(x.cmp(y)),
        (PropertyValue::String(x), PropertyValue::String(y)) => Some(x.cmp(y)),
        (PropertyValue::Boolean(x), PropertyValue::Boolean(y)) => Some(x.cmp(y)),
        _ => match (a.as_number(), b.as_number()) {
            (Some(x), Some(y)) => x.partial_cmp(&y),
            _ => None,
        },
    }
}

fn evaluate_unary(op: UnaryOp, value: Value) -> ExecutionResult<Value> {
    match op {
        UnaryOp::IsNull => Ok(boolean(value.is_null())),
        UnaryOp::IsNotNull => Ok(boolean(!value.is_null())),
        UnaryOp::Not => Ok(ternary(truth(&value)?.map(|b| !b))),
        UnaryOp::Minus => match value {
            Value::Property(PropertyValue::Integer(i)) => i
                .checked_neg()
                .map(|i| Value::Property(PropertyValue::Integer(i)))
                .ok_or_else(|| ExecutionError::RuntimeError("Integer overflow".to_string())),
            Value::Property(PropertyValue::Float(f)) => Ok(Value::Property(PropertyValue::Float(-f))),
            v if v.is_null() => Ok(v),
            other => Err(ExecutionError::TypeError(format!(
                "Cannot negate a {}",
                other.type_name()
            ))),
        },
    }
}

fn evaluate_binary(op: BinaryOp, left: &Value, right: &Value) -> ExecutionResult<Value> {
    match op {
        BinaryOp::And => {
            let (l, r) = (truth(left)?, truth(right)?);
            Ok(ternary(match (l, r) {
                (Some(false), _) | (_, Some(false)) => Some(false),
                (Some(true), Some(true)) => Some(true),
                _ => None,
            }))
        }
        BinaryOp::Or => {
            let (l, r) = (truth(left)?, truth(right)?);
            Ok(ternary(match (l, r) {
                (Some(true), _) | (_, Some(true)) => Some(true),
                (Some(false), Some(false)) => Some(false),
                _ => None,
            }))
        }
        BinaryOp::Xor => {
            let (l, r) = (truth(left)?, truth(right)?);
            Ok(ternary(l.zip(r).map(|(a, b)| a ^ b)))
        }
        BinaryOp::Eq => Ok(ternary(values_equal(left, right))),
        BinaryOp::Ne => Ok(ternary(values_equal(left, right).map(|b| !b))),
        BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt | BinaryOp::Ge => {
            let ordering = match (left.as_property(), right.as_property()) {
                (Some(a), Some(b)) => compare(a, b),
                _ => None,
            };
            Ok(ternary(ordering.map(|ord| match op {
                BinaryOp::Lt => ord == Ordering::Less,
                BinaryOp::Le => ord != Ordering::Greater,
                BinaryOp::Gt => ord == Ordering::Greater,
                _ => ord != Ordering::Less,
            })))
        }
        BinaryOp::StartsWith | BinaryOp::EndsWith | BinaryOp::Contains => {
            match (left.as_property(), right.as_property()) {
                (Some(PropertyValue::String(s)), Some(PropertyValue::String(t))) => {
                    Ok(boolean(match op {
                        BinaryOp::StartsWith => s.starts_with(t.as_str()),
                        BinaryOp::EndsWith => s.ends_with(t.as_str()),
                        _ => s.contains(t.as_str()),
                    }))
                }
                _ => Ok(Value::null()),
            }
        }
        BinaryOp::RegexMatch => match (left.as_property(), right.as_property()) {
            (Some(PropertyValue::String(s)), Some(PropertyValue::String(pattern))) => {
                let regex = Regex::new(&format!("^(?:{})$", pattern)).map_err(|e| {
                    ExecutionError::RuntimeError(format!("Invalid regular expression: {}", e))
                })?;
                Ok(boolean(regex.is_match(s)))
            }
            _ => Ok(Value::null()),
        },
        BinaryOp::In => evaluate_in(left, right),
        BinaryOp::Add | BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Div | BinaryOp::Mod => {
            match (left.as_property(), right.as_property()) {
                (Some(a), Some(b)) => arithmetic(op, a, b).map(Value::Property),
                _ => Err(ExecutionError::TypeError(format!(
                    "Cannot apply arithmetic to {} and {}",
                    left.type_name(),
                    right.type_name()
                ))),
            }
        }
    }
}

fn evaluate_in(left: &Value, right: &Value) -> ExecutionResult<Value> {
    let items = match right {
        Value::Property(PropertyValue::Array(items)) => items,
        v if v.is_null() => return Ok(Value::null()),
        other => {
            return Err(ExecutionError::TypeError(format!(
                "IN expects a list, got {}",
                other.type_name()
            )))
        }
    };
    if items.is_empty() {
        return Ok(boolean(false));
    }
    let Some(needle) = left.as_property() else {
        return Ok(boolean(false));
    };
    let mut saw_null = false;
    for item in items {
        match properties_equal(needle, item) {
            Some(true) => return Ok(boolean(true)),
            None => saw_null = true,
            Some(false) => {}
        }
    }
    Ok(if saw_null { Value::null() } else { boolean(false) })
}

fn arithmetic(op: BinaryOp, a: &PropertyValue, b: &PropertyValue) -> ExecutionResult<PropertyValue> {
    use PropertyValue::{Array, Float, Integer, Null};
    let overflow = || ExecutionError::RuntimeError("Integer overflow".to_string());

    match (op, a, b) {
        (_, Null, _) | (_, _, Null) => Ok(Null),
        (BinaryOp::Add, PropertyValue::String(s), other) => {
            Ok(PropertyValue::String(format!("{}{}", s, other)))
        }
        (BinaryOp::Add, other, PropertyValue::String(s)) => {
            Ok(PropertyValue::String(format!("{}{}", other, s)))
        }
        (BinaryOp::Add, Array(xs), Array(ys)) => {
            Ok(Array(xs.iter().chain(ys.iter()).cloned().collect()))
        }
        (BinaryOp::Add, Array(xs), y) => {
            let mut items = xs.clone();
            items.push(y.clone());
            Ok(Array(items))
        }
        (_, Integer(x), Integer(y)) => match op {
            BinaryOp::Add => x.checked_add(*y).map(Integer).ok_or_else(overflow),
            BinaryOp::Sub => x.checked_sub(*y).map(Integer).ok_or_else(overflow),
            BinaryOp::Mul => x.checked_mul(*y).map(Integer).ok_or_else(overflow),
            BinaryOp::Div if *y == 0 => {
                Err(ExecutionError::RuntimeError("Division by zero".to_string()))
            }
            BinaryOp::Div => x.checked_div(*y).map(Integer).ok_or_else(overflow),
            BinaryOp::Mod if *y == 0 => {
                Err(ExecutionError::RuntimeError("Division by zero".to_string()))
            }
            _ => x.checked_rem(*y).map(Integer).ok_or_else(overflow),
        },
        _ => match (a.as_number(), b.as_number()) {
            (Some(x), Some(y)) => Ok(Float(match op {
                BinaryOp::Add => x + y,
                BinaryOp::Sub => x - y,
                BinaryOp::Mul => x * y,
                BinaryOp::Div => x / y,
                _ => x % y,
            })),
            _ => Err(ExecutionError::TypeError(format!(
                "Cannot apply {:?} to {} and {}",
                op,
                a.type_name(),
                b.type_name()
            ))),
        },
    }
}

fn expect_args(name: &str, args: &[Value], count: usize) -> ExecutionResult<()> {
    if args.len() != count {
        return Err(ExecutionError::RuntimeError(format!(
            "{}() expects {} argument(s), got {}",
            name,
            count,
            args.len()
        )));
    }
    Ok(())
}

fn type_error(name: &str, value: &Value) -> ExecutionError {
    ExecutionError::TypeError(format!(
        "{}() does not accept a {}",
        name,
        value.type_name()
    ))
}

/// Call a scalar function by (case-insensitive) name
pub fn call_function(name: &str, args: Vec<Value>, store: &GraphStore) -> ExecutionResult<Value> {
    let lower = name.to_ascii_lowercase();
    if lower == "coalesce" {
        return Ok(args.into_iter().find(|v| !v.is_null()).unwrap_or_else(Value::null));
    }

    expect_args(name, &args, 1)?;
    let arg = &args[0];
    if arg.is_null() {
        return Ok(Value::null());
    }

    let result = match (lower.as_str(), arg) {
        ("id", Value::Node(id)) => PropertyValue::Integer(id.as_u64() as i64),
        ("id", Value::Edge(id)) => PropertyValue::Integer(id.as_u64() as i64),
        ("labels", Value::Node(id)) => PropertyValue::Array(
            store
                .get_node(*id)
                .map(|n| n.labels.iter().map(|l| l.as_str().into()).collect())
                .unwrap_or_default(),
        ),
        ("type", Value::Edge(id)) => store
            .get_edge(*id)
            .and_then(|e| e.types.first())
            .map(|t| PropertyValue::String(t.as_str().to_string()))
            .unwrap_or(PropertyValue::Null),
        ("properties", Value::Node(id)) => PropertyValue::Map(
            store
                .get_node(*id)
                .map(|n| n.properties.clone())
                .unwrap_or_default(),
        ),
        ("properties", Value::Edge(id)) => PropertyValue::Map(
            store
                .get_edge(*id)
                .map(|e| e.properties.clone())
                .unwrap_or_default(),
        ),
        ("properties", Value::Property(map @ PropertyValue::Map(_))) => map.clone(),
        ("toupper", Value::Property(PropertyValue::String(s))) => s.to_uppercase().into(),
        ("tolower", Value::Property(PropertyValue::String(s))) => s.to_lowercase().into(),
        ("tostring", Value::Property(p)) => match p {
            PropertyValue::String(_)
            | PropertyValue::Integer(_)
            | PropertyValue::Float(_)
            | PropertyValue::Boolean(_) => PropertyValue::String(p.to_string()),
            _ => return Err(type_error(name, arg)),
        },
        ("tointeger", Value::Property(p)) => match p {
            PropertyValue::Integer(i) => PropertyValue::Integer(*i),
            PropertyValue::Float(f) => PropertyValue::Integer(f.trunc() as i64),
            PropertyValue::Boolean(b) => PropertyValue::Integer(i64::from(*b)),
            PropertyValue::String(s) => {
                let s = s.trim();
                s.parse::<i64>()
                    .map(PropertyValue::Integer)
                    .or_else(|_| s.parse::<f64>().map(|f| PropertyValue::Integer(f.trunc() as i64)))
                    .unwrap_or(PropertyValue::Null)
            }
            _ => return Err(type_error(name, arg)),
        },
        ("tofloat", Value::Property(p)) => match p {
            PropertyValue::Integer(i) => PropertyValue::Float(*i as f64),
            PropertyValue::Float(f) => PropertyValue::Float(*f),
            PropertyValue::String(s) => s
                .trim()
                .parse::<f64>()
                .map(PropertyValue::Float)
                .unwrap_or(PropertyValue::Null),
            _ => return Err(type_error(name, arg)),
        },
        ("size", Value::Property(PropertyValue::String(s))) => {
            PropertyValue::Integer(s.chars().count() as i64)
        }
        ("size", Value::Property(PropertyValue::Array(items))) => {
            PropertyValue::Integer(items.len() as i64)
        }
        ("size", Value::EdgeList(edges)) => PropertyValue::Integer(edges.len() as i64),
        ("abs", Value::Property(PropertyValue::Integer(i))) => i
            .checked_abs()
            .map(PropertyValue::Integer)
            .ok_or_else(|| ExecutionError::RuntimeError("Integer overflow".to_string()))?,
        ("abs", Value::Property(PropertyValue::Float(f))) => PropertyValue::Float(f.abs()),
        (
            "id" | "labels" | "type" | "properties" | "toupper" | "tolower" | "tostring"
            | "tointeger" | "tofloat" | "size" | "abs",
            _,
        ) => return Err(type_error(name, arg)),
        _ => {
            return Err(ExecutionError::RuntimeError(format!(
                "Unknown function: {}()",
                name
            )))
        }
    };
    Ok(Value::Property(result))
}
