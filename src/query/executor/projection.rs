//! RETURN projection: grouping, aggregation, DISTINCT, ORDER BY, SKIP, LIMIT

use super::eval::evaluate;
use super::record::{Record, Value};
use super::{ExecutionError, ExecutionResult};
use crate::graph::{GraphStore, PropertyValue};
use crate::query::ast::{Expression, OrderByClause, Query, ReturnItem};
use crate::result::TabularResult;
use indexmap::IndexMap;
use std::cmp::Ordering;
use std::collections::HashSet;

/// A projected row and the scope ORDER BY expressions are evaluated in
struct Row {
    values: Vec<Value>,
    scope: Record,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AggregateFn {
    CountStar,
    Count,
    Sum,
    Avg,
    Min,
    Max,
    Collect,
}

impl AggregateFn {
    fn from_expression(expr: &Expression) -> Option<(Self, bool, Option<&Expression>)> {
        match expr {
            Expression::CountStar => Some((AggregateFn::CountStar, false, None)),
            Expression::Function {
                name,
                distinct,
                args,
            } => {
                let function = match name.to_ascii_lowercase().as_str() {
                    "count" => AggregateFn::Count,
                    "sum" => AggregateFn::Sum,
                    "avg" => AggregateFn::Avg,
                    "min" => AggregateFn::Min,
                    "max" => AggregateFn::Max,
                    "collect" => AggregateFn::Collect,
                    _ => return None,
                };
                Some((function, *distinct, args.first()))
            }
            _ => None,
        }
    }
}

/// Running state of one aggregate within one group
#[derive(Debug, Clone)]
struct Aggregator {
    function: AggregateFn,
    distinct: bool,
    seen: HashSet<Value>,
    values: Vec<Value>,
    rows: i64,
}

impl Aggregator {
    fn new(function: AggregateFn, distinct: bool) -> Self {
        Self {
            function,
            distinct,
            seen: HashSet::new(),
            values: Vec::new(),
            rows: 0,
        }
    }

    fn update(&mut self, value: Option<Value>) {
        self.rows += 1;
        let Some(value) = value else {
            return;
        };
        // aggregates skip nulls
        if value.is_null() {
            return;
        }
        if self.distinct && !self.seen.insert(value.clone()) {
            return;
        }
        self.values.push(value);
    }

    fn finish(self, store: &GraphStore) -> ExecutionResult<Value> {
        let result = match self.function {
            AggregateFn::CountStar => PropertyValue::Integer(self.rows),
            AggregateFn::Count => PropertyValue::Integer(self.values.len() as i64),
            AggregateFn::Collect => {
                PropertyValue::Array(self.values.iter().map(|v| v.to_output(store)).collect())
            }
            AggregateFn::Sum => {
                let numbers = self.numbers("sum")?;
                if numbers.iter().all(|n| matches!(n, PropertyValue::Integer(_))) {
                    let mut total: i64 = 0;
                    for n in &numbers {
                        if let PropertyValue::Integer(i) = n {
                            total = total.checked_add(*i).ok_or_else(|| {
                                ExecutionError::RuntimeError("Integer overflow in sum()".to_string())
                            })?;
                        }
                    }
                    PropertyValue::Integer(total)
                } else {
                    PropertyValue::Float(numbers.iter().filter_map(PropertyValue::as_number).sum())
                }
            }
            AggregateFn::Avg => {
                let numbers = self.numbers("avg")?;
                if numbers.is_empty() {
                    PropertyValue::Null
                } else {
                    let total: f64 = numbers.iter().filter_map(PropertyValue::as_number).sum();
                    PropertyValue::Float(total / numbers.len() as f64)
                }
            }
            AggregateFn::Min | AggregateFn::Max => {
                let mut best: Option<PropertyValue> = None;
                for value in &self.values {
                    let candidate = value.to_output(store);
                    best = match best {
                        None => Some(candidate),
                        Some(current) => {
                            let ord = candidate.sort_cmp(&current);
                            let replace = if self.function == AggregateFn::Min {
                                ord == Ordering::Less
                            } else {
                                ord == Ordering::Greater
                            };
                            Some(if replace { candidate } else { current })
                        }
                    };
                }
                best.unwrap_or(PropertyValue::Null)
            }
        };
        Ok(Value::Property(result))
    }

    fn numbers(&self, name: &str) -> ExecutionResult<Vec<PropertyValue>> {
        self.values
            .iter()
            .map(|v| match v.as_property() {
                Some(p) if p.as_number().is_some() => Ok(p.clone()),
                _ => Err(ExecutionError::TypeError(format!(
                    "{}() expects numbers, got {}",
                    name,
                    v.type_name()
                ))),
            })
            .collect()
    }
}

fn validate(items: &[ReturnItem]) -> ExecutionResult<()> {
    let mut columns = HashSet::new();
    for item in items {
        if !columns.insert(item.column_name()) {
            return Err(ExecutionError::PlanningError(format!(
                "Multiple result columns with the same name are not supported: {}",
                item.column_name()
            )));
        }
    }

    for item in items {
        let expr = &item.expression;
        if !expr.contains_aggregate() {
            continue;
        }
        let Some((function, _, arg)) = AggregateFn::from_expression(expr) else {
            return Err(ExecutionError::PlanningError(format!(
                "Aggregates must be the outermost expression of a RETURN item: {}",
                item.text
            )));
        };
        if let Expression::Function { name, args, .. } = expr {
            if args.len() != 1 {
                return Err(ExecutionError::PlanningError(format!(
                    "{}() expects exactly one argument",
                    name
                )));
            }
        }
        if function != AggregateFn::CountStar && arg.is_some_and(Expression::contains_aggregate) {
            return Err(ExecutionError::PlanningError(format!(
                "Nested aggregates are not allowed: {}",
                item.text
            )));
        }
    }
    Ok(())
}

/// Project matched records through the RETURN clause and its modifiers
pub fn project(query: &Query, records: Vec<Record>, store: &GraphStore) -> ExecutionResult<TabularResult> {
    let items = &query.return_clause.items;
    validate(items)?;

    let mut rows = if items.iter().any(|item| item.expression.is_aggregate()) {
        aggregate(items, records, store)?
    } else {
        records
            .into_iter()
            .map(|record| {
                let values = items
                    .iter()
                    .map(|item| evaluate(&item.expression, &record, store))
                    .collect::<ExecutionResult<Vec<_>>>()?;
                let mut scope = record;
                bind_aliases(items, &values, &mut scope);
                Ok(Row { values, scope })
            })
            .collect::<ExecutionResult<Vec<_>>>()?
    };

    if query.return_clause.distinct {
        let mut seen = HashSet::new();
        rows.retain(|row| seen.insert(row.values.clone()));
    }

    if let Some(order_by) = &query.order_by {
        rows = sort_rows(order_by, items, rows, store)?;
    }

    let rows = rows
        .into_iter()
        .skip(query.skip.unwrap_or(0))
        .take(query.limit.unwrap_or(usize::MAX));

    let mut result = TabularResult::new(items.iter().map(|i| i.column_name().to_string()).collect());
    for row in rows {
        result.push_row(row.values.iter().map(|v| v.to_output(store)).collect());
    }
    Ok(result)
}

fn bind_aliases(items: &[ReturnItem], values: &[Value], scope: &mut Record) {
    for (item, value) in items.iter().zip(values) {
        if let Some(alias) = &item.alias {
            scope.bind(alias.clone(), value.clone());
        }
    }
}

fn aggregate(items: &[ReturnItem], records: Vec<Record>, store: &GraphStore) -> ExecutionResult<Vec<Row>> {
    let key_positions: Vec<usize> = items
        .iter()
        .enumerate()
        .filter(|(_, item)| !item.expression.is_aggregate())
        .map(|(i, _)| i)
        .collect();

    let fresh = || -> Vec<Aggregator> {
        items
            .iter()
            .filter_map(|item| AggregateFn::from_expression(&item.expression))
            .map(|(function, distinct, _)| Aggregator::new(function, distinct))
            .collect()
    };

    let mut groups: IndexMap<Vec<Value>, Vec<Aggregator>> = IndexMap::new();
    if records.is_empty() && key_positions.is_empty() {
        groups.insert(Vec::new(), fresh());
    }

    for record in &records {
        let key = key_positions
            .iter()
            .map(|&i| evaluate(&items[i].expression, record, store))
            .collect::<ExecutionResult<Vec<_>>>()?;
        let aggregators = groups.entry(key).or_insert_with(|| fresh());

        let aggregate_items = items.iter().filter(|item| item.expression.is_aggregate());
        for (aggregator, item) in aggregators.iter_mut().zip(aggregate_items) {
            let value = match AggregateFn::from_expression(&item.expression) {
                Some((_, _, Some(arg))) => Some(evaluate(arg, record, store)?),
                _ => None,
            };
            aggregator.update(value);
        }
    }

    let mut rows = Vec::with_capacity(groups.len());
    for (key, aggregators) in groups {
        let mut keys = key.into_iter();
        let mut finished = aggregators.into_iter();
        let mut values = Vec::with_capacity(items.len());
        for item in items {
            let value = if item.expression.is_aggregate() {
                finished.next().map(|a| a.finish(store)).transpose()?
            } else {
                keys.next()
            };
            values.push(value.unwrap_or_else(Value::null));
        }

        let mut scope = Record::new();
        for (item, value) in items.iter().zip(&values) {
            if let Expression::Variable(name) = &item.expression {
                scope.bind(name.clone(), value.clone());
            }
        }
        bind_aliases(items, &values, &mut scope);
        rows.push(Row { values, scope });
    }
    Ok(rows)
}

fn sort_rows(
    order_by: &OrderByClause,
    items: &[ReturnItem],
    rows: Vec<Row>,
    store: &GraphStore,
) -> ExecutionResult<Vec<Row>> {
    let mut keyed = Vec::with_capacity(rows.len());
    for row in rows {
        let keys = order_by
            .items
            .iter()
            .map(|order| {
                let position = items.iter().position(|item| {
                    item.expression == order.expression
                        || matches!(&order.expression, Expression::Variable(v) if item.alias.as_deref() == Some(v.as_str()))
                });
                match position {
                    Some(i) => Ok(row.values[i].to_output(store)),
                    None => evaluate(&order.expression, &row.scope, store).map(|v| v.to_output(store)),
                }
            })
            .collect::<ExecutionResult<Vec<_>>>()?;
        keyed.push((keys, row));
    }

    keyed.sort_by(|(a, _), (b, _)| {
        for ((x, y), order) in a.iter().zip(b).zip(&order_by.items) {
            let ord = x.sort_cmp(y);
            let ord = if order.ascending { ord } else { ord.reverse() };
            if ord != Ordering::Equal {
                return ord;
            }
        }
        Ordering::Equal
    });
    Ok(keyed.into_iter().map(|(_, row)| row).collect())
}
