//! openCypher CSV collections
//!
//! A collection is a set of vertex files and edge files in the openCypher
//! bulk-load layout. System columns start with `~`:
//!
//! - vertex files: `~id` (required), `~label` (`;`-separated labels)
//! - edge files: `~from`, `~to` (required), `~label`, `~id`
//!
//! Every other column is a property whose header may carry a type suffix,
//! e.g. `age:Int`, `score:Double`, `active:Bool` or `tags:String[]`. Empty
//! cells leave the property unset.

use super::{SourceError, SourceResult};
use crate::graph::{EdgeType, GraphStore, Label, PropertyMap, PropertyValue};
use csv::{ReaderBuilder, StringRecord};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Scalar type named by a column suffix
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ColumnType {
    Integer,
    Float,
    Boolean,
    String,
}

impl ColumnType {
    fn from_suffix(suffix: &str) -> Self {
        match suffix.to_ascii_lowercase().as_str() {
            "int" | "long" | "short" | "byte" => ColumnType::Integer,
            "double" | "float" => ColumnType::Float,
            "bool" | "boolean" => ColumnType::Boolean,
            _ => ColumnType::String,
        }
    }

    fn parse(self, raw: &str) -> Option<PropertyValue> {
        let raw = raw.trim();
        match self {
            ColumnType::Integer => raw.parse().ok().map(PropertyValue::Integer),
            ColumnType::Float => raw.parse().ok().map(PropertyValue::Float),
            ColumnType::Boolean => match raw.to_ascii_lowercase().as_str() {
                "true" => Some(PropertyValue::Boolean(true)),
                "false" => Some(PropertyValue::Boolean(false)),
                _ => None,
            },
            ColumnType::String => Some(PropertyValue::String(raw.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Column {
    Id,
    Label,
    From,
    To,
    Property {
        name: String,
        ty: ColumnType,
        array: bool,
    },
}

impl Column {
    fn parse(header: &str) -> Self {
        match header.trim() {
            "~id" => Column::Id,
            "~label" => Column::Label,
            "~from" => Column::From,
            "~to" => Column::To,
            other => {
                let (name, ty) = other.split_once(':').unwrap_or((other, "String"));
                let (ty, array) = match ty.strip_suffix("[]") {
                    Some(inner) => (inner, true),
                    None => (ty, false),
                };
                Column::Property {
                    name: name.to_string(),
                    ty: ColumnType::from_suffix(ty),
                    array,
                }
            }
        }
    }
}

fn parse_error(path: &Path, message: impl std::fmt::Display) -> SourceError {
    SourceError::Parse {
        format: "openCypher CSV",
        message: format!("{}: {}", path.display(), message),
    }
}

/// Parsed row: system fields plus typed properties
#[derive(Debug, Default)]
struct Row {
    id: Option<String>,
    labels: Vec<String>,
    from: Option<String>,
    to: Option<String>,
    properties: PropertyMap,
}

fn parse_row(
    path: &Path,
    columns: &[Column],
    record: &StringRecord,
    line: u64,
) -> SourceResult<Row> {
    if record.len() != columns.len() {
        return Err(SourceError::MalformedRow {
            line,
            expected: columns.len(),
            found: record.len(),
        });
    }
    let mut row = Row::default();
    for (column, cell) in columns.iter().zip(record.iter()) {
        if cell.is_empty() {
            continue;
        }
        match column {
            Column::Id => row.id = Some(cell.to_string()),
            Column::From => row.from = Some(cell.to_string()),
            Column::To => row.to = Some(cell.to_string()),
            Column::Label => {
                row.labels = cell
                    .split(';')
                    .map(str::trim)
                    .filter(|l| !l.is_empty())
                    .map(str::to_string)
                    .collect()
            }
            Column::Property { name, ty, array } => {
                let value = if *array {
                    let items = cell
                        .split(';')
                        .map(|item| ty.parse(item))
                        .collect::<Option<Vec<_>>>();
                    items.map(PropertyValue::Array)
                } else {
                    ty.parse(cell)
                };
                let value = value.ok_or_else(|| {
                    parse_error(path, format!("line {}: '{}' is not a valid {:?}", line, cell, ty))
                })?;
                row.properties.insert(name.clone(), value);
            }
        }
    }
    Ok(row)
}

fn read_rows(path: &Path, required: &[(Column, &str)]) -> SourceResult<Vec<Row>> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_path(path)?;
    let columns: Vec<Column> = reader.headers()?.iter().map(Column::parse).collect();
    for (column, header) in required {
        if !columns.contains(column) {
            return Err(SourceError::MissingColumn {
                column: header.to_string(),
                path: path.display().to_string(),
            });
        }
    }

    let mut rows = Vec::new();
    for (idx, record) in reader.records().enumerate() {
        let record = record?;
        let line = record
            .position()
            .map(|p| p.line())
            .unwrap_or(idx as u64 + 2);
        rows.push(parse_row(path, &columns, &record, line)?);
    }
    Ok(rows)
}

/// Load vertex and edge files into one directed multigraph
pub fn load_collection(vertex_files: &[PathBuf], edge_files: &[PathBuf]) -> SourceResult<GraphStore> {
    let mut store = GraphStore::directed();

    for path in vertex_files {
        let rows = read_rows(path, &[(Column::Id, "~id")])?;
        debug!(path = %path.display(), rows = rows.len(), "read vertex file");
        for row in rows {
            let key = row
                .id
                .ok_or_else(|| parse_error(path, "vertex row without an ~id"))?;
            let id = store.add_node(key);
            for label in row.labels {
                store.add_label(id, Label::new(label))?;
            }
            if let Some(node) = store.get_node_mut(id) {
                node.properties.extend(row.properties);
            }
        }
    }

    for path in edge_files {
        let rows = read_rows(path, &[(Column::From, "~from"), (Column::To, "~to")])?;
        debug!(path = %path.display(), rows = rows.len(), "read edge file");
        for row in rows {
            let (Some(from), Some(to)) = (row.from, row.to) else {
                return Err(parse_error(path, "edge row without both ~from and ~to"));
            };
            for endpoint in [&from, &to] {
                if store.node_id(endpoint).is_none() {
                    warn!(vertex = %endpoint, "edge references an undeclared vertex");
                }
            }
            let edge_id = store.add_edge(from, to, row.properties);
            if let Some(edge) = store.get_edge_mut(edge_id) {
                edge.types = row.labels.into_iter().map(EdgeType::new).collect();
            }
        }
    }

    debug!(
        nodes = store.node_count(),
        edges = store.edge_count(),
        "loaded openCypher collection"
    );
    Ok(store)
}
