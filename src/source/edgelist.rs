//! Edge-list loaders
//!
//! Two forms are supported:
//! - headered: a delimited file whose header names the source and target
//!   columns; all remaining columns become string edge attributes.
//! - plain: one `u v [weight]` edge per line, `#` comments allowed. A plain
//!   file whose first data line is a `source`/`target` header is read as a
//!   headered file on those two columns.

use super::sniff::{guess_delimiter, read_leading_lines};
use super::{ResolverConfig, SourceError, SourceResult};
use crate::graph::{GraphStore, PropertyMap, PropertyValue};
use csv::ReaderBuilder;
use std::fs;
use std::path::Path;
use tracing::debug;

/// Load a headered, delimited edge list into a directed graph.
///
/// Every data row becomes one edge from its `source_column` value to its
/// `target_column` value. Duplicate (source, target) rows become parallel
/// edges. A row whose width differs from the header is an error.
pub fn load_headered_edge_list(
    path: &Path,
    source_column: &str,
    target_column: &str,
    config: &ResolverConfig,
) -> SourceResult<GraphStore> {
    let sample = read_leading_lines(path, config.sniff_lines)?;
    let delimiter = match guess_delimiter(&sample) {
        Ok(delimiter) => delimiter,
        // A short row in the sample spoils the guess; the header alone
        // still decides, and the width check below reports the row.
        Err(e) if sample.len() > 1 => {
            debug!(error = %e, "sample inconsistent, sniffing the header line");
            guess_delimiter(&sample[..1])?
        }
        Err(e) => return Err(e),
    };
    debug!(delimiter = ?(delimiter as char), "sniffed delimiter");

    let mut reader = ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(true)
        .flexible(true)
        .from_path(path)?;
    let headers = reader.headers()?.clone();

    let column_index = |column: &str| {
        headers
            .iter()
            .position(|h| h == column)
            .ok_or_else(|| SourceError::MissingColumn {
                column: column.to_string(),
                path: path.display().to_string(),
            })
    };
    let src_idx = column_index(source_column)?;
    let tgt_idx = column_index(target_column)?;

    let mut store = GraphStore::directed();
    for (row, record) in reader.records().enumerate() {
        let record = record?;
        if record.len() != headers.len() {
            return Err(SourceError::MalformedRow {
                // header is line 1
                line: record
                    .position()
                    .map(|p| p.line())
                    .unwrap_or(row as u64 + 2),
                expected: headers.len(),
                found: record.len(),
            });
        }
        let mut properties = PropertyMap::new();
        for (idx, (name, value)) in headers.iter().zip(record.iter()).enumerate() {
            if idx != src_idx && idx != tgt_idx {
                properties.insert(name.to_string(), PropertyValue::from(value));
            }
        }
        store.add_edge(&record[src_idx], &record[tgt_idx], properties);
    }
    debug!(
        nodes = store.node_count(),
        edges = store.edge_count(),
        "loaded headered edge list"
    );
    Ok(store)
}

fn data_lines(text: &str) -> impl Iterator<Item = (usize, &str)> {
    text.lines().enumerate().filter_map(|(i, line)| {
        let content = line.split('#').next().unwrap_or("").trim();
        (!content.is_empty()).then_some((i + 1, content))
    })
}

fn split_fields(line: &str, delimiter: Option<u8>) -> Vec<&str> {
    match delimiter {
        Some(d) => line.split(d as char).map(str::trim).collect(),
        None => line.split_whitespace().collect(),
    }
}

/// Load a plain edge list into an undirected graph
pub fn load_edge_list(path: &Path, config: &ResolverConfig) -> SourceResult<GraphStore> {
    let text = fs::read_to_string(path)?;
    let sample: Vec<&str> = data_lines(&text)
        .take(config.sniff_lines)
        .map(|(_, line)| line)
        .collect();
    // Whitespace separation is the fallback when no delimiter is consistent
    let delimiter = guess_delimiter(&sample).ok();

    if let Some(first) = sample.first() {
        let fields = split_fields(first, delimiter);
        if fields.contains(&"source") && fields.contains(&"target") {
            debug!("edge list carries a source/target header");
            return load_headered_edge_list(path, "source", "target", config);
        }
    }

    let mut store = GraphStore::undirected();
    for (line_no, line) in data_lines(&text) {
        let fields = split_fields(line, delimiter);
        match fields.as_slice() {
            [source, target] => {
                store.add_edge(*source, *target, PropertyMap::new());
            }
            [source, target, weight] => {
                let mut properties = PropertyMap::new();
                properties.insert("weight".to_string(), PropertyValue::parse_scalar(weight));
                store.add_edge(*source, *target, properties);
            }
            _ => {
                return Err(SourceError::Parse {
                    format: "edge list",
                    message: format!(
                        "line {}: expected 'source target [weight]', found {} fields",
                        line_no,
                        fields.len()
                    ),
                })
            }
        }
    }
    debug!(
        nodes = store.node_count(),
        edges = store.edge_count(),
        "loaded edge list"
    );
    Ok(store)
}
