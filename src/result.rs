//! Tabular query results
//!
//! Every query engine produces a [`TabularResult`]: ordered column names and
//! ordered rows of property values. Columns built from records are the union
//! of the record keys in first-seen order, and absent cells are null.

use crate::graph::{PropertyMap, PropertyValue};
use comfy_table::{ContentArrangement, Table};
use indexmap::IndexSet;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Default)]
pub struct TabularResult {
    columns: Vec<String>,
    rows: Vec<Vec<PropertyValue>>,
}

impl TabularResult {
    /// Create an empty result with the given columns
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    /// Build a result from record-oriented maps
    pub fn from_records<I>(records: I) -> Self
    where
        I: IntoIterator<Item = PropertyMap>,
    {
        let records: Vec<PropertyMap> = records.into_iter().collect();
        let columns: IndexSet<&String> = records.iter().flat_map(|r| r.keys()).collect();
        let rows = records
            .iter()
            .map(|record| {
                columns
                    .iter()
                    .map(|c| record.get(*c).cloned().unwrap_or(PropertyValue::Null))
                    .collect()
            })
            .collect();
        Self {
            columns: columns.into_iter().cloned().collect(),
            rows,
        }
    }

    /// Append a row. Short rows are padded with nulls and long rows are
    /// truncated to the column count.
    pub fn push_row(&mut self, mut row: Vec<PropertyValue>) {
        row.resize(self.columns.len(), PropertyValue::Null);
        self.rows.push(row);
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<PropertyValue>] {
        &self.rows
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Rows as ordered column -> value maps
    pub fn records(&self) -> impl Iterator<Item = PropertyMap> + '_ {
        self.rows.iter().map(|row| {
            self.columns
                .iter()
                .cloned()
                .zip(row.iter().cloned())
                .collect()
        })
    }

    /// Values of one column, if it exists
    pub fn column(&self, name: &str) -> Option<Vec<&PropertyValue>> {
        let idx = self.columns.iter().position(|c| c == name)?;
        Some(self.rows.iter().map(|row| &row[idx]).collect())
    }

    /// Pipe-table rendering used for interactive display
    pub fn to_markdown(&self) -> String {
        let mut out = String::new();
        let header: Vec<String> = self.columns.iter().map(|c| markdown_cell(c)).collect();
        out.push_str(&format!("| {} |\n", header.join(" | ")));
        let rule: String = self.columns.iter().map(|_| " --- |").collect();
        out.push_str(&format!("|{}\n", rule));
        for row in &self.rows {
            let cells: Vec<String> = row.iter().map(|v| markdown_cell(&display_cell(v))).collect();
            out.push_str(&format!("| {} |\n", cells.join(" | ")));
        }
        out
    }

    /// Standalone HTML table
    pub fn to_html(&self) -> String {
        let mut out = String::from("<table>\n  <thead>\n    <tr>\n");
        for column in &self.columns {
            out.push_str(&format!("      <th>{}</th>\n", escape_html(column)));
        }
        out.push_str("    </tr>\n  </thead>\n  <tbody>\n");
        for row in &self.rows {
            out.push_str("    <tr>\n");
            for value in row {
                out.push_str(&format!("      <td>{}</td>\n", escape_html(&display_cell(value))));
            }
            out.push_str("    </tr>\n");
        }
        out.push_str("  </tbody>\n</table>\n");
        out
    }

    /// Terminal table for batch output
    pub fn to_table(&self) -> Table {
        let mut table = Table::new();
        table.set_content_arrangement(ContentArrangement::Dynamic);
        table.set_header(&self.columns);
        for row in &self.rows {
            table.add_row(row.iter().map(display_cell).collect::<Vec<_>>());
        }
        table
    }
}

impl fmt::Display for TabularResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_markdown())
    }
}

/// Presentation form of a cell; nulls render empty
pub fn display_cell(value: &PropertyValue) -> String {
    match value {
        PropertyValue::Null => String::new(),
        other => other.to_string(),
    }
}

fn markdown_cell(text: &str) -> String {
    text.replace('|', "\\|").replace('\n', " ")
}

fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(pairs: &[(&str, PropertyValue)]) -> PropertyMap {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn test_columns_are_union_in_first_seen_order() {
        let result = TabularResult::from_records(vec![
            record(&[("b", 1.into()), ("a", 2.into())]),
            record(&[("c", 3.into()), ("a", 4.into())]),
        ]);
        assert_eq!(result.columns(), &["b", "a", "c"]);
        assert_eq!(
            result.rows()[1],
            vec![PropertyValue::Null, PropertyValue::Integer(4), PropertyValue::Integer(3)]
        );
    }

    #[test]
    fn test_push_row_pads() {
        let mut result = TabularResult::new(vec!["x".into(), "y".into()]);
        result.push_row(vec!["a".into()]);
        assert_eq!(result.rows()[0], vec![PropertyValue::from("a"), PropertyValue::Null]);
    }

    #[test]
    fn test_markdown() {
        let mut result = TabularResult::new(vec!["name".into(), "n".into()]);
        result.push_row(vec!["a|b".into(), 1.into()]);
        result.push_row(vec![PropertyValue::Null, 2.5.into()]);
        assert_eq!(
            result.to_markdown(),
            "| name | n |\n| --- | --- |\n| a\\|b | 1 |\n|  | 2.5 |\n"
        );
    }

    #[test]
    fn test_html_escapes() {
        let mut result = TabularResult::new(vec!["x".into()]);
        result.push_row(vec!["<b>&".into()]);
        let html = result.to_html();
        assert!(html.contains("<th>x</th>"));
        assert!(html.contains("<td>&lt;b&gt;&amp;</td>"));
    }

    #[test]
    fn test_records_round_trip_order() {
        let result = TabularResult::from_records(vec![record(&[("z", 1.into()), ("y", 2.into())])]);
        let first = result.records().next().unwrap();
        let keys: Vec<&String> = first.keys().collect();
        assert_eq!(keys, vec!["z", "y"]);
    }
}
