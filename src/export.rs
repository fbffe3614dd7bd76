//! Saving and writing query results
//!
//! The same writers serve the interactive `save` command and batch output.

use crate::graph::PropertyValue;
use crate::result::TabularResult;
use crate::session::SessionError;
use chrono::Local;
use serde_json::{Map, Value as Json};
use std::fmt;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::str::FromStr;
use tracing::info;

/// Output formats for results
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Csv,
    /// Array of records
    Json,
    /// One record per line
    JsonLines,
    Markdown,
    Html,
}

impl ExportFormat {
    /// Format for a file extension (without the dot), case-insensitive
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "csv" => Some(ExportFormat::Csv),
            "json" => Some(ExportFormat::Json),
            "jsonl" => Some(ExportFormat::JsonLines),
            "md" | "markdown" => Some(ExportFormat::Markdown),
            "html" => Some(ExportFormat::Html),
            _ => None,
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Json => "json",
            ExportFormat::JsonLines => "jsonl",
            ExportFormat::Markdown => "md",
            ExportFormat::Html => "html",
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for ExportFormat {
    type Err = SessionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ExportFormat::from_extension(s).ok_or_else(|| SessionError::UnknownExportFormat(s.to_string()))
    }
}

/// Save a result to `filename`, inferring the format from its extension.
/// Without a filename a timestamped JSON file is created in the working
/// directory.
pub fn save(result: Option<&TabularResult>, filename: Option<&str>) -> Result<String, SessionError> {
    let result = result.ok_or(SessionError::NoResultToSave)?;

    let (filename, format) = match filename {
        Some(name) => {
            let ext = Path::new(name)
                .extension()
                .and_then(|e| e.to_str())
                .unwrap_or(name);
            let format = ExportFormat::from_extension(ext)
                .ok_or_else(|| SessionError::UnknownExportFormat(ext.to_string()))?;
            (name.to_string(), format)
        }
        None => (timestamped_filename(ExportFormat::Json), ExportFormat::Json),
    };

    let mut writer = BufWriter::new(File::create(&filename)?);
    write_result(result, format, &mut writer)?;
    writer.flush()?;
    info!(file = %filename, format = %format, rows = result.row_count(), "results saved");
    Ok(format!("Saved results to {}.", filename))
}

/// `results-<local ISO-8601 timestamp>.<ext>`, retaken until no such file exists
fn timestamped_filename(format: ExportFormat) -> String {
    loop {
        let stamp = Local::now().format("%Y-%m-%dT%H:%M:%S%.6f");
        let name = format!("results-{}.{}", stamp, format.extension());
        if !Path::new(&name).exists() {
            return name;
        }
    }
}

/// Write a result in the given format
pub fn write_result<W: Write>(result: &TabularResult, format: ExportFormat, mut writer: W) -> Result<(), SessionError> {
    match format {
        ExportFormat::Csv => {
            let mut csv = csv::Writer::from_writer(writer);
            csv.write_record(result.columns())?;
            for row in result.rows() {
                csv.write_record(row.iter().map(csv_cell))?;
            }
            csv.flush()?;
        }
        ExportFormat::Json => {
            let records: Vec<Json> = result.records().map(|r| record_json(&r)).collect();
            serde_json::to_writer(&mut writer, &records)?;
            writeln!(writer)?;
        }
        ExportFormat::JsonLines => {
            for record in result.records() {
                serde_json::to_writer(&mut writer, &record_json(&record))?;
                writeln!(writer)?;
            }
        }
        ExportFormat::Markdown => writer.write_all(result.to_markdown().as_bytes())?,
        ExportFormat::Html => writer.write_all(result.to_html().as_bytes())?,
    }
    Ok(())
}

fn csv_cell(value: &PropertyValue) -> String {
    match value {
        PropertyValue::Null => String::new(),
        // arrays and maps are written as JSON text
        other => other.to_string(),
    }
}

fn record_json(record: &crate::graph::PropertyMap) -> Json {
    let object: Map<String, Json> = record
        .iter()
        .map(|(k, v)| (k.clone(), v.to_json()))
        .collect();
    Json::Object(object)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn sample() -> TabularResult {
        let mut result = TabularResult::new(vec!["name".to_string(), "age".to_string(), "tags".to_string()]);
        result.push_row(vec![
            PropertyValue::from("Alice"),
            PropertyValue::Integer(30),
            PropertyValue::Array(vec!["a".into(), "b".into()]),
        ]);
        result.push_row(vec![PropertyValue::from("Bob, Jr."), PropertyValue::Null, PropertyValue::Null]);
        result
    }

    fn render(format: ExportFormat) -> String {
        let mut out = Vec::new();
        write_result(&sample(), format, &mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_from_extension() {
        assert_eq!(ExportFormat::from_extension("JSONL"), Some(ExportFormat::JsonLines));
        assert_eq!(ExportFormat::from_extension("markdown"), Some(ExportFormat::Markdown));
        assert_eq!(ExportFormat::from_extension("xyz"), None);
        assert!("parquet".parse::<ExportFormat>().is_err());
    }

    #[test]
    fn test_csv_output() {
        assert_eq!(
            render(ExportFormat::Csv),
            "name,age,tags\nAlice,30,\"[\"\"a\"\",\"\"b\"\"]\"\n\"Bob, Jr.\",,\n"
        );
    }

    #[test]
    fn test_json_outputs() {
        assert_eq!(
            render(ExportFormat::Json),
            "[{\"name\":\"Alice\",\"age\":30,\"tags\":[\"a\",\"b\"]},{\"name\":\"Bob, Jr.\",\"age\":null,\"tags\":null}]\n"
        );
        assert_eq!(
            render(ExportFormat::JsonLines),
            "{\"name\":\"Alice\",\"age\":30,\"tags\":[\"a\",\"b\"]}\n{\"name\":\"Bob, Jr.\",\"age\":null,\"tags\":null}\n"
        );
    }

    #[test]
    fn test_save_without_result_touches_nothing() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("out.csv");
        let err = save(None, path.to_str()).unwrap_err();
        assert!(matches!(err, SessionError::NoResultToSave));
        assert!(!path.exists());
    }

    #[test]
    fn test_save_infers_format_from_extension() {
        let dir = TempDir::new().unwrap();
        let jsonl = dir.path().join("out.jsonl");
        let message = save(Some(&sample()), jsonl.to_str()).unwrap();
        assert_eq!(message, format!("Saved results to {}.", jsonl.display()));
        assert_eq!(std::fs::read_to_string(&jsonl).unwrap().lines().count(), 2);

        let unknown = dir.path().join("out.xyz");
        let err = save(Some(&sample()), unknown.to_str()).unwrap_err();
        assert!(matches!(err, SessionError::UnknownExportFormat(ref ext) if ext == "xyz"));
        assert!(!unknown.exists());
    }

    #[test]
    fn test_timestamped_name_shape() {
        let first = timestamped_filename(ExportFormat::Json);
        assert!(first.starts_with("results-"));
        assert!(first.ends_with(".json"));
    }
}
