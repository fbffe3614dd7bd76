//! Stateful query sessions
//!
//! A session binds one query language to one loaded graph and remembers the
//! last successful result so it can be saved. Each language provides a
//! [`QuerySession`]; [`open_session`] picks the implementation from the
//! registry.

mod cache;
pub mod cypher;
pub mod motif;

pub use cache::ResultCache;
pub use cypher::CypherSession;
pub use motif::MotifSession;

use crate::graph::GraphHandle;
use crate::motif::MotifError;
use crate::query::CypherError;
use crate::result::TabularResult;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// A query engine's own failure; its message is shown as is
#[derive(Error, Debug)]
pub enum QueryError {
    #[error(transparent)]
    Cypher(#[from] CypherError),

    #[error(transparent)]
    Motif(#[from] MotifError),
}

/// Errors surfaced by a session
#[derive(Error, Debug)]
pub enum SessionError {
    #[error("Unknown query language: {0} (expected one of: cypher, dotmotif)")]
    UnknownLanguage(String),

    #[error(transparent)]
    Query(#[from] QueryError),

    #[error("Unknown format: {0}")]
    UnknownExportFormat(String),

    #[error("No results to save.")]
    NoResultToSave,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Supported query languages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Language {
    Cypher,
    DotMotif,
}

impl Language {
    pub const ALL: [Language; 2] = [Language::Cypher, Language::DotMotif];

    /// Command-line name
    pub fn name(&self) -> &'static str {
        match self {
            Language::Cypher => "cypher",
            Language::DotMotif => "dotmotif",
        }
    }

    /// Name shown in the status line
    pub fn display_name(&self) -> &'static str {
        match self {
            Language::Cypher => "Cypher",
            Language::DotMotif => "DotMotif",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Language {
    type Err = SessionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Language::ALL
            .into_iter()
            .find(|l| l.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| SessionError::UnknownLanguage(s.to_string()))
    }
}

/// How the driver should collect one submission
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InputMode {
    /// Accumulate lines until a blank line instead of submitting each line
    pub multiline: bool,
}

/// One language bound to one graph
pub trait QuerySession {
    fn language(&self) -> Language;

    /// Text shown before reading input
    fn prompt_label(&self) -> String;

    fn input_mode(&self) -> InputMode;

    /// Language, graph size and last result size
    fn status_line(&self) -> String;

    /// Run a query without touching session state
    fn run_query(&self, text: &str) -> Result<TabularResult, QueryError>;

    /// Handle one submission: `save [file]` or a query
    fn submit(&mut self, text: &str) -> Result<String, SessionError>;
}

type SessionConstructor = fn(GraphHandle) -> Box<dyn QuerySession>;

/// Language -> session constructor
pub const REGISTRY: &[(Language, SessionConstructor)] = &[
    (Language::Cypher, open_cypher),
    (Language::DotMotif, open_motif),
];

fn open_cypher(graph: GraphHandle) -> Box<dyn QuerySession> {
    Box::new(CypherSession::new(graph))
}

fn open_motif(graph: GraphHandle) -> Box<dyn QuerySession> {
    Box::new(MotifSession::new(graph))
}

/// Open a session for `language` over `graph`
pub fn open_session(language: Language, graph: GraphHandle) -> Box<dyn QuerySession> {
    let constructor = REGISTRY
        .iter()
        .find(|(l, _)| *l == language)
        .map(|(_, constructor)| *constructor)
        .unwrap_or(open_cypher);
    constructor(graph)
}

/// `save` followed by whitespace or nothing, case-insensitive. Returns the
/// optional filename argument.
pub fn parse_save_command(text: &str) -> Option<Option<&str>> {
    let text = text.trim();
    let head = text.get(..4)?;
    if !head.eq_ignore_ascii_case("save") {
        return None;
    }
    let rest = &text[4..];
    if !(rest.is_empty() || rest.starts_with(char::is_whitespace)) {
        return None;
    }
    Some(rest.split_whitespace().next())
}

/// Status line shared by the built-in sessions
pub(crate) fn format_status(language: Language, graph: &GraphHandle, cache: &ResultCache) -> String {
    let mut line = format!(
        "Language: {}    Vertices: {}    Edges: {}",
        language.display_name(),
        graph.node_count(),
        graph.edge_count()
    );
    if let Some(rows) = cache.row_count() {
        line.push_str(&format!("    Last results: {}", rows));
    }
    line
}
