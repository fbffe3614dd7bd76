//! DotMotif session

use super::{format_status, InputMode, Language, QueryError, QuerySession, ResultCache, SessionError};
use crate::graph::GraphHandle;
use crate::motif::find_motifs;
use crate::result::TabularResult;

/// Motifs span several lines, so input is collected until a blank line
pub struct MotifSession {
    graph: GraphHandle,
    cache: ResultCache,
    first_prompt: bool,
}

impl MotifSession {
    pub fn new(graph: GraphHandle) -> Self {
        Self {
            graph,
            cache: ResultCache::new(),
            first_prompt: true,
        }
    }

    pub fn cache(&self) -> &ResultCache {
        &self.cache
    }
}

impl QuerySession for MotifSession {
    fn language(&self) -> Language {
        Language::DotMotif
    }

    fn prompt_label(&self) -> String {
        if self.first_prompt {
            "(blank line to submit)\ndotmotif> ".to_string()
        } else {
            "dotmotif> ".to_string()
        }
    }

    fn input_mode(&self) -> InputMode {
        InputMode { multiline: true }
    }

    fn status_line(&self) -> String {
        format_status(self.language(), &self.graph, &self.cache)
    }

    fn run_query(&self, text: &str) -> Result<TabularResult, QueryError> {
        Ok(find_motifs(text, &self.graph)?)
    }

    fn submit(&mut self, text: &str) -> Result<String, SessionError> {
        self.first_prompt = false;
        let graph = &self.graph;
        self.cache.submit(text, |q| Ok(find_motifs(q, graph)?))
    }
}
