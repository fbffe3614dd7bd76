use super::{parse_save_command, QueryError, SessionError};
use crate::export;
use crate::result::TabularResult;
use tracing::debug;

/// Last successful result of a session
///
/// A new result replaces the previous one; failed queries and saves leave it
/// untouched.
#[derive(Debug, Default, Clone)]
pub struct ResultCache {
    last: Option<TabularResult>,
}

impl ResultCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last(&self) -> Option<&TabularResult> {
        self.last.as_ref()
    }

    /// Row count of the cached result, if any query has succeeded
    pub fn row_count(&self) -> Option<usize> {
        self.last.as_ref().map(TabularResult::row_count)
    }

    pub fn replace(&mut self, result: TabularResult) {
        self.last = Some(result);
    }

    /// Shared `submit` flow: a save command exports the cached result,
    /// anything else is run and cached, answering with its Markdown table
    pub fn submit<F>(&mut self, text: &str, run: F) -> Result<String, SessionError>
    where
        F: FnOnce(&str) -> Result<TabularResult, QueryError>,
    {
        if let Some(filename) = parse_save_command(text) {
            return export::save(self.last(), filename);
        }

        let result = run(text)?;
        debug!(rows = result.row_count(), "query succeeded");
        let rendered = result.to_markdown();
        self.replace(result);
        Ok(rendered)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::PropertyValue;
    use crate::motif::MotifError;

    fn table(value: i64) -> TabularResult {
        let mut result = TabularResult::new(vec!["x".to_string()]);
        result.push_row(vec![PropertyValue::Integer(value)]);
        result
    }

    #[test]
    fn test_success_replaces_cache() {
        let mut cache = ResultCache::new();
        assert_eq!(cache.row_count(), None);
        let out = cache.submit("q", |_| Ok(table(1))).unwrap();
        assert_eq!(out, "| x |\n| --- |\n| 1 |\n");
        cache.submit("q", |_| Ok(table(2))).unwrap();
        assert_eq!(cache.last(), Some(&table(2)));
    }

    #[test]
    fn test_failure_keeps_cache() {
        let mut cache = ResultCache::new();
        cache.submit("q", |_| Ok(table(1))).unwrap();
        let err = cache
            .submit("bad", |_| Err(MotifError::Invalid("nope".to_string()).into()))
            .unwrap_err();
        assert_eq!(err.to_string(), "Invalid motif: nope");
        assert_eq!(cache.last(), Some(&table(1)));
    }

    #[test]
    fn test_save_without_result() {
        let mut cache = ResultCache::new();
        let err = cache
            .submit("save out.csv", |_| panic!("save must not run a query"))
            .unwrap_err();
        assert!(matches!(err, SessionError::NoResultToSave));
    }
}
