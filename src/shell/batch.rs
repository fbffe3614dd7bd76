use crate::export::{write_result, ExportFormat};
use crate::session::{QuerySession, SessionError};
use std::io::{self, Write};
use tracing::info;

/// Run one query and write its result: a terminal table without a format,
/// the format's own encoding otherwise
pub fn run_batch<W: Write>(
    session: &dyn QuerySession,
    query: &str,
    format: Option<ExportFormat>,
    out: W,
) -> Result<(), SessionError> {
    run_batch_with(session, query, format, || Ok(out))
}

/// Like [`run_batch`], but the writer is only opened once the query has
/// succeeded, so a failed query never creates its output file
pub fn run_batch_with<W, F>(
    session: &dyn QuerySession,
    query: &str,
    format: Option<ExportFormat>,
    open: F,
) -> Result<(), SessionError>
where
    W: Write,
    F: FnOnce() -> io::Result<W>,
{
    let result = session.run_query(query)?;
    info!(language = %session.language(), rows = result.row_count(), "batch query finished");

    let mut out = open()?;
    match format {
        Some(format) => write_result(&result, format, &mut out)?,
        None => writeln!(out, "{}", result.to_table())?,
    }
    out.flush()?;
    Ok(())
}
