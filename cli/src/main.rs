//! grandlite: load a graph from a file or URL and query it
//!
//! Without a query the tool starts an interactive shell; with `-q` or
//! `--query-file` it runs once and prints the result.

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use grandlite::session::{open_session, Language};
use grandlite::shell::{run_batch, run_batch_with, BufReadSource, LineSource, ReadOutcome, Repl};
use grandlite::source::{Resolver, ResolverConfig};
use grandlite::ExportFormat;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use std::fs::File;
use std::io::{self, BufWriter, IsTerminal};
use std::path::PathBuf;
use std::time::Duration;
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "grandlite", version, about = "Query a graph file with Cypher or DotMotif")]
struct Cli {
    /// Graph location: a path, a URL, `edgelist://PATH`,
    /// `h-edgelist(SRC:TGT)://PATH` or `vertex:FILES;edge:FILES`
    graph: String,

    /// Run a single query and exit
    #[arg(short, long, conflicts_with = "query_file")]
    query: Option<String>,

    /// Read the single query from a file
    #[arg(long)]
    query_file: Option<PathBuf>,

    /// Query language
    #[arg(short, long, value_enum, default_value_t = LanguageArg::Cypher)]
    language: LanguageArg,

    /// Batch output format; a table by default
    #[arg(short, long, value_enum)]
    output: Option<OutputFormat>,

    /// Write batch output to a file instead of stdout
    #[arg(long)]
    output_file: Option<PathBuf>,

    /// Seconds allowed for downloading a remote graph
    #[arg(long, env = "GRANDLITE_FETCH_TIMEOUT", default_value_t = 30)]
    fetch_timeout: u64,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Clone, Copy, ValueEnum)]
enum LanguageArg {
    Cypher,
    #[value(name = "dotmotif")]
    DotMotif,
}

impl From<LanguageArg> for Language {
    fn from(arg: LanguageArg) -> Self {
        match arg {
            LanguageArg::Cypher => Language::Cypher,
            LanguageArg::DotMotif => Language::DotMotif,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    Csv,
    Json,
    Jsonl,
    #[value(alias = "markdown")]
    Md,
    Html,
}

impl From<OutputFormat> for ExportFormat {
    fn from(arg: OutputFormat) -> Self {
        match arg {
            OutputFormat::Csv => ExportFormat::Csv,
            OutputFormat::Json => ExportFormat::Json,
            OutputFormat::Jsonl => ExportFormat::JsonLines,
            OutputFormat::Md => ExportFormat::Markdown,
            OutputFormat::Html => ExportFormat::Html,
        }
    }
}

/// Line editor with history for interactive terminals
struct RustylineSource {
    editor: DefaultEditor,
}

impl LineSource for RustylineSource {
    fn read_line(&mut self, prompt: &str) -> io::Result<ReadOutcome> {
        match self.editor.readline(prompt) {
            Ok(line) => Ok(ReadOutcome::Line(line)),
            Err(ReadlineError::Interrupted) => Ok(ReadOutcome::Interrupted),
            Err(ReadlineError::Eof) => Ok(ReadOutcome::Eof),
            Err(ReadlineError::Io(e)) => Err(e),
            Err(e) => Err(io::Error::other(e)),
        }
    }

    fn add_history(&mut self, line: &str) {
        if let Err(e) = self.editor.add_history_entry(line) {
            debug!(error = %e, "history entry dropped");
        }
    }
}

fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            // --help and --version are not failures
            let code = if e.use_stderr() { 1 } else { 0 };
            let _ = e.print();
            std::process::exit(code);
        }
    };
    init_logging(cli.verbose);

    if let Err(e) = run(cli) {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let language = Language::from(cli.language);
    let format = batch_format(cli.output, cli.output_file.as_ref());

    let query = match (&cli.query, &cli.query_file) {
        (Some(q), _) => Some(q.clone()),
        (None, Some(path)) => Some(
            std::fs::read_to_string(path)
                .with_context(|| format!("could not read query file {}", path.display()))?,
        ),
        (None, None) => None,
    };

    let config = ResolverConfig {
        fetch_timeout: Duration::from_secs(cli.fetch_timeout),
        ..ResolverConfig::default()
    };
    let graph = Resolver::new(config).resolve(&cli.graph)?;
    let session = open_session(language, graph);

    match query {
        Some(query) => match &cli.output_file {
            Some(path) => {
                run_batch_with(session.as_ref(), &query, format, || {
                    File::create(path).map(BufWriter::new)
                })?;
            }
            None => {
                let stdout = io::stdout();
                run_batch(session.as_ref(), &query, format, stdout.lock())?;
            }
        },
        None => {
            let stdout = io::stdout();
            if io::stdin().is_terminal() {
                let source = RustylineSource {
                    editor: DefaultEditor::new()?,
                };
                Repl::new(session, source, stdout.lock()).run()?;
            } else {
                let source = BufReadSource::new(io::stdin().lock());
                Repl::new(session, source, stdout.lock()).run()?;
            }
        }
    }
    Ok(())
}

/// Explicit `-o` wins; otherwise an output file's extension picks the format
fn batch_format(output: Option<OutputFormat>, output_file: Option<&PathBuf>) -> Option<ExportFormat> {
    output.map(ExportFormat::from).or_else(|| {
        output_file
            .and_then(|p| p.extension())
            .and_then(|e| e.to_str())
            .and_then(ExportFormat::from_extension)
    })
}
