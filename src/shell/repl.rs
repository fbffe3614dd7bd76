//! Interactive read-eval-print loop
//!
//! The loop owns one session for its whole lifetime. Reading input is
//! abstracted behind [`LineSource`] so the binary can plug in a line editor
//! while tests feed scripted lines.

use crate::session::QuerySession;
use colored::Colorize;
use std::io::{self, BufRead, Write};
use tracing::debug;

const EXIT_COMMANDS: &[&str] = &["exit", "exit()", "quit", "quit()", "q"];

/// Prompt shown while a multi-line submission is being collected
const CONTINUATION_PROMPT: &str = "... ";

/// Whether a line asks to leave the loop
pub fn is_exit_command(line: &str) -> bool {
    let line = line.trim();
    EXIT_COMMANDS.iter().any(|c| c.eq_ignore_ascii_case(line))
}

/// Result of asking a [`LineSource`] for input
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadOutcome {
    Line(String),
    /// Ctrl-C: drop pending input and keep going
    Interrupted,
    /// Ctrl-D or end of input
    Eof,
}

pub trait LineSource {
    fn read_line(&mut self, prompt: &str) -> io::Result<ReadOutcome>;

    /// Remember a submitted line, if the source keeps history
    fn add_history(&mut self, _line: &str) {}
}

/// Plain line source over any reader, used when stdin is not a terminal
pub struct BufReadSource<R> {
    reader: R,
}

impl<R: BufRead> BufReadSource<R> {
    pub fn new(reader: R) -> Self {
        Self { reader }
    }
}

impl<R: BufRead> LineSource for BufReadSource<R> {
    fn read_line(&mut self, _prompt: &str) -> io::Result<ReadOutcome> {
        let mut line = String::new();
        if self.reader.read_line(&mut line)? == 0 {
            return Ok(ReadOutcome::Eof);
        }
        let trimmed = line.trim_end_matches(['\n', '\r']).len();
        line.truncate(trimmed);
        Ok(ReadOutcome::Line(line))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplState {
    Running,
    Exiting,
}

pub struct Repl<S, W> {
    session: Box<dyn QuerySession>,
    source: S,
    out: W,
    state: ReplState,
    /// Lines of a multi-line submission collected so far
    pending: Vec<String>,
}

impl<S: LineSource, W: Write> Repl<S, W> {
    pub fn new(session: Box<dyn QuerySession>, source: S, out: W) -> Self {
        Self {
            session,
            source,
            out,
            state: ReplState::Running,
            pending: Vec::new(),
        }
    }

    pub fn state(&self) -> ReplState {
        self.state
    }

    pub fn session(&self) -> &dyn QuerySession {
        self.session.as_ref()
    }

    /// Loop until the user leaves or input ends
    pub fn run(&mut self) -> io::Result<()> {
        while self.state == ReplState::Running {
            self.step()?;
        }
        Ok(())
    }

    /// Read and handle one line of input
    pub fn step(&mut self) -> io::Result<ReplState> {
        let prompt = if self.pending.is_empty() {
            writeln!(self.out, "{}", self.session.status_line().dimmed())?;
            let label = self.session.prompt_label();
            match label.rsplit_once('\n') {
                Some((hint, prompt)) => {
                    writeln!(self.out, "{}", hint)?;
                    prompt.to_string()
                }
                None => label,
            }
        } else {
            CONTINUATION_PROMPT.to_string()
        };
        self.out.flush()?;

        match self.source.read_line(&prompt)? {
            ReadOutcome::Eof => self.state = ReplState::Exiting,
            ReadOutcome::Interrupted => {
                debug!(lines = self.pending.len(), "input discarded");
                self.pending.clear();
            }
            ReadOutcome::Line(line) => self.handle_line(line)?,
        }
        Ok(self.state)
    }

    fn handle_line(&mut self, line: String) -> io::Result<()> {
        if self.pending.is_empty() && is_exit_command(&line) {
            self.state = ReplState::Exiting;
            return Ok(());
        }

        if !self.session.input_mode().multiline {
            if !line.trim().is_empty() {
                self.source.add_history(&line);
                self.submit(&line)?;
            }
            return Ok(());
        }

        if !line.trim().is_empty() {
            self.pending.push(line);
            return Ok(());
        }
        if self.pending.is_empty() {
            return Ok(());
        }
        let text = self.pending.join("\n");
        self.pending.clear();
        self.source.add_history(&text);
        self.submit(&text)
    }

    fn submit(&mut self, text: &str) -> io::Result<()> {
        match self.session.submit(text) {
            Ok(message) => writeln!(self.out, "{}", message.green()),
            Err(e) => writeln!(self.out, "{}", e.to_string().red()),
        }
    }
}
