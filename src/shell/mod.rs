//! Drivers that feed a [`QuerySession`](crate::session::QuerySession):
//! the interactive REPL and one-shot batch mode.

pub mod batch;
pub mod repl;

pub use batch::{run_batch, run_batch_with};
pub use repl::{is_exit_command, BufReadSource, LineSource, ReadOutcome, Repl, ReplState};
