//! DotMotif queries
//!
//! A motif describes a small subgraph by its edges:
//!
//! ```text
//! A -> B [weight > 4]   # required edge with a constraint
//! B !> A                # forbidden edge
//! A.kind = "excitatory" # node constraint
//! ```
//!
//! Searching yields every injective mapping of motif nodes onto graph nodes
//! that honours the edges and constraints.

pub mod ast;
pub mod matcher;
pub mod parser;

pub use ast::Motif;
pub use matcher::MotifMatcher;
pub use parser::parse_motif;

use crate::graph::{GraphStore, PropertyValue};
use crate::result::TabularResult;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum MotifError {
    #[error("Motif parse error: {0}")]
    Syntax(#[from] Box<pest::error::Error<parser::Rule>>),

    #[error("Invalid motif: {0}")]
    Invalid(String),
}

pub type MotifResult<T> = Result<T, MotifError>;

/// Parse a motif and list its matches: one column per motif node, one row
/// per match, host node keys as values
pub fn find_motifs(text: &str, store: &GraphStore) -> MotifResult<TabularResult> {
    let motif = parse_motif(text)?;
    let matches = MotifMatcher::new(store, &motif).find_all();

    let mut result = TabularResult::new(motif.nodes.clone());
    for row in matches {
        result.push_row(
            row.into_iter()
                .map(|id| {
                    store
                        .get_node(id)
                        .map(|n| PropertyValue::String(n.key.clone()))
                        .unwrap_or(PropertyValue::Null)
                })
                .collect(),
        );
    }
    Ok(result)
}
