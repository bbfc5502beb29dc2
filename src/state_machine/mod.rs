//! State machine module - Build state graphs from parsed source and emit diagrams

use crate::error::{AnalysisWarning, Result};
use crate::parser::{ParsedFsm, parse_source};

pub mod analyzer;
pub mod graph;
pub mod mermaid;

// Re-export key types
pub use graph::{GraphStats, Node, StateGraph};
pub use mermaid::{EMPTY_SOURCE_PLACEHOLDER, NO_TRANSITIONS_PLACEHOLDER, to_mermaid};

/// The result of one full analysis pass over a source snapshot.
pub struct Analysis {
    pub graph: StateGraph,
    pub markup: String,
    pub warnings: Vec<AnalysisWarning>,
}

/// Run the full pipeline: parse, build the graph, emit markup.
///
/// Pure function of the input text: identical input always yields
/// byte-identical markup. Blank input is a distinguished case, not an error.
pub fn analyze(source: &str) -> Result<Analysis> {
    if source.trim().is_empty() {
        let mut warnings = Vec::new();
        let graph = StateGraph::build(&empty_parse(), &mut warnings);
        return Ok(Analysis {
            graph,
            markup: EMPTY_SOURCE_PLACEHOLDER.to_string(),
            warnings,
        });
    }

    let parsed = parse_source(source)?;
    let mut warnings = parsed.warnings.clone();
    let graph = StateGraph::build(&parsed, &mut warnings);
    let markup = to_mermaid(&graph);

    for warning in &warnings {
        tracing::warn!("{}", warning);
    }
    Ok(Analysis {
        graph,
        markup,
        warnings,
    })
}

fn empty_parse() -> ParsedFsm {
    ParsedFsm {
        table: Default::default(),
        clauses: Vec::new(),
        block_sources: Vec::new(),
        warnings: Vec::new(),
    }
}
