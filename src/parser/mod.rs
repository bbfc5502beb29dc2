//! Parser module - tolerant analysis of actor-FSM source text
//!
//! The stages run strictly forward: tokenize, check delimiter balance,
//! extract state declarations, extract helper definitions, extract guarded
//! transition blocks, then resolve local calls. Each invocation is a pure
//! function of one full source snapshot.

use crate::error::{AnalysisWarning, Result};

pub mod declarations;
pub mod functions;
pub mod lexer;
pub mod resolver;
pub mod transitions;

// Re-export key types
pub use declarations::{DeclTable, StateDecl};
pub use functions::LocalFunctionDef;
pub use resolver::ResolvedClause;
pub use transitions::{ActionRef, StopKind, TransitionClause};

/// Everything the graph builder needs, produced from one source snapshot.
#[derive(Debug)]
pub struct ParsedFsm {
    pub table: DeclTable,
    pub clauses: Vec<ResolvedClause>,
    /// Source state of every guarded block, in source order.
    pub block_sources: Vec<String>,
    pub warnings: Vec<AnalysisWarning>,
}

/// Run the full parse pipeline over a source snapshot.
pub fn parse_source(src: &str) -> Result<ParsedFsm> {
    let tokens = lexer::tokenize(src)?;
    lexer::check_balance(&tokens)?;

    let table = declarations::extract_declarations(&tokens)?;
    tracing::debug!("found {} state declarations", table.len());

    let defs = functions::extract_functions(&tokens, src);
    let transitions = transitions::extract_transitions(&tokens, src, &table)?;
    tracing::debug!(
        "found {} transition clauses in {} blocks",
        transitions.clauses.len(),
        transitions.block_sources.len()
    );

    let mut warnings = Vec::new();
    let clauses = resolver::resolve_actions(&transitions.clauses, &defs, &table, &mut warnings)?;

    Ok(ParsedFsm {
        table,
        clauses,
        block_sources: transitions.block_sources,
        warnings,
    })
}
