//! State declaration extraction.
//!
//! Scans the token stream for declaration groups (`object Scope { ... }`) and
//! state declarations (`case object Name extends SomeState`), top-level or
//! scoped. Event declarations use the same syntax, so a parent type only
//! counts as a state type when it is named in an `FSM[T, D]` clause somewhere
//! in the source, or follows the `*State` naming convention.

use crate::error::{Error, Result};
use crate::parser::lexer::{Token, TokenKind};
use std::collections::{HashMap, HashSet};

/// A declared state, scoped or top-level.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateDecl {
    pub scope: Option<String>,
    pub local_name: String,
    pub qualified_id: String,
}

impl StateDecl {
    fn new(scope: Option<String>, local_name: String) -> Self {
        let qualified_id = match &scope {
            Some(s) => format!("{}.{}", s, local_name),
            None => local_name.clone(),
        };
        Self {
            scope,
            local_name,
            qualified_id,
        }
    }
}

/// The declaration table, in first-appearance order.
///
/// Order is significant: it feeds the entry-state fallback and the node
/// ordering of the emitted diagram.
#[derive(Debug, Default)]
pub struct DeclTable {
    decls: Vec<StateDecl>,
    by_qualified: HashMap<String, usize>,
    by_local: HashMap<String, Vec<usize>>,
}

impl DeclTable {
    fn insert(&mut self, decl: StateDecl) -> Result<()> {
        if self.by_qualified.contains_key(&decl.qualified_id) {
            return Err(Error::DuplicateState {
                qualified_id: decl.qualified_id,
            });
        }
        let idx = self.decls.len();
        self.by_qualified.insert(decl.qualified_id.clone(), idx);
        self.by_local
            .entry(decl.local_name.clone())
            .or_default()
            .push(idx);
        self.decls.push(decl);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.decls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.decls.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &StateDecl> {
        self.decls.iter()
    }

    pub fn first(&self) -> Option<&StateDecl> {
        self.decls.first()
    }

    pub fn contains(&self, qualified_id: &str) -> bool {
        self.by_qualified.contains_key(qualified_id)
    }

    /// Resolve a qualified or bare state reference.
    ///
    /// Qualified names match exactly. Bare names match when exactly one
    /// declaration carries that local name; more than one is ambiguous and
    /// fatal, zero is `Ok(None)` (left for the graph builder to drop).
    pub fn resolve(&self, name: &str) -> Result<Option<&StateDecl>> {
        if name.contains('.') {
            return Ok(self.by_qualified.get(name).map(|&i| &self.decls[i]));
        }
        match self.by_local.get(name).map(Vec::as_slice) {
            None | Some([]) => Ok(None),
            Some([idx]) => Ok(Some(&self.decls[*idx])),
            Some(indices) => Err(Error::AmbiguousStateRef {
                name: name.to_string(),
                candidates: indices
                    .iter()
                    .map(|&i| self.decls[i].qualified_id.clone())
                    .collect(),
            }),
        }
    }
}

/// Extract the state declaration table from a token stream.
pub fn extract_declarations(tokens: &[Token<'_>]) -> Result<DeclTable> {
    // candidate: (scope, local name, parent type last segment)
    let mut candidates: Vec<(Option<String>, String, String)> = Vec::new();
    let mut fsm_state_types: HashSet<String> = HashSet::new();
    let mut scope_stack: Vec<Option<String>> = Vec::new();
    let mut pending_object: Option<String> = None;

    let mut i = 0;
    while i < tokens.len() {
        let token = &tokens[i];
        match token.kind {
            TokenKind::Newline => {
                // An `object` with no body never opens a scope.
                pending_object = None;
            }
            TokenKind::Punct('{') => {
                scope_stack.push(pending_object.take());
            }
            TokenKind::Punct('}') => {
                scope_stack.pop();
            }
            TokenKind::Ident("case")
                if tokens.get(i + 1).is_some_and(|t| t.is_ident("object")) =>
            {
                if let Some((name, next)) = parse_case_object(tokens, i + 2) {
                    let scope = scope_stack.iter().rev().find_map(|s| s.clone());
                    candidates.push((scope, name.0, name.1));
                    i = next;
                } else {
                    // Not a state shape; skip `case object` so the bare
                    // `object` branch below cannot misread it as a scope.
                    i += 2;
                }
                continue;
            }
            TokenKind::Ident("object") => {
                if let Some(name) = tokens.get(i + 1).and_then(|t| t.ident()) {
                    pending_object = Some(name.to_string());
                    i += 2;
                    continue;
                }
            }
            TokenKind::Ident("FSM") => {
                // `extends FSM[StateType, Data]` pins the state type exactly.
                if tokens.get(i + 1).is_some_and(|t| t.is_punct('['))
                    && let Some(ty) = tokens.get(i + 2).and_then(|t| t.ident())
                {
                    fsm_state_types.insert(ty.to_string());
                }
            }
            _ => {}
        }
        i += 1;
    }

    let mut table = DeclTable::default();
    for (scope, local_name, parent) in candidates {
        if fsm_state_types.contains(&parent) || parent.ends_with("State") {
            table.insert(StateDecl::new(scope, local_name))?;
        }
    }
    Ok(table)
}

/// Parse `Name extends [Pkg.]Type` starting at the name token. Returns the
/// ((name, parent type last segment), index past the type) pair.
fn parse_case_object(tokens: &[Token<'_>], idx: usize) -> Option<((String, String), usize)> {
    let name = tokens.get(idx)?.ident()?;
    let mut j = idx + 1;
    if !tokens.get(j)?.is_ident("extends") {
        return None;
    }
    j += 1;
    let mut parent = tokens.get(j)?.ident()?;
    j += 1;
    while tokens.get(j).is_some_and(|t| t.is_punct('.')) {
        let Some(seg) = tokens.get(j + 1).and_then(|t| t.ident()) else {
            break;
        };
        parent = seg;
        j += 2;
    }
    Some(((name.to_string(), parent.to_string()), j))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::lexer::tokenize;

    fn table(src: &str) -> DeclTable {
        extract_declarations(&tokenize(src).unwrap()).unwrap()
    }

    #[test]
    fn test_scoped_declarations() {
        let table = table(
            r#"
object State {
  case object WaitingForOrder extends OrderState
  case object PaymentPending extends OrderState
}
"#,
        );
        let ids: Vec<&str> = table.iter().map(|d| d.qualified_id.as_str()).collect();
        assert_eq!(ids, vec!["State.WaitingForOrder", "State.PaymentPending"]);
        assert_eq!(table.first().unwrap().scope.as_deref(), Some("State"));
    }

    #[test]
    fn test_events_are_not_states() {
        let table = table(
            r#"
case object PlaceOrder extends OrderEvent
object State {
  case object WaitingForOrder extends OrderState
}
"#,
        );
        assert_eq!(table.len(), 1);
        assert!(table.contains("State.WaitingForOrder"));
        assert!(!table.contains("PlaceOrder"));
    }

    #[test]
    fn test_fsm_clause_pins_state_type() {
        let table = table(
            r#"
object Modes {
  case object On extends Mode
  case object Off extends Mode
}
class SwitchFSM extends FSM[Mode, Data] {
}
"#,
        );
        assert_eq!(table.len(), 2);
        assert!(table.contains("Modes.On"));
    }

    #[test]
    fn test_top_level_declarations_are_unscoped() {
        let table = table("case object Start extends ProcessingState\n");
        assert_eq!(table.first().unwrap().scope, None);
        assert_eq!(table.first().unwrap().qualified_id, "Start");
    }

    #[test]
    fn test_same_local_name_in_two_scopes() {
        let table = table(
            r#"
object A { case object Idle extends ProcessState }
object B { case object Idle extends ProcessState }
"#,
        );
        assert_eq!(table.len(), 2);
        assert!(table.contains("A.Idle"));
        assert!(table.contains("B.Idle"));
        let err = table.resolve("Idle").unwrap_err();
        assert!(err.to_string().starts_with("Parse error: ambiguous state reference"));
    }

    #[test]
    fn test_duplicate_qualified_id_is_fatal() {
        let src = r#"
object State {
  case object Idle extends ProcessState
  case object Idle extends ProcessState
}
"#;
        let err = extract_declarations(&tokenize(src).unwrap()).unwrap_err();
        assert!(err.to_string().starts_with("Parse error: duplicate state declaration"));
    }

    #[test]
    fn test_resolve_bare_and_qualified() {
        let table = table("object State { case object Idle extends ProcessState }");
        assert_eq!(
            table.resolve("Idle").unwrap().unwrap().qualified_id,
            "State.Idle"
        );
        assert_eq!(
            table.resolve("State.Idle").unwrap().unwrap().qualified_id,
            "State.Idle"
        );
        assert!(table.resolve("Missing").unwrap().is_none());
        assert!(table.resolve("State.Missing").unwrap().is_none());
    }

    #[test]
    fn test_qualified_parent_type() {
        let table = table("case object Ready extends fsm.OrderState\n");
        assert_eq!(table.len(), 1);
    }
}
