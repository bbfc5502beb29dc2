//! One-level resolution of local helper calls.
//!
//! Every `CallLocal` clause is spliced against the helper table: a single
//! unconditional body replaces the action in place, a multi-branch body fans
//! the clause out into one resolved clause per branch with a composite
//! `event/tag` label. Resolution is strictly one level deep; a helper whose
//! action is itself a call is degraded to the unknown destination with a
//! warning instead of recursed, so mutually-recursive helpers always
//! terminate. Goto targets are canonicalized against the declaration table
//! here as well.

use crate::error::{AnalysisWarning, Result};
use crate::parser::declarations::DeclTable;
use crate::parser::functions::LocalFunctionDef;
use crate::parser::transitions::{ActionRef, TransitionClause};
use std::collections::HashMap;

/// A transition clause after resolution. The action is never `CallLocal`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedClause {
    pub source: String,
    pub label: String,
    pub action: ActionRef,
}

impl ResolvedClause {
    /// Display name of the action's destination, for warnings.
    pub fn target_name(&self) -> String {
        match &self.action {
            ActionRef::Goto { target, .. } => target.clone(),
            ActionRef::Stay => self.source.clone(),
            ActionRef::Stop(_) => "[*]".to_string(),
            ActionRef::CallLocal(name) => name.clone(),
            ActionRef::Unknown => "Unknown".to_string(),
        }
    }
}

/// Resolve all clauses against the helper table, in clause order.
pub fn resolve_actions(
    clauses: &[TransitionClause],
    defs: &HashMap<String, LocalFunctionDef>,
    table: &DeclTable,
    warnings: &mut Vec<AnalysisWarning>,
) -> Result<Vec<ResolvedClause>> {
    let mut resolved = Vec::with_capacity(clauses.len());
    for clause in clauses {
        match &clause.action {
            ActionRef::CallLocal(name) => {
                let Some(def) = defs.get(name).filter(|d| !d.branches.is_empty()) else {
                    warnings.push(AnalysisWarning::UnresolvedCall { name: name.clone() });
                    resolved.push(ResolvedClause {
                        source: clause.source.clone(),
                        label: clause.event.clone(),
                        action: ActionRef::Unknown,
                    });
                    continue;
                };
                fan_out(clause, def, table, warnings, &mut resolved)?;
            }
            action => resolved.push(ResolvedClause {
                source: clause.source.clone(),
                label: clause.event.clone(),
                action: canonicalize(action.clone(), table)?,
            }),
        }
    }
    Ok(resolved)
}

/// Splice a helper's branches into resolved clauses. The composite
/// `event/tag` label only applies when the helper has more than one branch.
fn fan_out(
    clause: &TransitionClause,
    def: &LocalFunctionDef,
    table: &DeclTable,
    warnings: &mut Vec<AnalysisWarning>,
    resolved: &mut Vec<ResolvedClause>,
) -> Result<()> {
    let multi = def.branches.len() > 1;
    for (tag, action) in &def.branches {
        let label = match tag {
            Some(tag) if multi => format!("{}/{}", clause.event, tag),
            _ => clause.event.clone(),
        };
        let action = match action {
            ActionRef::CallLocal(inner) => {
                // Depth limit: one level only.
                warnings.push(AnalysisWarning::UnresolvedCall {
                    name: inner.clone(),
                });
                ActionRef::Unknown
            }
            other => canonicalize(other.clone(), table)?,
        };
        resolved.push(ResolvedClause {
            source: clause.source.clone(),
            label,
            action,
        });
    }
    Ok(())
}

/// Rewrite a goto target to its qualified id when it resolves uniquely.
/// Unknown targets stay raw for the graph builder to drop; ambiguous bare
/// targets are fatal.
fn canonicalize(action: ActionRef, table: &DeclTable) -> Result<ActionRef> {
    match action {
        ActionRef::Goto { target, payload } => {
            let target = match table.resolve(&target)? {
                Some(decl) => decl.qualified_id.clone(),
                None => target,
            };
            Ok(ActionRef::Goto { target, payload })
        }
        other => Ok(other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::declarations::extract_declarations;
    use crate::parser::functions::extract_functions;
    use crate::parser::lexer::tokenize;
    use crate::parser::transitions::extract_transitions;

    fn resolve(src: &str) -> (Vec<ResolvedClause>, Vec<AnalysisWarning>) {
        let tokens = tokenize(src).unwrap();
        let table = extract_declarations(&tokens).unwrap();
        let defs = extract_functions(&tokens, src);
        let transitions = extract_transitions(&tokens, src, &table).unwrap();
        let mut warnings = Vec::new();
        let resolved =
            resolve_actions(&transitions.clauses, &defs, &table, &mut warnings).unwrap();
        (resolved, warnings)
    }

    const COMPLEX_FSM: &str = r#"
object State {
  case object Start extends ProcessingState
  case object Processing extends ProcessingState
  case object Failed extends ProcessingState
}

class ComplexFSM extends FSM[ProcessingState, Data] {
  when(State.Start) {
    case Event(Begin, _) => handleBegin()
  }

  def handleBegin(): State = {
    validateInput() match {
      case true => goto(State.Processing)
      case false => goto(State.Failed)
    }
  }

  def validateInput(): Boolean = true
}
"#;

    #[test]
    fn test_multi_branch_fan_out() {
        let (resolved, warnings) = resolve(COMPLEX_FSM);
        assert!(warnings.is_empty());
        assert_eq!(resolved.len(), 2);
        assert_eq!(resolved[0].label, "Begin/true");
        assert_eq!(
            resolved[0].action,
            ActionRef::Goto {
                target: "State.Processing".to_string(),
                payload: None,
            }
        );
        assert_eq!(resolved[1].label, "Begin/false");
        assert_eq!(
            resolved[1].action,
            ActionRef::Goto {
                target: "State.Failed".to_string(),
                payload: None,
            }
        );
    }

    #[test]
    fn test_single_action_inlined_in_place() {
        let (resolved, warnings) = resolve(
            r#"
object State {
  case object Idle extends ProcessState
  case object Done extends ProcessState
}
when(State.Idle) {
  case Event(Finish, _) => wrapUp()
}
def wrapUp(): State = goto(State.Done)
"#,
        );
        assert!(warnings.is_empty());
        assert_eq!(resolved.len(), 1);
        assert_eq!(resolved[0].label, "Finish");
        assert_eq!(
            resolved[0].action,
            ActionRef::Goto {
                target: "State.Done".to_string(),
                payload: None,
            }
        );
    }

    #[test]
    fn test_missing_helper_degrades_to_unknown() {
        let (resolved, warnings) = resolve(
            r#"
object State { case object Idle extends ProcessState }
when(State.Idle) {
  case Event(Go, _) => vanished()
}
"#,
        );
        assert_eq!(resolved[0].action, ActionRef::Unknown);
        assert_eq!(
            warnings,
            vec![AnalysisWarning::UnresolvedCall {
                name: "vanished".to_string()
            }]
        );
    }

    #[test]
    fn test_nested_call_is_not_recursed() {
        let (resolved, warnings) = resolve(
            r#"
object State { case object Idle extends ProcessState }
when(State.Idle) {
  case Event(Go, _) => outer()
}
def outer(): State = inner()
def inner(): State = outer()
"#,
        );
        assert_eq!(resolved[0].action, ActionRef::Unknown);
        assert_eq!(
            warnings,
            vec![AnalysisWarning::UnresolvedCall {
                name: "inner".to_string()
            }]
        );
    }

    #[test]
    fn test_bare_goto_target_is_canonicalized() {
        let (resolved, _) = resolve(
            r#"
object States {
  case object Idle extends ProcessState
  case object Running extends ProcessState
}
when(Idle) {
  case Event(Start, _) => goto(Running)
}
"#,
        );
        assert_eq!(resolved[0].source, "States.Idle");
        assert_eq!(
            resolved[0].action,
            ActionRef::Goto {
                target: "States.Running".to_string(),
                payload: None,
            }
        );
    }
}
