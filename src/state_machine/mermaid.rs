//! Deterministic Mermaid `stateDiagram-v2` emission.
//!
//! Node lines come first in declaration order, then one edge line per
//! resolved transition in discovery order, with the synthetic entry edge
//! first. Names that are not bare Mermaid identifiers are quoted verbatim,
//! never mangled. Identical graphs always yield byte-identical markup.

use crate::state_machine::graph::{Node, StateGraph};
use regex::Regex;
use std::borrow::Cow;
use std::sync::LazyLock;

/// Fixed payload for a blank source snapshot, so the view layer can show an
/// explanatory placeholder instead of an empty canvas.
pub const EMPTY_SOURCE_PLACEHOLDER: &str = "stateDiagram-v2\n    %% empty source";

/// Fixed payload for a graph with states but no transitions.
pub const NO_TRANSITIONS_PLACEHOLDER: &str = "stateDiagram-v2\n    %% no transitions";

static BARE_IDENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("valid regex"));

/// Serialize a graph to Mermaid markup.
pub fn to_mermaid(graph: &StateGraph) -> String {
    if graph.transition_count() == 0 {
        return NO_TRANSITIONS_PLACEHOLDER.to_string();
    }

    let mut out = String::from("stateDiagram-v2");
    for id in graph.declared_states() {
        out.push_str("\n    ");
        out.push_str(&quote_name(id));
    }
    for (from, to, label) in graph.edges() {
        out.push_str("\n    ");
        out.push_str(&node_name(from));
        out.push_str(" --> ");
        out.push_str(&node_name(to));
        if !label.is_empty() {
            out.push_str(" : ");
            out.push_str(label);
        }
    }
    out
}

fn node_name(node: &Node) -> Cow<'_, str> {
    match node {
        Node::Entry | Node::Stop => Cow::Borrowed("[*]"),
        Node::Unknown => Cow::Borrowed("Unknown"),
        Node::State(id) => quote_name(id),
    }
}

/// Quote a name verbatim when it is not a legal bare identifier in the
/// markup. Case and punctuation are preserved exactly as declared. The bare
/// name `Unknown` is reserved for the unresolved sink, so a declared state
/// with that name is quoted too.
fn quote_name(name: &str) -> Cow<'_, str> {
    if name != "Unknown" && BARE_IDENT.is_match(name) {
        Cow::Borrowed(name)
    } else {
        Cow::Owned(format!("\"{}\"", name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_source;
    use crate::state_machine::graph::StateGraph;

    fn markup(src: &str) -> String {
        let parsed = parse_source(src).unwrap();
        let mut warnings = Vec::new();
        to_mermaid(&StateGraph::build(&parsed, &mut warnings))
    }

    #[test]
    fn test_basic_markup() {
        let out = markup(
            r#"
case object Idle extends ProcessState
case object Running extends ProcessState
when(Idle) {
  case Event(Start, _) => goto(Running)
}
"#,
        );
        assert_eq!(
            out,
            "stateDiagram-v2\n    Idle\n    Running\n    [*] --> Idle\n    Idle --> Running : Start"
        );
    }

    #[test]
    fn test_qualified_names_are_quoted_verbatim() {
        let out = markup(
            r#"
object State {
  case object Idle extends ProcessState
  case object Done extends ProcessState
}
when(State.Idle) {
  case Event(Finish, _) => goto(State.Done)
}
"#,
        );
        assert!(out.contains("\n    \"State.Idle\"\n    \"State.Done\""));
        assert!(out.contains("\"State.Idle\" --> \"State.Done\" : Finish"));
    }

    #[test]
    fn test_fan_out_markup() {
        let out = markup(
            r#"
case object Start extends ProcessingState
case object Processing extends ProcessingState
case object Failed extends ProcessingState

class ComplexFSM extends FSM[ProcessingState, Data] {
  when(Start) {
    case Event(Begin, _) => handleBegin()
  }
  def handleBegin(): State = {
    validateInput() match {
      case true => goto(Processing)
      case false => goto(Failed)
    }
  }
}
"#,
        );
        assert!(out.contains("Start --> Processing : Begin/true"));
        assert!(out.contains("Start --> Failed : Begin/false"));
    }

    #[test]
    fn test_stop_renders_as_terminal_symbol() {
        let out = markup(
            r#"
case object Idle extends ProcessState
when(Idle) {
  case Event(Shutdown, _) => stop()
}
"#,
        );
        assert!(out.contains("Idle --> [*] : Shutdown"));
    }

    #[test]
    fn test_stop_shorthands_reach_terminal_symbol() {
        let out = markup(
            r#"
object State {
  case object Active extends ProcessState
  case object Stopping extends ProcessState
}
class StopOnlyFSM extends FSM[ProcessState, Data] {
  when(State.Active) {
    case Event(Stop, _) => stopSuccess()
  }
  when(State.Stopping) {
    case Event(ForceStop, _) => stopFailure()
  }
}
"#,
        );
        assert!(out.contains("\"State.Active\" --> [*] : Stop"));
        assert!(out.contains("\"State.Stopping\" --> [*] : ForceStop (failure)"));
        assert!(!out.contains("Unknown"));
    }

    #[test]
    fn test_no_transitions_placeholder() {
        let out = markup("case object Lonely extends ProcessState\n");
        assert_eq!(out, NO_TRANSITIONS_PLACEHOLDER);
    }

    #[test]
    fn test_declared_unknown_state_does_not_collide_with_sink() {
        let out = markup(
            r#"
case object Idle extends ProcessState
case object Unknown extends ProcessState
when(Idle) {
  case Event(Confuse, _) => goto(Unknown)
  case Event(Go, _) => vanished()
}
"#,
        );
        assert!(out.contains("Idle --> \"Unknown\" : Confuse"));
        assert!(out.contains("Idle --> Unknown : Go"));
    }

    #[test]
    fn test_unknown_destination_renders() {
        let out = markup(
            r#"
case object Idle extends ProcessState
when(Idle) {
  case Event(Go, _) => vanished()
}
"#,
        );
        assert!(out.contains("Idle --> Unknown : Go"));
    }
}
