use crate::error::AnalysisWarning;
use crate::parser::{ActionRef, ParsedFsm, StopKind};
use petgraph::Direction;
use petgraph::stable_graph::{NodeIndex, StableGraph};
use std::collections::HashMap;

/// A node in the canonical state-transition graph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    /// Synthetic machine start.
    Entry,
    /// A declared state, keyed by qualified id.
    State(String),
    /// Synthetic terminal.
    Stop,
    /// Sink for transitions whose destination could not be resolved.
    Unknown,
}

impl Node {
    pub fn state_id(&self) -> Option<&str> {
        match self {
            Node::State(id) => Some(id),
            _ => None,
        }
    }
}

/// A directed graph of the state machine described by one source snapshot.
///
/// Nodes are the declared states plus the synthetic entry and terminal
/// nodes; edges are the resolved transition clauses in discovery order, with
/// the entry edge always first. Cycles are valid and render as-is; this is a
/// display tool, not a validator.
pub struct StateGraph {
    /// Nodes carry their identity, edges carry the display label
    /// (empty for the entry edge).
    pub graph: StableGraph<Node, String>,

    /// O(1) lookup of state nodes by qualified id; also guarantees each
    /// declared state maps to exactly one node.
    state_index: HashMap<String, NodeIndex>,

    entry_idx: NodeIndex,
    stop_idx: NodeIndex,
    unknown_idx: Option<NodeIndex>,

    /// The state the entry edge targets, when at least one state exists.
    pub entry_state: Option<String>,

    /// Qualified ids in declaration order; drives node ordering in emission.
    declared: Vec<String>,
}

impl StateGraph {
    /// Assemble the graph from a parsed snapshot. Never fails: edges that
    /// reference undeclared states are dropped into `warnings`.
    pub fn build(parsed: &ParsedFsm, warnings: &mut Vec<AnalysisWarning>) -> Self {
        let mut graph = StableGraph::new();
        let entry_idx = graph.add_node(Node::Entry);

        let mut state_index = HashMap::new();
        let mut declared = Vec::new();
        for decl in parsed.table.iter() {
            let idx = graph.add_node(Node::State(decl.qualified_id.clone()));
            state_index.insert(decl.qualified_id.clone(), idx);
            declared.push(decl.qualified_id.clone());
        }
        let stop_idx = graph.add_node(Node::Stop);

        let mut sm = Self {
            graph,
            state_index,
            entry_idx,
            stop_idx,
            unknown_idx: None,
            entry_state: None,
            declared,
        };

        // Entry state: first guarded block keyed by a declared state, in
        // source order, falling back to the first declared state.
        sm.entry_state = parsed
            .block_sources
            .iter()
            .find(|s| sm.state_index.contains_key(*s))
            .cloned()
            .or_else(|| sm.declared.first().cloned());
        if let Some(entry_state) = &sm.entry_state {
            let target = sm.state_index[entry_state];
            sm.graph.add_edge(sm.entry_idx, target, String::new());
        }

        for clause in &parsed.clauses {
            let Some(&from) = sm.state_index.get(&clause.source) else {
                warnings.push(AnalysisWarning::DroppedEdge {
                    from: clause.source.clone(),
                    to: clause.target_name(),
                    label: clause.label.clone(),
                });
                continue;
            };
            match &clause.action {
                ActionRef::Goto { target, .. } => match sm.state_index.get(target) {
                    Some(&to) => {
                        sm.graph.add_edge(from, to, clause.label.clone());
                    }
                    None => warnings.push(AnalysisWarning::DroppedEdge {
                        from: clause.source.clone(),
                        to: target.clone(),
                        label: clause.label.clone(),
                    }),
                },
                ActionRef::Stay => {
                    sm.graph.add_edge(from, from, clause.label.clone());
                }
                ActionRef::Stop(kind) => {
                    let label = match kind {
                        StopKind::Success => clause.label.clone(),
                        StopKind::Failure => format!("{} (failure)", clause.label),
                    };
                    sm.graph.add_edge(from, sm.stop_idx, label);
                }
                ActionRef::Unknown | ActionRef::CallLocal(_) => {
                    let unknown = sm.unknown_node();
                    sm.graph.add_edge(from, unknown, clause.label.clone());
                }
            }
        }
        sm
    }

    fn unknown_node(&mut self) -> NodeIndex {
        match self.unknown_idx {
            Some(idx) => idx,
            None => {
                let idx = self.graph.add_node(Node::Unknown);
                self.unknown_idx = Some(idx);
                idx
            }
        }
    }

    /// Qualified state ids in declaration order.
    pub fn declared_states(&self) -> &[String] {
        &self.declared
    }

    pub fn has_unknown_node(&self) -> bool {
        self.unknown_idx.is_some()
    }

    /// Edges as `(from, to, label)` in insertion order, entry edge first.
    pub fn edges(&self) -> impl Iterator<Item = (&Node, &Node, &str)> {
        self.graph.edge_indices().filter_map(|idx| {
            let (from, to) = self.graph.edge_endpoints(idx)?;
            Some((
                self.graph.node_weight(from)?,
                self.graph.node_weight(to)?,
                self.graph.edge_weight(idx)?.as_str(),
            ))
        })
    }

    /// Number of edges excluding the synthetic entry edge.
    pub fn transition_count(&self) -> usize {
        let entry_edges = self
            .graph
            .edges_directed(self.entry_idx, Direction::Outgoing)
            .count();
        self.graph.edge_count() - entry_edges
    }

    /// Out-degree of a declared state, self edges included.
    pub fn out_degree(&self, qualified_id: &str) -> usize {
        self.state_index
            .get(qualified_id)
            .map(|&idx| self.graph.edges_directed(idx, Direction::Outgoing).count())
            .unwrap_or(0)
    }

    /// Get graph statistics
    pub fn stats(&self) -> GraphStats {
        let mut terminal_transitions = 0;
        let mut unresolved_transitions = 0;
        for (_, to, _) in self.edges() {
            match to {
                Node::Stop => terminal_transitions += 1,
                Node::Unknown => unresolved_transitions += 1,
                _ => {}
            }
        }
        GraphStats {
            total_states: self.declared.len(),
            total_transitions: self.transition_count(),
            terminal_transitions,
            unresolved_transitions,
        }
    }

    /// Export to DOT format for Graphviz
    pub fn to_dot(&self) -> String {
        let mut dot = "digraph StateMachine {\n".to_string();
        dot.push_str("  rankdir=LR;\n");
        dot.push_str("  node [shape=box, style=rounded];\n");
        dot.push_str("  ENTRY [shape=point];\n");
        dot.push_str("  STOP [shape=doublecircle, label=\"\"];\n\n");

        for id in &self.declared {
            dot.push_str(&format!("  \"{}\";\n", id));
        }
        if self.has_unknown_node() {
            // Synthetic id, so a declared state named "Unknown" stays separate.
            dot.push_str("  UNKNOWN [style=dashed, label=\"Unknown\"];\n");
        }
        dot.push('\n');

        for (from, to, label) in self.edges() {
            let from = dot_name(from);
            let to = dot_name(to);
            if label.is_empty() {
                dot.push_str(&format!("  {} -> {};\n", from, to));
            } else {
                dot.push_str(&format!("  {} -> {} [label=\"{}\"];\n", from, to, label));
            }
        }

        dot.push_str("}\n");
        dot
    }
}

fn dot_name(node: &Node) -> String {
    match node {
        Node::Entry => "ENTRY".to_string(),
        Node::Stop => "STOP".to_string(),
        Node::Unknown => "UNKNOWN".to_string(),
        Node::State(id) => format!("\"{}\"", id),
    }
}

/// Statistics of a state graph.
#[derive(Debug, Clone)]
pub struct GraphStats {
    pub total_states: usize,
    pub total_transitions: usize,
    pub terminal_transitions: usize,
    pub unresolved_transitions: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_source;

    fn build(src: &str) -> (StateGraph, Vec<AnalysisWarning>) {
        let parsed = parse_source(src).unwrap();
        let mut warnings = parsed.warnings.clone();
        let graph = StateGraph::build(&parsed, &mut warnings);
        (graph, warnings)
    }

    const SIMPLE: &str = r#"
object State {
  case object Idle extends ProcessState
  case object Running extends ProcessState
}
class SimpleFSM extends FSM[ProcessState, Data] {
  when(State.Idle) {
    case Event(Start, _) => goto(State.Running)
    case Event(Ping, _) => stay()
  }
  when(State.Running) {
    case Event(Finish, _) => stop()
    case Event(Crash, _) => stop(FSM.Failure(reason))
  }
}
"#;

    #[test]
    fn test_entry_edge_is_first() {
        let (graph, warnings) = build(SIMPLE);
        assert!(warnings.is_empty());
        assert_eq!(graph.entry_state.as_deref(), Some("State.Idle"));
        let first = graph.edges().next().unwrap();
        assert_eq!(first.0, &Node::Entry);
        assert_eq!(first.1.state_id(), Some("State.Idle"));
        assert_eq!(first.2, "");
    }

    #[test]
    fn test_stay_is_self_edge() {
        let (graph, _) = build(SIMPLE);
        let self_edges: Vec<_> = graph
            .edges()
            .filter(|(from, to, _)| from == to)
            .collect();
        assert_eq!(self_edges.len(), 1);
        assert_eq!(self_edges[0].2, "Ping");
    }

    #[test]
    fn test_stop_edges_carry_variant() {
        let (graph, _) = build(SIMPLE);
        let stop_labels: Vec<&str> = graph
            .edges()
            .filter(|(_, to, _)| matches!(to, Node::Stop))
            .map(|(_, _, label)| label)
            .collect();
        assert_eq!(stop_labels, vec!["Finish", "Crash (failure)"]);
    }

    #[test]
    fn test_undeclared_target_is_dropped_with_warning() {
        let (graph, warnings) = build(
            r#"
object State { case object Idle extends ProcessState }
when(State.Idle) {
  case Event(Go, _) => goto(Nowhere)
  case Event(Ping, _) => stay()
}
"#,
        );
        assert_eq!(graph.transition_count(), 1);
        assert_eq!(
            warnings,
            vec![AnalysisWarning::DroppedEdge {
                from: "State.Idle".to_string(),
                to: "Nowhere".to_string(),
                label: "Go".to_string(),
            }]
        );
    }

    #[test]
    fn test_unresolved_call_routes_to_unknown() {
        let (graph, warnings) = build(
            r#"
object State { case object Idle extends ProcessState }
when(State.Idle) {
  case Event(Go, _) => vanished()
}
"#,
        );
        assert!(graph.has_unknown_node());
        assert_eq!(warnings.len(), 1);
        let unknown_edges: Vec<_> = graph
            .edges()
            .filter(|(_, to, _)| matches!(to, Node::Unknown))
            .collect();
        assert_eq!(unknown_edges.len(), 1);
        assert_eq!(unknown_edges[0].2, "Go");
    }

    #[test]
    fn test_entry_falls_back_to_first_declared() {
        let (graph, _) = build(
            r#"
object State {
  case object First extends ProcessState
  case object Second extends ProcessState
}
"#,
        );
        assert_eq!(graph.entry_state.as_deref(), Some("State.First"));
        assert_eq!(graph.transition_count(), 0);
    }

    #[test]
    fn test_stats() {
        let (graph, _) = build(SIMPLE);
        let stats = graph.stats();
        assert_eq!(stats.total_states, 2);
        assert_eq!(stats.total_transitions, 4);
        assert_eq!(stats.terminal_transitions, 2);
        assert_eq!(stats.unresolved_transitions, 0);
    }

    #[test]
    fn test_to_dot_output() {
        let (graph, _) = build(SIMPLE);
        let dot = graph.to_dot();
        assert!(dot.contains("digraph StateMachine"));
        assert!(dot.contains("\"State.Idle\" -> \"State.Running\" [label=\"Start\"]"));
        assert!(dot.contains("ENTRY -> \"State.Idle\";"));
    }

    #[test]
    fn test_to_dot_unknown_sink_uses_synthetic_id() {
        let (graph, _) = build(
            r#"
case object Idle extends ProcessState
case object Unknown extends ProcessState
when(Idle) {
  case Event(Confuse, _) => goto(Unknown)
  case Event(Go, _) => vanished()
}
"#,
        );
        let dot = graph.to_dot();
        assert!(dot.contains("UNKNOWN [style=dashed, label=\"Unknown\"];"));
        assert!(dot.contains("\"Idle\" -> \"Unknown\" [label=\"Confuse\"];"));
        assert!(dot.contains("\"Idle\" -> UNKNOWN [label=\"Go\"];"));
    }
}
