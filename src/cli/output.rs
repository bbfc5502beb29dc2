//! Output formatting module
//!
//! This module handles formatting analysis results for different output formats.

use crate::Result;
use crate::state_machine::{Analysis, Node, analyzer};
use serde_json::json;

fn node_display(node: &Node) -> &str {
    match node {
        Node::Entry | Node::Stop => "[*]",
        Node::Unknown => "Unknown",
        Node::State(id) => id,
    }
}

/// Output the analysis as JSON
pub fn output_json(w: &mut impl std::io::Write, analysis: &Analysis) -> Result<()> {
    let stats = analysis.graph.stats();
    let report = analyzer::detect_pattern(&analysis.graph);

    let output = json!({
        "summary": {
            "total_states": stats.total_states,
            "total_transitions": stats.total_transitions,
            "terminal_transitions": stats.terminal_transitions,
            "unresolved_transitions": stats.unresolved_transitions,
            "pattern": report.pattern.display_name(),
            "entry_state": &analysis.graph.entry_state,
        },
        "states": analysis.graph.declared_states(),
        "transitions": analysis.graph.edges().map(|(from, to, label)| {
            json!({
                "from": node_display(from),
                "to": node_display(to),
                "label": label,
            })
        }).collect::<Vec<_>>(),
        "warnings": analysis.warnings.iter().map(|w| w.to_string()).collect::<Vec<_>>(),
        "mermaid": analysis.markup,
    });

    serde_json::to_writer_pretty(&mut *w, &output)?;
    writeln!(w)?; // Add trailing newline
    Ok(())
}

/// Output the analysis as text table
pub fn output_table(w: &mut impl std::io::Write, analysis: &Analysis) -> Result<()> {
    let stats = analysis.graph.stats();

    writeln!(w, "FSM Visualization - Analysis Results")?;
    writeln!(w, "{}", "=".repeat(80))?;
    writeln!(w)?;

    writeln!(w, "Summary:")?;
    writeln!(w, "  Total States:      {}", stats.total_states)?;
    writeln!(w, "  Total Transitions: {}", stats.total_transitions)?;
    if stats.unresolved_transitions > 0 {
        writeln!(w, "  Unresolved:        {}", stats.unresolved_transitions)?;
    }
    writeln!(w)?;

    if !analysis.graph.declared_states().is_empty() {
        writeln!(w, "States:")?;
        writeln!(w, "{:-<80}", "")?;
        for state in analysis.graph.declared_states() {
            let marker = if analysis.graph.entry_state.as_deref() == Some(state.as_str()) {
                " (entry)"
            } else {
                ""
            };
            writeln!(w, "  {}{}", state, marker)?;
        }
        writeln!(w)?;
    }

    let transitions: Vec<_> = analysis
        .graph
        .edges()
        .filter(|(from, _, _)| !matches!(from, Node::Entry))
        .collect();
    if !transitions.is_empty() {
        writeln!(w, "Transitions:")?;
        writeln!(w, "{:-<80}", "")?;
        writeln!(w, "{:<30} {:<30} {:<18}", "From", "To", "Event")?;
        writeln!(w, "{:-<80}", "")?;
        for (from, to, label) in transitions {
            writeln!(
                w,
                "{:<30} {:<30} {:<18}",
                node_display(from),
                node_display(to),
                label
            )?;
        }
        writeln!(w)?;
    }

    if !analysis.warnings.is_empty() {
        writeln!(w, "Warnings:")?;
        for warning in &analysis.warnings {
            writeln!(w, "  {}", warning)?;
        }
        writeln!(w)?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state_machine::analyze;

    const SAMPLE: &str = r#"
object State {
  case object Idle extends DoorState
  case object Open extends DoorState
}
when(State.Idle) {
  case Event(OpenDoor, _) => goto(State.Open)
}
when(State.Open) {
  case Event(CloseDoor, _) => goto(State.Idle)
}
"#;

    #[test]
    fn test_output_json() {
        let analysis = analyze(SAMPLE).unwrap();
        let mut output = Vec::new();
        output_json(&mut output, &analysis).unwrap();

        let parsed: serde_json::Value = serde_json::from_slice(&output).unwrap();
        assert_eq!(parsed["summary"]["total_states"], 2);
        assert_eq!(parsed["summary"]["entry_state"], "State.Idle");
        assert_eq!(parsed["transitions"][1]["label"], "OpenDoor");
    }

    #[test]
    fn test_output_table() {
        let analysis = analyze(SAMPLE).unwrap();
        let mut output = Vec::new();
        output_table(&mut output, &analysis).unwrap();

        let text = String::from_utf8(output).unwrap();
        assert!(text.contains("Total States:      2"));
        assert!(text.contains("State.Idle (entry)"));
        assert!(text.contains("OpenDoor"));
    }
}
