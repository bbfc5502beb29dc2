//! State machine shape analyzer
//!
//! Classifies an analyzed machine as linear, branching or cyclic, with basic
//! metrics. Only the real (declared) states participate; the synthetic entry
//! and terminal nodes and `stay` self loops say nothing about shape.

use super::graph::{Node, StateGraph};
use petgraph::graph::DiGraph;
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MachinePattern {
    /// A -> B -> C -> D
    Linear,

    /// A -> B
    ///   -> C
    Branching,

    /// A -> B -> A
    Cyclic,

    /// Mixed or unrecognized
    Unknown,
}

impl MachinePattern {
    pub fn display_name(&self) -> &'static str {
        match self {
            MachinePattern::Linear => "Linear",
            MachinePattern::Branching => "Branching",
            MachinePattern::Cyclic => "Cyclic",
            MachinePattern::Unknown => "Complex/Unknown",
        }
    }
}

/// Analysis report containing pattern and metrics
#[derive(Debug, Clone)]
pub struct AnalysisReport {
    pub pattern: MachinePattern,
    pub branching_factor: f64,
    pub has_cycles: bool,
    pub state_count: usize,
    pub transition_count: usize,
}

/// Detect the pattern of a state graph
pub fn detect_pattern(graph: &StateGraph) -> AnalysisReport {
    let state_count = graph.declared_states().len();
    let transition_count = graph.transition_count();

    if state_count == 0 {
        return AnalysisReport {
            pattern: MachinePattern::Unknown,
            branching_factor: 0.0,
            has_cycles: false,
            state_count,
            transition_count,
        };
    }

    // Shape subgraph: declared states only, self loops excluded.
    let mut simple: DiGraph<(), ()> = DiGraph::new();
    let mut index = HashMap::new();
    for id in graph.declared_states() {
        index.insert(id.as_str(), simple.add_node(()));
    }
    let mut out_degrees: HashMap<&str, usize> = HashMap::new();
    for (from, to, _) in graph.edges() {
        let (Some(from_id), Some(to_id)) = (from.state_id(), to.state_id()) else {
            continue;
        };
        if from_id == to_id {
            continue;
        }
        simple.add_edge(index[from_id], index[to_id], ());
        *out_degrees.entry(from_id).or_default() += 1;
    }

    let has_cycles = petgraph::algo::is_cyclic_directed(&simple);
    let total_out: usize = out_degrees.values().sum();
    let branching_factor = total_out as f64 / state_count as f64;
    let max_out = out_degrees.values().copied().max().unwrap_or(0);

    let pattern = if has_cycles {
        MachinePattern::Cyclic
    } else if max_out <= 1 {
        MachinePattern::Linear
    } else if branching_factor <= 2.0 {
        MachinePattern::Branching
    } else {
        MachinePattern::Unknown
    };

    AnalysisReport {
        pattern,
        branching_factor,
        has_cycles,
        state_count,
        transition_count,
    }
}
