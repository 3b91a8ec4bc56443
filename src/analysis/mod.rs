//! Heuristic (graph-algorithmic) structural analysis

pub mod cycles;
pub mod hubs;

pub use cycles::find_cycles;
pub use hubs::{DEFAULT_HUB_THRESHOLD, find_hubs, reverse_edges};

use crate::core::HeuristicResult;
use crate::graph::DependencyGraph;

/// Runs cycle and hub detection over one graph snapshot.
pub fn run_heuristics(graph: &DependencyGraph, hub_threshold: usize) -> HeuristicResult {
    HeuristicResult {
        cycles: find_cycles(graph),
        hubs: find_hubs(graph, hub_threshold),
    }
}
