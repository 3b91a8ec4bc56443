//! Circular import detection
//!
//! Depth-first search over the full node set (scanned modules plus dangling
//! targets). Every edge that points back into the open DFS path produces one
//! [`CycleRecord`]: the path suffix from that node's occurrence, closed with
//! the node again.
//!
//! Records are not canonicalized. Two back edges into the same loop give two
//! records, and which rotation gets reported depends on the root the walk
//! started from.

use std::collections::HashMap;

use tracing::instrument;

use crate::core::{CycleRecord, ModuleId};
use crate::graph::DependencyGraph;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum VisitState {
    Unvisited,
    OnStack,
    Done,
}

/// Finds every back edge reachable by DFS and reports the loop it closes.
///
/// Iterative: frames are `(node, next edge position)`, so deep graphs cannot
/// overflow the call stack.
#[instrument(skip_all, fields(modules = graph.module_count()))]
pub fn find_cycles(graph: &DependencyGraph) -> Vec<CycleRecord> {
    let nodes = graph.nodes();
    let index: HashMap<&str, usize> = nodes
        .iter()
        .enumerate()
        .map(|(i, id)| (id.as_str(), i))
        .collect();
    let adjacency: Vec<Vec<usize>> = nodes
        .iter()
        .map(|id| {
            graph
                .imports_of(id)
                .iter()
                .map(|target| index[target.as_str()])
                .collect()
        })
        .collect();

    let mut state = vec![VisitState::Unvisited; nodes.len()];
    // Position of each on-stack node within `path`
    let mut path_pos: Vec<usize> = vec![0; nodes.len()];
    let mut path: Vec<usize> = Vec::new();
    let mut frames: Vec<(usize, usize)> = Vec::new();
    let mut cycles = Vec::new();

    for root in 0..nodes.len() {
        if state[root] != VisitState::Unvisited {
            continue;
        }

        state[root] = VisitState::OnStack;
        path_pos[root] = path.len();
        path.push(root);
        frames.push((root, 0));

        while let Some(frame) = frames.last_mut() {
            let (node, edge) = *frame;
            let Some(&next) = adjacency[node].get(edge) else {
                frames.pop();
                path.pop();
                state[node] = VisitState::Done;
                continue;
            };
            frame.1 += 1;

            match state[next] {
                VisitState::Unvisited => {
                    state[next] = VisitState::OnStack;
                    path_pos[next] = path.len();
                    path.push(next);
                    frames.push((next, 0));
                }
                VisitState::OnStack => {
                    let mut cycle: Vec<ModuleId> = path[path_pos[next]..]
                        .iter()
                        .map(|&i| nodes[i].clone())
                        .collect();
                    cycle.push(nodes[next].clone());
                    cycles.push(CycleRecord(cycle));
                }
                VisitState::Done => {}
            }
        }
    }

    cycles
}
