//! Module dependency graph
//!
//! Built from scratch on every analysis run by [`build_graph`].

pub mod builder;
pub mod imports;

pub use builder::{BuildOutcome, build_graph};
pub use imports::{extract_imports, resolve_import};

use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::core::{GraphStats, ModuleId};

/// Directed import graph: importer -> imported modules, in source order.
///
/// Keys are the scanned modules. Edge targets may name modules that were never
/// scanned; those are still nodes, they just have no outgoing edges.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DependencyGraph {
    edges: BTreeMap<ModuleId, Vec<ModuleId>>,
}

impl DependencyGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a scanned module. Existing edges are kept.
    pub fn add_module(&mut self, id: ModuleId) {
        self.edges.entry(id).or_default();
    }

    pub fn add_edge(&mut self, from: ModuleId, to: ModuleId) {
        self.edges.entry(from).or_default().push(to);
    }

    pub fn get_edges(&self) -> &BTreeMap<ModuleId, Vec<ModuleId>> {
        &self.edges
    }

    pub fn imports_of(&self, id: &str) -> &[ModuleId] {
        self.edges.get(id).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    pub fn module_count(&self) -> usize {
        self.edges.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.values().map(Vec::len).sum()
    }

    pub fn has_module(&self, id: &str) -> bool {
        self.edges.contains_key(id)
    }

    /// Every node: scanned modules in key order, then dangling targets in first-seen order.
    pub fn nodes(&self) -> Vec<&ModuleId> {
        let mut seen: HashSet<&ModuleId> = self.edges.keys().collect();
        let mut nodes: Vec<&ModuleId> = self.edges.keys().collect();
        for targets in self.edges.values() {
            for target in targets {
                if seen.insert(target) {
                    nodes.push(target);
                }
            }
        }
        nodes
    }

    pub fn stats(&self) -> GraphStats {
        GraphStats {
            modules: self.module_count(),
            edges: self.edge_count(),
            dangling: self.nodes().len() - self.module_count(),
        }
    }
}

impl<K, V> FromIterator<(K, V)> for DependencyGraph
where
    K: Into<ModuleId>,
    V: IntoIterator,
    V::Item: Into<ModuleId>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut graph = Self::new();
        for (from, targets) in iter {
            let from = from.into();
            graph.add_module(from.clone());
            for to in targets {
                graph.add_edge(from.clone(), to.into());
            }
        }
        graph
    }
}
