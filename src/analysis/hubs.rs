use std::collections::BTreeMap;

use tracing::instrument;

use crate::core::{HubRecord, ModuleId};
use crate::graph::DependencyGraph;

pub const DEFAULT_HUB_THRESHOLD: usize = 3;

/// Importer lists per imported module, built by visiting every edge once.
pub fn reverse_edges(graph: &DependencyGraph) -> BTreeMap<&ModuleId, Vec<&ModuleId>> {
    let mut incoming: BTreeMap<&ModuleId, Vec<&ModuleId>> = BTreeMap::new();
    for (from, targets) in graph.get_edges() {
        for to in targets {
            incoming.entry(to).or_default().push(from);
        }
    }
    incoming
}

/// Modules with at least `threshold` incoming edges, most imported first.
/// Ties are ordered by module id.
#[instrument(skip(graph))]
pub fn find_hubs(graph: &DependencyGraph, threshold: usize) -> Vec<HubRecord> {
    let mut hubs: Vec<HubRecord> = reverse_edges(graph)
        .into_iter()
        .filter(|(_, importers)| importers.len() >= threshold)
        .map(|(module, importers)| HubRecord {
            module: module.clone(),
            importers: importers.into_iter().cloned().collect(),
        })
        .collect();

    hubs.sort_by(|a, b| {
        b.importer_count()
            .cmp(&a.importer_count())
            .then_with(|| a.module.cmp(&b.module))
    });
    hubs
}
