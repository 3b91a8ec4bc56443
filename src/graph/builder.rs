//! Graph construction from discovered source files

use crossbeam_channel::Sender;
use tracing::{debug, instrument, warn};

use super::DependencyGraph;
use super::imports::{ResolveRules, extract_imports, resolve_import};
use crate::core::{AnalysisEvent, SkippedFile, SourceFile, notify};

/// Result of one graph build
#[derive(Debug, Clone, Default)]
pub struct BuildOutcome {
    pub graph: DependencyGraph,
    /// Files that could not be read; they contribute no node and no edges
    pub skipped: Vec<SkippedFile>,
}

/// Runs extraction and resolution over every file and records `module -> edges`.
///
/// Unreadable files are skipped with a warning. An empty input yields an empty
/// graph; deciding whether that is an error is up to the caller.
#[instrument(skip_all, fields(files = files.len()))]
pub fn build_graph(
    files: Vec<SourceFile>,
    rules: &ResolveRules,
    tx: &Option<Sender<AnalysisEvent>>,
) -> BuildOutcome {
    let mut outcome = BuildOutcome::default();

    for file in files {
        let content = match file.content {
            Ok(content) => content,
            Err(reason) => {
                warn!(module = %file.id, %reason, "skipping unreadable file");
                notify(
                    tx,
                    AnalysisEvent::FileSkipped {
                        id: file.id.clone(),
                        reason: reason.clone(),
                    },
                );
                outcome.skipped.push(SkippedFile { id: file.id, reason });
                continue;
            }
        };

        outcome.graph.add_module(file.id.clone());
        for target in extract_imports(&content) {
            match resolve_import(&file.id, &target, rules) {
                Some(resolved) => outcome.graph.add_edge(file.id.clone(), resolved),
                None => debug!(module = %file.id, %target, "ignoring non-source import"),
            }
        }
    }

    notify(
        tx,
        AnalysisEvent::GraphBuilt {
            modules: outcome.graph.module_count(),
            edges: outcome.graph.edge_count(),
        },
    );
    outcome
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_records_resolved_edges_in_source_order() {
        let files = vec![
            SourceFile::new(
                "src/app.ts",
                "import './styles.css';\nimport { b } from './lib/b';\nimport a from './a.ts';\nimport './lib/b';",
            ),
            SourceFile::new("src/a.ts", "export const a = 1;"),
        ];

        let outcome = build_graph(files, &ResolveRules::default(), &None);
        let graph = outcome.graph;

        assert_eq!(graph.module_count(), 2);
        assert_eq!(
            graph.imports_of("src/app.ts"),
            ["src/lib/b.ts", "src/a.ts", "src/lib/b.ts"]
        );
        assert!(graph.imports_of("src/a.ts").is_empty());
        assert!(outcome.skipped.is_empty());
    }

    #[test]
    fn test_unreadable_files_are_skipped_not_fatal() {
        let (tx, rx) = crossbeam_channel::unbounded();
        let files = vec![
            SourceFile::unreadable("src/broken.ts", "permission denied"),
            SourceFile::new("src/ok.ts", "import './broken';"),
        ];

        let outcome = build_graph(files, &ResolveRules::default(), &Some(tx));

        assert!(!outcome.graph.has_module("src/broken.ts"));
        assert_eq!(outcome.graph.imports_of("src/ok.ts"), ["src/broken.ts"]);
        assert_eq!(
            outcome.skipped,
            vec![SkippedFile {
                id: "src/broken.ts".into(),
                reason: "permission denied".into(),
            }]
        );

        let events: Vec<AnalysisEvent> = rx.try_iter().collect();
        assert!(matches!(events[0], AnalysisEvent::FileSkipped { .. }));
        assert!(matches!(
            events[1],
            AnalysisEvent::GraphBuilt { modules: 1, edges: 1 }
        ));
    }

    #[test]
    fn test_no_files_yields_empty_graph() {
        let outcome = build_graph(Vec::new(), &ResolveRules::default(), &None);
        assert!(outcome.graph.is_empty());
    }
}
