//! Core types shared across knot modules

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::graph::DependencyGraph;

/// Normalized, forward-slash separated, root-relative module path (e.g. `src/core/parser.ts`)
pub type ModuleId = String;

/// Events emitted while an analysis run progresses
#[derive(Debug, Clone)]
pub enum AnalysisEvent {
    /// A run has started
    RunStarted(u64),
    /// Number of candidate files discovered
    FilesFound(usize),
    /// A file could not be read and contributes no edges
    FileSkipped { id: ModuleId, reason: String },
    /// Graph construction finished
    GraphBuilt { modules: usize, edges: usize },
    /// Cycle and hub detection finished
    HeuristicsDone { cycles: usize, hubs: usize },
    /// External semantic analysis finished
    SemanticDone,
    /// Run finished and its report is cached
    Complete(u64),
    /// Run failed; the previous report (if any) is untouched
    Error(String),
}

/// One candidate file handed over by a file source
#[derive(Debug, Clone)]
pub struct SourceFile {
    pub id: ModuleId,
    /// File text, or the read error message
    pub content: Result<String, String>,
}

impl SourceFile {
    pub fn new(id: impl Into<ModuleId>, content: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            content: Ok(content.into()),
        }
    }

    pub fn unreadable(id: impl Into<ModuleId>, reason: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            content: Err(reason.into()),
        }
    }
}

/// A file that was discovered but could not be read
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedFile {
    pub id: ModuleId,
    pub reason: String,
}

/// One closed walk through the graph; first and last entries are the same module
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CycleRecord(pub Vec<ModuleId>);

impl CycleRecord {
    pub fn path(&self) -> &[ModuleId] {
        &self.0
    }

    /// Number of distinct edges in the loop
    pub fn len(&self) -> usize {
        self.0.len().saturating_sub(1)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl std::fmt::Display for CycleRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.join(" -> "))
    }
}

/// A module imported by at least `threshold` edges
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HubRecord {
    pub module: ModuleId,
    /// Importers in edge order, duplicates preserved
    pub importers: Vec<ModuleId>,
}

impl HubRecord {
    pub fn importer_count(&self) -> usize {
        self.importers.len()
    }
}

/// Output of the graph-algorithmic analysis
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeuristicResult {
    pub cycles: Vec<CycleRecord>,
    pub hubs: Vec<HubRecord>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SemanticCycle {
    pub path: Vec<ModuleId>,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SemanticHub {
    pub module: ModuleId,
    pub recommendation: String,
}

/// Verdict of the external semantic analyzer
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SemanticResult {
    pub cycles: Vec<SemanticCycle>,
    pub hubs: Vec<SemanticHub>,
    pub suggestions: Vec<String>,
}

impl SemanticResult {
    pub fn is_empty(&self) -> bool {
        self.cycles.is_empty() && self.hubs.is_empty() && self.suggestions.is_empty()
    }
}

/// Size of the graph a report was computed from
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphStats {
    /// Scanned modules (graph keys)
    pub modules: usize,
    pub edges: usize,
    /// Edge targets that were never scanned
    pub dangling: usize,
}

/// Immutable result of one successful analysis run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub run: u64,
    pub generated_at: DateTime<Utc>,
    pub stats: GraphStats,
    /// The graph snapshot both analyses ran on
    pub graph: DependencyGraph,
    pub skipped: Vec<SkippedFile>,
    pub heuristic: HeuristicResult,
    pub semantic: SemanticResult,
}
