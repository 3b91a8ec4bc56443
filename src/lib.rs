pub mod analysis;
pub mod config;
pub mod core;
pub mod error;
pub mod format;
pub mod fs;
pub mod graph;
pub mod orchestrator;
pub mod runner;
pub mod semantic;
pub mod watch;

// Re-export key items for convenience
pub use config::{KnotConfig, OutputFormat, SemanticConfig};
pub use core::{AnalysisEvent, AnalysisReport, CycleRecord, HeuristicResult, HubRecord, ModuleId};
pub use error::{AnalysisError, SemanticError};
pub use graph::DependencyGraph;
pub use orchestrator::{Orchestrator, Status};
pub use runner::run;
