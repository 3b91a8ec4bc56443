//! External semantic analysis
//!
//! The analyzer only ever sees the dependency graph (module id -> imported
//! ids). File contents never leave the process.

pub mod client;

pub use client::LlmAnalyzer;

use crate::config::SemanticConfig;
use crate::core::SemanticResult;
use crate::error::SemanticError;
use crate::graph::DependencyGraph;

/// Judges *why* a coupling is harmful. Runs concurrently with the heuristics.
pub trait SemanticAnalyzer: Send + Sync {
    fn analyze(&self, graph: &DependencyGraph) -> Result<SemanticResult, SemanticError>;
}

/// Used when the user turned semantic analysis off. Always reports no findings.
#[derive(Debug, Clone, Copy, Default)]
pub struct OfflineAnalyzer;

impl SemanticAnalyzer for OfflineAnalyzer {
    fn analyze(&self, _graph: &DependencyGraph) -> Result<SemanticResult, SemanticError> {
        Ok(SemanticResult::default())
    }
}

/// Picks the analyzer the configuration asks for.
pub fn create_analyzer(config: &SemanticConfig) -> Box<dyn SemanticAnalyzer> {
    if config.enabled {
        Box::new(LlmAnalyzer::new(config.clone()))
    } else {
        Box::new(OfflineAnalyzer)
    }
}

impl<T: SemanticAnalyzer + ?Sized> SemanticAnalyzer for Box<T> {
    fn analyze(&self, graph: &DependencyGraph) -> Result<SemanticResult, SemanticError> {
        (**self).analyze(graph)
    }
}

const INSTRUCTIONS: &str = "You are reviewing the module import graph of a software project. \
The graph maps each module path to the modules it imports. \
Identify circular dependencies that are architecturally harmful and explain why, \
identify modules that are imported too widely and recommend how to split or invert them, \
and give short, concrete refactoring suggestions. \
Answer with a single JSON object and nothing else, shaped as \
{\"cycles\": [{\"path\": [string], \"reason\": string}], \
\"hubs\": [{\"module\": string, \"recommendation\": string}], \
\"suggestions\": [string]}.";

/// Builds the user prompt. Only the serialized graph is included.
pub fn build_prompt(graph: &DependencyGraph) -> Result<String, SemanticError> {
    let graph_json = serde_json::to_string_pretty(graph)
        .map_err(|e| SemanticError::Request(format!("failed to serialize graph: {}", e)))?;
    Ok(format!("{}\n\nDependency graph:\n{}", INSTRUCTIONS, graph_json))
}

/// Parses the model's answer into a verdict.
///
/// Tolerates Markdown code fences and prose around the JSON object.
pub fn parse_verdict(text: &str) -> Result<SemanticResult, SemanticError> {
    let start = text.find('{');
    let end = text.rfind('}');
    let json = match (start, end) {
        (Some(s), Some(e)) if s < e => &text[s..=e],
        _ => {
            return Err(SemanticError::Malformed(
                "response contains no JSON object".to_string(),
            ));
        }
    };

    serde_json::from_str(json).map_err(|e| SemanticError::Malformed(e.to_string()))
}
