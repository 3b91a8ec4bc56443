use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Output format for the analysis report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum OutputFormat {
    #[default]
    Plain,
    Json,
    Mermaid, // Dependency diagram with cycle edges highlighted
}

/// Settings for the external semantic analyzer
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SemanticConfig {
    /// If false, the run uses the offline analyzer and reports no semantic findings
    pub enabled: bool,
    /// OpenAI-compatible chat completions endpoint
    pub endpoint: String,
    /// Model name sent with every request
    pub model: String,
    /// Name of the environment variable holding the API key
    pub api_key_env: String,
    /// Request timeout in seconds
    pub timeout_secs: u64,
    /// Upper bound on the response length requested from the model
    pub max_tokens: u32,
}

impl Default for SemanticConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            endpoint: "https://api.openai.com/v1/chat/completions".to_string(),
            model: "gpt-4o-mini".to_string(),
            api_key_env: "KNOT_API_KEY".to_string(),
            timeout_secs: 60,
            max_tokens: 2048,
        }
    }
}

/// Main configuration for knot
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct KnotConfig {
    /// Project root to analyze
    pub path: PathBuf,
    /// Write the report here instead of stdout
    pub output: Option<PathBuf>,
    /// Report format (Plain, Json, Mermaid)
    pub output_format: OutputFormat,
    /// List of glob patterns to ignore (e.g. "*.spec.ts")
    pub ignore_patterns: Vec<String>,
    /// List of glob patterns to include (only matching files are scanned)
    pub include_patterns: Vec<String>,
    /// Maximum directory depth to traverse
    pub max_depth: Option<usize>,
    /// Extensions treated as source modules (without the leading dot)
    pub source_extensions: Vec<String>,
    /// Appended to extensionless import targets
    pub default_extension: String,
    /// Minimum number of importers for a module to count as a hub
    pub hub_threshold: usize,
    /// Enable verbose progress output
    pub verbose: bool,
    /// Keep running and re-analyze whenever a source file changes
    pub watch: bool,
    /// External semantic analyzer settings
    pub semantic: SemanticConfig,
}

impl KnotConfig {
    /// Validates the configuration before a run is started.
    pub fn validate(&self) -> anyhow::Result<()> {
        if !self.path.exists() {
            anyhow::bail!("Path does not exist: {:?}", self.path);
        }
        if self.hub_threshold == 0 {
            anyhow::bail!("hub_threshold must be at least 1");
        }
        if self.source_extensions.is_empty() {
            anyhow::bail!("source_extensions must not be empty");
        }
        if !self.is_source_extension(&self.default_extension) {
            anyhow::bail!(
                "default_extension {:?} is not one of the source extensions {:?}",
                self.default_extension,
                self.source_extensions
            );
        }
        Ok(())
    }

    pub fn is_source_extension(&self, ext: &str) -> bool {
        self.source_extensions.iter().any(|e| e == ext)
    }

    /// Attempts to load configuration from `knot.toml` in the current directory.
    pub fn load_from_file() -> Option<Self> {
        std::fs::read_to_string("knot.toml")
            .ok()
            .and_then(|content| toml::from_str(&content).ok())
    }
}

impl Default for KnotConfig {
    fn default() -> Self {
        let defaults = vec![
            // Version Control
            ".git",
            ".hg",
            ".svn",
            // IDEs
            ".idea",
            ".vscode",
            // Build / Dependency
            "node_modules",
            "target",
            "dist",
            "build",
            "out",
            "coverage",
            ".next",
            ".turbo",
            // Bundled output
            "*.min.js",
            "*.bundle.js",
        ];

        let extensions = vec!["ts", "tsx", "js", "jsx", "mjs", "cjs"];

        Self {
            path: PathBuf::from("."),
            output: None,
            output_format: OutputFormat::Plain,
            ignore_patterns: defaults.into_iter().map(String::from).collect(),
            include_patterns: Vec::new(),
            max_depth: None,
            source_extensions: extensions.into_iter().map(String::from).collect(),
            default_extension: "ts".to_string(),
            hub_threshold: crate::analysis::DEFAULT_HUB_THRESHOLD,
            verbose: false,
            watch: false,
            semantic: SemanticConfig::default(),
        }
    }
}
