//! File scanner for discovering source modules
//!
//! Handles directory walking, ignore files, and the source/declaration filter.

use crate::config::KnotConfig;
use crate::core::SourceFile;
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Supplies the candidate files of one analysis run.
///
/// Implementations already exclude files that must not be analyzed; every
/// returned entry becomes a graph node unless its content is an error.
pub trait FileSource: Send + Sync {
    fn discover(&self) -> Result<Vec<SourceFile>>;

    /// Human readable name of what is being scanned, used in error messages
    fn describe(&self) -> String;
}

/// In-memory file set, mostly useful for embedding and tests.
impl FileSource for Vec<SourceFile> {
    fn discover(&self) -> Result<Vec<SourceFile>> {
        Ok(self.clone())
    }

    fn describe(&self) -> String {
        "<in-memory files>".to_string()
    }
}

/// Discovers source files on disk below a project root.
#[derive(Debug, Clone)]
pub struct FsSource {
    root: PathBuf,
    ignore_patterns: Vec<String>,
    include_patterns: Vec<String>,
    max_depth: Option<usize>,
    source_extensions: Vec<String>,
}

impl FsSource {
    pub fn from_config(config: &KnotConfig) -> Self {
        Self {
            root: config.path.clone(),
            ignore_patterns: config.ignore_patterns.clone(),
            include_patterns: config.include_patterns.clone(),
            max_depth: config.max_depth,
            source_extensions: config.source_extensions.clone(),
        }
    }

    fn is_candidate(&self, path: &Path) -> bool {
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            return false;
        };
        if is_declaration_file(name) {
            return false;
        }
        path.extension()
            .and_then(|e| e.to_str())
            .is_some_and(|ext| self.source_extensions.iter().any(|e| e == ext))
    }
}

impl FileSource for FsSource {
    fn discover(&self) -> Result<Vec<SourceFile>> {
        let root_path = self
            .root
            .canonicalize()
            .with_context(|| format!("Failed to find directory: {:?}", self.root))?;

        let walk_config = crate::fs::WalkConfig {
            ignore_patterns: &self.ignore_patterns,
            include_patterns: &self.include_patterns,
            max_depth: self.max_depth,
        };
        let paths = crate::fs::walk_directory(&root_path, walk_config)?;

        let files: Vec<SourceFile> = paths
            .into_iter()
            .filter(|p| self.is_candidate(p))
            .map(|path| {
                let id = module_id(&path, &root_path);
                match std::fs::read_to_string(&path) {
                    Ok(content) => SourceFile::new(id, content),
                    Err(e) => SourceFile::unreadable(id, e.to_string()),
                }
            })
            .collect();

        debug!(root = %root_path.display(), files = files.len(), "discovered source files");
        Ok(files)
    }

    fn describe(&self) -> String {
        self.root.display().to_string()
    }
}

/// `.d.ts` style files only carry type declarations, never runtime imports
fn is_declaration_file(name: &str) -> bool {
    [".d.ts", ".d.mts", ".d.cts"]
        .iter()
        .any(|suffix| name.ends_with(suffix))
}

/// Root-relative, forward-slash path used as the graph key
pub fn module_id(path: &Path, root: &Path) -> String {
    let relative = path.strip_prefix(root).unwrap_or(path);
    relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_discovers_sources_and_skips_declarations() -> Result<()> {
        let temp = TempDir::new()?;
        let root = temp.path();
        fs::create_dir_all(root.join("src/core"))?;
        fs::create_dir_all(root.join("node_modules/pkg"))?;
        fs::write(root.join("src/core/parser.ts"), "import './lexer';")?;
        fs::write(root.join("src/core/lexer.ts"), "")?;
        fs::write(root.join("src/types.d.ts"), "declare const x: number;")?;
        fs::write(root.join("src/style.css"), "body {}")?;
        fs::write(root.join("node_modules/pkg/index.js"), "")?;
        fs::write(root.join("src/generated.ts"), "")?;
        fs::write(root.join(".knotignore"), "generated.ts\n")?;

        let config = KnotConfig {
            path: root.to_path_buf(),
            ..KnotConfig::default()
        };
        let source = FsSource::from_config(&config);
        let files = source.discover()?;

        let ids: Vec<&str> = files.iter().map(|f| f.id.as_str()).collect();
        assert_eq!(ids, vec!["src/core/lexer.ts", "src/core/parser.ts"]);
        assert_eq!(files[1].content.as_deref(), Ok("import './lexer';"));
        Ok(())
    }

    #[test]
    fn test_knotignore_can_reinclude_a_file() -> Result<()> {
        let temp = TempDir::new()?;
        let root = temp.path();
        fs::create_dir_all(root.join("legacy"))?;
        fs::write(root.join("legacy/old.ts"), "")?;
        fs::write(root.join("legacy/keep.ts"), "")?;
        fs::write(root.join(".knotignore"), "legacy/*\n!legacy/keep.ts\n")?;

        let config = KnotConfig {
            path: root.to_path_buf(),
            ..KnotConfig::default()
        };
        let files = FsSource::from_config(&config).discover()?;

        let ids: Vec<&str> = files.iter().map(|f| f.id.as_str()).collect();
        assert_eq!(ids, vec!["legacy/keep.ts"]);
        Ok(())
    }

    #[test]
    fn test_missing_root_is_an_error() {
        let config = KnotConfig {
            path: PathBuf::from("definitely/not/here"),
            ..KnotConfig::default()
        };
        assert!(FsSource::from_config(&config).discover().is_err());
    }

    #[test]
    fn test_module_id_uses_forward_slashes() {
        let root = Path::new("/repo");
        let path = Path::new("/repo/src/core/parser.ts");
        assert_eq!(module_id(path, root), "src/core/parser.ts");
    }
}
