use anyhow::Result;
use ignore::WalkBuilder;
use std::path::{Path, PathBuf};
use tracing::warn;

/// Project-local ignore file, gitignore syntax, may appear in any directory
pub const KNOTIGNORE: &str = ".knotignore";

/// Options for a directory walk
#[derive(Debug, Clone, Copy, Default)]
pub struct WalkConfig<'a> {
    /// Globs to skip
    pub ignore_patterns: &'a [String],
    /// If non-empty, only files matching one of these globs are returned
    pub include_patterns: &'a [String],
    pub max_depth: Option<usize>,
}

/// Walks `path` honouring .gitignore, `.knotignore` files and the configured
/// globs. Result is sorted.
pub fn walk_directory(path: &Path, config: WalkConfig<'_>) -> Result<Vec<PathBuf>> {
    let mut builder = WalkBuilder::new(path);
    builder.add_custom_ignore_filename(KNOTIGNORE);

    // In override builder:
    // - "pattern" means WHITELIST "pattern"
    // - "!pattern" means IGNORE "pattern"
    let mut override_builder = ignore::overrides::OverrideBuilder::new(path);
    for pattern in config.include_patterns {
        override_builder.add(pattern)?;
    }
    for pattern in config.ignore_patterns {
        override_builder.add(&format!("!{}", pattern))?;
    }
    builder.overrides(override_builder.build()?);

    builder.max_depth(config.max_depth);

    // Standard gitignore is on by default.
    builder.standard_filters(true);

    let mut files = Vec::new();
    for result in builder.build() {
        match result {
            Ok(entry) => {
                if entry.file_type().is_some_and(|ft| ft.is_file()) {
                    files.push(entry.into_path());
                }
            }
            Err(err) => warn!("error walking directory: {}", err),
        }
    }

    files.sort();
    Ok(files)
}
