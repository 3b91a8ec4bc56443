use lazy_static::lazy_static;
use regex::Regex;

use crate::config::KnotConfig;
use crate::core::ModuleId;

lazy_static! {
    // `import './x'`, `import x from "./x"`, `import { a,\n b } from './x'`, `import type T from './x'`
    // The binding clause may span lines but never crosses a quote or a statement end.
    static ref RELATIVE_IMPORT: Regex =
        Regex::new(r#"\bimport\b\s*(?:[^'";]*?\bfrom\s*)?['"](\./[^'"\r\n]*)['"]"#).unwrap();
}

/// Extension rules applied while resolving import targets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolveRules {
    pub source_extensions: Vec<String>,
    pub default_extension: String,
}

impl ResolveRules {
    pub fn from_config(config: &KnotConfig) -> Self {
        Self {
            source_extensions: config.source_extensions.clone(),
            default_extension: config.default_extension.clone(),
        }
    }

    fn is_source(&self, ext: &str) -> bool {
        self.source_extensions.iter().any(|e| e == ext)
    }
}

impl Default for ResolveRules {
    fn default() -> Self {
        Self::from_config(&KnotConfig::default())
    }
}

/// Extracts relative import targets (`./...`) from file content, in source order.
/// Bare and package specifiers are ignored.
pub fn extract_imports(content: &str) -> Vec<String> {
    RELATIVE_IMPORT
        .captures_iter(content)
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
        .collect()
}

/// Resolves a relative import target against the importing module.
///
/// Returns `None` when the target names a non-source asset (`./styles.css`,
/// `./data.json`); those are not code dependencies.
pub fn resolve_import(importer: &str, target: &str, rules: &ResolveRules) -> Option<ModuleId> {
    let target = target.replace('\\', "/");
    let candidate = match extension_of(&target) {
        Some(ext) if rules.is_source(ext) => target,
        Some(_) => return None,
        None => format!("{}.{}", target, rules.default_extension),
    };

    let importer = importer.replace('\\', "/");
    let joined = match importer.rfind('/') {
        Some(idx) => format!("{}/{}", &importer[..idx], candidate),
        None => candidate,
    };

    Some(normalize_path(&joined))
}

fn extension_of(target: &str) -> Option<&str> {
    let file_name = target.rsplit('/').next().unwrap_or(target);
    match file_name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() && !ext.is_empty() => Some(ext),
        _ => None,
    }
}

/// Collapses `.` and `..` segments. Segments that climb above the root are kept.
pub fn normalize_path(path: &str) -> String {
    let mut segments: Vec<&str> = Vec::new();
    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                if segments.last().is_some_and(|last| *last != "..") {
                    segments.pop();
                } else {
                    segments.push("..");
                }
            }
            other => segments.push(other),
        }
    }
    segments.join("/")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_side_effect_and_binding_imports() {
        let code = r#"
            import './polyfills';
            import React from 'react';
            import { parse } from "./parser";
            import * as fmt from './format/index.js';
            import type { Token } from './lexer';
            import {
                a,
                b,
            } from './multi';
            import data from './data.json';
            import lodash from 'lodash/fp';
            import up from '../outside';
        "#;
        let imports = extract_imports(code);
        assert_eq!(
            imports,
            vec![
                "./polyfills",
                "./parser",
                "./format/index.js",
                "./lexer",
                "./multi",
                "./data.json",
            ]
        );
    }

    #[test]
    fn test_extract_no_imports() {
        assert!(extract_imports("export const x = 1;\nconsole.log('./not-an-import');").is_empty());
    }

    #[test]
    fn test_resolve_appends_default_extension() {
        let rules = ResolveRules::default();
        assert_eq!(
            resolve_import("src/core/parser.ts", "./utils", &rules).as_deref(),
            Some("src/core/utils.ts")
        );
    }

    #[test]
    fn test_resolve_extensioned_target_is_idempotent() {
        let rules = ResolveRules::default();
        let once = resolve_import("src/core/parser.ts", "./utils.ts", &rules);
        assert_eq!(once.as_deref(), Some("src/core/utils.ts"));
        assert_eq!(once, resolve_import("src/core/parser.ts", "./utils", &rules));
    }

    #[test]
    fn test_resolve_skips_assets() {
        let rules = ResolveRules::default();
        assert_eq!(resolve_import("src/app.ts", "./styles.css", &rules), None);
        assert_eq!(resolve_import("src/app.ts", "./data.json", &rules), None);
    }

    #[test]
    fn test_resolve_normalizes_segments() {
        let rules = ResolveRules::default();
        assert_eq!(
            resolve_import("src/a/b.ts", "./../c/./d", &rules).as_deref(),
            Some("src/c/d.ts")
        );
        assert_eq!(
            resolve_import("index.ts", "./lib", &rules).as_deref(),
            Some("lib.ts")
        );
        assert_eq!(
            resolve_import("src\\win\\mod.ts", "./other", &rules).as_deref(),
            Some("src/win/other.ts")
        );
    }

    #[test]
    fn test_normalize_keeps_escaping_segments() {
        assert_eq!(normalize_path("a/../../b"), "../b");
        assert_eq!(normalize_path("./a//b/"), "a/b");
    }
}
