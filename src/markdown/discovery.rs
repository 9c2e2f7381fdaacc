//! Finds the markdown documents that need localized copies.

use std::path::{Path, PathBuf};

use globset::{GlobBuilder, GlobSet, GlobSetBuilder};
use ignore::WalkBuilder;
use tracing::debug;

use crate::error::DocumentError;
use crate::locales::ISO_639_1_CODES;

/// Default include patterns, relative to the discovery root.
pub const DEFAULT_INCLUDE: &[&str] = &["**/*.md"];

/// Which files to pick up below `root`.
///
/// Patterns are matched against paths relative to the root, and `*` never
/// crosses a `/`, so `*.md` only matches files directly in the root.
#[derive(Debug, Clone)]
pub struct DiscoveryOptions {
    pub root: PathBuf,
    pub include: Vec<String>,
    pub exclude: Vec<String>,
}

impl DiscoveryOptions {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            include: DEFAULT_INCLUDE.iter().map(|p| p.to_string()).collect(),
            exclude: default_exclude(),
        }
    }

    pub fn with_include<I, S>(mut self, patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.include = patterns.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_exclude<I, S>(mut self, patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.exclude = patterns.into_iter().map(Into::into).collect();
        self
    }

    /// Walk the root, honoring ignore files, and return matching files in
    /// path order.
    pub fn discover(&self) -> Result<Vec<PathBuf>, DocumentError> {
        let include_set = build_glob_set(&self.include)?;
        let exclude_set = build_glob_set(&self.exclude)?;

        let mut found = Vec::new();
        for result in WalkBuilder::new(&self.root)
            .hidden(false)
            .git_ignore(true)
            .git_global(true)
            .git_exclude(true)
            .require_git(false)
            .follow_links(false)
            .build()
        {
            let entry = match result {
                Ok(entry) => entry,
                Err(err) => {
                    debug!(?err, "Failed to read directory entry");
                    continue;
                }
            };

            if !entry.file_type().is_some_and(|ft| ft.is_file()) {
                continue;
            }

            let path = entry.path();
            let Ok(relative_path) = path.strip_prefix(&self.root) else {
                continue;
            };
            if is_selected(&include_set, &exclude_set, relative_path) {
                found.push(path.to_path_buf());
            }
        }

        found.sort();
        debug!("Discovered {} markdown file(s) under {}", found.len(), self.root.display());
        Ok(found)
    }
}

/// Root-level documents, already localized copies and tooling directories.
pub fn default_exclude() -> Vec<String> {
    let mut patterns = vec!["*.md".to_string()];
    for code in ISO_639_1_CODES {
        patterns.push(format!("**/*-{}.md", code));
        patterns.push(format!("**/*-{}.md", code.to_uppercase()));
    }
    patterns.extend(
        ["test/**", "coverage/**", "**/node_modules/**"]
            .iter()
            .map(|p| p.to_string()),
    );
    patterns
}

fn is_selected(include: &GlobSet, exclude: &GlobSet, relative_path: &Path) -> bool {
    include.is_match(relative_path) && !exclude.is_match(relative_path)
}

fn build_glob_set(patterns: &[String]) -> Result<GlobSet, DocumentError> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let glob = GlobBuilder::new(pattern)
            .literal_separator(true)
            .build()
            .map_err(|source| DocumentError::Pattern {
                pattern: pattern.clone(),
                source,
            })?;
        builder.add(glob);
    }
    Ok(builder.build()?)
}
