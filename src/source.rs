// src/source.rs

//! Source sets: the files a glob pattern matches, right now.
//!
//! A `SourceSet` is computed fresh on every task run and never cached. Files
//! are ordered lexically by their path relative to the glob's base directory,
//! independent of the order the filesystem lists them in.

use std::path::{Component, Path, PathBuf};

use anyhow::{Context, Result};
use globset::{GlobBuilder, GlobMatcher};
use tracing::debug;

use crate::fs::FileSystem;
use crate::watch::path_utils::to_slash;

/// Compile a glob where `*` stays within one path segment and `**` crosses
/// directories.
pub fn compile_glob(pattern: &str) -> std::result::Result<GlobMatcher, globset::Error> {
    let pattern = pattern.strip_prefix("./").unwrap_or(pattern);
    Ok(GlobBuilder::new(pattern)
        .literal_separator(true)
        .build()?
        .compile_matcher())
}

fn has_glob_meta(segment: &str) -> bool {
    segment.contains(['*', '?', '[', '{'])
}

/// A pattern without wildcards, naming exactly one file.
pub fn is_literal(pattern: &str) -> bool {
    !has_glob_meta(pattern)
}

/// Literal directory prefix of a glob.
///
/// `src/img/**/*` -> `src/img`, `src/sass/*.*` -> `src/sass`. A pattern with
/// no wildcard at all names a single file, so its base is the parent directory.
pub fn glob_base(pattern: &str) -> PathBuf {
    let segments: Vec<&str> = pattern.split('/').filter(|s| !s.is_empty()).collect();
    let literal: Vec<&str> = segments
        .iter()
        .take_while(|s| !has_glob_meta(s))
        .copied()
        .collect();

    let take = if literal.len() == segments.len() {
        literal.len().saturating_sub(1)
    } else {
        literal.len()
    };

    literal[..take]
        .iter()
        .filter(|s| **s != ".")
        .collect::<PathBuf>()
}

/// One matched file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    /// Path as seen by the filesystem (`root` joined with the match).
    pub path: PathBuf,
    /// Path relative to the glob base; outputs mirror this layout.
    pub relative: PathBuf,
}

/// Ordered, immutable result of expanding a glob.
#[derive(Debug, Clone)]
pub struct SourceSet {
    pattern: String,
    base: PathBuf,
    files: Vec<SourceFile>,
}

impl SourceSet {
    /// Expand `pattern` (relative to `root`) against the filesystem.
    ///
    /// A missing base directory yields an empty set. Symlinked directories are
    /// not descended into, which rules out symlink loops.
    pub fn expand(fs: &dyn FileSystem, root: &Path, pattern: &str) -> Result<SourceSet> {
        let matcher =
            compile_glob(pattern).with_context(|| format!("invalid glob pattern: {pattern}"))?;
        let base = glob_base(pattern);
        let base_dir = root.join(&base);

        let mut files = Vec::new();
        if !fs.is_dir(&base_dir) {
            debug!(pattern, base = ?base_dir, "glob base does not exist; empty source set");
            return Ok(SourceSet {
                pattern: pattern.to_string(),
                base,
                files,
            });
        }

        let mut stack = vec![base_dir.clone()];
        while let Some(dir) = stack.pop() {
            for path in fs.read_dir(&dir)? {
                if fs.is_dir(&path) {
                    if fs.is_symlink(&path) {
                        debug!(?path, "not following symlinked directory");
                        continue;
                    }
                    stack.push(path);
                } else if fs.is_file(&path) {
                    let Ok(rel_root) = path.strip_prefix(root) else {
                        continue;
                    };
                    if !matcher.is_match(to_slash(rel_root)) {
                        continue;
                    }
                    let relative = path
                        .strip_prefix(&base_dir)
                        .map(Path::to_path_buf)
                        .unwrap_or_else(|_| rel_root.to_path_buf());
                    files.push(SourceFile { path, relative });
                }
            }
        }

        files.sort_by_cached_key(|f| to_slash(&f.relative));

        debug!(pattern, count = files.len(), "expanded source set");
        Ok(SourceSet {
            pattern: pattern.to_string(),
            base,
            files,
        })
    }

    /// A subset of this set, keeping order.
    pub fn filtered<F>(&self, mut keep: F) -> SourceSet
    where
        F: FnMut(&SourceFile) -> bool,
    {
        SourceSet {
            pattern: self.pattern.clone(),
            base: self.base.clone(),
            files: self.files.iter().filter(|f| keep(f)).cloned().collect(),
        }
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    pub fn base(&self) -> &Path {
        &self.base
    }

    pub fn files(&self) -> &[SourceFile] {
        &self.files
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &SourceFile> {
        self.files.iter()
    }
}

/// Reject relative paths that climb out of their directory.
pub fn is_contained(relative: &Path) -> bool {
    relative
        .components()
        .all(|c| matches!(c, Component::Normal(_) | Component::CurDir))
}
