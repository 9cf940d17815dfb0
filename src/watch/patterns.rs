// src/watch/patterns.rs

use std::fmt;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use globset::{GlobBuilder, GlobSet, GlobSetBuilder};

use crate::config::BindingConfig;
use crate::engine::{BindingId, TaskName};
use crate::fs::FileSystem;
use crate::watch::path_utils::to_slash;

/// Compiled watch/exclude globs for one binding.
///
/// Patterns are relative to the project root; the watcher passes relative
/// paths like `"src/sass/main.scss"` into [`matches`](Self::matches).
#[derive(Clone)]
pub struct BindingProfile {
    id: BindingId,
    tasks: Vec<TaskName>,
    watch_set: GlobSet,
    exclude_set: Option<GlobSet>,
    use_hash: bool,
}

impl fmt::Debug for BindingProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BindingProfile")
            .field("id", &self.id)
            .field("tasks", &self.tasks)
            .finish_non_exhaustive()
    }
}

impl BindingProfile {
    pub fn id(&self) -> BindingId {
        self.id
    }

    pub fn tasks(&self) -> &[TaskName] {
        &self.tasks
    }

    pub fn use_hash(&self) -> bool {
        self.use_hash
    }

    pub fn matches(&self, rel_path: &str) -> bool {
        if !self.watch_set.is_match(rel_path) {
            return false;
        }
        if let Some(exclude) = &self.exclude_set {
            if exclude.is_match(rel_path) {
                return false;
            }
        }
        true
    }
}

/// Compile one profile per binding; ids are positions in `bindings`.
pub fn build_binding_profiles(bindings: &[BindingConfig]) -> Result<Vec<BindingProfile>> {
    let mut profiles = Vec::with_capacity(bindings.len());

    for (id, binding) in bindings.iter().enumerate() {
        let watch_set = build_globset(&binding.watch)
            .with_context(|| format!("building watch globset for binding {id}"))?;

        let exclude_set = if binding.exclude.is_empty() {
            None
        } else {
            Some(
                build_globset(&binding.exclude)
                    .with_context(|| format!("building exclude globset for binding {id}"))?,
            )
        };

        profiles.push(BindingProfile {
            id,
            tasks: binding.run.clone(),
            watch_set,
            exclude_set,
            use_hash: binding.use_hash,
        });
    }

    Ok(profiles)
}

/// `*` stays within a segment, as for source globs.
fn build_globset(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pat in patterns {
        let trimmed = pat.strip_prefix("./").unwrap_or(pat);
        let glob = GlobBuilder::new(trimmed)
            .literal_separator(true)
            .build()
            .with_context(|| format!("invalid glob pattern: {pat}"))?;
        builder.add(glob);
    }
    Ok(builder.build()?)
}

/// Every file under `root` the profile is interested in, sorted.
///
/// Used to compute aggregate hashes for `use_hash` bindings. Output
/// directories are never watched by the default bindings, so walking
/// everything under `root` is fine; symlinked directories are skipped.
pub fn collect_matching_files(
    fs: &dyn FileSystem,
    root: &Path,
    profile: &BindingProfile,
) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    let mut stack = vec![root.to_path_buf()];

    while let Some(dir) = stack.pop() {
        for path in fs.read_dir(&dir)? {
            if fs.is_dir(&path) {
                if !fs.is_symlink(&path) {
                    stack.push(path);
                }
            } else if fs.is_file(&path) {
                if let Ok(rel) = path.strip_prefix(root) {
                    if profile.matches(&to_slash(rel)) {
                        files.push(path);
                    }
                }
            }
        }
    }

    files.sort();
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exclude_wins_over_watch() {
        let mut binding = BindingConfig::new("src/js/**/*.js", &["bundle"]);
        binding.exclude = vec!["src/js/vendor/**".to_string()];
        let profiles = build_binding_profiles(&[binding]).unwrap();
        let p = &profiles[0];

        assert!(p.matches("src/js/app.js"));
        assert!(p.matches("src/js/deep/nested.js"));
        assert!(!p.matches("src/js/vendor/lib.js"));
        assert!(!p.matches("src/sass/main.scss"));
    }

    #[test]
    fn single_star_does_not_cross_directories() {
        let profiles =
            build_binding_profiles(&[BindingConfig::new("./src/views/*.html", &["templates"])])
                .unwrap();
        assert!(profiles[0].matches("src/views/index.html"));
        assert!(!profiles[0].matches("src/views/partials/nav.html"));
    }
}
