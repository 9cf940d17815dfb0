// src/watch/hash.rs

//! Content hashing for `use_hash` bindings.

use std::collections::HashMap;
use std::path::Path;

use anyhow::{Context, Result};
use blake3::Hasher;
use tracing::debug;

use crate::engine::BindingId;
use crate::fs::FileSystem;

pub fn compute_file_hash(fs: &dyn FileSystem, path: &Path) -> Result<String> {
    let bytes = fs
        .read(path)
        .with_context(|| format!("reading file for hashing: {path:?}"))?;
    Ok(blake3::hash(&bytes).to_hex().to_string())
}

/// Hash over the contents and names of `paths`.
///
/// Paths are sorted first, so the result is independent of iteration order.
/// Names go into the hash too: renaming a file is a change.
pub fn compute_hash_for_paths<P: AsRef<Path>>(fs: &dyn FileSystem, paths: &[P]) -> Result<String> {
    let mut sorted: Vec<&Path> = paths.iter().map(AsRef::as_ref).collect();
    sorted.sort();

    let mut hasher = Hasher::new();
    for path in sorted {
        let file_hash = compute_file_hash(fs, path)?;
        hasher.update(path.to_string_lossy().as_bytes());
        hasher.update(b"\0");
        hasher.update(file_hash.as_bytes());
    }

    let hash = hasher.finalize().to_hex().to_string();
    debug!(hash = %hash, "computed aggregate hash");
    Ok(hash)
}

/// Last seen aggregate hash per binding, kept for the session only.
#[derive(Debug, Default)]
pub struct MemoryHashStore {
    map: HashMap<BindingId, String>,
}

impl MemoryHashStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `hash` for `binding`; returns `true` if it differs from the
    /// previous one (or there was none).
    pub fn check_and_update(&mut self, binding: BindingId, hash: &str) -> bool {
        match self.map.get(&binding) {
            Some(old) if old == hash => false,
            _ => {
                self.map.insert(binding, hash.to_string());
                true
            }
        }
    }

    /// Seed a hash without reporting a change (startup baseline).
    pub fn seed(&mut self, binding: BindingId, hash: String) {
        self.map.insert(binding, hash);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::mock::MockFileSystem;

    #[test]
    fn hash_ignores_input_order_but_not_content() {
        let fs = MockFileSystem::new();
        fs.add_file("/p/a.scss", "a{}");
        fs.add_file("/p/b.scss", "b{}");

        let h1 = compute_hash_for_paths(&fs, &["/p/a.scss", "/p/b.scss"]).unwrap();
        let h2 = compute_hash_for_paths(&fs, &["/p/b.scss", "/p/a.scss"]).unwrap();
        assert_eq!(h1, h2);

        fs.add_file("/p/b.scss", "b{color:red}");
        let h3 = compute_hash_for_paths(&fs, &["/p/a.scss", "/p/b.scss"]).unwrap();
        assert_ne!(h1, h3);
    }

    #[test]
    fn store_reports_changes_only() {
        let mut store = MemoryHashStore::new();
        assert!(store.check_and_update(0, "x"));
        assert!(!store.check_and_update(0, "x"));
        assert!(store.check_and_update(0, "y"));
        store.seed(1, "z".into());
        assert!(!store.check_and_update(1, "z"));
    }
}
