// src/watch/path_utils.rs

//! Path helpers shared by the watcher and source expansion.

use std::path::Path;

/// Render a path with forward slashes, the form glob patterns are written in.
pub fn to_slash(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}

/// Convert a path into a string relative to `root`, with forward slashes.
///
/// Tries a plain `strip_prefix` first, then again on canonicalized paths
/// (macOS reports `/private/var/...` for temp dirs under `/var`).
///
/// Returns `None` if the path is not under `root`.
pub fn relative_str(root: &Path, path: &Path) -> Option<String> {
    if let Ok(rel) = path.strip_prefix(root) {
        return Some(to_slash(rel));
    }

    if let (Ok(root_canon), Ok(path_canon)) = (root.canonicalize(), path.canonicalize()) {
        if let Ok(rel) = path_canon.strip_prefix(&root_canon) {
            return Some(to_slash(rel));
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relative_paths_use_forward_slashes() {
        let root = Path::new("/proj");
        assert_eq!(
            relative_str(root, Path::new("/proj/src/sass/main.scss")).as_deref(),
            Some("src/sass/main.scss")
        );
        assert_eq!(relative_str(root, Path::new("/elsewhere/x")), None);
    }
}
