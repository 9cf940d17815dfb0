// src/fs/mock.rs

use super::FileSystem;
use anyhow::{anyhow, Result};
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

#[derive(Debug, Clone)]
pub enum MockEntry {
    File { content: Vec<u8>, modified: SystemTime },
    Dir(Vec<String>), // Child names, in insertion order
    /// A directory link; reported as both a directory and a symlink.
    Symlink(PathBuf),
}

#[derive(Debug, Default)]
struct MockState {
    entries: HashMap<PathBuf, MockEntry>,
    denied: HashSet<PathBuf>,
    /// Seconds since the epoch handed to the next write.
    clock: u64,
}

/// In-memory filesystem with a deterministic clock.
///
/// - Every write advances the clock by one second, so a file written after
///   another is always strictly newer.
/// - `read_dir` lists children in insertion order, not sorted.
#[derive(Debug, Clone, Default)]
pub struct MockFileSystem {
    state: Arc<Mutex<MockState>>,
}

fn parent_of(path: &Path) -> Option<&Path> {
    match path.parent() {
        Some(p) if p.as_os_str().is_empty() => Some(Path::new(".")),
        other => other,
    }
}

impl MockFileSystem {
    pub fn new() -> Self {
        let mut entries = HashMap::new();
        entries.insert(PathBuf::from("."), MockEntry::Dir(Vec::new()));

        Self {
            state: Arc::new(Mutex::new(MockState {
                entries,
                denied: HashSet::new(),
                clock: 1_000_000,
            })),
        }
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Add (or overwrite) a file, stamped with the next clock tick.
    pub fn add_file(&self, path: impl AsRef<Path>, content: impl Into<Vec<u8>>) {
        let mut state = self.lock();
        state.clock += 1;
        let modified = UNIX_EPOCH + Duration::from_secs(state.clock);
        Self::insert_entry(
            &mut state,
            path.as_ref(),
            MockEntry::File {
                content: content.into(),
                modified,
            },
        );
    }

    /// Add a file with an explicit modification time.
    pub fn add_file_at(
        &self,
        path: impl AsRef<Path>,
        content: impl Into<Vec<u8>>,
        modified: SystemTime,
    ) {
        let mut state = self.lock();
        Self::insert_entry(
            &mut state,
            path.as_ref(),
            MockEntry::File {
                content: content.into(),
                modified,
            },
        );
    }

    pub fn add_dir(&self, path: impl AsRef<Path>) {
        let mut state = self.lock();
        Self::ensure_dir_entry(&mut state, path.as_ref());
    }

    /// Add a symlink at `path` pointing to the directory `target`.
    pub fn add_dir_symlink(&self, path: impl AsRef<Path>, target: impl Into<PathBuf>) {
        let mut state = self.lock();
        Self::insert_entry(&mut state, path.as_ref(), MockEntry::Symlink(target.into()));
    }

    /// Make every read of `path` fail, as if permissions were missing.
    pub fn deny(&self, path: impl AsRef<Path>) {
        self.lock().denied.insert(path.as_ref().to_path_buf());
    }

    /// Current contents of a file, if it exists.
    pub fn contents(&self, path: impl AsRef<Path>) -> Option<Vec<u8>> {
        match self.lock().entries.get(path.as_ref()) {
            Some(MockEntry::File { content, .. }) => Some(content.clone()),
            _ => None,
        }
    }

    fn insert_entry(state: &mut MockState, path: &Path, entry: MockEntry) {
        state.entries.insert(path.to_path_buf(), entry);
        if let Some(parent) = parent_of(path) {
            Self::ensure_dir_entry(state, parent);
            Self::link_child(state, parent, path);
        }
    }

    fn link_child(state: &mut MockState, parent: &Path, child: &Path) {
        if let Some(MockEntry::Dir(children)) = state.entries.get_mut(parent) {
            if let Some(name) = child.file_name().and_then(|n| n.to_str()) {
                if !children.iter().any(|c| c == name) {
                    children.push(name.to_string());
                }
            }
        }
    }

    fn ensure_dir_entry(state: &mut MockState, path: &Path) {
        if state.entries.contains_key(path) {
            return;
        }
        state
            .entries
            .insert(path.to_path_buf(), MockEntry::Dir(Vec::new()));
        if let Some(parent) = parent_of(path) {
            if parent != path {
                Self::ensure_dir_entry(state, parent);
                Self::link_child(state, parent, path);
            }
        }
    }

    fn check_access(state: &MockState, path: &Path) -> Result<()> {
        if state.denied.iter().any(|d| path.starts_with(d)) {
            return Err(anyhow!("Permission denied: {:?}", path));
        }
        Ok(())
    }
}

impl FileSystem for MockFileSystem {
    fn read(&self, path: &Path) -> Result<Vec<u8>> {
        let state = self.lock();
        Self::check_access(&state, path)?;
        match state.entries.get(path) {
            Some(MockEntry::File { content, .. }) => Ok(content.clone()),
            Some(_) => Err(anyhow!("Is a directory: {:?}", path)),
            None => Err(anyhow!("File not found: {:?}", path)),
        }
    }

    fn read_to_string(&self, path: &Path) -> Result<String> {
        let bytes = self.read(path)?;
        String::from_utf8(bytes).map_err(|e| anyhow!("Invalid UTF-8: {}", e))
    }

    fn write(&self, path: &Path, contents: &[u8]) -> Result<()> {
        {
            let state = self.lock();
            Self::check_access(&state, path)?;
        }
        self.add_file(path, contents);
        Ok(())
    }

    fn exists(&self, path: &Path) -> bool {
        self.lock().entries.contains_key(path)
    }

    fn is_file(&self, path: &Path) -> bool {
        matches!(self.lock().entries.get(path), Some(MockEntry::File { .. }))
    }

    fn is_dir(&self, path: &Path) -> bool {
        matches!(
            self.lock().entries.get(path),
            Some(MockEntry::Dir(_)) | Some(MockEntry::Symlink(_))
        )
    }

    fn is_symlink(&self, path: &Path) -> bool {
        matches!(self.lock().entries.get(path), Some(MockEntry::Symlink(_)))
    }

    fn modified(&self, path: &Path) -> Result<SystemTime> {
        let state = self.lock();
        Self::check_access(&state, path)?;
        match state.entries.get(path) {
            Some(MockEntry::File { modified, .. }) => Ok(*modified),
            Some(_) => Ok(UNIX_EPOCH),
            None => Err(anyhow!("File not found: {:?}", path)),
        }
    }

    fn read_dir(&self, path: &Path) -> Result<Vec<PathBuf>> {
        let state = self.lock();
        Self::check_access(&state, path)?;
        let resolved = match state.entries.get(path) {
            Some(MockEntry::Symlink(target)) => target.clone(),
            _ => path.to_path_buf(),
        };
        match state.entries.get(&resolved) {
            Some(MockEntry::Dir(children)) => {
                Ok(children.iter().map(|name| path.join(name)).collect())
            }
            _ => Err(anyhow!("Not a directory or not found: {:?}", path)),
        }
    }
}
