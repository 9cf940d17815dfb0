// src/watch/event_handler.rs

//! Turning one changed path into binding triggers.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::engine::{BindingId, RuntimeEvent, TriggerReason};
use crate::fs::FileSystem;
use crate::watch::hash::{compute_hash_for_paths, MemoryHashStore};
use crate::watch::path_utils::relative_str;
use crate::watch::patterns::{collect_matching_files, BindingProfile};

/// Shared state of the watcher's event loop.
#[derive(Debug, Clone)]
pub struct WatchContext {
    pub fs: Arc<dyn FileSystem>,
    pub root: PathBuf,
    pub profiles: Arc<Vec<BindingProfile>>,
    pub hashes: Arc<Mutex<MemoryHashStore>>,
}

/// Bindings interested in `path`, after the `use_hash` filter.
pub fn bindings_for_change(ctx: &WatchContext, path: &Path) -> Vec<BindingId> {
    let Some(rel) = relative_str(&ctx.root, path) else {
        debug!(?path, root = ?ctx.root, "event outside project root");
        return Vec::new();
    };

    ctx.profiles
        .iter()
        .filter(|p| p.matches(&rel))
        .filter(|p| !p.use_hash() || content_changed(ctx, p, &rel))
        .map(BindingProfile::id)
        .collect()
}

/// Process a single changed path and trigger every interested binding.
///
/// Returns `false` once the runtime is gone and watching can stop.
pub async fn process_file_change(
    ctx: &WatchContext,
    path: &Path,
    runtime_tx: &mpsc::Sender<RuntimeEvent>,
) -> bool {
    let ctx_owned = ctx.clone();
    let path_owned = path.to_path_buf();
    let bindings = tokio::task::spawn_blocking(move || bindings_for_change(&ctx_owned, &path_owned))
        .await
        .unwrap_or_default();

    for binding in bindings {
        debug!(binding, ?path, "watch match -> triggering binding");
        let event = RuntimeEvent::BindingTriggered {
            binding,
            reason: TriggerReason::FileWatch,
        };
        if let Err(err) = runtime_tx.send(event).await {
            warn!("failed to send RuntimeEvent::BindingTriggered: {err}");
            return false;
        }
    }
    true
}

/// Whether the aggregate hash of the binding's files moved.
///
/// Any hashing failure counts as a change: rebuilding is always safe.
fn content_changed(ctx: &WatchContext, profile: &BindingProfile, rel: &str) -> bool {
    let hash = match collect_matching_files(ctx.fs.as_ref(), &ctx.root, profile)
        .and_then(|files| compute_hash_for_paths(ctx.fs.as_ref(), &files))
    {
        Ok(hash) => hash,
        Err(err) => {
            warn!(binding = profile.id(), error = %err, "hashing failed; triggering anyway");
            return true;
        }
    };

    let mut store = ctx
        .hashes
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    let changed = store.check_and_update(profile.id(), &hash);
    if !changed {
        info!(binding = profile.id(), path = %rel, "watched content unchanged; skipping trigger");
    }
    changed
}

/// Record the current hash of every `use_hash` binding, so the first event
/// after startup is compared against what is on disk now.
pub fn seed_hashes(ctx: &WatchContext) {
    let mut store = ctx
        .hashes
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner());

    for profile in ctx.profiles.iter().filter(|p| p.use_hash()) {
        let hash = collect_matching_files(ctx.fs.as_ref(), &ctx.root, profile)
            .and_then(|files| compute_hash_for_paths(ctx.fs.as_ref(), &files));
        match hash {
            Ok(hash) => store.seed(profile.id(), hash),
            Err(err) => debug!(binding = profile.id(), error = %err, "no startup hash"),
        }
    }
}
