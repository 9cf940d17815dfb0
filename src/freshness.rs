// src/freshness.rs

//! Mtime-based staleness detection.
//!
//! A source is stale when its output (`dest / relative`) is missing or has an
//! earlier modification time. Sources are judged one by one: no file's
//! freshness depends on another's. Only stat calls are made, nothing is
//! written.

use std::path::{Path, PathBuf};
use std::time::SystemTime;

use tracing::debug;

use crate::fs::FileSystem;
use crate::source::{SourceFile, SourceSet};

/// Expected output location for a source under `dest_dir`.
pub fn output_path(dest_dir: &Path, source: &SourceFile) -> PathBuf {
    dest_dir.join(&source.relative)
}

/// Check if output file is at least as new as the given source mtime.
///
/// Returns `false` when the output is missing or its mtime cannot be read.
pub fn is_output_fresh(fs: &dyn FileSystem, output: &Path, source_mtime: SystemTime) -> bool {
    fs.modified(output)
        .map(|output_time| output_time >= source_mtime)
        .unwrap_or(false)
}

/// Subset of `sources` that must be reprocessed into `dest_dir`.
///
/// If `dest_dir` cannot be listed (missing, unreadable) every source is
/// stale. Recomputing is always safe, so this never fails.
pub fn stale(fs: &dyn FileSystem, sources: &SourceSet, dest_dir: &Path) -> SourceSet {
    if let Err(err) = fs.read_dir(dest_dir) {
        debug!(
            dest = ?dest_dir,
            error = %err,
            "destination not readable; treating all sources as stale"
        );
        return sources.clone();
    }

    let stale_set = sources.filtered(|source| {
        let Ok(source_mtime) = fs.modified(&source.path) else {
            return true;
        };
        !is_output_fresh(fs, &output_path(dest_dir, source), source_mtime)
    });

    debug!(
        pattern = sources.pattern(),
        total = sources.len(),
        stale = stale_set.len(),
        "incremental filter"
    );
    stale_set
}
