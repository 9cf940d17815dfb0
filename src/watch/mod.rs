// src/watch/mod.rs

//! File watching and change detection.
//!
//! Compiles each binding's `watch` / `exclude` globs, runs a `notify`
//! watcher over the project root, and turns changes into binding triggers,
//! optionally filtered by content hash. It knows nothing about tasks beyond
//! the names a binding lists.

pub mod event_handler;
pub mod hash;
pub mod path_utils;
pub mod patterns;
pub mod watcher;

pub use event_handler::{process_file_change, WatchContext};
pub use hash::{compute_hash_for_paths, MemoryHashStore};
pub use patterns::{build_binding_profiles, BindingProfile};
pub use watcher::{spawn_watcher, WatcherHandle};
