// src/reload/mod.rs

//! Live-reload notification.
//!
//! After a watch-triggered run succeeds, the runner hands the strongest
//! [`ReloadKind`] of the run's tasks to a [`ReloadNotifier`]. In watch mode
//! that is the [`PreviewServer`], which broadcasts to connected browsers; in
//! one-shot builds it is the [`NoopNotifier`].

use std::fmt;

use crate::types::ReloadKind;

pub mod client;
pub mod server;

pub use server::PreviewServer;

/// Receiver of "outputs changed" signals.
///
/// Notification is best-effort: implementations never fail the run that
/// triggered them.
pub trait ReloadNotifier: Send + Sync + fmt::Debug {
    fn notify(&self, kind: ReloadKind);
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NoopNotifier;

impl ReloadNotifier for NoopNotifier {
    fn notify(&self, _kind: ReloadKind) {}
}

/// Wire message for a reload kind, or `None` when nothing should be sent.
pub fn reload_message(kind: ReloadKind) -> Option<String> {
    let ty = match kind {
        ReloadKind::None => return None,
        ReloadKind::Style => "style",
        ReloadKind::Full => "reload",
    };
    Some(serde_json::json!({ "type": ty }).to_string())
}
