use std::sync::Mutex;

use assetwatch::reload::ReloadNotifier;
use assetwatch::types::ReloadKind;

/// Notifier that remembers every reload it was asked to send.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<ReloadKind>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sent(&self) -> Vec<ReloadKind> {
        self.sent.lock().unwrap().clone()
    }
}

impl ReloadNotifier for RecordingNotifier {
    fn notify(&self, kind: ReloadKind) {
        self.sent.lock().unwrap().push(kind);
    }
}
