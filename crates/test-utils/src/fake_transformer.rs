use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use assetwatch::source::SourceSet;
use assetwatch::transform::{TaskReport, TransformContext, TransformError, Transformer};

/// Transformer double.
///
/// Counts its invocations and, unless told to fail, writes
/// `<dest>/<marker>` listing the relative paths it received, one per line.
#[derive(Debug, Clone)]
pub struct FakeTransformer {
    marker: String,
    fail: bool,
    calls: Arc<AtomicUsize>,
}

impl FakeTransformer {
    pub fn new(marker: &str) -> Self {
        Self {
            marker: marker.to_string(),
            fail: false,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn failing(marker: &str) -> Self {
        Self {
            fail: true,
            ..Self::new(marker)
        }
    }

    /// Shared counter; stays valid after the transformer moves into a task.
    pub fn calls(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.calls)
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Transformer for FakeTransformer {
    fn label(&self) -> &'static str {
        "fake"
    }

    fn transform(
        &self,
        ctx: &TransformContext,
        sources: &SourceSet,
    ) -> Result<TaskReport, TransformError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        let out = ctx.dest.join(&self.marker);
        if self.fail {
            return Err(TransformError::syntax(out, "scripted failure"));
        }

        let listing: Vec<String> = sources
            .iter()
            .map(|s| s.relative.to_string_lossy().replace('\\', "/"))
            .collect();
        ctx.write(&out, listing.join("\n").as_bytes())?;

        Ok(TaskReport {
            written: 1,
            ..TaskReport::default()
        })
    }
}
