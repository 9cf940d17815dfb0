// src/transform/mod.rs

//! Asset transformers.
//!
//! Each transformer wraps an existing library and maps a [`SourceSet`] to
//! files under a destination directory:
//!
//! - [`styles`]: Sass/SCSS via `grass`, prefixing + compression via `lightningcss`.
//! - [`scripts`]: lexical-order concatenation, then minification via `oxc`.
//! - [`images`]: re-encoding via `image`, light SVG cleanup, pass-through otherwise.
//! - [`templates`]: page rendering via `minijinja`.
//!
//! Transformers are synchronous; the task runner calls them on the blocking
//! pool and only awaits their completion.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use thiserror::Error;

use crate::fs::FileSystem;
use crate::source::SourceSet;

pub mod images;
pub mod scripts;
pub mod styles;
pub mod templates;

pub use images::ImageOptimizer;
pub use scripts::{ScriptBundler, ScriptMinifier};
pub use styles::StyleCompiler;
pub use templates::TemplateRenderer;

/// Failure of a transformer invocation.
///
/// Unsupported formats are deliberately absent: they are passed through.
#[derive(Debug, Error)]
pub enum TransformError {
    #[error("{}: {message}", path.display())]
    SourceSyntax { path: PathBuf, message: String },

    #[error("{}: {message}", path.display())]
    Io { path: PathBuf, message: String },

    #[error("{}: could not encode output: {message}", path.display())]
    Encode { path: PathBuf, message: String },
}

impl TransformError {
    pub fn io(path: impl Into<PathBuf>, err: anyhow::Error) -> Self {
        TransformError::Io {
            path: path.into(),
            message: format!("{err:#}"),
        }
    }

    pub fn syntax(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        TransformError::SourceSyntax {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// What a transformer did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskReport {
    /// Output files written (source maps included).
    pub written: usize,
    /// Inputs copied unchanged (unknown formats, no gain from re-encoding).
    pub passed_through: usize,
    /// Inputs not processed (partials, ignored names, fresh outputs).
    pub skipped: usize,
    /// Inputs that failed but did not fail the task.
    pub errors: usize,
}

/// Everything a transformer may touch during one invocation.
#[derive(Debug, Clone)]
pub struct TransformContext {
    pub task: String,
    pub fs: Arc<dyn FileSystem>,
    /// Project root; source globs are relative to it.
    pub root: PathBuf,
    /// Absolute destination directory of the task.
    pub dest: PathBuf,
}

impl TransformContext {
    /// Write one output, mapping failures to [`TransformError::Io`].
    pub fn write(&self, path: &Path, contents: &[u8]) -> Result<(), TransformError> {
        self.fs
            .write(path, contents)
            .map_err(|e| TransformError::io(path, e))
    }

    pub fn read(&self, path: &Path) -> Result<Vec<u8>, TransformError> {
        self.fs.read(path).map_err(|e| TransformError::io(path, e))
    }

    pub fn read_to_string(&self, path: &Path) -> Result<String, TransformError> {
        self.fs
            .read_to_string(path)
            .map_err(|e| TransformError::io(path, e))
    }
}

/// A source-set-to-output transformation.
pub trait Transformer: Send + Sync + fmt::Debug {
    /// Short label used in logs and dry-run output.
    fn label(&self) -> &'static str;

    fn transform(
        &self,
        ctx: &TransformContext,
        sources: &SourceSet,
    ) -> Result<TaskReport, TransformError>;
}
