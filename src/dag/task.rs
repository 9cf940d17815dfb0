// src/dag/task.rs

//! Built-in task definitions.

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;

use crate::config::ConfigFile;
use crate::transform::{
    ImageOptimizer, ScriptBundler, ScriptMinifier, StyleCompiler, TemplateRenderer, Transformer,
};
use crate::types::ReloadKind;

pub type TaskName = String;

pub const STYLES: &str = "styles";
pub const BUNDLE: &str = "bundle";
pub const MINIFY: &str = "minify";
pub const IMAGES: &str = "images";
pub const TEMPLATES: &str = "templates";

pub const KNOWN_TASKS: [&str; 5] = [STYLES, BUNDLE, MINIFY, IMAGES, TEMPLATES];

pub fn is_known_task(name: &str) -> bool {
    KNOWN_TASKS.contains(&name)
}

/// One named unit of work: a glob, a transformer, and where outputs go.
#[derive(Clone)]
pub struct TaskSpec {
    pub name: TaskName,
    /// Source glob, relative to the project root.
    pub src: String,
    /// Destination directory, relative to the project root.
    pub dest: PathBuf,
    pub transformer: Arc<dyn Transformer>,
    /// Only hand stale sources to the transformer.
    pub incremental: bool,
    pub reload: ReloadKind,
    /// Tasks that run after this one succeeds.
    pub then: Vec<TaskName>,
}

impl fmt::Debug for TaskSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskSpec")
            .field("name", &self.name)
            .field("src", &self.src)
            .field("dest", &self.dest)
            .field("transformer", &self.transformer.label())
            .field("incremental", &self.incremental)
            .field("reload", &self.reload)
            .field("then", &self.then)
            .finish()
    }
}

impl TaskSpec {
    pub fn new(
        name: impl Into<TaskName>,
        src: impl Into<String>,
        dest: impl Into<PathBuf>,
        transformer: Arc<dyn Transformer>,
    ) -> Self {
        Self {
            name: name.into(),
            src: src.into(),
            dest: dest.into(),
            transformer,
            incremental: false,
            reload: ReloadKind::None,
            then: Vec::new(),
        }
    }

    pub fn incremental(mut self, yes: bool) -> Self {
        self.incremental = yes;
        self
    }

    pub fn reload(mut self, kind: ReloadKind) -> Self {
        self.reload = kind;
        self
    }

    pub fn then(mut self, next: impl Into<TaskName>) -> Self {
        self.then.push(next.into());
        self
    }
}

/// The five pipeline tasks, configured from `cfg`.
pub fn builtin_tasks(cfg: &ConfigFile) -> Result<Vec<TaskSpec>> {
    let scripts = &cfg.scripts;
    let bundle_src = format!("{}/{}", scripts.dest.trim_end_matches('/'), scripts.bundle);

    Ok(vec![
        TaskSpec::new(
            STYLES,
            &cfg.styles.src,
            &cfg.styles.dest,
            Arc::new(StyleCompiler::from_config(&cfg.styles)),
        )
        .reload(ReloadKind::Style),
        TaskSpec::new(
            BUNDLE,
            &scripts.src,
            &scripts.dest,
            Arc::new(ScriptBundler::from_config(scripts)),
        )
        .reload(ReloadKind::Full)
        .then(MINIFY),
        TaskSpec::new(
            MINIFY,
            bundle_src,
            &scripts.dest,
            Arc::new(ScriptMinifier::from_config(scripts)?),
        )
        .reload(ReloadKind::Full),
        TaskSpec::new(
            IMAGES,
            &cfg.images.src,
            &cfg.images.dest,
            Arc::new(ImageOptimizer::from_config(&cfg.images)),
        )
        .incremental(true),
        TaskSpec::new(
            TEMPLATES,
            &cfg.templates.src,
            &cfg.templates.dest,
            Arc::new(TemplateRenderer::from_config(&cfg.templates)),
        )
        .reload(ReloadKind::Full),
    ])
}
