// src/transform/templates.rs

//! Page rendering with `minijinja`.
//!
//! Templates (and everything they `include` or `extend`) are loaded through
//! the pipeline's [`FileSystem`](crate::fs::FileSystem) from the views
//! directory. The whole set renders before anything is written: one broken
//! page fails the task and leaves the previous outputs in place.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use minijinja::{Environment, ErrorKind, Value};
use tracing::error;

use crate::config::TemplatesSection;
use crate::source::{is_contained, SourceSet};
use crate::transform::{TaskReport, TransformContext, TransformError, Transformer};
use crate::watch::path_utils::to_slash;

#[derive(Debug, Clone)]
pub struct TemplateRenderer {
    /// Template lookup directory, relative to the project root.
    pub views: PathBuf,
    pub context: toml::Table,
}

impl TemplateRenderer {
    pub fn from_config(cfg: &TemplatesSection) -> Self {
        Self {
            views: PathBuf::from(&cfg.views),
            context: cfg.context.clone(),
        }
    }

    fn environment(&self, ctx: &TransformContext) -> Environment<'static> {
        let mut env = Environment::new();
        env.set_trim_blocks(true);
        env.set_lstrip_blocks(true);

        let fs = Arc::clone(&ctx.fs);
        let views_dir = ctx.root.join(&self.views);
        env.set_loader(move |name: &str| {
            let rel = Path::new(name);
            if !is_contained(rel) {
                return Ok(None);
            }
            let path = views_dir.join(rel);
            if !fs.is_file(&path) {
                return Ok(None);
            }
            fs.read_to_string(&path).map(Some).map_err(|e| {
                minijinja::Error::new(ErrorKind::InvalidOperation, format!("{e:#}"))
            })
        });
        env
    }

    /// Lookup name of a page: its path under the views directory when it lives
    /// there, its set-relative path otherwise.
    fn template_name(&self, ctx: &TransformContext, path: &Path, relative: &Path) -> String {
        path.strip_prefix(ctx.root.join(&self.views))
            .map(to_slash)
            .unwrap_or_else(|_| to_slash(relative))
    }
}

impl Transformer for TemplateRenderer {
    fn label(&self) -> &'static str {
        "template-renderer"
    }

    fn transform(
        &self,
        ctx: &TransformContext,
        sources: &SourceSet,
    ) -> Result<TaskReport, TransformError> {
        let env = self.environment(ctx);
        let context = Value::from_serialize(&self.context);

        let mut rendered = Vec::with_capacity(sources.len());
        let mut first_error = None;

        for source in sources.iter() {
            let name = self.template_name(ctx, &source.path, &source.relative);
            let result = env
                .get_template(&name)
                .and_then(|tmpl| tmpl.render(&context));

            match result {
                Ok(html) => {
                    let out = ctx.dest.join(source.relative.with_extension("html"));
                    rendered.push((out, html));
                }
                Err(err) => {
                    let message = format!("{err:#}");
                    error!(
                        task = %ctx.task,
                        template = %name,
                        error = %message,
                        "template failed to render"
                    );
                    first_error.get_or_insert_with(|| TransformError::syntax(&source.path, message));
                }
            }
        }

        if let Some(err) = first_error {
            return Err(err);
        }

        let mut report = TaskReport::default();
        for (out, html) in rendered {
            ctx.write(&out, html.as_bytes())?;
            report.written += 1;
        }
        Ok(report)
    }
}
