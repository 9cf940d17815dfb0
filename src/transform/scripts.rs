// src/transform/scripts.rs

//! Script bundling and minification.

use std::path::{Path, PathBuf};

use anyhow::Result;
use globset::{Glob, GlobSet, GlobSetBuilder};
use oxc::allocator::Allocator;
use oxc::codegen::{Codegen, CodegenOptions, CommentOptions};
use oxc::mangler::MangleOptions;
use oxc::minifier::{CompressOptions, Minifier, MinifierOptions};
use oxc::parser::Parser;
use oxc::span::SourceType;
use tracing::{debug, error, warn};

use crate::config::ScriptsSection;
use crate::source::{is_literal, SourceSet};
use crate::transform::{TaskReport, TransformContext, TransformError, Transformer};

/// Concatenates every script of the set, in set order, into one bundle.
#[derive(Debug, Clone)]
pub struct ScriptBundler {
    pub bundle: String,
}

impl ScriptBundler {
    pub fn from_config(cfg: &ScriptsSection) -> Self {
        Self {
            bundle: cfg.bundle.clone(),
        }
    }

    pub fn bundle_path(&self, dest: &Path) -> PathBuf {
        dest.join(&self.bundle)
    }
}

impl Transformer for ScriptBundler {
    fn label(&self) -> &'static str {
        "script-bundler"
    }

    fn transform(
        &self,
        ctx: &TransformContext,
        sources: &SourceSet,
    ) -> Result<TaskReport, TransformError> {
        let mut report = TaskReport::default();
        if sources.is_empty() {
            warn!(task = %ctx.task, pattern = sources.pattern(), "no scripts matched; bundle not written");
            return Ok(report);
        }

        let mut parts = Vec::with_capacity(sources.len());
        for source in sources.iter() {
            parts.push(ctx.read_to_string(&source.path)?);
        }

        let bundle = parts.join("\n");
        let out = self.bundle_path(&ctx.dest);
        ctx.write(&out, bundle.as_bytes())?;
        debug!(path = ?out, inputs = parts.len(), bytes = bundle.len(), "wrote bundle");

        report.written = 1;
        Ok(report)
    }
}

/// Minifies scripts, writing `<stem><min_ext>` next to the mirrored source.
///
/// Files whose names match an ignore glob (already-minified vendor code) are
/// skipped. A file that fails to parse is logged and not written.
#[derive(Debug, Clone)]
pub struct ScriptMinifier {
    pub min_ext: String,
    ignore: GlobSet,
}

impl ScriptMinifier {
    pub fn new(min_ext: impl Into<String>, ignore: &[String]) -> Result<Self> {
        let mut builder = GlobSetBuilder::new();
        for pattern in ignore {
            builder.add(Glob::new(pattern)?);
        }
        Ok(Self {
            min_ext: min_ext.into(),
            ignore: builder.build()?,
        })
    }

    pub fn from_config(cfg: &ScriptsSection) -> Result<Self> {
        Self::new(cfg.min_ext.clone(), &cfg.ignore)
    }

    fn is_ignored(&self, path: &Path) -> bool {
        path.file_name().is_some_and(|name| self.ignore.is_match(name))
    }

    fn output_name(&self, path: &Path) -> String {
        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        format!("{stem}{}", self.min_ext)
    }
}

/// Minify one classic script.
///
/// Parsed as a script, not a module, so top-level names stay global.
pub fn minify_script(source: &str) -> Result<String, String> {
    let allocator = Allocator::default();
    let source_type = SourceType::mjs().with_script(true);

    let ret = Parser::new(&allocator, source, source_type).parse();
    if !ret.errors.is_empty() {
        let message = ret
            .errors
            .iter()
            .map(|e| e.to_string())
            .collect::<Vec<_>>()
            .join("; ");
        return Err(message);
    }

    let mut program = ret.program;
    let options = MinifierOptions {
        mangle: Some(MangleOptions::default()),
        compress: Some(CompressOptions::smallest()),
    };
    let minified = Minifier::new(options).minify(&allocator, &mut program);

    let code = Codegen::new()
        .with_options(CodegenOptions {
            minify: true,
            comments: CommentOptions::disabled(),
            ..CodegenOptions::default()
        })
        .with_scoping(minified.scoping)
        .build(&program)
        .code;

    Ok(code)
}

impl Transformer for ScriptMinifier {
    fn label(&self) -> &'static str {
        "script-minifier"
    }

    fn transform(
        &self,
        ctx: &TransformContext,
        sources: &SourceSet,
    ) -> Result<TaskReport, TransformError> {
        let mut report = TaskReport::default();
        if sources.is_empty() {
            if is_literal(sources.pattern()) {
                return Err(TransformError::Io {
                    path: ctx.root.join(sources.pattern()),
                    message: "file not found (was the bundle built?)".to_string(),
                });
            }
            debug!(task = %ctx.task, pattern = sources.pattern(), "nothing to minify");
            return Ok(report);
        }

        for source in sources.iter() {
            if self.is_ignored(&source.path) {
                debug!(path = ?source.path, "ignored by pattern");
                report.skipped += 1;
                continue;
            }

            let text = ctx.read_to_string(&source.path)?;
            let code = match minify_script(&text) {
                Ok(code) => code,
                Err(message) => {
                    error!(
                        task = %ctx.task,
                        path = %source.path.display(),
                        error = %message,
                        "script failed to parse; not minified"
                    );
                    report.errors += 1;
                    continue;
                }
            };

            let out = ctx
                .dest
                .join(source.relative.with_file_name(self.output_name(&source.path)));
            ctx.write(&out, code.as_bytes())?;
            report.written += 1;
        }

        Ok(report)
    }
}
