// src/transform/styles.rs

//! Stylesheet compilation.
//!
//! Sass/SCSS is compiled by `grass`; the resulting CSS is re-parsed by
//! `lightningcss` for vendor prefixing and compression. A file that fails to
//! compile is logged and skipped; the rest of the set still compiles.
//! `@import` lookups go through the project [`FileSystem`].

use std::io;
use std::path::Path;

use lightningcss::stylesheet::{MinifyOptions, ParserOptions, PrinterOptions, StyleSheet};
use lightningcss::targets::{Browsers, Targets};
use tracing::{debug, error};

use crate::config::StylesSection;
use crate::fs::FileSystem;
use crate::source::SourceSet;
use crate::transform::{TaskReport, TransformContext, TransformError, Transformer};
use crate::watch::path_utils::to_slash;

#[derive(Debug, Clone)]
pub struct StyleCompiler {
    pub compress: bool,
    pub prefix: bool,
    pub source_maps: bool,
    pub suffix: String,
}

impl StyleCompiler {
    pub fn from_config(cfg: &StylesSection) -> Self {
        Self {
            compress: cfg.compress,
            prefix: cfg.prefix,
            source_maps: cfg.source_maps,
            suffix: cfg.suffix.clone(),
        }
    }

    /// Compile one stylesheet source to final CSS text. Imports resolve
    /// relative to `path` through `fs`.
    pub fn compile(&self, fs: &dyn FileSystem, source: &str, path: &Path) -> Result<String, String> {
        let syntax = match extension(path).as_deref() {
            Some("sass") => grass::InputSyntax::Sass,
            Some("css") => grass::InputSyntax::Css,
            _ => grass::InputSyntax::Scss,
        };

        let importer = SassFs(fs);
        let mut options = grass::Options::default()
            .fs(&importer)
            .style(grass::OutputStyle::Expanded)
            .input_syntax(syntax);
        if let Some(dir) = path.parent() {
            options = options.load_path(dir);
        }

        let css = grass::from_string(source.to_string(), &options).map_err(|e| e.to_string())?;

        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let mut sheet = StyleSheet::parse(
            &css,
            ParserOptions {
                filename,
                ..ParserOptions::default()
            },
        )
        .map_err(|e| e.to_string())?;

        let targets = if self.prefix {
            Targets {
                browsers: Some(legacy_browsers()),
                ..Targets::default()
            }
        } else {
            Targets::default()
        };

        if self.compress || self.prefix {
            sheet
                .minify(MinifyOptions {
                    targets: targets.clone(),
                    ..MinifyOptions::default()
                })
                .map_err(|e| e.to_string())?;
        }

        let printed = sheet
            .to_css(PrinterOptions {
                minify: self.compress,
                targets,
                ..PrinterOptions::default()
            })
            .map_err(|e| e.to_string())?;

        Ok(printed.code)
    }

    fn output_name(&self, path: &Path) -> String {
        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        format!("{stem}{}.css", self.suffix)
    }
}

/// Import resolution for `grass` backed by the pipeline's file system.
#[derive(Debug)]
struct SassFs<'a>(&'a dyn FileSystem);

impl grass::Fs for SassFs<'_> {
    fn is_dir(&self, path: &Path) -> bool {
        self.0.is_dir(path)
    }

    fn is_file(&self, path: &Path) -> bool {
        self.0.is_file(path)
    }

    fn read(&self, path: &Path) -> io::Result<Vec<u8>> {
        self.0.read(path).map_err(|e| io::Error::other(e.to_string()))
    }
}

/// Browser floor for prefixing; roughly what `> 0.5%, last 2 versions` meant
/// when prefixes still mattered.
fn legacy_browsers() -> Browsers {
    const fn version(major: u32) -> u32 {
        major << 16
    }

    Browsers {
        chrome: Some(version(49)),
        edge: Some(version(15)),
        firefox: Some(version(52)),
        ie: Some(version(11)),
        ios_saf: Some(version(9)),
        safari: Some(version(9)),
        samsung: Some(version(5)),
        android: Some(version(4) | (4 << 8)),
        ..Browsers::default()
    }
}

fn extension(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
}

fn is_partial(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| n.starts_with('_'))
}

/// Source Map v3 document carrying the original source.
///
/// The compiler chain does not report segment mappings, so the map is a
/// source pointer plus embedded content.
fn source_map_json(file: &str, source_rel: &str, content: &str) -> String {
    serde_json::json!({
        "version": 3,
        "file": file,
        "sourceRoot": "/",
        "sources": [source_rel],
        "sourcesContent": [content],
        "names": [],
        "mappings": ""
    })
    .to_string()
}

impl Transformer for StyleCompiler {
    fn label(&self) -> &'static str {
        "style-compiler"
    }

    fn transform(
        &self,
        ctx: &TransformContext,
        sources: &SourceSet,
    ) -> Result<TaskReport, TransformError> {
        let mut report = TaskReport::default();

        for source in sources.iter() {
            if is_partial(&source.path) {
                debug!(path = ?source.path, "skipping partial");
                report.skipped += 1;
                continue;
            }
            if !matches!(extension(&source.path).as_deref(), Some("scss" | "sass" | "css")) {
                debug!(path = ?source.path, "not a stylesheet; skipping");
                report.skipped += 1;
                continue;
            }

            let text = ctx.read_to_string(&source.path)?;
            let mut css = match self.compile(ctx.fs.as_ref(), &text, &source.path) {
                Ok(css) => css,
                Err(message) => {
                    error!(
                        task = %ctx.task,
                        path = %source.path.display(),
                        error = %message,
                        "stylesheet failed to compile; continuing with the rest"
                    );
                    report.errors += 1;
                    continue;
                }
            };

            let out_name = self.output_name(&source.path);
            let out_path = ctx.dest.join(source.relative.with_file_name(&out_name));

            if self.source_maps {
                let map_name = format!("{out_name}.map");
                if !css.ends_with('\n') {
                    css.push('\n');
                }
                css.push_str(&format!("/*# sourceMappingURL={map_name} */\n"));

                let source_rel = source
                    .path
                    .strip_prefix(&ctx.root)
                    .map(to_slash)
                    .unwrap_or_else(|_| to_slash(&source.path));
                let map = source_map_json(&out_name, &source_rel, &text);
                ctx.write(&out_path.with_file_name(&map_name), map.as_bytes())?;
                report.written += 1;
            }

            ctx.write(&out_path, css.as_bytes())?;
            report.written += 1;
        }

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::fs::mock::MockFileSystem;

    fn compiler() -> StyleCompiler {
        StyleCompiler {
            compress: true,
            prefix: false,
            source_maps: false,
            suffix: ".min".to_string(),
        }
    }

    #[test]
    fn partials_import_through_the_project_fs() {
        let fs = Arc::new(MockFileSystem::new());
        fs.add_file("/p/src/sass/_colors.scss", "$accent: #ff0000;");
        fs.add_file(
            "/p/src/sass/main.scss",
            "@import \"colors\";\n.btn { color: $accent; }\n",
        );

        let sources = SourceSet::expand(fs.as_ref(), Path::new("/p"), "src/sass/*").unwrap();
        let ctx = TransformContext {
            task: "styles".to_string(),
            fs: fs.clone(),
            root: "/p".into(),
            dest: "/p/dist/css".into(),
        };

        let report = compiler().transform(&ctx, &sources).unwrap();
        assert_eq!(report.errors, 0);
        assert_eq!(report.written, 1);
        assert_eq!(report.skipped, 1);

        let css = String::from_utf8(fs.contents("/p/dist/css/main.min.css").unwrap()).unwrap();
        assert!(css.starts_with(".btn{color:"), "{css}");
        assert!(!css.contains("$accent"));
    }

    #[test]
    fn missing_import_is_a_compile_error() {
        let fs = MockFileSystem::new();
        let err = compiler()
            .compile(&fs, "@import \"nowhere\";", Path::new("/p/src/sass/main.scss"))
            .unwrap_err();
        assert!(!err.is_empty());
    }
}
