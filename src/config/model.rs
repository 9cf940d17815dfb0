// src/config/model.rs

use serde::Deserialize;

use crate::dag::task::{BUNDLE, IMAGES, MINIFY, STYLES, TEMPLATES};
use crate::types::TriggerWhileRunningBehaviour;

/// Configuration as read from `Assetwatch.toml`, before validation.
///
/// ```toml
/// [styles]
/// src = "src/sass/*.*"
/// dest = "dist/css"
///
/// [scripts]
/// bundle = "application.js"
///
/// [watch]
/// while_running = "queue"
///
/// [[watch.bind]]
/// watch = ["src/js/**/*"]
/// run = ["bundle", "minify"]
/// ```
///
/// Unknown keys are rejected in every table so misspellings surface as TOML
/// errors. Every section is optional; an empty file reproduces the built-in layout
/// (`src/{sass,js,img,views}` -> `dist/{css,js,img,}`).
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawConfigFile {
    #[serde(default)]
    pub styles: StylesSection,

    #[serde(default)]
    pub scripts: ScriptsSection,

    #[serde(default)]
    pub images: ImagesSection,

    #[serde(default)]
    pub templates: TemplatesSection,

    #[serde(default)]
    pub serve: ServeSection,

    #[serde(default)]
    pub watch: WatchSection,
}

/// Validated configuration.
///
/// Only obtainable through `TryFrom<RawConfigFile>`, so holders can rely on
/// every binding naming known tasks and every glob compiling.
#[derive(Debug, Clone)]
pub struct ConfigFile {
    pub styles: StylesSection,
    pub scripts: ScriptsSection,
    pub images: ImagesSection,
    pub templates: TemplatesSection,
    pub serve: ServeSection,
    pub while_running: TriggerWhileRunningBehaviour,
    bindings: Vec<BindingConfig>,
}

impl ConfigFile {
    pub(crate) fn new_unchecked(raw: RawConfigFile) -> Self {
        let bindings = if raw.watch.bind.is_empty() {
            default_bindings()
        } else {
            raw.watch.bind
        };

        Self {
            styles: raw.styles,
            scripts: raw.scripts,
            images: raw.images,
            templates: raw.templates,
            serve: raw.serve,
            while_running: raw.watch.while_running,
            bindings,
        }
    }

    /// Effective watch bindings (configured ones, or the built-in defaults).
    pub fn bindings(&self) -> &[BindingConfig] {
        &self.bindings
    }
}

/// `[styles]`: stylesheet compilation.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StylesSection {
    pub src: String,
    pub dest: String,
    /// Emit compressed CSS.
    pub compress: bool,
    /// Add vendor prefixes for older browsers.
    pub prefix: bool,
    /// Write `<name>.css.map` next to each stylesheet.
    pub source_maps: bool,
    /// Inserted between the file stem and `.css`.
    pub suffix: String,
}

impl Default for StylesSection {
    fn default() -> Self {
        Self {
            src: "src/sass/*.*".to_string(),
            dest: "dist/css".to_string(),
            compress: true,
            prefix: true,
            source_maps: true,
            suffix: ".min".to_string(),
        }
    }
}

/// `[scripts]`: bundling and minification.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ScriptsSection {
    pub src: String,
    pub dest: String,
    /// File name of the concatenated bundle inside `dest`.
    pub bundle: String,
    /// Extension of the minified artifact, replacing `.js`.
    pub min_ext: String,
    /// Inputs the minifier leaves alone.
    pub ignore: Vec<String>,
}

impl Default for ScriptsSection {
    fn default() -> Self {
        Self {
            src: "src/js/**/*".to_string(),
            dest: "dist/js".to_string(),
            bundle: "application.js".to_string(),
            min_ext: ".min.js".to_string(),
            ignore: vec!["*min.js".to_string()],
        }
    }
}

/// `[images]`: image optimization.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ImagesSection {
    pub src: String,
    pub dest: String,
    pub jpeg_quality: u8,
}

impl Default for ImagesSection {
    fn default() -> Self {
        Self {
            src: "src/img/**/*".to_string(),
            dest: "dist/img".to_string(),
            jpeg_quality: 75,
        }
    }
}

/// `[templates]`: page rendering.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TemplatesSection {
    /// Pages to render (one output per match).
    pub src: String,
    pub dest: String,
    /// Directory includes and layouts are resolved against.
    pub views: String,
    /// Values exposed to every template.
    pub context: toml::Table,
}

impl Default for TemplatesSection {
    fn default() -> Self {
        Self {
            src: "src/views/*.html".to_string(),
            dest: "dist".to_string(),
            views: "src/views".to_string(),
            context: toml::Table::new(),
        }
    }
}

/// `[serve]`: preview server used by `watch` and `serve`.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServeSection {
    pub root: String,
    /// Interface both servers bind to.
    pub open_host: String,
    pub port: u16,
    /// Port of the live-reload WebSocket.
    pub ws_port: u16,
}

impl Default for ServeSection {
    fn default() -> Self {
        Self {
            root: "dist".to_string(),
            open_host: "127.0.0.1".to_string(),
            port: 3000,
            ws_port: 3001,
        }
    }
}

/// `[watch]`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WatchSection {
    pub while_running: TriggerWhileRunningBehaviour,
    pub bind: Vec<BindingConfig>,
}

/// `[[watch.bind]]`: which tasks run when matching files change.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BindingConfig {
    pub watch: Vec<String>,

    #[serde(default)]
    pub exclude: Vec<String>,

    /// Tasks run in order; the first failure stops the rest.
    pub run: Vec<String>,

    /// Only trigger when the contents of the watched files actually changed.
    #[serde(default)]
    pub use_hash: bool,
}

impl BindingConfig {
    pub fn new<S: Into<String>>(watch: S, run: &[&str]) -> Self {
        Self {
            watch: vec![watch.into()],
            exclude: Vec::new(),
            run: run.iter().map(|s| s.to_string()).collect(),
            use_hash: false,
        }
    }
}

fn default_bindings() -> Vec<BindingConfig> {
    vec![
        BindingConfig::new("src/sass/**/*", &[STYLES]),
        BindingConfig::new("src/js/**/*", &[BUNDLE, MINIFY]),
        BindingConfig::new("src/img/**/*", &[IMAGES]),
        BindingConfig::new("src/views/**/*", &[TEMPLATES]),
    ]
}
