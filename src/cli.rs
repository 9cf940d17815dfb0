// src/cli.rs

//! CLI argument parsing using `clap`.

use clap::{Parser, Subcommand, ValueEnum};

/// Command-line arguments for `assetwatch`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "assetwatch",
    version,
    about = "Build front-end assets and rebuild them on file changes.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the config file (TOML).
    ///
    /// Default: `Assetwatch.toml` in the current working directory. When the
    /// default file does not exist, built-in defaults are used.
    #[arg(long, value_name = "PATH")]
    pub config: Option<String>,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `ASSETWATCH_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL", global = true)]
    pub log_level: Option<LogLevel>,

    /// Parse + validate, print tasks and bindings, but don't run anything.
    #[arg(long, global = true)]
    pub dry_run: bool,

    /// What to run. Defaults to `build`.
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Run styles, images, scripts (bundle + minify) and templates in parallel.
    Build,
    /// Compile stylesheets.
    #[command(alias = "css")]
    Styles,
    /// Concatenate scripts into the bundle only.
    Bundle,
    /// Concatenate scripts, then minify the bundle.
    Scripts,
    /// Minify an existing bundle.
    Minify,
    /// Optimize images newer than their destination copy.
    Images,
    /// Render templates.
    Templates,
    /// Watch sources, rebuild on change and serve the output with live reload.
    Watch {
        /// Watch and rebuild without starting the preview server.
        #[arg(long)]
        no_serve: bool,
    },
    /// Only serve the output directory with live reload.
    Serve,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
