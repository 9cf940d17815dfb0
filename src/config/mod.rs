// src/config/mod.rs

//! Configuration loading and validation for assetwatch.
//!
//! Responsibilities:
//! - Define the TOML-backed data model (`model.rs`).
//! - Load a config file from disk, or fall back to defaults (`loader.rs`).
//! - Validate globs, task references and option ranges (`validate.rs`).

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{load_and_validate, load_from_path, load_or_default, project_root};
pub use model::{
    BindingConfig, ConfigFile, ImagesSection, RawConfigFile, ScriptsSection, ServeSection,
    StylesSection, TemplatesSection, WatchSection,
};
