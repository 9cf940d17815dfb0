// src/config/validate.rs

use crate::config::model::{ConfigFile, RawConfigFile};
use crate::dag::task::is_known_task;
use crate::errors::{AssetwatchError, Result};
use crate::source::compile_glob;

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = crate::errors::AssetwatchError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        validate_raw_config(&raw)?;
        Ok(ConfigFile::new_unchecked(raw))
    }
}

fn validate_raw_config(cfg: &RawConfigFile) -> Result<()> {
    validate_task_sections(cfg)?;
    validate_serve(cfg)?;
    validate_bindings(cfg)?;
    Ok(())
}

fn config_error(msg: impl Into<String>) -> AssetwatchError {
    AssetwatchError::ConfigError(msg.into())
}

fn ensure_glob(section: &str, pattern: &str) -> Result<()> {
    compile_glob(pattern)
        .map(|_| ())
        .map_err(|e| config_error(format!("[{section}] invalid glob '{pattern}': {e}")))
}

fn validate_task_sections(cfg: &RawConfigFile) -> Result<()> {
    ensure_glob("styles", &cfg.styles.src)?;
    ensure_glob("scripts", &cfg.scripts.src)?;
    ensure_glob("images", &cfg.images.src)?;
    ensure_glob("templates", &cfg.templates.src)?;
    for pattern in &cfg.scripts.ignore {
        ensure_glob("scripts", pattern)?;
    }

    if cfg.styles.suffix.trim().is_empty() {
        return Err(config_error("[styles].suffix must not be empty"));
    }
    if cfg.scripts.bundle.trim().is_empty() {
        return Err(config_error("[scripts].bundle must not be empty"));
    }
    if cfg.scripts.bundle.contains('/') || cfg.scripts.bundle.contains('\\') {
        return Err(config_error(format!(
            "[scripts].bundle must be a file name, got '{}'",
            cfg.scripts.bundle
        )));
    }
    if !cfg.scripts.min_ext.starts_with('.') || cfg.scripts.min_ext.len() < 2 {
        return Err(config_error(format!(
            "[scripts].min_ext must look like \".min.js\", got '{}'",
            cfg.scripts.min_ext
        )));
    }
    if !(1..=100).contains(&cfg.images.jpeg_quality) {
        return Err(config_error(format!(
            "[images].jpeg_quality must be within 1..=100 (got {})",
            cfg.images.jpeg_quality
        )));
    }

    Ok(())
}

fn validate_serve(cfg: &RawConfigFile) -> Result<()> {
    if cfg.serve.port == 0 || cfg.serve.ws_port == 0 {
        return Err(config_error("[serve] ports must be >= 1"));
    }
    if cfg.serve.port == cfg.serve.ws_port {
        return Err(config_error(format!(
            "[serve].port and [serve].ws_port must differ (both {})",
            cfg.serve.port
        )));
    }
    Ok(())
}

fn validate_bindings(cfg: &RawConfigFile) -> Result<()> {
    for (idx, binding) in cfg.watch.bind.iter().enumerate() {
        if binding.watch.is_empty() {
            return Err(config_error(format!(
                "[[watch.bind]] #{idx} must watch at least one pattern"
            )));
        }
        if binding.run.is_empty() {
            return Err(config_error(format!(
                "[[watch.bind]] #{idx} must run at least one task"
            )));
        }
        for task in &binding.run {
            if !is_known_task(task) {
                return Err(config_error(format!(
                    "[[watch.bind]] #{idx} runs unknown task '{task}'"
                )));
            }
        }
        for pattern in binding.watch.iter().chain(binding.exclude.iter()) {
            ensure_glob("watch.bind", pattern)?;
        }
    }
    Ok(())
}
