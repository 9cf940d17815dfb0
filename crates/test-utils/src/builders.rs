#![allow(dead_code)]

use assetwatch::config::{BindingConfig, ConfigFile, RawConfigFile};
use assetwatch::types::TriggerWhileRunningBehaviour;

/// Builder for `ConfigFile` to simplify test setup.
///
/// Starts from the built-in defaults; adding a binding replaces the default
/// binding list.
pub struct ConfigFileBuilder {
    config: RawConfigFile,
}

impl ConfigFileBuilder {
    pub fn new() -> Self {
        Self {
            config: RawConfigFile::default(),
        }
    }

    pub fn with_binding(mut self, binding: BindingConfig) -> Self {
        self.config.watch.bind.push(binding);
        self
    }

    pub fn while_running(mut self, behaviour: TriggerWhileRunningBehaviour) -> Self {
        self.config.watch.while_running = behaviour;
        self
    }

    pub fn styles_src(mut self, pattern: &str) -> Self {
        self.config.styles.src = pattern.to_string();
        self
    }

    pub fn scripts_src(mut self, pattern: &str) -> Self {
        self.config.scripts.src = pattern.to_string();
        self
    }

    pub fn jpeg_quality(mut self, quality: u8) -> Self {
        self.config.images.jpeg_quality = quality;
        self
    }

    pub fn template_context(mut self, key: &str, value: &str) -> Self {
        self.config
            .templates
            .context
            .insert(key.to_string(), toml::Value::String(value.to_string()));
        self
    }

    pub fn raw(self) -> RawConfigFile {
        self.config
    }

    pub fn build(self) -> ConfigFile {
        ConfigFile::try_from(self.config).expect("Failed to build valid config from builder")
    }
}

impl Default for ConfigFileBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for `BindingConfig`.
pub struct BindingBuilder {
    binding: BindingConfig,
}

impl BindingBuilder {
    pub fn new(task: &str) -> Self {
        Self {
            binding: BindingConfig {
                watch: vec![],
                exclude: vec![],
                run: vec![task.to_string()],
                use_hash: false,
            },
        }
    }

    pub fn then(mut self, task: &str) -> Self {
        self.binding.run.push(task.to_string());
        self
    }

    pub fn watch(mut self, pattern: &str) -> Self {
        self.binding.watch.push(pattern.to_string());
        self
    }

    pub fn exclude(mut self, pattern: &str) -> Self {
        self.binding.exclude.push(pattern.to_string());
        self
    }

    pub fn use_hash(mut self, val: bool) -> Self {
        self.binding.use_hash = val;
        self
    }

    pub fn build(self) -> BindingConfig {
        self.binding
    }
}
