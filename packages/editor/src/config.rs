use crate::change_notifier::DEFAULT_DEBOUNCE_MS;
use serde::{Deserialize, Serialize};
use slotmark_parser::{ComponentDefinition, ComponentRegistry, RegistryError, SerializeOptions};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_CONFIG_NAME: &str = "slotmark.config.json";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid config: {0}")]
    Json(#[from] serde_json::Error),
}

/// Editor configuration file format
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditorConfig {
    /// Change notification window
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,

    /// Drop unfilled placeholders from emitted content
    #[serde(default = "default_true")]
    pub filter_empty: bool,

    /// Echo restored markers exactly as loaded
    #[serde(default = "default_true")]
    pub restore_mode: bool,

    /// Register the built-in coupon, nickname and emoji types
    #[serde(default = "default_true")]
    pub builtin_components: bool,

    /// Extra component types, registered after the built-ins
    #[serde(default)]
    pub components: Vec<ComponentDefinition>,

    /// Start read-only: edits are ignored, loading content still works
    #[serde(default)]
    pub disabled: bool,
}

fn default_debounce_ms() -> u64 {
    DEFAULT_DEBOUNCE_MS
}

fn default_true() -> bool {
    true
}

impl EditorConfig {
    /// Load config from a directory; defaults when the file is missing
    pub fn load(dir: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let config_path = dir.as_ref().join(DEFAULT_CONFIG_NAME);

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            Self::from_json(&content)
        } else {
            Ok(EditorConfig::default())
        }
    }

    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub fn serialize_options(&self) -> SerializeOptions {
        SerializeOptions {
            filter_empty: self.filter_empty,
            restore_mode: self.restore_mode,
        }
    }

    pub fn build_registry(&self) -> Result<ComponentRegistry, RegistryError> {
        let mut registry = if self.builtin_components {
            ComponentRegistry::with_builtins()
        } else {
            ComponentRegistry::new()
        };
        for definition in &self.components {
            registry.register(definition.clone())?;
        }
        Ok(registry)
    }
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            debounce_ms: default_debounce_ms(),
            filter_empty: true,
            restore_mode: true,
            builtin_components: true,
            components: vec![],
            disabled: false,
        }
    }
}
