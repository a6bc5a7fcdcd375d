use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::wiki::DEFAULT_NAMESPACE;

pub const DEFAULT_CONFIG_FILE: &str = "wikiexport.toml";
pub const DEFAULT_LANG: &str = "fr-FR";
pub const LISTS_DIR_ENV: &str = "WIKIEXPORT_LISTS_DIR";
pub const CONFIG_ENV: &str = "WIKIEXPORT_CONFIG";
pub const LANG_ENV: &str = "WIKIEXPORT_LANG";

#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq, Eq)]
pub struct ExportConfig {
    #[serde(default)]
    pub export: ExportSection,
    #[serde(default)]
    pub output: OutputSection,
}

#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq, Eq)]
pub struct ExportSection {
    pub lang: Option<String>,
    pub default_namespace: Option<String>,
    pub lists_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq, Eq)]
pub struct OutputSection {
    #[serde(default)]
    pub json: bool,
    #[serde(default)]
    pub csv: bool,
    #[serde(default)]
    pub single_file: bool,
}

impl ExportConfig {
    /// Dataset language: env WIKIEXPORT_LANG > config > fr-FR.
    pub fn lang(&self) -> String {
        env_value(LANG_ENV)
            .or_else(|| self.export.lang.clone())
            .unwrap_or_else(|| DEFAULT_LANG.to_string())
    }

    pub fn default_namespace(&self) -> &str {
        self.export
            .default_namespace
            .as_deref()
            .unwrap_or(DEFAULT_NAMESPACE)
    }
}

fn env_value(key: &str) -> Option<String> {
    let value = env::var(key).ok()?;
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Load and parse an ExportConfig from a TOML file. Returns default if file doesn't exist.
pub fn load_config(config_path: &Path) -> Result<ExportConfig> {
    if !config_path.exists() {
        return Ok(ExportConfig::default());
    }
    let content = fs::read_to_string(config_path)
        .with_context(|| format!("failed to read {}", config_path.display()))?;
    let parsed: ExportConfig = toml::from_str(&content)
        .with_context(|| format!("failed to parse {}", config_path.display()))?;
    Ok(parsed)
}
