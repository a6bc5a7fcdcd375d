use std::env;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};

use crate::config::{CONFIG_ENV, DEFAULT_CONFIG_FILE, ExportConfig, LISTS_DIR_ENV};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueSource {
    Flag,
    Env,
    Config,
    Default,
}

impl ValueSource {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Flag => "flag",
            Self::Env => "env",
            Self::Config => "config",
            Self::Default => "default",
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct PathOverrides {
    pub input_dir: Option<PathBuf>,
    pub output_dir: Option<PathBuf>,
    pub config: Option<PathBuf>,
    pub lists_dir: Option<PathBuf>,
    pub log_file: Option<PathBuf>,
}

#[derive(Debug, Clone)]
pub struct ResolutionContext {
    pub cwd: PathBuf,
}

impl ResolutionContext {
    pub fn from_process() -> Result<Self> {
        let cwd = env::current_dir().context("failed to read current directory")?;
        Ok(Self { cwd })
    }
}

#[derive(Debug, Clone)]
pub struct ResolvedPaths {
    pub input_dir: PathBuf,
    pub output_dir: PathBuf,
    pub config_path: PathBuf,
    pub lists_dir: Option<PathBuf>,
    pub log_file: Option<PathBuf>,
    pub config_source: ValueSource,
    pub lists_source: ValueSource,
}

impl ResolvedPaths {
    pub fn diagnostics(&self) -> String {
        format!(
            "input_dir={}\noutput_dir={}\nconfig_path={} ({})\nlists_dir={} ({})\nlog_file={}",
            normalize_for_display(&self.input_dir),
            normalize_for_display(&self.output_dir),
            normalize_for_display(&self.config_path),
            self.config_source.as_str(),
            self.lists_dir
                .as_deref()
                .map(normalize_for_display)
                .unwrap_or_else(|| "<embedded>".to_string()),
            self.lists_source.as_str(),
            self.log_file
                .as_deref()
                .map(normalize_for_display)
                .unwrap_or_else(|| "<none>".to_string()),
        )
    }
}

/// Config file location: flag > env WIKIEXPORT_CONFIG > ./wikiexport.toml.
pub fn resolve_config_path(
    context: &ResolutionContext,
    overrides: &PathOverrides,
) -> (PathBuf, ValueSource) {
    resolve_config_path_with_lookup(context, overrides, |key| env::var(key).ok())
}

fn resolve_config_path_with_lookup<F>(
    context: &ResolutionContext,
    overrides: &PathOverrides,
    lookup_env: F,
) -> (PathBuf, ValueSource)
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(path) = overrides.config.as_deref() {
        return (absolutize(path, &context.cwd), ValueSource::Flag);
    }
    if let Some(value) = non_empty(lookup_env(CONFIG_ENV)) {
        return (absolutize(Path::new(&value), &context.cwd), ValueSource::Env);
    }
    (context.cwd.join(DEFAULT_CONFIG_FILE), ValueSource::Default)
}

pub fn resolve_paths(
    context: &ResolutionContext,
    overrides: &PathOverrides,
    config: &ExportConfig,
) -> Result<ResolvedPaths> {
    resolve_paths_with_lookup(context, overrides, config, |key| env::var(key).ok())
}

fn resolve_paths_with_lookup<F>(
    context: &ResolutionContext,
    overrides: &PathOverrides,
    config: &ExportConfig,
    lookup_env: F,
) -> Result<ResolvedPaths>
where
    F: Fn(&str) -> Option<String>,
{
    let Some(input_dir) = overrides.input_dir.as_deref() else {
        bail!("missing input directory");
    };
    let Some(output_dir) = overrides.output_dir.as_deref() else {
        bail!("missing output directory");
    };
    let (config_path, config_source) =
        resolve_config_path_with_lookup(context, overrides, &lookup_env);

    let (lists_dir, lists_source) = if let Some(path) = overrides.lists_dir.as_deref() {
        (Some(absolutize(path, &context.cwd)), ValueSource::Flag)
    } else if let Some(value) = non_empty(lookup_env(LISTS_DIR_ENV)) {
        (
            Some(absolutize(Path::new(&value), &context.cwd)),
            ValueSource::Env,
        )
    } else if let Some(path) = config.export.lists_dir.as_deref() {
        let base = config_path.parent().unwrap_or(&context.cwd);
        (Some(absolutize(path, base)), ValueSource::Config)
    } else {
        (None, ValueSource::Default)
    };

    Ok(ResolvedPaths {
        input_dir: absolutize(input_dir, &context.cwd),
        output_dir: absolutize(output_dir, &context.cwd),
        log_file: overrides
            .log_file
            .as_deref()
            .map(|path| absolutize(path, &context.cwd)),
        config_path,
        lists_dir,
        config_source,
        lists_source,
    })
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn absolutize(path: &Path, base: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}

pub fn normalize_for_display(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}
