//! Configuration file support for sbom-pipeline.
//!
//! Provides YAML-based configuration through `sbom-pipeline.config.yml`
//! files, environment overrides, and validation into [`Settings`].

use anyhow::{bail, Context};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::warn;

use crate::adapters::outbound::process::DEFAULT_OUTPUT_LIMIT_CHARS;
use crate::application::use_cases::DEFAULT_GENERATION_TIMEOUT;
use crate::sbom_generation::domain::STATUS_DIR_NAME;
use crate::sbom_generation::policies::{
    ExtractionLimits, RetryPolicy, DEFAULT_MAX_MEMBERS, DEFAULT_MAX_TOTAL_BYTES,
};
use crate::shared::Result;

pub const CONFIG_FILENAME: &str = "sbom-pipeline.config.yml";

pub const ENV_API_HOST: &str = "DX_API_HOST";
pub const ENV_API_KEY: &str = "DX_API_KEY";
pub const ENV_STORAGE_DIR: &str = "SBOM_STORAGE_DIR";

const DEFAULT_API_HOST: &str = "http://127.0.0.1:8081";
const DEFAULT_STORAGE_ROOT: &str = "data/sbom";
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
const DEFAULT_MAX_CONCURRENT_GENERATIONS: usize = 2;

/// Top-level configuration file schema.
#[derive(Debug, Deserialize, Default)]
pub struct ConfigFile {
    pub tracking: Option<TrackingSection>,
    pub storage: Option<StorageSection>,
    pub pipeline: Option<PipelineSection>,
    pub extraction: Option<ExtractionSection>,
    pub retry: Option<RetrySection>,
    /// Captures unknown fields for warnings.
    #[serde(flatten)]
    pub unknown_fields: HashMap<String, serde_yaml_ng::Value>,
}

#[derive(Debug, Deserialize, Default)]
pub struct TrackingSection {
    pub api_host: Option<String>,
    pub api_key: Option<String>,
    pub timeout_secs: Option<u64>,
    #[serde(flatten)]
    pub unknown_fields: HashMap<String, serde_yaml_ng::Value>,
}

#[derive(Debug, Deserialize, Default)]
pub struct StorageSection {
    pub root: Option<PathBuf>,
    #[serde(flatten)]
    pub unknown_fields: HashMap<String, serde_yaml_ng::Value>,
}

#[derive(Debug, Deserialize, Default)]
pub struct PipelineSection {
    pub max_concurrent_generations: Option<usize>,
    pub generation_timeout_secs: Option<u64>,
    pub output_limit_chars: Option<usize>,
    pub tool_dirs: Option<Vec<PathBuf>>,
    #[serde(flatten)]
    pub unknown_fields: HashMap<String, serde_yaml_ng::Value>,
}

#[derive(Debug, Deserialize, Default)]
pub struct ExtractionSection {
    pub max_members: Option<usize>,
    pub max_total_bytes: Option<u64>,
    #[serde(flatten)]
    pub unknown_fields: HashMap<String, serde_yaml_ng::Value>,
}

#[derive(Debug, Deserialize, Default)]
pub struct RetrySection {
    pub max_attempts: Option<u32>,
    pub delay_millis: Option<u64>,
    #[serde(flatten)]
    pub unknown_fields: HashMap<String, serde_yaml_ng::Value>,
}

/// Effective settings after defaults and environment overrides.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub api_host: String,
    pub api_key: String,
    pub request_timeout: Duration,
    pub storage_root: PathBuf,
    pub max_concurrent_generations: usize,
    pub generation_timeout: Duration,
    pub output_limit_chars: usize,
    pub tool_dirs: Vec<PathBuf>,
    pub extraction: ExtractionLimits,
    pub retry: RetryPolicy,
}

impl Settings {
    /// Directory holding the durable status records.
    pub fn status_dir(&self) -> PathBuf {
        self.storage_root.join(STATUS_DIR_NAME)
    }

    /// Applies defaults and the environment (through `env`) on top of
    /// `file`, then validates the result.
    pub fn resolve(file: ConfigFile, env: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let tracking = file.tracking.unwrap_or_default();
        let storage = file.storage.unwrap_or_default();
        let pipeline = file.pipeline.unwrap_or_default();
        let extraction = file.extraction.unwrap_or_default();
        let retry = file.retry.unwrap_or_default();

        let non_empty = |key: &str| env(key).filter(|v| !v.trim().is_empty());

        let max_concurrent_generations = pipeline
            .max_concurrent_generations
            .unwrap_or(DEFAULT_MAX_CONCURRENT_GENERATIONS);
        if max_concurrent_generations == 0 {
            bail!(
                "Invalid config: pipeline.max_concurrent_generations must be at least 1.\n\n\
                 💡 Hint: this bounds how many generator tools run at once; try 2."
            );
        }

        let generation_timeout = match pipeline.generation_timeout_secs {
            Some(0) => bail!(
                "Invalid config: pipeline.generation_timeout_secs must be greater than 0.\n\n\
                 💡 Hint: generators on large projects can take minutes; the default is {}.",
                DEFAULT_GENERATION_TIMEOUT.as_secs()
            ),
            Some(secs) => Duration::from_secs(secs),
            None => DEFAULT_GENERATION_TIMEOUT,
        };

        let output_limit_chars = pipeline.output_limit_chars.unwrap_or(DEFAULT_OUTPUT_LIMIT_CHARS);

        let tool_dirs = pipeline.tool_dirs.unwrap_or_default();
        if let Some(i) = tool_dirs.iter().position(|d| d.as_os_str().is_empty()) {
            bail!(
                "Invalid config: pipeline.tool_dirs[{}] must not be empty.\n\n\
                 💡 Hint: list directories containing generator tools, e.g. \"/opt/sbom/bin\".",
                i
            );
        }

        let max_members = extraction.max_members.unwrap_or(DEFAULT_MAX_MEMBERS);
        let max_total_bytes = extraction.max_total_bytes.unwrap_or(DEFAULT_MAX_TOTAL_BYTES);
        if max_members == 0 || max_total_bytes == 0 {
            bail!(
                "Invalid config: extraction limits must be greater than 0.\n\n\
                 💡 Hint: remove the extraction section to use the defaults ({} members, {} bytes).",
                DEFAULT_MAX_MEMBERS,
                DEFAULT_MAX_TOTAL_BYTES
            );
        }

        let defaults = RetryPolicy::default();
        let max_attempts = retry.max_attempts.unwrap_or(defaults.max_attempts);
        if max_attempts == 0 {
            bail!(
                "Invalid config: retry.max_attempts must be at least 1.\n\n\
                 💡 Hint: use 1 to disable retries."
            );
        }
        let delay = retry
            .delay_millis
            .map(Duration::from_millis)
            .unwrap_or(defaults.delay);

        let request_timeout = match tracking.timeout_secs {
            Some(0) => bail!(
                "Invalid config: tracking.timeout_secs must be greater than 0.\n\n\
                 💡 Hint: the default is {} seconds.",
                DEFAULT_REQUEST_TIMEOUT_SECS
            ),
            Some(secs) => Duration::from_secs(secs),
            None => Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
        };

        Ok(Self {
            api_host: non_empty(ENV_API_HOST)
                .or(tracking.api_host)
                .unwrap_or_else(|| DEFAULT_API_HOST.to_string()),
            api_key: non_empty(ENV_API_KEY).or(tracking.api_key).unwrap_or_default(),
            request_timeout,
            storage_root: non_empty(ENV_STORAGE_DIR)
                .map(PathBuf::from)
                .or(storage.root)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_STORAGE_ROOT)),
            max_concurrent_generations,
            generation_timeout,
            output_limit_chars,
            tool_dirs,
            extraction: ExtractionLimits::new(max_members, max_total_bytes),
            retry: RetryPolicy::new(max_attempts, delay),
        })
    }
}

/// Load config from an explicit path. Returns an error if the file is not found.
pub fn load_config_from_path(path: &Path) -> Result<ConfigFile> {
    let content = std::fs::read_to_string(path).with_context(|| {
        format!(
            "Failed to read config file: {}\n\n💡 Hint: Check that the file exists and is readable.",
            path.display()
        )
    })?;

    let config: ConfigFile = serde_yaml_ng::from_str(&content).with_context(|| {
        format!(
            "Failed to parse config file: {}\n\n💡 Hint: Ensure the file contains valid YAML syntax.",
            path.display()
        )
    })?;

    for key in unknown_field_paths(&config) {
        warn!(field = %key, "unknown config field will be ignored");
    }

    Ok(config)
}

/// Auto-discover config in a directory. Returns `None` silently if not found.
pub fn discover_config(dir: &Path) -> Result<Option<ConfigFile>> {
    let config_path = dir.join(CONFIG_FILENAME);

    if !config_path.exists() {
        return Ok(None);
    }

    let config = load_config_from_path(&config_path)?;
    Ok(Some(config))
}

/// Settings from an explicit file, or the discovered one in `dir`, plus the
/// process environment.
pub fn load_settings(explicit: Option<&Path>, dir: &Path) -> Result<Settings> {
    let file = match explicit {
        Some(path) => load_config_from_path(path)?,
        None => discover_config(dir)?.unwrap_or_default(),
    };
    Settings::resolve(file, |key| std::env::var(key).ok())
}

/// Dotted paths of every unknown field, sorted.
fn unknown_field_paths(config: &ConfigFile) -> Vec<String> {
    let mut keys: Vec<String> = config.unknown_fields.keys().cloned().collect();

    let mut nested = |section: &str, fields: Option<&HashMap<String, serde_yaml_ng::Value>>| {
        if let Some(fields) = fields {
            keys.extend(fields.keys().map(|k| format!("{}.{}", section, k)));
        }
    };
    nested("tracking", config.tracking.as_ref().map(|s| &s.unknown_fields));
    nested("storage", config.storage.as_ref().map(|s| &s.unknown_fields));
    nested("pipeline", config.pipeline.as_ref().map(|s| &s.unknown_fields));
    nested("extraction", config.extraction.as_ref().map(|s| &s.unknown_fields));
    nested("retry", config.retry.as_ref().map(|s| &s.unknown_fields));

    keys.sort();
    keys
}
