//! Configuration for newsvoice.
//!
//! Configuration sources (highest priority first):
//! 1. Environment variables (NEWSVOICE_HOME, NEWSVOICE_FEED_URL,
//!    NEWSVOICE_BATCH_SIZE, NEWSVOICE_PUBLIC_BASE_URL)
//! 2. Config file (`--config <path>`, or .newsvoice/config.yaml found in the
//!    current directory or a parent)
//! 3. Defaults (~/.newsvoice)
//!
//! `paths.home` in the config file is relative to the directory holding the
//! file. Every other relative path is relative to home.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;
use thiserror::Error;

use crate::adapters::VoiceSettings;
use crate::core::{CatalogSettings, RunSettings, DEFAULT_BATCH_SIZE};

/// Feed used when nothing else is configured
pub const DEFAULT_FEED_URL: &str = "https://www.webtekno.com/rss.xml";

/// Errors in configuration values
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid value for {var}: '{value}'")]
    InvalidEnv { var: String, value: String },

    #[error("feed.batch_size must be at least 1")]
    ZeroBatchSize,

    #[error("storage.artifact_prefix '{0}' has a component starting with '.'")]
    HiddenArtifactPrefix(String),
}

/// Raw config file schema (matches YAML structure)
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConfigFile {
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub paths: PathsConfig,
    #[serde(default)]
    pub feed: FeedConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub summarizer: SummarizerConfig,
    #[serde(default)]
    pub speech: SpeechConfig,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PathsConfig {
    /// State directory (relative to the config file's directory)
    pub home: Option<String>,
    /// Ledger database (relative to home)
    pub ledger: Option<String>,
    /// Staging directory for synthesized audio (relative to home)
    pub staging: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct FeedConfig {
    pub url: Option<String>,
    pub batch_size: Option<usize>,
    pub timeout_seconds: Option<u64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct StorageConfig {
    /// Artifact directory (relative to home)
    pub artifacts_dir: Option<String>,
    /// Separate directory for the manifest (defaults to artifacts_dir)
    pub manifest_dir: Option<String>,
    pub artifact_prefix: Option<String>,
    pub manifest_key: Option<String>,
    pub public_base_url: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SummarizerConfig {
    pub backend: Option<SummarizerBackend>,
    pub pattern: Option<String>,
    pub model: Option<String>,
    pub binary: Option<String>,
    pub timeout_seconds: Option<u64>,
    /// Narration script with `{title}` and `{summary}` placeholders
    pub template: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SpeechConfig {
    pub endpoint: Option<String>,
    /// Name of the environment variable holding the API key
    pub api_key_env: Option<String>,
    pub model: Option<String>,
    pub voice: Option<String>,
    pub timeout_seconds: Option<u64>,
}

/// Which summarization collaborator to use
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SummarizerBackend {
    /// Leading sentences of the article, no model involved
    #[default]
    Excerpt,
    /// fabric CLI pattern
    Fabric,
}

/// Resolved configuration with absolute paths
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    /// State directory
    pub home: PathBuf,
    /// Path to config file (if found)
    pub config_file: Option<PathBuf>,
    pub feed: FeedSettings,
    pub ledger_path: PathBuf,
    pub staging_dir: Option<PathBuf>,
    pub storage: StorageSettings,
    pub summarizer: SummarizerSettings,
    pub speech: SpeechSettings,
}

#[derive(Debug, Clone)]
pub struct FeedSettings {
    pub url: String,
    pub batch_size: usize,
    pub timeout_seconds: u64,
}

#[derive(Debug, Clone)]
pub struct StorageSettings {
    pub artifacts_dir: PathBuf,
    pub manifest_dir: Option<PathBuf>,
    pub artifact_prefix: String,
    pub manifest_key: String,
    pub public_base_url: String,
}

#[derive(Debug, Clone)]
pub struct SummarizerSettings {
    pub backend: SummarizerBackend,
    pub pattern: String,
    pub model: Option<String>,
    pub binary: Option<String>,
    pub timeout_seconds: u64,
    pub template: String,
}

#[derive(Debug, Clone)]
pub struct SpeechSettings {
    pub endpoint: String,
    pub api_key_env: String,
    pub timeout_seconds: u64,
    pub voice: VoiceSettings,
}

impl ResolvedConfig {
    /// Settings for the pipeline driver
    pub fn run_settings(&self) -> RunSettings {
        RunSettings {
            batch_size: self.feed.batch_size,
        }
    }

    /// Settings for the catalog builder
    pub fn catalog_settings(&self) -> CatalogSettings {
        CatalogSettings {
            artifact_prefix: self.storage.artifact_prefix.clone(),
            manifest_key: self.storage.manifest_key.clone(),
            public_base_url: self.storage.public_base_url.clone(),
        }
    }
}

/// Find config file by searching current directory and parents
fn find_config_file() -> Option<PathBuf> {
    let mut current = std::env::current_dir().ok()?;

    loop {
        let config_path = current.join(".newsvoice").join("config.yaml");
        if config_path.exists() {
            return Some(config_path);
        }

        if !current.pop() {
            break;
        }
    }

    None
}

/// Load and parse config file
pub fn load_config_file(path: &Path) -> Result<ConfigFile> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    serde_yaml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))
}

/// Resolve a path that may be relative to `base`
fn resolve_path(base: &Path, path_str: &str) -> PathBuf {
    let path = PathBuf::from(path_str);
    if path.is_absolute() {
        path
    } else {
        base.join(path)
    }
}

/// Load configuration from all sources
pub fn load_config(explicit: Option<&Path>) -> Result<ResolvedConfig> {
    let default_home = dirs::home_dir()
        .context("Failed to determine home directory")?
        .join(".newsvoice");

    let config_path = match explicit {
        Some(path) => Some(path.to_path_buf()),
        None => find_config_file(),
    };

    let file = match &config_path {
        Some(path) => load_config_file(path)?,
        None => ConfigFile::default(),
    };

    resolve(file, config_path, default_home, |var| std::env::var(var).ok())
}

/// Merge a parsed config file, environment lookups, and defaults
pub fn resolve(
    file: ConfigFile,
    config_file: Option<PathBuf>,
    default_home: PathBuf,
    env: impl Fn(&str) -> Option<String>,
) -> Result<ResolvedConfig> {
    let config_dir = config_file
        .as_deref()
        .and_then(Path::parent)
        .map(Path::to_path_buf);

    let home = if let Some(env_home) = env("NEWSVOICE_HOME") {
        PathBuf::from(env_home)
    } else if let (Some(home_path), Some(dir)) = (&file.paths.home, &config_dir) {
        resolve_path(dir, home_path)
    } else {
        default_home
    };

    let batch_size = match env("NEWSVOICE_BATCH_SIZE") {
        Some(value) => {
            value
                .trim()
                .parse::<usize>()
                .map_err(|_| ConfigError::InvalidEnv {
                    var: "NEWSVOICE_BATCH_SIZE".to_string(),
                    value: value.clone(),
                })?
        }
        None => file.feed.batch_size.unwrap_or(DEFAULT_BATCH_SIZE),
    };
    if batch_size == 0 {
        return Err(ConfigError::ZeroBatchSize.into());
    }

    let feed = FeedSettings {
        url: env("NEWSVOICE_FEED_URL")
            .or(file.feed.url)
            .unwrap_or_else(|| DEFAULT_FEED_URL.to_string()),
        batch_size,
        timeout_seconds: file.feed.timeout_seconds.unwrap_or(30),
    };

    let ledger_path = resolve_path(&home, file.paths.ledger.as_deref().unwrap_or("ledger.db"));
    let staging_dir = file.paths.staging.as_deref().map(|p| resolve_path(&home, p));

    let artifacts_dir = resolve_path(
        &home,
        file.storage.artifacts_dir.as_deref().unwrap_or("media"),
    );
    let manifest_dir = file
        .storage
        .manifest_dir
        .as_deref()
        .map(|p| resolve_path(&home, p));

    // Without a CDN in front, point the catalog at the files themselves
    let public_base_url = env("NEWSVOICE_PUBLIC_BASE_URL")
        .or(file.storage.public_base_url)
        .unwrap_or_else(|| format!("file://{}", artifacts_dir.display()));

    let artifact_prefix = file.storage.artifact_prefix.unwrap_or_default();
    if artifact_prefix.split('/').any(|part| part.starts_with('.')) {
        return Err(ConfigError::HiddenArtifactPrefix(artifact_prefix).into());
    }

    let storage = StorageSettings {
        artifacts_dir,
        manifest_dir,
        artifact_prefix,
        manifest_key: file
            .storage
            .manifest_key
            .unwrap_or_else(|| "catalog.json".to_string()),
        public_base_url,
    };

    let summarizer = SummarizerSettings {
        backend: file.summarizer.backend.unwrap_or_default(),
        pattern: file
            .summarizer
            .pattern
            .unwrap_or_else(|| crate::adapters::fabric::DEFAULT_PATTERN.to_string()),
        model: file.summarizer.model,
        binary: file.summarizer.binary,
        timeout_seconds: file.summarizer.timeout_seconds.unwrap_or(120),
        template: file
            .summarizer
            .template
            .unwrap_or_else(|| crate::core::composer::DEFAULT_TEMPLATE.to_string()),
    };

    let default_voice = VoiceSettings::default();
    let speech = SpeechSettings {
        endpoint: file
            .speech
            .endpoint
            .unwrap_or_else(|| "https://api.openai.com".to_string()),
        api_key_env: file
            .speech
            .api_key_env
            .unwrap_or_else(|| "OPENAI_API_KEY".to_string()),
        timeout_seconds: file.speech.timeout_seconds.unwrap_or(60),
        voice: VoiceSettings {
            model: file.speech.model.unwrap_or(default_voice.model),
            voice: file.speech.voice.unwrap_or(default_voice.voice),
            format: default_voice.format,
        },
    };

    Ok(ResolvedConfig {
        home,
        config_file,
        feed,
        ledger_path,
        staging_dir,
        storage,
        summarizer,
        speech,
    })
}
