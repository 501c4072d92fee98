use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

const LOG_LEVELS: [&str; 6] = ["off", "error", "warn", "info", "debug", "trace"];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Dictation language ("pt-BR", "en", "auto", ...)
    #[serde(default = "default_language")]
    pub language: String,
    /// Notes directory; platform data dir when unset
    #[serde(default)]
    pub data_dir: Option<String>,
    /// Storage slot holding the note collection
    #[serde(default = "default_storage_key")]
    pub storage_key: String,
    /// Whisper model file name (looked up in the models dir) or absolute path
    #[serde(default = "default_whisper_model")]
    pub whisper_model: String,
    /// Seconds of audio per live transcription update
    #[serde(default = "default_segment_interval_secs")]
    pub segment_interval_secs: u32,
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_language() -> String {
    "pt-BR".to_string()
}

fn default_storage_key() -> String {
    crate::notes::NOTES_KEY.to_string()
}

fn default_whisper_model() -> String {
    "ggml-base.bin".to_string()
}

fn default_segment_interval_secs() -> u32 {
    5
}

fn default_log_level() -> String {
    "warn".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            language: default_language(),
            data_dir: None,
            storage_key: default_storage_key(),
            whisper_model: default_whisper_model(),
            segment_interval_secs: default_segment_interval_secs(),
            log_level: default_log_level(),
        }
    }
}

impl Config {
    /// Reject unsafe values and normalize the rest.
    ///
    /// Names that end up in file paths are errors; out-of-range numbers are
    /// clamped and unknown levels fall back to defaults.
    pub fn validate(&mut self) -> Result<()> {
        if self.storage_key.is_empty()
            || self.storage_key.contains('/')
            || self.storage_key.contains('\\')
            || self.storage_key.contains("..")
        {
            bail!("Invalid storage key: '{}'", self.storage_key);
        }

        // Bare model names must not escape the models dir
        if !Path::new(&self.whisper_model).is_absolute()
            && (self.whisper_model.contains('/')
                || self.whisper_model.contains('\\')
                || self.whisper_model.contains(".."))
        {
            bail!("Invalid model name: {}", self.whisper_model);
        }

        self.segment_interval_secs = self.segment_interval_secs.clamp(1, 60);

        self.log_level = self.log_level.trim().to_lowercase();
        if self.log_level == "warning" {
            self.log_level = "warn".to_string();
        }
        if !LOG_LEVELS.contains(&self.log_level.as_str()) {
            self.log_level = default_log_level();
        }

        if self.language.trim().is_empty() {
            self.language = default_language();
        }

        Ok(())
    }

    /// Directory holding the note storage.
    pub fn data_dir(&self) -> PathBuf {
        match &self.data_dir {
            Some(dir) => PathBuf::from(dir),
            None => crate::notes::default_data_dir(),
        }
    }
}

pub fn config_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("voice-notes")
}

pub fn config_path() -> PathBuf {
    config_dir().join("config.toml")
}

pub fn models_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("whisper")
}

pub fn load_config() -> Result<Config> {
    load_config_from(&config_path())
}

/// Load config from `path`; a missing file yields defaults.
pub fn load_config_from(path: &Path) -> Result<Config> {
    if !path.exists() {
        return Ok(Config::default());
    }

    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config: {}", path.display()))?;

    let mut config: Config = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config: {}", path.display()))?;
    config.validate()?;
    Ok(config)
}

/// Set restrictive file permissions (owner-only read/write) on Unix systems.
#[cfg(unix)]
pub fn set_owner_only_permissions(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(0o600))
        .with_context(|| format!("Failed to set permissions on {}", path.display()))
}

#[cfg(not(unix))]
pub fn set_owner_only_permissions(_path: &Path) -> Result<()> {
    Ok(())
}

pub fn save_config_to(config: &Config, path: &Path) -> Result<()> {
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create directory: {}", dir.display()))?;
    }

    let content = toml::to_string_pretty(config).context("Failed to serialize config")?;

    fs::write(path, &content)
        .with_context(|| format!("Failed to write config: {}", path.display()))?;

    set_owner_only_permissions(path)?;

    Ok(())
}
