//! TOML-based configuration for bqcompile.
//!
//! Supports a config file (bqcompile.toml) with environment variable expansion.
//!
//! Example configuration:
//! ```toml
//! [compiler]
//! default_dataset = "${BQ_DATASET}"
//! time_placeholder = "-- time --"
//! dataset_placeholder = "undefined"
//! moving_window_placeholder = "undefined"
//!
//! [cache]
//! enabled = true
//! capacity = 256
//!
//! [logging]
//! filter = "bqcompile=info"
//! ```

use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use crate::cache::DEFAULT_CAPACITY;
use crate::compiler::CompileOptions;

/// Error type for settings.
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("Config file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Unterminated variable reference in: {0}")]
    UnterminatedVar(String),
}

/// Root configuration structure.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Settings {
    pub compiler: CompilerSettings,
    pub cache: CacheSettings,
    pub logging: LoggingSettings,
}

/// Compiler placeholders and defaults.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CompilerSettings {
    /// Dataset applied to descriptors that have none (supports ${ENV_VAR}).
    pub default_dataset: Option<String>,

    /// Printed wherever the time column is needed but unset.
    pub time_placeholder: String,

    /// Printed in `FROM` when the dataset is unset.
    pub dataset_placeholder: String,

    /// Printed in `ROWS <n> PRECEDING` when a moving window has no size.
    pub moving_window_placeholder: String,
}

impl Default for CompilerSettings {
    fn default() -> Self {
        let options = CompileOptions::default();
        Self {
            default_dataset: None,
            time_placeholder: options.time_placeholder,
            dataset_placeholder: options.dataset_placeholder,
            moving_window_placeholder: options.rows_placeholder,
        }
    }
}

impl CompilerSettings {
    pub fn compile_options(&self) -> CompileOptions {
        CompileOptions::default()
            .with_time_placeholder(&self.time_placeholder)
            .with_dataset_placeholder(&self.dataset_placeholder)
            .with_rows_placeholder(&self.moving_window_placeholder)
    }

    /// The default dataset with environment variables expanded.
    pub fn resolved_default_dataset(&self) -> Result<Option<String>, SettingsError> {
        self.default_dataset
            .as_deref()
            .map(expand_env_vars)
            .transpose()
    }
}

/// Compile cache configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CacheSettings {
    pub enabled: bool,

    /// Maximum number of cached statements.
    pub capacity: usize,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            capacity: DEFAULT_CAPACITY,
        }
    }
}

impl CacheSettings {
    /// Capacity to build the cache with; zero when disabled.
    pub fn effective_capacity(&self) -> usize {
        if self.enabled {
            self.capacity
        } else {
            0
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// `tracing_subscriber::EnvFilter` directive. `RUST_LOG` takes precedence.
    pub filter: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            filter: "bqcompile=info".to_string(),
        }
    }
}

impl Settings {
    /// Load settings from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, SettingsError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(SettingsError::FileNotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self, SettingsError> {
        Ok(toml::from_str(content)?)
    }

    /// Load settings from the default config file locations.
    ///
    /// Searches in order:
    /// 1. Environment variable `BQCOMPILE_CONFIG`
    /// 2. `./bqcompile.toml`
    /// 3. `~/.config/bqcompile/config.toml`
    pub fn load() -> Result<Self, SettingsError> {
        if let Ok(path) = env::var("BQCOMPILE_CONFIG") {
            return Self::from_file(&path);
        }

        let local_config = PathBuf::from("bqcompile.toml");
        if local_config.exists() {
            return Self::from_file(&local_config);
        }

        if let Some(config_dir) = dirs::config_dir() {
            let user_config = config_dir.join("bqcompile").join("config.toml");
            if user_config.exists() {
                return Self::from_file(&user_config);
            }
        }

        Ok(Settings::default())
    }
}

/// Expand environment variables in a string.
///
/// Supports `${VAR}` and `$VAR` syntax. Engine macros such as
/// `$__timeFilter` are not valid variable names here and pass through.
pub fn expand_env_vars(s: &str) -> Result<String, SettingsError> {
    let mut result = String::with_capacity(s.len());
    let mut rest = s;

    while let Some(pos) = rest.find('$') {
        result.push_str(&rest[..pos]);
        let after = &rest[pos + 1..];

        if let Some(braced) = after.strip_prefix('{') {
            let end = braced
                .find('}')
                .ok_or_else(|| SettingsError::UnterminatedVar(s.to_string()))?;
            result.push_str(&lookup(&braced[..end])?);
            rest = &braced[end + 1..];
            continue;
        }

        let len = after
            .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
            .unwrap_or(after.len());
        let name = &after[..len];
        if name.is_empty() || name.starts_with("__") {
            // A lone `$` or an engine macro.
            result.push('$');
            rest = after;
        } else {
            result.push_str(&lookup(name)?);
            rest = &after[len..];
        }
    }

    result.push_str(rest);
    Ok(result)
}

fn lookup(name: &str) -> Result<String, SettingsError> {
    env::var(name).map_err(|_| SettingsError::MissingEnvVar(name.to_string()))
}
