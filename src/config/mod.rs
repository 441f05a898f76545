//! Configuration module for bqcompile.
//!
//! Handles the TOML settings file and environment variable expansion.

mod settings;

pub use settings::{
    expand_env_vars, CacheSettings, CompilerSettings, LoggingSettings, Settings, SettingsError,
};
