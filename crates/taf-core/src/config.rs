//! Configuration management
//!
//! Settings are resolved in priority order:
//! 1. Environment variables
//! 2. `taf.toml` config file
//! 3. Defaults

use std::path::Path;

use serde::Deserialize;
use tracing::debug;

use crate::error::{Error, Result};
use crate::manifest::WebTuning;

/// Configuration keys the release check reports on. Presence only; the
/// values belong to the bot process and are never read here.
pub const REQUIRED_VARS: [&str; 2] = ["API_ID", "API_HASH"];

/// Runtime settings for the launcher and the keep-alive role.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Keep-alive HTTP port, platform-assigned via `PORT`.
    pub port: u16,

    /// Platform environment name, display only.
    pub environment: String,

    /// Bot entry file the startup guard checks before hand-off.
    pub entry_file: String,

    /// Interpreter used to launch the entry file.
    pub interpreter: String,

    /// Web role tuning.
    pub web: WebTuning,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            port: default_port(),
            environment: default_environment(),
            entry_file: default_entry_file(),
            interpreter: default_interpreter(),
            web: WebTuning::default(),
        }
    }
}

fn default_port() -> u16 {
    8080
}

fn default_environment() -> String {
    "Local".to_string()
}

fn default_entry_file() -> String {
    "main.py".to_string()
}

fn default_interpreter() -> String {
    "python".to_string()
}

impl Settings {
    /// Load from `taf.toml` when present, environment-only otherwise.
    /// Environment variables always win over file values.
    pub fn load() -> Result<Self> {
        if Path::new("taf.toml").exists() {
            debug!("loading settings from taf.toml");
            return Self::from_toml_file("taf.toml");
        }
        Ok(Self::from_env())
    }

    /// Read settings from a TOML file, then apply environment overrides.
    pub fn from_toml_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let file: TomlSettings = toml::from_str(&content).map_err(|e| {
            Error::Config(format!(
                "failed to parse {}: {}",
                path.as_ref().display(),
                e
            ))
        })?;
        let mut settings = Self {
            port: file.port.unwrap_or_else(default_port),
            environment: file.environment.unwrap_or_else(default_environment),
            entry_file: file.entry_file.unwrap_or_else(default_entry_file),
            interpreter: file.interpreter.unwrap_or_else(default_interpreter),
            web: file.web.unwrap_or_default(),
        };
        settings.apply_overrides(|key| std::env::var(key).ok());
        Ok(settings)
    }

    /// Build from environment variables only.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary variable lookup. Unset or unparsable
    /// values fall back to defaults.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut settings = Self::default();
        settings.apply_overrides(lookup);
        settings
    }

    fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(port) = lookup("PORT").and_then(|p| p.parse().ok()) {
            self.port = port;
        }
        if let Some(name) = lookup("RAILWAY_ENVIRONMENT").filter(|n| !n.is_empty()) {
            self.environment = name;
        }
        if let Some(entry) = lookup("ENTRY_FILE").filter(|e| !e.is_empty()) {
            self.entry_file = entry;
        }
        if let Some(bin) = lookup("PYTHON_BIN").filter(|b| !b.is_empty()) {
            self.interpreter = bin;
        }
    }
}

/// `taf.toml` top-level structure.
#[derive(Debug, Deserialize, Default)]
struct TomlSettings {
    port: Option<u16>,
    environment: Option<String>,
    entry_file: Option<String>,
    interpreter: Option<String>,
    /// `[web]` table: tuning overrides for the keep-alive role.
    web: Option<WebTuning>,
}
