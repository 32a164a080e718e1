//! Configuration management with layered loading
//!
//! Precedence (lowest to highest):
//! 1. Compiled defaults
//! 2. Global config: `$XDG_CONFIG_HOME/fritz-annotate/fritz-annotate.toml`
//! 3. Environment variables: `FRITZ_ANNOTATE_*` prefix
//! 4. CLI flags (`--token`, `--base-url`), applied by the CLI layer

use std::path::{Path, PathBuf};

use config::{Config, ConfigError, Environment};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::application::ApplicationError;

/// Public Fritz instance.
pub const DEFAULT_BASE_URL: &str = "https://fritz.science";

/// Authorization scheme SkyPortal expects in front of the token.
pub const DEFAULT_AUTH_SCHEME: &str = "token";

/// Prefix for environment overrides, e.g. `FRITZ_ANNOTATE_TOKEN`.
pub const ENV_PREFIX: &str = "FRITZ_ANNOTATE";

/// Unified configuration for fritz-annotate.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Settings {
    /// Base URL of the Fritz/SkyPortal instance
    pub base_url: String,
    /// API token from the Fritz profile page
    pub token: Option<String>,
    /// Authorization header scheme (`token` for SkyPortal)
    pub auth_scheme: String,
    /// Per-request timeout; none by default
    pub timeout_secs: Option<u64>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            token: None,
            auth_scheme: DEFAULT_AUTH_SCHEME.to_string(),
            timeout_secs: None,
        }
    }
}

/// Raw settings for intermediate parsing (every field optional).
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RawSettings {
    pub base_url: Option<String>,
    pub token: Option<String>,
    pub auth_scheme: Option<String>,
    pub timeout_secs: Option<u64>,
}

/// Get the XDG config directory for fritz-annotate.
pub fn global_config_dir() -> Option<PathBuf> {
    ProjectDirs::from("", "", "fritz-annotate").map(|dirs| dirs.config_dir().to_path_buf())
}

/// Get the path to the global config file.
pub fn global_config_path() -> Option<PathBuf> {
    global_config_dir().map(|dir| dir.join("fritz-annotate.toml"))
}

/// Load a TOML file into RawSettings for manual merging.
fn load_raw_settings(path: &Path) -> Result<RawSettings, ApplicationError> {
    let content = std::fs::read_to_string(path).map_err(|e| ApplicationError::Config {
        message: format!("read {}: {}", path.display(), e),
    })?;
    RawSettings::from_toml(&content).map_err(|e| ApplicationError::Config {
        message: format!("parse {}: {}", path.display(), e),
    })
}

impl RawSettings {
    pub fn from_toml(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }
}

impl Settings {
    /// Overlay wins wherever it specifies a value.
    pub fn merge_with(&self, overlay: &RawSettings) -> Self {
        Self {
            base_url: overlay
                .base_url
                .clone()
                .unwrap_or_else(|| self.base_url.clone()),
            token: overlay.token.clone().or_else(|| self.token.clone()),
            auth_scheme: overlay
                .auth_scheme
                .clone()
                .unwrap_or_else(|| self.auth_scheme.clone()),
            timeout_secs: overlay.timeout_secs.or(self.timeout_secs),
        }
    }

    /// Load settings with layered precedence.
    ///
    /// `config_file` replaces the global config location when given.
    pub fn load(config_file: Option<&Path>) -> Result<Self, ApplicationError> {
        // 1. Start with defaults
        let mut current = Self::default();

        // 2. Config file (explicit path must exist, global one is optional)
        match config_file {
            Some(path) => {
                let raw = load_raw_settings(path)?;
                current = current.merge_with(&raw);
            }
            None => {
                if let Some(global_path) = global_config_path() {
                    if global_path.exists() {
                        let raw = load_raw_settings(&global_path)?;
                        current = current.merge_with(&raw);
                    }
                }
            }
        }

        // 3. Environment variables (explicit override)
        current = Self::apply_env_overrides(current)?;

        Ok(current)
    }

    /// Apply FRITZ_ANNOTATE_* environment variables as explicit overrides.
    fn apply_env_overrides(mut settings: Self) -> Result<Self, ApplicationError> {
        // Use config crate just for env var parsing
        let builder = Config::builder().add_source(Environment::with_prefix(ENV_PREFIX));

        let config = builder.build().map_err(config_err)?;

        if let Ok(val) = config.get_string("base_url") {
            settings.base_url = val;
        }
        if let Ok(val) = config.get_string("token") {
            settings.token = Some(val);
        }
        if let Ok(val) = config.get_string("auth_scheme") {
            settings.auth_scheme = val;
        }
        if let Ok(val) = config.get::<u64>("timeout_secs") {
            settings.timeout_secs = Some(val);
        }

        Ok(settings)
    }

    /// Copy of these settings that is safe to print.
    pub fn redacted(&self) -> Self {
        Self {
            token: self.token.as_ref().map(|_| "********".to_string()),
            ..self.clone()
        }
    }

    /// Show the effective configuration as TOML.
    pub fn to_toml(&self) -> Result<String, ApplicationError> {
        toml::to_string_pretty(self).map_err(|e| ApplicationError::Config {
            message: format!("serialize config: {e}"),
        })
    }

    /// Generate a template config file.
    pub fn template() -> String {
        r#"# fritz-annotate configuration
#
# Locations (by precedence, lowest to highest):
#   Global: ~/.config/fritz-annotate/fritz-annotate.toml
#   Env:    FRITZ_ANNOTATE_* environment variables (e.g. FRITZ_ANNOTATE_TOKEN)
#   CLI:    --token, --base-url

# Fritz/SkyPortal instance
# base_url = "https://fritz.science"

# API token (from your Fritz profile page)
# token = "..."

# Authorization header scheme
# auth_scheme = "token"

# Per-request timeout in seconds (unset: wait indefinitely)
# timeout_secs = 30
"#
        .to_string()
    }
}

fn config_err(e: ConfigError) -> ApplicationError {
    ApplicationError::Config {
        message: e.to_string(),
    }
}
