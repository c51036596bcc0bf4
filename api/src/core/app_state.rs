use std::time::Duration;

use thiserror::Error;
use tree_config_engine::{EngineOptions, scm_clients::ScmSettings};

const DEFAULT_ADDRESS: &str = "0.0.0.0:3000";

/// Errors raised while reading settings at startup.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid boolean for {key}: '{value}'")]
    InvalidBool { key: &'static str, value: String },

    #[error("invalid number for {key}: '{value}'")]
    InvalidNumber { key: &'static str, value: String },

    #[error(transparent)]
    Scm(#[from] tree_config_engine::ConfigError),
}

/// Process-wide settings, read once from the environment.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Listen address, e.g. "0.0.0.0:3000".
    pub address: String,
    pub scm: ScmSettings,
    pub engine: EngineOptions,
    /// Raise the engine's log level to debug.
    pub debug: bool,
}

impl Settings {
    /// Load settings from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load settings through an arbitrary key lookup.
    ///
    /// Provider credentials are validated here so a misconfigured process
    /// fails at startup rather than on the first build.
    pub fn from_lookup<F>(get: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| get(key).filter(|v| !v.trim().is_empty());

        // Provider calls have no deadline unless one is configured.
        let timeout_secs = match non_empty("SCM_TIMEOUT_SECS") {
            Some(raw) => raw.trim().parse::<u64>().map_err(|_| ConfigError::InvalidNumber {
                key: "SCM_TIMEOUT_SECS",
                value: raw,
            })?,
            None => 0,
        };

        let scm = ScmSettings {
            server: non_empty("SERVER"),
            github_token: non_empty("GITHUB_TOKEN"),
            bitbucket_auth_server: non_empty("BITBUCKET_AUTH_SERVER"),
            bitbucket_client: non_empty("BITBUCKET_CLIENT"),
            bitbucket_secret: non_empty("BITBUCKET_SECRET"),
            timeout: (timeout_secs > 0).then(|| Duration::from_secs(timeout_secs)),
        };
        scm.provider_kind()?;

        let mut engine = EngineOptions {
            concat: parse_bool("PLUGIN_CONCAT", non_empty("PLUGIN_CONCAT"))?,
            fallback: parse_bool("PLUGIN_FALLBACK", non_empty("PLUGIN_FALLBACK"))?,
            ..EngineOptions::default()
        };
        if let Some(name) = non_empty("CONFIG_NAME") {
            engine.default_config_name = name.trim().to_string();
        }

        Ok(Self {
            address: non_empty("API_ADDRESS").unwrap_or_else(|| DEFAULT_ADDRESS.into()),
            scm,
            engine,
            debug: parse_bool("PLUGIN_DEBUG", non_empty("PLUGIN_DEBUG"))?,
        })
    }
}

fn parse_bool(key: &'static str, value: Option<String>) -> Result<bool, ConfigError> {
    let Some(value) = value else {
        return Ok(false);
    };
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidBool { key, value }),
    }
}

/// Shared state for all HTTP handlers.
#[derive(Debug, Clone)]
pub struct AppState {
    pub settings: Settings,
}

impl AppState {
    pub fn new(settings: Settings) -> Self {
        Self { settings }
    }
}
