use std::env;
use std::path::Path;

use plugins::plugin_ref::PluginHosts;
use serde::{Deserialize, Serialize};

pub const ENV_PLUGIN_HOST: &str = "VIEWER_PLUGIN_HOST";
pub const ENV_WIDGET_HOST: &str = "VIEWER_WIDGET_HOST";
pub const ENV_ION_TOKEN: &str = "VIEWER_ION_TOKEN";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    Io(String),
    Parse(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(msg) => write!(f, "viewer config unreadable: {msg}"),
            ConfigError::Parse(msg) => write!(f, "viewer config invalid: {msg}"),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Viewer settings. Every field has a default, so `{}` is a valid config.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    pub plugin_hosts: PluginHosts,
    /// Overrides the scene's `default.ion` token when set.
    pub ion_token: Option<String>,
    /// Origin that relative plugin module URLs are fetched from.
    pub module_origin: String,
    /// Granularity of the replay clock between scripted steps.
    pub tick_ms: u64,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            plugin_hosts: PluginHosts::default(),
            ion_token: None,
            module_origin: "http://127.0.0.1:8080".to_string(),
            tick_ms: 100,
        }
    }
}

impl ViewerConfig {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(json).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(format!("{}: {e}", path.display())))?;
        Self::from_json(&json)
    }

    /// Applies `VIEWER_*` environment overrides.
    pub fn with_env(self) -> Self {
        self.with_overrides(|key| env::var(key).ok())
    }

    pub fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(host) = lookup(ENV_PLUGIN_HOST) {
            self.plugin_hosts.primitives = host;
        }
        if let Some(host) = lookup(ENV_WIDGET_HOST) {
            self.plugin_hosts.widgets = host;
        }
        if let Some(token) = lookup(ENV_ION_TOKEN).filter(|t| !t.is_empty()) {
            self.ion_token = Some(token);
        }
        self
    }
}
