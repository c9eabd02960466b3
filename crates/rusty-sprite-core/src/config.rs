//! Configuration loading and validation.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::types::DEFAULT_SESSION;

/// Top-level Rusty Sprite configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub relay: Option<RelayConfig>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub resources: Option<ResourcesConfig>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub logging: Option<LoggingConfig>,
}

/// Relay server and execution proxy settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelayConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bind: Option<String>,

    #[serde(default = "default_port")]
    pub port: u16,

    /// How long a caller waits for a script result, in ms (default: 30000).
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// A host that has not polled for this long counts as gone (default: 5000).
    #[serde(default = "default_host_stale_after_ms")]
    pub host_stale_after_ms: u64,

    /// Largest script accepted for submission (default: 1 MiB).
    #[serde(default = "default_max_script_bytes")]
    pub max_script_bytes: usize,

    /// Session used when a request does not name one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_session: Option<String>,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            bind: None,
            port: default_port(),
            timeout_ms: default_timeout_ms(),
            host_stale_after_ms: default_host_stale_after_ms(),
            max_script_bytes: default_max_script_bytes(),
            default_session: None,
        }
    }
}

fn default_port() -> u16 {
    64823
}

fn default_timeout_ms() -> u64 {
    30_000
}

fn default_host_stale_after_ms() -> u64 {
    5_000
}

fn default_max_script_bytes() -> usize {
    1024 * 1024
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResourcesConfig {
    /// Directory holding `reference.txt` and `examples.txt`. Built-in copies
    /// are served when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dir: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log format: "plain" (default) or "json".
    #[serde(default = "default_log_format")]
    pub format: String,

    /// Log level override (trace/debug/info/warn/error).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub level: Option<String>,

    /// Per-crate log level overrides (e.g. "rusty_sprite_relay=debug").
    #[serde(default)]
    pub filters: Vec<String>,

    /// Output target: "stderr" (default) or "stdout".
    #[serde(default = "default_log_output")]
    pub output: String,
}

fn default_log_format() -> String {
    "plain".into()
}

fn default_log_output() -> String {
    "stderr".into()
}

/// Substitute `${ENV_VAR}` patterns in a string with their environment variable values.
fn substitute_env_vars(input: &str) -> String {
    let re = regex::Regex::new(r"\$\{([^}]+)\}").expect("static regex");
    re.replace_all(input, |caps: &regex::Captures| {
        let var_name = &caps[1];
        std::env::var(var_name).unwrap_or_default()
    })
    .into_owned()
}

impl Config {
    /// Load config from a JSON5 file, substituting `${ENV_VAR}` references.
    pub fn load(path: &Path) -> crate::error::Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let raw = std::fs::read_to_string(path).map_err(crate::error::RustySpriteError::Io)?;

        let substituted = substitute_env_vars(&raw);

        let config: Config = json5::from_str(&substituted)
            .map_err(|e| crate::error::RustySpriteError::Config(e.to_string()))?;

        Ok(config)
    }

    /// Default config file path.
    pub fn config_path() -> PathBuf {
        data_dir().join("config.json")
    }

    pub fn relay_bind(&self) -> String {
        self.relay
            .as_ref()
            .and_then(|r| r.bind.clone())
            .unwrap_or_else(|| "127.0.0.1".to_string())
    }

    pub fn relay_port(&self) -> u16 {
        self.relay.as_ref().map(|r| r.port).unwrap_or_else(default_port)
    }

    pub fn timeout_ms(&self) -> u64 {
        self.relay
            .as_ref()
            .map(|r| r.timeout_ms)
            .unwrap_or_else(default_timeout_ms)
    }

    pub fn host_stale_after_ms(&self) -> u64 {
        self.relay
            .as_ref()
            .map(|r| r.host_stale_after_ms)
            .unwrap_or_else(default_host_stale_after_ms)
    }

    pub fn max_script_bytes(&self) -> usize {
        self.relay
            .as_ref()
            .map(|r| r.max_script_bytes)
            .unwrap_or_else(default_max_script_bytes)
    }

    pub fn default_session(&self) -> String {
        self.relay
            .as_ref()
            .and_then(|r| r.default_session.clone())
            .unwrap_or_else(|| DEFAULT_SESSION.to_string())
    }

    /// Directory overriding the built-in reference documents, if configured.
    pub fn resources_dir(&self) -> Option<PathBuf> {
        self.resources
            .as_ref()
            .and_then(|r| r.dir.as_ref())
            .map(PathBuf::from)
    }

    /// Validate config, returning (warnings, errors).
    pub fn validate(&self) -> (Vec<String>, Vec<String>) {
        let mut warnings = Vec::new();
        let mut errors = Vec::new();

        if let Some(relay) = &self.relay {
            if relay.port == 0 {
                errors.push("Relay port cannot be 0".to_string());
            }
            if relay.timeout_ms == 0 {
                errors.push("Relay timeout_ms must be greater than 0".to_string());
            }
            if relay.max_script_bytes == 0 {
                errors.push("Relay max_script_bytes must be greater than 0".to_string());
            }
            if relay.host_stale_after_ms < 1_000 {
                warnings.push(format!(
                    "host_stale_after_ms of {} ms is shorter than a typical host poll interval",
                    relay.host_stale_after_ms
                ));
            }
            if relay.bind.as_deref().is_some_and(|b| b != "127.0.0.1" && b != "localhost") {
                warnings.push(
                    "Relay is bound to a non-loopback address; any client on the network can submit results"
                        .to_string(),
                );
            }
        }

        if let Some(dir) = self.resources_dir() {
            if !dir.is_dir() {
                errors.push(format!("Resources directory not found: {}", dir.display()));
            }
        }

        if let Some(logging) = &self.logging {
            if logging.format != "plain" && logging.format != "json" {
                warnings.push(format!(
                    "Unknown logging format '{}', falling back to plain",
                    logging.format
                ));
            }
        }

        (warnings, errors)
    }

    /// Save config to a file.
    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }
}

/// Base directory for Rusty Sprite data: `~/.rusty_sprite/`
pub fn data_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".rusty_sprite")
}
