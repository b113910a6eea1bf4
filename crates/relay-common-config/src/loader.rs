//! Configuration file loading and parsing.

use crate::types::RelayConfig;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use thiserror::Error;

/// Config file location relative to the project directory.
pub const CONFIG_FILE: &str = ".relay/config.yaml";

/// Config loading errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file not found: {path}")]
    NotFound { path: PathBuf },

    #[error("failed to read config: {source}")]
    ReadError {
        #[from]
        source: std::io::Error,
    },

    #[error("invalid YAML at line {}: {message}", line.map(|l| l.to_string()).unwrap_or_else(|| "unknown".to_string()))]
    ParseError { line: Option<usize>, message: String },

    #[error("validation error: {message}")]
    ValidationError { message: String },

    #[error("environment variable not found: {var}")]
    EnvVarNotFound { var: String },
}

/// Configuration loader.
pub struct ConfigLoader {
    base_path: PathBuf,
}

impl ConfigLoader {
    /// Create a loader for the given project directory.
    pub fn new(project_dir: impl AsRef<Path>) -> Self {
        Self {
            base_path: project_dir.as_ref().to_path_buf(),
        }
    }

    /// Path of the config file this loader reads.
    pub fn config_path(&self) -> PathBuf {
        self.base_path.join(CONFIG_FILE)
    }

    /// Load configuration from `.relay/config.yaml`, falling back to defaults.
    pub fn load(&self) -> Result<RelayConfig, ConfigError> {
        let config_path = self.config_path();

        if !config_path.exists() {
            return Ok(RelayConfig::default());
        }

        self.load_file(&config_path)
    }

    /// Load configuration from an explicit file, which must exist.
    pub fn load_file(&self, path: impl AsRef<Path>) -> Result<RelayConfig, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ConfigError::NotFound {
                path: path.to_path_buf(),
            });
        }

        let contents = std::fs::read_to_string(path)?;
        self.parse(&contents)
    }

    /// Parse configuration from YAML text.
    pub fn parse(&self, contents: &str) -> Result<RelayConfig, ConfigError> {
        let expanded = expand_env_vars(contents)?;

        let config: RelayConfig =
            serde_yaml::from_str(&expanded).map_err(|e| ConfigError::ParseError {
                line: e.location().map(|l| l.line()),
                message: e.to_string(),
            })?;

        validate(&config)?;
        Ok(config)
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new(std::env::current_dir().unwrap_or_default())
    }
}

fn env_var_pattern() -> &'static regex::Regex {
    static PATTERN: OnceLock<regex::Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        regex::Regex::new(r"\$\{([^}:]+)(?::-([^}]*))?\}").expect("env var pattern is valid")
    })
}

/// Expand environment variables in the form `${VAR}` or `${VAR:-default}`.
pub fn expand_env_vars(content: &str) -> Result<String, ConfigError> {
    let mut result = content.to_string();

    for cap in env_var_pattern().captures_iter(content) {
        let full_match = &cap[0];
        let var_name = &cap[1];
        let default = cap.get(2).map(|m| m.as_str());

        let value = match std::env::var(var_name) {
            Ok(v) => v,
            Err(_) => match default {
                Some(d) => d.to_string(),
                None => {
                    return Err(ConfigError::EnvVarNotFound {
                        var: var_name.to_string(),
                    })
                }
            },
        };

        result = result.replace(full_match, &value);
    }

    Ok(result)
}

fn validate(config: &RelayConfig) -> Result<(), ConfigError> {
    if config.http.request_timeout_secs == 0 {
        return Err(ConfigError::ValidationError {
            message: "http.request_timeout_secs must be greater than 0".to_string(),
        });
    }

    if config.http.connect_timeout_secs > config.http.request_timeout_secs {
        return Err(ConfigError::ValidationError {
            message: "http.connect_timeout_secs must not exceed http.request_timeout_secs"
                .to_string(),
        });
    }

    let base_url = config.api.base_url.trim();
    if !base_url.is_empty() && !(base_url.starts_with("http://") || base_url.starts_with("https://"))
    {
        return Err(ConfigError::ValidationError {
            message: format!("api.base_url must be an http(s) URL, got '{}'", base_url),
        });
    }

    Ok(())
}
