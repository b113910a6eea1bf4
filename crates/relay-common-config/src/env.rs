//! Environment variable handling.

use crate::types::{Environment, RelayConfig};
use std::env;
use thiserror::Error;

/// Environment variable errors.
#[derive(Debug, Error)]
pub enum EnvError {
    #[error("invalid value for {var}: {message}")]
    InvalidValue { var: String, message: String },

    #[error("failed to load .env file: {0}")]
    DotenvError(#[from] dotenvy::Error),
}

/// Environment variable names.
pub mod vars {
    // Pipeline
    pub const RELAY_ENVIRONMENT: &str = "RELAY_ENVIRONMENT";
    pub const RELAY_STUB_DELAY_MS: &str = "RELAY_STUB_DELAY_MS";

    // Configuration
    pub const RELAY_CONFIG_PATH: &str = "RELAY_CONFIG_PATH";
    pub const RELAY_LOG_LEVEL: &str = "RELAY_LOG_LEVEL";

    // Remote API
    pub const TMDB_BASE_URL: &str = "TMDB_BASE_URL";
    pub const TMDB_ACCESS_TOKEN: &str = "TMDB_ACCESS_TOKEN";

    // Development
    pub const RUST_LOG: &str = "RUST_LOG";
}

/// Access to process environment variables.
pub struct Env {
    _guard: (),
}

impl Env {
    /// Initialize the environment from `.env` files.
    pub fn init() -> Result<Self, EnvError> {
        // Later files override earlier ones
        let _ = dotenvy::from_filename(".env");
        let _ = dotenvy::from_filename(".env.local");

        if let Ok(environment) = env::var(vars::RELAY_ENVIRONMENT) {
            let _ = dotenvy::from_filename(format!(".env.{}", environment.to_lowercase()));
        }

        Ok(Self { _guard: () })
    }

    /// Get an optional string variable.
    pub fn get(var: &str) -> Option<String> {
        env::var(var).ok()
    }

    /// Get an integer variable.
    pub fn get_int<T: std::str::FromStr>(var: &str) -> Result<Option<T>, EnvError> {
        match env::var(var) {
            Ok(v) => v.trim().parse().map(Some).map_err(|_| EnvError::InvalidValue {
                var: var.to_string(),
                message: "expected integer".to_string(),
            }),
            Err(_) => Ok(None),
        }
    }

    /// Pipeline environment selected through `RELAY_ENVIRONMENT`, if any.
    pub fn environment() -> Result<Option<Environment>, EnvError> {
        match env::var(vars::RELAY_ENVIRONMENT) {
            Ok(v) => v
                .parse::<Environment>()
                .map(Some)
                .map_err(|e| EnvError::InvalidValue {
                    var: vars::RELAY_ENVIRONMENT.to_string(),
                    message: e.to_string(),
                }),
            Err(_) => Ok(None),
        }
    }

    /// Apply environment variable overrides on top of a loaded configuration.
    pub fn apply_overrides(config: &mut RelayConfig) -> Result<(), EnvError> {
        if let Some(environment) = Self::environment()? {
            config.pipeline.environment = environment;
        }

        if let Some(delay) = Self::get_int::<u64>(vars::RELAY_STUB_DELAY_MS)? {
            config.pipeline.stub_delay_ms = delay;
        }

        if let Some(base_url) = Self::get(vars::TMDB_BASE_URL) {
            config.api.base_url = base_url;
        }

        if let Some(token) = Self::get(vars::TMDB_ACCESS_TOKEN) {
            config.api.access_token = token.into();
        }

        Ok(())
    }
}
