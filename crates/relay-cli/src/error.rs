//! CLI error type and exit codes.

use std::process::ExitCode;

use relay_common_config::{ConfigError, EnvError};
use relay_common_log::LogError;
use relay_http::TransportError;
use thiserror::Error;

use crate::tmdb::ApiStatus;

/// Application exit codes
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Exit {
    Success = 0,
    GeneralError = 1,
    ConfigError = 2,
    NetworkError = 4,
    AuthError = 5,
    ApiError = 6,
}

impl From<Exit> for ExitCode {
    fn from(exit: Exit) -> Self {
        ExitCode::from(exit as u8)
    }
}

/// Everything that can make a `relay` command fail.
///
/// Pipeline failures arrive through `From<relay_http::Error>`, so this type is
/// used directly as the controller's error type.
#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Env(#[from] EnvError),

    #[error(transparent)]
    Log(#[from] LogError),

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("could not reach the movie database")]
    Connection,

    #[error("not authenticated: set TMDB_ACCESS_TOKEN or api.access_token")]
    Authentication,

    #[error("unexpected response from the movie database: {0}")]
    Decoding(String),

    #[error("the movie database answered {status}: {message}")]
    Api { status: u16, message: String },

    #[error("failed to render output: {0}")]
    Output(#[from] serde_json::Error),

    #[error("{0}")]
    Other(String),
}

impl CliError {
    pub fn exit_code(&self) -> Exit {
        match self {
            Self::Config(_) | Self::Env(_) | Self::Log(_) => Exit::ConfigError,
            Self::Transport(_) | Self::Connection => Exit::NetworkError,
            Self::Authentication => Exit::AuthError,
            Self::Api { .. } | Self::Decoding(_) => Exit::ApiError,
            Self::Output(_) | Self::Other(_) => Exit::GeneralError,
        }
    }
}

impl From<relay_http::Error> for CliError {
    fn from(error: relay_http::Error) -> Self {
        match error {
            relay_http::Error::Connection => Self::Connection,
            relay_http::Error::Authentication => Self::Authentication,
            relay_http::Error::Decoding(detail) => Self::Decoding(detail),
            relay_http::Error::Server { status, payload } => {
                let message = serde_json::from_value::<ApiStatus>(payload.clone())
                    .map(|status| status.status_message)
                    .unwrap_or_else(|_| match payload {
                        serde_json::Value::Null => "no details".to_string(),
                        serde_json::Value::String(text) => text,
                        other => other.to_string(),
                    });
                Self::Api { status, message }
            }
            relay_http::Error::Unknown(detail) => Self::Other(detail),
        }
    }
}
