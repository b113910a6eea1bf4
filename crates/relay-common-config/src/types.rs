//! Configuration types.

use relay_common_secret::SecretString;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Root configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RelayConfig {
    /// Request pipeline behaviour.
    pub pipeline: PipelineConfig,
    /// Live transport settings.
    pub http: HttpSettings,
    /// Remote API the CLI talks to.
    pub api: ApiConfig,
}

/// Runtime environment of the request pipeline.
///
/// Anything other than [`Environment::Live`] allows endpoints to answer from
/// their canned sample data instead of the network.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Environment {
    /// Real network traffic.
    #[default]
    Live,
    /// Canned data with simulated latency.
    Preview,
    /// Canned data, no delay.
    Test,
}

impl Environment {
    /// Whether requests go to the network unconditionally.
    pub fn is_live(self) -> bool {
        matches!(self, Self::Live)
    }

    /// Lowercase name as used in config files and environment variables.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Live => "live",
            Self::Preview => "preview",
            Self::Test => "test",
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when an environment name is not recognised.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown environment '{0}' (expected live, preview or test)")]
pub struct ParseEnvironmentError(pub String);

impl FromStr for Environment {
    type Err = ParseEnvironmentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "live" | "production" => Ok(Self::Live),
            "preview" => Ok(Self::Preview),
            "test" => Ok(Self::Test),
            other => Err(ParseEnvironmentError(other.to_string())),
        }
    }
}

/// Request pipeline configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Environment the pipeline runs in.
    pub environment: Environment,
    /// Simulated latency for canned responses in preview (ms).
    pub stub_delay_ms: u64,
}

impl PipelineConfig {
    /// Stub delay as a [`Duration`].
    pub fn stub_delay(&self) -> Duration {
        Duration::from_millis(self.stub_delay_ms)
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            environment: Environment::Live,
            stub_delay_ms: 1000,
        }
    }
}

/// Live HTTP transport settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpSettings {
    /// Connection timeout (seconds).
    pub connect_timeout_secs: u64,
    /// Whole-request timeout (seconds).
    pub request_timeout_secs: u64,
    /// User agent sent with every request.
    pub user_agent: String,
    /// Maximum idle connections kept per host.
    pub pool_max_idle_per_host: usize,
    /// Accept gzip-compressed responses.
    pub gzip: bool,
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            connect_timeout_secs: 10,
            request_timeout_secs: 30,
            user_agent: format!("relay/{}", env!("CARGO_PKG_VERSION")),
            pool_max_idle_per_host: 10,
            gzip: true,
        }
    }
}

/// Remote API settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Base URL of the API, e.g. `https://api.themoviedb.org/3`.
    pub base_url: String,
    /// Bearer token sent with authenticated requests.
    pub access_token: SecretString,
}
