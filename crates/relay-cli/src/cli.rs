//! CLI argument definitions using clap derive macros.

use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand, ValueHint};
use relay_common_config::{vars, ConfigLoader, Env, Environment, RelayConfig};
use relay_common_log::{LogConfig, LogLevel};
use relay_http::Controller;
use serde::Serialize;
use std::fmt::Display;

use crate::error::CliError;
use crate::tmdb::{MovieDetails, MoviePage, TmdbEndpoint};

/// relay - query The Movie Database from the command line
#[derive(Debug, Parser)]
#[command(
    name = "relay",
    author,
    version,
    about,
    long_about = None,
    propagate_version = true,
    arg_required_else_help = true
)]
pub struct Cli {
    /// Increase verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Path to configuration file
    #[arg(
        short,
        long,
        global = true,
        env = vars::RELAY_CONFIG_PATH,
        value_hint = ValueHint::FilePath
    )]
    pub config: Option<PathBuf>,

    /// Runtime environment (live, preview, test). Non-live environments
    /// answer from bundled sample data.
    #[arg(short, long, global = true)]
    pub environment: Option<Environment>,

    /// Output format
    #[arg(long, global = true, default_value = "text", value_enum)]
    pub format: OutputFormat,

    #[command(subcommand)]
    pub command: Command,
}

/// Output format selection
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Available subcommands
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Show details of one movie
    Movie {
        /// TMDB movie id
        id: u64,
    },

    /// Search movies by title
    Search {
        query: String,

        /// Result page, starting at 1
        #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..))]
        page: u32,
    },
}

impl Cli {
    /// Logging config: `RELAY_LOG_*` variables, overridden by `-v`/`-q`.
    ///
    /// Without a level in `RELAY_LOG_LEVEL` or `RUST_LOG`, only warnings are
    /// shown.
    pub fn log_config(&self) -> LogConfig {
        let mut config = LogConfig::from_env();
        let level_from_env = Env::get(vars::RELAY_LOG_LEVEL)
            .or_else(|| Env::get(vars::RUST_LOG))
            .is_some();
        if self.verbose > 0 || self.quiet || !level_from_env {
            config.level = LogLevel::from_verbosity(self.verbose, self.quiet);
        }
        config
    }

    /// Load `.relay/config.yaml` (or `--config`), then apply environment
    /// variables and finally command line flags.
    pub fn load_config(&self) -> Result<RelayConfig, CliError> {
        Env::init()?;

        let loader = ConfigLoader::default();
        let mut config = match &self.config {
            Some(path) => loader.load_file(path)?,
            None => loader.load()?,
        };

        Env::apply_overrides(&mut config)?;
        if let Some(environment) = self.environment {
            config.pipeline.environment = environment;
        }

        tracing::debug!(
            environment = %config.pipeline.environment,
            base_url = %config.api.base_url,
            "configuration loaded"
        );
        Ok(config)
    }

    pub async fn execute(self, config: RelayConfig) -> Result<(), CliError> {
        let controller: Controller<TmdbEndpoint, CliError> = Controller::from_config(&config)?;
        let base_url = config.api.base_url.as_str();

        match self.command {
            Command::Movie { id } => {
                let movie: MovieDetails = controller
                    .request(&TmdbEndpoint::movie(base_url, id))
                    .await?;
                print(&movie, self.format)
            }
            Command::Search { query, page } => {
                let results: MoviePage = controller
                    .request(&TmdbEndpoint::search(base_url, query, page))
                    .await?;
                print(&results, self.format)
            }
        }
    }
}

fn print<T>(value: &T, format: OutputFormat) -> Result<(), CliError>
where
    T: Serialize + Display,
{
    match format {
        OutputFormat::Text => println!("{}", value),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(value)?),
    }
    Ok(())
}
