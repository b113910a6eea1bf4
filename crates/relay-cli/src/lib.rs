//! `relay` command line client.
//!
//! A small client for The Movie Database built on `relay-http`. In the
//! `preview` and `test` environments every command answers from bundled
//! sample responses, so it runs without network access or credentials.

pub mod cli;
pub mod error;
pub mod tmdb;

pub use cli::{Cli, Command, OutputFormat};
pub use error::{CliError, Exit};
