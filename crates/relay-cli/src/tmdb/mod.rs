//! The Movie Database (TMDB) API, described as relay endpoints.

mod endpoint;
mod models;

pub use endpoint::{Route, TmdbEndpoint, DEFAULT_BASE_URL};
pub use models::{ApiStatus, Genre, MovieDetails, MoviePage, MovieSummary};
