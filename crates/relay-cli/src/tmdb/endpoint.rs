use std::collections::HashMap;

use bytes::Bytes;
use relay_http::{DateDecodingStrategy, Endpoint, HttpTask, KeyDecodingStrategy, Method};

/// Used when no base URL is configured.
pub const DEFAULT_BASE_URL: &str = "https://api.themoviedb.org/3";

const MOVIE_SAMPLE: &[u8] = include_bytes!("../../samples/movie.json");
const SEARCH_SAMPLE: &[u8] = include_bytes!("../../samples/search.json");

#[derive(Debug, Clone, PartialEq)]
pub enum Route {
    /// `GET /movie/{id}`
    Movie { id: u64 },
    /// `GET /search/movie?query=..&page=..`
    SearchMovies { query: String, page: u32 },
}

/// A TMDB route bound to a base URL.
#[derive(Debug, Clone)]
pub struct TmdbEndpoint {
    base_url: String,
    route: Route,
}

impl TmdbEndpoint {
    pub fn new(base_url: impl Into<String>, route: Route) -> Self {
        let base_url = base_url.into();
        let base_url = if base_url.trim().is_empty() {
            DEFAULT_BASE_URL.to_string()
        } else {
            base_url
        };
        Self { base_url, route }
    }

    pub fn movie(base_url: impl Into<String>, id: u64) -> Self {
        Self::new(base_url, Route::Movie { id })
    }

    pub fn search(base_url: impl Into<String>, query: impl Into<String>, page: u32) -> Self {
        Self::new(
            base_url,
            Route::SearchMovies {
                query: query.into(),
                page,
            },
        )
    }

    pub fn route(&self) -> &Route {
        &self.route
    }
}

impl Endpoint for TmdbEndpoint {
    fn base_url(&self) -> &str {
        &self.base_url
    }

    fn path(&self) -> String {
        match &self.route {
            Route::Movie { id } => format!("/movie/{}", id),
            Route::SearchMovies { .. } => "/search/movie".to_string(),
        }
    }

    fn method(&self) -> Method {
        Method::GET
    }

    fn task(&self) -> HttpTask {
        match &self.route {
            Route::Movie { .. } => HttpTask::Plain,
            Route::SearchMovies { query, page } => HttpTask::query([
                ("query", query.clone()),
                ("page", page.to_string()),
            ]),
        }
    }

    fn headers(&self) -> Option<HashMap<String, String>> {
        Some(HashMap::from([(
            "Accept".to_string(),
            "application/json".to_string(),
        )]))
    }

    fn key_decoding_strategy(&self) -> KeyDecodingStrategy {
        KeyDecodingStrategy::ConvertFromSnakeCase
    }

    // TMDB sends calendar dates ("1999-10-15").
    fn date_decoding_strategy(&self) -> DateDecodingStrategy {
        DateDecodingStrategy::Formatted("%Y-%m-%d".to_string())
    }

    fn sample_data(&self) -> Option<Bytes> {
        let sample = match self.route {
            Route::Movie { .. } => MOVIE_SAMPLE,
            Route::SearchMovies { .. } => SEARCH_SAMPLE,
        };
        Some(Bytes::from_static(sample))
    }
}
