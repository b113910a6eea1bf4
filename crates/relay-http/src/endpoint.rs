//! Declarative description of one API call.

use bytes::Bytes;
use reqwest::Method;
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;

use crate::decode::{DateDecodingStrategy, KeyDecodingStrategy};

/// How request data is encoded into the body and query string.
#[derive(Debug, Clone, PartialEq)]
pub enum HttpTask {
    /// No body, no query parameters.
    Plain,
    /// JSON body.
    Json(Value),
    /// URL query parameters.
    Query(Vec<(String, String)>),
    /// JSON body plus URL query parameters.
    JsonAndQuery {
        body: Value,
        query: Vec<(String, String)>,
    },
    /// `application/x-www-form-urlencoded` body.
    Form(Vec<(String, String)>),
}

impl HttpTask {
    /// JSON body from any serializable value.
    pub fn json<T: Serialize + ?Sized>(body: &T) -> Result<Self, serde_json::Error> {
        serde_json::to_value(body).map(Self::Json)
    }

    /// Query parameters from key/value pairs.
    pub fn query<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self::Query(collect_pairs(pairs))
    }

    /// Form body from key/value pairs.
    pub fn form<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self::Form(collect_pairs(pairs))
    }
}

fn collect_pairs<I, K, V>(pairs: I) -> Vec<(String, String)>
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<String>,
{
    pairs
        .into_iter()
        .map(|(key, value)| (key.into(), value.into()))
        .collect()
}

/// Everything the pipeline needs to know about one API call.
///
/// Implementors are usually an enum with one variant per route. Only the
/// location, method and encoding are required; everything else has a default.
///
/// ```rust
/// use relay_http::{Endpoint, HttpTask, Method};
///
/// enum Movies {
///     Details { id: u64 },
///     Search { query: String },
/// }
///
/// impl Endpoint for Movies {
///     fn base_url(&self) -> &str {
///         "https://api.themoviedb.org/3"
///     }
///
///     fn path(&self) -> String {
///         match self {
///             Movies::Details { id } => format!("/movie/{id}"),
///             Movies::Search { .. } => "/search/movie".to_string(),
///         }
///     }
///
///     fn method(&self) -> Method {
///         Method::GET
///     }
///
///     fn task(&self) -> HttpTask {
///         match self {
///             Movies::Details { .. } => HttpTask::Plain,
///             Movies::Search { query } => HttpTask::query([("query", query.as_str())]),
///         }
///     }
/// }
/// ```
pub trait Endpoint: Send + Sync {
    /// Root of the API, e.g. `https://api.themoviedb.org/3`.
    fn base_url(&self) -> &str;

    /// Path appended to [`base_url`](Self::base_url).
    fn path(&self) -> String;

    fn method(&self) -> Method;

    /// Body and query encoding.
    fn task(&self) -> HttpTask;

    /// Extra request headers. Applied after the encoding's `Content-Type`,
    /// so they can override it.
    ///
    /// Names are case-insensitive. When several entries differ only in case,
    /// they are applied in byte order and the last one wins, so
    /// `content-type` beats `Content-Type`.
    fn headers(&self) -> Option<HashMap<String, String>> {
        None
    }

    fn key_decoding_strategy(&self) -> KeyDecodingStrategy {
        KeyDecodingStrategy::UseDefaultKeys
    }

    fn date_decoding_strategy(&self) -> DateDecodingStrategy {
        DateDecodingStrategy::Iso8601
    }

    /// Canned response body used outside the live environment.
    fn sample_data(&self) -> Option<Bytes> {
        None
    }

    /// Whether this endpoint answers from [`sample_data`](Self::sample_data)
    /// when the pipeline is not live.
    fn should_use_sample_data(&self) -> bool {
        self.sample_data().is_some()
    }

    /// Log request and response details at debug level.
    fn should_log(&self) -> bool {
        true
    }
}
