//! Transport requests built from endpoints.

use bytes::Bytes;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Method, Url};

use crate::endpoint::{Endpoint, HttpTask};

/// Common HTTP headers.
pub mod headers {
    pub const CONTENT_TYPE_JSON: &str = "application/json";
    pub const CONTENT_TYPE_FORM: &str = "application/x-www-form-urlencoded";
}

/// Request building errors.
#[derive(Debug, thiserror::Error)]
pub enum RequestError {
    #[error("invalid URL '{url}': {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("invalid header name '{0}'")]
    InvalidHeaderName(String),

    #[error("invalid value for header '{0}'")]
    InvalidHeaderValue(String),

    #[error("failed to encode request body: {0}")]
    Body(#[from] serde_json::Error),
}

/// A request ready to be handed to a [`Transport`](crate::Transport).
#[derive(Debug, Clone)]
pub struct TransportRequest {
    pub method: Method,
    pub url: Url,
    pub headers: HeaderMap,
    pub body: Option<Bytes>,
}

impl TransportRequest {
    /// Create a request with no headers and no body.
    pub fn new(method: Method, url: Url) -> Self {
        Self {
            method,
            url,
            headers: HeaderMap::new(),
            body: None,
        }
    }

    /// Build the request described by an endpoint.
    pub fn from_endpoint<E: Endpoint + ?Sized>(endpoint: &E) -> Result<Self, RequestError> {
        let url = join_url(endpoint.base_url(), &endpoint.path());
        let url = Url::parse(&url).map_err(|source| RequestError::InvalidUrl { url, source })?;
        let mut request = Self::new(endpoint.method(), url);

        match endpoint.task() {
            HttpTask::Plain => {}
            HttpTask::Json(body) => request.set_json(&body)?,
            HttpTask::Query(pairs) => request.append_query(&pairs),
            HttpTask::JsonAndQuery { body, query } => {
                request.append_query(&query);
                request.set_json(&body)?;
            }
            HttpTask::Form(pairs) => {
                let encoded = url::form_urlencoded::Serializer::new(String::new())
                    .extend_pairs(&pairs)
                    .finish();
                request.body = Some(Bytes::from(encoded));
                request.set_header(CONTENT_TYPE.as_str(), headers::CONTENT_TYPE_FORM)?;
            }
        }

        if let Some(extra) = endpoint.headers() {
            let mut extra: Vec<_> = extra.into_iter().collect();
            extra.sort_by_cached_key(|(name, _)| (name.to_ascii_lowercase(), name.clone()));
            for (name, value) in &extra {
                request.set_header(name, value)?;
            }
        }

        Ok(request)
    }

    /// Set (replace) a header.
    pub fn set_header(&mut self, name: &str, value: &str) -> Result<(), RequestError> {
        let header_name = HeaderName::try_from(name)
            .map_err(|_| RequestError::InvalidHeaderName(name.to_string()))?;
        let header_value = HeaderValue::try_from(value)
            .map_err(|_| RequestError::InvalidHeaderValue(name.to_string()))?;
        self.headers.insert(header_name, header_value);
        Ok(())
    }

    /// Add bearer token authorization.
    ///
    /// Tokens that are not valid header values are ignored, so this never
    /// fails; the server will answer 401 instead.
    pub fn bearer_auth(&mut self, token: &str) {
        if let Ok(mut value) = HeaderValue::try_from(format!("Bearer {}", token)) {
            value.set_sensitive(true);
            self.headers.insert(AUTHORIZATION, value);
        }
    }

    /// Value of a header as a string, if present and printable.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|value| value.to_str().ok())
    }

    fn set_json(&mut self, body: &serde_json::Value) -> Result<(), RequestError> {
        self.body = Some(Bytes::from(serde_json::to_vec(body)?));
        self.set_header(CONTENT_TYPE.as_str(), headers::CONTENT_TYPE_JSON)
    }

    fn append_query(&mut self, pairs: &[(String, String)]) {
        if pairs.is_empty() {
            return;
        }
        self.url.query_pairs_mut().extend_pairs(pairs);
    }
}

/// Join a base URL and a path with exactly one slash between them.
pub fn join_url(base: &str, path: &str) -> String {
    let base = base.trim_end_matches('/');
    if path.is_empty() {
        base.to_string()
    } else if path.starts_with('/') {
        format!("{}{}", base, path)
    } else {
        format!("{}/{}", base, path)
    }
}
