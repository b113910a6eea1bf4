//! Raw transport responses and their classification.

use bytes::Bytes;
use reqwest::header::HeaderMap;
use reqwest::StatusCode;
use serde_json::Value;

use crate::error::Error;
use crate::status::StatusGroup;

/// What a [`Transport`](crate::Transport) hands back: status, headers, body.
#[derive(Debug, Clone)]
pub struct TransportResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl TransportResponse {
    pub fn new(status: StatusCode, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            headers: HeaderMap::new(),
            body: body.into(),
        }
    }

    /// Synthetic `200 OK` carrying canned bytes.
    pub fn stub(body: Bytes) -> Self {
        Self::new(StatusCode::OK, body)
    }

    pub fn status_group(&self) -> StatusGroup {
        StatusGroup::from(self.status)
    }

    /// Server error built from a non-success response.
    pub fn classified_error(&self) -> Error {
        Error::Server {
            status: self.status.as_u16(),
            payload: error_payload(&self.body),
        }
    }
}

/// Body of an error response: JSON when it parses, otherwise the text as a
/// JSON string, `null` when empty.
pub fn error_payload(body: &[u8]) -> Value {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Value::Null;
    }
    serde_json::from_slice(body)
        .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(body).into_owned()))
}
