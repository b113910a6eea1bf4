//! Debug logging of requests and responses.

use reqwest::header::HeaderMap;
use relay_common_secret::Redactor;

use crate::request::TransportRequest;
use crate::response::TransportResponse;

pub(crate) fn log_request(request: &TransportRequest) {
    if !tracing::enabled!(tracing::Level::DEBUG) {
        return;
    }

    tracing::debug!(
        method = %request.method,
        url = %Redactor::url(request.url.as_str()),
        headers = %render_headers(&request.headers),
        body = %request.body.as_deref().map(render_body).unwrap_or_default(),
        "sending request"
    );
}

pub(crate) fn log_response(response: &TransportResponse) {
    if !tracing::enabled!(tracing::Level::DEBUG) {
        return;
    }

    tracing::debug!(
        status = response.status.as_u16(),
        group = %response.status_group(),
        headers = %render_headers(&response.headers),
        body = %render_body(&response.body),
        "received response"
    );
}

fn render_headers(headers: &HeaderMap) -> String {
    headers
        .iter()
        .map(|(name, value)| {
            let value = value.to_str().unwrap_or("<binary>");
            format!("{}: {}", name, Redactor::header_value(name.as_str(), value))
        })
        .collect::<Vec<_>>()
        .join(", ")
}

/// Pretty-printed JSON when the body parses, lossy text otherwise.
fn render_body(body: &[u8]) -> String {
    serde_json::from_slice::<serde_json::Value>(body)
        .ok()
        .and_then(|value| serde_json::to_string_pretty(&value).ok())
        .unwrap_or_else(|| String::from_utf8_lossy(body).into_owned())
}
