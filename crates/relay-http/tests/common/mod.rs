//! Test doubles shared by the integration suites.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use bytes::Bytes;
use relay_http::{
    AuthenticationState, Authenticator, BoxError, DateDecodingStrategy, Endpoint, HttpTask,
    JsonMapper, KeyDecodingStrategy, Method, StatusCode, Transport, TransportError,
    TransportRequest, TransportResponse,
};
use serde::Deserialize;

/// Transport that answers every request with the same canned outcome and
/// counts how often it was called.
pub struct CountingTransport {
    outcome: Outcome,
    calls: AtomicUsize,
    last_request: Mutex<Option<TransportRequest>>,
}

enum Outcome {
    Respond(StatusCode, &'static str),
    Fail(fn() -> TransportError),
}

impl CountingTransport {
    pub fn responding(status: u16, body: &'static str) -> Self {
        let status = StatusCode::from_u16(status).expect("valid status");
        Self::with_outcome(Outcome::Respond(status, body))
    }

    pub fn failing(error: fn() -> TransportError) -> Self {
        Self::with_outcome(Outcome::Fail(error))
    }

    fn with_outcome(outcome: Outcome) -> Self {
        Self {
            outcome,
            calls: AtomicUsize::new(0),
            last_request: Mutex::new(None),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_request(&self) -> Option<TransportRequest> {
        self.last_request.lock().unwrap().clone()
    }
}

#[async_trait]
impl Transport for CountingTransport {
    async fn send(&self, request: TransportRequest) -> Result<TransportResponse, TransportError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_request.lock().unwrap() = Some(request);
        match &self.outcome {
            Outcome::Respond(status, body) => Ok(TransportResponse::new(*status, *body)),
            Outcome::Fail(error) => Err(error()),
        }
    }
}

/// What [`FakeAuthenticator::ensure_authenticated`] does.
#[derive(Clone, Copy)]
pub enum Ensure {
    Succeed,
    Refuse,
    Fail,
}

#[derive(Debug, thiserror::Error)]
#[error("refresh token expired")]
pub struct RefreshFailed;

pub struct FakeAuthenticator {
    state: AuthenticationState,
    ensure: Ensure,
    ensure_calls: AtomicUsize,
}

impl FakeAuthenticator {
    pub fn new(state: AuthenticationState, ensure: Ensure) -> Self {
        Self {
            state,
            ensure,
            ensure_calls: AtomicUsize::new(0),
        }
    }

    pub fn ensure_calls(&self) -> usize {
        self.ensure_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Authenticator for FakeAuthenticator {
    fn state(&self) -> AuthenticationState {
        self.state
    }

    async fn ensure_authenticated(&self) -> Result<bool, BoxError> {
        self.ensure_calls.fetch_add(1, Ordering::SeqCst);
        match self.ensure {
            Ensure::Succeed => Ok(true),
            Ensure::Refuse => Ok(false),
            Ensure::Fail => Err(Box::new(RefreshFailed)),
        }
    }

    fn map_request(&self, request: &mut TransportRequest) {
        request
            .set_header("x-session", "fake-session")
            .expect("valid header");
    }
}

/// `GET /movie/{id}` with optional sample data.
#[derive(Clone)]
pub struct MovieEndpoint {
    pub base_url: String,
    pub id: u64,
    pub sample: Option<&'static str>,
    pub dates: DateDecodingStrategy,
    pub keys: KeyDecodingStrategy,
}

impl MovieEndpoint {
    pub fn new(id: u64) -> Self {
        Self {
            base_url: "https://api.example.com/3".to_string(),
            id,
            sample: None,
            dates: DateDecodingStrategy::Iso8601,
            keys: KeyDecodingStrategy::UseDefaultKeys,
        }
    }

    pub fn with_sample(mut self, sample: &'static str) -> Self {
        self.sample = Some(sample);
        self
    }
}

impl Endpoint for MovieEndpoint {
    fn base_url(&self) -> &str {
        &self.base_url
    }

    fn path(&self) -> String {
        format!("/movie/{}", self.id)
    }

    fn method(&self) -> Method {
        Method::GET
    }

    fn task(&self) -> HttpTask {
        HttpTask::Plain
    }

    fn key_decoding_strategy(&self) -> KeyDecodingStrategy {
        self.keys.clone()
    }

    fn date_decoding_strategy(&self) -> DateDecodingStrategy {
        self.dates.clone()
    }

    fn sample_data(&self) -> Option<Bytes> {
        self.sample.map(|body| Bytes::from_static(body.as_bytes()))
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct Movie {
    pub id: u64,
    pub title: String,
}

impl JsonMapper for Movie {}
