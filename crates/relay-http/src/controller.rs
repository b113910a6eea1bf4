//! The request pipeline.
//!
//! A [`Controller`] turns an [`Endpoint`] into a decoded model or a single
//! classified [`Error`]. One run goes through these steps, stopping at the
//! first failure:
//!
//! 1. Outside the live environment, endpoints with sample data answer from it
//!    (after the stub delay in preview) and skip straight to classification.
//! 2. The authenticator's state is checked without I/O.
//! 3. The authenticator makes sure credentials are valid.
//! 4. The request is built, passed to the authenticator, and sent.
//! 5. Non-2xx responses become [`Error::Server`].
//! 6. The body is decoded with the endpoint's strategies.

use std::marker::PhantomData;
use std::sync::Arc;
use std::time::Duration;

use relay_common_config::{Environment, PipelineConfig, RelayConfig};
use relay_common_log::spans::{
    instrument_future, record_outcome, request_span, transport_span, Timer,
};
use relay_common_secret::Redactor;
use tokio::task::JoinHandle;

use crate::auth::{AuthenticationState, Authenticator, BearerAuthenticator};
use crate::client::{HttpConfig, ReqwestTransport, Transport, TransportError};
use crate::decode::{decode, DecodableJson};
use crate::endpoint::Endpoint;
use crate::error::Error;
use crate::logging::{log_request, log_response};
use crate::request::TransportRequest;
use crate::response::TransportResponse;

/// Executes endpoints of type `E`, reporting failures as `F`.
///
/// `F` defaults to [`Error`]; any type convertible from it can be used so
/// that callers get their own error type from [`request`](Self::request)
/// and [`request_with`](Self::request_with).
///
/// ```rust,no_run
/// # use std::sync::Arc;
/// # use relay_http::{Controller, Endpoint, HttpTask, Method, ReqwestTransport};
/// # struct Popular;
/// # impl Endpoint for Popular {
/// #     fn base_url(&self) -> &str { "https://api.themoviedb.org/3" }
/// #     fn path(&self) -> String { "/movie/popular".into() }
/// #     fn method(&self) -> Method { Method::GET }
/// #     fn task(&self) -> HttpTask { HttpTask::Plain }
/// # }
/// # async fn run() -> Result<(), Box<dyn std::error::Error>> {
/// let controller: Controller<Popular> = Controller::new(Arc::new(ReqwestTransport::new()?));
/// let page: serde_json::Value = controller.request(&Popular).await?;
/// # Ok(())
/// # }
/// ```
pub struct Controller<E, F = Error> {
    transport: Arc<dyn Transport>,
    authenticator: Option<Arc<dyn Authenticator>>,
    environment: Environment,
    stub_delay: Duration,
    _marker: PhantomData<fn(&E) -> F>,
}

impl<E, F> Clone for Controller<E, F> {
    fn clone(&self) -> Self {
        Self {
            transport: Arc::clone(&self.transport),
            authenticator: self.authenticator.clone(),
            environment: self.environment,
            stub_delay: self.stub_delay,
            _marker: PhantomData,
        }
    }
}

impl<E, F> Controller<E, F> {
    /// Live controller without an authenticator.
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        let defaults = PipelineConfig::default();
        Self {
            transport,
            authenticator: None,
            environment: defaults.environment,
            stub_delay: defaults.stub_delay(),
            _marker: PhantomData,
        }
    }

    /// Controller backed by reqwest, configured from a [`RelayConfig`].
    ///
    /// `api.access_token` always backs a [`BearerAuthenticator`]. A blank
    /// token fails live runs with [`Error::Authentication`] before anything
    /// is sent; sample data runs never consult it.
    pub fn from_config(config: &RelayConfig) -> Result<Self, TransportError> {
        let transport = ReqwestTransport::with_config(&HttpConfig::from(&config.http))?;
        let authenticator = BearerAuthenticator::new(config.api.access_token.clone());

        Ok(Self::new(Arc::new(transport))
            .with_environment(config.pipeline.environment)
            .with_stub_delay(config.pipeline.stub_delay())
            .with_authenticator(Arc::new(authenticator)))
    }

    pub fn with_authenticator(mut self, authenticator: Arc<dyn Authenticator>) -> Self {
        self.authenticator = Some(authenticator);
        self
    }

    pub fn with_environment(mut self, environment: Environment) -> Self {
        self.environment = environment;
        self
    }

    /// Delay applied to sample data responses in [`Environment::Preview`].
    pub fn with_stub_delay(mut self, delay: Duration) -> Self {
        self.stub_delay = delay;
        self
    }

    pub fn environment(&self) -> Environment {
        self.environment
    }

    pub fn stub_delay(&self) -> Duration {
        self.stub_delay
    }
}

impl<E, F> Controller<E, F>
where
    E: Endpoint,
    F: From<Error>,
{
    /// Run the pipeline once.
    pub async fn execute<T: DecodableJson>(&self, endpoint: &E) -> Result<T, Error> {
        let span = request_span(endpoint.method().as_str(), &endpoint.path());

        instrument_future(
            async {
                let timer = Timer::start("request");
                let result = self.run(endpoint).await;
                match &result {
                    Ok(_) => record_outcome("success"),
                    Err(error) => {
                        record_outcome(error.kind());
                        tracing::debug!(error = %error, "request failed");
                    }
                }
                timer.finish();
                result
            },
            span,
        )
        .await
    }

    /// Run the pipeline once, reporting failures as `F`.
    pub async fn request<T: DecodableJson>(&self, endpoint: &E) -> Result<T, F> {
        self.execute(endpoint).await.map_err(F::from)
    }

    /// Run the pipeline on the tokio runtime and hand the result to
    /// `completion`.
    ///
    /// `completion` is called exactly once, unless the returned task is
    /// aborted first, in which case it is never called.
    pub fn request_with<T, C>(&self, endpoint: E, completion: C) -> JoinHandle<()>
    where
        E: 'static,
        F: Send + 'static,
        T: DecodableJson,
        C: FnOnce(Result<T, F>) + Send + 'static,
    {
        let controller = self.clone();
        tokio::spawn(async move {
            let result = controller.request(&endpoint).await;
            completion(result);
        })
    }

    fn uses_sample_data(&self, endpoint: &E) -> bool {
        !self.environment.is_live() && endpoint.should_use_sample_data()
    }

    async fn run<T: DecodableJson>(&self, endpoint: &E) -> Result<T, Error> {
        let response = if self.uses_sample_data(endpoint) {
            self.sample_response(endpoint).await
        } else {
            self.send(endpoint).await?
        };

        handle_response(endpoint, response)
    }

    async fn sample_response(&self, endpoint: &E) -> TransportResponse {
        if self.environment == Environment::Preview && !self.stub_delay.is_zero() {
            tokio::time::sleep(self.stub_delay).await;
        }
        tracing::debug!(environment = %self.environment, "answering from sample data");
        TransportResponse::stub(endpoint.sample_data().unwrap_or_default())
    }

    async fn send(&self, endpoint: &E) -> Result<TransportResponse, Error> {
        if let Some(authenticator) = &self.authenticator {
            match authenticator.state() {
                AuthenticationState::Reachable => {}
                AuthenticationState::NotReachable => return Err(Error::Connection),
                AuthenticationState::NotLoggedIn => return Err(Error::Authentication),
            }

            match authenticator.ensure_authenticated().await {
                Ok(true) => {}
                Ok(false) => return Err(Error::Authentication),
                Err(error) => {
                    tracing::debug!(error = %error, "credential refresh failed");
                    return Err(Error::Connection);
                }
            }
        }

        let mut request = TransportRequest::from_endpoint(endpoint)?;
        if let Some(authenticator) = &self.authenticator {
            authenticator.map_request(&mut request);
        }

        if endpoint.should_log() {
            log_request(&request);
        }
        let span = transport_span(request.method.as_str(), &Redactor::url(request.url.as_str()));
        let response = instrument_future(self.transport.send(request), span).await?;
        if endpoint.should_log() {
            log_response(&response);
        }

        Ok(response)
    }
}

fn handle_response<E, T>(endpoint: &E, response: TransportResponse) -> Result<T, Error>
where
    E: Endpoint + ?Sized,
    T: DecodableJson,
{
    if !response.status_group().is_success() {
        return Err(response.classified_error());
    }

    decode(
        &response.body,
        &endpoint.date_decoding_strategy(),
        &endpoint.key_decoding_strategy(),
    )
    .map_err(Error::from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::endpoint::HttpTask;
    use async_trait::async_trait;
    use bytes::Bytes;
    use reqwest::{Method, StatusCode};
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Fixed {
        status: StatusCode,
        body: &'static str,
        calls: AtomicUsize,
    }

    impl Fixed {
        fn new(status: StatusCode, body: &'static str) -> Arc<Self> {
            Arc::new(Self {
                status,
                body,
                calls: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl Transport for Fixed {
        async fn send(
            &self,
            _request: TransportRequest,
        ) -> Result<TransportResponse, TransportError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(TransportResponse::new(self.status, self.body))
        }
    }

    struct Status {
        sample: Option<&'static str>,
    }

    impl Endpoint for Status {
        fn base_url(&self) -> &str {
            "https://api.example.com"
        }

        fn path(&self) -> String {
            "/status".to_string()
        }

        fn method(&self) -> Method {
            Method::GET
        }

        fn task(&self) -> HttpTask {
            HttpTask::Plain
        }

        fn sample_data(&self) -> Option<Bytes> {
            self.sample.map(|body| Bytes::from_static(body.as_bytes()))
        }
    }

    #[derive(Debug, PartialEq)]
    struct AppError(String);

    impl From<Error> for AppError {
        fn from(error: Error) -> Self {
            AppError(error.kind().to_string())
        }
    }

    #[test]
    fn test_defaults() {
        let controller: Controller<Status> = Controller::new(Fixed::new(StatusCode::OK, "{}"));
        assert_eq!(controller.environment(), Environment::Live);
        assert_eq!(controller.stub_delay(), Duration::from_millis(1000));
    }

    #[test]
    fn test_from_config_installs_bearer_authenticator() {
        let mut config = RelayConfig::default();
        let controller: Controller<Status> = Controller::from_config(&config).unwrap();
        let state = controller.authenticator.as_ref().map(|auth| auth.state());
        assert_eq!(state, Some(AuthenticationState::NotLoggedIn));

        config.api.access_token = "abc".into();
        config.pipeline.environment = Environment::Test;
        let controller: Controller<Status> = Controller::from_config(&config).unwrap();
        let state = controller.authenticator.as_ref().map(|auth| auth.state());
        assert_eq!(state, Some(AuthenticationState::Reachable));
        assert_eq!(controller.environment(), Environment::Test);
    }

    #[tokio::test]
    async fn test_from_config_blank_token_fails_before_sending() {
        let transport = Fixed::new(StatusCode::OK, r#""live""#);
        let mut controller: Controller<Status> =
            Controller::from_config(&RelayConfig::default()).unwrap();
        controller.transport = transport.clone();

        let result: Result<String, Error> = controller.execute(&Status { sample: None }).await;
        assert!(matches!(result, Err(Error::Authentication)));
        assert_eq!(transport.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_from_config_blank_token_still_serves_sample_data() {
        let mut config = RelayConfig::default();
        config.pipeline.environment = Environment::Test;
        let transport = Fixed::new(StatusCode::OK, r#""live""#);
        let mut controller: Controller<Status> = Controller::from_config(&config).unwrap();
        controller.transport = transport.clone();

        let value: String = controller
            .execute(&Status { sample: Some(r#""canned""#) })
            .await
            .unwrap();
        assert_eq!(value, "canned");
        assert_eq!(transport.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_live_ignores_sample_data() {
        let transport = Fixed::new(StatusCode::OK, r#""live""#);
        let controller: Controller<Status> = Controller::new(transport.clone());

        let value: String = controller
            .execute(&Status { sample: Some(r#""canned""#) })
            .await
            .unwrap();
        assert_eq!(value, "live");
        assert_eq!(transport.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_test_environment_uses_sample_data() {
        let transport = Fixed::new(StatusCode::OK, r#""live""#);
        let controller: Controller<Status> =
            Controller::new(transport.clone()).with_environment(Environment::Test);

        let value: String = controller
            .execute(&Status { sample: Some(r#""canned""#) })
            .await
            .unwrap();
        assert_eq!(value, "canned");
        assert_eq!(transport.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_endpoint_without_sample_data_goes_live() {
        let transport = Fixed::new(StatusCode::OK, r#""live""#);
        let controller: Controller<Status> =
            Controller::new(transport.clone()).with_environment(Environment::Test);

        let value: String = controller.execute(&Status { sample: None }).await.unwrap();
        assert_eq!(value, "live");
        assert_eq!(transport.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_request_converts_error_type() {
        let controller: Controller<Status, AppError> =
            Controller::new(Fixed::new(StatusCode::NOT_FOUND, "missing"));

        let result: Result<String, AppError> = controller.request(&Status { sample: None }).await;
        assert_eq!(result, Err(AppError("server_error".to_string())));
    }

    #[tokio::test]
    async fn test_clone_shares_transport() {
        let transport = Fixed::new(StatusCode::OK, "null");
        let controller: Controller<Status> = Controller::new(transport.clone());
        let copy = controller.clone();

        let _: () = controller.execute(&Status { sample: None }).await.unwrap();
        let _: () = copy.execute(&Status { sample: None }).await.unwrap();
        assert_eq!(transport.calls.load(Ordering::SeqCst), 2);
    }
}
