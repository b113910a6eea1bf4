//! The reqwest transport against a local mock server.

mod common;

use std::sync::Arc;

use relay_common_config::RelayConfig;
use relay_http::{
    BearerAuthenticator, Controller, Endpoint, Error, HttpTask, JsonMapper, Method,
    ReqwestTransport,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use wiremock::matchers::{body_json, body_string, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use common::{Movie, MovieEndpoint};

fn live_controller<E: Endpoint>() -> Controller<E> {
    Controller::new(Arc::new(ReqwestTransport::new().unwrap()))
}

fn movie_at(server: &MockServer, id: u64) -> MovieEndpoint {
    let mut endpoint = MovieEndpoint::new(id);
    endpoint.base_url = server.uri();
    endpoint
}

enum Api {
    Search { base_url: String, query: String },
    Rate { base_url: String, movie_id: u64, value: f32 },
    Login { base_url: String, user: String },
}

#[derive(Serialize)]
struct Rating {
    value: f32,
}

impl Endpoint for Api {
    fn base_url(&self) -> &str {
        match self {
            Api::Search { base_url, .. } | Api::Rate { base_url, .. } | Api::Login { base_url, .. } => {
                base_url
            }
        }
    }

    fn path(&self) -> String {
        match self {
            Api::Search { .. } => "/search/movie".to_string(),
            Api::Rate { movie_id, .. } => format!("/movie/{movie_id}/rating"),
            Api::Login { .. } => "/authentication/session".to_string(),
        }
    }

    fn method(&self) -> Method {
        match self {
            Api::Search { .. } => Method::GET,
            Api::Rate { .. } | Api::Login { .. } => Method::POST,
        }
    }

    fn task(&self) -> HttpTask {
        match self {
            Api::Search { query, .. } => HttpTask::query([("query", query.as_str())]),
            Api::Rate { value, .. } => {
                HttpTask::json(&Rating { value: *value }).unwrap_or(HttpTask::Plain)
            }
            Api::Login { user, .. } => HttpTask::form([("username", user.as_str())]),
        }
    }
}

#[derive(Debug, Deserialize)]
struct SearchResults(Vec<Movie>);

impl JsonMapper for SearchResults {
    fn map(data: &[u8]) -> Result<serde_json::Value, relay_http::DecodeError> {
        let mut page: serde_json::Value =
            serde_json::from_slice(data).map_err(relay_http::DecodeError::Syntax)?;
        Ok(page["results"].take())
    }
}

#[derive(Debug, Deserialize)]
struct StatusMessage {
    status_code: u32,
}

impl JsonMapper for StatusMessage {}

#[tokio::test]
async fn test_get_decodes_json() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/movie/1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": 1, "title": "X"})))
        .expect(1)
        .mount(&server)
        .await;

    let movie: Movie = live_controller().execute(&movie_at(&server, 1)).await.unwrap();
    assert_eq!(movie.title, "X");
}

#[tokio::test]
async fn test_bearer_token_is_sent() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/movie/2"))
        .and(header("authorization", "Bearer abc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": 2, "title": "Y"})))
        .expect(1)
        .mount(&server)
        .await;

    let controller: Controller<MovieEndpoint> =
        live_controller().with_authenticator(Arc::new(BearerAuthenticator::new("abc")));
    let movie: Movie = controller.execute(&movie_at(&server, 2)).await.unwrap();
    assert_eq!(movie.id, 2);
}

#[tokio::test]
async fn test_query_and_envelope_mapping() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search/movie"))
        .and(query_param("query", "the thing"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "page": 1,
            "results": [{"id": 1, "title": "The Thing"}, {"id": 2, "title": "The Thing (2011)"}]
        })))
        .mount(&server)
        .await;

    let results: SearchResults = live_controller()
        .execute(&Api::Search {
            base_url: server.uri(),
            query: "the thing".to_string(),
        })
        .await
        .unwrap();

    assert_eq!(results.0.len(), 2);
    assert_eq!(results.0[1].id, 2);
}

#[tokio::test]
async fn test_json_body_is_sent() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/movie/3/rating"))
        .and(header("content-type", "application/json"))
        .and(body_json(json!({"value": 8.5})))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"status_code": 1})))
        .expect(1)
        .mount(&server)
        .await;

    let status: StatusMessage = live_controller()
        .execute(&Api::Rate {
            base_url: server.uri(),
            movie_id: 3,
            value: 8.5,
        })
        .await
        .unwrap();
    assert_eq!(status.status_code, 1);
}

#[tokio::test]
async fn test_form_body_is_sent() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/authentication/session"))
        .and(header("content-type", "application/x-www-form-urlencoded"))
        .and(body_string("username=jane+doe"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status_code": 1})))
        .expect(1)
        .mount(&server)
        .await;

    let status: StatusMessage = live_controller()
        .execute(&Api::Login {
            base_url: server.uri(),
            user: "jane doe".to_string(),
        })
        .await
        .unwrap();
    assert_eq!(status.status_code, 1);
}

#[tokio::test]
async fn test_server_error_with_json_payload() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/movie/1"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({"message": "down"})))
        .mount(&server)
        .await;

    let err = live_controller()
        .execute::<Movie>(&movie_at(&server, 1))
        .await
        .unwrap_err();

    assert_eq!(
        err,
        Error::Server {
            status: 500,
            payload: json!({"message": "down"}),
        }
    );
}

#[tokio::test]
async fn test_not_found_with_text_body() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/movie/404"))
        .respond_with(ResponseTemplate::new(404).set_body_string("Not Found"))
        .mount(&server)
        .await;

    let err = live_controller()
        .execute::<Movie>(&movie_at(&server, 404))
        .await
        .unwrap_err();

    assert_eq!(
        err,
        Error::Server {
            status: 404,
            payload: json!("Not Found"),
        }
    );
}

#[tokio::test]
async fn test_refused_connection_is_unknown_error() {
    let mut endpoint = MovieEndpoint::new(1);
    endpoint.base_url = "http://127.0.0.1:1".to_string();

    let err = live_controller()
        .execute::<Movie>(&endpoint)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Unknown(_)), "{err:?}");
}

#[tokio::test]
async fn test_from_config_uses_access_token() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/movie/5"))
        .and(header("authorization", "Bearer from-config"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": 5, "title": "Z"})))
        .expect(1)
        .mount(&server)
        .await;

    let mut config = RelayConfig::default();
    config.api.access_token = "from-config".into();

    let controller: Controller<MovieEndpoint> = Controller::from_config(&config).unwrap();
    let movie: Movie = controller.execute(&movie_at(&server, 5)).await.unwrap();
    assert_eq!(movie.id, 5);
}
