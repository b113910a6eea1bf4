//! Typed request pipeline for JSON APIs.
//!
//! Describe each API call as an [`Endpoint`], then run it through a
//! [`Controller`] to get a decoded model or a classified [`Error`].

pub mod auth;
pub mod client;
pub mod controller;
pub mod decode;
pub mod endpoint;
pub mod error;
mod logging;
pub mod request;
pub mod response;
pub mod status;

pub use auth::{AuthenticationState, Authenticator, BearerAuthenticator};
pub use client::{build_client, HttpConfig, ReqwestTransport, Transport, TransportError};
pub use controller::Controller;
pub use decode::{
    decode, Date, DateDecodingStrategy, DecodableJson, DecodeError, JsonMapper,
    KeyDecodingStrategy,
};
pub use endpoint::{Endpoint, HttpTask};
pub use error::{BoxError, Error};
pub use request::{headers, RequestError, TransportRequest};
pub use response::TransportResponse;
pub use status::StatusGroup;

pub use relay_common_config::Environment;
pub use reqwest::{Method, StatusCode};
