//! The closed error taxonomy returned by the request pipeline.

use serde::de::DeserializeOwned;

use crate::client::TransportError;
use crate::decode::DecodeError;
use crate::request::RequestError;

/// Boxed error raised by pluggable collaborators (authenticators, custom transports).
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Classified pipeline error.
///
/// Every failure surfaced by [`Controller`](crate::Controller) is one of these
/// variants; collaborator errors are folded in with [`Error::normalize`] or the
/// `From` conversions below.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum Error {
    /// The service is not reachable, or refreshing credentials failed.
    #[error("connection error: service not reachable")]
    Connection,

    /// No valid credentials, or the authenticator refused to authenticate.
    #[error("authentication error: no valid credentials")]
    Authentication,

    /// Response bytes did not match the expected schema.
    #[error("decoding error: {0}")]
    Decoding(String),

    /// Non-success response from the remote.
    #[error("server error (status {status}): {payload}")]
    Server {
        status: u16,
        payload: serde_json::Value,
    },

    /// Anything that is not otherwise classified.
    #[error("unknown error: {0}")]
    Unknown(String),
}

impl Error {
    /// Fold an arbitrary failure into the taxonomy.
    ///
    /// Classified errors pass through unchanged, decoding failures become
    /// [`Error::Decoding`], everything else becomes [`Error::Unknown`].
    pub fn normalize(error: BoxError) -> Self {
        let error = match error.downcast::<Error>() {
            Ok(classified) => return *classified,
            Err(other) => other,
        };

        let error = match error.downcast::<TransportError>() {
            Ok(transport) => return Self::from(*transport),
            Err(other) => other,
        };

        if error.is::<DecodeError>() || error.is::<serde_json::Error>() {
            return Self::Decoding(error.to_string());
        }

        Self::Unknown(error.to_string())
    }

    /// Short snake_case label, used in logs and span fields.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Connection => "connection_error",
            Self::Authentication => "authentication_error",
            Self::Decoding(_) => "decoding_error",
            Self::Server { .. } => "server_error",
            Self::Unknown(_) => "unknown_error",
        }
    }

    /// Status code of a server error.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Server { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Decode the payload of a server error into a typed error body.
    pub fn server_payload<P: DeserializeOwned>(&self) -> Option<P> {
        match self {
            Self::Server { payload, .. } => P::deserialize(payload).ok(),
            _ => None,
        }
    }
}

impl From<DecodeError> for Error {
    fn from(error: DecodeError) -> Self {
        Self::Decoding(error.to_string())
    }
}

impl From<RequestError> for Error {
    fn from(error: RequestError) -> Self {
        Self::Unknown(error.to_string())
    }
}

impl From<TransportError> for Error {
    fn from(error: TransportError) -> Self {
        match error {
            TransportError::Other(inner) => Self::normalize(inner),
            other => Self::Unknown(other.to_string()),
        }
    }
}
