//! Authentication gate consulted before every live request.

use async_trait::async_trait;
use relay_common_secret::SecretString;

use crate::error::BoxError;
use crate::request::TransportRequest;

/// Reachability of the service from the authenticator's point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthenticationState {
    Reachable,
    NotReachable,
    NotLoggedIn,
}

/// Caller-owned credentials holder shared across runs.
#[async_trait]
pub trait Authenticator: Send + Sync {
    /// Current state. Must not block or do I/O.
    fn state(&self) -> AuthenticationState;

    /// Make sure credentials are valid, refreshing them if needed.
    ///
    /// `Ok(false)` means the user cannot be authenticated. An `Err` is
    /// reported to callers as a connection error.
    async fn ensure_authenticated(&self) -> Result<bool, BoxError>;

    /// Attach credentials to an outgoing request.
    fn map_request(&self, _request: &mut TransportRequest) {}
}

/// Static bearer token, e.g. an API read access token.
#[derive(Debug, Clone)]
pub struct BearerAuthenticator {
    token: SecretString,
}

impl BearerAuthenticator {
    pub fn new(token: impl Into<SecretString>) -> Self {
        Self {
            token: token.into(),
        }
    }
}

#[async_trait]
impl Authenticator for BearerAuthenticator {
    fn state(&self) -> AuthenticationState {
        if self.token.is_blank() {
            AuthenticationState::NotLoggedIn
        } else {
            AuthenticationState::Reachable
        }
    }

    async fn ensure_authenticated(&self) -> Result<bool, BoxError> {
        Ok(true)
    }

    fn map_request(&self, request: &mut TransportRequest) {
        request.bearer_auth(self.token.expose());
    }
}
