//! Mock external authorization provider for testing.

// Test-support code: lock poisoning can only come from a panicking test.
#![allow(clippy::unwrap_used)]

use std::future::Future;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::error::{LinkError, Result};
use crate::providers::{AuthorizationRequest, AuthorizationResponse, ExternalAuthorization};

/// Mock external authorization provider.
///
/// Returns a predefined response and records every request it receives,
/// so tests can verify that only the *hashed* nonce ever reaches the
/// provider.
#[derive(Debug, Clone)]
pub struct MockExternalAuthorization {
    response: Result<AuthorizationResponse>,
    delay: Option<Duration>,
    received: Arc<Mutex<Vec<AuthorizationRequest>>>,
}

impl MockExternalAuthorization {
    /// Create a mock that completes with the given identity token.
    #[must_use]
    pub fn with_token(token: &[u8]) -> Self {
        Self {
            response: Ok(AuthorizationResponse {
                identity_token: Some(token.to_vec()),
            }),
            delay: None,
            received: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Create a mock that completes without an identity token.
    #[must_use]
    pub fn missing_token() -> Self {
        Self {
            response: Ok(AuthorizationResponse {
                identity_token: None,
            }),
            delay: None,
            received: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Create a mock where the user cancels the authorization.
    #[must_use]
    pub fn cancelled() -> Self {
        Self {
            response: Err(LinkError::ExternalAuth("user cancelled".to_string())),
            delay: None,
            received: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Delay each response, so tests can overlap two round-trips.
    #[must_use]
    pub fn delayed(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// All requests received so far (for assertions).
    #[must_use]
    pub fn received(&self) -> Vec<AuthorizationRequest> {
        self.received.lock().unwrap().clone()
    }
}

impl Default for MockExternalAuthorization {
    fn default() -> Self {
        Self::with_token(b"mock-identity-token")
    }
}

impl ExternalAuthorization for MockExternalAuthorization {
    fn authorize(
        &self,
        request: AuthorizationRequest,
    ) -> impl Future<Output = Result<AuthorizationResponse>> + Send {
        let response = self.response.clone();
        let delay = self.delay;
        let received = Arc::clone(&self.received);

        async move {
            received.lock().unwrap().push(request);
            if let Some(delay) = delay {
                tokio::time::sleep(delay).await;
            }
            response
        }
    }
}
