//! External authorization provider trait (Apple ID style).

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Scopes requested from the external provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AuthorizationScope {
    /// The user's full name.
    FullName,
    /// The user's email address.
    Email,
}

/// One external authorization request.
///
/// `nonce_challenge` is the SHA-256 hex digest of the flow's raw nonce —
/// never the raw nonce itself. The provider embeds it in the identity
/// token it mints, which is how the backend later binds the assertion to
/// this flow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorizationRequest {
    /// Identity/contact scopes to request.
    pub scopes: Vec<AuthorizationScope>,

    /// Hashed nonce sent as the challenge value.
    pub nonce_challenge: String,
}

/// A completed external authorization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorizationResponse {
    /// Identity token bytes, if the provider returned one. Absence is a
    /// [`crate::LinkError::MissingToken`] failure downstream.
    pub identity_token: Option<Vec<u8>>,
}

/// The external authorization system (e.g. Apple ID).
///
/// A single-outstanding-request boundary: the flow suspends on this call
/// and at most one challenge is pending at a time. The call may never
/// complete (the surrounding application owns any timeout policy); the
/// flow tolerates that with one stale pending challenge, bounded, which is
/// reclaimed when the next authorization begins.
pub trait ExternalAuthorization: Send + Sync {
    /// Run one authorization round-trip.
    ///
    /// # Errors
    ///
    /// Returns [`crate::LinkError::ExternalAuth`] if the user cancels or
    /// the provider is unavailable.
    fn authorize(
        &self,
        request: AuthorizationRequest,
    ) -> impl std::future::Future<Output = Result<AuthorizationResponse>> + Send;
}
