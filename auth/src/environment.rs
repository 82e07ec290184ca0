//! Linking environment.
//!
//! Dependency injection for the linking reducer: the two external
//! collaborators the flow orchestrates, injected as generics so tests run
//! against in-memory mocks at memory speed.

use crate::providers::{AuthBackend, ExternalAuthorization};

/// Environment for the linking reducer.
///
/// # Type Parameters
///
/// - `B`: Auth backend adapter
/// - `X`: External authorization provider
#[derive(Debug, Clone)]
pub struct LinkEnvironment<B, X>
where
    B: AuthBackend + Clone,
    X: ExternalAuthorization + Clone,
{
    /// Identity backend (link/unlink).
    pub backend: B,

    /// External authorization provider (Apple ID).
    pub authorization: X,
}

impl<B, X> LinkEnvironment<B, X>
where
    B: AuthBackend + Clone,
    X: ExternalAuthorization + Clone,
{
    /// Create a new linking environment.
    #[must_use]
    pub const fn new(backend: B, authorization: X) -> Self {
        Self {
            backend,
            authorization,
        }
    }
}
