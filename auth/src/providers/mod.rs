//! External collaborators of the linking flow.
//!
//! Providers are **interfaces**, not implementations. The reducer depends
//! on these traits; the surrounding application supplies concrete
//! implementations (an identity backend client, a platform authorization
//! service), and tests use the in-memory mocks in [`crate::mocks`].
//!
//! The flow is a protocol orchestrator over these interfaces: it defines
//! no wire formats of its own.

pub mod authorization;
pub mod backend;

pub use authorization::{
    AuthorizationRequest, AuthorizationResponse, AuthorizationScope, ExternalAuthorization,
};
pub use backend::AuthBackend;
