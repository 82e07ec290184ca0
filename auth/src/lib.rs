//! # Relink Auth
//!
//! Account linking flow controller: the protocol for linking and
//! unlinking a single authenticated identity to multiple auth providers,
//! including the nonce-based handshake for Sign in with Apple and
//! credential exchange for password-based linking.
//!
//! ## Architecture
//!
//! The flow is implemented as a reducer over explicit effects:
//!
//! ```text
//! Action → Reducer → (State, Effects) → Effect Execution → More Actions
//! ```
//!
//! The presentation layer projects rows with [`registry::list_linkable`],
//! sends [`LinkAction::SelectProvider`] when a row is tapped, and observes
//! result events (`LinkSucceeded`, `LinkFailed`, ...) on the runtime
//! store's action broadcast. The identity backend and the external
//! authorization system are injected collaborators; the flow defines no
//! wire formats of its own.
//!
//! ## Example: Apple link
//!
//! ```rust,ignore
//! use relink_auth::*;
//!
//! // 1. User taps the unchecked Apple row
//! let effects = reducer.reduce(
//!     &mut state,
//!     LinkAction::SelectProvider { correlation_id, row },
//!     &env,
//! );
//!
//! // 2. A challenge is issued; the hashed nonce goes to the provider
//! // 3. The authorization completes and the credential is exchanged
//! // 4. The backend confirms and the provider list refreshes
//! assert!(state.account.has_provider("apple.com"));
//! ```

#![deny(missing_docs)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![deny(clippy::todo)]
#![deny(clippy::unimplemented)]

// Public modules
pub mod actions;
pub mod credential;
pub mod digest;
pub mod environment;
pub mod error;
pub mod nonce;
pub mod providers;
pub mod reducers;
pub mod registry;
pub mod state;

// Mock providers for tests and downstream consumers' test suites.
#[cfg(feature = "test-utils")]
pub mod mocks;

// Re-export main types for convenience
pub use actions::LinkAction;
pub use credential::{Credential, email_password_credential, oauth_credential};
pub use environment::LinkEnvironment;
pub use error::{LinkError, Result};
pub use reducers::LinkingReducer;
pub use registry::{LinkRow, list_linkable};
pub use state::{AuthProvider, LinkPhase, LinkState, LinkedAccount, PendingChallenge};
