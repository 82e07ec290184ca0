//! Error types for the account linking flow.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias for linking operations.
pub type Result<T> = std::result::Result<T, LinkError>;

/// Error taxonomy for the linking flow.
///
/// Recoverable errors surface to the presentation layer as a displayable
/// message and leave the state machine with no partial mutation. Fatal
/// errors indicate an unrecoverable environment or logic fault; the flow
/// terminates and no retry is meaningful.
#[derive(Debug, Error, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum LinkError {
    /// The backend rejected a link/unlink call (e.g.
    /// credential-already-in-use, invalid-credential).
    #[error("backend rejected the request: {0}")]
    Backend(String),

    /// The external authorization round-trip failed (user cancelled,
    /// provider unavailable).
    #[error("external authorization failed: {0}")]
    ExternalAuth(String),

    /// The external authorization completed without an identity token.
    #[error("authorization response carried no identity token")]
    MissingToken,

    /// The identity token could not be decoded as text.
    #[error("identity token is not valid UTF-8")]
    TokenDecode,

    /// The secure random source failed. Fatal: the flow must abort rather
    /// than fall back to a weaker source.
    #[error("secure random source failure")]
    RandomSource,

    /// An authorization completion arrived with no challenge outstanding.
    /// Fatal: this is a sequencing bug, not a recoverable runtime
    /// condition.
    #[error("authorization completion with no pending challenge")]
    InternalSequencing,
}

impl LinkError {
    /// Returns `true` if no safe continuation of the flow exists.
    ///
    /// # Examples
    ///
    /// ```
    /// # use relink_auth::LinkError;
    /// assert!(LinkError::RandomSource.is_fatal());
    /// assert!(!LinkError::MissingToken.is_fatal());
    /// ```
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        matches!(self, Self::RandomSource | Self::InternalSequencing)
    }

    /// Returns `true` if this error is worth showing to the user as the
    /// outcome of their own action (as opposed to an internal fault).
    #[must_use]
    pub const fn is_user_error(&self) -> bool {
        matches!(self, Self::Backend(_) | Self::ExternalAuth(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fatality_classification() {
        assert!(LinkError::InternalSequencing.is_fatal());
        assert!(LinkError::RandomSource.is_fatal());
        assert!(!LinkError::Backend("credential already in use".into()).is_fatal());
        assert!(!LinkError::ExternalAuth("user cancelled".into()).is_fatal());
        assert!(!LinkError::TokenDecode.is_fatal());
    }

    #[test]
    fn user_error_classification() {
        assert!(LinkError::Backend("invalid credential".into()).is_user_error());
        assert!(LinkError::ExternalAuth("user cancelled".into()).is_user_error());
        assert!(!LinkError::InternalSequencing.is_user_error());
    }
}
