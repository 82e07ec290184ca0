//! Backend credential values.
//!
//! Credentials are opaque to everything except the auth backend adapter:
//! the flow constructs them with the pure helpers below and hands them to
//! [`crate::providers::AuthBackend::link`] unchanged.

use serde::{Deserialize, Serialize};

/// An opaque credential consumed only by the auth backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Credential {
    /// Email/password credential. No format validation happens here; the
    /// backend rejects bad input and the error is surfaced unchanged.
    EmailPassword {
        /// Email address.
        email: String,
        /// Password.
        password: String,
    },

    /// OIDC-style credential from an external provider assertion.
    OAuth {
        /// Stable provider ID (e.g. `"apple.com"`).
        provider_id: String,
        /// Identity token from the external authorization response.
        id_token: String,
        /// The raw nonce whose digest was sent as the challenge. The
        /// backend hashes this and checks it against the assertion.
        raw_nonce: String,
    },
}

impl Credential {
    /// Provider ID this credential is for.
    #[must_use]
    pub fn provider_id(&self) -> &str {
        match self {
            Self::EmailPassword { .. } => crate::state::AuthProvider::Password.id(),
            Self::OAuth { provider_id, .. } => provider_id,
        }
    }
}

/// Build an email/password credential.
#[must_use]
pub fn email_password_credential(email: &str, password: &str) -> Credential {
    Credential::EmailPassword {
        email: email.to_string(),
        password: password.to_string(),
    }
}

/// Build an OIDC credential from `(provider_id, id_token, raw_nonce)`.
#[must_use]
pub fn oauth_credential(provider_id: &str, id_token: &str, raw_nonce: &str) -> Credential {
    Credential::OAuth {
        provider_id: provider_id.to_string(),
        id_token: id_token.to_string(),
        raw_nonce: raw_nonce.to_string(),
    }
}
