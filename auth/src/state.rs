//! Account linking state types.
//!
//! This module defines the core state for the linking flow. All types are
//! `Clone` to support the functional architecture pattern.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ═══════════════════════════════════════════════════════════════════════
// Providers
// ═══════════════════════════════════════════════════════════════════════

/// An auth provider the backend knows about.
///
/// This is a closed set, defined at process start and never mutated.
/// Unrecognized provider strings resolve to `None` (see
/// [`AuthProvider::resolve`]), never to a panic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AuthProvider {
    /// Email & password.
    Password,
    /// Sign in with Apple (OIDC-style, nonce-bound).
    Apple,
    /// Phone number.
    Phone,
    /// Google `OAuth`.
    Google,
    /// Anonymous session (not a linkable credential).
    Anonymous,
    /// Custom auth system (tokens minted outside the backend).
    Custom,
}

impl AuthProvider {
    /// All providers, in the fixed display-priority order used by the
    /// linking screen projection.
    pub const ALL: [Self; 6] = [
        Self::Password,
        Self::Apple,
        Self::Phone,
        Self::Google,
        Self::Anonymous,
        Self::Custom,
    ];

    /// Stable provider ID used by the backend.
    #[must_use]
    pub const fn id(self) -> &'static str {
        match self {
            Self::Password => "password",
            Self::Apple => "apple.com",
            Self::Phone => "phone",
            Self::Google => "google.com",
            Self::Anonymous => "anonymous",
            Self::Custom => "custom",
        }
    }

    /// Human-readable display title.
    #[must_use]
    pub const fn title(self) -> &'static str {
        match self {
            Self::Password => "Email & Password",
            Self::Apple => "Sign in with Apple",
            Self::Phone => "Phone Number",
            Self::Google => "Google",
            Self::Anonymous => "Anonymous",
            Self::Custom => "Custom Auth System",
        }
    }

    /// Whether this provider can be linked to an account at all.
    ///
    /// Anonymous and custom-auth identities are structurally non-linkable:
    /// there is no credential to hand the backend.
    #[must_use]
    pub const fn is_linkable(self) -> bool {
        !matches!(self, Self::Anonymous | Self::Custom)
    }

    /// Map a stable ID or display title back to a provider.
    ///
    /// Returns `None` for unrecognized input; callers treat that as
    /// "no action", not an error.
    ///
    /// # Examples
    ///
    /// ```
    /// # use relink_auth::state::AuthProvider;
    /// assert_eq!(AuthProvider::resolve("apple.com"), Some(AuthProvider::Apple));
    /// assert_eq!(AuthProvider::resolve("Email & Password"), Some(AuthProvider::Password));
    /// assert_eq!(AuthProvider::resolve("not-a-provider"), None);
    /// ```
    #[must_use]
    pub fn resolve(input: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|p| p.id() == input || p.title() == input)
    }
}

// ═══════════════════════════════════════════════════════════════════════
// Account
// ═══════════════════════════════════════════════════════════════════════

/// One linked-provider record on an account.
///
/// Mirrors what the identity backend reports per provider. Provider IDs
/// are unique within an account; the backend owns that invariant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderData {
    /// Stable provider ID (e.g. `"password"`, `"apple.com"`).
    pub provider_id: String,

    /// Provider-scoped user ID.
    pub uid: String,

    /// Email address known to this provider, if any.
    pub email: Option<String>,

    /// Display name known to this provider, if any.
    pub display_name: Option<String>,
}

impl ProviderData {
    /// Minimal record for a provider ID, used by tests and mocks.
    #[must_use]
    pub fn bare(provider_id: &str, uid: &str) -> Self {
        Self {
            provider_id: provider_id.to_string(),
            uid: uid.to_string(),
            email: None,
            display_name: None,
        }
    }
}

/// The externally-owned user identity, as the linking flow sees it.
///
/// Read-only from the flow's perspective except through explicit
/// link/unlink results: the flow never edits `provider_data` ahead of
/// backend confirmation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkedAccount {
    /// Backend user ID.
    pub uid: String,

    /// Linked providers, one record per provider ID.
    pub provider_data: Vec<ProviderData>,
}

impl LinkedAccount {
    /// Create an account view with the given providers.
    #[must_use]
    pub fn new(uid: &str, provider_data: Vec<ProviderData>) -> Self {
        Self {
            uid: uid.to_string(),
            provider_data,
        }
    }

    /// True iff `provider_id` is currently linked.
    #[must_use]
    pub fn has_provider(&self, provider_id: &str) -> bool {
        self.provider_data
            .iter()
            .any(|p| p.provider_id == provider_id)
    }
}

// ═══════════════════════════════════════════════════════════════════════
// Challenge
// ═══════════════════════════════════════════════════════════════════════

/// Identity of one issued challenge.
///
/// Completions from the external authorization round-trip carry the ID of
/// the challenge they answer; the reducer drops any completion whose ID no
/// longer matches the pending challenge (stale after a restart of the
/// flow).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChallengeId(pub uuid::Uuid);

impl ChallengeId {
    /// Generate a new random `ChallengeId`.
    #[must_use]
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4())
    }
}

impl Default for ChallengeId {
    fn default() -> Self {
        Self::new()
    }
}

/// Transient state held only during an in-flight Apple link.
///
/// At most one exists per flow; beginning a new Apple link replaces any
/// unresolved one. The raw nonce is consumed exactly once, at credential
/// construction time, and discarded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingChallenge {
    /// Challenge identity, for staleness checks.
    pub id: ChallengeId,

    /// Raw (unhashed) nonce. Only the SHA-256 digest of this value ever
    /// leaves for the external provider; the raw value goes to the backend
    /// inside the credential.
    pub raw_nonce: String,

    /// When the challenge was issued.
    pub issued_at: DateTime<Utc>,
}

// ═══════════════════════════════════════════════════════════════════════
// Flow state
// ═══════════════════════════════════════════════════════════════════════

/// Where the linking flow currently stands.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum LinkPhase {
    /// Nothing in progress.
    #[default]
    Idle,

    /// An Apple challenge has been issued; waiting on the external
    /// authorization round-trip.
    ChallengeIssued,

    /// A backend credential has been constructed; waiting on the backend
    /// link call.
    CredentialExchanged,

    /// Terminal: the last attempt linked a provider.
    Linked,

    /// Terminal: the last attempt unlinked a provider.
    Unlinked,

    /// Terminal: the last attempt failed.
    Failed,
}

/// Root state of the account linking flow.
///
/// # Examples
///
/// ```
/// # use relink_auth::state::LinkState;
/// let state = LinkState::default();
/// assert!(state.pending_challenge.is_none());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LinkState {
    /// The user whose providers are being managed.
    pub account: LinkedAccount,

    /// Current flow phase.
    pub phase: LinkPhase,

    /// The single in-flight Apple challenge, if any.
    pub pending_challenge: Option<PendingChallenge>,

    /// Provider ID of the one outstanding backend link/unlink call, if
    /// any. No second call for the same or another provider starts while
    /// this is set.
    pub in_flight: Option<String>,
}

impl LinkState {
    /// Create flow state for an account.
    #[must_use]
    pub const fn new(account: LinkedAccount) -> Self {
        Self {
            account,
            phase: LinkPhase::Idle,
            pending_challenge: None,
            in_flight: None,
        }
    }
}
