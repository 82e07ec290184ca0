//! Linking actions.
//!
//! This module defines all possible inputs to the linking reducer.
//! Actions unify commands (user intent) and events (results of async
//! operations).

use serde::{Deserialize, Serialize};

use crate::error::LinkError;
use crate::providers::AuthorizationResponse;
use crate::registry::LinkRow;
use crate::state::{ChallengeId, ProviderData};

/// Linking action.
///
/// This enum represents all possible inputs to the linking reducer:
/// - **Commands**: user requests (`SelectProvider`, `BeginAppleLink`,
///   `BeginPasswordLink`)
/// - **Events**: results of async operations
///   (`AppleAuthorizationCompleted`, `LinkSucceeded`, ...)
///
/// Events are broadcast by the runtime store before being fed back into
/// the reducer, which is how the presentation layer observes flow results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum LinkAction {
    // ═══════════════════════════════════════════════════════════════════
    // Row selection
    // ═══════════════════════════════════════════════════════════════════
    /// The user selected a provider row on the linking screen.
    ///
    /// A checked row unlinks; an unchecked row starts the provider's link
    /// procedure. Rows that resolve to no known provider are ignored.
    SelectProvider {
        /// Correlation ID for request tracing.
        correlation_id: uuid::Uuid,

        /// The selected row, as projected by `list_linkable`.
        row: LinkRow,
    },

    // ═══════════════════════════════════════════════════════════════════
    // Apple flow
    // ═══════════════════════════════════════════════════════════════════
    /// Start the two-phase Apple link.
    ///
    /// # Flow
    ///
    /// 1. Generate a raw nonce, store it as the pending challenge
    /// 2. Send `sha256(nonce)` outward as the authorization challenge
    /// 3. Suspend on the external round-trip
    /// 4. `AppleAuthorizationCompleted` / `AppleAuthorizationFailed`
    BeginAppleLink {
        /// Correlation ID for request tracing.
        correlation_id: uuid::Uuid,
    },

    /// The external authorization round-trip completed.
    ///
    /// This is an **event** produced by the authorization effect. It
    /// carries the ID of the challenge it answers; a completion for a
    /// challenge that is no longer pending is stale and is dropped.
    AppleAuthorizationCompleted {
        /// Correlation ID for request tracing.
        correlation_id: uuid::Uuid,

        /// Challenge this completion answers.
        challenge_id: ChallengeId,

        /// The authorization response.
        response: AuthorizationResponse,
    },

    /// The external authorization round-trip failed.
    AppleAuthorizationFailed {
        /// Correlation ID for request tracing.
        correlation_id: uuid::Uuid,

        /// Challenge this failure belongs to.
        challenge_id: ChallengeId,

        /// What went wrong.
        error: LinkError,
    },

    // ═══════════════════════════════════════════════════════════════════
    // Password flow
    // ═══════════════════════════════════════════════════════════════════
    /// The password row was selected; the presentation layer should
    /// collect email and password and answer with [`Self::BeginPasswordLink`].
    ///
    /// This is an **event**.
    PasswordCredentialsRequested {
        /// Correlation ID for request tracing.
        correlation_id: uuid::Uuid,
    },

    /// Link with an email/password credential.
    ///
    /// No format validation happens in the flow; invalid input is rejected
    /// by the backend and surfaced as a [`Self::LinkFailed`] event.
    BeginPasswordLink {
        /// Correlation ID for request tracing.
        correlation_id: uuid::Uuid,

        /// Email address.
        email: String,

        /// Password.
        password: String,
    },

    // ═══════════════════════════════════════════════════════════════════
    // Results
    // ═══════════════════════════════════════════════════════════════════
    /// A provider was linked.
    ///
    /// This is an **event** carrying the backend's updated provider list;
    /// the state adopts it wholesale and the presentation layer re-projects
    /// its rows from it.
    LinkSucceeded {
        /// Correlation ID for request tracing.
        correlation_id: uuid::Uuid,

        /// Provider that was linked.
        provider_id: String,

        /// Updated provider list from the backend.
        providers: Vec<ProviderData>,
    },

    /// A link attempt failed. Nothing was mutated locally.
    LinkFailed {
        /// Correlation ID for request tracing.
        correlation_id: uuid::Uuid,

        /// Provider the attempt was for.
        provider_id: String,

        /// Why it failed.
        error: LinkError,
    },

    /// A provider was unlinked.
    UnlinkSucceeded {
        /// Correlation ID for request tracing.
        correlation_id: uuid::Uuid,

        /// Provider that was unlinked.
        provider_id: String,

        /// Updated provider list from the backend.
        providers: Vec<ProviderData>,
    },

    /// An unlink attempt failed. The provider list is untouched.
    UnlinkFailed {
        /// Correlation ID for request tracing.
        correlation_id: uuid::Uuid,

        /// Provider the attempt was for.
        provider_id: String,

        /// Why it failed.
        error: LinkError,
    },
}
