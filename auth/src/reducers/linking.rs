//! Account linking state machine.
//!
//! # Flow
//!
//! ```text
//! Apple:    SelectProvider → BeginAppleLink → ChallengeIssued
//!             → AppleAuthorizationCompleted → CredentialExchanged
//!             → backend link → Linked | Failed
//! Password: SelectProvider → PasswordCredentialsRequested (UI dialog)
//!             → BeginPasswordLink → CredentialExchanged
//!             → backend link → Linked | Failed
//! Unlink:   SelectProvider (checked row) → backend unlink
//!             → Unlinked | unchanged
//! ```
//!
//! The raw nonce generated for the Apple handshake never leaves the flow:
//! only its SHA-256 digest is sent outward as the challenge, and the raw
//! value is consumed exactly once when the backend credential is built.

use std::marker::PhantomData;

use chrono::Utc;
use relink_core::effect::Effect;
use relink_core::reducer::Reducer;
use relink_core::{SmallVec, smallvec};
use uuid::Uuid;

use crate::actions::LinkAction;
use crate::credential::{Credential, email_password_credential, oauth_credential};
use crate::digest::sha256_hex;
use crate::environment::LinkEnvironment;
use crate::error::LinkError;
use crate::nonce;
use crate::providers::{
    AuthBackend, AuthorizationRequest, AuthorizationResponse, AuthorizationScope,
    ExternalAuthorization,
};
use crate::registry::LinkRow;
use crate::state::{AuthProvider, ChallengeId, LinkPhase, LinkState, PendingChallenge};

/// Account linking reducer.
///
/// Orchestrates the link/unlink lifecycle per provider over the injected
/// backend and external authorization collaborators.
#[derive(Debug, Clone)]
pub struct LinkingReducer<B, X> {
    /// Raw nonce length for the Apple handshake.
    pub nonce_length: usize,

    _phantom: PhantomData<(B, X)>,
}

impl<B, X> LinkingReducer<B, X> {
    /// Create a linking reducer with the default 32-character nonce.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            nonce_length: 32,
            _phantom: PhantomData,
        }
    }

    /// Create a reducer with a custom nonce length.
    #[must_use]
    pub const fn with_nonce_length(nonce_length: usize) -> Self {
        Self {
            nonce_length,
            _phantom: PhantomData,
        }
    }
}

impl<B, X> Default for LinkingReducer<B, X> {
    fn default() -> Self {
        Self::new()
    }
}

impl<B, X> Reducer for LinkingReducer<B, X>
where
    B: AuthBackend + Clone + 'static,
    X: ExternalAuthorization + Clone + 'static,
{
    type State = LinkState;
    type Action = LinkAction;
    type Environment = LinkEnvironment<B, X>;

    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        env: &Self::Environment,
    ) -> SmallVec<[Effect<Self::Action>; 4]> {
        match action {
            // ═══════════════════════════════════════════════════════════
            // Row selection
            // ═══════════════════════════════════════════════════════════
            LinkAction::SelectProvider {
                correlation_id,
                row,
            } => self.select_provider(state, env, correlation_id, &row),

            // ═══════════════════════════════════════════════════════════
            // Apple flow
            // ═══════════════════════════════════════════════════════════
            LinkAction::BeginAppleLink { correlation_id } => {
                self.begin_apple_link(state, env, correlation_id)
            }

            LinkAction::AppleAuthorizationCompleted {
                correlation_id,
                challenge_id,
                response,
            } => self.complete_apple_authorization(state, env, correlation_id, challenge_id, response),

            LinkAction::AppleAuthorizationFailed {
                correlation_id,
                challenge_id,
                error,
            } => match state.pending_challenge.as_ref() {
                Some(pending) if pending.id == challenge_id => {
                    tracing::warn!(%error, "external authorization failed");
                    state.pending_challenge = None;
                    state.phase = LinkPhase::Idle;
                    let provider_id = AuthProvider::Apple.id().to_string();
                    smallvec![Effect::future(async move {
                        Some(LinkAction::LinkFailed {
                            correlation_id,
                            provider_id,
                            error,
                        })
                    })]
                }
                _ => {
                    // Superseded or already resolved; nothing to report.
                    tracing::debug!("dropping failure for a superseded challenge");
                    smallvec![Effect::None]
                }
            },

            // ═══════════════════════════════════════════════════════════
            // Password flow
            // ═══════════════════════════════════════════════════════════
            LinkAction::BeginPasswordLink {
                correlation_id,
                email,
                password,
            } => self.begin_password_link(state, env, correlation_id, &email, &password),

            LinkAction::PasswordCredentialsRequested { .. } => {
                // Event for the presentation layer; no state change.
                smallvec![Effect::None]
            }

            // ═══════════════════════════════════════════════════════════
            // Results
            // ═══════════════════════════════════════════════════════════
            LinkAction::LinkSucceeded {
                provider_id,
                providers,
                ..
            } => {
                tracing::info!(%provider_id, "provider linked");
                state.account.provider_data = providers;
                state.phase = LinkPhase::Linked;
                state.in_flight = None;
                smallvec![Effect::None]
            }

            LinkAction::LinkFailed {
                provider_id, error, ..
            } => {
                tracing::warn!(%provider_id, %error, "link failed");
                state.in_flight = None;
                if state.phase == LinkPhase::CredentialExchanged {
                    state.phase = LinkPhase::Failed;
                }
                smallvec![Effect::None]
            }

            LinkAction::UnlinkSucceeded {
                provider_id,
                providers,
                ..
            } => {
                tracing::info!(%provider_id, "provider unlinked");
                state.account.provider_data = providers;
                state.phase = LinkPhase::Unlinked;
                state.in_flight = None;
                smallvec![Effect::None]
            }

            LinkAction::UnlinkFailed {
                provider_id, error, ..
            } => {
                // No partial unlink: the provider list stays as it was.
                tracing::warn!(%provider_id, %error, "unlink failed");
                state.in_flight = None;
                smallvec![Effect::None]
            }
        }
    }
}

impl<B, X> LinkingReducer<B, X>
where
    B: AuthBackend + Clone + 'static,
    X: ExternalAuthorization + Clone + 'static,
{
    /// Dispatch a row selection to unlink or the provider's link procedure.
    fn select_provider(
        &self,
        state: &mut LinkState,
        env: &LinkEnvironment<B, X>,
        correlation_id: Uuid,
        row: &LinkRow,
    ) -> SmallVec<[Effect<LinkAction>; 4]> {
        let Some(provider) = AuthProvider::resolve(&row.provider_id) else {
            tracing::debug!(provider_id = %row.provider_id, "ignoring unknown provider selection");
            return smallvec![Effect::None];
        };

        if state.in_flight.is_some() {
            tracing::warn!(
                provider_id = provider.id(),
                "dropping selection: a backend call is outstanding"
            );
            return smallvec![Effect::None];
        }

        // A fresh user action starts from a clean phase.
        state.phase = LinkPhase::Idle;

        if row.is_checked {
            return self.begin_unlink(state, env, correlation_id, provider);
        }

        match provider {
            AuthProvider::Apple => self.begin_apple_link(state, env, correlation_id),
            AuthProvider::Password => smallvec![Effect::future(async move {
                Some(LinkAction::PasswordCredentialsRequested { correlation_id })
            })],
            other => {
                // No link procedure is wired up for the remaining
                // providers; selection falls through silently.
                tracing::debug!(provider_id = other.id(), "no link procedure for provider");
                smallvec![Effect::None]
            }
        }
    }

    /// Issue a nonce challenge and start the external authorization
    /// round-trip.
    fn begin_apple_link(
        &self,
        state: &mut LinkState,
        env: &LinkEnvironment<B, X>,
        correlation_id: Uuid,
    ) -> SmallVec<[Effect<LinkAction>; 4]> {
        if state.in_flight.is_some() {
            tracing::warn!("dropping apple link: a backend call is outstanding");
            return smallvec![Effect::None];
        }

        let raw_nonce = match nonce::generate(self.nonce_length) {
            Ok(nonce) => nonce,
            Err(error) => {
                // Fatal: no weaker randomness source is acceptable.
                tracing::error!(%error, "secure random source failed, aborting link flow");
                state.pending_challenge = None;
                state.phase = LinkPhase::Failed;
                let provider_id = AuthProvider::Apple.id().to_string();
                return smallvec![Effect::future(async move {
                    Some(LinkAction::LinkFailed {
                        correlation_id,
                        provider_id,
                        error,
                    })
                })];
            }
        };

        if state.pending_challenge.is_some() {
            tracing::debug!("replacing an unresolved challenge");
        }

        let challenge = PendingChallenge {
            id: ChallengeId::new(),
            raw_nonce: raw_nonce.clone(),
            issued_at: Utc::now(),
        };
        let challenge_id = challenge.id;
        state.pending_challenge = Some(challenge);
        state.phase = LinkPhase::ChallengeIssued;

        // Only the digest leaves; the raw nonce stays in the pending
        // challenge until credential construction.
        let request = AuthorizationRequest {
            scopes: vec![AuthorizationScope::FullName, AuthorizationScope::Email],
            nonce_challenge: sha256_hex(&raw_nonce),
        };
        let authorization = env.authorization.clone();

        smallvec![Effect::future(async move {
            match authorization.authorize(request).await {
                Ok(response) => Some(LinkAction::AppleAuthorizationCompleted {
                    correlation_id,
                    challenge_id,
                    response,
                }),
                Err(error) => Some(LinkAction::AppleAuthorizationFailed {
                    correlation_id,
                    challenge_id,
                    error,
                }),
            }
        })]
    }

    /// Validate a completed authorization against the pending challenge
    /// and exchange it for a backend credential.
    fn complete_apple_authorization(
        &self,
        state: &mut LinkState,
        env: &LinkEnvironment<B, X>,
        correlation_id: Uuid,
        challenge_id: ChallengeId,
        response: AuthorizationResponse,
    ) -> SmallVec<[Effect<LinkAction>; 4]> {
        let pending = match state.pending_challenge.take() {
            Some(pending) if pending.id == challenge_id => pending,
            Some(superseded) => {
                // A newer challenge owns the flow now; the stale
                // completion must not link.
                tracing::warn!("dropping completion for a superseded challenge");
                state.pending_challenge = Some(superseded);
                return smallvec![Effect::None];
            }
            None => {
                // Completion with nothing outstanding: the flow's
                // sequencing broke and there is no safe continuation.
                let error = LinkError::InternalSequencing;
                tracing::error!(%error, "authorization completion with no pending challenge");
                state.phase = LinkPhase::Failed;
                let provider_id = AuthProvider::Apple.id().to_string();
                return smallvec![Effect::future(async move {
                    Some(LinkAction::LinkFailed {
                        correlation_id,
                        provider_id,
                        error,
                    })
                })];
            }
        };

        let Some(token_bytes) = response.identity_token else {
            return Self::fail_apple_link(state, correlation_id, LinkError::MissingToken);
        };
        let Ok(id_token) = String::from_utf8(token_bytes) else {
            return Self::fail_apple_link(state, correlation_id, LinkError::TokenDecode);
        };

        // The raw nonce is consumed here, exactly once; the pending
        // challenge is already cleared.
        state.phase = LinkPhase::CredentialExchanged;
        let credential = oauth_credential(AuthProvider::Apple.id(), &id_token, &pending.raw_nonce);
        Self::link_account(state, env, correlation_id, credential)
    }

    /// Terminate an Apple link before credential exchange.
    fn fail_apple_link(
        state: &mut LinkState,
        correlation_id: Uuid,
        error: LinkError,
    ) -> SmallVec<[Effect<LinkAction>; 4]> {
        tracing::warn!(%error, "apple link failed before credential exchange");
        state.phase = LinkPhase::Failed;
        let provider_id = AuthProvider::Apple.id().to_string();
        smallvec![Effect::future(async move {
            Some(LinkAction::LinkFailed {
                correlation_id,
                provider_id,
                error,
            })
        })]
    }

    /// Build a password credential and hand it to the backend.
    fn begin_password_link(
        &self,
        state: &mut LinkState,
        env: &LinkEnvironment<B, X>,
        correlation_id: Uuid,
        email: &str,
        password: &str,
    ) -> SmallVec<[Effect<LinkAction>; 4]> {
        if state.in_flight.is_some() {
            tracing::warn!("dropping password link: a backend call is outstanding");
            return smallvec![Effect::None];
        }

        // No format validation here: the backend rejects bad input and the
        // error surfaces unchanged.
        state.phase = LinkPhase::CredentialExchanged;
        let credential = email_password_credential(email, password);
        Self::link_account(state, env, correlation_id, credential)
    }

    /// Start the backend link call for a constructed credential.
    fn link_account(
        state: &mut LinkState,
        env: &LinkEnvironment<B, X>,
        correlation_id: Uuid,
        credential: Credential,
    ) -> SmallVec<[Effect<LinkAction>; 4]> {
        let provider_id = credential.provider_id().to_string();
        state.in_flight = Some(provider_id.clone());
        let backend = env.backend.clone();

        smallvec![Effect::future(async move {
            match backend.link(credential).await {
                Ok(providers) => Some(LinkAction::LinkSucceeded {
                    correlation_id,
                    provider_id,
                    providers,
                }),
                Err(error) => Some(LinkAction::LinkFailed {
                    correlation_id,
                    provider_id,
                    error,
                }),
            }
        })]
    }

    /// Start the backend unlink call for a linked provider.
    fn begin_unlink(
        &self,
        state: &mut LinkState,
        env: &LinkEnvironment<B, X>,
        correlation_id: Uuid,
        provider: AuthProvider,
    ) -> SmallVec<[Effect<LinkAction>; 4]> {
        let provider_id = provider.id().to_string();
        state.in_flight = Some(provider_id.clone());
        let backend = env.backend.clone();

        smallvec![Effect::future(async move {
            match backend.unlink(&provider_id).await {
                Ok(providers) => Some(LinkAction::UnlinkSucceeded {
                    correlation_id,
                    provider_id,
                    providers,
                }),
                Err(error) => Some(LinkAction::UnlinkFailed {
                    correlation_id,
                    provider_id,
                    error,
                }),
            }
        })]
    }
}
