//! Auth backend adapter trait.

use crate::credential::Credential;
use crate::error::Result;
use crate::state::ProviderData;

/// The boundary to the identity backend.
///
/// Both operations are asynchronous and idempotent from the caller's
/// perspective on retry; any retry policy is owned by the caller, never by
/// the linking flow (every retry is a fresh user-initiated action).
///
/// On success both calls return the updated provider list, which the flow
/// adopts wholesale. Nothing is mutated locally before backend
/// confirmation, so a failure needs no rollback.
pub trait AuthBackend: Send + Sync {
    /// Link `credential` to the current user.
    ///
    /// # Errors
    ///
    /// Returns [`crate::LinkError::Backend`] if the backend rejects the
    /// credential (already in use, invalid, provider already linked, ...).
    fn link(
        &self,
        credential: Credential,
    ) -> impl std::future::Future<Output = Result<Vec<ProviderData>>> + Send;

    /// Unlink `provider_id` from the current user.
    ///
    /// # Errors
    ///
    /// Returns [`crate::LinkError::Backend`] if the backend rejects the
    /// request (provider not linked, last sign-in method, ...).
    fn unlink(
        &self,
        provider_id: &str,
    ) -> impl std::future::Future<Output = Result<Vec<ProviderData>>> + Send;
}
