//! Mock auth backend for testing.

// Test-support code: lock poisoning can only come from a panicking test.
#![allow(clippy::unwrap_used)]

use std::future::Future;
use std::sync::{Arc, Mutex};

use crate::credential::Credential;
use crate::error::{LinkError, Result};
use crate::providers::AuthBackend;
use crate::state::ProviderData;

/// Mock auth backend.
///
/// Keeps the provider list in memory and records the last credential it
/// was asked to link, so tests can verify the exact credential the flow
/// constructed.
#[derive(Debug, Clone)]
pub struct MockAuthBackend {
    /// Whether to simulate success or failure.
    pub should_succeed: bool,

    providers: Arc<Mutex<Vec<ProviderData>>>,
    last_credential: Arc<Mutex<Option<Credential>>>,
}

impl MockAuthBackend {
    /// Create a mock backend with the given linked providers.
    #[must_use]
    pub fn new(providers: Vec<ProviderData>) -> Self {
        Self {
            should_succeed: true,
            providers: Arc::new(Mutex::new(providers)),
            last_credential: Arc::new(Mutex::new(None)),
        }
    }

    /// Create a mock backend that will reject every request.
    #[must_use]
    pub fn failing(providers: Vec<ProviderData>) -> Self {
        Self {
            should_succeed: false,
            providers: Arc::new(Mutex::new(providers)),
            last_credential: Arc::new(Mutex::new(None)),
        }
    }

    /// Current provider list snapshot (for assertions).
    #[must_use]
    pub fn providers(&self) -> Vec<ProviderData> {
        self.providers.lock().unwrap().clone()
    }

    /// The last credential passed to `link` (for assertions).
    #[must_use]
    pub fn last_credential(&self) -> Option<Credential> {
        self.last_credential.lock().unwrap().clone()
    }
}

impl Default for MockAuthBackend {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl AuthBackend for MockAuthBackend {
    fn link(
        &self,
        credential: Credential,
    ) -> impl Future<Output = Result<Vec<ProviderData>>> + Send {
        let should_succeed = self.should_succeed;
        let providers = Arc::clone(&self.providers);
        let last_credential = Arc::clone(&self.last_credential);

        async move {
            *last_credential.lock().unwrap() = Some(credential.clone());

            if !should_succeed {
                return Err(LinkError::Backend("credential already in use".to_string()));
            }

            let mut providers = providers.lock().unwrap();
            let provider_id = credential.provider_id().to_string();
            if providers.iter().any(|p| p.provider_id == provider_id) {
                return Err(LinkError::Backend("provider already linked".to_string()));
            }

            providers.push(ProviderData::bare(
                &provider_id,
                &format!("{provider_id}-uid"),
            ));
            Ok(providers.clone())
        }
    }

    fn unlink(&self, provider_id: &str) -> impl Future<Output = Result<Vec<ProviderData>>> + Send {
        let should_succeed = self.should_succeed;
        let providers = Arc::clone(&self.providers);
        let provider_id = provider_id.to_string();

        async move {
            if !should_succeed {
                return Err(LinkError::Backend("unlink rejected".to_string()));
            }

            let mut providers = providers.lock().unwrap();
            if !providers.iter().any(|p| p.provider_id == provider_id) {
                return Err(LinkError::Backend("no such provider".to_string()));
            }

            providers.retain(|p| p.provider_id != provider_id);
            Ok(providers.clone())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::credential::email_password_credential;

    #[tokio::test]
    async fn link_appends_and_returns_the_updated_list() {
        let backend = MockAuthBackend::default();

        let updated = backend
            .link(email_password_credential("user@example.com", "hunter2"))
            .await
            .unwrap();

        assert_eq!(updated.len(), 1);
        assert_eq!(updated[0].provider_id, "password");
        assert!(backend.last_credential().is_some());
    }

    #[tokio::test]
    async fn link_rejects_an_already_linked_provider() {
        let backend = MockAuthBackend::new(vec![ProviderData::bare("password", "u1")]);

        let result = backend
            .link(email_password_credential("user@example.com", "hunter2"))
            .await;

        assert!(matches!(result, Err(LinkError::Backend(_))));
        assert_eq!(backend.providers().len(), 1);
    }

    #[tokio::test]
    async fn failing_backend_leaves_the_list_untouched() {
        let backend = MockAuthBackend::failing(vec![ProviderData::bare("password", "u1")]);

        let result = backend.unlink("password").await;

        assert!(matches!(result, Err(LinkError::Backend(_))));
        assert_eq!(backend.providers().len(), 1);
    }
}
