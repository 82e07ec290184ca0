//! Provider registry and the linking-screen projection.
//!
//! The registry answers three questions for the presentation layer: which
//! provider does a string name, is a provider currently linked, and what
//! rows should the linking screen show. Row state is *derived* from the
//! account on every call; nothing here is stored.

use serde::{Deserialize, Serialize};

use crate::state::{AuthProvider, LinkedAccount};

/// One row of the linking screen.
///
/// `is_checked` is a pure function of the account's current provider list
/// at projection time; it is never independent mutable state, so it cannot
/// drift from `provider_data`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkRow {
    /// Display title for the row.
    pub title: String,

    /// Stable provider ID, round-tripped back in `SelectProvider`.
    pub provider_id: String,

    /// True iff the provider is currently linked.
    pub is_checked: bool,
}

/// Map a stable ID or display title to a provider.
///
/// Total over known IDs and titles; `None` for anything else.
#[must_use]
pub fn resolve(input: &str) -> Option<AuthProvider> {
    AuthProvider::resolve(input)
}

/// True iff `provider` is currently linked to `account`.
#[must_use]
pub fn is_linked(provider: AuthProvider, account: &LinkedAccount) -> bool {
    account.has_provider(provider.id())
}

/// Rows for the linking screen, in fixed priority order.
///
/// Structurally non-linkable providers (anonymous, custom auth) are
/// filtered out regardless of what `provider_data` claims. The ordering
/// comes from [`AuthProvider::ALL`] and is never sorted dynamically.
#[must_use]
pub fn list_linkable(account: &LinkedAccount) -> Vec<LinkRow> {
    AuthProvider::ALL
        .into_iter()
        .filter(|provider| provider.is_linkable())
        .map(|provider| LinkRow {
            title: provider.title().to_string(),
            provider_id: provider.id().to_string(),
            is_checked: account.has_provider(provider.id()),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::ProviderData;

    #[test]
    fn rows_keep_fixed_priority_order() {
        let rows = list_linkable(&LinkedAccount::default());
        let ids: Vec<&str> = rows.iter().map(|r| r.provider_id.as_str()).collect();
        assert_eq!(ids, ["password", "apple.com", "phone", "google.com"]);
    }

    #[test]
    fn non_linkable_providers_never_appear() {
        // Even a corrupt provider list claiming anonymous/custom entries
        // must not surface them as rows.
        let account = LinkedAccount::new(
            "u1",
            vec![
                ProviderData::bare("anonymous", "u1"),
                ProviderData::bare("custom", "u1"),
            ],
        );

        let rows = list_linkable(&account);
        assert!(rows.iter().all(|r| r.provider_id != "anonymous"));
        assert!(rows.iter().all(|r| r.provider_id != "custom"));
        assert!(rows.iter().all(|r| !r.is_checked));
    }

    #[test]
    fn is_checked_is_derived_from_provider_data() {
        let mut account = LinkedAccount::new("u1", vec![ProviderData::bare("password", "u1")]);

        let checked = |rows: &[LinkRow], id: &str| {
            rows.iter().any(|r| r.provider_id == id && r.is_checked)
        };

        let rows = list_linkable(&account);
        assert!(checked(&rows, "password"));
        assert!(!checked(&rows, "apple.com"));

        // Link apple, unlink password: the projection follows the data.
        account
            .provider_data
            .push(ProviderData::bare("apple.com", "apple-uid"));
        account.provider_data.retain(|p| p.provider_id != "password");

        let rows = list_linkable(&account);
        assert!(!checked(&rows, "password"));
        assert!(checked(&rows, "apple.com"));
    }

    #[test]
    fn is_linked_matches_membership() {
        let account = LinkedAccount::new("u1", vec![ProviderData::bare("apple.com", "a")]);
        assert!(is_linked(AuthProvider::Apple, &account));
        assert!(!is_linked(AuthProvider::Password, &account));
    }

    #[test]
    fn resolve_delegates_to_the_provider_table() {
        assert_eq!(resolve("phone"), Some(AuthProvider::Phone));
        assert_eq!(resolve("not-a-provider"), None);
    }
}
