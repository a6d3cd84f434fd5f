//! Owner identity lookups with a TTL cache in front.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;

/// An account known to the identity backend.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct UserAccount {
    pub id: String,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
}

/// Resolves owner ids to accounts.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Looks up the account for an owner. Returns `None` when the owner
    /// is unknown.
    async fn account(&self, owner_id: &str) -> Option<UserAccount>;
}

/// TTL cache in front of another provider.
///
/// Hits are served from the cache; misses are not cached, so an account
/// that appears later is picked up on the next lookup.
pub struct CachedIdentityProvider {
    inner: Arc<dyn IdentityProvider>,
    cache: moka::sync::Cache<String, UserAccount>,
}

impl CachedIdentityProvider {
    pub fn new(inner: Arc<dyn IdentityProvider>, ttl: Duration) -> Self {
        let cache = moka::sync::Cache::builder()
            .max_capacity(1000)
            .time_to_live(ttl)
            .build();
        Self { inner, cache }
    }

    pub async fn account(&self, owner_id: &str) -> Option<UserAccount> {
        if let Some(account) = self.cache.get(owner_id) {
            return Some(account);
        }
        let account = self.inner.account(owner_id).await?;
        self.cache.insert(owner_id.to_string(), account.clone());
        Some(account)
    }
}

/// Fixed in-memory provider for tests and demos.
pub struct StaticIdentityProvider {
    accounts: Vec<UserAccount>,
}

impl StaticIdentityProvider {
    pub fn new(accounts: Vec<UserAccount>) -> Self {
        Self { accounts }
    }

    pub fn single(account: UserAccount) -> Self {
        Self::new(vec![account])
    }
}

#[async_trait]
impl IdentityProvider for StaticIdentityProvider {
    async fn account(&self, owner_id: &str) -> Option<UserAccount> {
        self.accounts.iter().find(|a| a.id == owner_id).cloned()
    }
}
