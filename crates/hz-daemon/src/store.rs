//! In-process administrator settings store.
//!
//! Holds the authoritative [`TimeRestrictionPolicy`] when the daemon is
//! configured with `settings.source: memory`. The gate reads it through
//! [`StoreSettingsSource`], the same boundary a remote settings API uses, so
//! the cache/TTL/invalidation behavior is identical in both modes.

use std::sync::Arc;

use async_trait::async_trait;
use hz_gate::{FetchError, PolicyError, SettingsSource, TimeRestrictionPolicy};
use tokio::sync::RwLock;

#[derive(Debug)]
pub struct SettingsStore {
    time_restrictions: RwLock<TimeRestrictionPolicy>,
}

impl SettingsStore {
    pub fn new(initial: TimeRestrictionPolicy) -> Self {
        Self {
            time_restrictions: RwLock::new(initial),
        }
    }

    pub async fn time_restrictions(&self) -> TimeRestrictionPolicy {
        *self.time_restrictions.read().await
    }

    /// Replace the policy. Rejects out-of-range hours; the stored value is
    /// unchanged on error.
    pub async fn set_time_restrictions(
        &self,
        policy: TimeRestrictionPolicy,
    ) -> Result<(), PolicyError> {
        policy.validate()?;
        *self.time_restrictions.write().await = policy;
        Ok(())
    }
}

/// [`SettingsSource`] backed by a [`SettingsStore`].
#[derive(Clone, Debug)]
pub struct StoreSettingsSource {
    store: Arc<SettingsStore>,
}

impl StoreSettingsSource {
    pub fn new(store: Arc<SettingsStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl SettingsSource for StoreSettingsSource {
    fn source_name(&self) -> &'static str {
        "memory"
    }

    async fn fetch_time_restrictions(&self) -> Result<TimeRestrictionPolicy, FetchError> {
        Ok(self.store.time_restrictions().await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn invalid_update_keeps_previous_value() {
        let store = SettingsStore::new(TimeRestrictionPolicy::FALLBACK);
        let bad = TimeRestrictionPolicy {
            block_start_hour: 99,
            ..TimeRestrictionPolicy::FALLBACK
        };
        assert!(store.set_time_restrictions(bad).await.is_err());
        assert_eq!(
            store.time_restrictions().await,
            TimeRestrictionPolicy::FALLBACK
        );
    }

    #[tokio::test]
    async fn source_reads_current_store_value() {
        let store = Arc::new(SettingsStore::new(TimeRestrictionPolicy::FALLBACK));
        let src = StoreSettingsSource::new(Arc::clone(&store));

        store
            .set_time_restrictions(TimeRestrictionPolicy::DISABLED)
            .await
            .unwrap();
        assert_eq!(
            src.fetch_time_restrictions().await.unwrap(),
            TimeRestrictionPolicy::DISABLED
        );
    }
}
