use std::sync::Arc;
use chrono::{Duration, Utc};
use tokio::sync::watch;
use tracing::debug;

use crate::core::state::runtime::entitlement::entitlement_runtime_state::EntitlementRuntimeState;
use crate::core::state::runtime::entitlement::entitlement_runtime_state_repository_trait::EntitlementRuntimeStateRepositoryTrait;
use crate::domain::retention::model::RetentionEntitlement;

pub struct EntitlementRuntimeStateManager<R: EntitlementRuntimeStateRepositoryTrait> {
    pub(crate) repo: Arc<R>,
}

impl<R: EntitlementRuntimeStateRepositoryTrait> EntitlementRuntimeStateManager<R> {
    pub fn new(repo: Arc<R>) -> Self {
        Self { repo }
    }

    /// Store a freshly fetched entitlement.
    pub async fn record(&self, entitlement: RetentionEntitlement) {
        let now = Utc::now();
        self.repo.update(|state| state.record(entitlement, now)).await;
    }

    /// Record a failed poll (the previous entitlement is kept until it goes stale).
    pub async fn mark_error(&self, message: String) {
        let now = Utc::now();
        self.repo.update(|state| state.mark_error(message, now)).await;
    }

    /// Entitlement to enforce right now.
    ///
    /// `None` when nothing was fetched yet or the last fetch is older than
    /// `max_age`; callers then apply the most restrictive retention.
    pub async fn current(&self, max_age: Duration) -> Option<RetentionEntitlement> {
        let state = self.repo.get().await;
        let fresh = state.fresh(max_age, Utc::now()).cloned();
        if fresh.is_none() && state.entitlement.is_some() {
            debug!("Entitlement is stale; falling back to the most restrictive retention");
        }
        fresh
    }

    /// Wakes after every poll; re-read with [`Self::current`] to apply staleness.
    pub fn subscribe(&self) -> watch::Receiver<Arc<EntitlementRuntimeState>> {
        self.repo.subscribe()
    }

    pub async fn snapshot(&self) -> Arc<EntitlementRuntimeState> {
        self.repo.get().await
    }

    pub async fn reset(&self) {
        self.repo.set(EntitlementRuntimeState::default()).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::state::runtime::entitlement::entitlement_runtime_state_repository::EntitlementRuntimeStateRepository;

    fn manager() -> EntitlementRuntimeStateManager<EntitlementRuntimeStateRepository> {
        EntitlementRuntimeStateManager::new(EntitlementRuntimeStateRepository::new().shared())
    }

    #[tokio::test]
    async fn nothing_fetched_means_no_entitlement() {
        let m = manager();
        assert_eq!(m.current(Duration::minutes(5)).await, None);
    }

    #[tokio::test]
    async fn fresh_entitlement_is_returned() {
        let m = manager();
        m.record(RetentionEntitlement::new("team", 30)).await;
        assert_eq!(
            m.current(Duration::minutes(5)).await,
            Some(RetentionEntitlement::new("team", 30))
        );
    }

    #[tokio::test]
    async fn stale_entitlement_fails_closed() {
        let m = manager();
        m.repo
            .update(|s| {
                s.record(
                    RetentionEntitlement::new("team", 30),
                    Utc::now() - Duration::minutes(10),
                )
            })
            .await;

        assert_eq!(m.current(Duration::minutes(5)).await, None);
    }

    #[tokio::test]
    async fn errors_keep_the_last_entitlement() {
        let m = manager();
        m.record(RetentionEntitlement::new("starter", 7)).await;
        m.mark_error("quota endpoint returned 503".into()).await;

        let snap = m.snapshot().await;
        assert_eq!(snap.last_error_message.as_deref(), Some("quota endpoint returned 503"));
        assert!(m.current(Duration::minutes(5)).await.is_some());

        m.reset().await;
        assert!(m.snapshot().await.entitlement.is_none());
    }
}
