use std::sync::Arc;
use async_trait::async_trait;
use tokio::sync::watch;

use crate::core::state::runtime::entitlement::entitlement_runtime_state::EntitlementRuntimeState;

#[async_trait]
pub trait EntitlementRuntimeStateRepositoryTrait: Send + Sync {
    async fn get(&self) -> Arc<EntitlementRuntimeState>;

    async fn set(&self, state: EntitlementRuntimeState);

    /// Edit the snapshot in place and notify subscribers.
    async fn update<F>(&self, f: F)
    where
        F: FnOnce(&mut EntitlementRuntimeState) + Send + Sync;

    /// Receiver that wakes on every poll outcome, success or failure.
    fn subscribe(&self) -> watch::Receiver<Arc<EntitlementRuntimeState>>;
}
