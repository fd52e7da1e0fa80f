use std::sync::Arc;
use tokio::sync::watch;

use crate::core::state::runtime::entitlement::entitlement_runtime_state::EntitlementRuntimeState;
use crate::core::state::runtime::entitlement::entitlement_runtime_state_repository_trait::EntitlementRuntimeStateRepositoryTrait;

/// In-memory entitlement snapshot published over a `watch` channel, so open
/// viewers learn about re-polls without asking.
pub struct EntitlementRuntimeStateRepository {
    state: watch::Sender<Arc<EntitlementRuntimeState>>,
}

impl Default for EntitlementRuntimeStateRepository {
    fn default() -> Self {
        let (state, _) = watch::channel(Arc::default());
        Self { state }
    }
}

impl EntitlementRuntimeStateRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn shared(self) -> Arc<Self> {
        Arc::new(self)
    }
}

#[async_trait::async_trait]
impl EntitlementRuntimeStateRepositoryTrait for EntitlementRuntimeStateRepository {
    async fn get(&self) -> Arc<EntitlementRuntimeState> {
        self.state.borrow().clone()
    }

    async fn set(&self, new_state: EntitlementRuntimeState) {
        self.state.send_replace(Arc::new(new_state));
    }

    async fn update<F>(&self, f: F)
    where
        F: FnOnce(&mut EntitlementRuntimeState) + Send + Sync,
    {
        // Snapshots already handed out keep their old value.
        self.state.send_modify(|current| f(Arc::make_mut(current)));
    }

    fn subscribe(&self) -> watch::Receiver<Arc<EntitlementRuntimeState>> {
        self.state.subscribe()
    }
}
