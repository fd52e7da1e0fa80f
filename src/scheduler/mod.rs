use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::info;

use crate::core::client::entitlement_source_trait::EntitlementSource;
use crate::core::state::runtime::entitlement::entitlement_runtime_state_manager::EntitlementRuntimeStateManager;
use crate::core::state::runtime::entitlement::entitlement_runtime_state_repository_trait::EntitlementRuntimeStateRepositoryTrait;

pub mod tasks;

/// Poll the entitlement every `every` until `shutdown` flips to `true`.
///
/// The first poll runs immediately. Failures are logged by the task and
/// never stop the loop.
pub fn spawn_entitlement_refresh<R>(
    source: Arc<dyn EntitlementSource>,
    manager: Arc<EntitlementRuntimeStateManager<R>>,
    every: Duration,
    mut shutdown: watch::Receiver<bool>,
) -> JoinHandle<()>
where
    R: EntitlementRuntimeStateRepositoryTrait + 'static,
{
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(every);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    let _ = tasks::entitlement_refresh::task::refresh_entitlement(source.as_ref(), &manager).await;
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        info!("Entitlement refresh stopping");
                        break;
                    }
                }
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::state::runtime::entitlement::entitlement_runtime_state_repository::EntitlementRuntimeStateRepository;
    use crate::domain::retention::model::RetentionEntitlement;
    use crate::errors::LogSearchError;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingSource {
        polls: AtomicUsize,
    }

    #[async_trait]
    impl EntitlementSource for CountingSource {
        async fn fetch_entitlement(&self) -> Result<RetentionEntitlement, LogSearchError> {
            self.polls.fetch_add(1, Ordering::SeqCst);
            Ok(RetentionEntitlement::new("team", 30))
        }
    }

    #[tokio::test(start_paused = true)]
    async fn polls_on_interval_until_shutdown() {
        let source = Arc::new(CountingSource {
            polls: AtomicUsize::new(0),
        });
        let manager = Arc::new(EntitlementRuntimeStateManager::new(
            EntitlementRuntimeStateRepository::new().shared(),
        ));
        let (tx, rx) = watch::channel(false);

        let handle = spawn_entitlement_refresh(
            source.clone(),
            manager.clone(),
            Duration::from_secs(60),
            rx,
        );

        tokio::time::sleep(Duration::from_secs(150)).await;
        tx.send(true).unwrap();
        handle.await.unwrap();

        // t = 0, 60, 120
        assert_eq!(source.polls.load(Ordering::SeqCst), 3);
        assert!(manager.current(chrono::Duration::minutes(5)).await.is_some());
    }
}
