use std::sync::Arc;

use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::core::client::entitlement_source_trait::EntitlementSource;
use crate::core::client::http_client::build_http_client;
use crate::core::client::log_search_client::LogSearchClient;
use crate::core::client::log_search_transport_trait::LogSearchTransport;
use crate::core::client::quota_client::QuotaClient;
use crate::core::config::LogScopeConfig;
use crate::core::state::cache::QueryCache;
use crate::core::state::runtime::entitlement::entitlement_runtime_state::EntitlementRuntimeState;
use crate::core::state::runtime::entitlement::entitlement_runtime_state_manager::EntitlementRuntimeStateManager;
use crate::core::state::runtime::entitlement::entitlement_runtime_state_repository::EntitlementRuntimeStateRepository;
use crate::domain::log::service::query_orchestrator::QueryOrchestrator;
use crate::domain::retention::model::RetentionEntitlement;
use crate::errors::LogSearchError;
use crate::scheduler::spawn_entitlement_refresh;

pub type EntitlementManager = EntitlementRuntimeStateManager<EntitlementRuntimeStateRepository>;

/// Shared collaborators, cheap to clone into tasks.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<LogScopeConfig>,
    pub log_search: Arc<dyn LogSearchTransport>,
    pub entitlement_source: Arc<dyn EntitlementSource>,
    pub entitlement: Arc<EntitlementManager>,
}

impl AppState {
    pub fn new(
        config: LogScopeConfig,
        log_search: Arc<dyn LogSearchTransport>,
        entitlement_source: Arc<dyn EntitlementSource>,
    ) -> Self {
        Self {
            config: Arc::new(config),
            log_search,
            entitlement_source,
            entitlement: Arc::new(EntitlementManager::new(
                EntitlementRuntimeStateRepository::new().shared(),
            )),
        }
    }

    /// Entitlement to enforce now; `None` (most restrictive) when missing or stale.
    pub async fn current_entitlement(&self) -> Option<RetentionEntitlement> {
        self.entitlement
            .current(self.config.entitlement_max_age())
            .await
    }

    /// A fresh viewer for the configured project, with its own cache.
    pub async fn new_orchestrator(&self) -> Result<QueryOrchestrator, LogSearchError> {
        let mut orchestrator = QueryOrchestrator::new(
            self.config.project_id.clone(),
            self.config.page_size,
            self.log_search.clone(),
            QueryCache::new(self.config.cache_ttl()),
        );
        orchestrator.set_entitlement(self.current_entitlement().await)?;
        Ok(orchestrator)
    }

    /// Start polling the entitlement at the configured interval.
    pub fn start_entitlement_refresh(&self, shutdown: watch::Receiver<bool>) -> JoinHandle<()> {
        spawn_entitlement_refresh(
            self.entitlement_source.clone(),
            self.entitlement.clone(),
            self.config.entitlement_poll_interval(),
            shutdown,
        )
    }

    /// Wakes after every entitlement poll. Follow each wake-up with
    /// [`AppState::sync_entitlement`] for every open viewer.
    pub fn watch_entitlement(&self) -> watch::Receiver<Arc<EntitlementRuntimeState>> {
        self.entitlement.subscribe()
    }

    /// Push the entitlement in force now (stale counts as missing) into a
    /// viewer. Returns whether its time range had to change.
    pub async fn sync_entitlement(
        &self,
        orchestrator: &mut QueryOrchestrator,
    ) -> Result<bool, LogSearchError> {
        orchestrator.set_entitlement(self.current_entitlement().await)
    }
}

/// Wire the HTTP collaborators from `config`. Both share one connection pool.
pub fn build_app_state(config: LogScopeConfig) -> Result<AppState, LogSearchError> {
    let http = build_http_client(config.http_timeout())?;
    let log_search = LogSearchClient::new(
        http.clone(),
        config.api_base_url.clone(),
        config.api_key.clone(),
    );
    let quota = QuotaClient::new(http, config.api_base_url.clone(), config.api_key.clone());

    Ok(AppState::new(config, Arc::new(log_search), Arc::new(quota)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::state::cache::QueryKey;
    use crate::core::state::runtime::entitlement::entitlement_runtime_state_repository_trait::EntitlementRuntimeStateRepositoryTrait;
    use crate::domain::log::model::LogPage;
    use crate::domain::retention::model::RangePreset;
    use crate::domain::retention::service::date_range_resolver::RangeSelection;
    use crate::scheduler::tasks::entitlement_refresh::task::refresh_entitlement;
    use async_trait::async_trait;
    use chrono::{Duration, Utc};

    struct MockLogSearchTransport;

    #[async_trait]
    impl LogSearchTransport for MockLogSearchTransport {
        async fn search(&self, _key: &QueryKey) -> Result<LogPage, LogSearchError> {
            Ok(LogPage::empty())
        }
    }

    struct MockEntitlementSource;

    #[async_trait]
    impl EntitlementSource for MockEntitlementSource {
        async fn fetch_entitlement(&self) -> Result<RetentionEntitlement, LogSearchError> {
            Ok(RetentionEntitlement::new("team", 30))
        }
    }

    fn app_state() -> AppState {
        let config = LogScopeConfig::from_lookup(|key| {
            (key == "LOGSCOPE_PROJECT_ID").then(|| "proj-1".to_string())
        })
        .unwrap();
        AppState::new(
            config,
            Arc::new(MockLogSearchTransport),
            Arc::new(MockEntitlementSource),
        )
    }

    #[tokio::test]
    async fn stale_entitlement_narrows_an_open_viewer() {
        let state = app_state();
        refresh_entitlement(state.entitlement_source.as_ref(), &state.entitlement)
            .await
            .unwrap();

        let mut viewer = state.new_orchestrator().await.unwrap();
        viewer
            .set_selection(RangeSelection::preset(RangePreset::Last7Days))
            .unwrap();
        assert!(!state.sync_entitlement(&mut viewer).await.unwrap());

        let mut updates = state.watch_entitlement();
        state
            .entitlement
            .repo
            .update(|s| s.fetched_at = Some(Utc::now() - Duration::minutes(10)))
            .await;
        assert!(updates.has_changed().unwrap());

        assert!(state.sync_entitlement(&mut viewer).await.unwrap());
        assert_eq!(viewer.entitlement(), None);
        assert_eq!(viewer.current_preset(), RangePreset::Last24Hours);
    }

    #[tokio::test(start_paused = true)]
    async fn poller_publishes_to_watchers() {
        let state = app_state();
        let mut updates = state.watch_entitlement();
        let (tx, rx) = watch::channel(false);

        let handle = state.start_entitlement_refresh(rx);
        updates.changed().await.unwrap();
        assert_eq!(
            state.current_entitlement().await,
            Some(RetentionEntitlement::new("team", 30))
        );

        tx.send(true).unwrap();
        handle.await.unwrap();
    }
}
