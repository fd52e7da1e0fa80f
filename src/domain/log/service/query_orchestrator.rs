use std::collections::HashMap;
use std::sync::{Arc, Weak};

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use crate::api::dto::paginated_response::PaginatedResponse;
use crate::core::client::log_search_transport_trait::LogSearchTransport;
use crate::core::state::cache::{QueryCache, QueryKey};
use crate::domain::log::model::{LogFilters, LogPage, LogRecord, LogType};
use crate::domain::log::service::cursor_paginator::{CursorPaginator, PageScope, PageSummary};
use crate::domain::log::service::query_state::QueryState;
use crate::domain::retention::model::{RangePreset, RetentionEntitlement, TimeInterval};
use crate::domain::retention::service::date_range_resolver::{
    interval_within_policy, resolve_at, ClampNotice, RangeSelection,
};
use crate::domain::retention::service::retention_policy::{
    describe_restriction, is_preset_allowed, preset_options, widest_allowed_at_most, PresetOption,
};
use crate::errors::LogSearchError;

/// What [`QueryOrchestrator::prepare`] decided to do for the current key.
pub enum Dispatch {
    /// Served from the cache; state is already `Success`.
    Cached(Arc<LogPage>),
    /// The same key is already being fetched; its completion will be applied.
    AlreadyInFlight(QueryKey),
    /// Run the ticket and hand the result back to [`QueryOrchestrator::apply`].
    Fetch(QueryTicket),
}

/// Liveness marker for one fetch. The orchestrator only holds a [`Weak`] to
/// it, so a ticket or completion dropped without being applied frees its key.
#[derive(Debug)]
struct InFlightToken;

/// One outstanding fetch, tagged with the key it was issued for.
///
/// Runs without borrowing the orchestrator, so the caller may keep changing
/// the selection while it is in flight.
pub struct QueryTicket {
    key: QueryKey,
    transport: Arc<dyn LogSearchTransport>,
    token: Arc<InFlightToken>,
}

impl QueryTicket {
    pub fn key(&self) -> &QueryKey {
        &self.key
    }

    pub async fn execute(self) -> CompletedQuery {
        let result = self.transport.search(&self.key).await;
        CompletedQuery {
            key: self.key,
            result,
            _token: self.token,
        }
    }
}

#[derive(Debug)]
pub struct CompletedQuery {
    pub key: QueryKey,
    pub result: Result<LogPage, LogSearchError>,
    _token: Arc<InFlightToken>,
}

/// The last page that reached the screen, with the position it was shown at.
#[derive(Debug, Clone)]
struct ShownPage {
    key: QueryKey,
    page: Arc<LogPage>,
    summary: PageSummary,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyOutcome {
    Applied,
    /// The response belonged to a key that is no longer current.
    StaleDiscarded,
}

/// Drives one log viewer: time range, filters, paging, cache and query state.
///
/// Responses are applied last-request-wins: every fetch is tagged with its
/// [`QueryKey`] and a completion whose key is no longer current is dropped.
pub struct QueryOrchestrator {
    transport: Arc<dyn LogSearchTransport>,
    cache: QueryCache,
    project_id: String,
    log_type: LogType,
    page_size: u32,
    filters: LogFilters,
    selection: RangeSelection,
    entitlement: Option<RetentionEntitlement>,
    interval: Option<TimeInterval>,
    clamp: Option<ClampNotice>,
    paginator: CursorPaginator,
    state: QueryState,
    last_success: Option<ShownPage>,
    in_flight: HashMap<QueryKey, Weak<InFlightToken>>,
}

impl QueryOrchestrator {
    pub fn new(
        project_id: impl Into<String>,
        page_size: u32,
        transport: Arc<dyn LogSearchTransport>,
        cache: QueryCache,
    ) -> Self {
        Self {
            transport,
            cache,
            project_id: project_id.into(),
            log_type: LogType::default(),
            page_size,
            filters: LogFilters::new(),
            selection: RangeSelection::default(),
            entitlement: None,
            interval: None,
            clamp: None,
            paginator: CursorPaginator::new(),
            state: QueryState::Idle,
            last_success: None,
            in_flight: HashMap::new(),
        }
    }

    // ============================================================
    // Accessors
    // ============================================================

    pub fn state(&self) -> &QueryState {
        &self.state
    }

    pub fn selection(&self) -> &RangeSelection {
        &self.selection
    }

    pub fn interval(&self) -> Option<&TimeInterval> {
        self.interval.as_ref()
    }

    pub fn clamp_notice(&self) -> Option<&ClampNotice> {
        self.clamp.as_ref()
    }

    pub fn entitlement(&self) -> Option<&RetentionEntitlement> {
        self.entitlement.as_ref()
    }

    pub fn filters(&self) -> &LogFilters {
        &self.filters
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    pub fn cache(&self) -> &QueryCache {
        &self.cache
    }

    pub fn cache_mut(&mut self) -> &mut QueryCache {
        &mut self.cache
    }

    /// Whether a live ticket exists for `key`.
    pub fn is_in_flight(&self, key: &QueryKey) -> bool {
        self.in_flight
            .get(key)
            .is_some_and(|token| token.strong_count() > 0)
    }

    /// Time-range menu for the current entitlement.
    pub fn preset_options(&self) -> Vec<PresetOption> {
        preset_options(self.entitlement.as_ref())
    }

    /// Key of the page that should be on screen, once an interval is resolved.
    pub fn current_key(&self) -> Option<QueryKey> {
        let interval = self.interval.clone()?;
        Some(QueryKey {
            project_id: self.project_id.clone(),
            log_type: self.log_type,
            interval,
            cursor: self.paginator.current_cursor().cloned(),
            page_size: self.page_size,
            filters: self.filters.clone(),
        })
    }

    // ============================================================
    // Inputs
    // ============================================================

    pub fn set_selection(&mut self, selection: RangeSelection) -> Result<(), LogSearchError> {
        self.set_selection_at(selection, Utc::now())
    }

    /// Resolve `selection` against the current entitlement and reset paging.
    ///
    /// Disallowed presets are refused here, before the resolver sees them.
    pub fn set_selection_at(
        &mut self,
        selection: RangeSelection,
        now: DateTime<Utc>,
    ) -> Result<(), LogSearchError> {
        if let RangeSelection::Preset { preset } = selection {
            if !is_preset_allowed(preset, self.entitlement.as_ref()) {
                let reason = describe_restriction(preset, self.entitlement.as_ref())
                    .unwrap_or_else(|| "outside retention window".into());
                warn!(preset = preset.as_code(), "Refusing disallowed preset");
                return Err(LogSearchError::PolicyViolation {
                    preset: preset.as_code().to_string(),
                    reason,
                });
            }
        }

        let resolution = resolve_at(&selection, self.entitlement.as_ref(), now)?;
        self.selection = selection;
        self.interval = Some(resolution.interval);
        self.clamp = resolution.clamp;
        self.paginator.reset();
        self.sync_scope();

        debug!(
            preset = self.selection.kind().as_code(),
            clamped = self.clamp.is_some(),
            "Time range selection applied"
        );
        Ok(())
    }

    pub fn set_filters(&mut self, filters: LogFilters) {
        self.filters = filters;
        self.sync_scope();
    }

    pub fn set_filter(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let mut filters = self.filters.clone();
        filters.set(key, value);
        self.set_filters(filters);
    }

    pub fn set_page_size(&mut self, page_size: u32) {
        self.page_size = page_size;
        self.sync_scope();
    }

    pub fn set_entitlement(
        &mut self,
        entitlement: Option<RetentionEntitlement>,
    ) -> Result<bool, LogSearchError> {
        self.set_entitlement_at(entitlement, Utc::now())
    }

    /// Swap in a re-polled entitlement.
    ///
    /// An interval that still fits is kept as-is, so the query key and the
    /// cached page stay valid. Otherwise the selection is re-resolved: presets
    /// narrow to the widest one still allowed, custom ranges are re-clamped.
    /// Returns whether the interval changed.
    pub fn set_entitlement_at(
        &mut self,
        entitlement: Option<RetentionEntitlement>,
        now: DateTime<Utc>,
    ) -> Result<bool, LogSearchError> {
        self.entitlement = entitlement;

        let Some(interval) = &self.interval else {
            return Ok(false);
        };
        if interval_within_policy(interval, self.entitlement.as_ref(), now) {
            return Ok(false);
        }

        let fallback = RangeSelection::preset(widest_allowed_at_most(
            self.selection.kind(),
            self.entitlement.as_ref(),
        ));
        let next = match self.selection {
            RangeSelection::Preset { .. } => fallback,
            RangeSelection::Custom { .. } => {
                match resolve_at(&self.selection, self.entitlement.as_ref(), now) {
                    Ok(_) => self.selection,
                    Err(e) => {
                        warn!(error = %e, "Custom range no longer retained; falling back to a preset");
                        fallback
                    }
                }
            }
        };

        info!(
            from = self.selection.kind().as_code(),
            to = next.kind().as_code(),
            "Entitlement narrowed; re-resolving time range"
        );
        self.set_selection_at(next, now)?;
        Ok(true)
    }

    fn sync_scope(&mut self) {
        let Some(interval) = self.interval.clone() else {
            return;
        };
        self.paginator.sync_scope(&PageScope {
            interval,
            filters: self.filters.clone(),
            page_size: self.page_size,
        });
    }

    fn ensure_resolved(&mut self) -> Result<(), LogSearchError> {
        if self.interval.is_none() {
            self.set_selection_at(self.selection, Utc::now())?;
        }
        Ok(())
    }

    // ============================================================
    // Paging
    // ============================================================

    pub fn load_next(&mut self) -> bool {
        self.paginator.load_next()
    }

    pub fn load_previous(&mut self) -> bool {
        self.paginator.load_previous()
    }

    pub fn reset(&mut self) {
        self.paginator.reset();
    }

    pub fn can_go_next(&self) -> bool {
        self.paginator.can_go_next()
    }

    pub fn can_go_previous(&self) -> bool {
        self.paginator.can_go_previous()
    }

    pub fn page_index(&self) -> usize {
        self.paginator.page_index()
    }

    /// Position of the page on screen. While the next page loads this still
    /// describes the rows being shown, not the page index already moved to.
    pub fn page_summary(&self) -> Option<PageSummary> {
        self.shown().map(|shown| shown.summary.clone())
    }

    /// Response view of the page on screen.
    pub fn paginated_response(&self) -> Option<PaginatedResponse<LogRecord>> {
        let shown = self.shown()?;
        Some(PaginatedResponse {
            items: shown.page.records.clone(),
            total: shown.page.total_count,
            page: shown.summary.clone(),
            clamp_notice: self.clamp.as_ref().map(ClampNotice::message),
        })
    }

    fn shown(&self) -> Option<&ShownPage> {
        let page = self.state.data()?;
        self.last_success
            .as_ref()
            .filter(|shown| Arc::ptr_eq(&shown.page, page))
    }

    // ============================================================
    // Query cycle
    // ============================================================

    /// Start the query for the current key.
    pub fn prepare(&mut self) -> Result<Dispatch, LogSearchError> {
        self.ensure_resolved()?;
        let Some(key) = self.current_key() else {
            return Err(LogSearchError::InvalidRange("no time range selected".into()));
        };

        if let Some(page) = self.cache.get(&key) {
            debug!(key = %key, "Serving page from cache");
            self.show(key, page.clone());
            return Ok(Dispatch::Cached(page));
        }

        self.state = QueryState::Pending {
            previous: self.previous_for(&key),
        };

        self.in_flight.retain(|_, token| token.strong_count() > 0);
        if self.in_flight.contains_key(&key) {
            debug!(key = %key, "Query already in flight");
            return Ok(Dispatch::AlreadyInFlight(key));
        }

        let token = Arc::new(InFlightToken);
        self.in_flight.insert(key.clone(), Arc::downgrade(&token));
        Ok(Dispatch::Fetch(QueryTicket {
            key,
            transport: self.transport.clone(),
            token,
        }))
    }

    /// Re-issue the current query, bypassing the cache. Paging is kept.
    pub fn prepare_refresh(&mut self) -> Result<Dispatch, LogSearchError> {
        if let Some(key) = self.current_key() {
            self.cache.invalidate(&key);
        }
        self.prepare()
    }

    /// Apply a finished fetch if its key is still the current one.
    pub fn apply(&mut self, completed: CompletedQuery) -> ApplyOutcome {
        let CompletedQuery {
            key,
            result,
            _token: token,
        } = completed;
        if self
            .in_flight
            .get(&key)
            .is_some_and(|live| std::ptr::eq(live.as_ptr(), Arc::as_ptr(&token)))
        {
            self.in_flight.remove(&key);
        }

        let result = result.map(Arc::new);
        if let Ok(page) = &result {
            self.cache.insert(key.clone(), page.clone());
        }

        let current = self.current_key();
        if current.as_ref() != Some(&key) {
            debug!(
                stale = %key,
                current = %current.map(|k| k.to_string()).unwrap_or_default(),
                "Discarding stale query response"
            );
            return ApplyOutcome::StaleDiscarded;
        }

        match result {
            Ok(page) => {
                info!(
                    key = %key,
                    rows = page.records.len(),
                    total = page.total_count,
                    "Log page loaded"
                );
                self.show(key, page);
            }
            Err(reason) => {
                warn!(key = %key, error = %reason, "Log query failed");
                self.state = QueryState::Error { reason };
            }
        }
        ApplyOutcome::Applied
    }

    /// Prepare, fetch and apply in one go.
    pub async fn search(&mut self) -> Result<&QueryState, LogSearchError> {
        let dispatch = self.prepare()?;
        self.drive(dispatch).await;
        Ok(&self.state)
    }

    /// Refresh in one go. See [`QueryOrchestrator::prepare_refresh`].
    pub async fn refresh(&mut self) -> Result<&QueryState, LogSearchError> {
        let dispatch = self.prepare_refresh()?;
        self.drive(dispatch).await;
        Ok(&self.state)
    }

    async fn drive(&mut self, dispatch: Dispatch) {
        if let Dispatch::Fetch(ticket) = dispatch {
            let completed = ticket.execute().await;
            self.apply(completed);
        }
    }

    fn show(&mut self, key: QueryKey, page: Arc<LogPage>) {
        self.paginator.record_response(page.next_cursor.clone());
        let summary = self
            .paginator
            .summary(page.records.len(), page.total_count, self.page_size);
        self.state = QueryState::Success(page.clone());
        self.last_success = Some(ShownPage { key, page, summary });
    }

    /// Page to keep on screen while `key` loads: only if the interval is unchanged.
    fn previous_for(&self, key: &QueryKey) -> Option<Arc<LogPage>> {
        self.last_success
            .as_ref()
            .filter(|shown| shown.key.interval == key.interval)
            .map(|shown| shown.page.clone())
    }

    /// Drop every cached page for this project.
    pub fn invalidate_cache(&mut self) -> usize {
        self.cache.invalidate_scope(&self.project_id)
    }

    /// Convenience for hosts that only care about the current preset.
    pub fn current_preset(&self) -> RangePreset {
        self.selection.kind()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::log::model::Cursor;
    use async_trait::async_trait;
    use chrono::{Duration, TimeZone};
    use serde_json::json;
    use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
    use std::sync::Mutex;

    struct MockLogSearchTransport {
        calls: Mutex<Vec<QueryKey>>,
        fail: AtomicBool,
        delay_ms: AtomicU64,
    }

    impl MockLogSearchTransport {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                calls: Mutex::new(Vec::new()),
                fail: AtomicBool::new(false),
                delay_ms: AtomicU64::new(0),
            })
        }

        fn call_count(&self) -> usize {
            self.calls.lock().unwrap().len()
        }

        fn cursors(&self) -> Vec<Option<String>> {
            self.calls
                .lock()
                .unwrap()
                .iter()
                .map(|k| k.cursor.as_ref().map(|c| c.as_str().to_string()))
                .collect()
        }
    }

    /// 35 rows, 10 per page, cursors "c1".."c3".
    fn page_for(key: &QueryKey) -> LogPage {
        let page_no = match key.cursor.as_ref().map(Cursor::as_str) {
            None => 0,
            Some(c) => c.trim_start_matches('c').parse::<usize>().unwrap(),
        };
        let rows = if page_no == 3 { 5 } else { 10 };
        let records = (0..rows)
            .map(|i| {
                serde_json::from_value(json!({
                    "@timestamp": key.interval.start_rfc3339(),
                    "request_id": format!("{}#{}", key.interval.start_rfc3339(), page_no * 10 + i),
                }))
                .unwrap()
            })
            .collect();

        LogPage {
            records,
            total_count: 35,
            next_cursor: (page_no < 3).then(|| Cursor::new(format!("c{}", page_no + 1))),
        }
    }

    #[async_trait]
    impl LogSearchTransport for MockLogSearchTransport {
        async fn search(&self, key: &QueryKey) -> Result<LogPage, LogSearchError> {
            self.calls.lock().unwrap().push(key.clone());
            let delay = self.delay_ms.load(Ordering::SeqCst);
            if delay > 0 {
                tokio::time::sleep(std::time::Duration::from_millis(delay)).await;
            }
            if self.fail.load(Ordering::SeqCst) {
                return Err(LogSearchError::Transport {
                    status: Some(http::StatusCode::SERVICE_UNAVAILABLE),
                    message: "backend down".into(),
                });
            }
            Ok(page_for(key))
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 15, 10, 30, 0).unwrap()
    }

    fn orchestrator(transport: Arc<MockLogSearchTransport>) -> QueryOrchestrator {
        let mut o = QueryOrchestrator::new("proj-1", 10, transport, QueryCache::default());
        o.set_entitlement_at(Some(RetentionEntitlement::new("team", 30)), now())
            .unwrap();
        o.set_selection_at(RangeSelection::preset(RangePreset::Last24Hours), now())
            .unwrap();
        o
    }

    fn fetch(dispatch: Dispatch) -> QueryTicket {
        match dispatch {
            Dispatch::Fetch(ticket) => ticket,
            Dispatch::Cached(_) => panic!("expected a fetch, got a cache hit"),
            Dispatch::AlreadyInFlight(_) => panic!("expected a fetch, got an in-flight hit"),
        }
    }

    fn first_row_id(o: &QueryOrchestrator) -> String {
        o.state().data().unwrap().records[0].row_id()
    }

    #[tokio::test]
    async fn late_response_for_old_interval_is_discarded() {
        let transport = MockLogSearchTransport::new();
        let mut o = orchestrator(transport.clone());

        let t1 = fetch(o.prepare().unwrap());
        o.set_selection_at(RangeSelection::preset(RangePreset::LastHour), now())
            .unwrap();
        let t2 = fetch(o.prepare().unwrap());
        let i2_start = t2.key().interval.start_rfc3339();

        // Both run concurrently; I2 is applied first, then the slow I1 response.
        let (done1, done2) = futures::future::join(t1.execute(), t2.execute()).await;
        assert_eq!(o.apply(done2), ApplyOutcome::Applied);
        assert_eq!(o.apply(done1), ApplyOutcome::StaleDiscarded);
        assert_eq!(transport.call_count(), 2);

        assert!(first_row_id(&o).starts_with(&i2_start));
        assert_eq!(o.interval().unwrap().duration(), Duration::hours(1));
    }

    #[tokio::test]
    async fn early_response_for_old_interval_does_not_replace_pending() {
        let transport = MockLogSearchTransport::new();
        let mut o = orchestrator(transport.clone());

        let t1 = fetch(o.prepare().unwrap());
        o.set_selection_at(RangeSelection::preset(RangePreset::LastHour), now())
            .unwrap();
        let t2 = fetch(o.prepare().unwrap());

        assert_eq!(o.apply(t1.execute().await), ApplyOutcome::StaleDiscarded);
        assert!(o.state().shows_loading_indicator());

        assert_eq!(o.apply(t2.execute().await), ApplyOutcome::Applied);
        assert_eq!(o.state().as_code(), "success");
    }

    #[tokio::test]
    async fn identical_queries_are_not_reissued_while_in_flight() {
        let transport = MockLogSearchTransport::new();
        let mut o = orchestrator(transport.clone());

        let ticket = fetch(o.prepare().unwrap());
        assert!(matches!(o.prepare().unwrap(), Dispatch::AlreadyInFlight(_)));
        assert!(o.is_in_flight(ticket.key()));

        o.apply(ticket.execute().await);
        assert_eq!(transport.call_count(), 1);
        assert!(matches!(o.prepare().unwrap(), Dispatch::Cached(_)));
        assert_eq!(transport.call_count(), 1);
    }

    #[tokio::test]
    async fn dropped_ticket_frees_its_key() {
        let transport = MockLogSearchTransport::new();
        let mut o = orchestrator(transport.clone());

        let ticket = fetch(o.prepare().unwrap());
        let key = ticket.key().clone();
        drop(ticket);
        assert!(!o.is_in_flight(&key));

        let ticket = fetch(o.prepare().unwrap());
        assert_eq!(o.apply(ticket.execute().await), ApplyOutcome::Applied);
        assert_eq!(o.state().as_code(), "success");
        assert!(!o.is_in_flight(&key));
    }

    #[tokio::test(start_paused = true)]
    async fn timed_out_search_can_be_refreshed() {
        let transport = MockLogSearchTransport::new();
        transport.delay_ms.store(50, Ordering::SeqCst);
        let mut o = orchestrator(transport.clone());

        let timed_out = tokio::time::timeout(std::time::Duration::from_millis(5), o.search())
            .await
            .is_err();
        assert!(timed_out);
        assert!(o.state().is_pending());

        transport.delay_ms.store(0, Ordering::SeqCst);
        let state = o.refresh().await.unwrap();
        assert_eq!(state.as_code(), "success");
        assert_eq!(transport.call_count(), 2);
    }

    #[tokio::test]
    async fn summary_follows_the_rows_on_screen_while_paging() {
        let transport = MockLogSearchTransport::new();
        let mut o = orchestrator(transport.clone());
        o.search().await.unwrap();

        assert!(o.load_next());
        let ticket = fetch(o.prepare().unwrap());
        let summary = o.page_summary().unwrap();
        assert_eq!((summary.page_index, summary.first_row, summary.last_row), (0, 1, 10));
        assert_eq!(o.paginated_response().unwrap().page, summary);

        o.apply(ticket.execute().await);
        let summary = o.page_summary().unwrap();
        assert_eq!((summary.page_index, summary.first_row, summary.last_row), (1, 11, 20));
    }

    #[tokio::test]
    async fn next_then_previous_reuses_the_first_page() {
        let transport = MockLogSearchTransport::new();
        let mut o = orchestrator(transport.clone());

        o.search().await.unwrap();
        let summary = o.page_summary().unwrap();
        assert_eq!((summary.first_row, summary.last_row, summary.total_count), (1, 10, 35));
        assert!(o.can_go_next());
        assert!(!o.can_go_previous());
        let first = first_row_id(&o);

        assert!(o.load_next());
        o.search().await.unwrap();
        assert_eq!(o.page_summary().unwrap().first_row, 11);

        assert!(o.load_previous());
        o.search().await.unwrap();

        assert_eq!(first_row_id(&o), first);
        assert_eq!(o.page_index(), 0);
        assert!(o.can_go_next());
        assert_eq!(transport.cursors(), vec![None, Some("c1".to_string())]);
    }

    #[tokio::test]
    async fn last_page_disables_next() {
        let transport = MockLogSearchTransport::new();
        let mut o = orchestrator(transport.clone());

        o.search().await.unwrap();
        for _ in 0..3 {
            assert!(o.load_next());
            o.search().await.unwrap();
        }
        let summary = o.page_summary().unwrap();
        assert_eq!((summary.first_row, summary.last_row), (31, 35));
        assert!(!summary.can_go_next);
        assert!(!o.load_next());
    }

    #[tokio::test]
    async fn refresh_keeps_pagination_and_refetches() {
        let transport = MockLogSearchTransport::new();
        let mut o = orchestrator(transport.clone());

        o.search().await.unwrap();
        o.load_next();
        o.search().await.unwrap();

        o.refresh().await.unwrap();
        assert_eq!(o.page_index(), 1);
        assert_eq!(
            transport.cursors(),
            vec![None, Some("c1".to_string()), Some("c1".to_string())]
        );
    }

    #[tokio::test]
    async fn paging_keeps_stale_rows_but_interval_change_does_not() {
        let transport = MockLogSearchTransport::new();
        let mut o = orchestrator(transport.clone());
        o.search().await.unwrap();

        o.load_next();
        let ticket = fetch(o.prepare().unwrap());
        assert!(o.state().is_pending());
        assert!(o.state().data().is_some());
        o.apply(ticket.execute().await);

        o.set_selection_at(RangeSelection::preset(RangePreset::Last3Days), now())
            .unwrap();
        assert!(!o.can_go_previous());
        assert_eq!(o.page_index(), 0);
        let _ticket = fetch(o.prepare().unwrap());
        assert!(o.state().shows_loading_indicator());
    }

    #[tokio::test]
    async fn filter_change_resets_paging() {
        let transport = MockLogSearchTransport::new();
        let mut o = orchestrator(transport.clone());
        o.search().await.unwrap();
        o.load_next();
        o.search().await.unwrap();

        o.set_filter("app_name", "GMAIL");
        assert_eq!(o.page_index(), 0);
        assert!(!o.can_go_previous());
        assert!(o.current_key().unwrap().cursor.is_none());
    }

    #[tokio::test]
    async fn transport_failure_surfaces_as_error_until_retried() {
        let transport = MockLogSearchTransport::new();
        transport.fail.store(true, Ordering::SeqCst);
        let mut o = orchestrator(transport.clone());

        let state = o.search().await.unwrap();
        assert!(state.error().unwrap().is_retryable());
        assert_eq!(transport.call_count(), 1);

        transport.fail.store(false, Ordering::SeqCst);
        let state = o.search().await.unwrap();
        assert_eq!(state.as_code(), "success");
        assert_eq!(transport.call_count(), 2);
    }

    #[tokio::test]
    async fn disallowed_preset_is_refused_without_fetching() {
        let transport = MockLogSearchTransport::new();
        let mut o = orchestrator(transport.clone());
        o.set_entitlement_at(Some(RetentionEntitlement::new("free", 3)), now())
            .unwrap();

        let err = o
            .set_selection_at(RangeSelection::preset(RangePreset::Last7Days), now())
            .unwrap_err();
        assert!(matches!(err, LogSearchError::PolicyViolation { .. }));
        assert_eq!(o.current_preset(), RangePreset::Last24Hours);
        assert_eq!(transport.call_count(), 0);

        let options = o.preset_options();
        let seven = options
            .iter()
            .find(|p| p.preset == RangePreset::Last7Days)
            .unwrap();
        assert!(!seven.enabled);
    }

    #[tokio::test]
    async fn custom_range_is_clamped_with_a_notice() {
        let transport = MockLogSearchTransport::new();
        let mut o = orchestrator(transport.clone());
        o.set_entitlement_at(Some(RetentionEntitlement::new("free", 3)), now())
            .unwrap();

        o.set_selection_at(
            RangeSelection::custom(now() - Duration::days(10), now()),
            now(),
        )
        .unwrap();

        assert_eq!(o.interval().unwrap().start(), now() - Duration::days(3));
        assert_eq!(o.interval().unwrap().end(), now());
        assert_eq!(o.clamp_notice().unwrap().max_days, 3);

        o.search().await.unwrap();
        let response = o.paginated_response().unwrap();
        assert!(response.clamp_notice.unwrap().contains("3 days"));
    }

    #[tokio::test]
    async fn entitlement_repoll_within_policy_does_not_refetch() {
        let transport = MockLogSearchTransport::new();
        let mut o = orchestrator(transport.clone());
        o.search().await.unwrap();
        let key = o.current_key().unwrap();

        let changed = o
            .set_entitlement_at(Some(RetentionEntitlement::new("team", 30)), now())
            .unwrap();
        assert!(!changed);
        assert_eq!(o.current_key().unwrap(), key);
        assert!(matches!(o.prepare().unwrap(), Dispatch::Cached(_)));
        assert_eq!(transport.call_count(), 1);
    }

    #[tokio::test]
    async fn shrinking_entitlement_narrows_the_preset() {
        let transport = MockLogSearchTransport::new();
        let mut o = orchestrator(transport.clone());
        o.set_selection_at(RangeSelection::preset(RangePreset::Last7Days), now())
            .unwrap();
        o.search().await.unwrap();
        o.load_next();

        let changed = o
            .set_entitlement_at(Some(RetentionEntitlement::new("free", 3)), now())
            .unwrap();
        assert!(changed);
        assert_eq!(o.current_preset(), RangePreset::Last3Days);
        assert_eq!(o.page_index(), 0);
    }

    #[tokio::test]
    async fn missing_entitlement_fails_closed() {
        let transport = MockLogSearchTransport::new();
        let mut o = QueryOrchestrator::new("proj-1", 10, transport, QueryCache::default());

        let err = o
            .set_selection_at(RangeSelection::preset(RangePreset::Last3Days), now())
            .unwrap_err();
        assert!(matches!(err, LogSearchError::PolicyViolation { .. }));
        assert!(o
            .set_selection_at(RangeSelection::preset(RangePreset::Last24Hours), now())
            .is_ok());
    }
}
