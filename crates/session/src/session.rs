use std::cell::RefCell;
use std::collections::BTreeSet;
use std::future::Future;
use std::pin::Pin;
use std::rc::Rc;
use std::task::{Context, Poll};

use engine::bootstrap::{bootstrap, probe_date_range, Capabilities};
use engine::engine::AnalyticsEngine;
use engine::error::SessionError;
use engine::executor::{Published, QueryExecutor, QueryOutcome};
use filters::event_type::EventTypeSet;
use filters::selection::SelectionCoordinator;
use filters::sentiment::SentimentSet;
use filters::slider::{TimePreset, TimeSlider};
use filters::state::{CountryCode, FilterState};
use filters::store::FilterStore;
use foundation::bounds::{GeoBounds, LngLat};
use foundation::date::TimeRange;
use foundation::ids::EventId;
use futures_util::FutureExt;
use futures_util::future::{self, LocalBoxFuture};
use query::compiler::QueryCompiler;
use query::record::EventRecord;
use runtime::clock::Clock;
use runtime::debounce::Debouncer;
use runtime::notices::{Notice, NoticeBus, NoticeKind};
use search::autocomplete::{AutocompleteDebouncer, SuggestOutcome};
use search::keywords::{KeywordIndex, Suggestion};
use tracing::{debug, info, trace, warn};
use viewport::controller::ViewportSyncController;
use viewport::map::MapView;

use crate::config::BrowserConfig;

/// The query work a mutation triggered.
///
/// Nothing reaches the engine until the refresh is polled. On its first
/// poll it compiles the filters current at that moment and dispatches them
/// unless the engine already has that exact query in flight or published,
/// so awaiting any later refresh catches up with refreshes that were
/// dropped. Resolves to `None` when nothing was dispatched.
#[must_use = "the query only runs while the refresh is polled"]
pub struct Refresh(LocalBoxFuture<'static, Option<QueryOutcome>>);

impl Refresh {
    fn new(work: impl Future<Output = Option<QueryOutcome>> + 'static) -> Self {
        Self(work.boxed_local())
    }

    fn none() -> Self {
        Self(future::ready(None).boxed_local())
    }
}

impl Future for Refresh {
    type Output = Option<QueryOutcome>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        self.0.poll_unpin(cx)
    }
}

struct SessionState {
    filters: FilterStore,
    selection: SelectionCoordinator,
    viewport: ViewportSyncController,
    search_timer: Debouncer,
    search_input: String,
    slider_timer: Debouncer,
    slider_input: Option<(i64, i64)>,
    notices: NoticeBus,
}

struct Inner {
    clock: Clock,
    map: Rc<dyn MapView>,
    executor: QueryExecutor,
    compiler: QueryCompiler,
    capabilities: Capabilities,
    autocomplete: AutocompleteDebouncer,
    state: RefCell<SessionState>,
}

/// One browsing session over an initialized engine.
///
/// Mutators apply their change synchronously and return a [`Refresh`] that
/// must be polled for the query to run. `MapView` callbacks must not
/// re-enter the session synchronously.
#[derive(Clone)]
pub struct Session {
    inner: Rc<Inner>,
}

impl Session {
    /// Bootstraps the engine, syncs the time range to the dataset and runs
    /// the first query.
    ///
    /// Only `EngineUnavailable` is returned; calling `start` again is the
    /// retry path.
    pub async fn start(
        engine: Rc<dyn AnalyticsEngine>,
        map: Rc<dyn MapView>,
        config: BrowserConfig,
    ) -> Result<Session, SessionError> {
        let report = bootstrap(engine.as_ref(), &config.dataset_path).await?;
        let mut notices = NoticeBus::new();
        for degraded in &report.degraded {
            notices.emit(NoticeKind::FeatureUnavailable, degraded.to_string());
        }

        let mut filters = FilterStore::default();
        match probe_date_range(engine.as_ref()).await {
            Ok(Some(range)) => {
                info!(start = %range.start, end = %range.end, "dataset date range");
                filters.sync_to_dataset_range(range);
            }
            Ok(None) => notices.emit(NoticeKind::DateRangeFallback, "dataset is empty"),
            Err(e) => {
                warn!(error = %e, "date range probe failed; using default range");
                notices.emit(NoticeKind::DateRangeFallback, e.to_string());
            }
        }

        let clock = Clock::start();
        let index = KeywordIndex::new(Rc::clone(&engine), report.capabilities.keyword_index)
            .with_limit(config.suggestion_limit);
        let autocomplete = AutocompleteDebouncer::new(index, clock, config.autocomplete_debounce())
            .with_min_prefix(config.min_prefix_chars);

        let session = Session {
            inner: Rc::new(Inner {
                clock,
                map,
                executor: QueryExecutor::new(engine),
                compiler: QueryCompiler::new(config.limits),
                capabilities: report.capabilities,
                autocomplete,
                state: RefCell::new(SessionState {
                    filters,
                    selection: SelectionCoordinator::new(),
                    viewport: ViewportSyncController::new(config.viewport_settings()),
                    search_timer: Debouncer::new(config.search_debounce()),
                    search_input: String::new(),
                    slider_timer: Debouncer::new(config.slider_debounce()),
                    slider_input: None,
                    notices,
                }),
            }),
        };
        session.refresh().await;
        Ok(session)
    }

    fn refresh(&self) -> Refresh {
        self.dispatch(false)
    }

    /// Re-runs the current query even if it is unchanged.
    pub fn reload(&self) -> Refresh {
        self.dispatch(true)
    }

    fn dispatch(&self, force: bool) -> Refresh {
        let inner = Rc::clone(&self.inner);
        Refresh::new(async move {
            let (text, snapshot) = {
                let st = inner.state.borrow();
                let text = inner.compiler.compile(
                    st.filters.current(),
                    st.selection.selected(),
                    inner.capabilities.full_text_search,
                );
                if !force && inner.executor.current_query().as_ref() == Some(&text) {
                    debug!("compiled query unchanged");
                    return None;
                }
                (text, st.filters.snapshot())
            };
            let outcome = inner.executor.submit(text, snapshot).await;
            if let QueryOutcome::Failed { generation, error } = &outcome {
                inner.state.borrow_mut().notices.emit_for(
                    *generation,
                    NoticeKind::QueryFailed,
                    error.to_string(),
                );
            }
            Some(outcome)
        })
    }

    fn mutate(&self, f: impl FnOnce(&mut FilterStore) -> bool) -> Refresh {
        let changed = f(&mut self.inner.state.borrow_mut().filters);
        if !changed {
            trace!("filters unchanged");
        }
        self.refresh()
    }

    /// Sets the range immediately, dropping any pending slider input.
    pub fn set_time_range(&self, range: TimeRange) -> Refresh {
        {
            let mut st = self.inner.state.borrow_mut();
            st.slider_timer.cancel();
            st.slider_input = None;
        }
        self.mutate(|f| f.set_time_range(range))
    }

    /// Slider thumbs moved to day indices counted from the first day of the
    /// dataset; the range is applied once sliding pauses.
    pub fn time_range_input(&self, start_index: i64, end_index: i64) -> Refresh {
        let (timer, deadline) = {
            let mut st = self.inner.state.borrow_mut();
            st.slider_input = Some((start_index, end_index));
            let now = self.inner.clock.now();
            let timer = st.slider_timer.schedule(now);
            (timer, now.saturating_add(st.slider_timer.delay()))
        };
        let this = self.clone();
        Refresh::new(async move {
            tokio::time::sleep_until(this.inner.clock.instant(deadline)).await;
            let range = {
                let mut st = this.inner.state.borrow_mut();
                if !st.slider_timer.fire(timer, this.inner.clock.now()) {
                    return None;
                }
                let (start, end) = st.slider_input.take()?;
                TimeSlider::new(st.filters.defaults().time_range).range_at(start, end)
            };
            match range {
                Ok(range) => this.mutate(|f| f.set_time_range(range)).await,
                Err(e) => {
                    warn!(error = %e, "slider position is not a calendar date");
                    None
                }
            }
        })
    }

    /// Moves the slider to a preset; applied after the same pause as a drag.
    pub fn time_range_preset(&self, preset: TimePreset) -> Refresh {
        let (start, end) = self.time_slider().preset(preset);
        self.time_range_input(start, end)
    }

    /// Slider track over the dataset range (the default range until the
    /// dataset range is known).
    pub fn time_slider(&self) -> TimeSlider {
        TimeSlider::new(self.inner.state.borrow().filters.defaults().time_range)
    }

    /// Thumb positions: the pending slider input, else the active range.
    pub fn time_range_indices(&self) -> Option<(i64, i64)> {
        let st = self.inner.state.borrow();
        if let Some(pending) = st.slider_input {
            return Some(pending);
        }
        TimeSlider::new(st.filters.defaults().time_range)
            .indices_of(st.filters.current().time_range)
            .ok()
    }

    pub fn set_bbox(&self, bbox: Option<GeoBounds>) -> Refresh {
        self.mutate(|f| f.set_bbox(bbox))
    }

    pub fn set_sentiment(&self, sentiment: SentimentSet) -> Refresh {
        self.mutate(|f| f.set_sentiment(sentiment))
    }

    pub fn set_event_types(&self, event_types: EventTypeSet) -> Refresh {
        self.mutate(|f| f.set_event_types(event_types))
    }

    pub fn set_countries(&self, countries: BTreeSet<CountryCode>) -> Refresh {
        self.mutate(|f| f.set_countries(countries))
    }

    /// Sets the search query immediately, dropping any pending typed input.
    pub fn set_search(&self, query: &str) -> Refresh {
        {
            let mut st = self.inner.state.borrow_mut();
            st.search_timer.cancel();
            st.search_input = query.to_string();
        }
        self.mutate(|f| f.set_search_query(query))
    }

    /// Raw search-box input; becomes the search query once typing pauses.
    pub fn search_input(&self, text: &str) -> Refresh {
        let (timer, deadline) = {
            let mut st = self.inner.state.borrow_mut();
            st.search_input = text.to_string();
            let now = self.inner.clock.now();
            let timer = st.search_timer.schedule(now);
            (timer, now.saturating_add(st.search_timer.delay()))
        };
        let this = self.clone();
        Refresh::new(async move {
            tokio::time::sleep_until(this.inner.clock.instant(deadline)).await;
            let query = {
                let mut st = this.inner.state.borrow_mut();
                if !st.search_timer.fire(timer, this.inner.clock.now()) {
                    return None;
                }
                st.search_input.clone()
            };
            this.mutate(|f| f.set_search_query(query)).await
        })
    }

    /// A suggestion was picked: commit its term without waiting for either
    /// debounce.
    pub fn commit_suggestion(&self, suggestion: &Suggestion) -> Refresh {
        self.inner.autocomplete.commit();
        self.set_search(&suggestion.term)
    }

    pub fn suggest(&self, prefix: &str) -> LocalBoxFuture<'static, SuggestOutcome> {
        self.inner.autocomplete.suggest(prefix)
    }

    /// Selects (or deselects) an event; with camera sync on, the camera
    /// follows the newly selected event once.
    pub fn select_event(&self, id: Option<EventId>) -> Refresh {
        let target = id.as_ref().and_then(|id| self.position_of(id));
        {
            let mut guard = self.inner.state.borrow_mut();
            let st = &mut *guard;
            if st.selection.select(id) {
                let outcome = st.viewport.on_selection_changed(
                    &mut st.selection,
                    target,
                    self.inner.map.as_ref(),
                );
                debug!(?outcome, "selection follow");
            }
        }
        self.refresh()
    }

    /// Map pick: selects the event at `row` of the published result.
    pub fn pick_row(&self, row: usize) -> Refresh {
        let id = self
            .inner
            .executor
            .published()
            .and_then(|p| p.events().ok().and_then(|cols| cols.id_at(row)));
        match id {
            Some(id) => self.select_event(Some(id)),
            None => Refresh::none(),
        }
    }

    /// "Fly to source/target": selects `id` and moves the camera to `anchor`
    /// with exactly one flight.
    pub fn fly_to_anchor(&self, id: EventId, anchor: LngLat) -> Refresh {
        {
            let mut guard = self.inner.state.borrow_mut();
            let st = &mut *guard;
            st.viewport
                .fly_to_anchor(&mut st.selection, id, anchor, self.inner.map.as_ref());
        }
        self.refresh()
    }

    /// Resets all filters to the dataset defaults and clears the selection.
    pub fn clear_filters(&self) -> Refresh {
        {
            let mut st = self.inner.state.borrow_mut();
            st.filters.clear();
            st.selection.clear();
            st.search_timer.cancel();
            st.search_input.clear();
            st.slider_timer.cancel();
            st.slider_input = None;
            st.viewport.cancel_pending();
        }
        self.inner.autocomplete.commit();
        self.refresh()
    }

    /// Raw viewport-changed event from the map.
    pub fn viewport_changed(&self) -> Refresh {
        let now = self.inner.clock.now();
        let armed = self.inner.state.borrow_mut().viewport.on_viewport_changed(now);
        let Some(timer) = armed else {
            return Refresh::none();
        };
        let deadline = now.saturating_add(self.inner.state.borrow().viewport.debounce());
        let this = self.clone();
        Refresh::new(async move {
            tokio::time::sleep_until(this.inner.clock.instant(deadline)).await;
            let now = this.inner.clock.now();
            let decision = this.inner.state.borrow_mut().viewport.fire(
                timer,
                now,
                this.inner.map.as_ref(),
            )?;
            this.set_bbox(decision.bbox()).await
        })
    }

    pub fn set_camera_sync(&self, enabled: bool) {
        self.inner.state.borrow_mut().viewport.set_camera_sync(enabled);
    }

    /// Turning bbox sync off clears the bbox filter.
    pub fn set_bbox_sync(&self, enabled: bool) -> Refresh {
        let decision = self.inner.state.borrow_mut().viewport.set_bbox_sync(enabled);
        match decision {
            Some(d) => self.set_bbox(d.bbox()),
            None => Refresh::none(),
        }
    }

    fn position_of(&self, id: &EventId) -> Option<LngLat> {
        let published = self.inner.executor.published()?;
        let cols = published.events().ok()?;
        let row = cols.row_index_of(id)?;
        cols.record(row).map(|r| r.position())
    }

    pub fn results(&self) -> Option<Rc<Published>> {
        self.inner.executor.published()
    }

    pub fn record(&self, row: usize) -> Option<EventRecord> {
        self.results()?.events().ok()?.record(row)
    }

    pub fn selected_record(&self) -> Option<EventRecord> {
        let id = self.selected()?;
        let published = self.results()?;
        let cols = published.events().ok()?;
        cols.record(cols.row_index_of(&id)?)
    }

    pub fn is_loading(&self) -> bool {
        self.inner.executor.is_loading()
    }

    pub fn last_error(&self) -> Option<SessionError> {
        self.inner.executor.last_error()
    }

    pub fn suggestions(&self) -> Vec<Suggestion> {
        self.inner.autocomplete.suggestions()
    }

    pub fn drain_notices(&self) -> Vec<Notice> {
        self.inner.state.borrow_mut().notices.drain()
    }

    pub fn filters(&self) -> Rc<FilterState> {
        self.inner.state.borrow().filters.snapshot()
    }

    pub fn search_text(&self) -> String {
        self.inner.state.borrow().search_input.clone()
    }

    pub fn selected(&self) -> Option<EventId> {
        self.inner.state.borrow().selection.selected().cloned()
    }

    pub fn capabilities(&self) -> Capabilities {
        self.inner.capabilities
    }

    pub fn camera_sync(&self) -> bool {
        self.inner.state.borrow().viewport.camera_sync()
    }

    pub fn bbox_sync(&self) -> bool {
        self.inner.state.borrow().viewport.bbox_sync()
    }
}

#[cfg(test)]
mod tests {
    use super::Session;
    use crate::config::BrowserConfig;
    use engine::error::{EngineError, SessionError};
    use engine::executor::QueryOutcome;
    use engine::result::{events_result_set, ColumnData, ColumnarResultSet};
    use engine::scripted::ScriptedEngine;
    use filters::event_type::{EventType, EventTypeSet};
    use filters::sentiment::SentimentSet;
    use filters::slider::TimePreset;
    use filters::state::{CountryCode, FilterState};
    use foundation::bounds::{GeoBounds, LngLat};
    use foundation::date::{SqlDate, TimeRange};
    use foundation::ids::EventId;
    use futures_util::FutureExt;
    use query::record::EventRecord;
    use runtime::generation::Generation;
    use runtime::notices::NoticeKind;
    use search::autocomplete::SuggestOutcome;
    use search::keywords::{Suggestion, SuggestionKind};
    use std::rc::Rc;
    use std::time::Duration;
    use viewport::map::RecordingMap;

    const BROWSE: &str = "LIMIT 500000";

    fn europe() -> GeoBounds {
        GeoBounds::new(60.0, 35.0, 30.0, -10.0)
    }

    fn range(a: u32, b: u32) -> TimeRange {
        TimeRange::new(SqlDate(a), SqlDate(b))
    }

    fn range_rows(min: i64, max: i64) -> ColumnarResultSet {
        ColumnarResultSet::new(vec![
            ("min_date".into(), ColumnData::Int64(vec![Some(min)])),
            ("max_date".into(), ColumnData::Int64(vec![Some(max)])),
        ])
        .unwrap()
    }

    fn events(ids: &[&str]) -> ColumnarResultSet {
        let records: Vec<EventRecord> = ids
            .iter()
            .map(|id| match *id {
                "e2" => EventRecord::at("e2", SqlDate(20250210), -74.0, 40.7),
                other => EventRecord::at(other, SqlDate(20250105), 13.4, 52.5),
            })
            .collect();
        events_result_set(&records)
    }

    fn scripted() -> Rc<ScriptedEngine> {
        let engine = Rc::new(ScriptedEngine::new());
        engine.respond("MIN(date)", range_rows(20250101, 20250331));
        engine
    }

    async fn start(engine: &Rc<ScriptedEngine>, map: &Rc<RecordingMap>) -> Session {
        match Session::start(engine.clone(), map.clone(), BrowserConfig::default()).await {
            Ok(session) => session,
            Err(e) => panic!("startup failed: {e}"),
        }
    }

    fn europe_map() -> Rc<RecordingMap> {
        Rc::new(RecordingMap::new(Some(europe()), 5.0))
    }

    #[tokio::test(start_paused = true)]
    async fn startup_syncs_dataset_range_and_publishes() {
        let engine = scripted();
        engine.respond(BROWSE, events(&["e1", "e2"]));
        let session = start(&engine, &europe_map()).await;

        assert_eq!(session.filters().time_range, range(20250101, 20250331));
        let published = session.results().unwrap();
        assert_eq!(published.generation, Generation(1));
        assert_eq!(published.num_rows(), 2);
        assert!(session.capabilities().full_text_search);
        assert!(session.capabilities().keyword_index);
        assert!(session.drain_notices().is_empty());
        assert!(!session.is_loading());
    }

    #[tokio::test]
    async fn engine_unavailable_is_fatal() {
        let engine = scripted();
        engine.fail("CREATE OR REPLACE VIEW events", EngineError::Unavailable("no wasm".into()));
        let map = europe_map();
        let Err(err) = Session::start(engine.clone(), map, BrowserConfig::default()).await else {
            panic!("startup should fail");
        };
        assert!(matches!(err, SessionError::EngineUnavailable(_)));
        assert_eq!(engine.count_matching(BROWSE), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn degraded_startup_uses_substring_search_and_no_autocomplete() {
        let engine = Rc::new(ScriptedEngine::new());
        engine
            .fail("MIN(date)", EngineError::Query("no stats".into()))
            .fail("CREATE TABLE search_index", EngineError::Query("oom".into()))
            .fail("CREATE TABLE search_keywords", EngineError::Query("oom".into()))
            .respond(BROWSE, events(&["e1"]));
        let session = start(&engine, &europe_map()).await;

        let kinds: Vec<_> = session.drain_notices().into_iter().map(|n| n.kind).collect();
        assert_eq!(
            kinds,
            [
                NoticeKind::FeatureUnavailable,
                NoticeKind::FeatureUnavailable,
                NoticeKind::DateRangeFallback
            ]
        );
        assert_eq!(session.filters().time_range, FilterState::default().time_range);

        session.set_search("Berlin").await;
        let sql = engine.log().pop().unwrap();
        assert!(sql.contains("(title ILIKE '%Berlin%' ESCAPE '\\' OR content ILIKE '%Berlin%' ESCAPE '\\')"));
        assert!(!sql.contains("search_index"));

        assert_eq!(session.suggest("Ber").await, SuggestOutcome::Skipped);
    }

    #[tokio::test(start_paused = true)]
    async fn viewport_burst_settles_into_one_bbox_query() {
        let engine = scripted();
        engine.respond(BROWSE, events(&["e1"]));
        let map = europe_map();
        let session = start(&engine, &map).await;

        let first = session.viewport_changed();
        tokio::time::advance(Duration::from_millis(100)).await;
        let second = session.viewport_changed();
        tokio::time::advance(Duration::from_millis(100)).await;
        let third = session.viewport_changed();
        let (a, b, c) = tokio::join!(first, second, third);

        assert_eq!(a, None);
        assert_eq!(b, None);
        assert!(matches!(c, Some(QueryOutcome::Published(_))));
        assert_eq!(session.filters().bbox, Some(europe()));
        assert_eq!(engine.count_matching("(lat BETWEEN 35 AND 60"), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn zooming_out_clears_bbox_although_bounds_exist() {
        let engine = scripted();
        engine.respond(BROWSE, events(&["e1"]));
        let map = europe_map();
        let session = start(&engine, &map).await;
        session.viewport_changed().await;
        assert!(session.filters().bbox.is_some());

        map.set_view(Some(europe()), 2.0);
        let outcome = session.viewport_changed().await;
        assert!(matches!(outcome, Some(QueryOutcome::Published(_))));
        assert_eq!(session.filters().bbox, None);
        assert!(!engine.log().last().unwrap().contains("lat BETWEEN"));
    }

    #[tokio::test(start_paused = true)]
    async fn selection_flies_once_and_stays_visible_after_its_own_flight() {
        let engine = scripted();
        engine.respond(BROWSE, events(&["e1", "e2"]));
        let map = europe_map();
        let session = start(&engine, &map).await;
        session.viewport_changed().await;

        let outcome = session.select_event(Some(EventId::from("e2"))).await;
        assert!(matches!(outcome, Some(QueryOutcome::Published(_))));
        assert_eq!(map.flights().len(), 1);
        assert_eq!(map.flights()[0].center, LngLat::new(-74.0, 40.7));
        assert!(engine.log().last().unwrap().contains("OR id = 'e2')"));

        // The camera now shows New York; that viewport change narrows the
        // bbox but the selected event keeps its explicit clause.
        session.viewport_changed().await;
        let bbox = session.filters().bbox.unwrap();
        assert!(bbox.contains(LngLat::new(-74.0, 40.7)));
        assert_eq!(session.selected(), Some(EventId::from("e2")));
        assert!(engine.log().last().unwrap().contains("OR id = 'e2')"));
        assert_eq!(map.flights().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn selection_without_bbox_issues_no_query() {
        let engine = scripted();
        engine.respond(BROWSE, events(&["e1"]));
        let map = europe_map();
        let session = start(&engine, &map).await;
        assert_eq!(session.select_event(Some(EventId::from("e1"))).await, None);
        assert_eq!(map.flights().len(), 1);
        assert_eq!(session.selected_record().unwrap().id, EventId::from("e1"));
    }

    #[tokio::test(start_paused = true)]
    async fn manual_fly_to_anchor_flies_once() {
        let engine = scripted();
        engine.respond(BROWSE, events(&["e1"]));
        let map = europe_map();
        let session = start(&engine, &map).await;

        let source = LngLat::new(2.35, 48.85);
        session.fly_to_anchor(EventId::from("e1"), source).await;
        assert_eq!(map.flights().len(), 1);
        assert_eq!(map.flights()[0].center, source);
        assert_eq!(session.selected(), Some(EventId::from("e1")));
    }

    #[tokio::test(start_paused = true)]
    async fn camera_sync_off_keeps_camera_still() {
        let engine = scripted();
        engine.respond(BROWSE, events(&["e1"]));
        let map = europe_map();
        let session = start(&engine, &map).await;
        session.set_camera_sync(false);
        session.select_event(Some(EventId::from("e1"))).await;
        assert!(map.flights().is_empty());
        assert_eq!(session.selected(), Some(EventId::from("e1")));
    }

    #[tokio::test(start_paused = true)]
    async fn typed_search_is_debounced() {
        let engine = scripted();
        engine.respond(BROWSE, events(&["e1"])).respond("LIMIT 1000", events(&["e1"]));
        let session = start(&engine, &europe_map()).await;

        let a = session.search_input("Be");
        tokio::time::advance(Duration::from_millis(100)).await;
        let b = session.search_input("Ber");
        tokio::time::advance(Duration::from_millis(100)).await;
        let c = session.search_input("Berlin");
        let (a, b, c) = tokio::join!(a, b, c);

        assert_eq!((a, b), (None, None));
        assert!(matches!(c, Some(QueryOutcome::Published(_))));
        assert_eq!(session.filters().search_query, "Berlin");
        assert_eq!(engine.count_matching("search_index WHERE title ILIKE"), 1);
        assert!(engine.log().last().unwrap().contains("'%Berlin%'"));
    }

    #[tokio::test(start_paused = true)]
    async fn committing_a_suggestion_skips_both_debounces() {
        let engine = scripted();
        engine.respond(BROWSE, events(&["e1"])).respond("LIMIT 1000", events(&["e1"]));
        let session = start(&engine, &europe_map()).await;

        let typed = session.search_input("Ber");
        let suggestion = Suggestion {
            term: "Berlin".into(),
            kind: SuggestionKind::City,
            frequency: 10,
        };
        let before = tokio::time::Instant::now();
        let committed = session.commit_suggestion(&suggestion).await;
        assert_eq!(tokio::time::Instant::now(), before);
        assert!(matches!(committed, Some(QueryOutcome::Published(_))));
        assert_eq!(typed.await, None);
        assert_eq!(session.filters().search_query, "Berlin");
        assert_eq!(session.search_text(), "Berlin");
    }

    #[tokio::test(start_paused = true)]
    async fn older_slow_query_never_replaces_newer_result() {
        let engine = scripted();
        engine
            .respond_after("20250110 AND", Duration::from_millis(300), events(&["old"]))
            .respond("20250120 AND", events(&["new"]))
            .respond(BROWSE, events(&["e1"]));
        let session = start(&engine, &europe_map()).await;

        // Each refresh compiles the filters current at its first poll, so
        // the second change is made only after the first query is in flight.
        let slow = async { session.set_time_range(range(20250110, 20250115)).await };
        let fast = async {
            tokio::time::sleep(Duration::from_millis(10)).await;
            session.set_time_range(range(20250120, 20250125)).await
        };
        let (slow, fast) = tokio::join!(slow, fast);

        assert!(matches!(slow, Some(QueryOutcome::Superseded(_))));
        assert!(matches!(fast, Some(QueryOutcome::Published(_))));
        let published = session.results().unwrap();
        assert_eq!(published.filters.time_range, range(20250120, 20250125));
        assert_eq!(session.record(0).unwrap().id, EventId::from("new"));
    }

    #[tokio::test(start_paused = true)]
    async fn failed_query_keeps_previous_rows_and_raises_notice() {
        let engine = scripted();
        engine
            .fail("eventType IN", EngineError::Query("oom".into()))
            .respond(BROWSE, events(&["e1", "e2"]));
        let session = start(&engine, &europe_map()).await;

        let types: EventTypeSet = [EventType::MATERIAL_CONFLICT].into_iter().collect();
        let outcome = session.set_event_types(types).await;
        assert!(matches!(outcome, Some(QueryOutcome::Failed { .. })));
        assert_eq!(session.results().unwrap().num_rows(), 2);
        assert!(matches!(session.last_error(), Some(SessionError::QueryFailed { .. })));
        let notices = session.drain_notices();
        assert_eq!(notices.len(), 1);
        assert_eq!(notices[0].kind, NoticeKind::QueryFailed);
    }

    #[tokio::test(start_paused = true)]
    async fn no_op_mutation_issues_no_query() {
        let engine = scripted();
        engine.respond(BROWSE, events(&["e1"]));
        let session = start(&engine, &europe_map()).await;
        let before = engine.log().len();
        assert_eq!(session.set_sentiment(SentimentSet::all()).await, None);
        assert_eq!(session.set_bbox(None).await, None);
        assert_eq!(engine.log().len(), before);
        assert!(session.reload().await.is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn clear_filters_restores_dataset_defaults() {
        let engine = scripted();
        engine.respond(BROWSE, events(&["e1"])).respond("LIMIT 1000", events(&["e1"]));
        let map = europe_map();
        let session = start(&engine, &map).await;
        session.viewport_changed().await;
        session
            .set_countries([CountryCode::new("GM")].into_iter().collect())
            .await;
        session.set_search("Berlin").await;
        session.select_event(Some(EventId::from("e1"))).await;

        session.clear_filters().await;
        let expected = FilterState::with_time_range(range(20250101, 20250331));
        assert_eq!(*session.filters(), expected);
        assert_eq!(session.selected(), None);
        assert_eq!(session.search_text(), "");
    }

    #[tokio::test(start_paused = true)]
    async fn pick_row_selects_published_event() {
        let engine = scripted();
        engine.respond(BROWSE, events(&["e1", "e2"]));
        let session = start(&engine, &europe_map()).await;
        session.pick_row(1).await;
        assert_eq!(session.selected(), Some(EventId::from("e2")));
        assert_eq!(session.pick_row(99).await, None);
        assert_eq!(session.selected(), Some(EventId::from("e2")));
    }

    #[tokio::test(start_paused = true)]
    async fn disabling_bbox_sync_clears_bbox_and_ignores_viewport() {
        let engine = scripted();
        engine.respond(BROWSE, events(&["e1"]));
        let map = europe_map();
        let session = start(&engine, &map).await;
        session.viewport_changed().await;
        assert!(session.filters().bbox.is_some());

        assert!(session.set_bbox_sync(false).await.is_some());
        assert_eq!(session.filters().bbox, None);
        assert_eq!(session.viewport_changed().await, None);
        assert!(!session.bbox_sync());
    }

    #[tokio::test(start_paused = true)]
    async fn suggestions_come_from_keyword_table() {
        let engine = scripted();
        engine.respond(BROWSE, events(&["e1"])).respond(
            "FROM search_keywords",
            ColumnarResultSet::new(vec![
                ("term".into(), ColumnData::Utf8(vec![Some("Berlin".into())])),
                ("type".into(), ColumnData::Utf8(vec![Some("city".into())])),
                ("frequency".into(), ColumnData::Int64(vec![Some(42)])),
            ])
            .unwrap(),
        );
        let session = start(&engine, &europe_map()).await;
        assert!(matches!(session.suggest("Ber").await, SuggestOutcome::Published(_)));
        assert_eq!(session.suggestions()[0].kind, SuggestionKind::City);
    }

    #[tokio::test(start_paused = true)]
    async fn dropped_refresh_is_recovered_by_reapplying() {
        let engine = scripted();
        engine.respond(BROWSE, events(&["e1"]));
        let session = start(&engine, &europe_map()).await;
        let feb = range(20250201, 20250228);

        drop(session.set_time_range(feb));
        tokio::time::sleep(Duration::from_secs(5)).await;
        assert!(!session.is_loading());
        assert_eq!(engine.count_matching("20250201 AND"), 0);
        assert_eq!(session.filters().time_range, feb);

        let outcome = session.set_time_range(feb).await;
        assert!(matches!(outcome, Some(QueryOutcome::Published(_))));
        assert_eq!(session.results().unwrap().filters.time_range, feb);
        assert!(!session.is_loading());
    }

    #[tokio::test(start_paused = true)]
    async fn refresh_dropped_in_flight_settles_loading() {
        let engine = scripted();
        engine
            .respond_after("20250201 AND", Duration::from_millis(200), events(&["late"]))
            .respond(BROWSE, events(&["e1"]));
        let session = start(&engine, &europe_map()).await;
        let feb = range(20250201, 20250228);

        let mut pending = session.set_time_range(feb);
        assert!((&mut pending).now_or_never().is_none());
        assert!(session.is_loading());
        drop(pending);
        assert!(!session.is_loading());

        // Any later refresh catches up with the dropped one.
        let outcome = session.set_sentiment(SentimentSet::all()).await;
        assert!(matches!(outcome, Some(QueryOutcome::Published(_))));
        assert_eq!(session.record(0).unwrap().id, EventId::from("late"));
    }

    #[tokio::test(start_paused = true)]
    async fn slider_drag_is_debounced_and_mapped_from_dataset_start() {
        let engine = scripted();
        engine.respond(BROWSE, events(&["e1"]));
        let session = start(&engine, &europe_map()).await;
        assert_eq!(session.time_slider().max_index(), 89);
        assert_eq!(session.time_range_indices(), Some((0, 89)));

        let a = session.time_range_input(10, 80);
        tokio::time::advance(Duration::from_millis(200)).await;
        let b = session.time_range_input(31, 59);
        assert_eq!(session.time_range_indices(), Some((31, 59)));
        let before = engine.log().len();
        let (a, b) = tokio::join!(a, b);

        assert_eq!(a, None);
        assert!(matches!(b, Some(QueryOutcome::Published(_))));
        assert_eq!(engine.log().len(), before + 1);
        assert_eq!(session.filters().time_range, range(20250201, 20250301));
        assert_eq!(session.time_range_indices(), Some((31, 59)));
    }

    #[tokio::test(start_paused = true)]
    async fn slider_presets_count_back_from_dataset_end() {
        let engine = scripted();
        engine.respond(BROWSE, events(&["e1"]));
        let session = start(&engine, &europe_map()).await;

        session.time_range_preset(TimePreset::Last7Days).await;
        assert_eq!(session.filters().time_range, range(20250324, 20250331));
        session.time_range_preset(TimePreset::All).await;
        assert_eq!(session.filters().time_range, range(20250101, 20250331));
    }

    #[tokio::test(start_paused = true)]
    async fn direct_range_cancels_pending_slider_input() {
        let engine = scripted();
        engine.respond(BROWSE, events(&["e1"]));
        let session = start(&engine, &europe_map()).await;

        let dragged = session.time_range_input(0, 5);
        session.set_time_range(range(20250301, 20250310)).await;
        assert_eq!(dragged.await, None);
        assert_eq!(session.filters().time_range, range(20250301, 20250310));
    }
}
