use std::collections::BTreeSet;
use std::rc::Rc;

use foundation::bounds::GeoBounds;
use foundation::date::TimeRange;
use tracing::debug;

use crate::event_type::EventTypeSet;
use crate::sentiment::SentimentSet;
use crate::state::{CountryCode, FilterState};

/// Owner of the current [`FilterState`] snapshot.
///
/// Every setter that actually changes a dimension replaces the snapshot with a
/// fresh `Rc` and bumps `revision`; a setter that would leave the state equal
/// returns `false` and keeps the old snapshot, so no query is re-issued.
#[derive(Debug, Clone)]
pub struct FilterStore {
    current: Rc<FilterState>,
    defaults: FilterState,
    revision: u64,
}

impl Default for FilterStore {
    fn default() -> Self {
        Self::new(FilterState::default())
    }
}

impl FilterStore {
    pub fn new(defaults: FilterState) -> Self {
        Self {
            current: Rc::new(defaults.clone()),
            defaults,
            revision: 0,
        }
    }

    pub fn current(&self) -> &FilterState {
        &self.current
    }

    /// Shared handle to the current snapshot; stays valid after later updates.
    pub fn snapshot(&self) -> Rc<FilterState> {
        Rc::clone(&self.current)
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn defaults(&self) -> &FilterState {
        &self.defaults
    }

    fn update(&mut self, what: &'static str, f: impl FnOnce(&mut FilterState)) -> bool {
        let mut next = (*self.current).clone();
        f(&mut next);
        if next == *self.current {
            return false;
        }
        self.current = Rc::new(next);
        self.revision += 1;
        debug!(revision = self.revision, dimension = what, "filter state replaced");
        true
    }

    pub fn set_time_range(&mut self, range: TimeRange) -> bool {
        self.update("time_range", |f| f.time_range = range)
    }

    /// Bounds with a non-finite edge are stored as `None`.
    pub fn set_bbox(&mut self, bbox: Option<GeoBounds>) -> bool {
        let bbox = bbox.filter(GeoBounds::is_finite);
        self.update("bbox", |f| f.bbox = bbox)
    }

    pub fn set_sentiment(&mut self, sentiment: SentimentSet) -> bool {
        self.update("sentiment", |f| f.sentiment = sentiment)
    }

    pub fn set_event_types(&mut self, event_types: EventTypeSet) -> bool {
        self.update("event_types", |f| f.event_types = event_types)
    }

    pub fn set_countries(&mut self, countries: BTreeSet<CountryCode>) -> bool {
        self.update("countries", |f| f.countries = countries)
    }

    pub fn set_search_query(&mut self, query: impl Into<String>) -> bool {
        let query = query.into();
        self.update("search_query", |f| f.search_query = query)
    }

    /// Resets every dimension to the dataset-derived defaults.
    pub fn clear(&mut self) -> bool {
        let defaults = self.defaults.clone();
        self.update("all", |f| *f = defaults)
    }

    /// Adopts the dataset's real date range as the default range.
    ///
    /// The active range is replaced only when it is still the previous
    /// default, reversed, or reaches outside the dataset; a range the user
    /// already narrowed inside the dataset is kept.
    pub fn sync_to_dataset_range(&mut self, dataset: TimeRange) -> bool {
        let old_default = self.defaults.time_range;
        self.defaults.time_range = dataset;
        let active = self.current.time_range;
        let replace = active == old_default || active.is_reversed() || !active.within(&dataset);
        if !replace {
            return false;
        }
        self.update("time_range", |f| f.time_range = dataset)
    }
}

#[cfg(test)]
mod tests {
    use super::FilterStore;
    use crate::sentiment::{Sentiment, SentimentSet};
    use crate::state::{CountryCode, FilterState, DEFAULT_TIME_RANGE};
    use foundation::bounds::GeoBounds;
    use foundation::date::{SqlDate, TimeRange};
    use std::rc::Rc;

    fn range(a: u32, b: u32) -> TimeRange {
        TimeRange::new(SqlDate(a), SqlDate(b))
    }

    #[test]
    fn mutation_replaces_snapshot() {
        let mut store = FilterStore::default();
        let before = store.snapshot();
        assert!(store.set_sentiment([Sentiment::Negative].into_iter().collect()));
        let after = store.snapshot();
        assert!(!Rc::ptr_eq(&before, &after));
        assert!(before.sentiment.is_all());
        assert_eq!(after.sentiment.len(), 1);
        assert_eq!(store.revision(), 1);
    }

    #[test]
    fn no_op_mutation_keeps_snapshot() {
        let mut store = FilterStore::default();
        let before = store.snapshot();
        assert!(!store.set_sentiment(SentimentSet::all()));
        assert!(!store.set_bbox(None));
        assert!(Rc::ptr_eq(&before, &store.snapshot()));
        assert_eq!(store.revision(), 0);
    }

    #[test]
    fn non_finite_bbox_is_stored_as_none() {
        let mut store = FilterStore::default();
        assert!(store.set_bbox(Some(GeoBounds::new(1.0, 0.0, 1.0, 0.0))));
        assert!(store.set_bbox(Some(GeoBounds::new(f64::NAN, 0.0, 1.0, 0.0))));
        assert_eq!(store.current().bbox, None);
    }

    #[test]
    fn clear_restores_defaults() {
        let mut store = FilterStore::default();
        store.set_bbox(Some(GeoBounds::new(1.0, 0.0, 1.0, 0.0)));
        store.set_countries([CountryCode::new("US")].into_iter().collect());
        store.set_search_query("Berlin");
        assert!(store.clear());
        assert_eq!(store.current(), &FilterState::default());
        assert!(!store.clear());
    }

    #[test]
    fn dataset_range_replaces_untouched_default() {
        let mut store = FilterStore::default();
        assert_eq!(store.current().time_range, DEFAULT_TIME_RANGE);
        assert!(store.sync_to_dataset_range(range(20240101, 20241231)));
        assert_eq!(store.current().time_range, range(20240101, 20241231));
        assert_eq!(store.defaults().time_range, range(20240101, 20241231));
    }

    #[test]
    fn dataset_range_keeps_narrowed_selection() {
        let mut store = FilterStore::default();
        store.set_time_range(range(20250201, 20250301));
        assert!(!store.sync_to_dataset_range(range(20250101, 20251231)));
        assert_eq!(store.current().time_range, range(20250201, 20250301));
    }

    #[test]
    fn dataset_range_replaces_reversed_or_outside() {
        let mut store = FilterStore::default();
        store.set_time_range(range(20250301, 20250201));
        assert!(store.sync_to_dataset_range(range(20250101, 20251231)));

        store.set_time_range(range(20241201, 20250301));
        assert!(store.sync_to_dataset_range(range(20250101, 20251231)));
        assert_eq!(store.current().time_range, range(20250101, 20251231));
    }
}
