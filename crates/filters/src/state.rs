use std::collections::BTreeSet;
use std::fmt;

use foundation::bounds::GeoBounds;
use foundation::date::{SqlDate, TimeRange};
use serde::{Deserialize, Serialize};

use crate::event_type::EventTypeSet;
use crate::sentiment::SentimentSet;

/// Range used until the dataset's real min/max dates are known.
pub const DEFAULT_TIME_RANGE: TimeRange = TimeRange {
    start: SqlDate(20250119),
    end: SqlDate(20260127),
};

/// Country code as stored in the `country` column (trimmed, upper-case).
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct CountryCode(String);

impl CountryCode {
    pub fn new(code: impl AsRef<str>) -> Self {
        CountryCode(code.as_ref().trim().to_uppercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CountryCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for CountryCode {
    fn from(value: &str) -> Self {
        CountryCode::new(value)
    }
}

impl From<String> for CountryCode {
    fn from(value: String) -> Self {
        CountryCode::new(value)
    }
}

impl From<CountryCode> for String {
    fn from(code: CountryCode) -> Self {
        code.0
    }
}

/// One immutable snapshot of every active filter dimension.
///
/// Snapshots are replaced, never mutated, once handed to the query path;
/// see [`crate::store::FilterStore`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FilterState {
    pub time_range: TimeRange,
    pub bbox: Option<GeoBounds>,
    pub sentiment: SentimentSet,
    pub event_types: EventTypeSet,
    pub countries: BTreeSet<CountryCode>,
    pub search_query: String,
}

impl Default for FilterState {
    fn default() -> Self {
        Self::with_time_range(DEFAULT_TIME_RANGE)
    }
}

impl FilterState {
    pub fn with_time_range(time_range: TimeRange) -> Self {
        FilterState {
            time_range,
            bbox: None,
            sentiment: SentimentSet::all(),
            event_types: EventTypeSet::all(),
            countries: BTreeSet::new(),
            search_query: String::new(),
        }
    }

    /// Trimmed search text, or `None` when there is nothing to search for.
    pub fn search_term(&self) -> Option<&str> {
        let term = self.search_query.trim();
        (!term.is_empty()).then_some(term)
    }
}

#[cfg(test)]
mod tests {
    use super::{CountryCode, FilterState, DEFAULT_TIME_RANGE};
    use crate::sentiment::Sentiment;

    #[test]
    fn default_is_unrestricted() {
        let f = FilterState::default();
        assert_eq!(f.time_range, DEFAULT_TIME_RANGE);
        assert!(f.bbox.is_none());
        assert!(f.sentiment.is_all());
        assert!(!f.event_types.is_restrictive());
        assert!(f.countries.is_empty());
        assert_eq!(f.search_term(), None);
    }

    #[test]
    fn blank_search_has_no_term() {
        let mut f = FilterState::default();
        f.search_query = "   ".into();
        assert_eq!(f.search_term(), None);
        f.search_query = "  Berlin ".into();
        assert_eq!(f.search_term(), Some("Berlin"));
    }

    #[test]
    fn country_codes_are_normalized() {
        assert_eq!(CountryCode::new(" us ").as_str(), "US");
        let c: CountryCode = serde_json::from_str(r#""gm""#).unwrap();
        assert_eq!(c, CountryCode::from("GM"));
    }

    #[test]
    fn json_uses_camel_case_and_fills_defaults() {
        let f: FilterState =
            serde_json::from_str(r#"{"timeRange":{"start":20250101,"end":20250131},"sentiment":["negative"]}"#)
                .unwrap();
        assert_eq!(f.time_range.start.get(), 20250101);
        assert_eq!(f.sentiment.len(), 1);
        assert!(f.sentiment.contains(Sentiment::Negative));
        assert!(f.event_types.iter().count() == 4);
        let json = serde_json::to_value(&f).unwrap();
        assert!(json.get("searchQuery").is_some());
    }
}
