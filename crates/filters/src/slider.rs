use foundation::date::{DateError, SqlDate, TimeRange};
use serde::{Deserialize, Serialize};

/// Quick picks offered next to the time slider.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TimePreset {
    Last7Days,
    Last30Days,
    All,
}

/// Maps the time-range slider's zero-based day indices to dates.
///
/// Index 0 is the first day of `domain` (the dataset range, or the default
/// range while the dataset range is unknown) and [`TimeSlider::max_index`]
/// its last day.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct TimeSlider {
    domain: TimeRange,
}

impl TimeSlider {
    pub fn new(domain: TimeRange) -> Self {
        Self { domain }
    }

    pub fn domain(&self) -> TimeRange {
        self.domain
    }

    /// Last selectable index; 0 for an undecodable or reversed domain.
    pub fn max_index(&self) -> i64 {
        self.domain.end.day_index(self.domain.start).map_or(0, |i| i.max(0))
    }

    /// Slider positions of `range`, clamped to the track.
    pub fn indices_of(&self, range: TimeRange) -> Result<(i64, i64), DateError> {
        let start = range.start.day_index(self.domain.start)?;
        let end = range.end.day_index(self.domain.start)?;
        Ok(self.clamp(start, end))
    }

    /// Date range under the two thumbs. Indices are clamped to the track and
    /// put in order.
    pub fn range_at(&self, start_index: i64, end_index: i64) -> Result<TimeRange, DateError> {
        let (start, end) = self.clamp(start_index, end_index);
        Ok(TimeRange::new(
            SqlDate::from_day_index(start, self.domain.start)?,
            SqlDate::from_day_index(end, self.domain.start)?,
        ))
    }

    /// Thumb positions for a preset, counted back from the last day.
    pub fn preset(&self, preset: TimePreset) -> (i64, i64) {
        let max = self.max_index();
        match preset {
            TimePreset::Last7Days => ((max - 7).max(0), max),
            TimePreset::Last30Days => ((max - 30).max(0), max),
            TimePreset::All => (0, max),
        }
    }

    fn clamp(&self, a: i64, b: i64) -> (i64, i64) {
        let max = self.max_index();
        let (a, b) = (a.clamp(0, max), b.clamp(0, max));
        (a.min(b), a.max(b))
    }
}
