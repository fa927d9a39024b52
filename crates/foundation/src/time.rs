use std::time::Duration;

/// Monotonic timestamp in milliseconds since an arbitrary session epoch.
///
/// Controllers take time as an explicit argument so debounce decisions are
/// deterministic and can be replayed in tests.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Millis(pub u64);

impl Millis {
    pub const ZERO: Millis = Millis(0);

    pub fn from_duration(d: Duration) -> Self {
        Millis(u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
    }

    pub fn saturating_add(self, d: Duration) -> Self {
        Millis(self.0.saturating_add(Self::from_duration(d).0))
    }

    /// Time left until `deadline`, zero if it has passed.
    pub fn until(self, deadline: Millis) -> Duration {
        Duration::from_millis(deadline.0.saturating_sub(self.0))
    }
}
