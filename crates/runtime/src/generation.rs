use tracing::trace;

/// Monotonically increasing request tag for one result channel.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Generation(pub u64);

impl std::fmt::Display for Generation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "g{}", self.0)
    }
}

/// Staleness gate for one channel of async results.
///
/// Ordering contract:
/// - `issue` hands out strictly increasing generations starting at 1.
/// - Only the latest issued generation can be published.
/// - Published generations are strictly increasing, so consumers never
///   observe a result older than one they already saw.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GenerationGate {
    latest: Generation,
    settled: Generation,
    published: Option<Generation>,
}

impl GenerationGate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn issue(&mut self) -> Generation {
        self.latest = Generation(self.latest.0 + 1);
        self.latest
    }

    /// Issues a generation that will never produce a result, invalidating
    /// everything in flight.
    pub fn invalidate(&mut self) -> Generation {
        let g = self.issue();
        self.settled = g;
        g
    }

    pub fn latest(&self) -> Generation {
        self.latest
    }

    pub fn published(&self) -> Option<Generation> {
        self.published
    }

    pub fn is_current(&self, g: Generation) -> bool {
        g == self.latest
    }

    /// True while the latest generation has neither published nor failed.
    pub fn is_pending(&self) -> bool {
        self.latest > self.settled
    }

    /// Accepts `g` for publication if it is still the latest generation.
    ///
    /// Returns `false` for superseded generations; the caller drops them.
    pub fn try_publish(&mut self, g: Generation) -> bool {
        if !self.is_current(g) || self.published.is_some_and(|p| p >= g) {
            trace!(generation = %g, latest = %self.latest, "stale generation dropped");
            return false;
        }
        self.published = Some(g);
        self.settled = g;
        true
    }

    /// Marks `g` as finished without a publishable result (an error).
    ///
    /// Returns `true` if `g` was the latest generation.
    pub fn settle_failed(&mut self, g: Generation) -> bool {
        if !self.is_current(g) {
            return false;
        }
        self.settled = g;
        true
    }

    /// Settles `g` with neither a result nor an error: its request was
    /// dropped before answering.
    ///
    /// Returns `true` if `g` was still the pending latest generation.
    pub fn abandon(&mut self, g: Generation) -> bool {
        if !self.is_current(g) || self.settled >= g {
            return false;
        }
        trace!(generation = %g, "generation abandoned");
        self.settled = g;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::{Generation, GenerationGate};

    #[test]
    fn late_older_generation_is_rejected() {
        let mut gate = GenerationGate::new();
        let g1 = gate.issue();
        let g2 = gate.issue();
        assert!(gate.is_pending());

        assert!(gate.try_publish(g2));
        assert!(!gate.try_publish(g1));
        assert_eq!(gate.published(), Some(g2));
        assert!(!gate.is_pending());
    }

    #[test]
    fn failure_settles_only_current() {
        let mut gate = GenerationGate::new();
        let g1 = gate.issue();
        let g2 = gate.issue();
        assert!(!gate.settle_failed(g1));
        assert!(gate.is_pending());
        assert!(gate.settle_failed(g2));
        assert!(!gate.is_pending());
        assert_eq!(gate.published(), None);
    }

    #[test]
    fn invalidate_supersedes_in_flight_work() {
        let mut gate = GenerationGate::new();
        let g1 = gate.issue();
        let g2 = gate.invalidate();
        assert_eq!(g2, Generation(2));
        assert!(!gate.is_pending());
        assert!(!gate.try_publish(g1));
    }

    #[test]
    fn abandoning_latest_stops_loading() {
        let mut gate = GenerationGate::new();
        let g1 = gate.issue();
        let g2 = gate.issue();
        assert!(!gate.abandon(g1));
        assert!(gate.is_pending());
        assert!(gate.abandon(g2));
        assert!(!gate.is_pending());
        assert!(!gate.abandon(g2));
        assert!(!gate.try_publish(g1));
    }
}
