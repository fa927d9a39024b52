use tokio::time::Instant;

use foundation::time::Millis;

/// Session clock on top of tokio's (pausable) time source.
#[derive(Debug, Copy, Clone)]
pub struct Clock {
    epoch: Instant,
}

impl Default for Clock {
    fn default() -> Self {
        Self::start()
    }
}

impl Clock {
    pub fn start() -> Self {
        Self {
            epoch: Instant::now(),
        }
    }

    pub fn now(&self) -> Millis {
        Millis::from_duration(self.epoch.elapsed())
    }

    /// Tokio instant for a session timestamp, for `sleep_until`.
    pub fn instant(&self, at: Millis) -> Instant {
        self.epoch + std::time::Duration::from_millis(at.0)
    }
}

#[cfg(test)]
mod tests {
    use super::Clock;
    use foundation::time::Millis;
    use std::time::Duration;

    #[tokio::test(start_paused = true)]
    async fn follows_paused_time() {
        let clock = Clock::start();
        assert_eq!(clock.now(), Millis(0));
        tokio::time::sleep(Duration::from_millis(150)).await;
        assert_eq!(clock.now(), Millis(150));
        tokio::time::sleep_until(clock.instant(Millis(400))).await;
        assert_eq!(clock.now(), Millis(400));
    }
}
