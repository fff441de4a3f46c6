use std::time::Duration;

/// A periodic check driven by frame time.
///
/// Fires on the first frame, then once `interval` has accumulated again. At
/// most one firing per frame: a long frame does not queue a backlog of
/// checks, the check itself is expected to catch up.
#[derive(Debug, Clone)]
pub struct Periodic {
    interval: Duration,
    elapsed: Duration,
    stopped: bool,
}

impl Periodic {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            elapsed: interval,
            stopped: false,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Account for `dt` of frame time. Returns true when the check is due.
    pub fn advance(&mut self, dt: Duration) -> bool {
        if self.stopped {
            return false;
        }
        self.elapsed += dt;
        if self.elapsed < self.interval {
            return false;
        }
        self.elapsed = Duration::ZERO;
        true
    }

    /// Tear the schedule down; it never fires again.
    pub fn stop(&mut self) {
        self.stopped = true;
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped
    }
}
