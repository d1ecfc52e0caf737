/// Rate limiter for file-progress events, shared by every worker.
use parking_lot::Mutex;
use std::time::{Duration, Instant};

/// Lets at most one event through per `interval`, across all workers.
///
/// The last-forwarded timestamp sits behind a single mutex held only for
/// a compare and a store.
#[derive(Debug)]
pub struct ProgressThrottle {
    interval: Duration,
    last: Mutex<Option<Instant>>,
}

impl ProgressThrottle {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last: Mutex::new(None),
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// `true` if an event may be forwarded now; claims the slot if so.
    pub fn should_emit(&self) -> bool {
        self.should_emit_at(Instant::now())
    }

    fn should_emit_at(&self, now: Instant) -> bool {
        let mut last = self.last.lock();
        match *last {
            Some(prev) if now.saturating_duration_since(prev) < self.interval => false,
            _ => {
                *last = Some(now);
                true
            }
        }
    }
}
