/// Outcome counters for one run.
use crate::verifier::VerificationOutcome;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Atomic tallies shared by all workers of one run.
///
/// `corrupted` is the reporting bucket for everything that is neither OK nor
/// missing: digest mismatches plus size, open, and unsupported-algorithm
/// errors. The error kinds are also tallied on their own so a consumer can
/// tell a bad file from an unreadable one.
#[derive(Debug, Default)]
pub struct OutcomeCounters {
    ok: AtomicUsize,
    corrupted: AtomicUsize,
    missing: AtomicUsize,
    size_errors: AtomicUsize,
    open_errors: AtomicUsize,
    unsupported: AtomicUsize,
}

impl OutcomeCounters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count a terminal outcome. Returns `false` (and counts nothing) for
    /// [`VerificationOutcome::Canceled`].
    pub fn record(&self, outcome: VerificationOutcome) -> bool {
        let detail = match outcome {
            VerificationOutcome::Ok => {
                self.ok.fetch_add(1, Ordering::Relaxed);
                return true;
            }
            VerificationOutcome::Missing => {
                self.missing.fetch_add(1, Ordering::Relaxed);
                return true;
            }
            VerificationOutcome::Canceled => return false,
            VerificationOutcome::Corrupted => None,
            VerificationOutcome::SizeError => Some(&self.size_errors),
            VerificationOutcome::OpenError => Some(&self.open_errors),
            VerificationOutcome::UnsupportedAlgorithm => Some(&self.unsupported),
        };
        if let Some(counter) = detail {
            counter.fetch_add(1, Ordering::Relaxed);
        }
        self.corrupted.fetch_add(1, Ordering::Relaxed);
        true
    }

    pub fn snapshot(&self) -> CounterSnapshot {
        CounterSnapshot {
            ok: self.ok.load(Ordering::Relaxed),
            corrupted: self.corrupted.load(Ordering::Relaxed),
            missing: self.missing.load(Ordering::Relaxed),
            size_errors: self.size_errors.load(Ordering::Relaxed),
            open_errors: self.open_errors.load(Ordering::Relaxed),
            unsupported: self.unsupported.load(Ordering::Relaxed),
        }
    }
}

/// Plain copy of the counters, taken after the pool has joined.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CounterSnapshot {
    pub ok: usize,
    /// Mismatches and per-file errors combined.
    pub corrupted: usize,
    pub missing: usize,
    pub size_errors: usize,
    pub open_errors: usize,
    pub unsupported: usize,
}

impl CounterSnapshot {
    /// Files with a recorded outcome.
    pub fn total(&self) -> usize {
        self.ok + self.corrupted + self.missing
    }

    /// Digest mismatches only, without the error kinds.
    pub fn mismatches(&self) -> usize {
        self.corrupted - (self.size_errors + self.open_errors + self.unsupported)
    }

    /// `count` as a percentage of `total`, 0 when `total` is 0.
    pub fn percent_of(count: usize, total: usize) -> f64 {
        if total == 0 {
            0.0
        } else {
            count as f64 / total as f64 * 100.0
        }
    }
}
