/// Progress reporting: typed events sent from the worker threads to a single
/// consumer via a crossbeam channel.
///
/// File-progress events are rate-limited by a [`ProgressThrottle`] shared by
/// all workers. The 0% and 100% events of each file bypass the throttle so a
/// consumer always sees where a file starts and ends.
pub mod counters;
pub mod speed;
pub mod throttle;

pub use counters::{CounterSnapshot, OutcomeCounters};
pub use speed::{SpeedWindow, SPEED_WINDOW_SAMPLES};
pub use throttle::ProgressThrottle;

use compact_str::CompactString;
use crossbeam_channel::{Receiver, Sender};

/// How a log line should be presented.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogSeverity {
    Info,
    Success,
    Warning,
    Error,
}

/// Produced once when the pool has joined.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    pub total_files: usize,
    pub elapsed_seconds: u64,
    pub was_canceled: bool,
}

/// Events emitted by a verification run.
#[derive(Debug, Clone)]
pub enum VerifyEvent {
    /// Progress within one file. `percent` never decreases for a given file.
    FileProgress {
        file_name: CompactString,
        percent: u8,
        speed_mbps: f64,
    },
    /// Sent after every file that reached a terminal outcome.
    GlobalProgress {
        files_done: usize,
        files_total: usize,
    },
    LogLine {
        text: String,
        severity: LogSeverity,
    },
    /// The run ended, normally or by cancellation. Always the last event.
    RunComplete {
        summary: RunSummary,
        counters: CounterSnapshot,
    },
    /// The run could not start (no manifest, or an empty one).
    RunFailed { reason: String },
}

pub type EventReceiver = Receiver<VerifyEvent>;

/// Sending half of the event channel.
///
/// A dropped receiver is not an error: the run keeps going and its events
/// are discarded.
#[derive(Debug, Clone)]
pub struct EventSink {
    tx: Sender<VerifyEvent>,
}

impl EventSink {
    pub fn new(tx: Sender<VerifyEvent>) -> Self {
        Self { tx }
    }

    /// Create a bounded channel and wrap its sending half.
    pub fn bounded(capacity: usize) -> (Self, EventReceiver) {
        let (tx, rx) = crossbeam_channel::bounded(capacity);
        (Self::new(tx), rx)
    }

    pub fn emit(&self, event: VerifyEvent) {
        let _ = self.tx.send(event);
    }

    pub fn log(&self, text: impl Into<String>, severity: LogSeverity) {
        self.emit(VerifyEvent::LogLine {
            text: text.into(),
            severity,
        });
    }

    pub fn file_progress(&self, file_name: &str, percent: u8, speed_mbps: f64) {
        self.emit(VerifyEvent::FileProgress {
            file_name: CompactString::new(file_name),
            percent,
            speed_mbps,
        });
    }
}
