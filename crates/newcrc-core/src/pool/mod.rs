/// Worker pool: orchestrates one verification run.
///
/// A manager thread locates the manifest, then a fixed pool of workers drains
/// the work list through a shared atomic cursor. All communication with the
/// caller goes through the event channel on [`VerifyHandle`]; the only input
/// is the cancel flag.
pub mod context;
pub mod worker;

pub use context::RunContext;
pub use worker::run_pool;

use crate::config::VerifyConfig;
use crate::error::ManifestError;
use crate::manifest::{self, Manifest};
use crate::progress::{
    CounterSnapshot, EventReceiver, EventSink, LogSeverity, RunSummary, VerifyEvent,
};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use tracing::{error, info, warn};

/// Handle to a running or completed verification. Allows cancellation and
/// receiving events.
///
/// The channel is bounded: keep draining `events_rx` until `RunComplete` or
/// `RunFailed` arrives (or drop the handle) so workers never block on a full
/// channel.
pub struct VerifyHandle {
    /// Receiver for events from the run.
    pub events_rx: EventReceiver,
    /// Flag to request cancellation.
    cancel_flag: Arc<AtomicBool>,
    /// Join handle for the manager thread.
    thread: Option<thread::JoinHandle<()>>,
}

impl VerifyHandle {
    /// Request the run to stop as soon as possible. Setting it again has no
    /// further effect.
    pub fn cancel(&self) {
        self.cancel_flag.store(true, Ordering::Relaxed);
    }

    /// Check whether cancellation has been requested.
    pub fn is_cancelled(&self) -> bool {
        self.cancel_flag.load(Ordering::Relaxed)
    }

    /// Shared cancel flag, for requesting cancellation from another thread
    /// (e.g. one waiting on stdin) while this handle drains events.
    pub fn cancel_token(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancel_flag)
    }

    /// Wait for the manager thread (and therefore every worker) to exit.
    pub fn join(&mut self) {
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                warn!("Verification manager thread panicked");
            }
        }
    }
}

/// Start a new run on a background thread.
///
/// The run searches `config.base_dir` for the manifest, verifies every entry,
/// and finishes with exactly one `RunComplete` or `RunFailed` event.
pub fn start_verification(config: VerifyConfig) -> VerifyHandle {
    let (events, events_rx) = EventSink::bounded(config.channel_capacity.max(1));
    let cancel_flag = Arc::new(AtomicBool::new(false));
    let cancel_clone = cancel_flag.clone();

    let thread = thread::Builder::new()
        .name("newcrc-manager".into())
        .spawn(move || {
            info!("Starting verification in {}", config.base_dir.display());

            let manifest = match manifest::discover(&config.base_dir, &config.manifest_stem) {
                Ok(m) => m,
                Err(err) => {
                    error!("Verification aborted: {err}");
                    events.emit(VerifyEvent::RunFailed {
                        reason: err.to_string(),
                    });
                    return;
                }
            };

            events.log(
                format!("Manifest: {}", manifest.source_name()),
                LogSeverity::Info,
            );
            verify_manifest(Arc::new(manifest), &config, cancel_clone, events);
        })
        .expect("failed to spawn manager thread");

    VerifyHandle {
        events_rx,
        cancel_flag,
        thread: Some(thread),
    }
}

/// Verify an already-loaded manifest on the calling thread's pool.
///
/// Emits the initial `GlobalProgress { 0, total }`, runs the workers to
/// completion, then emits `RunComplete`. An empty manifest produces
/// `RunFailed` instead and no worker starts.
///
/// This blocks until the run ends, so a bounded `events` channel must either
/// be drained from another thread or be large enough for the whole run.
pub fn verify_manifest(
    manifest: Arc<Manifest>,
    config: &VerifyConfig,
    cancel: Arc<AtomicBool>,
    events: EventSink,
) -> Option<(RunSummary, CounterSnapshot)> {
    if manifest.is_empty() {
        error!("Verification aborted: {} has no entries", manifest.source.display());
        events.emit(VerifyEvent::RunFailed {
            reason: ManifestError::Empty {
                path: manifest.source.clone(),
            }
            .to_string(),
        });
        return None;
    }

    let workers = config.worker_count();
    info!(
        "Verifying {} files ({}) with {} workers",
        manifest.len(),
        manifest.algorithm,
        workers
    );

    let ctx = RunContext::new(manifest, config, cancel, events);
    ctx.events().emit(VerifyEvent::GlobalProgress {
        files_done: 0,
        files_total: ctx.total_files(),
    });

    let summary = run_pool(&ctx, workers);
    let counters = ctx.counters();

    info!(
        "Verification {} in {}s: {} ok, {} corrupted, {} missing",
        if summary.was_canceled { "cancelled" } else { "complete" },
        summary.elapsed_seconds,
        counters.ok,
        counters.corrupted,
        counters.missing
    );

    ctx.events().emit(VerifyEvent::RunComplete { summary, counters });
    Some((summary, counters))
}
