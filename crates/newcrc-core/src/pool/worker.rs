/// Worker threads: each repeatedly claims the next entry, verifies it, and
/// reports the outcome until the work list is exhausted or the run is
/// cancelled.
use crate::pool::context::RunContext;
use crate::progress::{RunSummary, VerifyEvent};
use crate::size::format_size;
use crate::verifier::{verify, VerificationOutcome};
use std::thread;
use std::time::Instant;
use tracing::{debug, warn};

/// Run `workers` threads over `ctx` and wait for all of them.
///
/// Returns only after every worker has exited, so the summary and the
/// counters read afterwards are final.
pub fn run_pool(ctx: &RunContext, workers: usize) -> RunSummary {
    let workers = workers.max(1);
    let start = Instant::now();

    thread::scope(|scope| {
        let mut handles = Vec::with_capacity(workers);
        for id in 0..workers {
            let spawned = thread::Builder::new()
                .name(format!("newcrc-worker-{id}"))
                .spawn_scoped(scope, move || worker_loop(ctx, id));
            match spawned {
                Ok(handle) => handles.push(handle),
                Err(err) => warn!("Failed to spawn worker {id}: {err}"),
            }
        }

        // Could not start a single thread: do the work here instead.
        if handles.is_empty() {
            worker_loop(ctx, 0);
        }

        for handle in handles {
            if handle.join().is_err() {
                warn!("A verification worker panicked");
            }
        }
    });

    RunSummary {
        total_files: ctx.total_files(),
        elapsed_seconds: start.elapsed().as_secs(),
        was_canceled: ctx.is_cancelled(),
    }
}

/// One worker: claim → verify → report, until no work is left or the run
/// is cancelled.
fn worker_loop(ctx: &RunContext, id: usize) {
    let manifest = ctx.manifest();
    let verify_ctx = ctx.verify_context();
    let mut buffer = vec![0u8; ctx.chunk_size()];
    let mut verified: usize = 0;

    debug!("Worker {id} started");

    while !ctx.is_cancelled() {
        let Some((idx, entry)) = ctx.claim_next() else {
            break;
        };

        let report = verify(entry, manifest.algorithm, &verify_ctx, &mut buffer);
        if report.outcome == VerificationOutcome::Canceled {
            debug!("Worker {id} cancelled during entry {idx}");
            break;
        }
        verified += 1;

        let files_done = ctx.mark_processed();
        ctx.events().emit(VerifyEvent::GlobalProgress {
            files_done,
            files_total: ctx.total_files(),
        });

        let outcome = report.outcome;
        ctx.events().log(
            format!(
                "{} {} ({}) - {}",
                outcome.tag(),
                entry.display_path(),
                format_size(report.file_size),
                outcome.status_label()
            ),
            outcome.severity(),
        );
        debug!("Entry {idx} {}: {:?}", entry.path.display(), outcome);
    }

    debug!("Worker {id} stopped after {verified} files");
}
