/// Per-run shared state.
///
/// One `RunContext` exists per run and is dropped when it ends, so counters
/// and the work cursor start from zero every time. Workers get it by shared
/// reference; everything mutable inside is atomic or behind the throttle's
/// single mutex.
use crate::config::VerifyConfig;
use crate::manifest::{FileEntry, Manifest};
use crate::progress::{CounterSnapshot, EventSink, OutcomeCounters, ProgressThrottle};
use crate::verifier::VerifyContext;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

pub struct RunContext {
    manifest: Arc<Manifest>,
    base_dir: PathBuf,
    chunk_size: usize,
    /// Index of the next unclaimed entry.
    cursor: AtomicUsize,
    /// Entries that reached a terminal (non-canceled) outcome.
    processed: AtomicUsize,
    cancel: Arc<AtomicBool>,
    counters: OutcomeCounters,
    throttle: ProgressThrottle,
    events: EventSink,
}

impl RunContext {
    pub fn new(
        manifest: Arc<Manifest>,
        config: &VerifyConfig,
        cancel: Arc<AtomicBool>,
        events: EventSink,
    ) -> Self {
        Self {
            manifest,
            base_dir: config.base_dir.clone(),
            chunk_size: config.chunk_size.max(1),
            cursor: AtomicUsize::new(0),
            processed: AtomicUsize::new(0),
            cancel,
            counters: OutcomeCounters::new(),
            throttle: ProgressThrottle::new(config.throttle_interval()),
            events,
        }
    }

    pub fn manifest(&self) -> &Manifest {
        &self.manifest
    }

    pub fn total_files(&self) -> usize {
        self.manifest.len()
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    pub fn events(&self) -> &EventSink {
        &self.events
    }

    /// Claim the next entry.
    ///
    /// A single `fetch_add` hands every index to exactly one caller; once the
    /// cursor passes the end, every further claim returns `None`.
    pub fn claim_next(&self) -> Option<(usize, &FileEntry)> {
        let idx = self.cursor.fetch_add(1, Ordering::Relaxed);
        self.manifest.entries.get(idx).map(|entry| (idx, entry))
    }

    /// Record one finished file and return the new processed count.
    pub fn mark_processed(&self) -> usize {
        self.processed.fetch_add(1, Ordering::Relaxed) + 1
    }

    pub fn processed(&self) -> usize {
        self.processed.load(Ordering::Relaxed)
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.load(Ordering::Relaxed)
    }

    pub fn counters(&self) -> CounterSnapshot {
        self.counters.snapshot()
    }

    pub fn verify_context(&self) -> VerifyContext<'_> {
        VerifyContext {
            base_dir: &self.base_dir,
            cancel: &self.cancel,
            counters: &self.counters,
            throttle: &self.throttle,
            events: &self.events,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hash::HashAlgorithmKind;
    use std::collections::HashSet;

    fn context_with(n: usize) -> RunContext {
        let manifest = Manifest {
            algorithm: HashAlgorithmKind::Crc32,
            entries: (0..n)
                .map(|i| FileEntry::new(format!("f{i}.bin"), "0"))
                .collect(),
            source: PathBuf::from("CRC.crc32"),
        };
        let (events, _rx) = EventSink::bounded(1);
        RunContext::new(
            Arc::new(manifest),
            &VerifyConfig::default(),
            Arc::new(AtomicBool::new(false)),
            events,
        )
    }

    /// Racing claimers must together see every index exactly once.
    #[test]
    fn test_claims_partition_the_work_list() {
        for threads in 1..=8 {
            let ctx = context_with(1_000);
            let claimed: Vec<usize> = std::thread::scope(|s| {
                let handles: Vec<_> = (0..threads)
                    .map(|_| {
                        s.spawn(|| {
                            let mut mine = Vec::new();
                            while let Some((idx, _)) = ctx.claim_next() {
                                mine.push(idx);
                            }
                            mine
                        })
                    })
                    .collect();
                handles
                    .into_iter()
                    .flat_map(|h| h.join().unwrap())
                    .collect()
            });

            assert_eq!(claimed.len(), 1_000, "{threads} threads");
            let unique: HashSet<usize> = claimed.iter().copied().collect();
            assert_eq!(unique.len(), 1_000, "duplicate claim with {threads} threads");
            assert!(unique.iter().all(|&i| i < 1_000));
        }
    }

    #[test]
    fn test_claims_stay_exhausted() {
        let ctx = context_with(2);
        assert_eq!(ctx.claim_next().map(|(i, _)| i), Some(0));
        assert_eq!(ctx.claim_next().map(|(i, e)| (i, e.path.clone())), Some((1, "f1.bin".into())));
        assert!(ctx.claim_next().is_none());
        assert!(ctx.claim_next().is_none());
    }

    #[test]
    fn test_zero_chunk_size_is_clamped() {
        let (events, _rx) = EventSink::bounded(1);
        let config = VerifyConfig {
            chunk_size: 0,
            ..VerifyConfig::default()
        };
        let ctx = RunContext::new(
            Arc::new(Manifest {
                algorithm: HashAlgorithmKind::Crc32,
                entries: Vec::new(),
                source: PathBuf::new(),
            }),
            &config,
            Arc::new(AtomicBool::new(false)),
            events,
        );
        assert_eq!(ctx.chunk_size(), 1);
        assert_eq!(ctx.processed(), 0);
        assert_eq!(ctx.counters().total(), 0);
    }
}
