/// Verifier: checks one manifest entry against the file on disk.
///
/// Every per-file failure is turned into a [`VerificationOutcome`]; nothing
/// here returns an error. The steps run in a fixed order and each one can end
/// the check early:
///
/// 1. file exists, else `Missing`
/// 2. size query succeeds, else `SizeError` (any stat failure other than
///    not-found, e.g. permission denied on a parent directory)
/// 3. open succeeds, else `OpenError`
/// 4. algorithm resolvable, else `UnsupportedAlgorithm`; a CityHash buffer
///    that cannot be allocated is an `OpenError`
/// 5. stream every chunk through the hasher, checking the cancel flag before
///    each read (`Canceled`, uncounted)
/// 6. compare normalised digests: `Ok` or `Corrupted`
use crate::hash::{digests_match, HashAlgorithmKind, Hasher};
use crate::manifest::FileEntry;
use crate::progress::{EventSink, LogSeverity, OutcomeCounters, ProgressThrottle, SpeedWindow};
use std::fs::{self, File};
use std::io::{self, Read};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::debug;

/// Terminal classification of one entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VerificationOutcome {
    Ok,
    Corrupted,
    Missing,
    SizeError,
    OpenError,
    Canceled,
    UnsupportedAlgorithm,
}

impl VerificationOutcome {
    /// Whether this outcome falls in the "corrupted / error" report bucket.
    pub fn is_failure(self) -> bool {
        matches!(
            self,
            Self::Corrupted | Self::SizeError | Self::OpenError | Self::UnsupportedAlgorithm
        )
    }

    /// Prefix for the per-file log line.
    pub fn tag(self) -> &'static str {
        match self {
            Self::Ok => "[OK]",
            Self::Missing => "[?]",
            Self::Canceled => "[--]",
            _ => "[ERR]",
        }
    }

    /// Status word for the per-file log line.
    pub fn status_label(self) -> &'static str {
        match self {
            Self::Ok => "OK",
            Self::Corrupted => "CORRUPTED",
            Self::Missing => "MISSING",
            Self::Canceled => "CANCELED",
            Self::SizeError | Self::OpenError | Self::UnsupportedAlgorithm => "ERROR",
        }
    }

    pub fn severity(self) -> LogSeverity {
        match self {
            Self::Ok => LogSeverity::Success,
            Self::Missing => LogSeverity::Warning,
            Self::Canceled => LogSeverity::Info,
            _ => LogSeverity::Error,
        }
    }
}

/// Result of verifying one entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileReport {
    pub outcome: VerificationOutcome,
    /// Size reported by the filesystem; 0 if it was never queried.
    pub file_size: u64,
    /// Computed digest, present only when the whole file was hashed.
    pub digest: Option<String>,
}

impl FileReport {
    fn new(outcome: VerificationOutcome, file_size: u64) -> Self {
        Self {
            outcome,
            file_size,
            digest: None,
        }
    }
}

/// Shared run state a verification needs, borrowed from the run context.
pub struct VerifyContext<'a> {
    /// Relative manifest paths are resolved against this directory.
    pub base_dir: &'a Path,
    pub cancel: &'a AtomicBool,
    pub counters: &'a OutcomeCounters,
    pub throttle: &'a ProgressThrottle,
    pub events: &'a EventSink,
}

impl VerifyContext<'_> {
    fn is_cancelled(&self) -> bool {
        self.cancel.load(Ordering::Relaxed)
    }

    /// Count `outcome` and wrap it in a report.
    fn finish(&self, outcome: VerificationOutcome, file_size: u64) -> FileReport {
        self.counters.record(outcome);
        FileReport::new(outcome, file_size)
    }
}

/// Verify `entry` with `algorithm`, reading through `buffer`.
///
/// `buffer` is the chunk buffer; its length is the read size. Workers keep
/// one buffer for all the files they verify.
pub fn verify(
    entry: &FileEntry,
    algorithm: HashAlgorithmKind,
    ctx: &VerifyContext<'_>,
    buffer: &mut [u8],
) -> FileReport {
    let file_name = entry.file_name();
    ctx.events.file_progress(&file_name, 0, 0.0);

    let path = entry.resolve(ctx.base_dir);
    let file_size = match fs::metadata(&path) {
        Ok(meta) => meta.len(),
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            return ctx.finish(VerificationOutcome::Missing, 0);
        }
        Err(err) => {
            debug!("Size query failed for {}: {err}", path.display());
            return ctx.finish(VerificationOutcome::SizeError, 0);
        }
    };

    let mut file = match File::open(&path) {
        Ok(f) => f,
        Err(err) => {
            debug!("Open failed for {}: {err}", path.display());
            return ctx.finish(VerificationOutcome::OpenError, file_size);
        }
    };

    let Some(mut hasher) = Hasher::new(algorithm) else {
        return ctx.finish(VerificationOutcome::UnsupportedAlgorithm, file_size);
    };
    if let Err(err) = hasher.reserve(file_size) {
        debug!("Cannot buffer {} for {algorithm}: {err}", path.display());
        return ctx.finish(VerificationOutcome::OpenError, file_size);
    }

    let mut speed = SpeedWindow::new();
    let mut read_total: u64 = 0;
    let mut last_percent: u8 = 0;

    loop {
        if ctx.is_cancelled() {
            return FileReport::new(VerificationOutcome::Canceled, file_size);
        }

        let n = match file.read(buffer) {
            Ok(0) => break,
            Ok(n) => n,
            Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
            Err(err) => {
                debug!("Read failed for {}: {err}", path.display());
                return ctx.finish(VerificationOutcome::OpenError, file_size);
            }
        };

        hasher.update(&buffer[..n]);
        read_total += n as u64;
        speed.add_sample(n as u64);

        // A file that grows while being read must not push the bar backwards
        // or past 100.
        let percent = percent_complete(read_total, file_size).max(last_percent);
        last_percent = percent;

        if ctx.throttle.should_emit() {
            ctx.events.file_progress(&file_name, percent, speed.speed_mbps());
        }
    }

    let digest = hasher.finalize();
    let outcome = if digests_match(&digest, &entry.expected_digest) {
        VerificationOutcome::Ok
    } else {
        VerificationOutcome::Corrupted
    };

    let mut report = ctx.finish(outcome, file_size);
    report.digest = Some(digest);
    ctx.events.file_progress(&file_name, 100, speed.speed_mbps());
    report
}

/// Whole-number percentage of `done` over `total`, capped at 100.
/// An empty file reports 0 until its forced 100% event.
fn percent_complete(done: u64, total: u64) -> u8 {
    if total == 0 {
        return 0;
    }
    let pct = (u128::from(done) * 100 / u128::from(total)).min(100);
    pct as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hash::hash_bytes;
    use crate::progress::{EventReceiver, VerifyEvent};
    use std::time::Duration;
    use tempfile::TempDir;

    struct Harness {
        cancel: AtomicBool,
        counters: OutcomeCounters,
        throttle: ProgressThrottle,
        events: EventSink,
        rx: EventReceiver,
        dir: TempDir,
    }

    impl Harness {
        fn new() -> Self {
            let (events, rx) = EventSink::bounded(10_000);
            Self {
                cancel: AtomicBool::new(false),
                counters: OutcomeCounters::new(),
                throttle: ProgressThrottle::new(Duration::ZERO),
                events,
                rx,
                dir: TempDir::new().unwrap(),
            }
        }

        fn ctx(&self) -> VerifyContext<'_> {
            VerifyContext {
                base_dir: self.dir.path(),
                cancel: &self.cancel,
                counters: &self.counters,
                throttle: &self.throttle,
                events: &self.events,
            }
        }

        fn write(&self, name: &str, data: &[u8]) {
            fs::write(self.dir.path().join(name), data).unwrap();
        }

        fn run(&self, entry: &FileEntry, kind: HashAlgorithmKind, chunk: usize) -> FileReport {
            let mut buffer = vec![0u8; chunk];
            verify(entry, kind, &self.ctx(), &mut buffer)
        }

        fn percents(&self) -> Vec<u8> {
            self.rx
                .try_iter()
                .filter_map(|e| match e {
                    VerifyEvent::FileProgress { percent, .. } => Some(percent),
                    _ => None,
                })
                .collect()
        }
    }

    #[test]
    fn test_ok_with_progress_bounds() {
        let h = Harness::new();
        let data = vec![7u8; 10_000];
        h.write("a.bin", &data);
        let expected = hash_bytes(HashAlgorithmKind::Sha256, &data).unwrap();

        let report = h.run(
            &FileEntry::new("a.bin", expected.to_uppercase()),
            HashAlgorithmKind::Sha256,
            1_024,
        );
        assert_eq!(report.outcome, VerificationOutcome::Ok);
        assert_eq!(report.file_size, 10_000);
        assert_eq!(report.digest.as_deref(), Some(expected.as_str()));
        assert_eq!(h.counters.snapshot().ok, 1);

        let percents = h.percents();
        assert_eq!(percents.first(), Some(&0));
        assert_eq!(percents.last(), Some(&100));
        assert!(percents.windows(2).all(|w| w[0] <= w[1]), "{percents:?}");
    }

    #[test]
    fn test_mismatch_is_corrupted() {
        let h = Harness::new();
        h.write("b.bin", b"hello");
        let report = h.run(
            &FileEntry::new("b.bin", "00000000"),
            HashAlgorithmKind::Crc32,
            64,
        );
        assert_eq!(report.outcome, VerificationOutcome::Corrupted);
        let snap = h.counters.snapshot();
        assert_eq!((snap.ok, snap.corrupted, snap.missing), (0, 1, 0));
        assert_eq!(snap.mismatches(), 1);
    }

    #[test]
    fn test_missing_reads_nothing() {
        let h = Harness::new();
        let report = h.run(
            &FileEntry::new("missing.bin", "deadbeef"),
            HashAlgorithmKind::Crc32,
            64,
        );
        assert_eq!(report.outcome, VerificationOutcome::Missing);
        assert_eq!(report.digest, None);
        assert_eq!(h.counters.snapshot().missing, 1);
        // Only the initial 0% event; no completion event.
        assert_eq!(h.percents(), vec![0]);
    }

    #[test]
    fn test_none_algorithm_is_unsupported() {
        let h = Harness::new();
        h.write("c.bin", b"data");
        let report = h.run(&FileEntry::new("c.bin", "0"), HashAlgorithmKind::None, 64);
        assert_eq!(report.outcome, VerificationOutcome::UnsupportedAlgorithm);
        let snap = h.counters.snapshot();
        assert_eq!((snap.corrupted, snap.unsupported), (1, 1));
    }

    /// With no usable algorithm, a missing file is still just missing.
    #[test]
    fn test_none_algorithm_missing_file_is_missing() {
        let h = Harness::new();
        let report = h.run(&FileEntry::new("gone.bin", "0"), HashAlgorithmKind::None, 64);
        assert_eq!(report.outcome, VerificationOutcome::Missing);
        let snap = h.counters.snapshot();
        assert_eq!((snap.missing, snap.corrupted, snap.unsupported), (1, 0, 0));
    }

    /// A stat failure that is not "not found" is a size error, not a missing
    /// file. Walking through a regular file as if it were a directory fails
    /// with `NotADirectory` for every user, root included.
    #[test]
    fn test_stat_failure_is_size_error() {
        let h = Harness::new();
        h.write("plain.bin", b"not a directory");
        let report = h.run(
            &FileEntry::new("plain.bin/child.bin", "0"),
            HashAlgorithmKind::Crc32,
            64,
        );
        assert_eq!(report.outcome, VerificationOutcome::SizeError);
        assert_eq!(report.outcome.status_label(), "ERROR");
        let snap = h.counters.snapshot();
        assert_eq!((snap.ok, snap.corrupted, snap.missing), (0, 1, 0));
        assert_eq!(snap.size_errors, 1);
        assert_eq!(snap.mismatches(), 0);
    }

    /// A directory that cannot be searched hides its files behind
    /// `PermissionDenied`, which must also count as a size error.
    #[cfg(unix)]
    #[test]
    fn test_permission_denied_is_size_error() {
        use std::os::unix::fs::PermissionsExt;

        let h = Harness::new();
        let locked = h.dir.path().join("locked");
        fs::create_dir(&locked).unwrap();
        fs::write(locked.join("a.bin"), b"secret").unwrap();
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();

        // Root ignores directory permissions, so there is nothing to observe.
        let denied = fs::metadata(locked.join("a.bin")).is_err();
        let report = h.run(&FileEntry::new("locked/a.bin", "0"), HashAlgorithmKind::Crc32, 64);
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();

        if denied {
            assert_eq!(report.outcome, VerificationOutcome::SizeError);
            assert_eq!(h.counters.snapshot().size_errors, 1);
        } else {
            assert_ne!(report.outcome, VerificationOutcome::Missing);
        }
    }

    /// A directory exists and can be stat'ed but not read as a file.
    #[test]
    fn test_directory_is_an_error_not_a_panic() {
        let h = Harness::new();
        fs::create_dir(h.dir.path().join("sub")).unwrap();
        let report = h.run(&FileEntry::new("sub", "0"), HashAlgorithmKind::Crc32, 64);
        assert!(report.outcome.is_failure(), "{:?}", report.outcome);
        assert_eq!(h.counters.snapshot().corrupted, 1);
    }

    #[test]
    fn test_cancel_discards_outcome() {
        let h = Harness::new();
        h.write("d.bin", &[1u8; 4_096]);
        h.cancel.store(true, Ordering::Relaxed);
        let report = h.run(&FileEntry::new("d.bin", "0"), HashAlgorithmKind::Xxh3, 512);
        assert_eq!(report.outcome, VerificationOutcome::Canceled);
        assert_eq!(report.digest, None);
        assert_eq!(h.counters.snapshot().total(), 0);
        assert!(!h.percents().contains(&100));
    }

    #[test]
    fn test_empty_file_ok() {
        let h = Harness::new();
        h.write("empty.bin", b"");
        let expected = hash_bytes(HashAlgorithmKind::Crc32, b"").unwrap();
        let report = h.run(&FileEntry::new("empty.bin", expected), HashAlgorithmKind::Crc32, 64);
        assert_eq!(report.outcome, VerificationOutcome::Ok);
        assert_eq!(h.percents(), vec![0, 100]);
    }

    #[test]
    fn test_every_algorithm_round_trips_through_disk() {
        let h = Harness::new();
        let data: Vec<u8> = (0..5_000u32).map(|i| (i % 251) as u8).collect();
        h.write("e.bin", &data);
        for kind in HashAlgorithmKind::SUPPORTED {
            let expected = hash_bytes(kind, &data).unwrap();
            let report = h.run(&FileEntry::new("e.bin", expected), kind, 333);
            assert_eq!(report.outcome, VerificationOutcome::Ok, "{kind}");
        }
        assert_eq!(h.counters.snapshot().ok, HashAlgorithmKind::SUPPORTED.len());
    }

    #[test]
    fn test_percent_complete() {
        assert_eq!(percent_complete(0, 0), 0);
        assert_eq!(percent_complete(5, 0), 0);
        assert_eq!(percent_complete(50, 100), 50);
        assert_eq!(percent_complete(150, 100), 100);
        assert_eq!(percent_complete(u64::MAX, u64::MAX), 100);
    }

    #[test]
    fn test_outcome_labels() {
        assert_eq!(VerificationOutcome::Ok.tag(), "[OK]");
        assert_eq!(VerificationOutcome::Missing.tag(), "[?]");
        assert_eq!(VerificationOutcome::OpenError.tag(), "[ERR]");
        assert_eq!(VerificationOutcome::SizeError.status_label(), "ERROR");
        assert_eq!(VerificationOutcome::Corrupted.status_label(), "CORRUPTED");
        assert!(!VerificationOutcome::Missing.is_failure());
        assert!(VerificationOutcome::UnsupportedAlgorithm.is_failure());
    }
}
