/// NewCrc Core: manifest-driven file integrity verification.
///
/// This crate contains all business logic with zero UI dependencies. A
/// front-end starts a run, reads [`progress::VerifyEvent`]s from the handle's
/// channel, and may cancel it; nothing else crosses the boundary.
///
/// # Modules
///
/// - [`hash`]: Streaming digests for every supported algorithm, plus digest normalisation.
/// - [`manifest`]: Manifest discovery and parsing into a typed work list.
/// - [`verifier`]: Per-file verification and outcome classification.
/// - [`pool`]: Run context, worker threads, cancellation, and the run handle.
/// - [`progress`]: Event types, throttling, speed estimation, outcome counters.
/// - [`config`]: Run settings and their defaults.
pub mod config;
pub mod error;
pub mod hash;
pub mod manifest;
pub mod pool;
pub mod progress;
pub mod size;
pub mod verifier;

pub use config::VerifyConfig;
pub use error::{ConfigError, ManifestError};
pub use hash::HashAlgorithmKind;
pub use manifest::{FileEntry, Manifest};
pub use pool::{start_verification, verify_manifest, VerifyHandle};
pub use progress::{CounterSnapshot, LogSeverity, RunSummary, VerifyEvent};
pub use verifier::VerificationOutcome;
