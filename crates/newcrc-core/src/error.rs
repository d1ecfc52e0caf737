/// Error types for the verification engine.
///
/// Only run-level failures are errors. Per-file problems (missing file,
/// unreadable file, digest mismatch) are absorbed by the verifier and become
/// a [`crate::verifier::VerificationOutcome`].
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Failures while locating or parsing a manifest.
#[derive(Debug, Error)]
pub enum ManifestError {
    /// The manifest's extension does not name a supported algorithm.
    #[error("unrecognised manifest extension: {path}")]
    UnknownExtension { path: PathBuf },

    #[error("failed to read manifest {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// None of the candidate manifest files exists or could be read.
    #[error("No manifest found.")]
    NotFound,

    /// The manifest parsed but contains no usable entries.
    #[error("Empty manifest.")]
    Empty { path: PathBuf },
}

impl ManifestError {
    /// Whether this error ends the run before any file is verified.
    ///
    /// Extension and read errors on a single candidate are not fatal on
    /// their own; discovery moves on to the next candidate.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::NotFound | Self::Empty { .. })
    }
}

/// Failures while loading a [`crate::config::VerifyConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}
