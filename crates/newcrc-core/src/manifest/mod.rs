/// Manifest loading: turns a checksum-list file into a typed work list.
///
/// The algorithm is chosen by the manifest's extension alone. Each entry line
/// has the conventional `<digest> [*]<path>` shape written by common checksum
/// tools; `;` starts a comment line.
///
/// Manifests are parsed as bytes, not text. The path part of a line is kept
/// byte-for-byte, so names written in a legacy codepage still resolve to the
/// file they name on Unix.
///
/// Discovery tries a fixed list of candidate names (`CRC.crc32`,
/// `CRC.crc32c`, ...) in priority order and takes the first one that exists
/// and can be read.
use crate::error::ManifestError;
use crate::hash::HashAlgorithmKind;
use std::borrow::Cow;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// One file to verify and the digest it was recorded with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEntry {
    /// Path exactly as written in the manifest (may contain spaces).
    pub path: PathBuf,
    pub expected_digest: String,
}

impl FileEntry {
    pub fn new(path: impl Into<PathBuf>, expected_digest: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            expected_digest: expected_digest.into(),
        }
    }

    /// Path for log lines. Bytes that are not valid UTF-8 are shown as U+FFFD.
    pub fn display_path(&self) -> Cow<'_, str> {
        self.path.to_string_lossy()
    }

    /// Last path component, for progress display.
    ///
    /// Both `/` and `\` count as separators since manifests are routinely
    /// written on one OS and verified on another.
    pub fn file_name(&self) -> String {
        let full = self.display_path();
        full.rsplit(['/', '\\'])
            .next()
            .filter(|name| !name.is_empty())
            .unwrap_or(&*full)
            .to_string()
    }

    /// Location on disk: absolute paths as-is, relative ones under `base_dir`.
    pub fn resolve(&self, base_dir: &Path) -> PathBuf {
        if self.path.is_absolute() {
            self.path.clone()
        } else {
            base_dir.join(&self.path)
        }
    }
}

/// A parsed manifest. Read-only once built.
#[derive(Debug, Clone)]
pub struct Manifest {
    pub algorithm: HashAlgorithmKind,
    pub entries: Vec<FileEntry>,
    /// File the manifest was read from.
    pub source: PathBuf,
}

impl Manifest {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Display name of the manifest file (e.g. `CRC.sha256`).
    pub fn source_name(&self) -> String {
        self.source
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.source.display().to_string())
    }
}

/// Parse one manifest line.
///
/// Returns `None` for blank lines, `;` comments, and lines that leave no
/// path once the digest and the optional binary-mode `*` are removed.
pub fn parse_line(line: impl AsRef<[u8]>) -> Option<FileEntry> {
    let line = line.as_ref();
    let line = line.strip_suffix(b"\r").unwrap_or(line);
    if line.is_empty() || line.starts_with(b";") {
        return None;
    }

    let line = line.trim_ascii_start();
    let split = line.iter().position(u8::is_ascii_whitespace)?;
    let (digest, rest) = line.split_at(split);

    let rest = rest.trim_ascii_start();
    let path = rest.strip_prefix(b"*").unwrap_or(rest);
    if path.is_empty() {
        return None;
    }

    let path = path_from_bytes(path)?;
    Some(FileEntry::new(path, String::from_utf8_lossy(digest)))
}

/// Parse every entry line of a manifest body, preserving file order.
pub fn parse_manifest(bytes: impl AsRef<[u8]>) -> Vec<FileEntry> {
    let bytes = bytes.as_ref();
    let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
    bytes.split(|&b| b == b'\n').filter_map(parse_line).collect()
}

/// Unix paths are arbitrary bytes, so the manifest's bytes are used as-is.
#[cfg(unix)]
fn path_from_bytes(bytes: &[u8]) -> Option<PathBuf> {
    use std::os::unix::ffi::OsStrExt;
    Some(PathBuf::from(std::ffi::OsStr::from_bytes(bytes)))
}

/// Elsewhere a path must be valid UTF-8; other lines are dropped with a
/// warning rather than rewritten into a name that does not exist.
#[cfg(not(unix))]
fn path_from_bytes(bytes: &[u8]) -> Option<PathBuf> {
    match std::str::from_utf8(bytes) {
        Ok(path) => Some(PathBuf::from(path)),
        Err(_) => {
            warn!(
                "Skipping manifest entry with a non-UTF-8 path: {}",
                String::from_utf8_lossy(bytes)
            );
            None
        }
    }
}

/// Load a manifest file; the extension selects the algorithm.
pub fn load(path: &Path) -> Result<Manifest, ManifestError> {
    let algorithm = path
        .extension()
        .and_then(|ext| ext.to_str())
        .and_then(HashAlgorithmKind::from_extension)
        .ok_or_else(|| ManifestError::UnknownExtension {
            path: path.to_path_buf(),
        })?;

    let bytes = std::fs::read(path).map_err(|source| ManifestError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let entries = parse_manifest(&bytes);

    debug!(
        "Loaded {} entries from {} ({})",
        entries.len(),
        path.display(),
        algorithm
    );

    Ok(Manifest {
        algorithm,
        entries,
        source: path.to_path_buf(),
    })
}

/// Candidate manifest filenames for `stem`, in priority order.
pub fn candidate_names(stem: &str) -> Vec<String> {
    HashAlgorithmKind::SUPPORTED
        .iter()
        .filter_map(|kind| kind.extension())
        .map(|ext| format!("{stem}.{ext}"))
        .collect()
}

/// Find and load the first usable candidate manifest in `base_dir`.
///
/// A candidate that exists but cannot be read is skipped. The first one that
/// loads ends the search even if it has no entries, in which case the result
/// is [`ManifestError::Empty`].
pub fn discover(base_dir: &Path, stem: &str) -> Result<Manifest, ManifestError> {
    for name in candidate_names(stem) {
        let path = base_dir.join(&name);
        if !path.exists() {
            continue;
        }
        match load(&path) {
            Ok(manifest) if manifest.is_empty() => {
                return Err(ManifestError::Empty { path });
            }
            Ok(manifest) => return Ok(manifest),
            Err(err) => {
                warn!("Skipping manifest candidate {}: {err}", path.display());
            }
        }
    }
    Err(ManifestError::NotFound)
}
