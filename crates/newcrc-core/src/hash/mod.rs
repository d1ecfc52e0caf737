/// Streaming hash abstraction over every manifest algorithm.
///
/// A [`Hasher`] is a closed enum: one variant per algorithm, each with fixed
/// init / update / finalize behaviour. Data is fed in arbitrary chunks and the
/// rendered digest is identical to hashing the whole input in one call.
pub mod castagnoli;
pub mod normalize;

pub use castagnoli::{Crc32c, Crc32cBackend};
pub use normalize::{digests_match, normalize_digest};

use blake2::{Blake2b512, Blake2s256};
use sha2::{Digest, Sha256, Sha512};
use std::collections::TryReserveError;
use std::fmt;
use xxhash_rust::xxh3::Xxh3;

/// The algorithm a manifest was produced with.
///
/// Exactly one kind applies per manifest. `None` is never produced by the
/// loader; it only exists so an unresolved algorithm can be represented and
/// rejected by the verifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HashAlgorithmKind {
    Crc32,
    Crc32c,
    Xxh3,
    City128,
    Sha256,
    Sha512,
    Blake2b,
    Blake2s,
    None,
}

impl HashAlgorithmKind {
    /// Every supported kind, in manifest discovery priority order.
    pub const SUPPORTED: [HashAlgorithmKind; 8] = [
        Self::Crc32,
        Self::Crc32c,
        Self::Xxh3,
        Self::City128,
        Self::Sha256,
        Self::Sha512,
        Self::Blake2b,
        Self::Blake2s,
    ];

    /// Human-readable label for display.
    pub fn label(self) -> &'static str {
        match self {
            Self::Crc32 => "CRC32",
            Self::Crc32c => "CRC32C",
            Self::Xxh3 => "XXH3-64",
            Self::City128 => "CityHash128",
            Self::Sha256 => "SHA-256",
            Self::Sha512 => "SHA-512",
            Self::Blake2b => "BLAKE2b-512",
            Self::Blake2s => "BLAKE2s-256",
            Self::None => "none",
        }
    }

    /// Manifest file extension (without the dot) for this kind.
    pub fn extension(self) -> Option<&'static str> {
        match self {
            Self::Crc32 => Some("crc32"),
            Self::Crc32c => Some("crc32c"),
            Self::Xxh3 => Some("xxhash3"),
            Self::City128 => Some("city128"),
            Self::Sha256 => Some("sha256"),
            Self::Sha512 => Some("sha512"),
            Self::Blake2b => Some("blake2b"),
            Self::Blake2s => Some("blake2s"),
            Self::None => None,
        }
    }

    /// Resolve a manifest extension (with or without a leading dot).
    ///
    /// Matching is ASCII case-insensitive so `CRC.SHA256` is accepted.
    pub fn from_extension(ext: &str) -> Option<Self> {
        let ext = ext.strip_prefix('.').unwrap_or(ext);
        Self::SUPPORTED
            .into_iter()
            .find(|kind| kind.extension().is_some_and(|e| e.eq_ignore_ascii_case(ext)))
    }

    /// Width of the rendered hex digest.
    pub fn digest_hex_len(self) -> usize {
        match self {
            Self::Crc32 | Self::Crc32c => 8,
            Self::Xxh3 => 16,
            Self::City128 => 32,
            Self::Sha256 | Self::Blake2s => 64,
            Self::Sha512 | Self::Blake2b => 128,
            Self::None => 0,
        }
    }
}

impl fmt::Display for HashAlgorithmKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// In-progress digest state for one file.
pub enum Hasher {
    Crc32(crc32fast::Hasher),
    Crc32c(Crc32c),
    Xxh3(Box<Xxh3>),
    /// CityHash128 has no incremental form, so the whole input is buffered
    /// and hashed on finalize. Memory use grows with the file; this path does
    /// not scale to files larger than available RAM.
    City128(Vec<u8>),
    Sha256(Sha256),
    Sha512(Sha512),
    Blake2b(Blake2b512),
    Blake2s(Blake2s256),
}

impl Hasher {
    /// Fresh state for `kind`, or `None` for [`HashAlgorithmKind::None`].
    pub fn new(kind: HashAlgorithmKind) -> Option<Self> {
        let hasher = match kind {
            HashAlgorithmKind::Crc32 => Self::Crc32(crc32fast::Hasher::new()),
            HashAlgorithmKind::Crc32c => Self::Crc32c(Crc32c::new()),
            HashAlgorithmKind::Xxh3 => Self::Xxh3(Box::new(Xxh3::new())),
            HashAlgorithmKind::City128 => Self::City128(Vec::new()),
            HashAlgorithmKind::Sha256 => Self::Sha256(Sha256::new()),
            HashAlgorithmKind::Sha512 => Self::Sha512(Sha512::new()),
            HashAlgorithmKind::Blake2b => Self::Blake2b(Blake2b512::new()),
            HashAlgorithmKind::Blake2s => Self::Blake2s(Blake2s256::new()),
            HashAlgorithmKind::None => return None,
        };
        Some(hasher)
    }

    /// Make room for `expected_len` more bytes of input.
    ///
    /// Only the buffering CityHash state allocates. A file too large to hold
    /// in memory fails here instead of aborting the process part-way through
    /// `update`. Streaming states always succeed.
    pub fn reserve(&mut self, expected_len: u64) -> Result<(), TryReserveError> {
        match self {
            Self::City128(buf) => {
                buf.try_reserve(usize::try_from(expected_len).unwrap_or(usize::MAX))
            }
            _ => Ok(()),
        }
    }

    pub fn kind(&self) -> HashAlgorithmKind {
        match self {
            Self::Crc32(_) => HashAlgorithmKind::Crc32,
            Self::Crc32c(_) => HashAlgorithmKind::Crc32c,
            Self::Xxh3(_) => HashAlgorithmKind::Xxh3,
            Self::City128(_) => HashAlgorithmKind::City128,
            Self::Sha256(_) => HashAlgorithmKind::Sha256,
            Self::Sha512(_) => HashAlgorithmKind::Sha512,
            Self::Blake2b(_) => HashAlgorithmKind::Blake2b,
            Self::Blake2s(_) => HashAlgorithmKind::Blake2s,
        }
    }

    /// Feed the next chunk of input.
    pub fn update(&mut self, data: &[u8]) {
        match self {
            Self::Crc32(h) => h.update(data),
            Self::Crc32c(h) => h.update(data),
            Self::Xxh3(h) => h.update(data),
            Self::City128(buf) => buf.extend_from_slice(data),
            Self::Sha256(h) => Digest::update(h, data),
            Self::Sha512(h) => Digest::update(h, data),
            Self::Blake2b(h) => Digest::update(h, data),
            Self::Blake2s(h) => Digest::update(h, data),
        }
    }

    /// Consume the state and render the lowercase, zero-padded hex digest.
    pub fn finalize(self) -> String {
        match self {
            Self::Crc32(h) => format!("{:08x}", h.finalize()),
            Self::Crc32c(h) => format!("{:08x}", h.finalize()),
            Self::Xxh3(h) => format!("{:016x}", h.digest()),
            Self::City128(buf) => format!("{:032x}", cityhash::city_hash_128(&buf)),
            Self::Sha256(h) => hex::encode(h.finalize()),
            Self::Sha512(h) => hex::encode(h.finalize()),
            Self::Blake2b(h) => hex::encode(h.finalize()),
            Self::Blake2s(h) => hex::encode(h.finalize()),
        }
    }
}

/// Hash a complete in-memory buffer in one call.
pub fn hash_bytes(kind: HashAlgorithmKind, data: &[u8]) -> Option<String> {
    let mut hasher = Hasher::new(kind)?;
    hasher.update(data);
    Some(hasher.finalize())
}
