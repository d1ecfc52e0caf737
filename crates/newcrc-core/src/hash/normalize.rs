/// Digest canonicalisation so that recorded and computed values compare
/// independent of case, an optional `0x` prefix, and leading zeros.

/// Canonical form of a hex digest.
///
/// Lowercases, strips one `0x` prefix, strips leading `'0'`s, and maps the
/// empty result to `"0"`. Applying it twice is the same as applying it once.
pub fn normalize_digest(digest: &str) -> String {
    let lower = digest.to_ascii_lowercase();
    let body = lower.strip_prefix("0x").unwrap_or(&lower);
    let trimmed = body.trim_start_matches('0');
    if trimmed.is_empty() {
        "0".to_string()
    } else {
        trimmed.to_string()
    }
}

/// Compare two digests after normalisation.
pub fn digests_match(a: &str, b: &str) -> bool {
    normalize_digest(a) == normalize_digest(b)
}
