/// Size formatting for log lines: human-readable byte counts.
///
/// Sizes are `u64` bytes everywhere; floating point only appears here, at
/// the display boundary.

/// Format a byte count with two decimals and a binary unit (B, KB, MB, GB).
///
/// GB is the largest unit, so multi-terabyte files read as e.g. `2048.00 GB`.
pub fn format_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];

    let mut size = bytes as f64;
    let mut unit = 0;
    while size >= 1024.0 && unit < UNITS.len() - 1 {
        size /= 1024.0;
        unit += 1;
    }
    format!("{size:.2} {}", UNITS[unit])
}
