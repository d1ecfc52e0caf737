/// CRC-32C (Castagnoli) with a hardware path and a table-driven software path.
///
/// The hardware path delegates to the `crc32c` crate, which uses SSE4.2 on
/// x86_64 and the ARMv8 CRC extension on aarch64. The software path is a
/// byte-at-a-time table over the reflected polynomial `0x82F63B78`. Both
/// produce identical values; which one runs is purely a speed decision.

/// Reflected Castagnoli polynomial.
const POLY: u32 = 0x82F6_3B78;

/// Byte-at-a-time lookup table, built at compile time.
const TABLE: [u32; 256] = {
    let mut table = [0u32; 256];
    let mut i = 0u32;
    while i < 256 {
        let mut c = i;
        let mut j = 0;
        while j < 8 {
            c = if c & 1 != 0 { POLY ^ (c >> 1) } else { c >> 1 };
            j += 1;
        }
        table[i as usize] = c;
        i += 1;
    }
    table
};

/// Which CRC-32C implementation a [`Crc32c`] runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Crc32cBackend {
    Hardware,
    Software,
}

impl Crc32cBackend {
    /// Pick the hardware backend when the CPU has CRC instructions.
    pub fn detect() -> Self {
        if hardware_crc_available() {
            Self::Hardware
        } else {
            Self::Software
        }
    }

    /// Extend a finalized CRC value with `data`.
    ///
    /// `crc` is the value returned for all previous input (0 for none), so
    /// appends compose: `append(append(0, a), b) == append(0, a ++ b)`.
    pub fn append(self, crc: u32, data: &[u8]) -> u32 {
        match self {
            Self::Hardware => crc32c::crc32c_append(crc, data),
            Self::Software => software_append(crc, data),
        }
    }
}

#[cfg(target_arch = "x86_64")]
fn hardware_crc_available() -> bool {
    std::arch::is_x86_feature_detected!("sse4.2")
}

#[cfg(target_arch = "aarch64")]
fn hardware_crc_available() -> bool {
    std::arch::is_aarch64_feature_detected!("crc")
}

#[cfg(not(any(target_arch = "x86_64", target_arch = "aarch64")))]
fn hardware_crc_available() -> bool {
    false
}

fn software_append(crc: u32, data: &[u8]) -> u32 {
    let mut c = !crc;
    for &b in data {
        c = (c >> 8) ^ TABLE[((c as u8) ^ b) as usize];
    }
    !c
}

/// Streaming CRC-32C state.
#[derive(Debug, Clone, Copy)]
pub struct Crc32c {
    crc: u32,
    backend: Crc32cBackend,
}

impl Crc32c {
    /// New state on the fastest backend available on this CPU.
    pub fn new() -> Self {
        Self::with_backend(Crc32cBackend::detect())
    }

    pub fn with_backend(backend: Crc32cBackend) -> Self {
        Self { crc: 0, backend }
    }

    pub fn backend(&self) -> Crc32cBackend {
        self.backend
    }

    pub fn update(&mut self, data: &[u8]) {
        self.crc = self.backend.append(self.crc, data);
    }

    pub fn finalize(self) -> u32 {
        self.crc
    }
}

impl Default for Crc32c {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(backend: Crc32cBackend, data: &[u8], chunk: usize) -> u32 {
        let mut state = Crc32c::with_backend(backend);
        for piece in data.chunks(chunk.max(1)) {
            state.update(piece);
        }
        state.finalize()
    }

    #[test]
    fn test_check_value() {
        assert_eq!(run(Crc32cBackend::Software, b"123456789", 9), 0xE306_9283);
        assert_eq!(run(Crc32cBackend::Hardware, b"123456789", 9), 0xE306_9283);
    }

    #[test]
    fn test_empty_is_zero() {
        assert_eq!(Crc32c::with_backend(Crc32cBackend::Software).finalize(), 0);
        assert_eq!(Crc32c::with_backend(Crc32cBackend::Hardware).finalize(), 0);
    }

    /// Both backends must agree bit-for-bit on every length and split.
    #[test]
    fn test_backends_identical() {
        let data: Vec<u8> = (0..1_031u32).map(|i| (i * 7 + 3) as u8).collect();
        for len in [0, 1, 7, 8, 15, 16, 63, 64, 65, 1_000, 1_031] {
            let slice = &data[..len];
            let sw = run(Crc32cBackend::Software, slice, len);
            let hw = run(Crc32cBackend::Hardware, slice, len);
            assert_eq!(sw, hw, "backends disagree at len {len}");
            for chunk in [1, 3, 13, 64] {
                assert_eq!(run(Crc32cBackend::Software, slice, chunk), sw);
                assert_eq!(run(Crc32cBackend::Hardware, slice, chunk), hw);
            }
        }
    }

    #[test]
    fn test_table_first_entries() {
        assert_eq!(TABLE[0], 0);
        assert_eq!(TABLE[1], 0xF26B_8303);
        assert_eq!(TABLE[128], POLY);
    }
}
