/// Trailing throughput estimate over the last few chunk reads.
use std::collections::VecDeque;
use std::time::Instant;

/// Number of `(timestamp, bytes)` samples kept.
pub const SPEED_WINDOW_SAMPLES: usize = 5;

const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

/// Fixed-size window of recent reads for one file.
///
/// The oldest sample only marks the start of the window; its bytes were read
/// before that instant, so they are excluded from the rate.
#[derive(Debug, Clone)]
pub struct SpeedWindow {
    samples: VecDeque<(Instant, u64)>,
}

impl SpeedWindow {
    pub fn new() -> Self {
        Self {
            samples: VecDeque::with_capacity(SPEED_WINDOW_SAMPLES + 1),
        }
    }

    /// Record `bytes` read just now.
    pub fn add_sample(&mut self, bytes: u64) {
        self.add_sample_at(Instant::now(), bytes);
    }

    pub fn add_sample_at(&mut self, at: Instant, bytes: u64) {
        self.samples.push_back((at, bytes));
        if self.samples.len() > SPEED_WINDOW_SAMPLES {
            self.samples.pop_front();
        }
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Throughput in MB/s, or 0 until two samples span a non-zero interval.
    pub fn speed_mbps(&self) -> f64 {
        let (Some(&(first, _)), Some(&(last, _))) = (self.samples.front(), self.samples.back())
        else {
            return 0.0;
        };
        if self.samples.len() < 2 {
            return 0.0;
        }
        let elapsed = last.saturating_duration_since(first).as_secs_f64();
        if elapsed <= 0.0 {
            return 0.0;
        }
        let bytes: u64 = self.samples.iter().skip(1).map(|&(_, b)| b).sum();
        bytes as f64 / BYTES_PER_MB / elapsed
    }
}

impl Default for SpeedWindow {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    const MB: u64 = 1024 * 1024;

    #[test]
    fn test_needs_two_samples() {
        let mut window = SpeedWindow::new();
        assert_eq!(window.speed_mbps(), 0.0);
        window.add_sample(MB);
        assert_eq!(window.speed_mbps(), 0.0);
    }

    #[test]
    fn test_rate_over_window() {
        let mut window = SpeedWindow::new();
        let t0 = Instant::now();
        window.add_sample_at(t0, MB);
        window.add_sample_at(t0 + Duration::from_millis(500), MB);
        window.add_sample_at(t0 + Duration::from_secs(1), MB);
        // Two megabytes landed during the one-second window.
        assert!((window.speed_mbps() - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_zero_elapsed_is_zero() {
        let mut window = SpeedWindow::new();
        let t0 = Instant::now();
        window.add_sample_at(t0, MB);
        window.add_sample_at(t0, MB);
        assert_eq!(window.speed_mbps(), 0.0);
    }

    #[test]
    fn test_window_is_bounded() {
        let mut window = SpeedWindow::new();
        let t0 = Instant::now();
        for i in 0..20u64 {
            window.add_sample_at(t0 + Duration::from_secs(i), MB);
        }
        assert_eq!(window.len(), SPEED_WINDOW_SAMPLES);
        // Four samples after the first, spread over four seconds.
        assert!((window.speed_mbps() - 1.0).abs() < 1e-9);
    }
}
