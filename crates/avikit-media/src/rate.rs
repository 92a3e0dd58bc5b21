//! Sliding-window peak data rate estimation.

use std::collections::VecDeque;

/// Tracks the byte rate over the most recent second of frames.
///
/// The window holds `ceil(fps)` frame sizes; [`rate`](Self::rate)
/// extrapolates them to bytes per second. The peak is only tracked after
/// `warmup` samples so the first few frames cannot produce a spurious maximum.
#[derive(Debug, Clone)]
pub struct RateMonitor {
    fps: f64,
    capacity: usize,
    warmup: usize,
    window: VecDeque<u64>,
    window_sum: u64,
    samples: usize,
    peak: f64,
}

impl RateMonitor {
    /// Create a monitor for the given frame rate and warm-up sample count.
    pub fn new(fps: f64, warmup: usize) -> Self {
        let capacity = if fps.is_finite() && fps > 0.0 {
            (fps.ceil() as usize).max(1)
        } else {
            1
        };
        Self {
            fps,
            capacity,
            warmup,
            window: VecDeque::new(),
            window_sum: 0,
            samples: 0,
            peak: 0.0,
        }
    }

    /// Record the on-disk size of one frame (header + payload).
    pub fn sample(&mut self, size: u64) {
        self.window.push_back(size);
        self.window_sum += size;
        if self.window.len() > self.capacity {
            if let Some(old) = self.window.pop_front() {
                self.window_sum -= old;
            }
        }
        self.samples += 1;

        if self.is_warm() {
            self.peak = self.peak.max(self.rate());
        }
    }

    /// Current extrapolated rate in bytes per second.
    pub fn rate(&self) -> f64 {
        if self.window.is_empty() {
            return 0.0;
        }
        self.window_sum as f64 * self.fps / self.window.len() as f64
    }

    /// Best estimate of the peak rate.
    ///
    /// While warming up this is the current rate; afterwards the tracked peak.
    pub fn max(&self) -> f64 {
        if self.is_warm() {
            self.peak
        } else {
            self.rate()
        }
    }

    /// Number of frames sampled so far.
    pub fn samples(&self) -> usize {
        self.samples
    }

    fn is_warm(&self) -> bool {
        self.samples > self.warmup
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_window_capacity_rounds_up() {
        let mut monitor = RateMonitor::new(2.5, 0);
        for size in [10, 20, 30, 40] {
            monitor.sample(size);
        }
        // window keeps the last 3: 20 + 30 + 40
        assert_eq!(monitor.rate(), 90.0 * 2.5 / 3.0);
    }

    #[test]
    fn test_huge_rate_does_not_preallocate() {
        let mut monitor = RateMonitor::new(4.0e9, 8);
        monitor.sample(100);
        assert_eq!(monitor.samples(), 1);
        assert_eq!(monitor.rate(), 100.0 * 4.0e9);
    }

    #[test]
    fn test_empty_monitor() {
        let monitor = RateMonitor::new(25.0, 4);
        assert_eq!(monitor.rate(), 0.0);
        assert_eq!(monitor.max(), 0.0);
    }

    #[test]
    fn test_warmup_reports_current_rate() {
        let mut monitor = RateMonitor::new(10.0, 5);
        monitor.sample(1000);
        monitor.sample(10);
        monitor.sample(10);
        // the large first frame never becomes a retained peak
        assert_eq!(monitor.max(), monitor.rate());
        assert_eq!(monitor.rate(), 1020.0 * 10.0 / 3.0);
    }

    #[test]
    fn test_peak_retained_after_warmup() {
        let mut monitor = RateMonitor::new(4.0, 4);
        for _ in 0..5 {
            monitor.sample(100);
        }
        assert_eq!(monitor.max(), 400.0);

        monitor.sample(900);
        let peak = monitor.max();
        assert_eq!(peak, (100.0 * 3.0 + 900.0) * 4.0 / 4.0);

        for _ in 0..8 {
            monitor.sample(50);
        }
        assert_eq!(monitor.rate(), 200.0);
        assert_eq!(monitor.max(), peak);
    }
}
