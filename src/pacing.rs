use std::collections::VecDeque;
use std::thread;
use std::time::{Duration, Instant};

/// Throttles the display loop to a target frame interval. Running behind
/// schedule just yields faster back-to-back frames; there is no skipping and
/// no catch-up.
pub struct Pacer {
    interval: Duration,
}

impl Pacer {
    pub fn new(target_fps: u32) -> Self {
        Self {
            interval: Duration::from_secs_f64(1.0 / f64::from(target_fps.max(1))),
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Sleep out whatever remains of the frame interval.
    pub fn pace(&self, frame_start: Instant) {
        let elapsed = frame_start.elapsed();
        if elapsed < self.interval {
            thread::sleep(self.interval - elapsed);
        }
    }
}

/// Rolling window of recent frame durations. Reporting only — the estimate
/// never feeds back into pacing decisions.
pub struct FpsWindow {
    samples: VecDeque<Duration>,
    capacity: usize,
}

impl FpsWindow {
    pub fn new(capacity: usize) -> Self {
        Self {
            samples: VecDeque::with_capacity(capacity),
            capacity: capacity.max(1),
        }
    }

    pub fn push(&mut self, duration: Duration) {
        if self.samples.len() == self.capacity {
            self.samples.pop_front();
        }
        self.samples.push_back(duration);
    }

    pub fn fps(&self) -> f64 {
        if self.samples.is_empty() {
            return 0.0;
        }
        let total: Duration = self.samples.iter().sum();
        let mean = total.as_secs_f64() / self.samples.len() as f64;
        if mean > 0.0 {
            1.0 / mean
        } else {
            0.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn window_reports_the_mean_rate() {
        let mut window = FpsWindow::new(30);
        for _ in 0..10 {
            window.push(Duration::from_millis(10));
        }
        assert!((window.fps() - 100.0).abs() < 0.5);
    }

    #[test]
    fn window_evicts_the_oldest_sample() {
        let mut window = FpsWindow::new(3);
        window.push(Duration::from_millis(1000));
        for _ in 0..3 {
            window.push(Duration::from_millis(20));
        }
        // The 1s outlier is gone; only the 20ms samples remain.
        assert!((window.fps() - 50.0).abs() < 0.5);
    }

    #[test]
    fn empty_window_reports_zero() {
        assert_eq!(FpsWindow::new(30).fps(), 0.0);
    }

    #[test]
    fn pacer_sleeps_up_to_the_interval() {
        let pacer = Pacer::new(50); // 20ms
        let start = Instant::now();
        pacer.pace(start);
        assert!(start.elapsed() >= Duration::from_millis(19));
    }

    #[test]
    fn pacer_does_not_sleep_when_already_behind() {
        let pacer = Pacer::new(50);
        let long_ago = Instant::now() - Duration::from_millis(100);
        let before = Instant::now();
        pacer.pace(long_ago);
        assert!(before.elapsed() < Duration::from_millis(5));
    }
}
