//! Loop rate measurement

use std::time::{Duration, Instant};

/// Counts signals over fixed windows and reports the last full window as Hz
#[derive(Debug, Clone)]
pub struct FrequencyCounter {
    window: Duration,
    window_start: Option<Instant>,
    count: u64,
    frequency: f64,
}

impl Default for FrequencyCounter {
    fn default() -> Self {
        Self::new(Duration::from_secs(1))
    }
}

impl FrequencyCounter {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            window_start: None,
            count: 0,
            frequency: 0.0,
        }
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// Record one event now
    pub fn signal(&mut self) {
        self.signal_at(Instant::now());
    }

    /// Record one event at `now`
    pub fn signal_at(&mut self, now: Instant) {
        let start = *self.window_start.get_or_insert(now);
        let elapsed = now.saturating_duration_since(start);
        if elapsed >= self.window {
            self.frequency = self.count as f64 / elapsed.as_secs_f64();
            self.count = 0;
            self.window_start = Some(now);
        }
        self.count += 1;
    }

    /// Rate over the last completed window (0 until one completes)
    pub fn frequency(&self) -> f64 {
        self.frequency
    }

    pub fn reset(&mut self) {
        self.window_start = None;
        self.count = 0;
        self.frequency = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_before_first_window() {
        let mut counter = FrequencyCounter::default();
        let t0 = Instant::now();
        for i in 0..100 {
            counter.signal_at(t0 + Duration::from_millis(i));
        }
        assert_eq!(counter.frequency(), 0.0);
    }

    #[test]
    fn test_counts_signals_per_window() {
        let mut counter = FrequencyCounter::default();
        let t0 = Instant::now();
        for i in 0..500 {
            counter.signal_at(t0 + Duration::from_millis(2 * i));
        }
        counter.signal_at(t0 + Duration::from_secs(1));
        assert_eq!(counter.frequency(), 500.0);
    }

    #[test]
    fn test_each_window_is_independent() {
        let mut counter = FrequencyCounter::new(Duration::from_millis(100));
        let t0 = Instant::now();
        for i in 0..10 {
            counter.signal_at(t0 + Duration::from_millis(10 * i));
        }
        counter.signal_at(t0 + Duration::from_millis(100));
        assert_eq!(counter.frequency(), 100.0);

        // Second window: 5 signals, opened at 100 ms and closed 250 ms later
        for i in 1..5 {
            counter.signal_at(t0 + Duration::from_millis(100 + 20 * i));
        }
        counter.signal_at(t0 + Duration::from_millis(350));
        assert_eq!(counter.frequency(), 20.0);
    }

    #[test]
    fn test_reset() {
        let mut counter = FrequencyCounter::new(Duration::from_millis(10));
        let t0 = Instant::now();
        counter.signal_at(t0);
        counter.signal_at(t0 + Duration::from_millis(10));
        assert!(counter.frequency() > 0.0);
        counter.reset();
        assert_eq!(counter.frequency(), 0.0);
    }
}
