//! Rate-tracked progress model: throttled samples, speeds, ETA, terminal state.
//!
//! Amounts are kilobytes throughout. The model is pure (no I/O); the bar in
//! [`super::bar`] owns rendering and printing.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

/// Minimum spacing between accepted updates. The downloader emits progress
/// lines far faster than a terminal should repaint.
pub const DEFAULT_UPDATE_INTERVAL: Duration = Duration::from_millis(200);

/// Rolling throughput window size, in samples.
const ROLLING_WINDOW: usize = 5;

/// Progress state for one download attempt.
///
/// `update` throttles to the configured interval except when the candidate
/// equals the total (force-flush on completion). Once `complete` or `fail`
/// has been called, all further updates are rejected.
#[derive(Debug)]
pub struct ProgressTracker {
    total: f64,
    current: f64,
    previous: f64,
    initial_progress: f64,
    initial_duration: Duration,
    first_update_at: Option<Instant>,
    current_update_at: Option<Instant>,
    previous_update_at: Option<Instant>,
    samples: VecDeque<(Instant, f64)>,
    min_interval: Duration,
    completed: bool,
    failed: bool,
    dirty: bool,
}

impl Default for ProgressTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressTracker {
    pub fn new() -> Self {
        Self::with_min_interval(DEFAULT_UPDATE_INTERVAL)
    }

    pub fn with_min_interval(min_interval: Duration) -> Self {
        Self {
            total: 0.0,
            current: 0.0,
            previous: 0.0,
            initial_progress: 0.0,
            initial_duration: Duration::ZERO,
            first_update_at: None,
            current_update_at: None,
            previous_update_at: None,
            samples: VecDeque::with_capacity(ROLLING_WINDOW + 1),
            min_interval,
            completed: false,
            failed: false,
            dirty: false,
        }
    }

    pub fn total(&self) -> f64 {
        self.total
    }

    pub fn current(&self) -> f64 {
        self.current
    }

    pub fn previous(&self) -> f64 {
        self.previous
    }

    pub fn initial_progress(&self) -> f64 {
        self.initial_progress
    }

    pub fn is_completed(&self) -> bool {
        self.completed
    }

    pub fn is_failed(&self) -> bool {
        self.failed
    }

    pub fn is_terminal(&self) -> bool {
        self.completed || self.failed
    }

    /// Replace the target amount. Totals are replaced wholesale (a new part
    /// redefines the target) but never drop below what is already done.
    pub fn set_total(&mut self, total: f64) {
        if self.is_terminal() {
            return;
        }
        self.total = total.max(self.current);
        self.dirty = true;
    }

    /// Record a new completed amount. Returns true when state actually moved:
    /// the candidate is clamped into `[0, total]` and accepted only if the
    /// minimum interval elapsed since the last accepted update, or the
    /// candidate equals the total.
    pub fn update(&mut self, amount: f64) -> bool {
        self.update_at(Instant::now(), amount)
    }

    fn update_at(&mut self, now: Instant, amount: f64) -> bool {
        if self.is_terminal() {
            return false;
        }
        let candidate = amount.max(0.0).min(self.total);
        if let Some(last) = self.current_update_at {
            if now.saturating_duration_since(last) < self.min_interval && candidate != self.total {
                return false;
            }
        }
        self.previous = self.current;
        self.previous_update_at = self.current_update_at;
        self.current = candidate;
        self.current_update_at = Some(now);
        if self.first_update_at.is_none() {
            self.first_update_at = Some(now);
        }
        self.samples.push_back((now, candidate));
        if self.samples.len() > ROLLING_WINDOW {
            self.samples.pop_front();
        }
        self.dirty = true;
        true
    }

    /// Fraction complete in [0, 1]. Malformed numbers clamp instead of
    /// panicking; an unset total reads as done.
    pub fn ratio(&self) -> f64 {
        if self.total <= 0.0 || self.current >= self.total {
            return 1.0;
        }
        if self.current < 0.0 {
            return 0.0;
        }
        self.current / self.total
    }

    /// Throughput over the most recent update delta (KB/s), 0 when unknown.
    pub fn last_speed(&self) -> f64 {
        let (prev_at, cur_at) = match (self.previous_update_at, self.current_update_at) {
            (Some(p), Some(c)) => (p, c),
            _ => return 0.0,
        };
        let secs = cur_at.saturating_duration_since(prev_at).as_secs_f64();
        if secs <= 0.0 {
            return 0.0;
        }
        (self.current - self.previous) / secs
    }

    /// Throughput over the whole run (KB/s), 0 when unknown.
    pub fn average_speed(&self) -> f64 {
        let (first, cur) = match (self.first_update_at, self.current_update_at) {
            (Some(f), Some(c)) => (f, c),
            _ => return 0.0,
        };
        let secs = cur.saturating_duration_since(first).as_secs_f64();
        if secs <= 0.0 {
            return 0.0;
        }
        self.current / secs
    }

    /// Throughput over the rolling sample window (KB/s), 0 when unknown.
    pub fn rolling_average_speed(&self) -> f64 {
        if self.samples.len() < 2 {
            return 0.0;
        }
        let (oldest_at, oldest) = match self.samples.front() {
            Some(&s) => s,
            None => return 0.0,
        };
        let (newest_at, newest) = match self.samples.back() {
            Some(&s) => s,
            None => return 0.0,
        };
        let secs = newest_at.saturating_duration_since(oldest_at).as_secs_f64();
        if secs <= 0.0 {
            return 0.0;
        }
        (newest - oldest) / secs
    }

    /// Estimated time to reach the total, extrapolated from progress gained
    /// since this run started. [`Duration::MAX`] means unknown.
    pub fn time_remaining(&self) -> Duration {
        let (first, cur) = match (self.first_update_at, self.current_update_at) {
            (Some(f), Some(c)) => (f, c),
            _ => return Duration::MAX,
        };
        let elapsed = cur.saturating_duration_since(first).as_secs_f64();
        if elapsed <= 0.0 {
            return Duration::MAX;
        }
        let gained = self.current - self.initial_progress;
        if gained <= 0.0 {
            return Duration::MAX;
        }
        let rate = gained / elapsed;
        duration_from_secs((self.total - self.current) / rate)
    }

    /// Wall time covered by this tracker, including any previously elapsed
    /// duration folded in via [`Self::define_initial_duration`].
    pub fn total_duration(&self) -> Duration {
        let span = match (self.first_update_at, self.current_update_at) {
            (Some(f), Some(c)) => c.saturating_duration_since(f),
            _ => Duration::ZERO,
        };
        self.initial_duration.saturating_add(span)
    }

    /// Record the amount already present before this run (e.g. a resumed
    /// partial file). Set-once: returns false if already set.
    pub fn define_initial_progress(&mut self, amount: f64) -> bool {
        if self.initial_progress != 0.0 {
            return false;
        }
        self.initial_progress = amount;
        true
    }

    /// Fold previously elapsed wall time into duration reporting. Set-once:
    /// returns false if already set.
    pub fn define_initial_duration(&mut self, duration: Duration) -> bool {
        if !self.initial_duration.is_zero() {
            return false;
        }
        self.initial_duration = duration;
        true
    }

    /// Mark the download complete, forcing `current` to the total. No-op when
    /// already terminal.
    pub fn complete(&mut self) {
        if self.is_terminal() {
            return;
        }
        self.current = self.total;
        self.completed = true;
        self.dirty = true;
    }

    /// Mark the download failed. No-op when already terminal.
    pub fn fail(&mut self) {
        if self.is_terminal() {
            return;
        }
        self.failed = true;
        self.dirty = true;
    }

    /// Consume the dirty flag set by mutations; rendering calls this to skip
    /// rebuilding an unchanged line.
    pub fn take_dirty(&mut self) -> bool {
        let dirty = self.dirty;
        self.dirty = false;
        dirty
    }
}

fn duration_from_secs(secs: f64) -> Duration {
    if !secs.is_finite() || secs >= u64::MAX as f64 {
        return Duration::MAX;
    }
    if secs <= 0.0 {
        return Duration::ZERO;
    }
    Duration::from_secs_f64(secs)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tracker(total: f64) -> ProgressTracker {
        let mut t = ProgressTracker::with_min_interval(Duration::ZERO);
        t.set_total(total);
        t
    }

    #[test]
    fn throttle_rejects_rapid_updates() {
        let mut t = ProgressTracker::new();
        t.set_total(100.0);
        let t0 = Instant::now();
        assert!(t.update_at(t0, 10.0));
        assert!(!t.update_at(t0 + Duration::from_millis(50), 20.0));
        assert_eq!(t.current(), 10.0);
        assert!(t.update_at(t0 + Duration::from_millis(250), 20.0));
        assert_eq!(t.current(), 20.0);
        assert_eq!(t.previous(), 10.0);
    }

    #[test]
    fn completion_amount_bypasses_throttle() {
        let mut t = ProgressTracker::new();
        t.set_total(100.0);
        let t0 = Instant::now();
        assert!(t.update_at(t0, 10.0));
        assert!(t.update_at(t0 + Duration::from_millis(5), 100.0));
        assert_eq!(t.current(), 100.0);
    }

    #[test]
    fn clamps_out_of_range_amounts() {
        let mut t = tracker(100.0);
        let t0 = Instant::now();
        assert!(t.update_at(t0, -5.0));
        assert_eq!(t.current(), 0.0);
        assert!(t.update_at(t0 + Duration::from_millis(1), 150.0));
        assert_eq!(t.current(), 100.0);
        assert_eq!(t.ratio(), 1.0);
    }

    #[test]
    fn ratio_stays_in_unit_interval() {
        let mut t = tracker(100.0);
        assert_eq!(t.ratio(), 0.0);
        let t0 = Instant::now();
        t.update_at(t0, 40.0);
        assert!((t.ratio() - 0.4).abs() < 1e-9);
        let empty = ProgressTracker::new();
        assert_eq!(empty.ratio(), 1.0);
    }

    #[test]
    fn rolling_window_keeps_five_samples() {
        let mut t = tracker(1000.0);
        let t0 = Instant::now();
        let amounts = [10.0, 30.0, 60.0, 100.0, 150.0];
        for (i, &a) in amounts.iter().enumerate() {
            assert!(t.update_at(t0 + Duration::from_millis(300 * i as u64), a));
        }
        // (150 - 10) KB over 1.2s
        let expected = (150.0 - 10.0) / 1.2;
        assert!((t.rolling_average_speed() - expected).abs() < 1e-6);

        // Sixth sample evicts the oldest; window is now samples 1..=5.
        assert!(t.update_at(t0 + Duration::from_millis(1500), 210.0));
        let expected = (210.0 - 30.0) / 1.2;
        assert!((t.rolling_average_speed() - expected).abs() < 1e-6);
    }

    #[test]
    fn terminal_states_are_idempotent_and_block_updates() {
        let mut t = tracker(100.0);
        let t0 = Instant::now();
        t.update_at(t0, 50.0);
        t.complete();
        assert!(t.is_completed());
        assert_eq!(t.current(), 100.0);
        assert!(!t.update_at(t0 + Duration::from_secs(1), 70.0));
        assert_eq!(t.current(), 100.0);
        t.fail();
        assert!(!t.is_failed(), "completed download cannot become failed");

        let mut t = tracker(100.0);
        t.fail();
        assert!(t.is_failed());
        t.complete();
        assert!(!t.is_completed(), "failed download cannot become completed");
        assert!(!t.update(10.0));
    }

    #[test]
    fn speeds_are_zero_on_degenerate_denominators() {
        let t = ProgressTracker::new();
        assert_eq!(t.last_speed(), 0.0);
        assert_eq!(t.average_speed(), 0.0);
        assert_eq!(t.rolling_average_speed(), 0.0);

        let mut t = tracker(100.0);
        t.update_at(Instant::now(), 10.0);
        // A single sample has no previous timestamp and no window span.
        assert_eq!(t.last_speed(), 0.0);
        assert_eq!(t.average_speed(), 0.0);
        assert_eq!(t.rolling_average_speed(), 0.0);
    }

    #[test]
    fn last_and_average_speed_from_deltas() {
        let mut t = tracker(1000.0);
        let t0 = Instant::now();
        t.update_at(t0, 0.0);
        t.update_at(t0 + Duration::from_secs(2), 100.0);
        assert!((t.last_speed() - 50.0).abs() < 1e-9);
        assert!((t.average_speed() - 50.0).abs() < 1e-9);
        t.update_at(t0 + Duration::from_secs(4), 150.0);
        assert!((t.last_speed() - 25.0).abs() < 1e-9);
        assert!((t.average_speed() - 37.5).abs() < 1e-9);
    }

    #[test]
    fn time_remaining_extrapolates_from_run_progress() {
        let mut t = tracker(200.0);
        let t0 = Instant::now();
        t.update_at(t0, 0.0);
        t.update_at(t0 + Duration::from_secs(2), 100.0);
        assert_eq!(t.time_remaining(), Duration::from_secs(2));
    }

    #[test]
    fn time_remaining_accounts_for_initial_progress() {
        let mut t = tracker(200.0);
        assert!(t.define_initial_progress(50.0));
        let t0 = Instant::now();
        t.update_at(t0, 60.0);
        t.update_at(t0 + Duration::from_secs(2), 100.0);
        // Gained 50 KB in 2s; 100 KB remain.
        assert_eq!(t.time_remaining(), Duration::from_secs(4));
    }

    #[test]
    fn time_remaining_unknown_without_data() {
        let t = ProgressTracker::new();
        assert_eq!(t.time_remaining(), Duration::MAX);

        let mut t = tracker(100.0);
        t.update_at(Instant::now(), 0.0);
        assert_eq!(t.time_remaining(), Duration::MAX);
    }

    #[test]
    fn initial_values_are_set_once() {
        let mut t = ProgressTracker::new();
        assert!(t.define_initial_progress(10.0));
        assert!(!t.define_initial_progress(20.0));
        assert_eq!(t.initial_progress(), 10.0);

        assert!(t.define_initial_duration(Duration::from_secs(5)));
        assert!(!t.define_initial_duration(Duration::from_secs(9)));
        assert_eq!(t.total_duration(), Duration::from_secs(5));
    }

    #[test]
    fn set_total_never_shrinks_below_current() {
        let mut t = tracker(100.0);
        t.update_at(Instant::now(), 80.0);
        t.set_total(50.0);
        assert_eq!(t.total(), 80.0);
        assert_eq!(t.ratio(), 1.0);
    }

    #[test]
    fn dirty_flag_consumed_once() {
        let mut t = tracker(100.0);
        assert!(t.take_dirty(), "set_total marks dirty");
        assert!(!t.take_dirty());
        t.update_at(Instant::now(), 10.0);
        assert!(t.take_dirty());
        assert!(!t.take_dirty());
    }
}
