//! Tick pacing and per-tick timing instrumentation.
//!
//! `TickGate` coalesces callbacks that arrive faster than the target
//! interval; `TickTiming` keeps rolling statistics of how long each taken
//! tick spent in the core.

use tracing::trace;

/// Fraction of the interval a tick may arrive early and still count as on
/// time.  Absorbs timer wake-up jitter without letting a 2x source through.
pub const TICK_JITTER_FRACTION: f64 = 0.25;

// ── Gate ───────────────────────────────────────────────────

/// Drops ticks that arrive before the target interval has elapsed.
#[derive(Debug, Clone)]
pub struct TickGate {
    interval_ms: f64,
    /// Last accepted tick, aligned down to the interval grid.
    last_ms: Option<f64>,
    pub taken: u64,
    pub skipped: u64,
}

impl TickGate {
    pub fn new(interval_ms: f64) -> Self {
        Self {
            interval_ms,
            last_ms: None,
            taken: 0,
            skipped: 0,
        }
    }

    /// Decide whether a tick at `now_ms` runs.
    ///
    /// Returns the time since the previous accepted tick, or `None` if the
    /// tick is coalesced.  The first tick reports one interval.
    pub fn try_tick(&mut self, now_ms: f64) -> Option<f64> {
        let Some(last) = self.last_ms else {
            self.last_ms = Some(now_ms);
            self.taken += 1;
            return Some(self.interval_ms);
        };

        let elapsed = now_ms - last;
        let slack = self.interval_ms * TICK_JITTER_FRACTION;
        if elapsed + slack < self.interval_ms {
            self.skipped += 1;
            trace!("tick coalesced ({:.1}ms < {:.1}ms)", elapsed, self.interval_ms);
            return None;
        }

        // Advance along the grid so early and late wake-ups don't drift it.
        let periods = ((elapsed + slack) / self.interval_ms).floor().max(1.0);
        self.last_ms = Some(last + periods * self.interval_ms);
        self.taken += 1;
        Some(elapsed)
    }

    pub fn interval_ms(&self) -> f64 {
        self.interval_ms
    }
}

// ── Timing ─────────────────────────────────────────────────

/// Rolling per-tick processing time statistics.
#[derive(Debug)]
pub struct TickTiming {
    samples: Vec<f64>,
    window_size: usize,
    pub total_ticks: u64,
    /// Ticks whose processing time exceeded the budget.
    pub over_budget: u64,
    pub budget_ms: f64,
}

impl Default for TickTiming {
    fn default() -> Self {
        Self::new(300, 1000.0 / crate::config::TARGET_TICK_HZ)
    }
}

impl TickTiming {
    pub fn new(window_size: usize, budget_ms: f64) -> Self {
        Self {
            samples: Vec::with_capacity(window_size),
            window_size: window_size.max(1),
            total_ticks: 0,
            over_budget: 0,
            budget_ms,
        }
    }

    /// Record how long one tick took.
    pub fn record(&mut self, elapsed_ms: f64) {
        self.samples.push(elapsed_ms);
        if self.samples.len() > self.window_size {
            self.samples.remove(0);
        }
        self.total_ticks += 1;
        if elapsed_ms > self.budget_ms {
            self.over_budget += 1;
        }
    }

    fn percentile(sorted: &[f64], p: f64) -> f64 {
        if sorted.is_empty() {
            return 0.0;
        }
        let idx = ((sorted.len() as f64 - 1.0) * p / 100.0).round() as usize;
        sorted[idx.min(sorted.len() - 1)]
    }

    pub fn stats(&self) -> TickStats {
        let mut sorted = self.samples.clone();
        sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
        TickStats {
            p50: Self::percentile(&sorted, 50.0),
            p95: Self::percentile(&sorted, 95.0),
            p99: Self::percentile(&sorted, 99.0),
            max: sorted.last().copied().unwrap_or(0.0),
            total_ticks: self.total_ticks,
            over_budget: self.over_budget,
        }
    }

    pub fn stats_sexp(&self) -> String {
        let s = self.stats();
        format!(
            "(:p50 {:.2} :p95 {:.2} :p99 {:.2} :max {:.2} :budget {:.1} :ticks {} :over-budget {})",
            s.p50, s.p95, s.p99, s.max, self.budget_ms, s.total_ticks, s.over_budget,
        )
    }
}

/// Computed tick statistics, in milliseconds.
#[derive(Debug, Clone)]
pub struct TickStats {
    pub p50: f64,
    pub p95: f64,
    pub p99: f64,
    pub max: f64,
    pub total_ticks: u64,
    pub over_budget: u64,
}

// ── Tests ──────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_tick_taken() {
        let mut gate = TickGate::new(33.3);
        assert_eq!(gate.try_tick(1000.0), Some(33.3));
        assert_eq!(gate.taken, 1);
    }

    #[test]
    fn test_fast_ticks_coalesced() {
        let mut gate = TickGate::new(33.3);
        gate.try_tick(0.0);
        // A 60 Hz source only gets every other tick through.
        let taken = (1..=60)
            .filter(|i| gate.try_tick(*i as f64 * 16.67).is_some())
            .count();
        assert!((29..=31).contains(&taken), "taken {}", taken);
        assert_eq!(gate.skipped + gate.taken, 61);
    }

    #[test]
    fn test_dt_reports_elapsed() {
        let mut gate = TickGate::new(33.0);
        gate.try_tick(0.0);
        assert_eq!(gate.try_tick(10.0), None);
        let dt = gate.try_tick(50.0).unwrap();
        assert!((dt - 50.0).abs() < 1e-9);
    }

    #[test]
    fn test_jittered_on_time_ticks_taken() {
        let mut gate = TickGate::new(1000.0 / 30.0);
        gate.try_tick(0.0);
        for now in [33.0, 66.5, 99.6, 132.9, 167.1, 199.8] {
            assert!(gate.try_tick(now).is_some(), "tick at {} dropped", now);
        }
        assert_eq!(gate.skipped, 0);
        assert_eq!(gate.taken, 7);
    }

    #[test]
    fn test_early_wakeup_after_late_one() {
        // First wake-up lags, the next one doesn't: still on time.
        let mut gate = TickGate::new(30.0);
        gate.try_tick(5.0);
        assert!(gate.try_tick(30.5).is_some());
        assert!(gate.try_tick(60.2).is_some());
        assert_eq!(gate.skipped, 0);
    }

    #[test]
    fn test_late_tick_keeps_grid() {
        let mut gate = TickGate::new(30.0);
        gate.try_tick(0.0);
        gate.try_tick(35.0); // grid anchored at 30
        assert!(gate.try_tick(61.0).is_some());
    }

    #[test]
    fn test_timing_percentiles() {
        let mut t = TickTiming::new(100, 10.1);
        for i in 1..=100 {
            t.record(i as f64 * 0.2);
        }
        let s = t.stats();
        assert!((s.p50 - 10.0).abs() < 0.3);
        assert!(s.p99 > 19.0);
        assert_eq!(s.total_ticks, 100);
        assert_eq!(t.over_budget, 50);
    }

    #[test]
    fn test_timing_window_bounded() {
        let mut t = TickTiming::new(10, 33.3);
        for _ in 0..50 {
            t.record(1.0);
        }
        assert_eq!(t.samples.len(), 10);
        assert_eq!(t.total_ticks, 50);
    }

    #[test]
    fn test_stats_sexp() {
        let t = TickTiming::new(10, 33.3);
        let s = t.stats_sexp();
        assert!(s.starts_with("(:p50 0.00"));
        assert!(s.contains(":ticks 0"));
    }
}
