//! Repeating poll scheduler for mapwatch.
//!
//! Drives the fetch-diff-emit cycle of one tracked world at the
//! server-specified interval. The overrun policy is fixed: when a cycle
//! runs long (slow fetch, slow consumer), missed cycles are skipped and
//! the next one is scheduled from *now* — a poller never tries to catch
//! up on cycles it missed, it just waits for the next natural interval.
//!
//! # Integration
//!
//! The scheduler sits at the top of a tracker task's loop:
//!
//! ```ignore
//! loop {
//!     let cycle = scheduler.wait_for_cycle().await;
//!     run_poll_cycle(&state, cycle).await;
//!     scheduler.record_cycle_end();
//! }
//! ```

use std::time::{Duration, Instant};

use rand::Rng;
use tokio::time::{self, Instant as TokioInstant};
use tracing::{debug, trace, warn};

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Configuration for the poll scheduler.
#[derive(Debug, Clone)]
pub struct PollConfig {
    /// Interval between cycles. Comes from the server's `updaterate`.
    pub interval: Duration,
    /// Random jitter (0–max µs) added to the *first* cycle so that
    /// several worlds tracked in the same instant don't hit the server
    /// in lockstep.
    pub initial_jitter_us: u64,
}

impl PollConfig {
    /// Shortest interval the scheduler will accept. A zero `updaterate`
    /// from a misconfigured server must not turn into a busy loop.
    pub const MIN_INTERVAL: Duration = Duration::from_secs(1);

    /// Create a config for a specific interval with default jitter.
    pub fn with_interval(interval: Duration) -> Self {
        Self {
            interval,
            initial_jitter_us: 2_000, // 0–2 ms default jitter
        }
    }

    /// Clamp out-of-range values so the config is safe to use.
    ///
    /// Called automatically by [`PollScheduler::new`]. The interval is
    /// raised to [`Self::MIN_INTERVAL`] if it falls below it.
    pub fn validated(mut self) -> Self {
        if self.interval < Self::MIN_INTERVAL {
            warn!(
                interval_ms = self.interval.as_millis() as u64,
                min_ms = Self::MIN_INTERVAL.as_millis() as u64,
                "poll interval below minimum — clamping"
            );
            self.interval = Self::MIN_INTERVAL;
        }
        self
    }
}

// ---------------------------------------------------------------------------
// Cycle info (returned to caller each cycle)
// ---------------------------------------------------------------------------

/// Information about a due cycle, returned by
/// [`PollScheduler::wait_for_cycle`].
#[derive(Debug, Clone)]
pub struct CycleInfo {
    /// Monotonically increasing cycle number (starts at 1).
    pub cycle: u64,
    /// `true` if this cycle fired late (previous work overran the interval).
    pub overrun: bool,
    /// How many whole intervals were skipped (0 in normal operation).
    pub cycles_skipped: u64,
}

// ---------------------------------------------------------------------------
// Metrics
// ---------------------------------------------------------------------------

/// Runtime metrics for one poll scheduler.
///
/// Timing values refer to the cycle execution time reported via
/// [`PollScheduler::record_cycle_end`].
#[derive(Debug, Clone, Default)]
pub struct PollMetrics {
    /// Total cycles fired.
    pub total_cycles: u64,
    /// Total overruns detected.
    pub total_overruns: u64,
    /// Total cycles skipped due to overruns.
    pub total_skipped: u64,
    /// Exponential moving average of cycle execution time (α = 0.1).
    pub avg_cycle_time: Duration,
    /// Maximum cycle execution time observed.
    pub max_cycle_time: Duration,
}

// ---------------------------------------------------------------------------
// Scheduler
// ---------------------------------------------------------------------------

/// Repeating poll scheduler. One per tracked world.
pub struct PollScheduler {
    config: PollConfig,
    cycle_count: u64,
    /// When the next cycle should fire.
    next_cycle: TokioInstant,
    /// Wall-clock instant when the current cycle's work started.
    /// Set by `wait_for_cycle`, consumed by `record_cycle_end`.
    cycle_start: Option<Instant>,
    metrics: PollMetrics,
}

impl PollScheduler {
    /// Create a new scheduler from config.
    ///
    /// The first cycle is scheduled with optional jitter to spread out
    /// pollers created at the same instant.
    pub fn new(config: PollConfig) -> Self {
        let config = config.validated();

        let jitter = if config.initial_jitter_us > 0 {
            let us = rand::rng().random_range(0..config.initial_jitter_us);
            Duration::from_micros(us)
        } else {
            Duration::ZERO
        };
        let next_cycle = TokioInstant::now() + config.interval + jitter;

        debug!(
            interval_ms = config.interval.as_millis() as u64,
            "poll scheduler created"
        );

        Self {
            config,
            cycle_count: 0,
            next_cycle,
            cycle_start: None,
            metrics: PollMetrics::default(),
        }
    }

    /// Create a scheduler for a specific interval with default settings.
    pub fn with_interval(interval: Duration) -> Self {
        Self::new(PollConfig::with_interval(interval))
    }

    /// Wait until the next cycle is due. Returns [`CycleInfo`] for it.
    pub async fn wait_for_cycle(&mut self) -> CycleInfo {
        let next = self.next_cycle;
        let interval = self.config.interval;

        time::sleep_until(next).await;

        let now = TokioInstant::now();
        self.cycle_count += 1;
        self.cycle_start = Some(Instant::now());

        // Did we wake up significantly late?
        let late_by = now.saturating_duration_since(next);
        let overrun = late_by > interval / 10; // >10% late = overrun
        let mut cycles_skipped = 0u64;

        if overrun {
            cycles_skipped =
                late_by.as_nanos() as u64 / interval.as_nanos() as u64;
            if cycles_skipped > 0 {
                warn!(
                    cycle = self.cycle_count,
                    skipped = cycles_skipped,
                    late_ms = late_by.as_secs_f64() * 1000.0,
                    "poll overrun — skipping to next natural interval"
                );
            }
            self.metrics.total_overruns += 1;
        }

        // Always schedule from now, never from the missed deadline.
        self.next_cycle = now + interval;

        self.metrics.total_skipped += cycles_skipped;
        self.metrics.total_cycles += 1;

        trace!(cycle = self.cycle_count, overrun, "poll cycle due");

        CycleInfo {
            cycle: self.cycle_count,
            overrun,
            cycles_skipped,
        }
    }

    /// Record that the work for the current cycle has finished.
    ///
    /// Feeds the execution-time metrics. Calling it without a prior
    /// `wait_for_cycle` is a no-op.
    pub fn record_cycle_end(&mut self) {
        let Some(start) = self.cycle_start.take() else {
            return;
        };
        let elapsed = start.elapsed();

        if elapsed > self.metrics.max_cycle_time {
            self.metrics.max_cycle_time = elapsed;
        }
        // Exponential moving average (α = 0.1).
        let alpha = 0.1;
        let prev = self.metrics.avg_cycle_time.as_secs_f64();
        let curr = elapsed.as_secs_f64();
        self.metrics.avg_cycle_time =
            Duration::from_secs_f64(prev * (1.0 - alpha) + curr * alpha);

        if elapsed > self.config.interval {
            warn!(
                cycle = self.cycle_count,
                elapsed_ms = elapsed.as_secs_f64() * 1000.0,
                interval_ms = self.config.interval.as_millis() as u64,
                "poll cycle took longer than the interval"
            );
        }
    }

    /// Current cycle count.
    pub fn cycle_count(&self) -> u64 {
        self.cycle_count
    }

    /// The configured interval.
    pub fn interval(&self) -> Duration {
        self.config.interval
    }

    /// Snapshot of current metrics.
    pub fn metrics(&self) -> &PollMetrics {
        &self.metrics
    }
}
