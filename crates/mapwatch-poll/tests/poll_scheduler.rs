//! Integration tests for the repeating poll scheduler.
//!
//! Uses `tokio::time::pause()` so `sleep_until` resolves instantly when
//! the test clock advances — cycles fire deterministically.

use std::time::Duration;

use mapwatch_poll::{PollConfig, PollScheduler};

// =========================================================================
// Helpers
// =========================================================================

fn config_3s() -> PollConfig {
    PollConfig {
        interval: Duration::from_secs(3),
        initial_jitter_us: 0,
    }
}

// =========================================================================
// PollConfig
// =========================================================================

#[test]
fn test_with_interval_sets_interval() {
    let cfg = PollConfig::with_interval(Duration::from_millis(3000));
    assert_eq!(cfg.interval, Duration::from_secs(3));
}

#[test]
fn test_validated_clamps_zero_interval() {
    let cfg = PollConfig {
        interval: Duration::ZERO,
        initial_jitter_us: 0,
    }
    .validated();
    assert_eq!(cfg.interval, PollConfig::MIN_INTERVAL);
}

#[test]
fn test_validated_keeps_sane_interval() {
    let cfg = config_3s().validated();
    assert_eq!(cfg.interval, Duration::from_secs(3));
}

// =========================================================================
// Scheduler creation and accessors
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_scheduler_initial_state() {
    let s = PollScheduler::new(config_3s());
    assert_eq!(s.cycle_count(), 0);
    assert_eq!(s.interval(), Duration::from_secs(3));
    assert_eq!(s.metrics().total_cycles, 0);
}

#[tokio::test(start_paused = true)]
async fn test_clamped_interval_visible_through_accessor() {
    let s = PollScheduler::with_interval(Duration::from_millis(1));
    assert_eq!(s.interval(), PollConfig::MIN_INTERVAL);
}

// =========================================================================
// Cycle firing
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_wait_for_cycle_fires_and_increments() {
    let mut s = PollScheduler::new(config_3s());

    let info = s.wait_for_cycle().await;

    assert_eq!(info.cycle, 1);
    assert!(!info.overrun);
    assert_eq!(info.cycles_skipped, 0);
    assert_eq!(s.cycle_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_multiple_cycles_increment_monotonically() {
    let mut s = PollScheduler::new(config_3s());

    for expected in 1..=5 {
        let info = s.wait_for_cycle().await;
        assert_eq!(info.cycle, expected);
    }
    assert_eq!(s.cycle_count(), 5);
}

#[tokio::test(start_paused = true)]
async fn test_cycle_does_not_fire_before_interval() {
    let mut s = PollScheduler::new(config_3s());

    // Less than one interval of (paused) time: the cycle must not fire.
    let result =
        tokio::time::timeout(Duration::from_secs(2), s.wait_for_cycle()).await;
    assert!(result.is_err(), "cycle fired before the interval elapsed");
}

// =========================================================================
// Overrun handling
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_overrun_skips_to_next_natural_interval() {
    let mut s = PollScheduler::new(config_3s());

    s.wait_for_cycle().await;
    // Simulate a cycle whose work took ~2.5 intervals.
    tokio::time::advance(Duration::from_millis(7_500)).await;

    let info = s.wait_for_cycle().await;

    assert!(info.overrun);
    // ~4.5s late after its own 3s deadline → one whole interval skipped.
    assert_eq!(info.cycles_skipped, 1);
    assert_eq!(s.metrics().total_overruns, 1);
    assert_eq!(s.metrics().total_skipped, 1);
}

#[tokio::test(start_paused = true)]
async fn test_after_overrun_cadence_resumes_from_now() {
    let mut s = PollScheduler::new(config_3s());

    s.wait_for_cycle().await;
    tokio::time::advance(Duration::from_secs(10)).await;
    s.wait_for_cycle().await; // the overrun cycle

    // Next cycle must be one full interval away, not immediate.
    let result =
        tokio::time::timeout(Duration::from_secs(2), s.wait_for_cycle()).await;
    assert!(result.is_err(), "next cycle fired early after an overrun");

    let info = s.wait_for_cycle().await;
    assert!(!info.overrun);
}

// =========================================================================
// Metrics
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_metrics_total_cycles_increments() {
    let mut s = PollScheduler::new(config_3s());

    for _ in 0..3 {
        s.wait_for_cycle().await;
        s.record_cycle_end();
    }

    assert_eq!(s.metrics().total_cycles, 3);
}

#[tokio::test(start_paused = true)]
async fn test_record_cycle_end_without_wait_is_noop() {
    let mut s = PollScheduler::new(config_3s());

    s.record_cycle_end();

    assert_eq!(s.metrics().total_cycles, 0);
    assert_eq!(s.metrics().avg_cycle_time, Duration::ZERO);
}

#[tokio::test(start_paused = true)]
async fn test_metrics_max_cycle_time_tracked() {
    let mut s = PollScheduler::new(config_3s());

    // record_cycle_end uses std::time::Instant (wall clock), not tokio
    // time — burn a little real time so something non-zero is recorded.
    s.wait_for_cycle().await;
    std::thread::sleep(Duration::from_micros(50));
    s.record_cycle_end();

    assert!(s.metrics().max_cycle_time > Duration::ZERO);
}

// =========================================================================
// Integration: tracker-loop pattern (mirrors real usage)
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_poll_loop_pattern_with_stop_signal() {
    let mut s = PollScheduler::new(config_3s());
    let (tx, mut rx) = tokio::sync::mpsc::channel::<&str>(1);

    tokio::spawn(async move {
        // Stop after ~3 cycles.
        tokio::time::sleep(Duration::from_millis(9_500)).await;
        tx.send("stop").await.ok();
    });

    let mut cycles = 0u64;
    loop {
        tokio::select! {
            Some(cmd) = rx.recv() => {
                assert_eq!(cmd, "stop");
                break;
            }
            info = s.wait_for_cycle() => {
                cycles += 1;
                s.record_cycle_end();
                assert_eq!(info.cycle, cycles);
            }
        }
    }

    assert!(cycles >= 3, "expected at least 3 cycles, got {cycles}");
}
