use probe_core::error::ProbeError;
use probe_core::mocks::DeadProbe;
use probe_core::{RateCfg, UpdateRateEstimator, measure};
use probe_traits::clock::test_clock::TestClock;
use std::cell::Cell;
use std::rc::Rc;
use std::time::Duration;

const POLL: Duration = Duration::from_millis(10); // 100 calls per second

#[test]
fn stepped_source_at_100hz_reports_20hz() {
    let clock = TestClock::new();
    let c = clock.clone();
    let mut i = 0u32;
    let sample = measure(
        Duration::from_secs(5),
        move || {
            c.advance(POLL);
            let v = i / 5;
            i += 1;
            Ok::<u32, String>(v)
        },
        clock.clone(),
    )
    .unwrap();

    assert_eq!(sample.attempted, 500);
    assert_eq!(sample.succeeded, 500);
    assert_eq!(sample.changes(), 99);
    assert!(sample.intervals.iter().all(|dt| (dt - 0.05).abs() < 1e-9));
    assert!((sample.mean_interval_s() - 0.05).abs() < 1e-9);
    assert!((sample.rate_hz() - 20.0).abs() < 1e-6);
}

#[test]
fn constant_source_has_insufficient_changes() {
    let clock = TestClock::new();
    let c = clock.clone();
    let err = measure(
        Duration::from_secs(5),
        move || {
            c.advance(POLL);
            Ok::<u16, String>(400)
        },
        clock.clone(),
    )
    .unwrap_err();
    assert_eq!(
        err,
        ProbeError::InsufficientChanges {
            attempted: 500,
            succeeded: 500,
            changes: 0
        }
    );
}

#[test]
fn dead_probe_has_insufficient_changes() {
    // No clock advance inside the read: use a window the sleeping clock covers.
    let clock = TestClock::new();
    let c = clock.clone();
    let est = UpdateRateEstimator::new(
        RateCfg {
            window: Duration::from_millis(50),
        },
        clock.clone(),
    )
    .with_cancel(move || {
        c.advance(POLL);
        false
    });
    let err = est.measure_probe(&mut DeadProbe).unwrap_err();
    assert_eq!(
        err,
        ProbeError::InsufficientChanges {
            attempted: 5,
            succeeded: 0,
            changes: 0
        }
    );
}

#[test]
fn failed_reads_do_not_count_as_changes() {
    // Pattern: 1, err, 1, err, 2, err, 2, err, 3 ... each value lasts 4 polls.
    let clock = TestClock::new();
    let c = clock.clone();
    let mut i = 0u32;
    let sample = measure(
        Duration::from_secs(1),
        move || {
            c.advance(POLL);
            let k = i;
            i += 1;
            if k % 2 == 1 {
                Err("nack".to_string())
            } else {
                Ok(k / 4)
            }
        },
        clock.clone(),
    )
    .unwrap();
    assert_eq!(sample.attempted, 100);
    assert_eq!(sample.succeeded, 50);
    assert!(sample.intervals.iter().all(|dt| (dt - 0.04).abs() < 1e-9));
    assert!((sample.rate_hz() - 25.0).abs() < 1e-6);
}

#[test]
fn first_read_only_seeds_state() {
    // Value changes on the 2nd read only: exactly one interval.
    let clock = TestClock::new();
    let c = clock.clone();
    let mut i = 0u32;
    let sample = measure(
        Duration::from_millis(100),
        move || {
            c.advance(POLL);
            i += 1;
            Ok::<u32, String>(u32::from(i >= 2))
        },
        clock.clone(),
    )
    .unwrap();
    assert_eq!(sample.intervals.len(), 1);
    assert!((sample.intervals[0] - 0.01).abs() < 1e-9);
}

#[test]
fn cancellation_returns_no_partial_result() {
    let clock = TestClock::new();
    let reads = Rc::new(Cell::new(0usize));
    let r = reads.clone();
    let c = clock.clone();
    let est = UpdateRateEstimator::new(RateCfg::default(), clock.clone())
        .with_cancel(move || r.get() >= 42);
    let err = est
        .measure(|| {
            c.advance(POLL);
            reads.set(reads.get() + 1);
            Ok::<usize, String>(reads.get())
        })
        .unwrap_err();
    assert_eq!(err, ProbeError::Cancelled { attempted: 42 });
}
