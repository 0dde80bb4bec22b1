//! Effective update-rate estimation.
//!
//! A sensor can be polled far faster than it refreshes its output register.
//! Polling in a tight loop and timing the instants at which the value changes
//! reveals the real refresh interval.
use crate::config::RateCfg;
use crate::error::{ProbeError, Result};
use probe_traits::Probe;
use probe_traits::clock::Clock;
use std::fmt::Display;
use std::time::{Duration, Instant};

/// Inter-change intervals gathered over one measurement window.
#[derive(Debug, Clone, PartialEq)]
pub struct UpdateRateSample {
    /// Seconds between consecutive observed value changes, in order.
    pub intervals: Vec<f64>,
    pub attempted: usize,
    pub succeeded: usize,
    pub window: Duration,
}

impl UpdateRateSample {
    /// Number of value changes that produced an interval.
    pub fn changes(&self) -> usize {
        self.intervals.len()
    }

    pub fn mean_interval_s(&self) -> f64 {
        self.intervals.iter().sum::<f64>() / self.intervals.len() as f64
    }

    /// Reciprocal of the mean interval.
    pub fn rate_hz(&self) -> f64 {
        1.0 / self.mean_interval_s()
    }

    pub fn min_interval_s(&self) -> f64 {
        self.intervals.iter().copied().fold(f64::INFINITY, f64::min)
    }

    pub fn max_interval_s(&self) -> f64 {
        self.intervals.iter().copied().fold(f64::NEG_INFINITY, f64::max)
    }

    /// Reads per second actually achieved by the transport.
    pub fn poll_rate_hz(&self) -> f64 {
        self.attempted as f64 / self.window.as_secs_f64()
    }
}

pub struct UpdateRateEstimator<C: Clock> {
    cfg: RateCfg,
    clock: C,
    cancel: Option<Box<dyn Fn() -> bool>>,
}

impl<C: Clock> UpdateRateEstimator<C> {
    pub fn new(cfg: RateCfg, clock: C) -> Self {
        Self {
            cfg,
            clock,
            cancel: None,
        }
    }

    /// Install a cancellation check polled before every read attempt.
    pub fn with_cancel(mut self, cancel: impl Fn() -> bool + 'static) -> Self {
        self.cancel = Some(Box::new(cancel));
        self
    }

    /// Poll `read_fn` without pausing until the window closes.
    ///
    /// Failed reads leave the change-detection state untouched. The first
    /// successful read only seeds it. Fails with `InsufficientChanges` when
    /// no interval was recorded.
    pub fn measure<T, E, F>(&self, mut read_fn: F) -> Result<UpdateRateSample>
    where
        T: PartialEq + Copy,
        E: Display,
        F: FnMut() -> std::result::Result<T, E>,
    {
        let window = self.cfg.window;
        let start = self.clock.now();
        let mut last_value: Option<T> = None;
        let mut last_change: Option<Instant> = None;
        let mut intervals = Vec::new();
        let mut attempted = 0usize;
        let mut succeeded = 0usize;

        while self.clock.now().saturating_duration_since(start) < window {
            if self.cancel.as_ref().is_some_and(|c| c()) {
                tracing::debug!(attempted, "rate measurement cancelled");
                return Err(ProbeError::Cancelled { attempted });
            }
            attempted += 1;
            match read_fn() {
                Ok(v) => {
                    succeeded += 1;
                    let now = self.clock.now();
                    if last_value != Some(v) {
                        if let Some(t) = last_change {
                            let dt = now.saturating_duration_since(t).as_secs_f64();
                            tracing::trace!(interval_s = dt, "value changed");
                            intervals.push(dt);
                        }
                        last_change = Some(now);
                        last_value = Some(v);
                    }
                }
                Err(e) => {
                    tracing::debug!(attempt = attempted, error = %e, "read failed");
                }
            }
        }

        if intervals.is_empty() {
            return Err(ProbeError::InsufficientChanges {
                attempted,
                succeeded,
                changes: 0,
            });
        }
        let sample = UpdateRateSample {
            intervals,
            attempted,
            succeeded,
            window,
        };
        tracing::info!(
            changes = sample.changes(),
            mean_interval_s = sample.mean_interval_s(),
            rate_hz = sample.rate_hz(),
            "update rate"
        );
        Ok(sample)
    }

    pub fn measure_probe<P: Probe + ?Sized>(&self, probe: &mut P) -> Result<UpdateRateSample> {
        self.measure(|| probe.read_raw())
    }
}

/// One-shot form of [`UpdateRateEstimator::measure`].
pub fn measure<T, E, F, C>(duration: Duration, read_fn: F, clock: C) -> Result<UpdateRateSample>
where
    T: PartialEq + Copy,
    E: Display,
    F: FnMut() -> std::result::Result<T, E>,
    C: Clock,
{
    UpdateRateEstimator::new(RateCfg { window: duration }, clock).measure(read_fn)
}
