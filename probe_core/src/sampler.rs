//! Fixed-cadence sampling with outlier trimming.
//!
//! Pulls `samples` readings from a read function, waiting `interval` between
//! attempts whether or not the previous read succeeded, then averages the
//! successful readings after dropping `trim` values from each end of the
//! sorted batch.
//!
//! The sampler is generic over the unit of the readings: raw counts (`u16`)
//! and pre-scaled Celsius (`f32`/`f64`) go through the same code.
use crate::config::SamplerCfg;
use crate::error::{ProbeError, Result};
use probe_traits::Probe;
use probe_traits::clock::Clock;
use std::fmt::Display;
use std::time::Duration;

/// Result of one sampling run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrimmedAverage {
    /// Mean of the readings that survived trimming.
    pub mean: f64,
    /// Read attempts made.
    pub attempted: usize,
    /// Successful (finite) readings collected.
    pub valid: usize,
    /// Readings dropped from each tail of the sorted batch.
    pub trimmed_per_tail: usize,
    /// Set when the configured trim would have left nothing and the
    /// untrimmed mean was used instead.
    pub low_confidence: bool,
}

impl TrimmedAverage {
    /// Readings dropped as extremes (both tails).
    pub fn discarded(&self) -> usize {
        self.trimmed_per_tail * 2
    }

    /// Readings that contributed to `mean`.
    pub fn used(&self) -> usize {
        self.valid - self.discarded()
    }

    pub fn failed(&self) -> usize {
        self.attempted - self.valid
    }
}

/// Sort `values` and average them after dropping `trim` from each end.
///
/// Returns `(mean, trimmed_per_tail, low_confidence)`, or `None` for an empty
/// slice. When `values.len() <= 2 * trim` the mean of all values is returned
/// with `trimmed_per_tail = 0` and `low_confidence = true`.
pub fn trimmed_mean(values: &mut [f64], trim: usize) -> Option<(f64, usize, bool)> {
    if values.is_empty() {
        return None;
    }
    values.sort_by(f64::total_cmp);
    let n = values.len();
    let keeps_some = trim.checked_mul(2).is_some_and(|both| n > both);
    let (kept, per_tail, low_confidence) = if keeps_some {
        (&values[trim..n - trim], trim, false)
    } else {
        (&values[..], 0, trim > 0)
    };
    let mean = kept.iter().sum::<f64>() / kept.len() as f64;
    Some((mean, per_tail, low_confidence))
}

pub struct RawSampler<C: Clock> {
    cfg: SamplerCfg,
    clock: C,
    cancel: Option<Box<dyn Fn() -> bool>>,
}

impl<C: Clock> RawSampler<C> {
    pub fn new(cfg: SamplerCfg, clock: C) -> Self {
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

    pub fn cfg(&self) -> &SamplerCfg {
        &self.cfg
    }

    /// Run one sampling pass over `read_fn`.
    ///
    /// Read errors and non-finite values are dropped and counted. Fails with
    /// `InsufficientSamples` when nothing usable was read, or `Cancelled` if
    /// the cancellation check fires; partial batches are never returned.
    pub fn sample<T, E, F>(&self, mut read_fn: F) -> Result<TrimmedAverage>
    where
        T: Into<f64>,
        E: Display,
        F: FnMut() -> std::result::Result<T, E>,
    {
        let n = self.cfg.samples;
        let mut values: Vec<f64> = Vec::with_capacity(n);

        for i in 0..n {
            if self.cancel.as_ref().is_some_and(|c| c()) {
                tracing::debug!(attempted = i, "sampling cancelled");
                return Err(ProbeError::Cancelled { attempted: i });
            }
            match read_fn() {
                Ok(v) => {
                    let v: f64 = v.into();
                    if v.is_finite() {
                        tracing::trace!(value = v, "sample");
                        values.push(v);
                    } else {
                        tracing::debug!(attempt = i, "non-finite reading dropped");
                    }
                }
                Err(e) => {
                    tracing::debug!(attempt = i, error = %e, "read failed");
                }
            }
            if i + 1 < n {
                self.clock.sleep(self.cfg.interval);
            }
        }

        let valid = values.len();
        let Some((mean, trimmed_per_tail, low_confidence)) =
            trimmed_mean(&mut values, self.cfg.trim)
        else {
            return Err(ProbeError::InsufficientSamples {
                attempted: n,
                succeeded: 0,
            });
        };

        if low_confidence {
            tracing::warn!(
                valid,
                trim = self.cfg.trim,
                "not enough valid samples to discard extremes; using untrimmed mean"
            );
        }
        let avg = TrimmedAverage {
            mean,
            attempted: n,
            valid,
            trimmed_per_tail,
            low_confidence,
        };
        tracing::info!(
            mean,
            valid,
            attempted = n,
            discarded = avg.discarded(),
            "sample average"
        );
        Ok(avg)
    }

    /// Sample raw counts from a probe.
    pub fn sample_probe<P: Probe + ?Sized>(&self, probe: &mut P) -> Result<TrimmedAverage> {
        self.sample(|| probe.read_raw())
    }
}

/// One-shot form of [`RawSampler::sample`].
pub fn sample_average<T, E, F, C>(
    n: usize,
    trim: usize,
    interval: Duration,
    clock: C,
    read_fn: F,
) -> Result<TrimmedAverage>
where
    T: Into<f64>,
    E: Display,
    F: FnMut() -> std::result::Result<T, E>,
    C: Clock,
{
    let cfg = SamplerCfg {
        samples: n,
        trim,
        interval,
    };
    RawSampler::new(cfg, clock).sample(read_fn)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trimmed_mean_drops_both_tails() {
        let mut v = vec![9.0, 1.0, 5.0, 100.0, 4.0, 6.0, -50.0];
        let (mean, per_tail, low) = trimmed_mean(&mut v, 2).unwrap();
        assert_eq!(per_tail, 2);
        assert!(!low);
        assert!((mean - 5.0).abs() < 1e-12);
    }

    #[test]
    fn trimmed_mean_keeps_single_middle_value() {
        let mut v = vec![3.0, 1.0, 2.0];
        assert_eq!(trimmed_mean(&mut v, 1), Some((2.0, 1, false)));
    }

    #[test]
    fn trimmed_mean_falls_back_when_trim_consumes_everything() {
        let mut v = vec![1.0, 2.0, 3.0, 4.0];
        assert_eq!(trimmed_mean(&mut v, 2), Some((2.5, 0, true)));
    }

    #[test]
    fn trimmed_mean_without_trim_is_not_low_confidence() {
        let mut v = vec![7.0];
        assert_eq!(trimmed_mean(&mut v, 0), Some((7.0, 0, false)));
    }

    #[test]
    fn trimmed_mean_of_nothing_is_none() {
        assert_eq!(trimmed_mean(&mut [], 3), None);
    }

    #[test]
    fn huge_trim_does_not_overflow() {
        let mut v = vec![1.0, 2.0];
        assert_eq!(trimmed_mean(&mut v, usize::MAX), Some((1.5, 0, true)));
    }
}
