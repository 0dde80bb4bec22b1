//! Runtime configuration for the probe components.
//!
//! These are separate from the TOML-deserialized config in `probe_config`;
//! see `conversions` for the mapping.

use std::time::Duration;

/// RawSampler settings.
#[derive(Debug, Clone, PartialEq)]
pub struct SamplerCfg {
    /// Read attempts per averaged sample.
    pub samples: usize,
    /// Readings dropped from each end of the sorted batch.
    pub trim: usize,
    /// Wait between consecutive read attempts.
    pub interval: Duration,
}

impl Default for SamplerCfg {
    fn default() -> Self {
        Self {
            samples: 30,
            trim: 10,
            interval: Duration::from_millis(500),
        }
    }
}

/// One scale hypothesis: counts are divided by `divisor` to get °C.
#[derive(Debug, Clone, PartialEq)]
pub struct ScaleHypothesis {
    pub name: String,
    pub divisor: f64,
}

impl ScaleHypothesis {
    pub fn new(name: impl Into<String>, divisor: f64) -> Self {
        Self {
            name: name.into(),
            divisor,
        }
    }
}

/// HypothesisDecoder settings. There is deliberately no default scale set.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodeCfg {
    pub scales: Vec<ScaleHypothesis>,
    /// Expected reading in °F.
    pub expected_f: f64,
    /// Plausibility window around `expected_f`, in °F.
    pub tolerance_f: f64,
}

/// UpdateRateEstimator settings.
#[derive(Debug, Clone, PartialEq)]
pub struct RateCfg {
    pub window: Duration,
}

impl Default for RateCfg {
    fn default() -> Self {
        Self {
            window: Duration::from_secs(5),
        }
    }
}
