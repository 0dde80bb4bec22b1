//! `From`/`TryFrom` implementations bridging `probe_config` types to `probe_core` types.

use crate::calibration::{CalibrationModel, CalibrationPoint};
use crate::config::{DecodeCfg, RateCfg, SamplerCfg, ScaleHypothesis};
use crate::error::BuildError;
use std::time::Duration;

// ── SamplerCfg ───────────────────────────────────────────────────────────────

impl TryFrom<&probe_config::Sampling> for SamplerCfg {
    type Error = BuildError;

    fn try_from(c: &probe_config::Sampling) -> Result<Self, Self::Error> {
        if c.samples_per_point == 0 {
            return Err(BuildError::InvalidConfig("samples_per_point must be >= 1"));
        }
        Ok(Self {
            samples: c.samples_per_point,
            trim: c.discard_extremes,
            interval: Duration::from_millis(c.interval_ms),
        })
    }
}

// ── DecodeCfg ────────────────────────────────────────────────────────────────

impl From<&probe_config::ScaleDef> for ScaleHypothesis {
    fn from(s: &probe_config::ScaleDef) -> Self {
        Self::new(s.name.clone(), s.divisor)
    }
}

impl TryFrom<&probe_config::Decode> for DecodeCfg {
    type Error = BuildError;

    fn try_from(c: &probe_config::Decode) -> Result<Self, Self::Error> {
        if c.scales.is_empty() {
            return Err(BuildError::NoScales);
        }
        if c.scales
            .iter()
            .any(|s| !(s.divisor.is_finite() && s.divisor > 0.0))
        {
            return Err(BuildError::InvalidConfig("scale divisors must be finite and > 0"));
        }
        Ok(Self {
            scales: c.scales.iter().map(ScaleHypothesis::from).collect(),
            expected_f: c.expected_f,
            tolerance_f: c.tolerance_f,
        })
    }
}

// ── RateCfg ──────────────────────────────────────────────────────────────────

impl From<&probe_config::Rate> for RateCfg {
    fn from(c: &probe_config::Rate) -> Self {
        Self {
            window: Duration::from_millis(c.duration_ms),
        }
    }
}

// ── Calibration ──────────────────────────────────────────────────────────────

impl From<&probe_config::PointRow> for CalibrationPoint {
    fn from(r: &probe_config::PointRow) -> Self {
        Self::new(r.raw, r.reference)
    }
}

impl From<CalibrationPoint> for probe_config::PointRow {
    fn from(p: CalibrationPoint) -> Self {
        Self {
            raw: p.measured,
            reference: p.reference,
        }
    }
}

impl From<&probe_config::PersistedCalibration> for CalibrationModel {
    fn from(c: &probe_config::PersistedCalibration) -> Self {
        Self {
            slope: c.slope,
            offset: c.offset,
        }
    }
}

impl From<CalibrationModel> for probe_config::PersistedCalibration {
    fn from(m: CalibrationModel) -> Self {
        Self {
            slope: m.slope,
            offset: m.offset,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_scale_list_is_rejected() {
        let decode = probe_config::Decode::default();
        assert_eq!(DecodeCfg::try_from(&decode), Err(BuildError::NoScales));
    }

    #[test]
    fn sampling_maps_interval_to_duration() {
        let s = probe_config::Sampling {
            samples_per_point: 20,
            discard_extremes: 2,
            interval_ms: 250,
        };
        let cfg = SamplerCfg::try_from(&s).unwrap();
        assert_eq!(cfg.samples, 20);
        assert_eq!(cfg.trim, 2);
        assert_eq!(cfg.interval, Duration::from_millis(250));
    }

    #[test]
    fn scales_keep_configured_order() {
        let decode = probe_config::Decode {
            scales: vec![
                probe_config::ScaleDef {
                    name: "per_16".into(),
                    divisor: 16.0,
                },
                probe_config::ScaleDef {
                    name: "per_5".into(),
                    divisor: 5.0,
                },
            ],
            expected_f: 70.0,
            tolerance_f: 12.0,
        };
        let cfg = DecodeCfg::try_from(&decode).unwrap();
        let names: Vec<_> = cfg.scales.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, ["per_16", "per_5"]);
    }

    #[test]
    fn persisted_calibration_round_trips_through_model() {
        let p = probe_config::PersistedCalibration {
            slope: 0.0625,
            offset: -1.5,
        };
        let model = CalibrationModel::from(&p);
        assert_eq!(model.apply(16.0), -0.5);
        assert_eq!(probe_config::PersistedCalibration::from(model), p);
    }
}
