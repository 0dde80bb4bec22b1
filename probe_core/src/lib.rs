#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
//! Core bring-up statistics for an unknown temperature probe (hardware-agnostic).
//!
//! All bus access goes through `probe_traits::Probe` or a plain read closure;
//! all timing goes through `probe_traits::Clock`.
//!
//! ## Components
//!
//! - **RawSampler**: fixed-cadence sampling with outlier trimming (`sampler`)
//! - **CalibrationFitter**: least-squares linear model (`calibration`)
//! - **HypothesisDecoder**: byte order × signedness × scale candidates (`decoder`)
//! - **UpdateRateEstimator**: change-based refresh-rate measurement (`rate`)
//!
//! Each call is self-contained; nothing is retained between calls.

pub mod calibration;
pub mod config;
pub mod conversions;
pub mod decoder;
pub mod error;
pub mod mocks;
pub mod rate;
pub mod sampler;

pub use calibration::{CalibrationModel, CalibrationPoint, fit};
pub use config::{DecodeCfg, RateCfg, SamplerCfg, ScaleHypothesis};
pub use decoder::{ByteOrder, DecodingCandidate, HypothesisDecoder, Signedness, decode};
pub use error::{BuildError, ProbeError, Result};
pub use rate::{UpdateRateEstimator, UpdateRateSample, measure};
pub use sampler::{RawSampler, TrimmedAverage, sample_average};
