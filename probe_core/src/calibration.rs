//! Linear calibration by ordinary least squares.
//!
//! Fits `physical = slope * raw + offset` to (measured, reference) pairs. The
//! measured side may be raw counts or an already-scaled value; the fit does
//! not care which.
use crate::error::{ProbeError, Result};
use std::fmt;

/// One captured reference condition.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CalibrationPoint {
    /// Averaged sensor reading at the reference condition.
    pub measured: f64,
    /// Known physical value (e.g. 0.0 for an ice bath).
    pub reference: f64,
}

impl CalibrationPoint {
    pub const fn new(measured: f64, reference: f64) -> Self {
        Self {
            measured,
            reference,
        }
    }
}

/// `physical = slope * raw + offset`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CalibrationModel {
    pub slope: f64,
    pub offset: f64,
}

impl CalibrationModel {
    #[inline]
    pub fn apply(&self, raw: f64) -> f64 {
        self.slope * raw + self.offset
    }

    pub fn as_pair(&self) -> (f64, f64) {
        (self.slope, self.offset)
    }

    /// Root-mean-square residual of the model over `points` (0.0 when empty).
    pub fn rms_residual(&self, points: &[CalibrationPoint]) -> f64 {
        if points.is_empty() {
            return 0.0;
        }
        let sumsq: f64 = points
            .iter()
            .map(|p| {
                let r = p.reference - self.apply(p.measured);
                r * r
            })
            .sum();
        (sumsq / points.len() as f64).sqrt()
    }
}

impl fmt::Display for CalibrationModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.offset.is_sign_negative() { '-' } else { '+' };
        write!(
            f,
            "physical = {:.4} * raw {sign} {:.2}",
            self.slope,
            self.offset.abs()
        )
    }
}

/// Fit a line through `points` by least squares.
///
/// Points are put in a canonical order before summing, so the result does not
/// depend on the order they were captured in.
pub fn fit(points: &[CalibrationPoint]) -> Result<CalibrationModel> {
    if points.len() < 2 {
        return Err(ProbeError::TooFewPoints { got: points.len() });
    }
    if let Some(index) = points
        .iter()
        .position(|p| !(p.measured.is_finite() && p.reference.is_finite()))
    {
        return Err(ProbeError::NonFinitePoint { index });
    }

    let mut pts = points.to_vec();
    pts.sort_by(|a, b| {
        a.measured
            .total_cmp(&b.measured)
            .then(a.reference.total_cmp(&b.reference))
    });

    let first = pts[0].measured;
    let degenerate = ProbeError::DegenerateFit {
        points: pts.len(),
        raw: first,
    };
    if pts.iter().all(|p| p.measured == first) {
        return Err(degenerate);
    }

    // Mean-centred sums in f64; same line as the textbook n·Σxy form.
    let n = pts.len() as f64;
    let mean_x = pts.iter().map(|p| p.measured).sum::<f64>() / n;
    let mean_y = pts.iter().map(|p| p.reference).sum::<f64>() / n;
    let mut sxx = 0.0f64;
    let mut sxy = 0.0f64;
    for p in &pts {
        let dx = p.measured - mean_x;
        sxx += dx * dx;
        sxy += dx * (p.reference - mean_y);
    }
    if !(sxx.is_finite() && sxx > 0.0) {
        return Err(degenerate);
    }

    let slope = sxy / sxx;
    let offset = mean_y - slope * mean_x;
    if !(slope.is_finite() && offset.is_finite()) {
        return Err(degenerate);
    }

    let model = CalibrationModel { slope, offset };
    tracing::info!(slope, offset, points = pts.len(), "calibration fit");
    Ok(model)
}
