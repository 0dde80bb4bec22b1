use thiserror::Error;

/// Failures surfaced by the probe statistics components.
///
/// Transient read failures never appear here; they are absorbed and counted.
/// Every variant carries the counts gathered before failing so callers can
/// point at wiring or addressing problems.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ProbeError {
    #[error("insufficient samples: {succeeded} of {attempted} reads succeeded")]
    InsufficientSamples { attempted: usize, succeeded: usize },
    #[error("calibration needs at least two points, got {got}")]
    TooFewPoints { got: usize },
    #[error("degenerate fit: all {points} calibration points share raw value {raw}")]
    DegenerateFit { points: usize, raw: f64 },
    #[error("calibration point {index} is not finite")]
    NonFinitePoint { index: usize },
    #[error(
        "insufficient changes: value never changed ({succeeded} of {attempted} reads succeeded, {changes} changes)"
    )]
    InsufficientChanges {
        attempted: usize,
        succeeded: usize,
        changes: usize,
    },
    #[error("cancelled after {attempted} read attempts")]
    Cancelled { attempted: usize },
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum BuildError {
    #[error("no scale hypotheses configured")]
    NoScales,
    #[error("invalid config: {0}")]
    InvalidConfig(&'static str),
}

pub type Result<T, E = ProbeError> = std::result::Result<T, E>;
