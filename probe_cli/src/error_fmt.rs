//! Human-readable error descriptions and structured JSON error formatting.

use probe_core::error::{BuildError, ProbeError};
use probe_hardware::error::HwError;

/// Turn a backend's boxed error into a report, keeping `HwError` typed so
/// [`humanize`] and [`reason_name`] can still match on it.
pub fn backend_report(e: Box<dyn std::error::Error + Send + Sync>) -> eyre::Report {
    e.downcast::<HwError>()
        .map_or_else(|e| eyre::eyre!(e), |hw| eyre::Report::new(*hw))
}

/// Map an eyre::Report to a human-readable explanation with likely causes and fix hints.
pub fn humanize(err: &eyre::Report) -> String {
    // Typed matches first
    if let Some(be) = err.downcast_ref::<BuildError>() {
        return match be {
            BuildError::NoScales => {
                "What happened: No scale hypotheses are configured.\nLikely causes: [decode] scales is empty in the config.\nHow to fix: Add scales (e.g. `scales = [[\"per_16\", 16.0]]`) or pass --scale NAME=DIVISOR.".to_string()
            }
            BuildError::InvalidConfig(msg) => format!(
                "What happened: Invalid configuration ({msg}).\nLikely causes: Out-of-range values in the TOML or on the command line.\nHow to fix: Fix the value, then rerun."
            ),
        };
    }

    if let Some(pe) = err.downcast_ref::<ProbeError>() {
        return match pe {
            ProbeError::InsufficientSamples { attempted, succeeded } => format!(
                "What happened: No usable reading ({succeeded} of {attempted} reads succeeded).\nLikely causes: Wrong I2C address or register, loose SDA/SCL wiring, or no power to the probe.\nHow to fix: Run `probe self-check` and `probe explore`, then check [bus] in the config."
            ),
            ProbeError::InsufficientChanges {
                attempted,
                succeeded,
                ..
            } => format!(
                "What happened: The reading never changed ({succeeded} of {attempted} reads succeeded).\nLikely causes: Measurement window shorter than the probe's refresh interval, a stable temperature, or reads failing.\nHow to fix: Increase --duration-ms (or rate.duration_ms) and warm or cool the probe while measuring."
            ),
            ProbeError::TooFewPoints { got } => format!(
                "What happened: Calibration needs at least two points, got {got}.\nLikely causes: Only one --reference given, or a short points CSV.\nHow to fix: Capture at least two distinct reference conditions."
            ),
            ProbeError::DegenerateFit { points, raw } => format!(
                "What happened: All {points} calibration points measured the same value ({raw}).\nLikely causes: The probe did not settle between references, or it is not responding to temperature.\nHow to fix: Let the probe stabilise at each reference and use references far apart."
            ),
            ProbeError::NonFinitePoint { index } => format!(
                "What happened: Calibration point {index} is not a finite number.\nLikely causes: NaN or inf in the points CSV.\nHow to fix: Fix that row and rerun."
            ),
            ProbeError::Cancelled { attempted } => format!(
                "What happened: Interrupted after {attempted} read attempts.\nLikely causes: Ctrl-C.\nHow to fix: Rerun when ready."
            ),
        };
    }

    if let Some(he) = err.downcast_ref::<HwError>() {
        return match he {
            HwError::I2c(msg) => format!(
                "What happened: I2C access failed ({msg}).\nLikely causes: I2C not enabled, wrong bus number, or missing permission on /dev/i2c-*.\nHow to fix: Enable I2C, check [bus] bus/address, and add the user to the i2c group."
            ),
            HwError::Pwm(msg) => format!(
                "What happened: PWM access failed ({msg}).\nLikely causes: Hardware PWM overlay not enabled or wrong channel.\nHow to fix: Enable the pwm overlay and check [fan] channel."
            ),
            other => format!(
                "What happened: {other}.\nLikely causes: See logs.\nHow to fix: Re-run with --log-level=debug for more detail."
            ),
        };
    }

    // String-based heuristics for errors coming from init or config
    let msg = err.to_string();
    let lower = msg.to_ascii_lowercase();

    if lower.contains("calibration csv must have headers") {
        return "Invalid headers in calibration points CSV. Expected 'raw,reference'.".to_string();
    }

    if lower.contains("read config") || lower.contains("parse config") {
        let cause = err.root_cause();
        return format!(
            "What happened: Could not load the configuration ({cause}).\nLikely causes: Wrong --config path or invalid TOML.\nHow to fix: Point --config at a valid file (see etc/probe.toml)."
        );
    }

    if lower.contains("invalid config") {
        let cause = err.root_cause();
        return format!(
            "What happened: Configuration is invalid ({cause}).\nLikely causes: Missing [bus] address or out-of-range values.\nHow to fix: Edit the TOML config and try again."
        );
    }

    // Generic fallback
    let mut cause = String::new();
    if let Some(src) = err.source() {
        cause = format!(" Cause: {src}");
    }
    format!(
        "Something went wrong.{cause}\nHow to fix: Re-run with --log-level=debug for details. Original: {msg}"
    )
}

/// Stable exit codes per failure kind; anything untyped returns 1.
pub fn exit_code_for_error(err: &eyre::Report) -> i32 {
    if let Some(pe) = err.downcast_ref::<ProbeError>() {
        return match pe {
            ProbeError::InsufficientSamples { .. } => 3,
            ProbeError::InsufficientChanges { .. } => 4,
            ProbeError::TooFewPoints { .. }
            | ProbeError::DegenerateFit { .. }
            | ProbeError::NonFinitePoint { .. } => 5,
            ProbeError::Cancelled { .. } => 130,
        };
    }
    if err.downcast_ref::<BuildError>().is_some() {
        return 2;
    }
    1
}

/// Stable machine name for the error kind.
pub fn reason_name(err: &eyre::Report) -> &'static str {
    if let Some(pe) = err.downcast_ref::<ProbeError>() {
        return match pe {
            ProbeError::InsufficientSamples { .. } => "InsufficientSamples",
            ProbeError::InsufficientChanges { .. } => "InsufficientChanges",
            ProbeError::TooFewPoints { .. } => "TooFewPoints",
            ProbeError::DegenerateFit { .. } => "DegenerateFit",
            ProbeError::NonFinitePoint { .. } => "NonFinitePoint",
            ProbeError::Cancelled { .. } => "Cancelled",
        };
    }
    if err.downcast_ref::<BuildError>().is_some() {
        return "InvalidConfig";
    }
    if err.downcast_ref::<HwError>().is_some() {
        return "Hardware";
    }
    "Error"
}

/// Structured JSON for errors when --json is enabled.
pub fn format_error_json(err: &eyre::Report) -> String {
    use serde_json::json;

    let details = match err.downcast_ref::<ProbeError>() {
        Some(
            ProbeError::InsufficientSamples {
                attempted,
                succeeded,
            },
        ) => Some(json!({ "attempted": attempted, "succeeded": succeeded })),
        Some(ProbeError::InsufficientChanges {
            attempted,
            succeeded,
            changes,
        }) => Some(json!({ "attempted": attempted, "succeeded": succeeded, "changes": changes })),
        Some(ProbeError::DegenerateFit { points, raw }) => {
            Some(json!({ "points": points, "raw": raw }))
        }
        Some(ProbeError::Cancelled { attempted }) => Some(json!({ "attempted": attempted })),
        _ => None,
    };

    let reason = reason_name(err);
    let msg = humanize(err);
    match details {
        Some(d) => json!({ "reason": reason, "details": d, "message": msg }),
        None => json!({ "reason": reason, "message": msg }),
    }
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn typed_errors_map_to_exit_codes() {
        let e = eyre::Report::new(ProbeError::InsufficientSamples {
            attempted: 30,
            succeeded: 0,
        });
        assert_eq!(exit_code_for_error(&e), 3);
        assert!(humanize(&e).contains("0 of 30 reads succeeded"));

        let e = eyre::Report::new(ProbeError::Cancelled { attempted: 2 });
        assert_eq!(exit_code_for_error(&e), 130);

        let e = eyre::Report::new(BuildError::NoScales);
        assert_eq!(exit_code_for_error(&e), 2);
        assert!(humanize(&e).contains("--scale"));

        assert_eq!(exit_code_for_error(&eyre::eyre!("boom")), 1);
    }

    #[test]
    fn wrapped_typed_errors_still_downcast() {
        use eyre::WrapErr;
        let r: eyre::Result<()> = Err(ProbeError::InsufficientChanges {
            attempted: 9,
            succeeded: 9,
            changes: 0,
        })
        .wrap_err("rate");
        let e = r.unwrap_err();
        assert_eq!(exit_code_for_error(&e), 4);
        assert_eq!(reason_name(&e), "InsufficientChanges");
    }

    #[test]
    fn json_error_has_reason_and_details() {
        let e = eyre::Report::new(ProbeError::DegenerateFit {
            points: 3,
            raw: 5.0,
        });
        let v: serde_json::Value = serde_json::from_str(&format_error_json(&e)).unwrap();
        assert_eq!(v["reason"], "DegenerateFit");
        assert_eq!(v["details"]["points"], 3);
        assert!(v["message"].as_str().unwrap().starts_with("What happened"));
    }

    #[test]
    fn hardware_error_hints_at_permissions() {
        let e = eyre::Report::new(HwError::I2c("Permission denied".into()));
        assert!(humanize(&e).contains("i2c group"));
        assert!(format_error_json(&e).contains("\"Hardware\""));
    }

    #[test]
    fn boxed_backend_errors_keep_hardware_hints() {
        use eyre::WrapErr;
        let boxed: Box<dyn std::error::Error + Send + Sync> =
            Box::new(HwError::I2c("Remote I/O error".into()));
        let r: eyre::Result<()> = Err(backend_report(boxed)).wrap_err("device did not answer");
        let e = r.unwrap_err();
        assert!(humanize(&e).contains("i2c group"));
        assert!(humanize(&e).contains("Remote I/O error"));
        assert_eq!(reason_name(&e), "Hardware");
        assert_eq!(exit_code_for_error(&e), 1);
    }

    #[test]
    fn boxed_foreign_errors_fall_back_to_generic() {
        let boxed: Box<dyn std::error::Error + Send + Sync> = "bus wedged".into();
        let e = backend_report(boxed);
        assert_eq!(reason_name(&e), "Error");
        assert!(humanize(&e).contains("bus wedged"));
    }
}
