//! CLI argument definitions.

use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "probe", version, about = "Temperature probe bring-up CLI")]
pub struct Cli {
    /// Path to config TOML (typed)
    #[arg(long, value_name = "FILE", default_value = "etc/probe.toml")]
    pub config: PathBuf,

    /// Emit JSON (results on stdout, logs on stderr) instead of text
    #[arg(long, action = ArgAction::SetTrue)]
    pub json: bool,

    /// Console log level (error|warn|info|debug|trace)
    #[arg(long = "log-level", value_name = "LEVEL", default_value = "warn")]
    pub log_level: String,

    /// Command to execute
    #[command(subcommand)]
    pub cmd: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Take one trimmed-average sample from the probe
    Sample {
        /// Read attempts (overrides sampling.samples_per_point)
        #[arg(long)]
        samples: Option<usize>,
        /// Readings dropped from each end (overrides sampling.discard_extremes)
        #[arg(long)]
        trim: Option<usize>,
        /// Wait between reads in ms (overrides sampling.interval_ms)
        #[arg(long, value_name = "MS")]
        interval_ms: Option<u64>,
        /// Divide raw counts by this before averaging (sample in °C)
        #[arg(long, value_name = "DIVISOR")]
        scale_divisor: Option<f64>,
    },
    /// Fit a linear correction from reference conditions
    Calibrate {
        /// Known reference value; repeat for each condition (default: 0 and 100)
        #[arg(long = "reference", value_name = "VALUE", allow_negative_numbers = true)]
        references: Vec<f64>,
        /// Fit offline from a `raw,reference` CSV instead of sampling
        #[arg(
            long,
            value_name = "FILE",
            conflicts_with_all = ["references", "save_points", "scale_divisor", "no_prompt"]
        )]
        points: Option<PathBuf>,
        /// Write the captured points to a `raw,reference` CSV
        #[arg(long, value_name = "FILE")]
        save_points: Option<PathBuf>,
        /// Divide raw counts by this before averaging (calibrate pre-scaled °C)
        #[arg(long, value_name = "DIVISOR")]
        scale_divisor: Option<f64>,
        /// Do not wait for Enter before sampling each reference
        #[arg(long, action = ArgAction::SetTrue)]
        no_prompt: bool,
    },
    /// Show every byte order × signedness × scale reading of one payload
    Decode {
        /// Decode these two bytes instead of reading the probe (e.g. 0x01 0x90)
        #[arg(long, num_args = 2, value_names = ["B0", "B1"], value_parser = parse_byte)]
        bytes: Option<Vec<u8>>,
        /// Scale hypothesis NAME=DIVISOR; repeat to replace decode.scales
        #[arg(long = "scale", value_name = "NAME=DIVISOR", value_parser = parse_scale)]
        scales: Vec<(String, f64)>,
        /// Expected reading in °F (overrides decode.expected_f)
        #[arg(long, allow_negative_numbers = true)]
        expected_f: Option<f64>,
        /// Plausibility window in °F (overrides decode.tolerance_f)
        #[arg(long)]
        tolerance_f: Option<f64>,
        /// Print only plausible candidates
        #[arg(long, action = ArgAction::SetTrue)]
        plausible_only: bool,
    },
    /// Read and decode every configured address × register × read mode
    Explore,
    /// Measure how often the reported value actually changes
    Rate {
        /// Measurement window in ms (overrides rate.duration_ms)
        #[arg(long, value_name = "MS")]
        duration_ms: Option<u64>,
    },
    /// Continuous readout, corrected by [calibration] when present
    Read {
        /// Stop after this many reads (default: until Ctrl-C)
        #[arg(long)]
        count: Option<usize>,
        /// Wait between reads in ms (overrides sampling.interval_ms)
        #[arg(long, value_name = "MS")]
        interval_ms: Option<u64>,
    },
    /// Log decoded readings of the configured addresses to CSV
    Log {
        /// Output CSV path
        #[arg(long, value_name = "FILE", default_value = "probe_log.csv")]
        out: PathBuf,
        /// Rows to write (overrides csv.samples)
        #[arg(long)]
        samples: Option<usize>,
        /// Wait between rows in ms (overrides csv.interval_ms)
        #[arg(long, value_name = "MS")]
        interval_ms: Option<u64>,
    },
    /// Drive the PWM fan: hold a duty cycle or ramp 0 → 100 %
    Fan {
        /// Duty cycle to hold, in percent
        #[arg(long, conflicts_with = "ramp")]
        percent: Option<f32>,
        /// Ramp from 0 % to 100 % in steps
        #[arg(long, action = ArgAction::SetTrue)]
        ramp: bool,
        /// Ramp step in percent
        #[arg(long, default_value_t = 10.0)]
        step: f32,
        /// Time spent at each ramp step in ms
        #[arg(long, value_name = "MS", default_value_t = 2000)]
        step_ms: u64,
        /// Hold time at the final duty cycle in ms
        #[arg(long, value_name = "MS", default_value_t = 5000)]
        hold_ms: u64,
    },
    /// Quick health check: open the probe and read once
    SelfCheck,
}

fn parse_byte(s: &str) -> Result<u8, String> {
    let t = s.trim();
    let parsed = match t.strip_prefix("0x").or_else(|| t.strip_prefix("0X")) {
        Some(hex) => u8::from_str_radix(hex, 16),
        None => t.parse::<u8>(),
    };
    parsed.map_err(|e| format!("'{s}' is not a byte (0..=255 or 0x00..=0xff): {e}"))
}

fn parse_scale(s: &str) -> Result<(String, f64), String> {
    let (name, div) = s
        .split_once('=')
        .ok_or_else(|| format!("'{s}' must look like NAME=DIVISOR"))?;
    let divisor: f64 = div
        .trim()
        .parse()
        .map_err(|e| format!("bad divisor in '{s}': {e}"))?;
    if name.trim().is_empty() || !(divisor.is_finite() && divisor > 0.0) {
        return Err(format!("'{s}' needs a name and a finite divisor > 0"));
    }
    Ok((name.trim().to_string(), divisor))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bytes_accept_hex_and_decimal() {
        assert_eq!(parse_byte("0x90"), Ok(0x90));
        assert_eq!(parse_byte("144"), Ok(144));
        assert!(parse_byte("0x190").is_err());
        assert!(parse_byte("256").is_err());
    }

    #[test]
    fn scale_needs_positive_divisor() {
        assert_eq!(parse_scale("per_16=16"), Ok(("per_16".to_string(), 16.0)));
        assert!(parse_scale("per_0=0").is_err());
        assert!(parse_scale("=5").is_err());
        assert!(parse_scale("per_5").is_err());
    }

    #[test]
    fn cli_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn points_file_rejects_capture_only_flags() {
        use clap::Parser;
        use clap::error::ErrorKind;
        for extra in [
            &["--no-prompt"][..],
            &["--scale-divisor", "16"],
            &["--reference", "0"],
            &["--save-points", "out.csv"],
        ] {
            let mut argv = vec!["probe", "calibrate", "--points", "pts.csv"];
            argv.extend_from_slice(extra);
            let err = Cli::try_parse_from(argv).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::ArgumentConflict, "{extra:?}");
        }
        assert!(Cli::try_parse_from(["probe", "calibrate", "--points", "pts.csv"]).is_ok());
    }
}
