#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
//! Config schemas and calibration-point CSV handling for the probe bring-up tool.
//!
//! - `Config` and sub-structs are deserialized from TOML and validated.
//! - Calibration point CSVs enforce their headers; fitting happens in `probe_core`.
use serde::de::Deserializer;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

/// Largest 7-bit bus address.
const MAX_ADDRESS: u16 = 0x7F;

/// Calibration point CSV schema.
///
/// Expected headers:
/// raw,reference
///
/// Example:
/// raw,reference
/// 16.8,0.0
/// 494.2,100.0
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq)]
pub struct PointRow {
    pub raw: f64,
    pub reference: f64,
}

#[derive(Debug, Deserialize, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ReadMode {
    /// I2C block read of two bytes starting at the register
    #[default]
    Block,
    /// SMBus word read; bytes arrive low byte first
    Word,
}

#[derive(Debug, Deserialize)]
pub struct Bus {
    /// Bus number (`/dev/i2c-N`)
    #[serde(default = "default_bus")]
    pub bus: u8,
    /// 7-bit probe address
    pub address: u16,
    /// Command/register byte sent before reading
    #[serde(default = "default_register")]
    pub register: u8,
    #[serde(default)]
    pub read_mode: ReadMode,
}

fn default_bus() -> u8 {
    1
}

fn default_register() -> u8 {
    1
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Sampling {
    /// Read attempts per averaged sample
    pub samples_per_point: usize,
    /// Readings dropped from each end of the sorted batch
    pub discard_extremes: usize,
    /// Wait between read attempts (ms)
    pub interval_ms: u64,
}

impl Default for Sampling {
    fn default() -> Self {
        Self {
            samples_per_point: 30,
            discard_extremes: 10,
            interval_ms: 500,
        }
    }
}

/// A named fixed-point divisor to try when decoding.
#[derive(Debug, Clone, PartialEq)]
pub struct ScaleDef {
    pub name: String,
    pub divisor: f64,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Decode {
    /// Scale hypotheses. Accepts either:
    /// - array of tables: [{ name = "per_10", divisor = 10.0 }, ...]
    /// - array of tuples: [["per_10", 10.0], ["per_16", 16.0], ...]
    #[serde(deserialize_with = "de_scales")]
    pub scales: Vec<ScaleDef>,
    /// Expected ambient reading in °F used to flag plausible candidates
    pub expected_f: f64,
    /// Accepted distance from `expected_f` in °F
    pub tolerance_f: f64,
}

impl Default for Decode {
    fn default() -> Self {
        Self {
            scales: Vec::new(),
            expected_f: 70.0,
            tolerance_f: 12.0,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ScaleToml {
    Tuple((String, f64)),
    Table { name: String, divisor: f64 },
}

fn de_scales<'de, D>(deserializer: D) -> Result<Vec<ScaleDef>, D::Error>
where
    D: Deserializer<'de>,
{
    let opt: Option<Vec<ScaleToml>> = Option::deserialize(deserializer)?;
    let mut out = Vec::new();
    if let Some(items) = opt {
        for s in items {
            match s {
                ScaleToml::Tuple((name, divisor)) | ScaleToml::Table { name, divisor } => {
                    out.push(ScaleDef { name, divisor });
                }
            }
        }
    }
    Ok(out)
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Rate {
    /// Measurement window for the update-rate estimate (ms)
    pub duration_ms: u64,
}

impl Default for Rate {
    fn default() -> Self {
        Self { duration_ms: 5000 }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Explore {
    /// Addresses to try; empty means just `bus.address`
    pub addresses: Vec<u16>,
    /// Registers to try at each address
    pub registers: Vec<u8>,
}

impl Default for Explore {
    fn default() -> Self {
        Self {
            addresses: Vec::new(),
            registers: vec![0, 1],
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct CsvLog {
    /// Rows to write before stopping
    pub samples: usize,
    /// Wait between rows (ms)
    pub interval_ms: u64,
    /// Addresses logged per row; empty means just `bus.address`
    pub addresses: Vec<u16>,
    /// Register read at every logged address
    pub register: u8,
}

impl Default for CsvLog {
    fn default() -> Self {
        Self {
            samples: 60,
            interval_ms: 2000,
            addresses: Vec::new(),
            register: 0,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct FanCfg {
    /// Hardware PWM channel (0 or 1)
    pub channel: u8,
    /// PWM frequency in Hz; 25 kHz is above hearing for most fans
    pub frequency_hz: f64,
}

impl Default for FanCfg {
    fn default() -> Self {
        Self {
            channel: 0,
            frequency_hz: 25_000.0,
        }
    }
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct Logging {
    pub file: Option<String>,  // path to .log (JSON lines)
    pub level: Option<String>, // "info","debug"
    /// Log rotation policy: "never" | "daily" | "hourly" (default: never)
    pub rotation: Option<String>,
}

/// Linear correction captured by an earlier `calibrate` run.
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq)]
pub struct PersistedCalibration {
    pub slope: f64,
    pub offset: f64,
}

#[derive(Debug, Deserialize)]
pub struct Config {
    pub bus: Bus,
    #[serde(default)]
    pub sampling: Sampling,
    #[serde(default)]
    pub decode: Decode,
    #[serde(default)]
    pub rate: Rate,
    #[serde(default)]
    pub explore: Explore,
    #[serde(default)]
    pub csv: CsvLog,
    #[serde(default)]
    pub fan: FanCfg,
    #[serde(default)]
    pub logging: Logging,
    /// Optional calibration applied by continuous readout.
    #[serde(default)]
    pub calibration: Option<PersistedCalibration>,
}

pub fn load_toml(s: &str) -> Result<Config, toml::de::Error> {
    toml::from_str::<Config>(s)
}

impl Config {
    /// Addresses visited by `explore`.
    pub fn explore_addresses(&self) -> Vec<u16> {
        if self.explore.addresses.is_empty() {
            vec![self.bus.address]
        } else {
            self.explore.addresses.clone()
        }
    }

    /// Addresses written by the CSV logger.
    pub fn csv_addresses(&self) -> Vec<u16> {
        if self.csv.addresses.is_empty() {
            vec![self.bus.address]
        } else {
            self.csv.addresses.clone()
        }
    }

    pub fn validate(&self) -> eyre::Result<()> {
        // Bus
        if self.bus.address > MAX_ADDRESS {
            eyre::bail!("bus.address must be a 7-bit address (<= 0x7f)");
        }

        // Sampling
        if self.sampling.samples_per_point == 0 {
            eyre::bail!("sampling.samples_per_point must be >= 1");
        }
        if self.sampling.interval_ms > 60 * 1000 {
            eyre::bail!("sampling.interval_ms is unreasonably large (>60s)");
        }

        // Decode
        let mut names = HashSet::new();
        for s in &self.decode.scales {
            if s.name.trim().is_empty() {
                eyre::bail!("decode.scales entries need a non-empty name");
            }
            if !names.insert(s.name.as_str()) {
                eyre::bail!("decode.scales has duplicate name '{}'", s.name);
            }
            if !(s.divisor.is_finite() && s.divisor > 0.0) {
                eyre::bail!("decode.scales '{}' divisor must be finite and > 0", s.name);
            }
        }
        if !self.decode.expected_f.is_finite() {
            eyre::bail!("decode.expected_f must be finite");
        }
        if !(self.decode.tolerance_f.is_finite() && self.decode.tolerance_f >= 0.0) {
            eyre::bail!("decode.tolerance_f must be finite and >= 0");
        }

        // Rate
        if self.rate.duration_ms == 0 {
            eyre::bail!("rate.duration_ms must be >= 1");
        }

        // Explore
        if self.explore.registers.is_empty() {
            eyre::bail!("explore.registers must list at least one register");
        }
        if self.explore.addresses.iter().any(|a| *a > MAX_ADDRESS) {
            eyre::bail!("explore.addresses must be 7-bit addresses (<= 0x7f)");
        }

        // CSV log
        if self.csv.samples == 0 {
            eyre::bail!("csv.samples must be >= 1");
        }
        if self.csv.addresses.iter().any(|a| *a > MAX_ADDRESS) {
            eyre::bail!("csv.addresses must be 7-bit addresses (<= 0x7f)");
        }

        // Fan
        if self.fan.channel > 1 {
            eyre::bail!("fan.channel must be 0 or 1");
        }
        if !(self.fan.frequency_hz.is_finite() && self.fan.frequency_hz > 0.0) {
            eyre::bail!("fan.frequency_hz must be finite and > 0");
        }

        // Logging
        if let Some(rot) = self.logging.rotation.as_deref()
            && !matches!(rot, "never" | "daily" | "hourly")
        {
            eyre::bail!("logging.rotation must be one of never|daily|hourly");
        }

        // Calibration
        if let Some(c) = self.calibration
            && !(c.slope.is_finite() && c.offset.is_finite())
        {
            eyre::bail!("calibration.slope and calibration.offset must be finite");
        }

        Ok(())
    }
}

pub fn load_points_csv(path: &Path) -> eyre::Result<Vec<PointRow>> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(|e| eyre::eyre!("open calibration CSV {:?}: {}", path, e))?;

    // Enforce exact headers
    let headers = rdr
        .headers()
        .map_err(|e| eyre::eyre!("read CSV headers {:?}: {}", path, e))?
        .clone();
    let expected = ["raw", "reference"];
    let actual: Vec<String> = headers.iter().map(|s| s.to_string()).collect();
    if actual != expected {
        eyre::bail!(
            "calibration CSV must have headers 'raw,reference', got: {}",
            actual.join(",")
        );
    }

    let mut rows = Vec::new();
    for (idx, rec) in rdr.deserialize::<PointRow>().enumerate() {
        match rec {
            Ok(row) => rows.push(row),
            Err(e) => {
                eyre::bail!("invalid CSV row {}: {}", idx + 2, e);
            }
        }
    }
    Ok(rows)
}

pub fn save_points_csv(path: &Path, rows: &[PointRow]) -> eyre::Result<()> {
    let mut wtr = csv::Writer::from_path(path)
        .map_err(|e| eyre::eyre!("create calibration CSV {:?}: {}", path, e))?;
    for row in rows {
        wtr.serialize(row)
            .map_err(|e| eyre::eyre!("write calibration CSV {:?}: {}", path, e))?;
    }
    wtr.flush()?;
    Ok(())
}
