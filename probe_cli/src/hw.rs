//! Backend selection: rppal drivers with `--features hardware` on Linux,
//! otherwise the simulated probe/fan steered by `PROBE_SIM_*` variables.
//!
//! - `PROBE_SIM_RAW`: base raw word (decimal or `0x` hex, default `0x0190`)
//! - `PROBE_SIM_STEP`: raw value increments after this many reads
//! - `PROBE_SIM_FAIL_EVERY`: every n-th read fails
//! - `PROBE_SIM_FAIL`: any non-empty value other than `0` makes every read fail

use eyre::Result;
use probe_config::{Config, ReadMode};
use probe_traits::{Fan, Probe};

/// Open the probe at `address`/`register` on the configured bus.
#[cfg(all(feature = "hardware", target_os = "linux"))]
pub fn open_probe(
    cfg: &Config,
    address: u16,
    register: u8,
    mode: ReadMode,
) -> Result<Box<dyn Probe>> {
    use eyre::WrapErr;
    use probe_hardware::hardware::{I2cProbe, ReadMode as HwMode};

    let hw_mode = match mode {
        ReadMode::Block => HwMode::Block,
        ReadMode::Word => HwMode::Word,
    };
    let probe = I2cProbe::new(cfg.bus.bus, address, register, hw_mode).wrap_err_with(|| {
        format!("open i2c probe (bus {}, address 0x{address:02x})", cfg.bus.bus)
    })?;
    tracing::info!(bus = cfg.bus.bus, address, register, ?mode, "i2c probe opened");
    Ok(Box::new(probe))
}

#[cfg(not(all(feature = "hardware", target_os = "linux")))]
pub fn open_probe(
    cfg: &Config,
    address: u16,
    register: u8,
    mode: ReadMode,
) -> Result<Box<dyn Probe>> {
    let probe = sim_probe_from_env()?;
    tracing::info!(
        bus = cfg.bus.bus,
        address,
        register,
        ?mode,
        "simulated probe opened"
    );
    Ok(Box::new(probe))
}

/// Open the probe described by `[bus]`.
pub fn open_default_probe(cfg: &Config) -> Result<Box<dyn Probe>> {
    open_probe(cfg, cfg.bus.address, cfg.bus.register, cfg.bus.read_mode)
}

#[cfg(all(feature = "hardware", target_os = "linux"))]
pub fn open_fan(cfg: &Config) -> Result<Box<dyn Fan>> {
    use eyre::WrapErr;
    let fan = probe_hardware::hardware::PwmFan::new(cfg.fan.channel, cfg.fan.frequency_hz)
        .wrap_err_with(|| format!("open pwm channel {}", cfg.fan.channel))?;
    Ok(Box::new(fan))
}

#[cfg(not(all(feature = "hardware", target_os = "linux")))]
pub fn open_fan(cfg: &Config) -> Result<Box<dyn Fan>> {
    tracing::info!(channel = cfg.fan.channel, "simulated fan opened");
    Ok(Box::new(probe_hardware::SimulatedFan::new()))
}

#[cfg(not(all(feature = "hardware", target_os = "linux")))]
fn sim_probe_from_env() -> Result<probe_hardware::SimulatedProbe> {
    let base = env_u16("PROBE_SIM_RAW")?.unwrap_or(0x0190);
    let mut probe = probe_hardware::SimulatedProbe::new(base);
    if let Some(n) = env_u16("PROBE_SIM_STEP")? {
        probe = probe.with_step_every(u32::from(n));
    }
    if let Some(n) = env_u16("PROBE_SIM_FAIL_EVERY")? {
        probe = probe.with_fail_every(u32::from(n));
    }
    if std::env::var("PROBE_SIM_FAIL").is_ok_and(|v| !v.is_empty() && v != "0") {
        probe = probe.failing();
    }
    Ok(probe)
}

#[cfg(not(all(feature = "hardware", target_os = "linux")))]
fn env_u16(key: &str) -> Result<Option<u16>> {
    let Ok(v) = std::env::var(key) else {
        return Ok(None);
    };
    parse_u16(&v)
        .map(Some)
        .ok_or_else(|| eyre::eyre!("{key}={v:?} is not a 16-bit number"))
}

/// Decimal or `0x`-prefixed hex.
#[cfg_attr(all(feature = "hardware", target_os = "linux"), allow(dead_code))]
pub(crate) fn parse_u16(s: &str) -> Option<u16> {
    let t = s.trim();
    match t.strip_prefix("0x").or_else(|| t.strip_prefix("0X")) {
        Some(hex) => u16::from_str_radix(hex, 16).ok(),
        None => t.parse().ok(),
    }
}

#[cfg(test)]
mod tests {
    use super::parse_u16;

    #[test]
    fn parses_hex_and_decimal() {
        assert_eq!(parse_u16("0x0190"), Some(400));
        assert_eq!(parse_u16(" 400 "), Some(400));
        assert_eq!(parse_u16("0x10000"), None);
        assert_eq!(parse_u16("abc"), None);
    }
}
