//! Subcommand implementations. Each one drives a single core component
//! (or the fan) against the configured backend.

use std::io::{BufRead, Write};
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use crossbeam_channel as xch;
use eyre::{Result, WrapErr};
use probe_config::{Config, PersistedCalibration, PointRow, ReadMode};
use probe_core::{
    BuildError, ByteOrder, CalibrationModel, CalibrationPoint, DecodeCfg, DecodingCandidate,
    HypothesisDecoder, ProbeError, RateCfg, RawSampler, SamplerCfg, ScaleHypothesis, Signedness,
    TrimmedAverage, UpdateRateEstimator, UpdateRateSample,
};
use probe_traits::clock::{Clock, MonotonicClock};
use serde_json::json;

use crate::error_fmt::backend_report;
use crate::hw;

/// State shared by every subcommand.
pub struct Ctx {
    pub cfg: Config,
    pub json: bool,
    pub shutdown: Arc<AtomicBool>,
}

impl Ctx {
    fn cancelled(&self) -> bool {
        self.shutdown.load(Ordering::Relaxed)
    }

    fn cancel_flag(&self) -> impl Fn() -> bool + 'static {
        let flag = Arc::clone(&self.shutdown);
        move || flag.load(Ordering::Relaxed)
    }

    fn sampler(
        &self,
        samples: Option<usize>,
        trim: Option<usize>,
        interval_ms: Option<u64>,
    ) -> Result<RawSampler<MonotonicClock>> {
        let mut cfg = SamplerCfg::try_from(&self.cfg.sampling)?;
        if let Some(n) = samples {
            if n == 0 {
                return Err(BuildError::InvalidConfig("--samples must be >= 1").into());
            }
            cfg.samples = n;
        }
        if let Some(t) = trim {
            cfg.trim = t;
        }
        if let Some(ms) = interval_ms {
            cfg.interval = Duration::from_millis(ms);
        }
        Ok(RawSampler::new(cfg, MonotonicClock::new()).with_cancel(self.cancel_flag()))
    }

    fn decoder(
        &self,
        scales: &[(String, f64)],
        expected_f: Option<f64>,
        tolerance_f: Option<f64>,
    ) -> Result<HypothesisDecoder> {
        let mut cfg = if scales.is_empty() {
            DecodeCfg::try_from(&self.cfg.decode)?
        } else {
            DecodeCfg {
                scales: scales
                    .iter()
                    .map(|(name, div)| ScaleHypothesis::new(name.clone(), *div))
                    .collect(),
                expected_f: self.cfg.decode.expected_f,
                tolerance_f: self.cfg.decode.tolerance_f,
            }
        };
        if let Some(f) = expected_f {
            cfg.expected_f = f;
        }
        if let Some(t) = tolerance_f {
            if !(t.is_finite() && t >= 0.0) {
                return Err(BuildError::InvalidConfig("--tolerance-f must be >= 0").into());
            }
            cfg.tolerance_f = t;
        }
        Ok(HypothesisDecoder::new(cfg))
    }

    /// Sleep in short slices so Ctrl-C is noticed promptly.
    fn pause(&self, clock: &MonotonicClock, total: Duration) {
        let start = clock.now();
        while !self.cancelled() {
            let left = total.saturating_sub(clock.now().saturating_duration_since(start));
            if left.is_zero() {
                break;
            }
            clock.sleep(left.min(POLL_SLICE));
        }
    }

    /// Block until the operator presses Enter, or fail with `Cancelled` on
    /// Ctrl-C. The read runs on its own thread because `read_line` is not
    /// interrupted by the signal.
    fn wait_for_enter(&self) -> Result<()> {
        let (tx, rx) = xch::bounded(1);
        std::thread::spawn(move || {
            let mut line = String::new();
            let _ = tx.send(std::io::stdin().lock().read_line(&mut line));
        });
        loop {
            if self.cancelled() {
                return Err(ProbeError::Cancelled { attempted: 0 }.into());
            }
            match rx.recv_timeout(POLL_SLICE) {
                Ok(Ok(0)) => eyre::bail!("stdin closed before confirmation"),
                Ok(read) => {
                    read.wrap_err("read confirmation from stdin")?;
                    return Ok(());
                }
                Err(xch::RecvTimeoutError::Timeout) => {}
                Err(xch::RecvTimeoutError::Disconnected) => {
                    eyre::bail!("stdin reader stopped before confirmation")
                }
            }
        }
    }
}

const POLL_SLICE: Duration = Duration::from_millis(50);

// ── sample ───────────────────────────────────────────────────────────────────

pub fn sample(
    ctx: &Ctx,
    samples: Option<usize>,
    trim: Option<usize>,
    interval_ms: Option<u64>,
    scale_divisor: Option<f64>,
) -> Result<()> {
    let sampler = ctx.sampler(samples, trim, interval_ms)?;
    let mut probe = hw::open_default_probe(&ctx.cfg)?;
    let divisor = checked_divisor(scale_divisor)?;
    let avg = match divisor {
        Some(d) => sampler.sample(|| probe.read_raw().map(|raw| f64::from(raw) / d))?,
        None => sampler.sample_probe(probe.as_mut())?,
    };
    let unit = if divisor.is_some() { "°C" } else { "counts" };
    if ctx.json {
        println!("{}", average_json(&avg, unit));
    } else {
        println!("Average: {:.3} {unit} ({})", avg.mean, average_summary(&avg));
    }
    Ok(())
}

fn checked_divisor(d: Option<f64>) -> Result<Option<f64>> {
    match d {
        Some(d) if !(d.is_finite() && d > 0.0) => {
            Err(BuildError::InvalidConfig("--scale-divisor must be finite and > 0").into())
        }
        other => Ok(other),
    }
}

fn average_summary(avg: &TrimmedAverage) -> String {
    let mut s = format!(
        "{} of {} reads valid, {} discarded as extremes",
        avg.valid,
        avg.attempted,
        avg.discarded()
    );
    if avg.low_confidence {
        s.push_str(", LOW CONFIDENCE: too few readings to trim");
    }
    s
}

fn average_json(avg: &TrimmedAverage, unit: &str) -> serde_json::Value {
    json!({
        "mean": avg.mean,
        "unit": unit,
        "attempted": avg.attempted,
        "valid": avg.valid,
        "discarded": avg.discarded(),
        "low_confidence": avg.low_confidence,
    })
}

// ── calibrate ────────────────────────────────────────────────────────────────

pub struct CalibrateArgs<'a> {
    pub references: &'a [f64],
    pub points: Option<&'a Path>,
    pub save_points: Option<&'a Path>,
    pub scale_divisor: Option<f64>,
    pub no_prompt: bool,
}

pub fn calibrate(ctx: &Ctx, args: &CalibrateArgs<'_>) -> Result<()> {
    let points: Vec<CalibrationPoint> = if let Some(path) = args.points {
        let rows = probe_config::load_points_csv(path)?;
        tracing::info!(rows = rows.len(), path = %path.display(), "loaded calibration points");
        rows.iter().map(CalibrationPoint::from).collect()
    } else {
        capture_points(ctx, args)?
    };

    if let Some(path) = args.save_points {
        let rows: Vec<PointRow> = points.iter().copied().map(PointRow::from).collect();
        probe_config::save_points_csv(path, &rows)?;
        tracing::info!(path = %path.display(), "saved calibration points");
    }

    let model = probe_core::fit(&points)?;
    report_model(ctx, &model, &points);
    Ok(())
}

fn capture_points(ctx: &Ctx, args: &CalibrateArgs<'_>) -> Result<Vec<CalibrationPoint>> {
    let references: &[f64] = if args.references.is_empty() {
        &[0.0, 100.0]
    } else {
        args.references
    };
    let divisor = checked_divisor(args.scale_divisor)?;
    let sampler = ctx.sampler(None, None, None)?;
    let mut probe = hw::open_default_probe(&ctx.cfg)?;
    let mut points = Vec::with_capacity(references.len());
    tracing::info!(
        references = references.len(),
        samples = sampler.cfg().samples,
        trim = sampler.cfg().trim,
        "capturing calibration points"
    );

    for &reference in references {
        if !args.no_prompt {
            eprint!("Set the probe to {reference} and press Enter when stable... ");
            std::io::stderr().flush().ok();
            ctx.wait_for_enter()?;
        }
        let avg = match divisor {
            Some(d) => sampler.sample(|| probe.read_raw().map(|raw| f64::from(raw) / d))?,
            None => sampler.sample_probe(probe.as_mut())?,
        };
        eprintln!(
            "  reference {reference}: measured {:.3} ({})",
            avg.mean,
            average_summary(&avg)
        );
        points.push(CalibrationPoint::new(avg.mean, reference));
    }
    Ok(points)
}

fn report_model(ctx: &Ctx, model: &CalibrationModel, points: &[CalibrationPoint]) {
    let rms = model.rms_residual(points);
    if ctx.json {
        let (slope, offset) = model.as_pair();
        let pts: Vec<_> = points
            .iter()
            .map(|p| json!({ "measured": p.measured, "reference": p.reference }))
            .collect();
        println!(
            "{}",
            json!({
                "slope": slope,
                "offset": offset,
                "rms_residual": rms,
                "points": pts,
            })
        );
        return;
    }
    println!("Calibration model: {model}");
    println!("RMS residual: {rms:.4}");
    println!("Calibration data points:");
    for p in points {
        println!(
            "  measured {:>12.4} -> reference {:>10.4} (model {:>10.4})",
            p.measured,
            p.reference,
            model.apply(p.measured)
        );
    }
    println!();
    println!("Add to your config to apply it in `probe read`:");
    let mut doc = toml::Table::new();
    match toml::Value::try_from(PersistedCalibration::from(*model)) {
        Ok(v) => {
            doc.insert("calibration".to_string(), v);
            print!("{doc}");
        }
        Err(e) => tracing::warn!(error = %e, "could not render calibration snippet"),
    }
}

// ── decode / explore ─────────────────────────────────────────────────────────

pub struct DecodeArgs<'a> {
    pub bytes: Option<[u8; 2]>,
    pub scales: &'a [(String, f64)],
    pub expected_f: Option<f64>,
    pub tolerance_f: Option<f64>,
    pub plausible_only: bool,
}

pub fn decode(ctx: &Ctx, args: &DecodeArgs<'_>) -> Result<()> {
    let decoder = ctx.decoder(args.scales, args.expected_f, args.tolerance_f)?;
    let bytes = match args.bytes {
        Some(b) => b,
        None => {
            let mut probe = hw::open_default_probe(&ctx.cfg)?;
            probe
                .read_bytes()
                .map_err(backend_report)
                .wrap_err("read probe")?
        }
    };
    let candidates = decoder.decode(bytes);
    print_candidates(ctx, &decoder, bytes, &candidates, args.plausible_only, None);
    Ok(())
}

pub fn explore(ctx: &Ctx) -> Result<()> {
    let decoder = ctx.decoder(&[], None, None)?;
    let mut ok = 0usize;
    let mut failed = 0usize;

    for address in ctx.cfg.explore_addresses() {
        for &register in &ctx.cfg.explore.registers {
            for transfer in Transfer::ALL {
                if ctx.cancelled() {
                    return Err(ProbeError::Cancelled {
                        attempted: ok + failed,
                    }
                    .into());
                }
                let at = Location {
                    address,
                    register,
                    transfer,
                };
                match explore_one(ctx, &decoder, at) {
                    Ok(()) => ok += 1,
                    Err(e) => {
                        failed += 1;
                        tracing::debug!(
                            address,
                            register,
                            transfer = at.transfer_str(),
                            error = %e,
                            "explore read failed"
                        );
                        if ctx.json {
                            println!("{}", json!({ "location": at.to_json(), "error": format!("{e:#}") }));
                        } else {
                            println!("{at}: read failed: {e:#}");
                        }
                    }
                }
            }
        }
    }
    if !ctx.json {
        println!("Explored {} combinations: {ok} read, {failed} failed.", ok + failed);
    }
    Ok(())
}

/// Pair reads are decoded; the single byte is shown as-is.
fn explore_one(ctx: &Ctx, decoder: &HypothesisDecoder, at: Location) -> Result<()> {
    match at.transfer {
        Transfer::Pair(mode) => {
            let mut probe = hw::open_probe(&ctx.cfg, at.address, at.register, mode)?;
            let bytes = probe.read_bytes().map_err(backend_report)?;
            let candidates = decoder.decode(bytes);
            print_candidates(ctx, decoder, bytes, &candidates, false, Some(at));
        }
        Transfer::Byte => {
            let mut probe =
                hw::open_probe(&ctx.cfg, at.address, at.register, ctx.cfg.bus.read_mode)?;
            let b = probe.read_byte().map_err(backend_report)?;
            if ctx.json {
                println!("{}", json!({ "location": at.to_json(), "byte": b }));
            } else {
                println!("{at}: 0x{b:02x} ({b})");
            }
        }
    }
    Ok(())
}

/// How one explore read is fetched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Transfer {
    Pair(ReadMode),
    Byte,
}

impl Transfer {
    const ALL: [Transfer; 3] = [
        Transfer::Pair(ReadMode::Block),
        Transfer::Pair(ReadMode::Word),
        Transfer::Byte,
    ];
}

#[derive(Debug, Clone, Copy)]
struct Location {
    address: u16,
    register: u8,
    transfer: Transfer,
}

impl Location {
    fn transfer_str(self) -> &'static str {
        match self.transfer {
            Transfer::Pair(ReadMode::Block) => "block",
            Transfer::Pair(ReadMode::Word) => "word",
            Transfer::Byte => "byte",
        }
    }

    fn to_json(self) -> serde_json::Value {
        json!({ "address": self.address, "register": self.register, "mode": self.transfer_str() })
    }
}

impl std::fmt::Display for Location {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "addr 0x{:02x} reg 0x{:02x} {}",
            self.address,
            self.register,
            self.transfer_str()
        )
    }
}

fn print_candidates(
    ctx: &Ctx,
    decoder: &HypothesisDecoder,
    bytes: [u8; 2],
    candidates: &[DecodingCandidate],
    plausible_only: bool,
    at: Option<Location>,
) {
    let shown = candidates.iter().filter(|c| !plausible_only || c.plausible);
    if ctx.json {
        for c in shown {
            let mut obj = candidate_json(c);
            obj["bytes"] = json!([bytes[0], bytes[1]]);
            if let Some(at) = at {
                obj["location"] = at.to_json();
            }
            println!("{obj}");
        }
        return;
    }

    let cfg = decoder.cfg();
    if let Some(at) = at {
        println!("== {at} ==");
    }
    println!(
        "bytes 0x{:02x} 0x{:02x} | expecting {:.1} °F ± {:.1}",
        bytes[0], bytes[1], cfg.expected_f, cfg.tolerance_f
    );
    for c in shown {
        println!(
            "  {:<8} {:<8} {:<10} raw 0x{:04x} value {:>6} -> {:>9.3} °C {:>9.3} °F{}",
            c.byte_order,
            c.signedness,
            c.scale_name,
            c.raw,
            c.value,
            c.celsius,
            c.fahrenheit,
            if c.plausible { "  <== plausible" } else { "" }
        );
    }
    if candidates.iter().all(|c| !c.plausible) {
        println!("  (no plausible candidate)");
    }
}

fn candidate_json(c: &DecodingCandidate) -> serde_json::Value {
    json!({
        "byte_order": c.byte_order.as_str(),
        "signedness": c.signedness.as_str(),
        "scale": c.scale_name,
        "divisor": c.scale_divisor,
        "raw": c.raw,
        "value": c.value,
        "celsius": c.celsius,
        "fahrenheit": c.fahrenheit,
        "plausible": c.plausible,
    })
}

// ── rate ─────────────────────────────────────────────────────────────────────

pub fn rate(ctx: &Ctx, duration_ms: Option<u64>) -> Result<()> {
    let mut cfg = RateCfg::from(&ctx.cfg.rate);
    if let Some(ms) = duration_ms {
        if ms == 0 {
            return Err(BuildError::InvalidConfig("--duration-ms must be >= 1").into());
        }
        cfg.window = Duration::from_millis(ms);
    }
    let mut probe = hw::open_default_probe(&ctx.cfg)?;
    if !ctx.json {
        eprintln!(
            "Polling for {:.1} s to detect value changes...",
            cfg.window.as_secs_f64()
        );
    }
    let est = UpdateRateEstimator::new(cfg, MonotonicClock::new()).with_cancel(ctx.cancel_flag());
    let sample = est.measure_probe(probe.as_mut())?;
    report_rate(ctx, &sample);
    Ok(())
}

fn report_rate(ctx: &Ctx, s: &UpdateRateSample) {
    if ctx.json {
        println!(
            "{}",
            json!({
                "changes": s.changes(),
                "mean_interval_s": s.mean_interval_s(),
                "rate_hz": s.rate_hz(),
                "min_interval_s": s.min_interval_s(),
                "max_interval_s": s.max_interval_s(),
                "attempted": s.attempted,
                "succeeded": s.succeeded,
                "poll_rate_hz": s.poll_rate_hz(),
            })
        );
        return;
    }
    println!("Value changes observed: {}", s.changes());
    println!("Average interval between changes: {:.4} s", s.mean_interval_s());
    println!(
        "Interval range: {:.4} s .. {:.4} s",
        s.min_interval_s(),
        s.max_interval_s()
    );
    println!("Effective update rate: {:.2} Hz", s.rate_hz());
    println!(
        "Polls: {} ({} succeeded, {:.0} polls/s)",
        s.attempted,
        s.succeeded,
        s.poll_rate_hz()
    );
}

// ── read ─────────────────────────────────────────────────────────────────────

pub fn read(ctx: &Ctx, count: Option<usize>, interval_ms: Option<u64>) -> Result<()> {
    let model = ctx.cfg.calibration.as_ref().map(CalibrationModel::from);
    if model.is_none() {
        tracing::info!("no [calibration] in config; printing raw counts only");
    }
    let interval = Duration::from_millis(interval_ms.unwrap_or(ctx.cfg.sampling.interval_ms));
    let mut probe = hw::open_default_probe(&ctx.cfg)?;
    let clock = MonotonicClock::new();
    let start = clock.now();
    let mut n = 0usize;

    while count.is_none_or(|c| n < c) && !ctx.cancelled() {
        if n > 0 {
            ctx.pause(&clock, interval);
            if ctx.cancelled() {
                break;
            }
        }
        n += 1;
        let elapsed = clock.secs_since(start);
        match probe.read_raw() {
            Ok(raw) => {
                let corrected = model.map(|m| m.apply(f64::from(raw)));
                if ctx.json {
                    println!(
                        "{}",
                        json!({ "t": elapsed, "raw": raw, "corrected": corrected })
                    );
                } else {
                    match corrected {
                        Some(c) => println!("[{elapsed:8.2}s] raw {raw:>5} | corrected {c:.2}"),
                        None => println!("[{elapsed:8.2}s] raw {raw:>5}"),
                    }
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "probe read failed");
                if ctx.json {
                    println!("{}", json!({ "t": elapsed, "error": e.to_string() }));
                } else {
                    eprintln!("[{elapsed:8.2}s] read failed: {e}");
                }
            }
        }
    }
    if ctx.cancelled() && !ctx.json {
        eprintln!("Stopped after {n} reads.");
    }
    Ok(())
}

// ── log ──────────────────────────────────────────────────────────────────────

pub fn log(
    ctx: &Ctx,
    out: &Path,
    samples: Option<usize>,
    interval_ms: Option<u64>,
) -> Result<()> {
    let decoder = ctx.decoder(&[], None, None)?;
    let scales = decoder.cfg().scales.clone();
    let addresses = ctx.cfg.csv_addresses();
    let register = ctx.cfg.csv.register;
    let samples = samples.unwrap_or(ctx.cfg.csv.samples);
    let interval = Duration::from_millis(interval_ms.unwrap_or(ctx.cfg.csv.interval_ms));

    let mut probes = Vec::with_capacity(addresses.len());
    for &address in &addresses {
        probes.push(hw::open_probe(&ctx.cfg, address, register, ctx.cfg.bus.read_mode)?);
    }

    let mut wtr = csv::Writer::from_path(out)
        .wrap_err_with(|| format!("create {}", out.display()))?;
    wtr.write_record(log_header(&addresses, &scales))?;
    wtr.flush()?;

    let clock = MonotonicClock::new();
    let start = clock.now();
    let mut rows = 0usize;
    for i in 0..samples {
        if i > 0 {
            ctx.pause(&clock, interval);
        }
        if ctx.cancelled() {
            break;
        }
        let mut record = vec![format!("{:.3}", clock.secs_since(start))];
        for (probe, &address) in probes.iter_mut().zip(&addresses) {
            match probe.read_bytes() {
                Ok(bytes) => record.extend(log_fields(bytes, &decoder)),
                Err(e) => {
                    tracing::warn!(address, error = %e, "log read failed");
                    record.extend(std::iter::repeat_n(
                        "ERR".to_string(),
                        3 + 2 * scales.len(),
                    ));
                }
            }
        }
        wtr.write_record(&record)?;
        wtr.flush()?;
        rows += 1;
        tracing::info!(row = rows, "log row written");
    }

    if ctx.json {
        println!("{}", json!({ "rows": rows, "path": out.display().to_string() }));
    } else {
        println!("Wrote {rows} rows to {}", out.display());
    }
    Ok(())
}

fn log_header(addresses: &[u16], scales: &[ScaleHypothesis]) -> Vec<String> {
    let mut h = vec!["elapsed_s".to_string()];
    for a in addresses {
        let p = format!("addr_{a:02x}");
        h.push(format!("{p}_b0"));
        h.push(format!("{p}_b1"));
        h.push(format!("{p}_counts"));
        for s in scales {
            h.push(format!("{p}_c_{}", s.name));
            h.push(format!("{p}_f_{}", s.name));
        }
    }
    h
}

/// Bytes, signed as-read counts, then °C/°F under each scale.
fn log_fields(bytes: [u8; 2], decoder: &HypothesisDecoder) -> Vec<String> {
    let signed: Vec<DecodingCandidate> = decoder
        .decode(bytes)
        .into_iter()
        .filter(|c| c.byte_order == ByteOrder::AsRead && c.signedness == Signedness::Signed)
        .collect();
    let counts = signed
        .first()
        .map_or_else(String::new, |c| c.value.to_string());
    let mut fields = vec![bytes[0].to_string(), bytes[1].to_string(), counts];
    for c in &signed {
        fields.push(format!("{:.2}", c.celsius));
        fields.push(format!("{:.2}", c.fahrenheit));
    }
    fields
}

// ── fan ──────────────────────────────────────────────────────────────────────

pub struct FanArgs {
    pub percent: Option<f32>,
    pub ramp: bool,
    pub step: f32,
    pub step_ms: u64,
    pub hold_ms: u64,
}

pub fn fan(ctx: &Ctx, args: &FanArgs) -> Result<()> {
    if !args.ramp && args.percent.is_none() {
        eyre::bail!("fan needs --percent <P> or --ramp");
    }
    if args.ramp && !(args.step.is_finite() && args.step > 0.0 && args.step <= 100.0) {
        return Err(BuildError::InvalidConfig("--step must be within (0, 100]").into());
    }
    let mut fan = hw::open_fan(&ctx.cfg)?;
    let clock = MonotonicClock::new();

    let driven = drive_fan(ctx, fan.as_mut(), &clock, args);
    // The fan is stopped whether or not driving succeeded.
    let stopped = fan.stop().map_err(backend_report).wrap_err("stop fan");
    if !ctx.json {
        println!("Fan stopped.");
    }
    driven?;
    stopped
}

fn drive_fan(
    ctx: &Ctx,
    fan: &mut dyn probe_traits::Fan,
    clock: &MonotonicClock,
    args: &FanArgs,
) -> Result<()> {
    let mut set = |p: f32| -> Result<()> {
        fan.set_duty(p)
            .map_err(backend_report)
            .wrap_err_with(|| format!("set fan duty {p} %"))?;
        if ctx.json {
            println!("{}", json!({ "duty_percent": p }));
        } else {
            println!("Fan duty: {p:.0} %");
        }
        Ok(())
    };

    let final_duty = if args.ramp {
        let mut p = 0.0f32;
        loop {
            set(p)?;
            ctx.pause(clock, Duration::from_millis(args.step_ms));
            if ctx.cancelled() || p >= 100.0 {
                break;
            }
            p = (p + args.step).min(100.0);
        }
        100.0
    } else {
        let p = args.percent.unwrap_or_default();
        set(p)?;
        p
    };
    if !ctx.cancelled() && args.hold_ms > 0 {
        if !ctx.json {
            println!("Holding at {final_duty:.0} % for {} ms", args.hold_ms);
        }
        ctx.pause(clock, Duration::from_millis(args.hold_ms));
    }
    Ok(())
}

// ── self-check ───────────────────────────────────────────────────────────────

pub fn self_check(ctx: &Ctx) -> Result<()> {
    let mut probe = hw::open_default_probe(&ctx.cfg)?;
    let bytes = probe
        .read_bytes()
        .map_err(backend_report)
        .wrap_err("probe did not answer")?;
    let at = Location {
        address: ctx.cfg.bus.address,
        register: ctx.cfg.bus.register,
        transfer: Transfer::Pair(ctx.cfg.bus.read_mode),
    };
    if ctx.json {
        println!(
            "{}",
            json!({ "ok": true, "location": at.to_json(), "bytes": [bytes[0], bytes[1]] })
        );
    } else {
        println!("OK: {at} answered 0x{:02x} 0x{:02x}", bytes[0], bytes[1]);
    }
    Ok(())
}
