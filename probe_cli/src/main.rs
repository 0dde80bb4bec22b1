mod cli;
mod commands;
mod error_fmt;
mod hw;

use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use clap::Parser;
use eyre::{Result, WrapErr};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, Layer, fmt, prelude::*};

use crate::cli::{Cli, Commands};
use crate::commands::{CalibrateArgs, Ctx, DecodeArgs, FanArgs};

fn main() {
    let cli = Cli::parse();
    let _ = color_eyre::install();

    let cfg = load_config(&cli.config);
    let guard = init_tracing(&cli, cfg.as_ref().ok().map(|c| &c.logging));
    let json = cli.json;

    let result = cfg.and_then(|cfg| run(cli, cfg));
    if let Err(e) = result {
        tracing::error!(error = %format!("{e:#}"), "command failed");
        if json {
            println!("{}", error_fmt::format_error_json(&e));
        } else {
            eprintln!("{}", error_fmt::humanize(&e));
        }
        let code = error_fmt::exit_code_for_error(&e);
        // Flush the file sink; process::exit skips destructors.
        drop(guard);
        std::process::exit(code);
    }
}

fn load_config(path: &Path) -> Result<probe_config::Config> {
    let text = std::fs::read_to_string(path)
        .wrap_err_with(|| format!("read config {}", path.display()))?;
    let cfg = probe_config::load_toml(&text)
        .wrap_err_with(|| format!("parse config {}", path.display()))?;
    cfg.validate().wrap_err("invalid config")?;
    Ok(cfg)
}

/// Console layer on stderr (text or JSON) plus the optional `[logging]` file sink.
fn init_tracing(cli: &Cli, logging: Option<&probe_config::Logging>) -> Option<WorkerGuard> {
    let console_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&cli.log_level))
        .unwrap_or_else(|_| EnvFilter::new("warn"));
    let console = if cli.json {
        fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .with_filter(console_filter)
            .boxed()
    } else {
        fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(false)
            .with_filter(console_filter)
            .boxed()
    };
    let mut layers = vec![console];

    let mut guard = None;
    if let Some((l, file)) = logging.and_then(|l| l.file.as_deref().map(|f| (l, f))) {
        let path = Path::new(file);
        let dir = path
            .parent()
            .filter(|d| !d.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        let name = path
            .file_name()
            .map_or_else(|| "probe.log".into(), |n| n.to_os_string());
        let appender = match l.rotation.as_deref() {
            Some("daily") => tracing_appender::rolling::daily(dir, name),
            Some("hourly") => tracing_appender::rolling::hourly(dir, name),
            _ => tracing_appender::rolling::never(dir, name),
        };
        let (writer, g) = tracing_appender::non_blocking(appender);
        guard = Some(g);
        let file_filter =
            EnvFilter::try_new(l.level.as_deref().unwrap_or("info")).unwrap_or_else(|_| EnvFilter::new("info"));
        layers.push(
            fmt::layer()
                .json()
                .with_ansi(false)
                .with_writer(writer)
                .with_filter(file_filter)
                .boxed(),
        );
    }

    let _ = tracing_subscriber::registry().with(layers).try_init();
    guard
}

fn run(cli: Cli, cfg: probe_config::Config) -> Result<()> {
    let shutdown = Arc::new(AtomicBool::new(false));
    {
        let flag = Arc::clone(&shutdown);
        if let Err(e) = ctrlc::set_handler(move || flag.store(true, Ordering::Relaxed)) {
            tracing::warn!(error = %e, "failed to install Ctrl-C handler");
        }
    }
    let ctx = Ctx {
        cfg,
        json: cli.json,
        shutdown,
    };
    tracing::debug!(command = ?cli.cmd, "dispatch");

    match cli.cmd {
        Commands::Sample {
            samples,
            trim,
            interval_ms,
            scale_divisor,
        } => commands::sample(&ctx, samples, trim, interval_ms, scale_divisor),
        Commands::Calibrate {
            references,
            points,
            save_points,
            scale_divisor,
            no_prompt,
        } => commands::calibrate(
            &ctx,
            &CalibrateArgs {
                references: &references,
                points: points.as_deref(),
                save_points: save_points.as_deref(),
                scale_divisor,
                no_prompt,
            },
        ),
        Commands::Decode {
            bytes,
            scales,
            expected_f,
            tolerance_f,
            plausible_only,
        } => {
            let bytes = bytes.and_then(|b| <[u8; 2]>::try_from(b).ok());
            commands::decode(
                &ctx,
                &DecodeArgs {
                    bytes,
                    scales: &scales,
                    expected_f,
                    tolerance_f,
                    plausible_only,
                },
            )
        }
        Commands::Explore => commands::explore(&ctx),
        Commands::Rate { duration_ms } => commands::rate(&ctx, duration_ms),
        Commands::Read { count, interval_ms } => commands::read(&ctx, count, interval_ms),
        Commands::Log {
            out,
            samples,
            interval_ms,
        } => commands::log(&ctx, &out, samples, interval_ms),
        Commands::Fan {
            percent,
            ramp,
            step,
            step_ms,
            hold_ms,
        } => commands::fan(
            &ctx,
            &FanArgs {
                percent,
                ramp,
                step,
                step_ms,
                hold_ms,
            },
        ),
        Commands::SelfCheck => commands::self_check(&ctx),
    }
}
