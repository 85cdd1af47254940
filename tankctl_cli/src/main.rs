mod cli;
mod drive;
mod error_fmt;

use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use clap::Parser;
use eyre::WrapErr;
use serde_json::json;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, Registry, fmt};

use crate::cli::{Cli, Commands, FILE_GUARD, JSON_MODE};
use crate::drive::{Guard, Motion, Outcome};
use crate::error_fmt::{exit_code_for_error, format_error_json, humanize};

fn main() {
    let cli = Cli::parse();
    let _ = JSON_MODE.set(cli.json);
    if let Err(e) = color_eyre::install() {
        eprintln!("failed to install color-eyre: {e}");
    }

    let code = match run(cli) {
        Ok(()) => 0,
        Err(e) => {
            tracing::error!(error = %e, "run failed");
            if JSON_MODE.get().copied().unwrap_or(false) {
                eprintln!("{}", format_error_json(&e));
            } else {
                eprintln!("{}", humanize(&e));
            }
            exit_code_for_error(&e)
        }
    };
    std::process::exit(code);
}

fn run(cli: Cli) -> eyre::Result<()> {
    let cfg = load_config(&cli.config)?;
    init_tracing(cli.json, &cli.log_level, &cfg.logging)?;
    cfg.validate().wrap_err("invalid configuration")?;
    tracing::debug!(config = %cli.config.display(), "configuration loaded");

    let shutdown = Arc::new(AtomicBool::new(false));
    let flag = shutdown.clone();
    ctrlc::set_handler(move || {
        flag.store(true, Ordering::Relaxed);
    })
    .wrap_err("install Ctrl-C handler")?;

    let guard = Guard {
        shutdown,
        max_run_ms: cli.max_run_ms,
    };

    match cli.cmd {
        Commands::Move { meters } => {
            let out = drive::run_chassis(&cfg, Motion::Distance { meters }, &guard)?;
            report(cli.json, &out);
        }
        Commands::Turn { degrees } => {
            let out = drive::run_chassis(&cfg, Motion::Angle { degrees }, &guard)?;
            report(cli.json, &out);
        }
        Commands::Hold { ticks } => {
            let out = drive::run_hold(&cfg, ticks, &guard)?;
            report(cli.json, &out);
        }
        Commands::SelfCheck => {
            let s = drive::scales(&cfg)?;
            if cli.json {
                println!(
                    "{}",
                    json!({
                        "command": "self-check",
                        "ok": true,
                        "tpr": s.tpr(),
                        "straight": s.straight(),
                        "turn": s.turn(),
                        "middle": s.middle(),
                    })
                );
            } else {
                println!(
                    "self-check ok: tpr={} straight={:.3} ticks/m turn={:.4} middle={:.3} ticks/m",
                    s.tpr(),
                    s.straight(),
                    s.turn(),
                    s.middle()
                );
            }
        }
    }
    Ok(())
}

fn load_config(path: &Path) -> eyre::Result<tankctl_config::Config> {
    let text = std::fs::read_to_string(path)
        .wrap_err_with(|| format!("read config {}", path.display()))?;
    tankctl_config::load_toml(&text).wrap_err("parse config TOML")
}

fn report(json_mode: bool, out: &Outcome) {
    if json_mode {
        println!(
            "{}",
            json!({
                "command": out.command,
                "status": "complete",
                "target_ticks": out.target_ticks,
                "left": out.left,
                "right": out.right,
                "elapsed_ms": out.elapsed_ms,
            })
        );
    } else {
        println!(
            "{} complete: target={:.1} ticks left={:.1} right={:.1} ({} ms)",
            out.command, out.target_ticks, out.left, out.right, out.elapsed_ms
        );
    }
}

fn init_tracing(json: bool, level: &str, logging: &tankctl_config::Logging) -> eyre::Result<()> {
    let console_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let mut layers: Vec<Box<dyn Layer<Registry> + Send + Sync>> = Vec::new();
    if json {
        layers.push(
            fmt::layer()
                .json()
                .with_writer(std::io::stderr)
                .with_filter(console_filter)
                .boxed(),
        );
    } else {
        layers.push(
            fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr)
                .with_filter(console_filter)
                .boxed(),
        );
    }

    if let Some(path) = logging.file.as_deref() {
        let path = Path::new(path);
        let dir = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        let name = path
            .file_name()
            .ok_or_else(|| eyre::eyre!("logging.file has no file name"))?;
        let appender = match logging.rotation.as_deref() {
            Some("daily") => tracing_appender::rolling::daily(dir, name),
            Some("hourly") => tracing_appender::rolling::hourly(dir, name),
            _ => tracing_appender::rolling::never(dir, name),
        };
        let (writer, guard) = tracing_appender::non_blocking(appender);
        let _ = FILE_GUARD.set(guard);
        let file_level = logging.level.as_deref().unwrap_or("info");
        layers.push(
            fmt::layer()
                .json()
                .with_ansi(false)
                .with_writer(writer)
                .with_filter(EnvFilter::new(file_level))
                .boxed(),
        );
    }

    tracing_subscriber::registry()
        .with(layers)
        .try_init()
        .wrap_err("initialise tracing")?;
    Ok(())
}
