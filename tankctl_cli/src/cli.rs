//! CLI argument definitions and shared statics.

use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;
use std::sync::OnceLock;

pub static FILE_GUARD: OnceLock<tracing_appender::non_blocking::WorkerGuard> = OnceLock::new();
/// Whether the user asked for JSON output (controls structured error output).
pub static JSON_MODE: OnceLock<bool> = OnceLock::new();

#[derive(Parser, Debug)]
#[command(name = "tankctl", version, about = "Drive a simulated tank chassis")]
pub struct Cli {
    /// Path to config TOML
    #[arg(long, value_name = "FILE", default_value = "etc/tankctl.toml")]
    pub config: PathBuf,

    /// Log and report as JSON lines instead of pretty text
    #[arg(long, action = ArgAction::SetTrue)]
    pub json: bool,

    /// Console log level (error|warn|info|debug|trace)
    #[arg(long = "log-level", value_name = "LEVEL", default_value = "info")]
    pub log_level: String,

    /// Abort a move that has not settled after this many ms (0 disables)
    #[arg(long, value_name = "MS", default_value_t = 30_000)]
    pub max_run_ms: u64,

    /// Command to execute
    #[command(subcommand)]
    pub cmd: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Drive straight by a distance in meters (negative drives backwards)
    Move {
        #[arg(long, allow_negative_numbers = true)]
        meters: f64,
    },
    /// Point-turn by an angle in degrees (positive turns clockwise)
    Turn {
        #[arg(long, allow_negative_numbers = true)]
        degrees: f64,
    },
    /// Run a PID position loop on a single motor until it holds the target
    Hold {
        /// Target position in encoder ticks
        #[arg(long, allow_negative_numbers = true)]
        ticks: f64,
    },
    /// Validate the config and print the derived chassis scales
    SelfCheck,
}
