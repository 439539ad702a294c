//! CLI argument definitions for the ad slot diagnostics tool.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use clap_verbosity_flag::{Verbosity, WarnLevel};
use colorchoice_clap::Color;

#[derive(Parser)]
#[command(
    name = "adslot",
    version,
    about = "Ad slot diagnostics - inspect formats, render slots, exercise the script loader",
    long_about = "Inspect the ad format catalog, render slot markup for a host and viewport,\n\
                  and exercise the shared script loader with its retry policy."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Settings file (default: the platform config directory).
    #[arg(long = "config", value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,

    /// Adjust log verbosity (-v for info, -vv for debug, -q for errors only).
    #[command(flatten)]
    pub verbosity: Verbosity<WarnLevel>,

    /// Control ANSI color output (auto, always, never).
    #[command(flatten)]
    pub color: Color,

    /// Explicit log level (overrides -v/-q flags).
    #[arg(long = "log-level", value_enum, global = true)]
    pub log_level: Option<LogLevelArg>,

    /// Log output format (pretty for human, json for machine parsing).
    #[arg(
        long = "log-format",
        value_enum,
        default_value = "pretty",
        global = true
    )]
    pub log_format: LogFormatArg,

    /// Write logs to a file instead of stderr.
    #[arg(long = "log-file", value_name = "PATH", global = true)]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Command {
    /// List the supported ad formats.
    Formats,

    /// Print the dimensions a format resolves to.
    Resolve(ResolveArgs),

    /// Render one slot's markup for a host and viewport.
    Render(RenderArgs),

    /// Run the loader against a scripted failure sequence.
    Simulate(SimulateArgs),

    /// Load the live ad script once and report the outcome.
    Probe,
}

#[derive(Parser)]
pub struct ResolveArgs {
    /// Format key (e.g. rectangle, leaderboard).
    #[arg(value_name = "FORMAT")]
    pub format: String,

    /// Format used below the mobile breakpoint.
    #[arg(long = "mobile-format", value_name = "FORMAT")]
    pub mobile_format: Option<String>,

    /// Viewport width in pixels (desktop when omitted).
    #[arg(long = "viewport-width", value_name = "PX")]
    pub viewport_width: Option<u32>,
}

#[derive(Parser)]
pub struct RenderArgs {
    /// Page host name, with or without a port.
    #[arg(long = "host")]
    pub host: String,

    /// Ad unit id.
    #[arg(long = "slot-id", value_name = "ID")]
    pub slot_id: String,

    /// Format key.
    #[arg(long = "format", value_name = "FORMAT")]
    pub format: String,

    /// Format used below the mobile breakpoint.
    #[arg(long = "mobile-format", value_name = "FORMAT")]
    pub mobile_format: Option<String>,

    /// Viewport width in pixels.
    #[arg(long = "viewport-width", value_name = "PX", default_value_t = 1280)]
    pub viewport_width: u32,

    /// Caption shown inside the placeholder.
    #[arg(long = "label")]
    pub label: Option<String>,

    /// Give up waiting for the script after this many seconds.
    #[arg(long = "wait-secs", value_name = "SECS", default_value_t = 15)]
    pub wait_secs: u64,
}

#[derive(Parser)]
pub struct SimulateArgs {
    /// Number of attempts that fail before one succeeds.
    #[arg(long = "failures", default_value_t = 0)]
    pub failures: u32,

    /// Attempt cap (default: from settings).
    #[arg(long = "max-attempts")]
    pub max_attempts: Option<u32>,

    /// First retry delay in milliseconds.
    #[arg(long = "retry-base-ms", value_name = "MS", default_value_t = 100)]
    pub retry_base_ms: u64,
}

/// CLI log level choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogLevelArg {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// CLI log format choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogFormatArg {
    Pretty,
    Compact,
    Json,
}
