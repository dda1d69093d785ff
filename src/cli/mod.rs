pub mod host;
pub mod port;

use std::path::PathBuf;

use clap::builder::RangedU64ValueParser;
use clap::{value_parser, ArgAction, Args, Parser, ValueEnum};

use crate::config::default::{
    DEFAULT_ADDRESS, DEFAULT_CAPTURE_TIMEOUT_SECS, DEFAULT_CONNECT_TIMEOUT_MS, DEFAULT_CREDS,
    DEFAULT_FFMPEG_BIN, DEFAULT_HOST_CONCURRENCY, DEFAULT_PORTS, DEFAULT_PORTS_CONCURRENCY,
    DEFAULT_PROBE_CONCURRENCY, DEFAULT_RETRIES, DEFAULT_WHITESPACE,
};

/// rtspscan - RTSP camera discovery
#[derive(Parser, Debug)]
#[command(author, version, about = "rtspscan - Discover RTSP cameras by port scan and stream-path enumeration", long_about = None)]
pub struct Cli {
    /// Global log level
    #[arg(long, default_value = "info")]
    pub log_level: LogLevel,

    /// Log to file (in addition to stdout)
    #[arg(long, action = ArgAction::SetTrue, default_value_t = false)]
    pub log_file: bool,

    /// Log file path (default: ~/.rtspscan/rtspscan.log)
    #[arg(long, value_name = "FILE", value_parser = value_parser!(PathBuf))]
    pub log_file_path: Option<PathBuf>,

    /// Suppress non-error logs
    #[arg(long, action = ArgAction::SetTrue, default_value_t = false)]
    pub quiet: bool,

    /// Save result to a JSON file
    #[arg(short, long, value_name = "FILE", value_parser = value_parser!(PathBuf))]
    pub output: Option<PathBuf>,

    /// Suppress stdout output (use with --output)
    #[arg(long, action = ArgAction::SetTrue, default_value_t = false)]
    pub no_stdout: bool,

    #[command(flatten)]
    pub scan: ScanArgs,
}

impl Cli {
    /// Effective console log level. Verbose mode raises it to debug.
    pub fn effective_log_level(&self) -> LogLevel {
        if self.scan.verbose && self.log_level < LogLevel::Debug {
            LogLevel::Debug
        } else {
            self.log_level
        }
    }
}

/// Log level
#[derive(Copy, Clone, Debug, ValueEnum, Eq, PartialEq, Ord, PartialOrd)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    /// Convert to `tracing::Level`
    pub fn to_level_filter(&self) -> tracing::Level {
        match self {
            LogLevel::Error => tracing::Level::ERROR,
            LogLevel::Warn => tracing::Level::WARN,
            LogLevel::Info => tracing::Level::INFO,
            LogLevel::Debug => tracing::Level::DEBUG,
            LogLevel::Trace => tracing::Level::TRACE,
        }
    }
}

/// Scan arguments. Every option can also be set from the environment.
#[derive(Args, Debug, Clone)]
pub struct ScanArgs {
    /// Targets: IP, CIDR, hostname or @file, comma-separated
    #[arg(short, long, env = "RTSP_ADDRESS", default_value = DEFAULT_ADDRESS)]
    pub address: String,

    /// Ports to discover: "554,8554" | "554,8000-8010"
    #[arg(short, long, env = "RTSP_SCAN_PORTS", default_value = DEFAULT_PORTS)]
    pub ports: String,

    /// Per-attempt frame capture timeout in seconds
    #[arg(long, env = "FFMPEG_TIMEOUT", default_value_t = DEFAULT_CAPTURE_TIMEOUT_SECS, value_parser = value_parser!(u64).range(1..=600))]
    pub timeout: u64,

    /// Capture attempts per candidate, first attempt included
    #[arg(long, env = "FFMPEG_RETRIES", default_value_t = DEFAULT_RETRIES, value_parser = value_parser!(u32).range(1..=20))]
    pub retries: u32,

    /// Print every candidate check and attempt result
    #[arg(short, long, env = "RTSP_VERBOSE", action = ArgAction::SetTrue, value_parser = parse_verbose_flag)]
    pub verbose: bool,

    /// Substitute for '.' in displayed camera IP addresses
    #[arg(long, env = "RTSP_WHITESPACE", default_value_t = DEFAULT_WHITESPACE)]
    pub whitespace: char,

    /// Credentials as user:pass, comma-separated. "none" probes without credentials
    #[arg(short, long, env = "RTSP_CREDS", default_value = DEFAULT_CREDS)]
    pub creds: String,

    /// Frame capture executable
    #[arg(long, env = "FFMPEG_BIN", default_value = DEFAULT_FFMPEG_BIN, value_parser = value_parser!(PathBuf))]
    pub ffmpeg: PathBuf,

    /// Capture processes running at once
    #[arg(long, env = "RTSP_CONCURRENCY", default_value_t = DEFAULT_PROBE_CONCURRENCY, value_parser = RangedU64ValueParser::<usize>::new().range(1..=1024))]
    pub concurrency: usize,

    /// Capture processes per host at once
    #[arg(long, env = "RTSP_HOST_CONCURRENCY", default_value_t = DEFAULT_HOST_CONCURRENCY, value_parser = RangedU64ValueParser::<usize>::new().range(1..=64))]
    pub host_concurrency: usize,

    /// Port discovery concurrency
    #[arg(long, env = "RTSP_SCAN_CONCURRENCY", default_value_t = DEFAULT_PORTS_CONCURRENCY, value_parser = RangedU64ValueParser::<usize>::new().range(1..=4096))]
    pub scan_concurrency: usize,

    /// TCP connect timeout in ms for port discovery
    #[arg(long, env = "RTSP_CONNECT_TIMEOUT_MS", default_value_t = DEFAULT_CONNECT_TIMEOUT_MS, value_parser = value_parser!(u64).range(10..=10_000))]
    pub connect_timeout_ms: u64,

    /// Keep thumbnails of valid cameras in this directory
    #[arg(long, env = "RTSP_THUMBNAIL_DIR", value_name = "DIR", value_parser = value_parser!(PathBuf))]
    pub thumbnail_dir: Option<PathBuf>,

    /// Scan ports in user-specified order (default is randomized)
    #[arg(long, action = ArgAction::SetTrue)]
    pub ordered: bool,
}

/// Only a case-insensitive "true" turns verbose output on.
/// Anything else, "1" and "yes" included, leaves it off.
fn parse_verbose_flag(value: &str) -> Result<bool, std::convert::Infallible> {
    Ok(value.trim().eq_ignore_ascii_case("true"))
}
