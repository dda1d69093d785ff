use anyhow::Result;
use chrono::Local;
use std::fmt;
use std::fs::File;
use tracing::level_filters::LevelFilter;
use tracing_indicatif::IndicatifLayer;
use tracing_subscriber::fmt::{format::Writer, time::FormatTime};
use tracing::Subscriber;
use tracing_subscriber::{filter::Targets, fmt as tfmt, prelude::*, registry};

use crate::cli::Cli;
use crate::config::default::DEFAULT_LOG_FILE_NAME;

/// Full local timestamp for the log file, one line per event
struct FileTimestamp;

impl FormatTime for FileTimestamp {
    fn format_time(&self, w: &mut Writer<'_>) -> fmt::Result {
        write!(w, "{}", Local::now().format("%Y-%m-%dT%H:%M:%S%.3f%:z"))
    }
}

/// Wall clock only, for the console
struct ConsoleTimestamp;

impl FormatTime for ConsoleTimestamp {
    fn format_time(&self, w: &mut Writer<'_>) -> fmt::Result {
        write!(w, "{}", Local::now().format("%H:%M:%S%.3f"))
    }
}

/// Open (append) the log file: `--log-file-path` or `~/.rtspscan/rtspscan.log`.
fn open_log_file(cli_args: &Cli) -> Result<File> {
    let log_file_path = match &cli_args.log_file_path {
        Some(path) => path.clone(),
        None => crate::config::get_user_file_path(DEFAULT_LOG_FILE_NAME)?,
    };
    let file = File::options()
        .create(true)
        .append(true)
        .open(&log_file_path)?;
    Ok(file)
}

fn crate_filter(level: LevelFilter) -> Targets {
    Targets::new()
        .with_default(LevelFilter::OFF)
        .with_target("rtspscan", level)
}

/// Build the subscriber for the given command-line arguments.
///
/// The console layer (with progress bars) is skipped with `--no-stdout`.
/// The file layer is added with `--log-file`, and always with `--no-stdout`.
fn build_subscriber(cli_args: &Cli) -> Result<impl Subscriber + Send + Sync + 'static> {
    let level: LevelFilter = cli_args.effective_log_level().to_level_filter().into();

    let (indicatif_layer, console_layer) = if cli_args.no_stdout {
        (None, None)
    } else {
        let indicatif_layer = IndicatifLayer::new();
        let console_level = if cli_args.quiet { LevelFilter::ERROR } else { level };
        // Console output shares stderr with the progress bars
        let console_layer = tfmt::layer()
            .with_target(false)
            .with_timer(ConsoleTimestamp)
            .with_writer(indicatif_layer.get_stderr_writer())
            .with_filter(crate_filter(console_level));
        (Some(indicatif_layer), Some(console_layer))
    };

    let file_layer = if cli_args.log_file || cli_args.no_stdout {
        let file = open_log_file(cli_args)?;
        Some(
            tfmt::layer()
                .with_ansi(false)
                .with_target(false)
                .with_timer(FileTimestamp)
                .with_writer(file)
                .with_filter(crate_filter(level)),
        )
    } else {
        None
    };

    Ok(registry()
        .with(indicatif_layer)
        .with(console_layer)
        .with(file_layer))
}

/// Initialize the logger based on command-line arguments.
pub fn init_logger(cli_args: &Cli) -> Result<()> {
    build_subscriber(cli_args)?.init();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn file_only_logging_writes_crate_events() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scan.log");
        let cli = Cli::try_parse_from([
            "rtspscan",
            "--no-stdout",
            "--log-file-path",
            path.to_str().unwrap(),
        ])
        .unwrap();

        let subscriber = build_subscriber(&cli).unwrap();
        tracing::subscriber::with_default(subscriber, || {
            tracing::info!("file log line");
            tracing::debug!("filtered out at info");
        });

        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.contains("file log line"));
        assert!(!text.contains("filtered out"));
        assert!(!text.contains('\u{1b}'));
    }

    #[test]
    fn console_and_file_stacks_build() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("both.log");
        let path = path.to_str().unwrap();
        for args in [
            vec!["rtspscan"],
            vec!["rtspscan", "--quiet"],
            vec!["rtspscan", "--log-file", "--log-file-path", path],
            vec!["rtspscan", "--quiet", "--log-file", "--log-file-path", path],
        ] {
            let cli = Cli::try_parse_from(args).unwrap();
            assert!(build_subscriber(&cli).is_ok());
        }
        assert!(std::path::Path::new(path).exists());
    }
}
