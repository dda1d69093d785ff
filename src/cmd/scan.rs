use crate::{
    capture::{ffmpeg::FfmpegCapture, ScratchDir},
    cli::ScanArgs,
    db::path::path_catalog,
    matrix::{self, Credential},
    output::{tree::print_report_tree, Aggregator},
    probe::{pool::ProbePool, ProbeExecutor, ProbeSetting},
    scan::{TargetResolver, TcpConnectScanner},
    thumbnail::ImageThumbnailer,
    util::json::{save_json_output, JsonStyle},
};
use anyhow::{Context, Result};
use std::{path::PathBuf, sync::Arc, time::Duration};
use tokio_util::sync::CancellationToken;

/// Run RTSP discovery: port scan, matrix expansion, probing and reporting
pub async fn run(args: ScanArgs, no_stdout: bool, output: Option<PathBuf>) -> Result<()> {
    let credentials = Credential::parse_list(&args.creds);

    let version = crate::dep::check_ffmpeg(&args.ffmpeg).await?;
    tracing::debug!("Using {}", version);

    let mut aggregator = Aggregator::new(args.whitespace);

    // Ctrl-C stops the port scan or the probes, whichever is running,
    // and kills running captures
    let cancel = CancellationToken::new();
    let signal_token = cancel.clone();
    let signal_task = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupted. Stopping...");
            signal_token.cancel();
        }
    });

    // Discover open ports
    let resolver = TargetResolver::new(
        TcpConnectScanner,
        args.scan_concurrency,
        Duration::from_millis(args.connect_timeout_ms),
        args.ordered,
        cancel.clone(),
    );
    let discovery = resolver.resolve_spec(&args.address, &args.ports).await?;
    aggregator.set_hosts_discovered(discovery.hosts.len(), discovery.scan_time);
    for host in &discovery.hosts {
        tracing::info!("Open RTSP candidate port {}", host);
    }

    // Expand the probe matrix. Nothing is probed after an interrupted scan.
    let candidates = if discovery.interrupted {
        aggregator.set_interrupted(true);
        Vec::new()
    } else {
        matrix::expand(&discovery.hosts, path_catalog(), &credentials)
    };
    if !candidates.is_empty() {
        tracing::info!(
            "Starting RTSP probe of {} candidate(s): {} host(s) x {} path(s) x {} credential(s)",
            candidates.len(),
            discovery.hosts.len(),
            path_catalog().len(),
            credentials.len()
        );
    }

    let scratch = ScratchDir::create().context("create scratch directory")?;
    if let Some(dir) = &args.thumbnail_dir {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("create thumbnail directory {}", dir.display()))?;
    }
    let setting = ProbeSetting {
        timeout: Duration::from_secs(args.timeout),
        retries: args.retries.max(1),
        scratch_dir: scratch.path().to_path_buf(),
        thumbnail_dir: args.thumbnail_dir.clone(),
        whitespace: args.whitespace,
    };
    let executor = ProbeExecutor::new(
        setting,
        Arc::new(FfmpegCapture::new(args.ffmpeg.clone())),
        Arc::new(ImageThumbnailer::default()),
    );

    let pool = ProbePool::new(executor, args.concurrency, args.host_concurrency);
    let probe_result = pool.run(candidates, &mut aggregator, cancel).await;
    signal_task.abort();
    probe_result?;

    let stats = aggregator.stats();
    tracing::info!(
        "RTSP probe completed in {:?}: {} valid, {} flaky, {} invalid",
        stats.duration_probe.unwrap_or_default(),
        stats.valid,
        stats.flaky,
        stats.invalid
    );

    let rep = aggregator.finish(discovery.hosts);
    drop(scratch);

    if rep.meta.interrupted {
        tracing::warn!("Report is partial: the run was interrupted");
    }

    if !no_stdout {
        print_report_tree(&rep);
    }
    if let Some(path) = &output {
        match save_json_output(&rep, path, JsonStyle::Pretty) {
            Ok(_) => {
                if !no_stdout {
                    tracing::info!("JSON output saved to {}", path.display());
                }
            }
            Err(e) => tracing::error!("Failed to save JSON output: {}", e),
        }
    }
    Ok(())
}
