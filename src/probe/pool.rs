use std::collections::HashMap;
use std::net::IpAddr;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::{mpsc, Semaphore};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing_indicatif::span_ext::IndicatifSpanExt;

use crate::matrix::Candidate;
use crate::output::Aggregator;
use crate::probe::{ProbeError, ProbeExecutor, ProbeOutcome};

/// Bounded worker pool running the probe executor over a candidate set.
///
/// At most `concurrency` probes run at once, and at most `host_concurrency`
/// of them against the same IP address.
pub struct ProbePool {
    executor: Arc<ProbeExecutor>,
    concurrency: usize,
    host_concurrency: usize,
}

impl ProbePool {
    pub fn new(executor: ProbeExecutor, concurrency: usize, host_concurrency: usize) -> Self {
        Self {
            executor: Arc::new(executor),
            concurrency: concurrency.max(1),
            host_concurrency: host_concurrency.max(1),
        }
    }

    /// Probe every candidate and feed the outcomes into `aggregator`.
    ///
    /// Cancelling `cancel` stops new probes and kills running ones; the
    /// outcomes received so far stay in the aggregator, which is marked
    /// interrupted. A fatal probe error cancels the rest of the run and is
    /// returned once every task has finished.
    pub async fn run(
        &self,
        candidates: Vec<Candidate>,
        aggregator: &mut Aggregator,
        cancel: CancellationToken,
    ) -> Result<(), ProbeError> {
        let start_time = Instant::now();
        aggregator.set_candidates(candidates.len());
        if candidates.is_empty() {
            aggregator.set_probe_time(start_time.elapsed());
            return Ok(());
        }

        let global = Arc::new(Semaphore::new(self.concurrency));
        let mut host_limits: HashMap<IpAddr, Arc<Semaphore>> = HashMap::new();
        for c in &candidates {
            host_limits
                .entry(c.host.ip)
                .or_insert_with(|| Arc::new(Semaphore::new(self.host_concurrency)));
        }

        let header_span = tracing::info_span!("rtsp_probe");
        crate::output::progress::start_progress(&header_span, "RTSP Probe", candidates.len());

        let (tx, mut rx) = mpsc::channel::<Result<ProbeOutcome, ProbeError>>(self.concurrency * 2);
        let mut tasks = JoinSet::new();
        for candidate in candidates {
            let tx = tx.clone();
            let global = global.clone();
            let host_limit = host_limits[&candidate.host.ip].clone();
            let executor = self.executor.clone();
            let cancel = cancel.clone();
            tasks.spawn(async move {
                let work = async {
                    // Host permit first so queued probes of a busy host hold no global slot
                    let _host_permit = host_limit.acquire_owned().await.ok()?;
                    let _permit = global.acquire_owned().await.ok()?;
                    Some(executor.probe(candidate).await)
                };
                let result = tokio::select! {
                    biased;
                    _ = cancel.cancelled() => None,
                    r = work => r,
                };
                if let Some(r) = result {
                    let _ = tx.send(r).await;
                }
            });
        }
        drop(tx);

        let mut fatal: Option<ProbeError> = None;
        while let Some(result) = rx.recv().await {
            match result {
                Ok(outcome) => aggregator.push(outcome),
                Err(e) => {
                    if fatal.is_none() {
                        tracing::error!("Aborting probes: {}", e);
                        cancel.cancel();
                        fatal = Some(e);
                    }
                }
            }
            header_span.pb_inc(1);
        }
        while let Some(joined) = tasks.join_next().await {
            if let Err(e) = joined {
                tracing::error!("Probe task failed: {}", e);
            }
        }
        drop(header_span);

        aggregator.set_probe_time(start_time.elapsed());
        if let Some(e) = fatal {
            return Err(e);
        }
        if cancel.is_cancelled() {
            tracing::warn!("Probing interrupted, returning partial results");
            aggregator.set_interrupted(true);
        }
        Ok(())
    }
}
