use anyhow::Result;
use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use std::net::SocketAddr;
use std::time::{Duration, Instant};
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tracing_indicatif::span_ext::IndicatifSpanExt;

use super::{build_work_items, DiscoverySetting, DiscoveryResult, PortDiscovery};
use crate::endpoint::Host;

/// Port discovery through plain TCP connects. Needs no privileges.
#[derive(Debug, Clone, Default)]
pub struct TcpConnectScanner;

async fn is_open(addr: SocketAddr, connect_timeout: Duration) -> bool {
    match tokio::time::timeout(connect_timeout, TcpStream::connect(addr)).await {
        Ok(Ok(mut stream)) => {
            let _ = stream.shutdown().await;
            true
        }
        Ok(Err(e)) => {
            tracing::trace!("{} closed: {}", addr, e);
            false
        }
        Err(_) => false,
    }
}

#[async_trait]
impl PortDiscovery for TcpConnectScanner {
    async fn discover(&self, setting: DiscoverySetting) -> Result<DiscoveryResult> {
        let start_time = Instant::now();
        let concurrency = setting.concurrency.max(1);
        let connect_timeout = setting.connect_timeout;
        let cancel = setting.cancel.clone();
        let work_items = build_work_items(&setting);
        let enqueued = work_items.len();

        let mut result = DiscoveryResult {
            enqueued,
            ..Default::default()
        };
        if work_items.is_empty() {
            result.scan_time = start_time.elapsed();
            return Ok(result);
        }

        let header_span = tracing::info_span!("tcp_connect_scan");
        crate::output::progress::start_progress(&header_span, "TCP PortScan", enqueued);

        let mut connect_stream = stream::iter(work_items)
            .map(move |(target, port)| async move {
                let open = is_open(SocketAddr::new(target.ip, port), connect_timeout).await;
                (target, port, open)
            })
            .buffer_unordered(concurrency);

        loop {
            let next = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    result.interrupted = true;
                    break;
                }
                next = connect_stream.next() => next,
            };
            let Some((target, port, open)) = next else {
                break;
            };
            result.completed += 1;
            if open {
                tracing::debug!("Open {}:{}", target.ip, port);
                let mut host = Host::new(target.ip, port);
                host.hostname = target.hostname;
                result.hosts.push(host);
            }
            header_span.pb_inc(1);
        }

        drop(header_span);

        result.scan_time = start_time.elapsed();
        Ok(result)
    }
}
