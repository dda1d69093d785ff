use anyhow::Result;
use async_trait::async_trait;
use rand::seq::SliceRandom;
use std::collections::HashMap;
use std::net::IpAddr;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use crate::endpoint::{Host, Target};

pub mod tcp;

pub use tcp::TcpConnectScanner;

/// Settings for port discovery
#[derive(Debug, Clone)]
pub struct DiscoverySetting {
    pub targets: Vec<Target>,
    pub ports: Vec<u16>,
    pub concurrency: usize,
    pub connect_timeout: Duration,
    /// Probe (target, port) pairs in the given order instead of shuffling them
    pub ordered: bool,
    /// Stops the scan early; items not yet finished are left uncounted
    pub cancel: CancellationToken,
}

/// Result of port discovery
#[derive(Debug, Clone, Default)]
pub struct DiscoveryResult {
    /// Open host:port pairs
    pub hosts: Vec<Host>,
    /// Work items put on the scan queue
    pub enqueued: usize,
    /// Work items the scan reported as finished
    pub completed: usize,
    pub scan_time: Duration,
    /// The scan was cancelled before the queue drained
    pub interrupted: bool,
}

/// Finds listening TCP ports on a set of targets
#[async_trait]
pub trait PortDiscovery: Send + Sync {
    async fn discover(&self, setting: DiscoverySetting) -> Result<DiscoveryResult>;
}

/// Expands targets and ports into a host set through a PortDiscovery backend.
pub struct TargetResolver<D: PortDiscovery> {
    pub discovery: D,
    pub concurrency: usize,
    pub connect_timeout: Duration,
    pub ordered: bool,
    pub cancel: CancellationToken,
}

impl<D: PortDiscovery> TargetResolver<D> {
    pub fn new(
        discovery: D,
        concurrency: usize,
        connect_timeout: Duration,
        ordered: bool,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            discovery,
            concurrency,
            connect_timeout,
            ordered,
            cancel,
        }
    }

    /// Parse the address and port specifications, then discover open ports.
    pub async fn resolve_spec(&self, address_spec: &str, ports_spec: &str) -> Result<DiscoveryResult> {
        let targets = crate::cli::host::parse_target_hosts(address_spec).await?;
        if targets.is_empty() {
            anyhow::bail!("no targets resolved from '{}'", address_spec);
        }
        let ports = crate::cli::port::parse_ports(ports_spec)?;
        if ports.is_empty() {
            anyhow::bail!("no ports to scan in '{}'", ports_spec);
        }
        self.resolve(targets, ports).await
    }

    /// Discover open ports on `targets`.
    ///
    /// Hosts come back ordered by target order, then port order. The scan
    /// queue must be fully drained: fewer completions than enqueued items
    /// is an error, and so is more. A cancelled scan returns the hosts
    /// found so far with `interrupted` set.
    pub async fn resolve(&self, targets: Vec<Target>, ports: Vec<u16>) -> Result<DiscoveryResult> {
        tracing::info!(
            "Starting TCP port scan on {} host(s), {} port(s)",
            targets.len(),
            ports.len()
        );
        let setting = DiscoverySetting {
            targets: targets.clone(),
            ports: ports.clone(),
            concurrency: self.concurrency.max(1),
            connect_timeout: self.connect_timeout,
            ordered: self.ordered,
            cancel: self.cancel.clone(),
        };
        let mut result = self.discovery.discover(setting).await?;
        if result.interrupted {
            tracing::warn!(
                "Port scan interrupted: {} of {} items completed",
                result.completed,
                result.enqueued
            );
        } else {
            reconcile_queue(&result)?;
        }

        let target_rank: HashMap<IpAddr, usize> = targets
            .iter()
            .enumerate()
            .rev()
            .map(|(i, t)| (t.ip, i))
            .collect();
        let port_rank: HashMap<u16, usize> =
            ports.iter().enumerate().rev().map(|(i, p)| (*p, i)).collect();
        result.hosts.sort_by_key(|h| {
            (
                target_rank.get(&h.ip).copied().unwrap_or(usize::MAX),
                port_rank.get(&h.port).copied().unwrap_or(usize::MAX),
            )
        });
        result.hosts.dedup_by(|a, b| a.ip == b.ip && a.port == b.port);

        tracing::info!(
            "Port scan completed in {:?}: {} open port(s)",
            result.scan_time,
            result.hosts.len()
        );
        if result.hosts.is_empty() {
            tracing::info!("No open ports found");
        }
        Ok(result)
    }
}

/// Check that every enqueued scan item completed exactly once.
fn reconcile_queue(result: &DiscoveryResult) -> Result<()> {
    if result.completed > result.enqueued {
        anyhow::bail!(
            "port scan reported {} completions for {} enqueued items",
            result.completed,
            result.enqueued
        );
    }
    if result.completed < result.enqueued {
        anyhow::bail!(
            "port scan stopped early: {} of {} items completed",
            result.completed,
            result.enqueued
        );
    }
    Ok(())
}

/// Build the (target, port) work list, shuffled unless `ordered`.
pub fn build_work_items(setting: &DiscoverySetting) -> Vec<(Target, u16)> {
    let mut items: Vec<(Target, u16)> = Vec::with_capacity(setting.targets.len() * setting.ports.len());
    for target in &setting.targets {
        for port in &setting.ports {
            items.push((target.clone(), *port));
        }
    }
    if !setting.ordered {
        let mut rng = rand::rng();
        items.shuffle(&mut rng);
    }
    items
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Reports a fixed set of open ports with configurable queue accounting
    struct FakeDiscovery {
        open: Vec<(&'static str, u16)>,
        extra_completions: usize,
    }

    #[async_trait]
    impl PortDiscovery for FakeDiscovery {
        async fn discover(&self, setting: DiscoverySetting) -> Result<DiscoveryResult> {
            let items = build_work_items(&setting);
            let hosts = items
                .iter()
                .filter(|(t, p)| {
                    self.open
                        .iter()
                        .any(|(ip, port)| t.ip.to_string() == *ip && p == port)
                })
                .map(|(t, p)| Host::new(t.ip, *p))
                .collect();
            let interrupted = setting.cancel.is_cancelled();
            let completed = if interrupted {
                items.len() / 2
            } else {
                items.len() + self.extra_completions
            };
            Ok(DiscoveryResult {
                hosts,
                enqueued: items.len(),
                completed,
                scan_time: Duration::from_millis(1),
                interrupted,
            })
        }
    }

    fn resolver(open: Vec<(&'static str, u16)>, extra: usize) -> TargetResolver<FakeDiscovery> {
        TargetResolver::new(
            FakeDiscovery {
                open,
                extra_completions: extra,
            },
            8,
            Duration::from_millis(100),
            false,
            CancellationToken::new(),
        )
    }

    #[tokio::test]
    async fn hosts_follow_target_then_port_order() {
        let r = resolver(
            vec![("10.0.0.2", 8554), ("10.0.0.1", 8554), ("10.0.0.2", 554)],
            0,
        );
        let result = r.resolve_spec("10.0.0.1,10.0.0.2", "554,8554").await.unwrap();
        let hosts: Vec<String> = result.hosts.iter().map(|h| h.to_string()).collect();
        assert_eq!(hosts, vec!["10.0.0.1:8554", "10.0.0.2:554", "10.0.0.2:8554"]);
        assert_eq!(result.enqueued, 4);
    }

    #[tokio::test]
    async fn no_open_ports_is_not_an_error() {
        let r = resolver(Vec::new(), 0);
        let result = r.resolve_spec("10.0.0.0/30", "554").await.unwrap();
        assert!(result.hosts.is_empty());
    }

    #[tokio::test]
    async fn extra_completions_are_rejected() {
        let r = resolver(Vec::new(), 1);
        let err = r.resolve_spec("10.0.0.1", "554").await.unwrap_err();
        assert!(err.to_string().contains("completions"));
    }

    #[tokio::test]
    async fn cancelled_scan_keeps_found_hosts() {
        let r = resolver(vec![("10.0.0.1", 554)], 0);
        r.cancel.cancel();
        let result = r.resolve_spec("10.0.0.1,10.0.0.2", "554,8554").await.unwrap();
        assert!(result.interrupted);
        assert!(result.completed < result.enqueued);
        assert_eq!(result.hosts.len(), 1);
    }

    #[tokio::test]
    async fn large_target_set_sorts_by_rank() {
        let targets: Vec<Target> = (1..=250u8)
            .flat_map(|a| (1..=250u8).map(move |b| Target::new(IpAddr::from([10, 1, a, b]))))
            .collect();
        let open: Vec<Host> = targets.iter().rev().map(|t| Host::new(t.ip, 554)).collect();

        struct AllOpen(Vec<Host>);
        #[async_trait]
        impl PortDiscovery for AllOpen {
            async fn discover(&self, setting: DiscoverySetting) -> Result<DiscoveryResult> {
                let n = setting.targets.len() * setting.ports.len();
                Ok(DiscoveryResult {
                    hosts: self.0.clone(),
                    enqueued: n,
                    completed: n,
                    ..Default::default()
                })
            }
        }

        let r = TargetResolver::new(
            AllOpen(open),
            8,
            Duration::from_millis(100),
            true,
            CancellationToken::new(),
        );
        let result = r.resolve(targets.clone(), vec![554]).await.unwrap();
        assert_eq!(result.hosts.len(), targets.len());
        assert_eq!(result.hosts[0].ip, targets[0].ip);
        assert_eq!(result.hosts[targets.len() - 1].ip, targets[targets.len() - 1].ip);
    }

    #[tokio::test]
    async fn malformed_specs_are_rejected() {
        let r = resolver(Vec::new(), 0);
        assert!(r.resolve_spec("10.0.0.1", "554,x").await.is_err());
        assert!(r.resolve_spec("10.0.0.1", "").await.is_err());
        assert!(r.resolve_spec(" , ", "554").await.is_err());
    }

    #[test]
    fn ordered_work_items_keep_order() {
        let setting = DiscoverySetting {
            targets: vec![
                Target::new("10.0.0.1".parse().unwrap()),
                Target::new("10.0.0.2".parse().unwrap()),
            ],
            ports: vec![554, 8554],
            concurrency: 1,
            connect_timeout: Duration::from_millis(10),
            ordered: true,
            cancel: CancellationToken::new(),
        };
        let items: Vec<String> = build_work_items(&setting)
            .iter()
            .map(|(t, p)| format!("{}:{}", t.ip, p))
            .collect();
        assert_eq!(
            items,
            vec!["10.0.0.1:554", "10.0.0.1:8554", "10.0.0.2:554", "10.0.0.2:8554"]
        );
    }
}
