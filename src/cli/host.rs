use anyhow::{Context, Result};
use ipnet::IpNet;
use std::collections::HashSet;
use std::fs;
use std::{net::IpAddr, path::Path};

use crate::dns::resolver::HostResolver;
use crate::endpoint::Target;

/// Resolve one target specification (CIDR / IP / hostname)
async fn expand_one_target(t: &str, resolver: &mut HostResolver) -> Result<Vec<Target>> {
    let mut out = Vec::new();

    // CIDR
    if let Ok(net) = t.parse::<IpNet>() {
        for ip in net.hosts() {
            out.push(Target::new(ip));
        }
        return Ok(out);
    }

    // IP
    if let Ok(ip) = t.parse::<IpAddr>() {
        out.push(Target::new(ip));
        return Ok(out);
    }

    // Hostname
    for ip in resolver.lookup(t).await? {
        out.push(Target::with_hostname(ip, t.to_string()));
    }
    Ok(out)
}

/// Expand targets from a file (each line: CIDR / IP / hostname)
async fn expand_file(path: &Path, resolver: &mut HostResolver) -> Result<Vec<Target>> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("read target list file {}", path.display()))?;

    let mut targets = Vec::new();
    for line in text.lines() {
        let s = line.trim();
        if s.is_empty() || s.starts_with('#') {
            continue;
        }
        targets.extend(expand_one_target(s, resolver).await?);
    }
    Ok(targets)
}

/// Parse an address specification: a comma-separated list of
/// CIDR blocks, IP addresses, hostnames or `@file` target lists.
///
/// Order of first appearance is kept and duplicates are removed.
pub async fn parse_target_hosts(spec: &str) -> Result<Vec<Target>> {
    let mut out: Vec<Target> = Vec::new();
    let mut seen: HashSet<IpAddr> = HashSet::new();
    let mut resolver = HostResolver::new();

    for raw in spec.split(',') {
        let s = raw.trim();
        if s.is_empty() {
            continue;
        }
        let targets = if let Some(path) = s.strip_prefix('@') {
            expand_file(Path::new(path), &mut resolver).await?
        } else {
            expand_one_target(s, &mut resolver).await?
        };
        for t in targets {
            if seen.insert(t.ip) {
                out.push(t);
            }
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[tokio::test]
    async fn single_ip() {
        let targets = parse_target_hosts("192.168.1.5").await.unwrap();
        assert_eq!(targets, vec![Target::new("192.168.1.5".parse().unwrap())]);
    }

    #[tokio::test]
    async fn cidr_expands_to_usable_hosts() {
        let targets = parse_target_hosts("10.0.0.0/30").await.unwrap();
        let ips: Vec<String> = targets.iter().map(|t| t.ip.to_string()).collect();
        assert_eq!(ips, vec!["10.0.0.1", "10.0.0.2"]);
    }

    #[tokio::test]
    async fn single_address_cidr_is_kept() {
        let targets = parse_target_hosts("10.0.0.7/32").await.unwrap();
        assert_eq!(targets.len(), 1);
        assert_eq!(targets[0].ip.to_string(), "10.0.0.7");
    }

    #[tokio::test]
    async fn list_is_deduplicated_in_order() {
        let targets = parse_target_hosts("10.0.0.9, 10.0.0.0/30,10.0.0.1,,")
            .await
            .unwrap();
        let ips: Vec<String> = targets.iter().map(|t| t.ip.to_string()).collect();
        assert_eq!(ips, vec!["10.0.0.9", "10.0.0.1", "10.0.0.2"]);
    }

    #[tokio::test]
    async fn large_block_expands_once() {
        let targets = parse_target_hosts("10.0.0.5,10.0.0.0/16").await.unwrap();
        assert_eq!(targets.len(), 65534);
        assert_eq!(targets[0].ip.to_string(), "10.0.0.5");
        assert_eq!(targets[1].ip.to_string(), "10.0.0.1");
        assert_eq!(targets[65533].ip.to_string(), "10.0.255.254");
        let unique: HashSet<IpAddr> = targets.iter().map(|t| t.ip).collect();
        assert_eq!(unique.len(), targets.len());
    }

    #[tokio::test]
    async fn target_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "# cameras").unwrap();
        writeln!(file, "172.16.0.10").unwrap();
        writeln!(file).unwrap();
        writeln!(file, "172.16.0.11").unwrap();
        let spec = format!("@{}", file.path().display());
        let targets = parse_target_hosts(&spec).await.unwrap();
        assert_eq!(targets.len(), 2);
        assert_eq!(targets[1].ip.to_string(), "172.16.0.11");
    }
}
