use serde::{Deserialize, Serialize};
use std::net::IpAddr;
use std::path::PathBuf;
use std::time::{Duration, SystemTime};

use crate::endpoint::Host;
use crate::probe::{ImageStatus, ProbeOutcome};

pub mod progress;
pub mod tree;

/// Convert a string into a tree label.
fn tree_label<S: Into<String>>(s: S) -> String {
    s.into()
}

/// Display form of an IP address: every '.' replaced by `whitespace`.
pub fn display_ip(ip: &str, whitespace: char) -> String {
    ip.replace('.', &whitespace.to_string())
}

/// A confirmed camera stream
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct CameraEntry {
    /// Display form of the IP address
    pub ip: String,
    pub url: String,
    pub image: ImageStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<PathBuf>,
}

/// A stream that never answered within the timeout
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct StreamEntry {
    pub ip: String,
    pub url: String,
}

/// Metadata about the scan report
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ReportMeta {
    pub tool: String,
    pub version: String,
    pub started_at: SystemTime,
    pub finished_at: Option<SystemTime>,
    /// The run was cancelled before every candidate was probed
    pub interrupted: bool,
}

impl Default for ReportMeta {
    fn default() -> Self {
        Self {
            tool: "rtspscan".into(),
            version: env!("CARGO_PKG_VERSION").into(),
            started_at: SystemTime::now(),
            finished_at: None,
            interrupted: false,
        }
    }
}

/// Statistics about the scan
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct ReportStats {
    pub hosts_discovered: usize,
    pub candidates: usize,
    pub probed: usize,
    pub attempts: usize,
    pub valid: usize,
    pub flaky: usize,
    pub invalid: usize,
    pub duration_scan: Option<Duration>,
    pub duration_probe: Option<Duration>,
}

/// Final result of one run. Built once by the Aggregator.
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct ScanReport {
    pub meta: ReportMeta,
    pub cameras: Vec<CameraEntry>,
    pub flaky: Vec<StreamEntry>,
    pub portscan: Vec<Host>,
    pub stats: ReportStats,
}

impl ScanReport {
    /// Distinct display IPs of confirmed cameras, in report order.
    pub fn camera_ips(&self) -> Vec<&str> {
        let mut ips: Vec<&str> = Vec::new();
        for c in &self.cameras {
            if !ips.contains(&c.ip.as_str()) {
                ips.push(c.ip.as_str());
            }
        }
        ips
    }
}

struct ValidStream {
    ip: IpAddr,
    url: String,
    image: ImageStatus,
    thumbnail: Option<PathBuf>,
}

/// Collects probe outcomes as they complete and builds the ScanReport
pub struct Aggregator {
    meta: ReportMeta,
    whitespace: char,
    cameras: Vec<ValidStream>,
    flaky: Vec<(IpAddr, String)>,
    stats: ReportStats,
}

impl Aggregator {
    /// Create a new aggregator. `whitespace` replaces '.' in camera IPs.
    pub fn new(whitespace: char) -> Self {
        Self {
            meta: ReportMeta::default(),
            whitespace,
            cameras: Vec::new(),
            flaky: Vec::new(),
            stats: ReportStats::default(),
        }
    }

    pub fn set_hosts_discovered(&mut self, n: usize, scan_time: Duration) {
        self.stats.hosts_discovered = n;
        self.stats.duration_scan = Some(scan_time);
    }

    pub fn set_candidates(&mut self, n: usize) {
        self.stats.candidates = n;
    }

    pub fn set_probe_time(&mut self, probe_time: Duration) {
        self.stats.duration_probe = Some(probe_time);
    }

    pub fn set_interrupted(&mut self, interrupted: bool) {
        self.meta.interrupted = interrupted;
    }

    pub fn stats(&self) -> &ReportStats {
        &self.stats
    }

    /// Record one completed probe. Invalid candidates are only counted.
    pub fn push(&mut self, outcome: ProbeOutcome) {
        self.stats.probed += 1;
        self.stats.attempts += outcome.attempts() as usize;
        match outcome {
            ProbeOutcome::Valid {
                candidate,
                image,
                thumbnail,
                ..
            } => {
                tracing::info!("RTSP {} {}", image.as_str(), candidate.url());
                self.stats.valid += 1;
                self.cameras.push(ValidStream {
                    ip: candidate.host.ip,
                    url: candidate.url(),
                    image,
                    thumbnail,
                });
            }
            ProbeOutcome::Flaky { candidate, .. } => {
                tracing::debug!("Flaky {}", candidate.url());
                self.stats.flaky += 1;
                self.flaky.push((candidate.host.ip, candidate.url()));
            }
            ProbeOutcome::Invalid { candidate, .. } => {
                tracing::trace!("Invalid {}", candidate.url());
                self.stats.invalid += 1;
            }
        }
    }

    /// Build the final report. Camera IPs get the display substitution,
    /// URLs are left as probed.
    pub fn finish(mut self, portscan: Vec<Host>) -> ScanReport {
        self.cameras.sort_by(|a, b| (a.ip, &a.url).cmp(&(b.ip, &b.url)));
        self.flaky.sort();
        let whitespace = self.whitespace;
        let cameras = self
            .cameras
            .into_iter()
            .map(|c| CameraEntry {
                ip: display_ip(&c.ip.to_string(), whitespace),
                url: c.url,
                image: c.image,
                thumbnail: c.thumbnail,
            })
            .collect();
        let flaky = self
            .flaky
            .into_iter()
            .map(|(ip, url)| StreamEntry {
                ip: ip.to_string(),
                url,
            })
            .collect();
        self.meta.finished_at = Some(SystemTime::now());
        ScanReport {
            meta: self.meta,
            cameras,
            flaky,
            portscan,
            stats: self.stats,
        }
    }
}
