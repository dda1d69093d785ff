use serde::{Deserialize, Serialize};
use std::net::{IpAddr, SocketAddr};

/// A resolved scan target (IP address and the hostname it was given as, if any)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Target {
    pub ip: IpAddr,
    pub hostname: Option<String>,
}

impl Default for Target {
    fn default() -> Self {
        Self {
            ip: IpAddr::V4(std::net::Ipv4Addr::UNSPECIFIED),
            hostname: None,
        }
    }
}

impl Target {
    /// Create a new Target instance.
    pub fn new(ip: IpAddr) -> Self {
        Self {
            ip,
            ..Default::default()
        }
    }
    /// Create a new Target instance with the specified hostname.
    pub fn with_hostname(ip: IpAddr, hostname: String) -> Self {
        Self {
            ip,
            hostname: Some(hostname),
        }
    }
}

/// An open TCP port found on a target. One entry per open port.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Host {
    pub ip: IpAddr,
    pub port: u16,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hostname: Option<String>,
}

impl Host {
    /// Create a new Host instance.
    pub fn new(ip: IpAddr, port: u16) -> Self {
        Self {
            ip,
            port,
            hostname: None,
        }
    }
    /// Get the SocketAddr of this host.
    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.ip, self.port)
    }
    /// Authority part of an URL ("ip:port", IPv6 in brackets).
    pub fn authority(&self) -> String {
        self.socket_addr().to_string()
    }
}

impl std::fmt::Display for Host {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.socket_addr())
    }
}
