use anyhow::{Context, Result};
use hickory_resolver::TokioResolver;
use std::net::IpAddr;

/// Hostname lookups for target specifications.
///
/// The system resolver is only built on the first hostname, so IP and CIDR
/// targets never touch the DNS configuration.
#[derive(Default)]
pub struct HostResolver {
    inner: Option<TokioResolver>,
}

impl HostResolver {
    pub fn new() -> Self {
        Self::default()
    }

    fn resolver(&mut self) -> Result<&TokioResolver> {
        if self.inner.is_none() {
            let builder = TokioResolver::builder_tokio()
                .map_err(|e| anyhow::anyhow!("Failed to create TokioResolver: {}", e))?;
            self.inner = Some(builder.build());
        }
        self.inner
            .as_ref()
            .ok_or_else(|| anyhow::anyhow!("resolver unavailable"))
    }

    /// Resolve `name` to every address it has, in answer order.
    pub async fn lookup(&mut self, name: &str) -> Result<Vec<IpAddr>> {
        let lookup = self
            .resolver()?
            .lookup_ip(name)
            .await
            .with_context(|| format!("resolve {name}"))?;
        let ips: Vec<IpAddr> = lookup.iter().collect();
        if ips.is_empty() {
            anyhow::bail!("{name} has no addresses");
        }
        tracing::debug!("{} resolved to {:?}", name, ips);
        Ok(ips)
    }
}
