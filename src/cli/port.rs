use anyhow::{bail, Context, Result};

/// Parse a port specification ("554,8554" or "554,8000-8010") into a list of ports.
///
/// Order of first appearance is kept and duplicates are removed.
pub fn parse_ports(spec: &str) -> Result<Vec<u16>> {
    let mut ports: Vec<u16> = Vec::new();
    let mut push = |p: u16| {
        if !ports.contains(&p) {
            ports.push(p);
        }
    };
    for part in spec.split(',').map(|s| s.trim()).filter(|s| !s.is_empty()) {
        if let Some((a, b)) = part.split_once('-') {
            let start: u16 = a.trim().parse().with_context(|| format!("invalid port: {a}"))?;
            let end: u16 = b.trim().parse().with_context(|| format!("invalid port: {b}"))?;
            if start > end {
                bail!("invalid range: {part}");
            }
            for p in start..=end {
                push(p);
            }
        } else {
            let p: u16 = part.parse().with_context(|| format!("invalid port: {part}"))?;
            push(p);
        }
    }
    if ports.contains(&0) {
        bail!("port 0 is not a valid scan port");
    }
    Ok(ports)
}
