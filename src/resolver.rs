use std::net::{IpAddr, SocketAddr, ToSocketAddrs};

use url::Host;

use crate::error::ScanError;

/// Host to scan, validated by resolving it before any probe is sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanTarget {
    hostname: String,
    ip: IpAddr,
}

impl ScanTarget {
    pub fn resolve(hostname: &str) -> Result<Self, ScanError> {
        let ip = lookup(hostname)?;
        Ok(Self {
            hostname: hostname.to_owned(),
            ip,
        })
    }

    #[inline]
    pub fn hostname(&self) -> &str {
        &self.hostname
    }

    #[inline]
    pub fn ip(&self) -> IpAddr {
        self.ip
    }
}

pub fn lookup(target: &str) -> Result<IpAddr, ScanError> {
    // Bare IPv6 literals aren't accepted by the url host parser.
    if let Ok(ip) = target.parse::<IpAddr>() {
        return Ok(ip);
    }

    let ip = match Host::parse(target).map_err(ScanError::HostParseFailed)? {
        Host::Domain(dmn) => resolve(&dmn, target)?,
        // Shorthand like `999` or `127.1` isn't an IP literal, leave it to the system resolver.
        Host::Ipv4(_) => resolve(target, target)?,
        Host::Ipv6(ip) => IpAddr::V6(ip),
    };

    Ok(ip)
}

fn resolve(name: &str, target: &str) -> Result<IpAddr, ScanError> {
    let addrs: Vec<SocketAddr> = (name, 0 /* dummy port */)
        .to_socket_addrs()
        .map_err(|e| ScanError::ResolverFailed(target.into(), e))?
        .collect();

    let ip = addrs
        .iter()
        .find(|saddr| saddr.is_ipv4())
        .or_else(|| addrs.first())
        .map(SocketAddr::ip)
        .ok_or(ScanError::DomainLookupFailed(target.into()))?;

    log::debug!("Found address `{}` mapped by target `{}`", ip, target);

    Ok(ip)
}
