//! Outbound URL safety (SSRF defense)
//!
//! 게이트웨이로 나가는 모든 요청 직전에 호출된다. DNS 응답은 호출마다
//! 달라질 수 있으므로 결과를 캐시하지 않는다.
//! 검증에 쓴 주소는 [`VettedUrl::addrs`]로 돌려주고, 전송 계층은 그 주소로만
//! 접속해야 한다 (재조회 시 DNS rebinding 가능).

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};
use thiserror::Error;
use tracing::debug;
use url::{Host, Url};

/// Reason an outbound URL was refused.
///
/// Every address-based variant carries the offending IP so callers can log
/// exactly which rule fired; see [`UrlRejection::rule`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UrlRejection {
    #[error("malformed URL '{url}': {reason}")]
    Malformed { url: String, reason: String },

    #[error("scheme '{0}' is not allowed (expected http or https)")]
    InvalidScheme(String),

    #[error("URL has no hostname")]
    NoHostname,

    #[error("host '{host}' points at loopback address {ip}")]
    Loopback { host: String, ip: IpAddr },

    #[error("host '{host}' points at link-local address {ip}")]
    LinkLocal { host: String, ip: IpAddr },

    #[error("host '{host}' points at private network address {ip}")]
    PrivateNetwork { host: String, ip: IpAddr },

    #[error("host '{host}' points at unique-local address {ip}")]
    UniqueLocal { host: String, ip: IpAddr },

    #[error("host '{host}' points at unspecified address {ip}")]
    Unspecified { host: String, ip: IpAddr },

    #[error("could not resolve host '{host}': {reason}")]
    Unresolvable { host: String, reason: String },
}

impl UrlRejection {
    /// Stable rule name for logs and metrics
    pub fn rule(&self) -> &'static str {
        match self {
            UrlRejection::Malformed { .. } => "malformed",
            UrlRejection::InvalidScheme(_) => "invalid_scheme",
            UrlRejection::NoHostname => "no_hostname",
            UrlRejection::Loopback { .. } => "loopback",
            UrlRejection::LinkLocal { .. } => "link_local",
            UrlRejection::PrivateNetwork { .. } => "private_network",
            UrlRejection::UniqueLocal { .. } => "unique_local",
            UrlRejection::Unspecified { .. } => "unspecified",
            UrlRejection::Unresolvable { .. } => "unresolvable",
        }
    }

    /// DNS failure rather than a policy verdict
    pub fn is_resolution_failure(&self) -> bool {
        matches!(self, UrlRejection::Unresolvable { .. })
    }
}

/// Address ranges that outbound requests may never reach
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockedRange {
    Loopback,
    LinkLocal,
    PrivateNetwork,
    UniqueLocal,
    Unspecified,
}

impl BlockedRange {
    fn rejection(self, host: &str, ip: IpAddr) -> UrlRejection {
        let host = host.to_string();
        match self {
            BlockedRange::Loopback => UrlRejection::Loopback { host, ip },
            BlockedRange::LinkLocal => UrlRejection::LinkLocal { host, ip },
            BlockedRange::PrivateNetwork => UrlRejection::PrivateNetwork { host, ip },
            BlockedRange::UniqueLocal => UrlRejection::UniqueLocal { host, ip },
            BlockedRange::Unspecified => UrlRejection::Unspecified { host, ip },
        }
    }
}

/// Classify an address. `None` means publicly routable.
pub fn blocked_range(ip: IpAddr) -> Option<BlockedRange> {
    match ip {
        IpAddr::V4(v4) => blocked_v4(v4),
        IpAddr::V6(v6) => match v6.to_ipv4_mapped() {
            Some(v4) => blocked_v4(v4),
            None => blocked_v6(v6),
        },
    }
}

fn blocked_v4(ip: Ipv4Addr) -> Option<BlockedRange> {
    if ip.is_loopback() {
        Some(BlockedRange::Loopback)
    } else if ip.is_link_local() {
        Some(BlockedRange::LinkLocal)
    } else if ip.is_private() {
        Some(BlockedRange::PrivateNetwork)
    } else if ip.is_unspecified() {
        Some(BlockedRange::Unspecified)
    } else {
        None
    }
}

fn blocked_v6(ip: Ipv6Addr) -> Option<BlockedRange> {
    let first = ip.segments()[0];
    if ip.is_loopback() {
        Some(BlockedRange::Loopback)
    } else if first & 0xffc0 == 0xfe80 {
        // fe80::/10
        Some(BlockedRange::LinkLocal)
    } else if first & 0xfe00 == 0xfc00 {
        // fc00::/7
        Some(BlockedRange::UniqueLocal)
    } else if ip.is_unspecified() {
        Some(BlockedRange::Unspecified)
    } else {
        None
    }
}

fn check_ip(host: &str, ip: IpAddr) -> Result<(), UrlRejection> {
    match blocked_range(ip) {
        Some(range) => Err(range.rejection(host, ip)),
        None => Ok(()),
    }
}

/// A URL that passed [`validate_url`], with the addresses it was checked against
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VettedUrl {
    pub url: Url,
    /// Resolved addresses for hostname URLs. Empty when the host is a literal IP.
    pub addrs: Vec<SocketAddr>,
}

impl VettedUrl {
    /// Hostname to pin `addrs` for, if any
    pub fn pinned_domain(&self) -> Option<&str> {
        match self.url.host() {
            Some(Host::Domain(domain)) if !self.addrs.is_empty() => Some(domain),
            _ => None,
        }
    }
}

/// Parse and vet an outbound URL.
///
/// Literal IPs are checked directly; hostnames are resolved and *every*
/// returned address must be public.
pub async fn validate_url(raw: &str) -> Result<VettedUrl, UrlRejection> {
    let url = Url::parse(raw).map_err(|e| match e {
        url::ParseError::EmptyHost => UrlRejection::NoHostname,
        other => UrlRejection::Malformed {
            url: raw.to_string(),
            reason: other.to_string(),
        },
    })?;

    validate_parsed(&url).await
}

/// Same as [`validate_url`] for an already parsed URL (redirect targets)
pub async fn validate_parsed(url: &Url) -> Result<VettedUrl, UrlRejection> {
    match url.scheme() {
        "http" | "https" => {}
        other => return Err(UrlRejection::InvalidScheme(other.to_string())),
    }

    let host = url.host().ok_or(UrlRejection::NoHostname)?;

    let addrs = match host {
        Host::Ipv4(ip) => {
            check_ip(&ip.to_string(), IpAddr::V4(ip))?;
            Vec::new()
        }
        Host::Ipv6(ip) => {
            check_ip(&ip.to_string(), IpAddr::V6(ip))?;
            Vec::new()
        }
        Host::Domain(domain) => {
            if domain.is_empty() {
                return Err(UrlRejection::NoHostname);
            }
            let port = url.port_or_known_default().unwrap_or(80);
            let resolved = tokio::net::lookup_host((domain, port)).await.map_err(|e| {
                UrlRejection::Unresolvable {
                    host: domain.to_string(),
                    reason: e.to_string(),
                }
            })?;
            vet_addrs(domain, resolved)?
        }
    };

    Ok(VettedUrl {
        url: url.clone(),
        addrs,
    })
}

/// Every resolved address must be public; at least one is required.
fn vet_addrs(
    domain: &str,
    resolved: impl IntoIterator<Item = SocketAddr>,
) -> Result<Vec<SocketAddr>, UrlRejection> {
    let mut addrs = Vec::new();
    for addr in resolved {
        check_ip(domain, addr.ip())?;
        addrs.push(addr);
    }

    if addrs.is_empty() {
        return Err(UrlRejection::Unresolvable {
            host: domain.to_string(),
            reason: "no addresses returned".to_string(),
        });
    }

    debug!("URL host '{}' resolved to {} public address(es)", domain, addrs.len());
    Ok(addrs)
}
