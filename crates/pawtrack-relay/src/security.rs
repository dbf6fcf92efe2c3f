//! Target URL validation for the model relay
//!
//! The relay fetches whatever URL a browser hands it, so every target (and
//! every redirect hop) is checked before a request leaves the server.

use std::net::IpAddr;
use thiserror::Error;
use url::Url;

/// Reasons a relay target is refused
#[derive(Debug, Error)]
pub enum SecurityError {
    #[error("not a valid URL ({0})")]
    InvalidUrl(#[from] url::ParseError),

    #[error("scheme '{0}' is not allowed, only http and https are relayed")]
    InvalidScheme(String),

    #[error("host '{0}' is blocked")]
    BlockedHost(String),

    #[error("host '{0}' is not in the allowed domains list")]
    NotAllowed(String),

    #[error("URL must have a host")]
    MissingHost,
}

/// Hostnames that are never relayed to
const BLOCKED_HOSTNAMES: &[&str] = &[
    "localhost",
    "localhost.localdomain",
    "ip6-localhost",
    "ip6-loopback",
    // Cloud metadata services
    "metadata.google.internal",
    "metadata.goog",
];

/// What the relay is willing to fetch
#[derive(Debug, Clone, Default)]
pub struct TargetPolicy {
    /// Permit loopback and private ranges (local development only)
    pub allow_local: bool,
    /// When set, only these domains and their subdomains are relayed
    pub allowed_domains: Option<Vec<String>>,
}

impl TargetPolicy {
    /// Policy for running against a local model server
    pub fn development() -> Self {
        Self {
            allow_local: true,
            allowed_domains: None,
        }
    }
}

/// Validate a relay target URL against `policy`.
///
/// Checks, in order:
/// - the URL parses and uses `http` or `https`
/// - the host is not a blocked hostname or a loopback/private address,
///   unless `allow_local` is set
/// - the host is never link-local (cloud metadata lives there)
/// - the host is on the allow-list, if one is configured
pub fn validate_target_url(url_str: &str, policy: &TargetPolicy) -> Result<Url, SecurityError> {
    let url = Url::parse(url_str)?;
    check_url(&url, policy)?;
    Ok(url)
}

/// Same checks as [`validate_target_url`] on an already parsed URL
pub fn check_url(url: &Url, policy: &TargetPolicy) -> Result<(), SecurityError> {
    match url.scheme() {
        "https" | "http" => {}
        scheme => return Err(SecurityError::InvalidScheme(scheme.to_string())),
    }

    let host = url.host_str().ok_or(SecurityError::MissingHost)?;
    let host_lower = host.to_lowercase();

    if !policy.allow_local
        && BLOCKED_HOSTNAMES
            .iter()
            .any(|blocked| host_lower == *blocked || host_lower.ends_with(&format!(".{}", blocked)))
    {
        return Err(SecurityError::BlockedHost(host.to_string()));
    }

    // IPv6 hosts arrive bracketed from `host_str`.
    if let Ok(ip) = host.trim_start_matches('[').trim_end_matches(']').parse::<IpAddr>() {
        if is_link_local(&ip) {
            return Err(SecurityError::BlockedHost(host.to_string()));
        }
        if !policy.allow_local && (ip.is_loopback() || ip.is_unspecified() || is_private_ip(&ip)) {
            return Err(SecurityError::BlockedHost(host.to_string()));
        }
    }

    if let Some(ref allowed) = policy.allowed_domains {
        let is_allowed = allowed.iter().any(|domain| {
            let domain_lower = domain.to_lowercase();
            host_lower == domain_lower || host_lower.ends_with(&format!(".{}", domain_lower))
        });
        if !is_allowed {
            return Err(SecurityError::NotAllowed(host.to_string()));
        }
    }

    Ok(())
}

/// Private ranges (RFC 1918, carrier-grade NAT, RFC 4193)
fn is_private_ip(ip: &IpAddr) -> bool {
    match ip {
        IpAddr::V4(v4) => {
            let octets = v4.octets();
            v4.is_private() || (octets[0] == 100 && (octets[1] & 0xC0) == 64) || octets[0] == 0
        }
        IpAddr::V6(v6) => (v6.segments()[0] & 0xfe00) == 0xfc00,
    }
}

/// Link-local ranges, including the 169.254.169.254 metadata endpoint
fn is_link_local(ip: &IpAddr) -> bool {
    match ip {
        IpAddr::V4(v4) => v4.is_link_local(),
        IpAddr::V6(v6) => {
            let segments = v6.segments();
            // fe80::/10, plus the AWS IPv6 metadata address fd00:ec2::254
            (segments[0] & 0xffc0) == 0xfe80 || segments == [0xfd00, 0xec2, 0, 0, 0, 0, 0, 0x254]
        }
    }
}
