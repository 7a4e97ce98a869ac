use std::net::IpAddr;

use reqwest::Url;

use crate::error::SecurityError;

/// Rejects loopback/unspecified/private/link-local addresses, including
/// IPv4-mapped IPv6 forms (`::ffff:10.0.0.1`) that would otherwise slip
/// past a naive IPv6 check.
pub fn check_ip(ip: IpAddr) -> Result<(), SecurityError> {
    match ip {
        IpAddr::V4(ipv4) => {
            if ipv4.is_loopback() || ipv4.is_unspecified() {
                return Err(SecurityError::LoopbackDenied(ipv4.to_string()));
            }
            if ipv4.is_private() || ipv4.is_link_local() {
                return Err(SecurityError::PrivateIpDenied(ipv4.to_string()));
            }
        }
        IpAddr::V6(ipv6) => {
            if let Some(ipv4) = ipv6.to_ipv4_mapped() {
                return check_ip(IpAddr::V4(ipv4));
            }
            if ipv6.is_loopback() || ipv6.is_unspecified() {
                return Err(SecurityError::LoopbackDenied(ipv6.to_string()));
            }
            // Unique local fc00::/7
            if (ipv6.segments()[0] & 0xfe00) == 0xfc00 || ipv6.is_unicast_link_local() {
                return Err(SecurityError::PrivateIpDenied(ipv6.to_string()));
            }
        }
    }
    Ok(())
}

/// Validates a URL for the remote config/archetype fetch path: only
/// `http`/`https`, no loopback/private hosts. `allow_local` bypasses all
/// checks for test fixtures.
pub fn validate_url(url: &Url, allow_local: bool) -> Result<(), SecurityError> {
    if allow_local {
        return Ok(());
    }

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(SecurityError::InvalidScheme(url.scheme().to_string()));
    }

    match url.host() {
        Some(url::Host::Domain(domain)) => {
            if domain == "localhost" {
                return Err(SecurityError::LoopbackDenied(domain.to_string()));
            }
        }
        Some(url::Host::Ipv4(ipv4)) => check_ip(IpAddr::V4(ipv4))?,
        Some(url::Host::Ipv6(ipv6)) => check_ip(IpAddr::V6(ipv6))?,
        None => {}
    }

    Ok(())
}
