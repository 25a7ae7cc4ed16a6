//! Scan target validation.
//!
//! Targets are IPv4 CIDRs. Unless the caller explicitly opts out, only
//! networks lying entirely inside the RFC1918 private ranges are scanned.

use ipnetwork::Ipv4Network;
use once_cell::sync::Lazy;
use regex::Regex;
use std::net::Ipv4Addr;

use crate::error::{Result, ScanError};

/// Smallest and largest prefix length accepted for private targets.
pub const MIN_PREFIX: u8 = 8;
pub const MAX_PREFIX: u8 = 30;

static CIDR_SHAPE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d{1,3}\.){3}\d{1,3}/(\d{1,2})$").expect("valid CIDR regex"));

static PRIVATE_RANGES: Lazy<[Ipv4Network; 3]> = Lazy::new(|| {
    [
        Ipv4Network::new(Ipv4Addr::new(10, 0, 0, 0), 8).expect("valid range"),
        Ipv4Network::new(Ipv4Addr::new(172, 16, 0, 0), 12).expect("valid range"),
        Ipv4Network::new(Ipv4Addr::new(192, 168, 0, 0), 16).expect("valid range"),
    ]
});

/// Returns true if `cidr` is an `A.B.C.D/N` network with `N` in 8..=30
/// that falls entirely within 10.0.0.0/8, 172.16.0.0/12 or 192.168.0.0/16.
///
/// Host bits may be set (`192.168.1.1/24` is accepted). Never panics.
pub fn is_private_cidr(cidr: &str) -> bool {
    if !CIDR_SHAPE.is_match(cidr) {
        return false;
    }

    let Ok(network) = cidr.parse::<Ipv4Network>() else {
        return false;
    };

    if !(MIN_PREFIX..=MAX_PREFIX).contains(&network.prefix()) {
        return false;
    }

    PRIVATE_RANGES
        .iter()
        .any(|range| range.contains(network.network()) && range.contains(network.broadcast()))
}

/// Parses a target as an IPv4 network. A bare address is read as a /32.
///
/// Used when the private-range guardrail is overridden; the target must
/// still be well-formed.
pub fn parse_cidr(target: &str) -> Result<Ipv4Network> {
    target
        .parse::<Ipv4Network>()
        .map_err(|_| ScanError::InvalidTarget(target.to_string()))
}

/// Applies the target guardrail for a scan run.
///
/// Malformed input is `InvalidTarget`. Well-formed input outside the
/// private ranges is `BlockedTarget` unless `allow_non_private` is set.
pub fn check_target(target: &str, allow_non_private: bool) -> Result<()> {
    parse_cidr(target)?;

    if !allow_non_private && !is_private_cidr(target) {
        return Err(ScanError::BlockedTarget(target.to_string()));
    }

    Ok(())
}
