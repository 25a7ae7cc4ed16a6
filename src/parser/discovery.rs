use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;

static REPORT_WITH_HOSTNAME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"Nmap scan report for\s+[^(\r\n]+\(([0-9]+\.[0-9]+\.[0-9]+\.[0-9]+)\)")
        .expect("valid discovery regex")
});

static REPORT_BARE_ADDRESS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"Nmap scan report for\s+([0-9]+\.[0-9]+\.[0-9]+\.[0-9]+)")
        .expect("valid discovery regex")
});

/// Extracts live host addresses from `nmap -sn` output.
///
/// Both `Nmap scan report for 10.0.0.5` and
/// `Nmap scan report for name (10.0.0.5)` forms are recognised. The result
/// is deduplicated and sorted numerically by octet.
pub fn parse_discovery(text: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut addresses: Vec<String> = REPORT_WITH_HOSTNAME
        .captures_iter(text)
        .chain(REPORT_BARE_ADDRESS.captures_iter(text))
        .map(|caps| caps[1].to_string())
        .filter(|ip| seen.insert(ip.clone()))
        .collect();

    addresses.sort_by_key(|ip| natural_key(ip));
    addresses
}

fn natural_key(ip: &str) -> Vec<u32> {
    ip.split('.').map(|octet| octet.parse().unwrap_or(u32::MAX)).collect()
}
