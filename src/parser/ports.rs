use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;

use crate::model::Port;

static REPORT_HOSTNAME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"Nmap scan report for\s+(\S+)\s+\(([0-9.]+)\)").expect("valid hostname regex")
});

static OPEN_TCP_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(\d+)/tcp\s+open\s+([a-zA-Z0-9\-_.]+)(.*)$").expect("valid port regex")
});

/// Hostname and open ports parsed from a single host's scan output.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PortScan {
    pub hostname: Option<String>,
    pub ports: Vec<Port>,
}

/// Parses `nmap --top-ports N [-sV] <ip>` output for one host.
///
/// Only `<port>/tcp open <service>[ <version>]` lines are kept. The
/// trailing version text is recorded only when `service_detection` is
/// true. Ports are unique by number and returned in ascending order.
pub fn parse_port_scan(text: &str, service_detection: bool) -> PortScan {
    let hostname = REPORT_HOSTNAME
        .captures(text)
        .map(|caps| caps[1].to_string());

    let mut seen = HashSet::new();
    // Any of \r\n, \n or a lone \r ends a line; empty pieces never match
    let mut ports: Vec<Port> = text
        .split(['\r', '\n'])
        .filter_map(|line| parse_open_port(line.trim(), service_detection))
        .filter(|port| seen.insert(port.port))
        .collect();

    ports.sort_by_key(|p| p.port);

    PortScan { hostname, ports }
}

fn parse_open_port(line: &str, service_detection: bool) -> Option<Port> {
    let caps = OPEN_TCP_LINE.captures(line)?;

    // Out-of-range numbers are treated like any other unmatched line
    let number: u16 = caps[1].parse().ok().filter(|n| *n != 0)?;

    let port = Port::open_tcp(number, &caps[2]);
    if service_detection {
        Some(port.with_version(caps[3].trim()))
    } else {
        Some(port)
    }
}
