//! Port risk lookup.
//!
//! Risk flags come from a static table of well-known ports. A port that
//! is not in the table simply carries no canned risk message.

use crate::model::{Port, RiskFlag, Severity};

/// Known risky ports and the message reported when one is open.
const RISK_TABLE: &[(u16, Severity, &str)] = &[
    (21, Severity::High, "FTP open (21): insecure plaintext auth possible."),
    (22, Severity::Info, "SSH open (22): ensure strong passwords/keys, disable root login."),
    (23, Severity::Critical, "Telnet open (23): plaintext remote access (high risk)."),
    (25, Severity::Info, "SMTP open (25): ensure anti-spam, TLS, and auth controls."),
    (53, Severity::Info, "DNS open (53): check recursion exposure and DNSSEC."),
    (80, Severity::Info, "HTTP open (80): consider HTTPS and secure headers."),
    (110, Severity::High, "POP3 open (110): plaintext possible; prefer TLS."),
    (139, Severity::High, "SMB/NetBIOS (139): legacy file sharing exposure."),
    (143, Severity::Info, "IMAP open (143): prefer TLS and secure auth."),
    (443, Severity::Low, "HTTPS open (443): check TLS config and certs."),
    (445, Severity::Critical, "SMB (445): common lateral movement target; restrict access."),
    (3389, Severity::High, "RDP (3389): brute-force target; restrict + MFA + VPN."),
    (5900, Severity::High, "VNC (5900): restrict access; use strong auth."),
];

/// Returns the severity and message for `port`, or `None` for unlisted ports.
pub fn flag_for_port(port: u16) -> Option<(Severity, &'static str)> {
    RISK_TABLE
        .iter()
        .find(|(p, _, _)| *p == port)
        .map(|(_, severity, message)| (*severity, *message))
}

/// The full lookup table, ordered by port number.
pub fn risk_table() -> &'static [(u16, Severity, &'static str)] {
    RISK_TABLE
}

/// Sort weight for a severity name: critical=4, high=3, medium=2, low=1,
/// anything else 0.
pub fn severity_weight(severity: &str) -> u8 {
    match severity.to_lowercase().as_str() {
        "critical" => Severity::Critical.weight(),
        "high" => Severity::High.weight(),
        "medium" => Severity::Medium.weight(),
        "low" => Severity::Low.weight(),
        _ => 0,
    }
}

/// Builds one flag per flaggable open port, ordered by severity descending.
///
/// Flags of equal severity keep the order their ports were reported in.
pub fn flags_for_ports(ports: &[Port]) -> Vec<RiskFlag> {
    let mut flags: Vec<RiskFlag> = ports
        .iter()
        .filter_map(|p| {
            let (severity, message) = flag_for_port(p.port)?;
            Some(RiskFlag {
                severity,
                message: message.to_string(),
                port: p.port,
                service: p.service.clone(),
            })
        })
        .collect();

    flags.sort_by(|a, b| b.severity.weight().cmp(&a.severity.weight()));
    flags
}
