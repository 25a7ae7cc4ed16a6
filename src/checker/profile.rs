//! Best-effort device type guess from an open-port signature.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::model::Port;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DeviceType {
    Workstation,
    Server,
    NetworkDevice,
    PrinterOrIot,
    HardenedEndpoint,
    Unknown,
}

impl DeviceType {
    pub fn label(&self) -> &'static str {
        match self {
            DeviceType::Workstation => "Workstation",
            DeviceType::Server => "Server",
            DeviceType::NetworkDevice => "Network Device",
            DeviceType::PrinterOrIot => "Printer / IoT",
            DeviceType::HardenedEndpoint => "Workstation / Mobile (Hardened)",
            DeviceType::Unknown => "Unknown",
        }
    }
}

impl std::fmt::Display for DeviceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Confidence {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileResult {
    pub device_type: DeviceType,
    pub confidence: Confidence,
}

impl ProfileResult {
    fn new(device_type: DeviceType, confidence: Confidence) -> Self {
        Self {
            device_type,
            confidence,
        }
    }
}

/// Labels a host by its open ports. Rules are checked in order and the
/// first match wins.
pub fn classify(ports: &[Port]) -> ProfileResult {
    let open: HashSet<u16> = ports.iter().map(|p| p.port).collect();
    let any = |candidates: &[u16]| candidates.iter().any(|p| open.contains(p));

    // Remote desktop and file sharing
    if any(&[3389, 5900, 445, 139]) {
        if any(&[445, 139]) {
            return ProfileResult::new(DeviceType::Server, Confidence::Medium);
        }
        return ProfileResult::new(DeviceType::Workstation, Confidence::Medium);
    }

    // Web UI: a real server if it also runs SSH or a database
    if any(&[80, 443, 8080, 8443]) {
        if any(&[22, 3306, 5432]) {
            return ProfileResult::new(DeviceType::Server, Confidence::High);
        }
        return ProfileResult::new(DeviceType::NetworkDevice, Confidence::Medium);
    }

    if any(&[9100, 515, 631]) {
        return ProfileResult::new(DeviceType::PrinterOrIot, Confidence::High);
    }

    if any(&[53, 67, 68]) {
        return ProfileResult::new(DeviceType::NetworkDevice, Confidence::Medium);
    }

    if open.contains(&22) && ports.len() <= 2 {
        return ProfileResult::new(DeviceType::Server, Confidence::Low);
    }

    if ports.is_empty() {
        return ProfileResult::new(DeviceType::HardenedEndpoint, Confidence::Medium);
    }

    ProfileResult::new(DeviceType::Unknown, Confidence::Low)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile(numbers: &[u16]) -> ProfileResult {
        let ports: Vec<Port> = numbers.iter().map(|n| Port::open_tcp(*n, "svc")).collect();
        classify(&ports)
    }

    #[test]
    fn test_no_ports_is_hardened_endpoint() {
        let result = profile(&[]);
        assert_eq!(result.device_type, DeviceType::HardenedEndpoint);
        assert_eq!(result.confidence, Confidence::Medium);
        assert_eq!(result.device_type.label(), "Workstation / Mobile (Hardened)");
    }

    #[test]
    fn test_smb_is_server_even_with_rdp() {
        assert_eq!(profile(&[445]), ProfileResult::new(DeviceType::Server, Confidence::Medium));
        assert_eq!(
            profile(&[139, 3389]),
            ProfileResult::new(DeviceType::Server, Confidence::Medium)
        );
    }

    #[test]
    fn test_remote_desktop_is_workstation() {
        assert_eq!(
            profile(&[3389]),
            ProfileResult::new(DeviceType::Workstation, Confidence::Medium)
        );
        assert_eq!(
            profile(&[5900, 80]),
            ProfileResult::new(DeviceType::Workstation, Confidence::Medium)
        );
    }

    #[test]
    fn test_web_rules() {
        assert_eq!(profile(&[80, 22]), ProfileResult::new(DeviceType::Server, Confidence::High));
        assert_eq!(
            profile(&[8443, 5432]),
            ProfileResult::new(DeviceType::Server, Confidence::High)
        );
        assert_eq!(
            profile(&[443]),
            ProfileResult::new(DeviceType::NetworkDevice, Confidence::Medium)
        );
        // web wins over printer ports
        assert_eq!(
            profile(&[80, 9100]),
            ProfileResult::new(DeviceType::NetworkDevice, Confidence::Medium)
        );
    }

    #[test]
    fn test_printer_and_infrastructure() {
        assert_eq!(
            profile(&[631, 9100]),
            ProfileResult::new(DeviceType::PrinterOrIot, Confidence::High)
        );
        assert_eq!(
            profile(&[53]),
            ProfileResult::new(DeviceType::NetworkDevice, Confidence::Medium)
        );
    }

    #[test]
    fn test_ssh_only() {
        assert_eq!(profile(&[22]), ProfileResult::new(DeviceType::Server, Confidence::Low));
        assert_eq!(
            profile(&[22, 2222]),
            ProfileResult::new(DeviceType::Server, Confidence::Low)
        );
        assert_eq!(
            profile(&[22, 2222, 6000]),
            ProfileResult::new(DeviceType::Unknown, Confidence::Low)
        );
    }

    #[test]
    fn test_unknown_fallback() {
        assert_eq!(profile(&[6379]), ProfileResult::new(DeviceType::Unknown, Confidence::Low));
    }
}
