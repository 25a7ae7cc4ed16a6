use crate::model::{ScanSettings, Timing};
use crate::runner::ScanCommand;

/// TCP SYN probe ports used during discovery, so hosts that drop ICMP still answer.
pub const DISCOVERY_SYN_PORTS: &str = "80,443,22";
/// TCP ACK probe ports used during discovery.
pub const DISCOVERY_ACK_PORTS: &str = "80,443";

/// `nmap -sn -T<n> -PS80,443,22 -PA80,443 <target>`
pub fn discovery_command(tool: &str, target: &str, timing: Timing) -> ScanCommand {
    ScanCommand::new(tool)
        .arg("-sn")
        .arg(format!("-{}", timing))
        .arg(format!("-PS{}", DISCOVERY_SYN_PORTS))
        .arg(format!("-PA{}", DISCOVERY_ACK_PORTS))
        .arg(target)
}

/// `nmap -T<n> --top-ports <N> [-sV] <ip>`
pub fn port_scan_command(tool: &str, ip: &str, timing: Timing, settings: ScanSettings) -> ScanCommand {
    let mut cmd = ScanCommand::new(tool)
        .arg(format!("-{}", timing))
        .arg("--top-ports")
        .arg(settings.top_ports.to_string());

    if settings.service_detection {
        cmd = cmd.arg("-sV");
    }

    cmd.arg(ip)
}
