use chrono::Local;
use serde::{Deserialize, Serialize};

use super::{Host, ScanMode, ScanSettings, Timing};

pub const TOOL_NAME: &str = "nmap";
pub const USAGE_NOTE: &str = "Use only on authorized networks.";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanMeta {
    pub target: String,
    pub timestamp: String,
    pub tool: String,
    pub mode: ScanMode,
    pub timing: Timing,
    pub top_ports: u16,
    pub service_detection: bool,
    pub notes: String,
}

impl ScanMeta {
    pub fn new(target: impl Into<String>, mode: ScanMode, timing: Timing) -> Self {
        let ScanSettings {
            top_ports,
            service_detection,
        } = mode.settings();

        Self {
            target: target.into(),
            timestamp: Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
            tool: TOOL_NAME.to_string(),
            mode,
            timing,
            top_ports,
            service_detection,
            notes: USAGE_NOTE.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanSummary {
    pub alive_hosts: usize,
    pub open_ports_total: usize,
    pub risk_findings: usize,
}

impl ScanSummary {
    pub fn from_hosts(hosts: &[Host]) -> Self {
        Self {
            alive_hosts: hosts.len(),
            open_ports_total: hosts.iter().map(|h| h.ports.len()).sum(),
            risk_findings: hosts.iter().map(|h| h.risk_flags.len()).sum(),
        }
    }
}

/// Discovery command and its output, kept for auditability.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawOutput {
    pub discover_cmd: String,
    pub discover_output: String,
}

/// The single value a scan run produces, in the saved-report JSON layout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanReport {
    pub meta: ScanMeta,
    pub summary: ScanSummary,
    pub hosts: Vec<Host>,
    pub raw: RawOutput,
}

impl ScanReport {
    /// Builds the report. `hosts` must already be in final order.
    pub fn new(meta: ScanMeta, hosts: Vec<Host>, raw: RawOutput) -> Self {
        Self {
            meta,
            summary: ScanSummary::from_hosts(&hosts),
            hosts,
            raw,
        }
    }

    pub fn failed_hosts(&self) -> impl Iterator<Item = &Host> {
        self.hosts.iter().filter(|h| h.error.is_some())
    }
}
