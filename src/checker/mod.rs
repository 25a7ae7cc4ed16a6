//! Risk flags, security scoring, and device profiling.
//!
//! All functions here are pure: they take ports and flags and return
//! values, with no configuration or I/O.

pub mod profile;
pub mod risk;
pub mod score;

pub use profile::{classify, Confidence, DeviceType, ProfileResult};
pub use risk::{flag_for_port, flags_for_ports, risk_table, severity_weight};
pub use score::{compute_score, Grade, ScoreResult};

use crate::model::{Host, Port, RiskFlag, ScanReport};

/// Presentation-side summary of one host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostAssessment {
    pub score: ScoreResult,
    pub profile: ProfileResult,
}

pub fn assess_host(host: &Host) -> HostAssessment {
    HostAssessment {
        score: compute_score(&host.ports, &host.risk_flags),
        profile: classify(&host.ports),
    }
}

/// Scores a whole scan by pooling every host's ports and flags.
pub fn network_score(report: &ScanReport) -> ScoreResult {
    let ports: Vec<Port> = report.hosts.iter().flat_map(|h| h.ports.iter().cloned()).collect();
    let flags: Vec<RiskFlag> = report
        .hosts
        .iter()
        .flat_map(|h| h.risk_flags.iter().cloned())
        .collect();

    compute_score(&ports, &flags)
}
