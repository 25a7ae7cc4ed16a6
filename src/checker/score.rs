//! Heuristic 0-100 security score.
//!
//! Starts at 100 and subtracts three independent penalties:
//! exposure breadth (3 per open port, capped at 30), one per risk flag by
//! severity, and an extra amount for each open port in [`DANGER_PORTS`].
//! A port can be charged by both of the last two.

use serde::{Deserialize, Serialize};

use crate::model::{Port, RiskFlag, Severity};

const MAX_SCORE: i32 = 100;
const PER_PORT_PENALTY: i32 = 3;
const EXPOSURE_CAP: i32 = 30;

/// Extra penalty for well-known dangerous services, on top of any flag penalty.
pub const DANGER_PORTS: &[(u16, i32)] = &[
    (23, 12),
    (21, 10),
    (445, 8),
    (139, 8),
    (3389, 8),
    (5900, 7),
    (80, 5),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Grade {
    Excellent,
    Good,
    Moderate,
    Poor,
}

impl Grade {
    pub fn from_score(score: u8) -> Self {
        match score {
            90.. => Grade::Excellent,
            75..=89 => Grade::Good,
            55..=74 => Grade::Moderate,
            _ => Grade::Poor,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Grade::Excellent => "Excellent",
            Grade::Good => "Good",
            Grade::Moderate => "Moderate",
            Grade::Poor => "Poor",
        }
    }

    pub fn key(&self) -> &'static str {
        match self {
            Grade::Excellent => "excellent",
            Grade::Good => "good",
            Grade::Moderate => "moderate",
            Grade::Poor => "poor",
        }
    }
}

impl std::fmt::Display for Grade {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreExplanation {
    pub open_ports: usize,
    pub risk_flags: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreResult {
    pub score: u8,
    pub grade: String,
    pub grade_key: Grade,
    pub explanation: ScoreExplanation,
}

fn severity_penalty(severity: Severity) -> i32 {
    match severity {
        Severity::Critical => 25,
        Severity::High => 18,
        Severity::Medium => 10,
        Severity::Low => 6,
        Severity::Info => 3,
    }
}

fn danger_penalty(port: u16) -> i32 {
    DANGER_PORTS
        .iter()
        .find(|(p, _)| *p == port)
        .map(|(_, penalty)| *penalty)
        .unwrap_or(0)
}

/// Computes the score and grade for a set of open ports and their flags.
pub fn compute_score(ports: &[Port], risk_flags: &[RiskFlag]) -> ScoreResult {
    let open_count = ports.len();

    let exposure = (open_count as i32)
        .saturating_mul(PER_PORT_PENALTY)
        .min(EXPOSURE_CAP);
    let flag_penalty: i32 = risk_flags.iter().map(|f| severity_penalty(f.severity)).sum();
    let danger: i32 = ports.iter().map(|p| danger_penalty(p.port)).sum();

    let score = (MAX_SCORE - exposure - flag_penalty - danger).clamp(0, MAX_SCORE) as u8;
    let grade = Grade::from_score(score);

    ScoreResult {
        score,
        grade: grade.label().to_string(),
        grade_key: grade,
        explanation: ScoreExplanation {
            open_ports: open_count,
            risk_flags: risk_flags.len(),
        },
    }
}
