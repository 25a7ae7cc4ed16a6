use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScanMode {
    Quick,
    #[default]
    Normal,
    Deep,
}

impl ScanMode {
    /// Maps free-form input to a mode. Anything unrecognised becomes `Normal`.
    pub fn normalize(input: &str) -> Self {
        match input.trim().to_lowercase().as_str() {
            "quick" => ScanMode::Quick,
            "deep" => ScanMode::Deep,
            _ => ScanMode::Normal,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ScanMode::Quick => "quick",
            ScanMode::Normal => "normal",
            ScanMode::Deep => "deep",
        }
    }

    /// Port-scan settings implied by this mode.
    pub fn settings(&self) -> ScanSettings {
        match self {
            ScanMode::Quick => ScanSettings {
                top_ports: 50,
                service_detection: false,
            },
            ScanMode::Normal => ScanSettings {
                top_ports: 100,
                service_detection: false,
            },
            ScanMode::Deep => ScanSettings {
                top_ports: 100,
                service_detection: true,
            },
        }
    }
}

impl std::fmt::Display for ScanMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// nmap timing template. Only the polite-to-aggressive middle range is offered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Timing {
    T2,
    #[default]
    T3,
    T4,
}

impl Timing {
    /// Maps free-form input to a timing profile. Anything unrecognised becomes `T3`.
    pub fn normalize(input: &str) -> Self {
        match input.trim().to_uppercase().as_str() {
            "T2" => Timing::T2,
            "T4" => Timing::T4,
            _ => Timing::T3,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Timing::T2 => "T2",
            Timing::T3 => "T3",
            Timing::T4 => "T4",
        }
    }
}

impl std::fmt::Display for Timing {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanSettings {
    pub top_ports: u16,
    pub service_detection: bool,
}

/// A scan request after input normalization.
///
/// The target is trimmed but not yet validated; validation happens once,
/// at the start of [`Scanner::scan`](crate::scanner::Scanner::scan).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanRequest {
    pub target: String,
    pub mode: ScanMode,
    pub timing: Timing,
    pub allow_non_private: bool,
}

impl ScanRequest {
    pub fn new(target: &str, mode: &str, timing: &str, allow_non_private: bool) -> Self {
        Self {
            target: target.trim().to_string(),
            mode: ScanMode::normalize(mode),
            timing: Timing::normalize(timing),
            allow_non_private,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_normalization() {
        assert_eq!(ScanMode::normalize("quick"), ScanMode::Quick);
        assert_eq!(ScanMode::normalize("  Deep "), ScanMode::Deep);
        assert_eq!(ScanMode::normalize("normal"), ScanMode::Normal);
        assert_eq!(ScanMode::normalize("aggressive"), ScanMode::Normal);
        assert_eq!(ScanMode::normalize(""), ScanMode::Normal);
    }

    #[test]
    fn test_timing_normalization() {
        assert_eq!(Timing::normalize("t2"), Timing::T2);
        assert_eq!(Timing::normalize("T4"), Timing::T4);
        assert_eq!(Timing::normalize("T5"), Timing::T3);
        assert_eq!(Timing::normalize("insane"), Timing::T3);
    }

    #[test]
    fn test_mode_settings() {
        assert_eq!(ScanMode::Quick.settings().top_ports, 50);
        assert!(!ScanMode::Quick.settings().service_detection);
        assert_eq!(ScanMode::Normal.settings().top_ports, 100);
        assert!(!ScanMode::Normal.settings().service_detection);
        assert_eq!(ScanMode::Deep.settings().top_ports, 100);
        assert!(ScanMode::Deep.settings().service_detection);
    }

    #[test]
    fn test_request_trims_target() {
        let request = ScanRequest::new("\t10.0.0.0/24\n", "quick", "T4", true);
        assert_eq!(request.target, "10.0.0.0/24");
        assert_eq!(request.mode, ScanMode::Quick);
        assert_eq!(request.timing, Timing::T4);
        assert!(request.allow_non_private);
    }
}
