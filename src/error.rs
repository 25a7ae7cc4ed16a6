//! Error types for scan orchestration.

use thiserror::Error;

/// Result alias used across the scan pipeline.
pub type Result<T> = std::result::Result<T, ScanError>;

/// Failures that can end a scan run or a single scan pass.
///
/// Parsing never produces an error: lines the parsers do not recognise
/// are skipped.
#[derive(Error, Debug)]
pub enum ScanError {
    #[error("Invalid target: {0} is not a valid IPv4 CIDR (e.g. 192.168.1.0/24)")]
    InvalidTarget(String),

    #[error("Blocked: target {0} must be a private RFC1918 CIDR (e.g. 192.168.x.x/24) with prefix /8 to /30")]
    BlockedTarget(String),

    #[error("{0} is not installed or not available in PATH")]
    ToolUnavailable(String),

    #[error("Command failed: {command}")]
    CommandFailed { command: String },

    #[error("Command timed out after {seconds}s: {command}")]
    Timeout { command: String, seconds: u64 },

    #[error("Failed to execute {command}: {source}")]
    Io {
        command: String,
        #[source]
        source: std::io::Error,
    },
}

impl ScanError {
    /// True for failures detected before any process is spawned.
    pub fn is_precondition(&self) -> bool {
        matches!(
            self,
            ScanError::InvalidTarget(_) | ScanError::BlockedTarget(_) | ScanError::ToolUnavailable(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_precondition_classification() {
        assert!(ScanError::InvalidTarget("x".into()).is_precondition());
        assert!(ScanError::BlockedTarget("8.8.8.0/24".into()).is_precondition());
        assert!(ScanError::ToolUnavailable("nmap".into()).is_precondition());
        assert!(!ScanError::CommandFailed {
            command: "nmap -sn".into()
        }
        .is_precondition());
    }

    #[test]
    fn test_blocked_message_names_target() {
        let msg = ScanError::BlockedTarget("8.8.8.0/24".into()).to_string();
        assert!(msg.starts_with("Blocked:"));
        assert!(msg.contains("8.8.8.0/24"));
    }
}
