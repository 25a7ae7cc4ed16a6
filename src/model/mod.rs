//! Core data types for scan requests, hosts, ports, and scan reports.
//!
//! This module contains the fundamental types used throughout netsweep:
//!
//! - [`ScanRequest`] - A normalized target/mode/timing request
//! - [`ScanMode`] and [`Timing`] - Scan depth and nmap timing profile
//! - [`Port`] - An open TCP port found on a host
//! - [`RiskFlag`] - A canned risk message attached to an open port
//! - [`Host`] - A discovered host with its ports and risk flags
//! - [`ScanReport`] - Complete scan results handed to the report sink
//!
//! # Example
//!
//! ```
//! use netsweep::model::{ScanMode, ScanRequest, Timing};
//!
//! let request = ScanRequest::new(" 192.168.1.0/24 ", "DEEP", "t9", false);
//!
//! assert_eq!(request.target, "192.168.1.0/24");
//! assert_eq!(request.mode, ScanMode::Deep);
//! assert_eq!(request.timing, Timing::T3);
//! ```

mod host;
mod report;
mod request;

pub use host::*;
pub use report::*;
pub use request::*;
