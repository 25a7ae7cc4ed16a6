//! Parsers for nmap's normal (human-readable) output.
//!
//! The regular expressions here are the contract with the tool's output
//! format. Lines that do not match are skipped; parsing never fails.

mod discovery;
mod ports;

pub use discovery::parse_discovery;
pub use ports::{parse_port_scan, PortScan};
