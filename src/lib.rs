pub mod checker;
pub mod config;
pub mod error;
pub mod logging;
pub mod model;
pub mod output;
pub mod parser;
pub mod runner;
pub mod scanner;
pub mod target;

pub use config::Config;
pub use error::ScanError;
pub use model::{Host, Port, RiskFlag, ScanReport, ScanRequest, Severity};
pub use runner::{CommandRunner, SystemRunner};
pub use scanner::{ScanOptions, Scanner};
