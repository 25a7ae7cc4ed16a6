//! Scan orchestration.
//!
//! [`Scanner::scan`] runs the whole pipeline for one request:
//!
//! 1. validate the target against the private-range guardrail
//! 2. check that the scanning tool is on `PATH`
//! 3. run host discovery over the target range
//! 4. port-scan every discovered host, attaching risk flags
//! 5. order hosts by risk and assemble the [`ScanReport`]
//!
//! # Example
//!
//! ```no_run
//! use netsweep::model::ScanRequest;
//! use netsweep::runner::SystemRunner;
//! use netsweep::scanner::{ScanOptions, Scanner};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let scanner = Scanner::new(SystemRunner::with_timeout_secs(900), ScanOptions::default());
//!     let request = ScanRequest::new("192.168.1.0/24", "normal", "T3", false);
//!
//!     let report = scanner.scan(&request).await?;
//!     println!("{} hosts up", report.summary.alive_hosts);
//!     Ok(())
//! }
//! ```

mod command;

pub use command::{discovery_command, port_scan_command};

use futures::stream::{self, StreamExt};
use tracing::{debug, info, warn};

use crate::checker::flags_for_ports;
use crate::config::Config;
use crate::error::{Result, ScanError};
use crate::model::{Host, RawOutput, ScanMeta, ScanReport, ScanRequest, ScanSettings, Timing};
use crate::parser::{parse_discovery, parse_port_scan};
use crate::runner::{CommandOutput, CommandRunner, ScanCommand};
use crate::target::check_target;

/// Tunables for a [`Scanner`] that do not change between requests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanOptions {
    /// Scanning tool to invoke, by name or path.
    pub tool: String,
    /// Maximum number of per-host port scans running at once.
    pub concurrency: usize,
    /// Fail the whole run on the first host whose port scan fails.
    pub abort_on_host_failure: bool,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            tool: "nmap".to_string(),
            concurrency: 4,
            abort_on_host_failure: false,
        }
    }
}

impl From<&Config> for ScanOptions {
    fn from(config: &Config) -> Self {
        Self {
            tool: config.nmap_path.clone(),
            concurrency: config.concurrency,
            abort_on_host_failure: config.abort_on_host_failure,
        }
    }
}

pub struct Scanner<R> {
    runner: R,
    options: ScanOptions,
}

impl<R: CommandRunner> Scanner<R> {
    pub fn new(runner: R, options: ScanOptions) -> Self {
        Self { runner, options }
    }

    /// Runs discovery and per-host port scans for `request`.
    ///
    /// # Errors
    ///
    /// - [`ScanError::InvalidTarget`] / [`ScanError::BlockedTarget`] before anything runs
    /// - [`ScanError::ToolUnavailable`] if the tool is not on `PATH`
    /// - any failure of the discovery pass
    /// - a host's port-scan failure, only when `abort_on_host_failure` is set
    pub async fn scan(&self, request: &ScanRequest) -> Result<ScanReport> {
        let target = request.target.as_str();
        check_target(target, request.allow_non_private)?;

        if !self.runner.is_available(&self.options.tool) {
            return Err(ScanError::ToolUnavailable(self.options.tool.clone()));
        }

        let settings = request.mode.settings();
        info!(
            cidr = target,
            mode = %request.mode,
            timing = %request.timing,
            top_ports = settings.top_ports,
            service_detection = settings.service_detection,
            "starting scan"
        );

        let discover_cmd = discovery_command(&self.options.tool, target, request.timing);
        let discovered = self.run_checked(&discover_cmd).await?;
        let addresses = parse_discovery(&discovered.output);
        info!(hosts = addresses.len(), "host discovery finished");

        let mut hosts = self.scan_hosts(&addresses, request.timing, settings).await?;
        sort_hosts(&mut hosts);

        let report = ScanReport::new(
            ScanMeta::new(target, request.mode, request.timing),
            hosts,
            RawOutput {
                discover_cmd: discover_cmd.command_line(),
                discover_output: discovered.output,
            },
        );

        info!(
            alive_hosts = report.summary.alive_hosts,
            open_ports = report.summary.open_ports_total,
            risk_findings = report.summary.risk_findings,
            "scan finished"
        );

        Ok(report)
    }

    /// Port-scans a single address and attaches its risk flags.
    pub async fn scan_host(&self, ip: &str, timing: Timing, settings: ScanSettings) -> Result<Host> {
        let cmd = port_scan_command(&self.options.tool, ip, timing, settings);
        let output = self.run_checked(&cmd).await?;

        let parsed = parse_port_scan(&output.output, settings.service_detection);
        let risk_flags = flags_for_ports(&parsed.ports);
        debug!(ip, ports = parsed.ports.len(), flags = risk_flags.len(), "host scanned");

        Ok(Host {
            ip: ip.to_string(),
            hostname: parsed.hostname,
            ports: parsed.ports,
            risk_flags,
            error: None,
        })
    }

    /// Scans hosts with bounded concurrency. Results come back in
    /// `addresses` order no matter which scan finishes first.
    async fn scan_hosts(
        &self,
        addresses: &[String],
        timing: Timing,
        settings: ScanSettings,
    ) -> Result<Vec<Host>> {
        let mut results = stream::iter(addresses)
            .map(|ip| async move { (ip, self.scan_host(ip, timing, settings).await) })
            .buffered(self.options.concurrency.max(1));

        let mut hosts = Vec::with_capacity(addresses.len());
        while let Some((ip, result)) = results.next().await {
            match result {
                Ok(host) => hosts.push(host),
                Err(e) if self.options.abort_on_host_failure => {
                    warn!(ip = %ip, error = %e, "host scan failed, aborting run");
                    return Err(e);
                }
                Err(e) => {
                    warn!(ip = %ip, error = %e, "host scan failed, recording host without ports");
                    hosts.push(Host::failed(ip.as_str(), e.to_string()));
                }
            }
        }

        Ok(hosts)
    }

    /// Runs `cmd`, rejecting only a non-zero exit that produced no output.
    async fn run_checked(&self, cmd: &ScanCommand) -> Result<CommandOutput> {
        let output = self.runner.run(cmd).await?;

        if output.is_unusable() {
            return Err(ScanError::CommandFailed {
                command: cmd.command_line(),
            });
        }

        if !output.is_success() {
            warn!(
                command = %cmd,
                exit_code = ?output.exit_code,
                "non-zero exit with output, parsing anyway"
            );
        }

        Ok(output)
    }
}

/// Orders hosts by risk-flag count, then open-port count, both descending.
///
/// The sort is stable, so ties keep discovery order.
pub fn sort_hosts(hosts: &mut [Host]) {
    hosts.sort_by(|a, b| {
        b.risk_flags
            .len()
            .cmp(&a.risk_flags.len())
            .then_with(|| b.ports.len().cmp(&a.ports.len()))
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Port, Severity};
    use async_trait::async_trait;
    use std::collections::{HashMap, HashSet};
    use std::sync::Mutex;

    const DISCOVERY: &str = "\
Starting Nmap 7.94 ( https://nmap.org )
Nmap scan report for 192.168.1.20
Host is up (0.0010s latency).
Nmap scan report for router.lan (192.168.1.1)
Host is up (0.0008s latency).
Nmap scan report for 192.168.1.3
Host is up (0.0020s latency).
Nmap done: 256 IP addresses (3 hosts up) scanned in 2.10 seconds
";

    const ROUTER: &str = "\
Nmap scan report for router.lan (192.168.1.1)
PORT    STATE SERVICE
53/tcp  open  domain
80/tcp  open  http
443/tcp open  https
";

    const WORKSTATION: &str = "\
Nmap scan report for 192.168.1.3
All 100 scanned ports on 192.168.1.3 are in ignored states.
";

    const FILESERVER: &str = "\
Nmap scan report for nas.lan (192.168.1.20)
PORT     STATE SERVICE      VERSION
22/tcp   open  ssh          OpenSSH 8.2p1
139/tcp  open  netbios-ssn  Samba smbd 4.6.2
445/tcp  open  microsoft-ds Samba smbd 4.6.2
";

    #[derive(Default)]
    struct FakeRunner {
        unavailable: bool,
        responses: HashMap<String, CommandOutput>,
        timeouts: HashSet<String>,
        calls: Mutex<Vec<String>>,
    }

    impl FakeRunner {
        fn respond(mut self, cmd: ScanCommand, output: CommandOutput) -> Self {
            self.responses.insert(cmd.command_line(), output);
            self
        }

        fn time_out(mut self, cmd: ScanCommand) -> Self {
            self.timeouts.insert(cmd.command_line());
            self
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl CommandRunner for FakeRunner {
        fn is_available(&self, _program: &str) -> bool {
            !self.unavailable
        }

        async fn run(&self, command: &ScanCommand) -> Result<CommandOutput> {
            let line = command.command_line();
            self.calls.lock().unwrap().push(line.clone());

            if self.timeouts.contains(&line) {
                return Err(ScanError::Timeout {
                    command: line,
                    seconds: 5,
                });
            }

            Ok(self.responses.get(&line).cloned().unwrap_or(CommandOutput {
                exit_code: Some(1),
                output: String::new(),
            }))
        }
    }

    fn host_cmd(ip: &str, mode: &str) -> ScanCommand {
        let request = ScanRequest::new(ip, mode, "T3", false);
        port_scan_command("nmap", ip, Timing::T3, request.mode.settings())
    }

    fn lan_runner(mode: &str) -> FakeRunner {
        FakeRunner::default()
            .respond(
                discovery_command("nmap", "192.168.1.0/24", Timing::T3),
                CommandOutput::success(DISCOVERY),
            )
            .respond(host_cmd("192.168.1.1", mode), CommandOutput::success(ROUTER))
            .respond(host_cmd("192.168.1.3", mode), CommandOutput::success(WORKSTATION))
            .respond(host_cmd("192.168.1.20", mode), CommandOutput::success(FILESERVER))
    }

    fn options(concurrency: usize, abort: bool) -> ScanOptions {
        ScanOptions {
            concurrency,
            abort_on_host_failure: abort,
            ..ScanOptions::default()
        }
    }

    fn ips(report: &ScanReport) -> Vec<&str> {
        report.hosts.iter().map(|h| h.ip.as_str()).collect()
    }

    #[tokio::test]
    async fn test_full_scan_normal_mode() {
        let scanner = Scanner::new(lan_runner("normal"), options(1, false));
        let request = ScanRequest::new("192.168.1.0/24", "normal", "T3", false);

        let report = scanner.scan(&request).await.unwrap();

        // router and nas tie at 3 flags / 3 ports; discovery order breaks the tie
        assert_eq!(ips(&report), vec!["192.168.1.1", "192.168.1.20", "192.168.1.3"]);
        assert_eq!(report.summary.alive_hosts, 3);
        assert_eq!(report.summary.open_ports_total, 6);
        assert_eq!(report.summary.risk_findings, 6);

        let nas = &report.hosts[1];
        assert_eq!(nas.hostname.as_deref(), Some("nas.lan"));
        assert!(nas.ports.iter().all(|p| p.version.is_empty()));
        let severities: Vec<Severity> = nas.risk_flags.iter().map(|f| f.severity).collect();
        assert_eq!(severities, vec![Severity::Critical, Severity::High, Severity::Info]);

        assert_eq!(
            shlex::split(&report.raw.discover_cmd).unwrap(),
            vec!["nmap", "-sn", "-T3", "-PS80,443,22", "-PA80,443", "192.168.1.0/24"]
        );
        assert_eq!(report.raw.discover_output, DISCOVERY);
        assert_eq!(report.meta.top_ports, 100);
        assert!(!report.meta.service_detection);
    }

    #[tokio::test]
    async fn test_deep_mode_keeps_versions() {
        let scanner = Scanner::new(lan_runner("deep"), options(2, false));
        let request = ScanRequest::new("192.168.1.0/24", "deep", "T3", false);

        let report = scanner.scan(&request).await.unwrap();
        let nas = report.hosts.iter().find(|h| h.ip == "192.168.1.20").unwrap();

        assert_eq!(nas.ports[0], Port::open_tcp(22, "ssh").with_version("OpenSSH 8.2p1"));
        assert!(report.meta.service_detection);
        assert!(scanner
            .runner
            .calls()
            .iter()
            .any(|c| c == "nmap -T3 --top-ports 100 -sV 192.168.1.20"));
    }

    #[tokio::test]
    async fn test_concurrency_does_not_change_result() {
        let request = ScanRequest::new("192.168.1.0/24", "normal", "T3", false);

        let sequential = Scanner::new(lan_runner("normal"), options(1, false))
            .scan(&request)
            .await
            .unwrap();
        let parallel = Scanner::new(lan_runner("normal"), options(8, false))
            .scan(&request)
            .await
            .unwrap();

        assert_eq!(sequential.hosts, parallel.hosts);
        assert_eq!(sequential.summary, parallel.summary);
    }

    #[tokio::test]
    async fn test_blocked_target_spawns_nothing() {
        let scanner = Scanner::new(FakeRunner::default(), ScanOptions::default());
        let request = ScanRequest::new("8.8.8.0/24", "normal", "T3", false);

        let err = scanner.scan(&request).await.unwrap_err();
        assert!(matches!(err, ScanError::BlockedTarget(_)));
        assert!(scanner.runner.calls().is_empty());
    }

    #[tokio::test]
    async fn test_invalid_target_spawns_nothing() {
        let scanner = Scanner::new(FakeRunner::default(), ScanOptions::default());
        let request = ScanRequest::new("not-a-cidr", "normal", "T3", true);

        let err = scanner.scan(&request).await.unwrap_err();
        assert!(matches!(err, ScanError::InvalidTarget(_)));
        assert!(scanner.runner.calls().is_empty());
    }

    #[tokio::test]
    async fn test_override_allows_public_target() {
        let runner = FakeRunner::default().respond(
            discovery_command("nmap", "45.33.32.0/30", Timing::T3),
            CommandOutput::success("Nmap done: 4 IP addresses (0 hosts up)"),
        );
        let scanner = Scanner::new(runner, ScanOptions::default());
        let request = ScanRequest::new("45.33.32.0/30", "normal", "T3", true);

        let report = scanner.scan(&request).await.unwrap();
        assert!(report.hosts.is_empty());
        assert_eq!(report.summary.alive_hosts, 0);
    }

    #[tokio::test]
    async fn test_tool_unavailable() {
        let runner = FakeRunner {
            unavailable: true,
            ..FakeRunner::default()
        };
        let scanner = Scanner::new(runner, ScanOptions::default());
        let request = ScanRequest::new("10.0.0.0/24", "quick", "T4", false);

        let err = scanner.scan(&request).await.unwrap_err();
        assert!(matches!(err, ScanError::ToolUnavailable(ref tool) if tool == "nmap"));
        assert!(scanner.runner.calls().is_empty());
    }

    #[tokio::test]
    async fn test_discovery_failure_is_fatal() {
        let scanner = Scanner::new(FakeRunner::default(), ScanOptions::default());
        let request = ScanRequest::new("10.0.0.0/24", "normal", "T3", false);

        let err = scanner.scan(&request).await.unwrap_err();
        assert!(matches!(err, ScanError::CommandFailed { .. }));
    }

    #[tokio::test]
    async fn test_nonzero_exit_with_output_is_parsed() {
        let runner = FakeRunner::default()
            .respond(
                discovery_command("nmap", "10.0.0.0/24", Timing::T3),
                CommandOutput {
                    exit_code: Some(1),
                    output: "Nmap scan report for 10.0.0.5\n".to_string(),
                },
            )
            .respond(
                host_cmd("10.0.0.5", "normal"),
                CommandOutput {
                    exit_code: Some(2),
                    output: "23/tcp open telnet\n".to_string(),
                },
            );
        let scanner = Scanner::new(runner, ScanOptions::default());
        let request = ScanRequest::new("10.0.0.0/24", "normal", "T3", false);

        let report = scanner.scan(&request).await.unwrap();
        assert_eq!(ips(&report), vec!["10.0.0.5"]);
        assert_eq!(report.hosts[0].risk_flags[0].severity, Severity::Critical);
        assert_eq!(report.hosts[0].risk_flags[0].service, "telnet");
    }

    #[tokio::test]
    async fn test_host_failure_recorded_by_default() {
        let runner = lan_runner("normal").time_out(host_cmd("192.168.1.20", "normal"));
        let scanner = Scanner::new(runner, options(3, false));
        let request = ScanRequest::new("192.168.1.0/24", "normal", "T3", false);

        let report = scanner.scan(&request).await.unwrap();
        assert_eq!(report.summary.alive_hosts, 3);

        let failed: Vec<&Host> = report.failed_hosts().collect();
        assert_eq!(failed.len(), 1);
        assert_eq!(failed[0].ip, "192.168.1.20");
        assert!(failed[0].ports.is_empty());
        assert!(failed[0].error.as_deref().unwrap().contains("timed out"));
    }

    #[tokio::test]
    async fn test_host_failure_aborts_when_configured() {
        let runner = lan_runner("normal").time_out(host_cmd("192.168.1.20", "normal"));
        let scanner = Scanner::new(runner, options(1, true));
        let request = ScanRequest::new("192.168.1.0/24", "normal", "T3", false);

        let err = scanner.scan(&request).await.unwrap_err();
        assert!(matches!(err, ScanError::Timeout { .. }));
    }

    fn ranked(ip: &str, flags: usize, ports: usize) -> Host {
        let mut host = Host::new(ip);
        host.ports = (1..=ports as u16).map(|n| Port::open_tcp(1000 + n, "svc")).collect();
        host.risk_flags = (0..flags)
            .map(|i| crate::model::RiskFlag {
                severity: Severity::Info,
                message: String::new(),
                port: i as u16,
                service: String::new(),
            })
            .collect();
        host
    }

    #[test]
    fn test_sort_hosts_by_risk_then_ports() {
        let mut hosts = vec![ranked("A", 2, 5), ranked("B", 2, 8), ranked("C", 3, 1)];
        sort_hosts(&mut hosts);
        let order: Vec<&str> = hosts.iter().map(|h| h.ip.as_str()).collect();
        assert_eq!(order, vec!["C", "B", "A"]);
    }

    #[test]
    fn test_sort_hosts_is_stable() {
        let mut hosts = vec![ranked("first", 1, 1), ranked("second", 1, 1), ranked("third", 0, 0)];
        sort_hosts(&mut hosts);
        let order: Vec<&str> = hosts.iter().map(|h| h.ip.as_str()).collect();
        assert_eq!(order, vec!["first", "second", "third"]);
    }
}
