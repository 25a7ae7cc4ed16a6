use crate::checker::{assess_host, network_score, risk_table};
use crate::model::{ScanReport, Severity};
use anyhow::Result;
use tabled::{settings::Style, Table, Tabled};

#[derive(Tabled)]
struct HostRow {
    #[tabled(rename = "Host")]
    ip: String,
    #[tabled(rename = "Hostname")]
    hostname: String,
    #[tabled(rename = "Profile")]
    profile: String,
    #[tabled(rename = "Open Ports")]
    ports: String,
    #[tabled(rename = "Risks")]
    risks: usize,
    #[tabled(rename = "Score")]
    score: String,
}

#[derive(Tabled)]
struct FindingRow {
    #[tabled(rename = "Severity")]
    severity: String,
    #[tabled(rename = "Host")]
    host: String,
    #[tabled(rename = "Port")]
    port: u16,
    #[tabled(rename = "Service")]
    service: String,
    #[tabled(rename = "Finding")]
    message: String,
}

#[derive(Tabled)]
struct RiskRuleRow {
    #[tabled(rename = "Port")]
    port: u16,
    #[tabled(rename = "Severity")]
    severity: String,
    #[tabled(rename = "Message")]
    message: String,
}

pub fn print_cli_table(report: &ScanReport) -> Result<()> {
    println!();
    println!(
        "Scan of {} ({} mode, {}) at {}",
        report.meta.target, report.meta.mode, report.meta.timing, report.meta.timestamp
    );
    println!();

    if report.hosts.is_empty() {
        println!("No live hosts found.");
    } else {
        println!("Found {} live hosts:", report.hosts.len());
        println!();

        let table = Table::new(host_rows(report)).with(Style::rounded()).to_string();
        println!("{}", table);
    }

    let findings = finding_rows(report);
    if !findings.is_empty() {
        println!();
        println!("Risk findings ({}):", findings.len());
        println!();

        let table = Table::new(findings).with(Style::rounded()).to_string();
        println!("{}", table);
    }

    let failed: Vec<_> = report.failed_hosts().collect();
    if !failed.is_empty() {
        println!();
        println!("Hosts that could not be port-scanned:");
        for host in failed {
            println!("  {}: {}", host.ip, host.error.as_deref().unwrap_or("-"));
        }
    }

    println!();
    print_summary(report);

    Ok(())
}

/// Prints the static port risk lookup table.
pub fn print_risk_table() {
    let rows: Vec<RiskRuleRow> = risk_table()
        .iter()
        .map(|(port, severity, message)| RiskRuleRow {
            port: *port,
            severity: format_severity(severity),
            message: message.to_string(),
        })
        .collect();

    let table = Table::new(rows).with(Style::rounded()).to_string();
    println!("{}", table);
}

fn host_rows(report: &ScanReport) -> Vec<HostRow> {
    report
        .hosts
        .iter()
        .map(|host| {
            let assessment = assess_host(host);
            let ports = if host.error.is_some() {
                "scan failed".to_string()
            } else if host.ports.is_empty() {
                "-".to_string()
            } else {
                let list: Vec<String> = host
                    .ports
                    .iter()
                    .map(|p| format!("{}/{}", p.port, p.service))
                    .collect();
                truncate(&list.join(", "), 40)
            };

            HostRow {
                ip: host.ip.clone(),
                hostname: host.hostname.clone().unwrap_or_else(|| "-".to_string()),
                profile: format!(
                    "{} ({:?})",
                    assessment.profile.device_type, assessment.profile.confidence
                ),
                ports,
                risks: host.risk_flags.len(),
                score: format!("{} {}", assessment.score.score, assessment.score.grade),
            }
        })
        .collect()
}

fn finding_rows(report: &ScanReport) -> Vec<FindingRow> {
    report
        .hosts
        .iter()
        .flat_map(|host| {
            host.risk_flags.iter().map(move |flag| FindingRow {
                severity: format_severity(&flag.severity),
                host: host.ip.clone(),
                port: flag.port,
                service: flag.service.clone(),
                message: truncate(&flag.message, 60),
            })
        })
        .collect()
}

fn format_severity(severity: &Severity) -> String {
    match severity {
        Severity::Critical => "\x1b[31mCRITICAL\x1b[0m".to_string(),
        Severity::High => "\x1b[91mHIGH\x1b[0m".to_string(),
        Severity::Medium => "\x1b[33mMEDIUM\x1b[0m".to_string(),
        Severity::Low => "\x1b[32mLOW\x1b[0m".to_string(),
        Severity::Info => "INFO".to_string(),
    }
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

fn print_summary(report: &ScanReport) {
    let count = |severity: Severity| {
        report
            .hosts
            .iter()
            .flat_map(|h| &h.risk_flags)
            .filter(|f| f.severity == severity)
            .count()
    };

    println!("Summary:");
    println!("  Alive hosts: {}", report.summary.alive_hosts);
    println!("  Open ports: {}", report.summary.open_ports_total);
    if report.summary.risk_findings > 0 {
        println!(
            "  Risk findings: {} ({} critical, {} high, {} medium, {} low, {} info)",
            report.summary.risk_findings,
            count(Severity::Critical),
            count(Severity::High),
            count(Severity::Medium),
            count(Severity::Low),
            count(Severity::Info),
        );
    } else {
        println!("  Risk findings: 0");
    }

    let score = network_score(report);
    println!();
    println!("Security Score: {}/100 [{}]", score.score, score.grade);
}
