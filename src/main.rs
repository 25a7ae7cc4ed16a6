use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use indicatif::{ProgressBar, ProgressStyle};
use netsweep::{
    config::Config,
    logging::init_logging,
    model::{ScanReport, ScanRequest, Severity},
    output::{format_report_to_string, print_result, print_risk_table, OutputFormat},
    runner::SystemRunner,
    scanner::{ScanOptions, Scanner},
};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::str::FromStr;
use std::time::Duration;

/// Exit codes for CI integration
mod exit_codes {
    pub const SUCCESS: u8 = 0;
    pub const CRITICAL_RISK: u8 = 2;
    pub const HIGH_RISK: u8 = 3;
    pub const MEDIUM_RISK: u8 = 4;
    pub const LOW_RISK: u8 = 5;
    pub const ERROR: u8 = 1;
}

#[derive(Parser)]
#[command(name = "netsweep")]
#[command(
    author,
    version,
    about = "Discover hosts on a private network with nmap and flag risky open ports"
)]
struct Cli {
    /// Enable debug logging (RUST_LOG takes precedence)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Scan a network range (only on networks you are authorized to test)
    Scan(ScanArgs),

    /// List the port risk rules
    Risks,

    /// Show or create config file
    Config {
        /// Generate default config file
        #[arg(long)]
        init: bool,

        /// Show config file path
        #[arg(long)]
        path: bool,
    },
}

#[derive(Args, Debug, Clone)]
struct ScanArgs {
    /// Target CIDR, e.g. 192.168.1.0/24
    target: String,

    /// Scan mode (quick, normal, deep)
    #[arg(short, long)]
    mode: Option<String>,

    /// nmap timing template (T2, T3, T4)
    #[arg(short, long)]
    timing: Option<String>,

    /// Allow targets outside the RFC1918 private ranges
    #[arg(long)]
    allow_non_private: bool,

    /// Output format (table, json)
    #[arg(short, long)]
    format: Option<String>,

    /// Write the JSON report to a file
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Number of hosts to port-scan at once
    #[arg(long)]
    concurrency: Option<usize>,

    /// Per-process timeout in seconds (0 disables)
    #[arg(long)]
    timeout: Option<u64>,

    /// Abort the whole scan if any single host fails to scan
    #[arg(long)]
    abort_on_host_failure: bool,

    /// Exit with error if risk flags at or above this severity are found
    #[arg(long, value_enum)]
    fail_on: Option<FailLevel>,
}

/// Everything a scan run needs, after command-line flags are merged over the config file.
#[derive(Debug)]
struct ScanPlan {
    request: ScanRequest,
    options: ScanOptions,
    timeout_secs: u64,
    format: OutputFormat,
}

/// Merges `args` over `config`. A flag that is given always wins; boolean
/// switches can only turn a setting on.
fn plan_scan(args: &ScanArgs, config: &Config) -> Result<ScanPlan> {
    let request = ScanRequest::new(
        &args.target,
        args.mode.as_deref().unwrap_or(config.default_mode.as_str()),
        args.timing.as_deref().unwrap_or(config.default_timing.as_str()),
        args.allow_non_private || config.allow_non_private,
    );

    let mut options = ScanOptions::from(config);
    if let Some(n) = args.concurrency {
        options.concurrency = n;
    }
    options.abort_on_host_failure |= args.abort_on_host_failure;

    let format = OutputFormat::from_str(args.format.as_deref().unwrap_or(&config.default_format))
        .map_err(|e| anyhow::anyhow!(e))?;

    Ok(ScanPlan {
        request,
        options,
        timeout_secs: args.timeout.unwrap_or(config.command_timeout_secs),
        format,
    })
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum FailLevel {
    Critical,
    High,
    Medium,
    Low,
}

impl FailLevel {
    fn threshold(self) -> Severity {
        match self {
            FailLevel::Critical => Severity::Critical,
            FailLevel::High => Severity::High,
            FailLevel::Medium => Severity::Medium,
            FailLevel::Low => Severity::Low,
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::from(exit_codes::ERROR)
        }
    }
}

async fn run() -> Result<u8> {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    let config = Config::load().unwrap_or_else(|e| {
        tracing::warn!(error = %e, "could not load config file, using defaults");
        Config::default()
    });

    match cli.command {
        Commands::Scan(args) => {
            let plan = plan_scan(&args, &config)?;
            let runner = SystemRunner::with_timeout_secs(plan.timeout_secs);
            let scanner = Scanner::new(runner, plan.options);

            run_scan(scanner, plan.request, plan.format, args.output, args.fail_on).await
        }
        Commands::Risks => {
            print_risk_table();
            Ok(exit_codes::SUCCESS)
        }
        Commands::Config { init, path } => {
            handle_config(init, path)?;
            Ok(exit_codes::SUCCESS)
        }
    }
}

async fn run_scan(
    scanner: Scanner<SystemRunner>,
    request: ScanRequest,
    format: OutputFormat,
    output_file: Option<PathBuf>,
    fail_on: Option<FailLevel>,
) -> Result<u8> {
    let is_interactive = format == OutputFormat::Table;

    let progress = if is_interactive {
        let pb = ProgressBar::new_spinner();
        pb.set_style(ProgressStyle::default_spinner().template("{spinner:.green} {msg}")?);
        pb.enable_steady_tick(Duration::from_millis(100));
        pb.set_message(format!(
            "Scanning {} ({} mode, {})...",
            request.target, request.mode, request.timing
        ));
        Some(pb)
    } else {
        None
    };

    let result = scanner.scan(&request).await;

    if let Some(pb) = progress {
        match &result {
            Ok(report) => pb.finish_with_message(format!(
                "Found {} live hosts, {} open ports",
                report.summary.alive_hosts, report.summary.open_ports_total
            )),
            Err(e) if e.is_precondition() => pb.finish_and_clear(),
            Err(_) => pb.abandon_with_message("Scan failed"),
        }
    }

    let report = result?;

    if let Some(path) = output_file {
        save_report(&path, &report)?;
        if is_interactive {
            println!("Report written to: {}", path.display());
        }
    }

    print_result(&report, format)?;

    Ok(determine_exit_code(&report, fail_on))
}

/// Writes the JSON report to `path`.
fn save_report(path: &Path, report: &ScanReport) -> Result<()> {
    let json = format_report_to_string(report)?;
    std::fs::write(path, json)
        .with_context(|| format!("failed to write report to {}", path.display()))?;
    Ok(())
}

/// Determine the exit code based on risk flags found and --fail-on setting
fn determine_exit_code(report: &ScanReport, fail_on: Option<FailLevel>) -> u8 {
    let Some(fail_on) = fail_on else {
        return exit_codes::SUCCESS;
    };

    let worst = report
        .hosts
        .iter()
        .flat_map(|h| &h.risk_flags)
        .map(|f| f.severity)
        .max_by_key(|s| s.weight());

    match worst {
        Some(severity) if severity.weight() >= fail_on.threshold().weight() => match severity {
            Severity::Critical => exit_codes::CRITICAL_RISK,
            Severity::High => exit_codes::HIGH_RISK,
            Severity::Medium => exit_codes::MEDIUM_RISK,
            _ => exit_codes::LOW_RISK,
        },
        _ => exit_codes::SUCCESS,
    }
}

fn handle_config(init: bool, show_path: bool) -> Result<()> {
    let config_path = Config::config_path();

    if show_path {
        println!("{}", config_path.display());
        return Ok(());
    }

    if init {
        if config_path.exists() {
            println!("Config file already exists at: {}", config_path.display());
            return Ok(());
        }

        let config = Config::default();
        config.save()?;
        println!("Created config file at: {}", config_path.display());
        println!();
        println!("Default configuration:");
        println!("{}", Config::generate_default_config());
        return Ok(());
    }

    if config_path.exists() {
        let content = std::fs::read_to_string(&config_path)?;
        println!("Config file: {}", config_path.display());
        println!();
        println!("{}", content);
    } else {
        println!("No config file found.");
        println!("Run 'netsweep config --init' to create one.");
        println!();
        println!("Config path: {}", config_path.display());
    }

    Ok(())
}
