//! netblock CLI — resolves each requested program and applies the chosen
//! mode to its network access.

use anyhow::{Context, Result};
use clap::Parser;
use serde::Serialize;
use std::path::Path;
use std::process::ExitCode;
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;

use netblock::config::{self, LoggingConfig, NetblockConfig};
use netblock::firewall::{NetshBackend, RuleBackend, RuleManager};
use netblock::{AccessState, Resolver, UnblockReport};

mod cli;

use cli::{CliArgs, Mode};

const SEPARATOR: &str = "--------------------------------------------------";

fn main() -> ExitCode {
    let args = CliArgs::parse();
    match run(args) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

/// Returns whether every input and target was processed successfully.
fn run(args: CliArgs) -> Result<bool> {
    let config = config::load_config(args.config.as_deref())?;
    init_logging(&config.logging, args.verbose)?;

    let mode = Mode::try_from(args.mode)?;
    let resolver = Resolver::new(config.resolver.clone());
    let manager = RuleManager::new(NetshBackend::new(&config.firewall.netsh_binary))
        .with_prefix(&config.firewall.rule_prefix);

    let mut reports = Vec::new();
    for input in &args.programs {
        if !args.json {
            println!("{SEPARATOR}");
            println!("Input: {input}");
        }

        let targets = match resolver.resolve(input) {
            Ok(targets) => targets,
            Err(e) => {
                let report = TargetReport::failed(input, e.to_string());
                if !args.json {
                    println!("Error: could not resolve '{input}': {e}");
                }
                reports.push(report);
                continue;
            }
        };
        debug!("'{input}' resolved to {} target(s)", targets.len());

        for target in targets {
            let report = process_target(&manager, &config, mode, input, &target);
            if !args.json {
                print_report(&report);
            }
            reports.push(report);
        }
    }

    if args.json {
        let out = serde_json::to_string_pretty(&reports).context("Failed to serialize results")?;
        println!("{out}");
    } else {
        println!("{SEPARATOR}");
        println!("All operations finished.");
    }

    Ok(reports.iter().all(|r| r.ok))
}

fn process_target<B: RuleBackend>(
    manager: &RuleManager<B>,
    config: &NetblockConfig,
    mode: Mode,
    input: &str,
    target: &Path,
) -> TargetReport {
    let mut report = TargetReport::new(input, target);
    match mode {
        Mode::Allow => {
            let unblock = manager.unblock(target);
            if unblock.has_failures() {
                if config.firewall.strict_unblock {
                    if let Err(e) = unblock.clone().into_result() {
                        report.error = Some(e.to_string());
                    }
                } else {
                    warn!("Some rules for {} could not be removed", target.display());
                }
            }
            report.unblock = Some(unblock);
        }
        Mode::Block => {
            if let Err(e) = manager.block(target) {
                report.error = Some(e.to_string());
            }
        }
        Mode::Status => match manager.status(target) {
            Ok(state) => report.state = Some(state),
            Err(e) => report.error = Some(e.to_string()),
        },
    }
    report.ok = report.error.is_none();
    report.mode = Some(mode_name(mode));
    report
}

fn mode_name(mode: Mode) -> &'static str {
    match mode {
        Mode::Allow => "allow",
        Mode::Block => "block",
        Mode::Status => "status",
    }
}

fn describe_state(state: AccessState) -> &'static str {
    match state {
        AccessState::Blocked => "BLOCKED (inbound and outbound blocked)",
        AccessState::Allowed => "ALLOWED (no block rules)",
        AccessState::Partial => "PARTIAL (only one direction blocked)",
    }
}

fn print_report(report: &TargetReport) {
    if let Some(target) = &report.target {
        println!("Target: {target}");
    }
    if let Some(e) = &report.error {
        println!("Failed: {e}");
        return;
    }
    match (report.mode, report.state) {
        (_, Some(state)) => println!("Status: {}", describe_state(state)),
        (Some("allow"), _) => {
            println!("Success: firewall rules removed");
            if report.unblock.as_ref().is_some_and(UnblockReport::has_failures) {
                println!("Warning: some rules could not be removed (run with -v for details)");
            }
        }
        (Some("block"), _) => println!("Success: firewall block rules added"),
        _ => {}
    }
}

/// Per-target result, printed as text or collected into the JSON output.
#[derive(Debug, Serialize)]
struct TargetReport {
    input: String,
    target: Option<String>,
    mode: Option<&'static str>,
    ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    state: Option<AccessState>,
    #[serde(skip_serializing_if = "Option::is_none")]
    unblock: Option<UnblockReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl TargetReport {
    fn new(input: &str, target: &Path) -> Self {
        Self {
            input: input.to_string(),
            target: Some(target.display().to_string()),
            mode: None,
            ok: true,
            state: None,
            unblock: None,
            error: None,
        }
    }

    fn failed(input: &str, error: String) -> Self {
        Self {
            input: input.to_string(),
            target: None,
            mode: None,
            ok: false,
            state: None,
            unblock: None,
            error: Some(error),
        }
    }
}

fn init_logging(config: &LoggingConfig, verbose: bool) -> Result<()> {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level))
    };

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_level(true)
        .with_writer(std::io::stderr)
        .compact()
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set tracing subscriber")?;
    Ok(())
}
