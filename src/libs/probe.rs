//! # Existence Probe
//!
//! Decides whether a tool is already adequately installed. Three strategies exist and a
//! specialization picks one through `Deploy::probe_strategy`:
//!
//! - **CommandVersion** (default): run `<command> --version`. A missing executable means
//!   `Absent`; with no minimum version any response means `Satisfied`; otherwise the
//!   first `\d+\.\d+(\.\d+)?` in the output is compared against `min_version`.
//! - **InstallPrefix**: the descriptor's prefix directory existing means `Satisfied`.
//! - **PackageStatus**: every package of the descriptor's list is installed according
//!   to `dpkg-query`.
//!
//! A version that cannot be read, or a minimum that cannot be parsed, yields
//! `Indeterminate`. The driver reinstalls in that case.

use colored::Colorize;

use crate::libs::utilities::command::{CommandRunner, CommandSpec};
use crate::libs::version::{extract_version, is_less_than};
use crate::schemas::deployment::{ProbeOutcome, ProbeStrategy};
use crate::schemas::descriptor::ToolDescriptor;
use crate::schemas::errors::CommandError;
use crate::{log_debug, log_warn};

/// What the probe concluded, plus the version it read (if any).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeReport {
    pub outcome: ProbeOutcome,
    /// Only set on a successful extraction; the driver records it into the descriptor.
    pub detected_version: Option<String>,
}

impl ProbeReport {
    fn bare(outcome: ProbeOutcome) -> Self {
        ProbeReport {
            outcome,
            detected_version: None,
        }
    }
}

/// Runs the given strategy against a descriptor.
pub fn probe(
    strategy: ProbeStrategy,
    descriptor: &ToolDescriptor,
    runner: &dyn CommandRunner,
) -> ProbeReport {
    let report = match strategy {
        ProbeStrategy::CommandVersion => probe_command(descriptor, runner),
        ProbeStrategy::InstallPrefix => probe_prefix(descriptor),
        ProbeStrategy::PackageStatus => probe_packages(descriptor, runner),
    };
    log_debug!(
        "[Probe] {} -> {} (version: {})",
        descriptor.command().bold(),
        report.outcome,
        report.detected_version.as_deref().unwrap_or("unknown")
    );
    report
}

fn probe_command(descriptor: &ToolDescriptor, runner: &dyn CommandRunner) -> ProbeReport {
    let spec = CommandSpec::new(descriptor.command()).arg("--version");
    let output = match runner.run(&spec) {
        Ok(output) => output,
        Err(CommandError::NotFound(_)) => return ProbeReport::bare(ProbeOutcome::Absent),
        Err(e) => {
            log_warn!("[Probe] Could not run '{}': {}", spec.display(), e);
            return ProbeReport::bare(ProbeOutcome::Absent);
        }
    };

    // Some wrappers exist but only print a shell "command not found".
    if output.stderr.to_lowercase().contains("command not found") {
        return ProbeReport::bare(ProbeOutcome::Absent);
    }

    let detected_version =
        extract_version(&output.stdout).or_else(|| extract_version(&output.stderr));

    let Some(min_version) = descriptor.min_version() else {
        // Presence is all that matters.
        return ProbeReport {
            outcome: ProbeOutcome::Satisfied,
            detected_version,
        };
    };

    // The program exists but could not tell us its version reliably.
    let current = match (&detected_version, output.success()) {
        (Some(current), true) => current,
        _ => {
            return ProbeReport {
                outcome: ProbeOutcome::Indeterminate,
                detected_version,
            };
        }
    };

    let outcome = match is_less_than(current, min_version) {
        Ok(true) => ProbeOutcome::Insufficient,
        Ok(false) => ProbeOutcome::Satisfied,
        Err(e) => {
            log_warn!(
                "[Probe] Cannot compare {} against minimum {}: {}",
                current,
                min_version,
                e
            );
            ProbeOutcome::Indeterminate
        }
    };
    ProbeReport {
        outcome,
        detected_version,
    }
}

fn probe_prefix(descriptor: &ToolDescriptor) -> ProbeReport {
    match descriptor.prefix() {
        Some(prefix) if prefix.exists() => ProbeReport::bare(ProbeOutcome::Satisfied),
        Some(_) => ProbeReport::bare(ProbeOutcome::Absent),
        None => {
            log_warn!(
                "[Probe] {} has no install prefix to look for; treating it as absent",
                descriptor.name().yellow()
            );
            ProbeReport::bare(ProbeOutcome::Absent)
        }
    }
}

fn probe_packages(descriptor: &ToolDescriptor, runner: &dyn CommandRunner) -> ProbeReport {
    let packages = descriptor.packages();
    let missing = missing_packages(runner, packages);
    let outcome = if missing.is_empty() {
        ProbeOutcome::Satisfied
    } else if missing.len() == packages.len() {
        ProbeOutcome::Absent
    } else {
        ProbeOutcome::Insufficient
    };
    ProbeReport::bare(outcome)
}

/// The subset of `packages` that `dpkg-query` does not report as installed.
pub fn missing_packages(runner: &dyn CommandRunner, packages: &[String]) -> Vec<String> {
    packages
        .iter()
        .filter(|package| !package_installed(runner, package))
        .cloned()
        .collect()
}

fn package_installed(runner: &dyn CommandRunner, package: &str) -> bool {
    let spec = CommandSpec::new("dpkg-query").args(["-W", "-f=${Status}", package]);
    match runner.run(&spec) {
        Ok(output) => output.success() && output.stdout.contains("install ok installed"),
        Err(e) => {
            log_warn!("[Probe] Could not query package '{}': {}", package, e);
            false
        }
    }
}
