// The install / uninstall run over the selected tools.
//
// The selection is processed sequentially, in catalog order. A tool that fails is
// reported and the run moves on; only a privilege mismatch stops it, and that is
// checked for the whole selection before the first tool is touched.

use anyhow::{Context, Result};
use colored::Colorize;
use dialoguer::Confirm;

use crate::installers::specialization_for;
use crate::libs::catalog::Catalog;
use crate::libs::deployer::Deployer;
use crate::schemas::deployment::{DeploymentReport, Direction, Terminal};
use crate::{log_debug, log_error, log_info, log_warn};

/// Deploys (or removes) the tools at `selected` indices of `catalog`.
///
/// # Arguments
/// * `catalog`: Owns the descriptors; the probe records detected versions into them.
/// * `selected`: Indices from `Catalog::select`.
/// * `direction`: Install or uninstall.
/// * `deployer`: Carries the resolved identity and the command runner.
/// * `assume_yes`: Skip the uninstall confirmation prompt.
///
/// # Returns
/// * `Ok(reports)` for a completed run, even when individual tools failed.
/// * `Err` when a selected tool needs a privilege level the process lacks, or the
///   confirmation prompt could not be shown.
pub fn run(
    catalog: &mut Catalog,
    selected: &[usize],
    direction: Direction,
    deployer: &Deployer<'_>,
    assume_yes: bool,
) -> Result<Vec<DeploymentReport>> {
    if selected.is_empty() {
        log_warn!("[Deploy] No tools selected. Name some, or run with --list to see them all.");
        return Ok(Vec::new());
    }

    for &index in selected {
        if let Some(descriptor) = catalog.tools().get(index) {
            let spec = specialization_for(descriptor.kind());
            deployer.check_privilege(spec.as_ref(), descriptor)?;
        }
    }

    if direction == Direction::Uninstall && !assume_yes && !confirm_uninstall(catalog, selected)? {
        log_info!("[Deploy] Nothing uninstalled.");
        return Ok(Vec::new());
    }

    let mut reports = Vec::with_capacity(selected.len());
    for &index in selected {
        let Some(descriptor) = catalog.get_mut(index) else {
            continue;
        };
        log_info!(
            "{}",
            format!("==== {} {} ====", direction, descriptor.label()).bold()
        );
        let spec = specialization_for(descriptor.kind());
        let report = match deployer.deploy(spec.as_ref(), descriptor, direction) {
            Ok(report) => report,
            Err(e) if e.is_fatal() => return Err(e.into()),
            Err(e) => {
                log_error!("[Deploy] {}: {}", descriptor.label().bold().red(), e);
                continue;
            }
        };
        if let Ok(json) = serde_json::to_string(&report) {
            log_debug!("[Deploy] Report: {}", json);
        }
        reports.push(report);
    }

    print_summary(&reports);
    Ok(reports)
}

fn confirm_uninstall(catalog: &Catalog, selected: &[usize]) -> Result<bool> {
    let names: Vec<String> = selected
        .iter()
        .filter_map(|&i| catalog.tools().get(i))
        .map(|d| d.label())
        .collect();
    Confirm::new()
        .with_prompt(format!("Uninstall {}?", names.join(", ")))
        .default(false)
        .interact()
        .context("could not read the uninstall confirmation")
}

fn print_summary(reports: &[DeploymentReport]) {
    let failed: Vec<&DeploymentReport> = reports.iter().filter(|r| !r.is_clean()).collect();
    for report in &failed {
        let hooks: Vec<&str> = report.failures.iter().map(|f| f.hook.as_str()).collect();
        log_error!(
            "[Summary] {} {}: {} failed",
            report.tool.bold().red(),
            report.terminal,
            hooks.join(", ")
        );
    }

    let count = |terminal: Terminal| reports.iter().filter(|r| r.terminal == terminal).count();
    log_info!(
        "[Summary] {} tool(s): {} deployed, {} already present, {} uninstalled, \
         {} not installed, {} aborted",
        reports.len(),
        count(Terminal::Cleaned).to_string().green(),
        count(Terminal::Skipped),
        count(Terminal::Uninstalled),
        count(Terminal::WarnNotInstalled),
        count(Terminal::Aborted).to_string().red()
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::libs::context::DeployContext;
    use crate::libs::utilities::command::testing::ScriptedRunner;
    use crate::schemas::descriptor::{ToolDescriptor, ToolKind};
    use crate::schemas::errors::DeployError;

    fn catalog() -> Catalog {
        Catalog::new(vec![
            ToolDescriptor::package("gdb", "gdb"),
            ToolDescriptor::package("zsh", "zsh")
                .with_kind(ToolKind::Zsh)
                .with_min_version("5.0.8"),
            ToolDescriptor::package("cscope", "cscope"),
        ])
    }

    #[test]
    fn test_privilege_mismatch_stops_before_any_tool() {
        let context = DeployContext::for_user("u", "/home/u");
        let runner = ScriptedRunner::new();
        let deployer = Deployer::new(&context, &runner);
        let mut catalog = catalog();

        let err = run(&mut catalog, &[0, 1, 2], Direction::Install, &deployer, true).unwrap_err();
        let cause = err.downcast_ref::<DeployError>().unwrap();
        assert!(cause.is_fatal());
        assert!(runner.calls().is_empty());
    }

    #[test]
    fn test_failures_do_not_stop_the_run() {
        let mut context = DeployContext::for_user("u", "/home/u");
        context.elevated = true;
        let runner = ScriptedRunner::new()
            .missing("gdb")
            .missing("cscope")
            .respond("apt-get", 100, "");
        let deployer = Deployer::new(&context, &runner);
        let mut catalog = catalog();

        let reports = run(&mut catalog, &[0, 2], Direction::Install, &deployer, true).unwrap();
        assert_eq!(reports.len(), 2);
        assert!(reports.iter().all(|r| !r.is_clean()));
        assert_eq!(reports[1].tool, "cscope");
    }

    #[test]
    fn test_uninstall_with_yes_does_not_prompt() {
        let context = DeployContext::for_user("u", "/home/u");
        let runner = ScriptedRunner::new().missing("gdb");
        let deployer = Deployer::new(&context, &runner);
        let mut catalog = catalog();

        let reports = run(&mut catalog, &[0], Direction::Uninstall, &deployer, true).unwrap();
        assert_eq!(reports[0].terminal, Terminal::WarnNotInstalled);
    }

    #[test]
    fn test_empty_selection_does_nothing() {
        let context = DeployContext::for_user("u", "/home/u");
        let runner = ScriptedRunner::new();
        let deployer = Deployer::new(&context, &runner);
        let reports = run(&mut catalog(), &[], Direction::Install, &deployer, false).unwrap();
        assert!(reports.is_empty());
        assert!(runner.calls().is_empty());
    }
}
