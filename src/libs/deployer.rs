//! # Deployment Driver
//!
//! The state machine that takes one tool from `Start` to a terminal state, and the
//! `Deploy` contract every tool specialization implements.
//!
//! ## Install direction
//!
//! ```text
//! Start -> ExistenceChecked -> Skipped ---------------------------------> Configure
//!                           \-> Acquire -> Unpack -> Build -> Install -> Clean -> Configure
//!                                  \-> Aborted (nothing else runs)
//! ```
//!
//! ## Uninstall direction
//!
//! ```text
//! Start -> ExistenceChecked -> WarnNotInstalled | Uninstall -> Uninstalled
//! ```
//!
//! ## Failure policy
//!
//! - A privilege mismatch is fatal and is raised before the probe runs.
//! - An `acquire` failure aborts the tool: a failed download must not turn into a
//!   half-installed tool.
//! - Every other hook is best effort. Its error is reported, recorded in the
//!   `DeploymentReport`, and the next hook runs.
//! - `configure` runs even when the acquisition chain was skipped: a tool can be
//!   installed and still unconfigured.

use std::path::{Path, PathBuf};

use colored::Colorize;

use crate::libs::context::DeployContext;
use crate::libs::package_manager::Apt;
use crate::libs::probe::{self, ProbeReport};
use crate::libs::utilities::command::CommandRunner;
use crate::schemas::deployment::{
    DeploymentReport, Direction, Hook, HookFailure, PrivilegeRequirement, ProbeStrategy, Terminal,
};
use crate::schemas::descriptor::ToolDescriptor;
use crate::schemas::errors::DeployError;
use crate::{log_debug, log_error, log_info, log_warn};

/// Everything a hook may look at while one tool is being processed.
///
/// Created by the driver once the probe has run, dropped when the tool reaches its
/// terminal state.
pub struct Session<'a> {
    pub descriptor: &'a ToolDescriptor,
    pub context: &'a DeployContext,
    pub runner: &'a dyn CommandRunner,
}

impl<'a> Session<'a> {
    /// The package manager, behind `sudo` when we are not root.
    pub fn apt(&self) -> Apt<'a> {
        Apt::new(self.runner, self.context.elevated)
    }

    /// `<home>/<relative>` for the user we deploy for.
    pub fn home_path(&self, relative: impl AsRef<Path>) -> PathBuf {
        self.context.home_path(relative)
    }

    /// The install prefix, which source-provisioned specializations cannot do without.
    pub fn prefix(&self) -> Result<&'a Path, DeployError> {
        self.descriptor.prefix().ok_or_else(|| self.missing("prefix"))
    }

    /// The repository URL of a source-provisioned tool.
    pub fn url(&self) -> Result<&'a str, DeployError> {
        self.descriptor.url().ok_or_else(|| self.missing("url"))
    }

    fn missing(&self, field: &'static str) -> DeployError {
        DeployError::MissingField {
            tool: self.descriptor.name().to_string(),
            field,
        }
    }
}

/// Installs the descriptor's package with the package manager.
/// This is what `Deploy::install` does unless a specialization overrides it.
pub fn package_install(session: &Session<'_>) -> Result<(), DeployError> {
    let apt = session.apt();
    apt.install(&[session.descriptor.name()])?
        .check(apt.program())?;
    Ok(())
}

/// Purges the descriptor's package; the default `Deploy::uninstall`.
pub fn package_purge(session: &Session<'_>) -> Result<(), DeployError> {
    let apt = session.apt();
    apt.purge(&[session.descriptor.name()])?
        .check(apt.program())?;
    Ok(())
}

/// The lifecycle contract of a tool family.
///
/// Every method has a default, so a plain distribution package implements nothing at
/// all. Families override the hooks that differ: a source-fetched plugin manager picks
/// the prefix probe, clones in `acquire` and edits a resource file in `configure`.
pub trait Deploy {
    /// How existence is decided. Defaults to running `<command> --version`.
    fn probe_strategy(&self) -> ProbeStrategy {
        ProbeStrategy::CommandVersion
    }

    /// Privilege level the process must have before anything runs.
    fn required_privilege(&self) -> PrivilegeRequirement {
        PrivilegeRequirement::Any
    }

    fn probe(&self, session: &Session<'_>) -> ProbeReport {
        probe::probe(self.probe_strategy(), session.descriptor, session.runner)
    }

    /// Download or clone. An error here aborts the tool.
    fn acquire(&self, _session: &Session<'_>) -> Result<(), DeployError> {
        Ok(())
    }

    fn unpack(&self, _session: &Session<'_>) -> Result<(), DeployError> {
        Ok(())
    }

    fn build(&self, _session: &Session<'_>) -> Result<(), DeployError> {
        Ok(())
    }

    fn install(&self, session: &Session<'_>) -> Result<(), DeployError> {
        package_install(session)
    }

    fn clean(&self, _session: &Session<'_>) -> Result<(), DeployError> {
        Ok(())
    }

    /// Runs on every install-direction invocation that was not aborted, so it must be
    /// idempotent on its own.
    fn configure(&self, _session: &Session<'_>) -> Result<(), DeployError> {
        Ok(())
    }

    fn uninstall(&self, session: &Session<'_>) -> Result<(), DeployError> {
        package_purge(session)
    }
}

/// Drives specializations through the lifecycle for one resolved identity.
pub struct Deployer<'a> {
    context: &'a DeployContext,
    runner: &'a dyn CommandRunner,
}

impl<'a> Deployer<'a> {
    pub fn new(context: &'a DeployContext, runner: &'a dyn CommandRunner) -> Self {
        Deployer { context, runner }
    }

    /// The privilege gate. Checked by `deploy` itself, and up front by callers that
    /// want to refuse a whole selection before touching anything.
    pub fn check_privilege(
        &self,
        spec: &dyn Deploy,
        descriptor: &ToolDescriptor,
    ) -> Result<(), DeployError> {
        let required = spec.required_privilege();
        if required.satisfied_by(self.context.elevated) {
            Ok(())
        } else {
            Err(DeployError::PrivilegeMismatch {
                tool: descriptor.command().to_string(),
                required,
            })
        }
    }

    /// Runs the probe only, recording any detected version. Used by `--list`.
    pub fn probe(&self, spec: &dyn Deploy, descriptor: &mut ToolDescriptor) -> ProbeReport {
        let report = {
            let session = self.session(descriptor);
            spec.probe(&session)
        };
        if let Some(version) = &report.detected_version {
            descriptor.record_version(version.clone());
        }
        report
    }

    /// Takes one tool to a terminal state.
    ///
    /// # Returns
    /// * `Ok(DeploymentReport)` for every per-tool outcome, including aborted tools and
    ///   swallowed hook failures.
    /// * `Err(DeployError::PrivilegeMismatch)` when the gate refuses; nothing ran.
    pub fn deploy(
        &self,
        spec: &dyn Deploy,
        descriptor: &mut ToolDescriptor,
        direction: Direction,
    ) -> Result<DeploymentReport, DeployError> {
        let _span =
            tracing::info_span!("deploy", tool = %descriptor.command(), %direction).entered();

        self.check_privilege(spec, descriptor)?;
        tracing::debug!(state = "start");

        let probe = self.probe(spec, descriptor);
        tracing::debug!(state = "existence_checked", outcome = %probe.outcome);

        let session = self.session(descriptor);
        let label = descriptor.label();
        let mut failures = Vec::new();

        let terminal = match direction {
            Direction::Install => {
                let terminal = if probe.outcome.needs_install() {
                    log_info!(
                        "[Deploy] {} is {}; deploying",
                        label.bold(),
                        probe.outcome.to_string().yellow()
                    );
                    if let Err(e) = spec.acquire(&session) {
                        log_error!(
                            "[Deploy] {} aborted: {}",
                            label.bold().red(),
                            e.to_string().red()
                        );
                        failures.push(HookFailure {
                            hook: Hook::Acquire,
                            message: e.to_string(),
                        });
                        tracing::debug!(state = "aborted");
                        let terminal = Terminal::Aborted;
                        return Ok(self.report(descriptor, direction, probe, terminal, failures));
                    }
                    tracing::debug!(state = "acquired");

                    for hook in &Hook::ACQUISITION_CHAIN[1..] {
                        self.run_hook(spec, *hook, &session, &mut failures);
                    }
                    Terminal::Cleaned
                } else {
                    log_info!(
                        "[Deploy] {} {} has existed",
                        label.bold().green(),
                        descriptor.current_version().unwrap_or_default()
                    );
                    Terminal::Skipped
                };

                // Configuration state is independent of installation state.
                self.run_hook(spec, Hook::Configure, &session, &mut failures);
                terminal
            }
            Direction::Uninstall => {
                if probe.outcome.is_present() {
                    self.run_hook(spec, Hook::Uninstall, &session, &mut failures);
                    Terminal::Uninstalled
                } else {
                    log_warn!("[Deploy] {} not installed yet", label.yellow());
                    Terminal::WarnNotInstalled
                }
            }
        };

        tracing::debug!(state = ?terminal, failures = failures.len());
        Ok(self.report(descriptor, direction, probe, terminal, failures))
    }

    fn session<'s>(&'s self, descriptor: &'s ToolDescriptor) -> Session<'s> {
        Session {
            descriptor,
            context: self.context,
            runner: self.runner,
        }
    }

    /// Runs a best-effort hook, reporting and recording its failure.
    fn run_hook(
        &self,
        spec: &dyn Deploy,
        hook: Hook,
        session: &Session<'_>,
        failures: &mut Vec<HookFailure>,
    ) {
        log_debug!("[Deploy] {}: running {}", session.descriptor.command(), hook);
        let result = match hook {
            Hook::Acquire => spec.acquire(session),
            Hook::Unpack => spec.unpack(session),
            Hook::Build => spec.build(session),
            Hook::Install => spec.install(session),
            Hook::Clean => spec.clean(session),
            Hook::Configure => spec.configure(session),
            Hook::Uninstall => spec.uninstall(session),
        };
        match result {
            Ok(()) => tracing::debug!(hook = %hook, state = "done"),
            Err(e) => {
                log_error!(
                    "[Deploy] {} {} failed: {}",
                    session.descriptor.label().bold().red(),
                    hook,
                    e.to_string().red()
                );
                tracing::debug!(hook = %hook, state = "failed");
                failures.push(HookFailure {
                    hook,
                    message: e.to_string(),
                });
            }
        }
    }

    fn report(
        &self,
        descriptor: &ToolDescriptor,
        direction: Direction,
        probe: ProbeReport,
        terminal: Terminal,
        failures: Vec<HookFailure>,
    ) -> DeploymentReport {
        DeploymentReport {
            tool: descriptor.command().to_string(),
            direction,
            probe: probe.outcome,
            terminal,
            failures,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::libs::utilities::command::testing::ScriptedRunner;
    use crate::schemas::deployment::ProbeOutcome;
    use std::cell::RefCell;

    /// A specialization whose probe result and failing hooks are fixed up front and
    /// which records every hook the driver calls.
    struct Recorder {
        outcome: ProbeOutcome,
        version: Option<&'static str>,
        failing: Vec<Hook>,
        privilege: PrivilegeRequirement,
        calls: RefCell<Vec<Hook>>,
    }

    impl Recorder {
        fn new(outcome: ProbeOutcome) -> Self {
            Recorder {
                outcome,
                version: None,
                failing: Vec::new(),
                privilege: PrivilegeRequirement::Any,
                calls: RefCell::new(Vec::new()),
            }
        }

        fn failing(mut self, hook: Hook) -> Self {
            self.failing.push(hook);
            self
        }

        fn record(&self, hook: Hook) -> Result<(), DeployError> {
            self.calls.borrow_mut().push(hook);
            if self.failing.contains(&hook) {
                Err(DeployError::Acquisition {
                    tool: "recorder".to_string(),
                    reason: format!("{} scripted to fail", hook),
                })
            } else {
                Ok(())
            }
        }

        fn calls(&self) -> Vec<Hook> {
            self.calls.borrow().clone()
        }
    }

    impl Deploy for Recorder {
        fn required_privilege(&self) -> PrivilegeRequirement {
            self.privilege
        }
        fn probe(&self, _session: &Session<'_>) -> ProbeReport {
            ProbeReport {
                outcome: self.outcome,
                detected_version: self.version.map(str::to_string),
            }
        }
        fn acquire(&self, _s: &Session<'_>) -> Result<(), DeployError> {
            self.record(Hook::Acquire)
        }
        fn unpack(&self, _s: &Session<'_>) -> Result<(), DeployError> {
            self.record(Hook::Unpack)
        }
        fn build(&self, _s: &Session<'_>) -> Result<(), DeployError> {
            self.record(Hook::Build)
        }
        fn install(&self, _s: &Session<'_>) -> Result<(), DeployError> {
            self.record(Hook::Install)
        }
        fn clean(&self, _s: &Session<'_>) -> Result<(), DeployError> {
            self.record(Hook::Clean)
        }
        fn configure(&self, _s: &Session<'_>) -> Result<(), DeployError> {
            self.record(Hook::Configure)
        }
        fn uninstall(&self, _s: &Session<'_>) -> Result<(), DeployError> {
            self.record(Hook::Uninstall)
        }
    }

    fn run(
        spec: &Recorder,
        direction: Direction,
        elevated: bool,
    ) -> Result<DeploymentReport, DeployError> {
        let mut context = DeployContext::for_user("u", "/home/u");
        context.elevated = elevated;
        let runner = ScriptedRunner::new();
        let mut descriptor = ToolDescriptor::package("tool", "tool");
        Deployer::new(&context, &runner).deploy(spec, &mut descriptor, direction)
    }

    const FULL_SEQUENCE: [Hook; 6] = [
        Hook::Acquire,
        Hook::Unpack,
        Hook::Build,
        Hook::Install,
        Hook::Clean,
        Hook::Configure,
    ];

    #[test]
    fn test_satisfied_tool_only_configures() {
        let spec = Recorder::new(ProbeOutcome::Satisfied);
        let report = run(&spec, Direction::Install, false).unwrap();
        assert_eq!(report.terminal, Terminal::Skipped);
        assert_eq!(spec.calls(), vec![Hook::Configure]);
    }

    #[test]
    fn test_missing_tool_runs_full_sequence_in_order() {
        for outcome in [
            ProbeOutcome::Absent,
            ProbeOutcome::Insufficient,
            ProbeOutcome::Indeterminate,
        ] {
            let spec = Recorder::new(outcome);
            let report = run(&spec, Direction::Install, false).unwrap();
            assert_eq!(report.terminal, Terminal::Cleaned);
            assert_eq!(spec.calls(), FULL_SEQUENCE.to_vec(), "outcome {}", outcome);
            assert!(report.is_clean());
        }
    }

    #[test]
    fn test_acquire_failure_aborts_everything() {
        let spec = Recorder::new(ProbeOutcome::Absent).failing(Hook::Acquire);
        let report = run(&spec, Direction::Install, false).unwrap();
        assert_eq!(report.terminal, Terminal::Aborted);
        assert_eq!(spec.calls(), vec![Hook::Acquire]);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].hook, Hook::Acquire);
    }

    #[test]
    fn test_other_hook_failures_do_not_stop_the_sequence() {
        let spec = Recorder::new(ProbeOutcome::Absent)
            .failing(Hook::Build)
            .failing(Hook::Install);
        let report = run(&spec, Direction::Install, false).unwrap();
        assert_eq!(report.terminal, Terminal::Cleaned);
        assert_eq!(spec.calls(), FULL_SEQUENCE.to_vec());
        let failed: Vec<Hook> = report.failures.iter().map(|f| f.hook).collect();
        assert_eq!(failed, vec![Hook::Build, Hook::Install]);
        assert!(!report.is_clean());
    }

    #[test]
    fn test_uninstall_absent_tool_only_warns() {
        let spec = Recorder::new(ProbeOutcome::Absent);
        let report = run(&spec, Direction::Uninstall, false).unwrap();
        assert_eq!(report.terminal, Terminal::WarnNotInstalled);
        assert!(spec.calls().is_empty());
    }

    #[test]
    fn test_uninstall_present_tool() {
        for outcome in [
            ProbeOutcome::Satisfied,
            ProbeOutcome::Insufficient,
            ProbeOutcome::Indeterminate,
        ] {
            let spec = Recorder::new(outcome);
            let report = run(&spec, Direction::Uninstall, false).unwrap();
            assert_eq!(report.terminal, Terminal::Uninstalled);
            assert_eq!(spec.calls(), vec![Hook::Uninstall]);
        }
    }

    #[test]
    fn test_failed_uninstall_is_reported() {
        let spec = Recorder::new(ProbeOutcome::Satisfied).failing(Hook::Uninstall);
        let report = run(&spec, Direction::Uninstall, false).unwrap();
        assert_eq!(report.terminal, Terminal::Uninstalled);
        assert_eq!(report.failures.len(), 1);
    }

    #[test]
    fn test_privilege_gate_runs_before_anything() {
        let mut spec = Recorder::new(ProbeOutcome::Absent);
        spec.privilege = PrivilegeRequirement::Elevated;
        let err = run(&spec, Direction::Install, false).unwrap_err();
        assert!(err.is_fatal());
        assert!(spec.calls().is_empty());

        // The same specialization is fine once elevated.
        assert!(run(&spec, Direction::Install, true).is_ok());

        let mut spec = Recorder::new(ProbeOutcome::Satisfied);
        spec.privilege = PrivilegeRequirement::Elevated;
        assert!(run(&spec, Direction::Uninstall, false).unwrap_err().is_fatal());
        assert!(spec.calls().is_empty());
    }

    #[test]
    fn test_detected_version_is_recorded_once() {
        let mut spec = Recorder::new(ProbeOutcome::Satisfied);
        spec.version = Some("5.8.1");
        let context = DeployContext::for_user("u", "/home/u");
        let runner = ScriptedRunner::new();
        let mut descriptor = ToolDescriptor::package("zsh", "zsh");
        assert_eq!(descriptor.current_version(), None);
        Deployer::new(&context, &runner)
            .deploy(&spec, &mut descriptor, Direction::Install)
            .unwrap();
        assert_eq!(descriptor.current_version(), Some("5.8.1"));
    }

    #[test]
    fn test_default_hooks_use_the_package_manager() {
        struct Plain;
        impl Deploy for Plain {}

        let context = DeployContext::for_user("u", "/home/u");
        let runner = ScriptedRunner::new().missing("gdb");
        let mut descriptor = ToolDescriptor::package("gdb", "gdb");
        let report = Deployer::new(&context, &runner)
            .deploy(&Plain, &mut descriptor, Direction::Install)
            .unwrap();
        assert_eq!(report.terminal, Terminal::Cleaned);
        assert_eq!(
            runner.call_lines(),
            vec!["gdb --version", "sudo apt-get install -y gdb"]
        );
    }
}
