//! # Package Manager Collaborator
//!
//! Thin wrapper around `apt-get`. Installs and purges named packages and refreshes the
//! package index; nothing here resolves dependencies or inspects the apt cache, that is
//! `apt-get`'s job.
//!
//! When the process is not elevated every invocation is prefixed with `sudo`, so package
//! tools can be deployed from a regular shell and `sudo` asks for the password itself.
//! Commands run interactively: the user sees apt's progress output.

use colored::Colorize;

use crate::libs::utilities::command::{CommandOutput, CommandRunner, CommandSpec};
use crate::schemas::errors::CommandError;
use crate::{log_debug, log_info};

const APT_GET: &str = "apt-get";

/// `apt-get`, optionally behind `sudo`.
pub struct Apt<'a> {
    runner: &'a dyn CommandRunner,
    elevated: bool,
}

impl<'a> Apt<'a> {
    pub fn new(runner: &'a dyn CommandRunner, elevated: bool) -> Self {
        Apt { runner, elevated }
    }

    /// `apt-get install -y <packages...>`
    pub fn install(&self, packages: &[&str]) -> Result<CommandOutput, CommandError> {
        log_info!("[Apt] Installing {}", packages.join(" ").bold());
        self.run(&["install", "-y"], packages)
    }

    /// `apt-get purge -y <packages...>`
    pub fn purge(&self, packages: &[&str]) -> Result<CommandOutput, CommandError> {
        log_info!("[Apt] Purging {}", packages.join(" ").bold());
        self.run(&["purge", "-y"], packages)
    }

    /// `apt-get update`
    pub fn update(&self) -> Result<CommandOutput, CommandError> {
        log_info!("[Apt] Refreshing the package index");
        self.run(&["update"], &[])
    }

    /// The program name a failed invocation should be reported under.
    pub fn program(&self) -> &'static str {
        APT_GET
    }

    fn run(&self, subcommand: &[&str], packages: &[&str]) -> Result<CommandOutput, CommandError> {
        let spec = if self.elevated {
            CommandSpec::new(APT_GET)
        } else {
            CommandSpec::new("sudo").arg(APT_GET)
        }
        .args(subcommand.iter().copied())
        .args(packages.iter().copied())
        .interactive();

        log_debug!("[Apt] Executing: {}", spec.display().cyan());
        self.runner.run(&spec)
    }
}
