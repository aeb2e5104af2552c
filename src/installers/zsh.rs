//! # zsh
//!
//! Installed from the distribution like any package, gated on a minimum version
//! (oh-my-zsh needs 5.0.8). `configure` makes it the invoking user's login shell,
//! which means `usermod`, which means this specialization only runs as root.

use std::fs;
use std::path::PathBuf;

use colored::Colorize;

use crate::libs::deployer::{Deploy, Session};
use crate::libs::utilities::command::CommandSpec;
use crate::schemas::deployment::PrivilegeRequirement;
use crate::schemas::errors::DeployError;
use crate::{log_info, log_warn};

const SHELLS_PATH: &str = "/etc/shells";

pub struct Zsh {
    /// List of valid login shells to pick the zsh path from.
    shells_file: PathBuf,
}

impl Default for Zsh {
    fn default() -> Self {
        Zsh {
            shells_file: PathBuf::from(SHELLS_PATH),
        }
    }
}

impl Deploy for Zsh {
    fn required_privilege(&self) -> PrivilegeRequirement {
        PrivilegeRequirement::Elevated
    }

    /// Switches the login shell to the first zsh listed in `/etc/shells`, unless it
    /// already is a zsh.
    fn configure(&self, session: &Session<'_>) -> Result<(), DeployError> {
        let user = &session.context.user;
        if session
            .context
            .login_shell
            .as_deref()
            .is_some_and(|shell| shell.ends_with("/zsh"))
        {
            log_info!("[Zsh] {}'s login shell is already zsh", user.green());
            return Ok(());
        }

        let shells = fs::read_to_string(&self.shells_file)
            .map_err(|e| DeployError::io(&self.shells_file, e))?;
        let Some(zsh) = first_zsh(&shells) else {
            log_warn!(
                "[Zsh] No zsh listed in {}; login shell left unchanged",
                self.shells_file.display().to_string().yellow()
            );
            return Ok(());
        };

        let spec = CommandSpec::new("usermod").args(["--shell", zsh, user.as_str()]);
        session.runner.run(&spec)?.check("usermod")?;
        log_info!(
            "[Zsh] {}'s login shell has changed to {}",
            user.bold(),
            zsh.green()
        );
        log_info!("[Zsh] Log out and back in to see this change");
        Ok(())
    }
}

fn first_zsh(shells: &str) -> Option<&str> {
    shells
        .lines()
        .map(str::trim)
        .filter(|line| !line.starts_with('#'))
        .find(|line| line.contains("/zsh"))
}
