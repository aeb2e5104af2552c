// Oh My Zsh, for managing the zsh configuration. Installed by cloning the framework
// into its prefix; the prefix existing is what "installed" means.

use std::fs;
use std::os::unix::fs::PermissionsExt;

use colored::Colorize;

use crate::installers::{clone_into_prefix, remove_prefix};
use crate::libs::deployer::{Deploy, Session};
use crate::libs::dotfiles::{contains_line, read_lines, write_if_changed};
use crate::libs::utilities::command::CommandSpec;
use crate::schemas::deployment::ProbeStrategy;
use crate::schemas::errors::DeployError;
use crate::{log_info, log_warn};

/// The line every oh-my-zsh `.zshrc` carries.
const SOURCE_LINE: &str = "source $ZSH/oh-my-zsh.sh";

pub struct OhMyZsh;

impl Deploy for OhMyZsh {
    fn probe_strategy(&self) -> ProbeStrategy {
        ProbeStrategy::InstallPrefix
    }

    fn acquire(&self, session: &Session<'_>) -> Result<(), DeployError> {
        clone_into_prefix(session)
    }

    // The clone is the installation.
    fn install(&self, _session: &Session<'_>) -> Result<(), DeployError> {
        Ok(())
    }

    /// Installs the framework's `.zshrc` template, keeping the old file as `.zshrc.orig`.
    /// A `.zshrc` that already loads oh-my-zsh is the user's own and stays untouched.
    fn configure(&self, session: &Session<'_>) -> Result<(), DeployError> {
        let zshrc = session.home_path(".zshrc");
        if contains_line(&read_lines(&zshrc)?, SOURCE_LINE) {
            log_info!(
                "[OhMyZsh] {} already loads oh-my-zsh",
                zshrc.display().to_string().green()
            );
            return Ok(());
        }

        let template = session.prefix()?.join("templates").join("zshrc.zsh-template");
        if !template.exists() {
            log_warn!(
                "[OhMyZsh] Template {} not found; {} left as is",
                template.display().to_string().yellow(),
                zshrc.display()
            );
            return Ok(());
        }
        let contents = fs::read_to_string(&template).map_err(|e| DeployError::io(&template, e))?;
        let backup = session.home_path(".zshrc.orig");
        write_if_changed(&zshrc, &contents, Some(&backup), session.context.owner)?;
        Ok(())
    }

    /// Runs the framework's own `tools/uninstall.sh`, answering its confirmation prompt.
    fn uninstall(&self, session: &Session<'_>) -> Result<(), DeployError> {
        let prefix = session.prefix()?;
        let script = prefix.join("tools").join("uninstall.sh");

        if script.exists() {
            fs::set_permissions(&script, fs::Permissions::from_mode(0o764))
                .map_err(|e| DeployError::io(&script, e))?;
            let program = script.to_string_lossy().into_owned();
            log_info!("[OhMyZsh] Running {}", program.cyan());
            session
                .runner
                .run(&CommandSpec::new(program.clone()).stdin("y\n"))?
                .check(&program)?;
        } else {
            log_warn!(
                "[OhMyZsh] {} is missing; removing the checkout only",
                script.display().to_string().yellow()
            );
        }

        if prefix.exists() {
            remove_prefix(prefix)?;
        }
        Ok(())
    }
}
