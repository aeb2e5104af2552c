// fzf, the command-line fuzzy finder. Cloned into its prefix (`~/.fzf`) and installed
// by its own `install` script, which sets up key bindings and completion for the
// user's shells. The vim plugin shipped in the checkout is enabled through `.vimrc`.

use std::path::Path;

use colored::Colorize;

use crate::installers::{clone_into_prefix, remove_prefix};
use crate::libs::deployer::{Deploy, Session};
use crate::libs::dotfiles::{append_missing_lines, remove_lines};
use crate::libs::utilities::command::CommandSpec;
use crate::schemas::errors::DeployError;
use crate::{log_error, log_info};

pub struct Fzf;

impl Deploy for Fzf {
    fn acquire(&self, session: &Session<'_>) -> Result<(), DeployError> {
        clone_into_prefix(session)
    }

    fn install(&self, session: &Session<'_>) -> Result<(), DeployError> {
        let installer = session.prefix()?.join("install");
        run_script(session, &installer)
    }

    fn configure(&self, session: &Session<'_>) -> Result<(), DeployError> {
        let line = runtimepath_line(session.prefix()?, &session.context.home);
        append_missing_lines(&session.home_path(".vimrc"), &[&line], session.context.owner)?;
        Ok(())
    }

    /// Runs fzf's own `uninstall`, then removes the checkout even when that script failed.
    fn uninstall(&self, session: &Session<'_>) -> Result<(), DeployError> {
        let prefix = session.prefix()?;
        let script = run_script(session, &prefix.join("uninstall"));
        if let Err(e) = &script {
            log_error!("[Fzf] {}", e.to_string().red());
        }
        remove_prefix(prefix)?;

        let line = runtimepath_line(prefix, &session.context.home);
        remove_lines(&session.home_path(".vimrc"), &[&line], session.context.owner)?;
        script
    }
}

fn run_script(session: &Session<'_>, script: &Path) -> Result<(), DeployError> {
    let program = script.to_string_lossy().into_owned();
    log_info!("[Fzf] Running {}", program.cyan());
    session
        .runner
        .run(&CommandSpec::new(program.clone()).interactive())?
        .check(&program)?;
    Ok(())
}

/// `set runtimepath+=<prefix>`, written as `~/...` when the prefix is inside home.
fn runtimepath_line(prefix: &Path, home: &Path) -> String {
    match prefix.strip_prefix(home) {
        Ok(relative) => format!("set runtimepath+=~/{}", relative.display()),
        Err(_) => format!("set runtimepath+={}", prefix.display()),
    }
}
