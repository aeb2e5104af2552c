// The ultimate vim configuration, from a fork carrying cscope key maps. Cloned into
// `~/.vim_runtime`; its installer script writes a `.vimrc` that sources the runtime.

use std::fs;

use colored::Colorize;

use crate::installers::{clone_into_prefix, remove_prefix};
use crate::libs::deployer::{Deploy, Session};
use crate::libs::dotfiles::backup;
use crate::libs::utilities::command::CommandSpec;
use crate::libs::utilities::ownership::hand_over;
use crate::schemas::deployment::ProbeStrategy;
use crate::schemas::errors::DeployError;
use crate::log_info;

pub struct Vimrc;

impl Deploy for Vimrc {
    fn probe_strategy(&self) -> ProbeStrategy {
        ProbeStrategy::InstallPrefix
    }

    fn acquire(&self, session: &Session<'_>) -> Result<(), DeployError> {
        clone_into_prefix(session)
    }

    /// Backs up `.vimrc` to `.vimrc.orig`, then runs `install_awesome_vimrc.sh`.
    fn install(&self, session: &Session<'_>) -> Result<(), DeployError> {
        let rc = session.home_path(".vimrc");
        backup(&rc, &session.home_path(".vimrc.orig"), session.context.owner)?;

        let installer = session.prefix()?.join("install_awesome_vimrc.sh");
        let installer = installer.to_string_lossy().into_owned();
        log_info!("[Vimrc] Running {}", installer.cyan());
        session
            .runner
            .run(&CommandSpec::new("sh").arg(installer).interactive())?
            .check("sh")?;
        if rc.exists() {
            hand_over(&rc, session.context.owner)?;
        }
        Ok(())
    }

    /// Removes the runtime and puts the backed-up `.vimrc` back, or deletes ours.
    fn uninstall(&self, session: &Session<'_>) -> Result<(), DeployError> {
        remove_prefix(session.prefix()?)?;

        let rc = session.home_path(".vimrc");
        let rc_backup = session.home_path(".vimrc.orig");
        if rc_backup.exists() {
            fs::rename(&rc_backup, &rc).map_err(|e| DeployError::io(&rc, e))?;
            log_info!("[Vimrc] Restored {}", rc.display().to_string().green());
        } else if rc.exists() {
            fs::remove_file(&rc).map_err(|e| DeployError::io(&rc, e))?;
            log_info!("[Vimrc] Removed {}", rc.display().to_string().cyan());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::installers::test_support::temp_home;
    use crate::libs::deployer::Deployer;
    use crate::libs::utilities::command::testing::ScriptedRunner;
    use crate::schemas::deployment::{Direction, Terminal};
    use crate::schemas::descriptor::{ToolDescriptor, ToolKind};

    const VIMRC_URL: &str = "https://github.com/lucmann/vimrc.git";

    fn descriptor(prefix: &std::path::Path) -> ToolDescriptor {
        ToolDescriptor::source("vimrc", ToolKind::Vimrc, VIMRC_URL, prefix)
            .with_branch("cscope-maps")
    }

    #[test]
    fn test_install_clones_branch_backs_up_and_runs_installer() {
        let (home, context) = temp_home();
        let prefix = home.path().join(".vim_runtime");
        fs::write(home.path().join(".vimrc"), "set nu\n").unwrap();
        let runner = ScriptedRunner::new();
        let mut descriptor = descriptor(&prefix);

        let report = Deployer::new(&context, &runner)
            .deploy(&Vimrc, &mut descriptor, Direction::Install)
            .unwrap();
        assert_eq!(report.terminal, Terminal::Cleaned);
        assert!(report.is_clean());
        assert_eq!(
            runner.call_lines(),
            vec![
                format!(
                    "git clone --depth 1 --branch cscope-maps {} {}",
                    VIMRC_URL,
                    prefix.display()
                ),
                format!("sh {}", prefix.join("install_awesome_vimrc.sh").display()),
            ]
        );
        assert_eq!(
            fs::read_to_string(home.path().join(".vimrc.orig")).unwrap(),
            "set nu\n"
        );
    }

    #[test]
    fn test_uninstall_restores_backup() {
        let (home, context) = temp_home();
        let prefix = home.path().join(".vim_runtime");
        fs::create_dir_all(&prefix).unwrap();
        fs::write(home.path().join(".vimrc"), "source ~/.vim_runtime/vimrcs/basic.vim\n").unwrap();
        fs::write(home.path().join(".vimrc.orig"), "set nu\n").unwrap();
        let runner = ScriptedRunner::new();
        let mut descriptor = descriptor(&prefix);

        Deployer::new(&context, &runner)
            .deploy(&Vimrc, &mut descriptor, Direction::Uninstall)
            .unwrap();
        assert!(!prefix.exists());
        assert!(!home.path().join(".vimrc.orig").exists());
        assert_eq!(fs::read_to_string(home.path().join(".vimrc")).unwrap(), "set nu\n");
    }

    #[test]
    fn test_uninstall_without_backup_removes_vimrc() {
        let (home, context) = temp_home();
        let prefix = home.path().join(".vim_runtime");
        fs::create_dir_all(&prefix).unwrap();
        fs::write(home.path().join(".vimrc"), "source ~/.vim_runtime/vimrcs/basic.vim\n").unwrap();
        let runner = ScriptedRunner::new();
        let mut descriptor = descriptor(&prefix);

        Deployer::new(&context, &runner)
            .deploy(&Vimrc, &mut descriptor, Direction::Uninstall)
            .unwrap();
        assert!(!home.path().join(".vimrc").exists());
    }
}
