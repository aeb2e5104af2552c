// Tmux Plugin Manager. Cloned into `~/.tmux/plugins/tpm`; configuration declares the
// plugins in `.tmux.conf` and bootstraps tpm with the `run` line, which tmux requires
// to come after the plugin declarations.

use crate::installers::{clone_into_prefix, remove_prefix};
use crate::libs::deployer::{Deploy, Session};
use crate::libs::dotfiles::{append_missing_lines, remove_lines};
use crate::schemas::deployment::ProbeStrategy;
use crate::schemas::errors::DeployError;

/// Lines tpm needs in `.tmux.conf`, in order.
pub const TMUX_CONF_LINES: [&str; 4] = [
    "set -g @plugin 'tmux-plugins/tpm'",
    "set -g @plugin 'tmux-plugins/tmux-sensible'",
    "set -g @plugin 'tmux-plugins/tmux-resurrect'",
    "run '~/.tmux/plugins/tpm/tpm'",
];

pub struct Tpm;

impl Deploy for Tpm {
    fn probe_strategy(&self) -> ProbeStrategy {
        ProbeStrategy::InstallPrefix
    }

    fn acquire(&self, session: &Session<'_>) -> Result<(), DeployError> {
        clone_into_prefix(session)
    }

    fn install(&self, _session: &Session<'_>) -> Result<(), DeployError> {
        Ok(())
    }

    fn configure(&self, session: &Session<'_>) -> Result<(), DeployError> {
        append_missing_lines(
            &session.home_path(".tmux.conf"),
            &TMUX_CONF_LINES,
            session.context.owner,
        )?;
        Ok(())
    }

    /// Removes the checkout and our lines from `.tmux.conf`; the rest of the user's
    /// tmux configuration stays.
    fn uninstall(&self, session: &Session<'_>) -> Result<(), DeployError> {
        remove_prefix(session.prefix()?)?;
        remove_lines(
            &session.home_path(".tmux.conf"),
            &TMUX_CONF_LINES,
            session.context.owner,
        )?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::installers::test_support::temp_home;
    use crate::libs::deployer::Deployer;
    use crate::libs::utilities::command::testing::ScriptedRunner;
    use crate::schemas::deployment::{Direction, ProbeOutcome, Terminal};
    use crate::schemas::descriptor::{ToolDescriptor, ToolKind};
    use std::fs;

    const TPM_URL: &str = "https://github.com/tmux-plugins/tpm.git";

    fn count(contents: &str, line: &str) -> usize {
        contents.lines().filter(|l| l.trim() == line).count()
    }

    #[test]
    fn test_present_tpm_only_configures_idempotently() {
        let (home, context) = temp_home();
        let prefix = home.path().join(".tmux/plugins/tpm");
        fs::create_dir_all(&prefix).unwrap();
        let conf = home.path().join(".tmux.conf");
        fs::write(&conf, "set -g mouse on\nset -g @plugin 'tmux-plugins/tpm'\n").unwrap();

        let runner = ScriptedRunner::new();
        let deployer = Deployer::new(&context, &runner);
        let mut descriptor = ToolDescriptor::source("tpm", ToolKind::Tpm, TPM_URL, &prefix);

        for _ in 0..2 {
            let report = deployer.deploy(&Tpm, &mut descriptor, Direction::Install).unwrap();
            assert_eq!(report.probe, ProbeOutcome::Satisfied);
            assert_eq!(report.terminal, Terminal::Skipped);
        }
        assert!(runner.calls().is_empty());

        let contents = fs::read_to_string(&conf).unwrap();
        assert!(contents.starts_with("set -g mouse on\n"));
        for line in TMUX_CONF_LINES {
            assert_eq!(count(&contents, line), 1, "{}", line);
        }
    }

    #[test]
    fn test_uninstall_keeps_user_configuration() {
        let (home, context) = temp_home();
        let prefix = home.path().join(".tmux/plugins/tpm");
        fs::create_dir_all(&prefix).unwrap();
        let conf = home.path().join(".tmux.conf");
        fs::write(&conf, "set -g mouse on\n").unwrap();

        let runner = ScriptedRunner::new();
        let deployer = Deployer::new(&context, &runner);
        let mut descriptor = ToolDescriptor::source("tpm", ToolKind::Tpm, TPM_URL, &prefix);
        deployer.deploy(&Tpm, &mut descriptor, Direction::Install).unwrap();

        let report = deployer.deploy(&Tpm, &mut descriptor, Direction::Uninstall).unwrap();
        assert_eq!(report.terminal, Terminal::Uninstalled);
        assert!(!prefix.exists());
        assert_eq!(fs::read_to_string(&conf).unwrap(), "set -g mouse on\n");

        let report = deployer.deploy(&Tpm, &mut descriptor, Direction::Uninstall).unwrap();
        assert_eq!(report.terminal, Terminal::WarnNotInstalled);
    }
}
