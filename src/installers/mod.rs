// This module is the hub of the tool specializations: one zero-sized type per tool
// family, each implementing `Deploy` and overriding only the hooks where the family
// differs from a plain distribution package.
//
// `specialization_for` is the only place that maps a descriptor's `ToolKind` to its
// behaviour. Adding a family means adding a module, a `ToolKind` variant and one arm.

use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use colored::Colorize;

use crate::libs::deployer::{Deploy, Session};
use crate::libs::source_control::shallow_clone;
use crate::libs::utilities::ownership::{create_dirs_handed_over, hand_over_tree};
use crate::schemas::descriptor::ToolKind;
use crate::schemas::errors::DeployError;
use crate::{log_info, log_warn};

/// Adds `autojump` to the oh-my-zsh plugin list.
pub(crate) mod autojump;
/// Writes `~/.ctags`.
pub(crate) mod ctags;
/// Command-line fuzzy finder, cloned and installed with its own script.
pub(crate) mod fzf;
/// Oh My Zsh: clone plus `.zshrc` template.
pub(crate) mod oh_my_zsh;
/// Plain distribution packages.
pub(crate) mod package;
/// Several packages probed and installed as one tool.
pub(crate) mod package_bundle;
/// Tmux Plugin Manager.
pub(crate) mod tpm;
/// The ultimate vim configuration.
pub(crate) mod vimrc;
/// zsh and the login-shell switch.
pub(crate) mod zsh;

/// The specialization that drives descriptors of `kind`.
pub fn specialization_for(kind: ToolKind) -> Box<dyn Deploy> {
    match kind {
        ToolKind::Package => Box::new(package::Package),
        ToolKind::PackageBundle => Box::new(package_bundle::PackageBundle),
        ToolKind::Autojump => Box::new(autojump::Autojump),
        ToolKind::Ctags => Box::new(ctags::Ctags),
        ToolKind::Fzf => Box::new(fzf::Fzf),
        ToolKind::Zsh => Box::new(zsh::Zsh::default()),
        ToolKind::OhMyZsh => Box::new(oh_my_zsh::OhMyZsh),
        ToolKind::Tpm => Box::new(tpm::Tpm),
        ToolKind::Vimrc => Box::new(vimrc::Vimrc),
    }
}

/// Clones the descriptor's repository into its prefix and hands the checkout, along
/// with any parent directories created for it, to the invoking user. An existing
/// checkout (`<prefix>/.git`) is reused as is.
pub(crate) fn clone_into_prefix(session: &Session<'_>) -> Result<(), DeployError> {
    let prefix = session.prefix()?;
    let descriptor = session.descriptor;

    if prefix.join(".git").is_dir() {
        log_info!(
            "[Git] Reusing existing checkout of {} at {}",
            descriptor.name().bold(),
            prefix.display().to_string().cyan()
        );
        return Ok(());
    }
    if let Some(parent) = prefix.parent() {
        create_dirs_handed_over(parent, session.context.owner)?;
    }

    shallow_clone(
        session.runner,
        descriptor.name(),
        session.url()?,
        descriptor.branch(),
        prefix,
    )?;
    hand_over_tree(prefix, session.context.owner)
}

/// Removes an install prefix. A prefix that is already gone is not an error.
pub(crate) fn remove_prefix(prefix: &Path) -> Result<(), DeployError> {
    match fs::remove_dir_all(prefix) {
        Ok(()) => {
            log_info!("[Uninstall] Removed {}", prefix.display().to_string().cyan());
            Ok(())
        }
        Err(e) if e.kind() == ErrorKind::NotFound => {
            log_warn!(
                "[Uninstall] {} was already gone",
                prefix.display().to_string().yellow()
            );
            Ok(())
        }
        Err(e) => Err(DeployError::io(prefix, e)),
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::libs::utilities::command::testing::ScriptedRunner;
    use crate::schemas::deployment::{PrivilegeRequirement, ProbeStrategy};
    use crate::schemas::descriptor::ToolDescriptor;

    #[test]
    fn test_specialization_table() {
        assert_eq!(
            specialization_for(ToolKind::Tpm).probe_strategy(),
            ProbeStrategy::InstallPrefix
        );
        assert_eq!(
            specialization_for(ToolKind::PackageBundle).probe_strategy(),
            ProbeStrategy::PackageStatus
        );
        assert_eq!(
            specialization_for(ToolKind::Package).probe_strategy(),
            ProbeStrategy::CommandVersion
        );
        assert_eq!(
            specialization_for(ToolKind::Zsh).required_privilege(),
            PrivilegeRequirement::Elevated
        );
        assert_eq!(
            specialization_for(ToolKind::Fzf).required_privilege(),
            PrivilegeRequirement::Any
        );
    }

    #[test]
    fn test_clone_reuses_existing_checkout() {
        let (home, context) = test_support::temp_home();
        let prefix = home.path().join(".fzf");
        fs::create_dir_all(prefix.join(".git")).unwrap();
        let descriptor = ToolDescriptor::source("fzf", ToolKind::Fzf, "u.git", &prefix);
        let runner = ScriptedRunner::new();
        let session = Session {
            descriptor: &descriptor,
            context: &context,
            runner: &runner,
        };
        clone_into_prefix(&session).unwrap();
        assert!(runner.calls().is_empty());
    }

    #[test]
    fn test_clone_without_url_is_an_error() {
        let (home, context) = test_support::temp_home();
        let descriptor =
            ToolDescriptor::package("tpm", "tpm").with_prefix(home.path().join("tpm"));
        let runner = ScriptedRunner::new();
        let session = Session {
            descriptor: &descriptor,
            context: &context,
            runner: &runner,
        };
        let err = clone_into_prefix(&session).unwrap_err();
        assert!(matches!(err, DeployError::MissingField { field: "url", .. }));
    }

    #[test]
    fn test_remove_missing_prefix_is_fine() {
        let (home, _context) = test_support::temp_home();
        remove_prefix(&home.path().join("nothing")).unwrap();
    }

    #[test]
    fn test_clone_hands_over_created_parents() {
        use crate::libs::context::Owner;
        use std::os::unix::fs::MetadataExt;

        let (home, mut context) = test_support::temp_home();
        let meta = fs::metadata(home.path()).unwrap();
        let owner = if unsafe { libc::geteuid() } == 0 {
            Owner { uid: 4242, gid: 4242 }
        } else {
            Owner {
                uid: meta.uid(),
                gid: meta.gid(),
            }
        };
        context.elevated = true;
        context.owner = Some(owner);

        let prefix = home.path().join(".tmux/plugins/tpm");
        let descriptor = ToolDescriptor::source("tpm", ToolKind::Tpm, "u.git", &prefix);
        let runner = ScriptedRunner::new().creates("git", &prefix);
        let session = Session {
            descriptor: &descriptor,
            context: &context,
            runner: &runner,
        };
        clone_into_prefix(&session).unwrap();

        for dir in [home.path().join(".tmux"), home.path().join(".tmux/plugins"), prefix] {
            assert_eq!(fs::metadata(&dir).unwrap().uid(), owner.uid, "{}", dir.display());
        }
        assert_eq!(runner.call_lines().len(), 1);
    }
}
