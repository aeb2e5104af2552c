// universal-ctags: package install plus a `~/.ctags` with our default options.

use crate::libs::deployer::{Deploy, Session};
use crate::libs::dotfiles::write_if_changed;
use crate::schemas::errors::DeployError;

/// Options written to `~/.ctags`.
const CTAGS_OPTIONS: &[&str] = &[
    "--recurse=yes",
    "--exclude=.git",
    "--exclude=build",
    "--exclude=.idea",
    "--exclude=*.swp",
    "--exclude=*.bak",
    "--exclude=*.pyc",
];

pub struct Ctags;

impl Deploy for Ctags {
    /// Rewrites `~/.ctags` only when it differs, keeping the previous one as `~/.ctags.orig`.
    fn configure(&self, session: &Session<'_>) -> Result<(), DeployError> {
        let conf = session.home_path(".ctags");
        let backup = session.home_path(".ctags.orig");
        write_if_changed(&conf, &options_file(), Some(&backup), session.context.owner)?;
        Ok(())
    }
}

fn options_file() -> String {
    let mut contents = CTAGS_OPTIONS.join("\n");
    contents.push('\n');
    contents
}
