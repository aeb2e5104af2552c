// Hands files created while running elevated back to the invoking user.
//
// Running through `sudo` means every clone and dotfile we write starts out owned by
// root, which leaves the user unable to edit their own `.zshrc` afterwards.

use std::fs;
use std::os::unix::fs::lchown;
use std::path::{Path, PathBuf};

use colored::Colorize;
use walkdir::WalkDir;

use crate::libs::context::Owner;
use crate::log_debug;
use crate::schemas::errors::DeployError;

/// Chowns `path` to `owner`. A `None` owner (unelevated run) is a no-op.
pub fn hand_over(path: &Path, owner: Option<Owner>) -> Result<(), DeployError> {
    let Some(owner) = owner else {
        return Ok(());
    };
    lchown(path, Some(owner.uid), Some(owner.gid)).map_err(|e| DeployError::io(path, e))?;
    log_debug!(
        "[Ownership] {} handed to {}:{}",
        path.display().to_string().dimmed(),
        owner.uid,
        owner.gid
    );
    Ok(())
}

/// Chowns `root` and everything below it. Symlinks are changed themselves, never followed.
pub fn hand_over_tree(root: &Path, owner: Option<Owner>) -> Result<(), DeployError> {
    let Some(owner) = owner else {
        return Ok(());
    };
    let mut count = 0usize;
    for entry in WalkDir::new(root).follow_links(false) {
        let entry = entry.map_err(|e| {
            let path = e.path().unwrap_or(root).to_path_buf();
            DeployError::io(path, std::io::Error::other(e))
        })?;
        lchown(entry.path(), Some(owner.uid), Some(owner.gid))
            .map_err(|e| DeployError::io(entry.path(), e))?;
        count += 1;
    }
    log_debug!(
        "[Ownership] {} entries under {} handed to {}:{}",
        count,
        root.display().to_string().dimmed(),
        owner.uid,
        owner.gid
    );
    Ok(())
}

/// Creates `dir` and any missing ancestors, handing every directory it created to
/// `owner`. Directories that already existed keep their ownership.
///
/// # Returns
/// * The directories that were created, outermost first.
pub fn create_dirs_handed_over(
    dir: &Path,
    owner: Option<Owner>,
) -> Result<Vec<PathBuf>, DeployError> {
    let mut missing: Vec<PathBuf> = dir
        .ancestors()
        .take_while(|ancestor| !ancestor.as_os_str().is_empty() && !ancestor.exists())
        .map(Path::to_path_buf)
        .collect();
    missing.reverse();

    fs::create_dir_all(dir).map_err(|e| DeployError::io(dir, e))?;
    for created in &missing {
        hand_over(created, owner)?;
    }
    Ok(missing)
}
