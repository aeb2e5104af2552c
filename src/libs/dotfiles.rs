// This module edits the user's resource files (`.zshrc`, `.vimrc`, `.tmux.conf`, `.ctags`).
//
// Every `configure` hook runs on every invocation, so each edit here is idempotent:
// lines are appended only when they are not already present, and whole-file writes
// happen only when the content actually changes. Rewrites go through a temporary file
// in the same directory followed by a rename, so an interrupted run never leaves a
// half-written dotfile behind.

use std::fs;
use std::io::{ErrorKind, Write};
use std::os::unix::fs::PermissionsExt;
use std::path::Path;

use colored::Colorize;
use tempfile::NamedTempFile;

use crate::libs::context::Owner;
use crate::libs::utilities::ownership::{create_dirs_handed_over, hand_over};
use crate::schemas::errors::DeployError;
use crate::{log_debug, log_info};

/// Header written above every block of appended lines.
pub const MANAGED_HEADER: &str = "# Added by setup-devtools";

/// Reads `path` line by line. A missing file reads as empty.
pub fn read_lines(path: &Path) -> Result<Vec<String>, DeployError> {
    match fs::read_to_string(path) {
        Ok(contents) => Ok(contents.lines().map(str::to_string).collect()),
        Err(e) if e.kind() == ErrorKind::NotFound => {
            log_debug!(
                "[Dotfiles] {} does not exist yet. Treating it as empty.",
                path.display().to_string().yellow()
            );
            Ok(Vec::new())
        }
        Err(e) => Err(DeployError::io(path, e)),
    }
}

/// Whether any line of `haystack` equals `needle`, ignoring surrounding whitespace.
pub fn contains_line(haystack: &[String], needle: &str) -> bool {
    let needle = needle.trim();
    haystack.iter().any(|line| line.trim() == needle)
}

/// Appends each of `lines` that `path` does not already contain.
///
/// The file is created when missing. New lines are preceded by `MANAGED_HEADER`.
///
/// # Returns
/// * The lines that were actually appended (empty when everything was already there).
pub fn append_missing_lines(
    path: &Path,
    lines: &[&str],
    owner: Option<Owner>,
) -> Result<Vec<String>, DeployError> {
    let existing = read_lines(path)?;
    let missing: Vec<String> = lines
        .iter()
        .filter(|line| !contains_line(&existing, line))
        .map(|line| line.to_string())
        .collect();

    if missing.is_empty() {
        log_debug!(
            "[Dotfiles] {} already contains every requested line",
            path.display().to_string().cyan()
        );
        return Ok(missing);
    }

    let existed = path.exists();
    let needs_newline = existed
        && fs::read(path)
            .map_err(|e| DeployError::io(path, e))?
            .last()
            .is_some_and(|byte| *byte != b'\n');

    let mut file = fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| DeployError::io(path, e))?;

    let mut block = String::new();
    if needs_newline {
        block.push('\n');
    }
    if existed {
        block.push('\n');
    }
    block.push_str(MANAGED_HEADER);
    block.push('\n');
    for line in &missing {
        block.push_str(line);
        block.push('\n');
    }
    file.write_all(block.as_bytes())
        .map_err(|e| DeployError::io(path, e))?;

    if !existed {
        hand_over(path, owner)?;
    }
    log_info!(
        "[Dotfiles] Appended {} line(s) to {}",
        missing.len().to_string().bold(),
        path.display().to_string().green()
    );
    Ok(missing)
}

/// Removes every line equal (after trimming) to one of `lines`, plus any
/// `MANAGED_HEADER` left without content below it.
///
/// # Returns
/// * Number of content lines removed. A missing file removes nothing.
pub fn remove_lines(
    path: &Path,
    lines: &[&str],
    owner: Option<Owner>,
) -> Result<usize, DeployError> {
    if !path.exists() {
        return Ok(0);
    }
    let existing = read_lines(path)?;
    let kept: Vec<&String> = existing
        .iter()
        .filter(|line| !lines.iter().any(|l| l.trim() == line.trim()))
        .collect();
    let removed = existing.len() - kept.len();
    if removed == 0 {
        return Ok(0);
    }

    // Drop headers that now precede a blank line, another header, or the end of file.
    let mut cleaned: Vec<&str> = Vec::with_capacity(kept.len());
    for (i, line) in kept.iter().enumerate() {
        if line.trim() == MANAGED_HEADER {
            let next = kept.get(i + 1).map(|l| l.trim());
            if matches!(next, None | Some("")) || next == Some(MANAGED_HEADER) {
                continue;
            }
        }
        cleaned.push(line.as_str());
    }
    while cleaned.last().is_some_and(|l| l.trim().is_empty()) {
        cleaned.pop();
    }

    let mut contents = cleaned.join("\n");
    if !contents.is_empty() {
        contents.push('\n');
    }
    replace_contents(path, &contents, owner)?;
    log_info!(
        "[Dotfiles] Removed {} line(s) from {}",
        removed.to_string().bold(),
        path.display().to_string().cyan()
    );
    Ok(removed)
}

/// Copies `path` to `backup` when `path` exists.
///
/// # Returns
/// * `true` if a backup was written.
pub fn backup(path: &Path, backup: &Path, owner: Option<Owner>) -> Result<bool, DeployError> {
    if !path.exists() {
        return Ok(false);
    }
    fs::copy(path, backup).map_err(|e| DeployError::io(backup, e))?;
    hand_over(backup, owner)?;
    log_info!(
        "[Dotfiles] Backed up {} to {}",
        path.display().to_string().cyan(),
        backup.display().to_string().cyan()
    );
    Ok(true)
}

/// Writes `contents` to `path` unless it already holds exactly that. When a `backup_path`
/// is given and the file exists with different content, it is copied there first.
///
/// # Returns
/// * `true` if the file was (re)written.
pub fn write_if_changed(
    path: &Path,
    contents: &str,
    backup_path: Option<&Path>,
    owner: Option<Owner>,
) -> Result<bool, DeployError> {
    match fs::read_to_string(path) {
        Ok(current) if current == contents => {
            log_debug!(
                "[Dotfiles] {} is already up to date",
                path.display().to_string().cyan()
            );
            return Ok(false);
        }
        Ok(_) => {
            if let Some(backup_path) = backup_path {
                backup(path, backup_path, owner)?;
            }
        }
        Err(e) if e.kind() == ErrorKind::NotFound => {}
        Err(e) => return Err(DeployError::io(path, e)),
    }
    replace_contents(path, contents, owner)?;
    log_info!("[Dotfiles] Wrote {}", path.display().to_string().green());
    Ok(true)
}

/// Atomically replaces the contents of `path`, keeping its permission bits
/// (`0644` for a new file) and handing it to `owner`.
pub fn replace_contents(
    path: &Path,
    contents: &str,
    owner: Option<Owner>,
) -> Result<(), DeployError> {
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    create_dirs_handed_over(parent, owner)?;

    let permissions = match fs::metadata(path) {
        Ok(meta) => meta.permissions(),
        Err(_) => fs::Permissions::from_mode(0o644),
    };

    let mut tmp = NamedTempFile::new_in(parent).map_err(|e| DeployError::io(parent, e))?;
    tmp.write_all(contents.as_bytes())
        .map_err(|e| DeployError::io(tmp.path(), e))?;
    fs::set_permissions(tmp.path(), permissions).map_err(|e| DeployError::io(tmp.path(), e))?;
    tmp.persist(path).map_err(|e| DeployError::io(path, e.error))?;

    hand_over(path, owner)
}
