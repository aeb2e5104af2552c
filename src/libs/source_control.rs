// Source-control collaborator: shallow clones for source-provisioned tools.
// History is irrelevant to deployment, so every clone is `--depth 1`.

use std::path::Path;

use colored::Colorize;

use crate::libs::utilities::command::{CommandRunner, CommandSpec};
use crate::schemas::errors::DeployError;
use crate::{log_debug, log_info};

/// `git clone --depth 1 [--branch <branch>] <url> <dest>`.
///
/// # Arguments
/// * `tool`: name used in the error when the clone fails.
/// * `branch`: `None` clones the remote's default branch.
///
/// # Returns
/// * `Err(DeployError::Acquisition)` if git is missing or exits non-zero, so the
///   driver aborts the tool.
pub fn shallow_clone(
    runner: &dyn CommandRunner,
    tool: &str,
    url: &str,
    branch: Option<&str>,
    dest: &Path,
) -> Result<(), DeployError> {
    let mut spec = CommandSpec::new("git").args(["clone", "--depth", "1"]);
    if let Some(branch) = branch.filter(|b| !b.is_empty()) {
        spec = spec.args(["--branch", branch]);
    }
    let spec = spec
        .arg(url)
        .arg(dest.to_string_lossy())
        .interactive();

    log_info!(
        "[Git] Cloning {} into {}",
        url.cyan(),
        dest.display().to_string().cyan()
    );
    let failure = |reason: String| DeployError::Acquisition {
        tool: tool.to_string(),
        reason,
    };

    let output = runner
        .run(&spec)
        .map_err(|e| failure(format!("git clone {}: {}", url, e)))?;
    if !output.success() {
        return Err(failure(format!(
            "git clone {} exited with status {}",
            url,
            output.code()
        )));
    }
    log_debug!("[Git] Clone of {} finished", url);
    Ok(())
}
