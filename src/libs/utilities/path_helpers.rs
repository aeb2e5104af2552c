// Path expansion against the resolved context home rather than the process's `HOME`,
// which under `sudo` may well be root's.

use std::path::{Path, PathBuf};

use colored::Colorize;

use crate::log_debug;

/// Directory holding the catalog override file, below the user's home.
pub const APP_DIR: &str = ".setup-devtools";

/// Expands a leading `~` and any `$HOME`/`${HOME}` in `raw` to `home`.
///
/// Other variables are looked up in the process environment; unknown ones are left
/// untouched instead of failing.
///
/// # Arguments
/// * `raw`: The path as written in a catalog file, e.g. `~/.tmux/plugins/tpm`.
/// * `home`: Home directory of the user being deployed for.
///
/// # Returns
/// * The expanded path.
pub fn expand_in_home(raw: &str, home: &Path) -> PathBuf {
    let home_str = home.to_string_lossy().into_owned();

    let with_vars = shellexpand::env_with_context_no_errors(raw, |var: &str| match var {
        "HOME" => Some(home_str.clone()),
        other => std::env::var(other).ok(),
    });
    let expanded = shellexpand::tilde_with_context(&*with_vars, || Some(home_str.clone()));

    let path = PathBuf::from(expanded.into_owned());
    log_debug!(
        "[Paths] '{}' expanded to {}",
        raw,
        path.display().to_string().cyan()
    );
    path
}

/// `<home>/.setup-devtools/catalog.yaml`, the catalog file looked for by default.
pub fn default_catalog_path(home: &Path) -> PathBuf {
    home.join(APP_DIR).join("catalog.yaml")
}
