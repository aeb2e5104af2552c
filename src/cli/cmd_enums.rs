use clap::Parser;
use std::path::PathBuf;

use crate::schemas::deployment::Direction;

/// Defines the command-line interface (CLI) for 'setup-devtools'.
/// `#[derive(Parser)]` automatically generates argument parsing code via `clap`.
#[derive(Parser, Debug)]
#[command(name = "setup-devtools")]
#[command(version)]
#[command(
    about = "Deploy and configure development tools for the invoking user",
    long_about = None
)]
pub struct Cli {
    /// Tools to act on, by command (e.g. `ag`) or package name (e.g. `silversearcher-ag`).
    #[arg(value_name = "TOOL")]
    pub(crate) tools: Vec<String>,

    /// Install the selected tools (the default).
    #[arg(short, long, conflicts_with = "uninst")]
    pub(crate) install: bool,

    /// Uninstall the selected tools instead.
    #[arg(short, long)]
    pub(crate) uninst: bool,

    /// List the catalog, with what is installed, and exit.
    #[arg(short, long)]
    pub(crate) list: bool,

    /// Do not ask for confirmation before uninstalling.
    #[arg(short, long)]
    pub(crate) yes: bool,

    /// Enables detailed debug output for troubleshooting and development.
    #[arg(short, long)]
    pub(crate) debug: bool,

    /// Catalog file (YAML or TOML) replacing or extending the built-in tools.
    #[arg(long, env = "SETUP_DEVTOOLS_CATALOG", value_name = "PATH")]
    pub(crate) catalog: Option<PathBuf>,
}

impl Cli {
    pub fn direction(&self) -> Direction {
        if self.uninst {
            Direction::Uninstall
        } else {
            Direction::Install
        }
    }
}
