// Vocabulary shared by the probe, the deployment driver and the specializations:
// which way we are going, which hook is running, what the probe concluded, and
// where a tool's lifecycle ended up.

use serde::Serialize;
use std::fmt;

/// Install or uninstall; selected once per invocation from the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Install,
    Uninstall,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Install => write!(f, "install"),
            Direction::Uninstall => write!(f, "uninstall"),
        }
    }
}

/// The overridable lifecycle steps, in the order the driver runs them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Hook {
    Acquire,
    Unpack,
    Build,
    Install,
    Clean,
    Configure,
    Uninstall,
}

impl Hook {
    /// The acquisition chain run on a probe miss. `Configure` is not part of it:
    /// it runs after the chain, or alone when the chain is skipped.
    pub const ACQUISITION_CHAIN: [Hook; 5] = [
        Hook::Acquire,
        Hook::Unpack,
        Hook::Build,
        Hook::Install,
        Hook::Clean,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Hook::Acquire => "acquire",
            Hook::Unpack => "unpack",
            Hook::Build => "build",
            Hook::Install => "install",
            Hook::Clean => "clean",
            Hook::Configure => "configure",
            Hook::Uninstall => "uninstall",
        }
    }
}

impl fmt::Display for Hook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a specialization decides whether its tool is already there.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeStrategy {
    /// Run `<command> --version` and read the version out of the output.
    CommandVersion,
    /// The install prefix existing on disk means "installed".
    InstallPrefix,
    /// Every package of the descriptor's package list is installed (`dpkg-query`).
    PackageStatus,
}

/// Result of the existence probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ProbeOutcome {
    /// Present, and at least `min_version` when one is required.
    Satisfied,
    /// Present but older than `min_version`.
    Insufficient,
    /// Not installed.
    Absent,
    /// Present, a minimum version is required, but the installed one could not be read.
    Indeterminate,
}

impl ProbeOutcome {
    /// `Indeterminate` is handled like `Insufficient`: an unverifiable version is not trusted.
    pub fn needs_install(&self) -> bool {
        !matches!(self, ProbeOutcome::Satisfied)
    }

    /// Anything but `Absent` counts as installed for the uninstall direction.
    pub fn is_present(&self) -> bool {
        !matches!(self, ProbeOutcome::Absent)
    }
}

impl fmt::Display for ProbeOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ProbeOutcome::Satisfied => "satisfied",
            ProbeOutcome::Insufficient => "insufficient",
            ProbeOutcome::Absent => "absent",
            ProbeOutcome::Indeterminate => "indeterminate",
        };
        f.write_str(s)
    }
}

/// What a specialization demands of the process before the driver lets it run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PrivilegeRequirement {
    /// Runs either way; package installs go through `sudo` when unelevated.
    #[default]
    Any,
    /// Needs root (e.g. changing a login shell with `usermod`).
    Elevated,
}

impl PrivilegeRequirement {
    pub fn satisfied_by(&self, elevated: bool) -> bool {
        match self {
            PrivilegeRequirement::Any => true,
            PrivilegeRequirement::Elevated => elevated,
        }
    }
}

impl fmt::Display for PrivilegeRequirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PrivilegeRequirement::Any => write!(f, "runs with any privilege"),
            PrivilegeRequirement::Elevated => write!(f, "requires root privileges (run with sudo)"),
        }
    }
}

/// Terminal states of the deployment state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Terminal {
    /// Already satisfied; only `configure` ran.
    Skipped,
    /// The acquisition chain ran to the end (possibly with reported hook failures).
    Cleaned,
    /// `acquire` failed; nothing else ran for this tool.
    Aborted,
    /// Uninstall was requested for something that is not installed.
    WarnNotInstalled,
    Uninstalled,
}

impl fmt::Display for Terminal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Terminal::Skipped => "already present",
            Terminal::Cleaned => "deployed",
            Terminal::Aborted => "aborted",
            Terminal::WarnNotInstalled => "not installed",
            Terminal::Uninstalled => "uninstalled",
        };
        f.write_str(s)
    }
}

/// A hook that raised an error the driver swallowed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HookFailure {
    pub hook: Hook,
    pub message: String,
}

/// Everything the driver learned while taking one tool to a terminal state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeploymentReport {
    pub tool: String,
    pub direction: Direction,
    pub probe: ProbeOutcome,
    pub terminal: Terminal,
    pub failures: Vec<HookFailure>,
}

impl DeploymentReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty() && self.terminal != Terminal::Aborted
    }
}
