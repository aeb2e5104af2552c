//! # Tool Descriptor
//!
//! The record describing one deployable tool. Descriptors are built once at startup,
//! either from the built-in catalog or from a catalog override file, and are owned by
//! the `Catalog` for the rest of the process.
//!
//! Only `current_version` ever changes after construction: the existence probe records
//! the version it read from `<command> --version`.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// Which specialization drives a descriptor through the lifecycle.
///
/// Most tools are plain distribution packages and use `Package`; the other variants
/// each name a family with its own acquisition or configuration steps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ToolKind {
    /// Installed and purged through the system package manager, nothing else.
    #[default]
    Package,
    /// A list of packages probed and installed together (e.g. build dependencies).
    PackageBundle,
    Autojump,
    Ctags,
    Fzf,
    Zsh,
    OhMyZsh,
    Tpm,
    Vimrc,
}

impl ToolKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ToolKind::Package => "package",
            ToolKind::PackageBundle => "package-bundle",
            ToolKind::Autojump => "autojump",
            ToolKind::Ctags => "ctags",
            ToolKind::Fzf => "fzf",
            ToolKind::Zsh => "zsh",
            ToolKind::OhMyZsh => "oh-my-zsh",
            ToolKind::Tpm => "tpm",
            ToolKind::Vimrc => "vimrc",
        }
    }
}

impl fmt::Display for ToolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identity and provisioning metadata of one tool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ToolDescriptor {
    name: String,
    command: String,
    kind: ToolKind,
    min_version: Option<String>,
    current_version: Option<String>,
    url: Option<String>,
    branch: Option<String>,
    prefix: Option<PathBuf>,
    packages: Vec<String>,
}

impl ToolDescriptor {
    /// A package-manager tool whose executable is called `command`.
    pub fn package(name: impl Into<String>, command: impl Into<String>) -> Self {
        ToolDescriptor {
            name: name.into(),
            command: command.into(),
            kind: ToolKind::Package,
            min_version: None,
            current_version: None,
            url: None,
            branch: None,
            prefix: None,
            packages: Vec::new(),
        }
    }

    /// A tool cloned from `url` into `prefix`.
    pub fn source(
        name: impl Into<String>,
        kind: ToolKind,
        url: impl Into<String>,
        prefix: impl Into<PathBuf>,
    ) -> Self {
        let name = name.into();
        ToolDescriptor {
            command: name.clone(),
            name,
            kind,
            min_version: None,
            current_version: None,
            url: Some(url.into()),
            branch: None,
            prefix: Some(prefix.into()),
            packages: Vec::new(),
        }
    }

    pub fn with_kind(mut self, kind: ToolKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn with_min_version(mut self, min_version: impl Into<String>) -> Self {
        self.min_version = Some(min_version.into());
        self
    }

    pub fn with_branch(mut self, branch: impl Into<String>) -> Self {
        self.branch = Some(branch.into());
        self
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    pub fn with_prefix(mut self, prefix: impl Into<PathBuf>) -> Self {
        self.prefix = Some(prefix.into());
        self
    }

    pub fn with_packages<I, S>(mut self, packages: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.packages = packages.into_iter().map(Into::into).collect();
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn command(&self) -> &str {
        &self.command
    }

    pub fn kind(&self) -> ToolKind {
        self.kind
    }

    pub fn min_version(&self) -> Option<&str> {
        self.min_version.as_deref()
    }

    pub fn current_version(&self) -> Option<&str> {
        self.current_version.as_deref()
    }

    pub fn url(&self) -> Option<&str> {
        self.url.as_deref()
    }

    pub fn branch(&self) -> Option<&str> {
        self.branch.as_deref()
    }

    pub fn prefix(&self) -> Option<&Path> {
        self.prefix.as_deref()
    }

    pub fn packages(&self) -> &[String] {
        &self.packages
    }

    /// Called by the driver with whatever the probe extracted.
    pub(crate) fn record_version(&mut self, version: String) {
        self.current_version = Some(version);
    }

    /// `name` and `command`, collapsed to one when they match.
    pub fn label(&self) -> String {
        if self.name == self.command {
            self.name.clone()
        } else {
            format!("{} ({})", self.command, self.name)
        }
    }
}
