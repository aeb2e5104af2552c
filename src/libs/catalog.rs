//! # Catalog & Selector
//!
//! The flat list of every tool this binary knows how to deploy, and the filter that
//! picks the ones a given invocation acts on.
//!
//! The built-in catalog is fixed at compile time; prefixes are placed under the home
//! directory of the user being deployed for. A catalog file can replace entries (matched
//! by command) or add new ones, see `config_loading`.

use std::collections::HashSet;

use colored::Colorize;

use crate::libs::context::DeployContext;
use crate::log_warn;
use crate::schemas::descriptor::{ToolDescriptor, ToolKind};

/// Build dependencies of Mesa, deployed as the `mesa-deps` bundle.
pub const MESA_BUILD_DEPENDENCIES: [&str; 9] = [
    "bison",
    "expat",
    "flex",
    "libx11-dev",
    "libxcb-randr0-dev",
    "libxext-dev",
    "libxrandr-dev",
    "pkgconf",
    "zlib1g",
];

/// Owns every descriptor for the lifetime of the process.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    tools: Vec<ToolDescriptor>,
}

impl Catalog {
    pub fn new(tools: Vec<ToolDescriptor>) -> Self {
        Catalog { tools }
    }

    /// The built-in tool list for the user described by `context`.
    pub fn builtin(context: &DeployContext) -> Self {
        let home = |rel: &str| context.home_path(rel);
        Catalog::new(vec![
            ToolDescriptor::package("ack", "ack"),
            ToolDescriptor::package("silversearcher-ag", "ag"),
            ToolDescriptor::package("autojump", "autojump").with_kind(ToolKind::Autojump),
            ToolDescriptor::package("cmake", "cmake"),
            ToolDescriptor::package("cscope", "cscope"),
            ToolDescriptor::package("universal-ctags", "ctags").with_kind(ToolKind::Ctags),
            ToolDescriptor::source(
                "fzf",
                ToolKind::Fzf,
                "git@github.com:junegunn/fzf.git",
                home(".fzf"),
            ),
            ToolDescriptor::package("gcc", "gcc"),
            ToolDescriptor::package("g++", "g++"),
            ToolDescriptor::package("gdb", "gdb"),
            ToolDescriptor::package("git", "git"),
            ToolDescriptor::package("meson", "meson"),
            ToolDescriptor::package("python3-pip", "pip3"),
            ToolDescriptor::package("zsh", "zsh")
                .with_kind(ToolKind::Zsh)
                .with_min_version("5.0.8"),
            ToolDescriptor::source(
                "ohmyzsh",
                ToolKind::OhMyZsh,
                "https://github.com/ohmyzsh/ohmyzsh.git",
                home(".oh-my-zsh"),
            ),
            ToolDescriptor::package("tmux", "tmux"),
            ToolDescriptor::source(
                "tpm",
                ToolKind::Tpm,
                "https://github.com/tmux-plugins/tpm.git",
                home(".tmux/plugins/tpm"),
            ),
            ToolDescriptor::source(
                "vimrc",
                ToolKind::Vimrc,
                "https://github.com/lucmann/vimrc.git",
                home(".vim_runtime"),
            )
            .with_branch("cscope-maps"),
            ToolDescriptor::package("mesa-deps", "mesa-deps")
                .with_kind(ToolKind::PackageBundle)
                .with_packages(MESA_BUILD_DEPENDENCIES),
        ])
    }

    pub fn tools(&self) -> &[ToolDescriptor] {
        &self.tools
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut ToolDescriptor> {
        self.tools.get_mut(index)
    }

    /// Replaces the entry with the same command, or appends when there is none.
    ///
    /// # Returns
    /// * `true` if an existing entry was replaced.
    pub fn upsert(&mut self, descriptor: ToolDescriptor) -> bool {
        match self
            .tools
            .iter_mut()
            .find(|existing| existing.command() == descriptor.command())
        {
            Some(existing) => {
                *existing = descriptor;
                true
            }
            None => {
                self.tools.push(descriptor);
                false
            }
        }
    }

    /// Indices of the tools `requested` names, in catalog order, each at most once.
    ///
    /// A requested name matches a tool's command or its package name. Names matching
    /// nothing are reported and ignored.
    pub fn select(&self, requested: &[String]) -> Vec<usize> {
        for name in requested {
            if !self.tools.iter().any(|t| matches_name(t, name)) {
                log_warn!(
                    "[Catalog] Unknown tool '{}'; run with --list to see what is available",
                    name.yellow()
                );
            }
        }

        let wanted: HashSet<&str> = requested.iter().map(String::as_str).collect();
        self.tools
            .iter()
            .enumerate()
            .filter(|(_, tool)| wanted.contains(tool.command()) || wanted.contains(tool.name()))
            .map(|(index, _)| index)
            .collect()
    }
}

fn matches_name(tool: &ToolDescriptor, name: &str) -> bool {
    tool.command() == name || tool.name() == name
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    fn builtin() -> Catalog {
        Catalog::builtin(&DeployContext::for_user("u", "/home/u"))
    }

    #[test]
    fn test_builtin_catalog_commands_are_unique() {
        let catalog = builtin();
        assert_eq!(catalog.len(), 19);
        let commands: HashSet<&str> = catalog.tools().iter().map(|t| t.command()).collect();
        assert_eq!(commands.len(), catalog.len());
    }

    #[test]
    fn test_builtin_prefixes_live_in_context_home() {
        let catalog = builtin();
        let tpm = &catalog.tools()[catalog.select(&["tpm".to_string()])[0]];
        assert_eq!(tpm.prefix(), Some(Path::new("/home/u/.tmux/plugins/tpm")));
        for tool in catalog.tools().iter().filter(|t| t.url().is_some()) {
            assert!(tool.prefix().is_some_and(|p| p.starts_with("/home/u")), "{}", tool.name());
        }
    }

    #[test]
    fn test_select_by_command_or_name_in_catalog_order() {
        let catalog = builtin();
        let requested: Vec<String> = ["zsh", "silversearcher-ag", "ag", "no-such-tool"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let picked: Vec<&str> = catalog
            .select(&requested)
            .into_iter()
            .map(|i| catalog.tools()[i].command())
            .collect();
        assert_eq!(picked, vec!["ag", "zsh"]);
    }

    #[test]
    fn test_select_nothing() {
        assert!(builtin().select(&[]).is_empty());
    }

    #[test]
    fn test_upsert_replaces_by_command() {
        let mut catalog = builtin();
        let len = catalog.len();
        assert!(catalog.upsert(ToolDescriptor::package("zsh", "zsh").with_min_version("5.9")));
        assert_eq!(catalog.len(), len);
        let zsh = &catalog.tools()[catalog.select(&["zsh".to_string()])[0]];
        assert_eq!(zsh.min_version(), Some("5.9"));
        assert_eq!(zsh.kind(), ToolKind::Package);

        assert!(!catalog.upsert(ToolDescriptor::package("neovim", "nvim")));
        assert_eq!(catalog.len(), len + 1);
    }
}
