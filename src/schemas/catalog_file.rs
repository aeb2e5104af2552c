// Configuration schema for the optional catalog override file
// (`~/.setup-devtools/catalog.yaml` by default, or `.toml`).
//
// ```yaml
// tools:
//   - name: neovim
//     command: nvim
//     min_version: "0.9"
//   - name: tpm
//     kind: tpm
//     url: https://github.com/tmux-plugins/tpm.git
//     prefix: ~/.tmux/plugins/tpm
// ```

use serde::{Deserialize, Serialize};

use crate::schemas::descriptor::ToolKind;

/// Top-level structure of the catalog file.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct CatalogFile {
    #[serde(default)]
    pub tools: Vec<CatalogEntry>,
}

/// One tool as written by the user. Turned into a `ToolDescriptor` once the
/// prefix has been expanded against the resolved home directory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogEntry {
    // Package name handed to the package manager (or repository name for source tools).
    pub name: String,
    // Executable probed with `--version`; defaults to `name`.
    #[serde(default)]
    pub command: Option<String>,
    #[serde(default)]
    pub kind: ToolKind,
    #[serde(default)]
    pub min_version: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub branch: Option<String>,
    // May start with `~` or reference `$HOME`.
    #[serde(default)]
    pub prefix: Option<String>,
    #[serde(default)]
    pub packages: Vec<String>,
}
