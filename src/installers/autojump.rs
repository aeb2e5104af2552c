// autojump is a plain package; the only extra is enabling its oh-my-zsh plugin.
// Nothing is configured unless oh-my-zsh is installed, and the plugin is inserted
// at the front of the existing `plugins=(...)` block only when it is not listed yet.
// The block may span several lines, one plugin per line.

use std::sync::LazyLock;

use colored::Colorize;
use regex::Regex;

use crate::libs::deployer::{Deploy, Session};
use crate::libs::dotfiles::{read_lines, replace_contents};
use crate::schemas::errors::DeployError;
use crate::{log_debug, log_info, log_warn};

// `plugins=(` at the start of a line up to its closing `)`, newlines included.
static PLUGINS_BLOCK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^plugins=\(([^)]*)\)").expect("plugin pattern is a valid regex")
});

const PLUGINS_OPEN: &str = "plugins=(";

pub struct Autojump;

impl Deploy for Autojump {
    fn configure(&self, session: &Session<'_>) -> Result<(), DeployError> {
        if !session.home_path(".oh-my-zsh").exists() {
            log_debug!("[Autojump] oh-my-zsh is not installed; no plugin to enable");
            return Ok(());
        }
        let zshrc = session.home_path(".zshrc");
        let mut contents = read_lines(&zshrc)?.join("\n");
        contents.push('\n');

        if lists_autojump(&contents) {
            log_info!("[Autojump] {} is already among the zsh plugins", "autojump".green());
            return Ok(());
        }

        let Some(updated) = with_autojump(&contents) else {
            log_warn!(
                "[Autojump] No plugins=(...) block in {}; add autojump to it yourself",
                zshrc.display().to_string().yellow()
            );
            return Ok(());
        };

        replace_contents(&zshrc, &updated, session.context.owner)?;
        log_info!(
            "[Autojump] {} updated, please open a new terminal",
            zshrc.display().to_string().green()
        );
        Ok(())
    }
}

/// Whether any `plugins=(...)` block in `contents` lists autojump.
fn lists_autojump(contents: &str) -> bool {
    PLUGINS_BLOCK
        .captures_iter(contents)
        .any(|caps| caps[1].split_whitespace().any(|plugin| plugin == "autojump"))
}

/// `contents` with autojump inserted at the front of the first plugin block.
fn with_autojump(contents: &str) -> Option<String> {
    let block = PLUGINS_BLOCK.find(contents)?;
    let at = block.start() + PLUGINS_OPEN.len();
    let rest = &contents[at..];
    let plugin = if rest.starts_with(|c: char| c == ')' || c.is_whitespace()) {
        "autojump"
    } else {
        "autojump "
    };
    Some(format!("{}{}{}", &contents[..at], plugin, rest))
}
