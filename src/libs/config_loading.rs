use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use colored::Colorize;

use crate::libs::catalog::Catalog;
use crate::libs::context::DeployContext;
use crate::libs::utilities::path_helpers::{default_catalog_path, expand_in_home};
use crate::libs::version::ToolVersion;
use crate::schemas::catalog_file::{CatalogEntry, CatalogFile};
use crate::schemas::descriptor::{ToolDescriptor, ToolKind};
use crate::{log_debug, log_info};

/// Builds the catalog for this invocation: the built-in tools, with the entries of a
/// catalog file applied on top when one is configured.
///
/// # Arguments
/// * `context`: The resolved identity; built-in prefixes and `~` in the file expand to its home.
/// * `explicit`: Path given with `--catalog` (or `SETUP_DEVTOOLS_CATALOG`). It must exist.
///   Without it, `~/.setup-devtools/catalog.yaml` is used when present.
///
/// # Returns
/// * The merged `Catalog`, or an error describing which file or entry is wrong.
pub fn load_catalog(context: &DeployContext, explicit: Option<&Path>) -> Result<Catalog> {
    let mut catalog = Catalog::builtin(context);

    let Some(path) = resolve_catalog_path(explicit, &context.home)? else {
        log_debug!("[Config] No catalog file; using the {} built-in tools", catalog.len());
        return Ok(catalog);
    };

    let file = load_catalog_file(&path)?;
    let (mut replaced, mut added) = (0, 0);
    for entry in file.tools {
        let name = entry.name.clone();
        let descriptor = entry_to_descriptor(entry, &context.home)
            .with_context(|| format!("invalid entry '{}' in {}", name, path.display()))?;
        if catalog.upsert(descriptor) {
            replaced += 1;
        } else {
            added += 1;
        }
    }
    log_info!(
        "[Config] Loaded {}: {} tool(s) replaced, {} added",
        path.display().to_string().cyan(),
        replaced,
        added
    );
    Ok(catalog)
}

/// The catalog file to read, if any.
pub fn resolve_catalog_path(explicit: Option<&Path>, home: &Path) -> Result<Option<PathBuf>> {
    if let Some(path) = explicit {
        let path = expand_in_home(&path.to_string_lossy(), home);
        if !path.is_file() {
            bail!("catalog file {} does not exist", path.display());
        }
        return Ok(Some(path));
    }
    let default = default_catalog_path(home);
    Ok(default.is_file().then_some(default))
}

/// Parses a catalog file, as TOML when it ends in `.toml` and as YAML otherwise.
pub fn load_catalog_file(path: &Path) -> Result<CatalogFile> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("failed to read catalog file {}", path.display()))?;

    let is_toml = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("toml"));

    let file: CatalogFile = if is_toml {
        toml::from_str(&contents)
            .with_context(|| format!("failed to parse {} as TOML", path.display()))?
    } else {
        serde_yaml::from_str(&contents)
            .with_context(|| format!("failed to parse {} as YAML", path.display()))?
    };
    log_debug!(
        "[Config] {} declares {} tool(s)",
        path.display().to_string().cyan(),
        file.tools.len()
    );
    Ok(file)
}

/// Validates one catalog entry and turns it into a descriptor.
///
/// Source-provisioned kinds need `url` and `prefix`, bundles need `packages`, and a
/// `min_version` must be a dotted number.
pub fn entry_to_descriptor(entry: CatalogEntry, home: &Path) -> Result<ToolDescriptor> {
    if entry.name.trim().is_empty() {
        bail!("tool name must not be empty");
    }
    let command = entry.command.clone().unwrap_or_else(|| entry.name.clone());
    let mut descriptor = ToolDescriptor::package(entry.name, command).with_kind(entry.kind);

    if let Some(min_version) = entry.min_version {
        min_version
            .parse::<ToolVersion>()
            .with_context(|| format!("min_version '{}' is not a dotted version", min_version))?;
        descriptor = descriptor.with_min_version(min_version);
    }
    if let Some(url) = entry.url {
        descriptor = descriptor.with_url(url);
    }
    if let Some(branch) = entry.branch {
        descriptor = descriptor.with_branch(branch);
    }
    if let Some(prefix) = entry.prefix {
        descriptor = descriptor.with_prefix(expand_in_home(&prefix, home));
    }
    if !entry.packages.is_empty() {
        descriptor = descriptor.with_packages(entry.packages);
    }

    match entry.kind {
        ToolKind::Fzf | ToolKind::OhMyZsh | ToolKind::Tpm | ToolKind::Vimrc => {
            if descriptor.url().is_none() || descriptor.prefix().is_none() {
                bail!("kind '{}' needs both url and prefix", entry.kind);
            }
        }
        ToolKind::PackageBundle if descriptor.packages().is_empty() => {
            bail!("kind '{}' needs a non-empty packages list", entry.kind);
        }
        _ => {}
    }
    Ok(descriptor)
}
