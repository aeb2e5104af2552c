//! # Package Bundle
//!
//! A descriptor whose `packages` list is deployed as one tool, such as the build
//! dependencies of Mesa. There is no single executable to ask for its version, so the
//! probe queries `dpkg-query` for every package.
//!
//! - `acquire` refreshes the package index. A failed refresh aborts the bundle.
//! - `install` hands only the missing packages to one `apt-get install`.
//! - `uninstall` leaves everything in place. These are shared libraries and headers
//!   that other packages depend on, and purging them is not ours to decide.

use colored::Colorize;

use crate::libs::deployer::{Deploy, Session};
use crate::libs::probe::missing_packages;
use crate::schemas::deployment::ProbeStrategy;
use crate::schemas::errors::DeployError;
use crate::{log_info, log_warn};

pub struct PackageBundle;

impl Deploy for PackageBundle {
    fn probe_strategy(&self) -> ProbeStrategy {
        ProbeStrategy::PackageStatus
    }

    fn acquire(&self, session: &Session<'_>) -> Result<(), DeployError> {
        let apt = session.apt();
        let output = apt.update().map_err(|e| DeployError::Acquisition {
            tool: session.descriptor.name().to_string(),
            reason: e.to_string(),
        })?;
        if !output.success() {
            return Err(DeployError::Acquisition {
                tool: session.descriptor.name().to_string(),
                reason: format!("{} update exited with status {}", apt.program(), output.code()),
            });
        }
        Ok(())
    }

    fn install(&self, session: &Session<'_>) -> Result<(), DeployError> {
        let missing = missing_packages(session.runner, session.descriptor.packages());
        if missing.is_empty() {
            log_info!(
                "[Bundle] Every package of {} is already installed",
                session.descriptor.name().green()
            );
            return Ok(());
        }
        let missing: Vec<&str> = missing.iter().map(String::as_str).collect();
        let apt = session.apt();
        apt.install(&missing)?.check(apt.program())?;
        Ok(())
    }

    fn uninstall(&self, session: &Session<'_>) -> Result<(), DeployError> {
        log_warn!(
            "[Bundle] Leaving the {} packages of {} installed: {}",
            session.descriptor.packages().len(),
            session.descriptor.name().yellow(),
            session.descriptor.packages().join(" ")
        );
        log_warn!("[Bundle] Remove them with apt-get purge if nothing else needs them.");
        Ok(())
    }
}
