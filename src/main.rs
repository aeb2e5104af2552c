// Entry point of `setup-devtools`.
//
// Resolves who we deploy for, builds the catalog, then either lists it or runs the
// selected tools through the deployment driver. Exit status is 0 unless a fatal
// precondition (privilege mismatch, unreadable catalog, unknown user) stops the run;
// failures of individual tools are reported but do not change it.

mod cli;
mod commands;
mod installers;
mod libs;
mod logger;
mod schemas;

use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;

use crate::cli::cmd_enums::Cli;
use crate::libs::config_loading::load_catalog;
use crate::libs::context::DeployContext;
use crate::libs::deployer::Deployer;
use crate::libs::utilities::command::SystemRunner;

fn main() -> ExitCode {
    let cli = Cli::parse();
    logger::init(cli.debug);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log_error!("{}", format!("{:#}", e).red());
            ExitCode::from(1)
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    log_debug!("[Main] {:?}", cli);
    let context = DeployContext::resolve().context("could not resolve the invoking user")?;
    let mut catalog = load_catalog(&context, cli.catalog.as_deref())?;

    let runner = SystemRunner;
    let deployer = Deployer::new(&context, &runner);

    if cli.list {
        commands::list::run(&mut catalog, &deployer);
        return Ok(());
    }

    let selected = catalog.select(&cli.tools);
    commands::deploy::run(&mut catalog, &selected, cli.direction(), &deployer, cli.yes)?;
    Ok(())
}
