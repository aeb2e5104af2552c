// `--list`: the catalog as a table on stdout, with what the probe finds for each tool.

use prettytable::{Cell, Row, Table, format};

use crate::installers::specialization_for;
use crate::libs::catalog::Catalog;
use crate::libs::deployer::Deployer;
use crate::log_debug;
use crate::schemas::deployment::ProbeOutcome;

/// Probes every tool of the catalog and prints the table.
pub fn run(catalog: &mut Catalog, deployer: &Deployer<'_>) {
    let table = build_table(catalog, deployer);
    table.printstd();
}

/// One row per tool: command, package, kind, minimum and detected version, status.
pub fn build_table(catalog: &mut Catalog, deployer: &Deployer<'_>) -> Table {
    let mut table = Table::new();
    table.set_format(*format::consts::FORMAT_NO_BORDER_LINE_SEPARATOR);
    table.set_titles(Row::new(
        ["COMMAND", "PACKAGE", "KIND", "MIN VERSION", "VERSION", "STATUS"]
            .iter()
            .map(|title| Cell::new(title).style_spec("b"))
            .collect(),
    ));

    for index in 0..catalog.len() {
        let Some(descriptor) = catalog.get_mut(index) else {
            continue;
        };
        let spec = specialization_for(descriptor.kind());
        let report = deployer.probe(spec.as_ref(), descriptor);
        if let Ok(json) = serde_json::to_string(&*descriptor) {
            log_debug!("[List] {}", json);
        }

        let status_style = match report.outcome {
            ProbeOutcome::Satisfied => "Fg",
            ProbeOutcome::Insufficient | ProbeOutcome::Indeterminate => "Fy",
            ProbeOutcome::Absent => "Fr",
        };
        table.add_row(Row::new(vec![
            Cell::new(descriptor.command()).style_spec("Fc"),
            Cell::new(descriptor.name()),
            Cell::new(descriptor.kind().as_str()),
            Cell::new(descriptor.min_version().unwrap_or("-")),
            Cell::new(descriptor.current_version().unwrap_or("-")),
            Cell::new(&report.outcome.to_string()).style_spec(status_style),
        ]));
    }
    table
}
