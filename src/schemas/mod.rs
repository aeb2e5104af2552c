// Data shapes shared across the crate.

// Shape of the optional catalog override file.
pub mod catalog_file;
// Probe outcomes, hooks, directions and terminal states.
pub mod deployment;
// The tool descriptor and its specialization tag.
pub mod descriptor;
// `thiserror` enums for versions, external commands and deployments.
pub mod errors;
