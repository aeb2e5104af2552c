// Core of `setup-devtools`: identity, catalog, probe, driver and the collaborators
// the lifecycle hooks call into.

pub mod catalog;
pub mod config_loading;
pub mod context;
pub mod deployer;
pub mod dotfiles;
pub mod package_manager;
pub mod probe;
pub mod source_control;
pub mod utilities;
pub mod version;
