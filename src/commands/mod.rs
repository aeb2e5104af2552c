// Register application actions.
// Each module corresponds to one thing a `setup-devtools` invocation can do.

// Installs or uninstalls the selected tools.
pub mod deploy;
// Prints the catalog with the probe status of every tool.
pub mod list;
