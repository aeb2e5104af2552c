// Low-level helpers shared by the core and the specializations.

// Running external programs behind the `CommandRunner` seam.
pub mod command;
// Handing files created under sudo back to the invoking user.
pub mod ownership;
// `~` and `$HOME` expansion against the resolved home.
pub mod path_helpers;
