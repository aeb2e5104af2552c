// Command-line surface of `setup-devtools`.
pub mod cmd_enums;
