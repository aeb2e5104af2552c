//! # External Command Execution
//!
//! Every external program this crate touches (`apt-get`, `git`, `dpkg-query`, `usermod`,
//! the tools' own `--version` and installer scripts) goes through a `CommandRunner`.
//! The runner never interprets exit statuses: it hands back a `CommandOutput` and the
//! calling hook decides whether a non-zero exit is fatal for its tool or ignorable.
//!
//! Two modes are supported:
//! - **Captured**: stdout/stderr are collected (probes, queries).
//! - **Interactive**: stdio is inherited so the user sees `apt-get` progress and can
//!   answer installer prompts; only the exit status comes back.

use std::io::{ErrorKind, Write};
use std::process::{Command, Stdio};

use colored::Colorize;

use crate::log_debug;
use crate::schemas::errors::{CommandError, DeployError};

/// A fully described invocation of an external program.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub program: String,
    pub args: Vec<String>,
    /// Inherit the terminal instead of capturing output.
    pub interactive: bool,
    /// Fed to the child's stdin, then the pipe is closed.
    pub stdin: Option<String>,
}

impl CommandSpec {
    pub fn new(program: impl Into<String>) -> Self {
        CommandSpec {
            program: program.into(),
            args: Vec::new(),
            interactive: false,
            stdin: None,
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn interactive(mut self) -> Self {
        self.interactive = true;
        self
    }

    pub fn stdin(mut self, input: impl Into<String>) -> Self {
        self.stdin = Some(input.into());
        self
    }

    /// `program arg1 arg2`, for log lines.
    pub fn display(&self) -> String {
        if self.args.is_empty() {
            self.program.clone()
        } else {
            format!("{} {}", self.program, self.args.join(" "))
        }
    }
}

/// What a finished program left behind.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    /// `None` when the process was killed by a signal.
    pub status: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.status == Some(0)
    }

    /// Exit status for messages; `-1` stands in for "terminated by signal".
    pub fn code(&self) -> i32 {
        self.status.unwrap_or(-1)
    }

    /// Turns a non-zero exit into `DeployError::CommandFailed`, for hooks that
    /// treat failure of `program` as failure of the hook.
    pub fn check(self, program: &str) -> Result<Self, DeployError> {
        if self.success() {
            Ok(self)
        } else {
            Err(DeployError::CommandFailed {
                program: program.to_string(),
                status: self.code(),
                stderr: self.stderr.trim().to_string(),
            })
        }
    }
}

/// Seam between the hooks and the operating system.
pub trait CommandRunner {
    fn run(&self, spec: &CommandSpec) -> Result<CommandOutput, CommandError>;
}

/// Runs commands for real with `std::process::Command`.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    fn run(&self, spec: &CommandSpec) -> Result<CommandOutput, CommandError> {
        log_debug!("[Command] Executing: {}", spec.display().cyan());

        let mut command = Command::new(&spec.program);
        command.args(&spec.args);

        if spec.interactive {
            command.stdout(Stdio::inherit()).stderr(Stdio::inherit());
        } else {
            command.stdout(Stdio::piped()).stderr(Stdio::piped());
        }
        command.stdin(if spec.stdin.is_some() {
            Stdio::piped()
        } else if spec.interactive {
            Stdio::inherit()
        } else {
            Stdio::null()
        });

        let spawn_error = |source: std::io::Error| {
            if source.kind() == ErrorKind::NotFound {
                CommandError::NotFound(spec.program.clone())
            } else {
                CommandError::Spawn {
                    program: spec.program.clone(),
                    source,
                }
            }
        };

        let mut child = command.spawn().map_err(spawn_error)?;

        if let (Some(input), Some(mut pipe)) = (&spec.stdin, child.stdin.take()) {
            // The child may exit before reading everything (e.g. after the first "y").
            match pipe.write_all(input.as_bytes()) {
                Err(e) if e.kind() != ErrorKind::BrokenPipe => return Err(spawn_error(e)),
                _ => {}
            }
        }

        let output = child.wait_with_output().map_err(spawn_error)?;
        let result = CommandOutput {
            status: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        };
        log_debug!(
            "[Command] '{}' finished with status {}",
            spec.program,
            result.code()
        );
        Ok(result)
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! A scripted runner for hook and driver tests.

    use super::*;
    use std::cell::RefCell;
    use std::path::PathBuf;

    /// What the scripted runner should do for a program.
    #[derive(Debug, Clone)]
    pub enum Scripted {
        Output(CommandOutput),
        NotFound,
    }

    /// Answers commands from a script keyed by program name and records every call.
    /// Unscripted programs succeed with empty output.
    #[derive(Default)]
    pub struct ScriptedRunner {
        responses: RefCell<Vec<(String, Scripted)>>,
        calls: RefCell<Vec<CommandSpec>>,
        creates: Vec<(String, PathBuf)>,
    }

    impl ScriptedRunner {
        pub fn new() -> Self {
            Self::default()
        }

        /// Scripts `program` to exit with `status` and print `stdout`.
        pub fn respond(self, program: &str, status: i32, stdout: &str) -> Self {
            self.responses.borrow_mut().push((
                program.to_string(),
                Scripted::Output(CommandOutput {
                    status: Some(status),
                    stdout: stdout.to_string(),
                    stderr: String::new(),
                }),
            ));
            self
        }

        pub fn missing(self, program: &str) -> Self {
            self.responses
                .borrow_mut()
                .push((program.to_string(), Scripted::NotFound));
            self
        }

        /// Makes every run of `program` create `dir`, the way `git clone` leaves a checkout.
        pub fn creates(mut self, program: &str, dir: impl Into<PathBuf>) -> Self {
            self.creates.push((program.to_string(), dir.into()));
            self
        }

        pub fn calls(&self) -> Vec<CommandSpec> {
            self.calls.borrow().clone()
        }

        /// Every recorded call as a single `program args...` string.
        pub fn call_lines(&self) -> Vec<String> {
            self.calls.borrow().iter().map(CommandSpec::display).collect()
        }
    }

    impl CommandRunner for ScriptedRunner {
        fn run(&self, spec: &CommandSpec) -> Result<CommandOutput, CommandError> {
            self.calls.borrow_mut().push(spec.clone());
            for (_, dir) in self.creates.iter().filter(|(p, _)| *p == spec.program) {
                std::fs::create_dir_all(dir).unwrap();
            }
            let responses = self.responses.borrow();
            match responses.iter().rev().find(|(p, _)| *p == spec.program) {
                Some((_, Scripted::Output(out))) => Ok(out.clone()),
                Some((_, Scripted::NotFound)) => {
                    Err(CommandError::NotFound(spec.program.clone()))
                }
                None => Ok(CommandOutput {
                    status: Some(0),
                    ..CommandOutput::default()
                }),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spec_display() {
        let spec = CommandSpec::new("git").args(["clone", "--depth", "1"]);
        assert_eq!(spec.display(), "git clone --depth 1");
        assert_eq!(CommandSpec::new("ls").display(), "ls");
    }

    #[test]
    fn test_system_runner_captures_output() {
        let out = SystemRunner
            .run(&CommandSpec::new("sh").args(["-c", "echo hello; exit 3"]))
            .unwrap();
        assert_eq!(out.status, Some(3));
        assert_eq!(out.stdout.trim(), "hello");
        assert!(!out.success());
    }

    #[test]
    fn test_system_runner_feeds_stdin() {
        let out = SystemRunner
            .run(&CommandSpec::new("sh").args(["-c", "read answer; echo got-$answer"]).stdin("y\n"))
            .unwrap();
        assert!(out.success());
        assert_eq!(out.stdout.trim(), "got-y");
    }

    #[test]
    fn test_system_runner_reports_missing_program() {
        let err = SystemRunner
            .run(&CommandSpec::new("definitely-not-a-real-program-4711"))
            .unwrap_err();
        assert!(
            matches!(err, CommandError::NotFound(p) if p == "definitely-not-a-real-program-4711")
        );
    }
}
