//! Subprocess execution behind a trait so deploy flows can be tested
//! without spawning processes.

use std::fmt;
use std::process::Command;

use camino::Utf8Path;
use tracing::debug;

use crate::error::DeployError;

/// A program and its arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    program: String,
    args: Vec<String>,
}

impl Invocation {
    /// Build an invocation from a program and arguments.
    #[must_use]
    pub fn new<I, A>(program: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = A>,
        A: Into<String>,
    {
        Self {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }

    /// Split a whitespace-separated command line such as `npm run build`.
    ///
    /// # Errors
    ///
    /// Returns [`DeployError::EmptyCommand`] when `line` holds no words.
    pub fn parse(name: &'static str, line: &str) -> Result<Self, DeployError> {
        let mut words = line.split_whitespace();
        let program = words.next().ok_or(DeployError::EmptyCommand { name })?;
        Ok(Self::new(program, words))
    }

    /// Program to execute.
    #[must_use]
    pub fn program(&self) -> &str {
        &self.program
    }

    /// Arguments passed to the program.
    #[must_use]
    pub fn args(&self) -> &[String] {
        &self.args
    }
}

impl fmt::Display for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.program)?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}

/// Runs invocations to completion.
pub trait CommandRunner {
    /// Run `invocation` in `working_dir`, returning once it exits.
    ///
    /// # Errors
    ///
    /// Returns [`DeployError::Spawn`] when the program cannot be started
    /// and [`DeployError::CommandFailed`] when it exits unsuccessfully.
    fn run(&mut self, invocation: &Invocation, working_dir: &Utf8Path) -> Result<(), DeployError>;
}

/// Runs invocations as child processes sharing this process's stdio.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemCommandRunner;

impl CommandRunner for SystemCommandRunner {
    fn run(&mut self, invocation: &Invocation, working_dir: &Utf8Path) -> Result<(), DeployError> {
        debug!(command = %invocation, %working_dir, "running command");
        let status = Command::new(invocation.program())
            .args(invocation.args())
            .current_dir(working_dir)
            .status()
            .map_err(|err| DeployError::Spawn {
                command: invocation.to_string(),
                message: err.to_string(),
            })?;
        if status.success() {
            Ok(())
        } else {
            Err(DeployError::CommandFailed {
                command: invocation.to_string(),
                status: status.to_string(),
            })
        }
    }
}
