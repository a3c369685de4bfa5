//! Error types for the deployment helper.

use camino::Utf8PathBuf;
use thiserror::Error;

/// Errors surfaced while reading, writing or acting on the site
/// configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DeployError {
    /// The site configuration file does not exist.
    #[error("{path} not found; run `deploy-site configure --project <id>` first")]
    MissingConfig {
        /// Path that was looked up.
        path: Utf8PathBuf,
    },
    /// The site configuration could not be read.
    #[error("failed to read {path}: {message}")]
    Read {
        /// Path being read.
        path: Utf8PathBuf,
        /// Underlying I/O error message.
        message: String,
    },
    /// The site configuration is not valid JSON of the expected shape.
    #[error("failed to parse {path}: {message}")]
    Parse {
        /// Path being parsed.
        path: Utf8PathBuf,
        /// Parser error message.
        message: String,
    },
    /// The configuration names no default project.
    #[error("no default project found in {path}")]
    NoDefaultProject {
        /// Path of the configuration.
        path: Utf8PathBuf,
    },
    /// A project or site id contains characters other than lowercase
    /// letters, digits and hyphens.
    #[error("invalid {field} '{value}': use only lowercase letters, numbers and hyphens")]
    InvalidId {
        /// Which id was rejected (`project` or `site`).
        field: &'static str,
        /// Rejected value.
        value: String,
    },
    /// A command line was empty.
    #[error("the {name} command is empty")]
    EmptyCommand {
        /// Which command was empty.
        name: &'static str,
    },
    /// A subprocess could not be started.
    #[error("failed to start `{command}`: {message}")]
    Spawn {
        /// Command line that failed to start.
        command: String,
        /// Underlying I/O error message.
        message: String,
    },
    /// A subprocess exited unsuccessfully.
    #[error("`{command}` failed: {status}")]
    CommandFailed {
        /// Command line that failed.
        command: String,
        /// Exit status as reported by the operating system.
        status: String,
    },
    /// The site configuration could not be written.
    #[error("failed to write {path}: {message}")]
    Write {
        /// Path being written.
        path: Utf8PathBuf,
        /// Underlying I/O error message.
        message: String,
    },
}
