//! Deployment helper for the My Money web client.
//!
//! Reads the hosting site configuration, decides which site to deploy and
//! runs the build and hosting CLI commands. `configure` writes the site
//! configuration and keeps the hosting configuration's target in step. The `deploy-site` binary is a
//! thin clap front end over [`deploy`] and [`configure`].

mod atomic_io;
mod deploy;
mod error;
mod hosting_config;
mod plan;
mod runner;
mod site_config;

pub use deploy::{
    Configured, DEFAULT_BUILD_COMMAND, DEFAULT_HOSTING_CLI, DeployOptions, DeployOutcome,
    configure, deploy,
};
pub use error::DeployError;
pub use hosting_config::{DEFAULT_HOSTING_CONFIG_FILE, HostingConfigUpdate, SITE_ID_PLACEHOLDER};
pub use plan::DeployPlan;
pub use runner::{CommandRunner, Invocation, SystemCommandRunner};
pub use site_config::{DEFAULT_CONFIG_FILE, ProjectTargets, Projects, SiteConfig};
