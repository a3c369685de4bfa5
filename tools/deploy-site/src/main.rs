//! `deploy-site`: build the web client and deploy it to its hosting site.
//!
//! Argument parsing and logging setup live here; the flows themselves are
//! in the `deploy_site` library so they can be tested without spawning
//! processes.

use std::io::{self, Write};
use std::process::ExitCode;

use camino::Utf8PathBuf;
use cap_std::{ambient_authority, fs::Dir};
use clap::{Parser, Subcommand};
use deploy_site::{
    DEFAULT_BUILD_COMMAND, DEFAULT_CONFIG_FILE, DEFAULT_HOSTING_CLI, DEFAULT_HOSTING_CONFIG_FILE,
    DeployError, DeployOptions, DeployOutcome, SystemCommandRunner, configure, deploy,
};
use tracing::{error, warn};
use tracing_subscriber::{EnvFilter, fmt};

/// `deploy-site` command arguments.
#[derive(Debug, Parser)]
#[command(
    name = "deploy-site",
    about = "Build the My Money web client and deploy it to its hosting site",
    version
)]
struct Cli {
    /// Directory containing the web client and its site configuration.
    #[arg(long, value_name = "dir", default_value = ".", global = true)]
    project_root: Utf8PathBuf,
    /// Site configuration file, relative to the project root.
    #[arg(long, value_name = "path", default_value = DEFAULT_CONFIG_FILE, global = true)]
    config: Utf8PathBuf,
    /// Hosting configuration updated by `configure`, relative to the
    /// project root.
    #[arg(long, value_name = "path", default_value = DEFAULT_HOSTING_CONFIG_FILE, global = true)]
    hosting_config: Utf8PathBuf,
    /// Command line that builds the client.
    #[arg(long, value_name = "command", default_value = DEFAULT_BUILD_COMMAND, global = true)]
    build_command: String,
    /// Hosting CLI invoked as `<cli> deploy --only <scope>`.
    #[arg(long, value_name = "program", default_value = DEFAULT_HOSTING_CLI, global = true)]
    hosting_cli: String,
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Build, then deploy to the configured hosting site (default).
    Deploy,
    /// Write the site configuration for a project and optional site.
    Configure {
        /// Hosting project id (lowercase letters, digits and hyphens).
        #[arg(long, value_name = "id")]
        project: String,
        /// Hosting site id; defaults to the project's own site.
        #[arg(long, value_name = "id")]
        site: Option<String>,
    },
}

fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!(error = %err, "deploy-site failed");
            emit(io::stderr().lock(), &format!("deploy-site: {err}"));
            ExitCode::FAILURE
        }
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if let Err(e) = fmt()
        .with_env_filter(filter)
        .compact()
        .with_writer(io::stderr)
        .try_init()
    {
        warn!(error = %e, "tracing init failed");
    }
}

/// Write `text` and a newline to a terminal stream, logging a failed write.
fn emit(mut out: impl Write, text: &str) {
    if let Err(e) = writeln!(out, "{text}") {
        warn!(error = %e, "failed to write to the terminal");
    }
}

fn run(cli: Cli) -> Result<(), DeployError> {
    let root = Dir::open_ambient_dir(&cli.project_root, ambient_authority()).map_err(|err| {
        DeployError::Read {
            path: cli.project_root.clone(),
            message: err.to_string(),
        }
    })?;

    match cli.command.unwrap_or(Command::Deploy) {
        Command::Configure { project, site } => {
            configure(
                &root,
                &cli.config,
                &cli.hosting_config,
                &project,
                site.as_deref(),
            )?;
            Ok(())
        }
        Command::Deploy => {
            let options = DeployOptions {
                project_root: cli.project_root,
                config_path: cli.config,
                build_command: cli.build_command,
                hosting_cli: cli.hosting_cli,
            };
            match deploy(&root, &options, &mut SystemCommandRunner)? {
                DeployOutcome::Deployed { .. } => {}
                DeployOutcome::NeedsSiteSelection { sites, .. } => list_sites(&sites),
            }
            Ok(())
        }
    }
}

fn list_sites(sites: &[String]) {
    let mut listing = String::from("Multiple sites configured; choose one to deploy:");
    for (index, site) in sites.iter().enumerate() {
        listing.push_str(&format!("\n  {}. {site}", index + 1));
    }
    emit(io::stdout().lock(), &listing);
}
