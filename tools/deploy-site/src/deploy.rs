//! Deploy and configure flows driven by the CLI.

use camino::{Utf8Path, Utf8PathBuf};
use cap_std::fs::Dir;
use tracing::info;

use crate::error::DeployError;
use crate::hosting_config::{HostingConfigUpdate, sync_site};
use crate::plan::DeployPlan;
use crate::runner::{CommandRunner, Invocation};
use crate::site_config::{DEFAULT_CONFIG_FILE, SiteConfig};

/// Default command building the web client.
pub const DEFAULT_BUILD_COMMAND: &str = "npm run build";
/// Default hosting CLI program.
pub const DEFAULT_HOSTING_CLI: &str = "firebase";

/// Inputs shared by the deploy flow.
#[derive(Debug, Clone)]
pub struct DeployOptions {
    /// Directory holding the web client; subprocesses run here.
    pub project_root: Utf8PathBuf,
    /// Site configuration path relative to `project_root`.
    pub config_path: Utf8PathBuf,
    /// Command line building the client.
    pub build_command: String,
    /// Hosting CLI program used for `deploy --only <scope>`.
    pub hosting_cli: String,
}

impl DeployOptions {
    /// Options with the default config file and commands.
    #[must_use]
    pub fn new(project_root: impl Into<Utf8PathBuf>) -> Self {
        Self {
            project_root: project_root.into(),
            config_path: Utf8PathBuf::from(DEFAULT_CONFIG_FILE),
            build_command: DEFAULT_BUILD_COMMAND.to_owned(),
            hosting_cli: DEFAULT_HOSTING_CLI.to_owned(),
        }
    }
}

/// Result of a deploy attempt that did not fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeployOutcome {
    /// Build and deploy both ran.
    Deployed {
        /// Project deployed.
        project: String,
        /// Scope passed to the hosting CLI.
        scope: String,
    },
    /// Several hosting targets exist, so nothing ran.
    NeedsSiteSelection {
        /// Project configured.
        project: String,
        /// Declared hosting targets.
        sites: Vec<String>,
    },
}

/// Resolve the deploy plan from the site configuration, then build and
/// deploy when the plan names a single destination.
///
/// # Errors
///
/// Fails when the configuration is missing or invalid, when a command
/// line is empty, or when either subprocess fails. The deploy step does
/// not run if the build fails.
pub fn deploy<R>(
    root: &Dir,
    options: &DeployOptions,
    runner: &mut R,
) -> Result<DeployOutcome, DeployError>
where
    R: CommandRunner + ?Sized,
{
    let config = SiteConfig::read(root, &options.config_path)?;
    let plan = DeployPlan::resolve(&config, &options.config_path)?;
    let (project, scope) = match plan {
        DeployPlan::Ambiguous { project, sites } => {
            info!(%project, ?sites, "several hosting sites configured; skipping deploy");
            return Ok(DeployOutcome::NeedsSiteSelection { project, sites });
        }
        DeployPlan::DefaultSite { project } => (project, "hosting".to_owned()),
        DeployPlan::Site { project, site } => (project, format!("hosting:{site}")),
    };

    let build = Invocation::parse("build", &options.build_command)?;
    let hosting = Invocation::parse("hosting", &options.hosting_cli)?;
    let mut deploy_args = hosting.args().to_vec();
    deploy_args.extend(["deploy".to_owned(), "--only".to_owned(), scope.clone()]);
    let release = Invocation::new(hosting.program(), deploy_args);

    info!(%project, %scope, "building application");
    runner.run(&build, &options.project_root)?;
    info!(%project, %scope, command = %release, "deploying");
    runner.run(&release, &options.project_root)?;
    info!(%project, %scope, "deployment complete");
    Ok(DeployOutcome::Deployed { project, scope })
}

/// Files written by [`configure`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Configured {
    /// Site configuration as written.
    pub site_config: SiteConfig,
    /// What happened to the hosting configuration.
    pub hosting_config: HostingConfigUpdate,
}

/// Write a site configuration for `project`, optionally pinned to `site`,
/// then point the hosting configuration at the chosen site.
///
/// The hosting configuration gets a `target` only when `site` differs from
/// the project. A missing hosting configuration is logged and skipped.
///
/// # Errors
///
/// Fails when an id is malformed, when either file cannot be written, or
/// when an existing hosting configuration cannot be read or parsed.
pub fn configure(
    root: &Dir,
    config_path: &Utf8Path,
    hosting_config_path: &Utf8Path,
    project: &str,
    site: Option<&str>,
) -> Result<Configured, DeployError> {
    let site_config = SiteConfig::for_project(project, site)?;
    site_config.write(root, config_path)?;
    let project_id = site_config.default_project().unwrap_or_default();
    let targets = site_config.hosting_targets(project_id);
    info!(
        path = %config_path,
        project = project_id,
        sites = ?targets,
        "site configuration written"
    );

    let (site_id, target) = targets
        .first()
        .map_or((project_id, false), |site_id| (*site_id, true));
    let hosting_config = sync_site(root, hosting_config_path, site_id, target)?;
    info!(
        path = %hosting_config_path,
        site = site_id,
        outcome = ?hosting_config,
        "hosting configuration checked"
    );
    Ok(Configured {
        site_config,
        hosting_config,
    })
}
