//! Resolution of what a deploy should target.

use camino::Utf8Path;

use crate::error::DeployError;
use crate::site_config::SiteConfig;

/// Deploy target resolved from a [`SiteConfig`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeployPlan {
    /// No hosting targets: deploy the project's default site.
    DefaultSite {
        /// Project id.
        project: String,
    },
    /// Exactly one hosting target.
    Site {
        /// Project id.
        project: String,
        /// Hosting target to deploy.
        site: String,
    },
    /// Several hosting targets; the caller has to choose.
    Ambiguous {
        /// Project id.
        project: String,
        /// Declared hosting targets, sorted.
        sites: Vec<String>,
    },
}

impl DeployPlan {
    /// Resolve the plan for the configuration's default project.
    ///
    /// # Errors
    ///
    /// Returns [`DeployError::NoDefaultProject`] when the configuration
    /// names no default project. `source` is only used in that error.
    pub fn resolve(config: &SiteConfig, source: &Utf8Path) -> Result<Self, DeployError> {
        let project = config
            .default_project()
            .ok_or_else(|| DeployError::NoDefaultProject {
                path: source.to_path_buf(),
            })?
            .to_owned();
        let plan = match config.hosting_targets(&project).as_slice() {
            [] => Self::DefaultSite { project },
            [site] => Self::Site {
                site: (*site).to_owned(),
                project,
            },
            sites => Self::Ambiguous {
                sites: sites.iter().map(|site| (*site).to_owned()).collect(),
                project,
            },
        };
        Ok(plan)
    }
}
