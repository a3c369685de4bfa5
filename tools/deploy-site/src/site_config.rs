//! Site configuration file naming the hosting project and its sites.
//!
//! The file is JSON of the form
//! `{"projects":{"default":ID},"targets":{ID:{"hosting":{SITE:[...]}}}}`.
//! Unknown keys are ignored so files managed by the hosting CLI load
//! unchanged.

use std::collections::BTreeMap;
use std::io;

use camino::Utf8Path;
use cap_std::fs::Dir;
use serde::{Deserialize, Serialize};

use crate::atomic_io::replace_file;
use crate::error::DeployError;

/// Default configuration file name, relative to the project root.
pub const DEFAULT_CONFIG_FILE: &str = ".firebaserc";

/// Project aliases; only the default alias is used.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Projects {
    /// Project deployed when no alias is given.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,
}

/// Deploy targets declared for one project.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectTargets {
    /// Hosting target name mapped to the site ids it resolves to.
    #[serde(default)]
    pub hosting: BTreeMap<String, Vec<String>>,
}

/// Parsed site configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SiteConfig {
    /// Project aliases.
    #[serde(default)]
    pub projects: Projects,
    /// Targets keyed by project id.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub targets: BTreeMap<String, ProjectTargets>,
}

impl SiteConfig {
    /// Configuration for `project`, adding a hosting target only when
    /// `site` names a site other than the project's default one.
    ///
    /// # Errors
    ///
    /// Returns [`DeployError::InvalidId`] when either id contains
    /// characters outside `[a-z0-9-]`.
    ///
    /// # Examples
    ///
    /// ```
    /// use deploy_site::SiteConfig;
    ///
    /// let config = SiteConfig::for_project("my-money", Some("my-money-beta")).expect("valid ids");
    /// assert_eq!(config.default_project(), Some("my-money"));
    /// assert_eq!(config.hosting_targets("my-money"), ["my-money-beta"]);
    /// ```
    pub fn for_project(project: &str, site: Option<&str>) -> Result<Self, DeployError> {
        let project_id = validate_id("project", project)?;
        let site_id = site
            .map(str::trim)
            .filter(|raw| !raw.is_empty())
            .map(|raw| validate_id("site", raw))
            .transpose()?;

        let mut config = Self {
            projects: Projects {
                default: Some(project_id.to_owned()),
            },
            targets: BTreeMap::new(),
        };
        if let Some(site_name) = site_id.filter(|name| *name != project_id) {
            let hosting = BTreeMap::from([(site_name.to_owned(), vec![site_name.to_owned()])]);
            config
                .targets
                .insert(project_id.to_owned(), ProjectTargets { hosting });
        }
        Ok(config)
    }

    /// Read and parse the configuration at `path` inside `dir`.
    ///
    /// # Errors
    ///
    /// Returns [`DeployError::MissingConfig`] when the file does not exist,
    /// [`DeployError::Read`] for other I/O failures and
    /// [`DeployError::Parse`] when the contents are not valid.
    pub fn read(dir: &Dir, path: &Utf8Path) -> Result<Self, DeployError> {
        let raw = dir.read_to_string(path).map_err(|err| match err.kind() {
            io::ErrorKind::NotFound => DeployError::MissingConfig {
                path: path.to_path_buf(),
            },
            _ => DeployError::Read {
                path: path.to_path_buf(),
                message: err.to_string(),
            },
        })?;
        serde_json::from_str(&raw).map_err(|err| DeployError::Parse {
            path: path.to_path_buf(),
            message: err.to_string(),
        })
    }

    /// Write the configuration to `path` inside `dir`, replacing any
    /// existing file atomically.
    ///
    /// # Errors
    ///
    /// Returns [`DeployError::Write`] when serialisation or the write
    /// fails.
    pub fn write(&self, dir: &Dir, path: &Utf8Path) -> Result<(), DeployError> {
        let mut json = serde_json::to_string_pretty(self).map_err(|err| DeployError::Write {
            path: path.to_path_buf(),
            message: err.to_string(),
        })?;
        json.push('\n');
        replace_file(dir, path, &json)
    }

    /// Default project id, if one is set and non-blank.
    #[must_use]
    pub fn default_project(&self) -> Option<&str> {
        self.projects
            .default
            .as_deref()
            .map(str::trim)
            .filter(|project| !project.is_empty())
    }

    /// Hosting target names declared for `project`, in sorted order.
    #[must_use]
    pub fn hosting_targets(&self, project: &str) -> Vec<&str> {
        self.targets
            .get(project)
            .map(|targets| targets.hosting.keys().map(String::as_str).collect())
            .unwrap_or_default()
    }
}

fn validate_id<'a>(field: &'static str, raw: &'a str) -> Result<&'a str, DeployError> {
    let value = raw.trim();
    let valid = !value.is_empty()
        && value
            .bytes()
            .all(|byte| byte.is_ascii_lowercase() || byte.is_ascii_digit() || byte == b'-');
    if valid {
        Ok(value)
    } else {
        Err(DeployError::InvalidId {
            field,
            value: raw.to_owned(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cap_std::ambient_authority;
    use rstest::{fixture, rstest};

    struct Workspace {
        _temp: tempfile::TempDir,
        dir: Dir,
    }

    #[fixture]
    fn workspace() -> Workspace {
        let temp = tempfile::tempdir().expect("temp dir");
        let dir = Dir::open_ambient_dir(temp.path(), ambient_authority()).expect("open dir");
        Workspace { _temp: temp, dir }
    }

    #[rstest]
    fn parses_hosting_targets_and_ignores_unknown_keys() {
        let config: SiteConfig = serde_json::from_str(
            r#"{
                "projects": {"default": "my-money"},
                "targets": {"my-money": {"hosting": {"beta": ["my-money-beta"], "app": ["my-money"]}}},
                "etags": {}
            }"#,
        )
        .expect("parse");

        assert_eq!(config.default_project(), Some("my-money"));
        assert_eq!(config.hosting_targets("my-money"), ["app", "beta"]);
        assert!(config.hosting_targets("other").is_empty());
    }

    #[rstest]
    fn site_matching_the_project_writes_no_target() {
        let config = SiteConfig::for_project("my-money", Some("my-money")).expect("valid ids");
        let json = serde_json::to_value(&config).expect("serialise");
        assert_eq!(json, serde_json::json!({"projects": {"default": "my-money"}}));
    }

    #[rstest]
    fn distinct_site_writes_one_target() {
        let config = SiteConfig::for_project("my-money", Some("money-web")).expect("valid ids");
        let json = serde_json::to_value(&config).expect("serialise");
        assert_eq!(
            json,
            serde_json::json!({
                "projects": {"default": "my-money"},
                "targets": {"my-money": {"hosting": {"money-web": ["money-web"]}}}
            })
        );
    }

    #[rstest]
    #[case("My-Money")]
    #[case("my_money")]
    #[case("  ")]
    fn rejects_malformed_project_ids(#[case] project: &str) {
        let err = SiteConfig::for_project(project, None).expect_err("invalid id");
        assert!(matches!(err, DeployError::InvalidId { field: "project", .. }));
    }

    #[rstest]
    fn rejects_malformed_site_ids() {
        let err = SiteConfig::for_project("my-money", Some("Site!")).expect_err("invalid site");
        assert!(matches!(err, DeployError::InvalidId { field: "site", .. }));
    }

    #[rstest]
    fn write_then_read_preserves_configuration(workspace: Workspace) {
        let config = SiteConfig::for_project("my-money", Some("money-web")).expect("valid ids");
        config
            .write(&workspace.dir, Utf8Path::new(DEFAULT_CONFIG_FILE))
            .expect("write");

        let loaded =
            SiteConfig::read(&workspace.dir, Utf8Path::new(DEFAULT_CONFIG_FILE)).expect("read");
        assert_eq!(loaded, config);
    }

    #[rstest]
    fn missing_file_is_reported_as_missing(workspace: Workspace) {
        let err = SiteConfig::read(&workspace.dir, Utf8Path::new(DEFAULT_CONFIG_FILE))
            .expect_err("missing file");
        assert_eq!(
            err,
            DeployError::MissingConfig {
                path: DEFAULT_CONFIG_FILE.into(),
            }
        );
    }

    #[rstest]
    fn invalid_json_is_a_parse_error(workspace: Workspace) {
        workspace
            .dir
            .write(DEFAULT_CONFIG_FILE, "{ not json")
            .expect("seed file");
        let err = SiteConfig::read(&workspace.dir, Utf8Path::new(DEFAULT_CONFIG_FILE))
            .expect_err("bad json");
        assert!(matches!(err, DeployError::Parse { .. }));
    }
}
