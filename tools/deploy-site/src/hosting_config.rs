//! Hosting configuration file (`firebase.json`) kept in step with the site
//! configuration.
//!
//! Only two things are touched: the `target` of the first hosting entry,
//! which must name the configured site when it differs from the project,
//! and string values equal to [`SITE_ID_PLACEHOLDER`]. Everything else in
//! the file is written back as it was read.

use std::io;

use camino::Utf8Path;
use cap_std::fs::Dir;
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::atomic_io::replace_file;
use crate::error::DeployError;

/// Default hosting configuration file name, relative to the project root.
pub const DEFAULT_HOSTING_CONFIG_FILE: &str = "firebase.json";

/// Placeholder replaced with the site id when the hosting config is set up.
pub const SITE_ID_PLACEHOLDER: &str = "SITE_ID_PLACEHOLDER";

/// What happened to the hosting configuration during `configure`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostingConfigUpdate {
    /// The file was rewritten.
    Updated,
    /// The file already matched the site.
    Unchanged,
    /// No hosting configuration exists, so nothing was written.
    Missing,
}

/// Point the hosting configuration at `site`.
///
/// With `target` set (a site other than the project's default one) the
/// first hosting entry's `target` becomes `site`. Placeholders are replaced
/// with `site` in both cases.
///
/// # Errors
///
/// Returns [`DeployError::Read`] or [`DeployError::Parse`] when an existing
/// file cannot be loaded and [`DeployError::Write`] when it cannot be
/// replaced.
pub(crate) fn sync_site(
    dir: &Dir,
    path: &Utf8Path,
    site: &str,
    target: bool,
) -> Result<HostingConfigUpdate, DeployError> {
    let raw = match dir.read_to_string(path) {
        Ok(raw) => raw,
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            warn!(%path, "hosting configuration not found; site target not written");
            return Ok(HostingConfigUpdate::Missing);
        }
        Err(err) => {
            return Err(DeployError::Read {
                path: path.to_path_buf(),
                message: err.to_string(),
            });
        }
    };
    let mut document: Value = serde_json::from_str(&raw).map_err(|err| DeployError::Parse {
        path: path.to_path_buf(),
        message: err.to_string(),
    })?;

    let mut changed = replace_placeholders(&mut document, site);
    if target {
        changed |= set_target(&mut document, site);
    }
    if !changed {
        debug!(%path, site, "hosting configuration already up to date");
        return Ok(HostingConfigUpdate::Unchanged);
    }

    let mut json = serde_json::to_string_pretty(&document).map_err(|err| DeployError::Write {
        path: path.to_path_buf(),
        message: err.to_string(),
    })?;
    json.push('\n');
    replace_file(dir, path, &json)?;
    Ok(HostingConfigUpdate::Updated)
}

fn set_target(document: &mut Value, site: &str) -> bool {
    let entry = match document.get_mut("hosting") {
        Some(Value::Array(entries)) => entries.first_mut().and_then(Value::as_object_mut),
        Some(Value::Object(entry)) => Some(entry),
        _ => None,
    };
    let Some(entry) = entry else {
        warn!(site, "hosting configuration has no hosting entry; target not written");
        return false;
    };
    write_target(entry, site)
}

fn write_target(entry: &mut Map<String, Value>, site: &str) -> bool {
    if entry.get("target").and_then(Value::as_str) == Some(site) {
        return false;
    }
    entry.insert("target".to_owned(), Value::String(site.to_owned()));
    true
}

fn replace_placeholders(value: &mut Value, site: &str) -> bool {
    match value {
        Value::String(text) if text == SITE_ID_PLACEHOLDER => {
            site.clone_into(text);
            true
        }
        Value::Array(items) => items
            .iter_mut()
            .fold(false, |changed, item| replace_placeholders(item, site) | changed),
        Value::Object(entries) => entries
            .values_mut()
            .fold(false, |changed, item| replace_placeholders(item, site) | changed),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cap_std::ambient_authority;
    use rstest::{fixture, rstest};
    use serde_json::json;

    struct Workspace {
        _temp: tempfile::TempDir,
        dir: Dir,
    }

    impl Workspace {
        fn write(&self, value: &Value) {
            self.dir
                .write(DEFAULT_HOSTING_CONFIG_FILE, value.to_string())
                .expect("write hosting config");
        }

        fn read(&self) -> Value {
            let raw = self
                .dir
                .read_to_string(DEFAULT_HOSTING_CONFIG_FILE)
                .expect("read hosting config");
            serde_json::from_str(&raw).expect("valid json")
        }
    }

    #[fixture]
    fn workspace() -> Workspace {
        let temp = tempfile::tempdir().expect("temp dir");
        let dir = Dir::open_ambient_dir(temp.path(), ambient_authority()).expect("open dir");
        Workspace { _temp: temp, dir }
    }

    fn sync(workspace: &Workspace, site: &str, target: bool) -> HostingConfigUpdate {
        sync_site(
            &workspace.dir,
            Utf8Path::new(DEFAULT_HOSTING_CONFIG_FILE),
            site,
            target,
        )
        .expect("sync hosting config")
    }

    #[rstest]
    fn first_hosting_entry_gets_the_target(workspace: Workspace) {
        workspace.write(&json!({
            "hosting": [
                {"target": "old-site", "public": "build"},
                {"target": "docs", "public": "docs"}
            ]
        }));

        assert_eq!(sync(&workspace, "money-web", true), HostingConfigUpdate::Updated);

        let hosting = &workspace.read()["hosting"];
        assert_eq!(hosting[0], json!({"target": "money-web", "public": "build"}));
        assert_eq!(hosting[1]["target"], "docs");
    }

    #[rstest]
    fn single_object_hosting_entry_gets_the_target(workspace: Workspace) {
        workspace.write(&json!({"hosting": {"public": "build"}}));

        sync(&workspace, "money-web", true);

        assert_eq!(workspace.read()["hosting"]["target"], "money-web");
    }

    #[rstest]
    fn placeholders_become_the_site_without_adding_a_target(workspace: Workspace) {
        workspace.write(&json!({
            "hosting": {"site": SITE_ID_PLACEHOLDER, "public": "build"}
        }));

        assert_eq!(sync(&workspace, "my-money", false), HostingConfigUpdate::Updated);

        assert_eq!(
            workspace.read(),
            json!({"hosting": {"site": "my-money", "public": "build"}})
        );
    }

    #[rstest]
    fn matching_file_is_left_alone(workspace: Workspace) {
        workspace.write(&json!({"hosting": [{"target": "money-web"}]}));

        assert_eq!(sync(&workspace, "money-web", true), HostingConfigUpdate::Unchanged);
    }

    #[rstest]
    fn missing_file_is_skipped(workspace: Workspace) {
        assert_eq!(sync(&workspace, "money-web", true), HostingConfigUpdate::Missing);
        assert!(!workspace.dir.exists(DEFAULT_HOSTING_CONFIG_FILE));
    }

    #[rstest]
    fn invalid_json_is_reported(workspace: Workspace) {
        workspace
            .dir
            .write(DEFAULT_HOSTING_CONFIG_FILE, "{not json")
            .expect("write");

        let err = sync_site(
            &workspace.dir,
            Utf8Path::new(DEFAULT_HOSTING_CONFIG_FILE),
            "money-web",
            true,
        )
        .expect_err("invalid json");

        assert!(matches!(err, DeployError::Parse { .. }));
    }
}
