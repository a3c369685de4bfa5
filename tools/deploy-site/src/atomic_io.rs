//! Whole-file replacement through a sibling temporary file.

use std::io::{self, Write};
use std::sync::atomic::{AtomicU64, Ordering};

use camino::{Utf8Component, Utf8Path};
use cap_std::fs::{Dir, OpenOptions};

use crate::error::DeployError;

static SEQUENCE: AtomicU64 = AtomicU64::new(0);

/// Replace `path` inside `dir` with `contents` so readers never observe a
/// partially written file.
pub(crate) fn replace_file(dir: &Dir, path: &Utf8Path, contents: &str) -> Result<(), DeployError> {
    let write_error = |message: String| DeployError::Write {
        path: path.to_path_buf(),
        message,
    };
    let (parent, file_name) = split_target(path).ok_or_else(|| {
        write_error("configuration path must name a file below the project root".to_owned())
    })?;
    let target_dir = if parent.as_str().is_empty() {
        dir.try_clone()
    } else {
        dir.open_dir(parent)
    }
    .map_err(|err| write_error(err.to_string()))?;

    let staging = format!(
        ".{file_name}.{}.{}.partial",
        std::process::id(),
        SEQUENCE.fetch_add(1, Ordering::Relaxed)
    );
    stage(&target_dir, &staging, contents).map_err(|err| {
        discard(&target_dir, &staging);
        write_error(err.to_string())
    })?;
    promote(&target_dir, &staging, file_name).map_err(|err| {
        discard(&target_dir, &staging);
        write_error(err.to_string())
    })?;

    if target_dir.open(".").and_then(|handle| handle.sync_all()).is_err() {
        tracing::debug!(%path, "directory sync skipped");
    }
    Ok(())
}

fn split_target(path: &Utf8Path) -> Option<(&Utf8Path, &str)> {
    let file_name = match path.components().next_back()? {
        Utf8Component::Normal(name) => name,
        _ => return None,
    };
    let parent = path.parent().unwrap_or_else(|| Utf8Path::new(""));
    parent
        .components()
        .all(|component| matches!(component, Utf8Component::Normal(_) | Utf8Component::CurDir))
        .then_some((parent, file_name))
}

fn stage(dir: &Dir, staging: &str, contents: &str) -> io::Result<()> {
    let mut options = OpenOptions::new();
    options.write(true).create_new(true);
    let mut file = dir.open_with(staging, &options)?;
    file.write_all(contents.as_bytes())?;
    file.sync_all()
}

#[cfg(windows)]
fn promote(dir: &Dir, staging: &str, file_name: &str) -> io::Result<()> {
    match dir.remove_file(file_name) {
        Err(err) if err.kind() != io::ErrorKind::NotFound => return Err(err),
        _ => {}
    }
    dir.rename(staging, dir, file_name)
}

#[cfg(not(windows))]
fn promote(dir: &Dir, staging: &str, file_name: &str) -> io::Result<()> {
    dir.rename(staging, dir, file_name)
}

fn discard(dir: &Dir, staging: &str) {
    match dir.remove_file(staging) {
        Err(err) if err.kind() != io::ErrorKind::NotFound => {
            tracing::debug!(error = %err, staging, "could not remove staging file");
        }
        _ => {}
    }
}
