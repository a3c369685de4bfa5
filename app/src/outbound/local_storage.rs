//! Local storage adapters: in-memory and directory backed.

use std::collections::HashMap;
use std::io::{self, Write};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use camino::Utf8Path;
use cap_std::ambient_authority;
use cap_std::fs::{Dir, OpenOptions};
use tracing::debug;

use crate::domain::ports::{LocalStorage, LocalStorageError};

static TEMP_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Process-local storage, lost when dropped.
#[derive(Debug, Default)]
pub struct InMemoryLocalStorage {
    entries: Mutex<HashMap<String, String>>,
}

impl InMemoryLocalStorage {
    fn entries(&self) -> MutexGuard<'_, HashMap<String, String>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl LocalStorage for InMemoryLocalStorage {
    fn get(&self, key: &str) -> Result<Option<String>, LocalStorageError> {
        Ok(self.entries().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), LocalStorageError> {
        self.entries().insert(key.to_owned(), value.to_owned());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), LocalStorageError> {
        self.entries().remove(key);
        Ok(())
    }
}

/// Storage keeping one file per key inside a capability-scoped directory.
///
/// Keys may only contain ASCII letters, digits, `.`, `_` and `-`, and must
/// not start with `.`. Writes go through a temporary file and a rename so a
/// crash never leaves a partially written value.
#[derive(Debug)]
pub struct DirLocalStorage {
    dir: Dir,
}

impl DirLocalStorage {
    /// Wrap an already opened directory.
    #[must_use]
    pub const fn new(dir: Dir) -> Self {
        Self { dir }
    }

    /// Open `path`, creating it when missing.
    ///
    /// # Errors
    ///
    /// Returns the underlying I/O error when the directory cannot be
    /// created or opened.
    pub fn open(path: &Utf8Path) -> io::Result<Self> {
        Dir::create_ambient_dir_all(path, ambient_authority())?;
        let dir = Dir::open_ambient_dir(path, ambient_authority())?;
        debug!(%path, "local storage directory opened");
        Ok(Self::new(dir))
    }

    fn file_name(key: &str) -> io::Result<&str> {
        let valid = !key.is_empty()
            && !key.starts_with('.')
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'));
        if valid {
            Ok(key)
        } else {
            Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "key must be a plain file name",
            ))
        }
    }

    fn write_atomic(&self, file_name: &str, contents: &str) -> io::Result<()> {
        let counter = TEMP_COUNTER.fetch_add(1, Ordering::Relaxed);
        let tmp_name = format!(".{file_name}.tmp.{}.{counter}", std::process::id());

        let mut options = OpenOptions::new();
        options.write(true).create_new(true);
        let written = self.dir.open_with(&tmp_name, &options).and_then(|mut file| {
            file.write_all(contents.as_bytes())?;
            file.sync_all()
        });
        let renamed = written.and_then(|()| self.replace(&tmp_name, file_name));
        if renamed.is_err() && self.dir.remove_file(&tmp_name).is_err() {
            debug!(%tmp_name, "temporary file already gone");
        }
        renamed
    }

    #[cfg(windows)]
    fn replace(&self, tmp_name: &str, file_name: &str) -> io::Result<()> {
        match self.dir.remove_file(file_name) {
            Ok(()) => {}
            Err(err) if err.kind() == io::ErrorKind::NotFound => {}
            Err(err) => return Err(err),
        }
        self.dir.rename(tmp_name, &self.dir, file_name)
    }

    #[cfg(not(windows))]
    fn replace(&self, tmp_name: &str, file_name: &str) -> io::Result<()> {
        self.dir.rename(tmp_name, &self.dir, file_name)
    }
}

impl LocalStorage for DirLocalStorage {
    fn get(&self, key: &str) -> Result<Option<String>, LocalStorageError> {
        let read = Self::file_name(key).and_then(|name| self.dir.read_to_string(name));
        match read {
            Ok(value) => Ok(Some(value)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(LocalStorageError::read(key, err.to_string())),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), LocalStorageError> {
        Self::file_name(key)
            .and_then(|name| self.write_atomic(name, value))
            .map_err(|err| LocalStorageError::write(key, err.to_string()))
    }

    fn remove(&self, key: &str) -> Result<(), LocalStorageError> {
        match Self::file_name(key).and_then(|name| self.dir.remove_file(name)) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(LocalStorageError::remove(key, err.to_string())),
        }
    }
}
