//! Port for device-local key/value storage.

use super::define_port_error;

define_port_error! {
    /// Errors raised by local storage adapters.
    pub enum LocalStorageError {
        /// The value could not be read.
        Read { key: String, message: String } =>
            "failed to read local storage key {key}: {message}",
        /// The value could not be written.
        Write { key: String, message: String } =>
            "failed to write local storage key {key}: {message}",
        /// The value could not be removed.
        Remove { key: String, message: String } =>
            "failed to remove local storage key {key}: {message}",
    }
}

/// Synchronous string storage keyed by fixed names.
#[cfg_attr(test, mockall::automock)]
pub trait LocalStorage: Send + Sync {
    /// Read the value stored under `key`, if any.
    fn get(&self, key: &str) -> Result<Option<String>, LocalStorageError>;

    /// Store `value` under `key`, replacing any previous value.
    fn set(&self, key: &str, value: &str) -> Result<(), LocalStorageError>;

    /// Remove `key`. Removing an absent key succeeds.
    fn remove(&self, key: &str) -> Result<(), LocalStorageError>;
}
