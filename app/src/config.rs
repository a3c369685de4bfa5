//! Backend connection settings loaded via OrthoConfig.
//!
//! Values come from `MY_MONEY_BACKEND_*` environment variables, config
//! files or CLI flags. Missing required values are not an error: they
//! resolve to "not configured" and the app runs without a backend.

use ortho_config::OrthoConfig;
use serde::Deserialize;

/// Raw backend settings. Every connection field is optional at load time.
#[derive(Debug, Clone, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "MY_MONEY_BACKEND")]
pub struct BackendSettings {
    /// Connect to the backend when its settings are complete. Turning this
    /// off runs the app offline.
    #[ortho_config(default = true)]
    pub enabled: bool,
    /// API key identifying the client app.
    pub api_key: Option<String>,
    /// Domain hosting the identity provider.
    pub auth_domain: Option<String>,
    /// Realtime database URL.
    pub database_url: Option<String>,
    /// Backend project identifier.
    pub project_id: Option<String>,
    /// File storage bucket.
    pub storage_bucket: Option<String>,
    /// Messaging sender identifier.
    pub messaging_sender_id: Option<String>,
    /// App identifier.
    pub app_id: Option<String>,
}

/// Validated connection parameters for an adapter factory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendConnection {
    pub api_key: String,
    pub auth_domain: String,
    pub project_id: String,
    pub database_url: Option<String>,
    pub storage_bucket: Option<String>,
    pub messaging_sender_id: Option<String>,
    pub app_id: Option<String>,
}

impl Default for BackendSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            api_key: None,
            auth_domain: None,
            database_url: None,
            project_id: None,
            storage_bucket: None,
            messaging_sender_id: None,
            app_id: None,
        }
    }
}

fn present(value: Option<&String>) -> Option<String> {
    value
        .map(|raw| raw.trim())
        .filter(|trimmed| !trimmed.is_empty())
        .map(str::to_owned)
}

impl BackendSettings {
    /// Resolve the connection parameters, or `None` when the backend is
    /// disabled or any of the API key, auth domain or project id is
    /// missing or blank.
    #[must_use]
    pub fn connection(&self) -> Option<BackendConnection> {
        if !self.enabled {
            return None;
        }
        Some(BackendConnection {
            api_key: present(self.api_key.as_ref())?,
            auth_domain: present(self.auth_domain.as_ref())?,
            project_id: present(self.project_id.as_ref())?,
            database_url: present(self.database_url.as_ref()),
            storage_bucket: present(self.storage_bucket.as_ref()),
            messaging_sender_id: present(self.messaging_sender_id.as_ref()),
            app_id: present(self.app_id.as_ref()),
        })
    }

    /// Names of required settings that are missing or blank.
    #[must_use]
    pub fn missing_required(&self) -> Vec<&'static str> {
        [
            ("api_key", &self.api_key),
            ("auth_domain", &self.auth_domain),
            ("project_id", &self.project_id),
        ]
        .into_iter()
        .filter(|(_, value)| present(value.as_ref()).is_none())
        .map(|(name, _)| name)
        .collect()
    }
}
