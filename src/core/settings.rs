//! Global notifier settings and where they are persisted.

use crate::credential::{Credential, Secret};
use crate::error::{Error, Result};
use crate::keychain;
use crate::local_files::{self, FileSystem, LocalFs};
use crate::paths;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

fn default_timeout_secs() -> u64 {
    30
}

/// Default server/proxy plus the configured credentials.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub server_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub proxy_url: Option<String>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default)]
    pub credentials: Vec<Credential>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server_url: None,
            proxy_url: None,
            timeout_secs: default_timeout_secs(),
            credentials: Vec::new(),
        }
    }
}

impl Settings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.max(1))
    }

    pub fn find(&self, name: &str) -> Option<&Credential> {
        self.credentials.iter().rev().find(|c| c.name == name)
    }

    /// Adds a credential, replacing any existing entry with the same name in place.
    pub fn upsert(&mut self, credential: Credential) {
        match self.credentials.iter_mut().find(|c| c.name == credential.name) {
            Some(existing) => *existing = credential,
            None => self.credentials.push(credential),
        }
    }

    /// Removes every credential called `name`; returns whether any existed.
    pub fn remove(&mut self, name: &str) -> bool {
        let before = self.credentials.len();
        self.credentials.retain(|c| c.name != name);
        before != self.credentials.len()
    }

    /// Credentials with keychain-held passwords filled in.
    ///
    /// A credential whose password cannot be read keeps an empty password;
    /// the server will reject it at call time.
    pub fn resolve_credentials(&self) -> Vec<Credential> {
        self.credentials.iter().cloned().map(fill_password).collect()
    }

    /// Like [`Settings::resolve_credentials`], but only entries called `name`
    /// touch the keychain. The others are returned as stored.
    pub fn resolve_credentials_for(&self, name: &str) -> Vec<Credential> {
        self.credentials
            .iter()
            .cloned()
            .map(|credential| {
                if credential.name == name {
                    fill_password(credential)
                } else {
                    credential
                }
            })
            .collect()
    }

    /// Name given by the caller, else the first configured credential's.
    pub fn credential_name(&self, requested: Option<&str>) -> Result<String> {
        match requested {
            Some(name) => Ok(name.to_string()),
            None => self
                .credentials
                .first()
                .map(|c| c.name.clone())
                .ok_or_else(Error::credential_registry_empty),
        }
    }
}

fn fill_password(mut credential: Credential) -> Credential {
    if !credential.password.is_empty() {
        return credential;
    }
    match keychain::get(&credential.name) {
        Ok(Some(password)) => credential.password = Secret::new(password),
        Ok(None) => {
            crate::log_status!(
                "settings",
                "No password stored for credential '{}'",
                credential.name
            );
        }
        Err(err) => {
            crate::log_status!(
                "settings",
                "Could not read password for '{}': {}",
                credential.name,
                err
            );
        }
    }
    credential
}

/// Load/save boundary for [`Settings`].
pub trait SettingsStore {
    fn load(&self) -> Result<Settings>;
    fn save(&self, settings: &Settings) -> Result<()>;
}

/// Settings kept as a JSON document on disk.
pub struct JsonSettingsStore {
    path: PathBuf,
    fs: LocalFs,
}

impl JsonSettingsStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            fs: local_files::local(),
        }
    }

    /// Store at `explicit`, `XLRELEASE_CONFIG`, or the default location.
    pub fn resolve(explicit: Option<&str>) -> Result<Self> {
        Ok(Self::new(paths::resolve_settings_path(explicit)?))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SettingsStore for JsonSettingsStore {
    fn load(&self) -> Result<Settings> {
        let Some(content) = self.fs.read_optional(&self.path)? else {
            return Ok(Settings::default());
        };

        if content.trim().is_empty() {
            return Ok(Settings::default());
        }

        serde_json::from_str(&content)
            .map_err(|e| Error::config_invalid_json(self.path.to_string_lossy(), e))
    }

    fn save(&self, settings: &Settings) -> Result<()> {
        let content = serde_json::to_string_pretty(settings)
            .map_err(|e| Error::internal_json(e.to_string(), Some("serialize settings".to_string())))?;
        self.fs.write(&self.path, &content)
    }
}
