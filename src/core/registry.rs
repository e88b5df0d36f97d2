//! Credential name → server connection mapping.
//!
//! Each reload produces a complete, immutable [`RegistrySnapshot`] which is
//! then published with a single pointer swap. Readers clone the current
//! `Arc` and keep using that snapshot for as long as they need it.

use crate::credential::Credential;
use crate::error::{Error, Result};
use crate::server::ServerConnection;
use crate::settings::{Settings, SettingsStore};
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

#[derive(Debug, Default)]
pub struct RegistrySnapshot {
    generation: u64,
    credentials: Vec<Credential>,
    connections: HashMap<String, Arc<ServerConnection>>,
}

impl RegistrySnapshot {
    fn build(
        generation: u64,
        credentials: Vec<Credential>,
        default_server_url: Option<&str>,
        default_proxy_url: Option<&str>,
    ) -> Self {
        let mut connections = HashMap::with_capacity(credentials.len());

        // Duplicate names are not rejected; the later credential overwrites.
        for credential in &credentials {
            let connection = ServerConnection::new(
                credential.resolve_server_url(default_server_url),
                credential.resolve_proxy_url(default_proxy_url),
                credential.username.clone(),
                credential.password.clone(),
            );
            connections.insert(credential.name.clone(), Arc::new(connection));
        }

        Self {
            generation,
            credentials,
            connections,
        }
    }

    /// Reload counter; 0 for a registry that was never loaded.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn lookup(&self, name: &str) -> Result<Arc<ServerConnection>> {
        self.connections
            .get(name)
            .cloned()
            .ok_or_else(|| Error::credential_not_found(name, self.names()))
    }

    /// First credential in configuration order.
    pub fn default_credential(&self) -> Result<&Credential> {
        self.credentials
            .first()
            .ok_or_else(Error::credential_registry_empty)
    }

    /// Credential name given by the caller, else the default credential's.
    pub fn resolve_name(&self, requested: Option<&str>) -> Result<String> {
        match requested {
            Some(name) => Ok(name.to_string()),
            None => Ok(self.default_credential()?.name.clone()),
        }
    }

    pub fn credentials(&self) -> &[Credential] {
        &self.credentials
    }

    /// Distinct credential names in configuration order.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = Vec::with_capacity(self.credentials.len());
        for credential in &self.credentials {
            if !names.contains(&credential.name) {
                names.push(credential.name.clone());
            }
        }
        names
    }

    pub fn len(&self) -> usize {
        self.connections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
    }
}

#[derive(Debug, Default)]
pub struct CredentialRegistry {
    current: RwLock<Arc<RegistrySnapshot>>,
}

impl CredentialRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a registry already loaded from `settings`.
    pub fn from_settings(settings: &Settings) -> Self {
        let registry = Self::new();
        registry.reload_settings(settings);
        registry
    }

    /// The currently published mapping.
    pub fn snapshot(&self) -> Arc<RegistrySnapshot> {
        // The lock only guards a pointer, so a poisoned lock is still usable.
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Replaces the whole mapping. The new snapshot is fully built before it
    /// becomes visible.
    pub fn reload(
        &self,
        credentials: Vec<Credential>,
        default_server_url: Option<&str>,
        default_proxy_url: Option<&str>,
    ) -> Arc<RegistrySnapshot> {
        let mut current = self
            .current
            .write()
            .unwrap_or_else(PoisonError::into_inner);

        let next = Arc::new(RegistrySnapshot::build(
            current.generation + 1,
            credentials,
            default_server_url,
            default_proxy_url,
        ));
        *current = Arc::clone(&next);
        drop(current);

        crate::log_status!(
            "registry",
            "Loaded {} credential(s) (generation {})",
            next.credentials.len(),
            next.generation
        );

        next
    }

    /// Reloads from settings, pulling keychain-held passwords as needed.
    pub fn reload_settings(&self, settings: &Settings) -> Arc<RegistrySnapshot> {
        self.reload(
            settings.resolve_credentials(),
            settings.server_url.as_deref(),
            settings.proxy_url.as_deref(),
        )
    }

    /// Persists `settings` and republishes the mapping from them.
    pub fn configure<S: SettingsStore + ?Sized>(
        &self,
        store: &S,
        settings: &Settings,
    ) -> Result<Arc<RegistrySnapshot>> {
        store.save(settings)?;
        Ok(self.reload_settings(settings))
    }

    pub fn lookup(&self, name: &str) -> Result<Arc<ServerConnection>> {
        self.snapshot().lookup(name)
    }

    pub fn default_credential(&self) -> Result<Credential> {
        self.snapshot().default_credential().cloned()
    }
}
