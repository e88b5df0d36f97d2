use serde::Serialize;
use std::collections::BTreeMap;

use xlrelease::utils::validation;
use xlrelease::{
    Credential, CredentialRegistry, JsonSettingsStore, Settings, SettingsStore, XlReleaseServer,
};

pub type CmdResult<T> = xlrelease::Result<(T, i32)>;

pub(crate) struct GlobalArgs {
    /// Settings file override (`--config`).
    pub config: Option<String>,
}

/// Settings as loaded for one command invocation.
pub(crate) struct Session {
    pub store: JsonSettingsStore,
    pub settings: Settings,
}

impl Session {
    pub fn open(global: &GlobalArgs) -> xlrelease::Result<Self> {
        let store = JsonSettingsStore::resolve(global.config.as_deref())?;
        let settings = store.load()?;
        Ok(Self { store, settings })
    }

    /// Writes the settings back to the store.
    pub fn save(&self) -> xlrelease::Result<()> {
        self.store.save(&self.settings)
    }

    /// Registry loaded from these settings. Only the credential the command
    /// will use has its password read from the keychain.
    pub fn registry_for(
        &self,
        credential: Option<&str>,
    ) -> xlrelease::Result<(String, CredentialRegistry)> {
        let name = self.settings.credential_name(credential)?;
        let registry = CredentialRegistry::new();
        registry.reload(
            self.settings.resolve_credentials_for(&name),
            self.settings.server_url.as_deref(),
            self.settings.proxy_url.as_deref(),
        );
        Ok((name, registry))
    }

    /// Client for the named credential, or for the default credential.
    pub fn connect(&self, credential: Option<&str>) -> xlrelease::Result<(String, XlReleaseServer)> {
        let (name, registry) = self.registry_for(credential)?;
        let connection = registry.lookup(&name)?;
        let server = XlReleaseServer::with_timeout(&connection, self.settings.timeout())?;
        Ok((name, server))
    }
}

/// Credential as shown to the user; the password itself is never echoed.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CredentialSummary {
    pub name: String,
    pub username: String,
    pub server_url: String,
    pub proxy_url: String,
    pub password_source: &'static str,
}

impl CredentialSummary {
    pub fn from_credential(credential: &Credential, settings: &Settings) -> Self {
        Self {
            name: credential.name.clone(),
            username: credential.username.clone(),
            server_url: credential.resolve_server_url(settings.server_url.as_deref()),
            proxy_url: credential.resolve_proxy_url(settings.proxy_url.as_deref()),
            password_source: if credential.password.is_empty() {
                "keychain"
            } else {
                "inline"
            },
        }
    }
}

/// Parse repeated `--var KEY=VALUE` flags.
pub(crate) fn parse_vars(vars: &[String]) -> xlrelease::Result<BTreeMap<String, String>> {
    vars.iter().map(|v| validation::parse_key_value(v)).collect()
}

pub mod check;
pub mod config;
pub mod credential;
pub mod notify;
pub mod release;
pub mod templates;

/// Dispatch a command to its handler and map result to JSON.
macro_rules! dispatch {
    ($args:expr, $global:expr, $module:ident) => {
        crate::output::map_cmd_result_to_json($module::run($args, $global))
    };
}

pub(crate) fn run_json(
    command: crate::Commands,
    global: &GlobalArgs,
) -> (xlrelease::Result<serde_json::Value>, i32) {
    crate::tty::status("xlrelease is working...");

    match command {
        crate::Commands::Config(args) => dispatch!(args, global, config),
        crate::Commands::Credential(args) => dispatch!(args, global, credential),
        crate::Commands::Check(args) => dispatch!(args, global, check),
        crate::Commands::Templates(args) => dispatch!(args, global, templates),
        crate::Commands::Release(args) => dispatch!(args, global, release),
        crate::Commands::Notify(args) => dispatch!(args, global, notify),
    }
}
