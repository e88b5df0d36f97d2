use clap::{Args, Subcommand};
use serde::Serialize;

use xlrelease::utils::validation;
use xlrelease::{keychain, Credential, CredentialRegistry, Error, Secret};

use super::{CmdResult, CredentialSummary, GlobalArgs, Session};

#[derive(Args)]
pub struct CredentialArgs {
    #[command(subcommand)]
    command: CredentialCommand,
}

#[derive(Subcommand)]
enum CredentialCommand {
    /// List configured credentials
    List,
    /// Display one credential
    Show {
        /// Credential name
        name: String,
    },
    /// Add a credential, or replace one with the same name
    Add {
        /// Credential name
        name: String,
        /// XL Release username
        #[arg(long)]
        username: String,
        /// Password (prompted for, or read from stdin, when omitted)
        #[arg(long)]
        password: Option<String>,
        /// Server URL for this credential instead of the global default
        #[arg(long)]
        server_url: Option<String>,
        /// Proxy URL for this credential instead of the global default
        #[arg(long)]
        proxy_url: Option<String>,
        /// Store the password in the settings file instead of the keychain
        #[arg(long)]
        inline: bool,
    },
    /// Remove a credential and its stored password
    Remove {
        /// Credential name
        name: String,
    },
    /// Show the credential used when none is given
    Default,
}

#[derive(Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CredentialOutput {
    command: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    credential: Option<CredentialSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    credentials: Option<Vec<CredentialSummary>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    removed: Option<String>,
}

fn optional_url(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

pub fn run(args: CredentialArgs, global: &GlobalArgs) -> CmdResult<CredentialOutput> {
    let mut session = Session::open(global)?;

    match args.command {
        CredentialCommand::List => {
            let settings = &session.settings;
            Ok((
                CredentialOutput {
                    command: "credential.list".to_string(),
                    credentials: Some(
                        settings
                            .credentials
                            .iter()
                            .map(|c| CredentialSummary::from_credential(c, settings))
                            .collect(),
                    ),
                    ..Default::default()
                },
                0,
            ))
        }

        CredentialCommand::Show { name } => {
            let settings = &session.settings;
            let credential = settings.find(&name).ok_or_else(|| {
                let names = settings.credentials.iter().map(|c| c.name.clone()).collect();
                Error::credential_not_found(&name, names)
            })?;
            Ok((
                CredentialOutput {
                    command: "credential.show".to_string(),
                    credential: Some(CredentialSummary::from_credential(credential, settings)),
                    ..Default::default()
                },
                0,
            ))
        }

        CredentialCommand::Add {
            name,
            username,
            password,
            server_url,
            proxy_url,
            inline,
        } => {
            let name = validation::require_non_empty(&name, "name", "Credential name cannot be empty")?
                .to_string();
            let password = match password {
                Some(p) => p,
                None => crate::tty::prompt_password(&format!("Password for '{}': ", name))?,
            };

            let mut credential = Credential {
                name: name.clone(),
                username,
                password: Secret::default(),
                server_url: optional_url(server_url),
                proxy_url: optional_url(proxy_url),
            };

            if inline {
                credential.password = Secret::new(password);
            } else {
                keychain::store(&name, &password)?;
            }

            session.settings.upsert(credential);
            session.save()?;

            let settings = &session.settings;
            let summary = settings
                .find(&name)
                .map(|c| CredentialSummary::from_credential(c, settings));
            Ok((
                CredentialOutput {
                    command: "credential.add".to_string(),
                    credential: summary,
                    ..Default::default()
                },
                0,
            ))
        }

        CredentialCommand::Remove { name } => {
            remove_credential(&mut session, &name, keychain::delete)?;

            Ok((
                CredentialOutput {
                    command: "credential.remove".to_string(),
                    removed: Some(name),
                    ..Default::default()
                },
                0,
            ))
        }

        CredentialCommand::Default => {
            // Settings order decides the default; passwords are not needed here.
            let registry = CredentialRegistry::new();
            registry.reload(
                session.settings.credentials.clone(),
                session.settings.server_url.as_deref(),
                session.settings.proxy_url.as_deref(),
            );
            let credential = registry.default_credential()?;
            Ok((
                CredentialOutput {
                    command: "credential.default".to_string(),
                    credential: Some(CredentialSummary::from_credential(
                        &credential,
                        &session.settings,
                    )),
                    ..Default::default()
                },
                0,
            ))
        }
    }
}

/// Drops `name` from the settings, saves, then forgets its stored password.
/// The password is only deleted once the settings no longer reference it.
fn remove_credential(
    session: &mut Session,
    name: &str,
    forget_password: impl FnOnce(&str) -> xlrelease::Result<()>,
) -> xlrelease::Result<()> {
    if !session.settings.remove(name) {
        let names = session
            .settings
            .credentials
            .iter()
            .map(|c| c.name.clone())
            .collect();
        return Err(Error::credential_not_found(name, names));
    }

    session.save()?;

    if let Err(err) = forget_password(name) {
        xlrelease::log_status!("credential", "Keychain entry not removed: {}", err);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use xlrelease::{ErrorCode, JsonSettingsStore, Settings, SettingsStore};

    fn session_at(path: std::path::PathBuf) -> Session {
        let mut settings = Settings::default();
        settings.upsert(Credential::new("ci", "builder", ""));
        Session {
            store: JsonSettingsStore::new(path),
            settings,
        }
    }

    #[test]
    fn remove_saves_before_forgetting_password() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        let mut session = session_at(path.clone());
        let forgotten = RefCell::new(Vec::new());

        remove_credential(&mut session, "ci", |name| {
            // The saved file must already be without the credential.
            let saved = JsonSettingsStore::new(&path).load().unwrap();
            assert!(saved.find(name).is_none());
            forgotten.borrow_mut().push(name.to_string());
            Ok(())
        })
        .unwrap();

        assert_eq!(*forgotten.borrow(), vec!["ci".to_string()]);
    }

    #[test]
    fn failed_save_keeps_password() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("not-a-dir");
        std::fs::write(&blocker, "").unwrap();
        let mut session = session_at(blocker.join("settings.json"));
        let forgotten = RefCell::new(false);

        let result = remove_credential(&mut session, "ci", |_| {
            *forgotten.borrow_mut() = true;
            Ok(())
        });

        assert!(result.is_err());
        assert!(!*forgotten.borrow());
    }

    #[test]
    fn removing_unknown_credential_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = session_at(dir.path().join("settings.json"));

        let err = remove_credential(&mut session, "qa", |_| Ok(())).unwrap_err();
        assert_eq!(err.code, ErrorCode::CredentialNotFound);
        assert_eq!(err.details["available"], serde_json::json!(["ci"]));
    }

    #[test]
    fn failed_keychain_delete_still_succeeds() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = session_at(dir.path().join("settings.json"));

        remove_credential(&mut session, "ci", |_| {
            Err(Error::keychain_failed("locked".to_string()))
        })
        .unwrap();
        assert!(session.settings.credentials.is_empty());
    }
}
